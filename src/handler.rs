use crate::app::{App, ServiceError};
use axum::{
    Json,
    extract::{FromRequestParts, Path, State, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use scraptor_rs::{
    ApiErrorResponse, CHAT_ID_HEADER, DeleteLinkRequest, LinkRequest, LinkResponse,
    ListLinksResponse,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub enum AppError {
    Service(ServiceError),
    BadRequest(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Service(ServiceError::NotFound) => (StatusCode::NOT_FOUND, "NotFound"),
            AppError::Service(ServiceError::Conflict) => (StatusCode::BAD_REQUEST, "Conflict"),
            AppError::Service(ServiceError::Duplicate) => (StatusCode::BAD_REQUEST, "Duplicate"),
            AppError::Service(ServiceError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "Validation")
            }
            AppError::Service(ServiceError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Service(e) => e.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, name) = self.parts();
        let reason = self.message();

        let description = if status.is_server_error() {
            error!(%reason, "request failed");
            String::from("An unexpected error occurred")
        } else {
            warn!(status = status.as_u16(), %reason, "request rejected");
            reason.clone()
        };

        let body = ApiErrorResponse {
            description,
            code: status.as_u16().to_string(),
            exception_name: name.to_string(),
            exception_message: reason,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

/// Chat id taken from the `Tg-Chat-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct ChatId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for ChatId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(CHAT_ID_HEADER) else {
            return Err(AppError::BadRequest(format!(
                "no header `{CHAT_ID_HEADER}` provided"
            )));
        };

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(ChatId)
            .ok_or_else(|| {
                AppError::BadRequest(format!("incorrect value of header `{CHAT_ID_HEADER}`"))
            })
    }
}

fn parse_chat_id(id: &str) -> Result<i64, AppError> {
    id.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("incorrect chat id: {id}")))
}

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "sha": option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
    }))
}

pub async fn handle_add_chat(
    Path(id): Path<String>,
    State(app): State<Arc<App>>,
) -> Result<impl IntoResponse, AppError> {
    info!("handle_add_chat: {}", id);

    app.add_tg_chat(parse_chat_id(&id)?).await?;

    Ok(StatusCode::CREATED)
}

pub async fn handle_delete_chat(
    Path(id): Path<String>,
    State(app): State<Arc<App>>,
) -> Result<impl IntoResponse, AppError> {
    info!("handle_delete_chat: {}", id);

    app.delete_tg_chat(parse_chat_id(&id)?).await?;

    Ok(StatusCode::OK)
}

pub async fn handle_list_links(
    ChatId(chat_id): ChatId,
    State(app): State<Arc<App>>,
) -> Result<impl IntoResponse, AppError> {
    info!(chat_id, "handle_list_links");

    let links = app
        .get_links(chat_id)
        .await?
        .into_iter()
        .map(LinkResponse::from)
        .collect::<Vec<_>>();

    Ok(Json(ListLinksResponse::from(links)))
}

pub async fn handle_add_link(
    ChatId(chat_id): ChatId,
    State(app): State<Arc<App>>,
    create: Result<Json<LinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(create) = create?;

    info!(chat_id, "handle_add_link: '{}'", create.link);

    let link = app.add_link(chat_id, create).await?;

    Ok((StatusCode::CREATED, Json(LinkResponse::from(link))))
}

pub async fn handle_delete_link(
    ChatId(chat_id): ChatId,
    State(app): State<Arc<App>>,
    delete: Result<Json<DeleteLinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(delete) = delete?;

    info!(chat_id, "handle_delete_link: '{}'", delete.link);

    let link = app.delete_link(chat_id, delete).await?;

    Ok(Json(LinkResponse::from(link)))
}
