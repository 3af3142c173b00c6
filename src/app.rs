use crate::{
    db::{DbError, LinksDB},
    models::{Link, NewLink},
};
use scraptor_rs::{DeleteLinkRequest, LinkRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Every way a chat or link operation can fail.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ServiceError {
    #[error("already exists")]
    Conflict,
    #[error("not found")]
    NotFound,
    #[error("link is already tracked in this chat")]
    Duplicate,
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => ServiceError::NotFound,
            DbError::Duplicate => ServiceError::Conflict,
            DbError::ForeignKey(reason) => {
                tracing::debug!(%reason, "referenced row missing");
                ServiceError::NotFound
            }
            DbError::General(e) => ServiceError::Storage(e),
        }
    }
}

fn validate_id(what: &str, id: i64) -> Result<(), ServiceError> {
    if id <= 0 {
        return Err(ServiceError::Validation(format!(
            "{what} must be positive, got {id}"
        )));
    }
    Ok(())
}

fn validate_link(link: &str) -> Result<(), ServiceError> {
    if link.is_empty() {
        return Err(ServiceError::Validation(String::from(
            "link must not be empty",
        )));
    }
    Ok(())
}

/// Chat and link operations on top of a [`LinksDB`].
#[derive(Clone)]
pub struct App {
    db: Arc<dyn LinksDB>,
}

impl App {
    pub fn new(db: Arc<dyn LinksDB>) -> Arc<Self> {
        Arc::new(Self { db })
    }

    #[instrument(skip(self), err)]
    pub async fn add_tg_chat(&self, chat_id: i64) -> Result<(), ServiceError> {
        validate_id("chat id", chat_id)?;

        self.db.register_chat(chat_id).await?;

        info!(chat_id, "chat registered");

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn delete_tg_chat(&self, chat_id: i64) -> Result<(), ServiceError> {
        self.db.unregister_chat(chat_id).await?;

        info!(chat_id, "chat removed");

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn add_link(
        &self,
        chat_id: i64,
        request: LinkRequest,
    ) -> Result<Link, ServiceError> {
        validate_link(&request.link)?;

        // bots send 0 when the link has no token
        let token_id = match request.token_id {
            None | Some(0) => None,
            Some(token_id) => {
                validate_id("token id", token_id)?;
                Some(token_id)
            }
        };

        let new_link = NewLink {
            chat_id,
            link: request.link,
            tag: request.tag,
            token_id,
        };

        match self.db.add_link(&new_link).await {
            Ok(link) => {
                info!(chat_id, id = link.id, "link added");
                Ok(link)
            }
            Err(DbError::Duplicate) => Err(ServiceError::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), err)]
    pub async fn get_links(&self, chat_id: i64) -> Result<Vec<Link>, ServiceError> {
        Ok(self.db.list_links(chat_id).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_link(
        &self,
        chat_id: i64,
        request: DeleteLinkRequest,
    ) -> Result<Link, ServiceError> {
        let link = self.db.delete_link(chat_id, &request.link).await?;

        info!(chat_id, id = link.id, "link deleted");

        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockLinksDB;
    use mockall::predicate::eq;

    fn link(id: i64, target: &str, token_id: Option<i64>) -> Link {
        Link {
            id,
            link: target.to_string(),
            tag: String::from("test"),
            token_id,
        }
    }

    #[tokio::test]
    async fn test_add_tg_chat() {
        let mut db = MockLinksDB::new();
        db.expect_register_chat()
            .with(eq(123))
            .times(1)
            .returning(|_| Ok(()));

        let app = App::new(Arc::new(db));

        assert_eq!(app.add_tg_chat(123).await, Ok(()));
    }

    #[tokio::test]
    async fn test_add_tg_chat_conflict() {
        let mut db = MockLinksDB::new();
        db.expect_register_chat()
            .with(eq(456))
            .times(1)
            .returning(|_| Err(DbError::Duplicate));

        let app = App::new(Arc::new(db));

        assert_eq!(app.add_tg_chat(456).await, Err(ServiceError::Conflict));
    }

    #[tokio::test]
    async fn test_add_tg_chat_invalid_id() {
        let mut db = MockLinksDB::new();
        db.expect_register_chat().never();

        let app = App::new(Arc::new(db));

        assert!(matches!(
            app.add_tg_chat(0).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_tg_chat_not_found() {
        let mut db = MockLinksDB::new();
        db.expect_unregister_chat()
            .with(eq(456))
            .times(1)
            .returning(|_| Err(DbError::NotFound));

        let app = App::new(Arc::new(db));

        assert_eq!(app.delete_tg_chat(456).await, Err(ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_add_link() {
        let mut db = MockLinksDB::new();
        db.expect_add_link()
            .withf(|l| {
                l.chat_id == 123
                    && l.link == "https://example.com"
                    && l.tag == "test"
                    && l.token_id == Some(1)
            })
            .times(1)
            .returning(|l| Ok(link(1, &l.link, l.token_id)));

        let app = App::new(Arc::new(db));

        let res = app
            .add_link(
                123,
                LinkRequest::new("https://example.com", "test").with_token(1),
            )
            .await
            .unwrap();

        assert_eq!(res, link(1, "https://example.com", Some(1)));
    }

    #[tokio::test]
    async fn test_add_link_duplicate() {
        let mut db = MockLinksDB::new();
        db.expect_add_link()
            .times(1)
            .returning(|_| Err(DbError::Duplicate));

        let app = App::new(Arc::new(db));

        let res = app
            .add_link(123, LinkRequest::new("https://example.com", "test"))
            .await;

        assert_eq!(res, Err(ServiceError::Duplicate));
    }

    #[tokio::test]
    async fn test_add_link_unknown_chat() {
        let mut db = MockLinksDB::new();
        db.expect_add_link()
            .times(1)
            .returning(|_| Err(DbError::ForeignKey(String::from("chats_links_chat_id_fkey"))));

        let app = App::new(Arc::new(db));

        let res = app
            .add_link(9, LinkRequest::new("https://example.com", ""))
            .await;

        assert_eq!(res, Err(ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_add_link_validation() {
        let mut db = MockLinksDB::new();
        db.expect_add_link().never();

        let app = App::new(Arc::new(db));

        assert!(matches!(
            app.add_link(1, LinkRequest::new("", "test")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            app.add_link(1, LinkRequest::new("https://a.example", "").with_token(-3))
                .await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_add_link_zero_token_means_none() {
        let mut db = MockLinksDB::new();
        db.expect_add_link()
            .withf(|l| l.chat_id == 42 && l.token_id.is_none())
            .times(1)
            .returning(|l| Ok(link(1, &l.link, l.token_id)));

        let app = App::new(Arc::new(db));

        let res = app
            .add_link(42, LinkRequest::new("https://a.example", "news").with_token(0))
            .await
            .unwrap();

        assert_eq!(res.token_id, None);
    }

    #[tokio::test]
    async fn test_add_link_whitespace_target_is_kept() {
        let mut db = MockLinksDB::new();
        db.expect_add_link()
            .withf(|l| l.link == " ")
            .times(1)
            .returning(|l| Ok(link(2, &l.link, None)));

        let app = App::new(Arc::new(db));

        assert!(app.add_link(1, LinkRequest::new(" ", "")).await.is_ok());
    }

    #[tokio::test]
    async fn test_storage_error_passes_through() {
        let mut db = MockLinksDB::new();
        db.expect_list_links()
            .with(eq(123))
            .times(1)
            .returning(|_| Err(DbError::General(String::from("db error"))));

        let app = App::new(Arc::new(db));

        assert_eq!(
            app.get_links(123).await,
            Err(ServiceError::Storage(String::from("db error")))
        );
    }

    #[tokio::test]
    async fn test_get_links_empty() {
        let mut db = MockLinksDB::new();
        db.expect_list_links().returning(|_| Ok(Vec::new()));

        let app = App::new(Arc::new(db));

        assert_eq!(app.get_links(123).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_delete_link() {
        let mut db = MockLinksDB::new();
        db.expect_delete_link()
            .withf(|chat_id, target| *chat_id == 123 && target == "https://example.com")
            .times(1)
            .returning(|_, target| Ok(link(1, target, None)));
        db.expect_delete_link()
            .withf(|_, target| target == "https://other.example")
            .times(1)
            .returning(|_, _| Err(DbError::NotFound));

        let app = App::new(Arc::new(db));

        let res = app
            .delete_link(
                123,
                DeleteLinkRequest {
                    link: String::from("https://example.com"),
                },
            )
            .await;
        assert_eq!(res, Ok(link(1, "https://example.com", None)));

        let res = app
            .delete_link(
                123,
                DeleteLinkRequest {
                    link: String::from("https://other.example"),
                },
            )
            .await;
        assert_eq!(res, Err(ServiceError::NotFound));
    }
}
