use crate::models::{Link, NewLink};
use async_trait::async_trait;
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

mod postgres;

pub use postgres::PostgresDb;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    General(String),
    #[error("Duplicate Error")]
    Duplicate,
    #[error("Not Found Error")]
    NotFound,
    #[error("Foreign Key Error: {0}")]
    ForeignKey(String),
}

impl From<diesel::result::Error> for DbError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                DbError::Duplicate
            }
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => DbError::ForeignKey(info.message().to_string()),
            diesel::result::Error::NotFound => DbError::NotFound,
            _ => DbError::General(e.to_string()),
        }
    }
}

impl From<deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>> for DbError {
    fn from(e: deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>) -> Self {
        DbError::General(e.to_string())
    }
}

/// Persistent state of chats, their links and the tokens those links use.
///
/// Every write touching more than one table runs in a single transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinksDB: Send + Sync {
    /// Fails with [`DbError::Duplicate`] if the chat is already registered.
    async fn register_chat(&self, chat_id: i64) -> Result<(), DbError>;

    /// Removes the chat and every link it owns.
    /// Fails with [`DbError::NotFound`] if nothing was deleted.
    async fn unregister_chat(&self, chat_id: i64) -> Result<(), DbError>;

    async fn find_link(&self, chat_id: i64, link: &str) -> Result<Option<Link>, DbError>;

    /// Fails with [`DbError::Duplicate`] if the chat already tracks this target
    /// and with [`DbError::ForeignKey`] if the chat or token is unknown.
    async fn add_link(&self, link: &NewLink) -> Result<Link, DbError>;

    async fn list_links(&self, chat_id: i64) -> Result<Vec<Link>, DbError>;

    /// Returns the deleted link. Its token goes with it unless another link
    /// still references that token.
    async fn delete_link(&self, chat_id: i64, link: &str) -> Result<Link, DbError>;
}
