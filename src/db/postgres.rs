use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl, scoped_futures::ScopedFutureExt,
};

use crate::{
    db::{DbError, LinksDB},
    db_pool::DbPool,
    models::{CreateChat, CreateChatLink, CreateLink, Link, NewLink, PERSONAL_CHAT},
    schema,
};

#[derive(Clone)]
pub struct PostgresDb {
    db: DbPool,
}

impl PostgresDb {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

/// Deletes the token unless a link still points at it.
async fn delete_unused_token(
    conn: &mut AsyncPgConnection,
    token_id: i64,
) -> Result<usize, DbError> {
    use diesel::dsl::{exists, not};

    let in_use = schema::links::table.filter(schema::links::token_id.eq(token_id));

    Ok(diesel::delete(
        schema::tokens::table
            .filter(schema::tokens::id.eq(token_id))
            .filter(not(exists(in_use))),
    )
    .execute(conn)
    .await?)
}

#[async_trait]
impl LinksDB for PostgresDb {
    async fn register_chat(&self, chat_id: i64) -> Result<(), DbError> {
        diesel::insert_into(schema::chats::table)
            .values(CreateChat {
                id: chat_id,
                chat_type: PERSONAL_CHAT,
            })
            .execute(&mut self.db.0.get().await?)
            .await?;

        Ok(())
    }

    async fn unregister_chat(&self, chat_id: i64) -> Result<(), DbError> {
        let mut conn = self.db.0.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, DbError, _>(|conn| {
            async move {
                let owned: Vec<(i64, Option<i64>)> = schema::links::table
                    .inner_join(schema::chats_links::table)
                    .filter(schema::chats_links::chat_id.eq(chat_id))
                    .select((schema::links::id, schema::links::token_id))
                    .load(conn)
                    .await?;

                let affected =
                    diesel::delete(schema::chats::table.filter(schema::chats::id.eq(chat_id)))
                        .execute(conn)
                        .await?;

                if affected == 0 {
                    return Err(DbError::NotFound);
                }

                let link_ids: Vec<i64> = owned.iter().map(|(id, _)| *id).collect();
                diesel::delete(schema::links::table.filter(schema::links::id.eq_any(link_ids)))
                    .execute(conn)
                    .await?;

                for token_id in owned.iter().filter_map(|(_, token_id)| *token_id) {
                    delete_unused_token(conn, token_id).await?;
                }

                tracing::debug!(chat_id, links = owned.len(), "chat unregistered");

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_link(&self, chat_id: i64, link: &str) -> Result<Option<Link>, DbError> {
        Ok(schema::links::table
            .inner_join(schema::chats_links::table)
            .filter(schema::chats_links::chat_id.eq(chat_id))
            .filter(schema::links::link.eq(link))
            .select(Link::as_select())
            .first(&mut self.db.0.get().await?)
            .await
            .optional()?)
    }

    async fn add_link(&self, new_link: &NewLink) -> Result<Link, DbError> {
        // the unique constraint on chats_links has the final word, this only
        // saves a transaction for the common case
        if self
            .find_link(new_link.chat_id, &new_link.link)
            .await?
            .is_some()
        {
            return Err(DbError::Duplicate);
        }

        let mut conn = self.db.0.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, DbError, _>(|conn| {
            async move {
                let link: Link = diesel::insert_into(schema::links::table)
                    .values(CreateLink {
                        link: &new_link.link,
                        tag: &new_link.tag,
                        token_id: new_link.token_id,
                    })
                    .returning(Link::as_returning())
                    .get_result(conn)
                    .await?;

                diesel::insert_into(schema::chats_links::table)
                    .values(CreateChatLink {
                        chat_id: new_link.chat_id,
                        link_id: link.id,
                        link: &new_link.link,
                    })
                    .execute(conn)
                    .await?;

                Ok(link)
            }
            .scope_boxed()
        })
        .await
    }

    async fn list_links(&self, chat_id: i64) -> Result<Vec<Link>, DbError> {
        Ok(schema::links::table
            .inner_join(schema::chats_links::table)
            .filter(schema::chats_links::chat_id.eq(chat_id))
            .select(Link::as_select())
            .order(schema::links::id)
            .load(&mut self.db.0.get().await?)
            .await?)
    }

    async fn delete_link(&self, chat_id: i64, link: &str) -> Result<Link, DbError> {
        let Some(found) = self.find_link(chat_id, link).await? else {
            return Err(DbError::NotFound);
        };

        let mut conn = self.db.0.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, DbError, _>(|conn| {
            async move {
                let affected = diesel::delete(
                    schema::links::table.filter(schema::links::id.eq(found.id)),
                )
                .execute(conn)
                .await?;

                // deleted concurrently since the lookup
                if affected == 0 {
                    return Err(DbError::NotFound);
                }

                if let Some(token_id) = found.token_id {
                    let tokens = delete_unused_token(conn, token_id).await?;
                    tracing::debug!(token_id, tokens, "token released");
                }

                Ok(found)
            }
            .scope_boxed()
        })
        .await
    }
}
