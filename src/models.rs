use diesel::prelude::*;
use scraptor_rs::LinkResponse;

/// Chats are private conversations with the bot for now.
pub const PERSONAL_CHAT: &str = "personal";

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::chats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateChat<'a> {
    pub id: i64,
    pub chat_type: &'a str,
}

/// Input of [`crate::db::LinksDB::add_link`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewLink {
    pub chat_id: i64,
    pub link: String,
    pub tag: String,
    pub token_id: Option<i64>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateLink<'a> {
    pub link: &'a str,
    pub tag: &'a str,
    pub token_id: Option<i64>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::chats_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateChatLink<'a> {
    pub chat_id: i64,
    pub link_id: i64,
    pub link: &'a str,
}

#[derive(Queryable, Selectable, Clone, PartialEq, Eq, Debug)]
#[diesel(table_name = crate::schema::links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Link {
    pub id: i64,
    pub link: String,
    pub tag: String,
    pub token_id: Option<i64>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            link: link.link,
            tag: link.tag,
            token_id: link.token_id,
        }
    }
}
