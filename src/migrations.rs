use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Brings the chats/links/tokens schema up to date, returns how many
/// migrations were applied.
pub fn run_migrations(url: &str) -> Result<usize, anyhow::Error> {
    let mut db = PgConnection::establish(url)?;
    let applied = db
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    for version in &applied {
        info!(%version, "applied migration");
    }

    Ok(applied.len())
}
