use anyhow::Result;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{debug, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Opens the database with foreign key enforcement turned on.
///
/// Sqlite keeps `foreign_keys` per connection, so every connection the tool
/// uses has to come through here.
pub fn connect(database_url: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;
    debug!("Connected to {}", database_url);
    Ok(conn)
}

pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    if applied.is_empty() {
        debug!("Schema is up to date");
    } else {
        info!("Applied {} migration(s)", applied.len());
    }
    Ok(())
}

pub fn connect_and_migrate(database_url: &str) -> Result<SqliteConnection> {
    let mut conn = connect(database_url)?;
    run_migrations(&mut conn)?;
    Ok(conn)
}


#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error};

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = connect_and_migrate(":memory:").unwrap();
        run_migrations(&mut conn).unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let mut conn = connect_and_migrate(":memory:").unwrap();
        let err = diesel::sql_query(
            "INSERT INTO inventory_log (log_id, product_id, change_type, quantity, log_date) \
             VALUES (1, 99, 'IN', 5, '2024-01-01')",
        )
        .execute(&mut conn)
        .unwrap_err();
        assert!(
            matches!(err, Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)),
            "{err:?}"
        );
    }
}
