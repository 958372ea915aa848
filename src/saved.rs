/// Saved-cruise bookmark store.
///
/// Users can bookmark a sailing and return to it from the saved-cruises
/// screen. Rows are scoped to an opaque user id supplied by the external
/// auth provider — sign-in and session handling never reach this crate.
/// A bookmark is uniquely identified by (user, line, ship, sail date);
/// saving the same selection twice is a no-op.

use chrono::{DateTime, NaiveDate, Utc};
use postgres::{Client, NoTls};

use crate::model::SavedCruise;

// ---------------------------------------------------------------------------
// Connection / schema
// ---------------------------------------------------------------------------

/// Connects using DATABASE_URL from the environment (or a local .env).
pub fn connect() -> Result<Client, Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL is not set — add it to the environment or .env")?;
    let client = Client::connect(&url, NoTls)?;
    Ok(client)
}

/// Creates the saved_cruises table if it does not exist. Idempotent.
pub fn ensure_schema(client: &mut Client) -> Result<(), postgres::Error> {
    client.batch_execute(
        "
        CREATE TABLE IF NOT EXISTS saved_cruises (
            id          BIGSERIAL PRIMARY KEY,
            user_id     TEXT NOT NULL,
            cruise_line TEXT NOT NULL,
            ship_name   TEXT NOT NULL,
            sail_date   DATE NOT NULL,
            title       TEXT,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            UNIQUE (user_id, cruise_line, ship_name, sail_date)
        )
        ",
    )
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Bookmarks a sailing for a user. Returns `true` if a row was inserted,
/// `false` if the selection was already saved.
pub fn save_cruise(
    client: &mut Client,
    user_id: &str,
    cruise_line: &str,
    ship_name: &str,
    sail_date: NaiveDate,
    title: Option<&str>,
) -> Result<bool, postgres::Error> {
    let inserted = client.execute(
        "INSERT INTO saved_cruises (user_id, cruise_line, ship_name, sail_date, title)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id, cruise_line, ship_name, sail_date) DO NOTHING",
        &[&user_id, &cruise_line, &ship_name, &sail_date, &title],
    )?;
    Ok(inserted > 0)
}

/// All bookmarks for a user, newest first.
pub fn list_for_user(client: &mut Client, user_id: &str) -> Result<Vec<SavedCruise>, postgres::Error> {
    let rows = client.query(
        "SELECT id, user_id, cruise_line, ship_name, sail_date, title, created_at
         FROM saved_cruises
         WHERE user_id = $1
         ORDER BY created_at DESC",
        &[&user_id],
    )?;

    let mut saved = Vec::with_capacity(rows.len());
    for row in rows {
        saved.push(SavedCruise {
            id: row.get(0),
            user_id: row.get(1),
            cruise_line: row.get(2),
            ship_name: row.get(3),
            sail_date: row.get(4),
            title: row.get(5),
            created_at: row.get::<_, DateTime<Utc>>(6),
        });
    }
    Ok(saved)
}

/// Removes one bookmark by its composite key. Returns the number of rows
/// deleted (0 or 1).
pub fn delete_saved(
    client: &mut Client,
    user_id: &str,
    cruise_line: &str,
    ship_name: &str,
    sail_date: NaiveDate,
) -> Result<u64, postgres::Error> {
    client.execute(
        "DELETE FROM saved_cruises
         WHERE user_id = $1 AND cruise_line = $2 AND ship_name = $3 AND sail_date = $4",
        &[&user_id, &cruise_line, &ship_name, &sail_date],
    )
}

/// True when the user has already saved this selection. Drives the
/// save-button state in the UI.
pub fn is_saved(
    client: &mut Client,
    user_id: &str,
    cruise_line: &str,
    ship_name: &str,
    sail_date: NaiveDate,
) -> Result<bool, postgres::Error> {
    let row = client.query_one(
        "SELECT COUNT(*) FROM saved_cruises
         WHERE user_id = $1 AND cruise_line = $2 AND ship_name = $3 AND sail_date = $4",
        &[&user_id, &cruise_line, &ship_name, &sail_date],
    )?;
    let count: i64 = row.get(0);
    Ok(count > 0)
}
