//! Opening the family database.

use super::migrations::{apply_migrations, latest_version};
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a writer waits on a competing lock before the save fails.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the family database lives.
#[derive(Debug, Clone, Copy)]
pub enum DbLocation<'a> {
    File(&'a Path),
    Memory,
}

impl DbLocation<'_> {
    fn connect(self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

impl Display for DbLocation<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(_) => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Opens (creating if needed) a family database file with the schema applied.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_at(DbLocation::File(path.as_ref()))
}

/// Throwaway database, used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_at(DbLocation::Memory)
}

fn open_at(location: DbLocation<'_>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = location
        .connect()
        .map_err(Into::into)
        .and_then(|mut conn| prepare(&mut conn).map(|()| conn));

    let elapsed_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok location={location} schema_version={} duration_ms={elapsed_ms}",
            latest_version()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error location={location} duration_ms={elapsed_ms} error={err}"
        ),
    }
    result
}

fn prepare(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
