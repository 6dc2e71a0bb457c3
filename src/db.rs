use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MAX_CONNECTIONS: u32 = 5;

/// Open the note database and bring its schema up to date.
///
/// For a file-backed URL the parent directory is created first.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(dir) = database_dir(database_url) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Could not create {}: {e}", dir.display());
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Note database ready at {database_url}");
    Ok(pool)
}

fn database_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty())
}
