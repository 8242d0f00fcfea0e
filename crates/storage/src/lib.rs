use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/search_state.db";

/// Where the exposed part of the query state survives between sessions.
///
/// Implementations only ever see the already serialized query string.
#[async_trait]
pub trait StatePersistence: Send + Sync {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// The stored query string, or `""` when nothing was saved yet.
    async fn load(&self) -> Result<String>;

    async fn save(&self, exposed: &str) -> Result<()>;
}

/// Keeps nothing. Loading always yields an empty string.
pub struct NoPersistence;

#[async_trait]
impl StatePersistence for NoPersistence {
    async fn load(&self) -> Result<String> {
        Ok(String::new())
    }

    async fn save(&self, _exposed: &str) -> Result<()> {
        Ok(())
    }
}

/// In-process persistence. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    current: String,
    saves: Vec<String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(stored: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState {
                current: stored.into(),
                saves: Vec::new(),
            })),
        }
    }

    /// Overwrites the stored string without counting as a save.
    pub async fn replace(&self, stored: impl Into<String>) {
        self.inner.lock().await.current = stored.into();
    }

    /// Every string passed to `save`, oldest first.
    pub async fn saves(&self) -> Vec<String> {
        self.inner.lock().await.saves.clone()
    }
}

#[async_trait]
impl StatePersistence for MemoryPersistence {
    async fn load(&self) -> Result<String> {
        Ok(self.inner.lock().await.current.clone())
    }

    async fn save(&self, exposed: &str) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.current = exposed.to_string();
        state.saves.push(exposed.to_string());
        Ok(())
    }
}

/// Keeps the state in the fragment of a page URL, so that a bookmark or the
/// back button restores the search.
#[derive(Clone)]
pub struct FragmentPersistence {
    url: Arc<Mutex<Url>>,
}

impl FragmentPersistence {
    pub fn new(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url).with_context(|| format!("invalid page url '{page_url}'"))?;
        Ok(Self {
            url: Arc::new(Mutex::new(url)),
        })
    }

    pub async fn current_url(&self) -> Url {
        self.url.lock().await.clone()
    }

    /// Simulates navigation to another URL of the same page (a bookmark or
    /// history entry).
    pub async fn navigate(&self, page_url: &str) -> Result<()> {
        let url = Url::parse(page_url).with_context(|| format!("invalid page url '{page_url}'"))?;
        *self.url.lock().await = url;
        Ok(())
    }
}

#[async_trait]
impl StatePersistence for FragmentPersistence {
    async fn load(&self) -> Result<String> {
        Ok(self
            .url
            .lock()
            .await
            .fragment()
            .unwrap_or_default()
            .to_string())
    }

    async fn save(&self, exposed: &str) -> Result<()> {
        let mut url = self.url.lock().await;
        if exposed.is_empty() {
            url.set_fragment(None);
        } else {
            url.set_fragment(Some(exposed));
        }
        Ok(())
    }
}

/// A plain text file holding the last saved query string.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StatePersistence for FilePersistence {
    async fn init(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create state directory '{}'", parent.display())
            })?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(raw.trim_end().to_string()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read state file '{}'", self.path.display())),
        }
    }

    async fn save(&self, exposed: &str) -> Result<()> {
        tokio::fs::write(&self.path, exposed)
            .await
            .with_context(|| format!("failed to write state file '{}'", self.path.display()))
    }
}

/// One row of the `search_state` table.
#[derive(Debug, Clone)]
pub struct StoredState {
    pub session_key: String,
    pub exposed: String,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed persistence, one row per session key.
#[derive(Clone)]
pub struct SqlitePersistence {
    pool: Pool<Sqlite>,
    session_key: String,
}

impl SqlitePersistence {
    pub async fn new(database_url: &str, session_key: impl Into<String>) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url '{database_url}'"))?
            .create_if_missing(true);
        // Every connection to `:memory:` opens its own empty database.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run search_state migrations")?;
        Ok(Self {
            pool,
            session_key: session_key.into(),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn stored(&self) -> Result<Option<StoredState>> {
        let row = sqlx::query(
            "SELECT session_key, exposed, updated_at FROM search_state WHERE session_key = ?",
        )
        .bind(&self.session_key)
        .fetch_optional(&self.pool)
        .await
        .context("failed to read search_state")?;

        row.map(|row| {
            Ok::<_, anyhow::Error>(StoredState {
                session_key: row.try_get("session_key")?,
                exposed: row.try_get("exposed")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl StatePersistence for SqlitePersistence {
    async fn init(&self) -> Result<()> {
        self.health_check().await
    }

    async fn load(&self) -> Result<String> {
        Ok(self
            .stored()
            .await?
            .map(|state| state.exposed)
            .unwrap_or_default())
    }

    async fn save(&self, exposed: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO search_state (session_key, exposed, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(session_key) DO UPDATE SET exposed = excluded.exposed, updated_at = excluded.updated_at",
        )
        .bind(&self.session_key)
        .bind(exposed)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save state for session '{}'", self.session_key))?;
        Ok(())
    }
}

/// Opens the backend named by `database_url`, falling back to in-memory
/// state when the database cannot be opened.
pub async fn open_persistence(
    database_url: &str,
    session_key: &str,
) -> Arc<dyn StatePersistence> {
    match SqlitePersistence::new(database_url, session_key).await {
        Ok(persistence) => {
            info!("storage: using sqlite state at {database_url}");
            Arc::new(persistence)
        }
        Err(err) => {
            warn!("storage: falling back to in-memory state: {err:#}");
            Arc::new(MemoryPersistence::new())
        }
    }
}

/// Turns a bare path into a `sqlite://` URL and makes sure its directory
/// exists.
pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
