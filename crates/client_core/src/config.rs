use std::{fs, io, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_SETTINGS_FILE: &str = "search.toml";
const ENV_PREFIX: &str = "SEARCH__";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub servlet: String,
    pub solr_url: String,
    pub proxy_url: Option<String>,
    pub exposed: Vec<String>,
    pub rows: u32,
    pub inner_window: u32,
    pub outer_window: u32,
    pub json_nl: String,
    pub database_url: String,
    pub session_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            servlet: "select".into(),
            solr_url: "http://localhost:8983/solr/".into(),
            proxy_url: None,
            exposed: vec!["fq".into(), "q".into(), "start".into()],
            rows: 10,
            inner_window: 4,
            outer_window: 1,
            json_nl: "map".into(),
            database_url: "sqlite://./data/search_state.db".into(),
            session_key: "default".into(),
        }
    }
}

/// Defaults, then the TOML file at `path` (`search.toml` when `None`; a
/// missing file is not an error), then `SEARCH__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => {
            info!("config: loading settings from {}", path.display());
            toml::from_str::<Settings>(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

/// Applies `SEARCH__<FIELD>` overrides looked up through `lookup`.
pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |field: &str| lookup(&format!("{ENV_PREFIX}{field}"));

    if let Some(v) = var("SERVLET") {
        settings.servlet = v;
    }
    if let Some(v) = var("SOLR_URL") {
        settings.solr_url = v;
    }
    if let Some(v) = var("PROXY_URL") {
        settings.proxy_url = (!v.trim().is_empty()).then_some(v);
    }
    if let Some(v) = var("ROWS") {
        settings.rows = v
            .trim()
            .parse()
            .with_context(|| format!("{ENV_PREFIX}ROWS must be a number, got '{v}'"))?;
    }
    if let Some(v) = var("EXPOSED") {
        settings.exposed = v
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(v) = var("JSON_NL") {
        settings.json_nl = v;
    }
    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("SESSION_KEY") {
        settings.session_key = v;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
