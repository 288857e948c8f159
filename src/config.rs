//! Resolved filesystem layout and small parsing helpers for the CLI.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Where everything lives on disk.
///
/// ```text
/// <data_dir>/library/     the filesystem media library
/// <data_dir>/downloads/   cache of downloaded sample videos
/// <data_dir>/store.json   key-value store holding the local index
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub library_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub store_path: PathBuf,
}

impl Config {
    /// Resolve from an optional `--data-dir` override, defaulting to the
    /// platform data directory.
    pub fn resolve(data_dir: Option<&str>) -> Self {
        let root = match data_dir {
            Some(dir) => expand_tilde(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("gallery-mocker"),
        };
        Self {
            library_dir: root.join("library"),
            cache_dir: root.join("downloads"),
            store_path: root.join("store.json"),
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.library_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Parse a creation date argument: RFC 3339, or a plain `YYYY-MM-DD`
/// interpreted as local midnight.
pub fn parse_creation_date(input: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")?;
    let local = Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("Ambiguous local date: {input}"))?;
    Ok(local.with_timezone(&Utc))
}
