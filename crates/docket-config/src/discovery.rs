//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/docket/config.toml` (user config, or `$DOCKET_CONFIG_DIR`)
//! 2. `./docket.toml` (project-local)
//! 3. `DOCKET_*` environment variables
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{ChannelKind, ConfigError, DocketConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "docket.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for platform directory resolution.
const APP_NAME: &str = "docket";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "DOCKET_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: DocketConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Environment variables that overrode file values.
    pub env_overrides: Vec<&'static str>,
    /// Problems found while loading; none of them are fatal.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `DOCKET_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = DocketConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_config {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    let env_overrides =
        apply_env_overrides(&mut config, |key| std::env::var(key).ok(), &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        env_overrides,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<DocketConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    DocketConfig::from_toml(&contents)
}

/// Apply `DOCKET_*` overrides read through `lookup`.
///
/// Returns the names of the variables that were applied. Empty values are
/// ignored.
pub fn apply_env_overrides<F>(
    config: &mut DocketConfig,
    lookup: F,
    warnings: &mut Vec<String>,
) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();
    let mut get = |key: &'static str| {
        let value = lookup(key).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            applied.push(key);
        }
        value
    };

    if let Some(url) = get("DOCKET_OLLAMA_URL") {
        config.llm.get_or_insert_with(Default::default).base_url = url;
    }
    if let Some(model) = get("DOCKET_OLLAMA_MODEL") {
        config.llm.get_or_insert_with(Default::default).model = model;
    }
    if let Some(url) = get("DOCKET_CHROMA_URL") {
        config.index.get_or_insert_with(Default::default).url = url;
    }
    if let Some(path) = get("DOCKET_DB_PATH") {
        config.storage.get_or_insert_with(Default::default).path = Some(PathBuf::from(path));
    }
    if let Some(kind) = get("DOCKET_CHANNEL") {
        match kind.parse::<ChannelKind>() {
            Ok(kind) => config.channel.get_or_insert_with(Default::default).kind = Some(kind),
            Err(e) => warnings.push(format!("Ignoring DOCKET_CHANNEL: {}", e)),
        }
    }
    if let Some(phone) = get("DOCKET_SIGNAL_PHONE") {
        let channel = config.channel.get_or_insert_with(Default::default);
        channel.signal.get_or_insert_with(Default::default).phone_number = Some(phone);
    }
    if let Some(token) = get("DOCKET_TELEGRAM_TOKEN") {
        let channel = config.channel.get_or_insert_with(Default::default);
        channel.telegram.get_or_insert_with(Default::default).bot_token = Some(token);
    }
    if let Some(chat_id) = get("DOCKET_TELEGRAM_CHAT_ID") {
        let channel = config.channel.get_or_insert_with(Default::default);
        channel.telegram.get_or_insert_with(Default::default).chat_id = Some(chat_id);
    }

    applied
}

/// User config file path.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// User config directory.
///
/// Checks `DOCKET_CONFIG_DIR` first, then falls back to the platform default
/// (`~/.config/docket` on Linux, `~/Library/Application Support/docket` on macOS).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Platform data directory for docket.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_NAME))
}

/// Default log directory (`<config dir>/logs`).
pub fn default_log_dir() -> Option<PathBuf> {
    config_dir().map(|d| d.join("logs"))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(config: &mut DocketConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    use crate::IndexBackendKind;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_layered_merge() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();

        fs::write(
            user_dir.path().join("config.toml"),
            r#"
[llm]
model = "user-model"

[index]
backend = "chroma"
"#,
        )
        .unwrap();
        fs::write(
            project_dir.path().join("docket.toml"),
            r#"
[llm]
model = "project-model"
"#,
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();

        assert_eq!(loaded.loaded_from().len(), 2);
        assert_eq!(loaded.config.llm().model, "project-model");
        assert_eq!(loaded.config.index().backend, IndexBackendKind::Chroma);
    }

    #[test]
    fn test_malformed_config_warns_but_continues() {
        let project_dir = TempDir::new().unwrap();
        let user_dir = TempDir::new().unwrap();
        fs::write(project_dir.path().join("docket.toml"), "not valid {{{{").unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();
        assert!(loaded.loaded_from().is_empty());
        assert!(loaded.warnings.iter().any(|w| w.contains("Failed to load")));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DocketConfig::from_toml("[llm]\nmodel = \"file-model\"\n").unwrap();
        let mut warnings = Vec::new();
        let applied = apply_env_overrides(
            &mut config,
            env(&[
                ("DOCKET_OLLAMA_MODEL", "env-model"),
                ("DOCKET_CHROMA_URL", "http://chroma:9000"),
                ("DOCKET_TELEGRAM_TOKEN", "123:abc"),
                ("DOCKET_TELEGRAM_CHAT_ID", "42"),
                ("DOCKET_SIGNAL_PHONE", ""),
            ]),
            &mut warnings,
        );

        assert_eq!(config.llm().model, "env-model");
        assert_eq!(config.index().url, "http://chroma:9000");
        let telegram = config.channel().require_telegram().unwrap();
        assert_eq!(telegram.bot_token.as_deref(), Some("123:abc"));
        assert!(config.channel().signal.is_none());
        assert_eq!(applied.len(), 4);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_bad_channel_env_is_warning() {
        let mut config = DocketConfig::new();
        let mut warnings = Vec::new();
        apply_env_overrides(&mut config, env(&[("DOCKET_CHANNEL", "fax")]), &mut warnings);

        assert!(config.channel.is_none());
        assert_eq!(warnings.len(), 1);
    }
}
