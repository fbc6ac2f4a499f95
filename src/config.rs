use anyhow::Context;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::Result;
use crate::utils::paths::expand_home;

pub const DEFAULT_ASSETS_CONFIG: &str = "config/asset_mapping.json";
pub const DEFAULT_RULES_CONFIG: &str = "config/context_rules.json";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Соответствие категорий папкам с медиафайлами
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetMappingConfig {
    #[serde(default = "default_assets_base")]
    pub assets_base: PathBuf,
    #[serde(default)]
    pub default_category: String,
    #[serde(default)]
    pub categories: HashMap<String, CategoryEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CategoryEntry {
    pub folder: String,
    #[serde(default, alias = "file")]
    pub preferred_file: Option<String>,
}

/// Правила сопоставления активного окна с категорией
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextRulesConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub process: Vec<String>,
    #[serde(default)]
    pub title_contains: Vec<String>,
    #[serde(default)]
    pub category: String,
}

fn default_assets_base() -> PathBuf {
    PathBuf::from("assets/cats")
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_category() -> String {
    "idle".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    500
}

/// Figment для файла конфигурации: формат выбирается по расширению,
/// поверх накладываются переменные окружения с префиксом.
fn figment_for(config_path: &Path, env_prefix: &str) -> anyhow::Result<Figment> {
    // Toml::file/Json::file молча игнорируют отсутствующий файл
    if !config_path.is_file() {
        anyhow::bail!("Файл конфигурации не найден: {:?}", config_path);
    }

    let is_json = config_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let figment = if is_json {
        Figment::new().merge(Json::file(config_path))
    } else {
        Figment::new().merge(Toml::file(config_path))
    };

    Ok(figment.merge(Env::prefixed(env_prefix)))
}

pub const ASSETS_ENV_PREFIX: &str = "DESKTOPCAT_ASSETS_";
pub const RULES_ENV_PREFIX: &str = "DESKTOPCAT_RULES_";

/// Корень проекта для файла конфигурации: родитель папки `config/`.
/// Для файла без родительской папки это текущий каталог.
fn project_root(config_path: &Path) -> PathBuf {
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
    config_dir
        .parent()
        .unwrap_or(config_dir)
        .to_path_buf()
}

impl AssetMappingConfig {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        Self::load_with_env(config_path.as_ref(), ASSETS_ENV_PREFIX)
    }

    fn load_with_env(config_path: &Path, env_prefix: &str) -> Result<Self> {
        let mut config: AssetMappingConfig = figment_for(config_path, env_prefix)?
            .extract()
            .with_context(|| format!("Не удалось загрузить карту ассетов из {:?}", config_path))?;

        config.validate()?;
        config.normalize(&project_root(config_path));

        Ok(config)
    }

    /// Раскрывает `~`, привязывает относительный `assets_base` к корню проекта
    /// и убирает пустые `preferred_file`.
    pub fn normalize(&mut self, project_root: &Path) {
        let base = expand_home(&self.assets_base);
        self.assets_base = if base.is_relative() {
            project_root.join(base)
        } else {
            base
        };

        for entry in self.categories.values_mut() {
            if entry
                .preferred_file
                .as_deref()
                .is_some_and(|file| file.trim().is_empty())
            {
                entry.preferred_file = None;
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, entry) in &self.categories {
            if entry.folder.trim().is_empty() {
                anyhow::bail!("У категории '{}' не задана папка 'folder'", name);
            }
        }

        if !self.default_category.is_empty() && !self.categories.contains_key(&self.default_category) {
            warn!(
                "Категория по умолчанию '{}' отсутствует в списке категорий",
                self.default_category
            );
        }

        Ok(())
    }
}

impl ContextRulesConfig {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        Self::load_with_env(config_path.as_ref(), RULES_ENV_PREFIX)
    }

    fn load_with_env(config_path: &Path, env_prefix: &str) -> Result<Self> {
        let mut config: ContextRulesConfig = figment_for(config_path, env_prefix)?
            .extract()
            .with_context(|| format!("Не удалось загрузить правила контекста из {:?}", config_path))?;

        if config.poll_interval_ms == 0 {
            config.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
        }

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            anyhow::bail!(
                "poll_interval_ms должно быть минимум {}",
                MIN_POLL_INTERVAL_MS
            );
        }

        if self.probe_timeout_ms == 0 {
            anyhow::bail!("probe_timeout_ms должно быть больше 0");
        }

        if self.default_category.trim().is_empty() {
            anyhow::bail!("default_category не может быть пустой");
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_asset_mapping_json() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        let path = write(
            &dir,
            "config/asset_mapping.json",
            r#"{
                "assets_base": "assets",
                "default_category": "idle",
                "categories": {
                    "idle": { "folder": "idle" },
                    "gaming": { "folder": "gaming", "file": "play.gif" },
                    "coding": { "folder": "coding", "preferred_file": "" }
                }
            }"#,
        );

        let config = AssetMappingConfig::load(&path).unwrap();
        assert_eq!(config.assets_base, dir.path().join("assets"));
        assert_eq!(config.default_category, "idle");
        assert_eq!(
            config.categories["gaming"].preferred_file.as_deref(),
            Some("play.gif")
        );
        assert_eq!(config.categories["coding"].preferred_file, None);
    }

    #[test]
    fn test_load_rules_toml_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "context_rules.toml",
            r#"
                [[rules]]
                process = ["game.exe"]
                category = "gaming"

                [[rules]]
                title_contains = ["youtube"]
                category = "streaming"
            "#,
        );

        let config = ContextRulesConfig::load(&path).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.default_category, "idle");
        assert_eq!(config.probe_timeout(), Duration::from_millis(500));
        assert_eq!(config.rules.len(), 2);
        assert!(config.rules[0].title_contains.is_empty());
        assert!(config.rules[1].process.is_empty());
    }

    #[test]
    fn test_missing_config_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(AssetMappingConfig::load(dir.path().join("nope.json")).is_err());
        assert!(ContextRulesConfig::load(dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "context_rules.json", "{ not json");
        assert!(ContextRulesConfig::load(&path).is_err());

        let path = write(&dir, "asset_mapping.json", r#"{"categories": {"idle": {"folder": ""}}}"#);
        assert!(AssetMappingConfig::load(&path).is_err());
    }

    #[test]
    fn test_poll_interval_validation() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "context_rules.json", r#"{"poll_interval_ms": 10}"#);
        assert!(ContextRulesConfig::load(&path).is_err());

        let path = write(&dir, "context_rules.json", r#"{"poll_interval_ms": 0}"#);
        let config = ContextRulesConfig::load(&path).unwrap();
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_assets_base_next_to_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "asset_mapping.json", r#"{"assets_base": "cats"}"#);

        let config = AssetMappingConfig::load(&path).unwrap();
        assert_eq!(config.assets_base, dir.path().parent().unwrap().join("cats"));

        let mut config = AssetMappingConfig {
            assets_base: PathBuf::from("assets/cats"),
            default_category: String::new(),
            categories: HashMap::new(),
        };
        config.normalize(&project_root(Path::new("asset_mapping.json")));
        assert_eq!(config.assets_base, PathBuf::from("assets/cats"));
    }

    #[test]
    fn test_empty_process_name_is_allowed() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "context_rules.json",
            r#"{"rules": [{"process": [""], "category": "unknown"}]}"#,
        );

        let config = ContextRulesConfig::load(&path).unwrap();
        assert_eq!(config.rules[0].process, vec![String::new()]);
    }

    #[test]
    fn test_env_overrides_rules() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "context_rules.json",
            r#"{"default_category": "idle", "poll_interval_ms": 1000}"#,
        );

        std::env::set_var("DESKTOPCAT_TEST_RULES_DEFAULT_CATEGORY", "coding");
        std::env::set_var("DESKTOPCAT_TEST_RULES_POLL_INTERVAL_MS", "250");
        let config = ContextRulesConfig::load_with_env(&path, "DESKTOPCAT_TEST_RULES_").unwrap();
        std::env::remove_var("DESKTOPCAT_TEST_RULES_DEFAULT_CATEGORY");
        std::env::remove_var("DESKTOPCAT_TEST_RULES_POLL_INTERVAL_MS");

        assert_eq!(config.default_category, "coding");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_env_overrides_assets() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "asset_mapping.json",
            r#"{"default_category": "idle", "categories": {"idle": {"folder": "idle"}}}"#,
        );

        std::env::set_var("DESKTOPCAT_TEST_ASSETS_DEFAULT_CATEGORY", "gaming");
        let config = AssetMappingConfig::load_with_env(&path, "DESKTOPCAT_TEST_ASSETS_").unwrap();
        std::env::remove_var("DESKTOPCAT_TEST_ASSETS_DEFAULT_CATEGORY");

        assert_eq!(config.default_category, "gaming");
        assert_eq!(config.categories["idle"].folder, "idle");
    }
}
