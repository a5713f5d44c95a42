//! API key store
//!
//! Resolves the five secrets from three layers, highest priority first:
//!
//! 1. process environment (after `.env` has been loaded)
//! 2. `secrets.toml` (uppercase keys)
//! 3. `config.yaml`, `api_keys:` section (lowercase keys)
//!
//! An empty or placeholder value never shadows a lower layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::models::config::AppConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{normalize_token, AiProvider};
use crate::providers::{
    ApifyClient, GeminiClient, LlmClient, OpenAiClient, RetryPolicy, StatusError,
};
use crate::utils::constants::{
    mask_proxy_url, mask_secret, CONFIG_YAML_FILE, DEFAULT_CACHE_ENABLED, DEFAULT_DEBUG_MODE,
    DEFAULT_MAX_POSTS_PER_REQUEST, ENV_FILE, SECRETS_TOML_FILE, SECRET_KEYS,
};
use crate::utils::env_file::{is_placeholder, merge_env};

/// Key lookup used for the environment layer
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

// ============================================
// Types
// ============================================

/// Layer a secret was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSource {
    Env,
    SecretsToml,
    ConfigYaml,
    Missing,
}

impl SecretSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretSource::Env => "env",
            SecretSource::SecretsToml => "secrets.toml",
            SecretSource::ConfigYaml => "config.yaml",
            SecretSource::Missing => "missing",
        }
    }
}

/// A resolved secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretValue {
    pub value: String,
    pub source: SecretSource,
}

/// File format for `save`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Toml,
    Env,
    Yaml,
}

impl FromStr for SaveFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "toml" | "secrets" => Ok(SaveFormat::Toml),
            "env" | "dotenv" | ".env" => Ok(SaveFormat::Env),
            "yaml" | "yml" => Ok(SaveFormat::Yaml),
            _ => Err(AppError::new(
                ErrorCode::ConfigUnknownFormat,
                format!("Unknown save format '{}' (expected toml, env or yaml)", s),
            )),
        }
    }
}

/// Outcome of probing a service with its key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum KeyStatus {
    Valid,
    Invalid,
    ConnectionError(String),
    NotSet,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStatus::Valid => write!(f, "✅ Valid"),
            KeyStatus::Invalid => write!(f, "❌ Invalid"),
            KeyStatus::ConnectionError(e) => write!(f, "⚠️ Connection error: {}", e),
            KeyStatus::NotSet => write!(f, "⚪ Not set"),
        }
    }
}

/// Per-service results of `test_keys`
#[derive(Debug, Clone, Serialize)]
pub struct KeyTestReport {
    pub apify: KeyStatus,
    pub ai_provider: AiProvider,
    pub ai: KeyStatus,
}

/// Where the store reads from and writes to
#[derive(Debug, Clone)]
pub struct SecretsPaths {
    pub env_file: PathBuf,
    pub secrets_toml: PathBuf,
    pub config_yaml: PathBuf,
}

impl Default for SecretsPaths {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(ENV_FILE),
            secrets_toml: PathBuf::from(SECRETS_TOML_FILE),
            config_yaml: PathBuf::from(CONFIG_YAML_FILE),
        }
    }
}

impl SecretsPaths {
    pub fn for_format(&self, format: SaveFormat) -> &Path {
        match format {
            SaveFormat::Toml => &self.secrets_toml,
            SaveFormat::Env => &self.env_file,
            SaveFormat::Yaml => &self.config_yaml,
        }
    }
}

#[derive(Debug, Serialize)]
struct YamlAppSettings {
    debug_mode: bool,
    cache_enabled: bool,
    max_posts_per_request: usize,
}

/// `config.yaml` as written by `save`
#[derive(Debug, Serialize)]
struct YamlConfig {
    api_keys: BTreeMap<String, String>,
    app_settings: YamlAppSettings,
}

/// `config.yaml` as read back: only `api_keys`, everything else ignored
#[derive(Debug, Default, Deserialize)]
struct YamlKeys {
    #[serde(default)]
    api_keys: Option<BTreeMap<String, serde_yaml::Value>>,
}

// ============================================
// Store
// ============================================

pub struct SecretsStore {
    lookup: EnvLookup,
    paths: SecretsPaths,
    ai_provider: AiProvider,
    keys: RwLock<BTreeMap<&'static str, SecretValue>>,
}

impl SecretsStore {
    /// Process environment plus the default file locations
    pub fn from_env(ai_provider: AiProvider) -> Self {
        Self::with_sources(
            Arc::new(|key: &str| std::env::var(key).ok()),
            SecretsPaths::default(),
            ai_provider,
        )
    }

    pub fn with_sources(lookup: EnvLookup, paths: SecretsPaths, ai_provider: AiProvider) -> Self {
        let store = Self {
            lookup,
            paths,
            ai_provider,
            keys: RwLock::new(BTreeMap::new()),
        };
        store.reload();
        store
    }

    pub fn paths(&self) -> &SecretsPaths {
        &self.paths
    }

    pub fn ai_provider(&self) -> AiProvider {
        self.ai_provider
    }

    /// Re-read every layer
    pub fn reload(&self) {
        let toml_layer = read_toml_layer(&self.paths.secrets_toml);
        let yaml_layer = read_yaml_layer(&self.paths.config_yaml);

        let mut resolved = BTreeMap::new();
        for key in SECRET_KEYS {
            let upper = key.to_uppercase();
            let candidates = [
                ((self.lookup)(&upper), SecretSource::Env),
                (toml_layer.get(&upper).cloned(), SecretSource::SecretsToml),
                (yaml_layer.get(key).cloned(), SecretSource::ConfigYaml),
            ];
            let value = candidates
                .into_iter()
                .find_map(|(value, source)| {
                    value
                        .map(|v| v.trim().to_string())
                        .filter(|v| !is_placeholder(v))
                        .map(|value| SecretValue { value, source })
                })
                .unwrap_or(SecretValue {
                    value: String::new(),
                    source: SecretSource::Missing,
                });
            debug!("🔑 {} resolved from {}", key, value.source.as_str());
            resolved.insert(key, value);
        }

        if let Ok(mut keys) = self.keys.write() {
            *keys = resolved;
        }
    }

    /// Case-insensitive lookup; empty when absent
    pub fn get(&self, key: &str) -> String {
        self.entry(key).value
    }

    pub fn source(&self, key: &str) -> SecretSource {
        self.entry(key).source
    }

    fn entry(&self, key: &str) -> SecretValue {
        let key = key.to_lowercase();
        self.keys
            .read()
            .ok()
            .and_then(|keys| keys.get(key.as_str()).cloned())
            .unwrap_or(SecretValue {
                value: String::new(),
                source: SecretSource::Missing,
            })
    }

    pub fn is_set(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }

    /// Apify token plus the configured AI provider's key
    pub fn required_keys(&self) -> Vec<&'static str> {
        std::iter::once("apify_token")
            .chain(self.ai_provider.required_key())
            .collect()
    }

    pub fn missing_keys(&self) -> Vec<&'static str> {
        self.required_keys()
            .into_iter()
            .filter(|k| !self.is_set(k))
            .collect()
    }

    pub fn has_required_keys(&self) -> bool {
        self.missing_keys().is_empty()
    }

    /// Display form: first 4 characters + `****`; proxy credentials hidden
    pub fn masked(&self, key: &str) -> String {
        let value = self.get(key);
        if key.eq_ignore_ascii_case("proxy_url") {
            mask_proxy_url(&value)
        } else {
            mask_secret(&value)
        }
    }

    /// (key, masked value, source) for every secret
    pub fn summary(&self) -> Vec<(&'static str, String, SecretSource)> {
        SECRET_KEYS
            .iter()
            .map(|&k| (k, self.masked(k), self.source(k)))
            .collect()
    }

    /// Write `keys` in the given format and reload. Returns the written path.
    ///
    /// toml and yaml replace the file; env merges into an existing `.env`.
    pub fn save(&self, keys: &BTreeMap<String, String>, format: SaveFormat) -> AppResult<PathBuf> {
        let path = self.paths.for_format(format).to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let contents = match format {
            SaveFormat::Toml => render_toml(keys)?,
            SaveFormat::Env => {
                let existing = match fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                    Err(e) => return Err(e.into()),
                };
                merge_env(&existing, keys.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            }
            SaveFormat::Yaml => render_yaml(keys)?,
        };

        fs::write(&path, contents).map_err(|e| {
            AppError::with_source(
                ErrorCode::ConfigSecretsFile,
                format!("Failed to write {}", path.display()),
                e,
            )
        })?;
        info!("💾 Saved {} key(s) to {}", keys.len(), path.display());

        self.reload();
        Ok(path)
    }

    // ============================================
    // Clients
    // ============================================

    pub fn apify_client(&self, config: &AppConfig) -> Option<ApifyClient> {
        let token = self.get("apify_token");
        if token.is_empty() {
            return None;
        }
        let policy = RetryPolicy::new(config.max_retries, config.scraping_delay);
        match ApifyClient::new(token, config.timeout, policy) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("⚠️ Could not build Apify client: {}", e);
                None
            }
        }
    }

    /// Client for the configured AI provider, if its key is present
    pub fn llm_client(&self, config: &AppConfig) -> Option<LlmClient> {
        let key_name = self.ai_provider.required_key()?;
        let key = self.get(key_name);
        if key.is_empty() {
            return None;
        }
        let policy = RetryPolicy::new(config.max_retries, config.scraping_delay);
        let client = match self.ai_provider {
            AiProvider::Gemini => GeminiClient::new(key, config.timeout, policy).map(LlmClient::Gemini),
            AiProvider::OpenAi => OpenAiClient::new(key, config.timeout, policy).map(LlmClient::OpenAi),
            AiProvider::None => return None,
        };
        match client {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("⚠️ Could not build {} client: {}", self.ai_provider.as_str(), e);
                None
            }
        }
    }

    /// Probe Apify and the AI provider with the stored keys
    pub async fn test_keys(&self, config: &AppConfig) -> KeyTestReport {
        // Probes are single-shot
        let probe_config = AppConfig {
            max_retries: 0,
            ..config.clone()
        };

        let apify = match self.apify_client(&probe_config) {
            None => KeyStatus::NotSet,
            Some(client) => match client.verify_token().await {
                Ok(true) => KeyStatus::Valid,
                Ok(false) => KeyStatus::Invalid,
                Err(e) => KeyStatus::ConnectionError(e.to_string()),
            },
        };

        let ai = match self.llm_client(&probe_config) {
            None => KeyStatus::NotSet,
            Some(client) => match client.generate("Hello").await {
                Ok(_) => KeyStatus::Valid,
                Err(e) => match e.downcast_ref::<StatusError>() {
                    Some(s) if s.is_auth_failure() || s.status == 400 => KeyStatus::Invalid,
                    _ => KeyStatus::ConnectionError(e.to_string()),
                },
            },
        };

        info!("🔑 Key test: apify {:?}, {} {:?}", apify, self.ai_provider.as_str(), ai);
        KeyTestReport {
            apify,
            ai_provider: self.ai_provider,
            ai,
        }
    }
}

// ============================================
// File layers
// ============================================

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!("⚠️ Could not read {}: {}", path.display(), e);
            None
        }
    }
}

/// Uppercased string values of `secrets.toml`
fn read_toml_layer(path: &Path) -> BTreeMap<String, String> {
    let Some(text) = read_optional(path) else {
        return BTreeMap::new();
    };
    match text.parse::<toml::Table>() {
        Ok(table) => table
            .into_iter()
            .filter_map(|(k, v)| match v {
                toml::Value::String(s) => Some((k.to_uppercase(), s)),
                _ => None,
            })
            .collect(),
        Err(e) => {
            warn!("⚠️ Ignoring invalid {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Lowercased `api_keys:` entries of `config.yaml`
fn read_yaml_layer(path: &Path) -> BTreeMap<String, String> {
    let Some(text) = read_optional(path) else {
        return BTreeMap::new();
    };
    match serde_yaml::from_str::<Option<YamlKeys>>(&text) {
        Ok(config) => config
            .unwrap_or_default()
            .api_keys
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| {
                let value = match v {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((k.to_lowercase(), value))
            })
            .collect(),
        Err(e) => {
            warn!("⚠️ Ignoring invalid {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

fn render_toml(keys: &BTreeMap<String, String>) -> AppResult<String> {
    let table: toml::Table = keys
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_uppercase(), toml::Value::String(v.clone())))
        .collect();
    toml::to_string(&table).map_err(|e| {
        AppError::with_source(ErrorCode::ConfigSecretsFile, "Failed to render secrets.toml", e)
    })
}

fn render_yaml(keys: &BTreeMap<String, String>) -> AppResult<String> {
    let doc = YamlConfig {
        api_keys: keys
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect(),
        app_settings: YamlAppSettings {
            debug_mode: DEFAULT_DEBUG_MODE,
            cache_enabled: DEFAULT_CACHE_ENABLED,
            max_posts_per_request: DEFAULT_MAX_POSTS_PER_REQUEST,
        },
    };
    Ok(serde_yaml::to_string(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_paths(tag: &str) -> (PathBuf, SecretsPaths) {
        let dir = std::env::temp_dir().join(format!("insta_secrets_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let paths = SecretsPaths {
            env_file: dir.join(".env"),
            secrets_toml: dir.join("secrets.toml"),
            config_yaml: dir.join("config.yaml"),
        };
        (dir, paths)
    }

    fn env(pairs: &[(&str, &str)]) -> EnvLookup {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(move |key: &str| map.get(key).cloned())
    }

    #[test]
    fn test_layer_priority() {
        let (dir, paths) = temp_paths("priority");
        fs::write(
            &paths.secrets_toml,
            "APIFY_TOKEN = \"from_toml\"\nGEMINI_API_KEY = \"gem_toml\"\n",
        )
        .unwrap();
        fs::write(
            &paths.config_yaml,
            "api_keys:\n  apify_token: from_yaml\n  gemini_api_key: gem_yaml\n  proxy_url: http://u:p@host:8080\n",
        )
        .unwrap();

        let store = SecretsStore::with_sources(
            env(&[("APIFY_TOKEN", "from_env"), ("GEMINI_API_KEY", "")]),
            paths,
            AiProvider::Gemini,
        );

        assert_eq!(store.get("apify_token"), "from_env");
        assert_eq!(store.source("APIFY_TOKEN"), SecretSource::Env);
        // empty env value does not shadow the toml layer
        assert_eq!(store.get("gemini_api_key"), "gem_toml");
        assert_eq!(store.source("gemini_api_key"), SecretSource::SecretsToml);
        assert_eq!(store.get("proxy_url"), "http://u:p@host:8080");
        assert_eq!(store.source("proxy_url"), SecretSource::ConfigYaml);
        assert_eq!(store.source("openai_api_key"), SecretSource::Missing);
        assert!(store.has_required_keys());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_keys_follow_provider() {
        let (dir, paths) = temp_paths("missing");
        let store = SecretsStore::with_sources(
            env(&[("GEMINI_API_KEY", "g")]),
            paths.clone(),
            AiProvider::OpenAi,
        );
        assert_eq!(store.missing_keys(), vec!["apify_token", "openai_api_key"]);

        let store = SecretsStore::with_sources(env(&[("APIFY_TOKEN", "a")]), paths, AiProvider::None);
        assert!(store.has_required_keys());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_placeholders_are_unset() {
        let (dir, paths) = temp_paths("placeholder");
        let store = SecretsStore::with_sources(
            env(&[("APIFY_TOKEN", "your_apify_token_here")]),
            paths,
            AiProvider::Gemini,
        );
        assert!(!store.is_set("apify_token"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_masked() {
        let (dir, paths) = temp_paths("masked");
        let store = SecretsStore::with_sources(
            env(&[
                ("APIFY_TOKEN", "apify_api_123456"),
                ("PROXY_URL", "http://user:pw@proxy.example:8080"),
            ]),
            paths,
            AiProvider::Gemini,
        );
        assert_eq!(store.masked("apify_token"), "apif****");
        assert_eq!(store.masked("proxy_url"), "http://***@proxy.example:8080");
        assert_eq!(store.masked("gemini_api_key"), "");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_save_toml_and_reload() {
        let (dir, paths) = temp_paths("save_toml");
        let store = SecretsStore::with_sources(env(&[]), paths.clone(), AiProvider::Gemini);
        assert!(!store.is_set("apify_token"));

        let mut keys = BTreeMap::new();
        keys.insert("apify_token".to_string(), "tok_123".to_string());
        keys.insert("proxy_url".to_string(), String::new());
        let path = store.save(&keys, SaveFormat::Toml).unwrap();

        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("APIFY_TOKEN = \"tok_123\""));
        assert!(!written.contains("PROXY_URL"));
        assert_eq!(store.get("apify_token"), "tok_123");
        assert_eq!(store.source("apify_token"), SecretSource::SecretsToml);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_save_yaml_includes_app_settings() {
        let (dir, paths) = temp_paths("save_yaml");
        let store = SecretsStore::with_sources(env(&[]), paths, AiProvider::Gemini);

        let mut keys = BTreeMap::new();
        keys.insert("gemini_api_key".to_string(), "gk".to_string());
        let path = store.save(&keys, SaveFormat::Yaml).unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(doc["api_keys"]["gemini_api_key"], "gk");
        assert_eq!(doc["app_settings"]["debug_mode"], false);
        assert_eq!(doc["app_settings"]["cache_enabled"], true);
        assert_eq!(doc["app_settings"]["max_posts_per_request"], 100);
        assert_eq!(store.get("gemini_api_key"), "gk");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_yaml_keys_read_despite_partial_settings() {
        let (dir, paths) = temp_paths("yaml_partial");
        fs::write(
            &paths.config_yaml,
            "api_keys:\n  apify_token: tok_yaml\n  proxy_url: 8080\napp_settings:\n  debug_mode: true\ntheme: dark\n",
        )
        .unwrap();

        let store = SecretsStore::with_sources(env(&[]), paths.clone(), AiProvider::None);
        assert_eq!(store.get("apify_token"), "tok_yaml");
        assert_eq!(store.source("apify_token"), SecretSource::ConfigYaml);
        assert_eq!(store.get("proxy_url"), "8080");

        fs::write(&paths.config_yaml, "api_keys:\napp_settings: {}\n").unwrap();
        store.reload();
        assert_eq!(store.source("apify_token"), SecretSource::Missing);

        fs::write(&paths.config_yaml, "").unwrap();
        store.reload();
        assert!(!store.is_set("apify_token"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_save_env_merges() {
        let (dir, paths) = temp_paths("save_env");
        fs::write(&paths.env_file, "# mine\nTHEME=dark\nAPIFY_TOKEN=old\n").unwrap();
        let store = SecretsStore::with_sources(env(&[]), paths, AiProvider::Gemini);

        let mut keys = BTreeMap::new();
        keys.insert("apify_token".to_string(), "new".to_string());
        let path = store.save(&keys, SaveFormat::Env).unwrap();

        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "# mine\nTHEME=dark\nAPIFY_TOKEN=new\n"
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_save_format_parsing() {
        assert_eq!("TOML".parse::<SaveFormat>().unwrap(), SaveFormat::Toml);
        assert_eq!("yml".parse::<SaveFormat>().unwrap(), SaveFormat::Yaml);
        let err = "xml".parse::<SaveFormat>().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigUnknownFormat);
    }

    #[tokio::test]
    async fn test_keys_not_set_skip_network() {
        let (dir, paths) = temp_paths("probe");
        let store = SecretsStore::with_sources(env(&[]), paths, AiProvider::Gemini);
        let report = store.test_keys(&AppConfig::default()).await;
        assert_eq!(report.apify, KeyStatus::NotSet);
        assert_eq!(report.ai, KeyStatus::NotSet);
        let _ = fs::remove_dir_all(dir);
    }
}
