//! Loader for service configuration with YAML + environment overlays.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults (every section is optional),
//! 2. an optional YAML file (`disclosure.yaml` by convention),
//! 3. inline YAML snippets (tests and the CLI),
//! 4. `DISCLOSURE__`-prefixed environment variables, `__` separating path
//!    segments (e.g. `DISCLOSURE__SERVER__PORT=8080`).
//!
//! After merging, `${VAR}` placeholders in any string value are expanded from
//! the process environment before the typed structs are materialised.
use config::{Config, ConfigError, Environment, File};
use disclosure_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "DISCLOSURE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DisclosureConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
    /// Extra name → source URL entries for the static resolver. Entries here
    /// override built-ins with the same normalized name.
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Client identity presented to the source site.
    pub user_agent: String,
    pub timeout_secs: u64,
    pub retries: usize,
    /// Responses larger than this are rejected as fetch failures.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".into(),
            timeout_secs: 15,
            retries: 2,
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            emit_stderr: true,
            filter: "info".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CandidateEntry {
    pub name: String,
    pub url: String,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct DisclosureConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for DisclosureConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DisclosureConfigLoader {
    /// Start from defaults; nothing is read until [`load`](Self::load).
    ///
    /// ```
    /// use disclosure_config::DisclosureConfigLoader;
    ///
    /// let config = DisclosureConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.server.port, 5000);
    /// assert_eq!(config.fetch.user_agent, "Mozilla/5.0");
    /// assert!(config.candidates.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is merged only if present, so deployments can run
    /// purely from environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use disclosure_config::DisclosureConfigLoader;
    ///
    /// let cfg = DisclosureConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// server:
    ///   port: 8088
    /// candidates:
    ///   - name: "Jane Doe"
    ///     url: "https://example.org/candidate/1"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.server.port, 8088);
    /// assert_eq!(cfg.server.host, "127.0.0.1");
    /// assert_eq!(cfg.candidates.len(), 1);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// Environment overrides are layered last, then `${VAR}` placeholders are
    /// expanded and the result is validated.
    pub fn load(self) -> Result<DisclosureConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: DisclosureConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}

impl DisclosureConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(ConfigError::Message(
                "fetch.user_agent must not be empty".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "fetch.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.fetch.max_body_bytes == 0 {
            return Err(ConfigError::Message(
                "fetch.max_body_bytes must be greater than zero".into(),
            ));
        }
        if let Some(entry) = self.candidates.iter().find(|c| c.name.trim().is_empty()) {
            return Err(ConfigError::Message(format!(
                "candidate entry for {} has an empty name",
                entry.url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_inside_candidate_list() {
        temp_env::with_var("SOURCE_HOST", Some("mirror.example.org"), || {
            let mut v = json!({
                "candidates": [
                    { "name": "Jane Doe", "url": "https://${SOURCE_HOST}/c/1" }
                ],
                "server": { "port": 5000 }
            });
            expand_env_in_value(&mut v);
            assert_eq!(v["candidates"][0]["url"], "https://mirror.example.org/c/1");
            assert_eq!(v["server"]["port"], 5000);
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_DISCLOSURE}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_DISCLOSURE}"));
    }

    #[test]
    fn rejects_empty_user_agent() {
        let err = DisclosureConfigLoader::new()
            .with_yaml_str("fetch:\n  user_agent: '  '\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("user_agent"));
    }

    #[test]
    fn rejects_unnamed_candidate() {
        let err = DisclosureConfigLoader::new()
            .with_yaml_str("candidates:\n  - name: ''\n    url: 'https://example.org/x'\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("empty name"));
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let server = ServerConfig {
            host: "0.0.0.0".into(),
            port: 8080,
        };
        assert_eq!(server.bind_addr(), "0.0.0.0:8080");
    }
}
