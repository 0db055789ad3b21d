use std::fmt;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::parse::operation::HttpMethod;

/// Top-level project configuration loaded from `oa2s.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Path of the (root) OpenAPI document to convert.
    pub spec: String,
    pub server: ServerConfig,
    /// Credentials keyed by security scheme name.
    pub auth: IndexMap<String, AuthSchemeConfig>,
    /// Per-path, per-method parameter values and payloads.
    pub paths: IndexMap<String, PathConfig>,
    pub siege: SiegeSection,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            spec: "openapi.yaml".to_string(),
            server: ServerConfig::default(),
            auth: IndexMap::new(),
            paths: IndexMap::new(),
            siege: SiegeSection::default(),
        }
    }
}

/// How the base URL is picked from the document's `servers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub use_first: bool,
    /// Select the server whose `description` equals this value.
    pub description: Option<String>,
    /// Overrides for server URL template variables.
    pub variables: IndexMap<String, String>,
}

/// Credentials for one security scheme. Which fields are read depends on the
/// scheme kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSchemeConfig {
    /// `apiKey` schemes.
    pub apikey: Option<String>,
    /// `http` schemes: `user:pass[:realm]` or a bearer token (`command` to
    /// read it from the environment at load time).
    pub creds: Option<String>,
    /// `mutualTLS` client certificate path.
    pub cert: Option<String>,
    /// `mutualTLS` client key path.
    pub key: Option<String>,
}

/// Method blocks for a single path, keyed by lowercase method name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PathConfig(pub IndexMap<String, OperationConfig>);

impl PathConfig {
    pub fn method(&self, method: HttpMethod) -> Option<&OperationConfig> {
        self.0.get(method.key())
    }
}

/// Values for one operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    pub params: IndexMap<String, ParamValue>,
    /// Literal payloads keyed by media type, used verbatim.
    pub payloads: IndexMap<String, String>,
}

/// A configured parameter value. YAML scalars of any kind are accepted so
/// that `id: 42` works as well as `id: "42"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Output locations and optional overrides of Siege's own defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiegeSection {
    pub urls: String,
    pub cookies: String,
    pub config: String,
    /// Siege variables, e.g. `OA2S_TOKEN` for bearer templates.
    pub variables: IndexMap<String, String>,
    pub concurrent: Option<u32>,
    pub reps: Option<u32>,
    /// Siege duration such as `90S`, `10M` or `1H`.
    pub time: Option<String>,
    pub delay: Option<f64>,
    pub timeout: Option<u32>,
    pub user_agent: Option<String>,
    pub benchmark: Option<bool>,
    pub verbose: Option<bool>,
}

impl Default for SiegeSection {
    fn default() -> Self {
        Self {
            urls: "urls.txt".to_string(),
            cookies: "cookies.txt".to_string(),
            config: "siege.conf".to_string(),
            variables: IndexMap::new(),
            concurrent: None,
            reps: None,
            time: None,
            delay: None,
            timeout: None,
            user_agent: None,
            benchmark: None,
            verbose: None,
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "oa2s.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ProjectConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# openapi2siege configuration
spec: openapi.yaml

server:
  use_first: false
  # description: Production     # pick the server with this description
  variables: {}
    # region: eu                 # overrides server variable defaults

auth: {}
  # api_key:                     # security scheme name from the spec
  #   apikey: abc123
  # basic_auth:
  #   creds: user:pass           # or user:pass:realm
  # bearer_auth:
  #   creds: command             # read the token from $OA2S_TOKEN
  # client_cert:
  #   cert: /path/to/cert.pem
  #   key: /path/to/key.pem

paths: {}
  # /users/{id}:
  #   get:
  #     params:
  #       id: "42"
  #   post:
  #     payloads:
  #       application/json: '{"name":"x"}'

siege:
  urls: urls.txt
  cookies: cookies.txt
  config: siege.conf
  # variables:
  #   OA2S_TOKEN: your-token     # used by `creds: command` bearer auth
  # concurrent: 25
  # reps: 10
  # time: 1M
  # delay: 0.5
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.spec, "openapi.yaml");
        assert!(!config.server.use_first);
        assert!(config.server.description.is_none());
        assert!(config.auth.is_empty());
        assert!(config.paths.is_empty());
        assert_eq!(config.siege.urls, "urls.txt");
        assert_eq!(config.siege.cookies, "cookies.txt");
        assert_eq!(config.siege.config, "siege.conf");
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
spec: api.yaml
server:
  description: Staging
  variables:
    region: eu
auth:
  api_key:
    apikey: abc123
  basic:
    creds: alice:secret:realm
paths:
  /users/{id}:
    get:
      params:
        id: 42
        verbose: true
    post:
      payloads:
        application/json: '{"name":"x"}'
siege:
  urls: out/urls.txt
  concurrent: 50
  time: 1M
"#;
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.spec, "api.yaml");
        assert_eq!(config.server.description.as_deref(), Some("Staging"));
        assert_eq!(config.server.variables["region"], "eu");
        assert_eq!(config.auth["api_key"].apikey.as_deref(), Some("abc123"));
        assert_eq!(
            config.auth["basic"].creds.as_deref(),
            Some("alice:secret:realm")
        );

        let users = &config.paths["/users/{id}"];
        let get = users.method(HttpMethod::Get).unwrap();
        assert_eq!(get.params["id"].to_string(), "42");
        assert_eq!(get.params["verbose"].to_string(), "true");
        let post = users.method(HttpMethod::Post).unwrap();
        assert_eq!(post.payloads["application/json"], r#"{"name":"x"}"#);
        assert!(users.method(HttpMethod::Delete).is_none());

        assert_eq!(config.siege.urls, "out/urls.txt");
        assert_eq!(config.siege.cookies, "cookies.txt");
        assert_eq!(config.siege.concurrent, Some(50));
        assert_eq!(config.siege.time.as_deref(), Some("1M"));
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = "spec: api.json\n";
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.spec, "api.json");
        // Defaults applied
        assert_eq!(config.siege.config, "siege.conf");
        assert!(config.paths.is_empty());
    }

    #[test]
    fn test_default_config_content_parses() {
        let config: ProjectConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.spec, "openapi.yaml");
        assert!(config.auth.is_empty());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }
}
