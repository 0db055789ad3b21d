use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A security scheme `type`. Unknown kinds are preserved as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecuritySchemeType {
    ApiKey,
    Http,
    MutualTls,
    OAuth2,
    OpenIdConnect,
    Other(String),
}

impl SecuritySchemeType {
    pub fn as_str(&self) -> &str {
        match self {
            SecuritySchemeType::ApiKey => "apiKey",
            SecuritySchemeType::Http => "http",
            SecuritySchemeType::MutualTls => "mutualTLS",
            SecuritySchemeType::OAuth2 => "oauth2",
            SecuritySchemeType::OpenIdConnect => "openIdConnect",
            SecuritySchemeType::Other(other) => other,
        }
    }
}

impl From<String> for SecuritySchemeType {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "apiKey" => SecuritySchemeType::ApiKey,
            "http" => SecuritySchemeType::Http,
            "mutualTLS" => SecuritySchemeType::MutualTls,
            "oauth2" => SecuritySchemeType::OAuth2,
            "openIdConnect" => SecuritySchemeType::OpenIdConnect,
            _ => SecuritySchemeType::Other(kind),
        }
    }
}

impl From<SecuritySchemeType> for String {
    fn from(kind: SecuritySchemeType) -> Self {
        kind.as_str().to_string()
    }
}

/// Location of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

/// A security scheme definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: SecuritySchemeType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Header, query or cookie name for `apiKey` schemes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<ApiKeyLocation>,

    /// HTTP auth scheme (`basic`, `digest`, `bearer`, ...) for `http` schemes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
}

/// A security requirement: map of scheme name → required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;
