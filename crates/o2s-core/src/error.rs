use std::path::PathBuf;

use thiserror::Error;

use crate::parse::operation::HttpMethod;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("reference target not found: {0}")]
    RefTargetNotFound(String),
}

/// Fatal outcomes of fake payload synthesis.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("unknown schema type `{0}`; can't generate a value for it")]
    UnknownSchemaType(String),

    #[error("can't generate an array item for {0}: its item schema is `false`")]
    UnsynthesizableArray(String),

    #[error("schema still has no usable type after {attempts} attempts")]
    SynthesisExhausted { attempts: usize },

    #[error("allOf member produced `{0}`, expected an object")]
    NonObjectAllOfMember(String),

    #[error("circular schema reference {0} can't be synthesized")]
    CircularSchema(String),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

/// Everything that aborts a conversion pass.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("path `{path}` not configured; need `paths.{path}.{{method}}`")]
    UnconfiguredPath { path: String },

    #[error("`{method} {path}` not configured; need `paths.{path}.{key}`", key = .method.key())]
    UnconfiguredOperation { method: HttpMethod, path: String },

    #[error(
        "unconfigured value for `{name}` in {method} {path}, with no examples to draw from; \
         need `paths.{path}.{key}.params.{name}`",
        key = .method.key()
    )]
    MissingParameterConfig {
        method: HttpMethod,
        path: String,
        name: String,
    },

    #[error(
        "unconfigured payload for {media_type} in {method} {path}, and couldn't generate one; \
         need `paths.{path}.{key}.payloads.{media_type}`",
        key = .method.key()
    )]
    MissingPayloadConfig {
        method: HttpMethod,
        path: String,
        media_type: String,
    },

    #[error("unsupported media type {0}")]
    UnsupportedMediaType(String),

    #[error("failed to encode payload for {media_type}: {source}")]
    PayloadEncoding {
        media_type: String,
        source: serde_json::Error,
    },

    #[error("server variable `{0}` not set and its default is empty; need `server.variables.{0}`")]
    MissingServerVariable(String),

    #[error("no servers declared for {0}")]
    NoServers(String),

    #[error(
        "couldn't determine which server to use; set `server.description` or `server.use_first`"
    )]
    AmbiguousServer,

    #[error("server URL `{url}` is not an absolute URL: {source}")]
    InvalidServerUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("security scheme `{0}` is not defined in components.securitySchemes")]
    UnknownSecurityScheme(String),

    #[error("security scheme `{name}` doesn't declare `{field}`")]
    IncompleteSecurityScheme { name: String, field: &'static str },

    #[error("API key not configured for `{0}`; need `auth.{0}.apikey`")]
    UnconfiguredApiKey(String),

    #[error("credentials not configured for `{0}`; need `auth.{0}.creds`")]
    UnconfiguredCredentials(String),

    #[error("credentials for `{0}` must be `{{user}}:{{pass}}` or `{{user}}:{{pass}}:{{realm}}`")]
    MalformedCredentials(String),

    #[error("certificate and/or key not configured for `{0}`; need `auth.{0}.cert` and `auth.{0}.key`")]
    UnconfiguredMutualTls(String),

    #[error("unsupported security scheme `{kind}` used in `{name}`")]
    UnsupportedSecurityScheme { name: String, kind: String },

    #[error("unrecognized security scheme type `{kind}` used in `{name}`")]
    UnrecognizedSecurityScheme { name: String, kind: String },

    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
}

/// Failures while writing a finished plan to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode cookie jar: {0}")]
    CookieJar(#[from] serde_json::Error),
}
