use indexmap::IndexMap;

use super::request::{RequestCookie, ResolvedRequest};
use crate::config::AuthSchemeConfig;
use crate::error::PlanError;
use crate::parse::security::{
    ApiKeyLocation, SecurityRequirement, SecurityScheme, SecuritySchemeType,
};
use crate::siege::config::{Login, SiegeConfig};

/// Configured value that makes bearer auth read the token from the
/// environment instead of the config file.
pub const BEARER_FROM_ENV: &str = "command";

/// Header template used for [`BEARER_FROM_ENV`].
pub const BEARER_ENV_TEMPLATE: &str = "Bearer ${OA2S_TOKEN}";

/// Credentials that have to travel with each individual request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    pub query: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
}

impl RequestCredentials {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.cookies.is_empty()
    }

    pub fn apply_to(&self, request: &mut ResolvedRequest) {
        if !self.query.is_empty() {
            let mut pairs = request.url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }
        let path = request.cookie_path();
        for (name, value) in &self.cookies {
            request.cookies.push(RequestCookie {
                name: name.clone(),
                value: value.clone(),
                path: path.clone(),
            });
        }
    }
}

/// Applies security requirements using the credentials from the `auth`
/// config section.
///
/// Per-request credentials (query and cookie API keys) are returned; run-wide
/// ones (header API keys, HTTP auth, mutual TLS) go straight into the
/// [`SiegeConfig`].
pub struct SecurityApplier<'a> {
    schemes: Option<&'a IndexMap<String, SecurityScheme>>,
    auth: &'a IndexMap<String, AuthSchemeConfig>,
}

impl<'a> SecurityApplier<'a> {
    pub fn new(
        schemes: Option<&'a IndexMap<String, SecurityScheme>>,
        auth: &'a IndexMap<String, AuthSchemeConfig>,
    ) -> Self {
        Self { schemes, auth }
    }

    pub fn apply(
        &self,
        requirements: &[SecurityRequirement],
        siege: &mut SiegeConfig,
    ) -> Result<RequestCredentials, PlanError> {
        let mut credentials = RequestCredentials::default();
        let mut applied: Vec<&str> = Vec::new();
        for requirement in requirements {
            for name in requirement.keys() {
                if applied.contains(&name.as_str()) {
                    continue;
                }
                self.apply_scheme(name, siege, &mut credentials)?;
                applied.push(name.as_str());
            }
        }
        Ok(credentials)
    }

    fn apply_scheme(
        &self,
        name: &str,
        siege: &mut SiegeConfig,
        credentials: &mut RequestCredentials,
    ) -> Result<(), PlanError> {
        let scheme = self
            .schemes
            .and_then(|schemes| schemes.get(name))
            .ok_or_else(|| PlanError::UnknownSecurityScheme(name.to_string()))?;
        let auth = self.auth.get(name);

        match scheme.scheme_type {
            SecuritySchemeType::ApiKey => {
                let key = auth
                    .and_then(|a| a.apikey.clone())
                    .ok_or_else(|| PlanError::UnconfiguredApiKey(name.to_string()))?;
                let param = scheme
                    .name
                    .clone()
                    .ok_or_else(|| incomplete(name, "name"))?;
                match scheme.location.ok_or_else(|| incomplete(name, "in"))? {
                    ApiKeyLocation::Query => credentials.query.push((param, key)),
                    ApiKeyLocation::Header => siege.add_header(&param, &key),
                    ApiKeyLocation::Cookie => credentials.cookies.push((param, key)),
                }
            }
            SecuritySchemeType::Http => {
                let creds = auth
                    .and_then(|a| a.creds.as_deref())
                    .ok_or_else(|| PlanError::UnconfiguredCredentials(name.to_string()))?;
                let http_scheme = scheme
                    .scheme
                    .as_deref()
                    .ok_or_else(|| incomplete(name, "scheme"))?;
                match http_scheme.to_ascii_lowercase().as_str() {
                    "basic" | "digest" => siege.login = Some(parse_login(name, creds)?),
                    "bearer" => {
                        if creds == BEARER_FROM_ENV {
                            siege.add_header("Authorization", BEARER_ENV_TEMPLATE);
                            log::warn!(
                                "bearer auth for `{name}` reads its token from OA2S_TOKEN; \
                                 set it to a current token before running Siege"
                            );
                        } else {
                            siege.add_header("Authorization", &format!("Bearer {creds}"));
                        }
                        log::warn!(
                            "the HTTP auth scheme `bearer` is supported on a best-effort basis; \
                             Siege doesn't handle token expiry"
                        );
                    }
                    _ => {
                        return Err(PlanError::UnsupportedSecurityScheme {
                            name: name.to_string(),
                            kind: format!("http/{http_scheme}"),
                        });
                    }
                }
            }
            SecuritySchemeType::MutualTls => {
                let (cert, key) = auth
                    .and_then(|a| a.cert.clone().zip(a.key.clone()))
                    .ok_or_else(|| PlanError::UnconfiguredMutualTls(name.to_string()))?;
                siege.ssl_cert = Some(cert);
                siege.ssl_key = Some(key);
            }
            SecuritySchemeType::OAuth2 | SecuritySchemeType::OpenIdConnect => {
                return Err(PlanError::UnsupportedSecurityScheme {
                    name: name.to_string(),
                    kind: scheme.scheme_type.as_str().to_string(),
                });
            }
            SecuritySchemeType::Other(ref kind) => {
                return Err(PlanError::UnrecognizedSecurityScheme {
                    name: name.to_string(),
                    kind: kind.clone(),
                });
            }
        }
        Ok(())
    }
}

fn incomplete(name: &str, field: &'static str) -> PlanError {
    PlanError::IncompleteSecurityScheme {
        name: name.to_string(),
        field,
    }
}

/// Parse `user:pass` or `user:pass:realm`.
fn parse_login(name: &str, creds: &str) -> Result<Login, PlanError> {
    let mut fields = creds.splitn(3, ':');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(user), Some(password), realm) => Ok(Login {
            user: user.to_string(),
            password: password.to_string(),
            realm: realm.filter(|r| !r.is_empty()).map(str::to_string),
        }),
        _ => Err(PlanError::MalformedCredentials(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::operation::HttpMethod;
    use url::Url;

    fn schemes(yaml: &str) -> IndexMap<String, SecurityScheme> {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn auth(yaml: &str) -> IndexMap<String, AuthSchemeConfig> {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn requirement(name: &str) -> Vec<SecurityRequirement> {
        let mut req = SecurityRequirement::new();
        req.insert(name.to_string(), Vec::new());
        vec![req]
    }

    fn apply(
        schemes_yaml: &str,
        auth_yaml: &str,
        name: &str,
    ) -> Result<(RequestCredentials, SiegeConfig), PlanError> {
        let schemes = schemes(schemes_yaml);
        let auth = auth(auth_yaml);
        let mut siege = SiegeConfig::default();
        let creds = SecurityApplier::new(Some(&schemes), &auth).apply(&requirement(name), &mut siege)?;
        Ok((creds, siege))
    }

    #[test]
    fn test_api_key_in_query() {
        let (creds, _) = apply(
            "key_auth: { type: apiKey, in: query, name: key }",
            "key_auth: { apikey: abc123 }",
            "key_auth",
        )
        .unwrap();

        let mut request = ResolvedRequest {
            method: HttpMethod::Get,
            url: Url::parse("https://api.test/users/42").unwrap(),
            payload: String::new(),
            media_type: String::new(),
            cookies: Vec::new(),
        };
        creds.apply_to(&mut request);
        assert_eq!(request.url.as_str(), "https://api.test/users/42?key=abc123");
    }

    #[test]
    fn test_api_key_in_header_and_cookie() {
        let (creds, siege) = apply(
            "hdr: { type: apiKey, in: header, name: X-Api-Key }",
            "hdr: { apikey: abc }",
            "hdr",
        )
        .unwrap();
        assert!(creds.is_empty());
        assert_eq!(siege.headers, vec![("X-Api-Key".to_string(), "abc".to_string())]);

        let (creds, _) = apply(
            "jar: { type: apiKey, in: cookie, name: session }",
            "jar: { apikey: s1 }",
            "jar",
        )
        .unwrap();
        let mut request = ResolvedRequest {
            method: HttpMethod::Post,
            url: Url::parse("https://api.test/a?x=1").unwrap(),
            payload: "{}".to_string(),
            media_type: "application/json".to_string(),
            cookies: Vec::new(),
        };
        creds.apply_to(&mut request);
        assert_eq!(
            request.cookies,
            vec![RequestCookie {
                name: "session".to_string(),
                value: "s1".to_string(),
                path: "https://api.test/a".to_string(),
            }]
        );
    }

    #[test]
    fn test_basic_credentials() {
        let (_, siege) = apply(
            "basic: { type: http, scheme: basic }",
            "basic: { creds: 'alice:secret' }",
            "basic",
        )
        .unwrap();
        assert_eq!(siege.login.unwrap().to_string(), "alice:secret");

        let (_, siege) = apply(
            "digest: { type: http, scheme: Digest }",
            "digest: { creds: 'alice:secret:realm' }",
            "digest",
        )
        .unwrap();
        assert_eq!(siege.login.unwrap().realm.as_deref(), Some("realm"));

        let err = apply(
            "basic: { type: http, scheme: basic }",
            "basic: { creds: alice }",
            "basic",
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::MalformedCredentials(ref n) if n == "basic"));
    }

    #[test]
    fn test_bearer() {
        let (_, siege) = apply(
            "token: { type: http, scheme: bearer }",
            "token: { creds: command }",
            "token",
        )
        .unwrap();
        assert_eq!(
            siege.headers,
            vec![("Authorization".to_string(), BEARER_ENV_TEMPLATE.to_string())]
        );

        let (_, siege) = apply(
            "token: { type: http, scheme: bearer }",
            "token: { creds: t0k3n }",
            "token",
        )
        .unwrap();
        assert_eq!(
            siege.headers,
            vec![("Authorization".to_string(), "Bearer t0k3n".to_string())]
        );
    }

    #[test]
    fn test_mutual_tls() {
        let (_, siege) = apply(
            "mtls: { type: mutualTLS }",
            "mtls: { cert: c.pem, key: k.pem }",
            "mtls",
        )
        .unwrap();
        assert_eq!(siege.ssl_cert.as_deref(), Some("c.pem"));
        assert_eq!(siege.ssl_key.as_deref(), Some("k.pem"));

        let err = apply("mtls: { type: mutualTLS }", "mtls: { cert: c.pem }", "mtls").unwrap_err();
        assert!(matches!(err, PlanError::UnconfiguredMutualTls(_)));
    }

    #[test]
    fn test_error_kinds() {
        let err = apply("a: { type: apiKey, in: query, name: k }", "{}", "missing").unwrap_err();
        assert!(matches!(err, PlanError::UnknownSecurityScheme(ref n) if n == "missing"));

        let err = apply("a: { type: apiKey, in: query, name: k }", "{}", "a").unwrap_err();
        assert!(matches!(err, PlanError::UnconfiguredApiKey(_)));

        let err = apply("h: { type: http, scheme: basic }", "{}", "h").unwrap_err();
        assert!(matches!(err, PlanError::UnconfiguredCredentials(_)));

        let err = apply("h: { type: http, scheme: negotiate }", "h: { creds: x }", "h").unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedSecurityScheme { ref kind, .. } if kind == "http/negotiate"));

        let err = apply("o: { type: oauth2 }", "{}", "o").unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedSecurityScheme { ref kind, .. } if kind == "oauth2"));

        let err = apply("o: { type: openIdConnect }", "{}", "o").unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedSecurityScheme { ref kind, .. } if kind == "openIdConnect"));

        let err = apply("x: { type: magic }", "{}", "x").unwrap_err();
        assert!(matches!(err, PlanError::UnrecognizedSecurityScheme { ref kind, .. } if kind == "magic"));
    }

    #[test]
    fn test_repeated_scheme_applies_once() {
        let schemes = schemes("key_auth: { type: apiKey, in: query, name: key }");
        let auth = auth("key_auth: { apikey: abc123 }");
        let mut requirements = requirement("key_auth");
        requirements.extend(requirement("key_auth"));

        let mut siege = SiegeConfig::default();
        let creds = SecurityApplier::new(Some(&schemes), &auth)
            .apply(&requirements, &mut siege)
            .unwrap();
        assert_eq!(creds.query, vec![("key".to_string(), "abc123".to_string())]);
    }
}
