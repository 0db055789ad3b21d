use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::SiegeSection;

/// Hosts Siege's HTML parser never follows, as in Siege's own defaults.
const NOFOLLOW_DEFAULTS: [&str; 4] = [
    "ad.doubleclick.net",
    "pagead2.googlesyndication.com",
    "ads.pubsqrd.com",
    "ib.adnxs.com",
];

/// `user:password[:realm]` credentials for Siege's `login` setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Login {
    pub user: String,
    pub password: String,
    pub realm: Option<String>,
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.realm {
            Some(ref realm) => write!(f, "{}:{}:{}", self.user, self.password, realm),
            None => write!(f, "{}:{}", self.user, self.password),
        }
    }
}

/// A Siege `.siegerc`-style run configuration.
///
/// Plain fields always render; `Option` fields render only when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiegeConfig {
    /// Siege variables, rendered before every other setting.
    pub variables: IndexMap<String, String>,
    pub verbose: bool,
    pub color: bool,
    pub quiet: bool,
    pub json_output: bool,
    pub show_logfile: bool,
    pub logging: bool,
    pub logfile: Option<String>,
    /// Method Siege uses for GET lines; `HEAD` unless overridden.
    pub gmethod: String,
    pub parser: bool,
    pub nofollow: Vec<String>,
    pub limit: u32,
    pub protocol: String,
    pub chunked: bool,
    pub cache: bool,
    pub connection: String,
    pub concurrent: u32,
    pub time: Option<String>,
    pub reps: Option<u32>,
    pub delay: f64,
    /// URL file this configuration drives.
    pub file: Option<String>,
    pub timeout: Option<u32>,
    pub cookies: bool,
    pub internet: bool,
    pub benchmark: bool,
    pub user_agent: Option<String>,
    pub accept_encoding: String,
    pub url_escaping: bool,
    pub login: Option<Login>,
    pub unique: bool,
    pub ssl_cert: Option<String>,
    pub ssl_key: Option<String>,
    pub follow_location: bool,
    /// Headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for SiegeConfig {
    fn default() -> Self {
        Self {
            variables: IndexMap::new(),
            verbose: true,
            color: true,
            quiet: false,
            json_output: true,
            show_logfile: true,
            logging: false,
            logfile: None,
            gmethod: "HEAD".to_string(),
            parser: true,
            nofollow: NOFOLLOW_DEFAULTS.iter().map(|h| h.to_string()).collect(),
            limit: 255,
            protocol: "HTTP/1.1".to_string(),
            chunked: true,
            cache: false,
            connection: "close".to_string(),
            concurrent: 25,
            time: None,
            reps: None,
            delay: 0.0,
            file: None,
            timeout: None,
            cookies: true,
            internet: false,
            benchmark: false,
            user_agent: None,
            accept_encoding: "gzip, deflate".to_string(),
            url_escaping: true,
            login: None,
            unique: true,
            ssl_cert: None,
            ssl_key: None,
            follow_location: true,
            headers: Vec::new(),
        }
    }
}

/// What a field contributes to the rendered file.
enum Setting {
    Omit,
    One(String),
    Many(Vec<String>),
}

struct ConfigField {
    key: &'static str,
    render: fn(&SiegeConfig) -> Setting,
}

fn flag(value: bool) -> Setting {
    Setting::One(value.to_string())
}

fn text(value: &str) -> Setting {
    Setting::One(value.to_string())
}

fn optional<T: ToString>(value: &Option<T>) -> Setting {
    match value {
        Some(v) => Setting::One(v.to_string()),
        None => Setting::Omit,
    }
}

/// Rendering order of every setting after the variables.
const FIELDS: &[ConfigField] = &[
    ConfigField { key: "verbose", render: |c| flag(c.verbose) },
    ConfigField {
        key: "color",
        render: |c| text(if c.color { "on" } else { "off" }),
    },
    ConfigField { key: "quiet", render: |c| flag(c.quiet) },
    ConfigField { key: "json_output", render: |c| flag(c.json_output) },
    ConfigField { key: "show-logfile", render: |c| flag(c.show_logfile) },
    ConfigField { key: "logging", render: |c| flag(c.logging) },
    ConfigField { key: "logfile", render: |c| optional(&c.logfile) },
    ConfigField { key: "gmethod", render: |c| text(&c.gmethod) },
    ConfigField { key: "parser", render: |c| flag(c.parser) },
    ConfigField {
        key: "nofollow",
        render: |c| Setting::Many(c.nofollow.clone()),
    },
    ConfigField { key: "limit", render: |c| Setting::One(c.limit.to_string()) },
    ConfigField { key: "protocol", render: |c| text(&c.protocol) },
    ConfigField { key: "chunked", render: |c| flag(c.chunked) },
    ConfigField { key: "cache", render: |c| flag(c.cache) },
    ConfigField { key: "connection", render: |c| text(&c.connection) },
    ConfigField {
        key: "concurrent",
        render: |c| Setting::One(c.concurrent.to_string()),
    },
    ConfigField { key: "time", render: |c| optional(&c.time) },
    ConfigField { key: "reps", render: |c| optional(&c.reps) },
    ConfigField { key: "delay", render: |c| Setting::One(c.delay.to_string()) },
    ConfigField { key: "file", render: |c| optional(&c.file) },
    ConfigField { key: "timeout", render: |c| optional(&c.timeout) },
    ConfigField { key: "cookies", render: |c| flag(c.cookies) },
    ConfigField { key: "internet", render: |c| flag(c.internet) },
    ConfigField { key: "benchmark", render: |c| flag(c.benchmark) },
    ConfigField { key: "user-agent", render: |c| optional(&c.user_agent) },
    ConfigField { key: "accept-encoding", render: |c| text(&c.accept_encoding) },
    ConfigField { key: "url-escaping", render: |c| flag(c.url_escaping) },
    ConfigField { key: "login", render: |c| optional(&c.login) },
    ConfigField { key: "unique", render: |c| flag(c.unique) },
    ConfigField { key: "ssl-cert", render: |c| optional(&c.ssl_cert) },
    ConfigField { key: "ssl-key", render: |c| optional(&c.ssl_key) },
    ConfigField { key: "follow-location", render: |c| flag(c.follow_location) },
    ConfigField {
        key: "header",
        render: |c| {
            Setting::Many(
                c.headers
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect(),
            )
        },
    },
];

impl SiegeConfig {
    /// Add a global header unless the identical header is already present.
    pub fn add_header(&mut self, name: &str, value: &str) {
        if !self.headers.iter().any(|(n, v)| n == name && v == value) {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }

    /// Apply the user's overrides from the `siege` config section.
    pub fn apply_overrides(&mut self, section: &SiegeSection) {
        self.variables
            .extend(section.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(concurrent) = section.concurrent {
            self.concurrent = concurrent;
        }
        if let Some(reps) = section.reps {
            self.reps = Some(reps);
        }
        if let Some(ref time) = section.time {
            self.time = Some(time.clone());
        }
        if let Some(delay) = section.delay {
            self.delay = delay;
        }
        if let Some(timeout) = section.timeout {
            self.timeout = Some(timeout);
        }
        if let Some(ref user_agent) = section.user_agent {
            self.user_agent = Some(user_agent.clone());
        }
        if let Some(benchmark) = section.benchmark {
            self.benchmark = benchmark;
        }
        if let Some(verbose) = section.verbose {
            self.verbose = verbose;
        }
    }

    /// Render as `key = value` lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.variables {
            out.push_str(&format!("{name} = {value}\n"));
        }
        for field in FIELDS {
            match (field.render)(self) {
                Setting::Omit => {}
                Setting::One(value) => out.push_str(&format!("{} = {}\n", field.key, value)),
                Setting::Many(values) => {
                    for value in values {
                        out.push_str(&format!("{} = {}\n", field.key, value));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render() {
        insta::assert_snapshot!(SiegeConfig::default().render(), @r"
        verbose = true
        color = on
        quiet = false
        json_output = true
        show-logfile = true
        logging = false
        gmethod = HEAD
        parser = true
        nofollow = ad.doubleclick.net
        nofollow = pagead2.googlesyndication.com
        nofollow = ads.pubsqrd.com
        nofollow = ib.adnxs.com
        limit = 255
        protocol = HTTP/1.1
        chunked = true
        cache = false
        connection = close
        concurrent = 25
        delay = 0
        cookies = true
        internet = false
        benchmark = false
        accept-encoding = gzip, deflate
        url-escaping = true
        unique = true
        follow-location = true
        ");
    }

    #[test]
    fn test_optional_settings_render_when_set() {
        let mut config = SiegeConfig::default();
        config.variables.insert("HOST".to_string(), "api.test".to_string());
        config.file = Some("urls.txt".to_string());
        config.reps = Some(0);
        config.login = Some(Login {
            user: "alice".to_string(),
            password: "secret".to_string(),
            realm: None,
        });
        config.add_header("X-Api-Key", "abc");
        config.add_header("X-Api-Key", "abc");

        let rendered = config.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "HOST = api.test");
        assert!(lines.contains(&"file = urls.txt"));
        // Zero is a real value, not an absent one.
        assert!(lines.contains(&"reps = 0"));
        assert!(lines.contains(&"login = alice:secret"));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("header = ")).count(),
            1
        );
        assert_eq!(lines.last(), Some(&"header = X-Api-Key: abc"));
    }

    #[test]
    fn test_login_with_realm() {
        let login = Login {
            user: "u".to_string(),
            password: "p".to_string(),
            realm: Some("r".to_string()),
        };
        assert_eq!(login.to_string(), "u:p:r");
    }

    #[test]
    fn test_apply_overrides() {
        let section = SiegeSection {
            concurrent: Some(50),
            time: Some("1M".to_string()),
            delay: Some(0.5),
            benchmark: Some(true),
            ..Default::default()
        };
        let mut config = SiegeConfig::default();
        config.apply_overrides(&section);
        assert_eq!(config.concurrent, 50);
        assert_eq!(config.time.as_deref(), Some("1M"));
        assert_eq!(config.delay, 0.5);
        assert!(config.benchmark);
        assert!(config.verbose);
        assert!(config.reps.is_none());
    }
}
