use serde::Serialize;
use url::Url;

use crate::parse::operation::HttpMethod;

/// A cookie attached to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestCookie {
    pub name: String,
    pub value: String,
    /// The request URL (without query) the cookie is scoped to.
    pub path: String,
}

/// One fully resolved request: absolute URL, method, payload and cookies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// Serialized body; empty for bodiless requests.
    pub payload: String,
    /// Media type the payload was produced for; empty if none applies.
    pub media_type: String,
    pub cookies: Vec<RequestCookie>,
}

impl ResolvedRequest {
    /// The URL a cookie for this request is scoped to.
    pub fn cookie_path(&self) -> String {
        let mut scoped = self.url.clone();
        scoped.set_query(None);
        scoped.to_string()
    }

    /// One line of a Siege URL file.
    pub fn to_siege_line(&self) -> String {
        match (self.method, self.payload.is_empty()) {
            (HttpMethod::Get, _) => self.url.to_string(),
            (method, true) => format!("{} {}", self.url, method),
            (method, false) => format!("{} {} {}", self.url, method, self.payload),
        }
    }
}

/// Ordered requests; insertion order is the resolution order and is kept
/// as-is in every rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestBatch(Vec<ResolvedRequest>);

impl RequestBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: ResolvedRequest) {
        self.0.push(request);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedRequest> {
        self.0.iter()
    }

    pub fn as_mut_slice(&mut self) -> &mut [ResolvedRequest] {
        &mut self.0
    }

    /// Distinct non-empty media types, in first-seen order.
    pub fn media_types(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for request in &self.0 {
            let media_type = request.media_type.as_str();
            if !media_type.is_empty() && !seen.contains(&media_type) {
                seen.push(media_type);
            }
        }
        seen
    }

    /// The whole batch as a Siege URL file.
    pub fn render(&self) -> String {
        render_lines(self.0.iter())
    }

    /// Requests for `media_type` plus every request that has no media type.
    pub fn render_for_media_type(&self, media_type: &str) -> String {
        render_lines(
            self.0
                .iter()
                .filter(|r| r.media_type.is_empty() || r.media_type == media_type),
        )
    }
}

impl<'a> IntoIterator for &'a RequestBatch {
    type Item = &'a ResolvedRequest;
    type IntoIter = std::slice::Iter<'a, ResolvedRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn render_lines<'a>(requests: impl Iterator<Item = &'a ResolvedRequest>) -> String {
    let mut out = String::new();
    for request in requests {
        out.push_str(&request.to_siege_line());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: HttpMethod, url: &str, payload: &str, media_type: &str) -> ResolvedRequest {
        ResolvedRequest {
            method,
            url: Url::parse(url).unwrap(),
            payload: payload.to_string(),
            media_type: media_type.to_string(),
            cookies: Vec::new(),
        }
    }

    #[test]
    fn test_siege_lines() {
        let get = request(HttpMethod::Get, "https://api.test/users?x=1", "", "");
        assert_eq!(get.to_siege_line(), "https://api.test/users?x=1");

        let head = request(HttpMethod::Head, "https://api.test/users", "", "");
        assert_eq!(head.to_siege_line(), "https://api.test/users HEAD");

        let post = request(
            HttpMethod::Post,
            "https://api.test/users",
            r#"{"a":1}"#,
            "application/json",
        );
        assert_eq!(
            post.to_siege_line(),
            r#"https://api.test/users POST {"a":1}"#
        );
    }

    #[test]
    fn test_zero_payload_is_kept() {
        let post = request(HttpMethod::Post, "https://api.test/n", "0", "application/json");
        assert_eq!(post.to_siege_line(), "https://api.test/n POST 0");
    }

    #[test]
    fn test_cookie_path_drops_query() {
        let get = request(HttpMethod::Get, "https://api.test/users?x=1", "", "");
        assert_eq!(get.cookie_path(), "https://api.test/users");
    }

    #[test]
    fn test_media_type_partitioning() {
        let mut batch = RequestBatch::new();
        batch.push(request(HttpMethod::Get, "https://api.test/a", "", ""));
        batch.push(request(HttpMethod::Post, "https://api.test/b", "{}", "application/json"));
        batch.push(request(
            HttpMethod::Post,
            "https://api.test/b",
            "{}",
            "application/vnd.api+json",
        ));
        batch.push(request(HttpMethod::Put, "https://api.test/c", "[]", "application/json"));

        assert_eq!(
            batch.media_types(),
            vec!["application/json", "application/vnd.api+json"]
        );

        insta::assert_snapshot!(batch.render_for_media_type("application/json"), @r"
        https://api.test/a
        https://api.test/b POST {}
        https://api.test/c PUT []
        ");
        assert_eq!(
            batch.render_for_media_type("application/vnd.api+json"),
            "https://api.test/a\nhttps://api.test/b POST {}\n"
        );
    }
}
