use std::path::{Path, PathBuf};

use crate::plan::RequestBatch;

/// One URL file and the configuration file that points at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// `None` when the batch isn't split by media type.
    pub media_type: Option<String>,
    pub urls_path: PathBuf,
    pub config_path: PathBuf,
    pub urls: String,
}

/// Filename prefix for a media type: the last `/` segment, then the last `+`
/// segment of that, so `application/vnd.api+json` becomes `json`.
pub fn media_type_prefix(media_type: &str) -> &str {
    let subtype = media_type.rsplit('/').next().unwrap_or(media_type);
    subtype.rsplit('+').next().unwrap_or(subtype)
}

/// `dir/file` → `dir/{prefix}.file`.
pub fn prefix_filename(prefix: &str, path: &Path) -> PathBuf {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{prefix}.{file}"))
}

/// Split the batch into URL files.
///
/// With more than one media type every media type gets its own prefixed pair
/// of files, and requests without a media type appear in each of them.
/// Otherwise there's a single pair under the configured names. When two media
/// types share a prefix the later one uses its whole subtype, with `+`
/// replaced by `-`.
pub fn partition(batch: &RequestBatch, urls_path: &Path, config_path: &Path) -> Vec<Partition> {
    let media_types = batch.media_types();
    if media_types.len() <= 1 {
        return vec![Partition {
            media_type: media_types.first().map(|mt| mt.to_string()),
            urls_path: urls_path.to_path_buf(),
            config_path: config_path.to_path_buf(),
            urls: batch.render(),
        }];
    }

    let mut used: Vec<String> = Vec::new();
    media_types
        .into_iter()
        .map(|media_type| {
            let mut prefix = media_type_prefix(media_type).to_string();
            if used.contains(&prefix) {
                let subtype = media_type.rsplit('/').next().unwrap_or(media_type);
                prefix = subtype.replace('+', "-");
            }
            used.push(prefix.clone());
            Partition {
                media_type: Some(media_type.to_string()),
                urls_path: prefix_filename(&prefix, urls_path),
                config_path: prefix_filename(&prefix, config_path),
                urls: batch.render_for_media_type(media_type),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::operation::HttpMethod;
    use crate::plan::ResolvedRequest;
    use url::Url;

    fn request(method: HttpMethod, path: &str, payload: &str, media_type: &str) -> ResolvedRequest {
        ResolvedRequest {
            method,
            url: Url::parse("https://api.test").unwrap().join(path).unwrap(),
            payload: payload.to_string(),
            media_type: media_type.to_string(),
            cookies: Vec::new(),
        }
    }

    #[test]
    fn test_media_type_prefix() {
        assert_eq!(media_type_prefix("application/json"), "json");
        assert_eq!(media_type_prefix("application/vnd.api+json"), "json");
        assert_eq!(media_type_prefix("application/problem+xml"), "xml");
        assert_eq!(media_type_prefix("text"), "text");
    }

    #[test]
    fn test_prefix_filename() {
        assert_eq!(
            prefix_filename("json", Path::new("out/urls.txt")),
            PathBuf::from("out/json.urls.txt")
        );
        assert_eq!(
            prefix_filename("json", Path::new("siege.conf")),
            PathBuf::from("json.siege.conf")
        );
    }

    #[test]
    fn test_single_partition_without_media_types() {
        let mut batch = RequestBatch::new();
        batch.push(request(HttpMethod::Get, "/a", "", ""));
        let parts = partition(&batch, Path::new("urls.txt"), Path::new("siege.conf"));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].media_type, None);
        assert_eq!(parts[0].urls_path, PathBuf::from("urls.txt"));
        assert_eq!(parts[0].urls, "https://api.test/a\n");
    }

    #[test]
    fn test_partition_per_media_type() {
        let mut batch = RequestBatch::new();
        batch.push(request(HttpMethod::Get, "/a", "", ""));
        batch.push(request(HttpMethod::Post, "/b", "{}", "application/json"));
        batch.push(request(HttpMethod::Post, "/b", "{}", "application/merge-patch+json"));

        let parts = partition(&batch, Path::new("urls.txt"), Path::new("siege.conf"));
        let names: Vec<_> = parts
            .iter()
            .map(|p| (p.urls_path.clone(), p.config_path.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                (PathBuf::from("json.urls.txt"), PathBuf::from("json.siege.conf")),
                (
                    PathBuf::from("merge-patch-json.urls.txt"),
                    PathBuf::from("merge-patch-json.siege.conf")
                ),
            ]
        );
        assert_eq!(parts[0].urls, "https://api.test/a\nhttps://api.test/b POST {}\n");
    }
}
