pub mod config;
pub mod cookies;
pub mod url_list;

use std::fs;
use std::path::{Path, PathBuf};

use crate::GeneratedFile;
use crate::config::SiegeSection;
use crate::error::OutputError;
use crate::plan::Plan;
use cookies::CookieJar;
use url_list::Partition;

/// Files for a finished plan, plus the partitions they were built from.
#[derive(Debug, Clone)]
pub struct SiegeOutput {
    pub files: Vec<GeneratedFile>,
    pub partitions: Vec<Partition>,
}

/// Render a plan into the cookie jar, URL files and configuration files.
/// Nothing is written here.
pub fn render_outputs(plan: &Plan, section: &SiegeSection) -> Result<SiegeOutput, OutputError> {
    let mut files = vec![GeneratedFile {
        path: PathBuf::from(&section.cookies),
        content: CookieJar::from_batch(&plan.requests).to_json()?,
    }];

    let partitions = url_list::partition(
        &plan.requests,
        Path::new(&section.urls),
        Path::new(&section.config),
    );
    for part in &partitions {
        let mut siege = plan.siege.clone();
        siege.file = Some(part.urls_path.display().to_string());
        files.push(GeneratedFile {
            path: part.urls_path.clone(),
            content: part.urls.clone(),
        });
        files.push(GeneratedFile {
            path: part.config_path.clone(),
            content: siege.render(),
        });
    }

    Ok(SiegeOutput { files, partitions })
}

/// Write files relative to `base`, creating parent directories as needed.
pub fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<(), OutputError> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| OutputError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &file.content).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;
        log::debug!("wrote {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::operation::HttpMethod;
    use crate::plan::{RequestBatch, ResolvedRequest};
    use crate::siege::config::SiegeConfig;
    use url::Url;

    fn plan() -> Plan {
        let mut requests = RequestBatch::new();
        requests.push(ResolvedRequest {
            method: HttpMethod::Post,
            url: Url::parse("https://api.test/widgets").unwrap(),
            payload: r#"{"name":"x"}"#.to_string(),
            media_type: "application/json".to_string(),
            cookies: Vec::new(),
        });
        Plan {
            requests,
            siege: SiegeConfig::default(),
        }
    }

    #[test]
    fn test_render_outputs() {
        let section = SiegeSection {
            urls: "out/urls.txt".to_string(),
            config: "out/siege.conf".to_string(),
            ..Default::default()
        };
        let output = render_outputs(&plan(), &section).unwrap();
        let paths: Vec<&Path> = output.files.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("cookies.txt"),
                Path::new("out/urls.txt"),
                Path::new("out/siege.conf")
            ]
        );
        assert_eq!(output.files[0].content, "[]\n");
        assert_eq!(
            output.files[1].content,
            "https://api.test/widgets POST {\"name\":\"x\"}\n"
        );
        assert!(output.files[2].content.contains("file = out/urls.txt\n"));
        assert_eq!(
            output.partitions[0].media_type.as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn test_write_files_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = render_outputs(
            &plan(),
            &SiegeSection {
                urls: "nested/urls.txt".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        write_files(dir.path(), &output.files).unwrap();

        let urls = fs::read_to_string(dir.path().join("nested/urls.txt")).unwrap();
        assert!(urls.starts_with("https://api.test/widgets POST"));
        assert!(dir.path().join("cookies.txt").exists());
        assert!(dir.path().join("siege.conf").exists());
    }
}
