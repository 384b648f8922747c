//! OpenAPI document access for the execution pipeline.
//!
//! Locates the newest API description in a directory, parses it by file
//! extension, resolves the base URL from its first server and validates
//! response bodies against the documented response schemas.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

mod validator;

pub use validator::OpenApiSchemaValidator;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Failures the engine reports verbatim as the run error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OpenApiError {
    #[error("No OpenAPI spec found in {}", dir.display())]
    NoDocument { dir: PathBuf },
    #[error("No servers defined in OpenAPI spec")]
    NoServers,
}

/// A parsed API description and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenApiDocument {
    pub path: PathBuf,
    pub value: Value,
}

impl OpenApiDocument {
    /// Parse `path` as YAML when it ends in `.yaml`/`.yml`, JSON otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
        let value = if is_yaml(path) {
            serde_yaml::from_str(&text).with_context(|| format!("parse yaml {path:?}"))?
        } else {
            serde_json::from_str(&text).with_context(|| format!("parse json {path:?}"))?
        };
        Ok(Self {
            path: path.to_path_buf(),
            value,
        })
    }

    /// Newest document in `dir`.
    pub fn load_latest(dir: &Path) -> Result<Self> {
        let path = find_latest_document(dir)?;
        Self::load(&path)
    }

    pub fn base_url(&self) -> Result<String, OpenApiError> {
        base_url(&self.value)
    }
}

/// The most recently modified `.json`, `.yaml` or `.yml` file directly in
/// `dir`. Equal modification times are broken by file name, last wins.
pub fn find_latest_document(dir: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("read {dir:?}"))?;
    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.with_context(|| format!("read {dir:?}"))?;
        let path = entry.path();
        if !path.is_file() || !has_document_extension(&path) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .with_context(|| format!("stat {path:?}"))?;
        let newer = match &best {
            None => true,
            Some((t, p)) => (modified, &path) > (*t, p),
        };
        if newer {
            best = Some((modified, path));
        }
    }
    best.map(|(_, p)| p).ok_or_else(|| {
        OpenApiError::NoDocument {
            dir: dir.to_path_buf(),
        }
        .into()
    })
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn has_document_extension(path: &Path) -> bool {
    extension(path).is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e.as_str()))
}

fn is_yaml(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("yaml" | "yml"))
}

/// `servers[0].url` with `{variable}` defaults filled in, trailing `/` removed.
pub fn base_url(doc: &Value) -> Result<String, OpenApiError> {
    let server = doc
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .ok_or(OpenApiError::NoServers)?;
    let mut url = server
        .get("url")
        .and_then(Value::as_str)
        .ok_or(OpenApiError::NoServers)?
        .to_string();
    if let Some(vars) = server.get("variables").and_then(Value::as_object) {
        for (name, var) in vars {
            if let Some(default) = var.get("default").and_then(Value::as_str) {
                url = url.replace(&format!("{{{name}}}"), default);
            }
        }
    }
    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn touch(path: &Path, secs: u64) {
        let f = std::fs::File::options().write(true).open(path).unwrap();
        f.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let doc = json!({"servers": [{"url": "http://localhost:8080/api/"}, {"url": "http://other"}]});
        assert_eq!(base_url(&doc).unwrap(), "http://localhost:8080/api");
    }

    #[test]
    fn base_url_substitutes_variable_defaults() {
        let doc = json!({"servers": [{
            "url": "https://{env}.example.com:{port}/v1",
            "variables": {"env": {"default": "staging"}, "port": {"default": "8443"}}
        }]});
        assert_eq!(base_url(&doc).unwrap(), "https://staging.example.com:8443/v1");
    }

    #[test]
    fn missing_servers() {
        assert_eq!(base_url(&json!({})), Err(OpenApiError::NoServers));
        assert_eq!(base_url(&json!({"servers": []})), Err(OpenApiError::NoServers));
        assert_eq!(
            OpenApiError::NoServers.to_string(),
            "No servers defined in OpenAPI spec"
        );
    }

    #[test]
    fn latest_document_by_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("b.json");
        let new = dir.path().join("a.yaml");
        std::fs::write(&old, "{}").unwrap();
        std::fs::write(&new, "openapi: 3.0.0").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        touch(&old, 1_000);
        touch(&new, 2_000);
        assert_eq!(find_latest_document(dir.path()).unwrap(), new);
    }

    #[test]
    fn equal_mtimes_break_ties_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.yml");
        std::fs::write(&a, "{}").unwrap();
        std::fs::write(&b, "{}").unwrap();
        touch(&a, 5_000);
        touch(&b, 5_000);
        assert_eq!(find_latest_document(dir.path()).unwrap(), b);
    }

    #[test]
    fn no_document_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "x").unwrap();
        let err = find_latest_document(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("No OpenAPI spec found in"));
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_latest_document(&dir.path().join("output")).is_err());
    }

    #[test]
    fn load_parses_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("api.YML");
        std::fs::write(&yaml, "servers:\n  - url: http://localhost:3000/\n").unwrap();
        let doc = OpenApiDocument::load(&yaml).unwrap();
        assert_eq!(doc.base_url().unwrap(), "http://localhost:3000");

        let json = dir.path().join("api.json");
        std::fs::write(&json, r#"{"servers": [{"url": "http://x"}]}"#).unwrap();
        assert_eq!(OpenApiDocument::load(&json).unwrap().base_url().unwrap(), "http://x");
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("api.json");
        std::fs::write(&bad, "{not json").unwrap();
        let err = OpenApiDocument::load(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("api.json"));
    }
}
