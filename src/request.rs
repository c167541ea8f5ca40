//! The input of a single run and its YAML configuration form.
use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// What to send, how many times, and how fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Target URL for the POST requests.
    pub url: String,
    /// Total number of requests to issue. Zero means no requests.
    pub amount: u64,
    /// Maximum number of requests issued per second. Zero means no requests.
    pub per_second: u32,
}

impl RequestSpec {
    /// Create a new request spec from direct parameters.
    pub fn new(url: impl Into<String>, amount: u64, per_second: u32) -> Self {
        Self { url: url.into(), amount, per_second }
    }

    /// Load a request spec from a YAML config file.
    ///
    /// The file has the shape:
    ///
    /// ```yaml
    /// url: http://localhost:8080/ingest
    /// requests:
    ///   amount: 100
    ///   per_second: 10
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::ConfigOpen { path: path.to_path_buf(), source: e })?;

        let config: FileConfig = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|e| Error::ConfigParse { path: path.to_path_buf(), source: e })?;

        #[cfg(feature = "tracing")]
        log::debug!("Loaded config from {}: {:?}", path.display(), config);

        Ok(config.into())
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    url: String,
    requests: Requests,
}

#[derive(Debug, Deserialize)]
struct Requests {
    amount: u64,
    per_second: u32,
}

impl From<FileConfig> for RequestSpec {
    fn from(config: FileConfig) -> Self {
        RequestSpec {
            url: config.url,
            amount: config.requests.amount,
            per_second: config.requests.per_second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    /// A scratch directory for config files, removed when dropped.
    struct ConfigDir(PathBuf);

    impl ConfigDir {
        fn new(test: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("requester-{}-{test}", std::process::id()));
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.0.join(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    impl Drop for ConfigDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_from_file() {
        let dir = ConfigDir::new("from-file");
        let path = dir.write(
            "ok.yaml",
            "url: http://example.com/ingest\nrequests:\n  amount: 100\n  per_second: 10\n",
        );
        let spec = RequestSpec::from_file(&path).unwrap();
        assert_eq!(spec, RequestSpec::new("http://example.com/ingest", 100, 10));
    }

    #[test]
    fn test_from_file_missing() {
        let path = PathBuf::from("/nonexistent/requester/cfg.yaml");
        let err = RequestSpec::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigOpen { path: p, .. } if p == path));
    }

    #[test]
    fn test_from_file_malformed() {
        let dir = ConfigDir::new("malformed");
        let path = dir.write("flat.yaml", "url: http://example.com\namount: 5\nper_second: 1\n");
        let err = RequestSpec::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));

        let path = dir.write("negative.yaml", "url: x\nrequests:\n  amount: -1\n  per_second: 1\n");
        assert!(matches!(RequestSpec::from_file(&path), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_config_dir_is_removed() {
        let dir = ConfigDir::new("cleanup");
        let path = dir.write("cfg.yaml", "url: http://example.com\nrequests:\n  amount: 1\n  per_second: 1\n");
        let root = dir.0.clone();
        assert!(path.exists());
        drop(dir);
        assert!(!root.exists());
    }
}
