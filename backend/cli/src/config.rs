use std::path::PathBuf;

/// Process-wide settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Optional directory for NDJSON log files
    pub log_dir: Option<PathBuf>,
    /// Recognition worker limit; `None` uses the available parallelism
    pub workers: Option<usize>,
    /// Path of the tesseract binary
    pub tesseract: PathBuf,
    pub openai_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
            workers: None,
            tesseract: PathBuf::from("tesseract"),
            openai_api_key: None,
            deepgram_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        Self {
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_dir: non_empty("TEXTRA_LOG_DIR").map(PathBuf::from),
            workers: non_empty("TEXTRA_WORKERS")
                .and_then(|w| w.trim().parse().ok())
                .filter(|&w: &usize| w > 0),
            tesseract: non_empty("TEXTRA_TESSERACT")
                .map(PathBuf::from)
                .unwrap_or(defaults.tesseract),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            deepgram_api_key: non_empty("DEEPGRAM_API_KEY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("TEXTRA_WORKERS", "3"),
            ("TEXTRA_TESSERACT", "/opt/bin/tesseract"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.tesseract, PathBuf::from("/opt/bin/tesseract"));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn ignores_unusable_worker_counts() {
        assert_eq!(config(&[("TEXTRA_WORKERS", "0")]).workers, None);
        assert_eq!(config(&[("TEXTRA_WORKERS", "many")]).workers, None);
    }
}
