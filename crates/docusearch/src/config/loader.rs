use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

pub const ENV_DATA_DIR: &str = "DOCUSEARCH_DATA_DIR";
pub const ENV_MAX_FILE_SIZE_MB: &str = "MAX_FILE_SIZE_MB";
pub const ENV_MAX_PAGES: &str = "MAX_PAGES_PER_DOCUMENT";

/// Loads a config file. See [`load_config_from_str`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = serde_json::from_str(content)?;

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Applies overrides from the process environment.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

/// Applies overrides using `lookup` as the variable source.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
        config.data_directory = PathBuf::from(dir);
    }
    if let Some(raw) = lookup(ENV_MAX_FILE_SIZE_MB) {
        config.limits.max_file_size_mb = parse_env(ENV_MAX_FILE_SIZE_MB, &raw)?;
    }
    if let Some(raw) = lookup(ENV_MAX_PAGES) {
        config.limits.max_pages_per_document = parse_env(ENV_MAX_PAGES, &raw)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.data_directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "data_directory must not be empty".to_string(),
        });
    }

    if config.limits.max_file_size_mb == 0 {
        return Err(ConfigError::Validation {
            message: "limits.max_file_size_mb must be greater than 0".to_string(),
        });
    }
    if config.limits.max_pages_per_document == 0 {
        return Err(ConfigError::Validation {
            message: "limits.max_pages_per_document must be greater than 0".to_string(),
        });
    }

    if config.search.snippet_length == 0 {
        return Err(ConfigError::Validation {
            message: "search.snippet_length must be greater than 0".to_string(),
        });
    }
    if config.search.default_limit == 0 || config.search.default_limit > config.search.results_limit
    {
        return Err(ConfigError::Validation {
            message: format!(
                "search.default_limit must be between 1 and results_limit ({})",
                config.search.results_limit
            ),
        });
    }

    if config.metrics.job_latency_capacity == 0 || config.metrics.document_latency_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "metrics latency capacities must be greater than 0".to_string(),
        });
    }

    for option in &config.metadata_options.defaults {
        if !config.metadata_options.available.contains(option) {
            return Err(ConfigError::Validation {
                message: format!("default metadata option '{}' is not available", option),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let mut config: Config = serde_json::from_str("{}").unwrap();
        apply_overrides_from(&mut config, lookup_from(&[])).unwrap();
        validate_config(&config).unwrap();

        assert_eq!(config.limits.max_file_size_mb, 50);
        assert_eq!(config.limits.max_pages_per_document, 500);
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.metrics.job_latency_capacity, 1000);
        assert_eq!(config.metrics.document_latency_capacity, 10_000);
        assert_eq!(config.limits.supported_file_types.len(), 4);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config: Config =
            serde_json::from_str(
                r#"{"data_directory": "/srv/a", "limits": {"max_file_size_mb": 5}}"#,
            )
                .unwrap();
        apply_overrides_from(
            &mut config,
            lookup_from(&[(ENV_DATA_DIR, "/srv/b"), (ENV_MAX_PAGES, "12")]),
        )
        .unwrap();

        assert_eq!(config.data_directory, PathBuf::from("/srv/b"));
        assert_eq!(config.limits.max_file_size_mb, 5);
        assert_eq!(config.limits.max_pages_per_document, 12);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut config = Config::default();
        let err = apply_overrides_from(&mut config, lookup_from(&[(ENV_MAX_FILE_SIZE_MB, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_validation_rejects_unknown_default_option() {
        let mut config = Config::with_data_directory("/tmp/x");
        config.metadata_options.defaults.push("isbn".to_string());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_default_limit_above_cap() {
        let mut config = Config::with_data_directory("/tmp/x");
        config.search.default_limit = 100;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    #[serial]
    fn test_load_config_reads_process_environment() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("docusearch.json");
        std::fs::write(&path, r#"{"data_directory": "/var/lib/docusearch"}"#).unwrap();

        std::env::set_var(ENV_MAX_FILE_SIZE_MB, "7");
        let result = load_config(&path);
        std::env::remove_var(ENV_MAX_FILE_SIZE_MB);

        let config = result.unwrap();
        assert_eq!(config.limits.max_file_size_mb, 7);
        assert_eq!(config.limits.max_file_size_bytes(), 7 * 1024 * 1024);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
