// rdstool/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonAwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonPollingConfig {
    pub interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonInstanceDefaults {
    pub engine: Option<String>,
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub aws: Option<JsonAwsConfig>,
    pub polling: Option<JsonPollingConfig>,
    pub instance_defaults: Option<JsonInstanceDefaults>,
}

// Application's internal configuration structs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: String,
    pub profile: Option<String>,
    /// Overrides the RDS endpoint, e.g. for a local emulator.
    pub endpoint_url: Option<String>,
}

/// How the orchestrator waits for a resource to leave `creating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status queries
    pub interval: Duration,
    /// Upper bound on status queries; `None` waits indefinitely
    pub max_attempts: Option<u32>,
}

impl PollConfig {
    /// No delay and no attempt cap, for simulated backends.
    pub fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDefaults {
    pub engine: Option<String>,
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub aws: AwsSettings,
    pub polling: PollConfig,
    pub instance_defaults: InstanceDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            aws: AwsSettings {
                region: DEFAULT_REGION.to_string(),
                profile: None,
                endpoint_url: None,
            },
            polling: PollConfig::default(),
            instance_defaults: InstanceDefaults {
                engine: None,
                availability_zone: None,
            },
        }
    }
}

impl AppConfig {
    /// Loads `config_path` if it exists, otherwise falls back to defaults.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load_from_json(config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let raw_json_config: RawJsonConfig = serde_json::from_str(&config_content)
            .with_context(|| {
                format!(
                    "Failed to parse JSON from config file at {}",
                    config_path.display()
                )
            })?;
        Self::from_raw(raw_json_config)
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))
    }

    pub fn from_raw(raw: RawJsonConfig) -> Result<Self> {
        let aws_raw = raw.aws.unwrap_or_default();
        let region = aws_raw
            .region
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint_url = match aws_raw.endpoint_url.filter(|s| !s.trim().is_empty()) {
            Some(endpoint) => {
                let parsed = url::Url::parse(&endpoint)
                    .with_context(|| format!("Invalid aws.endpoint_url: {}", endpoint))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("aws.endpoint_url must use http or https: {}", endpoint);
                }
                Some(endpoint)
            }
            None => None,
        };

        let polling_raw = raw.polling.unwrap_or_default();
        if polling_raw.max_attempts == Some(0) {
            anyhow::bail!("polling.max_attempts must be at least 1 when set");
        }
        let polling = PollConfig {
            interval: Duration::from_secs(
                polling_raw.interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            max_attempts: polling_raw.max_attempts,
        };

        let defaults_raw = raw.instance_defaults.unwrap_or_default();

        Ok(AppConfig {
            aws: AwsSettings {
                region,
                profile: aws_raw.profile.filter(|s| !s.is_empty()),
                endpoint_url,
            },
            polling,
            instance_defaults: InstanceDefaults {
                engine: defaults_raw.engine.filter(|s| !s.is_empty()),
                availability_zone: defaults_raw.availability_zone.filter(|s| !s.is_empty()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn raw(value: serde_json::Value) -> anyhow::Result<RawJsonConfig> {
        Ok(serde_json::from_value(value)?)
    }

    #[test]
    fn test_defaults_when_sections_missing() -> anyhow::Result<()> {
        let config = AppConfig::from_raw(raw(json!({}))?)?;
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.endpoint_url, None);
        assert_eq!(config.polling, PollConfig::default());
        assert_eq!(config.polling.max_attempts, None);
        Ok(())
    }

    #[test]
    fn test_full_config() -> anyhow::Result<()> {
        let config = AppConfig::from_raw(raw(json!({
            "aws": {
                "region": "eu-west-1",
                "profile": "ops",
                "endpoint_url": "http://localhost:4566"
            },
            "polling": { "interval_secs": 5, "max_attempts": 120 },
            "instance_defaults": { "engine": "mysql", "availability_zone": "eu-west-1a" }
        }))?)?;

        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.aws.profile.as_deref(), Some("ops"));
        assert_eq!(config.aws.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.polling.interval, Duration::from_secs(5));
        assert_eq!(config.polling.max_attempts, Some(120));
        assert_eq!(config.instance_defaults.engine.as_deref(), Some("mysql"));
        Ok(())
    }

    #[test]
    fn test_rejects_malformed_endpoint() -> anyhow::Result<()> {
        let result = AppConfig::from_raw(raw(json!({ "aws": { "endpoint_url": "not a url" } }))?);
        assert!(result.is_err());

        let result = AppConfig::from_raw(raw(json!({ "aws": { "endpoint_url": "ftp://host" } }))?);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_rejects_zero_max_attempts() -> anyhow::Result<()> {
        let result = AppConfig::from_raw(raw(json!({ "polling": { "max_attempts": 0 } }))?);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_load_or_default_with_missing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = AppConfig::load_or_default(&dir.path().join("config.json"))?;
        assert_eq!(config, AppConfig::default());
        Ok(())
    }

    #[test]
    fn test_load_from_json_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "polling": {{ "interval_secs": 0 }} }}"#)?;
        let config = AppConfig::load_from_json(file.path())?;
        assert_eq!(config.polling.interval, Duration::ZERO);
        Ok(())
    }

    #[test]
    fn test_load_from_json_reports_parse_errors() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "{{ not json")?;
        let err = AppConfig::load_from_json(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
        Ok(())
    }
}
