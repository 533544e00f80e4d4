use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse JSON config file: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported config file type: {0}")]
    UnsupportedFormat(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Section 'borg' not found in config of archive #{0}")]
    MissingBorgSection(usize),

    #[error("Field 'repository' not found in 'borg' section of archive #{0} or empty")]
    MissingRepository(usize),

    #[error("Unknown command format '{0}', should be format 'prefix:command[:params]'")]
    InvalidAction(String),

    #[error("Unknown prefix of command '{0}', should be one from list: borg, rclone, shell")]
    UnknownPrefix(String),

    #[error("Unknown predicate '{name}' in archive with repository '{repository}'")]
    UnknownPredicate { name: String, repository: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Format of a configuration unit, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Some(ConfigFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

/// Load and validate a configuration unit from a TOML or JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
    let contents = fs::read_to_string(path)?;
    parse_config(&contents, format)
}

/// Parse and validate configuration text
pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<Config> {
    let config: Config = match format {
        ConfigFormat::Toml => toml::from_str(contents)?,
        ConfigFormat::Json => serde_json::from_str(contents)?,
    };
    validate_config(&config)?;
    Ok(config)
}

/// Validate the parts of the configuration that don't depend on archives
fn validate_config(config: &Config) -> Result<()> {
    if let Some(ref email) = config.email {
        validate_email(email)?;
    }

    for level in [
        &config.log_level,
        &config.console_log_level,
        &config.email_log_level,
    ]
    .into_iter()
    .flatten()
    {
        if crate::managers::logging::parse_level(level).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "Unknown log level: {}",
                level
            )));
        }
    }

    Ok(())
}

fn validate_email(email: &EmailConfig) -> Result<()> {
    if email.to.addresses().is_empty() {
        return Err(ConfigError::ValidationError(
            "Field 'to' not found in email config or empty".to_string(),
        ));
    }

    if let Some(ref smtp) = email.smtp {
        if smtp.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "SMTP host not found in email config".to_string(),
            ));
        }
        if smtp.port == 0 {
            return Err(ConfigError::ValidationError(
                "SMTP port not found in email config".to_string(),
            ));
        }
    }

    Ok(())
}
