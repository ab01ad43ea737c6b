//! Config validation: base URL shape and numeric bounds.

use crate::config::ClientConfig;
use crate::config::types::{PAGE_SIZE_ENV, TIMEOUT_ENV};
use crate::error::ConfigError;

pub fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: config.base_url.clone(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if config.default_page_size == 0 {
        return Err(ConfigError::InvalidValue {
            key: PAGE_SIZE_ENV,
            value: "0".into(),
        });
    }
    if config.timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: TIMEOUT_ENV,
            value: "0".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_default_config() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn rejects_unparseable_and_non_http_urls() {
        assert!(matches!(
            validate(&ClientConfig::new("not a url")),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            validate(&ClientConfig::new("ftp://example.com")),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn rejects_zero_bounds() {
        assert!(validate(&ClientConfig::default().with_page_size(0)).is_err());
        assert!(validate(&ClientConfig::default().with_timeout(0)).is_err());
    }
}
