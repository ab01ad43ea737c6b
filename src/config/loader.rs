//! Load client config from the process environment (optionally seeded from `.env`).

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;

/// Read `.env` if present, then build and validate config from the environment.
pub fn load() -> Result<ClientConfig, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "ignoring unreadable .env file");
        }
    }
    load_from(|key| std::env::var(key).ok())
}

/// Build and validate config from an arbitrary key lookup. Blank values count as unset.
pub fn load_from<F>(lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let mut config = ClientConfig::new(get(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()));
    config.site_id = get(SITE_ID_ENV);
    if let Some(raw) = get(TIMEOUT_ENV) {
        config.timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: TIMEOUT_ENV,
            value: raw.clone(),
        })?;
    }
    if let Some(raw) = get(PAGE_SIZE_ENV) {
        config.default_page_size = raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: PAGE_SIZE_ENV,
            value: raw.clone(),
        })?;
    }
    config.token_file = get(TOKEN_FILE_ENV).map(Into::into);

    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = load_from(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.site_id, None);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert!(config.token_file.is_none());
    }

    #[test]
    fn reads_all_keys() {
        let config = load_from(lookup(&[
            (BASE_URL_ENV, "https://api.example.com/v1/"),
            (SITE_ID_ENV, " shop-1 "),
            (TIMEOUT_ENV, "5"),
            (PAGE_SIZE_ENV, "25"),
            (TOKEN_FILE_ENV, "/tmp/tokens.json"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.site_id.as_deref(), Some("shop-1"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.token_file.as_deref(), Some(std::path::Path::new("/tmp/tokens.json")));
    }

    #[test]
    fn blank_site_counts_as_missing() {
        let config = load_from(lookup(&[(SITE_ID_ENV, "   ")])).unwrap();
        assert!(config.site_id.is_none());
    }

    #[test]
    fn rejects_non_numeric_page_size() {
        let err = load_from(lookup(&[(PAGE_SIZE_ENV, "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: PAGE_SIZE_ENV, .. }));
    }
}
