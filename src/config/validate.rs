// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DomWatchError, Result};

/// Characters that would change the structure of a built URL.
const RESERVED_KEY_CHARS: [char; 4] = ['&', '=', '?', '#'];

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DomWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.data_connector, raw.logging))
    }
}

/// Run all semantic checks on a raw config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_endpoint(cfg)?;
    validate_query_params(cfg)?;
    Ok(())
}

fn validate_endpoint(cfg: &RawConfigFile) -> Result<()> {
    let endpoint = &cfg.data_connector.endpoint;
    if endpoint.contains(['?', '#']) {
        return Err(DomWatchError::ConfigError(format!(
            "[data_connector].endpoint must not contain '?' or '#' (got '{endpoint}')"
        )));
    }
    Ok(())
}

fn validate_query_params(cfg: &RawConfigFile) -> Result<()> {
    for key in cfg.data_connector.query_params.keys() {
        if key.is_empty() {
            return Err(DomWatchError::ConfigError(
                "[data_connector.query_params] keys must not be empty".to_string(),
            ));
        }
        if key.contains(RESERVED_KEY_CHARS) {
            return Err(DomWatchError::ConfigError(format!(
                "[data_connector.query_params] key '{key}' contains one of '&', '=', '?', '#'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::DataConnectorSection;

    fn raw(endpoint: &str, keys: &[&str]) -> RawConfigFile {
        RawConfigFile {
            data_connector: DataConnectorSection {
                endpoint: endpoint.to_string(),
                query_params: keys
                    .iter()
                    .map(|k| (k.to_string(), "v".to_string()))
                    .collect(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn accepts_plain_config() {
        assert!(ConfigFile::try_from(raw("https://api.example.com", &["env"])).is_ok());
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }

    #[test]
    fn rejects_endpoint_with_query() {
        let err = ConfigFile::try_from(raw("https://x/?a=1", &[])).unwrap_err();
        assert!(matches!(err, DomWatchError::ConfigError(msg) if msg.contains("endpoint")));
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(matches!(
            ConfigFile::try_from(raw("", &[""])),
            Err(DomWatchError::ConfigError(_))
        ));
        assert!(matches!(
            ConfigFile::try_from(raw("", &["a=b"])),
            Err(DomWatchError::ConfigError(msg)) if msg.contains("a=b")
        ));
    }
}
