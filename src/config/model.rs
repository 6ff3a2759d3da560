// src/config/model.rs

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::url::QueryParams;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [data_connector]
/// endpoint = "https://api.example.com"
///
/// [data_connector.query_params]
/// env = "prod"
/// client = "web"
///
/// [logging]
/// level = "debug"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub data_connector: DataConnectorSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Validated configuration. Obtain one via `ConfigFile::try_from(raw)` or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub data_connector: DataConnectorSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        data_connector: DataConnectorSection,
        logging: LoggingSection,
    ) -> Self {
        Self {
            data_connector,
            logging,
        }
    }
}

/// `[data_connector]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DataConnectorSection {
    /// Base URL that API paths are appended to.
    #[serde(default)]
    pub endpoint: String,

    /// Environment query parameters, in file order.
    #[serde(default)]
    pub query_params: QueryParams,
}

/// `[logging]` section.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// If `None`, `DOMWATCH_LOG` or `info` is used.
    #[serde(default)]
    pub level: Option<LogLevel>,
}
