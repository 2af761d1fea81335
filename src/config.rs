use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::services::registrations_cache::DEFAULT_TTL;
use crate::services::sheets_service::SheetsConfig;

pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub enum TableBackend {
    Sqlite { database_url: String },
    Sheets(SheetsConfig),
    /// Empty in-process tables, gone on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: TableBackend,
    pub cache_ttl: Duration,
    pub reset_delay: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match var("TABLE_BACKEND").as_deref().unwrap_or("sqlite") {
            "sqlite" => TableBackend::Sqlite {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            "sheets" => TableBackend::Sheets(sheets_config(&var)?),
            "memory" => TableBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "TABLE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", var("PORT"), 3000)?,
            backend,
            cache_ttl: parse_or("CACHE_TTL_MS", var("CACHE_TTL_MS"), DEFAULT_TTL.as_millis() as u64)
                .map(Duration::from_millis)?,
            reset_delay: parse_or(
                "RESET_DELAY_SECS",
                var("RESET_DELAY_SECS"),
                DEFAULT_RESET_DELAY.as_secs(),
            )
            .map(Duration::from_secs)?,
        })
    }
}

/// Sheets settings, also used on their own by the roster sync tool.
pub fn sheets_config_from_env() -> Result<SheetsConfig, ConfigError> {
    sheets_config(&|key: &str| {
        env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn sheets_config(var: &dyn Fn(&str) -> Option<String>) -> Result<SheetsConfig, ConfigError> {
    Ok(SheetsConfig {
        api_url: var("SHEETS_API_URL").unwrap_or_else(|| "https://sheets.googleapis.com".to_string()),
        spreadsheet_id: var("SHEETS_SPREADSHEET_ID")
            .ok_or(ConfigError::Missing("SHEETS_SPREADSHEET_ID"))?,
        api_token: var("SHEETS_API_TOKEN"),
        roster_sheet: var("ROSTER_SHEET").unwrap_or_else(|| "roster".to_string()),
        registrations_sheet: var("REGISTRATIONS_SHEET").unwrap_or_else(|| "inscricoes".to_string()),
    })
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_database_is_set() {
        let cfg = config(&[("DATABASE_URL", "sqlite://inscricoes.db")]).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(1));
        assert_eq!(cfg.reset_delay, Duration::from_secs(2));
        assert!(matches!(cfg.backend, TableBackend::Sqlite { database_url } if database_url == "sqlite://inscricoes.db"));
    }

    #[test]
    fn sqlite_backend_needs_a_database_url() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn sheets_backend_reads_its_settings() {
        let cfg = config(&[
            ("TABLE_BACKEND", "sheets"),
            ("SHEETS_SPREADSHEET_ID", "abc"),
            ("REGISTRATIONS_SHEET", "Inscrições"),
            ("CACHE_TTL_MS", "250"),
        ])
        .unwrap();
        let TableBackend::Sheets(sheets) = cfg.backend else {
            panic!("expected sheets backend");
        };
        assert_eq!(sheets.spreadsheet_id, "abc");
        assert_eq!(sheets.roster_sheet, "roster");
        assert_eq!(sheets.registrations_sheet, "Inscrições");
        assert_eq!(sheets.api_token, None);
        assert_eq!(cfg.cache_ttl, Duration::from_millis(250));
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let err = config(&[("TABLE_BACKEND", "memory"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = config(&[("TABLE_BACKEND", "excel")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "TABLE_BACKEND", .. }));
    }
}
