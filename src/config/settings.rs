//! Runtime settings from environment variables (optionally seeded from a `.env` file).

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

pub const DEFAULT_SCHEMA: &str = "crudkit";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const BULK_LIMIT: usize = 100;
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// PostgreSQL connection string; `None` selects the in-memory repositories.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Schema holding one document table per resource.
    pub schema: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub bulk_limit: usize,
    /// Maximum request body in bytes.
    pub body_limit: usize,
    /// `tracing_subscriber::EnvFilter` directives.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: None,
            schema: DEFAULT_SCHEMA.into(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            bulk_limit: BULK_LIMIT,
            body_limit: BODY_LIMIT,
            log_filter: "crudkit=info".into(),
        }
    }
}

impl Settings {
    /// Load from `CRUDKIT_*` variables, falling back to `DATABASE_URL` and the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] but reading from an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let settings = Settings {
            database_url: lookup("CRUDKIT_DATABASE_URL")
                .or_else(|| lookup("DATABASE_URL"))
                .filter(|s| !s.trim().is_empty()),
            schema: lookup("CRUDKIT_SCHEMA").unwrap_or(defaults.schema),
            default_page_size: parse_var(&lookup, "CRUDKIT_DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: parse_var(&lookup, "CRUDKIT_MAX_PAGE_SIZE", defaults.max_page_size)?,
            bulk_limit: parse_var(&lookup, "CRUDKIT_BULK_LIMIT", defaults.bulk_limit)?,
            body_limit: parse_var(&lookup, "CRUDKIT_BODY_LIMIT", defaults.body_limit)?,
            log_filter: lookup("CRUDKIT_LOG").unwrap_or(defaults.log_filter),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier(&self.schema)?;
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ConfigError::Validation("page sizes must be positive".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Validation(format!(
                "default page size {} exceeds maximum {}",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.bulk_limit == 0 {
            return Err(ConfigError::Validation("bulk limit must be positive".into()));
        }
        Ok(())
    }
}

fn parse_var<F, V>(lookup: &F, key: &'static str, default: V) -> Result<V, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    V: FromStr,
    V::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: V::Err| ConfigError::Env {
            key,
            message: e.to_string(),
        }),
    }
}

/// PostgreSQL identifiers used unquoted in DDL (schema and table names).
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    let re = IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap_or_else(|e| panic!("identifier pattern: {e}"))
    });
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn prefixed_database_url_wins() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://fallback"),
            ("CRUDKIT_DATABASE_URL", "postgres://primary"),
            ("CRUDKIT_MAX_PAGE_SIZE", "500"),
        ]))
        .unwrap();
        assert_eq!(settings.database_url.as_deref(), Some("postgres://primary"));
        assert_eq!(settings.max_page_size, 500);
    }

    #[test]
    fn unparsable_number_names_the_variable() {
        let err = Settings::from_lookup(lookup(&[("CRUDKIT_BULK_LIMIT", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "CRUDKIT_BULK_LIMIT", .. }));
    }

    #[test]
    fn default_page_size_cannot_exceed_maximum() {
        let err = Settings::from_lookup(lookup(&[("CRUDKIT_DEFAULT_PAGE_SIZE", "2000")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[rstest]
    #[case("crudkit", true)]
    #[case("_private1", true)]
    #[case("1abc", false)]
    #[case("drop table", false)]
    #[case("a\"b", false)]
    fn identifiers(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_identifier(name).is_ok(), valid);
    }
}
