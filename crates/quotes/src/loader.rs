//! Settings loading.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use quotes_core::{QuoteError, QuoteSettings, Result};

/// Prefix of environment variables that override file settings.
const ENV_PREFIX: &str = "QUOTES";

/// Separator between nested keys in environment variable names.
const ENV_SEPARATOR: &str = "__";

/// Loads settings from defaults, an optional TOML file, and the environment.
///
/// Later sources win: built-in defaults, then `path` (which must exist when
/// given), then `QUOTES_`-prefixed environment variables such as
/// `QUOTES_CACHE__TTL_SECS=60` or `QUOTES_GOOGLE__MARKETS=NASDAQ,NYSE`.
///
/// # Errors
/// Returns [`QuoteError::Config`] if a source cannot be read or a value has
/// the wrong type.
pub fn load_settings(path: Option<&Path>) -> Result<QuoteSettings> {
    load_layered(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn load_layered(path: Option<&Path>, env: Environment) -> Result<QuoteSettings> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        debug!(path = %path.display(), "Loading quote settings file");
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    }

    builder
        .add_source(env)
        .build()
        .map_err(|e| QuoteError::Config(e.to_string()))?
        .try_deserialize()
        .map_err(|e| QuoteError::Config(e.to_string()))
}

/// Loads settings from a TOML string layered over the defaults.
///
/// # Errors
/// Returns [`QuoteError::Config`] if the string is not valid TOML or a value
/// has the wrong type.
pub fn load_settings_from_str(toml: &str) -> Result<QuoteSettings> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .map_err(|e| QuoteError::Config(e.to_string()))?
        .try_deserialize()
        .map_err(|e| QuoteError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_source_gives_defaults() {
        let settings = load_settings_from_str("").unwrap();
        assert_eq!(settings, QuoteSettings::default());
    }

    #[test]
    fn test_partial_overrides() {
        let settings = load_settings_from_str(
            r#"
            [cache]
            ttl_secs = 60

            [retry]
            max_attempts = 2
            base_delay_ms = 250

            [google]
            markets = "NASDAQ NYSE"
            "#,
        )
        .unwrap();

        assert_eq!(settings.cache.ttl(), Duration::from_secs(60));
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.retry.policy().delay_for(1), Duration::from_millis(250));
        assert_eq!(settings.retry.max_delay_ms, 10_000);
        assert_eq!(settings.google.markets, "NASDAQ NYSE");
        assert_eq!(settings.google.timeout_secs, 7);
        assert_eq!(settings.yahoo, quotes_core::YahooSettings::default());
    }

    #[test]
    fn test_wrong_type_is_config_error() {
        let result = load_settings_from_str("[cache]\nttl_secs = \"soon\"\n");
        assert!(matches!(result, Err(QuoteError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("quotes-settings-{}.toml", std::process::id()));
        std::fs::write(&path, "[yahoo]\nbase_url = \"http://localhost:9000\"\n").unwrap();

        let settings = load_settings(Some(path.as_path())).unwrap();
        assert_eq!(settings.yahoo.base_url, "http://localhost:9000");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let path = std::env::temp_dir().join("quotes-settings-does-not-exist.toml");
        let result = load_settings(Some(path.as_path()));
        assert!(matches!(result, Err(QuoteError::Config(_))));
    }

    fn environment_from(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_environment_overrides() {
        let env = environment_from(&[
            ("QUOTES_CACHE__TTL_SECS", "60"),
            ("QUOTES_GOOGLE__MARKETS", "NASDAQ,NYSE"),
            ("OTHER_CACHE__TTL_SECS", "1"),
        ]);

        let settings = load_layered(None, env).unwrap();
        assert_eq!(settings.cache.ttl_secs, 60);
        assert_eq!(settings.google.markets, "NASDAQ,NYSE");
        assert_eq!(settings.retry, quotes_core::RetrySettings::default());
    }

    #[test]
    fn test_environment_wins_over_file() {
        let path = std::env::temp_dir().join(format!("quotes-layered-{}.toml", std::process::id()));
        std::fs::write(&path, "[cache]\nttl_secs = 120\n\n[retry]\nmax_attempts = 2\n").unwrap();

        let env = environment_from(&[("QUOTES_CACHE__TTL_SECS", "60")]);
        let settings = load_layered(Some(path.as_path()), env).unwrap();
        assert_eq!(settings.cache.ttl_secs, 60);
        assert_eq!(settings.retry.max_attempts, 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_environment_wrong_type_is_config_error() {
        let env = environment_from(&[("QUOTES_RETRY__MAX_ATTEMPTS", "many")]);
        assert!(matches!(load_layered(None, env), Err(QuoteError::Config(_))));
    }
}
