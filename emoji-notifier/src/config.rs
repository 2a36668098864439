use crate::misskey::DeliveryScope;
use mk_stream::config::{load_file, ConfigError, StreamConfig, CONFIG_PATH_VAR};
use mk_stream::ReconnectPolicy;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// `[notes]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoteSettings {
    #[serde(default)]
    pub scope: DeliveryScope,
}

/// Every section of the config file the notifier reads, parsed in one pass
#[derive(Debug, Default, Deserialize)]
struct NotifierFile {
    #[serde(default)]
    reconnect: ReconnectPolicy,
    #[serde(default)]
    notes: NoteSettings,
}

/// Everything the notifier binary needs at startup
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub stream: StreamConfig,
    pub notes: NoteSettings,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Stream settings plus the `[notes]` section and `NOTE_SCOPE` override.
    ///
    /// The file named by `MK_STREAM_CONFIG` is read once for both the
    /// `[reconnect]` and `[notes]` sections.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup(CONFIG_PATH_VAR) {
            Some(path) => load_file::<NotifierFile>(Path::new(&path))?,
            None => NotifierFile::default(),
        };

        let stream = StreamConfig::with_reconnect(&lookup, file.reconnect)?;
        let mut notes = file.notes;

        if let Some(v) = lookup("NOTE_SCOPE") {
            match v.parse::<DeliveryScope>() {
                Ok(scope) => notes.scope = scope,
                Err(e) => warn!(value = %v, error = %e, "Ignoring invalid NOTE_SCOPE"),
            }
        }

        Ok(Self { stream, notes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(vars: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
        move |key| vars.get(key).cloned()
    }

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            ("HOST".to_string(), "misskey.example".to_string()),
            ("TOKEN".to_string(), "abc".to_string()),
        ])
    }

    #[test]
    fn test_default_scope_is_local() {
        let config = NotifierConfig::from_lookup(lookup_from(base_vars())).unwrap();
        assert_eq!(config.notes.scope, DeliveryScope::Local);
        assert_eq!(config.stream.host, "misskey.example");
    }

    #[test]
    fn test_scope_from_file_and_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[notes]\nscope = \"followers\"").unwrap();

        let mut vars = base_vars();
        vars.insert(
            CONFIG_PATH_VAR.to_string(),
            file.path().to_str().unwrap().to_string(),
        );
        let config = NotifierConfig::from_lookup(lookup_from(vars.clone())).unwrap();
        assert_eq!(config.notes.scope, DeliveryScope::Followers);

        vars.insert("NOTE_SCOPE".to_string(), "home".to_string());
        let config = NotifierConfig::from_lookup(lookup_from(vars)).unwrap();
        assert_eq!(config.notes.scope, DeliveryScope::Home);
    }

    #[test]
    fn test_single_file_supplies_both_sections() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[reconnect]\nmax_attempts = 2\ndelay_ms = 100\n\n[notes]\nscope = \"home\""
        )
        .unwrap();

        let mut vars = base_vars();
        vars.insert(
            CONFIG_PATH_VAR.to_string(),
            file.path().to_str().unwrap().to_string(),
        );
        vars.insert("RECONNECT_DELAY_MS".to_string(), "10".to_string());
        let config = NotifierConfig::from_lookup(lookup_from(vars)).unwrap();

        assert_eq!(config.stream.reconnect.max_attempts, 2);
        assert_eq!(config.stream.reconnect.delay_ms, 10);
        assert_eq!(config.notes.scope, DeliveryScope::Home);
    }

    #[test]
    fn test_unreadable_file_is_fatal() {
        let mut vars = base_vars();
        vars.insert(
            CONFIG_PATH_VAR.to_string(),
            "/nonexistent/emoji-notifier.toml".to_string(),
        );
        let err = NotifierConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }

    #[test]
    fn test_invalid_scope_override_is_ignored() {
        let mut vars = base_vars();
        vars.insert("NOTE_SCOPE".to_string(), "everyone".to_string());
        let config = NotifierConfig::from_lookup(lookup_from(vars)).unwrap();
        assert_eq!(config.notes.scope, DeliveryScope::Local);
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut vars = base_vars();
        vars.remove("TOKEN");
        let err = NotifierConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("TOKEN"));
    }
}
