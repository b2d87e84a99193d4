use std::path::PathBuf;

use crate::session::Role;

pub const DEFAULT_API_URL: &str = "http://localhost:8081";

pub const ENV_API_URL: &str = "IDINTEL_API_URL";
pub const ENV_EXPORT_DIR: &str = "IDINTEL_EXPORT_DIR";
pub const ENV_ROLE: &str = "IDINTEL_ROLE";
pub const ENV_LOG: &str = "IDINTEL_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub export_dir: PathBuf,
    pub role: Role,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank values fall back to
    /// defaults; an unknown role falls back to admin with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = get(ENV_API_URL)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let export_dir = get(ENV_EXPORT_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(crate::export::default_export_dir);
        let role = match get(ENV_ROLE).map(|v| v.parse::<Role>()) {
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring {ENV_ROLE}");
                Role::default()
            }
            None => Role::default(),
        };

        Self {
            api_url,
            export_dir,
            role,
        }
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, api_url: Option<String>, role: Option<Role>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(role) = role {
            self.role = role;
        }
        self
    }
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.role, Role::Admin);
    }

    #[test]
    fn env_values_are_read() {
        let cfg = Config::from_lookup(lookup(&[
            (ENV_API_URL, "http://cams.local:9000/"),
            (ENV_EXPORT_DIR, "/tmp/reports"),
            (ENV_ROLE, "staff"),
        ]));
        assert_eq!(cfg.api_url, "http://cams.local:9000");
        assert_eq!(cfg.export_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(cfg.role, Role::Staff);
    }

    #[test]
    fn bad_role_falls_back() {
        let cfg = Config::from_lookup(lookup(&[(ENV_ROLE, "root")]));
        assert_eq!(cfg.role, Role::Admin);
    }

    #[test]
    fn flags_override_env() {
        let cfg = Config::from_lookup(lookup(&[(ENV_ROLE, "staff")]))
            .with_overrides(Some("http://other:1/".into()), Some(Role::Admin));
        assert_eq!(cfg.api_url, "http://other:1");
        assert_eq!(cfg.role, Role::Admin);
    }
}
