use crate::error::{AppError, Result};
use crate::game::ScoringRules;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    /// Pre-acquired bearer token; skips the interactive OAuth flow when set.
    pub spotify_access_token: Option<String>,
    pub scoring: ScoringRules,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let spotify_client_id = lookup("SPOTIFY_CLIENT_ID").unwrap_or_default();
        let spotify_client_secret = lookup("SPOTIFY_CLIENT_SECRET").unwrap_or_default();

        let spotify_redirect_uri = lookup("SPOTIFY_REDIRECT_URI")
            .unwrap_or_else(|| "http://127.0.0.1:8080/callback".to_string());

        let spotify_access_token = lookup("SPOTIFY_ACCESS_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let defaults = ScoringRules::default();
        let scoring = ScoringRules {
            title_threshold: parse_number(&lookup, "BLINDTEST_TITLE_THRESHOLD")?
                .unwrap_or(defaults.title_threshold),
            title_bonus: parse_number(&lookup, "BLINDTEST_TITLE_BONUS")?
                .unwrap_or(defaults.title_bonus),
        };

        if !(0.0..=100.0).contains(&scoring.title_threshold) {
            return Err(AppError::Config(format!(
                "BLINDTEST_TITLE_THRESHOLD must be between 0 and 100, got {}",
                scoring.title_threshold
            )));
        }

        Ok(Self {
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            spotify_access_token,
            scoring,
        })
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.spotify_access_token.is_some() {
            return missing;
        }

        if self.spotify_client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID".to_string());
        }
        if self.spotify_client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET".to_string());
        }

        missing
    }

    pub fn validate_spotify_config(&self) -> bool {
        !self.spotify_client_id.is_empty() && !self.spotify_client_secret.is_empty()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.spotify_access_token.as_deref()
    }
}

fn parse_number<F>(lookup: &F, key: &str) -> Result<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} is not a number: {:?}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.spotify_redirect_uri, "http://127.0.0.1:8080/callback");
        assert!(config.bearer_token().is_none());
        assert_eq!(config.scoring.title_threshold, 80.0);
        assert_eq!(config.scoring.title_bonus, 100.0);
        assert_eq!(
            config.get_missing_config(),
            vec!["SPOTIFY_CLIENT_ID", "SPOTIFY_CLIENT_SECRET"]
        );
    }

    #[test]
    fn test_access_token_satisfies_auth() {
        let config = config_from(&[("SPOTIFY_ACCESS_TOKEN", " BQD-token \n")]).unwrap();

        assert_eq!(config.bearer_token(), Some("BQD-token"));
        assert!(config.get_missing_config().is_empty());
        assert!(!config.validate_spotify_config());
    }

    #[test]
    fn test_blank_access_token_is_ignored() {
        let config = config_from(&[("SPOTIFY_ACCESS_TOKEN", "   ")]).unwrap();
        assert!(config.bearer_token().is_none());
    }

    #[test]
    fn test_scoring_overrides() {
        let config = config_from(&[
            ("BLINDTEST_TITLE_THRESHOLD", "90"),
            ("BLINDTEST_TITLE_BONUS", "50.5"),
        ])
        .unwrap();

        assert_eq!(config.scoring.title_threshold, 90.0);
        assert_eq!(config.scoring.title_bonus, 50.5);
    }

    #[test]
    fn test_invalid_scoring_values() {
        assert!(matches!(
            config_from(&[("BLINDTEST_TITLE_BONUS", "lots")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("BLINDTEST_TITLE_THRESHOLD", "120")]),
            Err(AppError::Config(_))
        ));
    }
}
