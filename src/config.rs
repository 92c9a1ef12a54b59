use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::pages::FailurePolicy;

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";
pub const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BIND: &str = "0.0.0.0:3146";

/// Everything a [`crate::catalog::CatalogClient`] needs to talk to the catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
    pub api_base: String,
    pub image_base: String,
    pub language: String,
    pub request_timeout: Duration,
}

impl CatalogConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_var)
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let api_key = var("TMDB_API_KEY").context("TMDB_API_KEY must be set")?;
        let mut config = Self::new(api_key);
        if let Some(base) = var("TMDB_API_BASE") {
            config.api_base = base;
        }
        if let Some(base) = var("TMDB_IMAGE_BASE") {
            config.image_base = base;
        }
        if let Some(lang) = var("TMDB_LANGUAGE") {
            config.language = lang;
        }
        if let Some(secs) = var("TMDB_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("TMDB_REQUEST_TIMEOUT_SECS is not a number: {secs}"))?;
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub catalog: CatalogConfig,
    pub failure_policy: FailurePolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let bind = var("MOVIEFUN_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("MOVIEFUN_BIND is not a socket address: {bind}"))?;
        let failure_policy = match var("MOVIEFUN_FAILURE_POLICY") {
            Some(v) => v.parse()?,
            None => FailurePolicy::default(),
        };
        Ok(Self {
            bind,
            catalog: CatalogConfig::from_lookup(&lookup)?,
            failure_policy,
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_catalog() {
        let config = CatalogConfig::new("key");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.image_base, DEFAULT_IMAGE_BASE);
        assert_eq!(config.language, "en-US");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn api_key_is_required_and_not_blank() {
        let err = AppConfig::from_lookup(vars(&[])).unwrap_err();
        assert!(err.to_string().contains("TMDB_API_KEY"));
        let err = AppConfig::from_lookup(vars(&[("TMDB_API_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("TMDB_API_KEY"));
    }

    #[test]
    fn settings_are_read_with_defaults() {
        let config = AppConfig::from_lookup(vars(&[
            ("TMDB_API_KEY", "k"),
            ("TMDB_LANGUAGE", "fr-FR"),
            ("TMDB_REQUEST_TIMEOUT_SECS", "0"),
            ("MOVIEFUN_FAILURE_POLICY", "fail-fast"),
        ]))
        .unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.catalog.api_key, "k");
        assert_eq!(config.catalog.language, "fr-FR");
        assert_eq!(config.catalog.request_timeout, Duration::from_secs(1));
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);

        let err = AppConfig::from_lookup(vars(&[("TMDB_API_KEY", "k"), ("MOVIEFUN_BIND", "nope")]))
            .unwrap_err();
        assert!(err.to_string().contains("MOVIEFUN_BIND"));
    }
}
