use anyhow::{bail, Context, Result};
use reqwest::Url;

/// Backend used when neither `API_BASE_URL` nor `VITE_API_BASE_URL` is set.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:4000";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    /// False when `backend_url` is the local default rather than configured.
    pub backend_configured: bool,
    pub app_url: Url,
    pub candidate_portal_url: Option<Url>,
    pub app_base_path: String,
    pub flags: FeatureFlags,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    /// Lets the printer pipeline call server-only procedures over the network.
    pub debug_printer: bool,
    pub disable_signups: bool,
    pub disable_email_auth: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_base_url = optional_url(&["API_BASE_URL", "VITE_API_BASE_URL"])?;
        let backend_configured = api_base_url.is_some();
        let backend_url = match api_base_url {
            Some(url) => url,
            None => parse_http_url("API_BASE_URL", DEFAULT_BACKEND_URL)?,
        };

        Ok(Config {
            backend_url,
            backend_configured,
            app_url: parse_http_url("APP_URL", &require_env("APP_URL")?)?,
            candidate_portal_url: optional_url(&[
                "CANDIDATE_PORTAL_URL",
                "VITE_CANDIDATE_PORTAL_URL",
            ])?,
            app_base_path: optional_env("APP_BASE_PATH").unwrap_or_else(|| "/".to_string()),
            flags: FeatureFlags {
                debug_printer: env_flag("FLAG_DEBUG_PRINTER")?,
                disable_signups: env_flag("FLAG_DISABLE_SIGNUPS")?,
                disable_email_auth: env_flag("FLAG_DISABLE_EMAIL_AUTH")?,
            },
            port: optional_env("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// The external identity portal; falls back to this application's origin.
    pub fn portal_url(&self) -> &Url {
        self.candidate_portal_url.as_ref().unwrap_or(&self.app_url)
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Empty strings count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn optional_url(keys: &[&str]) -> Result<Option<Url>> {
    for key in keys {
        if let Some(raw) = optional_env(key) {
            return parse_http_url(key, &raw).map(Some);
        }
    }
    Ok(None)
}

fn env_flag(key: &str) -> Result<bool> {
    match optional_env(key) {
        Some(raw) => parse_bool(&raw).with_context(|| format!("'{key}' must be a boolean")),
        None => Ok(false),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("unrecognised boolean value '{other}'"),
    }
}

pub(crate) fn parse_http_url(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("'{key}' is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("'{key}' must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(portal: Option<&str>) -> Config {
        Config {
            backend_url: Url::parse(DEFAULT_BACKEND_URL).unwrap(),
            backend_configured: false,
            app_url: Url::parse("https://resume.example.com").unwrap(),
            candidate_portal_url: portal.map(|u| Url::parse(u).unwrap()),
            app_base_path: "/".to_string(),
            flags: FeatureFlags::default(),
            port: 3000,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_parse_bool_accepts_common_spellings() {
        for raw in ["true", "TRUE", "1", "yes", "On"] {
            assert!(parse_bool(raw).unwrap(), "{raw}");
        }
        for raw in ["false", "0", "no", "OFF"] {
            assert!(!parse_bool(raw).unwrap(), "{raw}");
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_http_url_rejects_other_schemes() {
        assert!(parse_http_url("APP_URL", "https://example.com").is_ok());
        assert!(parse_http_url("APP_URL", "ftp://example.com").is_err());
        assert!(parse_http_url("APP_URL", "not a url").is_err());
    }

    #[test]
    fn test_default_backend_url_is_valid() {
        let url = parse_http_url("API_BASE_URL", DEFAULT_BACKEND_URL).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/");
    }

    #[test]
    fn test_portal_url_falls_back_to_app_url() {
        let config = config_with(None);
        assert_eq!(config.portal_url().as_str(), "https://resume.example.com/");

        let config = config_with(Some("https://id.example.com"));
        assert_eq!(config.portal_url().as_str(), "https://id.example.com/");
    }
}
