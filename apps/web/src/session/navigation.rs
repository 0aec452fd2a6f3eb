use std::fmt;

use reqwest::Url;

/// Where a client is sent once its session can no longer be recovered.
pub const LOGIN_PATH: &str = "/auth/login";

/// Performs a hard, client-side redirect.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Screens offered by the external identity portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
    ForgotPassword,
    VerifyTwoFactor,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Login => "login",
            AuthMode::Register => "register",
            AuthMode::ForgotPassword => "forgot-password",
            AuthMode::VerifyTwoFactor => "verify-2fa",
        }
    }

    /// Inverse of [`AuthMode::as_str`], for `/auth/<mode>` paths.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "login" => Some(AuthMode::Login),
            "register" => Some(AuthMode::Register),
            "forgot-password" => Some(AuthMode::ForgotPassword),
            "verify-2fa" => Some(AuthMode::VerifyTwoFactor),
            _ => None,
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<portal>/auth?mode=<mode>&redirect=<return_to>`
pub fn candidate_auth_url(portal: &Url, return_to: Option<&str>, mode: AuthMode) -> Url {
    let mut url = portal.clone();
    url.set_path("/auth");
    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("mode", mode.as_str());
        if let Some(return_to) = return_to {
            query.append_pair("redirect", return_to);
        }
    }
    url
}

/// Prefixes an application path with the configured base path.
pub fn with_base_path(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let base = base.trim_matches('/');
    if base.is_empty() {
        format!("/{path}")
    } else {
        format!("/{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_auth_url_carries_mode_and_return_target() {
        let portal = Url::parse("https://id.example.com/some/page?x=1").unwrap();
        let url = candidate_auth_url(
            &portal,
            Some("https://resume.example.com/dashboard"),
            AuthMode::Login,
        );

        assert_eq!(url.path(), "/auth");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("mode".to_string(), "login".to_string()),
                (
                    "redirect".to_string(),
                    "https://resume.example.com/dashboard".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_candidate_auth_url_without_return_target() {
        let portal = Url::parse("https://id.example.com").unwrap();
        let url = candidate_auth_url(&portal, None, AuthMode::VerifyTwoFactor);
        assert_eq!(url.as_str(), "https://id.example.com/auth?mode=verify-2fa");
    }

    #[test]
    fn test_auth_mode_segments() {
        for mode in [
            AuthMode::Login,
            AuthMode::Register,
            AuthMode::ForgotPassword,
            AuthMode::VerifyTwoFactor,
        ] {
            assert_eq!(AuthMode::from_segment(mode.as_str()), Some(mode));
        }
        assert_eq!(AuthMode::from_segment("verify-2fa-backup"), None);
    }

    #[test]
    fn test_with_base_path() {
        assert_eq!(with_base_path("/", "/dashboard"), "/dashboard");
        assert_eq!(with_base_path("", "dashboard"), "/dashboard");
        assert_eq!(with_base_path("/builder/", "/dashboard"), "/builder/dashboard");
        assert_eq!(with_base_path("builder", "api/rpc"), "/builder/api/rpc");
    }
}
