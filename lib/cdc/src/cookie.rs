//! Cookie attributes for the common domain cookie.

use serde::{Deserialize, Serialize};

/// Name of the common domain cookie.
pub const CDC_COOKIE_NAME: &str = "_saml_idp";

/// Attributes of a cookie to be written by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieOptions {
    /// Lifetime in seconds; `None` keeps the cookie until the browser closes.
    pub lifetime: Option<u64>,
    /// Domain the cookie is scoped to.
    pub domain: Option<String>,
    /// Path the cookie is scoped to.
    pub path: String,
    /// Whether the cookie is only sent over HTTPS.
    pub secure: bool,
    /// Whether the cookie is hidden from client scripts.
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            lifetime: None,
            domain: None,
            path: "/".to_string(),
            secure: true,
            http_only: true,
        }
    }
}

/// Resolved common domain cookie settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdcSettings {
    domain: Option<String>,
    lifetime: Option<u64>,
}

impl CdcSettings {
    /// Creates settings from configured values.
    ///
    /// The domain always starts with a dot, one is prepended if missing.
    /// An empty domain disables CDC support. A zero lifetime means the
    /// cookie lasts for the browser session.
    #[must_use]
    pub fn new(domain: Option<String>, lifetime: Option<u64>) -> Self {
        let domain = domain.filter(|d| !d.is_empty()).map(|d| {
            if d.starts_with('.') {
                d
            } else {
                format!(".{d}")
            }
        });
        Self {
            domain,
            lifetime: lifetime.filter(|l| *l > 0),
        }
    }

    /// Returns true if CDC support is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.domain.is_some()
    }

    /// Returns the normalized cookie domain.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Returns the cookie lifetime in seconds.
    #[must_use]
    pub fn lifetime(&self) -> Option<u64> {
        self.lifetime
    }

    /// Returns the attributes the CDC is written with.
    ///
    /// The cookie is always secure and readable by scripts on cooperating
    /// subdomains.
    #[must_use]
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            lifetime: self.lifetime,
            domain: self.domain.clone(),
            path: "/".to_string(),
            secure: true,
            http_only: false,
        }
    }
}
