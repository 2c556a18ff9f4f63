//! Request-scoped cookie access for the discovery engine.
//!
//! Cookie values are read from the raw `Cookie` header and decoded as form
//! data (`+` is a space, then percent-decoding), matching how other
//! services on the cookie domain write the common domain cookie.

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use discopower_cdc::CookieOptions;
use discopower_disco::{CollaboratorError, CookieSink};
use rootcause::Report;
use std::collections::HashMap;
use std::sync::Mutex;
use time::Duration as TimeDuration;

/// Reads request cookies and collects the cookies to send back.
#[derive(Debug)]
pub struct RequestCookies {
    jar: CookieJar,
    raw: HashMap<String, String>,
    pending: Mutex<Vec<Cookie<'static>>>,
}

impl RequestCookies {
    /// Wraps the request's cookie jar and raw cookie headers.
    #[must_use]
    pub fn new(jar: CookieJar, headers: &HeaderMap) -> Self {
        Self {
            jar,
            raw: raw_cookies(headers),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Returns the jar with every queued cookie added.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the pending cookie lock is poisoned.
    pub fn into_jar(self) -> Result<CookieJar, Report<CollaboratorError>> {
        let pending = self
            .pending
            .into_inner()
            .map_err(|_| CollaboratorError::unavailable("cookies", "lock poisoned"))?;
        Ok(pending.into_iter().fold(self.jar, |jar, c| jar.add(c)))
    }
}

/// Collects the undecoded `name=value` pairs of every `Cookie` header.
///
/// The first occurrence of a name wins.
fn raw_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut raw = HashMap::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                raw.entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }
    raw
}

/// Decodes a raw cookie value as form data.
fn form_decode(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|v| v.into_owned())
}

/// Builds a response cookie from engine cookie options.
fn build_cookie(name: &str, value: &str, options: &CookieOptions) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), value.to_string()))
        .path(options.path.clone())
        .secure(options.secure)
        .http_only(options.http_only);
    if let Some(domain) = &options.domain {
        cookie = cookie.domain(domain.clone());
    }
    if let Some(lifetime) = options.lifetime.filter(|l| *l > 0) {
        let seconds = i64::try_from(lifetime).unwrap_or(i64::MAX);
        cookie = cookie.max_age(TimeDuration::seconds(seconds));
    }
    cookie.build()
}

impl CookieSink for RequestCookies {
    fn get_cookie(&self, name: &str) -> Option<String> {
        match self.raw.get(name) {
            Some(raw) => form_decode(raw),
            None => self.jar.get(name).map(|c| c.value().to_string()),
        }
    }

    fn set_cookie(
        &self,
        name: &str,
        value: &str,
        options: &CookieOptions,
    ) -> Result<(), Report<CollaboratorError>> {
        self.pending
            .lock()
            .map_err(|_| CollaboratorError::unavailable("cookies", "lock poisoned"))?
            .push(build_cookie(name, value, options));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use discopower_cdc::{CDC_COOKIE_NAME, CdcHistory, CdcSettings};

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(cookie).expect("header"),
        );
        headers
    }

    fn request_cookies(cookie: &str) -> RequestCookies {
        let headers = headers(cookie);
        RequestCookies::new(CookieJar::from_headers(&headers), &headers)
    }

    #[test]
    fn reads_request_cookies() {
        let cookies = request_cookies("_saml_idp=aGVsbG8=; other=x");
        assert_eq!(cookies.get_cookie("_saml_idp").as_deref(), Some("aGVsbG8="));
        assert_eq!(cookies.get_cookie("other").as_deref(), Some("x"));
        assert!(cookies.get_cookie("absent").is_none());
    }

    #[test]
    fn plus_separated_history_is_split_into_entries() {
        let cookies = request_cookies(
            "_saml_idp=aHR0cHM6Ly9pZHAwMS5leGFtcGxlLm9yZw%3D%3D+aHR0cHM6Ly9pZHAwMi5leGFtcGxlLm9yZw%3D%3D",
        );
        let value = cookies.get_cookie(CDC_COOKIE_NAME);
        let history = CdcHistory::decode(value.as_deref());
        assert_eq!(
            history.entries(),
            ["https://idp01.example.org", "https://idp02.example.org"]
        );
    }

    #[test]
    fn encoded_plus_stays_a_plus() {
        let cookies = request_cookies("_saml_idp=a%2Bb%20c");
        assert_eq!(cookies.get_cookie("_saml_idp").as_deref(), Some("a+b c"));
    }

    #[test]
    fn queued_cookies_land_in_jar() {
        let cookies = RequestCookies::new(CookieJar::new(), &HeaderMap::new());
        let options =
            CdcSettings::new(Some("example.org".to_string()), Some(3600)).cookie_options();
        cookies
            .set_cookie("_saml_idp", "aGVsbG8=", &options)
            .expect("queued");

        let jar = cookies.into_jar().expect("jar");
        let cookie = jar.get("_saml_idp").expect("cookie set");
        assert_eq!(cookie.value(), "aGVsbG8=");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(false));
        assert_eq!(cookie.max_age(), Some(TimeDuration::seconds(3600)));
        assert_eq!(
            cookie.domain().map(|d| d.trim_start_matches('.')),
            Some("example.org")
        );
    }

    #[test]
    fn session_only_cookie_has_no_max_age() {
        let cookies = RequestCookies::new(CookieJar::new(), &HeaderMap::new());
        let options = CookieOptions::default();
        cookies
            .set_cookie("lastidp", "https://idp.example.org", &options)
            .expect("queued");

        let jar = cookies.into_jar().expect("jar");
        let cookie = jar.get("lastidp").expect("cookie set");
        assert!(cookie.max_age().is_none());
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn zero_lifetime_cdc_is_not_expired_on_write() {
        let cookies = RequestCookies::new(CookieJar::new(), &HeaderMap::new());
        let options = CdcSettings::new(Some("example.org".to_string()), Some(0)).cookie_options();
        cookies
            .set_cookie("_saml_idp", "aGVsbG8=", &options)
            .expect("queued");

        let jar = cookies.into_jar().expect("jar");
        assert!(jar.get("_saml_idp").expect("cookie set").max_age().is_none());
    }
}
