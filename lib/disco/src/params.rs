//! Discovery protocol request parameters.

use crate::error::DiscoError;
use discopower_view::display::CHOICE_PARAM;
use rootcause::Report;
use std::collections::HashMap;
use url::Url;

/// Query parameter naming the requesting SP.
pub const ENTITY_ID_PARAM: &str = "entityID";

/// Query parameter holding the URL the choice is sent back to.
pub const RETURN_PARAM: &str = "return";

/// Query parameter naming the return parameter for the chosen IdP.
pub const RETURN_ID_PARAM: &str = "returnIDParam";

/// Validated parameters of one discovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoParams {
    /// The requesting SP's entity ID.
    pub sp_entity_id: String,
    /// The return URL as received.
    pub return_url: String,
    /// The parsed return URL.
    pub return_target: Url,
    /// Name of the return parameter carrying the chosen IdP.
    pub return_id_param: String,
    /// The IdP the user picked, if any.
    pub choice: Option<String>,
}

fn required<'a>(
    query: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, Report<DiscoError>> {
    match query.get(name).map(String::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DiscoError::DiscoParams {
            details: format!("missing required parameter '{name}'"),
        }
        .into()),
    }
}

impl DiscoParams {
    /// Reads and validates request parameters.
    ///
    /// The return URL must be an absolute http(s) URL. If `trusted_domains`
    /// is not empty, its host must be one of them.
    ///
    /// # Errors
    ///
    /// Returns `DiscoParams` if a required parameter is missing or empty, or
    /// if the return URL is rejected.
    pub fn from_query(
        query: &HashMap<String, String>,
        trusted_domains: &[String],
    ) -> Result<Self, Report<DiscoError>> {
        let sp_entity_id = required(query, ENTITY_ID_PARAM)?;
        let return_url = required(query, RETURN_PARAM)?;
        let return_id_param = required(query, RETURN_ID_PARAM)?;

        let return_target = Url::parse(return_url).map_err(|e| DiscoError::DiscoParams {
            details: format!("return URL '{return_url}' is invalid: {e}"),
        })?;
        if !matches!(return_target.scheme(), "http" | "https") {
            return Err(DiscoError::DiscoParams {
                details: format!("return URL '{return_url}' is not an http(s) URL"),
            }
            .into());
        }
        if !trusted_domains.is_empty() {
            let host = return_target.host_str().unwrap_or_default();
            if !trusted_domains.iter().any(|d| d.eq_ignore_ascii_case(host)) {
                return Err(DiscoError::DiscoParams {
                    details: format!("return URL host '{host}' is not trusted"),
                }
                .into());
            }
        }

        let choice = query
            .get(CHOICE_PARAM)
            .filter(|c| !c.is_empty())
            .cloned();

        Ok(Self {
            sp_entity_id: sp_entity_id.to_string(),
            return_url: return_url.to_string(),
            return_target,
            return_id_param: return_id_param.to_string(),
            choice,
        })
    }

    /// Returns the return URL with the chosen IdP appended.
    #[must_use]
    pub fn redirect_for(&self, idp: &str) -> String {
        let mut target = self.return_target.clone();
        target
            .query_pairs_mut()
            .append_pair(&self.return_id_param, idp);
        target.to_string()
    }
}
