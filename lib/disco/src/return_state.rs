//! Best-effort recovery of SP metadata through the return URL.
//!
//! When the discovery service sits behind a protocol bridge, the requesting
//! SP is not in local metadata. The return URL usually names the saved
//! authentication state, which carries the remote SP's metadata. That
//! metadata is only ever used to locate the SP's filter rule.

use crate::collaborator::AuthStateStore;
use discopower_core::EntityRecord;
use tracing::{debug, warn};
use url::Url;

/// Return URL query parameter naming the authentication state.
pub const AUTH_ID_PARAM: &str = "AuthID";

/// Stage the SP login state is saved under.
pub const SP_SSO_STAGE: &str = "saml:sp:sso";

/// State key holding the SP metadata.
pub const SP_METADATA_KEY: &str = "SPMetadata";

/// Recovers the SP metadata saved in the authentication state named by
/// `return_url`.
///
/// Every failure yields `None`.
pub fn recover_sp_metadata(store: &dyn AuthStateStore, return_url: &Url) -> Option<EntityRecord> {
    let Some(auth_id) = return_url
        .query_pairs()
        .find(|(name, _)| name == AUTH_ID_PARAM)
        .map(|(_, value)| value.into_owned())
    else {
        debug!("return URL names no authentication state");
        return None;
    };

    let state = match store.load_state(&auth_id, SP_SSO_STAGE) {
        Ok(Some(state)) => state,
        Ok(None) => {
            debug!(%auth_id, "no saved authentication state");
            return None;
        }
        Err(report) => {
            warn!(%auth_id, error = %report, "failed to load authentication state");
            return None;
        }
    };

    let metadata = state.get(SP_METADATA_KEY)?;
    match EntityRecord::from_metadata_entry(metadata) {
        Ok(sp) => Some(sp),
        Err(report) => {
            warn!(
                %auth_id,
                error = %report,
                "ignoring malformed SP metadata in authentication state"
            );
            None
        }
    }
}
