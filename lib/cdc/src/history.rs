//! Encoding and bounding of the IdP history cookie.
//!
//! The cookie value is a space-separated list of base64 tokens, one per
//! entity ID, oldest first. Foreign or tampered values are never partially
//! trusted: if any token fails to decode, the whole history is discarded.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use std::fmt;
use tracing::debug;

/// Largest encoded cookie value that is written.
pub const MAX_ENCODED_LEN: usize = 4000;

/// Token separator in the encoded value.
const SEPARATOR: char = ' ';

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(true)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Decoders for cookies written by other CDC writers (standard alphabet)
/// and by this crate (URL-safe alphabet), with or without padding.
const DECODERS: [GeneralPurpose; 2] = [
    GeneralPurpose::new(&alphabet::STANDARD, LENIENT),
    GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT),
];

/// Why a cookie value was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DecodeFailure {
    /// A token is not valid base64.
    InvalidBase64 { index: usize },
    /// A token does not decode to UTF-8.
    InvalidUtf8 { index: usize },
    /// A token decodes to an empty entity ID.
    EmptyEntry { index: usize },
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase64 { index } => write!(f, "token {index} is not valid base64"),
            Self::InvalidUtf8 { index } => write!(f, "token {index} is not valid UTF-8"),
            Self::EmptyEntry { index } => write!(f, "token {index} is an empty entity ID"),
        }
    }
}

fn decode_token(index: usize, token: &str) -> Result<String, DecodeFailure> {
    let bytes = DECODERS
        .iter()
        .find_map(|engine| engine.decode(token).ok())
        .ok_or(DecodeFailure::InvalidBase64 { index })?;
    let entry = String::from_utf8(bytes).map_err(|_| DecodeFailure::InvalidUtf8 { index })?;
    if entry.is_empty() {
        return Err(DecodeFailure::EmptyEntry { index });
    }
    Ok(entry)
}

/// Ordered history of chosen entity IDs, most recent last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdcHistory {
    entries: Vec<String>,
}

impl CdcHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a cookie value.
    ///
    /// A missing or empty value yields an empty history, and so does any
    /// value with a token that cannot be decoded.
    #[must_use]
    pub fn decode(cookie_value: Option<&str>) -> Self {
        let Some(value) = cookie_value.filter(|v| !v.is_empty()) else {
            return Self::new();
        };

        let decoded: Result<Vec<_>, _> = value
            .split(SEPARATOR)
            .enumerate()
            .map(|(index, token)| decode_token(index, token))
            .collect();

        match decoded {
            Ok(entries) => Self { entries },
            Err(failure) => {
                debug!(%failure, "discarding undecodable CDC cookie");
                Self::new()
            }
        }
    }

    /// Returns the entity IDs, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Returns true if no choice is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves (or adds) `entity_id` to the most recent position.
    pub fn record_choice(&mut self, entity_id: impl Into<String>) {
        let entity_id = entity_id.into();
        self.entries.retain(|e| *e != entity_id);
        self.entries.push(entity_id);
    }

    /// Encodes the history as a cookie value.
    ///
    /// Oldest entries are dropped until the value fits in
    /// [`MAX_ENCODED_LEN`] characters. A single entry that is too long on its
    /// own is still written.
    #[must_use]
    pub fn encode(&self) -> String {
        let tokens: Vec<String> = self.entries.iter().map(|e| URL_SAFE.encode(e)).collect();

        let mut len =
            tokens.iter().map(String::len).sum::<usize>() + tokens.len().saturating_sub(1);
        let mut skip = 0;
        while len > MAX_ENCODED_LEN && tokens.len() - skip > 1 {
            len -= tokens[skip].len() + 1;
            skip += 1;
        }
        if skip > 0 {
            debug!(dropped = skip, "trimmed CDC history to fit cookie");
        }

        tokens[skip..].join(&SEPARATOR.to_string())
    }

    /// Returns the most recent entry accepted by `validate`.
    pub fn most_recent_valid(&self, mut validate: impl FnMut(&str) -> bool) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .map(String::as_str)
            .find(|entity_id| validate(entity_id))
    }
}
