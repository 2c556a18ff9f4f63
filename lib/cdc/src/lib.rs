//! Common domain cookie (CDC) support for discopower.
//!
//! The CDC keeps a short history of previously chosen identity providers in
//! a single cookie shared across a parent domain, so every discovery service
//! under that domain can recommend the user's last choice.
//!
//! # Example
//!
//! ```
//! use discopower_cdc::{CdcHistory, CdcSettings};
//!
//! let mut history = CdcHistory::decode(Some("aGVsbG8= d29ybGQ="));
//! assert_eq!(history.entries(), &["hello".to_string(), "world".to_string()]);
//!
//! history.record_choice("hello");
//! assert_eq!(history.most_recent_valid(|_| true), Some("hello"));
//!
//! let settings = CdcSettings::new(Some("example.org".to_string()), None);
//! let options = settings.cookie_options();
//! assert_eq!(options.domain.as_deref(), Some(".example.org"));
//! assert!(options.secure);
//! assert!(!options.http_only);
//! ```

pub mod cookie;
pub mod history;

pub use cookie::{CDC_COOKIE_NAME, CdcSettings, CookieOptions};
pub use history::{CdcHistory, MAX_ENCODED_LEN};
