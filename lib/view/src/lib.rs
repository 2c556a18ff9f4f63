//! Discovery view engine for discopower.
//!
//! This crate turns a flat list of identity providers into what the
//! discovery page shows:
//!
//! - **Comparator**: weight, then name, then entity ID ordering
//! - **Tabs**: tag-keyed, ordered buckets with a pluggable re-ranking hook
//! - **Filter**: service-provider include/exclude rules
//! - **Display**: validated tab names and per-entry presentation data

pub mod compare;
pub mod display;
pub mod error;
pub mod filter;
pub mod tabs;

pub use compare::compare;
pub use display::{DisplayEntry, DisplayRequest, DisplayTab, build_display_tabs, validate_tab_name};
pub use error::ViewError;
pub use filter::{FilterRule, apply_filter};
pub use tabs::{IdentityHook, SortHook, Tab, TabLayout, TabbedView};
