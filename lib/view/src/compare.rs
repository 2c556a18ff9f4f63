//! Ordering of identity providers within a tab.

use discopower_core::EntityRecord;
use std::cmp::Ordering;

/// Compares two entities for display order.
///
/// Larger weights sort first. Among equal weights, named entities sort
/// before unnamed ones and names compare ASCII case-insensitively. Unnamed
/// entities, and any remaining ties, are ordered by entity ID so the result
/// is total and deterministic.
#[must_use]
pub fn compare(a: &EntityRecord, b: &EntityRecord, default_weight: i64) -> Ordering {
    let wa = a.effective_weight(default_weight);
    let wb = b.effective_weight(default_weight);

    wb.cmp(&wa)
        .then_with(|| match (a.display_name(), b.display_name()) {
            (Some(na), Some(nb)) => caseless_cmp(na, nb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| caseless_cmp(a.entity_id().as_str(), b.entity_id().as_str()))
        .then_with(|| a.entity_id().cmp(b.entity_id()))
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}
