//! Gift card eligibility rules.
//!
//! Pure functions: the evaluation instant is always passed in so the same
//! inputs always give the same answer.

use chrono::{DateTime, Utc};

use crate::types::{GiftCard, GiftCardEdge, LookupKey};

/// Returns `true` if `card` may answer a lookup for `key` at `now`.
///
/// A card is eligible when all of the following hold:
/// - its `last_characters` equal the key, ignoring case
/// - it is enabled
/// - it has no expiry, or expires strictly after `now`
///
/// Upstream-side filtering (e.g. `status:enabled`) is never trusted in place
/// of this check.
#[must_use]
pub fn is_eligible(card: &GiftCard, key: &LookupKey, now: DateTime<Utc>) -> bool {
    card.last_characters.to_uppercase() == key.as_str()
        && card.enabled
        && card.expires_on.as_ref().is_none_or(|e| e.is_after(now))
}

/// First eligible card among `edges`, in the order given.
///
/// Several cards can share the same last four characters; the earliest one
/// in upstream order wins.
#[must_use]
pub fn first_eligible<'a>(
    edges: &'a [GiftCardEdge],
    key: &LookupKey,
    now: DateTime<Utc>,
) -> Option<&'a GiftCard> {
    edges
        .iter()
        .map(|edge| &edge.card)
        .find(|card| is_eligible(card, key, now))
}
