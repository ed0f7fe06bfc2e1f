//! Core types for the gift card balance service.
//!
//! This module provides the gift card data model and the lookup key.

pub mod balance;
pub mod gift_card;
pub mod lookup_key;

pub use balance::BalanceResponse;
pub use gift_card::{
    Expiry, ExpiryError, GiftCard, GiftCardEdge, GiftCardPage, Money, SearchResult,
};
pub use lookup_key::{KEY_LENGTH, LookupKey, normalize_code};
