//! Business logic services.

pub mod gift_card_lookup;
