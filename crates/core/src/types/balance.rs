//! Public balance response.

use rust_decimal::Decimal;
use serde::Serialize;

use super::gift_card::GiftCard;

/// The only gift card data ever returned to a caller.
///
/// Balance, currency and expiry. No identifier, no code characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceResponse {
    /// Remaining balance as a decimal string.
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Expiry exactly as reported upstream, or `null`.
    pub expires_on: Option<String>,
}

impl From<&GiftCard> for BalanceResponse {
    fn from(card: &GiftCard) -> Self {
        Self {
            balance: card.balance.amount,
            currency: card.balance.currency_code.clone(),
            expires_on: card.expires_on.as_ref().map(|e| e.as_str().to_owned()),
        }
    }
}
