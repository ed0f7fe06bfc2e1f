//! Gift card snapshots as returned by the upstream commerce platform.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Expiry`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpiryError {
    /// The value is neither an ISO 8601 date nor an RFC 3339 timestamp.
    #[error("invalid expiry '{0}': expected YYYY-MM-DD or an RFC 3339 timestamp")]
    Invalid(String),
}

/// Gift card expiry.
///
/// Shopify reports `expiresOn` as a calendar date (`2026-12-31`). A bare date
/// is taken to mean midnight UTC at the start of that day, so a card expiring
/// "on" a date stops being usable once that day begins. Full RFC 3339
/// timestamps are accepted as well.
///
/// The original text is retained and is what gets serialized back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expiry {
    instant: DateTime<Utc>,
    raw: String,
}

impl Expiry {
    /// Parse an expiry from upstream text.
    ///
    /// # Errors
    ///
    /// Returns [`ExpiryError::Invalid`] if the value is not a date or timestamp.
    pub fn parse(raw: &str) -> Result<Self, ExpiryError> {
        let instant = DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            })
            .map_err(|_| ExpiryError::Invalid(raw.to_owned()))?;

        Ok(Self {
            instant,
            raw: raw.to_owned(),
        })
    }

    /// The expiry exactly as the upstream reported it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the expiry is strictly after `now`.
    #[must_use]
    pub fn is_after(&self, now: DateTime<Utc>) -> bool {
        self.instant > now
    }
}

impl TryFrom<String> for Expiry {
    type Error = ExpiryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Expiry> for String {
    fn from(value: Expiry) -> Self {
        value.raw
    }
}

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount; keeps the upstream scale (`"25.00"` stays `"25.00"`).
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// A gift card as seen at query time.
///
/// Deliberately carries no identifier and no full code: the lookup query
/// never requests them, so they cannot leak into a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCard {
    /// Whether the card is enabled (deactivated cards are not).
    pub enabled: bool,
    /// When the card expires, if ever.
    pub expires_on: Option<Expiry>,
    /// Last four characters of the card code, as stored upstream.
    pub last_characters: String,
    /// Remaining balance.
    pub balance: Money,
}

/// A gift card together with its position in the upstream collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftCardEdge {
    /// Opaque pagination cursor pointing at this card.
    pub cursor: String,
    /// The card itself.
    pub card: GiftCard,
}

/// One page of the upstream gift card collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GiftCardPage {
    /// Cards in upstream order.
    pub edges: Vec<GiftCardEdge>,
    /// Whether another page follows this one.
    pub has_next_page: bool,
}

impl GiftCardPage {
    /// Cursor of the final edge, used to request the following page.
    #[must_use]
    pub fn end_cursor(&self) -> Option<&str> {
        self.edges.last().map(|edge| edge.cursor.as_str())
    }
}

/// Result of searching the collection for a lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// The first eligible card in scan order.
    Found(GiftCard),
    /// The collection was exhausted without an eligible match.
    NotFound,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_parses_bare_date_as_start_of_day_utc() {
        let expiry = Expiry::parse("2026-12-31").unwrap();
        assert!(expiry.is_after(Utc.with_ymd_and_hms(2026, 12, 30, 23, 59, 59).unwrap()));
        assert!(!expiry.is_after(Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap()));
        assert_eq!(expiry.as_str(), "2026-12-31");
    }

    #[test]
    fn test_expiry_parses_rfc3339_with_offset() {
        let expiry = Expiry::parse("2026-06-01T12:00:00+02:00").unwrap();
        assert!(expiry.is_after(Utc.with_ymd_and_hms(2026, 6, 1, 9, 59, 59).unwrap()));
        assert!(!expiry.is_after(Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn test_expiry_rejects_garbage() {
        assert!(matches!(
            Expiry::parse("next tuesday"),
            Err(ExpiryError::Invalid(_))
        ));
    }

    #[test]
    fn test_expiry_is_strictly_after() {
        let expiry = Expiry::parse("2026-01-01").unwrap();
        let midnight = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(expiry.is_after(midnight - chrono::Duration::seconds(1)));
        assert!(!expiry.is_after(midnight));
    }

    #[test]
    fn test_expiry_serializes_original_text() {
        let expiry = Expiry::parse("2027-03-15").unwrap();
        assert_eq!(serde_json::to_string(&expiry).unwrap(), "\"2027-03-15\"");
    }

    #[test]
    fn test_money_amount_round_trips_as_string() {
        let money: Money =
            serde_json::from_str(r#"{"amount":"25.00","currency_code":"EUR"}"#).unwrap();
        assert_eq!(money.amount.to_string(), "25.00");
        assert_eq!(
            serde_json::to_value(&money).unwrap()["amount"],
            serde_json::json!("25.00")
        );
    }

    #[test]
    fn test_end_cursor_is_last_edge() {
        let card = GiftCard {
            enabled: true,
            expires_on: None,
            last_characters: "ABCD".to_string(),
            balance: Money {
                amount: Decimal::new(1000, 2),
                currency_code: "USD".to_string(),
            },
        };
        let page = GiftCardPage {
            edges: vec![
                GiftCardEdge {
                    cursor: "c1".to_string(),
                    card: card.clone(),
                },
                GiftCardEdge {
                    cursor: "c2".to_string(),
                    card,
                },
            ],
            has_next_page: true,
        };
        assert_eq!(page.end_cursor(), Some("c2"));
        assert_eq!(GiftCardPage::default().end_cursor(), None);
    }
}
