//! GraphQL documents and response shapes for the Shopify Admin API.
//!
//! The gift card query only selects what a balance check needs. It never asks
//! for the card ID, the masked code, the customer or the order.

use graphql_client::QueryBody;
use serde::{Deserialize, Serialize};

/// Gift card page query.
pub const GIFT_CARD_BALANCES_QUERY: &str = r"
query GiftCardBalances($first: Int!, $after: String, $query: String) {
  giftCards(first: $first, after: $after, query: $query) {
    edges {
      cursor
      node {
        enabled
        expiresOn
        lastCharacters
        balance {
          amount
          currencyCode
        }
      }
    }
    pageInfo {
      hasNextPage
    }
  }
}
";

/// Operation name of [`GIFT_CARD_BALANCES_QUERY`].
pub const GIFT_CARD_BALANCES_OPERATION: &str = "GiftCardBalances";

/// Shopify search syntax restricting results to enabled cards.
pub const ENABLED_ONLY_FILTER: &str = "status:enabled";

/// Variables for [`GIFT_CARD_BALANCES_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftCardBalancesVariables {
    pub first: i64,
    pub after: Option<String>,
    pub query: Option<String>,
}

/// Build the request body for one gift card page.
#[must_use]
pub fn gift_card_balances(variables: GiftCardBalancesVariables) -> QueryBody<GiftCardBalancesVariables> {
    QueryBody {
        variables,
        query: GIFT_CARD_BALANCES_QUERY,
        operation_name: GIFT_CARD_BALANCES_OPERATION,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardBalancesData {
    pub gift_cards: GiftCardConnectionData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardConnectionData {
    pub edges: Vec<GiftCardEdgeData>,
    pub page_info: PageInfoData,
}

#[derive(Debug, Deserialize)]
pub struct GiftCardEdgeData {
    pub cursor: String,
    pub node: GiftCardNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardNode {
    pub enabled: bool,
    pub expires_on: Option<String>,
    pub last_characters: String,
    pub balance: MoneyData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyData {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoData {
    pub has_next_page: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_never_selects_identifying_fields() {
        for field in ["id", "maskedCode", "code", "customer", "order"] {
            let selected = GIFT_CARD_BALANCES_QUERY
                .lines()
                .any(|line| line.trim() == field || line.trim().starts_with(&format!("{field} ")));
            assert!(!selected, "query must not select `{field}`");
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = gift_card_balances(GiftCardBalancesVariables {
            first: 100,
            after: Some("eyJsYXN0X2lkIjo0Mn0=".to_string()),
            query: Some(ENABLED_ONLY_FILTER.to_string()),
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["operationName"], "GiftCardBalances");
        assert_eq!(json["variables"]["first"], 100);
        assert_eq!(json["variables"]["after"], "eyJsYXN0X2lkIjo0Mn0=");
        assert_eq!(json["variables"]["query"], "status:enabled");
    }

    #[test]
    fn test_first_page_sends_null_cursor() {
        let body = gift_card_balances(GiftCardBalancesVariables {
            first: 50,
            after: None,
            query: None,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["variables"]["after"].is_null());
        assert!(json["variables"]["query"].is_null());
    }

    #[test]
    fn test_response_deserializes() {
        let data: GiftCardBalancesData = serde_json::from_value(serde_json::json!({
            "giftCards": {
                "edges": [{
                    "cursor": "c1",
                    "node": {
                        "enabled": true,
                        "expiresOn": null,
                        "lastCharacters": "ab12",
                        "balance": { "amount": "10.0", "currencyCode": "USD" }
                    }
                }],
                "pageInfo": { "hasNextPage": false }
            }
        }))
        .unwrap();

        assert_eq!(data.gift_cards.edges.len(), 1);
        assert!(!data.gift_cards.page_info.has_next_page);
    }
}
