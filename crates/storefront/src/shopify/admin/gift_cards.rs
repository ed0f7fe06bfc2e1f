//! Gift card page fetching for the Admin API.

use guna_core::{Expiry, GiftCard, GiftCardEdge, GiftCardPage, Money};
use rust_decimal::Decimal;
use tracing::instrument;

use super::{
    AdminClient, ShopifyError,
    queries::{
        ENABLED_ONLY_FILTER, GiftCardBalancesData, GiftCardBalancesVariables, GiftCardNode,
        gift_card_balances,
    },
};

impl AdminClient {
    /// Fetch one page of gift cards.
    ///
    /// Requests the configured page size, starting after `after` (or at the
    /// beginning of the collection). When enabled-only scoping is configured
    /// Shopify filters out disabled cards server-side; callers must still
    /// check `enabled` themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, Shopify answers with a
    /// non-success status or GraphQL errors, or a card carries a balance or
    /// expiry that cannot be parsed.
    #[instrument(skip(self, after), fields(page_size = self.inner.page_size, has_cursor = after.is_some()))]
    pub async fn fetch_gift_card_page(
        &self,
        after: Option<&str>,
    ) -> Result<GiftCardPage, ShopifyError> {
        let body = gift_card_balances(GiftCardBalancesVariables {
            first: i64::from(self.inner.page_size),
            after: after.map(str::to_owned),
            query: self
                .inner
                .enabled_only
                .then(|| ENABLED_ONLY_FILTER.to_string()),
        });

        let data: GiftCardBalancesData = self.execute(&body).await?;
        let connection = data.gift_cards;

        let edges = connection
            .edges
            .into_iter()
            .map(|edge| {
                Ok(GiftCardEdge {
                    card: convert_gift_card(edge.node)?,
                    cursor: edge.cursor,
                })
            })
            .collect::<Result<Vec<_>, ShopifyError>>()?;

        tracing::debug!(
            cards = edges.len(),
            has_next_page = connection.page_info.has_next_page,
            "Fetched gift card page"
        );

        Ok(GiftCardPage {
            edges,
            has_next_page: connection.page_info.has_next_page,
        })
    }
}

fn convert_gift_card(node: GiftCardNode) -> Result<GiftCard, ShopifyError> {
    let amount = node.balance.amount.parse::<Decimal>().map_err(|e| {
        ShopifyError::InvalidData(format!(
            "gift card balance '{}' is not a decimal: {e}",
            node.balance.amount
        ))
    })?;

    let expires_on = node
        .expires_on
        .as_deref()
        .map(Expiry::parse)
        .transpose()
        .map_err(|e| ShopifyError::InvalidData(e.to_string()))?;

    Ok(GiftCard {
        enabled: node.enabled,
        expires_on,
        last_characters: node.last_characters,
        balance: Money {
            amount,
            currency_code: node.balance.currency_code,
        },
    })
}
