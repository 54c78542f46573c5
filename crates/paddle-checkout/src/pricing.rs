//! Price Preview Reconciliation
//!
//! Maps a catalog onto a preview request and folds the response back into
//! a price per product id.

use crate::model::{
    BillingCycle, PricePreviewItem, PricePreviewRequest, PricePreviewResponse, ProductDetails,
    ProductPrices,
};

/// One line item per product, priced for `cycle`, quantity 1
pub fn build_preview_request(products: &[ProductDetails], cycle: BillingCycle) -> PricePreviewRequest {
    PricePreviewRequest {
        items: products
            .iter()
            .map(|product| PricePreviewItem {
                price_id: product.price_id(cycle).to_string(),
                quantity: 1,
            })
            .collect(),
    }
}

/// Build the price mapping from a preview response
///
/// Each line item goes to the first product owning its price id (monthly or
/// yearly). Line items matching no product are dropped. When several line
/// items land on the same product, the later one wins.
pub fn reconcile_prices(products: &[ProductDetails], response: &PricePreviewResponse) -> ProductPrices {
    let mut prices = ProductPrices::new();

    for item in response.line_items() {
        let Some(product) = products.iter().find(|p| p.matches_price(&item.price.id)) else {
            tracing::debug!(price_id = %item.price.id, "Dropping line item with no matching product");
            continue;
        };

        tracing::debug!(
            product_id = %product.product_id,
            subtotal = %item.formatted_totals.subtotal,
            "Matched line item"
        );
        prices.insert(
            product.product_id.clone(),
            item.formatted_totals.subtotal.clone(),
        );
    }

    prices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineItem;

    fn catalog() -> Vec<ProductDetails> {
        vec![
            ProductDetails::new("starter", "pri_starter_m", "pri_starter_y"),
            ProductDetails::new("pro", "pri_pro_m", "pri_pro_y"),
        ]
    }

    #[test]
    fn test_request_uses_cycle_price_ids() {
        let monthly = build_preview_request(&catalog(), BillingCycle::Month);
        let ids: Vec<_> = monthly.items.iter().map(|i| i.price_id.as_str()).collect();
        assert_eq!(ids, ["pri_starter_m", "pri_pro_m"]);
        assert!(monthly.items.iter().all(|i| i.quantity == 1));

        let yearly = build_preview_request(&catalog(), BillingCycle::Year);
        assert_eq!(yearly.items[1].price_id, "pri_pro_y");
    }

    #[test]
    fn test_reconcile_matches_by_price_id() {
        let response = PricePreviewResponse::from_line_items(vec![
            LineItem::new("pri_starter_y", "$48.00"),
            LineItem::new("pri_pro_y", "$96.00"),
        ]);

        let prices = reconcile_prices(&catalog(), &response);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["starter"], "$48.00");
        assert_eq!(prices["pro"], "$96.00");
    }

    #[test]
    fn test_unmatched_line_item_is_dropped() {
        let response = PricePreviewResponse::from_line_items(vec![
            LineItem::new("pri_pro_m", "$10.00"),
            LineItem::new("pri_unknown", "$1.00"),
        ]);

        let prices = reconcile_prices(&catalog(), &response);
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["pro"], "$10.00");
    }

    #[test]
    fn test_shared_price_id_goes_to_first_product() {
        let products = vec![
            ProductDetails::new("a", "pri_shared", "pri_a_y"),
            ProductDetails::new("b", "pri_shared", "pri_b_y"),
        ];
        let response =
            PricePreviewResponse::from_line_items(vec![LineItem::new("pri_shared", "$5.00")]);

        let prices = reconcile_prices(&products, &response);
        assert_eq!(prices.get("a").map(String::as_str), Some("$5.00"));
        assert!(!prices.contains_key("b"));
    }

    #[test]
    fn test_later_line_item_overwrites() {
        let response = PricePreviewResponse::from_line_items(vec![
            LineItem::new("pri_pro_m", "$10.00"),
            LineItem::new("pri_pro_y", "$96.00"),
        ]);

        let prices = reconcile_prices(&catalog(), &response);
        assert_eq!(prices["pro"], "$96.00");
    }
}
