//! Cart totals.
//!
//! Totals are always derived from the line items. Nothing a client sends is
//! trusted for pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::Money;

/// Orders with an items subtotal strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_whole(100);

/// Flat shipping charge below the free-shipping threshold.
pub const FLAT_SHIPPING: Money = Money::from_whole(10);

/// Sales tax rate applied to the items subtotal.
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Derived monetary totals for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriceBreakdown {
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
}

impl PriceBreakdown {
    /// All-zero totals, used when a cart is emptied by order placement.
    pub const EMPTY: Self = Self {
        items_price: Money::ZERO,
        shipping_price: Money::ZERO,
        tax_price: Money::ZERO,
        total_price: Money::ZERO,
    };
}

/// Compute totals for a set of lines.
///
/// - items: sum of `price * qty`
/// - shipping: free above [`FREE_SHIPPING_THRESHOLD`], otherwise [`FLAT_SHIPPING`]
/// - tax: [`TAX_RATE`] of items
/// - total: items + tax + shipping
///
/// Each figure is rounded to cents.
#[must_use]
pub fn calc_price(lines: &[CartLine]) -> PriceBreakdown {
    let items_price: Money = lines.iter().map(|l| l.price.times(l.qty)).sum();
    let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
        Money::ZERO
    } else {
        FLAT_SHIPPING
    };
    let tax_price = items_price.scale(TAX_RATE);

    PriceBreakdown {
        items_price,
        shipping_price,
        tax_price,
        total_price: items_price + tax_price + shipping_price,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn line(price: &str, qty: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(),
            name: "Item".into(),
            slug: "item".into(),
            qty,
            image: "/img.jpg".into(),
            price: Money::parse(price).unwrap(),
        }
    }

    #[test]
    fn test_below_threshold_pays_flat_shipping() {
        let totals = calc_price(&[line("25.00", 2)]);
        assert_eq!(totals.items_price.to_string(), "50.00");
        assert_eq!(totals.shipping_price.to_string(), "10.00");
        assert_eq!(totals.tax_price.to_string(), "7.50");
        assert_eq!(totals.total_price.to_string(), "67.50");
    }

    #[test]
    fn test_exactly_one_hundred_still_pays_shipping() {
        let totals = calc_price(&[line("100.00", 1)]);
        assert_eq!(totals.shipping_price.to_string(), "10.00");
        assert_eq!(totals.total_price.to_string(), "125.00");
    }

    #[test]
    fn test_above_threshold_ships_free() {
        let totals = calc_price(&[line("59.99", 1), line("85.90", 1)]);
        assert_eq!(totals.items_price.to_string(), "145.89");
        assert_eq!(totals.shipping_price.to_string(), "0.00");
        // 0.15 * 145.89 = 21.8835
        assert_eq!(totals.tax_price.to_string(), "21.88");
        assert_eq!(totals.total_price.to_string(), "167.77");
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.15 * 0.10 = 0.015
        let totals = calc_price(&[line("0.10", 1)]);
        assert_eq!(totals.tax_price.to_string(), "0.02");
    }

    #[test]
    fn test_empty_lines_still_charge_shipping() {
        let totals = calc_price(&[]);
        assert_eq!(totals.items_price, Money::ZERO);
        assert_eq!(totals.total_price.to_string(), "10.00");
    }
}
