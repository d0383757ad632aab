//! Cart line mutation against available stock.

use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductId};

/// A product in the cart with a price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub qty: u32,
    pub image: String,
    pub price: Money,
}

/// Errors from changing cart lines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("Not enough stock")]
    NotEnoughStock,
    #[error("Item not found in cart")]
    ItemNotInCart,
}

/// What [`add_line`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Added,
    Updated,
}

impl LineChange {
    /// Shopper-facing confirmation for the product `name`.
    #[must_use]
    pub fn message(&self, name: &str) -> String {
        match self {
            Self::Added => format!("{name} added to cart"),
            Self::Updated => format!("{name} updated in cart"),
        }
    }
}

/// Add one unit of `line.product_id`.
///
/// An existing line has its quantity bumped by one; otherwise `line` is
/// appended as given. `stock` is the product's current stock level.
///
/// # Errors
///
/// Returns [`CartError::NotEnoughStock`] when the resulting quantity would
/// exceed `stock`.
pub fn add_line(lines: &mut Vec<CartLine>, line: CartLine, stock: i32) -> Result<LineChange, CartError> {
    let stock = i64::from(stock);

    if let Some(existing) = lines.iter_mut().find(|l| l.product_id == line.product_id) {
        if stock < i64::from(existing.qty) + 1 {
            return Err(CartError::NotEnoughStock);
        }
        existing.qty += 1;
        return Ok(LineChange::Updated);
    }

    if stock < 1 {
        return Err(CartError::NotEnoughStock);
    }
    lines.push(line);
    Ok(LineChange::Added)
}

/// Remove one unit of `product_id`, dropping the line when it reaches zero.
///
/// # Errors
///
/// Returns [`CartError::ItemNotInCart`] if no line matches.
pub fn remove_line(lines: &mut Vec<CartLine>, product_id: ProductId) -> Result<(), CartError> {
    let pos = lines
        .iter()
        .position(|l| l.product_id == product_id)
        .ok_or(CartError::ItemNotInCart)?;

    match lines.get_mut(pos) {
        Some(line) if line.qty > 1 => line.qty -= 1,
        _ => {
            lines.remove(pos);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: ProductId, qty: u32) -> CartLine {
        CartLine {
            product_id: id,
            name: "Brooks Brothers Shirt".into(),
            slug: "brooks-brothers-shirt".into(),
            qty,
            image: "/p2-1.jpg".into(),
            price: Money::parse("85.90").unwrap(),
        }
    }

    #[test]
    fn test_adds_new_line_when_in_stock() {
        let id = ProductId::new();
        let mut lines = Vec::new();
        assert_eq!(add_line(&mut lines, line(id, 1), 3).unwrap(), LineChange::Added);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_new_line_with_no_stock_fails() {
        let mut lines = Vec::new();
        let err = add_line(&mut lines, line(ProductId::new(), 1), 0).unwrap_err();
        assert_eq!(err, CartError::NotEnoughStock);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_existing_line_increments() {
        let id = ProductId::new();
        let mut lines = vec![line(id, 1)];
        assert_eq!(add_line(&mut lines, line(id, 1), 2).unwrap(), LineChange::Updated);
        assert_eq!(lines.first().unwrap().qty, 2);
    }

    #[test]
    fn test_existing_line_cannot_exceed_stock() {
        let id = ProductId::new();
        let mut lines = vec![line(id, 2)];
        assert_eq!(
            add_line(&mut lines, line(id, 1), 2).unwrap_err(),
            CartError::NotEnoughStock
        );
        assert_eq!(lines.first().unwrap().qty, 2);
    }

    #[test]
    fn test_remove_decrements_then_drops() {
        let id = ProductId::new();
        let mut lines = vec![line(id, 2)];
        remove_line(&mut lines, id).unwrap();
        assert_eq!(lines.first().unwrap().qty, 1);
        remove_line(&mut lines, id).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_remove_missing_line() {
        let mut lines = vec![line(ProductId::new(), 1)];
        assert_eq!(
            remove_line(&mut lines, ProductId::new()).unwrap_err(),
            CartError::ItemNotInCart
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(LineChange::Added.message("Shirt"), "Shirt added to cart");
        assert_eq!(LineChange::Updated.message("Shirt"), "Shirt updated in cart");
    }
}
