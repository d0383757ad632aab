//! A shopping session played against the cart and pricing rules.

#![allow(clippy::unwrap_used)]

use prostore_core::cart::{CartError, CartLine, LineChange, add_line, remove_line};
use prostore_core::pricing::{FLAT_SHIPPING, PriceBreakdown, calc_price};
use prostore_core::{Money, ProductId};

fn shirt(id: ProductId, price: &str) -> CartLine {
    CartLine {
        product_id: id,
        name: "Polo Sporting Stretch Shirt".into(),
        slug: "polo-sporting-stretch-shirt".into(),
        qty: 1,
        image: "/images/sample-products/p1-1.jpg".into(),
        price: Money::parse(price).unwrap(),
    }
}

fn money(s: &str) -> Money {
    Money::parse(s).unwrap()
}

#[test]
fn test_cart_crosses_free_shipping_threshold() {
    let id = ProductId::new();
    let mut lines = Vec::new();

    assert_eq!(add_line(&mut lines, shirt(id, "59.99"), 5).unwrap(), LineChange::Added);
    let one = calc_price(&lines);
    assert_eq!(one.items_price, money("59.99"));
    assert_eq!(one.shipping_price, FLAT_SHIPPING);
    assert_eq!(one.tax_price, money("9.00"));
    assert_eq!(one.total_price, money("78.99"));

    assert_eq!(add_line(&mut lines, shirt(id, "59.99"), 5).unwrap(), LineChange::Updated);
    let two = calc_price(&lines);
    assert_eq!(two.items_price, money("119.98"));
    assert_eq!(two.shipping_price, Money::ZERO);
    assert_eq!(two.tax_price, money("18.00"));
    assert_eq!(two.total_price, money("137.98"));
}

#[test]
fn test_stock_caps_quantity() {
    let id = ProductId::new();
    let mut lines = Vec::new();

    add_line(&mut lines, shirt(id, "85.90"), 2).unwrap();
    add_line(&mut lines, shirt(id, "85.90"), 2).unwrap();
    assert_eq!(
        add_line(&mut lines, shirt(id, "85.90"), 2),
        Err(CartError::NotEnoughStock)
    );
    assert_eq!(lines.first().unwrap().qty, 2);
}

#[test]
fn test_emptying_the_cart() {
    let id = ProductId::new();
    let mut lines = Vec::new();

    add_line(&mut lines, shirt(id, "39.95"), 10).unwrap();
    add_line(&mut lines, shirt(id, "39.95"), 10).unwrap();
    remove_line(&mut lines, id).unwrap();
    assert_eq!(lines.first().unwrap().qty, 1);

    remove_line(&mut lines, id).unwrap();
    assert!(lines.is_empty());
    assert_eq!(remove_line(&mut lines, id), Err(CartError::ItemNotInCart));
    assert_eq!(calc_price(&lines).items_price, PriceBreakdown::EMPTY.items_price);
}
