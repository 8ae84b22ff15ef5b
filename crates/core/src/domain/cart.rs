use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart has no line for product {0}")]
    LineNotFound(String),
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// Server-side cart for one browser session. Lines are unique per product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub session_id: String,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), lines: Vec::new() }
    }

    pub fn from_lines(session_id: impl Into<String>, lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new(session_id);
        for line in lines {
            cart.merge(line);
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Units of `product_id` already in the cart.
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn add(&mut self, line: CartLine) -> Result<(), CartError> {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        self.merge(line);
        Ok(())
    }

    /// Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        let position = self
            .lines
            .iter()
            .position(|line| &line.product_id == product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.0.clone()))?;

        if quantity == 0 {
            self.lines.remove(position);
        } else {
            self.lines[position].quantity = quantity;
        }
        Ok(())
    }

    pub fn remove(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound(product_id.0.clone()));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn merge(&mut self, line: CartLine) {
        match self.lines.iter_mut().find(|existing| existing.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.unit_price = line.unit_price;
                existing.name = line.name;
            }
            None => self.lines.push(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Cart, CartError, CartLine};
    use crate::domain::product::ProductId;

    fn line(id: &str, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId(id.to_string()),
            name: format!("Product {id}"),
            unit_price: Decimal::new(cents, 2),
            quantity,
        }
    }

    #[test]
    fn adding_same_product_merges_quantity() {
        let mut cart = Cart::new("sess-1");
        cart.add(line("p1", 1000, 2)).expect("add");
        cart.add(line("p1", 1000, 1)).expect("add");
        cart.add(line("p2", 250, 4)).expect("add");

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.item_count(), 7);
        assert_eq!(cart.subtotal(), Decimal::new(4000, 2));
    }

    #[test]
    fn item_count_does_not_overflow_on_huge_lines() {
        let cart = Cart::from_lines("sess-1", vec![line("p1", 100, u32::MAX), line("p2", 100, u32::MAX)]);
        assert_eq!(cart.item_count(), 2 * u64::from(u32::MAX));
        assert_eq!(cart.quantity_of(&ProductId("p2".to_string())), u32::MAX);
        assert_eq!(cart.quantity_of(&ProductId("p3".to_string())), 0);
    }

    #[test]
    fn zero_quantity_add_is_rejected() {
        let mut cart = Cart::new("sess-1");
        assert_eq!(cart.add(line("p1", 100, 0)), Err(CartError::ZeroQuantity));
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let mut cart = Cart::from_lines("sess-1", vec![line("p1", 100, 1), line("p2", 100, 1)]);
        cart.set_quantity(&ProductId("p1".to_string()), 0).expect("set");
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id.0, "p2");
    }

    #[test]
    fn removing_missing_line_fails() {
        let mut cart = Cart::new("sess-1");
        assert!(matches!(
            cart.remove(&ProductId("nope".to_string())),
            Err(CartError::LineNotFound(_))
        ));
    }
}
