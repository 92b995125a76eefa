//! # Cart Aggregator
//!
//! Reduces a cart snapshot to its subtotal. No business rules live here:
//! the only checks are that the cart is non-empty and each line is
//! well-formed.
//!
//! ```text
//! [LineItem, LineItem, ...] ──► validate each line ──► Σ price × qty ──► Money
//!          │
//!          └── empty ──► CoreError::EmptyCart (nothing else runs)
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::LineItem;
use crate::validation::{validate_cart_size, validate_price_cents, validate_product_ref, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_SUBTOTAL_CENTS};

/// Validates a single line item.
pub fn validate_line(index: usize, item: &LineItem) -> CoreResult<()> {
    validate_product_ref(&item.product_id)
        .and_then(|_| validate_quantity(item.quantity))
        .and_then(|_| validate_price_cents(item.unit_price_cents))
        .map_err(|source| CoreError::InvalidLineItem {
            index,
            product_id: item.product_id.clone(),
            source,
        })
}

/// Computes the subtotal of a cart snapshot.
///
/// ## Errors
/// - [`CoreError::EmptyCart`] when `items` is empty
/// - [`CoreError::CartTooLarge`] above [`MAX_CART_ITEMS`] lines
/// - [`CoreError::InvalidLineItem`] for the first malformed line
/// - [`CoreError::AmountOverflow`] if the sum exceeds [`MAX_SUBTOTAL_CENTS`]
///
/// ## Example
/// ```rust
/// use kredit_core::{cart, LineItem};
///
/// let items = vec![
///     LineItem::new("RICE-25KG", 45_000, 2),
///     LineItem::new("OIL-5L", 10_000, 1),
/// ];
/// assert_eq!(cart::subtotal(&items).unwrap().cents(), 100_000);
/// assert!(cart::subtotal(&[]).is_err());
/// ```
pub fn subtotal(items: &[LineItem]) -> CoreResult<Money> {
    if items.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if validate_cart_size(items.len()).is_err() {
        return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
    }

    let mut total = Money::zero();
    for (index, item) in items.iter().enumerate() {
        validate_line(index, item)?;

        let line = item.line_subtotal().ok_or_else(|| CoreError::AmountOverflow {
            context: format!("line {} subtotal", index),
        })?;
        total = total
            .checked_add(line)
            .filter(|sum| sum.cents() <= MAX_SUBTOTAL_CENTS)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: "cart subtotal".to_string(),
            })?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_subtotal_sums_lines() {
        let items = vec![
            LineItem::new("A", 1_099, 3),
            LineItem::new("B", 0, 1),
            LineItem::new("C", 50_000, 2),
        ];
        assert_eq!(subtotal(&items).unwrap(), Money::from_cents(103_297));
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(subtotal(&[]), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_too_many_lines() {
        let items: Vec<LineItem> = (0..=MAX_CART_ITEMS)
            .map(|i| LineItem::new(format!("SKU-{}", i), 100, 1))
            .collect();
        assert!(matches!(subtotal(&items), Err(CoreError::CartTooLarge { .. })));
    }

    #[test]
    fn test_invalid_line_reports_index() {
        let items = vec![LineItem::new("A", 100, 1), LineItem::new("B", 100, 0)];
        match subtotal(&items) {
            Err(CoreError::InvalidLineItem { index, product_id, source }) => {
                assert_eq!(index, 1);
                assert_eq!(product_id, "B");
                assert!(matches!(source, ValidationError::MustBePositive { .. }));
            }
            other => panic!("expected InvalidLineItem, got {:?}", other),
        }

        let items = vec![LineItem::new("A", -5, 1)];
        assert!(matches!(subtotal(&items), Err(CoreError::InvalidLineItem { index: 0, .. })));
    }

    #[test]
    fn test_subtotal_ceiling() {
        let at_limit = vec![
            LineItem::new("A", MAX_SUBTOTAL_CENTS - 1_000, 1),
            LineItem::new("B", 500, 2),
        ];
        assert_eq!(subtotal(&at_limit).unwrap().cents(), MAX_SUBTOTAL_CENTS);

        let over = vec![LineItem::new("A", MAX_SUBTOTAL_CENTS, 1), LineItem::new("B", 1, 1)];
        assert!(matches!(subtotal(&over), Err(CoreError::AmountOverflow { .. })));

        let line_over = vec![LineItem::new("A", MAX_SUBTOTAL_CENTS / 2 + 1, 2)];
        assert!(matches!(subtotal(&line_over), Err(CoreError::AmountOverflow { .. })));
    }

    #[test]
    fn test_huge_unit_prices_never_reach_pricing() {
        let items: Vec<LineItem> = (0..MAX_CART_ITEMS)
            .map(|i| LineItem::new(format!("SKU-{}", i), i64::MAX / 100, 1))
            .collect();

        assert!(matches!(
            subtotal(&items),
            Err(CoreError::InvalidLineItem { index: 0, .. })
        ));

        let items: Vec<LineItem> = (0..MAX_CART_ITEMS)
            .map(|i| LineItem::new(format!("SKU-{}", i), MAX_SUBTOTAL_CENTS / 10, 1))
            .collect();
        assert!(matches!(subtotal(&items), Err(CoreError::AmountOverflow { .. })));
    }
}
