//! # Sale Edit Planning
//!
//! Works out what has to happen to a committed sale's rows and to product
//! stock when the sale changes. Both post-commit corrections and
//! continue-sale commits produce a [`SaleEditPlan`]; the database layer
//! applies it in one transaction.
//!
//! ## Stock Compensation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Change                        Stock delta (positive = back on shelf)  │
//! │  ──────                        ──────────────────────────────────────  │
//! │  qty 5 → 3                     +2                                       │
//! │  qty 3 → 5                     -2                                       │
//! │  line deleted (qty 4)          +4                                       │
//! │  line added (qty 2)            -2                                       │
//! │                                                                         │
//! │  Sale total = Σ subtotals of the surviving lines                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Editing a line from q1 to q2 moves stock by exactly (q1 − q2) and the
//! sale total by (q2 − q1) × unit price.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLine;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::SaleItem;
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Edit Request
// =============================================================================

/// New quantity for one existing sale item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EditLine {
    pub item_id: String,
    pub quantity: i64,
}

/// An admin's correction of a committed sale.
///
/// Items mentioned in neither list stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleEdit {
    #[serde(default)]
    pub lines: Vec<EditLine>,
    /// Item ids to delete.
    #[serde(default)]
    pub removed: Vec<String>,
}

// =============================================================================
// Plan
// =============================================================================

/// One row-level change to a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineChange {
    Update {
        item_id: String,
        product_id: String,
        old_quantity: i64,
        new_quantity: i64,
        unit_price_cents: i64,
        subtotal_cents: i64,
    },
    Delete {
        item_id: String,
        product_id: String,
        quantity: i64,
    },
    Insert {
        product_id: String,
        name: String,
        quantity: i64,
        unit_price_cents: i64,
        subtotal_cents: i64,
    },
}

impl LineChange {
    pub fn product_id(&self) -> &str {
        match self {
            LineChange::Update { product_id, .. }
            | LineChange::Delete { product_id, .. }
            | LineChange::Insert { product_id, .. } => product_id,
        }
    }

    /// Units returned to (positive) or taken from (negative) the shelf.
    pub fn stock_delta(&self) -> i64 {
        match self {
            LineChange::Update {
                old_quantity,
                new_quantity,
                ..
            } => old_quantity - new_quantity,
            LineChange::Delete { quantity, .. } => *quantity,
            LineChange::Insert { quantity, .. } => -quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleEditPlan {
    pub changes: Vec<LineChange>,
    /// Total of the sale after the plan is applied.
    pub total_cents: i64,
}

impl SaleEditPlan {
    /// Plans an admin correction of `items`.
    ///
    /// ## Errors
    /// - quantity below 1 (removal has to be explicit) or above the maximum
    /// - unknown or repeated item ids
    /// - removing every line (delete the sale instead)
    pub fn for_edit(items: &[SaleItem], edit: &SaleEdit) -> CoreResult<Self> {
        let mut seen: HashSet<&str> = HashSet::new();

        for line in &edit.lines {
            if !seen.insert(line.item_id.as_str()) {
                return Err(duplicate(&line.item_id));
            }
            if line.quantity < 1 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
            if line.quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: line.quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            if !items.iter().any(|i| i.id == line.item_id) {
                return Err(CoreError::SaleItemNotFound(line.item_id.clone()));
            }
        }
        for id in &edit.removed {
            if !seen.insert(id.as_str()) {
                return Err(duplicate(id));
            }
            if !items.iter().any(|i| &i.id == id) {
                return Err(CoreError::SaleItemNotFound(id.clone()));
            }
        }

        let mut changes = Vec::new();
        let mut total = Money::zero();

        for item in items {
            if edit.removed.contains(&item.id) {
                changes.push(LineChange::Delete {
                    item_id: item.id.clone(),
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
                continue;
            }

            let quantity = edit
                .lines
                .iter()
                .find(|l| l.item_id == item.id)
                .map(|l| l.quantity)
                .unwrap_or(item.quantity);
            let subtotal = Money::from_cents(item.unit_price_cents)
                .checked_multiply_quantity(quantity)
                .ok_or_else(|| out_of_range("subtotal"))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| out_of_range("sale total"))?;
            let subtotal_cents = subtotal.cents();

            if quantity != item.quantity {
                changes.push(LineChange::Update {
                    item_id: item.id.clone(),
                    product_id: item.product_id.clone(),
                    old_quantity: item.quantity,
                    new_quantity: quantity,
                    unit_price_cents: item.unit_price_cents,
                    subtotal_cents,
                });
            }
        }

        if !items.is_empty() && edit.removed.len() == items.len() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        Ok(SaleEditPlan {
            changes,
            total_cents: total.cents(),
        })
    }

    /// Plans the commit of a resumed cart against the sale it came from.
    ///
    /// Lines are matched by product id: matched lines are updated in place,
    /// lines only in the sale are deleted, lines only in the cart are
    /// inserted. An unchanged cart yields no changes.
    pub fn reconcile(items: &[SaleItem], lines: &[CartLine]) -> CoreResult<Self> {
        if lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let mut changes = Vec::new();

        for item in items {
            match lines.iter().find(|l| l.product_id == item.product_id) {
                Some(line) => {
                    if line.quantity != item.quantity
                        || line.unit_price_cents != item.unit_price_cents
                    {
                        changes.push(LineChange::Update {
                            item_id: item.id.clone(),
                            product_id: item.product_id.clone(),
                            old_quantity: item.quantity,
                            new_quantity: line.quantity,
                            unit_price_cents: line.unit_price_cents,
                            subtotal_cents: line.subtotal_cents,
                        });
                    }
                }
                None => changes.push(LineChange::Delete {
                    item_id: item.id.clone(),
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                }),
            }
        }

        for line in lines {
            if !items.iter().any(|i| i.product_id == line.product_id) {
                changes.push(LineChange::Insert {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    subtotal_cents: line.subtotal_cents,
                });
            }
        }

        let total = Money::checked_sum(lines.iter().map(CartLine::subtotal))
            .ok_or_else(|| out_of_range("sale total"))?;

        Ok(SaleEditPlan {
            changes,
            total_cents: total.cents(),
        })
    }

    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Net stock movement per product, ordered by product id, zeros omitted.
    ///
    /// Callers apply returns before withdrawals so a product swapped between
    /// lines never dips below zero mid-transaction.
    pub fn stock_deltas(&self) -> Vec<(String, i64)> {
        let mut net: BTreeMap<String, i64> = BTreeMap::new();
        for change in &self.changes {
            *net.entry(change.product_id().to_string()).or_insert(0) += change.stock_delta();
        }

        let mut deltas: Vec<(String, i64)> = net.into_iter().filter(|(_, d)| *d != 0).collect();
        deltas.sort_by(|a, b| b.1.signum().cmp(&a.1.signum()).then_with(|| a.0.cmp(&b.0)));
        deltas
    }
}

fn out_of_range(what: &str) -> CoreError {
    CoreError::AmountOutOfRange(what.to_string())
}

fn duplicate(item_id: &str) -> CoreError {
    ValidationError::Duplicate {
        field: "item_id".to_string(),
        value: item_id.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str, product_id: &str, price: i64, qty: i64) -> SaleItem {
        SaleItem {
            id: id.to_string(),
            sale_id: "s-1".to_string(),
            product_id: product_id.to_string(),
            name_snapshot: product_id.to_string(),
            unit_price_cents: price,
            quantity: qty,
            subtotal_cents: price * qty,
            created_at: Utc::now(),
        }
    }

    fn line(product_id: &str, price: i64, qty: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            name: product_id.to_string(),
            barcode: None,
            unit_price_cents: price,
            quantity: qty,
            subtotal_cents: price * qty,
            stock: 100,
            added_at: Utc::now(),
        }
    }

    fn edit(lines: &[(&str, i64)], removed: &[&str]) -> SaleEdit {
        SaleEdit {
            lines: lines
                .iter()
                .map(|(id, q)| EditLine {
                    item_id: id.to_string(),
                    quantity: *q,
                })
                .collect(),
            removed: removed.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_quantity_change_moves_stock_and_total() {
        let items = vec![item("i-1", "A", 1000, 5), item("i-2", "B", 250, 2)];

        for (q1, q2) in [(5, 3), (5, 8), (5, 1)] {
            let plan = SaleEditPlan::for_edit(&items, &edit(&[("i-1", q2)], &[])).unwrap();
            assert_eq!(plan.stock_deltas(), vec![("A".to_string(), q1 - q2)]);

            let before: i64 = items.iter().map(|i| i.subtotal_cents).sum();
            assert_eq!(plan.total_cents - before, (q2 - q1) * 1000);
        }
    }

    #[test]
    fn test_deleted_line_restores_full_quantity() {
        let items = vec![item("i-1", "A", 1000, 5), item("i-2", "B", 250, 4)];
        let plan = SaleEditPlan::for_edit(&items, &edit(&[], &["i-2"])).unwrap();

        assert_eq!(plan.total_cents, 5000);
        assert_eq!(plan.stock_deltas(), vec![("B".to_string(), 4)]);
        assert!(matches!(plan.changes[0], LineChange::Delete { quantity: 4, .. }));
    }

    #[test]
    fn test_edit_rejects_zero_quantity() {
        let items = vec![item("i-1", "A", 1000, 5)];
        let err = SaleEditPlan::for_edit(&items, &edit(&[("i-1", 0)], &[])).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::MustBePositive { .. })));
    }

    #[test]
    fn test_edit_rejects_unknown_and_duplicate_items() {
        let items = vec![item("i-1", "A", 1000, 5), item("i-2", "B", 100, 1)];

        assert!(matches!(
            SaleEditPlan::for_edit(&items, &edit(&[("nope", 1)], &[])),
            Err(CoreError::SaleItemNotFound(_))
        ));
        assert!(SaleEditPlan::for_edit(&items, &edit(&[("i-1", 2), ("i-1", 3)], &[])).is_err());
        assert!(SaleEditPlan::for_edit(&items, &edit(&[("i-1", 2)], &["i-1"])).is_err());
    }

    #[test]
    fn test_edit_cannot_remove_every_line() {
        let items = vec![item("i-1", "A", 1000, 5)];
        assert!(SaleEditPlan::for_edit(&items, &edit(&[], &["i-1"])).is_err());
    }

    #[test]
    fn test_unchanged_edit_is_noop() {
        let items = vec![item("i-1", "A", 1000, 5)];
        let plan = SaleEditPlan::for_edit(&items, &edit(&[("i-1", 5)], &[])).unwrap();

        assert!(plan.is_noop());
        assert_eq!(plan.total_cents, 5000);
        assert!(plan.stock_deltas().is_empty());
    }

    #[test]
    fn test_reconcile_unchanged_cart_is_stock_neutral() {
        let items = vec![item("i-1", "A", 1000, 3), item("i-2", "B", 200, 2)];
        let lines = vec![line("A", 1000, 3), line("B", 200, 2)];

        let plan = SaleEditPlan::reconcile(&items, &lines).unwrap();

        assert!(plan.is_noop());
        assert_eq!(plan.total_cents, 3400);
        assert!(plan.stock_deltas().is_empty());
    }

    #[test]
    fn test_reconcile_diff_by_product() {
        let items = vec![item("i-1", "A", 1000, 3), item("i-2", "B", 200, 2)];
        let lines = vec![line("A", 1000, 1), line("C", 50, 4)];

        let plan = SaleEditPlan::reconcile(&items, &lines).unwrap();

        assert_eq!(plan.changes.len(), 3);
        assert_eq!(plan.total_cents, 1000 + 200);
        assert_eq!(
            plan.stock_deltas(),
            vec![("A".to_string(), 2), ("B".to_string(), 2), ("C".to_string(), -4)]
        );
    }

    #[test]
    fn test_reconcile_rejects_empty_cart() {
        let items = vec![item("i-1", "A", 1000, 3)];
        assert!(matches!(
            SaleEditPlan::reconcile(&items, &[]),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_overflowing_totals_are_errors() {
        let huge = i64::MAX / 2 + 1;
        let items = vec![item("i-1", "A", huge, 1), item("i-2", "B", huge, 1)];

        assert!(matches!(
            SaleEditPlan::for_edit(&items, &edit(&[], &[])),
            Err(CoreError::AmountOutOfRange(_))
        ));
        assert!(matches!(
            SaleEditPlan::for_edit(&items, &edit(&[("i-1", 2)], &["i-2"])),
            Err(CoreError::AmountOutOfRange(_))
        ));

        let lines = vec![line("A", huge, 1), line("B", huge, 1)];
        assert!(matches!(
            SaleEditPlan::reconcile(&items, &lines),
            Err(CoreError::AmountOutOfRange(_))
        ));
    }
}
