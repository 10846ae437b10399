use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{FlatRow, InvoiceStatus, TidyRow};
use crate::types::{InvoiceNumber, RowId};

/// How a single adjustment was absorbed into its invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absorption {
    /// The whole adjustment went into the largest row.
    Single(RowId),
    /// The adjustment was spread over every remaining row of the invoice.
    Proportional(Vec<RowId>),
    /// No other row of the invoice remained; the adjustment stays as its own row.
    Unabsorbed
}

/// An adjustment as it stood before any reallocation began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub id: RowId,
    pub invoice_number: InvoiceNumber,
    pub amount: Decimal,
    pub description: String
}

/// Filters, projects and reallocates one file's flattened rows.
///
/// Voided invoices are dropped, every negative line is folded into the
/// other lines of its invoice, and rows that end up at exactly zero are
/// removed. Row order of the survivors is preserved.
pub fn tidy(rows: Vec<FlatRow>) -> Vec<TidyRow> {
    let issued = rows.into_iter()
        .filter(|row| row.status == InvoiceStatus::Issued)
        .map(FlatRow::into_tidy)
        .collect();

    let mut ledger = Ledger::new(issued);

    for adjustment in ledger.adjustments() {
        ledger.absorb(&adjustment);
    }

    ledger.into_rows()
}

/// Working table for reallocation.
///
/// Rows live in slots addressed by a stable `RowId`; removing a row empties
/// its slot so ids never shift while adjustments are being applied.
pub struct Ledger {
    slots: Vec<Option<TidyRow>>
}

impl Ledger {
    pub fn new(rows: Vec<TidyRow>) -> Self {
        Self {
            slots: rows.into_iter().map(Some).collect()
        }
    }

    /// Every adjustment row in table order, captured with its current amount
    /// and description.
    pub fn adjustments(&self) -> Vec<Adjustment> {
        self.live_rows()
            .filter(|(_, row)| row.amount < Decimal::ZERO)
            .map(|(id, row)| Adjustment {
                id,
                invoice_number: row.invoice_number.clone(),
                amount: row.amount,
                description: row.description.clone()
            })
            .collect()
    }

    pub fn get(&self, id: RowId) -> Option<&TidyRow> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// Removes the adjustment's row and folds the captured amount into the
    /// remaining rows of its invoice.
    ///
    /// Whatever an earlier split wrote onto the adjustment row is discarded
    /// with it.
    pub fn absorb(&mut self, adjustment: &Adjustment) -> Absorption {
        let removed = self.slots.get_mut(adjustment.id).and_then(Option::take);

        let candidates = self.invoice_row_ids(&adjustment.invoice_number);

        let Some(target) = self.max_row_id(&candidates) else {
            warn!(
                "Adjustment [{}] of invoice [{}] has no line item to absorb it, keeping it as is",
                adjustment.description, adjustment.invoice_number
            );
            if let Some(row) = removed {
                self.slots[adjustment.id] = Some(row);
            }
            return Absorption::Unabsorbed
        };

        if self.amount_of(target) + adjustment.amount < Decimal::ZERO {
            if let Some(shares) = self.proportional_shares(&candidates, adjustment.amount) {
                for (row_id, share) in &shares {
                    self.apply(*row_id, *share, &adjustment.description);
                }

                debug!(
                    "Spread adjustment [{}] of {} over {} rows of invoice [{}]",
                    adjustment.description, adjustment.amount, shares.len(), adjustment.invoice_number
                );

                return Absorption::Proportional(candidates)
            }
        }

        self.apply(target, adjustment.amount, &adjustment.description);

        debug!(
            "Absorbed adjustment [{}] of {} into row {} of invoice [{}]",
            adjustment.description, adjustment.amount, target, adjustment.invoice_number
        );

        Absorption::Single(target)
    }

    /// Surviving rows in table order, zero-amount rows dropped.
    pub fn into_rows(self) -> Vec<TidyRow> {
        self.slots.into_iter()
            .flatten()
            .filter(|row| !row.amount.is_zero())
            .collect()
    }

    fn live_rows(&self) -> impl Iterator<Item = (RowId, &TidyRow)> {
        self.slots.iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|row| (id, row)))
    }

    fn invoice_row_ids(&self, invoice_number: &str) -> Vec<RowId> {
        self.live_rows()
            .filter(|(_, row)| row.invoice_number == invoice_number)
            .map(|(id, _)| id)
            .collect()
    }

    /// First row holding the largest amount among `candidates`.
    fn max_row_id(&self, candidates: &[RowId]) -> Option<RowId> {
        let mut best: Option<(RowId, Decimal)> = None;

        for &id in candidates {
            let amount = self.amount_of(id);

            if best.is_none_or(|(_, best_amount)| amount > best_amount) {
                best = Some((id, amount));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Each candidate's share of `adjustment`, weighted by its part of the
    /// invoice's remaining total and rounded half-to-even.
    ///
    /// Shares are not corrected to sum exactly to the adjustment. A negative
    /// total still splits by share; `None` means the total is zero or the
    /// arithmetic overflowed.
    fn proportional_shares(&self, candidates: &[RowId], adjustment: Decimal) -> Option<Vec<(RowId, Decimal)>> {
        let total: Decimal = candidates.iter().map(|&id| self.amount_of(id)).sum();

        if total.is_zero() {
            return None
        }

        candidates.iter()
            .map(|&id| {
                adjustment.checked_mul(self.amount_of(id))
                    .and_then(|weighted| weighted.checked_div(total))
                    .map(|share| (id, share.round()))
            })
            .collect()
    }

    fn amount_of(&self, id: RowId) -> Decimal {
        self.get(id).map(|row| row.amount).unwrap_or_default()
    }

    fn apply(&mut self, id: RowId, amount: Decimal, adjustment_description: &str) {
        if let Some(row) = self.slots.get_mut(id).and_then(Option::as_mut) {
            row.amount += amount;
            row.annotate(adjustment_description);
        }
    }
}
