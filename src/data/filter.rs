use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// Filter state: the user's current selection
// ---------------------------------------------------------------------------

/// Date range as picked in the UI. The filter only applies once both
/// endpoints are present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DateSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateSelection {
    /// Both endpoints, or None while the range is incomplete.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }
}

/// The four independent constraints narrowing the dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub dates: DateSelection,
    /// Product lines to keep. Empty set → nothing passes.
    pub product_lines: BTreeSet<String>,
    /// Customer types to keep. Empty set → nothing passes.
    pub customer_types: BTreeSet<String>,
    /// Inclusive rating interval `(low, high)`.
    pub rating: (f64, f64),
}

/// Initialise a [`FilterState`] that selects everything in the dataset.
pub fn init_filter_state(dataset: &SalesDataset) -> FilterState {
    let (start, end) = match dataset.date_bounds {
        Some((lo, hi)) => (Some(lo), Some(hi)),
        None => (None, None),
    };
    FilterState {
        dates: DateSelection { start, end },
        product_lines: dataset.product_lines.iter().cloned().collect(),
        customer_types: dataset.customer_types.iter().cloned().collect(),
        rating: dataset.rating_bounds.unwrap_or((0.0, 0.0)),
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// One of the four filter predicates, addressable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    DateRange,
    ProductLine,
    CustomerType,
    Rating,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::DateRange,
        Criterion::ProductLine,
        Criterion::CustomerType,
        Criterion::Rating,
    ];
}

impl FilterState {
    /// Whether `record` satisfies a single criterion.
    pub fn passes(&self, criterion: Criterion, record: &SalesRecord) -> bool {
        match criterion {
            Criterion::DateRange => match self.dates.bounds() {
                Some((start, end)) => record.date >= start && record.date <= end,
                None => true,
            },
            Criterion::ProductLine => self.product_lines.contains(&record.product_line),
            Criterion::CustomerType => self.customer_types.contains(&record.customer_type),
            Criterion::Rating => {
                let (low, high) = self.rating;
                record.rating >= low && record.rating <= high
            }
        }
    }

    /// Whether `record` satisfies every criterion.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        Criterion::ALL.iter().all(|&c| self.passes(c, record))
    }
}

/// Return indices of records that pass all criteria, in dataset order.
pub fn filtered_indices(dataset: &SalesDataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| filters.matches(rec))
        .map(|(i, _)| i)
        .collect()
}
