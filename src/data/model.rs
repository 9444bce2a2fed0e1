use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column names of the source table
// ---------------------------------------------------------------------------

pub const COL_DATE: &str = "Date";
pub const COL_PRODUCT_LINE: &str = "Product line";
pub const COL_CUSTOMER_TYPE: &str = "Customer type";
pub const COL_RATING: &str = "Rating";
pub const COL_BRANCH: &str = "Branch";
pub const COL_PAYMENT: &str = "Payment";
pub const COL_COGS: &str = "cogs";
pub const COL_GROSS_INCOME: &str = "gross income";
pub const COL_TOTAL: &str = "Total";

/// Every column a source must provide, in the order they are reported
/// when missing.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_DATE,
    COL_PRODUCT_LINE,
    COL_CUSTOMER_TYPE,
    COL_RATING,
    COL_BRANCH,
    COL_PAYMENT,
    COL_COGS,
    COL_GROSS_INCOME,
    COL_TOTAL,
];

// ---------------------------------------------------------------------------
// RawSale – one decoded row before date normalisation
// ---------------------------------------------------------------------------

/// A row as it comes out of the CSV / Parquet decoder: the date is still text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSale {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Product line")]
    pub product_line: String,
    #[serde(rename = "Customer type")]
    pub customer_type: String,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Payment")]
    pub payment: String,
    #[serde(rename = "cogs")]
    pub cogs: f64,
    #[serde(rename = "gross income")]
    pub gross_income: f64,
    #[serde(rename = "Total")]
    pub total: f64,
}

// ---------------------------------------------------------------------------
// SalesRecord – one transaction of the dataset
// ---------------------------------------------------------------------------

/// A single sales transaction with a parsed date.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    /// `date` rendered in the display format (day/month/year).
    pub date_display: String,
    pub product_line: String,
    pub customer_type: String,
    pub rating: f64,
    pub branch: String,
    pub payment: String,
    pub cogs: f64,
    pub gross_income: f64,
    /// Revenue of the transaction.
    pub total: f64,
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed bounds and category indices.
#[derive(Debug, Clone)]
pub struct SalesDataset {
    /// All records, in source order.
    pub records: Vec<SalesRecord>,
    /// Earliest and latest transaction date (None when empty).
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    /// Lowest and highest observed rating (None when empty).
    pub rating_bounds: Option<(f64, f64)>,
    /// Distinct values per category column, in first-appearance order.
    pub product_lines: Vec<String>,
    pub customer_types: Vec<String>,
    pub branches: Vec<String>,
    pub payments: Vec<String>,
}

impl SalesDataset {
    /// Build bounds and category indices from the loaded records.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;
        let mut rating_bounds: Option<(f64, f64)> = None;
        let mut product_lines = Vec::new();
        let mut customer_types = Vec::new();
        let mut branches = Vec::new();
        let mut payments = Vec::new();

        for rec in &records {
            date_bounds = Some(match date_bounds {
                Some((lo, hi)) => (lo.min(rec.date), hi.max(rec.date)),
                None => (rec.date, rec.date),
            });
            rating_bounds = Some(match rating_bounds {
                Some((lo, hi)) => (lo.min(rec.rating), hi.max(rec.rating)),
                None => (rec.rating, rec.rating),
            });
            push_unique(&mut product_lines, &rec.product_line);
            push_unique(&mut customer_types, &rec.customer_type);
            push_unique(&mut branches, &rec.branch);
            push_unique(&mut payments, &rec.payment);
        }

        SalesDataset {
            records,
            date_bounds,
            rating_bounds,
            product_lines,
            customer_types,
            branches,
            payments,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a list of indices (a filtered view) into record references.
    pub fn select(&self, indices: &[usize]) -> Vec<&SalesRecord> {
        indices.iter().filter_map(|&i| self.records.get(i)).collect()
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Compact record constructor shared by the data-layer tests.
    pub(crate) fn sale(
        date: (i32, u32, u32),
        product_line: &str,
        customer_type: &str,
        rating: f64,
        total: f64,
    ) -> SalesRecord {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        SalesRecord {
            date,
            date_display: date.format("%d/%m/%Y").to_string(),
            product_line: product_line.to_string(),
            customer_type: customer_type.to_string(),
            rating,
            branch: "A".to_string(),
            payment: "Cash".to_string(),
            cogs: total * 0.95,
            gross_income: total * 0.05,
            total,
        }
    }

    #[test]
    fn from_records_computes_bounds_and_categories() {
        let ds = SalesDataset::from_records(vec![
            sale((2019, 1, 5), "Food", "Member", 7.5, 10.0),
            sale((2019, 1, 1), "Sports", "Normal", 4.0, 20.0),
            sale((2019, 3, 2), "Food", "Normal", 9.1, 30.0),
        ]);

        let d = |m, day| NaiveDate::from_ymd_opt(2019, m, day).unwrap();
        assert_eq!(ds.date_bounds, Some((d(1, 1), d(3, 2))));
        assert_eq!(ds.rating_bounds, Some((4.0, 9.1)));
        assert_eq!(ds.product_lines, vec!["Food", "Sports"]);
        assert_eq!(ds.customer_types, vec!["Member", "Normal"]);
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let ds = SalesDataset::from_records(Vec::new());
        assert!(ds.is_empty());
        assert!(ds.date_bounds.is_none());
        assert!(ds.rating_bounds.is_none());
    }
}
