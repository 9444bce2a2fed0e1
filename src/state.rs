use chrono::NaiveDate;

use crate::color::CategoryColors;
use crate::config::DashboardConfig;
use crate::data::aggregate::Aggregates;
use crate::data::filter::{FilterState, filtered_indices, init_filter_state};
use crate::data::loader::load_source;
use crate::data::model::SalesDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The two multi-select category filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ProductLine,
    CustomerType,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<SalesDataset>,

    /// Location the current dataset came from.
    pub source: Option<String>,

    /// Current filter selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Chart series for `visible_indices` (cached).
    pub aggregates: Aggregates,

    pub branch_colors: CategoryColors,
    pub payment_colors: CategoryColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            source: None,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            aggregates: Aggregates::default(),
            branch_colors: CategoryColors::default(),
            payment_colors: CategoryColors::default(),
            status_message: None,
        }
    }

    /// Load `location` and replace the current dataset. On failure the
    /// previous dataset is dropped so no stale charts are drawn.
    pub fn load_from(&mut self, location: &str) {
        match load_source(location, self.config.date_formats()) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} records from {location} ({} product lines, {} customer types)",
                    dataset.len(),
                    dataset.product_lines.len(),
                    dataset.customer_types.len()
                );
                if dataset.is_empty() {
                    log::warn!("{location} contains no rows");
                }
                self.source = Some(location.to_string());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load dataset: {e}");
                self.dataset = None;
                self.source = None;
                self.visible_indices.clear();
                self.aggregates = Aggregates::default();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: SalesDataset) {
        self.filters = init_filter_state(&dataset);
        self.branch_colors = CategoryColors::new(&sorted(&dataset.branches));
        self.payment_colors = CategoryColors::new(&sorted(&dataset.payments));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and the aggregates after a filter change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        self.visible_indices = filtered_indices(ds, &self.filters);
        let view = ds.select(&self.visible_indices);
        self.aggregates = Aggregates::compute(&view, self.config.aggregate_settings());
        log::debug!("{} of {} records visible", view.len(), ds.len());
    }

    /// Restore the select-everything filter state.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters = init_filter_state(ds);
            self.refilter();
        }
    }

    fn selection_mut(&mut self, category: Category) -> &mut std::collections::BTreeSet<String> {
        match category {
            Category::ProductLine => &mut self.filters.product_lines,
            Category::CustomerType => &mut self.filters.customer_types,
        }
    }

    /// Distinct values of a category column in the loaded dataset.
    pub fn category_values(&self, category: Category) -> &[String] {
        match (&self.dataset, category) {
            (Some(ds), Category::ProductLine) => &ds.product_lines,
            (Some(ds), Category::CustomerType) => &ds.customer_types,
            (None, _) => &[],
        }
    }

    pub fn is_selected(&self, category: Category, value: &str) -> bool {
        match category {
            Category::ProductLine => self.filters.product_lines.contains(value),
            Category::CustomerType => self.filters.customer_types.contains(value),
        }
    }

    /// Toggle a single value in a category filter.
    pub fn toggle(&mut self, category: Category, value: &str) {
        let selected = self.selection_mut(category);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values of a category.
    pub fn select_all(&mut self, category: Category) {
        let all: Vec<String> = self.category_values(category).to_vec();
        *self.selection_mut(category) = all.into_iter().collect();
        self.refilter();
    }

    /// Deselect all values of a category.
    pub fn select_none(&mut self, category: Category) {
        self.selection_mut(category).clear();
        self.refilter();
    }

    /// Set one end of the date range, clamped to the dataset's dates.
    /// `None` leaves the range incomplete, which disables the date filter.
    pub fn set_date_start(&mut self, date: Option<NaiveDate>) {
        self.filters.dates.start = date.map(|d| self.clamp_date(d));
        self.refilter();
    }

    pub fn set_date_end(&mut self, date: Option<NaiveDate>) {
        self.filters.dates.end = date.map(|d| self.clamp_date(d));
        self.refilter();
    }

    fn clamp_date(&self, date: NaiveDate) -> NaiveDate {
        match self.dataset.as_ref().and_then(|ds| ds.date_bounds) {
            Some((lo, hi)) => date.clamp(lo, hi),
            None => date,
        }
    }

    /// Set the rating interval; swapped bounds are reordered.
    pub fn set_rating(&mut self, low: f64, high: f64) {
        self.filters.rating = if low <= high { (low, high) } else { (high, low) };
        self.refilter();
    }

    /// The textual row-count indicator.
    pub fn row_count_label(&self) -> String {
        format!("Filtered data: {} rows", self.visible_indices.len())
    }
}

fn sorted(values: &[String]) -> Vec<String> {
    let mut v = values.to_vec();
    v.sort();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::sale;

    fn state() -> AppState {
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(SalesDataset::from_records(vec![
            sale((2019, 1, 1), "Food", "Member", 4.0, 100.0),
            sale((2019, 1, 2), "Sports", "Normal", 6.0, 200.0),
            sale((2019, 1, 3), "Food", "Normal", 8.0, 300.0),
        ]));
        state
    }

    #[test]
    fn new_dataset_shows_everything() {
        let state = state();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.row_count_label(), "Filtered data: 3 rows");
        assert_eq!(state.aggregates.daily.points.len(), 3);
    }

    #[test]
    fn select_none_empties_view_and_aggregates() {
        let mut state = state();
        state.select_none(Category::CustomerType);
        assert!(state.visible_indices.is_empty());
        assert_eq!(state.row_count_label(), "Filtered data: 0 rows");
        assert!(state.aggregates.revenue_by_product_line.is_empty());
        assert_eq!(state.aggregates.rating.mean, 0.0);

        state.select_all(Category::CustomerType);
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn toggle_removes_then_restores() {
        let mut state = state();
        state.toggle(Category::ProductLine, "Food");
        assert!(!state.is_selected(Category::ProductLine, "Food"));
        assert_eq!(state.visible_indices, vec![1]);
        state.toggle(Category::ProductLine, "Food");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn dates_are_clamped_and_partial_range_is_ignored() {
        let mut state = state();
        state.set_date_start(NaiveDate::from_ymd_opt(2018, 6, 1));
        assert_eq!(state.filters.dates.start, NaiveDate::from_ymd_opt(2019, 1, 1));

        state.set_date_start(NaiveDate::from_ymd_opt(2019, 1, 2));
        assert_eq!(state.visible_indices, vec![1, 2]);

        state.set_date_end(None);
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn rating_bounds_are_ordered_and_reset_restores_defaults() {
        let mut state = state();
        state.set_rating(9.0, 5.0);
        assert_eq!(state.filters.rating, (5.0, 9.0));
        assert_eq!(state.visible_indices, vec![1, 2]);

        state.reset_filters();
        assert_eq!(state.filters.rating, (4.0, 8.0));
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn failed_load_clears_dataset_and_reports() {
        let mut state = state();
        state.load_from("/nonexistent/sales.csv");
        assert!(state.dataset.is_none());
        assert!(state.visible_indices.is_empty());
        assert!(state.status_message.as_deref().unwrap_or("").starts_with("Error:"));
    }
}
