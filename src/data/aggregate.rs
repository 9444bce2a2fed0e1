use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::SalesRecord;

/// Window of the trailing mean drawn over daily sales.
pub const DEFAULT_ROLLING_WINDOW: usize = 7;
/// Bin count of the rating histogram.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Tunables of the aggregation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateSettings {
    pub rolling_window: usize,
    pub histogram_bins: usize,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

// ---------------------------------------------------------------------------
// All chart inputs for one filtered view
// ---------------------------------------------------------------------------

/// Every derived series the dashboard draws, computed from the same view.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub daily: DailySales,
    pub revenue_by_product_line: Vec<(String, f64)>,
    pub rating: RatingSummary,
    pub spend_by_customer_type: Vec<SpendGroup>,
    pub cost_vs_profit: Vec<CostProfitPoint>,
    pub branch_payment: CrossTab,
}

impl Aggregates {
    pub fn compute(records: &[&SalesRecord], settings: AggregateSettings) -> Self {
        Self {
            daily: daily_sales(records, settings.rolling_window),
            revenue_by_product_line: revenue_by_product_line(records),
            rating: rating_summary(records, settings.histogram_bins),
            spend_by_customer_type: spend_by_customer_type(records),
            cost_vs_profit: cost_vs_profit(records),
            branch_payment: branch_payment_crosstab(records),
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Daily totals with rolling mean
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    /// The date in display format.
    pub label: String,
    pub total: f64,
    pub rolling_mean: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySales {
    /// One point per distinct date, ascending.
    pub points: Vec<DailyPoint>,
    /// Day with the highest total (earliest on ties).
    pub max: Option<DailyPoint>,
    /// Day with the lowest total (earliest on ties).
    pub min: Option<DailyPoint>,
}

/// Sum `total` per date and attach a trailing mean over `window` days.
/// The first days use however many observations exist (minimum one).
pub fn daily_sales(records: &[&SalesRecord], window: usize) -> DailySales {
    let mut by_date: BTreeMap<NaiveDate, (&str, f64)> = BTreeMap::new();
    for rec in records {
        by_date
            .entry(rec.date)
            .or_insert((rec.date_display.as_str(), 0.0))
            .1 += rec.total;
    }

    let means = rolling_mean(&by_date.values().map(|&(_, t)| t).collect::<Vec<_>>(), window);
    let points: Vec<DailyPoint> = by_date
        .into_iter()
        .zip(means)
        .map(|((date, (label, total)), rolling_mean)| DailyPoint {
            date,
            label: label.to_string(),
            total,
            rolling_mean,
        })
        .collect();

    let mut max: Option<DailyPoint> = None;
    let mut min: Option<DailyPoint> = None;
    for p in &points {
        if max.as_ref().map_or(true, |m| p.total > m.total) {
            max = Some(p.clone());
        }
        if min.as_ref().map_or(true, |m| p.total < m.total) {
            min = Some(p.clone());
        }
    }

    DailySales { points, max, min }
}

/// Trailing mean with `min_periods = 1`; output has the input's length.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            sum += v;
            if i >= window {
                sum -= values[i - window];
            }
            sum / (i + 1).min(window) as f64
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 2. Revenue per product line
// ---------------------------------------------------------------------------

/// Sum `total` per product line, ascending by sum. Ties keep name order.
pub fn revenue_by_product_line(records: &[&SalesRecord]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in records {
        *sums.entry(rec.product_line.as_str()).or_insert(0.0) += rec.total;
    }
    let mut out: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(line, sum)| (line.to_string(), sum))
        .collect();
    out.sort_by(|a, b| a.1.total_cmp(&b.1));
    out
}

// ---------------------------------------------------------------------------
// 3. Rating distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    /// `bins + 1` ascending edges; the last bin is closed on the right.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Points on the density curve drawn over the histogram.
pub const KDE_GRID_POINTS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub histogram: Histogram,
    /// `[rating, density]` pairs in histogram-count units.
    pub kde: Vec<[f64; 2]>,
    /// Filtered ratings in record order, for the rug marks.
    pub ratings: Vec<f64>,
}

pub fn rating_summary(records: &[&SalesRecord], bins: usize) -> RatingSummary {
    let ratings: Vec<f64> = records.iter().map(|r| r.rating).collect();
    let histogram = histogram(&ratings, bins);
    let kde = match (histogram.edges.first(), histogram.edges.last()) {
        (Some(&lo), Some(&hi)) => {
            let bin_width = (hi - lo) / histogram.counts.len() as f64;
            let scale = ratings.len() as f64 * bin_width;
            gaussian_kde(&ratings, lo, hi, KDE_GRID_POINTS, scale)
        }
        _ => Vec::new(),
    };
    RatingSummary {
        count: ratings.len(),
        mean: mean(&ratings),
        median: median(&ratings),
        histogram,
        kde,
        ratings,
    }
}

/// Gaussian kernel density of `values` sampled at `points` evenly spaced
/// positions on `[lo, hi]`, multiplied by `scale`. The bandwidth follows
/// Scott's rule. Empty when there are fewer than two values or no spread.
pub fn gaussian_kde(values: &[f64], lo: f64, hi: f64, points: usize, scale: f64) -> Vec<[f64; 2]> {
    let n = values.len();
    if n < 2 || points < 2 {
        return Vec::new();
    }
    let bandwidth = sample_std(values) * (n as f64).powf(-0.2);
    if bandwidth <= f64::EPSILON {
        return Vec::new();
    }

    let norm = scale / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (hi - lo) / (points - 1) as f64;
    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            [x, density * norm]
        })
        .collect()
}

/// Equal-width bins spanning the observed range. A degenerate range is
/// widened by half a unit on each side.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    if values.is_empty() || bins == 0 {
        return Histogram::default();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { edges, counts }
}

// ---------------------------------------------------------------------------
// 4. Spend per customer type
// ---------------------------------------------------------------------------

/// Five-number summary as drawn by a box plot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpendGroup {
    pub customer_type: String,
    /// Every `total` of the group, in view order.
    pub totals: Vec<f64>,
    pub mean: f64,
    pub summary: BoxSummary,
    /// Totals outside the whiskers.
    pub outliers: Vec<f64>,
}

/// Group totals by customer type (sorted by name) keeping the full distribution.
pub fn spend_by_customer_type(records: &[&SalesRecord]) -> Vec<SpendGroup> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for rec in records {
        groups
            .entry(rec.customer_type.as_str())
            .or_default()
            .push(rec.total);
    }

    groups
        .into_iter()
        .map(|(customer_type, totals)| {
            let (summary, outliers) = box_summary(&totals);
            SpendGroup {
                customer_type: customer_type.to_string(),
                mean: mean(&totals),
                totals,
                summary,
                outliers,
            }
        })
        .collect()
}

/// Quartiles by linear interpolation; whiskers reach the furthest values
/// within 1.5 × IQR of the box.
pub fn box_summary(values: &[f64]) -> (BoxSummary, Vec<f64>) {
    if values.is_empty() {
        return (BoxSummary::default(), Vec::new());
    }
    let sorted = sorted(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let med = quantile_sorted(&sorted, 0.5);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();
    let outliers: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    let summary = BoxSummary {
        lower_whisker: inside.first().copied().unwrap_or(q1),
        q1,
        median: med,
        q3,
        upper_whisker: inside.last().copied().unwrap_or(q3),
    };
    (summary, outliers)
}

// ---------------------------------------------------------------------------
// 5. Cost vs. gross income
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CostProfitPoint {
    pub cogs: f64,
    pub gross_income: f64,
    pub branch: String,
}

pub fn cost_vs_profit(records: &[&SalesRecord]) -> Vec<CostProfitPoint> {
    records
        .iter()
        .map(|r| CostProfitPoint {
            cogs: r.cogs,
            gross_income: r.gross_income,
            branch: r.branch.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 6. Branch × payment method
// ---------------------------------------------------------------------------

/// Revenue matrix indexed by branch (rows) and payment method (columns).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossTab {
    pub branches: Vec<String>,
    pub payments: Vec<String>,
    /// `values[branch][payment]`; absent combinations are zero.
    pub values: Vec<Vec<f64>>,
}

impl CrossTab {
    pub fn get(&self, branch: &str, payment: &str) -> Option<f64> {
        let b = self.branches.iter().position(|x| x == branch)?;
        let p = self.payments.iter().position(|x| x == payment)?;
        Some(self.values[b][p])
    }

    pub fn row_totals(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn grand_total(&self) -> f64 {
        self.row_totals().iter().sum()
    }
}

pub fn branch_payment_crosstab(records: &[&SalesRecord]) -> CrossTab {
    let mut cells: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for rec in records {
        *cells
            .entry((rec.branch.as_str(), rec.payment.as_str()))
            .or_insert(0.0) += rec.total;
    }

    let mut branches: Vec<String> = cells.keys().map(|(b, _)| b.to_string()).collect();
    branches.dedup();
    let mut payments: Vec<String> = cells.keys().map(|(_, p)| p.to_string()).collect();
    payments.sort();
    payments.dedup();

    let values = branches
        .iter()
        .map(|b| {
            payments
                .iter()
                .map(|p| {
                    cells
                        .get(&(b.as_str(), p.as_str()))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    CrossTab {
        branches,
        payments,
        values,
    }
}

// ---------------------------------------------------------------------------
// Descriptive statistics helpers (zero on empty input)
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    quantile_sorted(&sorted(values), 0.5)
}

/// Standard deviation with `n - 1` in the denominator.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
