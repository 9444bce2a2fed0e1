use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, LineStyle, MarkerShape,
    Plot, PlotPoint, PlotPoints, Points, Text, VLine,
};

use crate::color::{CategoryColors, generate_palette};
use crate::data::aggregate::{CostProfitPoint, CrossTab, DailySales, RatingSummary, SpendGroup};
use crate::data::dates::format_date;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;
const TEAL: Color32 = Color32::from_rgb(0, 128, 128);
const RUG_BLUE: Color32 = Color32::from_rgb(0, 0, 139);

const SPEND_NOTE: &str = "• Each box is the total spend of one customer type.\n\
    • The line inside the box is the median spend.\n\
    • Isolated points are outliers (customers with extreme spend).\n\
    • Black diamonds are the mean.";
const COST_PROFIT_NOTE: &str = "• Each point is one transaction.\n\
    • X is the cost of goods sold, Y the gross income it generated.\n\
    • Colours mark the branch.\n\
    • The relation is linear and positive: higher cost, higher income.";

// ---------------------------------------------------------------------------
// Central panel: the six charts
// ---------------------------------------------------------------------------

/// Render every chart for the current filtered view.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            let text = match &state.status_message {
                Some(msg) => RichText::new(msg).color(Color32::RED),
                None => RichText::new("Open a file to view sales  (File → Open…)"),
            };
            ui.heading(text);
        });
        return;
    }

    let agg = &state.aggregates;
    let date_fmt = state.config.display_date_format.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Interactive Sales Analysis");
            ui.label(state.row_count_label());
            ui.separator();

            ui.strong("1. Total sales over time");
            sales_over_time(ui, &agg.daily, date_fmt, state.config.aggregate_settings().rolling_window);

            ui.strong("2. Revenue by product line");
            revenue_by_product_line(ui, &agg.revenue_by_product_line);

            ui.strong("3. Customer rating distribution");
            rating_distribution(ui, &agg.rating);

            ui.strong("4. Spend by customer type");
            spend_by_customer_type(ui, &agg.spend_by_customer_type);

            ui.strong("5. Cost vs. gross income");
            cost_vs_profit(ui, &agg.cost_vs_profit, &state.branch_colors);

            ui.strong("6. Sales by branch and payment method");
            branch_payment(ui, &agg.branch_payment, &state.payment_colors);
        });
}

// ---------------------------------------------------------------------------
// 1. Daily totals + rolling mean
// ---------------------------------------------------------------------------

fn sales_over_time(ui: &mut Ui, daily: &DailySales, date_fmt: String, window: usize) {
    let totals: Vec<[f64; 2]> = daily
        .points
        .iter()
        .map(|p| [day_number(p.date), p.total])
        .collect();
    let trend: PlotPoints = daily
        .points
        .iter()
        .map(|p| [day_number(p.date), p.rolling_mean])
        .collect();

    Plot::new("daily_sales")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label("Date")
        .y_axis_label("Total sales")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            format_day(mark.value, &date_fmt)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(totals.clone()).name("Daily sales").color(TEAL).width(1.5));
            plot_ui.points(Points::new(totals).color(TEAL).radius(2.5));
            plot_ui.line(
                Line::new(trend)
                    .name(format!("Trend ({window}-day rolling mean)"))
                    .color(Color32::ORANGE)
                    .style(LineStyle::dashed_loose())
                    .width(2.0),
            );

            if let Some(max) = &daily.max {
                let x = day_number(max.date);
                plot_ui.points(
                    Points::new(vec![[x, max.total]])
                        .color(Color32::DARK_GREEN)
                        .radius(5.0),
                );
                plot_ui.text(Text::new(
                    PlotPoint::new(x, max.total + 150.0),
                    format!("Max: {} ({})", thousands(max.total), max.label),
                ));
            }
            if let Some(min) = &daily.min {
                let x = day_number(min.date);
                plot_ui.points(Points::new(vec![[x, min.total]]).color(Color32::RED).radius(5.0));
                plot_ui.text(Text::new(
                    PlotPoint::new(x, min.total - 200.0),
                    format!("Min: {} ({})", thousands(min.total), min.label),
                ));
            }
        });
}

// ---------------------------------------------------------------------------
// 2. Revenue per product line
// ---------------------------------------------------------------------------

fn revenue_by_product_line(ui: &mut Ui, revenue: &[(String, f64)]) {
    let palette = generate_palette(revenue.len());
    let bars: Vec<Bar> = revenue
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, ((line, value), color))| {
            Bar::new(i as f64, *value).name(line).fill(color).width(0.7)
        })
        .collect();
    let labels: Vec<(f64, f64, String)> = revenue
        .iter()
        .enumerate()
        .map(|(i, (_, value))| (i as f64, *value + 20.0, thousands(*value)))
        .collect();
    let names: Vec<String> = revenue.iter().map(|(line, _)| line.clone()).collect();

    Plot::new("revenue_by_product_line")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label("Product line")
        .y_axis_label("Total revenue")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&names, mark.value)
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Revenue"));
            for (x, y, text) in labels {
                plot_ui.text(Text::new(PlotPoint::new(x, y), text));
            }
        });
}

// ---------------------------------------------------------------------------
// 3. Rating histogram with mean / median markers
// ---------------------------------------------------------------------------

fn rating_distribution(ui: &mut Ui, rating: &RatingSummary) {
    let hist = &rating.histogram;
    let bars: Vec<Bar> = hist
        .counts
        .iter()
        .zip(hist.edges.windows(2))
        .map(|(&count, edge)| {
            Bar::new((edge[0] + edge[1]) / 2.0, count as f64)
                .width(edge[1] - edge[0])
                .fill(Color32::LIGHT_BLUE)
                .stroke(egui::Stroke::new(1.0, Color32::GRAY))
        })
        .collect();
    let has_data = rating.count > 0;
    let (mean, median) = (rating.mean, rating.median);
    let kde = rating.kde.clone();
    let rug: Vec<[f64; 2]> = rating.ratings.iter().map(|&r| [r, 0.0]).collect();

    Plot::new("rating_distribution")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label("Rating")
        .y_axis_label("Frequency")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Histogram"));
            if !kde.is_empty() {
                plot_ui.line(Line::new(kde).name("Density").color(Color32::BLUE).width(2.0));
            }
            if has_data {
                plot_ui.points(
                    Points::new(rug)
                        .name("Ratings (rug)")
                        .shape(MarkerShape::Up)
                        .color(RUG_BLUE)
                        .filled(true)
                        .radius(3.0),
                );
                plot_ui.vline(
                    VLine::new(mean)
                        .name(format!("Mean: {mean:.2}"))
                        .color(Color32::RED)
                        .style(LineStyle::dashed_dense())
                        .width(2.0),
                );
                plot_ui.vline(
                    VLine::new(median)
                        .name(format!("Median: {median:.2}"))
                        .color(Color32::DARK_GREEN)
                        .style(LineStyle::dotted_dense())
                        .width(2.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// 4. Box plot of spend per customer type, mean as diamonds
// ---------------------------------------------------------------------------

fn spend_by_customer_type(ui: &mut Ui, groups: &[SpendGroup]) {
    let palette = generate_palette(groups.len());
    let boxes: Vec<BoxElem> = groups
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, (g, color))| {
            let s = g.summary;
            BoxElem::new(
                i as f64,
                BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
            )
            .name(&g.customer_type)
            .fill(color.gamma_multiply(0.5))
            .stroke(egui::Stroke::new(1.5, color))
            .box_width(0.5)
        })
        .collect();
    let outliers: PlotPoints = groups
        .iter()
        .enumerate()
        .flat_map(|(i, g)| g.outliers.iter().map(move |&v| [i as f64, v]))
        .collect();
    let means: PlotPoints = groups
        .iter()
        .enumerate()
        .map(|(i, g)| [i as f64, g.mean])
        .collect();
    let names: Vec<String> = groups.iter().map(|g| g.customer_type.clone()).collect();

    Plot::new("spend_by_customer_type")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label("Customer type")
        .y_axis_label("Total spent")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&names, mark.value)
        })
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes).name("Spend"));
            plot_ui.points(
                Points::new(outliers)
                    .name("Outliers")
                    .color(Color32::GRAY)
                    .radius(2.5),
            );
            plot_ui.points(
                Points::new(means)
                    .name("Mean")
                    .shape(MarkerShape::Diamond)
                    .color(Color32::BLACK)
                    .filled(true)
                    .radius(6.0),
            );
        });
    chart_note(ui, SPEND_NOTE);
}

// ---------------------------------------------------------------------------
// 5. Cost vs. gross income scatter, coloured by branch
// ---------------------------------------------------------------------------

fn cost_vs_profit(ui: &mut Ui, points: &[CostProfitPoint], colors: &CategoryColors) {
    let mut branches: Vec<&str> = points.iter().map(|p| p.branch.as_str()).collect();
    branches.sort_unstable();
    branches.dedup();

    let series: Vec<(String, Color32, PlotPoints)> = branches
        .into_iter()
        .map(|branch| {
            let pts: PlotPoints = points
                .iter()
                .filter(|p| p.branch == branch)
                .map(|p| [p.cogs, p.gross_income])
                .collect();
            (format!("Branch {branch}"), colors.color_for(branch), pts)
        })
        .collect();

    Plot::new("cost_vs_profit")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label("Cost of goods sold (COGS)")
        .y_axis_label("Gross income")
        .show(ui, |plot_ui| {
            for (name, color, pts) in series {
                plot_ui.points(
                    Points::new(pts)
                        .name(name)
                        .color(color.gamma_multiply(0.6))
                        .filled(true)
                        .radius(3.0),
                );
            }
        });
    chart_note(ui, COST_PROFIT_NOTE);
}

// ---------------------------------------------------------------------------
// 6. Stacked bars: branch × payment method
// ---------------------------------------------------------------------------

fn branch_payment(ui: &mut Ui, tab: &CrossTab, colors: &CategoryColors) {
    let mut charts: Vec<BarChart> = Vec::with_capacity(tab.payments.len());
    for payment in &tab.payments {
        let color = colors.color_for(payment);
        let bars: Vec<Bar> = tab
            .branches
            .iter()
            .enumerate()
            .map(|(b, branch)| {
                Bar::new(b as f64, tab.get(branch, payment).unwrap_or(0.0))
                    .name(format!("{branch} / {payment}"))
                    .fill(color)
                    .width(0.6)
            })
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars).name(payment).color(color).stack_on(&below);
        charts.push(chart);
    }
    let names = tab.branches.clone();

    Plot::new("branch_payment")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label("Branch")
        .y_axis_label("Total sales")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&names, mark.value)
        })
        .show(ui, |plot_ui| {
            for c in charts {
                plot_ui.bar_chart(c);
            }
        });
    ui.label(format!("Grand total: {}", thousands(tab.grand_total())));
}

/// Small grey reading guide under a chart.
fn chart_note(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).small().color(Color32::DARK_GRAY));
    ui.add_space(8.0);
}

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Dates are plotted as days since 0001-01-01.
fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn format_day(value: f64, fmt: &str) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .and_then(|d| format_date(d, fmt))
        .unwrap_or_default()
}

/// Name of the category drawn at integer position `value`; blank elsewhere.
fn category_label(names: &[String], value: f64) -> String {
    if value < 0.0 || value.fract().abs() > f64::EPSILON {
        return String::new();
    }
    names.get(value as usize).cloned().unwrap_or_default()
}

/// `7214.36` → `"7,214"`.
fn thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0.4), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(7214.36), "7,214");
        assert_eq!(thousands(1_234_567.0), "1,234,567");
        assert_eq!(thousands(-1500.0), "-1,500");
        assert_eq!(thousands(-0.4), "0");
    }

    #[test]
    fn thousands_does_not_saturate_huge_totals() {
        assert_eq!(thousands(1e20), "100,000,000,000,000,000,000");
        assert_eq!(thousands(-1e19), "-10,000,000,000,000,000,000");
        assert_eq!(thousands(f64::INFINITY), "inf");
    }

    #[test]
    fn chart_notes_explain_every_mark() {
        for word in ["box", "median", "outliers", "mean"] {
            assert!(SPEND_NOTE.contains(word), "spend note lacks {word}");
        }
        for word in ["transaction", "cost of goods sold", "gross income", "branch", "linear"] {
            assert!(COST_PROFIT_NOTE.contains(word), "cost note lacks {word}");
        }
        assert_eq!(SPEND_NOTE.lines().count(), 4);
    }

    #[test]
    fn day_axis_round_trips_dates() {
        let date = NaiveDate::from_ymd_opt(2019, 3, 8).unwrap();
        assert_eq!(format_day(day_number(date), "%d/%m/%Y"), "08/03/2019");
        assert_eq!(format_day(day_number(date), "%d/%Q"), "");
    }

    #[test]
    fn category_labels_only_on_integer_ticks() {
        let names = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_label(&names, 1.0), "B");
        assert_eq!(category_label(&names, 0.5), "");
        assert_eq!(category_label(&names, -1.0), "");
        assert_eq!(category_label(&names, 5.0), "");
    }
}
