use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::state::{AppState, Category};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    let date_bounds = dataset.date_bounds;
    let rating_bounds = dataset.rating_bounds;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            if let Some((lo, hi)) = date_bounds {
                ui.strong("Date range");
                let mut start = state.filters.dates.start;
                if date_endpoint(ui, "From", "date_start", &mut start, lo) {
                    state.set_date_start(start);
                }
                let mut end = state.filters.dates.end;
                if date_endpoint(ui, "To", "date_end", &mut end, hi) {
                    state.set_date_end(end);
                }
                if state.filters.dates.bounds().is_none() {
                    ui.label(
                        RichText::new("Pick both dates to filter by date.")
                            .small()
                            .color(Color32::GRAY),
                    );
                }
                ui.separator();
            }

            // ---- Category multi-selects (collapsible) ----
            category_filter(ui, state, Category::ProductLine, "Product line");
            category_filter(ui, state, Category::CustomerType, "Customer type");
            ui.separator();

            // ---- Rating range ----
            if let Some((min, max)) = rating_bounds {
                ui.strong("Rating");
                let (mut low, mut high) = state.filters.rating;
                let low_changed = ui
                    .add(egui::Slider::new(&mut low, min..=max).text("min"))
                    .changed();
                let high_changed = ui
                    .add(egui::Slider::new(&mut high, min..=max).text("max"))
                    .changed();
                if low_changed && low > high {
                    high = low;
                }
                if high_changed && high < low {
                    low = high;
                }
                if low_changed || high_changed {
                    state.set_rating(low, high);
                }
                ui.separator();
            }

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

/// One end of the date range. Returns true when the user changed it.
fn date_endpoint(
    ui: &mut Ui,
    label: &str,
    id: &str,
    value: &mut Option<NaiveDate>,
    fallback: NaiveDate,
) -> bool {
    let before = *value;
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        let mut date = value.unwrap_or(fallback);
        if value.is_some() {
            ui.add(DatePickerButton::new(&mut date).id_salt(id));
            *value = Some(date);
            if ui.small_button("✕").on_hover_text("Clear").clicked() {
                *value = None;
            }
        } else if ui.small_button("Set").clicked() {
            *value = Some(date);
        }
    });
    *value != before
}

fn category_filter(ui: &mut Ui, state: &mut AppState, category: Category, title: &str) {
    let values = state.category_values(category).to_vec();
    let n_selected = values
        .iter()
        .filter(|v| state.is_selected(category, v))
        .count();
    let header_text = format!("{title}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(category);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(category);
                }
            });

            for val in &values {
                let mut checked = state.is_selected(category, val);
                if ui.checkbox(&mut checked, val.as_str()).changed() {
                    state.toggle(category, val);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!("{} ({} total)", state.row_count_label(), ds.len()));
        }
        if let Some(source) = &state.source {
            ui.separator();
            ui.label(RichText::new(source).small().color(Color32::GRAY));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_from(&path.to_string_lossy());
    }
}
