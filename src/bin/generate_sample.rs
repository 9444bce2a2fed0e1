use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const BRANCHES: [(&str, &str); 3] = [("A", "Yangon"), ("B", "Mandalay"), ("C", "Naypyitaw")];
const CUSTOMER_TYPES: [&str; 2] = ["Member", "Normal"];
const GENDERS: [&str; 2] = ["Female", "Male"];
const PAYMENTS: [&str; 3] = ["Cash", "Credit card", "Ewallet"];
const PRODUCT_LINES: [(&str, f64); 6] = [
    ("Electronic accessories", 55.0),
    ("Fashion accessories", 48.0),
    ("Food and beverages", 52.0),
    ("Health and beauty", 57.0),
    ("Home and lifestyle", 60.0),
    ("Sports and travel", 62.0),
];
const TAX_RATE: f64 = 0.05;
const N_ROWS: usize = 1000;
const N_DAYS: i64 = 89;

/// One generated transaction, serialised with the dataset's column names.
#[derive(Debug, Serialize)]
struct Row {
    #[serde(rename = "Invoice ID")]
    invoice_id: String,
    #[serde(rename = "Branch")]
    branch: &'static str,
    #[serde(rename = "City")]
    city: &'static str,
    #[serde(rename = "Customer type")]
    customer_type: &'static str,
    #[serde(rename = "Gender")]
    gender: &'static str,
    #[serde(rename = "Product line")]
    product_line: &'static str,
    #[serde(rename = "Unit price")]
    unit_price: f64,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "Tax 5%")]
    tax: f64,
    #[serde(rename = "Total")]
    total: f64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Payment")]
    payment: &'static str,
    #[serde(rename = "cogs")]
    cogs: f64,
    #[serde(rename = "gross margin percentage")]
    gross_margin_percentage: f64,
    #[serde(rename = "gross income")]
    gross_income: f64,
    #[serde(rename = "Rating")]
    rating: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.below(items.len())]
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (value * f).round() / f
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let first_day = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default();

    (0..N_ROWS)
        .map(|_| {
            let (branch, city) = rng.pick(&BRANCHES);
            let (product_line, mean_price) = rng.pick(&PRODUCT_LINES);
            let unit_price = round_to(rng.uniform(mean_price * 0.2, mean_price * 1.8), 2);
            let quantity = 1 + rng.below(10) as i64;
            let cogs = round_to(unit_price * quantity as f64, 2);
            let tax = round_to(cogs * TAX_RATE, 4);
            let date = first_day + Duration::days(rng.below(N_DAYS as usize + 1) as i64);

            Row {
                invoice_id: format!(
                    "{:03}-{:02}-{:04}",
                    rng.below(900) + 100,
                    rng.below(90) + 10,
                    rng.below(9000) + 1000
                ),
                branch,
                city,
                customer_type: rng.pick(&CUSTOMER_TYPES),
                gender: rng.pick(&GENDERS),
                product_line,
                unit_price,
                quantity,
                tax,
                total: round_to(cogs + tax, 4),
                date: date.format("%-m/%-d/%Y").to_string(),
                time: format!("{:02}:{:02}", 10 + rng.below(11), rng.below(60)),
                payment: rng.pick(&PAYMENTS),
                cogs,
                gross_margin_percentage: TAX_RATE / (1.0 + TAX_RATE) * 100.0,
                gross_income: tax,
                rating: round_to(rng.uniform(4.0, 10.0), 1),
            }
        })
        .collect()
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn to_record_batch(rows: &[Row]) -> Result<RecordBatch> {
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let float = |f: fn(&Row) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let quantity: ArrayRef = Arc::new(Int64Array::from(
        rows.iter().map(|r| r.quantity).collect::<Vec<_>>(),
    ));

    let schema = Arc::new(Schema::new(vec![
        Field::new("Invoice ID", DataType::Utf8, false),
        Field::new("Branch", DataType::Utf8, false),
        Field::new("City", DataType::Utf8, false),
        Field::new("Customer type", DataType::Utf8, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("Product line", DataType::Utf8, false),
        Field::new("Unit price", DataType::Float64, false),
        Field::new("Quantity", DataType::Int64, false),
        Field::new("Tax 5%", DataType::Float64, false),
        Field::new("Total", DataType::Float64, false),
        Field::new("Date", DataType::Utf8, false),
        Field::new("Time", DataType::Utf8, false),
        Field::new("Payment", DataType::Utf8, false),
        Field::new("cogs", DataType::Float64, false),
        Field::new("gross margin percentage", DataType::Float64, false),
        Field::new("gross income", DataType::Float64, false),
        Field::new("Rating", DataType::Float64, false),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            text(|r| r.invoice_id.as_str()),
            text(|r| r.branch),
            text(|r| r.city),
            text(|r| r.customer_type),
            text(|r| r.gender),
            text(|r| r.product_line),
            float(|r| r.unit_price),
            quantity,
            float(|r| r.tax),
            float(|r| r.total),
            text(|r| r.date.as_str()),
            text(|r| r.time.as_str()),
            text(|r| r.payment),
            float(|r| r.cogs),
            float(|r| r.gross_margin_percentage),
            float(|r| r.gross_income),
            float(|r| r.rating),
        ],
    )
    .context("building record batch")
}

fn write_parquet(batch: &RecordBatch, path: &str) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    let csv_path = "sales_sample.csv";
    write_csv(&rows, csv_path)?;

    let parquet_path = "sales_sample.parquet";
    let batch = to_record_batch(&rows)?;
    write_parquet(&batch, parquet_path)?;

    let preview = pretty_format_batches(&[batch.slice(0, 5)]).context("formatting preview")?;
    println!("{preview}");
    println!("Wrote {} transactions to {csv_path} and {parquet_path}", rows.len());
    Ok(())
}
