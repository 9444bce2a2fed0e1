use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::dates::normalize_dates;
use super::error::DataError;
use super::model::{
    COL_BRANCH, COL_COGS, COL_CUSTOMER_TYPE, COL_DATE, COL_GROSS_INCOME, COL_PAYMENT,
    COL_PRODUCT_LINE, COL_RATING, COL_TOTAL, REQUIRED_COLUMNS, RawSale, SalesDataset,
};

/// Date formats applied while loading.
#[derive(Debug, Clone, Copy)]
pub struct DateFormats<'a> {
    /// Format of the `Date` cells in the source.
    pub source: &'a str,
    /// Format of the derived display column.
    pub display: &'a str,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales dataset from a URL or a local file.
///
/// Supported sources:
/// * `http://…` / `https://…` – fetched once, body parsed as CSV
/// * `.csv`                   – header row plus one transaction per line
/// * `.parquet` / `.pq`       – flat columns with the same names as the CSV
pub fn load_source(location: &str, formats: DateFormats<'_>) -> Result<SalesDataset, DataError> {
    let rows = if is_remote(location) {
        let body = fetch_remote(location)?;
        read_csv(body.as_slice(), location)?
    } else {
        let path = Path::new(location);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => {
                let file = std::fs::File::open(path).map_err(|e| DataError::load(location, e))?;
                read_csv(file, location)?
            }
            "parquet" | "pq" => read_parquet(path, location)?,
            other => {
                return Err(DataError::load(
                    location,
                    format!("unsupported file extension: .{other}"),
                ))
            }
        }
    };

    let n_rows = rows.len();
    let records = normalize_dates(rows, formats.source, formats.display)?;
    log::debug!("Normalised {n_rows} dates from {location}");
    Ok(SalesDataset::from_records(records))
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Reject a header set lacking any required column, naming all of them.
fn check_required_columns<'h>(headers: impl IntoIterator<Item = &'h str>) -> Result<(), DataError> {
    let present: Vec<&str> = headers.into_iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataError::Schema { missing })
    }
}

// ---------------------------------------------------------------------------
// Remote fetch
// ---------------------------------------------------------------------------

/// Single blocking GET; non-success statuses are load failures.
fn fetch_remote(url: &str) -> Result<Vec<u8>, DataError> {
    log::info!("Fetching dataset from {url}");
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| DataError::load(url, e))?;
    let body = response.bytes().map_err(|e| DataError::load(url, e))?;
    log::debug!("Fetched {} bytes", body.len());
    Ok(body.to_vec())
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one transaction per row.
/// Columns outside [`REQUIRED_COLUMNS`] are ignored.
pub fn read_csv<R: Read>(input: R, location: &str) -> Result<Vec<RawSale>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| DataError::load(location, format!("reading CSV headers: {e}")))?
        .clone();
    check_required_columns(headers.iter())?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.deserialize::<RawSale>().enumerate() {
        let row = result.map_err(|e| DataError::load(location, format!("CSV row {row_no}: {e}")))?;
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per required field.
///
/// Text columns may be Utf8 or LargeUtf8 (the date is kept as text in the
/// source format); numeric columns may be Float64, Float32, Int64 or Int32.
/// Works with files written by both **Pandas** and **Polars**.
fn read_parquet(path: &Path, location: &str) -> Result<Vec<RawSale>, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::load(location, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DataError::load(location, format!("reading parquet metadata: {e}")))?;
    check_required_columns(builder.schema().fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder
        .build()
        .map_err(|e| DataError::load(location, format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| DataError::load(location, format!("reading parquet record batch: {e}")))?;
        let offset = rows.len();
        read_batch(&batch, offset, &mut rows).map_err(|reason| DataError::load(location, reason))?;
    }
    Ok(rows)
}

fn read_batch(batch: &RecordBatch, offset: usize, rows: &mut Vec<RawSale>) -> Result<(), String> {
    let date = column(batch, COL_DATE)?;
    let product_line = column(batch, COL_PRODUCT_LINE)?;
    let customer_type = column(batch, COL_CUSTOMER_TYPE)?;
    let rating = column(batch, COL_RATING)?;
    let branch = column(batch, COL_BRANCH)?;
    let payment = column(batch, COL_PAYMENT)?;
    let cogs = column(batch, COL_COGS)?;
    let gross_income = column(batch, COL_GROSS_INCOME)?;
    let total = column(batch, COL_TOTAL)?;

    for row in 0..batch.num_rows() {
        let at = |col: &str, e: String| format!("row {}, '{col}': {e}", offset + row);
        rows.push(RawSale {
            date: extract_string(date, row).map_err(|e| at(COL_DATE, e))?,
            product_line: extract_string(product_line, row).map_err(|e| at(COL_PRODUCT_LINE, e))?,
            customer_type: extract_string(customer_type, row)
                .map_err(|e| at(COL_CUSTOMER_TYPE, e))?,
            rating: extract_f64(rating, row).map_err(|e| at(COL_RATING, e))?,
            branch: extract_string(branch, row).map_err(|e| at(COL_BRANCH, e))?,
            payment: extract_string(payment, row).map_err(|e| at(COL_PAYMENT, e))?,
            cogs: extract_f64(cogs, row).map_err(|e| at(COL_COGS, e))?,
            gross_income: extract_f64(gross_income, row).map_err(|e| at(COL_GROSS_INCOME, e))?,
            total: extract_f64(total, row).map_err(|e| at(COL_TOTAL, e))?,
        });
    }
    Ok(())
}

// -- Arrow helpers --

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b Arc<dyn Array>, String> {
    batch
        .schema()
        .index_of(name)
        .map(|i| batch.column(i))
        .map_err(|_| format!("record batch missing '{name}' column"))
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String, String> {
    if col.is_null(row) {
        return Err("null value".to_string());
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|s| s.value(row).to_string())
            .ok_or_else(|| "expected StringArray".to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => Err(format!("expected Utf8 column, got {other:?}")),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64, String> {
    if col.is_null(row) {
        return Err("null value".to_string());
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        DataType::Float32 => any.downcast_ref::<Float32Array>().map(|a| a.value(row) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(row) as f64),
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(row) as f64),
        other => return Err(format!("expected numeric column, got {other:?}")),
    };
    value.ok_or_else(|| format!("unexpected array type {:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use arrow::array::ArrayRef;
    use arrow::datatypes::{Field, Schema};
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const FORMATS: DateFormats<'static> = DateFormats {
        source: "%m/%d/%Y",
        display: "%d/%m/%Y",
    };

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sales-dashboard-{}-{name}", std::process::id()))
    }

    const HEADER: &str = "Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating";

    fn csv_body(lines: &[&str]) -> String {
        let mut body = String::from(HEADER);
        for line in lines {
            body.push('\n');
            body.push_str(line);
        }
        body
    }

    #[test]
    fn reads_required_columns_and_ignores_extras() {
        let body = csv_body(&[
            "750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1",
            "226-31-3081,C,Naypyitaw,Normal,Female,Electronic accessories,15.28,5,3.82,80.22,3/8/2019,10:29,Cash,76.4,4.761904762,3.82,9.6",
        ]);

        let rows = read_csv(Cursor::new(body), "memory").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].branch, "A");
        assert_eq!(rows[0].customer_type, "Member");
        assert_eq!(rows[0].product_line, "Health and beauty");
        assert_eq!(rows[0].date, "1/5/2019");
        assert_eq!(rows[1].payment, "Cash");
        assert_eq!(rows[1].rating, 9.6);
        assert_eq!(rows[1].total, 80.22);
        assert_eq!(rows[1].cogs, 76.4);
        assert_eq!(rows[1].gross_income, 3.82);
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let body = "Date,Product line,Customer type,Branch,Payment,cogs,Total\n1/5/2019,Food,Member,A,Cash,1.0,2.0\n";
        let err = read_csv(Cursor::new(body), "memory").unwrap_err();
        match err {
            DataError::Schema { missing } => {
                assert_eq!(missing, vec!["Rating".to_string(), "gross income".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_cell_is_a_load_error() {
        let body = csv_body(&[
            "750-67-8428,A,Yangon,Member,Female,Food,74.69,7,26.1,oops,1/5/2019,13:08,Cash,522.83,4.76,26.1,9.1",
        ]);
        let err = read_csv(Cursor::new(body), "memory").unwrap_err();
        assert!(matches!(err, DataError::Load { .. }), "got {err:?}");
    }

    #[test]
    fn header_only_csv_yields_no_rows() {
        let rows = read_csv(Cursor::new(HEADER.to_string()), "memory").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_source("sales.xlsx", FORMATS).unwrap_err();
        assert!(matches!(err, DataError::Load { .. }));
    }

    #[test]
    fn missing_local_file_is_a_load_error() {
        let err = load_source("/nonexistent/dir/sales.csv", FORMATS).unwrap_err();
        assert!(matches!(err, DataError::Load { .. }));
    }

    #[test]
    fn csv_file_loads_into_dataset() {
        let path = temp_path("load.csv");
        let body = csv_body(&[
            "750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1",
            "226-31-3081,C,Naypyitaw,Normal,Female,Electronic accessories,15.28,5,3.82,80.22,3/8/2019,10:29,Cash,76.4,4.761904762,3.82,9.6",
        ]);
        std::fs::write(&path, body).unwrap();

        let ds = load_source(path.to_str().unwrap(), FORMATS).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].date_display, "08/03/2019");
        assert_eq!(
            ds.date_bounds,
            Some((
                NaiveDate::from_ymd_opt(2019, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2019, 3, 8).unwrap()
            ))
        );
        assert_eq!(ds.rating_bounds, Some((9.1, 9.6)));
    }

    #[test]
    fn csv_file_with_bad_date_is_a_parse_error() {
        let path = temp_path("bad-date.csv");
        let body = csv_body(&[
            "750-67-8428,A,Yangon,Member,Female,Food,74.69,7,26.1,548.9,2019-01-05,13:08,Cash,522.83,4.76,26.1,9.1",
        ]);
        std::fs::write(&path, body).unwrap();

        let err = load_source(path.to_str().unwrap(), FORMATS).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DataError::Parse { row: 0, .. }), "got {err:?}");
    }

    #[test]
    fn parquet_file_loads_mixed_numeric_types() {
        let text = |v: &[&str]| -> ArrayRef { Arc::new(StringArray::from(v.to_vec())) };
        let schema = Arc::new(Schema::new(vec![
            Field::new("Date", DataType::Utf8, false),
            Field::new("Product line", DataType::Utf8, false),
            Field::new("Customer type", DataType::Utf8, false),
            Field::new("Rating", DataType::Float32, false),
            Field::new("Branch", DataType::Utf8, false),
            Field::new("Payment", DataType::Utf8, false),
            Field::new("cogs", DataType::Float64, false),
            Field::new("gross income", DataType::Float64, false),
            Field::new("Total", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                text(&["1/5/2019", "1/6/2019"]),
                text(&["Food", "Sports"]),
                text(&["Member", "Normal"]),
                Arc::new(Float32Array::from(vec![7.5f32, 4.0])),
                text(&["A", "B"]),
                text(&["Cash", "Ewallet"]),
                Arc::new(Float64Array::from(vec![95.0, 190.0])),
                Arc::new(Float64Array::from(vec![5.0, 10.0])),
                Arc::new(Int64Array::from(vec![100i64, 200])),
            ],
        )
        .unwrap();

        let path = temp_path("load.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_source(path.to_str().unwrap(), FORMATS).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].rating, 7.5);
        assert_eq!(ds.records[1].total, 200.0);
        assert_eq!(ds.records[1].payment, "Ewallet");
        assert_eq!(ds.branches, vec!["A", "B"]);
    }

    #[test]
    fn parquet_without_required_columns_is_a_schema_error() {
        let schema = Arc::new(Schema::new(vec![Field::new("Date", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["1/5/2019"])) as ArrayRef],
        )
        .unwrap();

        let path = temp_path("schema.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_source(path.to_str().unwrap(), FORMATS).unwrap_err();
        std::fs::remove_file(&path).ok();
        match err {
            DataError::Schema { missing } => assert_eq!(missing.len(), 8),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn remote_locations_are_detected() {
        assert!(is_remote("https://drive.google.com/uc?export=download&id=x"));
        assert!(!is_remote("data/sales.csv"));
    }
}
