use std::fmt::Write;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};

use super::error::DataError;
use super::model::{COL_DATE, RawSale, SalesRecord};

/// Format of the `Date` column in the published dataset (month/day/year).
pub const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y";
/// Format used when showing dates to the user (day/month/year).
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Reject a pattern chrono cannot format or parse with.
pub fn check_date_format(format: &str) -> Result<(), DataError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(DataError::Format {
            format: format.to_string(),
        });
    }
    Ok(())
}

/// `date` rendered with `format`, or `None` if the pattern is invalid.
pub fn format_date(date: NaiveDate, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).ok()?;
    Some(out)
}

/// Parse the date column of every raw row and derive its display string.
///
/// All-or-nothing: the first row whose date does not match `source_format`
/// aborts the whole conversion with [`DataError::Parse`]. An invalid pattern
/// fails with [`DataError::Format`] before any row is read.
pub fn normalize_dates(
    rows: Vec<RawSale>,
    source_format: &str,
    display_format: &str,
) -> Result<Vec<SalesRecord>, DataError> {
    check_date_format(source_format)?;
    check_date_format(display_format)?;

    rows.into_iter()
        .enumerate()
        .map(|(row, raw)| {
            let date = NaiveDate::parse_from_str(raw.date.trim(), source_format).map_err(|_| {
                DataError::Parse {
                    row,
                    column: COL_DATE.to_string(),
                    value: raw.date.clone(),
                    format: source_format.to_string(),
                }
            })?;

            let date_display =
                format_date(date, display_format).ok_or_else(|| DataError::Format {
                    format: display_format.to_string(),
                })?;

            Ok(SalesRecord {
                date,
                date_display,
                product_line: raw.product_line,
                customer_type: raw.customer_type,
                rating: raw.rating,
                branch: raw.branch,
                payment: raw.payment,
                cogs: raw.cogs,
                gross_income: raw.gross_income,
                total: raw.total,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str) -> RawSale {
        RawSale {
            date: date.to_string(),
            product_line: "Health and beauty".to_string(),
            customer_type: "Member".to_string(),
            rating: 9.1,
            branch: "A".to_string(),
            payment: "Ewallet".to_string(),
            cogs: 522.83,
            gross_income: 26.1415,
            total: 548.9715,
        }
    }

    #[test]
    fn parses_month_first_and_formats_day_first() {
        let recs = normalize_dates(
            vec![raw("1/5/2019"), raw("03/08/2019")],
            SOURCE_DATE_FORMAT,
            DISPLAY_DATE_FORMAT,
        )
        .unwrap();

        assert_eq!(recs[0].date, NaiveDate::from_ymd_opt(2019, 1, 5).unwrap());
        assert_eq!(recs[0].date_display, "05/01/2019");
        assert_eq!(recs[1].date, NaiveDate::from_ymd_opt(2019, 3, 8).unwrap());
        assert_eq!(recs[1].date_display, "08/03/2019");
        assert_eq!(recs[0].total, 548.9715);
    }

    #[test]
    fn bad_date_fails_whole_batch_and_names_row() {
        let err = normalize_dates(
            vec![raw("1/5/2019"), raw("2019-01-06"), raw("1/7/2019")],
            SOURCE_DATE_FORMAT,
            DISPLAY_DATE_FORMAT,
        )
        .unwrap_err();

        match err {
            DataError::Parse { row, column, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Date");
                assert_eq!(value, "2019-01-06");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn month_thirteen_is_rejected() {
        assert!(normalize_dates(vec![raw("13/01/2019")], SOURCE_DATE_FORMAT, DISPLAY_DATE_FORMAT).is_err());
    }

    #[test]
    fn unknown_specifier_is_an_error_not_a_panic() {
        let err = normalize_dates(vec![raw("1/5/2019")], SOURCE_DATE_FORMAT, "%d/%Q/%Y")
            .unwrap_err();
        assert!(matches!(err, DataError::Format { ref format } if format == "%d/%Q/%Y"));

        let err = normalize_dates(vec![raw("1/5/2019")], "%m/%", DISPLAY_DATE_FORMAT).unwrap_err();
        assert!(matches!(err, DataError::Format { .. }));
    }

    #[test]
    fn format_date_rejects_bad_patterns() {
        let date = NaiveDate::from_ymd_opt(2019, 3, 8).unwrap();
        assert_eq!(format_date(date, DISPLAY_DATE_FORMAT).as_deref(), Some("08/03/2019"));
        assert_eq!(format_date(date, "%Q"), None);
        assert!(check_date_format(SOURCE_DATE_FORMAT).is_ok());
        assert!(check_date_format("%Q").is_err());
    }
}
