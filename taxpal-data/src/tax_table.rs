use std::fs::File;
use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use taxpal_core::{FilingStatusCode, TaxBracket, TaxTable, TaxTableError};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a tax table.
#[derive(Debug, Error)]
pub enum TaxTableLoadError {
    #[error("Failed to read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("No brackets for tax year {tax_year}, schedule {schedule}")]
    NoBrackets { tax_year: i32, schedule: String },

    #[error("Invalid tax table: {0}")]
    InvalidTable(#[from] TaxTableError),
}

impl From<csv::Error> for TaxTableLoadError {
    fn from(err: csv::Error) -> Self {
        TaxTableLoadError::CsvParse(err.to_string())
    }
}

/// Maps IRS schedule codes to the filing statuses they apply to.
///
/// - Schedule X → Single (S)
/// - Schedule Y-1 → Married Filing Jointly (MFJ) and Qualifying Surviving Spouse (QSS)
/// - Schedule Y-2 → Married Filing Separately (MFS)
/// - Schedule Z → Head of Household (HOH)
fn schedule_to_filing_statuses(
    schedule: &str
) -> Result<&'static [FilingStatusCode], TaxTableLoadError> {
    use FilingStatusCode::*;

    match schedule {
        "X" => Ok(&[Single]),
        "Y-1" => Ok(&[MarriedFilingJointly, QualifyingSurvivingSpouse]),
        "Y-2" => Ok(&[MarriedFilingSeparately]),
        "Z" => Ok(&[HeadOfHousehold]),
        _ => Err(TaxTableLoadError::InvalidSchedule(schedule.to_string())),
    }
}

/// A single record from a tax brackets CSV file.
///
/// - `tax_year`: the tax year (e.g., 2024)
/// - `schedule`: the IRS schedule code (X, Y-1, Y-2, Z)
/// - `min_income`: the lower bound of the bracket
/// - `max_income`: the upper bound (empty for unlimited)
/// - `rate`: the marginal rate as a decimal (e.g., 0.10 for 10%)
///
/// Extra columns such as `base_tax` are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Builds a [`TaxTable`] from a bracket schedule CSV.
///
/// A file may hold several years and schedules; [`TaxTableLoader::build`]
/// picks the rows for one year and filing status.
pub struct TaxTableLoader;

impl TaxTableLoader {
    /// Parse bracket records from a CSV reader, checking every schedule code.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxTableLoadError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            schedule_to_filing_statuses(&record.schedule)?;
            records.push(record);
        }

        Ok(records)
    }

    /// Select the brackets for `tax_year` and `filing_status` and validate
    /// them as a table. Rows may appear in any order.
    pub fn build(
        records: &[TaxBracketRecord],
        tax_year: i32,
        filing_status: FilingStatusCode,
        standard_deduction: Decimal,
        se_tax_rate: Decimal,
    ) -> Result<TaxTable, TaxTableLoadError> {
        let mut brackets = Vec::new();
        for record in records.iter().filter(|r| r.tax_year == tax_year) {
            if schedule_to_filing_statuses(&record.schedule)?.contains(&filing_status) {
                brackets.push(TaxBracket::new(
                    record.min_income,
                    record.max_income,
                    record.rate,
                ));
            }
        }

        if brackets.is_empty() {
            return Err(TaxTableLoadError::NoBrackets {
                tax_year,
                schedule: filing_status.schedule().to_string(),
            });
        }
        brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));

        let table = TaxTable::new(
            tax_year,
            filing_status,
            brackets,
            standard_deduction,
            se_tax_rate,
        )?;
        debug!(
            tax_year,
            status = filing_status.as_str(),
            brackets = table.brackets().len(),
            "built tax table"
        );
        Ok(table)
    }

    /// [`parse`](Self::parse) the file at `path`, then [`build`](Self::build).
    pub fn from_path(
        path: &Path,
        tax_year: i32,
        filing_status: FilingStatusCode,
        standard_deduction: Decimal,
        se_tax_rate: Decimal,
    ) -> Result<TaxTable, TaxTableLoadError> {
        let file = File::open(path).map_err(|e| TaxTableLoadError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let records = Self::parse(file)?;
        Self::build(
            &records,
            tax_year,
            filing_status,
            standard_deduction,
            se_tax_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use taxpal_core::{SE_TAX_RATE, STANDARD_DEDUCTION_2024};

    use super::*;

    const HEADER: &str = "tax_year,schedule,min_income,max_income,rate\n";

    fn csv(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    // ===== parse tests =====

    #[test]
    fn parses_single_bracket() {
        let records = TaxTableLoader::parse(csv("2024,X,0,11000,0.10").as_bytes())
            .expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![TaxBracketRecord {
                tax_year: 2024,
                schedule: "X".to_string(),
                min_income: dec!(0),
                max_income: Some(dec!(11000)),
                rate: dec!(0.10),
            }]
        );
    }

    #[test]
    fn empty_max_income_is_unbounded() {
        let records = TaxTableLoader::parse(csv("2024,X,578125,,0.37").as_bytes())
            .expect("Failed to parse CSV");

        assert_eq!(records[0].max_income, None);
        assert_eq!(records[0].rate, dec!(0.37));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let data = "tax_year,schedule,min_income,max_income,base_tax,rate\n2025,X,11925,48475,1192.50,0.12";

        let records = TaxTableLoader::parse(data.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].min_income, dec!(11925));
        assert_eq!(records[0].rate, dec!(0.12));
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        let result = TaxTableLoader::parse("tax_year,schedule,min_income\n2024,X,0".as_bytes());

        let err = result.expect_err("Should fail for missing column");
        let TaxTableLoadError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {err:?}");
        };
        assert!(msg.contains("missing field"), "got: {msg}");
    }

    #[test]
    fn unknown_schedule_is_rejected() {
        let result = TaxTableLoader::parse(csv("2024,Q,0,,0.10").as_bytes());

        assert!(matches!(
            result,
            Err(TaxTableLoadError::InvalidSchedule(ref s)) if s == "Q"
        ));
    }

    #[test]
    fn schedule_mapping_covers_every_status() {
        for status in [
            FilingStatusCode::Single,
            FilingStatusCode::MarriedFilingJointly,
            FilingStatusCode::MarriedFilingSeparately,
            FilingStatusCode::HeadOfHousehold,
            FilingStatusCode::QualifyingSurvivingSpouse,
        ] {
            let statuses = schedule_to_filing_statuses(status.schedule()).unwrap();
            assert!(statuses.contains(&status), "{status:?}");
        }
    }

    // ===== build tests =====

    #[test]
    fn build_orders_rows_and_validates() {
        let records = TaxTableLoader::parse(
            csv("2024,X,44725,,0.22\n2024,X,0,11000,0.10\n2024,X,11000,44725,0.12").as_bytes(),
        )
        .unwrap();

        let table = TaxTableLoader::build(
            &records,
            2024,
            FilingStatusCode::Single,
            STANDARD_DEDUCTION_2024,
            SE_TAX_RATE,
        )
        .unwrap();

        let mins: Vec<Decimal> = table.brackets().iter().map(|b| b.min_income).collect();
        assert_eq!(mins, vec![dec!(0), dec!(11000), dec!(44725)]);
        assert_eq!(table.top_bracket().tax_rate, dec!(0.22));
    }

    #[test]
    fn build_skips_other_years_and_schedules() {
        let records = TaxTableLoader::parse(
            csv("2023,X,0,,0.50\n2024,Z,0,,0.40\n2024,X,0,,0.10").as_bytes(),
        )
        .unwrap();

        let table = TaxTableLoader::build(
            &records,
            2024,
            FilingStatusCode::Single,
            dec!(0),
            SE_TAX_RATE,
        )
        .unwrap();

        assert_eq!(table.brackets().len(), 1);
        assert_eq!(table.brackets()[0].tax_rate, dec!(0.10));
    }

    #[test]
    fn build_without_matching_rows_fails() {
        let records = TaxTableLoader::parse(csv("2024,X,0,,0.10").as_bytes()).unwrap();

        let result = TaxTableLoader::build(
            &records,
            2024,
            FilingStatusCode::HeadOfHousehold,
            dec!(0),
            SE_TAX_RATE,
        );

        assert!(matches!(
            result,
            Err(TaxTableLoadError::NoBrackets { tax_year: 2024, ref schedule }) if schedule == "Z"
        ));
    }

    #[test]
    fn build_reports_gaps_as_invalid_table() {
        let records =
            TaxTableLoader::parse(csv("2024,X,0,10000,0.10\n2024,X,12000,,0.12").as_bytes())
                .unwrap();

        let result = TaxTableLoader::build(
            &records,
            2024,
            FilingStatusCode::Single,
            dec!(0),
            SE_TAX_RATE,
        );

        assert!(matches!(
            result,
            Err(TaxTableLoadError::InvalidTable(TaxTableError::Discontinuous { index: 1, .. }))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = TaxTableLoader::from_path(
            Path::new("/nonexistent/brackets.csv"),
            2024,
            FilingStatusCode::Single,
            dec!(0),
            SE_TAX_RATE,
        );

        assert!(matches!(result, Err(TaxTableLoadError::Io { .. })));
    }
}
