//! Quarterly estimated-payment schedule and the filing calendar.
//!
//! Due dates are fixed per year (Apr 15, Jun 17, Sep 16, and Jan 15 of the
//! following year); they are not derived from weekend or holiday rules.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::calculations::estimate::{EstimateError, ensure_non_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    fn period(
        &self,
        year: i32,
    ) -> String {
        let months = match self {
            Quarter::Q1 => "Jan 1 - Mar 31",
            Quarter::Q2 => "Apr 1 - May 31",
            Quarter::Q3 => "Jun 1 - Aug 31",
            Quarter::Q4 => "Sep 1 - Dec 31",
        };
        format!("{months}, {year}")
    }

    /// (year offset, month, day)
    fn due(&self) -> (i32, u32, u32) {
        match self {
            Quarter::Q1 => (0, 4, 15),
            Quarter::Q2 => (0, 6, 17),
            Quarter::Q3 => (0, 9, 16),
            Quarter::Q4 => (1, 1, 15),
        }
    }

    pub fn due_date(
        &self,
        year: i32,
    ) -> Result<NaiveDate, EstimateError> {
        let (offset, month, day) = self.due();
        date(year, offset, month, day)
    }

    fn ordinal(&self) -> &'static str {
        match self {
            Quarter::Q1 => "First",
            Quarter::Q2 => "Second",
            Quarter::Q3 => "Third",
            Quarter::Q4 => "Fourth",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyPayment {
    pub quarter: Quarter,
    pub period: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlySchedule {
    pub year: i32,
    pub total_estimated_tax: Decimal,
    pub quarterly_amount: Decimal,
    pub schedule: Vec<QuarterlyPayment>,
}

/// Splits `total_tax` into four equal payments due on the fixed dates.
///
/// # Errors
///
/// [`EstimateError::NegativeAmount`] for a negative total and
/// [`EstimateError::InvalidYear`] when the due dates cannot be built.
pub fn quarterly_schedule(
    total_tax: Decimal,
    year: i32,
) -> Result<QuarterlySchedule, EstimateError> {
    ensure_non_negative("total_tax", total_tax)?;
    let quarterly_amount = round_half_up(total_tax / Decimal::from(4));

    let schedule = Quarter::ALL
        .iter()
        .map(|quarter| {
            Ok(QuarterlyPayment {
                quarter: *quarter,
                period: quarter.period(year),
                due_date: quarter.due_date(year)?,
                amount: quarterly_amount,
            })
        })
        .collect::<Result<Vec<_>, EstimateError>>()?;

    Ok(QuarterlySchedule {
        year,
        total_estimated_tax: round_half_up(total_tax),
        quarterly_amount,
        schedule,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineKind {
    Quarterly,
    Annual,
    Informational,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDeadline {
    pub title: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: DeadlineKind,
}

/// The six dates that matter for tax year `year`, earliest first.
pub fn tax_deadlines(year: i32) -> Result<Vec<TaxDeadline>, EstimateError> {
    let mut deadlines = Quarter::ALL
        .iter()
        .map(|quarter| {
            Ok(TaxDeadline {
                title: format!("{quarter:?} Quarterly Payment"),
                date: quarter.due_date(year)?,
                description: format!(
                    "{} quarter estimated tax payment due",
                    quarter.ordinal()
                ),
                kind: DeadlineKind::Quarterly,
            })
        })
        .collect::<Result<Vec<_>, EstimateError>>()?;

    deadlines.push(TaxDeadline {
        title: "Annual Tax Return".to_string(),
        date: date(year, 1, 4, 15)?,
        description: format!("{year} tax return filing deadline"),
        kind: DeadlineKind::Annual,
    });
    deadlines.push(TaxDeadline {
        title: "1099 Forms Available".to_string(),
        date: date(year, 1, 1, 31)?,
        description: "Clients must provide 1099-NEC forms".to_string(),
        kind: DeadlineKind::Informational,
    });

    deadlines.sort_by_key(|deadline| deadline.date);
    Ok(deadlines)
}

/// First and last calendar day of `year`.
pub fn year_range(year: i32) -> Result<(NaiveDate, NaiveDate), EstimateError> {
    Ok((date(year, 0, 1, 1)?, date(year, 0, 12, 31)?))
}

fn date(
    year: i32,
    offset: i32,
    month: u32,
    day: u32,
) -> Result<NaiveDate, EstimateError> {
    year.checked_add(offset)
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        .ok_or(EstimateError::InvalidYear(year))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn ymd(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ===== quarterly_schedule tests =====

    #[test]
    fn splits_tax_into_four_equal_payments() {
        let schedule = quarterly_schedule(dec!(4000), 2024).unwrap();

        assert_eq!(schedule.quarterly_amount, dec!(1000));
        assert!(schedule.schedule.iter().all(|p| p.amount == dec!(1000)));
        assert_eq!(
            schedule
                .schedule
                .iter()
                .map(|p| p.due_date)
                .collect::<Vec<_>>(),
            vec![
                ymd(2024, 4, 15),
                ymd(2024, 6, 17),
                ymd(2024, 9, 16),
                ymd(2025, 1, 15),
            ]
        );
    }

    #[test]
    fn periods_are_reproduced_exactly() {
        let schedule = quarterly_schedule(dec!(100), 2026).unwrap();

        let periods: Vec<&str> = schedule.schedule.iter().map(|p| p.period.as_str()).collect();

        assert_eq!(
            periods,
            vec![
                "Jan 1 - Mar 31, 2026",
                "Apr 1 - May 31, 2026",
                "Jun 1 - Aug 31, 2026",
                "Sep 1 - Dec 31, 2026",
            ]
        );
    }

    #[test]
    fn quarterly_amount_rounds_half_up() {
        let schedule = quarterly_schedule(dec!(18964.50), 2024).unwrap();

        assert_eq!(schedule.quarterly_amount, dec!(4741.13));
    }

    #[test]
    fn zero_tax_yields_zero_payments() {
        let schedule = quarterly_schedule(Decimal::ZERO, 2024).unwrap();

        assert_eq!(schedule.schedule.len(), 4);
        assert_eq!(schedule.quarterly_amount, Decimal::ZERO);
    }

    #[test]
    fn negative_tax_is_rejected() {
        let result = quarterly_schedule(dec!(-1), 2024);

        assert_eq!(
            result,
            Err(EstimateError::NegativeAmount {
                field: "total_tax",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn unrepresentable_year_is_rejected() {
        let result = quarterly_schedule(dec!(10), i32::MAX);

        assert_eq!(result, Err(EstimateError::InvalidYear(i32::MAX)));
    }

    #[test]
    fn schedule_serializes_with_iso_dates() {
        let schedule = quarterly_schedule(dec!(4000), 2024).unwrap();

        let json = serde_json::to_value(&schedule.schedule[3]).unwrap();

        assert_eq!(json["quarter"], "Q4");
        assert_eq!(json["dueDate"], "2025-01-15");
    }

    // ===== tax_deadlines tests =====

    #[test]
    fn deadlines_are_sorted_by_date() {
        let deadlines = tax_deadlines(2024).unwrap();

        let summary: Vec<(&str, NaiveDate)> = deadlines
            .iter()
            .map(|d| (d.title.as_str(), d.date))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("Q1 Quarterly Payment", ymd(2024, 4, 15)),
                ("Q2 Quarterly Payment", ymd(2024, 6, 17)),
                ("Q3 Quarterly Payment", ymd(2024, 9, 16)),
                ("Q4 Quarterly Payment", ymd(2025, 1, 15)),
                ("1099 Forms Available", ymd(2025, 1, 31)),
                ("Annual Tax Return", ymd(2025, 4, 15)),
            ]
        );
    }

    #[test]
    fn deadline_kinds_and_descriptions() {
        let deadlines = tax_deadlines(2024).unwrap();

        let annual = deadlines
            .iter()
            .find(|d| d.kind == DeadlineKind::Annual)
            .unwrap();
        assert_eq!(annual.description, "2024 tax return filing deadline");
        assert_eq!(
            deadlines[0].description,
            "First quarter estimated tax payment due"
        );

        let json = serde_json::to_value(&deadlines[4]).unwrap();
        assert_eq!(json["type"], "informational");
    }

    #[test]
    fn year_range_covers_calendar_year() {
        assert_eq!(year_range(2024), Ok((ymd(2024, 1, 1), ymd(2024, 12, 31))));
    }
}
