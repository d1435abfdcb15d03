use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

/// Largest amount a single entry or scenario change may carry (one trillion).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Every problem found while validating a ledger entry, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors(pub Vec<String>);

impl fmt::Display for ValidationErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub(crate) fn require_text(
        &mut self,
        label: &str,
        value: &str,
        max_len: usize,
    ) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.0.push(format!("{label} is required"));
        } else {
            self.limit_text(label, trimmed, max_len);
        }
    }

    pub(crate) fn limit_text(
        &mut self,
        label: &str,
        value: &str,
        max_len: usize,
    ) {
        if value.trim().chars().count() > max_len {
            self.0
                .push(format!("{label} cannot be more than {max_len} characters"));
        }
    }

    pub(crate) fn require_positive(
        &mut self,
        label: &str,
        value: Decimal,
    ) {
        if value <= Decimal::ZERO {
            self.0.push(format!("{label} must be positive"));
        } else if value > MAX_AMOUNT {
            self.0.push(format!("{label} cannot exceed {MAX_AMOUNT}"));
        }
    }
}
