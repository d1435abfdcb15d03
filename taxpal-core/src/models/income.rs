use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;

pub const MAX_SOURCE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeCategory {
    Freelance,
    Consulting,
    Products,
    Services,
    Investment,
    Other,
}

impl IncomeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freelance => "freelance",
            Self::Consulting => "consulting",
            Self::Products => "products",
            Self::Services => "services",
            Self::Investment => "investment",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "freelance" => Some(Self::Freelance),
            "consulting" => Some(Self::Consulting),
            "products" => Some(Self::Products),
            "services" => Some(Self::Services),
            "investment" => Some(Self::Investment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Where a payment was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Upwork,
    Fiverr,
    Stripe,
    Paypal,
    Bank,
    Cash,
    #[default]
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upwork => "upwork",
            Self::Fiverr => "fiverr",
            Self::Stripe => "stripe",
            Self::Paypal => "paypal",
            Self::Bank => "bank",
            Self::Cash => "cash",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upwork" => Some(Self::Upwork),
            "fiverr" => Some(Self::Fiverr),
            "stripe" => Some(Self::Stripe),
            "paypal" => Some(Self::Paypal),
            "bank" => Some(Self::Bank),
            "cash" => Some(Self::Cash),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub id: i64,
    pub user_id: String,
    pub source: String,
    pub description: String,
    pub amount: Decimal,
    pub category: IncomeCategory,
    pub platform: Platform,
    pub invoice_number: Option<String>,
    pub date: NaiveDate,
    pub is_recurring: bool,
    /// Only taxable entries count towards the tax estimate.
    pub taxable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new income entries (no id, owner or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncome {
    pub source: String,
    pub description: String,
    pub amount: Decimal,
    pub category: IncomeCategory,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default = "today")]
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default = "default_taxable")]
    pub taxable: bool,
}

impl NewIncome {
    /// Trims free-text fields and drops a blank invoice number.
    pub fn normalize(&mut self) {
        self.source = self.source.trim().to_string();
        self.description = self.description.trim().to_string();
        self.invoice_number = normalize_optional(self.invoice_number.take());
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require_text("Income source", &self.source, MAX_SOURCE_LEN);
        errors.require_text("Description", &self.description, MAX_DESCRIPTION_LEN);
        errors.require_positive("Amount", self.amount);
        errors.into_result()
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeUpdate {
    pub source: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<IncomeCategory>,
    pub platform: Option<Platform>,
    /// An empty string clears the invoice number.
    pub invoice_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub taxable: Option<bool>,
}

impl IncomeUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(source) = &self.source {
            errors.require_text("Income source", source, MAX_SOURCE_LEN);
        }
        if let Some(description) = &self.description {
            errors.require_text("Description", description, MAX_DESCRIPTION_LEN);
        }
        if let Some(amount) = self.amount {
            errors.require_positive("Amount", amount);
        }
        errors.into_result()
    }

    pub fn apply_to(
        self,
        record: &mut IncomeRecord,
    ) {
        if let Some(source) = self.source {
            record.source = source.trim().to_string();
        }
        if let Some(description) = self.description {
            record.description = description.trim().to_string();
        }
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(platform) = self.platform {
            record.platform = platform;
        }
        if self.invoice_number.is_some() {
            record.invoice_number = normalize_optional(self.invoice_number);
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(is_recurring) = self.is_recurring {
            record.is_recurring = is_recurring;
        }
        if let Some(taxable) = self.taxable {
            record.taxable = taxable;
        }
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn default_taxable() -> bool {
    true
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
