use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::income::{normalize_optional, today};
use super::validation::ValidationErrors;

pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_NOTES_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpenseCategory {
    OfficeSupplies,
    Software,
    Marketing,
    Travel,
    Meals,
    HomeOffice,
    Internet,
    Insurance,
    Professional,
    Education,
    Equipment,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OfficeSupplies => "office-supplies",
            Self::Software => "software",
            Self::Marketing => "marketing",
            Self::Travel => "travel",
            Self::Meals => "meals",
            Self::HomeOffice => "home-office",
            Self::Internet => "internet",
            Self::Insurance => "insurance",
            Self::Professional => "professional",
            Self::Education => "education",
            Self::Equipment => "equipment",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "office-supplies" => Some(Self::OfficeSupplies),
            "software" => Some(Self::Software),
            "marketing" => Some(Self::Marketing),
            "travel" => Some(Self::Travel),
            "meals" => Some(Self::Meals),
            "home-office" => Some(Self::HomeOffice),
            "internet" => Some(Self::Internet),
            "insurance" => Some(Self::Insurance),
            "professional" => Some(Self::Professional),
            "education" => Some(Self::Education),
            "equipment" => Some(Self::Equipment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    DebitCard,
    BankTransfer,
    Cash,
    Paypal,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit-card",
            Self::DebitCard => "debit-card",
            Self::BankTransfer => "bank-transfer",
            Self::Cash => "cash",
            Self::Paypal => "paypal",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credit-card" => Some(Self::CreditCard),
            "debit-card" => Some(Self::DebitCard),
            "bank-transfer" => Some(Self::BankTransfer),
            "cash" => Some(Self::Cash),
            "paypal" => Some(Self::Paypal),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: i64,
    pub user_id: String,
    pub description: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub payment_method: PaymentMethod,
    pub receipt_url: Option<String>,
    pub vendor: Option<String>,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub is_deductible: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new expense entries (no id, owner or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default = "today")]
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default = "default_deductible")]
    pub is_deductible: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewExpense {
    pub fn normalize(&mut self) {
        self.description = self.description.trim().to_string();
        self.receipt_url = normalize_optional(self.receipt_url.take());
        self.vendor = normalize_optional(self.vendor.take());
        self.notes = normalize_optional(self.notes.take());
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require_text("Description", &self.description, MAX_DESCRIPTION_LEN);
        errors.require_positive("Amount", self.amount);
        if let Some(notes) = &self.notes {
            errors.limit_text("Notes", notes, MAX_NOTES_LEN);
        }
        errors.into_result()
    }
}

/// Partial update; `None` leaves the stored value untouched and an empty
/// string clears an optional text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<ExpenseCategory>,
    pub payment_method: Option<PaymentMethod>,
    pub receipt_url: Option<String>,
    pub vendor: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub is_deductible: Option<bool>,
    pub notes: Option<String>,
}

impl ExpenseUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(description) = &self.description {
            errors.require_text("Description", description, MAX_DESCRIPTION_LEN);
        }
        if let Some(amount) = self.amount {
            errors.require_positive("Amount", amount);
        }
        if let Some(notes) = &self.notes {
            errors.limit_text("Notes", notes, MAX_NOTES_LEN);
        }
        errors.into_result()
    }

    pub fn apply_to(
        self,
        record: &mut ExpenseRecord,
    ) {
        if let Some(description) = self.description {
            record.description = description.trim().to_string();
        }
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(payment_method) = self.payment_method {
            record.payment_method = payment_method;
        }
        if self.receipt_url.is_some() {
            record.receipt_url = normalize_optional(self.receipt_url);
        }
        if self.vendor.is_some() {
            record.vendor = normalize_optional(self.vendor);
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(is_recurring) = self.is_recurring {
            record.is_recurring = is_recurring;
        }
        if let Some(is_deductible) = self.is_deductible {
            record.is_deductible = is_deductible;
        }
        if self.notes.is_some() {
            record.notes = normalize_optional(self.notes);
        }
    }
}

fn default_deductible() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserialize_applies_defaults() {
        let json = r#"{
            "description": "Figma seat",
            "amount": "15.00",
            "category": "software"
        }"#;

        let expense: NewExpense = serde_json::from_str(json).unwrap();

        assert_eq!(expense.amount, dec!(15.00));
        assert_eq!(expense.category, ExpenseCategory::Software);
        assert_eq!(expense.payment_method, PaymentMethod::CreditCard);
        assert!(expense.is_deductible);
        assert!(expense.vendor.is_none());
    }

    #[test]
    fn kebab_case_categories_round_trip() {
        let category: ExpenseCategory = serde_json::from_str("\"home-office\"").unwrap();

        assert_eq!(category, ExpenseCategory::HomeOffice);
        assert_eq!(ExpenseCategory::parse("office-supplies"), Some(ExpenseCategory::OfficeSupplies));
        assert_eq!(PaymentMethod::parse("bank-transfer"), Some(PaymentMethod::BankTransfer));
    }

    #[test]
    fn validate_rejects_negative_amount_and_long_notes() {
        let expense = NewExpense {
            description: "Laptop".to_string(),
            amount: dec!(-10),
            category: ExpenseCategory::Equipment,
            payment_method: PaymentMethod::Cash,
            receipt_url: None,
            vendor: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            is_recurring: false,
            is_deductible: true,
            notes: Some("n".repeat(1001)),
        };

        let errors = expense.validate().unwrap_err();

        assert_eq!(
            errors.0,
            vec![
                "Amount must be positive".to_string(),
                "Notes cannot be more than 1000 characters".to_string(),
            ]
        );
    }

    #[test]
    fn update_clears_vendor_with_empty_string() {
        let now = Utc::now();
        let mut record = ExpenseRecord {
            id: 7,
            user_id: "u1".to_string(),
            description: "Coworking".to_string(),
            amount: dec!(300),
            category: ExpenseCategory::HomeOffice,
            payment_method: PaymentMethod::DebitCard,
            receipt_url: None,
            vendor: Some("WeWork".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            is_recurring: true,
            is_deductible: true,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        ExpenseUpdate {
            vendor: Some(String::new()),
            is_deductible: Some(false),
            ..Default::default()
        }
        .apply_to(&mut record);

        assert_eq!(record.vendor, None);
        assert!(!record.is_deductible);
        assert_eq!(record.description, "Coworking");
    }
}
