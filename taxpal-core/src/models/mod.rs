mod expense;
mod filing_status;
mod income;
mod ledger;
mod tax_bracket;
mod tax_table;
mod validation;

pub use expense::{ExpenseCategory, ExpenseRecord, ExpenseUpdate, NewExpense, PaymentMethod};
pub use filing_status::FilingStatusCode;
pub use income::{IncomeCategory, IncomeRecord, IncomeUpdate, NewIncome, Platform};
pub use ledger::{
    DEFAULT_PAGE_LIMIT, LedgerQuery, LedgerTotals, MAX_PAGE_LIMIT, Page, PageSummary, Pagination,
    SortField, SortOrder,
};
pub use tax_bracket::TaxBracket;
pub use tax_table::{SE_TAX_RATE, STANDARD_DEDUCTION_2024, TaxTable, TaxTableError};
pub use validation::{MAX_AMOUNT, ValidationErrors};
