mod ledger;
mod tax_table;

pub use ledger::{ImportRow, LedgerImportError, LedgerImporter};
pub use tax_table::{TaxBracketRecord, TaxTableLoadError, TaxTableLoader};
