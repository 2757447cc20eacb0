//! Readers for the consumption export downloaded from the customer portal

pub mod consumption_importer;

// Re-export commonly used items
pub use consumption_importer::{ConsumptionImporter, ExportError};
