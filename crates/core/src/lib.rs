pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ingest;

pub use audit::{InMemoryTransactionLog, TransactionLog, TransactionLogEntry};
pub use domain::confirmation::{
    Attributes, MoConfirmation, MoPickSubmission, PickConfirmation, RmaConfirmation,
    RmaPickSubmission,
};
pub use domain::response::ApiResponse;
pub use errors::{IngestError, StoreError};
