//! Confirmation ingestion: duplicate filtering, the locator gate, bulk commit,
//! cross validation and quick-pick response decoding.

pub mod decoder;
pub mod filter;
pub mod gate;
pub mod keys;
pub mod location;
pub mod ports;
pub mod reconcile;
pub mod service;

pub use decoder::{DecodeMode, ResponseDecoder};
pub use filter::{BatchFilter, BatchOutcome, Confirmation, RejectReason, Rejection};
pub use gate::{GatedTable, IngestionGate};
pub use keys::{CompositeKey, KeyVariant};
pub use location::{LocationValidator, LocationVerdict};
pub use ports::{
    ConfirmationStore, LocationProcedure, PickStore, QuickPickOutput, QuickPickProcedure,
};
pub use reconcile::{CrossValidationTally, CrossValidator, Reconciliation};
pub use service::{ConfirmationService, IngestionPorts, IngestionSettings};
