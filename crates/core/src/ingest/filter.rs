use std::collections::HashSet;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::audit::{TransactionLog, TransactionLogEntry};
use crate::domain::confirmation::{
    MoConfirmation, PickConfirmation, RmaConfirmation, RmaKind,
};
use crate::errors::IngestError;
use crate::ingest::keys::{self, CompositeKey};
use crate::ingest::location::{LocationValidator, LocationVerdict};
use crate::ingest::ports::ConfirmationStore;

/// `(subinventory, locator)` pair a record must clear before it is considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocationCheck<'a> {
    pub subinventory: &'a str,
    pub locator: &'a str,
}

/// A record family the batch filter can route.
pub trait Confirmation: Clone + Serialize + Send + Sync + 'static {
    fn transaction_type(&self) -> Option<&str>;

    /// `None` when the record's transaction type has no duplicate rule.
    fn composite_key(&self) -> Option<CompositeKey>;

    fn location_check(&self) -> Option<LocationCheck<'_>> {
        None
    }
}

impl Confirmation for MoConfirmation {
    fn transaction_type(&self) -> Option<&str> {
        self.transaction_type.as_deref()
    }

    fn composite_key(&self) -> Option<CompositeKey> {
        Some(keys::mo_key(self))
    }
}

impl Confirmation for PickConfirmation {
    fn transaction_type(&self) -> Option<&str> {
        self.transaction_type.as_deref()
    }

    fn composite_key(&self) -> Option<CompositeKey> {
        keys::pick_key(self)
    }
}

impl Confirmation for RmaConfirmation {
    fn transaction_type(&self) -> Option<&str> {
        self.transaction_type.as_deref()
    }

    fn composite_key(&self) -> Option<CompositeKey> {
        keys::rma_key(self)
    }

    fn location_check(&self) -> Option<LocationCheck<'_>> {
        match RmaKind::classify(self.transaction_type.as_deref())? {
            RmaKind::Delivery => Some(LocationCheck {
                subinventory: self.delivered_subinventory.as_deref().unwrap_or(""),
                locator: self.delivered_locator().unwrap_or(""),
            }),
            RmaKind::Receipt => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    Unroutable,
    DuplicateInBatch,
    AlreadyPersisted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    /// Rendered composite key, or the raw transaction type for unroutable lines.
    pub key: String,
    pub reason: RejectReason,
}

#[derive(Clone, Debug)]
pub struct BatchOutcome<R> {
    pub accepted: Vec<R>,
    pub rejected: Vec<Rejection>,
}

impl<R> BatchOutcome<R> {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// Splits a batch into records safe to insert and records to drop.
///
/// Records are visited strictly in input order and one store call at a time,
/// so the first occurrence of a key always wins. The seen-key set lives only
/// for one [`BatchFilter::partition`] call.
pub struct BatchFilter<'a> {
    log: &'a dyn TransactionLog,
    location: &'a LocationValidator,
    module: &'static str,
    correlation_id: &'a str,
}

impl<'a> BatchFilter<'a> {
    pub fn new(
        log: &'a dyn TransactionLog,
        location: &'a LocationValidator,
        module: &'static str,
        correlation_id: &'a str,
    ) -> Self {
        Self { log, location, module, correlation_id }
    }

    pub async fn partition<R, S>(
        &self,
        store: &S,
        batch: Vec<R>,
    ) -> Result<BatchOutcome<R>, IngestError>
    where
        R: Confirmation,
        S: ConfirmationStore<R> + ?Sized,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted = Vec::with_capacity(batch.len());
        let mut rejected = Vec::new();

        for record in batch {
            if let Some(check) = record.location_check() {
                if let LocationVerdict::Invalid { message } =
                    self.location
                        .validate(check.subinventory, check.locator, self.correlation_id)
                        .await
                {
                    warn!(
                        event_name = "ingest.batch.location_rejected",
                        correlation_id = self.correlation_id,
                        module = self.module,
                        subinventory = check.subinventory,
                        locator = check.locator,
                        reason = %message,
                        "location gate aborted batch"
                    );
                    return Err(IngestError::LocationInvalid { message });
                }
            }

            let Some(key) = record.composite_key() else {
                let transaction_type = record.transaction_type().unwrap_or("").to_string();
                self.reject(&mut rejected, transaction_type, RejectReason::Unroutable).await;
                continue;
            };

            let rendered = key.render();
            if seen.contains(&rendered) {
                self.reject(&mut rejected, rendered, RejectReason::DuplicateInBatch).await;
                continue;
            }

            if store.count_matching(&key).await? == 0 {
                seen.insert(rendered);
                accepted.push(record);
            } else {
                self.reject(&mut rejected, rendered, RejectReason::AlreadyPersisted).await;
            }
        }

        Ok(BatchOutcome { accepted, rejected })
    }

    async fn reject(&self, rejected: &mut Vec<Rejection>, key: String, reason: RejectReason) {
        info!(
            event_name = "ingest.batch.rejected",
            correlation_id = self.correlation_id,
            module = self.module,
            key = %key,
            reason = ?reason,
            "confirmation dropped"
        );
        if let Err(write_error) =
            self.log.append(TransactionLogEntry::new(self.module, key.clone())).await
        {
            error!(
                event_name = "ingest.batch.rejection_log_failed",
                correlation_id = self.correlation_id,
                module = self.module,
                error = %write_error,
                "failed to record dropped confirmation"
            );
        }
        rejected.push(Rejection { key, reason });
    }
}
