use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::audit::{modules, TransactionLog, TransactionLogEntry};
use crate::domain::confirmation::{
    MoConfirmation, MoPickSubmission, PickConfirmation, RmaConfirmation, RmaPickSubmission,
};
use crate::domain::response::ApiResponse;
use crate::errors::IngestError;
use crate::ingest::decoder::{DecodeMode, ResponseDecoder};
use crate::ingest::filter::{BatchFilter, Confirmation};
use crate::ingest::gate::{GatedTable, IngestionGate};
use crate::ingest::location::LocationValidator;
use crate::ingest::ports::{
    ConfirmationStore, LocationProcedure, PickStore, QuickPickProcedure,
};
use crate::ingest::reconcile::{CrossValidationTally, CrossValidator};

/// Collaborators the service drives.
#[derive(Clone)]
pub struct IngestionPorts {
    pub mo: Arc<dyn ConfirmationStore<MoConfirmation>>,
    pub picks: Arc<dyn PickStore>,
    pub rma: Arc<dyn ConfirmationStore<RmaConfirmation>>,
    pub log: Arc<dyn TransactionLog>,
    pub location: Arc<dyn LocationProcedure>,
    pub quick_pick: Arc<dyn QuickPickProcedure>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestionSettings {
    pub serialize_batches: bool,
    pub decode_mode: DecodeMode,
    /// Attribute slot holding the delivery detail on RMA lines, if any.
    pub rma_join_attribute: Option<u8>,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self { serialize_batches: true, decode_mode: DecodeMode::Legacy, rma_join_attribute: None }
    }
}

#[derive(Clone)]
pub struct ConfirmationService {
    ports: IngestionPorts,
    location: LocationValidator,
    gate: IngestionGate,
    decoder: ResponseDecoder,
    rma_join_attribute: Option<u8>,
}

impl ConfirmationService {
    pub fn new(ports: IngestionPorts, settings: IngestionSettings) -> Self {
        Self {
            location: LocationValidator::new(ports.location.clone()),
            gate: IngestionGate::new(settings.serialize_batches),
            decoder: ResponseDecoder::new(settings.decode_mode),
            rma_join_attribute: settings.rma_join_attribute,
            ports,
        }
    }

    pub async fn insert_mo(&self, batch: Vec<MoConfirmation>) -> ApiResponse {
        let op = self.begin(modules::MO_CONFIRM, &batch).await;
        let result = async {
            let _gate = self.gate.enter(&[GatedTable::Mo]).await;
            let committed =
                self.filter_and_commit(&*self.ports.mo, batch, modules::MO_CONFIRM, &op).await?;
            Ok::<_, IngestError>(ApiResponse::ok(rows_value(&committed)))
        }
        .await;
        self.finish(op, result).await
    }

    pub async fn insert_picks(&self, batch: Vec<PickConfirmation>) -> ApiResponse {
        let op = self.begin(modules::PICK_CONFIRM, &batch).await;
        let result = async {
            let _gate = self.gate.enter(&[GatedTable::Pick]).await;
            let committed =
                self.filter_and_commit(&*self.ports.picks, batch, modules::PO_CONFIRM, &op).await?;
            Ok::<_, IngestError>(ApiResponse::ok(rows_value(&committed)))
        }
        .await;
        self.finish(op, result).await
    }

    pub async fn insert_rma(&self, batch: Vec<RmaConfirmation>) -> ApiResponse {
        let op = self.begin(modules::RMA_INSERT, &batch).await;
        let result = async {
            let _gate = self.gate.enter(&[GatedTable::Rma]).await;
            let committed =
                self.filter_and_commit(&*self.ports.rma, batch, modules::RMA_CONFIRM, &op).await?;
            Ok::<_, IngestError>(ApiResponse::ok(rows_value(&committed)))
        }
        .await;
        self.finish(op, result).await
    }

    /// Orders first, then picks, then reconciliation against the pick table.
    /// The tally covers every submitted line, including ones dropped as duplicates.
    pub async fn insert_mo_pick(&self, submission: MoPickSubmission) -> ApiResponse {
        let op = self.begin(modules::MO_PICK_CONFIRM, &submission).await;
        let result = async {
            let _gate = self.gate.enter(&[GatedTable::Mo, GatedTable::Pick]).await;
            let tally = CrossValidationTally::for_mo(
                &submission.mo_confirms,
                &submission.pick_confirmations,
            );
            self.filter_and_commit(
                &*self.ports.mo,
                submission.mo_confirms,
                modules::MO_QUICK_CONFIRM,
                &op,
            )
            .await?;
            self.filter_and_commit(
                &*self.ports.picks,
                submission.pick_confirmations,
                modules::PO_QUICK_CONFIRM,
                &op,
            )
            .await?;

            let report = CrossValidator::new(&*self.ports.picks, &op.correlation_id)
                .reconcile(&tally)
                .await?;
            Ok::<_, IngestError>(report.into_response())
        }
        .await;
        self.finish(op, result).await
    }

    /// Return lines first (including the locator gate), then picks, then
    /// reconciliation keyed by the configured join attribute.
    pub async fn insert_rma_pick(&self, submission: RmaPickSubmission) -> ApiResponse {
        let op = self.begin(modules::ITEM_CHECK_DISPATCH, &submission).await;
        let result = async {
            let _gate = self.gate.enter(&[GatedTable::Pick, GatedTable::Rma]).await;
            let tally = CrossValidationTally::for_rma(
                &submission.rma_confirm,
                self.rma_join_attribute,
                &submission.pick_confirm,
            );
            self.filter_and_commit(
                &*self.ports.rma,
                submission.rma_confirm,
                modules::RMA_CONFIRM,
                &op,
            )
            .await?;
            self.filter_and_commit(
                &*self.ports.picks,
                submission.pick_confirm,
                modules::PO_QUICK_CONFIRM,
                &op,
            )
            .await?;

            let report = CrossValidator::new(&*self.ports.picks, &op.correlation_id)
                .reconcile(&tally)
                .await?;
            Ok::<_, IngestError>(report.into_response())
        }
        .await;
        self.finish(op, result).await
    }

    /// Forwards the raw payload to the quick-pick procedure and decodes its
    /// two output parameters.
    pub async fn quick_pick(&self, payload: Value) -> ApiResponse {
        let op = self.begin(modules::MO_QUICK_PICK_JSON, &payload).await;
        let result = match self.ports.quick_pick.submit(&payload).await {
            Ok(output) => Ok(self.decoder.decode(&output)),
            Err(store_error) => Err(IngestError::from(store_error)),
        };
        self.finish(op, result).await
    }

    pub async fn list_mo(&self) -> ApiResponse {
        list::<MoConfirmation, _>(&*self.ports.mo, "mo_confirmation").await
    }

    pub async fn list_picks(&self) -> ApiResponse {
        list::<PickConfirmation, _>(&*self.ports.picks, "pick_confirmation").await
    }

    pub async fn list_rma(&self) -> ApiResponse {
        list::<RmaConfirmation, _>(&*self.ports.rma, "rma_confirmation").await
    }

    async fn filter_and_commit<R, S>(
        &self,
        store: &S,
        batch: Vec<R>,
        rejection_module: &'static str,
        op: &Operation,
    ) -> Result<Vec<R>, IngestError>
    where
        R: Confirmation,
        S: ConfirmationStore<R> + ?Sized,
    {
        let submitted = batch.len();
        let outcome =
            BatchFilter::new(&*self.ports.log, &self.location, rejection_module, &op.correlation_id)
                .partition(store, batch)
                .await?;

        info!(
            event_name = "ingest.batch.filtered",
            correlation_id = %op.correlation_id,
            module = rejection_module,
            submitted,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "batch partitioned"
        );

        if outcome.accepted.is_empty() {
            return Ok(Vec::new());
        }
        Ok(store.commit_all(outcome.accepted).await?)
    }

    async fn begin<T: Serialize + ?Sized>(&self, module: &'static str, request: &T) -> Operation {
        let correlation_id = Uuid::new_v4().to_string();
        let request = serde_json::to_string(request).unwrap_or_default();
        let log_id = match self.ports.log.append(TransactionLogEntry::new(module, request)).await {
            Ok(id) => Some(id),
            Err(log_error) => {
                error!(
                    event_name = "ingest.log.open_failed",
                    correlation_id = %correlation_id,
                    module,
                    error = %log_error,
                    "failed to open transaction log entry"
                );
                None
            }
        };
        Operation { module, correlation_id, log_id }
    }

    async fn finish(&self, op: Operation, result: Result<ApiResponse, IngestError>) -> ApiResponse {
        let response = match result {
            Ok(response) => response,
            Err(ingest_error) => {
                error!(
                    event_name = "ingest.operation.failed",
                    correlation_id = %op.correlation_id,
                    module = op.module,
                    status = ingest_error.status(),
                    error = %ingest_error,
                    "confirmation operation failed"
                );
                ApiResponse::from(&ingest_error)
            }
        };

        info!(
            event_name = "ingest.operation.completed",
            correlation_id = %op.correlation_id,
            module = op.module,
            status = response.status,
            "confirmation operation completed"
        );

        if let Some(log_id) = op.log_id {
            let serialized = serde_json::to_string(&response).unwrap_or_default();
            if let Err(log_error) = self.ports.log.set_response(log_id, serialized).await {
                error!(
                    event_name = "ingest.log.close_failed",
                    correlation_id = %op.correlation_id,
                    module = op.module,
                    error = %log_error,
                    "failed to record operation response"
                );
            }
        }

        response
    }
}

struct Operation {
    module: &'static str,
    correlation_id: String,
    log_id: Option<i64>,
}

async fn list<R, S>(store: &S, table: &'static str) -> ApiResponse
where
    R: Serialize + Send + 'static,
    S: ConfirmationStore<R> + ?Sized,
{
    match store.list_all().await {
        Ok(rows) => ApiResponse::ok(rows_value(&rows)),
        Err(store_error) => {
            error!(
                event_name = "ingest.list.failed",
                correlation_id = table,
                error = %store_error,
                "failed to list confirmations"
            );
            ApiResponse::from(&IngestError::from(store_error))
        }
    }
}

fn rows_value<T: Serialize>(rows: &[T]) -> Value {
    serde_json::to_value(rows).unwrap_or_else(|encode_error| {
        error!(
            event_name = "ingest.response.encode_failed",
            correlation_id = "response",
            error = %encode_error,
            "failed to encode committed rows"
        );
        Value::Array(Vec::new())
    })
}
