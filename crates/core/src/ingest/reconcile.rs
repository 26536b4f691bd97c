use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::confirmation::{MoConfirmation, PickConfirmation, RmaConfirmation};
use crate::domain::response::ApiResponse;
use crate::errors::StoreError;
use crate::ingest::ports::PickStore;

/// Per delivery detail: quantity the order side says was picked, and how many
/// pick lines this submission carried. Built from the lines as submitted,
/// before duplicate filtering, and dropped once the outcome is known.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrossValidationTally {
    required: BTreeMap<i64, Decimal>,
    pick_lines: BTreeMap<i64, i64>,
    unjoinable: usize,
}

impl CrossValidationTally {
    pub fn for_mo(orders: &[MoConfirmation], picks: &[PickConfirmation]) -> Self {
        let mut tally = Self::default();
        for order in orders.iter().filter(|order| order.reconcile_flagged()) {
            tally.require(order.delivery_detail_id, order.picked_quantity);
        }
        tally.count_picks(picks);
        tally
    }

    /// RMA lines carry their delivery detail in a site-specific attribute slot.
    /// Without a configured slot the RMA side contributes nothing.
    pub fn for_rma(
        returns: &[RmaConfirmation],
        join_slot: Option<u8>,
        picks: &[PickConfirmation],
    ) -> Self {
        let mut tally = Self::default();
        if let Some(slot) = join_slot {
            for line in returns.iter().filter(|line| line.reconcile_flagged()) {
                let join_key =
                    line.attributes.slot(slot).and_then(|raw| raw.trim().parse::<i64>().ok());
                tally.require(join_key, line.delivered_quantity);
            }
        }
        tally.count_picks(picks);
        tally
    }

    fn require(&mut self, delivery_detail_id: Option<i64>, quantity: Option<Decimal>) {
        let Some(delivery_detail_id) = delivery_detail_id else {
            self.unjoinable += 1;
            return;
        };
        *self.required.entry(delivery_detail_id).or_insert(Decimal::ZERO) +=
            quantity.unwrap_or(Decimal::ZERO);
    }

    fn count_picks(&mut self, picks: &[PickConfirmation]) {
        for pick in picks {
            if let Some(delivery_detail_id) = pick.delivery_detail_id {
                *self.pick_lines.entry(delivery_detail_id).or_insert(0) += 1;
            }
        }
    }

    pub fn required(&self) -> &BTreeMap<i64, Decimal> {
        &self.required
    }

    pub fn pick_lines(&self) -> &BTreeMap<i64, i64> {
        &self.pick_lines
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub checked: usize,
    pub mismatched: Vec<i64>,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.mismatched.is_empty()
    }

    pub fn into_response(self) -> ApiResponse {
        if self.is_consistent() {
            ApiResponse::created()
        } else {
            ApiResponse::mismatch()
        }
    }
}

/// Compares required quantities against the pick table as persisted, across
/// all submissions. Every key is checked even after a mismatch is found.
pub struct CrossValidator<'a> {
    picks: &'a dyn PickStore,
    correlation_id: &'a str,
}

impl<'a> CrossValidator<'a> {
    pub fn new(picks: &'a dyn PickStore, correlation_id: &'a str) -> Self {
        Self { picks, correlation_id }
    }

    pub async fn reconcile(
        &self,
        tally: &CrossValidationTally,
    ) -> Result<Reconciliation, StoreError> {
        let mut report = Reconciliation::default();
        debug!(
            event_name = "ingest.reconcile.tally",
            correlation_id = self.correlation_id,
            required_keys = tally.required.len(),
            submitted_pick_keys = tally.pick_lines.len(),
            unjoinable_lines = tally.unjoinable,
            "cross validation tally built"
        );

        for (delivery_detail_id, required) in &tally.required {
            let persisted = self.picks.count_for_delivery_detail(*delivery_detail_id).await?;
            report.checked += 1;
            if Decimal::from(persisted) != *required {
                warn!(
                    event_name = "ingest.reconcile.mismatch",
                    correlation_id = self.correlation_id,
                    delivery_detail_id,
                    required = %required,
                    persisted,
                    "pick count does not match required quantity"
                );
                report.mismatched.push(*delivery_detail_id);
            }
        }

        Ok(report)
    }
}
