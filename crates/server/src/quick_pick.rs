use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{info, warn};

use wms_core::config::ProcedureConfig;
use wms_core::errors::StoreError;
use wms_core::ingest::{QuickPickOutput, QuickPickProcedure};

/// Quick-pick procedure exposed over HTTP. The payload is posted verbatim and
/// the endpoint answers `{"P_MES": .., "P_MES2": ..}`.
pub struct HttpQuickPickProcedure {
    client: Client,
    endpoint: Option<String>,
    token: Option<SecretString>,
}

impl std::fmt::Debug for HttpQuickPickProcedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpQuickPickProcedure")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpQuickPickProcedure {
    pub fn from_config(config: &ProcedureConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs.max(1))).build()?;
        Ok(Self {
            client,
            endpoint: config.quick_pick_url.clone(),
            token: config.quick_pick_token.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl QuickPickProcedure for HttpQuickPickProcedure {
    async fn submit(&self, payload: &Value) -> Result<QuickPickOutput, StoreError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Err(StoreError::Procedure("quick-pick endpoint is not configured".to_string()));
        };

        let mut request = self.client.post(endpoint).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| StoreError::Procedure(format!("quick-pick call failed: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "procedure.quick_pick.rejected",
                correlation_id = "quick_pick",
                status = status.as_u16(),
                "quick-pick endpoint answered with an error status"
            );
            return Err(StoreError::Procedure(format!("quick-pick endpoint returned {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| StoreError::Procedure(format!("quick-pick body unreadable: {error}")))?;
        info!(
            event_name = "procedure.quick_pick.completed",
            correlation_id = "quick_pick",
            "quick-pick procedure answered"
        );
        Ok(output_from_body(&body))
    }
}

/// Strings are taken verbatim, null or missing values stay absent, anything
/// else is rendered as JSON text.
pub fn output_from_body(body: &Value) -> QuickPickOutput {
    QuickPickOutput { p_mes: render(body.get("P_MES")), p_mes2: render(body.get("P_MES2")) }
}

fn render(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
