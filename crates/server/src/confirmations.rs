use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::warn;

use wms_core::domain::confirmation::{
    MoConfirmation, MoPickSubmission, PickConfirmation, RmaConfirmation, RmaPickSubmission,
};
use wms_core::domain::response::ApiResponse;
use wms_core::ingest::ConfirmationService;

type Reply = (StatusCode, Json<ApiResponse>);

pub fn router(service: ConfirmationService) -> Router {
    Router::new()
        .route("/mo/confirm/insertmo", post(insert_mo))
        .route("/mo/confirm/getallmo", get(list_mo))
        .route("/mo/confirm/insertpick", post(insert_picks))
        .route("/mo/confirm/getallpick", get(list_picks))
        .route("/mo/confirm/insertMoQuickPickJson", post(quick_pick))
        .route("/mo/confirm/insertmopick", post(insert_mo_pick))
        .route("/rma/confirm/insertmo", post(insert_rma))
        .route("/rma/confirm/getallmo", get(list_rma))
        .route("/rma/confirm/rmainsertmo", post(insert_rma_pick))
        .with_state(service)
}

/// HTTP status mirrors the body's `status`.
fn reply(response: ApiResponse) -> Reply {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

fn rejected_body(rejection: JsonRejection) -> Reply {
    warn!(
        event_name = "http.request.rejected",
        correlation_id = "http",
        error = %rejection,
        "request body could not be decoded"
    );
    reply(ApiResponse::failure(rejection.status().as_u16(), rejection.body_text()))
}

async fn insert_mo(
    State(service): State<ConfirmationService>,
    body: Result<Json<Vec<MoConfirmation>>, JsonRejection>,
) -> Reply {
    match body {
        Ok(Json(batch)) => reply(service.insert_mo(batch).await),
        Err(rejection) => rejected_body(rejection),
    }
}

async fn insert_picks(
    State(service): State<ConfirmationService>,
    body: Result<Json<Vec<PickConfirmation>>, JsonRejection>,
) -> Reply {
    match body {
        Ok(Json(batch)) => reply(service.insert_picks(batch).await),
        Err(rejection) => rejected_body(rejection),
    }
}

async fn insert_rma(
    State(service): State<ConfirmationService>,
    body: Result<Json<Vec<RmaConfirmation>>, JsonRejection>,
) -> Reply {
    match body {
        Ok(Json(batch)) => reply(service.insert_rma(batch).await),
        Err(rejection) => rejected_body(rejection),
    }
}

async fn insert_mo_pick(
    State(service): State<ConfirmationService>,
    body: Result<Json<MoPickSubmission>, JsonRejection>,
) -> Reply {
    match body {
        Ok(Json(submission)) => reply(service.insert_mo_pick(submission).await),
        Err(rejection) => rejected_body(rejection),
    }
}

async fn insert_rma_pick(
    State(service): State<ConfirmationService>,
    body: Result<Json<RmaPickSubmission>, JsonRejection>,
) -> Reply {
    match body {
        Ok(Json(submission)) => reply(service.insert_rma_pick(submission).await),
        Err(rejection) => rejected_body(rejection),
    }
}

async fn quick_pick(
    State(service): State<ConfirmationService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Reply {
    match body {
        Ok(Json(payload)) => reply(service.quick_pick(payload).await),
        Err(rejection) => rejected_body(rejection),
    }
}

async fn list_mo(State(service): State<ConfirmationService>) -> Reply {
    reply(service.list_mo().await)
}

async fn list_picks(State(service): State<ConfirmationService>) -> Reply {
    reply(service.list_picks().await)
}

async fn list_rma(State(service): State<ConfirmationService>) -> Reply {
    reply(service.list_rma().await)
}
