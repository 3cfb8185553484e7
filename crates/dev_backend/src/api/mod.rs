use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    domain::RecordId,
    error::{ApiError, ErrorCode},
    protocol::ResponseEnvelope,
};
use tracing::info;

use crate::store::{ActionItem, ItemStatus, RevisionRequest, RevisionStatus, Store, VisualTest};

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<Store>,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionBody {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemBody {
    pub id: RecordId,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub revrequestid: RecordId,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevisionFilter {
    pub status: Option<RevisionStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
}

pub async fn get_visual_test(ctx: &ApiContext, id: i64) -> Result<VisualTest, ApiError> {
    ctx.store
        .visual_test(id)
        .await
        .ok_or_else(|| ApiError::not_found("Visual test not found"))
}

pub async fn list_visual_tests(ctx: &ApiContext) -> Vec<VisualTest> {
    ctx.store.visual_tests().await
}

pub async fn add_visual_test(ctx: &ApiContext, description: &str) -> Result<VisualTest, ApiError> {
    let description = required(description, "Description")?;
    if ctx
        .store
        .find_visual_test_by_description(description)
        .await
        .is_some()
    {
        return Err(ApiError::conflict("Visual test already exists"));
    }
    Ok(ctx.store.insert_visual_test(description).await)
}

pub async fn update_visual_test(
    ctx: &ApiContext,
    id: i64,
    description: &str,
) -> Result<VisualTest, ApiError> {
    let description = required(description, "Description")?;
    if let Some(existing) = ctx.store.find_visual_test_by_description(description).await {
        if existing.id != id {
            return Err(ApiError::conflict("Visual test already exists"));
        }
    }
    ctx.store
        .update_visual_test(id, description)
        .await
        .ok_or_else(|| ApiError::not_found("Visual test not found"))
}

pub async fn list_revision_requests(
    ctx: &ApiContext,
    status: Option<RevisionStatus>,
) -> Vec<RevisionRequest> {
    ctx.store
        .revision_requests()
        .await
        .into_iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect()
}

/// Closes a pending revision request as approved or rejected.
pub async fn decide_revision_request(
    ctx: &ApiContext,
    id: i64,
    decision: RevisionStatus,
    reason: &str,
    remark: &str,
) -> Result<RevisionRequest, ApiError> {
    if decision == RevisionStatus::Pending {
        return Err(ApiError::validation("Decision must approve or reject"));
    }
    let reason = required(reason, "Reason")?.to_string();
    let remark = required(remark, "Remark")?.to_string();
    ctx.store
        .modify_revision_request(id, |request| {
            if request.status != RevisionStatus::Pending {
                return Err(ApiError::conflict("Revision request already closed"));
            }
            request.status = decision;
            request.reason = Some(reason);
            request.remark = Some(remark);
            request.decidedat = Some(Utc::now());
            Ok(request.clone())
        })
        .await
        .ok_or_else(|| ApiError::not_found("Revision request not found"))?
}

pub async fn list_action_items(ctx: &ApiContext, status: Option<ItemStatus>) -> Vec<ActionItem> {
    ctx.store
        .action_items()
        .await
        .into_iter()
        .filter(|i| status.map_or(true, |s| i.status == s))
        .collect()
}

pub async fn accept_action_item(ctx: &ApiContext, id: i64) -> Result<ActionItem, ApiError> {
    ctx.store
        .modify_action_item(id, |item| {
            if item.status != ItemStatus::Allotted {
                return Err(ApiError::conflict("Already accepted"));
            }
            item.status = ItemStatus::Accepted;
            item.updatedat = Some(Utc::now());
            Ok(item.clone())
        })
        .await
        .ok_or_else(|| ApiError::not_found("Action item not found"))?
}

pub async fn assign_action_item(ctx: &ApiContext, id: i64) -> Result<ActionItem, ApiError> {
    ctx.store
        .modify_action_item(id, |item| {
            if item.status == ItemStatus::Assigned {
                return Err(ApiError::conflict("Already assigned"));
            }
            item.status = ItemStatus::Assigned;
            item.updatedat = Some(Utc::now());
            Ok(item.clone())
        })
        .await
        .ok_or_else(|| ApiError::not_found("Action item not found"))?
}

fn required<'a>(value: &'a str, label: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{label} is required")));
    }
    Ok(value)
}

fn numeric_id(id: &RecordId) -> Result<i64, ApiError> {
    id.as_str()
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid id: {id}")))
}

type Reply = (StatusCode, Json<ResponseEnvelope>);

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: ApiError) -> Reply {
    info!(code = ?err.code, message = %err.message, "request rejected");
    (status_for(err.code), Json(err.into()))
}

fn data<T: Serialize>(value: &T) -> Reply {
    match serde_json::to_value(value) {
        Ok(value) => (StatusCode::OK, Json(ResponseEnvelope::ok_with_data(value))),
        Err(err) => failure(ApiError::new(ErrorCode::Internal, err.to_string())),
    }
}

fn done(message: &str) -> Reply {
    (StatusCode::OK, Json(ResponseEnvelope::ok(message)))
}

fn reply<T>(result: Result<T, ApiError>, message: &str) -> Reply {
    match result {
        Ok(_) => done(message),
        Err(err) => failure(err),
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

pub fn build_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/calibrationoperations/get-visualtest-byid/:id",
            get(http_get_visual_test),
        )
        .route(
            "/calibrationoperations/get-all-visualtest",
            get(http_list_visual_tests),
        )
        .route(
            "/calibrationoperations/add-visualtest",
            post(http_add_visual_test),
        )
        .route(
            "/calibrationoperations/update-visualtest/:id",
            post(http_update_visual_test),
        )
        .route(
            "/calibrationoperations/get-rev-requests",
            get(http_list_revision_requests),
        )
        .route(
            "/calibrationoperations/approve-rev-requests",
            post(http_approve_revision_request),
        )
        .route(
            "/calibrationoperations/reject-rev-requests",
            post(http_reject_revision_request),
        )
        .route("/actionitem/get-alloted-items", get(http_list_action_items))
        .route("/actionitem/accept-alloted-item", post(http_accept_action_item))
        .route("/actionitem/assign-alloted-item", post(http_assign_action_item))
        .with_state(Arc::new(ctx))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_get_visual_test(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<String>,
) -> Reply {
    let id = match numeric_id(&RecordId::new(id)) {
        Ok(id) => id,
        Err(err) => return failure(err),
    };
    match get_visual_test(&ctx, id).await {
        // The screens expect the record wrapped in a one-element list.
        Ok(test) => data(&[test]),
        Err(err) => failure(err),
    }
}

async fn http_list_visual_tests(State(ctx): State<Arc<ApiContext>>) -> Reply {
    data(&list_visual_tests(&ctx).await)
}

async fn http_add_visual_test(
    State(ctx): State<Arc<ApiContext>>,
    payload: Result<Json<DescriptionBody>, JsonRejection>,
) -> Reply {
    let result = match body(payload) {
        Ok(req) => add_visual_test(&ctx, &req.description).await,
        Err(err) => Err(err),
    };
    reply(result, "Visual test added successfully")
}

async fn http_update_visual_test(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<String>,
    payload: Result<Json<DescriptionBody>, JsonRejection>,
) -> Reply {
    let result = match (numeric_id(&RecordId::new(id)), body(payload)) {
        (Ok(id), Ok(req)) => update_visual_test(&ctx, id, &req.description).await,
        (Err(err), _) | (_, Err(err)) => Err(err),
    };
    reply(result, "Visual test updated successfully")
}

async fn http_list_revision_requests(
    State(ctx): State<Arc<ApiContext>>,
    Query(filter): Query<RevisionFilter>,
) -> Reply {
    data(&list_revision_requests(&ctx, filter.status).await)
}

async fn decide(
    ctx: &ApiContext,
    payload: Result<Json<DecisionBody>, JsonRejection>,
    decision: RevisionStatus,
) -> Result<RevisionRequest, ApiError> {
    let req = body(payload)?;
    let id = numeric_id(&req.revrequestid)?;
    decide_revision_request(ctx, id, decision, &req.reason, &req.remark).await
}

async fn http_approve_revision_request(
    State(ctx): State<Arc<ApiContext>>,
    payload: Result<Json<DecisionBody>, JsonRejection>,
) -> Reply {
    reply(
        decide(&ctx, payload, RevisionStatus::Approved).await,
        "Revision request approved",
    )
}

async fn http_reject_revision_request(
    State(ctx): State<Arc<ApiContext>>,
    payload: Result<Json<DecisionBody>, JsonRejection>,
) -> Reply {
    reply(
        decide(&ctx, payload, RevisionStatus::Rejected).await,
        "Revision request rejected",
    )
}

async fn http_list_action_items(
    State(ctx): State<Arc<ApiContext>>,
    Query(filter): Query<ItemFilter>,
) -> Reply {
    data(&list_action_items(&ctx, filter.status).await)
}

async fn item_action(
    ctx: &ApiContext,
    payload: Result<Json<ItemBody>, JsonRejection>,
    assign: bool,
) -> Result<ActionItem, ApiError> {
    let id = numeric_id(&body(payload)?.id)?;
    if assign {
        assign_action_item(ctx, id).await
    } else {
        accept_action_item(ctx, id).await
    }
}

async fn http_accept_action_item(
    State(ctx): State<Arc<ApiContext>>,
    payload: Result<Json<ItemBody>, JsonRejection>,
) -> Reply {
    reply(
        item_action(&ctx, payload, false).await,
        "Item accepted successfully",
    )
}

async fn http_assign_action_item(
    State(ctx): State<Arc<ApiContext>>,
    payload: Result<Json<ItemBody>, JsonRejection>,
) -> Reply {
    reply(
        item_action(&ctx, payload, true).await,
        "Item assigned successfully",
    )
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
