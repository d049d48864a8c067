//! Handlers for request submission, moderation, and export.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/requests/{kind}` | Body: kind-specific payload; 201 + request |
//! | `GET`  | `/requests/{kind}` | `?status=&q=&sort=&direction=`; admins see all, owners their own |
//! | `GET`  | `/requests/{kind}/export.csv` | Admin-only CSV of the same filtered set |
//! | `GET`  | `/requests/{kind}/{id}` | Admin or owning user |
//! | `PUT`  | `/decisions/{id}` | Body: `{"verdict":"approved","feedback":"..."}` |
//! | `POST` | `/decisions` | Body: `{"ids":[...],"verdict":...,"feedback":...}`; per-item outcomes |
//! | `POST` | `/materializations/{id}` | Admin retry for a failed materialization |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use gavel_core::{
  bulk::{self, BulkItemOutcome},
  decision::{self, DecisionOutcome},
  materialize::{self, Materialized},
  query,
  request::{Request, RequestKind, RequestPayload, RequestStatus, Verdict},
  store::{RequestQuery, RequestStore, SortDirection, SortField},
  submission,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{claims::ActorClaims, error::ApiError};

// ─── Owner-facing serialisation ──────────────────────────────────────────────

/// What a request owner sees: terminal status and feedback, never the
/// internal materialization bookkeeping or the deciding admin.
#[derive(Debug, Serialize)]
pub struct OwnerRequestView {
  pub request_id:     Uuid,
  pub kind:           RequestKind,
  pub status:         RequestStatus,
  pub payload:        RequestPayload,
  pub admin_feedback: Option<String>,
  pub created_at:     DateTime<Utc>,
  pub decided_at:     Option<DateTime<Utc>>,
}

impl From<&Request> for OwnerRequestView {
  fn from(request: &Request) -> Self {
    OwnerRequestView {
      request_id:     request.request_id,
      kind:           request.kind(),
      status:         request.status,
      payload:        request.payload.clone(),
      admin_feedback: request.admin_feedback.clone(),
      created_at:     request.created_at,
      decided_at:     request.decided_at,
    }
  }
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// `POST /requests/{kind}` — body is the kind-specific payload object.
pub async fn submit<S>(
  State(store): State<Arc<S>>,
  Path(kind): Path<RequestKind>,
  claims: ActorClaims,
  Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RequestStore,
{
  let payload = RequestPayload::from_parts(kind.as_str(), body)
    .map_err(|e| ApiError::BadRequest(format!("invalid {} payload: {e}", kind.as_str())))?;

  let request =
    submission::submit(store.as_ref(), claims.user_ref(), payload).await?;
  Ok((StatusCode::CREATED, Json(OwnerRequestView::from(&request))))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:    Option<RequestStatus>,
  /// Free-text filter over name, description, owner name, and owner email.
  pub q:         Option<String>,
  #[serde(default)]
  pub sort:      SortField,
  #[serde(default)]
  pub direction: SortDirection,
}

impl ListParams {
  fn into_query(self) -> RequestQuery {
    RequestQuery {
      status: self.status,
      search: self.q,
      sort: self.sort,
      direction: self.direction,
      ..Default::default()
    }
  }
}

/// `GET /requests/{kind}?status=&q=&sort=&direction=`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(kind): Path<RequestKind>,
  Query(params): Query<ListParams>,
  claims: ActorClaims,
) -> Result<Response, ApiError>
where
  S: RequestStore,
{
  let records =
    query::list(store.as_ref(), &claims.actor, kind, params.into_query())
      .await?;

  if claims.actor.is_admin() {
    return Ok(Json(records).into_response());
  }
  let views: Vec<OwnerRequestView> =
    records.iter().map(|r| OwnerRequestView::from(&r.request)).collect();
  Ok(Json(views).into_response())
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /requests/{kind}/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path((kind, id)): Path<(RequestKind, Uuid)>,
  claims: ActorClaims,
) -> Result<Response, ApiError>
where
  S: RequestStore,
{
  let request = store
    .get_request(id)
    .await
    .map_err(ApiError::from)?
    .filter(|r| r.kind() == kind)
    .ok_or_else(|| ApiError::NotFound(format!("request {id} not found")))?;

  if claims.actor.is_admin() {
    return Ok(Json(request).into_response());
  }
  // Owners see their own; anyone else learns nothing about the id.
  if request.owner_id == claims.actor.actor_id {
    return Ok(Json(OwnerRequestView::from(&request)).into_response());
  }
  Err(ApiError::NotFound(format!("request {id} not found")))
}

// ─── Export ──────────────────────────────────────────────────────────────────

/// `GET /requests/{kind}/export.csv` — admin-only, same filters as the list.
pub async fn export_csv<S>(
  State(store): State<Arc<S>>,
  Path(kind): Path<RequestKind>,
  Query(params): Query<ListParams>,
  claims: ActorClaims,
) -> Result<Response, ApiError>
where
  S: RequestStore,
{
  let records =
    query::list(store.as_ref(), &claims.actor, kind, params.into_query())
      .await?;
  let csv = gavel_export::requests_to_csv(&claims.actor, kind, &records)?;

  Ok(
    (
      [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
      csv,
    )
      .into_response(),
  )
}

// ─── Decide ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DecideBody {
  pub verdict:  Verdict,
  #[serde(default)]
  pub feedback: String,
}

/// `PUT /decisions/{id}` — apply one verdict; the materialization outcome is
/// reported separately in the response body.
pub async fn decide_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  claims: ActorClaims,
  Json(body): Json<DecideBody>,
) -> Result<Json<DecisionOutcome>, ApiError>
where
  S: RequestStore,
{
  let outcome = decision::decide(
    store.as_ref(),
    id,
    body.verdict,
    body.feedback,
    &claims.actor,
  )
  .await?;
  Ok(Json(outcome))
}

// ─── Bulk decide ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub ids:      Vec<Uuid>,
  pub verdict:  Verdict,
  #[serde(default)]
  pub feedback: String,
}

/// Aggregate view the moderation UI renders: how many applied, plus every
/// item's own outcome.
#[derive(Debug, Serialize)]
pub struct BulkResponse {
  pub applied:  usize,
  pub failed:   usize,
  pub outcomes: Vec<BulkItemOutcome>,
}

/// `POST /decisions` — item failures never fail the batch.
pub async fn decide_many<S>(
  State(store): State<Arc<S>>,
  claims: ActorClaims,
  Json(body): Json<BulkBody>,
) -> Result<Json<BulkResponse>, ApiError>
where
  S: RequestStore,
{
  let outcomes = bulk::decide_many(
    store.as_ref(),
    &body.ids,
    body.verdict,
    &body.feedback,
    &claims.actor,
    bulk::DEFAULT_MAX_IN_FLIGHT,
  )
  .await?;

  let applied = outcomes.iter().filter(|o| o.ok).count();
  Ok(Json(BulkResponse {
    applied,
    failed: outcomes.len() - applied,
    outcomes,
  }))
}

// ─── Materialization retry ───────────────────────────────────────────────────

/// `POST /materializations/{id}` — explicit admin retry for an approved
/// request whose entity was never created.
pub async fn materialize_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  claims: ActorClaims,
) -> Result<Json<Materialized>, ApiError>
where
  S: RequestStore,
{
  claims.actor.require_admin().map_err(ApiError::from)?;
  let outcome = materialize::materialize(store.as_ref(), id).await?;
  Ok(Json(outcome))
}
