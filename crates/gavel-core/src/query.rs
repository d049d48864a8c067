//! Read-only facade over the request store for the moderation UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  actor::Actor,
  request::{RequestKind, RequestStatus},
  store::{RequestQuery, RequestRecord, RequestStore},
};

/// Filtered, sorted listing of one kind's requests.
///
/// Admins see everything; any other actor is scoped to their own requests
/// regardless of what the query asked for.
pub async fn list<S: RequestStore>(
  store: &S,
  actor: &Actor,
  kind: RequestKind,
  mut query: RequestQuery,
) -> Result<Vec<RequestRecord>> {
  if !actor.is_admin() {
    query.owner = Some(actor.actor_id);
  }
  store.search_requests(kind, &query).await
}

// ─── KYC status read model ───────────────────────────────────────────────────

/// The owner-facing verification state. `not_submitted` is the pre-creation
/// state, surfaced when no KYC record exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
  NotSubmitted,
  Pending,
  Approved,
  Rejected,
}

impl From<RequestStatus> for KycStatus {
  fn from(status: RequestStatus) -> Self {
    match status {
      RequestStatus::Pending => Self::Pending,
      RequestStatus::Approved => Self::Approved,
      RequestStatus::Rejected => Self::Rejected,
    }
  }
}

/// What an owner sees about their verification: the state, and the feedback
/// when a decision was made. Internal materialization detail never appears
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycStatusRecord {
  pub status:     KycStatus,
  pub feedback:   Option<String>,
  pub decided_at: Option<DateTime<Utc>>,
}

/// The owner's current verification state.
pub async fn kyc_status<S: RequestStore>(
  store: &S,
  owner_id: Uuid,
) -> Result<KycStatusRecord> {
  let record = match store.find_kyc_request(owner_id).await? {
    None => KycStatusRecord {
      status:     KycStatus::NotSubmitted,
      feedback:   None,
      decided_at: None,
    },
    Some(request) => KycStatusRecord {
      status:     request.status.into(),
      feedback:   request.admin_feedback,
      decided_at: request.decided_at,
    },
  };
  Ok(record)
}
