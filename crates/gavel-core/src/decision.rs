//! The decision engine — apply an admin verdict to exactly one request.
//!
//! The status transition and the follow-on materialization are separately
//! reported: a caller can always distinguish "decision recorded,
//! materialization pending/failed" from "decision rejected outright".

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Result,
  actor::Actor,
  materialize::materialize,
  request::{Request, Verdict},
  store::RequestStore,
};

/// Result of [`decide`]: the updated request plus the separately-reported
/// materialization outcome. `materialization_error` is internal detail for
/// the admin surface; owners only ever see status and feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOutcome {
  pub request:               Request,
  pub materialized:          bool,
  pub materialization_error: Option<String>,
}

/// Apply `verdict` to the pending request `id`.
///
/// `feedback` is always recorded, even when empty and even for approvals, so
/// the audit trail is complete. The transition is linearizable: of two
/// concurrent calls, exactly one succeeds and the other observes
/// [`crate::Error::AlreadyDecided`].
///
/// On approval, materialization runs best-effort: its failure is reported in
/// the outcome and on the record's `materialization` field, never by
/// reverting the approval.
pub async fn decide<S: RequestStore>(
  store: &S,
  id: Uuid,
  verdict: Verdict,
  feedback: String,
  actor: &Actor,
) -> Result<DecisionOutcome> {
  actor.require_admin()?;

  let request = store
    .decide_request(id, verdict, feedback, actor.actor_id)
    .await?;
  info!(
    request_id = %id,
    verdict = ?verdict,
    decided_by = %actor.actor_id,
    "decision recorded"
  );

  if verdict != Verdict::Approved {
    return Ok(DecisionOutcome {
      request,
      materialized: false,
      materialization_error: None,
    });
  }

  let (materialized, materialization_error) = match materialize(store, id).await
  {
    Ok(_) => (true, None),
    Err(err) => {
      warn!(request_id = %id, error = %err, "approval stands, materialization failed");
      (false, Some(err.to_string()))
    }
  };

  // Re-read so the outcome reflects the recorded materialization status.
  let request = store.get_request(id).await?.unwrap_or(request);

  Ok(DecisionOutcome { request, materialized, materialization_error })
}
