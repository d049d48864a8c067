//! Bulk decisions — one verdict applied to many requests independently.
//!
//! The coordinator fans out one guarded decision per id with bounded
//! concurrency and never aborts the batch: every item's outcome is reported
//! individually, in input order.

use futures::{StreamExt as _, stream};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  Result,
  actor::Actor,
  decision::decide,
  request::Verdict,
  store::RequestStore,
};

/// Upper bound on in-flight decisions per batch. Each item is an independent
/// transition, so the limit only protects the store from oversized batches.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Per-item outcome of [`decide_many`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemOutcome {
  pub request_id:   Uuid,
  pub ok:           bool,
  /// `true` when the item was approved and its entity was created.
  pub materialized: bool,
  pub error:        Option<String>,
}

/// Apply `verdict` to every id in `ids`.
///
/// Item failures (unknown id, already decided, failed materialization) are
/// embedded in the result list; only a missing admin role fails the whole
/// call. Outcomes are returned in the order the ids were given.
pub async fn decide_many<S: RequestStore>(
  store: &S,
  ids: &[Uuid],
  verdict: Verdict,
  feedback: &str,
  actor: &Actor,
  max_in_flight: usize,
) -> Result<Vec<BulkItemOutcome>> {
  actor.require_admin()?;

  let limit = max_in_flight.max(1);
  let mut indexed: Vec<(usize, BulkItemOutcome)> =
    stream::iter(ids.iter().copied().enumerate().map(|(index, id)| {
      async move {
        let outcome =
          match decide(store, id, verdict, feedback.to_string(), actor).await {
            Ok(decision) => BulkItemOutcome {
              request_id:   id,
              ok:           true,
              materialized: decision.materialized,
              error:        decision.materialization_error,
            },
            Err(err) => BulkItemOutcome {
              request_id:   id,
              ok:           false,
              materialized: false,
              error:        Some(err.to_string()),
            },
          };
        (index, outcome)
      }
    }))
    .buffer_unordered(limit)
    .collect()
    .await;

  // `buffer_unordered` yields in completion order; callers get input order.
  indexed.sort_by_key(|(index, _)| *index);
  let outcomes: Vec<BulkItemOutcome> =
    indexed.into_iter().map(|(_, outcome)| outcome).collect();

  let applied = outcomes.iter().filter(|o| o.ok).count();
  info!(
    total = outcomes.len(),
    applied,
    verdict = ?verdict,
    "bulk decision finished"
  );
  Ok(outcomes)
}
