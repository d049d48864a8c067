//! Handlers for the owner-facing KYC status endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/kyc/status` | The caller's own verification state |

use std::sync::Arc;

use axum::{Json, extract::State};
use gavel_core::{
  query::{self, KycStatusRecord},
  store::RequestStore,
};

use crate::{claims::ActorClaims, error::ApiError};

/// `GET /kyc/status` — `not_submitted` until a KYC request exists.
pub async fn status<S>(
  State(store): State<Arc<S>>,
  claims: ActorClaims,
) -> Result<Json<KycStatusRecord>, ApiError>
where
  S: RequestStore,
{
  let record =
    query::kyc_status(store.as_ref(), claims.actor.actor_id).await?;
  Ok(Json(record))
}
