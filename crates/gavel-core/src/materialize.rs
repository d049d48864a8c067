//! Materialization — turn an approved request into a live platform entity.
//!
//! Isolated from the decision transition so a creation failure can never roll
//! an approval back. Idempotent per request: the existence check plus the
//! store's uniqueness constraint on `request_id` guarantee at most one
//! listing, and re-verifying an already-verified user is a no-op.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  listing::{Listing, ListingDetail, NewListing},
  request::{MaterializationStatus, Request, RequestPayload, RequestStatus},
  store::RequestStore,
};

/// What an approved request became.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Materialized {
  /// NFT, bond, and token approvals produce a listing.
  Listing(Listing),
  /// KYC approvals unlock the owner's capability flag instead.
  UserVerified { user_id: Uuid },
}

/// Materialize the approved request `request_id`.
///
/// Calling this again for an already-materialized request returns the
/// existing result without creating a duplicate; calling it for a request
/// whose previous attempt failed is the manual-retry path.
pub async fn materialize<S: RequestStore>(
  store: &S,
  request_id: Uuid,
) -> Result<Materialized> {
  let request = store
    .get_request(request_id)
    .await?
    .ok_or(Error::NotFound(request_id))?;

  if request.status != RequestStatus::Approved {
    return Err(Error::InvalidState { id: request_id, status: request.status });
  }

  let outcome = match &request.payload {
    RequestPayload::Kyc(_) => verify_owner(store, &request).await?,
    RequestPayload::Nft(p) => {
      create_listing(store, &request, ListingDetail::Nft(p.to_listing())).await?
    }
    RequestPayload::Bond(p) => {
      create_listing(store, &request, ListingDetail::Bond(p.to_listing())).await?
    }
    RequestPayload::Token(p) => {
      create_listing(store, &request, ListingDetail::Token(p.to_listing()))
        .await?
    }
  };

  store
    .set_materialization(request_id, MaterializationStatus::Done)
    .await?;
  info!(request_id = %request_id, "request materialized");
  Ok(outcome)
}

/// KYC path: flip the owner's `verified` flag.
async fn verify_owner<S: RequestStore>(
  store: &S,
  request: &Request,
) -> Result<Materialized> {
  let owner_id = request.owner_id;
  let user = store
    .get_user(owner_id)
    .await?
    .ok_or(Error::UserNotFound(owner_id))?;

  if !user.verified {
    if let Err(err) = store.set_user_verified(owner_id, true).await {
      mark_failed(store, request.request_id).await;
      return Err(Error::Materialization(err.to_string()));
    }
  }
  Ok(Materialized::UserVerified { user_id: owner_id })
}

/// Listing path: create the entity unless one already exists for the request.
async fn create_listing<S: RequestStore>(
  store: &S,
  request: &Request,
  detail: ListingDetail,
) -> Result<Materialized> {
  let request_id = request.request_id;

  if let Some(existing) = store.find_listing_for_request(request_id).await? {
    return Ok(Materialized::Listing(existing));
  }

  let input = NewListing {
    request_id,
    creator_id: request.owner_id,
    detail,
  };

  match store.create_listing(input).await {
    Ok(listing) => Ok(Materialized::Listing(listing)),
    Err(create_err) => {
      // A concurrent attempt may have won the uniqueness race; its listing
      // satisfies this call too.
      if let Ok(Some(existing)) =
        store.find_listing_for_request(request_id).await
      {
        return Ok(Materialized::Listing(existing));
      }
      mark_failed(store, request_id).await;
      Err(Error::Materialization(create_err.to_string()))
    }
  }
}

/// Record the failed attempt so it is observable and retryable. Best-effort:
/// the primary error is the one worth surfacing.
async fn mark_failed<S: RequestStore>(store: &S, request_id: Uuid) {
  if let Err(err) = store
    .set_materialization(request_id, MaterializationStatus::Failed)
    .await
  {
    warn!(request_id = %request_id, error = %err, "could not record failed materialization");
  }
}
