//! Submission — validate user input and create a `pending` request.
//!
//! The owner of the created request is always the authenticated identity the
//! claims describe; callers cannot submit on behalf of someone else.

use tracing::info;

use crate::{
  Error, Result,
  request::{Request, NewRequest, RequestPayload, RequestStatus},
  store::RequestStore,
  user::UserRef,
};

/// Validate `payload` and persist it as a new `pending` request owned by the
/// claimed identity.
///
/// Repeated submissions create independent requests, with one exception:
/// at most one KYC record exists per user. A KYC submission while that record
/// is `pending` or `approved` fails with [`Error::Conflict`]; while it is
/// `rejected`, the submission starts a fresh cycle on the same record
/// (`rejected → pending`, feedback cleared, payload replaced).
pub async fn submit<S: RequestStore>(
  store: &S,
  claims: UserRef,
  payload: RequestPayload,
) -> Result<Request> {
  payload.validate()?;

  let owner_id = claims.user_id;
  store.upsert_user(claims).await?;

  let request = match payload {
    RequestPayload::Kyc(kyc) => match store.find_kyc_request(owner_id).await? {
      None => {
        store
          .create_request(NewRequest {
            owner_id,
            payload: RequestPayload::Kyc(kyc),
          })
          .await?
      }
      Some(existing) if existing.status == RequestStatus::Rejected => {
        store.resubmit_kyc(owner_id, kyc).await?
      }
      Some(_) => return Err(Error::Conflict(owner_id)),
    },
    payload => {
      store.create_request(NewRequest { owner_id, payload }).await?
    }
  };

  info!(
    request_id = %request.request_id,
    kind = request.kind().as_str(),
    owner = %owner_id,
    "request submitted"
  );
  Ok(request)
}
