//! The `RequestStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `gavel-store-sqlite`).
//! Higher layers (services in this crate, `gavel-api`) depend on this
//! abstraction, not on any concrete backend.
//!
//! The store is the single source of truth and the only resource concurrent
//! actors contend on. Every mutation of a request's status goes through a
//! guarded conditional update — implementations must never use
//! read-then-write for [`RequestStore::decide_request`] or
//! [`RequestStore::resubmit_kyc`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  listing::{Listing, NewListing},
  request::{
    KycPayload, MaterializationStatus, NewRequest, Request, RequestKind,
    RequestStatus, Verdict,
  },
  user::{User, UserRef},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Sort key for [`RequestStore::search_requests`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
  #[default]
  CreatedAt,
  Name,
  Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  /// Newest first for the default `created_at` sort.
  #[default]
  Desc,
}

/// Parameters for [`RequestStore::search_requests`].
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
  pub status:    Option<RequestStatus>,
  /// Case-insensitive match against request name, request description,
  /// owner display name, and owner email.
  pub search:    Option<String>,
  /// Restrict to one owner's requests (forced for non-admin callers).
  pub owner:     Option<Uuid>,
  pub sort:      SortField,
  pub direction: SortDirection,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// A request joined with the owner fields the moderation UI displays and
/// search/export operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
  pub request:     Request,
  pub owner_name:  String,
  pub owner_email: String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Gavel request store backend.
///
/// Domain failures (`NotFound`, `AlreadyDecided`, `Conflict`, ...) are
/// reported as [`crate::Error`] variants so services can branch on them;
/// backend-specific failures travel through [`crate::Error::Store`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RequestStore: Send + Sync {
  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert or refresh the profile row for `user`. Never touches the
  /// `verified` flag of an existing row.
  fn upsert_user(
    &self,
    user: UserRef,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>>> + Send + '_;

  /// Set the KYC capability flag. Fails with
  /// [`crate::Error::UserNotFound`] for an unknown user.
  fn set_user_verified(
    &self,
    id: Uuid,
    verified: bool,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Create and persist a new `pending` request. The store assigns
  /// `request_id` and `created_at`. Fails with [`crate::Error::Conflict`]
  /// when a KYC row already exists for the owner.
  fn create_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<Request>> + Send + '_;

  /// Retrieve a request by id. Returns `None` if not found.
  fn get_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Request>>> + Send + '_;

  /// The owner's KYC request row, if any. At most one exists per owner.
  fn find_kyc_request(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Option<Request>>> + Send + '_;

  /// Start a fresh KYC cycle on the owner's `rejected` row: conditionally
  /// transition `rejected → pending`, replace the payload, and clear
  /// `admin_feedback`, `decided_by` and `decided_at`.
  ///
  /// Fails with [`crate::Error::NotFound`] when the owner has no KYC row and
  /// [`crate::Error::Conflict`] when the row is not in `rejected` state.
  fn resubmit_kyc(
    &self,
    owner_id: Uuid,
    payload: KycPayload,
  ) -> impl Future<Output = Result<Request>> + Send + '_;

  /// The guarded transition out of `pending`: atomically set
  /// `status = verdict`, stamping `decided_by`, `decided_at` and
  /// `admin_feedback`, and `materialization = pending` on approval — all in
  /// one conditional update that only matches a `pending` row.
  ///
  /// When no pending row matches: [`crate::Error::NotFound`] for an unknown
  /// id, otherwise [`crate::Error::AlreadyDecided`] carrying the current
  /// terminal status. Exactly one of two concurrent calls can succeed.
  fn decide_request(
    &self,
    id: Uuid,
    verdict: Verdict,
    feedback: String,
    decided_by: Uuid,
  ) -> impl Future<Output = Result<Request>> + Send + '_;

  /// Record the outcome of a materialization attempt.
  fn set_materialization(
    &self,
    id: Uuid,
    status: MaterializationStatus,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Filtered, sorted read over one kind's requests, joined with owner
  /// fields. Pure read; no side effects.
  fn search_requests<'a>(
    &'a self,
    kind: RequestKind,
    query: &'a RequestQuery,
  ) -> impl Future<Output = Result<Vec<RequestRecord>>> + Send + 'a;

  // ── Listings ──────────────────────────────────────────────────────────

  /// Persist a listing created from an approved request. The store assigns
  /// `listing_id` and `created_at`. The uniqueness of `request_id` is
  /// enforced here — a duplicate insert must fail rather than create a
  /// second listing.
  fn create_listing(
    &self,
    input: NewListing,
  ) -> impl Future<Output = Result<Listing>> + Send + '_;

  /// The listing materialized from `request_id`, if any.
  fn find_listing_for_request(
    &self,
    request_id: Uuid,
  ) -> impl Future<Output = Result<Option<Listing>>> + Send + '_;
}
