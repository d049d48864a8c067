//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Payload and listing bodies
//! are stored as compact JSON keyed by the `kind` discriminant column. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use gavel_core::{
  listing::{Listing, ListingDetail},
  request::{MaterializationStatus, Request, RequestKind, RequestPayload, RequestStatus},
  store::RequestRecord,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── RequestKind ─────────────────────────────────────────────────────────────

// The kind column round-trips through `RequestPayload::from_parts`, so only
// the encoding direction needs a helper.
pub fn encode_kind(k: RequestKind) -> &'static str { k.as_str() }

// ─── RequestStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: RequestStatus) -> &'static str {
  match s {
    RequestStatus::Pending => "pending",
    RequestStatus::Approved => "approved",
    RequestStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<RequestStatus> {
  match s {
    "pending" => Ok(RequestStatus::Pending),
    "approved" => Ok(RequestStatus::Approved),
    "rejected" => Ok(RequestStatus::Rejected),
    other => Err(Error::UnknownValue(format!("status: {other}"))),
  }
}

// ─── MaterializationStatus ───────────────────────────────────────────────────

pub fn encode_materialization(m: MaterializationStatus) -> &'static str {
  match m {
    MaterializationStatus::Pending => "pending",
    MaterializationStatus::Done => "done",
    MaterializationStatus::Failed => "failed",
  }
}

pub fn decode_materialization(s: &str) -> Result<MaterializationStatus> {
  match s {
    "pending" => Ok(MaterializationStatus::Pending),
    "done" => Ok(MaterializationStatus::Done),
    "failed" => Ok(MaterializationStatus::Failed),
    other => Err(Error::UnknownValue(format!("materialization: {other}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `requests` row.
pub struct RawRequest {
  pub request_id:      String,
  pub kind:            String,
  pub owner_id:        String,
  pub payload_json:    String,
  pub status:          String,
  pub admin_feedback:  Option<String>,
  pub decided_by:      Option<String>,
  pub decided_at:      Option<String>,
  pub created_at:      String,
  pub materialization: Option<String>,
}

impl RawRequest {
  pub fn into_request(self) -> Result<Request> {
    let payload_json: serde_json::Value =
      serde_json::from_str(&self.payload_json)?;
    let payload = RequestPayload::from_parts(&self.kind, payload_json)
      .map_err(Error::Core)?;

    Ok(Request {
      request_id:      decode_uuid(&self.request_id)?,
      owner_id:        decode_uuid(&self.owner_id)?,
      payload,
      status:          decode_status(&self.status)?,
      admin_feedback:  self.admin_feedback,
      decided_by:      self
        .decided_by
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      decided_at:      self.decided_at.as_deref().map(decode_dt).transpose()?,
      created_at:      decode_dt(&self.created_at)?,
      materialization: self
        .materialization
        .as_deref()
        .map(decode_materialization)
        .transpose()?,
    })
  }
}

/// A `requests` row joined with the owner columns.
pub struct RawRequestRecord {
  pub request:     RawRequest,
  pub owner_name:  String,
  pub owner_email: String,
}

impl RawRequestRecord {
  pub fn into_record(self) -> Result<RequestRecord> {
    Ok(RequestRecord {
      request:     self.request.into_request()?,
      owner_name:  self.owner_name,
      owner_email: self.owner_email,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub display_name: String,
  pub email:        String,
  pub verified:     bool,
  pub created_at:   String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      display_name: self.display_name,
      email:        self.email,
      verified:     self.verified,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `listings` row.
pub struct RawListing {
  pub listing_id:  String,
  pub request_id:  String,
  pub kind:        String,
  pub creator_id:  String,
  pub detail_json: String,
  pub created_at:  String,
}

impl RawListing {
  pub fn into_listing(self) -> Result<Listing> {
    let detail_json: serde_json::Value =
      serde_json::from_str(&self.detail_json)?;
    let detail = ListingDetail::from_parts(&self.kind, detail_json)
      .map_err(Error::Core)?;

    Ok(Listing {
      listing_id: decode_uuid(&self.listing_id)?,
      request_id: decode_uuid(&self.request_id)?,
      creator_id: decode_uuid(&self.creator_id)?,
      detail,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
