//! Request types — the unit of work of the moderation engine.
//!
//! A request is a user-submitted resource (identity verification, NFT, bond,
//! or token issuance) that moves from `pending` to a terminal decision. The
//! payload is immutable after submission; the only sanctioned mutations are
//! the guarded decision transition and the KYC resubmission cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Kind and status ─────────────────────────────────────────────────────────

/// The resource kind a request asks to create. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
  Kyc,
  Nft,
  Bond,
  Token,
}

impl RequestKind {
  /// The discriminant string stored in the `kind` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Kyc => "kyc",
      Self::Nft => "nft",
      Self::Bond => "bond",
      Self::Token => "token",
    }
  }
}

/// Lifecycle status of a request. `pending` is the only mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Approved,
  Rejected,
}

impl RequestStatus {
  pub fn is_pending(self) -> bool { matches!(self, Self::Pending) }

  pub fn is_terminal(self) -> bool { !self.is_pending() }
}

impl std::fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    };
    f.write_str(s)
  }
}

/// An admin's verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
  Approved,
  Rejected,
}

impl Verdict {
  /// The terminal status this verdict transitions a pending request into.
  pub fn status(self) -> RequestStatus {
    match self {
      Self::Approved => RequestStatus::Approved,
      Self::Rejected => RequestStatus::Rejected,
    }
  }
}

/// Outcome of turning an approved request into a live entity. `None` on the
/// request means no approval has happened yet (or the verdict was rejection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterializationStatus {
  /// Approved; the entity has not been created yet.
  Pending,
  Done,
  /// The creation attempt failed; the approval stands and a retry is allowed.
  Failed,
}

// ─── Kind-specific payloads ──────────────────────────────────────────────────

/// Identity-verification submission. Document fields are opaque storage
/// references returned by the upload collaborator; no raw bytes pass through
/// the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycPayload {
  pub id_document_ref:      String,
  pub address_document_ref: String,
  pub contact_email:        String,
  pub contact_phone:        Option<String>,
}

/// NFT issuance submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftPayload {
  pub name:        String,
  pub description: String,
  pub image_ref:   String,
  pub price:       f64,
  pub quantity:    u32,
  pub category:    String,
}

/// Bond issuance submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondPayload {
  pub name:                 String,
  pub description:          String,
  pub face_value:           f64,
  /// Percentage; zero-coupon bonds are allowed.
  pub interest_rate:        f64,
  pub maturity_period_days: u32,
  pub quantity:             u32,
  pub terms:                String,
}

/// On/off capabilities requested for a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFeatures {
  #[serde(default)]
  pub mintable: bool,
  #[serde(default)]
  pub burnable: bool,
  #[serde(default)]
  pub pausable: bool,
  #[serde(default)]
  pub capped:   bool,
}

impl TokenFeatures {
  /// Human-readable flag list, e.g. `"mintable|pausable"`.
  pub fn summary(&self) -> String {
    let mut flags = Vec::new();
    if self.mintable { flags.push("mintable"); }
    if self.burnable { flags.push("burnable"); }
    if self.pausable { flags.push("pausable"); }
    if self.capped   { flags.push("capped"); }
    flags.join("|")
  }
}

/// Token issuance submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
  pub name:           String,
  /// Ticker, 2–10 characters.
  pub symbol:         String,
  pub description:    String,
  pub total_supply:   u64,
  /// 0–18, matching common chain conventions.
  pub decimals:       u8,
  /// Free-text classification, e.g. "utility" or "governance".
  pub token_type:     String,
  #[serde(default)]
  pub features:       TokenFeatures,
  pub initial_price:  f64,
  pub use_case:       String,
  pub target_network: String,
}

// ─── RequestPayload ──────────────────────────────────────────────────────────

/// The typed payload of a request. The variant name serves as the `kind`
/// discriminant stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum RequestPayload {
  Kyc(KycPayload),
  Nft(NftPayload),
  Bond(BondPayload),
  Token(TokenPayload),
}

impl RequestPayload {
  pub fn kind(&self) -> RequestKind {
    match self {
      Self::Kyc(_) => RequestKind::Kyc,
      Self::Nft(_) => RequestKind::Nft,
      Self::Bond(_) => RequestKind::Bond,
      Self::Token(_) => RequestKind::Token,
    }
  }

  /// Serialise the inner payload (without the kind tag) for the
  /// `payload_json` database column.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    // The full serialised form is `{"kind": "...", "data": <payload>}`.
    // We want only the payload.
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Deserialise from the discriminant string and JSON payload stored in the
  /// database (or received from a kind-scoped API route).
  pub fn from_parts(kind: &str, data: serde_json::Value) -> Result<Self> {
    let wrapped = serde_json::json!({ "kind": kind, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }

  /// The display name of the requested entity; identity verification has
  /// none.
  pub fn name(&self) -> Option<&str> {
    match self {
      Self::Kyc(_) => None,
      Self::Nft(p) => Some(&p.name),
      Self::Bond(p) => Some(&p.name),
      Self::Token(p) => Some(&p.name),
    }
  }

  pub fn description(&self) -> Option<&str> {
    match self {
      Self::Kyc(_) => None,
      Self::Nft(p) => Some(&p.description),
      Self::Bond(p) => Some(&p.description),
      Self::Token(p) => Some(&p.description),
    }
  }

  /// Check field presence and numeric ranges. Submission refuses invalid
  /// payloads outright; nothing is persisted on failure.
  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Kyc(p) => {
        non_empty("id_document_ref", &p.id_document_ref)?;
        non_empty("address_document_ref", &p.address_document_ref)?;
        non_empty("contact_email", &p.contact_email)?;
        if !p.contact_email.contains('@') {
          return Err(invalid("contact_email", "not an email address"));
        }
        Ok(())
      }

      Self::Nft(p) => {
        non_empty("name", &p.name)?;
        non_empty("image_ref", &p.image_ref)?;
        non_empty("category", &p.category)?;
        positive("price", p.price)?;
        if p.quantity == 0 {
          return Err(invalid("quantity", "must be at least 1"));
        }
        Ok(())
      }

      Self::Bond(p) => {
        non_empty("name", &p.name)?;
        non_empty("terms", &p.terms)?;
        positive("face_value", p.face_value)?;
        if !p.interest_rate.is_finite() || p.interest_rate < 0.0 {
          return Err(invalid("interest_rate", "must be zero or positive"));
        }
        if p.maturity_period_days == 0 {
          return Err(invalid("maturity_period_days", "must be at least 1"));
        }
        if p.quantity == 0 {
          return Err(invalid("quantity", "must be at least 1"));
        }
        Ok(())
      }

      Self::Token(p) => {
        non_empty("name", &p.name)?;
        non_empty("token_type", &p.token_type)?;
        non_empty("target_network", &p.target_network)?;
        let symbol_len = p.symbol.chars().count();
        if !(2..=10).contains(&symbol_len) {
          return Err(invalid("symbol", "must be 2–10 characters"));
        }
        if p.total_supply == 0 {
          return Err(invalid("total_supply", "must be at least 1"));
        }
        if p.decimals > 18 {
          return Err(invalid("decimals", "must be 0–18"));
        }
        if !p.initial_price.is_finite() || p.initial_price < 0.0 {
          return Err(invalid("initial_price", "must be zero or positive"));
        }
        Ok(())
      }
    }
  }
}

fn invalid(field: &'static str, message: &str) -> Error {
  Error::Validation { field, message: message.to_string() }
}

fn non_empty(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(invalid(field, "must not be empty"));
  }
  Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<()> {
  if !value.is_finite() || value <= 0.0 {
    return Err(invalid(field, "must be positive"));
  }
  Ok(())
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A submitted resource awaiting (or carrying) an admin decision.
///
/// `admin_feedback`, `decided_by` and `decided_at` are written atomically with
/// the status transition out of `pending` and are null until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
  pub request_id:      Uuid,
  pub owner_id:        Uuid,
  pub payload:         RequestPayload,
  pub status:          RequestStatus,
  pub admin_feedback:  Option<String>,
  pub decided_by:      Option<Uuid>,
  pub decided_at:      Option<DateTime<Utc>>,
  /// Store-assigned at first submission; survives KYC resubmission cycles.
  pub created_at:      DateTime<Utc>,
  /// `None` until the request is approved.
  pub materialization: Option<MaterializationStatus>,
}

impl Request {
  pub fn kind(&self) -> RequestKind { self.payload.kind() }
}

// ─── NewRequest ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::RequestStore::create_request`].
/// `request_id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewRequest {
  pub owner_id: Uuid,
  pub payload:  RequestPayload,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
