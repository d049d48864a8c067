//! User records — the thin profile the engine keeps for request owners.
//!
//! Identity and sessions are owned by an external provider; the engine only
//! stores what moderation needs: a display name and email for search/export,
//! and the `verified` capability flag that a KYC approval flips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request owner as stored by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub display_name: String,
  pub email:        String,
  /// Set by an approved identity-verification request; never set directly.
  pub verified:     bool,
  pub created_at:   DateTime<Utc>,
}

/// Profile claims snapshot from the identity provider, upserted at
/// submission time. Never carries `verified` — that flag is owned by the
/// materialization path.
#[derive(Debug, Clone)]
pub struct UserRef {
  pub user_id:      Uuid,
  pub display_name: String,
  pub email:        String,
}
