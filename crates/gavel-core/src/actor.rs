//! Actors and the authorization predicate.
//!
//! The identity provider supplies the role claim; the engine trusts it but
//! evaluates authorization in exactly one place — [`Actor::require_admin`] —
//! inside the decision, bulk, and export operations rather than in callers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Role claim attached to an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

/// An authenticated actor as asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub actor_id: Uuid,
  pub role:     Role,
}

impl Actor {
  pub fn new(actor_id: Uuid, role: Role) -> Self { Self { actor_id, role } }

  pub fn admin(actor_id: Uuid) -> Self { Self::new(actor_id, Role::Admin) }

  pub fn user(actor_id: Uuid) -> Self { Self::new(actor_id, Role::User) }

  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  /// The single authorization gate for privileged operations.
  pub fn require_admin(&self) -> Result<()> {
    if self.is_admin() { Ok(()) } else { Err(Error::Forbidden) }
  }
}
