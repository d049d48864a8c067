//! Actor claims extractor.
//!
//! The identity provider sits in front of this API and asserts who is
//! calling via trusted headers; the engine never verifies credentials itself.
//! A request without a parseable id and role claim is rejected with 401
//! before any handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use gavel_core::{
  actor::{Actor, Role},
  user::UserRef,
};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";

/// The authenticated caller, as asserted by the identity proxy.
#[derive(Debug, Clone)]
pub struct ActorClaims {
  pub actor:        Actor,
  pub display_name: String,
  pub email:        String,
}

impl ActorClaims {
  /// Profile snapshot for the user upsert at submission time.
  pub fn user_ref(&self) -> UserRef {
    UserRef {
      user_id:      self.actor.actor_id,
      display_name: self.display_name.clone(),
      email:        self.email.clone(),
    }
  }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
  parts.headers.get(name).and_then(|v| v.to_str().ok())
}

impl<S: Send + Sync> FromRequestParts<S> for ActorClaims {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let id = header(parts, ACTOR_ID_HEADER).ok_or_else(|| {
      ApiError::Unauthorized(format!("missing {ACTOR_ID_HEADER} header"))
    })?;
    let actor_id = Uuid::parse_str(id).map_err(|_| {
      ApiError::Unauthorized(format!("malformed {ACTOR_ID_HEADER} header"))
    })?;

    let role = match header(parts, ACTOR_ROLE_HEADER) {
      Some("admin") => Role::Admin,
      Some("user") => Role::User,
      Some(other) => {
        return Err(ApiError::Unauthorized(format!(
          "unknown role claim: {other}"
        )));
      }
      None => {
        return Err(ApiError::Unauthorized(format!(
          "missing {ACTOR_ROLE_HEADER} header"
        )));
      }
    };

    let display_name =
      header(parts, ACTOR_NAME_HEADER).unwrap_or_default().to_string();
    let email =
      header(parts, ACTOR_EMAIL_HEADER).unwrap_or_default().to_string();

    Ok(ActorClaims {
      actor: Actor::new(actor_id, role),
      display_name,
      email,
    })
  }
}
