//! Listing types — the live entities produced from approved requests.
//!
//! A listing owns a copy of the approved payload plus a back-reference to the
//! originating request. At most one listing exists per request; the store
//! enforces this with a uniqueness constraint on `request_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  request::{BondPayload, NftPayload, RequestKind, TokenFeatures, TokenPayload},
};

// ─── Kind-specific listing bodies ────────────────────────────────────────────

/// A tradable NFT listing. `remaining_quantity` starts at the requested
/// quantity and is decremented by the (out-of-scope) purchase flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftListing {
  pub name:               String,
  pub description:        String,
  pub image_ref:          String,
  pub price:              f64,
  pub remaining_quantity: u32,
  pub category:           String,
}

/// A tradable bond listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondListing {
  pub name:                 String,
  pub description:          String,
  pub face_value:           f64,
  pub interest_rate:        f64,
  pub maturity_period_days: u32,
  pub quantity:             u32,
  pub terms:                String,
}

/// A tradable token listing. `current_price` starts at the requested initial
/// price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListing {
  pub name:           String,
  pub symbol:         String,
  pub description:    String,
  pub total_supply:   u64,
  pub decimals:       u8,
  pub token_type:     String,
  pub features:       TokenFeatures,
  pub current_price:  f64,
  pub use_case:       String,
  pub target_network: String,
}

impl NftPayload {
  pub fn to_listing(&self) -> NftListing {
    NftListing {
      name:               self.name.clone(),
      description:        self.description.clone(),
      image_ref:          self.image_ref.clone(),
      price:              self.price,
      remaining_quantity: self.quantity,
      category:           self.category.clone(),
    }
  }
}

impl BondPayload {
  pub fn to_listing(&self) -> BondListing {
    BondListing {
      name:                 self.name.clone(),
      description:          self.description.clone(),
      face_value:           self.face_value,
      interest_rate:        self.interest_rate,
      maturity_period_days: self.maturity_period_days,
      quantity:             self.quantity,
      terms:                self.terms.clone(),
    }
  }
}

impl TokenPayload {
  pub fn to_listing(&self) -> TokenListing {
    TokenListing {
      name:           self.name.clone(),
      symbol:         self.symbol.clone(),
      description:    self.description.clone(),
      total_supply:   self.total_supply,
      decimals:       self.decimals,
      token_type:     self.token_type.clone(),
      features:       self.features,
      current_price:  self.initial_price,
      use_case:       self.use_case.clone(),
      target_network: self.target_network.clone(),
    }
  }
}

// ─── ListingDetail ───────────────────────────────────────────────────────────

/// The typed body of a listing. The variant name serves as the `kind`
/// discriminant stored in the database. Identity verification produces no
/// listing, so there is no `kyc` variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ListingDetail {
  Nft(NftListing),
  Bond(BondListing),
  Token(TokenListing),
}

impl ListingDetail {
  pub fn kind(&self) -> RequestKind {
    match self {
      Self::Nft(_) => RequestKind::Nft,
      Self::Bond(_) => RequestKind::Bond,
      Self::Token(_) => RequestKind::Token,
    }
  }

  /// Serialise the inner body (without the kind tag) for the `detail_json`
  /// database column.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Deserialise from the discriminant string and JSON body stored in the
  /// database.
  pub fn from_parts(kind: &str, data: serde_json::Value) -> Result<Self> {
    let wrapped = serde_json::json!({ "kind": kind, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// A live platform entity created from an approved request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
  pub listing_id: Uuid,
  /// Originating request; unique per listing.
  pub request_id: Uuid,
  /// Inherited from the request owner.
  pub creator_id: Uuid,
  pub detail:     ListingDetail,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RequestStore::create_listing`].
/// `listing_id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewListing {
  pub request_id: Uuid,
  pub creator_id: Uuid,
  pub detail:     ListingDetail,
}
