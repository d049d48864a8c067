//! In-memory [`RequestStore`] used by the service tests in this crate.
//!
//! Mutations take one lock for their whole read-check-write sequence, so the
//! guarded transitions are linearizable the same way a backend's conditional
//! update is. A failure switch lets tests exercise the
//! approval-survives-materialization-failure path.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  listing::{Listing, NewListing},
  request::{
    KycPayload, MaterializationStatus, NewRequest, NftPayload, Request,
    RequestKind, RequestPayload, RequestStatus, Verdict,
  },
  store::{
    RequestQuery, RequestRecord, RequestStore, SortDirection, SortField,
  },
  submission,
  user::{User, UserRef},
};

#[derive(Default)]
struct Inner {
  users:    HashMap<Uuid, User>,
  requests: HashMap<Uuid, Request>,
  listings: Vec<Listing>,
}

pub struct MemoryStore {
  inner:         Mutex<Inner>,
  fail_listings: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self {
      inner:         Mutex::new(Inner::default()),
      fail_listings: AtomicBool::new(false),
    }
  }

  /// Make every `create_listing` call fail until reset.
  pub fn fail_listings(&self, fail: bool) {
    self.fail_listings.store(fail, Ordering::SeqCst);
  }

  pub fn listing_count(&self) -> usize {
    self.inner.lock().unwrap().listings.len()
  }
}

impl RequestStore for MemoryStore {
  async fn upsert_user(&self, user: UserRef) -> Result<User> {
    let mut inner = self.inner.lock().unwrap();
    let entry = inner.users.entry(user.user_id).or_insert_with(|| User {
      user_id:      user.user_id,
      display_name: String::new(),
      email:        String::new(),
      verified:     false,
      created_at:   Utc::now(),
    });
    entry.display_name = user.display_name;
    entry.email = user.email;
    Ok(entry.clone())
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.inner.lock().unwrap().users.get(&id).cloned())
  }

  async fn set_user_verified(&self, id: Uuid, verified: bool) -> Result<()> {
    let mut inner = self.inner.lock().unwrap();
    let user = inner.users.get_mut(&id).ok_or(Error::UserNotFound(id))?;
    user.verified = verified;
    Ok(())
  }

  async fn create_request(&self, input: NewRequest) -> Result<Request> {
    let mut inner = self.inner.lock().unwrap();
    if input.payload.kind() == RequestKind::Kyc {
      let duplicate = inner.requests.values().any(|r| {
        r.owner_id == input.owner_id && r.kind() == RequestKind::Kyc
      });
      if duplicate {
        return Err(Error::Conflict(input.owner_id));
      }
    }

    let request = Request {
      request_id:      Uuid::new_v4(),
      owner_id:        input.owner_id,
      payload:         input.payload,
      status:          RequestStatus::Pending,
      admin_feedback:  None,
      decided_by:      None,
      decided_at:      None,
      created_at:      Utc::now(),
      materialization: None,
    };
    inner.requests.insert(request.request_id, request.clone());
    Ok(request)
  }

  async fn get_request(&self, id: Uuid) -> Result<Option<Request>> {
    Ok(self.inner.lock().unwrap().requests.get(&id).cloned())
  }

  async fn find_kyc_request(&self, owner_id: Uuid) -> Result<Option<Request>> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .requests
        .values()
        .find(|r| r.owner_id == owner_id && r.kind() == RequestKind::Kyc)
        .cloned(),
    )
  }

  async fn resubmit_kyc(
    &self,
    owner_id: Uuid,
    payload: KycPayload,
  ) -> Result<Request> {
    let mut inner = self.inner.lock().unwrap();
    let request = inner
      .requests
      .values_mut()
      .find(|r| r.owner_id == owner_id && r.kind() == RequestKind::Kyc)
      .ok_or(Error::NotFound(owner_id))?;

    if request.status != RequestStatus::Rejected {
      return Err(Error::Conflict(owner_id));
    }

    request.payload = RequestPayload::Kyc(payload);
    request.status = RequestStatus::Pending;
    request.admin_feedback = None;
    request.decided_by = None;
    request.decided_at = None;
    request.materialization = None;
    Ok(request.clone())
  }

  async fn decide_request(
    &self,
    id: Uuid,
    verdict: Verdict,
    feedback: String,
    decided_by: Uuid,
  ) -> Result<Request> {
    let mut inner = self.inner.lock().unwrap();
    let request = inner.requests.get_mut(&id).ok_or(Error::NotFound(id))?;

    if request.status != RequestStatus::Pending {
      return Err(Error::AlreadyDecided { id, status: request.status });
    }

    request.status = verdict.status();
    request.admin_feedback = Some(feedback);
    request.decided_by = Some(decided_by);
    request.decided_at = Some(Utc::now());
    request.materialization = (verdict == Verdict::Approved)
      .then_some(MaterializationStatus::Pending);
    Ok(request.clone())
  }

  async fn set_materialization(
    &self,
    id: Uuid,
    status: MaterializationStatus,
  ) -> Result<()> {
    let mut inner = self.inner.lock().unwrap();
    let request = inner.requests.get_mut(&id).ok_or(Error::NotFound(id))?;
    request.materialization = Some(status);
    Ok(())
  }

  async fn search_requests(
    &self,
    kind: RequestKind,
    query: &RequestQuery,
  ) -> Result<Vec<RequestRecord>> {
    let inner = self.inner.lock().unwrap();
    let needle = query.search.as_deref().map(str::to_lowercase);

    let mut records: Vec<RequestRecord> = inner
      .requests
      .values()
      .filter(|r| r.kind() == kind)
      .filter(|r| query.status.is_none_or(|s| r.status == s))
      .filter(|r| query.owner.is_none_or(|o| r.owner_id == o))
      .map(|r| {
        let owner = inner.users.get(&r.owner_id);
        RequestRecord {
          request:     r.clone(),
          owner_name:  owner.map(|u| u.display_name.clone()).unwrap_or_default(),
          owner_email: owner.map(|u| u.email.clone()).unwrap_or_default(),
        }
      })
      .filter(|record| match &needle {
        None => true,
        Some(needle) => {
          let r = &record.request;
          r.payload.name().unwrap_or("").to_lowercase().contains(needle)
            || r
              .payload
              .description()
              .unwrap_or("")
              .to_lowercase()
              .contains(needle)
            || record.owner_name.to_lowercase().contains(needle)
            || record.owner_email.to_lowercase().contains(needle)
        }
      })
      .collect();

    records.sort_by(|a, b| {
      let ord = match query.sort {
        SortField::CreatedAt => {
          a.request.created_at.cmp(&b.request.created_at)
        }
        SortField::Name => a
          .request
          .payload
          .name()
          .unwrap_or("")
          .to_lowercase()
          .cmp(&b.request.payload.name().unwrap_or("").to_lowercase()),
        SortField::Status => a
          .request
          .status
          .to_string()
          .cmp(&b.request.status.to_string()),
      };
      let ord = ord.then(a.request.request_id.cmp(&b.request.request_id));
      match query.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
      }
    });

    let offset = query.offset.unwrap_or(0);
    let records: Vec<RequestRecord> = match query.limit {
      Some(limit) => records.into_iter().skip(offset).take(limit).collect(),
      None => records.into_iter().skip(offset).collect(),
    };
    Ok(records)
  }

  async fn create_listing(&self, input: NewListing) -> Result<Listing> {
    if self.fail_listings.load(Ordering::SeqCst) {
      return Err(Error::store(std::io::Error::other(
        "injected listing failure",
      )));
    }

    let mut inner = self.inner.lock().unwrap();
    if inner.listings.iter().any(|l| l.request_id == input.request_id) {
      return Err(Error::store(std::io::Error::other(
        "listing already exists for request",
      )));
    }

    let listing = Listing {
      listing_id: Uuid::new_v4(),
      request_id: input.request_id,
      creator_id: input.creator_id,
      detail:     input.detail,
      created_at: Utc::now(),
    };
    inner.listings.push(listing.clone());
    Ok(listing)
  }

  async fn find_listing_for_request(
    &self,
    request_id: Uuid,
  ) -> Result<Option<Listing>> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .listings
        .iter()
        .find(|l| l.request_id == request_id)
        .cloned(),
    )
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn user_ref(name: &str, email: &str) -> UserRef {
  UserRef {
    user_id:      Uuid::new_v4(),
    display_name: name.to_string(),
    email:        email.to_string(),
  }
}

pub fn nft_payload(name: &str) -> RequestPayload {
  RequestPayload::Nft(NftPayload {
    name:        name.to_string(),
    description: "Limited drop".to_string(),
    image_ref:   "img/drop.png".to_string(),
    price:       0.5,
    quantity:    10,
    category:    "Art".to_string(),
  })
}

pub fn kyc_payload() -> RequestPayload {
  RequestPayload::Kyc(KycPayload {
    id_document_ref:      "docs/id.pdf".to_string(),
    address_document_ref: "docs/address.pdf".to_string(),
    contact_email:        "holder@example.com".to_string(),
    contact_phone:        None,
  })
}

/// Submit via the real submission service and unwrap; fixtures are valid.
pub async fn submit_request(
  store: &MemoryStore,
  claims: UserRef,
  payload: RequestPayload,
) -> Request {
  submission::submit(store, claims, payload).await.unwrap()
}
