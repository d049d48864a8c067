//! Integration tests for `SqliteStore` against an in-memory database.

use gavel_core::{
  Error as CoreError,
  listing::{ListingDetail, NewListing},
  request::{
    BondPayload, KycPayload, MaterializationStatus, NewRequest, NftPayload,
    RequestKind, RequestPayload, RequestStatus, Verdict,
  },
  store::{RequestQuery, RequestStore, SortDirection, SortField},
  user::{User, UserRef},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(store: &SqliteStore, name: &str, email: &str) -> User {
  store
    .upsert_user(UserRef {
      user_id:      Uuid::new_v4(),
      display_name: name.to_string(),
      email:        email.to_string(),
    })
    .await
    .unwrap()
}

fn nft_payload(name: &str) -> RequestPayload {
  RequestPayload::Nft(NftPayload {
    name:        name.to_string(),
    description: "Limited drop".to_string(),
    image_ref:   "img/drop.png".to_string(),
    price:       0.5,
    quantity:    10,
    category:    "Art".to_string(),
  })
}

fn kyc_payload(email: &str) -> KycPayload {
  KycPayload {
    id_document_ref:      "docs/id.pdf".to_string(),
    address_document_ref: "docs/address.pdf".to_string(),
    contact_email:        email.to_string(),
    contact_phone:        Some("+15550100".to_string()),
  }
}

async fn pending_nft(
  store: &SqliteStore,
  owner: &User,
  name: &str,
) -> gavel_core::request::Request {
  store
    .create_request(NewRequest {
      owner_id: owner.user_id,
      payload:  nft_payload(name),
    })
    .await
    .unwrap()
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_user() {
  let s = store().await;
  let created = user(&s, "Alice", "alice@example.com").await;
  assert!(!created.verified);

  let fetched = s.get_user(created.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.display_name, "Alice");
  assert_eq!(fetched.email, "alice@example.com");
}

#[tokio::test]
async fn upsert_refreshes_profile_but_keeps_verified() {
  let s = store().await;
  let created = user(&s, "Alice", "alice@example.com").await;
  s.set_user_verified(created.user_id, true).await.unwrap();

  let updated = s
    .upsert_user(UserRef {
      user_id:      created.user_id,
      display_name: "Alice L.".to_string(),
      email:        "alice@corp.example.com".to_string(),
    })
    .await
    .unwrap();

  assert_eq!(updated.display_name, "Alice L.");
  assert_eq!(updated.email, "alice@corp.example.com");
  assert!(updated.verified, "verified flag must survive profile refresh");
}

#[tokio::test]
async fn set_verified_unknown_user_errors() {
  let s = store().await;
  let err = s.set_user_verified(Uuid::new_v4(), true).await.unwrap_err();
  assert!(matches!(err, CoreError::UserNotFound(_)));
}

// ─── Request creation ────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_request_roundtrip() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;

  let created = pending_nft(&s, &owner, "Genesis #1").await;
  assert_eq!(created.status, RequestStatus::Pending);
  assert!(created.admin_feedback.is_none());
  assert!(created.materialization.is_none());

  let fetched = s.get_request(created.request_id).await.unwrap().unwrap();
  assert_eq!(fetched.request_id, created.request_id);
  assert_eq!(fetched.owner_id, owner.user_id);
  match fetched.payload {
    RequestPayload::Nft(p) => {
      assert_eq!(p.name, "Genesis #1");
      assert_eq!(p.price, 0.5);
      assert_eq!(p.quantity, 10);
    }
    other => panic!("wrong payload: {other:?}"),
  }
}

#[tokio::test]
async fn get_request_missing_returns_none() {
  let s = store().await;
  assert!(s.get_request(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn second_kyc_row_for_owner_conflicts() {
  let s = store().await;
  let owner = user(&s, "Bob", "bob@example.com").await;

  s.create_request(NewRequest {
    owner_id: owner.user_id,
    payload:  RequestPayload::Kyc(kyc_payload("bob@example.com")),
  })
  .await
  .unwrap();

  let err = s
    .create_request(NewRequest {
      owner_id: owner.user_id,
      payload:  RequestPayload::Kyc(kyc_payload("bob@example.com")),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Conflict(id) if id == owner.user_id));
}

// ─── Decision transition ─────────────────────────────────────────────────────

#[tokio::test]
async fn approve_stamps_decision_fields() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  let admin_id = Uuid::new_v4();
  let request = pending_nft(&s, &owner, "Genesis #1").await;

  let decided = s
    .decide_request(
      request.request_id,
      Verdict::Approved,
      "looks good".to_string(),
      admin_id,
    )
    .await
    .unwrap();

  assert_eq!(decided.status, RequestStatus::Approved);
  assert_eq!(decided.admin_feedback.as_deref(), Some("looks good"));
  assert_eq!(decided.decided_by, Some(admin_id));
  assert!(decided.decided_at.is_some());
  assert_eq!(decided.materialization, Some(MaterializationStatus::Pending));
}

#[tokio::test]
async fn reject_leaves_materialization_unset() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  let request = pending_nft(&s, &owner, "Genesis #1").await;

  let decided = s
    .decide_request(
      request.request_id,
      Verdict::Rejected,
      String::new(),
      Uuid::new_v4(),
    )
    .await
    .unwrap();

  assert_eq!(decided.status, RequestStatus::Rejected);
  assert_eq!(decided.admin_feedback.as_deref(), Some(""));
  assert!(decided.materialization.is_none());
}

#[tokio::test]
async fn decide_unknown_request_is_not_found() {
  let s = store().await;
  let err = s
    .decide_request(Uuid::new_v4(), Verdict::Approved, String::new(), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn decide_twice_fails_and_preserves_first_decision() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  let first_admin = Uuid::new_v4();
  let request = pending_nft(&s, &owner, "Genesis #1").await;

  s.decide_request(request.request_id, Verdict::Approved, String::new(), first_admin)
    .await
    .unwrap();

  let err = s
    .decide_request(
      request.request_id,
      Verdict::Rejected,
      "too late".to_string(),
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    CoreError::AlreadyDecided { status: RequestStatus::Approved, .. }
  ));

  let stored = s.get_request(request.request_id).await.unwrap().unwrap();
  assert_eq!(stored.status, RequestStatus::Approved);
  assert_eq!(stored.decided_by, Some(first_admin));
  assert_eq!(stored.admin_feedback.as_deref(), Some(""));
}

#[tokio::test]
async fn concurrent_decides_apply_exactly_once() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  let request = pending_nft(&s, &owner, "Genesis #1").await;
  let id = request.request_id;

  let approve = {
    let s = s.clone();
    tokio::spawn(async move {
      s.decide_request(id, Verdict::Approved, String::new(), Uuid::new_v4())
        .await
    })
  };
  let reject = {
    let s = s.clone();
    tokio::spawn(async move {
      s.decide_request(id, Verdict::Rejected, "no".to_string(), Uuid::new_v4())
        .await
    })
  };

  let results = [approve.await.unwrap(), reject.await.unwrap()];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  assert_eq!(
    results
      .iter()
      .filter(|r| matches!(r, Err(CoreError::AlreadyDecided { .. })))
      .count(),
    1
  );
}

// ─── KYC resubmission ────────────────────────────────────────────────────────

#[tokio::test]
async fn resubmit_resets_rejected_kyc_row() {
  let s = store().await;
  let owner = user(&s, "Bob", "bob@example.com").await;

  let request = s
    .create_request(NewRequest {
      owner_id: owner.user_id,
      payload:  RequestPayload::Kyc(kyc_payload("bob@example.com")),
    })
    .await
    .unwrap();
  s.decide_request(
    request.request_id,
    Verdict::Rejected,
    "document expired".to_string(),
    Uuid::new_v4(),
  )
  .await
  .unwrap();

  let resubmitted = s
    .resubmit_kyc(owner.user_id, kyc_payload("bob@new.example.com"))
    .await
    .unwrap();

  assert_eq!(resubmitted.request_id, request.request_id);
  assert_eq!(resubmitted.status, RequestStatus::Pending);
  assert!(resubmitted.admin_feedback.is_none());
  assert!(resubmitted.decided_by.is_none());
  assert!(resubmitted.decided_at.is_none());
  assert!(resubmitted.materialization.is_none());
  match resubmitted.payload {
    RequestPayload::Kyc(p) => {
      assert_eq!(p.contact_email, "bob@new.example.com");
    }
    other => panic!("wrong payload: {other:?}"),
  }
}

#[tokio::test]
async fn resubmit_pending_kyc_conflicts() {
  let s = store().await;
  let owner = user(&s, "Bob", "bob@example.com").await;

  s.create_request(NewRequest {
    owner_id: owner.user_id,
    payload:  RequestPayload::Kyc(kyc_payload("bob@example.com")),
  })
  .await
  .unwrap();

  let err = s
    .resubmit_kyc(owner.user_id, kyc_payload("bob@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn resubmit_without_kyc_row_is_not_found() {
  let s = store().await;
  let owner = user(&s, "Bob", "bob@example.com").await;
  let err = s
    .resubmit_kyc(owner.user_id, kyc_payload("bob@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

// ─── Materialization bookkeeping ─────────────────────────────────────────────

#[tokio::test]
async fn set_materialization_roundtrip() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  let request = pending_nft(&s, &owner, "Genesis #1").await;

  s.set_materialization(request.request_id, MaterializationStatus::Failed)
    .await
    .unwrap();
  let stored = s.get_request(request.request_id).await.unwrap().unwrap();
  assert_eq!(stored.materialization, Some(MaterializationStatus::Failed));

  let err = s
    .set_materialization(Uuid::new_v4(), MaterializationStatus::Done)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_filters_by_status() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;

  let keep = pending_nft(&s, &owner, "Sunrise").await;
  let rejected = pending_nft(&s, &owner, "Sunset").await;
  s.decide_request(rejected.request_id, Verdict::Rejected, String::new(), Uuid::new_v4())
    .await
    .unwrap();

  let query = RequestQuery {
    status: Some(RequestStatus::Pending),
    ..Default::default()
  };
  let found = s.search_requests(RequestKind::Nft, &query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].request.request_id, keep.request_id);
}

#[tokio::test]
async fn search_matches_owner_fields_case_insensitively() {
  let s = store().await;
  let alice = user(&s, "Alice Liddell", "alice@example.com").await;
  let bob = user(&s, "Bob", "bob@example.com").await;
  pending_nft(&s, &alice, "Untitled").await;
  pending_nft(&s, &bob, "Untitled").await;

  let by_email = RequestQuery {
    search: Some("ALICE@EXAMPLE".to_string()),
    ..Default::default()
  };
  let found = s.search_requests(RequestKind::Nft, &by_email).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].owner_email, "alice@example.com");

  let by_name = RequestQuery {
    search: Some("liddell".to_string()),
    ..Default::default()
  };
  let found = s.search_requests(RequestKind::Nft, &by_name).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].owner_name, "Alice Liddell");
}

#[tokio::test]
async fn search_matches_request_name_and_description() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  pending_nft(&s, &owner, "Golden Hour").await;

  let by_name = RequestQuery {
    search: Some("golden".to_string()),
    ..Default::default()
  };
  assert_eq!(
    s.search_requests(RequestKind::Nft, &by_name).await.unwrap().len(),
    1
  );

  // "Limited drop" is the fixture description.
  let by_description = RequestQuery {
    search: Some("limited".to_string()),
    ..Default::default()
  };
  assert_eq!(
    s.search_requests(RequestKind::Nft, &by_description)
      .await
      .unwrap()
      .len(),
    1
  );

  let miss = RequestQuery {
    search: Some("nonexistent".to_string()),
    ..Default::default()
  };
  assert!(s.search_requests(RequestKind::Nft, &miss).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_scopes_to_owner() {
  let s = store().await;
  let alice = user(&s, "Alice", "alice@example.com").await;
  let bob = user(&s, "Bob", "bob@example.com").await;
  pending_nft(&s, &alice, "A").await;
  pending_nft(&s, &bob, "B").await;

  let query = RequestQuery {
    owner: Some(alice.user_id),
    ..Default::default()
  };
  let found = s.search_requests(RequestKind::Nft, &query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].request.owner_id, alice.user_id);
}

#[tokio::test]
async fn search_does_not_mix_kinds() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  pending_nft(&s, &owner, "Art").await;
  s.create_request(NewRequest {
    owner_id: owner.user_id,
    payload:  RequestPayload::Bond(BondPayload {
      name:                 "Muni 2030".to_string(),
      description:          "10-year".to_string(),
      face_value:           100.0,
      interest_rate:        3.5,
      maturity_period_days: 3650,
      quantity:             50,
      terms:                "standard".to_string(),
    }),
  })
  .await
  .unwrap();

  let nfts = s
    .search_requests(RequestKind::Nft, &RequestQuery::default())
    .await
    .unwrap();
  assert_eq!(nfts.len(), 1);
  assert_eq!(nfts[0].request.kind(), RequestKind::Nft);

  let bonds = s
    .search_requests(RequestKind::Bond, &RequestQuery::default())
    .await
    .unwrap();
  assert_eq!(bonds.len(), 1);
}

#[tokio::test]
async fn search_sorts_by_name_ascending() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  pending_nft(&s, &owner, "Citrine").await;
  pending_nft(&s, &owner, "amber").await;
  pending_nft(&s, &owner, "Basalt").await;

  let query = RequestQuery {
    sort: SortField::Name,
    direction: SortDirection::Asc,
    ..Default::default()
  };
  let found = s.search_requests(RequestKind::Nft, &query).await.unwrap();
  let names: Vec<String> = found
    .iter()
    .map(|r| r.request.payload.name().unwrap().to_string())
    .collect();
  assert_eq!(names, ["amber", "Basalt", "Citrine"]);
}

#[tokio::test]
async fn search_limit_and_offset_page_through() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  for i in 0..5 {
    pending_nft(&s, &owner, &format!("Item {i}")).await;
  }

  let page = RequestQuery {
    sort: SortField::Name,
    direction: SortDirection::Asc,
    limit: Some(2),
    offset: Some(2),
    ..Default::default()
  };
  let found = s.search_requests(RequestKind::Nft, &page).await.unwrap();
  let names: Vec<String> = found
    .iter()
    .map(|r| r.request.payload.name().unwrap().to_string())
    .collect();
  assert_eq!(names, ["Item 2", "Item 3"]);
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_listing() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  let request = pending_nft(&s, &owner, "Genesis #1").await;
  s.decide_request(request.request_id, Verdict::Approved, String::new(), Uuid::new_v4())
    .await
    .unwrap();

  let nft = match &request.payload {
    RequestPayload::Nft(p) => p.to_listing(),
    other => panic!("wrong payload: {other:?}"),
  };
  let created = s
    .create_listing(NewListing {
      request_id: request.request_id,
      creator_id: owner.user_id,
      detail:     ListingDetail::Nft(nft),
    })
    .await
    .unwrap();

  let found = s
    .find_listing_for_request(request.request_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.listing_id, created.listing_id);
  assert_eq!(found.creator_id, owner.user_id);
  match found.detail {
    ListingDetail::Nft(l) => {
      assert_eq!(l.remaining_quantity, 10);
      assert_eq!(l.price, 0.5);
    }
    other => panic!("wrong detail: {other:?}"),
  }
}

#[tokio::test]
async fn duplicate_listing_for_request_is_rejected() {
  let s = store().await;
  let owner = user(&s, "Alice", "alice@example.com").await;
  let request = pending_nft(&s, &owner, "Genesis #1").await;

  let nft = match &request.payload {
    RequestPayload::Nft(p) => p.to_listing(),
    other => panic!("wrong payload: {other:?}"),
  };
  s.create_listing(NewListing {
    request_id: request.request_id,
    creator_id: owner.user_id,
    detail:     ListingDetail::Nft(nft.clone()),
  })
  .await
  .unwrap();

  let err = s
    .create_listing(NewListing {
      request_id: request.request_id,
      creator_id: owner.user_id,
      detail:     ListingDetail::Nft(nft),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Store(_)));

  // Still exactly one listing behind the request.
  assert!(
    s.find_listing_for_request(request.request_id)
      .await
      .unwrap()
      .is_some()
  );
}

#[tokio::test]
async fn find_listing_missing_returns_none() {
  let s = store().await;
  assert!(
    s.find_listing_for_request(Uuid::new_v4())
      .await
      .unwrap()
      .is_none()
  );
}
