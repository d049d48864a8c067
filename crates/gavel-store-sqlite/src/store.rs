//! [`SqliteStore`] — the SQLite implementation of [`RequestStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use gavel_core::{
  listing::{Listing, NewListing},
  request::{
    KycPayload, MaterializationStatus, NewRequest, Request, RequestKind,
    RequestPayload, RequestStatus, Verdict,
  },
  store::{
    RequestQuery, RequestRecord, RequestStore, SortDirection, SortField,
  },
  user::{User, UserRef},
};

use crate::{
  Error, Result,
  encode::{
    RawListing, RawRequest, RawRequestRecord, RawUser, encode_dt, encode_kind,
    encode_materialization, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row mappers ─────────────────────────────────────────────────────────────

const REQUEST_COLUMNS: &str = "request_id, kind, owner_id, payload_json, \
   status, admin_feedback, decided_by, decided_at, created_at, materialization";

fn request_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRequest> {
  Ok(RawRequest {
    request_id:      row.get(0)?,
    kind:            row.get(1)?,
    owner_id:        row.get(2)?,
    payload_json:    row.get(3)?,
    status:          row.get(4)?,
    admin_feedback:  row.get(5)?,
    decided_by:      row.get(6)?,
    decided_at:      row.get(7)?,
    created_at:      row.get(8)?,
    materialization: row.get(9)?,
  })
}

fn record_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawRequestRecord> {
  Ok(RawRequestRecord {
    request:     request_from_row(row)?,
    owner_name:  row.get(10)?,
    owner_email: row.get(11)?,
  })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:      row.get(0)?,
    display_name: row.get(1)?,
    email:        row.get(2)?,
    verified:     row.get(3)?,
    created_at:   row.get(4)?,
  })
}

fn listing_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawListing> {
  Ok(RawListing {
    listing_id:  row.get(0)?,
    request_id:  row.get(1)?,
    kind:        row.get(2)?,
    creator_id:  row.get(3)?,
    detail_json: row.get(4)?,
    created_at:  row.get(5)?,
  })
}

fn order_clause(sort: SortField, direction: SortDirection) -> String {
  let key = match sort {
    SortField::CreatedAt => "r.created_at",
    SortField::Name => {
      "LOWER(COALESCE(json_extract(r.payload_json, '$.name'), ''))"
    }
    SortField::Status => "r.status",
  };
  let dir = match direction {
    SortDirection::Asc => "ASC",
    SortDirection::Desc => "DESC",
  };
  format!("{key} {dir}, r.request_id {dir}")
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gavel request store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All writes
/// go through one connection, so the conditional updates behind
/// [`RequestStore::decide_request`] and [`RequestStore::resubmit_kyc`] are
/// applied one at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a fully-built [`Request`] into the `requests` table.
  async fn insert_request(&self, request: &Request) -> Result<()> {
    let request_id_str  = encode_uuid(request.request_id);
    let kind_str        = encode_kind(request.kind()).to_owned();
    let owner_id_str    = encode_uuid(request.owner_id);
    let payload_str     =
      request.payload.to_json().map_err(Error::Core)?.to_string();
    let status_str      = encode_status(request.status).to_owned();
    let feedback        = request.admin_feedback.clone();
    let decided_by_str  = request.decided_by.map(encode_uuid);
    let decided_at_str  = request.decided_at.map(encode_dt);
    let created_at_str  = encode_dt(request.created_at);
    let materialization = request
      .materialization
      .map(|m| encode_materialization(m).to_owned());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO requests (
             request_id, kind, owner_id, payload_json, status,
             admin_feedback, decided_by, decided_at, created_at, materialization
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            request_id_str,
            kind_str,
            owner_id_str,
            payload_str,
            status_str,
            feedback,
            decided_by_str,
            decided_at_str,
            created_at_str,
            materialization,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_request(&self, id: Uuid) -> Result<Option<Request>> {
    let id_str = encode_uuid(id);
    let sql =
      format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE request_id = ?1");

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], request_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  async fn fetch_kyc(&self, owner_id: Uuid) -> Result<Option<Request>> {
    let owner_str = encode_uuid(owner_id);
    let sql = format!(
      "SELECT {REQUEST_COLUMNS} FROM requests \
       WHERE owner_id = ?1 AND kind = 'kyc'"
    );

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![owner_str], request_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  /// The guarded decision write. Returns the number of rows that matched the
  /// `status = 'pending'` condition — zero means the transition lost.
  async fn apply_decision(
    &self,
    id: Uuid,
    verdict: Verdict,
    feedback: String,
    decided_by: Uuid,
  ) -> Result<usize> {
    let id_str          = encode_uuid(id);
    let status_str      = encode_status(verdict.status()).to_owned();
    let decided_by_str  = encode_uuid(decided_by);
    let decided_at_str  = encode_dt(Utc::now());
    let materialization = (verdict == Verdict::Approved)
      .then(|| encode_materialization(MaterializationStatus::Pending).to_owned());

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE requests
           SET status = ?2, admin_feedback = ?3, decided_by = ?4,
               decided_at = ?5, materialization = ?6
           WHERE request_id = ?1 AND status = 'pending'",
          rusqlite::params![
            id_str,
            status_str,
            feedback,
            decided_by_str,
            decided_at_str,
            materialization,
          ],
        )?)
      })
      .await?;
    Ok(rows)
  }

  async fn insert_listing(&self, listing: &Listing) -> Result<()> {
    let listing_id_str = encode_uuid(listing.listing_id);
    let request_id_str = encode_uuid(listing.request_id);
    let kind_str       = encode_kind(listing.detail.kind()).to_owned();
    let creator_id_str = encode_uuid(listing.creator_id);
    let detail_str     =
      listing.detail.to_json().map_err(Error::Core)?.to_string();
    let created_at_str = encode_dt(listing.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO listings (
             listing_id, request_id, kind, creator_id, detail_json, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            listing_id_str,
            request_id_str,
            kind_str,
            creator_id_str,
            detail_str,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RequestStore impl ───────────────────────────────────────────────────────

impl RequestStore for SqliteStore {
  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user(&self, user: UserRef) -> gavel_core::Result<User> {
    let id_str  = encode_uuid(user.user_id);
    let now_str = encode_dt(Utc::now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, display_name, email, verified, created_at)
           VALUES (?1, ?2, ?3, 0, ?4)
           ON CONFLICT(user_id) DO UPDATE
           SET display_name = excluded.display_name, email = excluded.email",
          rusqlite::params![id_str, user.display_name, user.email, now_str],
        )?;
        Ok(conn.query_row(
          "SELECT user_id, display_name, email, verified, created_at
           FROM users WHERE user_id = ?1",
          rusqlite::params![id_str],
          user_from_row,
        )?)
      })
      .await
      .map_err(Error::Database)?;

    Ok(raw.into_user()?)
  }

  async fn get_user(&self, id: Uuid) -> gavel_core::Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, display_name, email, verified, created_at
               FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::Database)?;

    Ok(raw.map(RawUser::into_user).transpose()?)
  }

  async fn set_user_verified(
    &self,
    id: Uuid,
    verified: bool,
  ) -> gavel_core::Result<()> {
    let id_str = encode_uuid(id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET verified = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, verified],
        )?)
      })
      .await
      .map_err(Error::Database)?;

    if rows == 0 {
      return Err(gavel_core::Error::UserNotFound(id));
    }
    Ok(())
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn create_request(
    &self,
    input: NewRequest,
  ) -> gavel_core::Result<Request> {
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

    match self.insert_request(&request).await {
      Ok(()) => Ok(request),
      // The partial unique index on (owner_id) WHERE kind = 'kyc' caught a
      // second KYC row for this owner.
      Err(err)
        if err.is_constraint_violation()
          && request.kind() == RequestKind::Kyc =>
      {
        Err(gavel_core::Error::Conflict(request.owner_id))
      }
      Err(err) => Err(err.into()),
    }
  }

  async fn get_request(&self, id: Uuid) -> gavel_core::Result<Option<Request>> {
    Ok(self.fetch_request(id).await?)
  }

  async fn find_kyc_request(
    &self,
    owner_id: Uuid,
  ) -> gavel_core::Result<Option<Request>> {
    Ok(self.fetch_kyc(owner_id).await?)
  }

  async fn resubmit_kyc(
    &self,
    owner_id: Uuid,
    payload: KycPayload,
  ) -> gavel_core::Result<Request> {
    let payload = RequestPayload::Kyc(payload);
    let payload_str = payload.to_json()?.to_string();
    let owner_str = encode_uuid(owner_id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE requests
           SET payload_json = ?2, status = 'pending', admin_feedback = NULL,
               decided_by = NULL, decided_at = NULL, materialization = NULL
           WHERE owner_id = ?1 AND kind = 'kyc' AND status = 'rejected'",
          rusqlite::params![owner_str, payload_str],
        )?)
      })
      .await
      .map_err(Error::Database)?;

    if rows == 0 {
      return match self.fetch_kyc(owner_id).await? {
        None => Err(gavel_core::Error::NotFound(owner_id)),
        Some(_) => Err(gavel_core::Error::Conflict(owner_id)),
      };
    }

    self
      .fetch_kyc(owner_id)
      .await?
      .ok_or(gavel_core::Error::NotFound(owner_id))
  }

  async fn decide_request(
    &self,
    id: Uuid,
    verdict: Verdict,
    feedback: String,
    decided_by: Uuid,
  ) -> gavel_core::Result<Request> {
    let rows = self.apply_decision(id, verdict, feedback, decided_by).await?;

    if rows == 0 {
      // Distinguish an unknown id from a lost race / repeat decision.
      return match self.fetch_request(id).await? {
        None => Err(gavel_core::Error::NotFound(id)),
        Some(request) => Err(gavel_core::Error::AlreadyDecided {
          id,
          status: request.status,
        }),
      };
    }

    self
      .fetch_request(id)
      .await?
      .ok_or(gavel_core::Error::NotFound(id))
  }

  async fn set_materialization(
    &self,
    id: Uuid,
    status: MaterializationStatus,
  ) -> gavel_core::Result<()> {
    let id_str = encode_uuid(id);
    let status_str = encode_materialization(status).to_owned();

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE requests SET materialization = ?2 WHERE request_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await
      .map_err(Error::Database)?;

    if rows == 0 {
      return Err(gavel_core::Error::NotFound(id));
    }
    Ok(())
  }

  async fn search_requests(
    &self,
    kind: RequestKind,
    query: &RequestQuery,
  ) -> gavel_core::Result<Vec<RequestRecord>> {
    let kind_str   = encode_kind(kind).to_owned();
    let status_str = query.status.map(encode_status).map(str::to_owned);
    let owner_str  = query.owner.map(encode_uuid);
    let pattern    = query
      .search
      .as_deref()
      .map(|s| format!("%{}%", s.to_lowercase()));
    let limit_val  = query.limit.map(|l| l as i64).unwrap_or(-1);
    let offset_val = query.offset.unwrap_or(0) as i64;
    let order      = order_clause(query.sort, query.direction);

    let raws: Vec<RawRequestRecord> = self
      .conn
      .call(move |conn| {
        // Placeholders are fixed per condition; ?5/?6 always appear, so the
        // statement's parameter count covers every bound slot.
        let mut conds: Vec<&'static str> = vec!["r.kind = ?1"];
        if status_str.is_some() {
          conds.push("r.status = ?2");
        }
        if owner_str.is_some() {
          conds.push("r.owner_id = ?3");
        }
        if pattern.is_some() {
          conds.push(
            "(LOWER(COALESCE(json_extract(r.payload_json, '$.name'), '')) LIKE ?4
              OR LOWER(COALESCE(json_extract(r.payload_json, '$.description'), '')) LIKE ?4
              OR LOWER(u.display_name) LIKE ?4
              OR LOWER(u.email) LIKE ?4)",
          );
        }

        let sql = format!(
          "SELECT r.request_id, r.kind, r.owner_id, r.payload_json, r.status,
                  r.admin_feedback, r.decided_by, r.decided_at, r.created_at,
                  r.materialization, u.display_name, u.email
           FROM requests r
           JOIN users u ON u.user_id = r.owner_id
           WHERE {}
           ORDER BY {order}
           LIMIT ?5 OFFSET ?6",
          conds.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              kind_str,
              status_str.as_deref(),
              owner_str.as_deref(),
              pattern.as_deref(),
              limit_val,
              offset_val,
            ],
            record_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await
      .map_err(Error::Database)?;

    Ok(
      raws
        .into_iter()
        .map(RawRequestRecord::into_record)
        .collect::<Result<Vec<_>>>()?,
    )
  }

  // ── Listings ──────────────────────────────────────────────────────────────

  async fn create_listing(
    &self,
    input: NewListing,
  ) -> gavel_core::Result<Listing> {
    let listing = Listing {
      listing_id: Uuid::new_v4(),
      request_id: input.request_id,
      creator_id: input.creator_id,
      detail:     input.detail,
      created_at: Utc::now(),
    };

    self.insert_listing(&listing).await?;
    Ok(listing)
  }

  async fn find_listing_for_request(
    &self,
    request_id: Uuid,
  ) -> gavel_core::Result<Option<Listing>> {
    let request_id_str = encode_uuid(request_id);

    let raw: Option<RawListing> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT listing_id, request_id, kind, creator_id, detail_json,
                      created_at
               FROM listings WHERE request_id = ?1",
              rusqlite::params![request_id_str],
              listing_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::Database)?;

    Ok(raw.map(RawListing::into_listing).transpose()?)
  }
}
