//! SQL schema for the Gavel SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    email        TEXT NOT NULL,
    verified     INTEGER NOT NULL DEFAULT 0,  -- flipped only by KYC approval
    created_at   TEXT NOT NULL
);

-- One row per submitted request. The only UPDATEs ever issued against this
-- table are the guarded decision transition, the guarded KYC resubmission,
-- and the materialization bookkeeping column.
CREATE TABLE IF NOT EXISTS requests (
    request_id      TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,            -- 'kyc' | 'nft' | 'bond' | 'token'
    owner_id        TEXT NOT NULL REFERENCES users(user_id),
    payload_json    TEXT NOT NULL,            -- JSON payload (inner data only)
    status          TEXT NOT NULL DEFAULT 'pending',
    admin_feedback  TEXT,                     -- written by decisions only
    decided_by      TEXT,
    decided_at      TEXT,                     -- ISO 8601 UTC
    created_at      TEXT NOT NULL,
    materialization TEXT                      -- NULL | 'pending' | 'done' | 'failed'
);

-- One KYC record per owner; resubmission reuses the row.
CREATE UNIQUE INDEX IF NOT EXISTS requests_kyc_owner_idx
    ON requests(owner_id) WHERE kind = 'kyc';

CREATE INDEX IF NOT EXISTS requests_kind_status_idx ON requests(kind, status);
CREATE INDEX IF NOT EXISTS requests_owner_idx       ON requests(owner_id);
CREATE INDEX IF NOT EXISTS requests_created_idx     ON requests(created_at);

-- Live entities materialized from approved requests. UNIQUE(request_id) is
-- the idempotency backstop: two racing materializations cannot both insert.
CREATE TABLE IF NOT EXISTS listings (
    listing_id  TEXT PRIMARY KEY,
    request_id  TEXT NOT NULL REFERENCES requests(request_id),
    kind        TEXT NOT NULL,                -- 'nft' | 'bond' | 'token'
    creator_id  TEXT NOT NULL REFERENCES users(user_id),
    detail_json TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (request_id)
);

PRAGMA user_version = 1;
";
