//! CSV export for the moderation UI.
//!
//! Encodes request records as RFC 4180 CSV: CRLF row endings, fields quoted
//! whenever they contain a delimiter, quote, or line break. Rows are emitted
//! for exactly the records given — nothing is dropped or re-filtered here.

mod encode;
mod table;

pub use encode::{encode_field, encode_row};
pub use table::requests_to_csv;
