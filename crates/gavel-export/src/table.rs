//! Tabular projection of request records, one column set per kind.

use gavel_core::{
  Result,
  actor::Actor,
  request::{Request, RequestKind, RequestPayload},
  store::RequestRecord,
};

use crate::encode::encode_row;

/// Column headers for `kind`: the shared audit columns followed by the
/// kind-specific payload columns, in the order [`payload_fields`] emits them.
fn header(kind: RequestKind) -> Vec<&'static str> {
  let mut cols = vec![
    "request_id",
    "owner_name",
    "owner_email",
    "status",
    "created_at",
    "decided_at",
    "feedback",
  ];
  cols.extend(match kind {
    RequestKind::Kyc => [
      "contact_email",
      "contact_phone",
      "id_document_ref",
      "address_document_ref",
    ]
    .as_slice(),
    RequestKind::Nft => {
      ["name", "description", "price", "quantity", "category", "image_ref"]
        .as_slice()
    }
    RequestKind::Bond => [
      "name",
      "description",
      "face_value",
      "interest_rate",
      "maturity_period_days",
      "quantity",
      "terms",
    ]
    .as_slice(),
    RequestKind::Token => [
      "name",
      "symbol",
      "description",
      "total_supply",
      "decimals",
      "token_type",
      "features",
      "initial_price",
      "use_case",
      "target_network",
    ]
    .as_slice(),
  });
  cols
}

fn common_fields(record: &RequestRecord) -> Vec<String> {
  let request: &Request = &record.request;
  vec![
    request.request_id.to_string(),
    record.owner_name.clone(),
    record.owner_email.clone(),
    request.status.to_string(),
    request.created_at.to_rfc3339(),
    request
      .decided_at
      .map(|dt| dt.to_rfc3339())
      .unwrap_or_default(),
    request.admin_feedback.clone().unwrap_or_default(),
  ]
}

fn payload_fields(payload: &RequestPayload) -> Vec<String> {
  match payload {
    RequestPayload::Kyc(p) => vec![
      p.contact_email.clone(),
      p.contact_phone.clone().unwrap_or_default(),
      p.id_document_ref.clone(),
      p.address_document_ref.clone(),
    ],
    RequestPayload::Nft(p) => vec![
      p.name.clone(),
      p.description.clone(),
      p.price.to_string(),
      p.quantity.to_string(),
      p.category.clone(),
      p.image_ref.clone(),
    ],
    RequestPayload::Bond(p) => vec![
      p.name.clone(),
      p.description.clone(),
      p.face_value.to_string(),
      p.interest_rate.to_string(),
      p.maturity_period_days.to_string(),
      p.quantity.to_string(),
      p.terms.clone(),
    ],
    RequestPayload::Token(p) => vec![
      p.name.clone(),
      p.symbol.clone(),
      p.description.clone(),
      p.total_supply.to_string(),
      p.decimals.to_string(),
      p.token_type.clone(),
      p.features.summary(),
      p.initial_price.to_string(),
      p.use_case.clone(),
      p.target_network.clone(),
    ],
  }
}

/// Encode `records` as a CSV document for `kind`, one row per record plus a
/// header row. Admin-only — this is the same authorization predicate the
/// decision and bulk operations evaluate.
pub fn requests_to_csv(
  actor: &Actor,
  kind: RequestKind,
  records: &[RequestRecord],
) -> Result<String> {
  actor.require_admin()?;

  let mut out = encode_row(header(kind));
  for record in records.iter().filter(|r| r.request.kind() == kind) {
    let mut fields = common_fields(record);
    fields.extend(payload_fields(&record.request.payload));
    out.push_str(&encode_row(fields));
  }
  Ok(out)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
