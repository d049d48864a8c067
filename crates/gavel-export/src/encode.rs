//! RFC 4180 field and row encoding.

/// Encode one field, quoting when it contains `,`, `"`, CR, or LF and
/// doubling any embedded quotes.
pub fn encode_field(field: &str) -> String {
  let needs_quoting =
    field.contains([',', '"', '\r', '\n']);
  if !needs_quoting {
    return field.to_string();
  }
  let mut out = String::with_capacity(field.len() + 2);
  out.push('"');
  for ch in field.chars() {
    if ch == '"' {
      out.push('"');
    }
    out.push(ch);
  }
  out.push('"');
  out
}

/// Encode one record as a CRLF-terminated row.
pub fn encode_row<I, F>(fields: I) -> String
where
  I: IntoIterator<Item = F>,
  F: AsRef<str>,
{
  let mut out = String::new();
  for (i, field) in fields.into_iter().enumerate() {
    if i > 0 {
      out.push(',');
    }
    out.push_str(&encode_field(field.as_ref()));
  }
  out.push_str("\r\n");
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
