//! Order-independent document digests.
//!
//! Both sides of a copy are serialized to a canonical JSON form (object keys
//! sorted at every depth, no insignificant whitespace) and hashed with
//! SHA-256. Array order is significant.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Canonical JSON bytes of `value`.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_scalar(&Value::String(key.clone()), out);
                out.push(b':');
                write_canonical(val, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        scalar => write_scalar(scalar, out),
    }
}

fn write_scalar(value: &Value, out: &mut Vec<u8>) {
    // Serializing a scalar into a Vec cannot fail.
    if serde_json::to_writer(&mut *out, value).is_err() {
        out.extend_from_slice(b"null");
    }
}

/// Hex SHA-256 of the canonical form of `value`.
pub fn document_digest(value: &Value) -> String {
    hex::encode(Sha256::digest(canonical_bytes(value)))
}

/// Structural equality via digests.
pub fn documents_match(source: &Value, destination: &Value) -> bool {
    document_digest(source) == document_digest(destination)
}
