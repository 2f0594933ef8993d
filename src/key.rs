use crate::models::{IdentityKey, TransactionRecord};

/// Text a missing secondary address name is coerced to before concatenation.
pub const MISSING_TEXT: &str = "nan";

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.trim().is_empty())
}

/// postcode + PAON + SAON + street, no separator.
///
/// Postcode, PAON and street are required: if any is absent or blank the key
/// is undefined. SAON is never absent; a missing SAON becomes [`MISSING_TEXT`]
/// and an empty one stays empty. Nothing is normalized.
pub fn identity_key(record: &TransactionRecord) -> Option<IdentityKey> {
    let postcode = required(&record.postcode)?;
    let paon = required(&record.paon)?;
    let street = required(&record.street)?;
    let saon = record.saon.as_deref().unwrap_or(MISSING_TEXT);

    let mut key = String::with_capacity(postcode.len() + paon.len() + saon.len() + street.len());
    key.push_str(postcode);
    key.push_str(paon);
    key.push_str(saon);
    key.push_str(street);
    Some(IdentityKey::new(key))
}

/// Names of the required fields that prevent a key from being built.
pub fn missing_fields(record: &TransactionRecord) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if required(&record.postcode).is_none() {
        missing.push("postcode");
    }
    if required(&record.paon).is_none() {
        missing.push("paon");
    }
    if required(&record.street).is_none() {
        missing.push("street");
    }
    missing
}
