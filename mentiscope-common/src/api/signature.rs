//! Payment webhook signature calculation and validation
//!
//! # Algorithm
//!
//! 1. Convert the webhook JSON body to canonical form (sorted keys, no whitespace)
//! 2. Append the shared webhook secret
//! 3. SHA-256 of the concatenated string, as 64 lowercase hex characters
//!
//! An empty secret disables verification; the service decides that before
//! calling in here.

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Signature validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Signature header absent from the request
    #[error("Missing signature")]
    Missing,

    /// Signature does not match calculated value
    #[error("Invalid signature")]
    Mismatch { provided: String, calculated: String },
}

/// Calculate the signature for a webhook body
///
/// # Examples
///
/// ```
/// use mentiscope_common::api::signature::calculate_signature;
/// use serde_json::json;
///
/// let body = json!({"type": "subscription.created", "data": {}});
/// let signature = calculate_signature(&body, "whsec_test");
/// assert_eq!(signature.len(), 64); // SHA-256 is 64 hex chars
/// ```
pub fn calculate_signature(body: &Value, secret: &str) -> String {
    let canonical = to_canonical_json(body);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update(secret.as_bytes());
    let result = hasher.finalize();

    format!("{:x}", result)
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
///
/// Strings are emitted through serde_json so escaping matches what a JSON
/// encoder on the sending side produces.
///
/// # Examples
///
/// ```
/// use mentiscope_common::api::signature::to_canonical_json;
/// use serde_json::json;
///
/// let canonical = to_canonical_json(&json!({"z": 3, "a": 1, "m": [true, null]}));
/// assert_eq!(canonical, r#"{"a":1,"m":[true,null],"z":3}"#);
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // Scalars serialize compactly already
        other => other.to_string(),
    }
}

/// Validate a provided signature against the body
pub fn verify_signature(
    provided: Option<&str>,
    body: &Value,
    secret: &str,
) -> Result<(), SignatureError> {
    let provided = provided.map(str::trim).ok_or(SignatureError::Missing)?;
    let calculated = calculate_signature(body, secret);

    if !provided.eq_ignore_ascii_case(&calculated) {
        return Err(SignatureError::Mismatch {
            provided: provided.to_string(),
            calculated,
        });
    }

    Ok(())
}
