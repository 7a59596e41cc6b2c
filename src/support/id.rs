//! Correlation identifiers for outbound calls.

use uuid::Uuid;

/// A fresh 128-bit id as 32 lowercase hex characters.
pub fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}
