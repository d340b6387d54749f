//! Record id generation
//!
//! Ids are UUIDv7 values rendered as 32 lowercase hex characters. The leading
//! 48 bits are a millisecond timestamp and the rest is random, so ids sort
//! roughly by creation time. Two ids generated in the same millisecond can
//! only collide if the random part does too; that risk is accepted and not
//! checked.

use uuid::Uuid;

/// Generate a fresh record id
pub fn generate_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Check that a string looks like an id produced by [`generate_id`]
pub fn is_generated_id(s: &str) -> bool {
    s.len() == 32 && Uuid::try_parse(s).is_ok()
}
