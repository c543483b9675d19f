//! Data models representing stored documents.
//!
//! Each model serializes to the JSON body of a document in its collection,
//! plus the request types the HTTP boundary deserializes.

/// Order document model
pub mod order;
/// User document model
pub mod user;
