//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the triage domain.

mod errors;
mod ids;
mod priority;
mod session_status;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CategoryId, SessionId, TicketId, UserId};
pub use priority::Priority;
pub use session_status::SessionStatus;
pub use timestamp::Timestamp;
