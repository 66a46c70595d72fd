//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `catalog` - Category tree and directory users
//! - `triage` - Conversation state machine pieces and the analysis session
//! - `ticket` - Ticket aggregate, numbering and description text

pub mod catalog;
pub mod foundation;
pub mod ticket;
pub mod triage;
