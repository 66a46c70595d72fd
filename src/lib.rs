//! Ticket Triage - Conversational IT-support triage
//!
//! This crate turns a free-text problem report into a validated support
//! ticket. A scored classification decides whether to create the ticket
//! right away, ask for confirmation, or ask a clarifying question. After
//! too many unresolved turns the request is escalated to a human.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
