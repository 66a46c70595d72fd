//! GLPI adapter - External ticket-of-record system.
//!
//! `GlpiClient` implements the `ExternalTicketing` port over the GLPI REST
//! API with a lazily opened, lazily renewed session token.

mod client;
mod mapping;

pub use client::{GlpiClient, GlpiConfig};
pub use mapping::{category_code, priority_code, status_code};
