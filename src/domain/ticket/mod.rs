//! Ticket domain module.
//!
//! The immutable artifact a successful triage produces, its per-year
//! number, and the text built for it.

mod aggregate;
mod description;
mod number;
mod validation;

pub use aggregate::{ExternalLink, NewTicket, Ticket, TicketStatus, MAX_TICKET_TITLE_LENGTH};
pub use description::{
    analysis_note, build_description, escalation_description, escalation_title,
    external_description, UNTITLED_TICKET,
};
pub use number::TicketNumber;
pub use validation::ValidationMethod;
