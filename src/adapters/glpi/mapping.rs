//! Value mapping and request bodies for the GLPI REST API.

use serde_json::{json, Value};

use crate::domain::foundation::{CategoryId, Priority};
use crate::domain::ticket::TicketStatus;
use crate::ports::ExternalTicket;

/// GLPI status code for a new ticket.
pub const GLPI_STATUS_NEW: i64 = 1;

/// GLPI ticket type "incident".
pub const GLPI_TYPE_INCIDENT: i64 = 1;

/// GLPI actor type "requester".
pub const GLPI_ACTOR_REQUESTER: i64 = 1;

/// Search option id of the user email field.
pub const GLPI_USER_EMAIL_FIELD: &str = "5";

/// Search option id of the user id column in search results.
pub const GLPI_USER_ID_COLUMN: &str = "2";

pub fn priority_code(priority: Priority) -> i64 {
    match priority {
        Priority::Low => 2,
        Priority::Medium => 3,
        Priority::High => 4,
        Priority::Critical => 5,
    }
}

pub fn status_code(status: TicketStatus) -> i64 {
    match status {
        TicketStatus::Open => GLPI_STATUS_NEW,
        TicketStatus::InProgress => 2,
        TicketStatus::Resolved => 5,
        TicketStatus::Closed => 6,
    }
}

/// GLPI ITIL categories share the local ids.
pub fn category_code(category_id: Option<CategoryId>) -> Option<i64> {
    category_id.map(|id| id.value())
}

pub(super) fn ticket_payload(ticket: &ExternalTicket) -> Value {
    let mut input = json!({
        "name": ticket.title,
        "content": ticket.description,
        "priority": priority_code(ticket.priority),
        "status": GLPI_STATUS_NEW,
        "type": GLPI_TYPE_INCIDENT,
    });
    if let Some(category) = category_code(ticket.category_id) {
        input["itilcategories_id"] = json!(category);
    }
    json!({ "input": input })
}

pub(super) fn followup_payload(ticket_id: i64, text: &str, private: bool) -> Value {
    json!({
        "input": {
            "itemtype": "Ticket",
            "items_id": ticket_id,
            "content": text,
            "is_private": if private { 1 } else { 0 },
        }
    })
}

pub(super) fn requester_payload(ticket_id: i64, user_id: i64) -> Value {
    json!({
        "input": {
            "tickets_id": ticket_id,
            "users_id": user_id,
            "type": GLPI_ACTOR_REQUESTER,
        }
    })
}

/// Reads `id` from a creation response.
pub(super) fn created_id(response: &Value) -> Option<i64> {
    as_id(response.get("id")?)
}

/// Reads the first user id from a `/search/User` response.
pub(super) fn first_user_id(response: &Value) -> Option<i64> {
    let row = response.get("data")?.as_array()?.first()?;
    as_id(row.get(GLPI_USER_ID_COLUMN)?)
}

fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
