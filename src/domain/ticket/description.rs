//! Ticket text builders.

use std::collections::BTreeMap;

use super::ValidationMethod;
use crate::domain::triage::display_value;

/// Title used when the summary carries none.
pub const UNTITLED_TICKET: &str = "Ticket sans titre";

const ESCALATION_TITLE_SNIPPET: usize = 50;

/// Description stored on the ticket: symptom bullets, then extracted fields.
pub fn build_description(
    symptoms: &[String],
    extracted_info: &BTreeMap<String, serde_json::Value>,
) -> String {
    let mut parts = vec!["🤖 Ticket créé automatiquement\n".to_string()];

    parts.push("\n📋 **Symptômes** :".to_string());
    for symptom in symptoms {
        parts.push(format!("  • {}", symptom));
    }

    let fields: Vec<String> = extracted_info
        .iter()
        .filter_map(|(key, value)| {
            display_value(value).map(|v| format!("  • {}: {}", title_case(key), v))
        })
        .collect();
    if !fields.is_empty() {
        parts.push("\n\n🔍 **Informations extraites** :".to_string());
        parts.extend(fields);
    }

    parts.join("\n")
}

/// Copy sent to the external system, which also gets the raw message.
pub fn external_description(description: &str, original_message: &str) -> String {
    format!(
        "{}\n\n---\nMessage original:\n{}",
        description, original_message
    )
}

/// Private analysis note attached to the external ticket.
pub fn analysis_note(confidence: f64, method: ValidationMethod, symptoms: &[String]) -> String {
    format!(
        "🤖 Analyse IA:\n- Confiance: {:.0}%\n- Méthode de validation: {}\n- Symptômes: {}",
        confidence * 100.0,
        method,
        symptoms.join(", ")
    )
}

pub fn escalation_title(message: &str) -> String {
    let snippet: String = message.chars().take(ESCALATION_TITLE_SNIPPET).collect();
    format!("Demande nécessitant clarification : {}...", snippet)
}

pub fn escalation_description(message: &str, attempts: u32) -> String {
    format!(
        "🤖 Ticket créé automatiquement après {} tentatives de clarification.\n\n\
         **Message utilisateur :**\n{}\n\n\
         **Raison :** Le chatbot n'a pas pu comprendre la demande après plusieurs échanges.\n\
         **Action requise :** Un technicien doit contacter l'utilisateur pour clarifier.",
        attempts, message
    )
}

/// "operating_system" -> "Operating System".
fn title_case(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
