//! Keyword-based topic detection.
//!
//! A coarse, deterministic mapping from raw text to one of the nine level-1
//! domains of the catalog. Used to seed classification, to pick guided
//! choices and to notice when a clarification reply changes the subject.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Level-1 domain of the category catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicDomain {
    #[serde(rename = "01-Acces-Authentification")]
    Access,
    #[serde(rename = "02-Messagerie")]
    Messaging,
    #[serde(rename = "03-Reseau-Internet")]
    Network,
    #[serde(rename = "04-Postes-travail")]
    Workstation,
    #[serde(rename = "05-Applications")]
    Applications,
    #[serde(rename = "06-Telephonie")]
    Telephony,
    #[serde(rename = "07-Fichiers-Partages")]
    FileShares,
    #[serde(rename = "08-Materiel")]
    Hardware,
    #[serde(rename = "09-Securite")]
    Security,
}

impl TopicDomain {
    pub const ALL: [TopicDomain; 9] = [
        TopicDomain::Access,
        TopicDomain::Messaging,
        TopicDomain::Network,
        TopicDomain::Workstation,
        TopicDomain::Applications,
        TopicDomain::Telephony,
        TopicDomain::FileShares,
        TopicDomain::Hardware,
        TopicDomain::Security,
    ];

    /// Catalog name of the level-1 node.
    pub fn as_name(&self) -> &'static str {
        match self {
            TopicDomain::Access => "01-Acces-Authentification",
            TopicDomain::Messaging => "02-Messagerie",
            TopicDomain::Network => "03-Reseau-Internet",
            TopicDomain::Workstation => "04-Postes-travail",
            TopicDomain::Applications => "05-Applications",
            TopicDomain::Telephony => "06-Telephonie",
            TopicDomain::FileShares => "07-Fichiers-Partages",
            TopicDomain::Hardware => "08-Materiel",
            TopicDomain::Security => "09-Securite",
        }
    }

    /// Problem description without article, e.g. "problème réseau".
    pub fn problem_label(&self) -> &'static str {
        match self {
            TopicDomain::Access => "problème d'accès",
            TopicDomain::Messaging => "problème de messagerie",
            TopicDomain::Network => "problème réseau",
            TopicDomain::Workstation => "problème de poste de travail",
            TopicDomain::Applications => "problème applicatif",
            TopicDomain::Telephony => "problème de téléphonie",
            TopicDomain::FileShares => "problème de fichiers/partages",
            TopicDomain::Hardware => "problème matériel",
            TopicDomain::Security => "problème de sécurité",
        }
    }

    /// Label used when the user is asked which topic to follow.
    pub fn topic_label(&self) -> String {
        match self {
            TopicDomain::Network => "un problème réseau/internet".to_string(),
            other => format!("un {}", other.problem_label()),
        }
    }

    /// Label used in first-turn clarification prompts.
    pub fn clarification_label(&self) -> String {
        format!("un {}", self.problem_label())
    }

    /// Whether a switch between the two domains is ambiguous enough to ask.
    pub fn is_compatible_with(&self, other: TopicDomain) -> bool {
        use TopicDomain::*;
        matches!(
            (*self, other),
            (Messaging, Network)
                | (Network, Messaging)
                | (Applications, Workstation)
                | (Workstation, Applications)
                | (Applications, Hardware)
                | (Hardware, Applications)
                | (Access, Network)
                | (Network, Access)
        )
    }
}

impl fmt::Display for TopicDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_name())
    }
}

impl FromStr for TopicDomain {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TopicDomain::ALL
            .iter()
            .copied()
            .find(|d| d.as_name() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("domain", format!("unknown domain '{}'", s))
            })
    }
}

/// Keyword to domain table. Order matters: the first hit wins.
const KEYWORD_TABLE: &[(&str, TopicDomain)] = &[
    ("lent", TopicDomain::Workstation),
    ("lenteur", TopicDomain::Workstation),
    ("lente", TopicDomain::Workstation),
    ("ordinateur", TopicDomain::Workstation),
    ("pc", TopicDomain::Workstation),
    ("écran", TopicDomain::Hardware),
    ("clavier", TopicDomain::Hardware),
    ("souris", TopicDomain::Hardware),
    ("application", TopicDomain::Applications),
    ("logiciel", TopicDomain::Applications),
    ("excel", TopicDomain::Applications),
    ("word", TopicDomain::Applications),
    ("teams", TopicDomain::Applications),
    ("sap", TopicDomain::Applications),
    ("julius", TopicDomain::Applications),
    ("plante", TopicDomain::Applications),
    ("crash", TopicDomain::Applications),
    ("wifi", TopicDomain::Network),
    ("internet", TopicDomain::Network),
    ("réseau", TopicDomain::Network),
    ("reseau", TopicDomain::Network),
    ("connexion", TopicDomain::Network),
    ("vpn", TopicDomain::Network),
    ("mot de passe", TopicDomain::Access),
    ("password", TopicDomain::Access),
    ("bloqué", TopicDomain::Access),
    ("bloque", TopicDomain::Access),
    ("compte", TopicDomain::Access),
    ("connecter", TopicDomain::Access),
    ("permissions", TopicDomain::Access),
    // Outlook belongs to messaging, not applications.
    ("email", TopicDomain::Messaging),
    ("mail", TopicDomain::Messaging),
    ("messagerie", TopicDomain::Messaging),
    ("outlook", TopicDomain::Messaging),
    ("imprimante", TopicDomain::Hardware),
    ("imprimer", TopicDomain::Hardware),
    ("impression", TopicDomain::Hardware),
    ("imprime", TopicDomain::Hardware),
    ("telephone", TopicDomain::Telephony),
    ("téléphone", TopicDomain::Telephony),
    ("casque", TopicDomain::Telephony),
    ("appel", TopicDomain::Telephony),
    ("softphone", TopicDomain::Telephony),
    ("audio", TopicDomain::Telephony),
    ("fichier", TopicDomain::FileShares),
    ("partage", TopicDomain::FileShares),
    ("onedrive", TopicDomain::FileShares),
    ("sharepoint", TopicDomain::FileShares),
    ("dossier", TopicDomain::FileShares),
    ("virus", TopicDomain::Security),
    ("antivirus", TopicDomain::Security),
    ("phishing", TopicDomain::Security),
    ("suspect", TopicDomain::Security),
    ("securite", TopicDomain::Security),
    ("sécurité", TopicDomain::Security),
];

/// Returns the domain of the first table keyword contained in `text`.
pub fn detect_context(text: &str) -> Option<TopicDomain> {
    let lowered = text.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, domain)| *domain)
}

/// True if `text` contains any context keyword.
pub fn has_context_keyword(text: &str) -> bool {
    detect_context(text).is_some()
}

/// What to do with a clarification reply relative to the original message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Same problem: fold the reply into the original.
    Merge,
    /// Possibly related problem: let the user decide.
    AskUser,
    /// Unrelated problem: restart on the reply alone.
    Replace,
}

/// Outcome of comparing the original message with a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicShift {
    pub shifted: bool,
    pub original_context: Option<TopicDomain>,
    pub new_context: Option<TopicDomain>,
    pub recommendation: Recommendation,
}

/// Detects whether `reply` moves the conversation to another domain.
pub fn detect_topic_shift(original: &str, reply: &str) -> TopicShift {
    let original_context = detect_context(original);
    let new_context = detect_context(reply);

    let recommendation = match (original_context, new_context) {
        (Some(old), Some(new)) if old != new => {
            if old.is_compatible_with(new) {
                Recommendation::AskUser
            } else {
                Recommendation::Replace
            }
        }
        _ => Recommendation::Merge,
    };

    TopicShift {
        shifted: recommendation != Recommendation::Merge,
        original_context,
        new_context,
        recommendation,
    }
}
