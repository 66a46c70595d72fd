//! Guided choices offered to the user during clarification.
//!
//! Three families exist:
//! - catalog choices (`cat_<id>`), built from the live category tree;
//! - dynamic choices (`dynamic_*`), parsed from the classifier's question;
//! - a static legacy set used when no catalog is available.

use serde::{Deserialize, Serialize};

use super::context::TopicDomain;
use crate::domain::catalog::{label_for, icon_for, Category};
use crate::domain::foundation::CategoryId;

/// Prefix of choices that reference a catalog node.
pub const CATALOG_CHOICE_PREFIX: &str = "cat_";

/// Prefix of choices parsed from a clarification question.
pub const DYNAMIC_CHOICE_PREFIX: &str = "dynamic_";

/// A clickable suggestion. Never persisted; only the picked id is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidedChoice {
    pub id: String,
    pub label: String,
    pub icon: String,
}

impl GuidedChoice {
    pub fn new(id: impl Into<String>, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: icon.into(),
        }
    }

    /// Choice pointing at a catalog node.
    pub fn from_category(category: &Category) -> Self {
        Self::new(
            format!("{}{}", CATALOG_CHOICE_PREFIX, category.id),
            label_for(&category.name),
            icon_for(&category.name),
        )
    }

    /// True if the label already stands for "something else".
    pub fn is_other(&self) -> bool {
        self.label.to_lowercase().contains("autre")
    }
}

/// Parses `cat_<id>` choice ids.
pub fn catalog_choice_id(choice_id: &str) -> Option<CategoryId> {
    choice_id
        .strip_prefix(CATALOG_CHOICE_PREFIX)
        .and_then(|raw| raw.parse().ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog-derived choices
// ─────────────────────────────────────────────────────────────────────────────

/// Active level-1 domains sorted by name, followed by a catch-all.
pub fn main_choices(categories: &[Category]) -> Vec<GuidedChoice> {
    let mut domains: Vec<&Category> = categories
        .iter()
        .filter(|c| c.is_domain() && c.is_active && !c.is_uncategorized())
        .collect();
    domains.sort_by(|a, b| a.name.cmp(&b.name));

    let mut choices: Vec<GuidedChoice> = domains.into_iter().map(GuidedChoice::from_category).collect();
    if !choices.iter().any(GuidedChoice::is_other) {
        choices.push(GuidedChoice::new("cat_other", "Autre problème", "❓"));
    }
    choices
}

/// Active children of `parent_id`; `_`-prefixed buckets come last.
pub fn sub_choices(categories: &[Category], parent_id: CategoryId) -> Vec<GuidedChoice> {
    let mut children: Vec<&Category> = categories
        .iter()
        .filter(|c| c.parent_id == Some(parent_id) && c.is_active)
        .collect();
    children.sort_by(|a, b| {
        (a.name.starts_with('_'), &a.name).cmp(&(b.name.starts_with('_'), &b.name))
    });
    children.into_iter().map(GuidedChoice::from_category).collect()
}

/// Children of the level-1 node named after `domain`, if any.
pub fn domain_choices(categories: &[Category], domain: TopicDomain) -> Vec<GuidedChoice> {
    crate::domain::catalog::find_domain_by_name(categories, domain.as_name())
        .map(|parent| sub_choices(categories, parent.id))
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Legacy static set
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level groups of the static set, with the domain each one stands for.
const LEGACY_GROUPS: &[(&str, &str, &str, Option<TopicDomain>)] = &[
    ("hardware", "Mon ordinateur / matériel", "💻", Some(TopicDomain::Workstation)),
    ("software", "Une application / logiciel", "📱", Some(TopicDomain::Applications)),
    ("network", "Internet / Réseau / WiFi", "🌐", Some(TopicDomain::Network)),
    ("access", "Accès / Mot de passe", "🔐", Some(TopicDomain::Access)),
    ("email", "Messagerie / Email", "📧", Some(TopicDomain::Messaging)),
    ("printer", "Imprimante", "🖨️", Some(TopicDomain::Hardware)),
    ("other", "Autre problème", "❓", None),
];

const LEGACY_SUB_CHOICES: &[(&str, &[(&str, &str, &str)])] = &[
    (
        "hardware",
        &[
            ("hw_no_boot", "Ne démarre pas / écran noir", "⚫"),
            ("hw_slow", "Très lent", "🐢"),
            ("hw_error", "Affiche un message d'erreur", "⚠️"),
            ("hw_screen", "Problème d'écran / affichage", "🖥️"),
            ("hw_other", "Autre problème matériel", "🔧"),
        ],
    ),
    (
        "software",
        &[
            ("sw_no_start", "Ne s'ouvre pas / ne démarre pas", "🚫"),
            ("sw_crash", "Plante / se ferme tout seul", "💥"),
            ("sw_install", "Besoin d'installer un logiciel", "📦"),
            ("sw_slow", "Application très lente", "🐢"),
            ("sw_other", "Autre problème logiciel", "🔧"),
        ],
    ),
    (
        "network",
        &[
            ("net_wifi", "WiFi ne fonctionne pas", "📶"),
            ("net_slow", "Internet très lent", "🐢"),
            ("net_no_internet", "Pas d'accès Internet du tout", "🚫"),
            ("net_vpn", "Problème de VPN", "🔒"),
            ("net_other", "Autre problème réseau", "🔧"),
        ],
    ),
    (
        "access",
        &[
            ("acc_password", "Mot de passe oublié", "🔑"),
            ("acc_locked", "Compte bloqué", "🔒"),
            ("acc_vpn", "Accès VPN", "🌐"),
            ("acc_permissions", "Droits d'accès manquants", "🚪"),
            ("acc_other", "Autre problème d'accès", "🔧"),
        ],
    ),
    (
        "email",
        &[
            ("email_no_receive", "Ne reçois plus mes emails", "📥"),
            ("email_no_send", "Ne peux pas envoyer d'emails", "📤"),
            ("email_full", "Boîte mail pleine", "📬"),
            ("email_other", "Autre problème email", "🔧"),
        ],
    ),
    (
        "printer",
        &[
            ("print_not_working", "N'imprime pas du tout", "🚫"),
            ("print_quality", "Mauvaise qualité d'impression", "📄"),
            ("print_jam", "Bourrage papier", "📃"),
            ("print_not_found", "Imprimante non détectée", "🔍"),
            ("print_other", "Autre problème d'imprimante", "🔧"),
        ],
    ),
];

const LEGACY_CLOSED: &[(&str, &str, &str)] = &[
    ("yes_error", "Oui, il y a un message d'erreur", "✅"),
    ("no_error", "Non, pas de message d'erreur", "❌"),
    ("dont_know", "Je ne sais pas", "🤷"),
];

const TOPIC_SHIFT: &[(&str, &str, &str)] = &[
    ("keep_new", "Oui, le nouveau problème", "✅"),
    ("keep_old", "Non, revenir au problème initial", "↩️"),
    ("both_problems", "J'ai les deux problèmes", "🔗"),
];

fn to_choices(entries: &[(&str, &str, &str)]) -> Vec<GuidedChoice> {
    entries
        .iter()
        .map(|(id, label, icon)| GuidedChoice::new(*id, *label, *icon))
        .collect()
}

/// Static top-level set.
pub fn legacy_main_choices() -> Vec<GuidedChoice> {
    LEGACY_GROUPS
        .iter()
        .map(|(id, label, icon, _)| GuidedChoice::new(*id, *label, *icon))
        .collect()
}

/// Static sub-choices of a legacy group, e.g. `"network"`.
pub fn legacy_sub_choices(group: &str) -> Option<Vec<GuidedChoice>> {
    LEGACY_SUB_CHOICES
        .iter()
        .find(|(name, _)| *name == group)
        .map(|(_, entries)| to_choices(entries))
}

/// Legacy group standing for a domain, if the static set has one.
pub fn legacy_group_for(domain: TopicDomain) -> Option<&'static str> {
    LEGACY_GROUPS
        .iter()
        .find(|(_, _, _, d)| *d == Some(domain))
        .map(|(id, _, _, _)| *id)
}

/// Domain implied by a legacy choice id (a group or one of its sub-choices).
pub fn legacy_domain_of(choice_id: &str) -> Option<TopicDomain> {
    let group = LEGACY_SUB_CHOICES
        .iter()
        .find(|(name, entries)| {
            *name == choice_id || entries.iter().any(|(id, _, _)| *id == choice_id)
        })
        .map(|(name, _)| *name)?;

    LEGACY_GROUPS
        .iter()
        .find(|(id, _, _, _)| *id == group)
        .and_then(|(_, _, _, domain)| *domain)
}

/// Static choices for an attempt, mirroring the catalog-driven progression.
pub fn legacy_choices(
    attempt: u32,
    detected: Option<TopicDomain>,
    previous_choice: Option<&str>,
) -> Vec<GuidedChoice> {
    if attempt >= 2 {
        return closed_choices();
    }

    let from_previous = if attempt == 1 {
        previous_choice.and_then(legacy_sub_choices)
    } else {
        None
    };

    from_previous
        .or_else(|| detected.and_then(legacy_group_for).and_then(legacy_sub_choices))
        .unwrap_or_else(legacy_main_choices)
}

/// Yes / no / unsure about an error message.
pub fn closed_choices() -> Vec<GuidedChoice> {
    to_choices(LEGACY_CLOSED)
}

/// Keep the new problem, go back to the old one, or handle both.
pub fn topic_shift_choices() -> Vec<GuidedChoice> {
    to_choices(TOPIC_SHIFT)
}
