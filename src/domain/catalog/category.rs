//! Category tree nodes.
//!
//! The catalog is a two-level tree: level-1 "domain" nodes group level-2
//! leaves. Only leaves are offered to the classifier as candidate labels.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::CategoryId;

/// Abbreviation of the bucket that receives escalated, unclassified tickets.
pub const UNCATEGORIZED_ABBREVIATION: &str = "99-non-cat";

/// Display name of the uncategorized bucket.
pub const UNCATEGORIZED_NAME: &str = "Non catégorisé";

/// Level of a domain (parent) node.
pub const DOMAIN_LEVEL: u8 = 1;

/// Level of a leaf node.
pub const LEAF_LEVEL: u8 = 2;

/// A node of the category catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub abbreviation: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub level: u8,
    pub is_active: bool,
    pub description: Option<String>,
}

impl Category {
    /// Creates an active level-1 domain node.
    pub fn domain(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            abbreviation: None,
            parent_id: None,
            level: DOMAIN_LEVEL,
            is_active: true,
            description: None,
        }
    }

    /// Creates an active level-2 leaf under `parent_id`.
    pub fn leaf(id: CategoryId, name: impl Into<String>, parent_id: CategoryId) -> Self {
        Self {
            id,
            name: name.into(),
            abbreviation: None,
            parent_id: Some(parent_id),
            level: LEAF_LEVEL,
            is_active: true,
            description: None,
        }
    }

    /// Sets the abbreviation.
    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_domain(&self) -> bool {
        self.level == DOMAIN_LEVEL
    }

    pub fn is_leaf(&self) -> bool {
        self.level == LEAF_LEVEL
    }

    /// True for the escalation bucket.
    pub fn is_uncategorized(&self) -> bool {
        self.abbreviation.as_deref() == Some(UNCATEGORIZED_ABBREVIATION)
    }
}

/// Active leaves, in catalog order.
pub fn active_leaves(categories: &[Category]) -> Vec<Category> {
    categories
        .iter()
        .filter(|c| c.is_leaf() && c.is_active)
        .cloned()
        .collect()
}

/// Finds a level-1 node by its exact name.
pub fn find_domain_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.is_domain() && c.name == name)
}

/// Default catalog: nine domains, each with its leaves and a trailing `_AUTRES`.
pub fn default_tree() -> Vec<Category> {
    const TREE: &[(&str, &[&str])] = &[
        ("01-Acces-Authentification", &["Mot-de-passe", "Compte-utilisateur", "Permissions"]),
        ("02-Messagerie", &["Outlook", "Email-bloque", "Configuration"]),
        ("03-Reseau-Internet", &["Wifi", "Cable-Ethernet", "VPN", "Pas-de-connexion"]),
        (
            "04-Postes-travail",
            &["PC-lent", "PC-bloque", "Mise-a-jour-Windows", "Redemarrage"],
        ),
        (
            "05-Applications",
            &["Julius", "SAP", "Microsoft-365", "Navigateur", "Bug-fonctionnel"],
        ),
        ("06-Telephonie", &["Soft-phone", "Casque", "Qualite-audio", "Appels"]),
        ("07-Fichiers-Partages", &["Acces-refuse", "Dossiers-reseau", "OneDrive-SharePoint"]),
        ("08-Materiel", &["Imprimante", "Ecran", "Clavier-Souris"]),
        ("09-Securite", &["Antivirus", "Email-suspect", "Lien-suspect", "Phishing"]),
    ];

    let mut categories = Vec::new();
    let mut next_leaf_id = (TREE.len() as i64) + 1;

    for (index, (domain, leaves)) in TREE.iter().enumerate() {
        let domain_id = CategoryId::new(index as i64 + 1);
        categories.push(Category::domain(domain_id, *domain).with_abbreviation(&domain[..2]));

        for leaf in leaves.iter().chain(std::iter::once(&"_AUTRES")) {
            categories.push(Category::leaf(CategoryId::new(next_leaf_id), *leaf, domain_id));
            next_leaf_id += 1;
        }
    }

    categories
}
