//! User-facing labels and icons for catalog nodes.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Friendly label and icon for a category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDisplay {
    pub label: &'static str,
    pub icon: &'static str,
}

/// Icon used when a category has no display entry.
pub const DEFAULT_CATEGORY_ICON: &str = "📋";

static CATEGORY_DISPLAY: Lazy<HashMap<&'static str, CategoryDisplay>> = Lazy::new(|| {
    let entries: &[(&str, &str, &str)] = &[
        // Domains
        ("01-Acces-Authentification", "Accès / Mot de passe", "🔐"),
        ("02-Messagerie", "Messagerie / Email", "📧"),
        ("03-Reseau-Internet", "Internet / Réseau / WiFi", "🌐"),
        ("04-Postes-travail", "Mon ordinateur / Poste", "💻"),
        ("05-Applications", "Application / Logiciel", "📱"),
        ("06-Telephonie", "Téléphonie", "📞"),
        ("07-Fichiers-Partages", "Fichiers / Partages réseau", "📁"),
        ("08-Materiel", "Matériel / Périphériques", "🖨️"),
        ("09-Securite", "Sécurité", "🛡️"),
        // Access
        ("Mot-de-passe", "Mot de passe oublié", "🔑"),
        ("Compte-utilisateur", "Problème de compte", "👤"),
        ("Permissions", "Droits d'accès manquants", "🚪"),
        // Mail
        ("Outlook", "Outlook", "📨"),
        ("Email-bloque", "Email bloqué", "🚫"),
        ("Configuration", "Configuration messagerie", "⚙️"),
        // Network
        ("Wifi", "WiFi ne fonctionne pas", "📶"),
        ("Cable-Ethernet", "Câble / Ethernet", "🔌"),
        ("VPN", "Problème de VPN", "🔒"),
        ("Pas-de-connexion", "Pas de connexion du tout", "🚫"),
        // Workstations
        ("PC-lent", "PC très lent", "🐢"),
        ("PC-bloque", "PC bloqué / figé", "🧊"),
        ("Mise-a-jour-Windows", "Mise à jour Windows", "🔄"),
        ("Redemarrage", "Problème de redémarrage", "🔁"),
        // Applications
        ("Julius", "Julius", "📊"),
        ("SAP", "SAP", "🏢"),
        ("Microsoft-365", "Microsoft 365", "📎"),
        ("Navigateur", "Navigateur web", "🌍"),
        ("Bug-fonctionnel", "Bug / dysfonctionnement", "🐛"),
        // Telephony
        ("Soft-phone", "Soft-phone", "📞"),
        ("Casque", "Casque audio", "🎧"),
        ("Qualite-audio", "Qualité audio", "🔊"),
        ("Appels", "Problème d'appels", "📲"),
        // Files
        ("Acces-refuse", "Accès refusé", "⛔"),
        ("Dossiers-reseau", "Dossiers réseau", "📂"),
        ("OneDrive-SharePoint", "OneDrive / SharePoint", "☁️"),
        // Hardware
        ("Imprimante", "Imprimante", "🖨️"),
        ("Ecran", "Écran / Affichage", "🖥️"),
        ("Clavier-Souris", "Clavier / Souris", "⌨️"),
        // Security
        ("Antivirus", "Antivirus", "🛡️"),
        ("Email-suspect", "Email suspect", "⚠️"),
        ("Lien-suspect", "Lien suspect", "🔗"),
        ("Phishing", "Phishing", "🎣"),
        // Present under every domain
        ("_AUTRES", "Autre problème", "🔧"),
    ];

    entries
        .iter()
        .map(|(name, label, icon)| (*name, CategoryDisplay { label, icon }))
        .collect()
});

/// Looks up the display entry for a category name.
pub fn display_for(name: &str) -> Option<CategoryDisplay> {
    CATEGORY_DISPLAY.get(name).copied()
}

/// Label for a category name, falling back to the name with separators spaced out.
pub fn label_for(name: &str) -> String {
    match display_for(name) {
        Some(display) => display.label.to_string(),
        None => name.replace(['-', '_'], " ").trim().to_string(),
    }
}

/// Icon for a category name.
pub fn icon_for(name: &str) -> &'static str {
    display_for(name)
        .map(|d| d.icon)
        .unwrap_or(DEFAULT_CATEGORY_ICON)
}
