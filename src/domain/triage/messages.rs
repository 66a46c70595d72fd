//! User-facing message templates.
//!
//! Several prompts exist in a few phrasings so that repeated turns do not
//! read identically. The phrasing is picked by [`pick_variant`] from an
//! explicit seed, which keeps the choice reproducible in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::context::TopicDomain;

// ─────────────────────────────────────────────────────────────────────────────
// Action messages
// ─────────────────────────────────────────────────────────────────────────────

pub const AUTO_VALIDATE_MESSAGE: &str = "✅ **Voici ce que j'ai compris de votre demande :**\n\n\
{summary}\n\n\
Si c'est correct, répondez simplement **\"ok\"**, **\"oui\"**, ou **\"d'accord\"** pour créer le ticket.";

pub const CONFIRM_SUMMARY_MESSAGE: &str = "🤔 **Voici ce que j'ai compris. Pouvez-vous vérifier ?**\n\n\
{summary}\n\n\
Vous pouvez **confirmer** ou **modifier le titre/symptômes** uniquement.\n\
⚠️ La priorité et la catégorie sont déterminées automatiquement.";

pub const ASK_CLARIFICATION_MESSAGE: &str = "❓ **J'ai besoin de plus d'informations pour bien comprendre :**\n\n\
{missing_info_list}\n\n\
Pouvez-vous préciser ces points ?";

/// Used when the classifier asked for clarification without a question.
pub const DEFAULT_CLARIFICATION_QUESTION: &str = "Pouvez-vous fournir plus de détails ?";

pub const MAX_ATTEMPTS_MESSAGE: &str = "✅ **Pas de souci !**\n\n\
J'ai créé le ticket **{ticket_number}** et un technicien vous contactera rapidement pour clarifier votre problème. \
Vous recevrez une notification dès que quelqu'un sera disponible pour vous aider.";

pub const TICKET_CREATED_MESSAGE: &str = "✅ **Ticket {ticket_number} créé avec succès !**\n\n\
📋 Catégorie : {category}\n\
🎯 Priorité : {priority}\n\n\
🔍 Recherche de solutions en cours...";

pub const TICKET_CREATED_EXTERNAL_MESSAGE: &str = "✅ **Ticket créé avec succès !**\n\n\
📋 Numéro: {ticket_number}\n\
🔗 GLPI ID: {external_id}\n\
📁 Catégorie: {category}\n\
🎯 Priorité: {priority}\n\n\
🔍 Recherche de solutions en cours...";

pub const GREETING_MESSAGE: &str = "👋 **Bonjour !** Je suis l'assistant du support informatique.\n\n\
Décrivez-moi votre problème en quelques mots, par exemple :\n\
• \"Mon ordinateur est très lent depuis ce matin\"\n\
• \"Je n'arrive plus à me connecter au WiFi\"\n\
• \"J'ai oublié mon mot de passe\"";

pub const NON_IT_MESSAGE: &str = "🤖 **Je suis spécialisé dans le support informatique.**\n\n\
Je ne peux pas vous aider sur ce sujet, mais si vous rencontrez un problème avec \
votre ordinateur, une application, le réseau ou votre messagerie, je suis là !";

// ─────────────────────────────────────────────────────────────────────────────
// Error messages
// ─────────────────────────────────────────────────────────────────────────────

pub const ERROR_SESSION_NOT_FOUND: &str = "⚠️ Session expirée ou invalide. Veuillez recommencer.";
pub const ERROR_SESSION_ALREADY_USED: &str =
    "⚠️ Cette session a déjà été utilisée pour créer un ticket.";
pub const ERROR_INVALID_RESPONSE: &str =
    "❌ Je n'ai pas compris votre réponse. Répondez simplement **\"ok\"** pour confirmer.";
pub const ERROR_INVALID_MODIFICATION: &str = "⚠️ Vous ne pouvez modifier que le titre et les symptômes. \
La priorité et la catégorie sont déterminées automatiquement.";
pub const ERROR_AI_ANALYSIS: &str =
    "❌ Erreur lors de l'analyse de votre message. Veuillez réessayer.";
pub const ERROR_NO_CATEGORIES: &str =
    "❌ Aucune catégorie n'est disponible pour analyser votre demande.";
pub const ERROR_EXTERNAL_SYNC: &str =
    "❌ Impossible de créer le ticket dans GLPI. Veuillez réessayer plus tard.";
pub const ERROR_INTERNAL: &str = "❌ Une erreur interne est survenue. Veuillez réessayer.";

// ─────────────────────────────────────────────────────────────────────────────
// Clarification prompts
// ─────────────────────────────────────────────────────────────────────────────

const FIRST_ATTEMPT_WITH_CONTEXT: &[&str] = &[
    "🔍 **Il semble que vous avez {label}.**\n\nPouvez-vous préciser lequel de ces cas correspond à votre situation ?",
    "🔍 **Je détecte {label}.**\n\nQuel cas décrit le mieux votre situation ?",
    "🔍 **D'après votre description, il s'agit de {label}.**\n\nCliquez sur l'option la plus proche de votre problème :",
];

const FIRST_ATTEMPT_NO_CONTEXT: &[&str] = &[
    "🔍 **Pour mieux vous aider, quel type de problème rencontrez-vous ?**\n\nCliquez sur l'option qui correspond le mieux :",
    "🔍 **De quel type de problème s'agit-il ?**\n\nSélectionnez une catégorie :",
    "🤔 **Je veux bien vous aider !**\n\nPouvez-vous m'indiquer le type de problème ?",
    "🔍 **Pour vous orienter vers la bonne solution, précisez votre problème :**\n\nCliquez sur la catégorie correspondante :",
];

const SECOND_ATTEMPT: &[&str] = &[
    "🔍 **Merci ! Pouvez-vous préciser davantage ?**\n\nSélectionnez le cas qui correspond le mieux :",
    "👍 **C'est noté ! Un peu plus de détails m'aideraient.**\n\nQuel cas décrit le mieux votre situation ?",
    "🔍 **Très bien ! Pour affiner ma compréhension :**\n\nLequel de ces cas correspond à votre problème ?",
    "✅ **Merci pour cette info ! Encore une précision :**\n\nSélectionnez l'option la plus proche :",
];

const LATER_ATTEMPTS: &[&str] = &[
    "🔍 **Dernière question pour bien comprendre :**\n\nVoyez-vous un message d'erreur à l'écran ?",
    "🔍 **Une dernière précision svp :**\n\nY a-t-il un message d'erreur affiché ?",
    "🔍 **Presque fini ! Juste une question :**\n\nAvez-vous un message d'erreur visible ?",
    "🔍 **Pour finaliser ma compréhension :**\n\nUn message d'erreur s'affiche-t-il ?",
];

const TOPIC_SHIFT_PROMPTS: &[&str] = &[
    "🔄 **Je remarque que vous parlez d'un problème différent.**\n\nVoulez-vous que je m'occupe de **{new_topic}** au lieu de **{old_topic}** ?",
    "🤔 **Changement de sujet détecté !**\n\nVous parliez de **{old_topic}**, mais maintenant de **{new_topic}**.\nSur quel problème souhaitez-vous de l'aide ?",
    "📝 **J'ai noté un changement dans votre demande.**\n\nEst-ce que votre problème principal est maintenant **{new_topic}** ?",
];

// ─────────────────────────────────────────────────────────────────────────────
// Suggestion reasoning
// ─────────────────────────────────────────────────────────────────────────────

/// Why a set of guided choices was offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningKind {
    FirstInteraction,
    ContextDetected,
    NarrowingDown,
    LowConfidence,
    ContextChange,
    FinalAttempt,
}

impl ReasoningKind {
    fn templates(&self) -> &'static [&'static str] {
        match self {
            ReasoningKind::FirstInteraction => &[
                "💭 Je vous propose les catégories principales pour identifier votre problème.",
                "💭 Voici les types de problèmes les plus courants. Sélectionnez celui qui correspond.",
                "💭 Pour mieux vous orienter, choisissez la catégorie de votre problème.",
            ],
            ReasoningKind::ContextDetected => &[
                "💭 J'ai détecté un **{category}**. Voici les cas les plus fréquents dans cette catégorie.",
                "💭 Votre description suggère un **{category}**. Ces options devraient correspondre à votre situation.",
                "💭 Basé sur \"{input_snippet}\", je propose des options liées à **{category}**.",
            ],
            ReasoningKind::NarrowingDown => &[
                "💭 Merci pour cette précision ! Je propose maintenant des options plus spécifiques.",
                "💭 Avec cette information, je peux affiner les suggestions.",
                "💭 Je comprends mieux. Voici des options plus ciblées.",
            ],
            ReasoningKind::LowConfidence => &[
                "💭 Je n'ai pas assez d'éléments pour être précis. Ces options générales devraient aider.",
                "💭 Votre description est un peu vague. Essayons avec ces catégories principales.",
                "💭 Pour mieux cibler, sélectionnez le domaine concerné.",
            ],
            ReasoningKind::ContextChange => &[
                "💭 Je note un changement de sujet. Voici les options pour ce nouveau problème.",
                "💭 Nouveau contexte détecté. Je propose des suggestions adaptées.",
                "💭 Vous mentionnez un autre type de problème. Voici les options correspondantes.",
            ],
            ReasoningKind::FinalAttempt => &[
                "💭 Dernière étape : une question simple pour finaliser.",
                "💭 Presque terminé ! Une dernière précision suffit.",
                "💭 Pour conclure, répondez à cette question.",
            ],
        }
    }
}

const SNIPPET_CHARS: usize = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Variant selection
// ─────────────────────────────────────────────────────────────────────────────

/// Picks one template. The same seed always yields the same template.
pub fn pick_variant<'a>(templates: &[&'a str], seed: u64) -> &'a str {
    if templates.is_empty() {
        return "";
    }
    let mut rng = StdRng::seed_from_u64(seed);
    templates[rng.gen_range(0..templates.len())]
}

/// Source of seeds for [`pick_variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedSource {
    /// A fresh random seed per message.
    #[default]
    Random,
    /// Always the same seed.
    Fixed(u64),
}

impl SeedSource {
    pub fn next_seed(&self) -> u64 {
        match self {
            SeedSource::Random => rand::random(),
            SeedSource::Fixed(seed) => *seed,
        }
    }
}

/// Substitutes `{name}` placeholders.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

/// Prompt shown alongside guided choices, adapted to the attempt number.
pub fn clarification_prompt(attempt: u32, detected: Option<TopicDomain>, seed: u64) -> String {
    match (attempt, detected) {
        (0, Some(domain)) => fill(
            pick_variant(FIRST_ATTEMPT_WITH_CONTEXT, seed),
            &[("label", domain.clarification_label().as_str())],
        ),
        (0, None) => pick_variant(FIRST_ATTEMPT_NO_CONTEXT, seed).to_string(),
        (1, _) => pick_variant(SECOND_ATTEMPT, seed).to_string(),
        _ => pick_variant(LATER_ATTEMPTS, seed).to_string(),
    }
}

/// Prompt asking which of two problems the user wants handled.
pub fn topic_shift_prompt(old: TopicDomain, new: TopicDomain, seed: u64) -> String {
    fill(
        pick_variant(TOPIC_SHIFT_PROMPTS, seed),
        &[
            ("old_topic", old.topic_label().as_str()),
            ("new_topic", new.topic_label().as_str()),
        ],
    )
}

/// Rationale attached to a set of guided choices.
pub fn reasoning(
    kind: ReasoningKind,
    detected: Option<TopicDomain>,
    user_input: &str,
    seed: u64,
) -> String {
    let category = detected.map(|d| d.problem_label()).unwrap_or("problème");
    fill(
        pick_variant(kind.templates(), seed),
        &[
            ("category", category),
            ("input_snippet", snippet(user_input).as_str()),
        ],
    )
}

fn snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_CHARS {
        let head: String = text.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Bullet list of the clarification question, or the default question.
pub fn clarification_request(question: Option<&str>) -> String {
    let question = question
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_CLARIFICATION_QUESTION);
    fill(ASK_CLARIFICATION_MESSAGE, &[("missing_info_list", question)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_variant_is_deterministic_per_seed() {
        let templates = ["a", "b", "c", "d"];
        for seed in 0..50 {
            assert_eq!(pick_variant(&templates, seed), pick_variant(&templates, seed));
        }
    }

    #[test]
    fn pick_variant_reaches_every_template() {
        let templates = ["a", "b", "c"];
        let seen: std::collections::HashSet<_> =
            (0..200).map(|seed| pick_variant(&templates, seed)).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn pick_variant_on_empty_slice_is_empty() {
        assert_eq!(pick_variant(&[], 7), "");
    }

    #[test]
    fn fill_replaces_every_occurrence() {
        assert_eq!(fill("{a} et {a} puis {b}", &[("a", "x"), ("b", "y")]), "x et x puis y");
    }

    #[test]
    fn first_attempt_with_context_names_the_domain() {
        for seed in 0..10 {
            let prompt = clarification_prompt(0, Some(TopicDomain::Network), seed);
            assert!(prompt.contains("un problème réseau"), "{prompt}");
            assert!(!prompt.contains("{label}"));
        }
    }

    #[test]
    fn later_attempts_ask_about_error_messages() {
        for seed in 0..10 {
            assert!(clarification_prompt(2, None, seed).contains("message d'erreur"));
            assert!(clarification_prompt(5, Some(TopicDomain::Access), seed)
                .contains("message d'erreur"));
        }
    }

    #[test]
    fn topic_shift_prompt_mentions_new_topic() {
        for seed in 0..10 {
            let prompt = topic_shift_prompt(TopicDomain::Messaging, TopicDomain::Network, seed);
            assert!(prompt.contains("un problème réseau/internet"));
        }
    }

    #[test]
    fn reasoning_snippet_is_truncated() {
        let input = "mon imprimante du deuxième étage refuse d'imprimer";
        let texts: Vec<String> = (0..100)
            .map(|seed| reasoning(ReasoningKind::ContextDetected, Some(TopicDomain::Hardware), input, seed))
            .collect();
        let with_snippet = texts
            .iter()
            .find(|t| t.contains("Basé sur"))
            .expect("snippet variant reached");
        assert!(with_snippet.contains("\"mon imprimante du deuxième éta...\""));
    }

    #[test]
    fn clarification_request_falls_back_to_default_question() {
        assert!(clarification_request(None).contains(DEFAULT_CLARIFICATION_QUESTION));
        assert!(clarification_request(Some("  ")).contains(DEFAULT_CLARIFICATION_QUESTION));
        assert!(clarification_request(Some("Quel logiciel ?")).contains("Quel logiciel ?"));
    }

    #[test]
    fn fixed_seed_source_repeats() {
        let source = SeedSource::Fixed(9);
        assert_eq!(source.next_seed(), source.next_seed());
    }
}
