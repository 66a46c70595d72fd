//! ClarificationHandler - Folds a clarification reply into the conversation.
//!
//! The reply is compared with the session's original message first: the
//! same problem is re-analyzed with both texts, an unrelated one restarts
//! triage, and an ambiguous switch is put to the user.

use std::sync::Arc;

use tracing::info;

use super::analyze_turn::{AnalyzeTurnCommand, AnalyzeTurnHandler};
use crate::application::responses::{AnalysisResponse, TriageResult};
use crate::application::session_lifecycle::SessionLifecycle;
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::triage::{
    detect_topic_shift, topic_shift_choices, topic_shift_prompt, AnalysisSession, Recommendation,
    SeedSource, TopicDomain, TriageAction, TriageError,
};

/// Command carrying a free-text clarification reply.
#[derive(Debug, Clone)]
pub struct ClarificationCommand {
    pub session_id: SessionId,
    pub reply: String,
    pub selected_choice_id: Option<String>,
}

/// Handler for clarification replies.
pub struct ClarificationHandler {
    lifecycle: Arc<SessionLifecycle>,
    analyze: Arc<AnalyzeTurnHandler>,
    seeds: SeedSource,
}

impl ClarificationHandler {
    pub fn new(
        lifecycle: Arc<SessionLifecycle>,
        analyze: Arc<AnalyzeTurnHandler>,
        seeds: SeedSource,
    ) -> Self {
        Self {
            lifecycle,
            analyze,
            seeds,
        }
    }

    pub async fn handle(&self, cmd: ClarificationCommand) -> Result<TriageResult, TriageError> {
        let reply = cmd.reply.trim();
        if reply.is_empty() {
            return Err(TriageError::validation("reply", "La réponse ne peut pas être vide"));
        }

        let now = Timestamp::now();
        let session = self.lifecycle.load(&cmd.session_id, now).await?;
        let shift = detect_topic_shift(session.original_message(), reply);

        match (shift.recommendation, shift.original_context, shift.new_context) {
            (Recommendation::Replace, _, _) => {
                info!(session_id = %session.id(), "Unrelated problem, restarting on the reply");
                let result = self
                    .analyze
                    .handle(
                        AnalyzeTurnCommand::new(reply)
                            .with_user_email(session.user_email().map(str::to_string)),
                    )
                    .await?;
                self.lifecycle.supersede(session.id(), "topic_replaced").await;
                Ok(result)
            }
            (Recommendation::AskUser, Some(old), Some(new)) => {
                info!(
                    session_id = %session.id(),
                    old_topic = old.as_name(),
                    new_topic = new.as_name(),
                    "Ambiguous topic change, asking the user"
                );
                self.ask_topic_choice(&session, reply, old, new, now).await
            }
            _ => {
                let enriched = merge_reply(session.original_message(), reply);
                self.analyze
                    .handle(
                        AnalyzeTurnCommand::new(enriched)
                            .with_parent(*session.id())
                            .with_selected_choice(cmd.selected_choice_id),
                    )
                    .await
            }
        }
    }

    /// Parks both texts on a new session until the user picks a problem.
    async fn ask_topic_choice(
        &self,
        session: &AnalysisSession,
        reply: &str,
        old: TopicDomain,
        new: TopicDomain,
        now: Timestamp,
    ) -> Result<TriageResult, TriageError> {
        let pending = AnalysisSession::new(
            SessionId::new(),
            session.original_message(),
            TriageAction::TopicShift,
            now,
            self.lifecycle.ttl_minutes(),
        )?
        .with_summary(
            session.summary().cloned(),
            session.confidence().unwrap_or_default(),
        )
        .with_user_email(session.user_email().map(str::to_string))
        .with_parent(Some(*session.id()), session.attempts())
        .with_pending_reply(reply);
        self.lifecycle.create(&pending).await?;
        self.lifecycle
            .supersede(session.id(), "topic_shift_pending")
            .await;

        let message = topic_shift_prompt(old, new, self.seeds.next_seed());
        Ok(AnalysisResponse::new(TriageAction::TopicShift, message)
            .with_session(*pending.id(), *pending.expires_at(), pending.attempts())
            .with_choices(topic_shift_choices())
            .into())
    }
}

/// Input re-analyzed when the reply precises the same problem.
pub fn merge_reply(original: &str, reply: &str) -> String {
    format!("{}\n\nPrécision : {}", original, reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{record, Harness};
    use crate::domain::foundation::SessionStatus;

    fn reply(session_id: SessionId, text: &str) -> ClarificationCommand {
        ClarificationCommand {
            session_id,
            reply: text.to_string(),
            selected_choice_id: None,
        }
    }

    #[tokio::test]
    async fn same_topic_is_merged_and_chained() {
        let harness = Harness::new();
        let session = harness
            .pending_session("mon wifi ne marche plus", TriageAction::AskClarification, 0)
            .await;
        harness.classifier.push(Ok(record(Some(18), 0.75)));

        let result = harness
            .clarification()
            .handle(reply(*session.id(), "le wifi coupe toutes les 5 minutes"))
            .await
            .unwrap();

        let analysis = result.as_analysis().unwrap();
        assert_eq!(analysis.action, TriageAction::ConfirmSummary);
        assert_eq!(analysis.clarification_attempts, 1);

        let request = harness.classifier.last_request().unwrap();
        assert_eq!(
            request.message,
            "mon wifi ne marche plus\n\nPrécision : le wifi coupe toutes les 5 minutes"
        );
        assert!(request.prior_analysis.is_some());
        assert_eq!(harness.session(*session.id()).await.status(), SessionStatus::Invalidated);
    }

    #[tokio::test]
    async fn unrelated_topic_restarts_on_reply() {
        let harness = Harness::new();
        let session = harness
            .pending_session("mon wifi ne marche plus", TriageAction::AskClarification, 1)
            .await;
        harness.classifier.push(Ok(record(Some(43), 0.8)));

        let result = harness
            .clarification()
            .handle(reply(*session.id(), "mon imprimante ne marche plus"))
            .await
            .unwrap();

        assert_eq!(result.as_analysis().unwrap().clarification_attempts, 0);
        let request = harness.classifier.last_request().unwrap();
        assert_eq!(request.message, "mon imprimante ne marche plus");
        assert!(request.parent_session_id.is_none());
        assert_eq!(harness.session(*session.id()).await.status(), SessionStatus::Invalidated);
    }

    #[tokio::test]
    async fn ambiguous_topic_asks_without_classifying() {
        let harness = Harness::new();
        let session = harness
            .pending_session("outlook ne s'ouvre plus", TriageAction::AskClarification, 0)
            .await;

        let result = harness
            .clarification()
            .handle(reply(*session.id(), "le wifi est coupé"))
            .await
            .unwrap();

        let analysis = result.as_analysis().unwrap();
        assert_eq!(analysis.action, TriageAction::TopicShift);
        let ids: Vec<_> = analysis
            .guided_choices
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["keep_new", "keep_old", "both_problems"]);
        assert_eq!(harness.classifier.call_count(), 0);

        let pending = harness.session(analysis.session_id.unwrap()).await;
        assert_eq!(pending.pending_reply(), Some("le wifi est coupé"));
        assert_eq!(pending.original_message(), "outlook ne s'ouvre plus");
    }

    #[tokio::test]
    async fn failed_merge_leaves_session_pending() {
        let harness = Harness::new();
        let session = harness
            .pending_session("mon wifi ne marche plus", TriageAction::AskClarification, 0)
            .await;

        let err = harness
            .clarification()
            .handle(reply(*session.id(), "depuis ce matin"))
            .await
            .unwrap_err();

        assert!(matches!(err, TriageError::ClassificationFailure(_)));
        assert!(harness.session(*session.id()).await.is_pending());
    }

    #[test]
    fn merge_format_keeps_both_texts() {
        assert_eq!(merge_reply("a", "b"), "a\n\nPrécision : b");
    }
}
