//! TopicShiftChoiceHandler - Resolves a pending topic choice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use super::analyze_turn::{AnalyzeTurnCommand, AnalyzeTurnHandler};
use crate::application::responses::TriageResult;
use crate::application::session_lifecycle::SessionLifecycle;
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::triage::{TriageAction, TriageError};

/// Which problem the user wants handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicChoice {
    KeepNew,
    KeepOld,
    BothProblems,
}

impl TopicChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicChoice::KeepNew => "keep_new",
            TopicChoice::KeepOld => "keep_old",
            TopicChoice::BothProblems => "both_problems",
        }
    }
}

impl fmt::Display for TopicChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TopicChoice {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "keep_new" => Ok(TopicChoice::KeepNew),
            "keep_old" => Ok(TopicChoice::KeepOld),
            "both_problems" => Ok(TopicChoice::BothProblems),
            _ => Err(TriageError::invalid_response()),
        }
    }
}

/// Command carrying the picked topic choice.
#[derive(Debug, Clone)]
pub struct TopicShiftChoiceCommand {
    pub session_id: SessionId,
    pub choice: TopicChoice,
}

/// Handler for topic-shift choices.
pub struct TopicShiftChoiceHandler {
    lifecycle: Arc<SessionLifecycle>,
    analyze: Arc<AnalyzeTurnHandler>,
}

impl TopicShiftChoiceHandler {
    pub fn new(lifecycle: Arc<SessionLifecycle>, analyze: Arc<AnalyzeTurnHandler>) -> Self {
        Self { lifecycle, analyze }
    }

    /// Restarts triage on the chosen text; the pending session is retired afterwards.
    ///
    /// # Errors
    ///
    /// - `InvalidUserResponse` if the session is not waiting for a topic choice
    pub async fn handle(&self, cmd: TopicShiftChoiceCommand) -> Result<TriageResult, TriageError> {
        let session = self.lifecycle.load(&cmd.session_id, Timestamp::now()).await?;

        let reply = match (session.action(), session.pending_reply()) {
            (TriageAction::TopicShift, Some(reply)) => reply,
            _ => {
                info!(session_id = %cmd.session_id, "Session is not waiting for a topic choice");
                return Err(TriageError::invalid_response());
            }
        };

        let original = session.original_message();
        let mut command = match cmd.choice {
            TopicChoice::KeepNew => AnalyzeTurnCommand::new(reply),
            TopicChoice::KeepOld => {
                let command = AnalyzeTurnCommand::new(original);
                match session.summary() {
                    Some(summary) => command.with_prior_analysis(summary.clone()),
                    None => command,
                }
            }
            TopicChoice::BothProblems => AnalyzeTurnCommand::new(both_problems(original, reply)),
        };
        command = command.with_user_email(session.user_email().map(str::to_string));

        info!(session_id = %cmd.session_id, choice = %cmd.choice, "Topic choice resolved");
        let result = self.analyze.handle(command).await?;
        self.lifecycle
            .supersede(session.id(), &format!("topic_choice:{}", cmd.choice))
            .await;
        Ok(result)
    }
}

/// Single message listing both problems.
pub fn both_problems(original: &str, reply: &str) -> String {
    format!("Problème 1 : {}\nProblème 2 : {}", original, reply)
}
