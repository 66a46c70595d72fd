//! Application handlers.
//!
//! One handler per conversational step. Each loads what it needs through the
//! session lifecycle and hands ticket creation to the finalizer.

pub mod analyze_turn;
pub mod auto_validate;
pub mod clarification;
pub mod confirm_summary;
pub mod topic_shift_choice;

#[cfg(test)]
pub(crate) mod test_support;

pub use analyze_turn::{AnalyzeTurnCommand, AnalyzeTurnHandler};
pub use auto_validate::{AutoValidateCommand, AutoValidateHandler};
pub use clarification::{merge_reply, ClarificationCommand, ClarificationHandler};
pub use confirm_summary::{ConfirmAction, ConfirmSummaryCommand, ConfirmSummaryHandler};
pub use topic_shift_choice::{
    both_problems, TopicChoice, TopicShiftChoiceCommand, TopicShiftChoiceHandler,
};
