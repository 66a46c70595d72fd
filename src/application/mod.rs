//! Application layer - Workflow handlers and their shared services.
//!
//! Handlers orchestrate the triage domain over the ports. `SessionLifecycle`
//! owns session loading and retirement, `TicketFinalizer` owns ticket
//! creation and external sync, and `TriageWorkflow` is the facade that
//! wires them together.

pub mod handlers;
pub mod responses;
pub mod session_lifecycle;
pub mod ticket_finalizer;
pub mod workflow;

pub use handlers::{
    AnalyzeTurnCommand, AnalyzeTurnHandler, AutoValidateCommand, AutoValidateHandler,
    ClarificationCommand, ClarificationHandler, ConfirmAction, ConfirmSummaryCommand,
    ConfirmSummaryHandler, TopicChoice, TopicShiftChoiceCommand, TopicShiftChoiceHandler,
};
pub use responses::{
    AnalysisResponse, ErrorResponse, SuggestionMetadata, TicketCreatedResponse, TriageReply,
    TriageResult,
};
pub use session_lifecycle::SessionLifecycle;
pub use ticket_finalizer::{SyncMode, TicketFinalizer};
pub use workflow::{TriageDependencies, TriageSettings, TriageWorkflow};
