//! Ticket triage console driver.
//!
//! Usage:
//!   ticket-triage            # PostgreSQL storage, from TICKET_TRIAGE__DATABASE__URL
//!   ticket-triage --memory   # In-memory storage with the default category tree
//!   ticket-triage --json     # Print raw reply payloads
//!
//! Each line typed is one user turn. `/new` drops the current conversation,
//! `/titre <texte>` edits the proposed title, `/quit` exits.

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use ticket_triage::adapters::ai::{LlmClassifier, LlmClassifierConfig, OpenAIConfig, OpenAIProvider};
use ticket_triage::adapters::cache::{InMemoryClassificationCache, RedisClassificationCache};
use ticket_triage::adapters::glpi::{GlpiClient, GlpiConfig as GlpiClientConfig};
use ticket_triage::adapters::memory::{
    InMemoryCategoryCatalog, InMemorySessionRepository, InMemoryTicketRepository,
    InMemoryUserDirectory,
};
use ticket_triage::adapters::postgres::{
    run_migrations, PostgresCategoryCatalog, PostgresSessionRepository, PostgresTicketRepository,
    PostgresUserDirectory,
};
use ticket_triage::adapters::RetryPolicy;
use ticket_triage::application::{
    AnalyzeTurnCommand, AutoValidateCommand, ClarificationCommand, ConfirmAction,
    ConfirmSummaryCommand, TopicChoice, TopicShiftChoiceCommand, TriageDependencies, TriageReply,
    TriageResult, TriageSettings, TriageWorkflow,
};
use ticket_triage::config::AppConfig;
use ticket_triage::domain::foundation::SessionId;
use ticket_triage::domain::triage::{classify_intent, GuidedChoice, Intent, SeedSource, TriageAction};
use ticket_triage::ports::{ClassificationCache, ExternalTicketing};

type BoxError = Box<dyn Error + Send + Sync>;

struct Options {
    memory: bool,
    json: bool,
}

impl Options {
    fn from_args() -> Option<Self> {
        let mut options = Options {
            memory: false,
            json: false,
        };
        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--memory" | "-m" => options.memory = true,
                "--json" => options.json = true,
                "--help" | "-h" => {
                    println!("Ticket triage console");
                    println!();
                    println!("Usage: ticket-triage [OPTIONS]");
                    println!();
                    println!("Options:");
                    println!("  -m, --memory   Keep sessions and tickets in memory");
                    println!("      --json     Print reply payloads as JSON");
                    println!("  -h, --help     Show this help message");
                    return None;
                }
                other => eprintln!("Ignoring unknown argument: {}", other),
            }
        }
        Some(options)
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let Some(options) = Options::from_args() else {
        return Ok(());
    };

    let config = AppConfig::load()?;
    init_tracing(&config);
    if options.memory {
        config.validate_without_database()?;
    } else {
        config.validate()?;
    }

    let workflow = build_workflow(&config, options.memory).await?;
    run_console(&workflow, options.json).await
}

fn init_tracing(config: &AppConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.logging.env_filter())
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_workflow(config: &AppConfig, memory: bool) -> Result<TriageWorkflow, BoxError> {
    let classifier = build_classifier(config).await?;
    let external = build_external(config)?;
    let settings = TriageSettings {
        session_ttl_minutes: config.triage.session_ttl_minutes,
        max_clarification_attempts: config.triage.max_clarification_attempts,
        sync_mode: config.glpi.sync_mode,
        seeds: SeedSource::Random,
    };

    let deps = if memory {
        info!("Using in-memory storage");
        let sessions = Arc::new(InMemorySessionRepository::new());
        let tickets = Arc::new(InMemoryTicketRepository::new(&sessions));
        TriageDependencies {
            classifier,
            sessions,
            tickets,
            catalog: Arc::new(InMemoryCategoryCatalog::with_default_tree()),
            users: Arc::new(InMemoryUserDirectory::default()),
            external,
        }
    } else {
        let pool = config
            .database
            .pool_options()
            .connect(&config.database.url)
            .await?;
        if config.database.run_migrations {
            run_migrations(&pool).await?;
        }
        info!("Connected to PostgreSQL");
        TriageDependencies {
            classifier,
            sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
            tickets: Arc::new(PostgresTicketRepository::new(pool.clone())),
            catalog: Arc::new(PostgresCategoryCatalog::new(pool.clone())),
            users: Arc::new(PostgresUserDirectory::new(pool)),
            external,
        }
    };

    Ok(TriageWorkflow::new(deps, settings))
}

async fn build_classifier(config: &AppConfig) -> Result<Arc<LlmClassifier>, BoxError> {
    use secrecy::ExposeSecret;

    let api_key = config
        .ai
        .api_key
        .as_ref()
        .map(|k| k.expose_secret().clone())
        .unwrap_or_default();
    let provider = OpenAIProvider::new(
        OpenAIConfig::new(api_key)
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.timeout()),
    )?;

    let retry = RetryPolicy::default()
        .with_max_attempts(config.ai.max_attempts)
        .with_base_delay(config.ai.backoff_base())
        .with_jitter(config.ai.jitter)
        .with_attempt_timeout(config.ai.timeout());
    let classifier_config = LlmClassifierConfig {
        retry,
        temperature: config.ai.temperature,
        max_tokens: config.ai.max_tokens,
        cache_ttl: config.triage.cache_ttl(),
    };

    let cache: Arc<dyn ClassificationCache> = match config.redis.url() {
        Some(url) => {
            let client = redis::Client::open(url)?;
            let conn = tokio::time::timeout(
                config.redis.timeout(),
                client.get_multiplexed_tokio_connection(),
            )
            .await??;
            info!("Classification cache on Redis");
            Arc::new(RedisClassificationCache::new(conn))
        }
        None => Arc::new(InMemoryClassificationCache::new()),
    };

    Ok(Arc::new(
        LlmClassifier::new(Arc::new(provider), classifier_config).with_cache(cache),
    ))
}

fn build_external(config: &AppConfig) -> Result<Option<Arc<dyn ExternalTicketing>>, BoxError> {
    use secrecy::ExposeSecret;

    if !config.glpi.enabled {
        return Ok(None);
    }
    let token = |t: &Option<secrecy::Secret<String>>| {
        t.as_ref()
            .map(|s| s.expose_secret().clone())
            .unwrap_or_default()
    };
    let client = GlpiClient::new(
        GlpiClientConfig::new(
            config.glpi.api_url.clone(),
            token(&config.glpi.app_token),
            token(&config.glpi.user_token),
        )
        .with_session_lifetime(config.glpi.session_lifetime())
        .with_timeout(config.glpi.timeout()),
    )?;
    info!(sync_mode = config.glpi.sync_mode.as_str(), "GLPI sync enabled");
    Ok(Some(Arc::new(client)))
}

/// What the last reply is waiting for.
struct Pending {
    session_id: SessionId,
    action: TriageAction,
    choices: Vec<GuidedChoice>,
}

async fn run_console(workflow: &TriageWorkflow, json: bool) -> Result<(), BoxError> {
    println!("Décrivez votre problème informatique (/quit pour sortir).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<Pending> = None;

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/new" => {
                pending = None;
                println!("Nouvelle demande.");
                continue;
            }
            _ => {}
        }

        let outcome = match &pending {
            None => workflow.submit_message(AnalyzeTurnCommand::new(line)).await,
            Some(state) => dispatch(workflow, state, line).await,
        };
        let reply = TriageWorkflow::respond(outcome);
        pending = next_pending(&reply, pending);
        render(&reply, json)?;
    }
    Ok(())
}

/// Routes a reply to the request shape the pending action expects.
async fn dispatch(
    workflow: &TriageWorkflow,
    state: &Pending,
    line: &str,
) -> Result<TriageResult, ticket_triage::domain::triage::TriageError> {
    let session_id = state.session_id;

    if let Some(choice) = pick_choice(&state.choices, line) {
        if state.action == TriageAction::TopicShift {
            let choice: TopicChoice = choice.id.parse()?;
            return workflow
                .choose_topic(TopicShiftChoiceCommand { session_id, choice })
                .await;
        }
        return workflow
            .submit_message(
                AnalyzeTurnCommand::new(choice.label.clone())
                    .with_parent(session_id)
                    .with_selected_choice(Some(choice.id.clone())),
            )
            .await;
    }

    match state.action {
        TriageAction::AutoValidate if classify_intent(line) == Intent::Positive => {
            workflow
                .auto_validate(AutoValidateCommand {
                    session_id,
                    reply: line.to_string(),
                })
                .await
        }
        TriageAction::ConfirmSummary if classify_intent(line) == Intent::Positive => {
            workflow
                .confirm_or_modify(ConfirmSummaryCommand {
                    session_id,
                    action: ConfirmAction::Confirm,
                    modifications: None,
                })
                .await
        }
        TriageAction::ConfirmSummary if line.starts_with("/titre ") => {
            let title = line.trim_start_matches("/titre ").trim();
            workflow
                .confirm_or_modify(ConfirmSummaryCommand {
                    session_id,
                    action: ConfirmAction::Modify,
                    modifications: Some(serde_json::json!({ "title": title })),
                })
                .await
        }
        _ => {
            workflow
                .clarify(ClarificationCommand {
                    session_id,
                    reply: line.to_string(),
                    selected_choice_id: None,
                })
                .await
        }
    }
}

/// A choice typed by its number or its id.
fn pick_choice<'a>(choices: &'a [GuidedChoice], line: &str) -> Option<&'a GuidedChoice> {
    if let Ok(index) = line.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| choices.get(i));
    }
    choices.iter().find(|c| c.id == line)
}

fn next_pending(reply: &TriageReply, current: Option<Pending>) -> Option<Pending> {
    match reply {
        TriageReply::Result(TriageResult::Analysis(analysis)) => match analysis.session_id {
            Some(session_id) => Some(Pending {
                session_id,
                action: analysis.action,
                choices: analysis.guided_choices.clone().unwrap_or_default(),
            }),
            None => current,
        },
        TriageReply::Result(TriageResult::TicketCreated(_)) => None,
        TriageReply::Error(err)
            if err.error_code == "SESSION_NOT_FOUND"
                || err.error_code == "SESSION_ALREADY_CONVERTED" =>
        {
            warn!(code = %err.error_code, "Conversation reset");
            None
        }
        TriageReply::Error(_) => current,
    }
}

fn render(reply: &TriageReply, json: bool) -> Result<(), BoxError> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
        return Ok(());
    }
    println!("{}", reply.message());
    if let TriageReply::Result(TriageResult::Analysis(analysis)) = reply {
        for (i, choice) in analysis.guided_choices.iter().flatten().enumerate() {
            println!("  {}. {} {}", i + 1, choice.icon, choice.label);
        }
    }
    Ok(())
}
