//! GLPI REST client.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GlpiConfig::new("https://glpi.example.com/apirest.php", app_token, user_token)
//!     .with_session_lifetime(Duration::from_secs(3600));
//! let client = GlpiClient::new(config)?;
//! ```
//!
//! The session token is obtained on first use and reused until it ages out
//! or the server answers 401, in which case it is renewed once.

use async_trait::async_trait;
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::mapping::{
    created_id, first_user_id, followup_payload, requester_payload, ticket_payload,
    GLPI_USER_EMAIL_FIELD, GLPI_USER_ID_COLUMN,
};
use crate::ports::{ExternalTicket, ExternalTicketing, ExternalTicketingError};

/// Connection settings for a GLPI instance.
#[derive(Debug, Clone)]
pub struct GlpiConfig {
    /// Base URL of the REST API, e.g. `https://glpi.example.com/apirest.php`.
    pub api_url: String,
    app_token: Secret<String>,
    user_token: Secret<String>,
    /// How long a session token is reused before being renewed proactively.
    pub session_lifetime: Duration,
    pub timeout: Duration,
}

impl GlpiConfig {
    pub fn new(
        api_url: impl Into<String>,
        app_token: impl Into<String>,
        user_token: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            app_token: Secret::new(app_token.into()),
            user_token: Secret::new(user_token.into()),
            session_lifetime: Duration::from_secs(3600),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug)]
struct CachedSession {
    token: String,
    opened_at: Instant,
}

/// GLPI implementation of the ExternalTicketing port.
pub struct GlpiClient {
    config: GlpiConfig,
    client: Client,
    session: Mutex<Option<CachedSession>>,
}

impl GlpiClient {
    /// Creates a client. No request is made until the first call.
    ///
    /// # Errors
    ///
    /// - `Network` if the HTTP client cannot be built
    pub fn new(config: GlpiConfig) -> Result<Self, ExternalTicketingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ExternalTicketingError::Network(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            client,
            session: Mutex::new(None),
        })
    }

    async fn session_token(&self) -> Result<String, ExternalTicketingError> {
        let mut session = self.session.lock().await;
        if let Some(cached) = session.as_ref() {
            if cached.opened_at.elapsed() < self.config.session_lifetime {
                return Ok(cached.token.clone());
            }
        }

        let token = self.init_session().await?;
        *session = Some(CachedSession {
            token: token.clone(),
            opened_at: Instant::now(),
        });
        Ok(token)
    }

    async fn invalidate_session(&self) {
        *self.session.lock().await = None;
    }

    async fn init_session(&self) -> Result<String, ExternalTicketingError> {
        let response = self
            .client
            .get(self.config.url("initSession"))
            .header("App-Token", self.config.app_token.expose_secret())
            .header(
                "Authorization",
                format!("user_token {}", self.config.user_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| ExternalTicketingError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ExternalTicketingError::Authentication(format!(
                "initSession returned {}: {}",
                status, body
            )));
        }

        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| ExternalTicketingError::Decode(format!("initSession: {}", e)))?;
        let token = parsed
            .get("session_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExternalTicketingError::Authentication("no session_token in response".to_string())
            })?;

        info!("GLPI session opened");
        Ok(token.to_string())
    }

    /// Sends one request, renewing the session once on 401.
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ExternalTicketingError> {
        match self.call_once(method.clone(), path, query, body).await {
            Err(err) if err.is_unauthorized() => {
                warn!(path = path, "GLPI session token rejected, renewing");
                self.invalidate_session().await;
                self.call_once(method, path, query, body).await
            }
            other => other,
        }
    }

    async fn call_once(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ExternalTicketingError> {
        let token = self.session_token().await?;

        let mut request = self
            .client
            .request(method, self.config.url(path))
            .header("App-Token", self.config.app_token.expose_secret())
            .header("Session-Token", token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExternalTicketingError::Network(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ExternalTicketingError::http(status.as_u16(), text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ExternalTicketingError::Decode(e.to_string()))
    }

    async fn find_user_id(&self, email: &str) -> Result<Option<i64>, ExternalTicketingError> {
        let query = vec![
            ("criteria[0][field]".to_string(), GLPI_USER_EMAIL_FIELD.to_string()),
            ("criteria[0][searchtype]".to_string(), "equals".to_string()),
            ("criteria[0][value]".to_string(), email.to_string()),
            ("forcedisplay[0]".to_string(), GLPI_USER_ID_COLUMN.to_string()),
        ];
        let response = self.call(Method::GET, "search/User", &query, None).await?;
        Ok(first_user_id(&response))
    }

    async fn link_requester(&self, ticket_id: i64, email: &str) -> Result<(), ExternalTicketingError> {
        let Some(user_id) = self.find_user_id(email).await? else {
            debug!(ticket_id = ticket_id, "Requester not found in GLPI");
            return Ok(());
        };
        self.call(
            Method::POST,
            "Ticket_User",
            &[],
            Some(&requester_payload(ticket_id, user_id)),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ExternalTicketing for GlpiClient {
    async fn create_ticket(&self, ticket: &ExternalTicket) -> Result<i64, ExternalTicketingError> {
        let response = self
            .call(Method::POST, "Ticket", &[], Some(&ticket_payload(ticket)))
            .await?;
        let external_id = created_id(&response).ok_or_else(|| {
            ExternalTicketingError::Decode(format!("no ticket id in response: {}", response))
        })?;

        if let Some(email) = ticket.requester_email.as_deref() {
            if let Err(err) = self.link_requester(external_id, email).await {
                warn!(external_id = external_id, error = %err, "Failed to link GLPI requester");
            }
        }

        info!(external_id = external_id, "GLPI ticket created");
        Ok(external_id)
    }

    async fn add_note(
        &self,
        external_id: i64,
        text: &str,
        private: bool,
    ) -> Result<(), ExternalTicketingError> {
        self.call(
            Method::POST,
            "ITILFollowup",
            &[],
            Some(&followup_payload(external_id, text, private)),
        )
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for GlpiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlpiClient")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}
