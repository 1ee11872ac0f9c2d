//! REST surface for web front ends.
//! One registry entry per conversation; each entry is locked for the whole
//! turn, so a session never handles two messages at once.
//! Idle and finished sessions are evicted whenever a new one is admitted,
//! and the registry never holds more than `SessionLimits::max_sessions`.

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tower_http::cors::CorsLayer;

use crate::confirmation::ConfirmationJob;
use crate::mailer::MailStatus;
use crate::payment_window::{self, PaymentWindow, PaymentWindowHandle};
use crate::prompt::WELCOME_MESSAGE;
use crate::session::{ChatTurn, ConversationSession, SessionState};
use crate::Agent;

const MAX_SESSION_ID_LEN: usize = 64;

/// How long sessions may linger and how many may exist at once.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Any session untouched for this long is dropped.
    pub idle_ttl: Duration,
    /// A session past PAYMENT_SHOWN with no mail in flight is dropped sooner.
    pub finished_ttl: Duration,
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            finished_ttl: Duration::from_secs(5 * 60),
            max_sessions: 1000,
        }
    }
}

/// A live conversation and the payment window it opened, if any.
pub struct SessionEntry {
    session: ConversationSession,
    window: Option<PaymentWindowHandle>,
    mail_pending: bool,
    last_active: Instant,
}

impl SessionEntry {
    fn new(session: ConversationSession) -> Self {
        Self {
            session,
            window: None,
            mail_pending: false,
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    fn is_expired(&self, limits: &SessionLimits) -> bool {
        let idle = self.last_active.elapsed();
        let finished = self.session.state() == SessionState::PaymentShown && !self.mail_pending;
        idle >= limits.idle_ttl || (finished && idle >= limits.finished_ttl)
    }
}

type SharedEntry = Arc<Mutex<SessionEntry>>;

/// Session registry shared by all handlers
#[derive(Clone)]
pub struct SessionRegistry {
    entries: Arc<Mutex<HashMap<String, SharedEntry>>>,
    limits: SessionLimits,
}

impl SessionRegistry {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            limits,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    async fn get(&self, id: &str) -> Option<SharedEntry> {
        self.entries.lock().await.get(id).cloned()
    }

    /// The existing entry for `id`, or a new one from `create` when there is
    /// room after evicting expired sessions. `None` when the registry is full.
    async fn get_or_create(
        &self,
        id: &str,
        create: impl FnOnce() -> SessionEntry,
    ) -> Option<SharedEntry> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(id) {
            return Some(entry.clone());
        }

        self.evict_expired(&mut entries);
        if entries.len() >= self.limits.max_sessions {
            return None;
        }

        let entry = Arc::new(Mutex::new(create()));
        entries.insert(id.to_string(), entry.clone());
        Some(entry)
    }

    /// Entries locked by an in-flight turn are busy, not idle, and stay.
    fn evict_expired(&self, entries: &mut HashMap<String, SharedEntry>) {
        let limits = self.limits;
        entries.retain(|id, entry| {
            let expired = match entry.try_lock() {
                Ok(guard) => guard.is_expired(&limits),
                Err(_) => false,
            };
            if expired {
                tracing::info!(session_id = %id, "Evicted expired session");
            }
            !expired
        });
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<SessionState>,
    /// Base64-encoded PNG
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_qr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking_id: Option<String>,
}

impl ChatResponse {
    fn failure(session_id: String, error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
            session_id,
            state: None,
            payment_qr: None,
            booking_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: String,
    state: SessionState,
    turns: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mail_status: Option<MailStatus>,
}

#[derive(Debug, Serialize)]
struct SignalResponse {
    success: bool,
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn router(agent: Arc<Agent>, sessions: SessionRegistry) -> Router {

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/payment/confirm", post(confirm_payment))
        .route("/sessions/:id/payment/cancel", post(cancel_payment))
        .layer(CorsLayer::permissive())
        .layer(Extension(agent))
        .layer(Extension(sessions))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn chat(
    Extension(agent): Extension<Arc<Agent>>,
    Extension(sessions): Extension<SessionRegistry>,
    Json(payload): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    let session_id = payload
        .session_id
        .unwrap_or_else(|| format!("sess_{}", uuid::Uuid::new_v4()));

    if !is_valid_session_id(&session_id) {
        tracing::warn!(%session_id, "Rejected malformed session id");
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatResponse::failure(session_id, "invalid session_id")),
        );
    }

    // A greeting request never creates a session; the first real message does.
    if payload.message.trim().is_empty() {
        let (latest, state) = match sessions.get(&session_id).await {
            Some(entry) => {
                let guard = entry.lock().await;
                (
                    guard.session.turns().last().map(|turn| turn.text.clone()),
                    guard.session.state(),
                )
            }
            None => (Some(WELCOME_MESSAGE.to_string()), SessionState::AwaitingName),
        };
        return (
            StatusCode::OK,
            Json(ChatResponse {
                success: true,
                response: latest,
                error: None,
                state: Some(state),
                payment_qr: None,
                booking_id: None,
                session_id,
            }),
        );
    }

    let created = sessions
        .get_or_create(&session_id, || {
            tracing::info!(%session_id, "New session");
            SessionEntry::new(ConversationSession::new(session_id.clone(), &agent.services))
        })
        .await;
    let Some(entry) = created else {
        tracing::warn!(%session_id, "Session registry full, rejecting new session");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ChatResponse::failure(
                session_id,
                "too many active sessions, please try again later",
            )),
        );
    };

    let mut guard = entry.lock().await;
    guard.touch();

    tracing::info!(%session_id, length = payload.message.len(), "Incoming message");
    let outcome = guard
        .session
        .handle_user_turn(&payload.message, &agent.services)
        .await;

    if outcome.generation_failed {
        return (
            StatusCode::BAD_GATEWAY,
            Json(ChatResponse {
                state: Some(guard.session.state()),
                ..ChatResponse::failure(session_id, outcome.reply)
            }),
        );
    }

    if let Some(job) = outcome.confirmation {
        let (handle, window) = payment_window::open(agent.payment_window);
        guard.window = Some(handle);
        guard.mail_pending = true;
        spawn_confirmation(agent.clone(), entry.clone(), job, window);
    }

    let payment_qr = outcome
        .payment_qr
        .map(|png| base64::engine::general_purpose::STANDARD.encode(png));

    (
        StatusCode::OK,
        Json(ChatResponse {
            success: true,
            response: Some(outcome.reply),
            error: None,
            state: Some(guard.session.state()),
            payment_qr,
            booking_id: outcome.booking.map(|b| b.booking_id),
            session_id,
        }),
    )
}

fn spawn_confirmation(
    agent: Arc<Agent>,
    entry: SharedEntry,
    job: ConfirmationJob,
    window: PaymentWindow,
) {
    tokio::spawn(async move {
        let status = job.run(window, &agent.mailer).await;
        let mut guard = entry.lock().await;
        guard.mail_pending = false;
        if let Some(status) = status {
            guard.session.record_mail_status(status);
        }
    });
}

async fn get_session(
    Extension(sessions): Extension<SessionRegistry>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let entry = sessions.get(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    let guard = entry.lock().await;

    Ok(Json(SessionResponse {
        session_id: id,
        state: guard.session.state(),
        turns: guard.session.turns().to_vec(),
        mail_status: guard.session.mail_status().cloned(),
    }))
}

async fn confirm_payment(
    Extension(sessions): Extension<SessionRegistry>,
    Path(id): Path<String>,
) -> (StatusCode, Json<SignalResponse>) {
    signal_window(&sessions, id, PaymentWindowHandle::confirm).await
}

async fn cancel_payment(
    Extension(sessions): Extension<SessionRegistry>,
    Path(id): Path<String>,
) -> (StatusCode, Json<SignalResponse>) {
    signal_window(&sessions, id, PaymentWindowHandle::cancel).await
}

async fn signal_window(
    sessions: &SessionRegistry,
    session_id: String,
    signal: fn(&mut PaymentWindowHandle) -> bool,
) -> (StatusCode, Json<SignalResponse>) {
    let Some(entry) = sessions.get(&session_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(SignalResponse {
                success: false,
                session_id,
                error: Some("unknown session".to_string()),
            }),
        );
    };

    let mut guard = entry.lock().await;
    guard.touch();
    let delivered = guard.window.as_mut().map_or(false, signal);
    if !delivered {
        return (
            StatusCode::CONFLICT,
            Json(SignalResponse {
                success: false,
                session_id,
                error: Some("no payment window is open".to_string()),
            }),
        );
    }

    tracing::info!(%session_id, "Payment window signalled");
    (
        StatusCode::OK,
        Json(SignalResponse {
            success: true,
            session_id,
            error: None,
        }),
    )
}
