//! Conversation session: one visitor, one booking.
//!
//! State moves `AwaitingName -> InProgress -> PaymentShown` and never back.
//! The first user reply after the greeting is taken as the visitor's name.
//! The first assistant reply carrying the payment marker runs the booking
//! pipeline; `PaymentShown` guarantees it runs at most once per session.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use tixbee_core::{
    build_booking, extract_booking, extract_display_amount, BookingRecord, ExtractionError,
    BOOKING_REFERENCE_TOKEN, PAYMENT_MARKER,
};

use crate::confirmation::ConfirmationJob;
use crate::llm::TextGenerator;
use crate::mailer::MailStatus;
use crate::payment_qr::PaymentQrComposer;
use crate::prompt::{booking_script, RETRY_MESSAGE, WELCOME_MESSAGE};
use crate::turn_log::TurnLog;

/// Shown in place of the booking reference when no booking could be built.
const PENDING_REFERENCE: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    AwaitingName,
    InProgress,
    PaymentShown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: NaiveDateTime,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp,
        }
    }

    pub fn assistant(text: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp,
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Read-only collaborators shared by every session.
pub struct SessionServices {
    pub generator: Arc<dyn TextGenerator>,
    pub payment_qr: PaymentQrComposer,
    pub clock: Arc<dyn Clock>,
    /// Where turn logs go; `None` keeps them in memory.
    pub log_dir: Option<PathBuf>,
}

/// What a user turn produced, for the UI to render.
#[derive(Debug, Default)]
pub struct TurnOutcome {
    pub reply: String,
    /// PNG of the payment request, on the turn that reached `PaymentShown`.
    pub payment_qr: Option<Vec<u8>>,
    pub booking: Option<BookingRecord>,
    pub extraction_error: Option<ExtractionError>,
    /// Present when a confirmation email should follow the payment window.
    pub confirmation: Option<ConfirmationJob>,
    pub generation_failed: bool,
}

pub struct ConversationSession {
    id: String,
    state: SessionState,
    script: String,
    customer_name: Option<String>,
    turns: Vec<ChatTurn>,
    log: TurnLog,
    booking: Option<BookingRecord>,
    mail_status: Option<MailStatus>,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>, services: &SessionServices) -> Self {
        let id = id.into();
        let now = services.clock.now();
        let log = match &services.log_dir {
            Some(dir) => TurnLog::for_session(dir, &id),
            None => TurnLog::in_memory(),
        };

        Self {
            script: booking_script(now.date()),
            state: SessionState::AwaitingName,
            customer_name: None,
            turns: vec![ChatTurn::assistant(WELCOME_MESSAGE, now)],
            log,
            booking: None,
            mail_status: None,
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn booking(&self) -> Option<&BookingRecord> {
        self.booking.as_ref()
    }

    pub fn mail_status(&self) -> Option<&MailStatus> {
        self.mail_status.as_ref()
    }

    pub fn record_mail_status(&mut self, status: MailStatus) {
        self.mail_status = Some(status);
    }

    pub fn turn_log(&self) -> &TurnLog {
        &self.log
    }

    /// Handles one user message end to end.
    ///
    /// A failed text-generation call leaves the session untouched and
    /// answers with a retry prompt.
    pub async fn handle_user_turn(&mut self, text: &str, services: &SessionServices) -> TurnOutcome {
        let now = services.clock.now();
        let user_turn = ChatTurn::user(text, now);

        let mut request = self.turns.clone();
        request.push(user_turn.clone());

        let reply = match services.generator.reply(&self.script, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(session_id = %self.id, "✗ Text generation failed: {}", e);
                return TurnOutcome {
                    reply: RETRY_MESSAGE.to_string(),
                    generation_failed: true,
                    ..TurnOutcome::default()
                };
            }
        };

        if self.state == SessionState::AwaitingName {
            let name = text.trim();
            if !name.is_empty() {
                self.customer_name = Some(name.to_string());
                tracing::info!(session_id = %self.id, "Captured visitor name");
            }
            self.state = SessionState::InProgress;
        }

        let mut outcome = TurnOutcome::default();
        if reply.contains(PAYMENT_MARKER) && self.state != SessionState::PaymentShown {
            self.run_payment_pipeline(&reply, services, now, &mut outcome);
        }

        let reference = self
            .booking
            .as_ref()
            .map_or(PENDING_REFERENCE, |b| b.booking_id.as_str());
        let reply = reply.replace(BOOKING_REFERENCE_TOKEN, reference);

        self.turns.push(user_turn);
        self.turns.push(ChatTurn::assistant(reply.clone(), services.clock.now()));

        if let Err(e) = self.log.record(text, &reply, now).await {
            tracing::warn!(session_id = %self.id, "⚠ Could not write turn log: {}", e);
        }

        outcome.reply = reply;
        outcome
    }

    fn run_payment_pipeline(
        &mut self,
        reply: &str,
        services: &SessionServices,
        now: NaiveDateTime,
        outcome: &mut TurnOutcome,
    ) {
        let built = extract_booking(reply)
            .and_then(|draft| build_booking(draft, self.customer_name.as_deref(), now));

        let display_amount = match built {
            Ok(record) => {
                tracing::info!(
                    session_id = %self.id,
                    booking_id = %record.booking_id,
                    amount = record.amount,
                    "✓ Booking recorded"
                );
                if record.amount > 0 {
                    outcome.confirmation = Some(ConfirmationJob::new(record.clone()));
                } else {
                    tracing::warn!(session_id = %self.id, "⚠ Zero amount, no confirmation email");
                }
                let amount = record.amount;
                outcome.booking = Some(record.clone());
                self.booking = Some(record);
                amount
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id,
                    kind = e.kind(),
                    field = %e.field(),
                    "⚠ Booking extraction failed: {}",
                    e
                );
                outcome.extraction_error = Some(e);
                extract_display_amount(reply).parse::<u64>().unwrap_or(0)
            }
        };

        match services.payment_qr.compose(display_amount) {
            Ok(png) => outcome.payment_qr = Some(png),
            Err(e) => tracing::error!(session_id = %self.id, "✗ Payment QR failed: {}", e),
        }

        self.state = SessionState::PaymentShown;
    }
}
