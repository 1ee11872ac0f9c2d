/// TixBee booking agent library
/// Exposes the conversation pipeline for reuse in CLI and HTTP server modes:
/// - text generation (Claude) behind the `TextGenerator` seam
/// - per-session conversation state and the payment/mail side effect
/// - payment and booking QR rendering
/// - confirmation email over SMTP

pub mod assets;
pub mod booking_qr;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod http;
pub mod llm;
pub mod mailer;
pub mod payment_qr;
pub mod payment_window;
pub mod prompt;
pub mod session;
pub mod turn_log;

#[cfg(test)]
pub(crate) mod test_support;

pub use assets::AssetStore;
pub use booking_qr::BookingQrComposer;
pub use config::{AgentConfig, LlmConfig, MailConfig};
pub use confirmation::ConfirmationJob;
pub use error::{GenerationError, MailError, RenderError};
pub use llm::{ClaudeClient, TextGenerator};
pub use mailer::{ConfirmationMailer, MailStatus, MailTransport, SmtpMailTransport};
pub use payment_qr::{Payee, PaymentQrComposer};
pub use payment_window::{PaymentWindow, PaymentWindowHandle, WindowOutcome};
pub use session::{
    ChatTurn, Clock, ConversationSession, Role, SessionServices, SessionState, SystemClock,
    TurnOutcome,
};
pub use turn_log::{TurnLog, TurnLogEntry};

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber on stderr. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a running agent shares across sessions.
pub struct Agent {
    pub services: SessionServices,
    pub mailer: ConfirmationMailer,
    pub payment_window: Duration,
}

impl Agent {
    pub fn from_config(config: &AgentConfig) -> anyhow::Result<Self> {
        let assets = AssetStore::new(&config.assets_dir);
        let payee = Payee {
            id: config.upi_id.clone(),
            name: config.payee_name.clone(),
        };

        let services = SessionServices {
            generator: Arc::new(ClaudeClient::new(&config.llm)?),
            payment_qr: PaymentQrComposer::new(&assets, payee),
            clock: Arc::new(SystemClock),
            log_dir: Some(config.log_dir.clone()),
        };

        let mailer = ConfirmationMailer::from_config(config.mail.as_ref())?;

        Ok(Self {
            services,
            mailer,
            payment_window: config.payment_window,
        })
    }
}
