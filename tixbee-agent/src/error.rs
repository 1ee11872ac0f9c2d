use std::time::Duration;
use thiserror::Error;

/// Rendering a QR code or encoding the resulting image failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// The text-generation call failed.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Claude API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("No response from Claude")]
    Empty,
}

impl GenerationError {
    /// Worth one more attempt: timeouts, connection trouble, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Timeout(_) => true,
            GenerationError::Http(e) => e.is_timeout() || e.is_connect(),
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Empty => false,
        }
    }
}

/// Building or delivering the confirmation email failed.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("could not render booking QR: {0}")]
    Render(#[from] RenderError),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("mail transport failed: {0}")]
    Transport(String),
}
