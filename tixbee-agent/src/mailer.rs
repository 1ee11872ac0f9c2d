//! Booking confirmation email.
//!
//! `ConfirmationMailer::send_confirmation` never fails: every build,
//! render, or transport problem comes back as a failed `MailStatus`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tixbee_core::BookingRecord;

use crate::booking_qr::BookingQrComposer;
use crate::config::MailConfig;
use crate::error::MailError;

const SENDER_NAME: &str = "TixBee";
const QR_CONTENT_ID: &str = "booking-qr";
const SENT_MESSAGE: &str = "Email sent successfully!";

/// Result of one send attempt, shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailStatus {
    pub success: bool,
    pub message: String,
}

impl MailStatus {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: SENT_MESSAGE.to_string(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            message: reason.into(),
        }
    }
}

/// Hands a finished message to the outside world.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, message: Message) -> Result<(), MailError>;
}

/// STARTTLS relay with username/password login.
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let inner = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { inner })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, message: Message) -> Result<(), MailError> {
        self.inner.send(message).await?;
        Ok(())
    }
}

pub struct ConfirmationMailer {
    sender: Option<Mailbox>,
    transport: Option<Arc<dyn MailTransport>>,
    qr: BookingQrComposer,
}

impl ConfirmationMailer {
    pub fn new(sender: Mailbox, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            sender: Some(sender),
            transport: Some(transport),
            qr: BookingQrComposer::default(),
        }
    }

    /// A mailer that reports every send as not configured.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            transport: None,
            qr: BookingQrComposer::default(),
        }
    }

    /// SMTP mailer sending as the configured username, or a disabled one.
    pub fn from_config(config: Option<&MailConfig>) -> Result<Self, MailError> {
        let Some(config) = config else {
            tracing::warn!("⚠ EMAIL_* not set, confirmation emails are disabled");
            return Ok(Self::disabled());
        };

        let address: Address = config.username.parse()?;
        let sender = Mailbox::new(Some(SENDER_NAME.to_string()), address);
        let transport = SmtpMailTransport::new(config)?;
        tracing::info!(host = %config.host, port = config.port, "SMTP transport ready");
        Ok(Self::new(sender, Arc::new(transport)))
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send_confirmation(&self, record: &BookingRecord, to: &str) -> MailStatus {
        match self.try_send(record, to).await {
            Ok(()) => {
                tracing::info!(booking_id = %record.booking_id, "✓ Confirmation email sent");
                MailStatus::sent()
            }
            Err(e) => {
                tracing::error!(booking_id = %record.booking_id, "✗ Confirmation email failed: {}", e);
                MailStatus::failed(e.to_string())
            }
        }
    }

    async fn try_send(&self, record: &BookingRecord, to: &str) -> Result<(), MailError> {
        let (Some(sender), Some(transport)) = (&self.sender, &self.transport) else {
            return Err(MailError::NotConfigured);
        };

        let message = self.build_message(sender.clone(), to.parse()?, record)?;
        transport.deliver(message).await
    }

    fn build_message(
        &self,
        from: Mailbox,
        to: Mailbox,
        record: &BookingRecord,
    ) -> Result<Message, MailError> {
        let png = self.qr.render(record)?;
        let qr_part = Attachment::new_inline(QR_CONTENT_ID.to_string())
            .body(png, "image/png".parse::<ContentType>()?);

        let body = MultiPart::alternative()
            .singlepart(SinglePart::plain(text_body(record)))
            .multipart(
                MultiPart::related()
                    .singlepart(SinglePart::html(html_body(record)))
                    .singlepart(qr_part),
            );

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(subject(record))
            .multipart(body)?)
    }
}

pub fn subject(record: &BookingRecord) -> String {
    format!("TixBee Booking Confirmation - {}", record.booking_id)
}

pub fn text_body(record: &BookingRecord) -> String {
    format!(
        "Dear {name},\n\n\
         Thank you for booking with TixBee! Here are your booking details:\n\n\
         Booking ID: {id}\n\
         Attraction: {attraction}\n\
         City: {city}\n\
         Visit Date: {date}\n\
         Tickets: {tickets}\n\
         Amount Paid: ₹{amount}\n\n\
         Please show this email at the entrance.\n\n\
         Have a great time!\n\
         Team TixBee\n",
        name = record.customer_name,
        id = record.booking_id,
        attraction = record.attraction,
        city = record.city,
        date = record.visit_date.format("%Y-%m-%d"),
        tickets = record.ticket_counts.summary(),
        amount = record.amount,
    )
}

pub fn html_body(record: &BookingRecord) -> String {
    let rows = [
        ("Booking ID", record.booking_id.clone()),
        ("Attraction", record.attraction.to_string()),
        ("City", record.city.clone()),
        ("Visit Date", record.visit_date.format("%Y-%m-%d").to_string()),
        ("Tickets", record.ticket_counts.summary()),
        ("Amount Paid", format!("₹{}", record.amount)),
    ]
    .iter()
    .map(|(label, value)| format!("<tr><td><b>{}</b></td><td>{}</td></tr>", label, escape_html(value)))
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        "<html><body>\n\
         <p>Dear {name},</p>\n\
         <p>Thank you for booking with TixBee! Here are your booking details:</p>\n\
         <table>\n{rows}\n</table>\n\
         <p><img src=\"cid:{cid}\" alt=\"Booking QR code\"></p>\n\
         <p>Please show this email at the entrance.</p>\n\
         <p>Have a great time!<br>Team TixBee</p>\n\
         </body></html>\n",
        name = escape_html(&record.customer_name),
        rows = rows,
        cid = QR_CONTENT_ID,
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_record, FailingTransport, RecordingTransport};

    fn sender() -> Mailbox {
        "TixBee <bookings@tixbee.test>".parse().unwrap()
    }

    #[tokio::test]
    async fn test_send_confirmation_delivers_multipart_message() {
        let transport = RecordingTransport::default();
        let mailer = ConfirmationMailer::new(sender(), Arc::new(transport.clone()));

        let status = mailer.send_confirmation(&sample_record(), "a@b.com").await;
        assert_eq!(status, MailStatus::sent());
        assert_eq!(status.message, "Email sent successfully!");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let wire = &sent[0];
        assert!(wire.contains("Subject: TixBee Booking Confirmation - TIX20250220090507"));
        assert!(wire.contains("To: a@b.com"));
        assert!(wire.contains("multipart/alternative"));
        assert!(wire.contains("multipart/related"));
        assert!(wire.contains("Content-ID: <booking-qr>"));
        assert!(wire.contains("image/png"));
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_failed_status() {
        let mailer = ConfirmationMailer::new(sender(), Arc::new(FailingTransport));
        let status = mailer.send_confirmation(&sample_record(), "a@b.com").await;
        assert!(!status.success);
        assert!(status.message.contains("535 authentication failed"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_becomes_failed_status() {
        let transport = RecordingTransport::default();
        let mailer = ConfirmationMailer::new(sender(), Arc::new(transport.clone()));
        let status = mailer.send_confirmation(&sample_record(), "not an address").await;
        assert!(!status.success);
        assert!(status.message.starts_with("invalid address"));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_mailer_reports_not_configured() {
        let mailer = ConfirmationMailer::disabled();
        assert!(!mailer.is_enabled());
        let status = mailer.send_confirmation(&sample_record(), "a@b.com").await;
        assert_eq!(status, MailStatus::failed("mail transport is not configured"));
    }

    #[test]
    fn test_from_config_without_settings_is_disabled() {
        let mailer = ConfirmationMailer::from_config(None).unwrap();
        assert!(!mailer.is_enabled());
    }

    #[test]
    fn test_bodies_carry_booking_details() {
        let record = sample_record();
        let text = text_body(&record);
        assert!(text.starts_with("Dear Asha,"));
        assert!(text.contains("Booking ID: TIX20250220090507"));
        assert!(text.contains("Tickets: 2 Adult, 0 Student, 1 Children"));
        assert!(text.contains("Amount Paid: ₹50"));
        assert!(text.contains("Please show this email at the entrance."));

        let html = html_body(&record);
        assert!(html.contains("<img src=\"cid:booking-qr\""));
        assert!(html.contains("<td>Lalbagh Botanical Garden</td>"));
        assert!(html.contains("<td>₹50</td>"));
        assert_eq!(subject(&record), "TixBee Booking Confirmation - TIX20250220090507");
    }

    #[test]
    fn test_html_body_escapes_name() {
        let mut record = sample_record();
        record.customer_name = "<script>&".to_string();
        let html = html_body(&record);
        assert!(html.contains("Dear &lt;script&gt;&amp;,"));
        assert!(!html.contains("<script>"));
    }
}
