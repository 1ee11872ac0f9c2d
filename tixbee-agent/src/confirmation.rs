use tixbee_core::BookingRecord;

use crate::mailer::{ConfirmationMailer, MailStatus};
use crate::payment_window::{PaymentWindow, WindowOutcome};

/// The deferred mail side effect of a completed booking.
///
/// Created at most once per session; consumed by `run`, so it cannot
/// send twice.
#[derive(Debug)]
pub struct ConfirmationJob {
    record: BookingRecord,
}

impl ConfirmationJob {
    pub fn new(record: BookingRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &BookingRecord {
        &self.record
    }

    /// Waits out the payment window, then mails the confirmation.
    /// `None` when the window was cancelled.
    pub async fn run(self, window: PaymentWindow, mailer: &ConfirmationMailer) -> Option<MailStatus> {
        let outcome = window.wait().await;
        if outcome == WindowOutcome::Cancelled {
            tracing::info!(booking_id = %self.record.booking_id, "Payment window cancelled, no email sent");
            return None;
        }

        tracing::info!(booking_id = %self.record.booking_id, ?outcome, "Payment window closed");
        Some(
            mailer
                .send_confirmation(&self.record, &self.record.contact_email)
                .await,
        )
    }
}
