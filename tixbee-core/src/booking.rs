use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::attraction::{Attraction, SUPPORTED_CITY};
use crate::error::ExtractionError;
use crate::pricing::TicketCounts;

/// Name used when a booking completes before the visitor's name was captured.
pub const PLACEHOLDER_NAME: &str = "Guest";

/// Fields read from the assistant's booking summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub contact_email: String,
    pub attraction: Attraction,
    pub visit_date: NaiveDate,
    pub tickets: TicketCounts,
    pub amount: u64,
}

/// Canonical booking payload, built once per completed conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub customer_name: String,
    pub city: String,
    pub attraction: Attraction,
    pub visit_date: NaiveDate,
    pub ticket_counts: TicketCounts,
    pub amount: u64,
    pub contact_email: String,
}

/// `TIX` followed by the 14-digit issue timestamp.
pub fn booking_id(issued_at: NaiveDateTime) -> String {
    format!("TIX{}", issued_at.format("%Y%m%d%H%M%S"))
}

/// Builds the booking from an extracted draft.
///
/// Pure: the id and the past-date check both derive from `issued_at`.
/// The amount is taken as the assistant computed it; a disagreement with
/// the price table is logged, not corrected.
pub fn build_booking(
    draft: BookingDraft,
    customer_name: Option<&str>,
    issued_at: NaiveDateTime,
) -> Result<BookingRecord, ExtractionError> {
    let today = issued_at.date();
    if draft.visit_date < today {
        return Err(ExtractionError::VisitDateInPast {
            date: draft.visit_date,
            today,
        });
    }

    let expected = draft.tickets.expected_amount();
    if expected != draft.amount {
        tracing::warn!(
            amount = draft.amount,
            expected,
            "⚠ Total amount disagrees with the price table; keeping the quoted amount"
        );
    }

    let customer_name = customer_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(PLACEHOLDER_NAME)
        .to_string();

    Ok(BookingRecord {
        booking_id: booking_id(issued_at),
        customer_name,
        city: SUPPORTED_CITY.to_string(),
        attraction: draft.attraction,
        visit_date: draft.visit_date,
        ticket_counts: draft.tickets,
        amount: draft.amount,
        contact_email: draft.contact_email,
    })
}
