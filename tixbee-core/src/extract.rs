//! Booking field extraction
//!
//! The assistant is scripted to close a booking with a summary block of
//! labelled lines. This module reads that block back into a `BookingDraft`.
//! Every required label must be present and its value must validate; the
//! first violation is reported as `ExtractionError::MissingField`.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::attraction::Attraction;
use crate::booking::BookingDraft;
use crate::error::{BookingField, ExtractionError};
use crate::pricing::TicketCounts;

/// Placeholder the assistant emits where the payment QR belongs.
pub const PAYMENT_MARKER: &str = "[QR_CODE_PLACEHOLDER]";

/// Placeholder the assistant emits where the booking reference belongs.
pub const BOOKING_REFERENCE_TOKEN: &str = "[BOOKING_REFERENCE]";

lazy_static! {
    static ref EMAIL_LINE: Regex = Regex::new(r"Contact Email:([^\n]*)").unwrap();
    static ref ATTRACTION_LINE: Regex = Regex::new(r"Attraction:([^\n]*)").unwrap();
    static ref VISIT_DATE_LINE: Regex = Regex::new(r"Visit Date:([^\n]*)").unwrap();
    static ref TOTAL_AMOUNT: Regex = Regex::new(r"Total Amount:[ \t]*₹[ \t]*(\d+)").unwrap();
    static ref TICKETS_SPAN: Regex =
        Regex::new(r"(?s)Tickets Booked:(.*?)(?:Total Amount:|\z)").unwrap();
    static ref ADULT_COUNT: Regex = Regex::new(r"(\d+)\s+Adults?\s+tickets?").unwrap();
    static ref STUDENT_COUNT: Regex = Regex::new(r"(\d+)\s+Students?\s+tickets?").unwrap();
    static ref CHILD_COUNT: Regex = Regex::new(r"(\d+)\s+Child(?:ren)?\s+tickets?").unwrap();
}

/// Reads the booking summary out of an assistant reply.
///
/// Fields are checked in the order email, attraction, visit date, amount,
/// tickets. Ticket categories missing from the `Tickets Booked:` section
/// count as zero; the section itself is required.
pub fn extract_booking(reply: &str) -> Result<BookingDraft, ExtractionError> {
    let contact_email = labelled_value(&EMAIL_LINE, reply)
        .filter(|email| is_plausible_email(email))
        .ok_or(ExtractionError::MissingField(BookingField::Email))?;

    let attraction = labelled_value(&ATTRACTION_LINE, reply)
        .and_then(|label| Attraction::from_label(&label))
        .ok_or(ExtractionError::MissingField(BookingField::Attraction))?;

    let visit_date = labelled_value(&VISIT_DATE_LINE, reply)
        .and_then(|date| NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok())
        .ok_or(ExtractionError::MissingField(BookingField::VisitDate))?;

    let amount = TOTAL_AMOUNT
        .captures(reply)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .ok_or(ExtractionError::MissingField(BookingField::Amount))?;

    let tickets_span = TICKETS_SPAN
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .ok_or(ExtractionError::MissingField(BookingField::Tickets))?;
    let tickets = ticket_counts(tickets_span.as_str())?;

    Ok(BookingDraft {
        contact_email,
        attraction,
        visit_date,
        tickets,
        amount,
    })
}

/// Digits after `Total Amount: ₹`, or `"0"` when the label is absent.
///
/// Only for rendering a payment prompt; never a basis for a booking.
pub fn extract_display_amount(reply: &str) -> String {
    TOTAL_AMOUNT
        .captures(reply)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "0".to_string())
}

fn labelled_value(pattern: &Regex, text: &str) -> Option<String> {
    let value = pattern.captures(text)?.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// An absent category is zero; a count that does not fit is a tickets error.
fn ticket_counts(span: &str) -> Result<TicketCounts, ExtractionError> {
    let count = |pattern: &Regex| match pattern.captures(span) {
        Some(caps) => caps[1]
            .parse::<u32>()
            .map_err(|_| ExtractionError::MissingField(BookingField::Tickets)),
        None => Ok(0),
    };

    Ok(TicketCounts {
        adult: count(&ADULT_COUNT)?,
        student: count(&STUDENT_COUNT)?,
        child: count(&CHILD_COUNT)?,
    })
}

fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "Thank you for providing your email! Here's your booking summary: 📋\n\n\
        Booking Details:\n\
        ━━━━━━━━━━━━━━━━━━━━\n\n\
        \u{20}   🏰 Attraction: Lalbagh Botanical Garden\n\
        \u{20}   📅 Visit Date: 2025-03-01\n\n\
        \u{20}   🎟️ Tickets Booked:\n\
        \u{20}       • 2 Adult tickets\n\
        \u{20}       • 0 Student tickets\n\
        \u{20}       • 1 Children tickets\n\n\
        \u{20}   💰 Total Amount: ₹50\n\
        \u{20}   📧 Contact Email: a@b.com\n\
        \u{20}   🔢 Booking Reference: [BOOKING_REFERENCE]\n\n\
        \u{20}   📱 Scan QR code to pay:\n\
        \u{20}   [QR_CODE_PLACEHOLDER]\n";

    #[test]
    fn test_extracts_full_summary() {
        let draft = extract_booking(SUMMARY).unwrap();
        assert_eq!(draft.attraction, Attraction::LalbaghBotanicalGarden);
        assert_eq!(draft.attraction.name(), "Lalbagh Botanical Garden");
        assert_eq!(draft.visit_date.to_string(), "2025-03-01");
        assert_eq!(draft.tickets, TicketCounts::new(2, 0, 1));
        assert_eq!(draft.amount, 50);
        assert_eq!(draft.contact_email, "a@b.com");
    }

    #[test]
    fn test_minimal_scenario_message() {
        let reply = "🏰 Attraction: Lalbagh Botanical Garden\n📅 Visit Date: 2025-03-01\n...🎟️ Tickets Booked:\n  • 2 Adult tickets\n  • 0 Student tickets\n  • 1 Children tickets\n💰 Total Amount: ₹50\n📧 Contact Email: a@b.com\n";
        let draft = extract_booking(reply).unwrap();
        assert_eq!(draft.tickets.adult, 2);
        assert_eq!(draft.tickets.student, 0);
        assert_eq!(draft.tickets.child, 1);
        assert_eq!(draft.amount, 50);
        assert_eq!(draft.contact_email, "a@b.com");
    }

    #[test]
    fn test_values_are_trimmed() {
        let reply = SUMMARY
            .replace("Contact Email: a@b.com", "Contact Email:    a@b.com   \t")
            .replace("Visit Date: 2025-03-01", "Visit Date:   2025-03-01  ");
        let draft = extract_booking(&reply).unwrap();
        assert_eq!(draft.contact_email, "a@b.com");
        assert_eq!(draft.visit_date.to_string(), "2025-03-01");
    }

    #[test]
    fn test_missing_email_is_missing_field() {
        let reply = SUMMARY.replace("📧 Contact Email: a@b.com\n", "");
        assert_eq!(
            extract_booking(&reply).unwrap_err(),
            ExtractionError::MissingField(BookingField::Email)
        );
    }

    #[test]
    fn test_malformed_email_is_missing_field() {
        let reply = SUMMARY.replace("a@b.com", "not an email");
        let err = extract_booking(&reply).unwrap_err();
        assert_eq!(err.kind(), "MISSING_FIELD");
        assert_eq!(err.field(), BookingField::Email);
    }

    #[test]
    fn test_unknown_attraction_is_missing_field() {
        let reply = SUMMARY.replace("Lalbagh Botanical Garden", "Cubbon Park");
        assert_eq!(
            extract_booking(&reply).unwrap_err(),
            ExtractionError::MissingField(BookingField::Attraction)
        );
    }

    #[test]
    fn test_unparseable_date_is_missing_field() {
        let reply = SUMMARY.replace("2025-03-01", "next Sunday");
        assert_eq!(
            extract_booking(&reply).unwrap_err(),
            ExtractionError::MissingField(BookingField::VisitDate)
        );
    }

    #[test]
    fn test_missing_amount_is_missing_field() {
        let reply = SUMMARY.replace("💰 Total Amount: ₹50\n", "");
        assert_eq!(
            extract_booking(&reply).unwrap_err(),
            ExtractionError::MissingField(BookingField::Amount)
        );
        assert_eq!(extract_display_amount(&reply), "0");
    }

    #[test]
    fn test_absent_ticket_categories_default_to_zero() {
        let reply = SUMMARY
            .replace("        • 0 Student tickets\n", "")
            .replace("        • 1 Children tickets\n", "");
        let draft = extract_booking(&reply).unwrap();
        assert_eq!(draft.tickets, TicketCounts::new(2, 0, 0));
    }

    #[test]
    fn test_counts_outside_ticket_section_are_ignored() {
        let reply = format!("Earlier you said 7 Adult tickets.\n{}", SUMMARY);
        let draft = extract_booking(&reply).unwrap();
        assert_eq!(draft.tickets.adult, 2);
    }

    #[test]
    fn test_missing_ticket_section_is_missing_field() {
        let reply = SUMMARY.replace("Tickets Booked:", "Tickets:");
        assert_eq!(
            extract_booking(&reply).unwrap_err(),
            ExtractionError::MissingField(BookingField::Tickets)
        );
    }

    #[test]
    fn test_oversized_ticket_count_is_missing_field() {
        let reply = SUMMARY
            .replace("• 2 Adult tickets", "• 5000000000 Adult tickets")
            .replace("₹50", "₹100000000000");
        assert_eq!(
            extract_booking(&reply).unwrap_err(),
            ExtractionError::MissingField(BookingField::Tickets)
        );
    }

    #[test]
    fn test_display_amount() {
        assert_eq!(extract_display_amount(SUMMARY), "50");
        assert_eq!(extract_display_amount("no total here"), "0");
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("visitor@example.in"));
        assert!(!is_plausible_email("visitor@localhost"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("a@@b.com"));
    }
}
