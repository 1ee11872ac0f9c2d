//! TixBee booking core
//!
//! Pure booking domain shared by the chat agent: no I/O, no clocks, no network.
//! - `pricing`: ticket categories and the per-ticket price table
//! - `attraction`: the catalogue of bookable places
//! - `extract`: recovers booking fields from an assistant reply
//! - `booking`: turns an extracted draft into a canonical `BookingRecord`

pub mod attraction;
pub mod booking;
pub mod error;
pub mod extract;
pub mod pricing;

pub use attraction::{Attraction, SUPPORTED_CITY};
pub use booking::{booking_id, build_booking, BookingDraft, BookingRecord, PLACEHOLDER_NAME};
pub use error::{BookingField, ExtractionError};
pub use extract::{
    extract_booking, extract_display_amount, BOOKING_REFERENCE_TOKEN, PAYMENT_MARKER,
};
pub use pricing::TicketCounts;
