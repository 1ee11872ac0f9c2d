//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use lettre::Message;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tixbee_core::{Attraction, BookingRecord, TicketCounts};

use crate::error::{GenerationError, MailError};
use crate::llm::TextGenerator;
use crate::mailer::MailTransport;
use crate::session::{ChatTurn, Clock};

pub fn sample_record() -> BookingRecord {
    BookingRecord {
        booking_id: "TIX20250220090507".to_string(),
        customer_name: "Asha".to_string(),
        city: "Bengaluru".to_string(),
        attraction: Attraction::LalbaghBotanicalGarden,
        visit_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        ticket_counts: TicketCounts::new(2, 0, 1),
        amount: 50,
        contact_email: "a@b.com".to_string(),
    }
}

pub fn summary_reply(amount_line: &str) -> String {
    format!(
        "Here's your booking summary: 📋\n\n\
         🏰 Attraction: Lalbagh Botanical Garden\n\
         📅 Visit Date: 2025-03-01\n\n\
         🎟️ Tickets Booked:\n\
         \u{20}   • 2 Adult tickets\n\
         \u{20}   • 1 Children tickets\n\n\
         {}\n\
         📧 Contact Email: a@b.com\n\
         🔢 Booking Reference: [BOOKING_REFERENCE]\n\n\
         📱 Scan QR code to pay:\n\
         [QR_CODE_PLACEHOLDER]\n",
        amount_line
    )
}

/// Decodes the first QR code found in a PNG.
pub fn decode_qr(png: &[u8]) -> String {
    let image = image::load_from_memory(png).unwrap().to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert!(!grids.is_empty(), "no QR code found");
    let (_, content) = grids[0].decode().unwrap();
    content
}

pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Self {
        Self(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Replies from a fixed script and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    pub requests: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn reply(&self, _system: &str, history: &[ChatTurn]) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::Empty))
    }
}

/// Keeps every delivered message in its wire format.
#[derive(Default, Clone)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, message: Message) -> Result<(), MailError> {
        let wire = String::from_utf8_lossy(&message.formatted()).into_owned();
        self.sent.lock().unwrap().push(wire);
        Ok(())
    }
}

pub struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    async fn deliver(&self, _message: Message) -> Result<(), MailError> {
        Err(MailError::Transport("535 authentication failed".to_string()))
    }
}

/// Collects formatted log lines written while its guard is alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
