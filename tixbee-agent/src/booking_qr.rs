use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use tixbee_core::BookingRecord;

use crate::error::RenderError;

/// Renders a booking summary QR for the confirmation email.
#[derive(Debug, Clone, Copy)]
pub struct BookingQrComposer {
    module_size: u32,
}

impl Default for BookingQrComposer {
    fn default() -> Self {
        Self { module_size: 8 }
    }
}

impl BookingQrComposer {
    /// Newline-delimited text encoded in the QR.
    pub fn summary_text(record: &BookingRecord) -> String {
        [
            format!("Visitor: {}", record.customer_name),
            format!("Booking ID: {}", record.booking_id),
            format!("City: {}", record.city),
            format!("Attraction: {}", record.attraction),
            format!("Visit Date: {}", record.visit_date.format("%Y-%m-%d")),
            format!("Tickets: {}", record.ticket_counts.summary()),
            format!("Amount: ₹{}", record.amount),
        ]
        .join("\n")
    }

    pub fn render(&self, record: &BookingRecord) -> Result<Vec<u8>, RenderError> {
        let code = QrCode::with_error_correction_level(Self::summary_text(record), EcLevel::M)?;
        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_size, self.module_size)
            .build();

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
