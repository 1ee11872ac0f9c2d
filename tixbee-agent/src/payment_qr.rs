//! Payment-request image: a UPI QR code framed with the TixBee title, the
//! payee id, a scan instruction and a row of payment-app icons.
//!
//! Assets are loaded once when the composer is built, so `compose` is pure:
//! the same amount and payee always produce the same PNG bytes.

use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

use crate::assets::AssetStore;
use crate::error::RenderError;

pub const WIDTH: u32 = 400;
pub const HEIGHT: u32 = 480;
pub const CURRENCY: &str = "INR";

const TITLE: &str = "TIXBEE";
const INSTRUCTION: &str = "Scan and pay with any BHIM UPI app";
const FONT_FILE: &str = "DejaVuSans.ttf";
const LOGO_FILES: [&str; 5] = ["bhim.png", "gpay.png", "phonepe.png", "paytm.png", "amazon.png"];

const TITLE_Y: i32 = 20;
const QR_Y: u32 = 70;
const QR_SIZE: u32 = 220;
const PAYEE_Y: i32 = 300;
const INSTRUCTION_Y: i32 = 330;
const LOGO_Y: u32 = 380;
const LOGO_SIZE: u32 = 65;
const LOGO_GAP: u32 = 15;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DARK_TEXT: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 255]);
const MUTED_TEXT: Rgba<u8> = Rgba([0x66, 0x66, 0x66, 255]);
const BORDER: Rgba<u8> = Rgba([0xEE, 0xEE, 0xEE, 255]);

/// Who the payment request is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payee {
    pub id: String,
    pub name: String,
}

pub struct PaymentQrComposer {
    payee: Payee,
    font: Option<FontVec>,
    logos: Vec<RgbaImage>,
}

impl PaymentQrComposer {
    pub fn new(assets: &AssetStore, payee: Payee) -> Self {
        let logos: Vec<RgbaImage> = LOGO_FILES
            .iter()
            .filter_map(|name| assets.image(name))
            .map(|logo| logo.thumbnail(LOGO_SIZE, LOGO_SIZE).to_rgba8())
            .collect();
        let font = assets.font(FONT_FILE);

        tracing::info!(
            "Payment QR composer ready: {}/{} partner icons, font {}",
            logos.len(),
            LOGO_FILES.len(),
            if font.is_some() { "loaded" } else { "missing" }
        );

        Self { payee, font, logos }
    }

    /// Standard UPI pay-request URI for `amount` rupees.
    pub fn upi_uri(&self, amount: u64) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={}&cu={}",
            self.payee.id,
            urlencoding::encode(&self.payee.name),
            amount,
            CURRENCY
        )
    }

    /// Renders the payment request as PNG bytes.
    pub fn compose(&self, amount: u64) -> Result<Vec<u8>, RenderError> {
        let mut canvas = RgbaImage::from_pixel(WIDTH, HEIGHT, WHITE);

        let code = QrCode::with_error_correction_level(self.upi_uri(amount), EcLevel::L)?;
        let qr = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(10, 10)
            .build();
        let qr = imageops::resize(&qr, QR_SIZE, QR_SIZE, FilterType::Nearest);
        let qr = DynamicImage::ImageLuma8(qr).to_rgba8();
        imageops::overlay(&mut canvas, &qr, i64::from((WIDTH - QR_SIZE) / 2), i64::from(QR_Y));

        if let Some(font) = &self.font {
            draw_centered(&mut canvas, font, TITLE, 32.0, TITLE_Y, DARK_TEXT);
            draw_centered(&mut canvas, font, &self.payee.id, 18.0, PAYEE_Y, MUTED_TEXT);
            draw_centered(&mut canvas, font, INSTRUCTION, 16.0, INSTRUCTION_Y, DARK_TEXT);
        }

        for (logo, x) in self.logos.iter().zip(logo_slots(self.logos.len())) {
            let x = x + (LOGO_SIZE - logo.width()) / 2;
            let y = LOGO_Y + (LOGO_SIZE - logo.height()) / 2;
            imageops::overlay(&mut canvas, logo, i64::from(x), i64::from(y));
        }

        draw_hollow_rect_mut(&mut canvas, Rect::at(0, 0).of_size(WIDTH, HEIGHT), BORDER);

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Left edges of `count` equally spaced icon slots, centred on the canvas.
fn logo_slots(count: usize) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    let count = count as u32;
    let row_width = count * LOGO_SIZE + (count - 1) * LOGO_GAP;
    let start = WIDTH.saturating_sub(row_width) / 2;
    (0..count).map(|i| start + i * (LOGO_SIZE + LOGO_GAP)).collect()
}

fn draw_centered(
    canvas: &mut RgbaImage,
    font: &FontVec,
    text: &str,
    size: f32,
    y: i32,
    color: Rgba<u8>,
) {
    let scale = PxScale::from(size);
    let (text_width, _) = text_size(scale, font, text);
    let x = (WIDTH as i32 - text_width as i32) / 2;
    draw_text_mut(canvas, color, x, y, scale, font, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::decode_qr;

    fn payee() -> Payee {
        Payee {
            id: "arupiop@axl".to_string(),
            name: "TixBee".to_string(),
        }
    }

    fn composer_with_logos(names: &[&str]) -> (tempfile::TempDir, PaymentQrComposer) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            RgbaImage::from_pixel(130, 130, Rgba([200, 30, 30, 255]))
                .save(dir.path().join(name))
                .unwrap();
        }
        let composer = PaymentQrComposer::new(&AssetStore::new(dir.path()), payee());
        (dir, composer)
    }

    #[test]
    fn test_upi_uri() {
        let (_dir, composer) = composer_with_logos(&[]);
        assert_eq!(
            composer.upi_uri(50),
            "upi://pay?pa=arupiop@axl&pn=TixBee&am=50&cu=INR"
        );
    }

    #[test]
    fn test_payee_name_is_url_encoded() {
        let composer = PaymentQrComposer {
            payee: Payee {
                id: "shop@upi".to_string(),
                name: "Tix Bee & Co".to_string(),
            },
            font: None,
            logos: Vec::new(),
        };
        assert_eq!(
            composer.upi_uri(10),
            "upi://pay?pa=shop@upi&pn=Tix%20Bee%20%26%20Co&am=10&cu=INR"
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let (_dir, composer) = composer_with_logos(&["bhim.png", "gpay.png"]);
        let first = composer.compose(50).unwrap();
        let second = composer.compose(50).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, composer.compose(51).unwrap());
    }

    #[test]
    fn test_compose_without_any_assets() {
        let (_dir, composer) = composer_with_logos(&[]);
        let png = composer.compose(0).unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!((image.width(), image.height()), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_qr_encodes_pay_request() {
        let (_dir, composer) = composer_with_logos(&["bhim.png"]);
        let png = composer.compose(75).unwrap();
        assert_eq!(decode_qr(&png), composer.upi_uri(75));
    }

    #[test]
    fn test_present_logos_are_drawn_centered() {
        let (_dir, composer) = composer_with_logos(&["bhim.png"]);
        let png = composer.compose(20).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();

        // A single icon sits in the middle of the row.
        let centre = image.get_pixel(WIDTH / 2, LOGO_Y + LOGO_SIZE / 2);
        assert_eq!(*centre, Rgba([200, 30, 30, 255]));
        let left = image.get_pixel(20, LOGO_Y + LOGO_SIZE / 2);
        assert_eq!(*left, WHITE);
    }

    #[test]
    fn test_logo_slots() {
        assert!(logo_slots(0).is_empty());
        assert_eq!(logo_slots(1), vec![(WIDTH - LOGO_SIZE) / 2]);
        let five = logo_slots(5);
        assert_eq!(five.len(), 5);
        assert_eq!(five[0], (WIDTH - (5 * LOGO_SIZE + 4 * LOGO_GAP)) / 2);
        assert_eq!(five[1] - five[0], LOGO_SIZE + LOGO_GAP);
    }
}
