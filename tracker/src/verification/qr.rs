//! QR code rendering for verification tokens.

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

/// Pixels per QR module.
pub const MODULE_PIXELS: u32 = 10;

/// Light modules around the symbol on each side.
pub const QUIET_ZONE_MODULES: u32 = 4;

/// Foreground and background colours of a badge code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Dark modules
    pub foreground: Rgb<u8>,
    /// Light modules and quiet zone
    pub background: Rgb<u8>,
}

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const DARK_BLUE: Rgb<u8> = Rgb([0, 0, 139]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: BLACK,
            background: WHITE,
        }
    }
}

impl Palette {
    /// Colour scheme for an attendee's role, matched case-insensitively.
    #[must_use]
    pub fn for_role(role: Option<&str>) -> Self {
        let role = role.map(|r| r.trim().to_lowercase());
        match role.as_deref() {
            Some("organiser" | "organizer") => Self {
                foreground: WHITE,
                background: DARK_BLUE,
            },
            Some("speaker") => Self {
                foreground: BLACK,
                background: RED,
            },
            Some("attendee") => Self {
                foreground: BLACK,
                background: YELLOW,
            },
            _ => Self::default(),
        }
    }
}

/// Render `token` as a PNG QR code wrapped in a `data:` URI.
///
/// Pure function of its inputs.
///
/// # Errors
///
/// Fails if the token does not fit in a QR symbol or PNG encoding fails.
pub fn render_data_uri(token: &str, palette: Palette) -> anyhow::Result<String> {
    let png = render_png(token, palette)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Render `token` as PNG bytes.
///
/// # Errors
///
/// Fails if the token does not fit in a QR symbol or PNG encoding fails.
pub fn render_png(token: &str, palette: Palette) -> anyhow::Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(token.as_bytes(), EcLevel::L)
        .context("token does not fit in a QR code")?;

    let modules = u32::try_from(code.width()).context("QR code too wide")?;
    let side = (modules + 2 * QUIET_ZONE_MODULES) * MODULE_PIXELS;
    let mut img = RgbImage::from_pixel(side, side, palette.background);

    for (index, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let index = u32::try_from(index).context("QR code too large")?;
        let x0 = (index % modules + QUIET_ZONE_MODULES) * MODULE_PIXELS;
        let y0 = (index / modules + QUIET_ZONE_MODULES) * MODULE_PIXELS;
        for y in y0..y0 + MODULE_PIXELS {
            for x in x0..x0 + MODULE_PIXELS {
                img.put_pixel(x, y, palette.foreground);
            }
        }
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok(png)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn palettes_follow_role() {
        assert_eq!(Palette::for_role(Some("Organiser")).background, DARK_BLUE);
        assert_eq!(Palette::for_role(Some("organizer")).foreground, WHITE);
        assert_eq!(Palette::for_role(Some(" SPEAKER ")).background, RED);
        assert_eq!(Palette::for_role(Some("attendee")).background, YELLOW);
        assert_eq!(Palette::for_role(Some("volunteer")), Palette::default());
        assert_eq!(Palette::for_role(None), Palette::default());
    }

    #[test]
    fn renders_png_with_quiet_zone() {
        let png = render_png("ETK1.abc.def.ghi", Palette::for_role(Some("speaker"))).unwrap();
        let img = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgb8();

        assert_eq!(img.width(), img.height());
        assert_eq!(img.width() % MODULE_PIXELS, 0);
        // Corner pixel sits in the quiet zone
        assert_eq!(*img.get_pixel(0, 0), RED);
        // Top-left finder pattern starts right after the quiet zone
        let start = QUIET_ZONE_MODULES * MODULE_PIXELS;
        assert_eq!(*img.get_pixel(start, start), BLACK);
    }

    #[test]
    fn data_uri_is_deterministic() {
        let first = render_data_uri("ETK1.x.y.z", Palette::default()).unwrap();
        let second = render_data_uri("ETK1.x.y.z", Palette::default()).unwrap();

        assert!(first.starts_with("data:image/png;base64,"));
        assert_eq!(first, second);
    }
}
