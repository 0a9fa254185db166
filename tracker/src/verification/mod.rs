//! Verification tokens and the QR codes that carry them.

mod qr;
mod token;

pub use qr::{render_data_uri, render_png, Palette, MODULE_PIXELS, QUIET_ZONE_MODULES};
pub use token::{TokenService, TOKEN_PREFIX};
