//! Session identifiers

use chrono::Utc;
use rand::Rng;

/// Generate a session ID for one repair loop run
///
/// Format: `{yyyymmdd}T{hhmmss}-{random_hex}`
/// Example: `20261018T142501-a1b2`
pub fn generate_session_id() -> String {
    let random: u16 = rand::rng().random();
    format!("{}-{:04x}", Utc::now().format("%Y%m%dT%H%M%S"), random)
}
