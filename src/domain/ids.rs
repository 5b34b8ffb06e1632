// src/domain/ids.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

pub const APPLICATION_ID_BYTES: usize = 12;
const PREFIX: &str = "app_";

/// New application id from the OS RNG.
pub fn generate_application_id() -> String {
    let mut rng = OsRng;
    generate_id(&mut rng, APPLICATION_ID_BYTES)
}

/// `app_` followed by URL-safe base64 (no padding) of `nbytes` random bytes,
/// so ids can sit in a URL path without encoding.
pub fn generate_id<R: RngCore>(rng: &mut R, nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    format!(
        "{PREFIX}{}",
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buf)
    )
}
