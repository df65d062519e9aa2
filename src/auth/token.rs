//! Opaque token generation.
//!
//! Tokens carry no decodable structure: 64 bytes (512 bits) from the OS
//! CSPRNG, URL-safe base64 encoded. Validity lives entirely in the store.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

const TOKEN_BYTES: usize = 64;

/// Generate a fresh opaque token string.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}
