//! Decryption oracle for Samourai backup payloads.
//!
//! ## Container layout
//! - bytes `0..16`: used verbatim as the AES-CBC IV
//! - bytes `8..16`: PBKDF2 salt (overlaps the IV)
//! - bytes `16..`: AES-256-CBC ciphertext, PKCS#7 padded
//!
//! ## Cryptography
//! - Key derivation via PBKDF2-HMAC-SHA256, 15000 iterations, 32-byte key.
//! - Decryption via AES-256-CBC. Padding is stripped by the value of the last
//!   byte without checking it, so a wrong passphrase still yields bytes.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use sha2::Sha256;

use crate::error::{Error, Result};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// PBKDF2 rounds used by Samourai backups.
pub const DEFAULT_ITERATIONS: u32 = 15_000;

/// Substring present near the start of a correctly decrypted backup.
pub const SUCCESS_MARKER: &[u8] = b"\"seed\"";

/// How many leading plaintext bytes are searched for [`SUCCESS_MARKER`].
pub const MARKER_WINDOW: usize = 50;

const BLOCK_SIZE: usize = 16;
const SALT_RANGE: core::ops::Range<usize> = 8..16;

/// Something that turns `(ciphertext, candidate)` into plaintext bytes.
///
/// Implementations must be pure: the same inputs always give the same
/// output. The only error is [`Error::MalformedPayload`], which means the
/// container itself is broken, never that the candidate is wrong.
pub trait Oracle: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8], candidate: &str) -> Result<Vec<u8>>;
}

/// AES-256-CBC with a PBKDF2-HMAC-SHA256 derived key.
#[derive(Debug, Clone, Copy)]
pub struct Aes256CbcOracle {
    iterations: u32,
}

impl Default for Aes256CbcOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl Aes256CbcOracle {
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }

    /// An oracle using a non-standard PBKDF2 round count. Handy for fixtures.
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

/// Derive a 32-byte key from a candidate passphrase and salt using PBKDF2.
pub fn derive_key(candidate: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(candidate.as_bytes(), salt, iterations, &mut key);
    key
}

/// Check the container shape once, before any candidate is tried.
pub fn validate_container(ciphertext: &[u8]) -> Result<()> {
    if ciphertext.len() < BLOCK_SIZE {
        return Err(Error::malformed(format!(
            "ciphertext too short to extract salt ({} bytes)",
            ciphertext.len()
        )));
    }
    let body = ciphertext.len() - BLOCK_SIZE;
    if body == 0 || body % BLOCK_SIZE != 0 {
        return Err(Error::malformed(format!(
            "ciphertext body of {body} bytes is not a whole number of AES blocks"
        )));
    }
    Ok(())
}

/// The salt embedded in a container, for logging.
pub fn salt(ciphertext: &[u8]) -> Option<&[u8]> {
    ciphertext.get(SALT_RANGE)
}

impl Oracle for Aes256CbcOracle {
    fn decrypt(&self, ciphertext: &[u8], candidate: &str) -> Result<Vec<u8>> {
        validate_container(ciphertext)?;

        let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
        let key = derive_key(candidate, &ciphertext[SALT_RANGE], self.iterations);

        let cipher = Aes256CbcDec::new_from_slices(&key, iv)
            .map_err(|e| Error::malformed(format!("cipher init failed: {e}")))?;
        let mut plaintext = cipher
            .decrypt_padded_vec_mut::<NoPadding>(body)
            .map_err(|e| Error::malformed(format!("block decryption failed: {e}")))?;

        let padding = plaintext.last().copied().unwrap_or(0) as usize;
        plaintext.truncate(plaintext.len().saturating_sub(padding));
        Ok(plaintext)
    }
}

/// True when the first [`MARKER_WINDOW`] bytes contain [`SUCCESS_MARKER`].
pub fn contains_marker(plaintext: &[u8]) -> bool {
    let window = &plaintext[..plaintext.len().min(MARKER_WINDOW)];
    window
        .windows(SUCCESS_MARKER.len())
        .any(|w| w == SUCCESS_MARKER)
}
