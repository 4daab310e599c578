#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use brute_samourai::oracle::{derive_key, Oracle};
use brute_samourai::Result;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Cheap PBKDF2 round count so fixtures don't dominate test time.
pub const ROUNDS: u32 = 16;

/// Start of a decrypted Samourai backup; `"seed"` sits within 50 bytes.
pub const BACKUP_JSON: &[u8] =
    br#"{"wallet":{"testnet":false,"seed":"0f1e2d3c4b5a69788796a5b4c3d2e1f0","passphrase":true,"accounts":[]}}"#;

/// Encrypt `plaintext` into the container layout the oracle expects.
pub fn seal(passphrase: &str, plaintext: &[u8], rounds: u32) -> Vec<u8> {
    let mut container = b"Salted__".to_vec();
    container.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67]);
    let key = derive_key(passphrase, &container[8..16], rounds);
    let body = Aes256CbcEnc::new_from_slices(&key, &container)
        .unwrap()
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    container.extend_from_slice(&body);
    container
}

/// A backup file wrapping `container`, base64 split over lines.
pub fn wallet_json(container: &[u8]) -> String {
    let encoded = STANDARD.encode(container);
    let wrapped: Vec<&str> = encoded
        .as_bytes()
        .chunks(64)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect();
    format!(
        r#"{{"version":2,"payload":"{}","external":false}}"#,
        wrapped.join("\\n")
    )
}

/// Every candidate a [`Recording`] oracle was asked about, in call order.
pub type TriedLog = Arc<Mutex<Vec<String>>>;

/// Wraps an oracle, remembering every candidate and optionally slowing down.
pub struct Recording<O> {
    inner: O,
    delay: Duration,
    tried: TriedLog,
}

impl<O: Oracle> Recording<O> {
    pub fn new(inner: O, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            tried: TriedLog::default(),
        }
    }

    /// Handle on the log that stays valid after the oracle is moved away.
    pub fn log(&self) -> TriedLog {
        Arc::clone(&self.tried)
    }
}

impl<O: Oracle> Oracle for Recording<O> {
    fn decrypt(&self, ciphertext: &[u8], candidate: &str) -> Result<Vec<u8>> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.tried.lock().unwrap().push(candidate.to_owned());
        self.inner.decrypt(ciphertext, candidate)
    }
}

pub fn words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("pw{i:04}")).collect()
}
