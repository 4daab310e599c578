//! Extraction of the encrypted blob from a Samourai backup file.
//!
//! The backup is a JSON object whose `payload` string holds the base64
//! encoded container. Some exported backups carry trailing junk after the
//! object; those are parsed up to the first closing brace.

use std::path::Path;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Pull the `payload` string out of a backup file's contents.
pub fn extract_payload(contents: &str) -> Result<String> {
    let object = match serde_json::from_str::<Map<String, Value>>(contents) {
        Ok(object) => object,
        Err(first) => {
            let end = contents
                .find('}')
                .ok_or_else(|| Error::malformed(format!("backup is not JSON: {first}")))?;
            debug!("backup is not clean JSON ({first}), retrying up to byte {end}");
            serde_json::from_str(&contents[..=end])
                .map_err(|e| Error::malformed(format!("backup is not JSON: {e}")))?
        }
    };

    match object.get("payload") {
        Some(Value::String(payload)) => Ok(payload.clone()),
        _ => Err(Error::malformed(
            "'payload' key not found or is not a string in JSON",
        )),
    }
}

/// Base64-decode a payload into the raw container, ignoring line breaks.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let joined: String = payload.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    STANDARD
        .decode(joined.trim())
        .map_err(|e| Error::malformed(format!("payload is not valid base64: {e}")))
}

/// Read a backup file and return the decoded ciphertext container.
pub fn read_wallet(path: &Path) -> anyhow::Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read wallet file {path:?}"))?;
    let contents = String::from_utf8_lossy(&bytes);
    let payload = extract_payload(&contents)
        .with_context(|| format!("Error while parsing wallet file {path:?}"))?;
    let ciphertext = decode_payload(&payload)?;
    Ok(ciphertext)
}
