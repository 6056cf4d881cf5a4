//! Symmetric codec for the persisted catalog blob.
//!
//! The ciphertext is a JSON envelope (salt, nonce, tag, data — all base64)
//! around AES-256-GCM output, keyed by PBKDF2-SHA256 over the passphrase
//! embedded in `constants.ron`. Because that passphrase ships with the
//! binary, the envelope only obscures casual inspection of the data
//! directory; it is not confidentiality against the user running the app.
//!
//! Failure is silent by contract: `decrypt` returns `None` for anything it
//! cannot open — wrong key, truncated file, stray bytes, old formats — and
//! callers fall back to an empty catalog.

use aes_gcm::aead::{Aead, OsRng, rand_core::RngCore};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use pbkdf2::pbkdf2_hmac;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;

use crate::constants::constants;

const ENVELOPE_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const SALT_LEN: usize = 16;
const TAG_LEN: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
  v: u8,
  salt: String,
  nonce: String,
  tag: String,
  data: String,
}

fn derive_key(passphrase: &str, salt: &[u8]) -> [u8; 32] {
  let mut key = [0u8; 32];
  pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, constants().pbkdf2_iterations, &mut key);
  key
}

/// Serialize `value` to JSON and encrypt it under the embedded passphrase.
///
/// Returns the envelope as a JSON string, or `None` if serialization or
/// encryption fails — callers treat `None` as "nothing to write".
pub fn encrypt<T: Serialize>(value: &T) -> Option<String> {
  let plaintext = match serde_json::to_string(value) {
    Ok(s) => s,
    Err(e) => {
      warn!(err = %e, "codec: serialize failed");
      return None;
    }
  };

  let mut salt = [0u8; SALT_LEN];
  OsRng.fill_bytes(&mut salt);
  let mut nonce_bytes = [0u8; NONCE_LEN];
  OsRng.fill_bytes(&mut nonce_bytes);

  let key = derive_key(&constants().catalog_passphrase, &salt);
  let cipher = match Aes256Gcm::new_from_slice(&key) {
    Ok(c) => c,
    Err(e) => {
      warn!(err = %e, "codec: cipher init failed");
      return None;
    }
  };

  let nonce = Nonce::from_slice(&nonce_bytes);
  let sealed = match cipher.encrypt(nonce, plaintext.as_bytes()) {
    Ok(bytes) if bytes.len() >= TAG_LEN => bytes,
    Ok(_) => {
      warn!("codec: encryption output too short");
      return None;
    }
    Err(e) => {
      warn!(err = %e, "codec: encryption failed");
      return None;
    }
  };
  // aes-gcm appends the 16-byte auth tag; split it out so the envelope
  // stores it as its own field.
  let (data, tag) = sealed.split_at(sealed.len() - TAG_LEN);

  let envelope = Envelope {
    v: ENVELOPE_VERSION,
    salt: B64.encode(salt),
    nonce: B64.encode(nonce_bytes),
    tag: B64.encode(tag),
    data: B64.encode(data),
  };
  serde_json::to_string(&envelope).ok()
}

/// Reverse of [`encrypt`]: open the envelope and deserialize the plaintext.
///
/// Any malformed input — bad JSON, bad base64, wrong lengths, failed auth,
/// non-UTF-8 plaintext, shape mismatch — yields `None`. Never panics.
pub fn decrypt<T: DeserializeOwned>(ciphertext: &str) -> Option<T> {
  if ciphertext.is_empty() {
    return None;
  }
  let envelope: Envelope = serde_json::from_str(ciphertext).ok()?;
  if envelope.v != ENVELOPE_VERSION {
    return None;
  }

  let salt = B64.decode(&envelope.salt).ok()?;
  let nonce_bytes = B64.decode(&envelope.nonce).ok()?;
  let tag = B64.decode(&envelope.tag).ok()?;
  let data = B64.decode(&envelope.data).ok()?;
  if nonce_bytes.len() != NONCE_LEN || tag.len() != TAG_LEN {
    return None;
  }

  let key = derive_key(&constants().catalog_passphrase, &salt);
  let cipher = Aes256Gcm::new_from_slice(&key).ok()?;

  let mut sealed = Vec::with_capacity(data.len() + tag.len());
  sealed.extend_from_slice(&data);
  sealed.extend_from_slice(&tag);

  let plaintext = cipher.decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_slice()).ok()?;
  let text = String::from_utf8(plaintext).ok()?;
  serde_json::from_str(&text).ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  // --- round trip ---

  #[test]
  fn round_trip_value() {
    let value = json!([
      {"id": "c_0011223344", "title": "Intro", "videoId": "dQw4w9WgXcQ"},
      {"id": "c_aabbccddee", "title": "Unicode ✓ عنوان", "category": "ai"},
    ]);
    let sealed = encrypt(&value).expect("encrypt");
    let opened: serde_json::Value = decrypt(&sealed).expect("decrypt");
    assert_eq!(opened, value);
  }

  #[test]
  fn round_trip_empty_list() {
    let value: Vec<serde_json::Value> = Vec::new();
    let sealed = encrypt(&value).expect("encrypt");
    let opened: Vec<serde_json::Value> = decrypt(&sealed).expect("decrypt");
    assert!(opened.is_empty());
  }

  #[test]
  fn distinct_ciphertexts_for_same_plaintext() {
    // Fresh salt + nonce per write — identical catalogs must not produce
    // identical blobs on disk.
    let value = json!({"title": "same"});
    let a = encrypt(&value).expect("encrypt");
    let b = encrypt(&value).expect("encrypt");
    assert_ne!(a, b);
  }

  // --- robustness ---

  #[test]
  fn garbage_inputs_yield_none() {
    let garbage = [
      "",
      "not json at all",
      "{}",
      "{\"v\":1}",
      "{\"v\":1,\"salt\":\"!!\",\"nonce\":\"!!\",\"tag\":\"!!\",\"data\":\"!!\"}",
      "[1,2,3]",
      "U2FsdGVkX1+abcdefgh",
    ];
    for input in garbage {
      let out: Option<serde_json::Value> = decrypt(input);
      assert!(out.is_none(), "expected None for {input:?}");
    }
  }

  #[test]
  fn tampered_envelope_yields_none() {
    let sealed = encrypt(&json!({"title": "x"})).expect("encrypt");
    let mut envelope: serde_json::Value = serde_json::from_str(&sealed).unwrap();
    envelope["data"] = json!(B64.encode(b"tampered payload"));
    let tampered = envelope.to_string();
    let out: Option<serde_json::Value> = decrypt(&tampered);
    assert!(out.is_none());
  }

  #[test]
  fn unknown_version_yields_none() {
    let sealed = encrypt(&json!({"title": "x"})).expect("encrypt");
    let mut envelope: serde_json::Value = serde_json::from_str(&sealed).unwrap();
    envelope["v"] = json!(9);
    let out: Option<serde_json::Value> = decrypt(&envelope.to_string());
    assert!(out.is_none());
  }
}
