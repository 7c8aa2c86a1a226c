//! Authenticated-encryption envelope
//!
//! Every payload on the wire is wrapped in an AES-256-GCM envelope keyed by a
//! pre-shared symmetric key. The token format is
//! `base64url(nonce || ciphertext || tag)` with a fresh random 96-bit nonce
//! per encryption, so two encodings of the same record are never
//! byte-identical.
//!
//! Key files hold the 32-byte key as a single base64url line. Key
//! distribution is out of scope; the daemons load the file once at startup
//! and abort if it is unusable.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};

use tv_error::{Result, ThermoveilError};

use crate::{MaskedReading, RawReading, MAX_PAYLOAD_SIZE};

/// Length of the pre-shared key in bytes
pub const KEY_LEN: usize = 32;

/// Authenticated-encryption codec over a pre-shared key
pub struct Envelope {
    key: LessSafeKey,
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material never appears in debug output
        f.debug_struct("Envelope").finish_non_exhaustive()
    }
}

impl Envelope {
    /// Create an envelope from raw key bytes
    pub fn new(key_bytes: &[u8; KEY_LEN]) -> Result<Self> {
        let unbound = UnboundKey::new(&AES_256_GCM, key_bytes)
            .map_err(|_| ThermoveilError::generic("failed to initialize AEAD key"))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
        })
    }

    /// Load the pre-shared key from a base64url key file.
    ///
    /// Failure here is fatal to the daemons: they must not enter the message
    /// loop without a working envelope.
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ThermoveilError::KeyLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Tolerate trailing padding and whitespace from key generators
        let encoded = contents.trim().trim_end_matches('=');
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| ThermoveilError::KeyLoad {
                path: path.to_path_buf(),
                reason: format!("not valid base64url: {e}"),
            })?;

        let key_bytes: [u8; KEY_LEN] =
            decoded
                .try_into()
                .map_err(|v: Vec<u8>| ThermoveilError::KeyLoad {
                    path: path.to_path_buf(),
                    reason: format!("expected {KEY_LEN} key bytes, got {}", v.len()),
                })?;

        Self::new(&key_bytes)
    }

    /// Encrypt a plaintext into a wire token
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| ThermoveilError::generic("envelope seal failed"))?;

        let mut token = Vec::with_capacity(NONCE_LEN + in_out.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&in_out);
        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    /// Decrypt a wire token back into plaintext.
    ///
    /// Any token that fails to authenticate — tampered, truncated, wrong key,
    /// or not a token at all — comes back as `Authentication`. The payload
    /// size limit is enforced before any cryptographic work.
    pub fn decrypt(&self, token: &[u8]) -> Result<Vec<u8>> {
        if token.len() > MAX_PAYLOAD_SIZE {
            return Err(ThermoveilError::PayloadTooLarge {
                size: token.len(),
                max_size: MAX_PAYLOAD_SIZE,
            });
        }

        let token = std::str::from_utf8(token).map_err(|_| ThermoveilError::Authentication)?;
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| ThermoveilError::Authentication)?;

        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(ThermoveilError::Authentication);
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| ThermoveilError::Authentication)?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| ThermoveilError::Authentication)?;

        Ok(plaintext.to_vec())
    }

    /// Decrypt and parse an inbound raw reading
    pub fn decode_raw(&self, token: &[u8]) -> Result<RawReading> {
        let plaintext = self.decrypt(token)?;
        crate::parse_raw(&plaintext)
    }

    /// Decrypt and parse an inbound masked reading
    pub fn decode_masked(&self, token: &[u8]) -> Result<MaskedReading> {
        let plaintext = self.decrypt(token)?;
        crate::parse_masked(&plaintext)
    }

    /// Serialize and encrypt an outgoing raw reading
    pub fn encode_raw(&self, reading: &RawReading) -> Result<String> {
        let plaintext = serde_json::to_vec(reading)?;
        self.encrypt(&plaintext)
    }

    /// Serialize and encrypt an outgoing masked reading
    pub fn encode_masked(&self, reading: &MaskedReading) -> Result<String> {
        let plaintext = serde_json::to_vec(reading)?;
        self.encrypt(&plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    fn test_envelope() -> Envelope {
        Envelope::new(&[7u8; KEY_LEN]).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let envelope = test_envelope();
        let token = envelope.encrypt(b"hello sensor").unwrap();
        let plain = envelope.decrypt(token.as_bytes()).unwrap();
        assert_eq!(plain, b"hello sensor");
    }

    #[test]
    fn test_tokens_are_not_byte_identical() {
        let envelope = test_envelope();
        let a = envelope.encrypt(b"same plaintext").unwrap();
        let b = envelope.encrypt(b"same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bit_flip_fails_authentication() {
        let envelope = test_envelope();
        let token = envelope.encrypt(b"integrity matters").unwrap();

        // Flip one bit in every position of the decoded token; none may
        // decrypt successfully.
        let mut raw = URL_SAFE_NO_PAD.decode(&token).unwrap();
        for i in 0..raw.len() {
            raw[i] ^= 0x01;
            let tampered = URL_SAFE_NO_PAD.encode(&raw);
            let err = envelope.decrypt(tampered.as_bytes()).unwrap_err();
            assert!(err.is_authentication(), "bit flip at byte {i} not caught");
            raw[i] ^= 0x01;
        }
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let envelope = test_envelope();
        let other = Envelope::new(&[8u8; KEY_LEN]).unwrap();
        let token = envelope.encrypt(b"secret").unwrap();
        assert!(other.decrypt(token.as_bytes()).unwrap_err().is_authentication());
    }

    #[test]
    fn test_garbage_tokens_fail_authentication() {
        let envelope = test_envelope();
        for garbage in [&b"not a token"[..], b"", b"\xff\xfe\x00", b"QUJD"] {
            let err = envelope.decrypt(garbage).unwrap_err();
            assert!(err.is_authentication());
        }
    }

    #[test]
    fn test_oversize_payload_rejected_before_decrypt() {
        let envelope = test_envelope();
        let oversize = vec![b'A'; MAX_PAYLOAD_SIZE + 1];
        let err = envelope.decrypt(&oversize).unwrap_err();
        assert!(matches!(err, ThermoveilError::PayloadTooLarge { .. }));
    }

    #[test]
    fn test_record_roundtrip() {
        let envelope = test_envelope();
        let reading = RawReading {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            value: 24.91,
        };
        let token = envelope.encode_raw(&reading).unwrap();
        let back = envelope.decode_raw(token.as_bytes()).unwrap();
        assert_eq!(back, reading);
    }

    #[test]
    fn test_key_file_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", URL_SAFE_NO_PAD.encode([9u8; KEY_LEN])).unwrap();

        let envelope = Envelope::from_key_file(file.path()).unwrap();
        let token = envelope.encrypt(b"keyed").unwrap();
        assert_eq!(envelope.decrypt(token.as_bytes()).unwrap(), b"keyed");
    }

    #[test]
    fn test_key_file_with_padding_accepted() {
        use base64::engine::general_purpose::URL_SAFE;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", URL_SAFE.encode([9u8; KEY_LEN])).unwrap();
        assert!(Envelope::from_key_file(file.path()).is_ok());
    }

    #[test]
    fn test_bad_key_file_is_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "too-short").unwrap();
        let err = Envelope::from_key_file(file.path()).unwrap_err();
        assert!(matches!(err, ThermoveilError::KeyLoad { .. }));

        let err = Envelope::from_key_file("/nonexistent/secret.key").unwrap_err();
        assert!(matches!(err, ThermoveilError::KeyLoad { .. }));
    }
}
