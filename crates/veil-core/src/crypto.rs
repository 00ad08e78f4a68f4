//! Cryptographic primitives for the layered envelope
//!
//! Two operations back the protocol: sealing a fresh layer key to a
//! relay's public key (ephemeral X25519 + HKDF-SHA256 + ChaCha20-Poly1305),
//! and AEAD encryption of the layer body under that key. Both are
//! authenticated, so peeling with the wrong key always fails cleanly
//! instead of yielding a plausible wrong plaintext.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{Error, Result};

/// Domain separation for the key-block wrap key derivation
const SEAL_CONTEXT: &[u8] = b"veilroute-key-block-v1";

/// Raw sealed key block: ephemeral public key (32) + AEAD ciphertext of
/// the 32-byte layer key (32 + 16 tag)
pub const SEALED_KEY_BYTES: usize = 32 + 32 + 16;

/// Text length of a sealed key block: base64 of [`SEALED_KEY_BYTES`].
/// This constant is what lets a relay split an envelope without any
/// length prefix.
pub const KEY_BLOCK_LEN: usize = 108;

const NONCE_BYTES: usize = 12;
const TAG_BYTES: usize = 16;

/// X25519 keypair held by a relay for its process lifetime.
/// The private half never leaves the relay.
#[derive(Clone)]
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Create from seed bytes (for deterministic testing)
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let secret = StaticSecret::from(seed);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Get the public key bytes
    pub fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Public key in the text encoding the directory publishes
    pub fn public_key_b64(&self) -> String {
        BASE64.encode(self.public.as_bytes())
    }

    /// Open a sealed key block and recover the layer key
    pub fn open(&self, block: &str) -> Result<SymmetricKey> {
        let raw = BASE64.decode(block).map_err(|_| Error::Decryption)?;
        if raw.len() != SEALED_KEY_BYTES {
            return Err(Error::Decryption);
        }

        let mut eph_pub = [0u8; 32];
        eph_pub.copy_from_slice(&raw[..32]);
        let shared = self.secret.diffie_hellman(&PublicKey::from(eph_pub));
        let wrap_key = derive_wrap_key(shared.as_bytes())?;

        let cipher =
            ChaCha20Poly1305::new_from_slice(&wrap_key).map_err(|_| Error::Decryption)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&[0u8; NONCE_BYTES]), &raw[32..])
            .map_err(|_| Error::Decryption)?;

        let key: [u8; 32] = plaintext.try_into().map_err(|_| Error::Decryption)?;
        Ok(SymmetricKey(key))
    }
}

/// Decode a directory-published public key
pub fn decode_public_key(b64: &str) -> Result<[u8; 32]> {
    let raw = BASE64
        .decode(b64)
        .map_err(|_| Error::MissingKeyMaterial(format!("undecodable public key {b64:?}")))?;
    let bytes: [u8; 32] = raw.try_into().map_err(|_| {
        Error::MissingKeyMaterial("public key is not 32 bytes".to_string())
    })?;
    Ok(bytes)
}

/// Seal a layer key to a relay's public key.
///
/// A fresh ephemeral keypair is generated per seal, so the zero nonce is
/// never reused under the same wrap key. Output length is always
/// [`KEY_BLOCK_LEN`].
pub fn seal(recipient: &[u8; 32], key: &SymmetricKey) -> Result<String> {
    let eph_secret = EphemeralSecret::random_from_rng(OsRng);
    let eph_public = PublicKey::from(&eph_secret);
    let shared = eph_secret.diffie_hellman(&PublicKey::from(*recipient));
    let wrap_key = derive_wrap_key(shared.as_bytes())?;

    let cipher = ChaCha20Poly1305::new_from_slice(&wrap_key).map_err(|_| Error::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&[0u8; NONCE_BYTES]), key.0.as_ref())
        .map_err(|_| Error::Encryption)?;

    let mut raw = Vec::with_capacity(SEALED_KEY_BYTES);
    raw.extend_from_slice(eph_public.as_bytes());
    raw.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(raw))
}

fn derive_wrap_key(shared_secret: &[u8]) -> Result<[u8; 32]> {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);
    let mut wrap_key = [0u8; 32];
    hkdf.expand(SEAL_CONTEXT, &mut wrap_key)
        .map_err(|_| Error::Encryption)?;
    Ok(wrap_key)
}

/// One symmetric layer key: fresh per (message, hop), never persisted
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Generate a fresh random layer key
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Encrypt a layer body: random nonce, AEAD, base64 text output
    pub fn encrypt_text(&self, plaintext: &[u8]) -> Result<String> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0).map_err(|_| Error::Encryption)?;

        let mut nonce = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| Error::Encryption)?;

        let mut raw = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(raw))
    }

    /// Decrypt a layer body produced by [`encrypt_text`](Self::encrypt_text)
    pub fn decrypt_text(&self, body: &str) -> Result<Vec<u8>> {
        let raw = BASE64.decode(body).map_err(|_| Error::Decryption)?;
        if raw.len() < NONCE_BYTES + TAG_BYTES {
            return Err(Error::Decryption);
        }

        let cipher = ChaCha20Poly1305::new_from_slice(&self.0).map_err(|_| Error::Decryption)?;
        cipher
            .decrypt(Nonce::from_slice(&raw[..NONCE_BYTES]), &raw[NONCE_BYTES..])
            .map_err(|_| Error::Decryption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let relay = KeyPair::generate();
        let key = SymmetricKey::generate();

        let block = seal(&relay.public_key(), &key).unwrap();
        let opened = relay.open(&block).unwrap();

        assert_eq!(opened.0, key.0);
    }

    #[test]
    fn test_key_block_length_is_constant() {
        let relay = KeyPair::generate();
        for _ in 0..8 {
            let block = seal(&relay.public_key(), &SymmetricKey::generate()).unwrap();
            assert_eq!(block.len(), KEY_BLOCK_LEN);
        }
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let relay = KeyPair::generate();
        let other = KeyPair::generate();
        let key = SymmetricKey::generate();

        let block = seal(&relay.public_key(), &key).unwrap();
        assert!(matches!(other.open(&block), Err(Error::Decryption)));
    }

    #[test]
    fn test_tampered_block_fails() {
        let relay = KeyPair::generate();
        let block = seal(&relay.public_key(), &SymmetricKey::generate()).unwrap();

        let mut tampered: Vec<u8> = BASE64.decode(&block).unwrap();
        tampered[40] ^= 0xff;
        let tampered = BASE64.encode(tampered);

        assert!(matches!(relay.open(&tampered), Err(Error::Decryption)));
    }

    #[test]
    fn test_body_round_trip() {
        let key = SymmetricKey::generate();
        let body = key.encrypt_text(b"0000008007aGVsbG8=").unwrap();
        let plaintext = key.decrypt_text(&body).unwrap();
        assert_eq!(plaintext, b"0000008007aGVsbG8=");
    }

    #[test]
    fn test_body_wrong_key_fails() {
        let body = SymmetricKey::generate().encrypt_text(b"payload").unwrap();
        assert!(matches!(
            SymmetricKey::generate().decrypt_text(&body),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn test_deterministic_seed() {
        let a = KeyPair::from_seed([7u8; 32]);
        let b = KeyPair::from_seed([7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_public_key_b64_decodes() {
        let kp = KeyPair::generate();
        assert_eq!(decode_public_key(&kp.public_key_b64()).unwrap(), kp.public_key());
    }
}
