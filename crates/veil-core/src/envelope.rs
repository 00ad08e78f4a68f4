//! Onion envelope codec: layered encryption and per-hop peeling
//!
//! An envelope is a single ASCII blob: a fixed-length sealed key block
//! followed by the AEAD-encrypted body. The key block's constant length
//! ([`KEY_BLOCK_LEN`]) is the only framing the protocol has; a relay
//! splits on it, opens the block with its private key, decrypts the body,
//! and reads a 10-digit zero-padded destination from the layer plaintext.
//!
//! Encoding depth is explicit: the innermost payload is text-encoded
//! exactly once, and the hop that sees a recipient-range destination
//! reverses that one encoding before delivery. No format sniffing.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::circuit::Circuit;
use crate::crypto::{self, KeyPair, SymmetricKey};
use crate::error::{Error, Result};
use crate::types::{HopAddr, NodeId, CIRCUIT_LEN, RELAY_BASE};

pub use crate::crypto::KEY_BLOCK_LEN;

/// Width of the destination field at the head of every layer plaintext:
/// decimal digits, zero-padded, no delimiter needed
pub const DEST_FIELD_LEN: usize = 10;

/// The wire payload at any point in the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope(String);

impl Envelope {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Split into `(key_block, body)` at the protocol constant
    fn split(&self) -> Result<(&str, &str)> {
        if self.0.len() < KEY_BLOCK_LEN || !self.0.is_char_boundary(KEY_BLOCK_LEN) {
            return Err(Error::MalformedEnvelope {
                len: self.0.len(),
                need: KEY_BLOCK_LEN,
            });
        }
        Ok(self.0.split_at(KEY_BLOCK_LEN))
    }
}

/// The outcome of peeling one layer
#[derive(Debug)]
pub enum Peeled {
    /// Not the last hop: pass the remaining envelope on unchanged
    Forward { next_hop: HopAddr, envelope: Envelope },
    /// Last hop: the remainder decoded to the final message text
    Deliver { recipient: HopAddr, plaintext: String },
}

/// Build the envelope for one message, innermost layer outward.
///
/// Messages are text end to end; what the sender passes in here is what
/// the recipient's `/message` slot eventually stores. `pubkeys` must hold
/// an entry for every circuit member; the sender is the only party that
/// ever sees the full circuit. An empty message is permitted and
/// propagates as an empty final remainder.
pub fn encode(
    plaintext: &str,
    recipient: NodeId,
    circuit: &Circuit,
    pubkeys: &HashMap<NodeId, [u8; 32]>,
) -> Result<Envelope> {
    let mut payload = BASE64.encode(plaintext.as_bytes());

    for i in (0..CIRCUIT_LEN).rev() {
        let hop = circuit.hop(i);
        let dest = if i == CIRCUIT_LEN - 1 {
            HopAddr::user(recipient)?
        } else {
            HopAddr::relay(circuit.hop(i + 1))?
        };

        let layer = format!("{:0width$}{payload}", dest.port(), width = DEST_FIELD_LEN);

        let key = SymmetricKey::generate();
        let body = key.encrypt_text(BASE64.encode(layer.as_bytes()).as_bytes())?;

        let pubkey = pubkeys
            .get(&hop)
            .ok_or_else(|| Error::MissingKeyMaterial(format!("no public key for relay {hop}")))?;
        let block = crypto::seal(pubkey, &key)?;

        payload = format!("{block}{body}");
    }

    Ok(Envelope(payload))
}

/// Decrypt exactly one layer and decide: forward or deliver.
///
/// Never returns a partially peeled payload: any failure aborts the hop.
pub fn peel(envelope: &Envelope, keys: &KeyPair) -> Result<Peeled> {
    let (block, body) = envelope.split()?;

    let key = keys.open(block)?;
    let inner = key.decrypt_text(body)?;
    let inner = String::from_utf8(inner).map_err(|_| Error::Decryption)?;
    let layer = BASE64.decode(inner.as_bytes()).map_err(|_| Error::Decryption)?;
    let layer = String::from_utf8(layer).map_err(|_| Error::Decryption)?;

    let dest = parse_destination(&layer)?;
    let remainder = layer[DEST_FIELD_LEN..].trim();

    if dest.is_user() {
        let plaintext = BASE64.decode(remainder).map_err(|_| Error::Decryption)?;
        let plaintext = String::from_utf8(plaintext).map_err(|_| Error::Decryption)?;
        Ok(Peeled::Deliver {
            recipient: dest,
            plaintext,
        })
    } else {
        Ok(Peeled::Forward {
            next_hop: dest,
            envelope: Envelope(remainder.to_string()),
        })
    }
}

/// Extract and validate the fixed-width destination field.
fn parse_destination(layer: &str) -> Result<HopAddr> {
    let field = layer
        .get(..DEST_FIELD_LEN)
        .ok_or_else(|| Error::InvalidDestinationFormat(layer.to_string()))?;

    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidDestinationFormat(field.to_string()));
    }

    // 10 digits can exceed u32; parse wide, then range-check into the
    // known address space.
    let port: u64 = field
        .parse()
        .map_err(|_| Error::InvalidDestinationFormat(field.to_string()))?;
    if port < RELAY_BASE as u64 || port > u16::MAX as u64 {
        return Err(Error::InvalidDestinationFormat(field.to_string()));
    }

    Ok(HopAddr::from_port(port as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::build_circuit_with;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A directory of relays with known keypairs
    fn test_directory(ids: &[NodeId]) -> (HashMap<NodeId, KeyPair>, HashMap<NodeId, [u8; 32]>) {
        let mut keypairs = HashMap::new();
        let mut pubkeys = HashMap::new();
        for &id in ids {
            let kp = KeyPair::generate();
            pubkeys.insert(id, kp.public_key());
            keypairs.insert(id, kp);
        }
        (keypairs, pubkeys)
    }

    /// Run an envelope through the full relay chain, asserting each
    /// intermediate hop forwards to the expected relay.
    fn run_chain(
        envelope: Envelope,
        circuit: &Circuit,
        keypairs: &HashMap<NodeId, KeyPair>,
    ) -> (HopAddr, String) {
        let mut current = envelope;
        for i in 0..CIRCUIT_LEN {
            let kp = &keypairs[&circuit.hop(i)];
            match peel(&current, kp).unwrap() {
                Peeled::Forward { next_hop, envelope } => {
                    assert!(i < CIRCUIT_LEN - 1, "forwarded at the final hop");
                    assert_eq!(next_hop, HopAddr::relay(circuit.hop(i + 1)).unwrap());
                    current = envelope;
                }
                Peeled::Deliver {
                    recipient,
                    plaintext,
                } => {
                    assert_eq!(i, CIRCUIT_LEN - 1, "delivered before the final hop");
                    return (recipient, plaintext);
                }
            }
        }
        unreachable!("chain never delivered");
    }

    #[test]
    fn test_three_hop_round_trip() {
        let (keypairs, pubkeys) = test_directory(&[1, 2, 3, 4]);
        let mut rng = StdRng::seed_from_u64(42);
        let circuit = build_circuit_with(&[1, 2, 3, 4], &mut rng).unwrap();

        let envelope = encode("hello", 7, &circuit, &pubkeys).unwrap();
        let (recipient, plaintext) = run_chain(envelope, &circuit, &keypairs);

        assert_eq!(recipient, HopAddr::user(7).unwrap());
        assert_eq!(plaintext, "hello");
    }

    #[test]
    fn test_empty_message_round_trip() {
        let (keypairs, pubkeys) = test_directory(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(1);
        let circuit = build_circuit_with(&[1, 2, 3], &mut rng).unwrap();

        let envelope = encode("", 0, &circuit, &pubkeys).unwrap();
        let (recipient, plaintext) = run_chain(envelope, &circuit, &keypairs);

        assert_eq!(recipient, HopAddr::user(0).unwrap());
        assert!(plaintext.is_empty());
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let (keypairs, pubkeys) = test_directory(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(2);
        let circuit = build_circuit_with(&[1, 2, 3], &mut rng).unwrap();

        let message = "héllo ✓ ønion";
        let envelope = encode(message, 7, &circuit, &pubkeys).unwrap();
        let (_, plaintext) = run_chain(envelope, &circuit, &keypairs);
        assert_eq!(plaintext, message);
    }

    #[test]
    fn test_out_of_range_recipient_rejected() {
        let (_, pubkeys) = test_directory(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(6);
        let circuit = build_circuit_with(&[1, 2, 3], &mut rng).unwrap();

        let err = encode("hi", 60000, &circuit, &pubkeys).unwrap_err();
        assert!(matches!(err, Error::AddressOutOfRange { .. }));
    }

    #[test]
    fn test_key_block_is_constant_length() {
        let (_, pubkeys) = test_directory(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(3);
        let circuit = build_circuit_with(&[1, 2, 3], &mut rng).unwrap();

        for plaintext in ["", "x", "a much longer message body than the others"] {
            let envelope = encode(plaintext, 5, &circuit, &pubkeys).unwrap();
            assert!(envelope.as_str().len() > KEY_BLOCK_LEN);
            let (block, _) = envelope.split().unwrap();
            assert_eq!(block.len(), KEY_BLOCK_LEN);
        }
    }

    #[test]
    fn test_missing_public_key() {
        let (_, mut pubkeys) = test_directory(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(4);
        let circuit = build_circuit_with(&[1, 2, 3], &mut rng).unwrap();

        pubkeys.remove(&circuit.hop(1));
        let err = encode("hi", 7, &circuit, &pubkeys).unwrap_err();
        assert!(matches!(err, Error::MissingKeyMaterial(_)));
    }

    #[test]
    fn test_wrong_private_key_fails_closed() {
        let (_, pubkeys) = test_directory(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(5);
        let circuit = build_circuit_with(&[1, 2, 3], &mut rng).unwrap();

        let envelope = encode("secret", 7, &circuit, &pubkeys).unwrap();
        let outsider = KeyPair::generate();
        assert!(matches!(peel(&envelope, &outsider), Err(Error::Decryption)));
    }

    #[test]
    fn test_short_envelope_is_malformed() {
        let kp = KeyPair::generate();
        let err = peel(&Envelope::new("too-short"), &kp).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedEnvelope { len: 9, need: KEY_BLOCK_LEN }
        ));
    }

    #[test]
    fn test_destination_field_validation() {
        assert!(parse_destination("00000040017remainder").is_ok());
        assert_eq!(
            parse_destination("0000004001").unwrap(),
            HopAddr::from_port(4001)
        );
        assert!(matches!(
            parse_destination("00axb04001rest"),
            Err(Error::InvalidDestinationFormat(_))
        ));
        // In-range digits but below the relay base: not a routable address.
        assert!(matches!(
            parse_destination("0000000080rest"),
            Err(Error::InvalidDestinationFormat(_))
        ));
        // Wider than the port space.
        assert!(matches!(
            parse_destination("9999999999rest"),
            Err(Error::InvalidDestinationFormat(_))
        ));
        // Shorter than the fixed field.
        assert!(matches!(
            parse_destination("12345"),
            Err(Error::InvalidDestinationFormat(_))
        ));
    }

    #[test]
    fn test_fixed_scenario() {
        // Directory {1,2,3,4}, circuit [3,1,4], "hello" for recipient 7.
        let (keypairs, pubkeys) = test_directory(&[1, 2, 3, 4]);
        let circuit = {
            let mut found = None;
            for seed in 0..4096u64 {
                let mut rng = StdRng::seed_from_u64(seed);
                let c = build_circuit_with(&[1, 2, 3, 4], &mut rng).unwrap();
                if c.hops() == [3, 1, 4] {
                    found = Some(c);
                    break;
                }
            }
            found.expect("seeded shuffles never produced [3,1,4]")
        };

        let envelope = encode("hello", 7, &circuit, &pubkeys).unwrap();

        let hop1 = match peel(&envelope, &keypairs[&3]).unwrap() {
            Peeled::Forward { next_hop, envelope } => {
                assert_eq!(next_hop, HopAddr::relay(1).unwrap());
                envelope
            }
            other => panic!("expected forward, got {other:?}"),
        };
        let hop2 = match peel(&hop1, &keypairs[&1]).unwrap() {
            Peeled::Forward { next_hop, envelope } => {
                assert_eq!(next_hop, HopAddr::relay(4).unwrap());
                envelope
            }
            other => panic!("expected forward, got {other:?}"),
        };
        match peel(&hop2, &keypairs[&4]).unwrap() {
            Peeled::Deliver {
                recipient,
                plaintext,
            } => {
                assert_eq!(recipient, HopAddr::user(7).unwrap());
                assert_eq!(plaintext, "hello");
            }
            other => panic!("expected delivery, got {other:?}"),
        }
    }
}
