//! Strkey encoding for account addresses and secret seeds.
//!
//! Format: base32(version_byte ‖ payload ‖ crc16(version_byte ‖ payload))
//!
//! - Version byte: `6 << 3` for accounts (renders as `G…`), `18 << 3` for secret seeds (`S…`).
//! - Payload: 32-byte Ed25519 public key or seed.
//! - Checksum: CRC16-XModem, little-endian.
//! - Base32 alphabet: RFC 4648, no padding. 35 bytes encode to exactly 56 characters.

use custody_types::{ParseError, PrivateKey, PublicKey, WalletAddress};
use zeroize::Zeroize;

/// RFC 4648 base32 alphabet.
const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

const VERSION_ACCOUNT_ID: u8 = 6 << 3;
const VERSION_SEED: u8 = 18 << 3;

/// Decoded length: version byte + 32-byte payload + 2-byte checksum.
const RAW_LEN: usize = 35;
/// Encoded length in base32 characters.
const ENCODED_LEN: usize = 56;

/// CRC16-XModem (polynomial 0x1021, initial value 0).
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Encode a byte slice as unpadded base32.
fn encode_base32(bytes: &[u8]) -> String {
    let num_chars = (bytes.len() * 8).div_ceil(5);
    let mut result = String::with_capacity(num_chars);

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

/// Decode unpadded base32 into a fixed-size array. Returns `None` on invalid
/// characters or if the input does not fill the array.
fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        if c >= 128 {
            return None;
        }
        let val = BASE32_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            if pos == N {
                return None;
            }
            result[pos] = (buffer >> bits_in_buffer) as u8;
            pos += 1;
        }
    }

    if pos < N {
        return None;
    }
    Some(result)
}

fn encode_check(version: u8, payload: &[u8; 32]) -> String {
    let mut raw = [0u8; RAW_LEN];
    raw[0] = version;
    raw[1..33].copy_from_slice(payload);
    let crc = crc16_xmodem(&raw[..33]);
    raw[33..].copy_from_slice(&crc.to_le_bytes());
    let encoded = encode_base32(&raw);
    raw.zeroize();
    encoded
}

fn decode_check(version: u8, encoded: &str) -> Option<[u8; 32]> {
    if encoded.len() != ENCODED_LEN {
        return None;
    }
    let mut raw: [u8; RAW_LEN] = decode_base32_fixed(encoded)?;
    let checksum = u16::from_le_bytes([raw[33], raw[34]]);
    let valid = raw[0] == version && crc16_xmodem(&raw[..33]) == checksum;

    let mut payload = [0u8; 32];
    payload.copy_from_slice(&raw[1..33]);
    raw.zeroize();

    valid.then_some(payload)
}

/// Derive the `G…` account address of a public key.
pub fn derive_address(public_key: &PublicKey) -> WalletAddress {
    WalletAddress::new(encode_check(VERSION_ACCOUNT_ID, public_key.as_bytes()))
}

/// Extract the public key bytes from an account address.
///
/// Returns `None` if the address is malformed or has an invalid checksum.
pub fn decode_address(address: &str) -> Option<[u8; 32]> {
    decode_check(VERSION_ACCOUNT_ID, address)
}

/// Validate that an address string is well-formed and its checksum is correct.
pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_some()
}

/// Parse and validate an account address.
pub fn parse_address(address: &str) -> Result<WalletAddress, ParseError> {
    if validate_address(address) {
        Ok(WalletAddress::new(address))
    } else {
        Err(ParseError::InvalidAddress(address.to_string()))
    }
}

/// Encode a secret seed as an `S…` strkey.
pub fn encode_secret_seed(private_key: &PrivateKey) -> String {
    encode_check(VERSION_SEED, &private_key.0)
}

/// Decode an `S…` strkey into its 32-byte secret seed.
pub fn decode_secret_seed(encoded: &str) -> Option<PrivateKey> {
    decode_check(VERSION_SEED, encoded).map(PrivateKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn zero_key_encodes_to_known_address() {
        let addr = derive_address(&PublicKey([0u8; 32]));
        assert_eq!(
            addr.as_str(),
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        );
    }

    #[test]
    fn repeating_key_encodes_to_known_address() {
        let addr = derive_address(&PublicKey([1u8; 32]));
        assert_eq!(
            addr.as_str(),
            "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H"
        );
    }

    #[test]
    fn zero_seed_encodes_to_known_strkey() {
        assert_eq!(
            encode_secret_seed(&PrivateKey([0u8; 32])),
            "SAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSU2"
        );
    }

    #[test]
    fn derive_and_validate() {
        let kp = generate_keypair();
        let addr = derive_address(&kp.public);
        assert!(addr.as_str().starts_with('G'));
        assert_eq!(addr.as_str().len(), 56);
        assert!(addr.is_well_formed());
        assert!(validate_address(addr.as_str()));
        assert_eq!(decode_address(addr.as_str()), Some(kp.public.0));
    }

    #[test]
    fn seed_is_not_an_address() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let seed = encode_secret_seed(&kp.private);
        assert!(seed.starts_with('S'));
        assert!(!validate_address(&seed));
        assert_eq!(decode_secret_seed(&seed).map(|k| k.0), Some([5u8; 32]));
    }

    #[test]
    fn invalid_checksum_rejected() {
        let addr = derive_address(&generate_keypair().public);
        let mut bad = addr.as_str().to_string();
        let last = bad.pop().unwrap();
        bad.push(if last == 'A' { 'B' } else { 'A' });
        assert!(!validate_address(&bad));
    }

    #[test]
    fn wrong_length_and_alphabet_rejected() {
        assert!(!validate_address(""));
        assert!(!validate_address("GABC"));
        assert!(!validate_address(
            "gaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaawhf"
        ));
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn crc16_known_vector() {
        // CRC-16/XMODEM check value.
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
    }
}
