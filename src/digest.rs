use data_encoding::{BASE64URL_NOPAD, HEXLOWER};
use md5::Md5;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::collections::BTreeSet;

use crate::error::{OutnameError, Result};

// Curated alphabets: base32/49/58 drop visually ambiguous characters
// (0/O, 1/l/I and friends).
const BASE26: &str = "abcdefghijklmnopqrstuvwxyz";
const BASE32: &str = "123456789abcdefghjkmnpqrstuvwxyz";
const BASE36: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
const BASE49: &str = "abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
const BASE52: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE58: &str = "123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
const BASE62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE64SAFE: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

/// Compute a digest of `buffer` and render it as a short ASCII string.
///
/// `algorithm` is one of `md5`, `sha224`, `sha256`, `sha384`, `sha512`.
///
/// `encoding` selects the rendering:
/// - `"hex"`: lowercase hexadecimal
/// - `"base64"`: standard base64 made URL/filename safe (`+` → `-`,
///   `/` → `_`, trailing `=` stripped)
/// - a named alphabet (`base26`, `base32`, `base36`, `base49`, `base52`,
///   `base58`, `base62`, `base64safe`) or any literal alphabet with at
///   least 2 distinct characters: arbitrary-base encoding of the digest
///   treated as one big unsigned integer, most-significant byte first
///
/// If `length` is given the result is truncated to its first `length`
/// characters.
///
/// # Errors
///
/// - `UnsupportedAlgorithm` for an unknown algorithm name
/// - `InvalidEncoding` for an alphabet with fewer than 2 distinct characters
/// - `InvalidParameters` for an explicit zero length
pub fn hash_digest(
    buffer: &[u8],
    algorithm: &str,
    encoding: &str,
    length: Option<usize>,
) -> Result<String> {
    if length == Some(0) {
        return Err(OutnameError::InvalidParameters {
            message: "digest length must be at least 1".to_string(),
        });
    }

    let digest = digest_bytes(algorithm, buffer)?;
    let encoded = match encoding {
        "hex" => HEXLOWER.encode(&digest),
        "base64" => BASE64URL_NOPAD.encode(&digest),
        other => encode_with_alphabet(&digest, resolve_alphabet(other)?),
    };

    Ok(match length {
        Some(n) => encoded.chars().take(n).collect(),
        None => encoded,
    })
}

/// Convenience wrapper: md5/hex digest of `input`, truncated to `length`
/// characters (or the full 32 if `length` is larger).
pub fn content_hash(input: impl AsRef<[u8]>, length: usize) -> String {
    let encoded = HEXLOWER.encode(&Md5::digest(input.as_ref()));
    let end = length.min(encoded.len());
    encoded[..end].to_string()
}

fn digest_bytes(algorithm: &str, buffer: &[u8]) -> Result<Vec<u8>> {
    match algorithm {
        "md5" => Ok(Md5::digest(buffer).to_vec()),
        "sha224" => Ok(Sha224::digest(buffer).to_vec()),
        "sha256" => Ok(Sha256::digest(buffer).to_vec()),
        "sha384" => Ok(Sha384::digest(buffer).to_vec()),
        "sha512" => Ok(Sha512::digest(buffer).to_vec()),
        other => Err(OutnameError::UnsupportedAlgorithm {
            algorithm: other.to_string(),
        }),
    }
}

fn resolve_alphabet(encoding: &str) -> Result<&str> {
    let named = match encoding {
        "base26" => Some(BASE26),
        "base32" => Some(BASE32),
        "base36" => Some(BASE36),
        "base49" => Some(BASE49),
        "base52" => Some(BASE52),
        "base58" => Some(BASE58),
        "base62" => Some(BASE62),
        "base64safe" => Some(BASE64SAFE),
        _ => None,
    };
    if let Some(alphabet) = named {
        return Ok(alphabet);
    }

    let distinct: BTreeSet<char> = encoding.chars().collect();
    if distinct.len() < 2 {
        return Err(OutnameError::InvalidEncoding {
            encoding: encoding.to_string(),
        });
    }
    Ok(encoding)
}

/// Encode `digest` as a big-endian unsigned integer in the base given by
/// `alphabet`, via byte-array long division (digest sizes exceed any
/// native integer width).
pub(crate) fn encode_with_alphabet(digest: &[u8], alphabet: &str) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    let base = chars.len() as u32;

    let mut bytes = digest.to_vec();
    let mut digits: Vec<char> = Vec::new();
    let mut start = 0;
    loop {
        while start < bytes.len() && bytes[start] == 0 {
            start += 1;
        }
        if start == bytes.len() {
            break;
        }
        // One pass divides the whole number by `base`; the remainder is
        // the next least-significant digit.
        let mut rem: u32 = 0;
        for b in &mut bytes[start..] {
            let acc = rem * 256 + u32::from(*b);
            *b = (acc / base) as u8;
            rem = acc % base;
        }
        digits.push(chars[rem as usize]);
    }

    if digits.is_empty() {
        digits.push(chars[0]);
    }
    digits.reverse();
    digits.into_iter().collect()
}
