use crate::{Error, Result};

/// Digits, then uppercase, then lowercase.
pub(crate) const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Uppercase, then lowercase, then digits, then `+` and `/`.
pub(crate) const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Longest key for a `u64` in either alphabet: `62^10 < 2^64 <= 62^11` and
/// `64^10 < 2^64 <= 64^11`.
pub(crate) const MAX_KEY_LEN: usize = 11;

const NO_VALUE: u8 = 255;

/// Builds a byte -> digit lookup table for an alphabet.
const fn lookup(alphabet: &[u8]) -> [u8; 256] {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0;
    while i < alphabet.len() {
        lut[alphabet[i] as usize] = i as u8;
        i += 1;
    }
    lut
}

pub(crate) const BASE62_LOOKUP: [u8; 256] = lookup(BASE62_ALPHABET);
pub(crate) const BASE64_LOOKUP: [u8; 256] = lookup(BASE64_ALPHABET);

/// Encodes `n` as big-endian digits of `alphabet`, without padding.
///
/// Zero encodes as the alphabet's digit 0, never as the empty string.
pub(crate) fn encode_radix(mut n: u64, alphabet: &[u8]) -> String {
    let radix = alphabet.len() as u64;
    let mut buf = [0_u8; MAX_KEY_LEN];
    let mut pos = MAX_KEY_LEN;
    loop {
        pos -= 1;
        buf[pos] = alphabet[(n % radix) as usize];
        n /= radix;
        if n == 0 {
            break;
        }
    }
    // alphabets are ASCII
    buf[pos..].iter().map(|&b| char::from(b)).collect()
}

/// Decodes a key by left-folding `acc * radix + digit`.
///
/// The empty string decodes to zero.
pub(crate) fn decode_radix(encoded: &str, lut: &[u8; 256], radix: u64) -> Result<u64> {
    let mut acc = 0_u64;
    for (index, byte) in encoded.bytes().enumerate() {
        let digit = lut[usize::from(byte)];
        if digit == NO_VALUE {
            return Err(Error::InvalidEncoding { byte, index });
        }
        acc = acc
            .checked_mul(radix)
            .and_then(|acc| acc.checked_add(u64::from(digit)))
            .ok_or(Error::KeyOverflow { len: encoded.len() })?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_tables_invert_alphabets() {
        for (i, &c) in BASE62_ALPHABET.iter().enumerate() {
            assert_eq!(BASE62_LOOKUP[c as usize] as usize, i);
        }
        for (i, &c) in BASE64_ALPHABET.iter().enumerate() {
            assert_eq!(BASE64_LOOKUP[c as usize] as usize, i);
        }
        assert_eq!(BASE62_LOOKUP[b'+' as usize], NO_VALUE);
        assert_eq!(BASE64_LOOKUP[b'-' as usize], NO_VALUE);
    }

    #[test]
    fn max_value_fits_the_buffer() {
        assert_eq!(encode_radix(u64::MAX, BASE62_ALPHABET).len(), MAX_KEY_LEN);
        assert_eq!(encode_radix(u64::MAX, BASE64_ALPHABET).len(), MAX_KEY_LEN);
    }
}
