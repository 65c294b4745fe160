use core::fmt;

use crate::{
    Result,
    radix::alphabet::{
        BASE62_ALPHABET, BASE62_LOOKUP, BASE64_ALPHABET, BASE64_LOOKUP, decode_radix,
        encode_radix,
    },
};

/// The string codec used to render IDs as keys.
///
/// Keys are variable-length and unpadded: the most significant digit comes
/// first and zero renders as the alphabet's single digit 0.
///
/// ⚠️ **Note:** because keys are not padded to a fixed width, lexicographic
/// order of keys does **not** follow numeric order of the IDs once values
/// cross a power of the radix (e.g. `"z"` (61) sorts after `"10"` (62) in
/// base62). Store or compare the numeric ID when ordering matters.
///
/// # Example
///
/// ```
/// use kubeflake::Codec;
///
/// let key = Codec::Base62.encode(2_424_242_424_242_424_242);
/// assert_eq!(Codec::Base62.decode(&key).unwrap(), 2_424_242_424_242_424_242);
/// assert_eq!(Codec::Base62.encode(0), "0");
/// assert_eq!(Codec::Base64.encode(0), "A");
/// ```
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Codec {
    /// `0-9`, `A-Z`, `a-z`.
    #[default]
    Base62,
    /// `A-Z`, `a-z`, `0-9`, `+`, `/`.
    Base64,
}

impl Codec {
    /// Number of digits in the alphabet.
    pub const fn radix(self) -> u64 {
        match self {
            Self::Base62 => 62,
            Self::Base64 => 64,
        }
    }

    /// The alphabet, ordered by digit value.
    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Base62 => BASE62_ALPHABET,
            Self::Base64 => BASE64_ALPHABET,
        }
    }

    /// Encodes an ID into a key.
    pub fn encode(self, n: u64) -> String {
        encode_radix(n, self.alphabet())
    }

    /// Decodes a key back into an ID.
    ///
    /// The empty string decodes to `0`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEncoding`] if the key contains a byte outside the
    ///   alphabet.
    /// - [`Error::KeyOverflow`] if the key is too long to fit in a `u64`.
    ///
    /// [`Error::InvalidEncoding`]: crate::Error::InvalidEncoding
    /// [`Error::KeyOverflow`]: crate::Error::KeyOverflow
    pub fn decode(self, key: &str) -> Result<u64> {
        match self {
            Self::Base62 => decode_radix(key, &BASE62_LOOKUP, self.radix()),
            Self::Base64 => decode_radix(key, &BASE64_LOOKUP, self.radix()),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base62 => f.write_str("base62"),
            Self::Base64 => f.write_str("base64"),
        }
    }
}
