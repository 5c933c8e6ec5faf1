//! Hex encoding for public values: ciphertexts, nonces, public keys.

use crate::{Error, Result};

/// Lower-case hex encoding of `bytes`.
#[inline]
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    ::hex::encode(bytes)
}

/// Decodes a hex string, in either case.
pub fn from_hex(hex: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    ::hex::decode(hex).map_err(|err| Error::invalid_argument(format!("malformed hex: {err}")))
}
