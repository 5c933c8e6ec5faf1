//! Symmetric authenticated encryption with a [`SecretKey`].
//!
//! XSalsa20-Poly1305, the construction behind libsodium's
//! `crypto_secretbox_easy`, as implemented by the `crypto_secretbox` crate.
//! Ciphertexts are laid out as `MAC || encrypted bytes`, byte-compatible with
//! libsodium.
//!
//! The key and nonce MUST be chosen (pseudo-)randomly, and a nonce MUST
//! never be reused with the same key.

use crypto_secretbox::aead::{generic_array::GenericArray, AeadInPlace, KeyInit};
use crypto_secretbox::XSalsa20Poly1305;

use crate::{Error, Nonce, Result, SecretKey};

/// The key length is 32 bytes or 256 bits.
pub const KEY_LEN: usize = 32;
/// The nonce length is 24 bytes or 192 bits.
pub const NONCE_LEN: usize = 24;
/// The MAC tag length is 16 bytes or 128 bits.
pub const MAC_LEN: usize = 16;

/// Encrypts `plaintext`, returning `MAC || ciphertext`.
///
/// # Errors
/// `InvalidArgument` if `key` is not [`KEY_LEN`] bytes long.
pub fn encrypt(plaintext: &[u8], key: &SecretKey, nonce: &Nonce<NONCE_LEN>) -> Result<Vec<u8>> {
    let cipher = self::cipher(key)?;

    let mut sealed = vec![0u8; MAC_LEN + plaintext.len()];
    let (mac, ciphertext) = sealed.split_at_mut(MAC_LEN);
    ciphertext.copy_from_slice(plaintext);

    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce.as_bytes()), &[], ciphertext)
        .map_err(|_| Error::Verification)?;
    mac.copy_from_slice(&tag);

    Ok(sealed)
}

/// Decrypts and authenticates `MAC || ciphertext`.
///
/// # Errors
/// * `InvalidArgument` if `key` is not [`KEY_LEN`] bytes long.
/// * `Verification` if the input is shorter than a MAC, or if it was not
///   produced with this key and nonce or was tampered with.
pub fn decrypt(sealed: &[u8], key: &SecretKey, nonce: &Nonce<NONCE_LEN>) -> Result<Vec<u8>> {
    let cipher = self::cipher(key)?;

    if sealed.len() < MAC_LEN {
        return Err(Error::Verification);
    }

    let (mac, ciphertext) = sealed.split_at(MAC_LEN);
    let mut plaintext = ciphertext.to_vec();

    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce.as_bytes()),
            &[],
            &mut plaintext,
            GenericArray::from_slice(mac),
        )
        .map_err(|_| Error::Verification)?;

    Ok(plaintext)
}

fn cipher(key: &SecretKey) -> Result<XSalsa20Poly1305> {
    if key.len() != KEY_LEN {
        return Err(Error::invalid_argument(format!(
            "key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }

    XSalsa20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| Error::invalid_argument("key has wrong size"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = SecretKey::new(KEY_LEN).unwrap();
        let nonce = Nonce::random().unwrap();

        let sealed = encrypt(b"the quick brown fox", &key, &nonce).unwrap();
        assert_eq!(sealed.len(), MAC_LEN + 19);
        assert_ne!(&sealed[MAC_LEN..], b"the quick brown fox");

        let opened = decrypt(&sealed, &key, &nonce).unwrap();
        assert_eq!(opened, b"the quick brown fox");
    }

    #[test]
    fn mac_comes_first_like_secretbox_easy() {
        use crypto_secretbox::aead::Aead;

        let key = SecretKey::new(KEY_LEN).unwrap();
        let nonce = Nonce::random().unwrap();
        let sealed = encrypt(b"sodium layout", &key, &nonce).unwrap();

        // RustCrypto appends the tag; libsodium's easy API prepends it.
        let appended = XSalsa20Poly1305::new_from_slice(key.as_bytes())
            .unwrap()
            .encrypt(GenericArray::from_slice(nonce.as_bytes()), &b"sodium layout"[..])
            .unwrap();
        let (ciphertext, tag) = appended.split_at(appended.len() - MAC_LEN);
        assert_eq!(&sealed[..MAC_LEN], tag);
        assert_eq!(&sealed[MAC_LEN..], ciphertext);
    }

    #[test]
    fn empty_plaintext() {
        let key = SecretKey::new(KEY_LEN).unwrap();
        let nonce = Nonce::random().unwrap();

        let sealed = encrypt(b"", &key, &nonce).unwrap();
        assert_eq!(sealed.len(), MAC_LEN);
        assert!(decrypt(&sealed, &key, &nonce).unwrap().is_empty());
    }

    #[test]
    fn tampering_is_detected() {
        let key = SecretKey::new(KEY_LEN).unwrap();
        let nonce = Nonce::random().unwrap();
        let sealed = encrypt(b"attack at dawn", &key, &nonce).unwrap();

        for index in [0, MAC_LEN - 1, MAC_LEN, sealed.len() - 1] {
            let mut forged = sealed.clone();
            forged[index] ^= 0x01;
            assert!(matches!(
                decrypt(&forged, &key, &nonce),
                Err(Error::Verification)
            ));
        }

        let mut other_nonce = nonce.clone();
        other_nonce.increment();
        assert!(matches!(
            decrypt(&sealed, &key, &other_nonce),
            Err(Error::Verification)
        ));

        let other_key = SecretKey::new(KEY_LEN).unwrap();
        assert!(matches!(
            decrypt(&sealed, &other_key, &nonce),
            Err(Error::Verification)
        ));
    }

    #[test]
    fn sizes_are_checked() {
        let nonce = Nonce::zero();
        let short_key = SecretKey::new(16).unwrap();
        assert!(matches!(
            encrypt(b"data", &short_key, &nonce),
            Err(Error::InvalidArgument(_))
        ));

        let key = SecretKey::new(KEY_LEN).unwrap();
        assert!(matches!(
            decrypt(&[0; MAC_LEN - 1], &key, &nonce),
            Err(Error::Verification)
        ));
    }
}
