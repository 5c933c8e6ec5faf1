//! Public-key authenticated encryption.
//!
//! X25519 key agreement with XSalsa20-Poly1305, the construction behind
//! libsodium's `crypto_box`, as implemented by the `crypto_box` crate.
//! Ciphertexts are laid out as `MAC || encrypted bytes`.
//!
//! The sender encrypts with the recipient's public key and its own private
//! key; the recipient decrypts with its private key and the sender's public
//! key. Checking that a public key really belongs to whom it claims is the
//! caller's business. A nonce MUST never be reused with the same pair of
//! keys.

use crypto_box::aead::{generic_array::GenericArray, AeadInPlace};
use crypto_box::{PublicKey, SalsaBox};
use zeroize::Zeroizing;

use crate::{Error, Key, KeyPair, Nonce, Result, PRIVKEY_LEN, PUBKEY_LEN};

/// The nonce length is 24 bytes or 192 bits.
pub const NONCE_LEN: usize = 24;
/// The MAC tag length is 16 bytes or 128 bits.
pub const MAC_LEN: usize = 16;

/// Encrypts `plaintext` for the owner of `pubkey`, authenticated by `privkey`.
///
/// # Errors
/// `InvalidArgument` if `pubkey` is not [`PUBKEY_LEN`] bytes long.
pub fn encrypt(
    plaintext: &[u8],
    pubkey: &[u8],
    privkey: &Key<PRIVKEY_LEN>,
    nonce: &Nonce<NONCE_LEN>,
) -> Result<Vec<u8>> {
    let salsa_box = self::salsa_box(pubkey, privkey)?;

    let mut sealed = vec![0u8; MAC_LEN + plaintext.len()];
    let (mac, ciphertext) = sealed.split_at_mut(MAC_LEN);
    ciphertext.copy_from_slice(plaintext);

    let tag = salsa_box
        .encrypt_in_place_detached(GenericArray::from_slice(nonce.as_bytes()), &[], ciphertext)
        .map_err(|_| Error::Verification)?;
    mac.copy_from_slice(&tag);

    Ok(sealed)
}

/// Encrypts with both keys taken from one pair, e.g. for messages to self.
pub fn encrypt_with_keypair(
    plaintext: &[u8],
    keypair: &KeyPair,
    nonce: &Nonce<NONCE_LEN>,
) -> Result<Vec<u8>> {
    self::encrypt(plaintext, keypair.pubkey(), keypair.privkey(), nonce)
}

/// Decrypts `MAC || ciphertext` sent by the owner of `pubkey` to the owner of
/// `privkey`.
///
/// # Errors
/// * `InvalidArgument` if `pubkey` is not [`PUBKEY_LEN`] bytes long.
/// * `Verification` if the input is shorter than a MAC, was tampered with,
///   or was not sent by the owner of `pubkey`.
pub fn decrypt(
    sealed: &[u8],
    privkey: &Key<PRIVKEY_LEN>,
    pubkey: &[u8],
    nonce: &Nonce<NONCE_LEN>,
) -> Result<Vec<u8>> {
    let salsa_box = self::salsa_box(pubkey, privkey)?;

    if sealed.len() < MAC_LEN {
        return Err(Error::Verification);
    }

    let (mac, ciphertext) = sealed.split_at(MAC_LEN);
    let mut plaintext = ciphertext.to_vec();

    salsa_box
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce.as_bytes()),
            &[],
            &mut plaintext,
            GenericArray::from_slice(mac),
        )
        .map_err(|_| Error::Verification)?;

    Ok(plaintext)
}

/// Decrypts with both keys taken from one pair.
pub fn decrypt_with_keypair(
    sealed: &[u8],
    keypair: &KeyPair,
    nonce: &Nonce<NONCE_LEN>,
) -> Result<Vec<u8>> {
    self::decrypt(sealed, keypair.privkey(), keypair.pubkey(), nonce)
}

fn salsa_box(pubkey: &[u8], privkey: &Key<PRIVKEY_LEN>) -> Result<SalsaBox> {
    let pubkey = <[u8; PUBKEY_LEN]>::try_from(pubkey).map_err(|_| {
        Error::invalid_argument(format!(
            "public key must be {PUBKEY_LEN} bytes, got {}",
            pubkey.len()
        ))
    })?;

    let secret_bytes = Zeroizing::new(*privkey.as_array());
    let secret = crypto_box::SecretKey::from(*secret_bytes);
    Ok(SalsaBox::new(&PublicKey::from(pubkey), &secret))
}
