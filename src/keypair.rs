use core::fmt;

use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{Key, Result};

/// Length of an X25519 public key.
pub const PUBKEY_LEN: usize = crypto_box::KEY_SIZE;
/// Length of an X25519 private key.
pub const PRIVKEY_LEN: usize = crypto_box::KEY_SIZE;

/// A matching X25519 public/private key pair, both halves in guarded memory.
///
/// Pairs come out of one key-generation call, or are rebuilt from key
/// material the caller vouches for; halves are never mixed piecemeal.
pub struct KeyPair {
    pubkey: Key<PUBKEY_LEN>,
    privkey: Key<PRIVKEY_LEN>,
}

impl KeyPair {
    /// Generates a fresh pair. Both halves are read-only.
    pub fn generate() -> Result<Self> {
        let secret = crypto_box::SecretKey::generate(&mut OsRng);
        let public = secret.public_key();
        let secret_bytes = Zeroizing::new(secret.to_bytes());

        Self::from_parts(public.as_bytes(), secret_bytes.as_slice())
    }

    /// Rebuilds a pair from existing key material without checking that the
    /// halves match.
    ///
    /// # Errors
    /// `InvalidArgument` if a half does not have its scheme-defined length.
    pub fn from_parts(pubkey: &[u8], privkey: &[u8]) -> Result<Self> {
        Ok(Self {
            pubkey: Key::from_slice(pubkey)?,
            privkey: Key::from_slice(privkey)?,
        })
    }

    /// Rebuilds a pair from its private half, recomputing the public one.
    pub fn from_private_key(privkey: Key<PRIVKEY_LEN>) -> Result<Self> {
        let secret_bytes = Zeroizing::new(*privkey.as_array());
        let secret = crypto_box::SecretKey::from(*secret_bytes);
        let public = secret.public_key();

        Ok(Self {
            pubkey: Key::from_slice(public.as_bytes())?,
            privkey,
        })
    }

    #[inline]
    pub fn pubkey(&self) -> &[u8; PUBKEY_LEN] {
        self.pubkey.as_array()
    }

    #[inline]
    pub fn privkey(&self) -> &Key<PRIVKEY_LEN> {
        &self.privkey
    }

    /// Splits the pair into its public and private halves.
    pub fn into_parts(self) -> (Key<PUBKEY_LEN>, Key<PRIVKEY_LEN>) {
        (self.pubkey, self.privkey)
    }

    pub fn try_clone(&self) -> Result<Self> {
        let mut pubkey = self.pubkey.try_clone()?;
        let mut privkey = self.privkey.try_clone()?;
        pubkey.readonly()?;
        privkey.readonly()?;

        Ok(Self { pubkey, privkey })
    }
}

/// Both halves are compared in constant time, without short-circuiting.
impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        let same_pubkey = self.pubkey.ct_eq(&other.pubkey);
        let same_privkey = self.privkey.ct_eq(&other.privkey);
        (same_pubkey & same_privkey).into()
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("pubkey", &crate::util::hex::to_hex(self.pubkey()))
            .field("privkey", &self.privkey)
            .finish()
    }
}
