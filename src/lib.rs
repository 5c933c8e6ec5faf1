//! Key material kept in guarded, locked memory pages.
//!
//! Every [`SecretKey`] lives in its own anonymous mapping, surrounded by
//! inaccessible guard pages, excluded from swap and core dumps where the
//! platform allows it. Keys can be switched between no-access, read-only and
//! read-write at runtime; touching a key in a way its current protection
//! forbids terminates the process with a memory-access fault rather than
//! returning an error. Keys are compared in constant time and wiped before
//! their memory is returned to the operating system.
//!
//! ```no_run
//! use guarded_keys::{SecretKey, Strength, SALT_LEN};
//!
//! # fn main() -> guarded_keys::Result<()> {
//! let salt = [7u8; SALT_LEN];
//! let mut key = SecretKey::from_password(32, "correct horse", &salt, Strength::Low)?;
//! assert_eq!(key.len(), 32);
//!
//! key.noaccess()?;
//! // key.as_bytes() would now abort the process.
//! key.readonly()?;
//! # Ok(())
//! # }
//! ```

mod alloc;
pub use alloc::{page_size, GuardedRegion, Protection};

mod buffer;
pub use buffer::ProtectedBuffer;

pub mod crypter;
pub mod cryptor_pk;

mod error;
pub use error::{Error, Result};

mod fixed;
pub use fixed::Key;

mod kdf;
pub use kdf::{KdfParams, Strength, SALT_LEN};

mod key;
pub use key::SecretKey;

mod keypair;
pub use keypair::{KeyPair, PRIVKEY_LEN, PUBKEY_LEN};

mod nonce;
pub use nonce::Nonce;

pub mod util;
