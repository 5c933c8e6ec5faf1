//! Password-based key derivation (Argon2id v1.3).
//!
//! Three fixed presets are offered, matching libsodium's
//! interactive/moderate/sensitive `crypto_pwhash` limits.

use core::{fmt, str::FromStr};

use argon2::{Algorithm, Argon2, Block, Params, Version};

use crate::{Error, Result};

/// Required salt length in bytes.
pub const SALT_LEN: usize = 16;

/// How much work goes into deriving a key from a password.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strength {
    /// 2 passes over 64 MiB.
    Low,
    /// 3 passes over 256 MiB.
    Medium,
    /// 4 passes over 1 GiB.
    #[default]
    High,
}

/// Cost parameters of a [`Strength`] preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of passes over the working memory.
    pub passes: u32,
    /// Working memory in KiB.
    pub memory_kib: u32,
}

impl Strength {
    pub const fn params(self) -> KdfParams {
        match self {
            Strength::Low => KdfParams {
                passes: 2,
                memory_kib: 64 * 1024,
            },
            Strength::Medium => KdfParams {
                passes: 3,
                memory_kib: 256 * 1024,
            },
            Strength::High => KdfParams {
                passes: 4,
                memory_kib: 1024 * 1024,
            },
        }
    }
}

impl FromStr for Strength {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Strength::Low),
            "medium" => Ok(Strength::Medium),
            "high" => Ok(Strength::High),
            _ => Err(Error::invalid_argument(format!("unknown strength {s:?}"))),
        }
    }
}

impl TryFrom<u8> for Strength {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Strength::Low),
            1 => Ok(Strength::Medium),
            2 => Ok(Strength::High),
            _ => Err(Error::invalid_argument(format!("unknown strength level {level}"))),
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strength::Low => "low",
            Strength::Medium => "medium",
            Strength::High => "high",
        })
    }
}

/// A validated derivation, ready to run.
///
/// Every argument check happens in [`Derivation::new`], so that callers can
/// validate before touching the output buffer.
pub(crate) struct Derivation<'s> {
    argon2: Argon2<'static>,
    salt: &'s [u8],
}

impl<'s> Derivation<'s> {
    pub fn new(salt: &'s [u8], params: KdfParams, output_len: usize) -> Result<Self> {
        if salt.len() != SALT_LEN {
            return Err(Error::invalid_argument(format!(
                "salt must be {SALT_LEN} bytes, got {}",
                salt.len()
            )));
        }

        let params = Params::new(params.memory_kib, params.passes, 1, Some(output_len))
            .map_err(|err| Error::invalid_argument(format!("key derivation: {err}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            salt,
        })
    }

    /// Derives `out.len()` bytes from `password` straight into `out`.
    pub fn run(&self, password: &[u8], out: &mut [u8]) -> Result<()> {
        let mut blocks = alloc_blocks(self.argon2.params().block_count())?;

        self.argon2
            .hash_password_into_with_memory(password, self.salt, out, &mut blocks)
            .map_err(|err| Error::invalid_argument(format!("key derivation: {err}")))
    }
}

fn alloc_blocks(count: usize) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    blocks
        .try_reserve_exact(count)
        .map_err(|_| Error::ResourceExhausted)?;
    blocks.resize_with(count, Block::default);
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = *b"0123456789abcdef";

    #[test]
    fn presets_grow_in_cost() {
        let low = Strength::Low.params();
        let medium = Strength::Medium.params();
        let high = Strength::High.params();

        assert!(low.passes < medium.passes && medium.passes < high.passes);
        assert!(low.memory_kib < medium.memory_kib && medium.memory_kib < high.memory_kib);
        assert_eq!(Strength::default(), Strength::High);
    }

    #[test]
    fn parse_strength() {
        assert_eq!("low".parse::<Strength>().unwrap(), Strength::Low);
        assert_eq!(" Medium ".parse::<Strength>().unwrap(), Strength::Medium);
        assert_eq!("HIGH".parse::<Strength>().unwrap(), Strength::High);
        assert!(matches!(
            "extreme".parse::<Strength>(),
            Err(Error::InvalidArgument(_))
        ));

        assert_eq!(Strength::try_from(1).unwrap(), Strength::Medium);
        assert!(matches!(
            Strength::try_from(3),
            Err(Error::InvalidArgument(_))
        ));

        for strength in [Strength::Low, Strength::Medium, Strength::High] {
            assert_eq!(strength.to_string().parse::<Strength>().unwrap(), strength);
        }
    }

    #[test]
    fn wrong_salt_size_is_rejected() {
        for len in [0, 8, SALT_LEN - 1, SALT_LEN + 1, 32] {
            let salt = vec![0u8; len];
            assert!(matches!(
                Derivation::new(&salt, Strength::Low.params(), 32),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn too_short_output_is_rejected() {
        assert!(matches!(
            Derivation::new(&SALT, Strength::Low.params(), 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn unallocatable_working_memory_is_resource_exhaustion() {
        assert!(matches!(
            alloc_blocks(usize::MAX),
            Err(Error::ResourceExhausted)
        ));
    }

    #[test]
    fn derivation_is_deterministic() {
        let params = KdfParams {
            passes: 1,
            memory_kib: 64,
        };
        let derivation = Derivation::new(&SALT, params, 24).unwrap();

        let mut first = [0u8; 24];
        let mut second = [0u8; 24];
        derivation.run(b"password", &mut first).unwrap();
        derivation.run(b"password", &mut second).unwrap();
        assert_eq!(first, second);

        let mut other = [0u8; 24];
        derivation.run(b"passw0rd", &mut other).unwrap();
        assert_ne!(first, other);
    }
}
