//! Pluggable key hashing.
//!
//! Tables address buckets with a 32-bit hash of the raw key bytes. Anything
//! implementing [`KeyHasher`] can be supplied at construction; closures of the
//! shape `Fn(&[u8]) -> u32` work directly, and any [`BuildHasher`] can be
//! plugged in through [`BuildHasherAdapter`].

use core::hash::BuildHasher;
use core::hash::Hasher;

/// Maps a byte key to a 32-bit hash.
///
/// Implementations must return the same value for equal byte content. The low
/// bits select the bucket, so they should be well distributed.
pub trait KeyHasher {
    /// Hashes `key`.
    fn hash(&self, key: &[u8]) -> u32;
}

impl<F> KeyHasher for F
where
    F: Fn(&[u8]) -> u32,
{
    #[inline(always)]
    fn hash(&self, key: &[u8]) -> u32 {
        self(key)
    }
}

#[inline(always)]
fn fold_to_u32(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// The hash function used unless another one is supplied.
///
/// With the `foldhash` feature (on by default) this is a fixed-seed foldhash
/// folded down to 32 bits. Without it, 32-bit FNV-1a is used. Both are
/// deterministic across runs and processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultKeyHasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        impl KeyHasher for DefaultKeyHasher {
            #[inline]
            fn hash(&self, key: &[u8]) -> u32 {
                let mut hasher = foldhash::fast::FixedState::default().build_hasher();
                hasher.write(key);
                fold_to_u32(hasher.finish())
            }
        }
    } else {
        const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
        const FNV_PRIME: u32 = 0x0100_0193;

        impl KeyHasher for DefaultKeyHasher {
            #[inline]
            fn hash(&self, key: &[u8]) -> u32 {
                key.iter().fold(FNV_OFFSET_BASIS, |h, &b| {
                    (h ^ b as u32).wrapping_mul(FNV_PRIME)
                })
            }
        }
    }
}

/// Adapts a [`BuildHasher`] into a [`KeyHasher`].
///
/// The key bytes are written raw (no length prefix) and the 64-bit result is
/// folded to 32 bits.
///
/// # Examples
///
/// ```rust
/// # use chain_hash::hash::BuildHasherAdapter;
/// # use chain_hash::hash::KeyHasher;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Clone, Default)]
/// # struct Sip;
/// # impl core::hash::BuildHasher for Sip {
/// #     type Hasher = SipHasher;
/// #     fn build_hasher(&self) -> SipHasher {
/// #         SipHasher::new()
/// #     }
/// # }
/// #
/// let hasher = BuildHasherAdapter(Sip);
/// assert_eq!(hasher.hash(b"foo"), hasher.hash(b"foo"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BuildHasherAdapter<S>(pub S);

impl<S> KeyHasher for BuildHasherAdapter<S>
where
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &[u8]) -> u32 {
        let mut hasher = self.0.build_hasher();
        hasher.write(key);
        fold_to_u32(hasher.finish())
    }
}
