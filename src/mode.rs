use crate::{portable, CVWords, Error, Flags, Hasher, IV, KEY_LEN};

/// The three ways to construct a [`Hasher`], as passed to
/// [`Hasher::with_mode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode<'a> {
    /// The regular hash function, keyed with the fixed IV.
    Hash,
    /// The keyed hash function. The key must be exactly [`KEY_LEN`] bytes.
    KeyedHash(&'a [u8]),
    /// The key derivation function, with the given context string. The
    /// input to the hasher is the key material.
    DeriveKey(&'a str),
}

impl Mode<'_> {
    pub(crate) fn key_words(&self) -> Result<(CVWords, Domain), Error> {
        match *self {
            Mode::Hash => Ok((*IV, Domain::Hash)),
            Mode::KeyedHash(key) => {
                let key: &[u8; KEY_LEN] = key.try_into().map_err(|_| Error::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: key.len(),
                })?;
                Ok((portable::words_from_le_bytes_32(key), Domain::KeyedHash))
            }
            Mode::DeriveKey(context) => Ok((context_key_words(context), Domain::DeriveKeyMaterial)),
        }
    }
}

/// The domain a [`Hasher`] hashes in. Every compression the hasher performs
/// carries the domain's flag, so the same input hashed in two domains never
/// produces related outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// The regular hash function.
    Hash,
    /// The keyed hash function.
    KeyedHash,
    /// The first phase of key derivation, hashing the context string.
    DeriveKeyContext,
    /// The second phase of key derivation, hashing the key material under the
    /// context key.
    DeriveKeyMaterial,
}

impl Domain {
    #[inline]
    pub(crate) fn flags(self) -> Flags {
        match self {
            Domain::Hash => Flags::empty(),
            Domain::KeyedHash => Flags::KEYED_HASH,
            Domain::DeriveKeyContext => Flags::DERIVE_KEY_CONTEXT,
            Domain::DeriveKeyMaterial => Flags::DERIVE_KEY_MATERIAL,
        }
    }
}

// The first phase of key derivation. The context string is hashed with the
// IV, and the 32-byte root output becomes the key for the key material.
pub(crate) fn context_key_words(context: &str) -> CVWords {
    let mut context_hasher = Hasher::new_internal(IV, Domain::DeriveKeyContext);
    context_hasher.update(context.as_bytes());
    let context_key = context_hasher.final_output().root_hash();
    portable::words_from_le_bytes_32(context_key.as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keyed_hash_rejects_bad_key_lengths() {
        for len in [0, 1, KEY_LEN - 1, KEY_LEN + 1, 2 * KEY_LEN] {
            let key = alloc::vec![7; len];
            assert_eq!(
                Mode::KeyedHash(&key).key_words().unwrap_err(),
                Error::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: len,
                },
            );
        }
        let key = [7; KEY_LEN];
        let (key_words, domain) = Mode::KeyedHash(&key).key_words().unwrap();
        assert_eq!(key_words, portable::words_from_le_bytes_32(&key));
        assert_eq!(domain, Domain::KeyedHash);
    }

    #[test]
    fn test_domain_flags_are_distinct() {
        let domains = [
            Domain::Hash,
            Domain::KeyedHash,
            Domain::DeriveKeyContext,
            Domain::DeriveKeyMaterial,
        ];
        for (i, a) in domains.iter().enumerate() {
            for b in &domains[i + 1..] {
                assert_ne!(a.flags(), b.flags());
            }
            // Mode flags never collide with the per-node flags.
            let node_flags = Flags::CHUNK_START | Flags::CHUNK_END | Flags::PARENT | Flags::ROOT;
            assert!(!a.flags().intersects(node_flags));
        }
    }

    #[test]
    fn test_derive_key_phases() {
        // Phase one hashes the context in its own domain with the IV.
        let mut context_hasher = Hasher::new_internal(IV, Domain::DeriveKeyContext);
        context_hasher.update(b"context");
        let context_key = context_hasher.finalize_hash().unwrap();
        assert_eq!(
            context_key_words("context"),
            portable::words_from_le_bytes_32(context_key.as_bytes()),
        );

        // Phase two is an independent hasher keyed with the context key.
        let mut material_hasher = Hasher::new_internal(
            &context_key_words("context"),
            Domain::DeriveKeyMaterial,
        );
        material_hasher.update(b"material");
        assert_eq!(
            material_hasher.finalize_hash().unwrap(),
            crate::derive_key("context", b"material"),
        );
    }
}
