//! [`digest`](https://crates.io/crates/digest) 0.9 and
//! [`crypto_mac`](https://crates.io/crates/crypto-mac) 0.11 trait impls for
//! [`Hasher`] and [`OutputReader`], behind the `traits-preview` feature.
//!
//! Hashers built with [`Hasher::with_mode`] work with every trait here, and
//! the `_reset` methods keep the key and mode the same way [`Hasher::reset`]
//! does. The traits have no error channel, so calling a finalizing trait
//! method on a hasher that was already finalized panics with
//! [`Error::AlreadyFinalized`].

pub use crypto_mac;
pub use digest;

use crate::{Error, Hasher, OutputReader, KEY_LEN};
use digest::generic_array::typenum::{U32, U64};
use digest::generic_array::GenericArray;

#[track_caller]
fn accepting<T>(result: Result<T, Error>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("trait call on a finalized hasher: {err}"),
    }
}

impl digest::BlockInput for Hasher {
    type BlockSize = U64;
}

impl digest::Update for Hasher {
    fn update(&mut self, data: impl AsRef<[u8]>) {
        Hasher::update(self, data.as_ref());
    }
}

impl digest::Reset for Hasher {
    fn reset(&mut self) {
        Hasher::reset(self);
    }
}

impl digest::FixedOutput for Hasher {
    type OutputSize = U32;

    fn finalize_into(mut self, out: &mut GenericArray<u8, U32>) {
        accepting(Hasher::finalize_into(&mut self, out));
    }

    fn finalize_into_reset(&mut self, out: &mut GenericArray<u8, U32>) {
        accepting(Hasher::finalize_into(self, out));
        Hasher::reset(self);
    }
}

impl digest::ExtendableOutput for Hasher {
    type Reader = OutputReader;

    fn finalize_xof(mut self) -> OutputReader {
        accepting(Hasher::finalize_xof(&mut self))
    }

    fn finalize_xof_reset(&mut self) -> OutputReader {
        let reader = accepting(Hasher::finalize_xof(self));
        Hasher::reset(self);
        reader
    }
}

impl digest::XofReader for OutputReader {
    fn read(&mut self, buffer: &mut [u8]) {
        self.fill(buffer);
    }
}

impl crypto_mac::NewMac for Hasher {
    type KeySize = U32;

    fn new(key: &crypto_mac::Key<Self>) -> Self {
        let key: &[u8; KEY_LEN] = key.as_ref();
        Hasher::new_keyed(key)
    }

    fn new_from_slice(key: &[u8]) -> Result<Self, crypto_mac::InvalidKeyLength> {
        Hasher::new_keyed_from_slice(key).map_err(|_| crypto_mac::InvalidKeyLength)
    }
}

impl crypto_mac::Mac for Hasher {
    type OutputSize = U32;

    fn update(&mut self, data: &[u8]) {
        Hasher::update(self, data);
    }

    fn reset(&mut self) {
        Hasher::reset(self);
    }

    fn finalize(mut self) -> crypto_mac::Output<Self> {
        let hash = accepting(self.finalize_hash());
        crypto_mac::Output::new((*hash.as_bytes()).into())
    }
}
