use std::any::Any;
use std::hash::{Hash, Hasher};

use base64::Engine;
use siphasher::sip128::{Hasher128, SipHasher13};

pub(crate) trait SipHashable {
    fn sip_hash(&self) -> u128;
}

impl<T> SipHashable for T
where
    T: Hash + ?Sized + 'static,
{
    fn sip_hash(&self) -> u128 {
        let mut state = SipHasher13::new();
        self.type_id().hash(&mut state);
        self.hash(&mut state);
        state.finish128().as_u128()
    }
}

/// A 128-bit siphash over all `items`, in order.
pub(crate) fn sip_hash_all<T: Hash>(items: impl IntoIterator<Item = T>) -> u128 {
    let mut state = SipHasher13::new();
    for item in items {
        item.hash(&mut state);
    }
    state.finish128().as_u128()
}

/// Base64-encode a 128-bit hash.
pub(crate) fn base64_hash(hash: u128) -> String {
    base64::engine::general_purpose::STANDARD.encode(hash.to_be_bytes())
}

/// A running 128-bit siphash over a sequence of byte slices.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContentHasher(SipHasher13);

impl ContentHasher {
    pub(crate) fn update(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }

    pub(crate) fn finish(&self) -> u128 {
        self.0.finish128().as_u128()
    }
}
