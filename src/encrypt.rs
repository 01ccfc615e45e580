//! Hooking up encryption.
//!
//! folio does not implement any security handler itself. Instead, an
//! [`Encryptor`] supplied by the caller is asked to encrypt every string and
//! every stream payload of the file, and the matching encryption dictionary
//! is written as a regular object.

use std::fmt::Debug;
use std::sync::Arc;

use crate::object::{Dict, Object, Ref, Str, StrKind};

/// Encrypts the data belonging to one object.
///
/// Standard security handlers derive the key from the object number and
/// generation, and from the first element of the file identifier, which is
/// why both are passed along. The identifier is the same for every call of
/// one flush.
pub trait Encryptor: Debug {
    /// Encrypt `data`, which is part of the object `object` of the file
    /// identified by `file_id`.
    fn encrypt(&self, object: Ref, file_id: &[u8], data: &[u8]) -> Vec<u8>;
}

/// The encryption of a document.
#[derive(Debug, Clone)]
pub struct Encryption {
    /// The encryptor.
    pub encryptor: Arc<dyn Encryptor>,
    /// The encryption dictionary that is written as `/Encrypt`.
    pub dictionary: Dict,
    /// The file identifier. If it is absent, one is derived from the
    /// unencrypted objects of the document.
    pub file_id: Option<Vec<u8>>,
}

impl Encryption {
    /// Create a new encryption.
    pub fn new(encryptor: Arc<dyn Encryptor>, dictionary: Dict) -> Self {
        Self {
            encryptor,
            dictionary,
            file_id: None,
        }
    }

    /// Use `file_id` as the file identifier.
    ///
    /// Security handlers that compute the encryption dictionary up front
    /// need to know the identifier before the document is written.
    pub fn with_file_id(mut self, file_id: Vec<u8>) -> Self {
        self.file_id = Some(file_id);
        self
    }
}

/// Return a copy of `object` with every string encrypted for `r`.
pub(crate) fn encrypt_strings(
    object: &Object,
    r: Ref,
    file_id: &[u8],
    encryptor: &dyn Encryptor,
) -> Object {
    match object {
        Object::String(s) => {
            let encrypted = encryptor.encrypt(r, file_id, s.as_bytes());
            Object::String(match s.kind() {
                StrKind::Literal => Str::literal(encrypted),
                StrKind::Hex => Str::hex(encrypted),
            })
        }
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| encrypt_strings(item, r, file_id, encryptor))
                .collect(),
        ),
        Object::Dict(dict) => Object::Dict(encrypt_dict_strings(dict, r, file_id, encryptor)),
        other => other.clone(),
    }
}

pub(crate) fn encrypt_dict_strings(
    dict: &Dict,
    r: Ref,
    file_id: &[u8],
    encryptor: &dyn Encryptor,
) -> Dict {
    let mut dict = dict.clone();
    for (_, value) in dict.iter_mut() {
        *value = encrypt_strings(value, r, file_id, encryptor);
    }

    dict
}
