//! Error handling.
//!
//! Writing a PDF can fail for a handful of reasons: a font that isn't part of
//! the registry, an object that is referenced but never written, a compressor
//! that gives up, or the output sink going away. This module provides the
//! error type folio uses for all of them.

use std::io;

use crate::object::Ref;

/// A wrapper type for folio errors.
pub type FolioResult<T> = Result<T, FolioError>;

/// An error in folio.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    /// The font/encoding pair is not part of the font registry.
    #[error("font '{font}' with '{encoding}' encoding is not a CJK font")]
    UnsupportedFont {
        /// The requested font name, including any style suffix.
        font: String,
        /// The requested encoding (CMap) name.
        encoding: String,
    },
    /// A named code mapping or encoding entry could not be found.
    #[error("the encoding resource '{name}' does not exist")]
    MissingEncodingResource {
        /// The name of the missing resource.
        name: String,
    },
    /// A field of a font metric record is missing or not a number.
    #[error("malformed metric record for font '{font}': field '{field}'")]
    MalformedMetricRecord {
        /// The font whose record is broken.
        font: String,
        /// The offending field.
        field: String,
    },
    /// An object was referenced but never registered before the flush.
    #[error("object {target} is referenced{} but was never registered", fmt_referrer(.referrer))]
    DanglingReference {
        /// The reference that couldn't be resolved.
        target: Ref,
        /// The object containing the reference, if it came from an object.
        referrer: Option<Ref>,
    },
    /// The compressor failed for the stream of an object.
    #[error("failed to encode stream{}: {message}", fmt_object(.object))]
    CodecFailure {
        /// The object whose stream failed to encode, if known.
        object: Option<Ref>,
        /// The message reported by the compressor.
        message: String,
    },
    /// The document needs more objects than the format allows.
    #[error("no more object identities are available")]
    IdentitySpaceExhausted,
    /// An object starts beyond the offsets a classic cross-reference table
    /// can describe. A cross-reference stream has no such limit.
    #[error("offset {offset} of object {object} does not fit into a cross-reference table")]
    OffsetTooLarge {
        /// The object that starts too late.
        object: Ref,
        /// Its byte offset.
        offset: u64,
    },
    /// A payload was registered twice for the same reference.
    #[error("object {0} has already been registered")]
    AlreadyRegistered(Ref),
    /// Writing to the output or loading a resource failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn fmt_referrer(referrer: &Option<Ref>) -> String {
    match referrer {
        Some(r) => format!(" by object {r}"),
        None => String::new(),
    }
}

fn fmt_object(object: &Option<Ref>) -> String {
    match object {
        Some(r) => format!(" of object {r}"),
        None => String::new(),
    }
}

impl FolioError {
    /// Attach the object a codec failure belongs to.
    pub(crate) fn for_object(self, r: Ref) -> Self {
        match self {
            FolioError::CodecFailure { object: None, message } => FolioError::CodecFailure {
                object: Some(r),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = FolioError::DanglingReference {
            target: Ref::new(7),
            referrer: Some(Ref::new(2)),
        };
        assert_eq!(
            err.to_string(),
            "object 7 0 R is referenced by object 2 0 R but was never registered"
        );

        let err = FolioError::CodecFailure {
            object: None,
            message: "boom".to_string(),
        }
        .for_object(Ref::new(3));
        assert_eq!(err.to_string(), "failed to encode stream of object 3 0 R: boom");
    }
}
