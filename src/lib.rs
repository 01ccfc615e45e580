//! A low-level engine for assembling PDF files.
//!
//! folio builds a graph of indirect objects, encodes their streams and writes
//! them out together with an accurate cross-reference section. On top of that,
//! it knows how to describe CID-keyed CJK fonts with compacted width arrays.
//!
//! The usual entry point is [`Document`]:
//!
//! ```
//! use folio::{Dict, Document};
//!
//! let mut document = Document::new();
//! let catalog = document.graph_mut().register(Dict::with_type("Catalog")).unwrap();
//! let pdf = document.finish(catalog).unwrap();
//!
//! assert!(pdf.starts_with(b"%PDF-1.7"));
//! ```

#![forbid(unsafe_code)]

pub mod document;
pub mod encrypt;
pub mod error;
pub mod font;
pub mod graph;
pub mod metadata;
pub mod object;
pub mod primitive;
pub mod section;
pub mod serialize;
pub mod stream;
pub mod version;
pub mod writer;
pub mod xref;

pub(crate) mod util;

pub use document::Document;
pub use error::{FolioError, FolioResult};
pub use graph::ObjectGraph;
pub use object::{Dict, Name, Object, Payload, Real, Ref, Str};
pub use serialize::SerializeSettings;
pub use stream::{Compressor, Deflate, Stream, StreamEncoding, StreamFilter};
pub use version::PdfVersion;

#[cfg(test)]
mod tests;
