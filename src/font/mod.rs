//! CID-keyed CJK fonts.
//!
//! A CJK font is described by a handful of resources: which encodings it
//! supports, how codes of an encoding map to CIDs, and the metric record with
//! the glyph widths. These are read through [`FontResources`] and cached in a
//! [`FontRegistry`], which can be shared by any number of documents.
//!
//! A [`CjkFont`] records which CIDs are used while text is encoded with it.
//! When it is serialized, it writes three objects: the font descriptor, the
//! descendant CID font with its compacted width arrays, and the composite
//! `Type0` font that content streams refer to.

mod cid_font;
mod metrics;
mod registry;
mod resources;
mod width;

pub use cid_font::CjkFont;
pub use metrics::{FontDescriptorKey, FontMetrics, WidthTable};
pub use registry::FontRegistry;
pub use resources::{
    parse_code_mapping, parse_record, FontResources, InMemoryResources, CODE_MAPPING_LEN,
};
pub use width::{compact_horizontal, compact_vertical};
