//! CJK fonts.
//!
//! These fonts are not embedded. The PDF only names a font from one of the
//! Adobe character collections (like `Adobe-Japan1`), together with the
//! metrics of the glyphs that are actually used, and the viewer supplies the
//! outlines.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::debug;

use super::metrics::{FontDescriptorKey, FontMetrics};
use super::registry::FontRegistry;
use super::width::{compact_horizontal, compact_vertical};
use crate::error::{FolioError, FolioResult};
use crate::graph::ObjectGraph;
use crate::object::{Dict, Name, Object, Ref, Str};

const IDENTITY_H: &str = "Identity-H";
const IDENTITY_V: &str = "Identity-V";
const STYLES: [&str; 3] = [",BoldItalic", ",Bold", ",Italic"];

/// The width used for codes without a metric.
const DEFAULT_WIDTH: i32 = 1000;

/// A CID-keyed font from one of the CJK character collections.
#[derive(Debug, Clone)]
pub struct CjkFont {
    /// The font name without style.
    name: String,
    /// The style suffix, including the leading comma, or an empty string.
    style: String,
    /// The CMap, i.e. the encoding.
    cmap: String,
    /// Whether text is given as CIDs directly.
    cid_direct: bool,
    vertical: bool,
    /// For identity encodings the CID to Unicode mapping, otherwise the
    /// Unicode to CID mapping.
    translation: Arc<Vec<u16>>,
    metrics: Arc<FontMetrics>,
    /// The CIDs used so far.
    used: BTreeSet<u16>,
}

impl CjkFont {
    /// Create a new font. `font_name` may carry a `,Bold`, `,Italic` or
    /// `,BoldItalic` suffix.
    pub fn new(registry: &FontRegistry, font_name: &str, encoding: &str) -> FolioResult<Self> {
        let (name, style) = split_style(font_name);

        if !registry.is_cjk_font(name, encoding) {
            return Err(FolioError::UnsupportedFont {
                font: font_name.to_string(),
                encoding: encoding.to_string(),
            });
        }

        let cid_direct = encoding == IDENTITY_H || encoding == IDENTITY_V;
        let translation = if cid_direct {
            registry.cid_to_unicode(name)?
        } else {
            registry.encoding_table(encoding)?
        };
        let metrics = registry.metrics(name)?;

        debug!("created CJK font {font_name} with {encoding}");

        Ok(Self {
            name: name.to_string(),
            style: style.to_string(),
            cmap: encoding.to_string(),
            cid_direct,
            vertical: encoding.ends_with('V'),
            translation,
            metrics,
            used: BTreeSet::new(),
        })
    }

    /// The PostScript name of the font, without style.
    pub fn postscript_name(&self) -> &str {
        &self.name
    }

    /// The CMap of the font.
    pub fn cmap(&self) -> &str {
        &self.cmap
    }

    /// Whether the font is used for vertical writing.
    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    /// The metrics of the font.
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// The CIDs that have been used so far, in ascending order.
    pub fn used_cids(&self) -> &BTreeSet<u16> {
        &self.used
    }

    /// The CID shown for the code `c`.
    pub fn cid_code(&self, c: u16) -> u16 {
        if self.cid_direct {
            c
        } else {
            self.translation[usize::from(c)]
        }
    }

    /// The Unicode value of the code `c`.
    pub fn unicode_equivalent(&self, c: u16) -> u16 {
        if self.cid_direct {
            self.translation[usize::from(c)]
        } else {
            c
        }
    }

    /// Record the glyphs of `text` as used, and return the bytes that show
    /// `text` with this font in a content stream.
    pub fn encode_text(&mut self, text: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(text.len() * 2);

        for unit in text.encode_utf16() {
            self.used.insert(self.cid_code(unit));
            bytes.extend(unit.to_be_bytes());
        }

        bytes
    }

    /// The advance of `text` in font units, using 1000 for every code
    /// without a metric.
    pub fn width(&self, text: &str) -> i32 {
        let table = if self.vertical {
            &self.metrics.vertical_widths
        } else {
            &self.metrics.widths
        };

        text.encode_utf16()
            .map(|unit| match table.get(self.cid_code(unit)) {
                w if w > 0 => w,
                _ => DEFAULT_WIDTH,
            })
            .sum()
    }

    /// The value of `key` for a font size of `size`.
    pub fn font_descriptor(&self, key: FontDescriptorKey, size: f32) -> f32 {
        self.metrics.descriptor(key, size)
    }

    /// Register the font descriptor and the descendant font, and store the
    /// composite font under `type0_ref`, which must have been reserved.
    pub fn serialize(&self, graph: &mut ObjectGraph, type0_ref: Ref) -> FolioResult<()> {
        let descriptor_ref = graph.register(self.font_descriptor_dict())?;
        let cid_ref = graph.register(self.cid_font_dict(descriptor_ref))?;
        graph.register_at(type0_ref, self.type0_dict(cid_ref))?;

        debug!(
            "serialized {} with {} used CIDs",
            self.base_font(),
            self.used.len()
        );

        Ok(())
    }

    fn base_font(&self) -> String {
        format!("{}{}", self.name, self.style)
    }

    fn font_descriptor_dict(&self) -> Dict {
        let m = &self.metrics;

        let mut style = Dict::new();
        style.insert("Panose", Str::literal(m.panose.as_bytes()));

        let mut dict = Dict::with_type("FontDescriptor");
        dict.pair("Ascent", m.ascent)
            .pair("CapHeight", m.cap_height)
            .pair("Descent", m.descent)
            .pair("Flags", m.flags)
            .pair(
                "FontBBox",
                m.bbox.iter().map(|&v| Object::from(v)).collect::<Vec<_>>(),
            )
            .pair("FontName", Name::from(self.base_font()))
            .pair("ItalicAngle", m.italic_angle)
            .pair("StemV", m.stem_v)
            .pair("Style", style);

        dict
    }

    fn cid_font_dict(&self, descriptor_ref: Ref) -> Dict {
        let m = &self.metrics;

        let mut dict = Dict::with_type("Font");
        dict.pair("Subtype", Name::from("CIDFontType0"))
            .pair("BaseFont", Name::from(self.base_font()))
            .pair("FontDescriptor", descriptor_ref);

        if let Some(w) = compact_horizontal(&self.used, &m.widths) {
            dict.insert("W", Object::literal(w));
        }

        if self.vertical {
            if let Some(w2) = compact_vertical(&self.used, &m.vertical_widths, &m.widths) {
                dict.insert("W2", Object::literal(w2));
            }
        }

        let mut system_info = Dict::new();
        system_info
            .pair("Registry", Str::literal(m.registry.as_bytes()))
            .pair("Ordering", Str::literal(m.ordering.as_bytes()))
            .pair("Supplement", m.supplement);
        dict.insert("CIDSystemInfo", system_info);

        dict
    }

    fn type0_dict(&self, cid_ref: Ref) -> Dict {
        let mut name = self.name.clone();
        if let Some(style) = self.style.strip_prefix(',') {
            name.push('-');
            name.push_str(style);
        }
        name.push('-');
        name.push_str(&self.cmap);

        let mut dict = Dict::with_type("Font");
        dict.pair("Subtype", Name::from("Type0"))
            .pair("BaseFont", Name::from(name))
            .pair("Encoding", Name::from(self.cmap.as_str()))
            .pair("DescendantFonts", vec![Object::Ref(cid_ref)]);

        dict
    }
}

/// Split a font name into its base name and its style suffix.
fn split_style(font_name: &str) -> (&str, &str) {
    for style in STYLES {
        if let Some(name) = font_name.strip_suffix(style) {
            return (name, &font_name[name.len()..]);
        }
    }

    (font_name, "")
}
