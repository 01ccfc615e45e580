use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{FolioError, FolioResult};

/// A mapping from code to advance width.
///
/// A width of 0 means that the code has no metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidthTable {
    widths: BTreeMap<u16, i32>,
}

impl WidthTable {
    /// Parse a table from whitespace-separated `code width` pairs.
    pub fn parse(text: &str) -> Option<Self> {
        let mut widths = BTreeMap::new();
        let mut tokens = text.split_whitespace();

        while let Some(code) = tokens.next() {
            let width = tokens.next()?;
            widths.insert(code.parse().ok()?, width.parse().ok()?);
        }

        Some(Self { widths })
    }

    /// The width of `code`, or 0 if it has none.
    pub fn get(&self, code: u16) -> i32 {
        self.widths.get(&code).copied().unwrap_or(0)
    }

    /// All codes of the table, in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.widths.keys().copied()
    }

    /// The number of codes in the table.
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    /// Whether the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}

impl FromIterator<(u16, i32)> for WidthTable {
    fn from_iter<T: IntoIterator<Item = (u16, i32)>>(iter: T) -> Self {
        Self {
            widths: iter.into_iter().collect(),
        }
    }
}

/// The parsed metric record of a CJK font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontMetrics {
    /// The ascent, in font units.
    pub ascent: i32,
    /// The cap height, in font units.
    pub cap_height: i32,
    /// The descent, in font units.
    pub descent: i32,
    /// The font flags.
    pub flags: i32,
    /// The bounding box as `[llx lly urx ury]`.
    pub bbox: [i32; 4],
    /// The italic angle, in degrees.
    pub italic_angle: i32,
    /// The vertical stem width.
    pub stem_v: i32,
    /// The raw panose classification.
    pub panose: String,
    /// The registry of the character collection.
    pub registry: String,
    /// The ordering of the character collection.
    pub ordering: String,
    /// The supplement of the character collection.
    pub supplement: i32,
    /// The horizontal widths, by CID.
    pub widths: WidthTable,
    /// The vertical metrics, by CID. Empty for fonts without vertical
    /// writing support.
    pub vertical_widths: WidthTable,
}

impl FontMetrics {
    /// Parse the metric record of `font`.
    pub fn parse(font: &str, record: &BTreeMap<String, String>) -> FolioResult<Self> {
        let text = |name: &str| field(font, record, name);
        let number = |name: &str| -> FolioResult<i32> { parse_field(font, name, text(name)?) };

        let bbox_text = text("FontBBox")?;
        let mut bbox = [0; 4];
        let mut parts = bbox_text
            .split(|c: char| c == '[' || c == ']' || c.is_whitespace())
            .filter(|s| !s.is_empty());
        for value in bbox.iter_mut() {
            *value = parse_field(font, "FontBBox", parts.next().unwrap_or(""))?;
        }

        let widths = WidthTable::parse(text("W")?).ok_or_else(|| malformed(font, "W"))?;
        let vertical_widths = match record.get("W2") {
            Some(text) => WidthTable::parse(text).ok_or_else(|| malformed(font, "W2"))?,
            None => WidthTable::default(),
        };

        Ok(Self {
            ascent: number("Ascent")?,
            cap_height: number("CapHeight")?,
            descent: number("Descent")?,
            flags: number("Flags")?,
            bbox,
            italic_angle: number("ItalicAngle")?,
            stem_v: number("StemV")?,
            panose: text("Panose")?.to_string(),
            registry: text("Registry")?.to_string(),
            ordering: text("Ordering")?.to_string(),
            supplement: number("Supplement")?,
            widths,
            vertical_widths,
        })
    }

    /// The value of `key` for a font size of `size`.
    pub fn descriptor(&self, key: FontDescriptorKey, size: f32) -> f32 {
        let scaled = |units: i32| units as f32 * size / 1000.0;

        match key {
            FontDescriptorKey::Ascent => scaled(self.ascent),
            FontDescriptorKey::CapHeight => scaled(self.cap_height),
            FontDescriptorKey::Descent => scaled(self.descent),
            FontDescriptorKey::ItalicAngle => self.italic_angle as f32,
            FontDescriptorKey::BBoxLowerLeftX => scaled(self.bbox[0]),
            FontDescriptorKey::BBoxLowerLeftY => scaled(self.bbox[1]),
            FontDescriptorKey::BBoxUpperRightX => scaled(self.bbox[2]),
            FontDescriptorKey::BBoxUpperRightY => scaled(self.bbox[3]),
            FontDescriptorKey::MaxAdvance => scaled(self.bbox[2] - self.bbox[0]),
        }
    }
}

fn field<'a>(
    font: &str,
    record: &'a BTreeMap<String, String>,
    name: &str,
) -> FolioResult<&'a str> {
    record
        .get(name)
        .map(|s| s.trim())
        .ok_or_else(|| malformed(font, name))
}

fn parse_field<T: FromStr>(font: &str, name: &str, value: &str) -> FolioResult<T> {
    value.parse().map_err(|_| malformed(font, name))
}

fn malformed(font: &str, field: &str) -> FolioError {
    FolioError::MalformedMetricRecord {
        font: font.to_string(),
        field: field.to_string(),
    }
}

/// A metric of a font that can be queried for a specific size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FontDescriptorKey {
    /// The ascent.
    Ascent,
    /// The cap height.
    CapHeight,
    /// The descent, usually negative.
    Descent,
    /// The italic angle, in degrees. Doesn't depend on the size.
    ItalicAngle,
    /// The lower left x coordinate of the bounding box.
    BBoxLowerLeftX,
    /// The lower left y coordinate of the bounding box.
    BBoxLowerLeftY,
    /// The upper right x coordinate of the bounding box.
    BBoxUpperRightX,
    /// The upper right y coordinate of the bounding box.
    BBoxUpperRightY,
    /// The width of the bounding box.
    MaxAdvance,
}
