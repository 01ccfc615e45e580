use std::collections::{BTreeMap, HashMap};
use std::io;

/// The number of entries of a code mapping.
pub const CODE_MAPPING_LEN: usize = 0x10000;

/// A source of the descriptions that CJK fonts are built from.
///
/// The descriptions usually live in resource files shipped alongside the
/// application. folio doesn't care where they come from, it only reads them
/// through this trait.
pub trait FontResources: Send + Sync {
    /// The encoding entry of a font, in the form
    /// `<cid-mapping>_<encoding1>_<encoding2>_...`.
    fn font_encodings(&self, font: &str) -> Option<String>;

    /// The mapping entry of a non-identity encoding: the name of a code
    /// mapping, optionally followed by the name of a second mapping that
    /// overrides it.
    fn encoding_mapping(&self, encoding: &str) -> Option<String>;

    /// The metric record of a font.
    fn font_record(&self, font: &str) -> Option<BTreeMap<String, String>>;

    /// Load a code mapping with [`CODE_MAPPING_LEN`] entries. A missing
    /// mapping is reported with [`io::ErrorKind::NotFound`].
    fn load_code_mapping(&self, name: &str) -> io::Result<Vec<u16>>;
}

/// Font resources held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResources {
    fonts: HashMap<String, String>,
    encodings: HashMap<String, String>,
    records: HashMap<String, BTreeMap<String, String>>,
    mappings: HashMap<String, Vec<u16>>,
}

impl InMemoryResources {
    /// Create empty resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the encoding entry of a font.
    pub fn add_font(&mut self, font: &str, encodings: &str) -> &mut Self {
        self.fonts.insert(font.to_string(), encodings.to_string());
        self
    }

    /// Add the mapping entry of an encoding.
    pub fn add_encoding(&mut self, encoding: &str, mapping: &str) -> &mut Self {
        self.encodings.insert(encoding.to_string(), mapping.to_string());
        self
    }

    /// Add the metric record of a font.
    pub fn add_font_record(&mut self, font: &str, record: BTreeMap<String, String>) -> &mut Self {
        self.records.insert(font.to_string(), record);
        self
    }

    /// Add a code mapping. It is padded with zeros or truncated to
    /// [`CODE_MAPPING_LEN`] entries.
    pub fn add_code_mapping(&mut self, name: &str, mut mapping: Vec<u16>) -> &mut Self {
        mapping.resize(CODE_MAPPING_LEN, 0);
        self.mappings.insert(name.to_string(), mapping);
        self
    }
}

impl FontResources for InMemoryResources {
    fn font_encodings(&self, font: &str) -> Option<String> {
        self.fonts.get(font).cloned()
    }

    fn encoding_mapping(&self, encoding: &str) -> Option<String> {
        self.encodings.get(encoding).cloned()
    }

    fn font_record(&self, font: &str) -> Option<BTreeMap<String, String>> {
        self.records.get(font).cloned()
    }

    fn load_code_mapping(&self, name: &str) -> io::Result<Vec<u16>> {
        self.mappings.get(name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no code mapping named {name}"),
            )
        })
    }
}

/// Parse the binary form of a code mapping: [`CODE_MAPPING_LEN`]
/// big-endian 16-bit values.
pub fn parse_code_mapping(data: &[u8]) -> io::Result<Vec<u16>> {
    if data.len() < CODE_MAPPING_LEN * 2 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "code mapping is truncated",
        ));
    }

    Ok(data[..CODE_MAPPING_LEN * 2]
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect())
}

/// Parse simple `key=value` records, one entry per line. Empty lines and
/// lines starting with `#` or `!` are ignored.
pub fn parse_record(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let (key, value) = line.split_once(['=', ':'])?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
