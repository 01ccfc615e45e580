//! Streams and their encoding.
//!
//! A [`Stream`] is a dictionary plus a raw payload. When a graph is flushed,
//! each stream's payload is run through the filters its [`StreamEncoding`]
//! asks for, and the dictionary is completed with the matching `/Filter`
//! and `/Length` entries.
//!
//! Compression itself is delegated to a [`Compressor`], so that you can plug
//! in your own implementation. [`Deflate`] is the default one.

use std::borrow::Cow;

use crate::error::{FolioError, FolioResult};
use crate::object::{Dict, Name, Object};
use crate::serialize::SerializeSettings;

/// An error raised by a [`Compressor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(pub String);

/// Something that can compress a byte payload into the zlib format
/// understood by `/FlateDecode`.
pub trait Compressor {
    /// Compress the data.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// The default compressor, based on `miniz_oxide`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Deflate {
    level: u8,
}

impl Deflate {
    /// Create a compressor with a specific level between 0 and 10.
    pub fn new(level: u8) -> Self {
        Self { level: level.min(10) }
    }
}

impl Default for Deflate {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl Compressor for Deflate {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(miniz_oxide::deflate::compress_to_vec_zlib(data, self.level))
    }
}

/// A filter a stream payload can be encoded with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StreamFilter {
    /// `/FlateDecode`
    Flate,
    /// `/ASCIIHexDecode`
    AsciiHex,
    /// `/DCTDecode`, only ever used for payloads that already are JPEG data.
    Dct,
}

impl StreamFilter {
    pub(crate) fn to_name(self) -> Name {
        match self {
            StreamFilter::Flate => Name::from("FlateDecode"),
            StreamFilter::AsciiHex => Name::from("ASCIIHexDecode"),
            StreamFilter::Dct => Name::from("DCTDecode"),
        }
    }

    pub(crate) fn is_binary(&self) -> bool {
        match self {
            StreamFilter::Flate => true,
            StreamFilter::AsciiHex => false,
            StreamFilter::Dct => true,
        }
    }
}

/// How the payload of a stream should be encoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum StreamEncoding {
    /// Compress if [`SerializeSettings::compress_streams`] is set.
    #[default]
    Auto,
    /// Always compress.
    Compressed,
    /// Never compress.
    Uncompressed,
    /// The payload is already encoded with the given filter. The filter is
    /// recorded, but not applied.
    PreEncoded(StreamFilter),
}

/// A stream object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stream {
    dict: Dict,
    data: Vec<u8>,
    encoding: StreamEncoding,
}

impl Stream {
    /// Create a new stream with an empty dictionary and the
    /// [`StreamEncoding::Auto`] policy.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            dict: Dict::new(),
            data: data.into(),
            encoding: StreamEncoding::Auto,
        }
    }

    /// Create a stream whose payload already is encoded with `filter`.
    pub fn pre_encoded(data: impl Into<Vec<u8>>, filter: StreamFilter) -> Self {
        Self::new(data).with_encoding(StreamEncoding::PreEncoded(filter))
    }

    /// Replace the dictionary of the stream.
    pub fn with_dict(mut self, dict: Dict) -> Self {
        self.dict = dict;
        self
    }

    /// Replace the encoding policy of the stream.
    pub fn with_encoding(mut self, encoding: StreamEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The dictionary of the stream.
    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    /// The dictionary of the stream, mutably.
    pub fn dict_mut(&mut self) -> &mut Dict {
        &mut self.dict
    }

    /// The raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The encoding policy.
    pub fn encoding(&self) -> StreamEncoding {
        self.encoding
    }

    /// Change the encoding policy.
    pub fn set_encoding(&mut self, encoding: StreamEncoding) {
        self.encoding = encoding;
    }

    /// Encode the stream according to its policy and the settings.
    pub(crate) fn encode(
        &self,
        settings: &SerializeSettings,
        compressor: &dyn Compressor,
    ) -> FolioResult<(Dict, Vec<u8>)> {
        let mut builder = FilterStreamBuilder::empty(&self.data);

        match self.encoding {
            StreamEncoding::Auto if settings.compress_streams => builder.add_flate(compressor)?,
            StreamEncoding::Compressed => builder.add_flate(compressor)?,
            StreamEncoding::PreEncoded(filter) => builder.add_unapplied_filter(filter),
            StreamEncoding::Auto | StreamEncoding::Uncompressed => {}
        }

        Ok(builder
            .finish(settings.ascii_compatible)
            .into_parts(self.dict.clone()))
    }
}

/// Encode a raw payload.
///
/// If `compress` is set, the payload is compressed and `/FlateDecode` is
/// recorded in front of any filter the dictionary already lists. If `ascii`
/// is set, binary output is additionally hex encoded. In all cases `/Length`
/// is set to the length of the returned bytes.
pub fn encode_stream(
    dict: &Dict,
    raw: &[u8],
    compress: bool,
    ascii: bool,
    compressor: &dyn Compressor,
) -> FolioResult<(Dict, Vec<u8>)> {
    let mut builder = FilterStreamBuilder::empty(raw);

    if compress {
        builder.add_flate(compressor)?;
    }

    Ok(builder.finish(ascii).into_parts(dict.clone()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StreamFilters {
    None,
    Single(StreamFilter),
    Multiple(Vec<StreamFilter>),
}

impl StreamFilters {
    fn add(&mut self, stream_filter: StreamFilter) {
        match self {
            StreamFilters::None => *self = StreamFilters::Single(stream_filter),
            StreamFilters::Single(cur) => {
                *self = StreamFilters::Multiple(vec![*cur, stream_filter])
            }
            StreamFilters::Multiple(cur) => cur.push(stream_filter),
        }
    }

    fn is_binary(&self) -> bool {
        match self {
            StreamFilters::None => false,
            StreamFilters::Single(s) => s.is_binary(),
            StreamFilters::Multiple(m) => m.last().is_some_and(|f| f.is_binary()),
        }
    }

    /// The names of the filters, in the order a reader has to decode them.
    fn decode_order(&self) -> Vec<Name> {
        match self {
            StreamFilters::None => vec![],
            StreamFilters::Single(filter) => vec![filter.to_name()],
            StreamFilters::Multiple(filters) => filters.iter().rev().map(|f| f.to_name()).collect(),
        }
    }
}

struct FilterStreamBuilder<'a> {
    content: Cow<'a, [u8]>,
    filters: StreamFilters,
}

impl<'a> FilterStreamBuilder<'a> {
    fn empty(content: &'a [u8]) -> Self {
        Self {
            content: Cow::Borrowed(content),
            filters: StreamFilters::None,
        }
    }

    fn finish(mut self, ascii_compatible: bool) -> FilterStream<'a> {
        if ascii_compatible && self.filters.is_binary() {
            self.content = Cow::Owned(hex_encode(&self.content));
            self.filters.add(StreamFilter::AsciiHex);
        }

        FilterStream {
            content: self.content,
            filters: self.filters,
        }
    }

    fn add_flate(&mut self, compressor: &dyn Compressor) -> FolioResult<()> {
        let compressed = compressor
            .compress(&self.content)
            .map_err(|e| FolioError::CodecFailure {
                object: None,
                message: e.to_string(),
            })?;
        self.content = Cow::Owned(compressed);
        self.filters.add(StreamFilter::Flate);

        Ok(())
    }

    fn add_unapplied_filter(&mut self, filter: StreamFilter) {
        self.filters.add(filter);
    }
}

struct FilterStream<'a> {
    content: Cow<'a, [u8]>,
    filters: StreamFilters,
}

impl FilterStream<'_> {
    fn into_parts(self, mut dict: Dict) -> (Dict, Vec<u8>) {
        let mut names = self
            .filters
            .decode_order()
            .into_iter()
            .map(Object::Name)
            .collect::<Vec<_>>();

        if !names.is_empty() {
            match dict.remove("Filter") {
                Some(Object::Array(existing)) => names.extend(existing),
                Some(existing) => names.push(existing),
                None => {}
            }

            if names.len() == 1 {
                dict.insert("Filter", names.remove(0));
            } else {
                dict.insert("Filter", names);
            }
        }

        let content = self.content.into_owned();
        dict.insert("Length", content.len());

        (dict, content)
    }
}

fn hex_encode(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(index, byte)| {
            let mut formatted = format!("{:02X}", byte);
            if index % 35 == 34 {
                formatted.push('\n');
            }
            formatted
        })
        .collect::<String>()
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Compressor for Failing {
        fn compress(&self, _: &[u8]) -> Result<Vec<u8>, CodecError> {
            Err(CodecError("out of memory".to_string()))
        }
    }

    fn name(n: &str) -> Object {
        Object::Name(Name::from(n))
    }

    #[test]
    fn uncompressed_sets_length() {
        let (dict, data) =
            encode_stream(&Dict::new(), b"BT ET", false, false, &Deflate::default()).unwrap();

        assert_eq!(data, b"BT ET");
        assert_eq!(dict.get("Length"), Some(&Object::Integer(5)));
        assert_eq!(dict.get("Filter"), None);
    }

    #[test]
    fn compressed_records_filter() {
        let raw = b"BT /F1 12 Tf (Hello World) Tj ET".repeat(10);
        let (dict, data) =
            encode_stream(&Dict::new(), &raw, true, false, &Deflate::default()).unwrap();

        assert_eq!(dict.get("Filter"), Some(&name("FlateDecode")));
        assert_eq!(dict.get("Length"), Some(&Object::Integer(data.len() as i64)));
        assert_eq!(miniz_oxide::inflate::decompress_to_vec_zlib(&data).unwrap(), raw);
    }

    #[test]
    fn flate_is_prepended_to_existing_filter() {
        let mut dict = Dict::new();
        dict.insert("Filter", Name::from("DCTDecode"));
        let (dict, _) = encode_stream(&dict, b"jpeg", true, false, &Deflate::default()).unwrap();

        assert_eq!(
            dict.get("Filter"),
            Some(&Object::Array(vec![name("FlateDecode"), name("DCTDecode")]))
        );
    }

    #[test]
    fn ascii_compatible_hex_encodes_binary_output() {
        let (dict, data) =
            encode_stream(&Dict::new(), b"abc", true, true, &Deflate::default()).unwrap();

        assert_eq!(
            dict.get("Filter"),
            Some(&Object::Array(vec![name("ASCIIHexDecode"), name("FlateDecode")]))
        );
        assert!(data.iter().all(|b| b.is_ascii_hexdigit() || *b == b'\n'));
    }

    #[test]
    fn ascii_compatible_leaves_plain_text_alone() {
        let (dict, data) =
            encode_stream(&Dict::new(), b"abc", false, true, &Deflate::default()).unwrap();

        assert_eq!(data, b"abc");
        assert_eq!(dict.get("Filter"), None);
    }

    #[test]
    fn codec_failure_is_reported() {
        let result = encode_stream(&Dict::new(), b"abc", true, false, &Failing);

        assert!(matches!(
            result,
            Err(FolioError::CodecFailure { object: None, ref message }) if message == "out of memory"
        ));
    }

    #[test]
    fn pre_encoded_is_not_applied() {
        let stream = Stream::pre_encoded(vec![0xFF, 0xD8], StreamFilter::Dct);
        let (dict, data) = stream
            .encode(&SerializeSettings::default(), &Deflate::default())
            .unwrap();

        assert_eq!(data, vec![0xFF, 0xD8]);
        assert_eq!(dict.get("Filter"), Some(&name("DCTDecode")));
    }

    #[test]
    fn hex_wraps_lines() {
        let encoded = hex_encode(&[0xAB; 36]);
        assert_eq!(encoded.len(), 36 * 2 + 1);
        assert_eq!(encoded[70], b'\n');
    }
}
