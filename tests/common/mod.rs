#![allow(dead_code)]

use std::io::Read;
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use folio::font::{FontRegistry, InMemoryResources};
use folio::serialize::SerializeSettings;
use folio::version::PdfVersion;
use folio::{Dict, Name, Object, ObjectGraph, Ref, Stream};

/// A cross-reference entry as read back from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Free { next: u64, generation: u16 },
    InUse { offset: u64, generation: u16 },
}

pub fn settings_1() -> SerializeSettings {
    SerializeSettings {
        compress_streams: false,
        xref_stream: false,
        ascii_compatible: true,
        file_id: false,
        pdf_version: PdfVersion::Pdf17,
    }
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}

fn parse_number(bytes: &[u8]) -> u64 {
    let digits = bytes
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .copied()
        .collect::<Vec<_>>();
    std::str::from_utf8(&digits).unwrap().parse().unwrap()
}

/// The offset stored after the last `startxref`.
pub fn startxref(pdf: &[u8]) -> usize {
    let pos = rfind(pdf, b"startxref\n").unwrap();
    parse_number(&pdf[pos + 10..]) as usize
}

/// Read a classic cross-reference table.
pub fn read_xref_table(pdf: &[u8]) -> Vec<Entry> {
    let start = startxref(pdf);
    assert!(pdf[start..].starts_with(b"xref\n0 "));

    let count = parse_number(&pdf[start + 7..]) as usize;
    let records = start + find(&pdf[start..], b"\n").unwrap() + 1;
    let records = records + find(&pdf[records..], b"\n").unwrap() + 1;

    (0..count)
        .map(|i| {
            let record = &pdf[records + 20 * i..records + 20 * (i + 1)];
            assert_eq!(&record[18..], b"\r\n");

            let field = parse_number(&record[..10]);
            let generation = parse_number(&record[11..16]) as u16;
            match record[17] {
                b'n' => Entry::InUse { offset: field, generation },
                b'f' => Entry::Free { next: field, generation },
                other => panic!("invalid record type {}", other as char),
            }
        })
        .collect()
}

/// The bytes from `offset` up to and including the next `endobj`.
pub fn object_at(pdf: &[u8], offset: u64) -> &[u8] {
    let offset = offset as usize;
    let end = find(&pdf[offset..], b"endobj").unwrap();
    &pdf[offset..offset + end + 6]
}

/// The integer value of `key` in the first dictionary of `object`.
pub fn dict_integer(object: &[u8], key: &str) -> u64 {
    let needle = format!("/{key} ");
    let pos = find(object, needle.as_bytes()).unwrap();
    parse_number(&object[pos + needle.len()..])
}

/// The raw stream data of `object`, using its `/Length`.
pub fn stream_data(object: &[u8]) -> &[u8] {
    let length = dict_integer(object, "Length") as usize;
    let start = find(object, b"\nstream\n").unwrap() + 8;
    let data = &object[start..start + length];
    assert!(object[start + length..].starts_with(b"\nendstream\n"));
    data
}

pub fn inflate(data: &[u8]) -> Vec<u8> {
    let mut decoded = vec![];
    ZlibDecoder::new(data).read_to_end(&mut decoded).unwrap();
    decoded
}

/// Read a cross-reference stream.
pub fn read_xref_stream(pdf: &[u8]) -> Vec<Entry> {
    let object = object_at(pdf, startxref(pdf) as u64);
    assert!(find(object, b"/Type /XRef").is_some());

    let w = find(object, b"/W [1 ").unwrap();
    let width = parse_number(&object[w + 6..]) as usize;
    let data = inflate(stream_data(object));
    assert_eq!(data.len() % (3 + width), 0);

    data.chunks_exact(3 + width)
        .map(|row| {
            let field = row[1..1 + width]
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            let generation = u16::from_be_bytes([row[1 + width], row[2 + width]]);
            match row[0] {
                0 => Entry::Free { next: field, generation },
                1 => Entry::InUse { offset: field, generation },
                other => panic!("invalid entry type {other}"),
            }
        })
        .collect()
}

/// Check that every in-use entry points to the start of its object.
pub fn check_offsets(pdf: &[u8], entries: &[Entry]) {
    for (number, entry) in entries.iter().enumerate() {
        if let Entry::InUse { offset, generation } = entry {
            let header = format!("{number} {generation} obj\n");
            assert!(
                pdf[*offset as usize..].starts_with(header.as_bytes()),
                "object {number} is not at offset {offset}"
            );
        }
    }
}

/// Register a one-page "Hello World" document and return its catalog.
pub fn hello_world(graph: &mut ObjectGraph) -> Ref {
    let pages = graph.reserve().unwrap();
    let catalog = graph
        .register(Dict::with_type("Catalog").pair("Pages", pages).clone())
        .unwrap();
    let font = graph
        .register(
            Dict::with_type("Font")
                .pair("Subtype", Name::from("Type1"))
                .pair("BaseFont", Name::from("Helvetica"))
                .clone(),
        )
        .unwrap();
    let content = graph
        .register(Stream::new(HELLO_WORLD.to_vec()))
        .unwrap();

    let mut fonts = Dict::new();
    fonts.insert("F1", font);
    let mut resources = Dict::new();
    resources.insert("Font", fonts);

    let page = graph
        .register(
            Dict::with_type("Page")
                .pair("Parent", pages)
                .pair(
                    "MediaBox",
                    vec![
                        Object::from(0),
                        Object::from(0),
                        Object::from(595),
                        Object::from(842),
                    ],
                )
                .pair("Resources", resources)
                .pair("Contents", content)
                .clone(),
        )
        .unwrap();

    graph
        .register_at(
            pages,
            Dict::with_type("Pages")
                .pair("Kids", vec![Object::Ref(page)])
                .pair("Count", 1)
                .clone(),
        )
        .unwrap();

    catalog
}

pub const HELLO_WORLD: &[u8] = b"BT /F1 24 Tf 72 720 Td (Hello World) Tj ET";

/// A registry with a single Japanese font.
pub fn registry() -> Arc<FontRegistry> {
    let mut cid_to_unicode = vec![0; 0x10000];
    cid_to_unicode[1] = 0x20;
    cid_to_unicode[843] = 0x65E5;

    let mut unicode_to_cid = vec![0; 0x10000];
    unicode_to_cid[0x20] = 1;
    unicode_to_cid[0x65E5] = 843;

    let record = folio::font::parse_record(
        "Ascent=880\n\
         CapHeight=880\n\
         Descent=-120\n\
         Flags=6\n\
         FontBBox=[-25 -254 1000 880]\n\
         ItalicAngle=0\n\
         StemV=93\n\
         Panose=010502020400000000000\n\
         Registry=Adobe\n\
         Ordering=Japan1\n\
         Supplement=2\n\
         W=1 278 843 1000\n\
         W2=843 1000\n",
    );

    let mut resources = InMemoryResources::new();
    resources
        .add_font("HeiseiMin-W3", "UniJIS-UCS2-_UniJIS-UCS2-H_UniJIS-UCS2-V_")
        .add_encoding("UniJIS-UCS2-H", "UniJIS-UCS2-H")
        .add_encoding("UniJIS-UCS2-V", "UniJIS-UCS2-H")
        .add_font_record("HeiseiMin-W3", record)
        .add_code_mapping("UniJIS-UCS2-", cid_to_unicode)
        .add_code_mapping("UniJIS-UCS2-H", unicode_to_cid);

    Arc::new(FontRegistry::new(resources))
}
