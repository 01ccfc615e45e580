//! The cross-reference section and the trailer.
//!
//! A reader locates objects through the cross-reference section, which maps
//! every object number to the byte offset of the object. It can be written
//! either as a classic, fixed-width text table or as a compressed
//! cross-reference stream.

use std::io::Write;

use crate::error::{FolioError, FolioResult};
use crate::object::{Dict, Name, Object, Ref, Str};
use crate::primitive::{write_indirect_stream, Primitive};
use crate::serialize::SerializeSettings;
use crate::stream::{encode_stream, Compressor};
use crate::writer::OutputWriter;

/// The generation of the head of the free list.
const FREE_HEAD_GENERATION: u16 = 65535;

/// The largest offset that fits into the ten digits of a table record.
const MAX_TABLE_OFFSET: u64 = 9_999_999_999;

/// An entry of the cross-reference section.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum XrefEntry {
    /// The object number is not in use.
    Free {
        /// The next free object number, or 0 for the end of the list.
        next: u32,
        /// The generation to use if the number is reused.
        generation: u16,
    },
    /// The object is stored at the given offset.
    InUse {
        /// The byte offset of the object.
        offset: u64,
        /// The generation of the object.
        generation: u16,
    },
}

impl XrefEntry {
    fn write_record(&self, buf: &mut Vec<u8>) {
        let record = match self {
            XrefEntry::Free { next, generation } => format!("{next:010} {generation:05} f\r\n"),
            XrefEntry::InUse { offset, generation } => {
                format!("{offset:010} {generation:05} n\r\n")
            }
        };
        buf.extend_from_slice(record.as_bytes());
    }

    fn fields(&self) -> (u8, u64, u16) {
        match *self {
            XrefEntry::Free { next, generation } => (0, u64::from(next), generation),
            XrefEntry::InUse { offset, generation } => (1, offset, generation),
        }
    }
}

/// Collects object offsets in write order.
#[derive(Debug, Clone)]
pub struct XrefBuilder {
    offsets: Vec<Option<(u64, u16)>>,
}

impl XrefBuilder {
    /// Create a builder for the object numbers `0..size`.
    pub fn new(size: u32) -> Self {
        Self {
            offsets: vec![None; size.max(1) as usize],
        }
    }

    /// The number of entries, including entry 0.
    pub fn size(&self) -> u32 {
        self.offsets.len() as u32
    }

    /// Record that the object `r` starts at `offset`.
    pub fn record(&mut self, r: Ref, offset: u64) {
        let index = r.get() as usize;
        if index == 0 {
            return;
        }

        if index >= self.offsets.len() {
            self.offsets.resize(index + 1, None);
        }

        self.offsets[index] = Some((offset, r.generation()));
    }

    /// Produce the final entries. Every number that was never recorded
    /// becomes part of the free list, which is headed by entry 0.
    pub fn finish(&self) -> Vec<XrefEntry> {
        let free = self
            .offsets
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, o)| o.is_none())
            .map(|(i, _)| i as u32)
            .collect::<Vec<_>>();
        let mut free_iter = free.iter().copied().skip(1).chain(std::iter::once(0));

        let mut entries = Vec::with_capacity(self.offsets.len());
        entries.push(XrefEntry::Free {
            next: free.first().copied().unwrap_or(0),
            generation: FREE_HEAD_GENERATION,
        });

        for slot in self.offsets.iter().skip(1) {
            entries.push(match slot {
                Some((offset, generation)) => XrefEntry::InUse {
                    offset: *offset,
                    generation: *generation,
                },
                None => XrefEntry::Free {
                    next: free_iter.next().unwrap_or(0),
                    generation: 0,
                },
            });
        }

        entries
    }
}

/// The trailer of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// The document catalog.
    pub root: Ref,
    /// The document information dictionary.
    pub info: Option<Ref>,
    /// The encryption dictionary.
    pub encrypt: Option<Ref>,
    /// The file identifier. If it is absent and the settings ask for one, it
    /// is derived from the written content.
    pub id: Option<(Vec<u8>, Vec<u8>)>,
    /// The offset of the previous cross-reference section. `None` if this is
    /// the only one, in which case no `/Prev` entry is written.
    pub prev: Option<u64>,
}

impl Trailer {
    /// Create a trailer that only points to the catalog.
    pub fn new(root: Ref) -> Self {
        Self {
            root,
            info: None,
            encrypt: None,
            id: None,
            prev: None,
        }
    }

    /// All references the trailer points to.
    pub(crate) fn refs(&self) -> impl Iterator<Item = Ref> {
        std::iter::once(self.root)
            .chain(self.info)
            .chain(self.encrypt)
    }

    pub(crate) fn to_dict(&self, size: u32) -> Dict {
        let mut dict = Dict::new();
        dict.insert("Size", size);
        dict.insert("Root", self.root);

        if let Some(info) = self.info {
            dict.insert("Info", info);
        }

        if let Some(encrypt) = self.encrypt {
            dict.insert("Encrypt", encrypt);
        }

        if let Some((first, second)) = &self.id {
            dict.insert(
                "ID",
                vec![
                    Object::String(Str::literal(first.clone())),
                    Object::String(Str::literal(second.clone())),
                ],
            );
        }

        if let Some(prev) = self.prev {
            dict.insert("Prev", prev as i64);
        }

        dict
    }
}

/// Write a classic cross-reference table followed by the trailer.
pub(crate) fn write_xref_table<W: Write>(
    entries: &[XrefEntry],
    trailer: &Trailer,
    writer: &mut OutputWriter<W>,
) -> FolioResult<()> {
    for (number, entry) in entries.iter().enumerate() {
        if let XrefEntry::InUse { offset, generation } = *entry {
            if offset > MAX_TABLE_OFFSET {
                return Err(FolioError::OffsetTooLarge {
                    object: Ref::with_generation(number as u32, generation),
                    offset,
                });
            }
        }
    }

    let start = writer.current_offset();

    let mut buf = Vec::with_capacity(20 * entries.len() + 64);
    buf.extend_from_slice(format!("xref\n0 {}\n", entries.len()).as_bytes());
    for entry in entries {
        entry.write_record(&mut buf);
    }

    buf.extend_from_slice(b"trailer\n");
    trailer.to_dict(entries.len() as u32).write(&mut buf);
    buf.extend_from_slice(format!("\nstartxref\n{start}\n%%EOF\n").as_bytes());

    writer.write(&buf)
}

/// Write a cross-reference stream as the object `own`, which must be the
/// highest object number of the file.
pub(crate) fn write_xref_stream<W: Write>(
    mut builder: XrefBuilder,
    own: Ref,
    trailer: &Trailer,
    writer: &mut OutputWriter<W>,
    settings: &SerializeSettings,
    compressor: &dyn Compressor,
) -> FolioResult<()> {
    let start = writer.current_offset();
    builder.record(own, start);
    let entries = builder.finish();

    let max_field = entries.iter().map(|e| e.fields().1).max().unwrap_or(0);
    let width = field_width(max_field);

    let mut data = Vec::with_capacity(entries.len() * (3 + width));
    for entry in &entries {
        let (ty, field, generation) = entry.fields();
        data.push(ty);
        data.extend_from_slice(&field.to_be_bytes()[8 - width..]);
        data.extend_from_slice(&generation.to_be_bytes());
    }

    let mut dict = Dict::new();
    dict.insert("Type", Name::from("XRef"));
    for (key, value) in trailer.to_dict(entries.len() as u32).iter() {
        dict.insert(key.clone(), value.clone());
    }
    dict.insert("Index", vec![Object::Integer(0), Object::from(entries.len())]);
    dict.insert(
        "W",
        vec![Object::Integer(1), Object::from(width), Object::Integer(2)],
    );

    let (dict, data) = encode_stream(
        &dict,
        &data,
        true,
        settings.ascii_compatible,
        compressor,
    )
    .map_err(|e| e.for_object(own))?;

    let mut buf = vec![];
    write_indirect_stream(own, &dict, &data, &mut buf);
    buf.extend_from_slice(format!("startxref\n{start}\n%%EOF\n").as_bytes());

    writer.write(&buf)
}

/// The number of bytes needed to store `value`, at least 1.
fn field_width(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}
