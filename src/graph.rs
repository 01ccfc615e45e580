//! The object graph.
//!
//! An [`ObjectGraph`] owns every indirect object of a document. Objects refer
//! to each other by [`Ref`], and references may point forward: you can
//! [`reserve`](ObjectGraph::reserve) an identity, use it anywhere, and supply
//! the payload later with [`register_at`](ObjectGraph::register_at). Only when
//! the graph is [flushed](ObjectGraph::flush) does every reference need to
//! resolve.
//!
//! Flushing writes the whole file: the header, all objects in ascending
//! order, the cross-reference section and the trailer. All validation and
//! stream encoding happens before the first byte is written, so a failed
//! flush never leaves a half-written file behind because of a dangling
//! reference or a failing compressor.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use log::{debug, trace};

use crate::encrypt::{encrypt_dict_strings, encrypt_strings, Encryptor};
use crate::error::{FolioError, FolioResult};
use crate::object::{Payload, Ref};
use crate::primitive::{write_indirect_object, write_indirect_stream};
use crate::serialize::SerializeSettings;
use crate::stream::Compressor;
use crate::util::{base64_hash, sip_hash_all, SipHashable};
use crate::writer::OutputWriter;
use crate::xref::{write_xref_stream, write_xref_table, Trailer, XrefBuilder};

/// The highest object number a PDF file may contain.
pub const MAX_OBJECT_NUMBER: u32 = 8_388_607;

/// A collection of indirect objects, keyed by their reference.
#[derive(Debug)]
pub struct ObjectGraph {
    objects: BTreeMap<Ref, Payload>,
    cached: HashMap<u128, Ref>,
    next: u32,
}

impl Default for ObjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectGraph {
    /// Create an empty graph. The first allocated identity is 1.
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            cached: HashMap::new(),
            next: 1,
        }
    }

    /// Allocate a new identity without a payload.
    pub fn reserve(&mut self) -> FolioResult<Ref> {
        if self.next > MAX_OBJECT_NUMBER {
            return Err(FolioError::IdentitySpaceExhausted);
        }

        let r = Ref::new(self.next);
        self.next += 1;

        Ok(r)
    }

    /// Allocate a new identity and store `payload` under it.
    pub fn register(&mut self, payload: impl Into<Payload>) -> FolioResult<Ref> {
        let r = self.reserve()?;
        self.objects.insert(r, payload.into());

        Ok(r)
    }

    /// Store `payload` under an identity previously returned by
    /// [`ObjectGraph::reserve`].
    pub fn register_at(&mut self, r: Ref, payload: impl Into<Payload>) -> FolioResult<()> {
        if !self.is_allocated(r) {
            return Err(FolioError::DanglingReference {
                target: r,
                referrer: None,
            });
        }

        if self.objects.contains_key(&r) {
            return Err(FolioError::AlreadyRegistered(r));
        }

        self.objects.insert(r, payload.into());

        Ok(())
    }

    /// Register `payload`, reusing the identity of an identical payload that
    /// was registered the same way before.
    pub fn register_cached(&mut self, payload: impl Into<Payload>) -> FolioResult<Ref> {
        let payload = payload.into();
        let hash = payload.sip_hash();

        if let Some(r) = self.cached.get(&hash) {
            return Ok(*r);
        }

        let r = self.register(payload)?;
        self.cached.insert(hash, r);

        Ok(r)
    }

    /// Look up the payload of `r`.
    pub fn resolve(&self, r: Ref) -> FolioResult<&Payload> {
        self.objects.get(&r).ok_or(FolioError::DanglingReference {
            target: r,
            referrer: None,
        })
    }

    /// Look up the payload of `r` mutably, for example to change the
    /// encoding of a stream after a failed flush.
    pub fn resolve_mut(&mut self, r: Ref) -> FolioResult<&mut Payload> {
        self.objects.get_mut(&r).ok_or(FolioError::DanglingReference {
            target: r,
            referrer: None,
        })
    }

    /// Whether a payload is stored under `r`.
    pub fn is_registered(&self, r: Ref) -> bool {
        self.objects.contains_key(&r)
    }

    /// The number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The number of allocated identities, registered or not.
    pub fn allocated(&self) -> u32 {
        self.next - 1
    }

    fn is_allocated(&self, r: Ref) -> bool {
        r.get() != 0 && r.get() < self.next && r.generation() == 0
    }

    /// Write the whole graph as a PDF file with `trailer`.
    ///
    /// The graph is not consumed. Flushing the same graph twice with the same
    /// inputs produces identical bytes.
    pub fn flush<W: Write>(
        &self,
        trailer: &Trailer,
        writer: &mut OutputWriter<W>,
        settings: &SerializeSettings,
        compressor: &dyn Compressor,
    ) -> FolioResult<()> {
        self.flush_impl(trailer, writer, settings, compressor, None)
    }

    /// Like [`ObjectGraph::flush`], but encrypts all strings and stream
    /// payloads, except for those of the object `trailer.encrypt` points to.
    pub fn flush_encrypted<W: Write>(
        &self,
        trailer: &Trailer,
        writer: &mut OutputWriter<W>,
        settings: &SerializeSettings,
        compressor: &dyn Compressor,
        encryptor: &dyn Encryptor,
    ) -> FolioResult<()> {
        self.flush_impl(trailer, writer, settings, compressor, Some(encryptor))
    }

    fn flush_impl<W: Write>(
        &self,
        trailer: &Trailer,
        writer: &mut OutputWriter<W>,
        settings: &SerializeSettings,
        compressor: &dyn Compressor,
        encryptor: Option<&dyn Encryptor>,
    ) -> FolioResult<()> {
        self.validate(trailer)?;

        // The cross-reference stream takes the next identity.
        let size = if settings.xref_stream {
            if self.next > MAX_OBJECT_NUMBER {
                return Err(FolioError::IdentitySpaceExhausted);
            }
            self.next + 1
        } else {
            self.next
        };

        let mut trailer = trailer.clone();

        // Encryption keys depend on the identifier, so it has to be known
        // before anything is encrypted.
        if encryptor.is_some() && trailer.id.is_none() {
            let id = self.unencrypted_id(&trailer);
            trailer.id = Some((id.clone(), id));
        }
        let encryption = encryptor.zip(trailer.id.as_ref().map(|(first, _)| first.as_slice()));

        let encoded = self.encode_objects(&trailer, settings, compressor, encryption)?;

        debug!(
            "flushing {} objects ({} identities allocated)",
            encoded.len(),
            self.allocated()
        );

        let mut header = settings.effective_version().header().to_vec();
        header.extend_from_slice(settings.binary_marker());
        writer.write(&header)?;

        let mut xref = XrefBuilder::new(size);
        for (r, bytes) in &encoded {
            trace!("writing object {r} at offset {}", writer.current_offset());
            xref.record(*r, writer.current_offset());
            writer.write(bytes)?;
        }

        if trailer.id.is_none() && settings.file_id {
            let id = base64_hash(writer.content_hash()).into_bytes();
            trailer.id = Some((id.clone(), id));
        }

        if settings.xref_stream {
            write_xref_stream(
                xref,
                Ref::new(self.next),
                &trailer,
                writer,
                settings,
                compressor,
            )
        } else {
            write_xref_table(&xref.finish(), &trailer, writer)
        }
    }

    /// Check that every reference resolves.
    fn validate(&self, trailer: &Trailer) -> FolioResult<()> {
        let mut refs = vec![];

        for (r, payload) in &self.objects {
            refs.clear();
            payload.collect_refs(&mut refs);

            if let Some(target) = refs.iter().find(|t| !self.objects.contains_key(*t)) {
                return Err(FolioError::DanglingReference {
                    target: *target,
                    referrer: Some(*r),
                });
            }
        }

        if let Some(target) = trailer.refs().find(|t| !self.objects.contains_key(t)) {
            return Err(FolioError::DanglingReference {
                target,
                referrer: None,
            });
        }

        Ok(())
    }

    /// A file identifier derived from the objects before encryption. It
    /// doesn't depend on the encryptor or on the encryption dictionary.
    fn unencrypted_id(&self, trailer: &Trailer) -> Vec<u8> {
        let objects = self
            .objects
            .iter()
            .filter(|(r, _)| trailer.encrypt != Some(**r));
        let hash = sip_hash_all([
            sip_hash_all(objects),
            trailer.root.sip_hash(),
            trailer.info.sip_hash(),
        ]);

        base64_hash(hash).into_bytes()
    }

    /// Serialize every object, in ascending order.
    fn encode_objects(
        &self,
        trailer: &Trailer,
        settings: &SerializeSettings,
        compressor: &dyn Compressor,
        encryption: Option<(&dyn Encryptor, &[u8])>,
    ) -> FolioResult<Vec<(Ref, Vec<u8>)>> {
        let mut encoded = Vec::with_capacity(self.objects.len());

        for (r, payload) in &self.objects {
            let r = *r;
            let encryption = encryption.filter(|_| trailer.encrypt != Some(r));
            let mut buf = vec![];

            match payload {
                Payload::Object(object) => match encryption {
                    Some((encryptor, id)) => write_indirect_object(
                        r,
                        &encrypt_strings(object, r, id, encryptor),
                        &mut buf,
                    ),
                    None => write_indirect_object(r, object, &mut buf),
                },
                Payload::Stream(stream) => {
                    let (mut dict, mut data) = stream
                        .encode(settings, compressor)
                        .map_err(|e| e.for_object(r))?;

                    if let Some((encryptor, id)) = encryption {
                        data = encryptor.encrypt(r, id, &data);
                        dict = encrypt_dict_strings(&dict, r, id, encryptor);
                        dict.insert("Length", data.len());
                    }

                    write_indirect_stream(r, &dict, &data, &mut buf);
                }
            }

            encoded.push((r, buf));
        }

        Ok(encoded)
    }
}
