//! Creating documents.
//!
//! A [`Document`] is the entry point for writing a single PDF. It owns the
//! [`ObjectGraph`], the fonts that are used by the content and everything that
//! ends up in the trailer. Content streams, pages and the catalog are
//! registered on the graph directly, and once everything is in place,
//! [`Document::finish`] writes the file.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use crate::encrypt::Encryption;
use crate::error::FolioResult;
use crate::font::{CjkFont, FontRegistry, InMemoryResources};
use crate::graph::ObjectGraph;
use crate::metadata::Metadata;
use crate::object::Ref;
use crate::serialize::SerializeSettings;
use crate::stream::{Compressor, Deflate};
use crate::writer::OutputWriter;
use crate::xref::Trailer;

/// A PDF document.
pub struct Document {
    graph: ObjectGraph,
    settings: SerializeSettings,
    compressor: Box<dyn Compressor>,
    registry: Arc<FontRegistry>,
    fonts: BTreeMap<Ref, CjkFont>,
    metadata: Option<Metadata>,
    encryption: Option<Encryption>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new document with default settings.
    pub fn new() -> Self {
        Self::new_with(SerializeSettings::default())
    }

    /// Create a new document with specific settings.
    ///
    /// The document starts out with an empty font registry, see
    /// [`Document::with_registry`].
    pub fn new_with(settings: SerializeSettings) -> Self {
        Self {
            graph: ObjectGraph::new(),
            settings,
            compressor: Box::new(Deflate::default()),
            registry: Arc::new(FontRegistry::new(InMemoryResources::new())),
            fonts: BTreeMap::new(),
            metadata: None,
            encryption: None,
        }
    }

    /// Use a shared font registry for the CJK fonts of this document.
    pub fn with_registry(mut self, registry: Arc<FontRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The font registry of this document.
    pub fn registry(&self) -> &Arc<FontRegistry> {
        &self.registry
    }

    /// The settings of this document.
    pub fn settings(&self) -> &SerializeSettings {
        &self.settings
    }

    /// The object graph.
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// The object graph, for registering objects.
    pub fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    /// Replace the compressor used for `/FlateDecode` streams.
    pub fn set_compressor(&mut self, compressor: Box<dyn Compressor>) {
        self.compressor = compressor;
    }

    /// Set the metadata of the document.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = Some(metadata);
    }

    /// Encrypt the document.
    pub fn set_encryption(&mut self, encryption: Encryption) {
        self.encryption = Some(encryption);
    }

    /// Add a CJK font and return the reference of its composite font, which
    /// can be used in resource dictionaries right away.
    ///
    /// The font dictionaries themselves are written when the document is
    /// finished, so that only the widths of the glyphs that were actually
    /// used end up in the file.
    pub fn add_cjk_font(&mut self, font_name: &str, encoding: &str) -> FolioResult<Ref> {
        let font = CjkFont::new(&self.registry, font_name, encoding)?;
        let r = self.graph.reserve()?;
        self.fonts.insert(r, font);

        Ok(r)
    }

    /// The font that was added under `r`, for encoding text with it.
    pub fn cjk_font_mut(&mut self, r: Ref) -> Option<&mut CjkFont> {
        self.fonts.get_mut(&r)
    }

    /// Write the document with `root` as its catalog.
    pub fn finish(self, root: Ref) -> FolioResult<Vec<u8>> {
        self.finish_to(root, Vec::new())
    }

    /// Write the document with `root` as its catalog into `sink`, and return
    /// the sink.
    pub fn finish_to<W: Write>(mut self, root: Ref, sink: W) -> FolioResult<W> {
        for (r, font) in &self.fonts {
            font.serialize(&mut self.graph, *r)?;
        }

        let mut trailer = Trailer::new(root);

        if let Some(metadata) = &self.metadata {
            trailer.info = metadata.serialize_document_info(&mut self.graph)?;
        }

        if let Some(encryption) = &self.encryption {
            trailer.encrypt = Some(self.graph.register(encryption.dictionary.clone())?);
            trailer.id = encryption.file_id.clone().map(|id| (id.clone(), id));
        }

        let mut writer = OutputWriter::new(sink);

        match &self.encryption {
            Some(encryption) => self.graph.flush_encrypted(
                &trailer,
                &mut writer,
                &self.settings,
                self.compressor.as_ref(),
                encryption.encryptor.as_ref(),
            )?,
            None => self.graph.flush(
                &trailer,
                &mut writer,
                &self.settings,
                self.compressor.as_ref(),
            )?,
        }

        writer.flush()?;

        Ok(writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FolioError;
    use crate::font::tests::registry;
    use crate::object::{Dict, Name, Object, Str};
    use crate::stream::Stream;
    use crate::tests::check_snapshot;
    use folio_macros::snapshot;

    /// A catalog with a single empty page tree, returning the catalog and
    /// the page tree.
    fn page_tree(graph: &mut ObjectGraph) -> (Ref, Ref) {
        let pages = graph.reserve().unwrap();
        let catalog = graph
            .register(Dict::with_type("Catalog").pair("Pages", pages).clone())
            .unwrap();

        (catalog, pages)
    }

    fn page(graph: &mut ObjectGraph, pages: Ref, font: Ref, content: Vec<u8>) -> FolioResult<()> {
        let content = graph.register(Stream::new(content))?;

        let mut fonts = Dict::new();
        fonts.insert("F1", font);
        let mut resources = Dict::new();
        resources.insert("Font", fonts);

        let page = graph.register(
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
        )?;

        graph.register_at(
            pages,
            Dict::with_type("Pages")
                .pair("Kids", vec![Object::Ref(page)])
                .pair("Count", 1)
                .clone(),
        )
    }

    fn helvetica(graph: &mut ObjectGraph) -> Ref {
        graph
            .register(
                Dict::with_type("Font")
                    .pair("Subtype", Name::from("Type1"))
                    .pair("BaseFont", Name::from("Helvetica"))
                    .clone(),
            )
            .unwrap()
    }

    #[snapshot]
    fn document_hello_world(d: &mut Document) -> Ref {
        let graph = d.graph_mut();
        let (catalog, pages) = page_tree(graph);
        let font = helvetica(graph);
        page(
            graph,
            pages,
            font,
            b"BT /F1 24 Tf 72 720 Td (Hello World) Tj ET".to_vec(),
        )
        .unwrap();

        catalog
    }

    #[snapshot]
    fn document_metadata(d: &mut Document) -> Ref {
        d.set_metadata(
            Metadata::new()
                .title("Report".to_string())
                .creator("folio".to_string()),
        );

        d.graph_mut().register(Dict::with_type("Catalog")).unwrap()
    }

    #[snapshot(settings_2)]
    fn document_pdf_14(d: &mut Document) -> Ref {
        d.graph_mut().register(Dict::with_type("Catalog")).unwrap()
    }

    #[test]
    fn document_cjk_font() {
        let mut d = Document::new_with(SerializeSettings::settings_1())
            .with_registry(Arc::new(registry()));

        let font = d.add_cjk_font("HeiseiMin-W3", "UniJIS-UCS2-H").unwrap();
        let text = d.cjk_font_mut(font).unwrap().encode_text("A A");
        let mut content = b"BT /F1 12 Tf <".to_vec();
        for byte in text {
            content.extend_from_slice(format!("{byte:02X}").as_bytes());
        }
        content.extend_from_slice(b"> Tj ET");

        let graph = d.graph_mut();
        let (catalog, pages) = page_tree(graph);
        page(graph, pages, font, content).unwrap();

        check_snapshot("document_cjk_font", &d.finish(catalog).unwrap());
    }

    #[test]
    fn unsupported_font_allocates_nothing() {
        let mut d = Document::new().with_registry(Arc::new(registry()));

        assert!(matches!(
            d.add_cjk_font("HeiseiMin-W3", "UniGB-UCS2-H"),
            Err(FolioError::UnsupportedFont { .. })
        ));
        assert_eq!(d.graph().allocated(), 0);
    }

    #[test]
    fn finish_to_returns_sink() {
        let mut d = Document::new();
        let root = d.graph_mut().register(Dict::with_type("Catalog")).unwrap();
        let sink = d.finish_to(root, Vec::new()).unwrap();

        assert!(sink.starts_with(b"%PDF-1.7\n"));
        assert!(sink.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn unused_font_is_still_written() {
        let mut d = Document::new_with(SerializeSettings::settings_1())
            .with_registry(Arc::new(registry()));
        let font = d.add_cjk_font("HeiseiMin-W3", "UniJIS-UCS2-H").unwrap();
        let root = d
            .graph_mut()
            .register(Dict::with_type("Catalog").pair("Font", font).clone())
            .unwrap();

        let out = d.finish(root).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/BaseFont /HeiseiMin-W3-UniJIS-UCS2-H"));
        assert!(!text.contains("/W "));
    }

    #[test]
    fn encrypted_document() {
        use crate::encrypt::tests::XorEncryptor;

        let mut d = Document::new_with(SerializeSettings::settings_1());
        d.set_encryption(Encryption::new(
            Arc::new(XorEncryptor(0)),
            Dict::new().pair("Filter", Name::from("Standard")).clone(),
        ));
        let root = d
            .graph_mut()
            .register(Dict::with_type("Catalog").pair("Lang", Str::from("a")).clone())
            .unwrap();

        let out = d.finish(root).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/Encrypt 2 0 R"));
        assert!(text.contains("/Filter /Standard"));
        assert!(text.contains("/ID [("));
        // 'a' ^ 1
        assert!(text.contains("/Lang (`)"));
    }

    #[test]
    fn encryption_with_file_id() {
        use crate::encrypt::tests::XorEncryptor;

        let mut d = Document::new_with(SerializeSettings::settings_1());
        d.set_encryption(
            Encryption::new(Arc::new(XorEncryptor(0)), Dict::new())
                .with_file_id(b"folio".to_vec()),
        );
        let root = d.graph_mut().register(Dict::with_type("Catalog")).unwrap();

        let out = d.finish(root).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/ID [(folio) (folio)]"));
    }
}
