//! Setting document metadata.

use crate::error::FolioResult;
use crate::graph::ObjectGraph;
use crate::object::{Dict, Ref, Str};

/// Metadata for a PDF document, written as the document information
/// dictionary.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    title: Option<String>,
    subject: Option<String>,
    creator: Option<String>,
    producer: Option<String>,
    keywords: Option<Vec<String>>,
    authors: Option<Vec<String>>,
}

impl Metadata {
    /// Create new metadata.
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// The title of the document.
    pub fn title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    /// The subject of the document.
    pub fn subject(mut self, subject: String) -> Self {
        self.subject = Some(subject);
        self
    }

    /// The keywords that describe the document.
    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// The creator tool of the document.
    pub fn creator(mut self, creator: String) -> Self {
        self.creator = Some(creator);
        self
    }

    /// The producer tool of the document.
    pub fn producer(mut self, producer: String) -> Self {
        self.producer = Some(producer);
        self
    }

    /// The authors of the document.
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.authors = Some(authors);
        self
    }

    pub(crate) fn has_document_info(&self) -> bool {
        self.title.is_some()
            || self.producer.is_some()
            || self.keywords.is_some()
            || self.authors.is_some()
            || self.creator.is_some()
            || self.subject.is_some()
    }

    /// Register the document information dictionary, if there is anything
    /// to write.
    pub(crate) fn serialize_document_info(
        &self,
        graph: &mut ObjectGraph,
    ) -> FolioResult<Option<Ref>> {
        if !self.has_document_info() {
            return Ok(None);
        }

        let mut document_info = Dict::new();

        if let Some(title) = &self.title {
            document_info.insert("Title", Str::text(title));
        }

        if let Some(authors) = &self.authors {
            document_info.insert("Author", Str::text(&authors.join(", ")));
        }

        if let Some(subject) = &self.subject {
            document_info.insert("Subject", Str::text(subject));
        }

        if let Some(keywords) = &self.keywords {
            document_info.insert("Keywords", Str::text(&keywords.join(", ")));
        }

        if let Some(creator) = &self.creator {
            document_info.insert("Creator", Str::text(creator));
        }

        if let Some(producer) = &self.producer {
            document_info.insert("Producer", Str::text(producer));
        }

        graph.register(document_info).map(Some)
    }
}
