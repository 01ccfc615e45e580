//! Choosing between PDF versions.

/// The version of a PDF document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PdfVersion {
    /// PDF 1.4.
    Pdf14,
    /// PDF 1.5.
    Pdf15,
    /// PDF 1.6.
    Pdf16,
    /// PDF 1.7.
    #[default]
    Pdf17,
}

impl PdfVersion {
    /// Get a string representation of the PDF version.
    pub fn as_str(&self) -> &str {
        match self {
            PdfVersion::Pdf14 => "PDF 1.4",
            PdfVersion::Pdf15 => "PDF 1.5",
            PdfVersion::Pdf16 => "PDF 1.6",
            PdfVersion::Pdf17 => "PDF 1.7",
        }
    }

    /// The first line of a file with this version.
    pub(crate) fn header(&self) -> &'static [u8] {
        match self {
            PdfVersion::Pdf14 => b"%PDF-1.4\n",
            PdfVersion::Pdf15 => b"%PDF-1.5\n",
            PdfVersion::Pdf16 => b"%PDF-1.6\n",
            PdfVersion::Pdf17 => b"%PDF-1.7\n",
        }
    }

    /// Whether cross-reference streams can be used.
    pub fn supports_xref_streams(&self) -> bool {
        *self >= PdfVersion::Pdf15
    }
}
