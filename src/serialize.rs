//! Settings that control how a document is serialized.

use log::debug;

use crate::version::PdfVersion;

/// Settings that should be applied when writing a PDF file.
#[derive(Clone, Debug)]
pub struct SerializeSettings {
    /// Whether streams using [`StreamEncoding::Auto`] should be compressed.
    /// Leads to significantly smaller file sizes, so it is highly recommended
    /// that you leave this enabled.
    ///
    /// [`StreamEncoding::Auto`]: crate::stream::StreamEncoding::Auto
    pub compress_streams: bool,
    /// Whether the cross-reference section should be written as a compressed
    /// cross-reference stream instead of a classic table.
    ///
    /// Cross-reference streams were introduced in PDF 1.5. If the configured
    /// version is older, it will be raised to 1.5.
    pub xref_stream: bool,
    /// Whether the PDF should be ASCII-compatible, i.e. only consist of
    /// characters in the ASCII range.
    ///
    /// Binary streams will be hex encoded and the header will not contain a
    /// binary marker. Strings and names are not affected.
    pub ascii_compatible: bool,
    /// Whether a file identifier should be written into the trailer. It is
    /// derived from the written content, so it is reproducible.
    ///
    /// Encrypted documents always get a file identifier.
    pub file_id: bool,
    /// The PDF version that should be used for export.
    pub pdf_version: PdfVersion,
}

impl Default for SerializeSettings {
    fn default() -> Self {
        Self {
            compress_streams: true,
            xref_stream: false,
            ascii_compatible: false,
            file_id: true,
            pdf_version: PdfVersion::Pdf17,
        }
    }
}

impl SerializeSettings {
    /// The version that will actually be written, taking into account
    /// that cross-reference streams need at least PDF 1.5.
    pub(crate) fn effective_version(&self) -> PdfVersion {
        if self.xref_stream && !self.pdf_version.supports_xref_streams() {
            debug!(
                "raising the version from {} to PDF 1.5 for the cross-reference stream",
                self.pdf_version.as_str()
            );
            PdfVersion::Pdf15
        } else {
            self.pdf_version
        }
    }

    /// The binary marker written on the second line of the file.
    pub(crate) fn binary_marker(&self) -> &'static [u8] {
        if self.ascii_compatible {
            b"%AAAA\n\n"
        } else {
            b"%\x80\x80\x80\x80\n\n"
        }
    }
}

#[cfg(test)]
impl SerializeSettings {
    /// Readable output without compression or file identifier.
    pub(crate) fn settings_1() -> Self {
        Self {
            compress_streams: false,
            xref_stream: false,
            ascii_compatible: true,
            file_id: false,
            pdf_version: PdfVersion::Pdf17,
        }
    }

    /// Like [`SerializeSettings::settings_1`], but for PDF 1.4.
    pub(crate) fn settings_2() -> Self {
        Self {
            pdf_version: PdfVersion::Pdf14,
            ..Self::settings_1()
        }
    }
}
