//! A forward-only byte sink that knows its position.

use std::io::Write;

use crate::error::FolioResult;
use crate::util::ContentHasher;

/// Wraps an [`io::Write`](std::io::Write) and keeps track of how many bytes
/// have been written so far.
///
/// The cross-reference section needs the byte offset of every object, so
/// all output of a flush goes through this type. There is no seeking.
#[derive(Debug)]
pub struct OutputWriter<W> {
    inner: W,
    offset: u64,
    hasher: ContentHasher,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new writer, starting at offset 0.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            offset: 0,
            hasher: ContentHasher::default(),
        }
    }

    /// The number of bytes written so far.
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Write all of `bytes`.
    pub fn write(&mut self, bytes: &[u8]) -> FolioResult<()> {
        self.inner.write_all(bytes)?;
        self.hasher.update(bytes);
        self.offset += bytes.len() as u64;

        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> FolioResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// A hash over everything written so far.
    pub(crate) fn content_hash(&self) -> u128 {
        self.hasher.finish()
    }

    /// Return the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FolioError;
    use std::io;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tracks_offset() {
        let mut writer = OutputWriter::new(Vec::new());
        writer.write(b"%PDF-1.7\n").unwrap();
        writer.write(b"").unwrap();
        assert_eq!(writer.current_offset(), 9);
        writer.write(b"1 0 obj\n").unwrap();
        assert_eq!(writer.current_offset(), 17);
        assert_eq!(writer.into_inner().len(), 17);
    }

    #[test]
    fn io_errors_are_reported() {
        let mut writer = OutputWriter::new(Broken);
        assert!(matches!(writer.write(b"abc"), Err(FolioError::Io(_))));
        assert_eq!(writer.current_offset(), 0);
    }

    #[test]
    fn content_hash_follows_content() {
        let mut a = OutputWriter::new(Vec::new());
        a.write(b"abc").unwrap();
        let mut b = OutputWriter::new(Vec::new());
        b.write(b"ab").unwrap();
        b.write(b"c").unwrap();
        let mut c = OutputWriter::new(Vec::new());
        c.write(b"abd").unwrap();

        assert_ne!(a.content_hash(), c.content_hash());
        assert_eq!(a.into_inner(), b.into_inner());
    }
}
