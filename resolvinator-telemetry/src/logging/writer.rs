//! Writer adapter that masks sensitive data in formatted log lines.

use crate::masking::SensitiveDataMasker;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Wraps a [`MakeWriter`] so every record is masked before it is written.
#[derive(Debug, Clone)]
pub struct MaskingMakeWriter<M> {
    inner: M,
    masker: Arc<SensitiveDataMasker>,
}

impl<M> MaskingMakeWriter<M> {
    /// Create a masking writer factory around `inner`.
    pub fn new(inner: M, masker: Arc<SensitiveDataMasker>) -> Self {
        Self { inner, masker }
    }
}

impl<'a, M> MakeWriter<'a> for MaskingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = MaskingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        MaskingWriter {
            inner: self.inner.make_writer(),
            masker: Arc::clone(&self.masker),
            buffer: Vec::new(),
        }
    }
}

/// Buffers one record and writes it masked on flush or drop.
///
/// The fmt layer creates one writer per event, so a record is never split
/// across two writers and patterns cannot straddle a write boundary.
pub struct MaskingWriter<W: Write> {
    inner: W,
    masker: Arc<SensitiveDataMasker>,
    buffer: Vec<u8>,
}

impl<W: Write> MaskingWriter<W> {
    fn write_masked(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buffer);
        let masked = self.masker.mask_string(&text);
        self.inner.write_all(masked.as_bytes())?;
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> Write for MaskingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.write_masked()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for MaskingWriter<W> {
    fn drop(&mut self) {
        let _ = self.write_masked();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_record_is_masked_on_drop() {
        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let make = MaskingMakeWriter::new(
            move || sink.clone(),
            Arc::new(SensitiveDataMasker::new()),
        );

        {
            let mut writer = make.make_writer();
            writer.write_all(b"url=wss://host/ws?tok").unwrap();
            writer.write_all(b"en=abcdefghijkl&vsn=2.0.0\n").unwrap();
        }

        let written = buffer.contents();
        assert_eq!(written, "url=wss://host/ws?token=abc***jkl&vsn=2.0.0\n");
    }

    #[test]
    fn test_flush_writes_once() {
        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let make = MaskingMakeWriter::new(
            move || sink.clone(),
            Arc::new(SensitiveDataMasker::new()),
        );

        let mut writer = make.make_writer();
        writer.write_all(b"plain line\n").unwrap();
        writer.flush().unwrap();
        drop(writer);

        assert_eq!(buffer.contents(), "plain line\n");
    }
}
