use std::io::{self, Write};

/// Fan-out writer: every byte accepted by the first sink is copied to the rest.
///
/// The first sink decides how many bytes a `write` call takes. The other
/// sinks then receive exactly that prefix, so they never see bytes the first
/// sink did not accept.
pub struct MultiWriter<'a> {
    sinks: Vec<&'a mut dyn Write>,
}

impl<'a> MultiWriter<'a> {
    pub fn new(sinks: Vec<&'a mut dyn Write>) -> Self {
        Self { sinks }
    }
}

impl Write for MultiWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some((first, rest)) = self.sinks.split_first_mut() else {
            return Ok(buf.len());
        };
        let n = first.write(buf)?;
        for sink in rest {
            sink.write_all(&buf[..n])?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}
