use std::io::{self, Write};

use peekable_reader::Symbol;

pub struct OutputWriter<W: Write> {
    writer: W,
    offset: usize,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, offset: 0 }
    }

    /// Writes `<offset>\t<symbol>\t<width>` and advances the byte offset.
    pub fn write_symbol(&mut self, symbol: Symbol, next: Option<Symbol>) -> io::Result<()> {
        write!(self.writer, "{}\t{}\t{}", self.offset, symbol, symbol.width())?;
        if let Some(next) = next {
            write!(self.writer, "\tnext={}", next)?;
        }
        self.writer.write_all(b"\n")?;
        self.offset += symbol.width();
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
