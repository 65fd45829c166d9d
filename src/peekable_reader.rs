use std::io::{self, Read};

use crate::error::InvalidUnread;
use crate::source::{BufferedCharSource, CharSource};
use crate::symbol::Symbol;

/// Scan-one/unread-one character interface with one character of look-ahead.
pub trait CharPeeker {
    fn read_char(&mut self) -> io::Result<Symbol>;
    fn unread_char(&mut self) -> Result<(), InvalidUnread>;
    fn peek_char(&mut self) -> io::Result<Symbol>;
}

/// Adds single-character look-ahead and single-step push-back to a
/// [`CharSource`].
///
/// End of stream is reported as [`Symbol::Eof`] rather than as an error, and
/// keeps being reported on every further read. `peek` holds the next symbol to
/// deliver when it has already been fetched; `last` holds the symbol most
/// recently delivered by `read_char`, until it is unread.
pub struct PeekableReader<S> {
    source: S,
    peek: Option<Symbol>,
    last: Option<Symbol>,
}

impl<R: Read> PeekableReader<BufferedCharSource<R>> {
    pub fn new(reader: R) -> Self {
        Self::from_source(BufferedCharSource::new(reader))
    }

    /// Like [`new`](Self::new), with `capacity` bytes of read buffer.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self::from_source(BufferedCharSource::with_capacity(capacity, reader))
    }
}

impl<S: CharSource> PeekableReader<S> {
    pub fn from_source(source: S) -> Self {
        Self {
            source,
            peek: None,
            last: None,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Unwraps the source. A peeked or unread symbol is lost.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Consumes the next symbol.
    ///
    /// On a source error nothing changes, so an unread that was possible
    /// before the failed read is still possible after it.
    pub fn read_char(&mut self) -> io::Result<Symbol> {
        let symbol = match self.peek.take() {
            Some(symbol) => symbol,
            None => self.fetch()?,
        };
        self.last = Some(symbol);
        Ok(symbol)
    }

    /// Returns the next symbol without consuming it.
    pub fn peek_char(&mut self) -> io::Result<Symbol> {
        if let Some(symbol) = self.peek {
            return Ok(symbol);
        }
        let symbol = self.fetch()?;
        self.peek = Some(symbol);
        Ok(symbol)
    }

    /// Pushes the symbol returned by the last `read_char` back, so that the
    /// next peek or read returns it again.
    ///
    /// When a symbol was peeked after that read, the source itself is stepped
    /// back over the peeked one first. A failure of that step is ignored: it
    /// happens when the peek hit end of stream, where there is nothing to step
    /// back over.
    pub fn unread_char(&mut self) -> Result<(), InvalidUnread> {
        let last = self.last.take().ok_or(InvalidUnread)?;
        if self.peek.is_some() {
            let _ = self.source.unread_char();
        }
        self.peek = Some(last);
        Ok(())
    }

    fn fetch(&mut self) -> io::Result<Symbol> {
        Ok(match self.source.read_char()? {
            Some((ch, width)) => Symbol::Char { ch, width },
            None => Symbol::Eof,
        })
    }
}

impl<S: CharSource> CharPeeker for PeekableReader<S> {
    fn read_char(&mut self) -> io::Result<Symbol> {
        PeekableReader::read_char(self)
    }

    fn unread_char(&mut self) -> Result<(), InvalidUnread> {
        PeekableReader::unread_char(self)
    }

    fn peek_char(&mut self) -> io::Result<Symbol> {
        PeekableReader::peek_char(self)
    }
}

/// Yields characters until end of stream.
impl<S: CharSource> Iterator for PeekableReader<S> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_char() {
            Ok(Symbol::Char { ch, .. }) => Some(Ok(ch)),
            Ok(Symbol::Eof) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
