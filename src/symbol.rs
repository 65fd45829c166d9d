use std::fmt;

/// Scalar value reported by [`Symbol::code`] once the stream is exhausted.
pub const EOF: i32 = -1;

/// One unit delivered by a [`PeekableReader`](crate::PeekableReader): either a
/// decoded character together with its width in bytes, or end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Char { ch: char, width: usize },
    Eof,
}

impl Symbol {
    pub fn new(ch: char, width: usize) -> Self {
        Symbol::Char { ch, width }
    }

    pub fn as_char(&self) -> Option<char> {
        match *self {
            Symbol::Char { ch, .. } => Some(ch),
            Symbol::Eof => None,
        }
    }

    /// Width of the character in the underlying byte stream, 0 at end of stream.
    pub fn width(&self) -> usize {
        match *self {
            Symbol::Char { width, .. } => width,
            Symbol::Eof => 0,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Symbol::Eof)
    }

    /// Unicode scalar value, or [`EOF`].
    pub fn code(&self) -> i32 {
        match *self {
            Symbol::Char { ch, .. } => ch as i32,
            Symbol::Eof => EOF,
        }
    }
}

impl From<char> for Symbol {
    fn from(ch: char) -> Self {
        Symbol::new(ch, ch.len_utf8())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Symbol::Char { ch, .. } if ch.is_control() => write!(f, "U+{:04X}", ch as u32),
            Symbol::Char { ch, .. } => write!(f, "U+{:04X} '{}'", ch as u32, ch),
            Symbol::Eof => f.write_str("EOF"),
        }
    }
}
