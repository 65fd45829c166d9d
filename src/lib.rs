//! Character reader with one character of look-ahead and one step of
//! push-back, for hand-written lexers.
//!
//! ```
//! use peekable_reader::{PeekableReader, Symbol};
//!
//! let mut reader = PeekableReader::new("str".as_bytes());
//! assert_eq!(reader.read_char()?, Symbol::from('s'));
//! assert_eq!(reader.peek_char()?, Symbol::from('t'));
//! reader.unread_char()?;
//! assert_eq!(reader.read_char()?, Symbol::from('s'));
//! # Ok::<(), std::io::Error>(())
//! ```

mod error;
mod peekable_reader;
mod source;
mod symbol;

pub use error::InvalidUnread;
pub use peekable_reader::{CharPeeker, PeekableReader};
pub use source::{BufferedCharSource, CharSource, DEFAULT_CAPACITY, MIN_CAPACITY};
pub use symbol::{Symbol, EOF};
