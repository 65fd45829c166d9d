use std::io::{self, BufRead, BufReader, Read};
use std::str;

pub const DEFAULT_CAPACITY: usize = 4096;
pub const MIN_CAPACITY: usize = 16;

const MAX_UTF8_WIDTH: usize = 4;

/// A forward-only stream of characters that can take back its most recent
/// read.
pub trait CharSource {
    /// Returns the next character and its width in bytes, or `None` at end of
    /// stream.
    fn read_char(&mut self) -> io::Result<Option<(char, usize)>>;

    /// Reverses the most recent `read_char`. Only valid directly after a read
    /// that returned a character.
    fn unread_char(&mut self) -> io::Result<()>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn read_char(&mut self) -> io::Result<Option<(char, usize)>> {
        (**self).read_char()
    }

    fn unread_char(&mut self) -> io::Result<()> {
        (**self).unread_char()
    }
}

/// Decodes UTF-8 straight out of a `BufReader`.
///
/// A character is returned as soon as all of its bytes are buffered; the
/// reader is only asked for more when they are not. Malformed input never
/// fails: each byte that does not start a valid sequence comes out as
/// `U+FFFD` with width 1.
pub struct BufferedCharSource<R: Read> {
    reader: BufReader<R>,
    // Leading bytes of a sequence split across two fills.
    partial: [u8; MAX_UTF8_WIDTH],
    partial_len: usize,
    last: Option<(char, usize)>,
    unread: Option<(char, usize)>,
}

enum Decoded {
    Char(char, usize),
    Invalid,
    Incomplete,
}

impl<R: Read> BufferedCharSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, reader)
    }

    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity.max(MIN_CAPACITY), reader),
            partial: [0; MAX_UTF8_WIDTH],
            partial_len: 0,
            last: None,
            unread: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.reader.capacity()
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }

    /// Unwraps the reader. Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn next_char(&mut self) -> io::Result<Option<(char, usize)>> {
        loop {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if buf.is_empty() {
                if self.partial_len == 0 {
                    return Ok(None);
                }
                return Ok(Some(self.drop_partial_byte()));
            }

            let held = self.partial_len;
            if held == 0 {
                match decode_first(buf) {
                    Decoded::Char(c, width) => {
                        self.reader.consume(width);
                        return Ok(Some((c, width)));
                    }
                    Decoded::Invalid => {
                        self.reader.consume(1);
                        return Ok(Some((char::REPLACEMENT_CHARACTER, 1)));
                    }
                    Decoded::Incomplete => {
                        let len = buf.len();
                        self.partial[..len].copy_from_slice(buf);
                        self.partial_len = len;
                        self.reader.consume(len);
                    }
                }
            } else {
                let take = buf.len().min(MAX_UTF8_WIDTH - held);
                let mut joined = self.partial;
                joined[held..held + take].copy_from_slice(&buf[..take]);
                match decode_first(&joined[..held + take]) {
                    Decoded::Char(c, width) => {
                        self.reader.consume(width - held);
                        self.partial_len = 0;
                        return Ok(Some((c, width)));
                    }
                    Decoded::Invalid => return Ok(Some(self.drop_partial_byte())),
                    Decoded::Incomplete => {
                        self.partial = joined;
                        self.partial_len = held + take;
                        self.reader.consume(take);
                    }
                }
            }
        }
    }

    // The first held byte cannot start a character; report it on its own.
    fn drop_partial_byte(&mut self) -> (char, usize) {
        self.partial.copy_within(1..self.partial_len, 0);
        self.partial_len -= 1;
        (char::REPLACEMENT_CHARACTER, 1)
    }
}

impl<R: Read> CharSource for BufferedCharSource<R> {
    fn read_char(&mut self) -> io::Result<Option<(char, usize)>> {
        self.last = None;
        let next = match self.unread.take() {
            Some(pair) => Some(pair),
            None => self.next_char()?,
        };
        self.last = next;
        Ok(next)
    }

    fn unread_char(&mut self) -> io::Result<()> {
        match self.last.take() {
            Some(pair) => {
                self.unread = Some(pair);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unread_char must directly follow a successful read_char",
            )),
        }
    }
}

fn decode_first(bytes: &[u8]) -> Decoded {
    let head = &bytes[..bytes.len().min(MAX_UTF8_WIDTH)];
    let valid = match str::from_utf8(head) {
        Ok(s) => s,
        Err(e) if e.valid_up_to() == 0 => {
            return match e.error_len() {
                Some(_) => Decoded::Invalid,
                None => Decoded::Incomplete,
            };
        }
        Err(e) => str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default(),
    };
    match valid.chars().next() {
        Some(c) => Decoded::Char(c, c.len_utf8()),
        None => Decoded::Incomplete,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use rstest::rstest;

    /// Hands out each scripted chunk as one `read`, then end of stream.
    struct Chunked {
        chunks: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Chunked {
        fn new(chunks: Vec<io::Result<&[u8]>>) -> Self {
            Self {
                chunks: chunks.into_iter().map(|c| c.map(<[u8]>::to_vec)).collect(),
            }
        }

        fn bytewise(input: &[u8]) -> Self {
            Self::new(input.chunks(1).map(Ok).collect())
        }
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(Ok(chunk.split_off(n)));
                    }
                    Ok(n)
                }
            }
        }
    }

    fn reset() -> io::Error {
        io::Error::from(io::ErrorKind::ConnectionReset)
    }

    fn drain<R: Read>(source: &mut BufferedCharSource<R>) -> Vec<(char, usize)> {
        let mut out = Vec::new();
        while let Some(pair) = source.read_char().unwrap() {
            out.push(pair);
        }
        out
    }

    #[rstest]
    #[case(b"", &[])]
    #[case(b"ab", &[('a', 1), ('b', 1)])]
    #[case(b"a\nb\n", &[('a', 1), ('\n', 1), ('b', 1), ('\n', 1)])]
    #[case("\u{e9}\u{20AC}\u{1F600}".as_bytes(), &[('\u{e9}', 2), ('\u{20AC}', 3), ('\u{1F600}', 4)])]
    #[case(b"\0x", &[('\0', 1), ('x', 1)])]
    fn decodes_utf8(#[case] input: &[u8], #[case] expected: &[(char, usize)]) {
        let mut source = BufferedCharSource::new(input);
        assert_eq!(drain(&mut source), expected);
        let mut source = BufferedCharSource::new(Chunked::bytewise(input));
        assert_eq!(drain(&mut source), expected);
    }

    #[rstest]
    #[case(b"\xffa", &[('\u{FFFD}', 1), ('a', 1)])]
    #[case(b"\xe2\x82", &[('\u{FFFD}', 1), ('\u{FFFD}', 1)])]
    #[case(b"\xe2\x82\n", &[('\u{FFFD}', 1), ('\u{FFFD}', 1), ('\n', 1)])]
    #[case(b"\xe2\x82\xe2\x82\xac", &[('\u{FFFD}', 1), ('\u{FFFD}', 1), ('\u{20AC}', 3)])]
    #[case(b"a\xc3", &[('a', 1), ('\u{FFFD}', 1)])]
    fn replaces_malformed_bytes(#[case] input: &[u8], #[case] expected: &[(char, usize)]) {
        let mut source = BufferedCharSource::new(input);
        assert_eq!(drain(&mut source), expected);
        let mut source = BufferedCharSource::new(Chunked::bytewise(input));
        assert_eq!(drain(&mut source), expected);
    }

    #[test]
    fn chars_already_read_come_before_an_error() {
        let mut source = BufferedCharSource::new(Chunked::new(vec![
            Ok(&b"ab"[..]),
            Err(reset()),
            Ok(&b"c"[..]),
        ]));
        assert_eq!(source.read_char().unwrap(), Some(('a', 1)));
        assert_eq!(source.read_char().unwrap(), Some(('b', 1)));
        assert_eq!(
            source.read_char().unwrap_err().kind(),
            io::ErrorKind::ConnectionReset
        );
        assert_eq!(source.read_char().unwrap(), Some(('c', 1)));
        assert_eq!(source.read_char().unwrap(), None);
    }

    #[test]
    fn error_inside_a_split_sequence_keeps_its_bytes() {
        let mut source = BufferedCharSource::new(Chunked::new(vec![
            Ok(&b"\xe2"[..]),
            Err(reset()),
            Ok(&b"\x82\xac!"[..]),
        ]));
        assert!(source.read_char().is_err());
        assert!(source.unread_char().is_err());
        assert_eq!(source.read_char().unwrap(), Some(('\u{20AC}', 3)));
        assert_eq!(source.read_char().unwrap(), Some(('!', 1)));
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut source = BufferedCharSource::new(Chunked::new(vec![
            Err(io::ErrorKind::Interrupted.into()),
            Ok(&b"z"[..]),
        ]));
        assert_eq!(source.read_char().unwrap(), Some(('z', 1)));
    }

    #[test]
    fn returns_without_waiting_for_a_newline() {
        // Any read after the first chunk would fail.
        let mut source = BufferedCharSource::new(Chunked::new(vec![
            Ok("x\u{e9}".as_bytes()),
            Err(reset()),
        ]));
        assert_eq!(source.read_char().unwrap(), Some(('x', 1)));
        assert_eq!(source.read_char().unwrap(), Some(('\u{e9}', 2)));
    }

    #[test]
    fn buffer_stays_bounded_by_capacity() {
        let input = "\u{20AC}".repeat(1000);
        let mut source = BufferedCharSource::with_capacity(MIN_CAPACITY, input.as_bytes());
        let chars = drain(&mut source);
        assert_eq!(chars.len(), 1000);
        assert!(chars.iter().all(|&pair| pair == ('\u{20AC}', 3)));
        assert_eq!(source.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn capacity_is_clamped() {
        assert_eq!(BufferedCharSource::with_capacity(1, &b""[..]).capacity(), MIN_CAPACITY);
        assert_eq!(BufferedCharSource::new(&b""[..]).capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn unread_steps_back_once() {
        let mut source = BufferedCharSource::new("a\u{20AC}\n".as_bytes());
        assert_eq!(source.read_char().unwrap(), Some(('a', 1)));
        assert_eq!(source.read_char().unwrap(), Some(('\u{20AC}', 3)));
        source.unread_char().unwrap();
        assert!(source.unread_char().is_err());
        assert_eq!(source.read_char().unwrap(), Some(('\u{20AC}', 3)));
        assert_eq!(source.read_char().unwrap(), Some(('\n', 1)));
        source.unread_char().unwrap();
        assert_eq!(source.read_char().unwrap(), Some(('\n', 1)));
        assert_eq!(source.read_char().unwrap(), None);
    }

    #[test]
    fn unread_fails_before_any_read_and_after_eof() {
        let mut source = BufferedCharSource::new(&b"a"[..]);
        assert_eq!(source.unread_char().unwrap_err().kind(), io::ErrorKind::InvalidInput);
        source.read_char().unwrap();
        assert_eq!(source.read_char().unwrap(), None);
        assert!(source.unread_char().is_err());
        assert_eq!(source.read_char().unwrap(), None);
    }

    #[test]
    fn reader_is_reachable() {
        let mut source = BufferedCharSource::new(Chunked::new(vec![Ok(&b"q"[..])]));
        assert_eq!(source.get_ref().chunks.len(), 1);
        source.get_mut().chunks.push_back(Ok(b"r".to_vec()));
        assert_eq!(drain(&mut source), [('q', 1), ('r', 1)]);
        assert!(source.into_inner().chunks.is_empty());
    }
}
