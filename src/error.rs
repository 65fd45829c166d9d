use std::io;

use thiserror::Error;

/// Returned by `unread_char` when there is no read to take back: nothing has
/// been read yet, or the last read was already unread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid use of unread_char")]
pub struct InvalidUnread;

impl From<InvalidUnread> for io::Error {
    fn from(err: InvalidUnread) -> Self {
        io::Error::new(io::ErrorKind::InvalidInput, err)
    }
}
