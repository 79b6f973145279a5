use crate::types::{Coordinate, Size};
use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum StructureError {
    /// The underlying byte stream failed.
    Io(io::Error),
    /// Input bytes or tag tree do not describe a valid structure.
    Format(String),
    /// An argument was rejected by a constructor or mutator.
    Value(String),
    /// A coordinate lies outside the grid.
    Index { coordinate: Coordinate, size: Size },
}

impl StructureError {
    /// Classifies an error raised while decoding a stream: malformed or
    /// truncated input is a format error, anything else stays an I/O error.
    pub fn from_read_error(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                StructureError::Format(err.to_string())
            }
            _ => StructureError::Io(err),
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        StructureError::Format(msg.into())
    }

    pub fn value(msg: impl Into<String>) -> Self {
        StructureError::Value(msg.into())
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::Io(err) => write!(f, "IO error: {}", err),
            StructureError::Format(msg) => write!(f, "Format error: {}", msg),
            StructureError::Value(msg) => write!(f, "Value error: {}", msg),
            StructureError::Index { coordinate, size } => write!(
                f,
                "Index error: {:?} is outside a structure of size {:?}",
                coordinate, size
            ),
        }
    }
}

impl Error for StructureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StructureError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StructureError {
    fn from(err: io::Error) -> Self {
        StructureError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_read_errors_are_classified() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "short");
        assert_matches!(StructureError::from_read_error(eof), StructureError::Format(_));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_matches!(StructureError::from_read_error(denied), StructureError::Io(_));
    }

    #[test]
    fn test_index_error_display() {
        let err = StructureError::Index {
            coordinate: (3, 3, 3),
            size: (2, 2, 2),
        };
        assert_eq!(
            err.to_string(),
            "Index error: (3, 3, 3) is outside a structure of size (2, 2, 2)"
        );
    }
}
