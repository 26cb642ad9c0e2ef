use packwire_stream::StreamError;

use crate::value::Value;

/// Errors that can occur while packing or unpacking values.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// The value handed to a packer does not have the shape it encodes.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A heterogeneous-map entry carries a type id nobody registered.
    #[error("unknown type id {0}")]
    UnknownTypeId(i32),

    /// The object-reference storer or loader could not map object and id.
    #[error("unresolvable object reference: {0}")]
    UnresolvableReference(String),

    /// The stream ended before the format's required bytes arrived.
    #[error("stream truncated (needed {needed} bytes, got {got})")]
    Truncated { needed: usize, got: usize },

    /// The underlying stream reported an I/O fault.
    #[error("pack I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are well-formed in length but the payload is invalid.
    #[error("decode error: {0}")]
    Decode(String),

    /// A length does not fit the 32-bit signed wire prefix.
    #[error("length {0} exceeds the 32-bit wire prefix")]
    LengthOverflow(usize),

    /// Two different packers were registered under the same type id.
    #[error("type id {0} is already registered to a different packer")]
    DuplicateTypeId(i32),

    /// A custom packer tried to claim a builtin or sentinel type id.
    #[error("type id {0} is reserved for builtin packers")]
    ReservedTypeId(i32),
}

impl From<StreamError> for PackError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Truncated { needed, got } => PackError::Truncated { needed, got },
            StreamError::Io(io) => PackError::Io(io),
            StreamError::Closed => PackError::Io(std::io::Error::from(
                std::io::ErrorKind::WriteZero,
            )),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;

pub(crate) fn type_mismatch(expected: &'static str, found: &Value) -> PackError {
    PackError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_errors_flatten() {
        let err: PackError = StreamError::Truncated { needed: 4, got: 1 }.into();
        assert!(matches!(err, PackError::Truncated { needed: 4, got: 1 }));

        let err: PackError = StreamError::Closed.into();
        assert!(matches!(err, PackError::Io(e) if e.kind() == std::io::ErrorKind::WriteZero));
    }

    #[test]
    fn messages_name_the_problem() {
        let err = PackError::TypeMismatch {
            expected: "int32",
            found: "str",
        };
        assert_eq!(err.to_string(), "type mismatch: expected int32, found str");
        assert_eq!(PackError::UnknownTypeId(77).to_string(), "unknown type id 77");
    }
}
