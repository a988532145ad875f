use core::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    UnexpectedEof { expected: &'static str },
    MissingField { line: String, expected: &'static str },
    InvalidNumber { field: &'static str, token: String },
    CheckpointOutOfRange { index: i64, count: usize },
    EmptyTrack,
    InvalidPower { token: String },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { expected } => {
                write!(f, "input ended while expecting {expected}")
            }
            Self::MissingField { line, expected } => {
                write!(f, "line {line:?} is missing {expected}")
            }
            Self::InvalidNumber { field, token } => {
                write!(f, "invalid {field}: {token:?} is not an integer")
            }
            Self::CheckpointOutOfRange { index, count } => write!(
                f,
                "checkpoint index {index} out of range (track has {count})"
            ),
            Self::EmptyTrack => write!(f, "track has no checkpoints"),
            Self::InvalidPower { token } => {
                write!(f, "invalid power {token:?}: expected 0..=100, SHIELD or BOOST")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}
