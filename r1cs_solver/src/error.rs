use ark_serialize::SerializationError;

use crate::{curve::CurveId, hint::HintId, linear_combination::WireId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid witness size, got {got}, expected {expected} = {public} (public - ONE_WIRE) + {secret} (secret)")]
    InvalidWitnessSize {
        got: usize,
        expected: usize,
        public: usize,
        secret: usize,
    },
    #[error("invalid input size: len(a, b, c) = ({a}, {b}, {c}) must all equal the number of constraints {expected}")]
    InvalidOutputSize {
        a: usize,
        b: usize,
        c: usize,
        expected: usize,
    },
    #[error("constraint #{constraint} is not satisfied: {debug}")]
    UnsatisfiedConstraint { constraint: usize, debug: String },
    #[error("could not solve hint wire {wire}: {source}")]
    HintResolutionFailed {
        wire: WireId,
        #[source]
        source: HintError,
    },
    #[error("encoding failed after {bytes_written} bytes: {source}")]
    Serialize {
        bytes_written: u64,
        #[source]
        source: SerializationError,
    },
    #[error("decoding failed after {bytes_read} bytes: {source}")]
    Deserialize {
        bytes_read: u64,
        #[source]
        source: SerializationError,
    },
    #[error("not an encoded constraint system (bad magic bytes)")]
    BadMagic,
    #[error("unsupported encoding version {0}")]
    UnsupportedVersion(u8),
    #[error("constraint system is defined over {found:?}, expected {expected}")]
    CurveMismatch {
        expected: CurveId,
        found: Option<CurveId>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum HintError {
    #[error("missing hint function {0}")]
    MissingFunction(HintId),
    #[error("hint function {id} failed: {source}")]
    Failed {
        id: HintId,
        #[source]
        source: anyhow::Error,
    },
}
