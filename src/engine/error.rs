// Copyright © 2024 Pathway

use std::error;
use std::panic::Location;
use std::result;

use super::cogroup::{Phase, Port};

#[allow(clippy::module_name_repetitions)]
pub type DynError = Box<dyn error::Error + Send + Sync>;
pub type DynResult<T> = result::Result<T, DynError>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("record on {port} received while {phase}, called at {location}; all port 0 records must precede port 1 records and completion")]
    OrderingViolation {
        port: Port,
        phase: Phase,
        location: &'static Location<'static>,
    },

    #[error("operator completed twice, second completion called at {location}")]
    DuplicateCompletion {
        location: &'static Location<'static>,
    },

    #[error("key extraction failed for a record on {port}: {source}")]
    KeyExtraction {
        port: Port,
        #[source]
        source: DynError,
    },

    #[error("output sink failed: {0}")]
    SinkFailed(#[source] DynError),

    #[error("can't run with no shards")]
    NeedsShards,

    #[error(transparent)]
    Env(#[from] crate::env::Error),

    #[error(transparent)]
    Other(DynError),
}

impl Error {
    /// Whether the error is a protocol violation by the host rather than a
    /// problem with a single record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OrderingViolation { .. } | Self::DuplicateCompletion { .. }
        )
    }

    pub fn downcast<E: error::Error + 'static>(self) -> Result<E, Self> {
        match self {
            Self::Other(inner) => match inner.downcast::<E>() {
                Ok(error) => Ok(*error),
                Err(other) => Err(Self::Other(other)),
            },
            other => Err(other),
        }
    }
}

impl From<DynError> for Error {
    fn from(value: DynError) -> Self {
        match value.downcast::<Self>() {
            Ok(this) => *this,
            Err(other) => Self::Other(other),
        }
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;
