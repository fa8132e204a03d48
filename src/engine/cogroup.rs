// Copyright © 2024 Pathway

//! Hash co-group of two record streams.
//!
//! Records of port 0 are buffered by key until the port is sealed by the
//! first record of port 1. Every port 1 record is then joined against the
//! buffered records of its key, and whatever was never matched is drained
//! at completion. Both unmatched sides are emitted with an absent
//! counterpart, so the result is a full outer join.
//!
//! Port 0 is held in memory in full; the smaller (bounded) input belongs
//! there.

mod buckets;
mod output;
mod stats;

use std::fmt;
use std::hash::Hash;
use std::mem;
use std::panic::Location;
use std::sync::Arc;

use derivative::Derivative;
use log::{debug, error, info, trace};

pub use self::output::{Drain, Matches, OutputPair};
pub use self::stats::CoGroupStats;

use self::buckets::Buckets;
use super::error::DynResult;
use super::{Error, Result};

pub type KeyFn<T, K> = Arc<dyn Fn(&T) -> DynResult<K> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Left,
    Right,
}

impl Port {
    pub fn ordinal(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Left => write!(f, "port 0 (left)"),
            Self::Right => write!(f, "port 1 (right)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    AcceptingLeft,
    AcceptingRight,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AcceptingLeft => write!(f, "accepting left records"),
            Self::AcceptingRight => write!(f, "accepting right records"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CoGroup<T0, T1, K> {
    #[derivative(Debug = "ignore")]
    key_of_left: KeyFn<T0, K>,
    #[derivative(Debug = "ignore")]
    key_of_right: KeyFn<T1, K>,
    #[derivative(Debug = "ignore")]
    buckets: Buckets<K, T0>,
    phase: Phase,
    stats: CoGroupStats,
}

impl<T0, T1, K> CoGroup<T0, T1, K>
where
    K: Eq + Hash,
{
    pub fn new(
        key_of_left: impl Fn(&T0) -> K + Send + Sync + 'static,
        key_of_right: impl Fn(&T1) -> K + Send + Sync + 'static,
    ) -> Self {
        Self::try_new(
            move |left| Ok(key_of_left(left)),
            move |right| Ok(key_of_right(right)),
        )
    }

    /// Like [`CoGroup::new`], with key functions that may reject a record.
    pub fn try_new(
        key_of_left: impl Fn(&T0) -> DynResult<K> + Send + Sync + 'static,
        key_of_right: impl Fn(&T1) -> DynResult<K> + Send + Sync + 'static,
    ) -> Self {
        Self::from_key_fns(Arc::new(key_of_left), Arc::new(key_of_right))
    }

    pub fn from_key_fns(key_of_left: KeyFn<T0, K>, key_of_right: KeyFn<T1, K>) -> Self {
        Self {
            key_of_left,
            key_of_right,
            buckets: Buckets::default(),
            phase: Phase::AcceptingLeft,
            stats: CoGroupStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> CoGroupStats {
        self.stats
    }

    /// Number of distinct left keys currently held.
    pub fn buffered_keys(&self) -> usize {
        self.buckets.keys()
    }

    /// Buffers a record of port 0 under its key.
    ///
    /// Only legal before the first [`push_right`](Self::push_right) and
    /// before [`complete`](Self::complete). A rejected record is not stored.
    #[track_caller]
    pub fn push_left(&mut self, item: T0) -> Result<()> {
        if self.phase != Phase::AcceptingLeft {
            return Err(ordering_violation(Port::Left, self.phase, Location::caller()));
        }
        let key = (self.key_of_left)(&item).map_err(|source| Error::KeyExtraction {
            port: Port::Left,
            source,
        })?;
        if self.buckets.insert(key, item) {
            self.stats.left_keys += 1;
        }
        self.stats.left_records += 1;
        Ok(())
    }

    /// Joins a record of port 1 against the buffered left records.
    ///
    /// The first call seals port 0. The returned iterator is lazy and may be
    /// dropped at any point without affecting the operator.
    #[track_caller]
    pub fn push_right(&mut self, item: T1) -> Result<Matches<'_, T0, T1>> {
        match self.phase {
            Phase::AcceptingLeft => {
                debug!(
                    "port 0 sealed after {} records under {} keys",
                    self.stats.left_records, self.stats.left_keys
                );
                self.phase = Phase::AcceptingRight;
            }
            Phase::AcceptingRight => {}
            Phase::Completed => {
                return Err(ordering_violation(
                    Port::Right,
                    self.phase,
                    Location::caller(),
                ));
            }
        }
        let key = (self.key_of_right)(&item).map_err(|source| Error::KeyExtraction {
            port: Port::Right,
            source,
        })?;
        self.stats.right_records += 1;
        if let Some((records, first_reference)) = self.buckets.mark_matched(&key) {
            if first_reference {
                self.stats.matched_keys += 1;
                trace!("key matched for the first time, {} left records", records.len());
            }
            Ok(Matches::joined(records, item))
        } else {
            self.stats.right_unmatched += 1;
            Ok(Matches::unmatched(item))
        }
    }

    /// Ends the input and returns every left record whose key was never
    /// referenced by port 1.
    ///
    /// Records of one key come out in arrival order. The operator holds no
    /// records afterwards and rejects any further call.
    #[track_caller]
    pub fn complete(&mut self) -> Result<Drain<T0, T1>> {
        if self.phase == Phase::Completed {
            let location = Location::caller();
            error!("co-group completed twice, at {location}");
            return Err(Error::DuplicateCompletion { location });
        }
        self.phase = Phase::Completed;
        let unmatched = mem::take(&mut self.buckets).into_unmatched();
        let drained = unmatched.iter().map(Vec::len).sum();
        self.stats.left_drained = drained;
        info!("co-group completed, {}", self.stats);
        Ok(Drain::new(unmatched, drained))
    }
}

pub(crate) fn ordering_violation(
    port: Port,
    phase: Phase,
    location: &'static Location<'static>,
) -> Error {
    error!("record on {port} rejected at {location}: operator is {phase}");
    Error::OrderingViolation {
        port,
        phase,
        location,
    }
}
