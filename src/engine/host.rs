// Copyright © 2024 Pathway

//! Drivers that feed a [`CoGroup`] in the order it requires: all of port 0,
//! then port 1, then completion.

pub mod config;
pub mod sharded;
mod sink;

use std::hash::Hash;
use std::ops::AddAssign;

use log::warn;

pub use self::config::{Config, KeyErrorPolicy};
pub use self::sink::OutputSink;

use super::cogroup::{CoGroup, CoGroupStats, OutputPair, Port};
use super::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub operator: CoGroupStats,
    pub skipped_left: usize,
    pub skipped_right: usize,
    pub emitted: usize,
}

impl HostStats {
    fn record_skipped(&mut self, port: Port) {
        match port {
            Port::Left => self.skipped_left += 1,
            Port::Right => self.skipped_right += 1,
        }
    }
}

impl AddAssign for HostStats {
    fn add_assign(&mut self, other: Self) {
        self.operator += other.operator;
        self.skipped_left += other.skipped_left;
        self.skipped_right += other.skipped_right;
        self.emitted += other.emitted;
    }
}

/// Runs `operator` over both inputs and hands every produced pair to `sink`.
///
/// Pairs reach the sink as soon as they are produced: the matches of a right
/// record before the next right record is pushed, the drain last.
pub fn run_cogroup<T0, T1, K, S>(
    operator: &mut CoGroup<T0, T1, K>,
    left: impl IntoIterator<Item = T0>,
    right: impl IntoIterator<Item = T1>,
    key_error_policy: KeyErrorPolicy,
    sink: &mut S,
) -> Result<HostStats>
where
    T0: Clone,
    T1: Clone,
    K: Eq + Hash,
    S: OutputSink<T0, T1> + ?Sized,
{
    let mut stats = HostStats::default();
    for item in left {
        if let Err(error) = operator.push_left(item) {
            let port = tolerate(key_error_policy, error)?;
            stats.record_skipped(port);
        }
    }
    for item in right {
        match operator.push_right(item) {
            Ok(matches) => stats.emitted += forward(matches, sink)?,
            Err(error) => {
                let port = tolerate(key_error_policy, error)?;
                stats.record_skipped(port);
            }
        }
    }
    let drain = operator.complete()?;
    stats.emitted += forward(drain, sink)?;
    stats.operator = operator.stats();
    Ok(stats)
}

/// Passes through key extraction failures allowed by `policy`, returning the
/// port of the rejected record. Anything else is returned as is.
pub(crate) fn tolerate(policy: KeyErrorPolicy, error: Error) -> Result<Port> {
    match (policy, error) {
        (KeyErrorPolicy::Skip, Error::KeyExtraction { port, source }) => {
            warn!("skipping a record on {port}, its key can't be extracted: {source}");
            Ok(port)
        }
        (_, error) => Err(error),
    }
}

fn forward<T0, T1, S>(
    pairs: impl Iterator<Item = OutputPair<T0, T1>>,
    sink: &mut S,
) -> Result<usize>
where
    S: OutputSink<T0, T1> + ?Sized,
{
    let mut emitted = 0;
    for pair in pairs {
        sink.give(pair).map_err(Error::SinkFailed)?;
        emitted += 1;
    }
    Ok(emitted)
}
