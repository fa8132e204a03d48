// Copyright © 2024 Pathway

//! Several independent co-group instances, each owning the keys that hash
//! to it.

use std::hash::{Hash, Hasher as _};
use std::iter::Flatten;
use std::panic::Location;
use std::vec;

use log::{debug, error, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use xxhash_rust::xxh3::Xxh3 as Hasher;

use super::{run_cogroup, tolerate, Config, HostStats, KeyErrorPolicy};
use crate::engine::cogroup::{
    ordering_violation, CoGroup, CoGroupStats, Drain, KeyFn, Matches, OutputPair, Phase, Port,
};
use crate::engine::{Error, Result};

pub type ShardedDrain<T0, T1> = Flatten<vec::IntoIter<Drain<T0, T1>>>;

#[allow(clippy::cast_possible_truncation)]
pub fn shard_of<K: Hash>(key: &K, shards: usize) -> usize {
    let mut hasher = Hasher::default();
    key.hash(&mut hasher);
    (hasher.finish() % shards as u64) as usize
}

/// Routes every record to the instance owning its key. Port ordering is
/// checked across all instances, not only within the one a record lands in.
pub struct ShardedCoGroup<T0, T1, K> {
    key_of_left: KeyFn<T0, K>,
    key_of_right: KeyFn<T1, K>,
    shards: Vec<CoGroup<T0, T1, K>>,
    phase: Phase,
}

impl<T0, T1, K> ShardedCoGroup<T0, T1, K>
where
    K: Eq + Hash,
{
    pub fn new(config: &Config, key_of_left: KeyFn<T0, K>, key_of_right: KeyFn<T1, K>) -> Self {
        let shards = (0..config.shards())
            .map(|_| CoGroup::from_key_fns(key_of_left.clone(), key_of_right.clone()))
            .collect();
        Self {
            key_of_left,
            key_of_right,
            shards,
            phase: Phase::AcceptingLeft,
        }
    }

    pub fn shards(&self) -> usize {
        self.shards.len()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> CoGroupStats {
        let mut stats = CoGroupStats::default();
        for shard in &self.shards {
            stats += shard.stats();
        }
        stats
    }

    #[track_caller]
    pub fn push_left(&mut self, item: T0) -> Result<()> {
        if self.phase != Phase::AcceptingLeft {
            return Err(ordering_violation(Port::Left, self.phase, Location::caller()));
        }
        let key = (self.key_of_left)(&item).map_err(|source| Error::KeyExtraction {
            port: Port::Left,
            source,
        })?;
        let shard = shard_of(&key, self.shards.len());
        self.shards[shard].push_left(item)
    }

    #[track_caller]
    pub fn push_right(&mut self, item: T1) -> Result<Matches<'_, T0, T1>> {
        match self.phase {
            Phase::AcceptingLeft => self.phase = Phase::AcceptingRight,
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
        let shard = shard_of(&key, self.shards.len());
        self.shards[shard].push_right(item)
    }

    /// Completes every instance and chains their drains, shard by shard.
    #[track_caller]
    pub fn complete(&mut self) -> Result<ShardedDrain<T0, T1>> {
        if self.phase == Phase::Completed {
            let location = Location::caller();
            error!("sharded co-group completed twice, at {location}");
            return Err(Error::DuplicateCompletion { location });
        }
        self.phase = Phase::Completed;
        let drains = self
            .shards
            .iter_mut()
            .map(CoGroup::complete)
            .collect::<Result<Vec<_>>>()?;
        Ok(drains.into_iter().flatten())
    }
}

/// Partitions both inputs by key and runs one co-group per shard on its own
/// thread. The output is grouped by shard.
pub fn run_parallel<T0, T1, K>(
    config: &Config,
    left: impl IntoIterator<Item = T0>,
    right: impl IntoIterator<Item = T1>,
    key_of_left: &KeyFn<T0, K>,
    key_of_right: &KeyFn<T1, K>,
) -> Result<(Vec<OutputPair<T0, T1>>, HostStats)>
where
    T0: Clone + Send,
    T1: Clone + Send,
    K: Eq + Hash,
{
    let shards = config.shards();
    let mut stats = HostStats::default();
    let mut partitions: Vec<(Vec<T0>, Vec<T1>)> =
        (0..shards).map(|_| (Vec::new(), Vec::new())).collect();
    for item in left {
        match key_of_left(&item) {
            Ok(key) => partitions[shard_of(&key, shards)].0.push(item),
            Err(source) => {
                let port = tolerate(
                    config.key_error_policy(),
                    Error::KeyExtraction {
                        port: Port::Left,
                        source,
                    },
                )?;
                stats.record_skipped(port);
            }
        }
    }
    for item in right {
        match key_of_right(&item) {
            Ok(key) => partitions[shard_of(&key, shards)].1.push(item),
            Err(source) => {
                let port = tolerate(
                    config.key_error_policy(),
                    Error::KeyExtraction {
                        port: Port::Right,
                        source,
                    },
                )?;
                stats.record_skipped(port);
            }
        }
    }
    debug!("inputs partitioned into {shards} shards");

    let pool = ThreadPoolBuilder::new()
        .num_threads(shards)
        .thread_name(|index| format!("cogroup-shard-{index}"))
        .build()
        .map_err(|err| Error::Other(Box::new(err)))?;
    let results: Vec<(Vec<OutputPair<T0, T1>>, HostStats)> = pool.install(|| {
        partitions
            .into_par_iter()
            .map(|(left, right)| -> Result<_> {
                let mut operator: CoGroup<T0, T1, K> =
                    CoGroup::from_key_fns(key_of_left.clone(), key_of_right.clone());
                let mut output: Vec<OutputPair<T0, T1>> = Vec::new();
                // keys were already extracted once, they can't fail now
                let shard_stats = run_cogroup(
                    &mut operator,
                    left,
                    right,
                    KeyErrorPolicy::Fail,
                    &mut output,
                )?;
                Ok((output, shard_stats))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut output = Vec::with_capacity(results.iter().map(|(pairs, _)| pairs.len()).sum());
    for (pairs, shard_stats) in results {
        output.extend(pairs);
        stats += shard_stats;
    }
    info!("parallel co-group finished, {}", stats.operator);
    Ok((output, stats))
}
