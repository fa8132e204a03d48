// Copyright © 2024 Pathway

pub mod error;
pub use self::error::{Error, Result};

pub mod cogroup;
pub use cogroup::{CoGroup, CoGroupStats, Drain, KeyFn, Matches, OutputPair, Phase, Port};

pub mod host;
pub use host::sharded::{run_parallel, ShardedCoGroup};
pub use host::{run_cogroup, Config, HostStats, KeyErrorPolicy, OutputSink};
