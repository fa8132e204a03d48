// Copyright © 2024 Pathway

use crossbeam_channel::Sender;

use crate::engine::cogroup::OutputPair;
use crate::engine::error::DynResult;

/// Destination of the pairs produced by a co-group run.
pub trait OutputSink<T0, T1> {
    fn give(&mut self, pair: OutputPair<T0, T1>) -> DynResult<()>;
}

impl<T0, T1> OutputSink<T0, T1> for Vec<OutputPair<T0, T1>> {
    fn give(&mut self, pair: OutputPair<T0, T1>) -> DynResult<()> {
        self.push(pair);
        Ok(())
    }
}

impl<T0, T1> OutputSink<T0, T1> for Sender<OutputPair<T0, T1>> {
    fn give(&mut self, pair: OutputPair<T0, T1>) -> DynResult<()> {
        self.send(pair)
            .map_err(|_| "output channel disconnected".into())
    }
}
