// Copyright © 2024 Pathway

use std::fmt;
use std::ops::AddAssign;

/// Counters of a single operator, or of several merged with `+=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoGroupStats {
    pub left_records: usize,
    pub left_keys: usize,
    pub right_records: usize,
    /// Left keys referenced by at least one right record.
    pub matched_keys: usize,
    /// Right records whose key was never seen on the left.
    pub right_unmatched: usize,
    /// Left records emitted with an absent right side at completion.
    pub left_drained: usize,
}

impl AddAssign for CoGroupStats {
    fn add_assign(&mut self, other: Self) {
        self.left_records += other.left_records;
        self.left_keys += other.left_keys;
        self.right_records += other.right_records;
        self.matched_keys += other.matched_keys;
        self.right_unmatched += other.right_unmatched;
        self.left_drained += other.left_drained;
    }
}

impl fmt::Display for CoGroupStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "left: {} records under {} keys ({} matched, {} drained), right: {} records ({} unmatched)",
            self.left_records,
            self.left_keys,
            self.matched_keys,
            self.left_drained,
            self.right_records,
            self.right_unmatched
        )
    }
}
