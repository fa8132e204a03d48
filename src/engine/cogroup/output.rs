// Copyright © 2024 Pathway

use std::iter::{Flatten, FusedIterator};
use std::marker::PhantomData;
use std::{slice, vec};

/// One row of the co-group output. At most one side is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputPair<T0, T1> {
    Both(T0, T1),
    LeftOnly(T0),
    RightOnly(T1),
}

impl<T0, T1> OutputPair<T0, T1> {
    pub fn left(&self) -> Option<&T0> {
        match self {
            Self::Both(left, _) | Self::LeftOnly(left) => Some(left),
            Self::RightOnly(_) => None,
        }
    }

    pub fn right(&self) -> Option<&T1> {
        match self {
            Self::Both(_, right) | Self::RightOnly(right) => Some(right),
            Self::LeftOnly(_) => None,
        }
    }

    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Both(..))
    }

    pub fn map<U0, U1>(
        self,
        map_left: impl FnOnce(T0) -> U0,
        map_right: impl FnOnce(T1) -> U1,
    ) -> OutputPair<U0, U1> {
        match self {
            Self::Both(left, right) => OutputPair::Both(map_left(left), map_right(right)),
            Self::LeftOnly(left) => OutputPair::LeftOnly(map_left(left)),
            Self::RightOnly(right) => OutputPair::RightOnly(map_right(right)),
        }
    }

    pub fn into_parts(self) -> (Option<T0>, Option<T1>) {
        match self {
            Self::Both(left, right) => (Some(left), Some(right)),
            Self::LeftOnly(left) => (Some(left), None),
            Self::RightOnly(right) => (None, Some(right)),
        }
    }
}

/// Output of a single right record: one pair per buffered left record of the
/// same key, or a single [`OutputPair::RightOnly`] if there are none.
///
/// Borrows the left bucket, so the operator can't be driven while it is
/// alive. The right record is cloned for every pair but the last one, which
/// takes it by value.
#[derive(Debug)]
pub struct Matches<'a, T0, T1> {
    left: Option<slice::Iter<'a, T0>>,
    right: Option<T1>,
}

impl<'a, T0, T1> Matches<'a, T0, T1> {
    pub(crate) fn joined(left: &'a [T0], right: T1) -> Self {
        Self {
            left: Some(left.iter()),
            right: Some(right),
        }
    }

    pub(crate) fn unmatched(right: T1) -> Self {
        Self {
            left: None,
            right: Some(right),
        }
    }
}

impl<T0: Clone, T1: Clone> Iterator for Matches<'_, T0, T1> {
    type Item = OutputPair<T0, T1>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(left) = self.left.as_mut() else {
            return self.right.take().map(OutputPair::RightOnly);
        };
        let record = left.next()?.clone();
        let right = if left.len() == 0 {
            self.right.take()?
        } else {
            self.right.clone()?
        };
        Some(OutputPair::Both(record, right))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match (&self.left, &self.right) {
            (_, None) => 0,
            (None, Some(_)) => 1,
            (Some(left), Some(_)) => left.len(),
        };
        (remaining, Some(remaining))
    }
}

impl<T0: Clone, T1: Clone> ExactSizeIterator for Matches<'_, T0, T1> {}

impl<T0: Clone, T1: Clone> FusedIterator for Matches<'_, T0, T1> {}

/// Left records that never met a right record, each paired with an absent
/// right side. Owns its records; the operator is already empty.
#[derive(Debug)]
pub struct Drain<T0, T1> {
    records: Flatten<vec::IntoIter<Vec<T0>>>,
    remaining: usize,
    right: PhantomData<fn() -> T1>,
}

impl<T0, T1> Drain<T0, T1> {
    pub(crate) fn new(buckets: Vec<Vec<T0>>, remaining: usize) -> Self {
        Self {
            records: buckets.into_iter().flatten(),
            remaining,
            right: PhantomData,
        }
    }
}

impl<T0, T1> Iterator for Drain<T0, T1> {
    type Item = OutputPair<T0, T1>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.remaining -= 1;
        Some(OutputPair::LeftOnly(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T0, T1> ExactSizeIterator for Drain<T0, T1> {}

impl<T0, T1> FusedIterator for Drain<T0, T1> {}
