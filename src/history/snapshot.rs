use crate::{interp::Interpolate, sample::ValueSample};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point in time copy of a [TimeHistory](super::TimeHistory): its valid
/// samples, oldest first. Shares nothing with the history.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot<T> {
    samples: Vec<ValueSample<T>>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new(samples: Vec<ValueSample<T>>) -> Self {
        Self { samples }
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    /// Oldest sample
    pub fn first(&self) -> Option<&ValueSample<T>> {
        self.samples.first()
    }
    /// Newest sample
    pub fn last(&self) -> Option<&ValueSample<T>> {
        self.samples.last()
    }
    /// Oldest and newest timestamps
    pub fn span(&self) -> Option<(i64, i64)> {
        Some((self.first()?.timestamp(), self.last()?.timestamp()))
    }
    /// Iterates samples in chronological order
    pub fn iter(&self) -> std::slice::Iter<'_, ValueSample<T>> {
        self.samples.iter()
    }
    pub fn as_slice(&self) -> &[ValueSample<T>] {
        &self.samples
    }
}

impl<T: Interpolate> Snapshot<T> {
    /// Same lookup rule as [TimeHistory::get](super::TimeHistory::get).
    pub fn get(&self, timestamp: i64) -> Option<ValueSample<T>> {
        let index = self
            .samples
            .partition_point(|s| s.timestamp() < timestamp);
        let following = self.samples.get(index)?;
        if following.timestamp() == timestamp {
            return Some(following.clone());
        }
        let preceding = self.samples.get(index.checked_sub(1)?)?;
        Some(preceding.interpolate_at(following, timestamp))
    }
}

impl<T> IntoIterator for Snapshot<T> {
    type Item = ValueSample<T>;
    type IntoIter = std::vec::IntoIter<ValueSample<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Snapshot<T> {
    type Item = &'a ValueSample<T>;
    type IntoIter = std::slice::Iter<'a, ValueSample<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
