//! Thread safe, interpolating time history
mod snapshot;

pub use snapshot::Snapshot;

use log::{debug, warn};
use parking_lot::Mutex;
use std::cmp::Ordering;
use thiserror::Error;

use crate::{cfg::Config, interp::Interpolate, sample::ValueSample};

/// Hard ceiling on the number of samples a history retains,
/// whatever the requested capacity.
pub const MAX_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("history capacity must be at least one sample")]
    ZeroCapacity,
    #[error("sensor update rate must be non zero")]
    NullUpdateRate,
    #[error("invalid history length: {0} s")]
    InvalidHistoryLength(f64),
    #[error("quaternion of null magnitude cannot be normalized")]
    NullQuaternion,
}

/// Result of a timestamp lookup, as slot indexes.
#[derive(Debug, Copy, Clone, PartialEq)]
enum Lookup {
    Exact(usize),
    Bracket { preceding: usize, following: usize },
}

/// Ring storage, only accessed with the lock held.
#[derive(Debug)]
struct Ring<T> {
    /// Preallocated slots, never resized
    slots: Box<[ValueSample<T>]>,
    /// Next slot to be written
    cursor: usize,
    /// Number of valid slots, walking backwards from cursor
    valid: usize,
}

impl<T> Ring<T> {
    fn previous(&self, index: usize) -> usize {
        if index == 0 {
            self.slots.len() - 1
        } else {
            index - 1
        }
    }
    fn newest(&self) -> Option<&ValueSample<T>> {
        if self.valid == 0 {
            return None;
        }
        let slot = &self.slots[self.previous(self.cursor)];
        // invalidated by a concurrent reset
        if slot.is_valid() {
            Some(slot)
        } else {
            None
        }
    }
    fn oldest_index(&self) -> usize {
        let size = self.slots.len();
        (self.cursor + size - self.valid) % size
    }
    /*
     * Walks from newest to oldest sample, tracking the nearest preceding
     * and following samples. Producers insert in chronological order:
     * once a preceding sample is found and a following one is known,
     * older samples cannot get any closer.
     */
    fn lookup(&self, requested: i64) -> Option<Lookup> {
        let mut preceding: Option<(usize, i128)> = None;
        let mut following: Option<(usize, i128)> = None;
        let mut index = self.cursor;

        for _ in 0..self.valid {
            index = self.previous(index);
            let slot = &self.slots[index];
            if !slot.is_valid() {
                continue;
            }
            let delta = i128::from(slot.timestamp()) - i128::from(requested);
            match delta.cmp(&0) {
                Ordering::Equal => return Some(Lookup::Exact(index)),
                Ordering::Less => {
                    if preceding.is_none_or(|(_, nearest)| delta > nearest) {
                        preceding = Some((index, delta));
                        if following.is_some() {
                            break;
                        }
                    }
                },
                Ordering::Greater => {
                    if following.is_none_or(|(_, nearest)| delta < nearest) {
                        following = Some((index, delta));
                    }
                },
            }
        }

        match (preceding, following) {
            (Some((preceding, _)), Some((following, _))) => Some(Lookup::Bracket {
                preceding,
                following,
            }),
            _ => None,
        }
    }
}

/// Fixed capacity, time indexed history of samples.
///
/// A single producer [TimeHistory::add]s samples at sensor rate, in
/// chronological order, while any number of readers retrieve them by
/// timestamp. Readers only ever obtain copies: nothing references the
/// internal storage, which is allocated once at construction from a
/// prototype value and then recycled.
///
/// Lookups never extrapolate: a timestamp outside of the retained span
/// is simply not found.
///
/// ```
/// use interp_history::prelude::TimeHistory;
///
/// let history = TimeHistory::new(3, 0.0_f64).unwrap();
/// history.add(100, &1.0);
/// history.add(200, &3.0);
///
/// let sample = history.get(150).unwrap();
/// assert!(sample.interpolated());
/// assert_eq!(sample.timestamp(), 150);
/// assert!((sample.value() - 2.0).abs() < 1.0E-9);
///
/// assert!(history.get(250).is_none());
/// ```
#[derive(Debug)]
pub struct TimeHistory<T> {
    ring: Mutex<Ring<T>>,
    capacity: usize,
}

impl<T: Interpolate> TimeHistory<T> {
    /// Builds a new history of `capacity` samples, preallocated from `prototype`.
    /// Capacity is clamped to [MAX_CAPACITY].
    pub fn new(capacity: usize, prototype: T) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        let capacity = if capacity > MAX_CAPACITY {
            warn!(
                "history capacity {} exceeds {}: clamped",
                capacity, MAX_CAPACITY
            );
            MAX_CAPACITY
        } else {
            capacity
        };

        let prototype = ValueSample::new(prototype);
        let slots = vec![prototype; capacity].into_boxed_slice();
        debug!("new history: {} samples", capacity);

        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                cursor: 0,
                valid: 0,
            }),
            capacity,
        })
    }
    /// Builds a new history covering the time span described by [Config].
    pub fn from_config(cfg: &Config, prototype: T) -> Result<Self, Error> {
        Self::new(cfg.capacity()?, prototype)
    }
    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Number of valid samples currently retained
    pub fn len(&self) -> usize {
        self.ring.lock().valid
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Stores a new measurement, overwriting the oldest one once full.
    /// Timestamps are expected to increase strictly.
    pub fn add(&self, timestamp: i64, value: &T) {
        let mut ring = self.ring.lock();

        if let Some(newest) = ring.newest().map(|s| s.timestamp()) {
            if timestamp <= newest {
                warn!(
                    "out of order sample: {} is not after {}",
                    timestamp, newest
                );
            }
        }

        let cursor = ring.cursor;
        ring.slots[cursor].set(timestamp, value);
        ring.cursor = (cursor + 1) % self.capacity;
        if ring.valid < self.capacity {
            ring.valid += 1;
        }
    }
    /// Stores a copy of given sample. Its flags are not preserved:
    /// it is stored as a valid measurement.
    pub fn add_sample(&self, sample: &ValueSample<T>) {
        self.add(sample.timestamp(), sample.value());
    }
    /// Invalidates all samples. Storage is retained.
    pub fn reset(&self) {
        let mut ring = self.ring.lock();
        for slot in ring.slots.iter_mut() {
            slot.set_valid(false);
        }
        ring.cursor = 0;
        ring.valid = 0;
        debug!("history reset");
    }
    /// Returns a copy of the most recent sample.
    pub fn most_recent(&self) -> Option<ValueSample<T>> {
        self.ring.lock().newest().cloned()
    }
    /// Copies the most recent sample into `out`, reusing its storage.
    /// Returns false when the history is empty.
    pub fn most_recent_into(&self, out: &mut ValueSample<T>) -> bool {
        let ring = self.ring.lock();
        match ring.newest() {
            Some(newest) => {
                out.clone_from(newest);
                true
            },
            None => false,
        }
    }
    /// Returns the sample at `timestamp`: either a copy of the measurement
    /// stamped exactly at `timestamp`, or a new sample interpolated between
    /// the nearest preceding and following measurements.
    /// Returns None when `timestamp` is not within the retained span.
    pub fn get(&self, timestamp: i64) -> Option<ValueSample<T>> {
        let (preceding, following) = {
            let ring = self.ring.lock();
            match ring.lookup(timestamp)? {
                Lookup::Exact(index) => return Some(ring.slots[index].clone()),
                Lookup::Bracket {
                    preceding,
                    following,
                } => (ring.slots[preceding].clone(), ring.slots[following].clone()),
            }
        };
        // interpolate on our own copies, without stalling the producer
        Some(preceding.interpolate_at(&following, timestamp))
    }
    /// Same as [Self::get], writing into `out`.
    /// Exact matches are copied into the storage of `out`. An interpolated
    /// result is a new value that replaces `out`, its previous storage dropped.
    pub fn get_into(&self, timestamp: i64, out: &mut ValueSample<T>) -> bool {
        let (preceding, following) = {
            let ring = self.ring.lock();
            match ring.lookup(timestamp) {
                None => return false,
                Some(Lookup::Exact(index)) => {
                    out.clone_from(&ring.slots[index]);
                    return true;
                },
                Some(Lookup::Bracket {
                    preceding,
                    following,
                }) => (ring.slots[preceding].clone(), ring.slots[following].clone()),
            }
        };
        *out = preceding.interpolate_at(&following, timestamp);
        true
    }
    /// Returns the oldest and newest retained timestamps.
    pub fn span(&self) -> Option<(i64, i64)> {
        let ring = self.ring.lock();
        let newest = ring.newest()?.timestamp();
        let oldest = ring.slots[ring.oldest_index()].timestamp();
        Some((oldest, newest))
    }
    /// Deep copies all valid samples, oldest first, so they may be
    /// processed without holding the lock.
    pub fn snapshot(&self) -> Snapshot<T> {
        let ring = self.ring.lock();
        let oldest = ring.oldest_index();
        let samples = (0..ring.valid)
            .map(|i| &ring.slots[(oldest + i) % self.capacity])
            .filter(|slot| slot.is_valid())
            .cloned()
            .collect();
        Snapshot::new(samples)
    }
}
