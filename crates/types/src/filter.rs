use crate::Log;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Number of indexed topic slots a log can carry.
pub const TOPIC_SLOTS: usize = 4;

/// Errors raised while building a [`FilterSpec`].
///
/// Filter construction is the only point at which filtering can fail;
/// matching itself is infallible.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A topic constraint referenced a slot beyond the last indexed slot.
    #[error("topic slot {0} out of range, logs carry at most {TOPIC_SLOTS} topics")]
    TopicSlotOutOfRange(usize),
}

/// Address and topic matcher applied to logs before they are admitted
/// to the store.
///
/// A log matches iff its address is in the address set (an empty set
/// matches any address) and, for every topic slot, either the slot is
/// unconstrained or the log's topic at that slot is in the slot's set.
/// A constrained slot the log has no topic for does not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    addresses: HashSet<Address>,
    topics: [Option<HashSet<B256>>; TOPIC_SLOTS],
}

impl FilterSpec {
    /// Creates a match-all filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `address` to the address set.
    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.insert(address);
        self
    }

    /// Constrains topic `slot` to additionally accept `topic`.
    pub fn with_topic(mut self, slot: usize, topic: B256) -> Result<Self, FilterError> {
        let set = self
            .topics
            .get_mut(slot)
            .ok_or(FilterError::TopicSlotOutOfRange(slot))?;
        set.get_or_insert_with(HashSet::new).insert(topic);
        Ok(self)
    }

    /// Returns the configured address set.
    pub const fn addresses(&self) -> &HashSet<Address> {
        &self.addresses
    }

    /// Returns the per-slot topic constraints.
    pub const fn topics(&self) -> &[Option<HashSet<B256>>; TOPIC_SLOTS] {
        &self.topics
    }

    /// Returns `true` if the filter constrains nothing.
    pub fn is_match_all(&self) -> bool {
        self.addresses.is_empty() && self.topics.iter().all(Option::is_none)
    }

    /// Returns `true` if `log` passes the filter.
    pub fn matches(&self, log: &Log) -> bool {
        if !self.addresses.is_empty() && !self.addresses.contains(&log.address) {
            return false;
        }
        self.topics.iter().enumerate().all(|(slot, constraint)| match constraint {
            None => true,
            Some(set) => log.topic(slot).is_some_and(|topic| set.contains(topic)),
        })
    }
}
