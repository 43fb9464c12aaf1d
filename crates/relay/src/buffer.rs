//! In-flight media groups.
//!
//! Every operation takes the single buffer lock for the duration of a map
//! lookup/insert/remove only; the lock is never held across an `.await`.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use {postrelay_channels::ItemId, tokio::task::JoinHandle};

use crate::key::GroupKey;

struct PendingGroup {
    items: Vec<ItemId>,
    generation: u64,
    opened_at: Instant,
    /// Completion task spawned when the group was opened. Dropping the
    /// handle detaches the task; it is only aborted on shutdown.
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Groups {
    pending: HashMap<GroupKey, PendingGroup>,
    next_generation: u64,
}

/// Outcome of [`GroupBuffer::append_or_open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// `true` if this item opened a new group (and spawned its timer).
    pub opened: bool,
    /// Instance number of the group the item was appended to.
    pub generation: u64,
    /// Number of items buffered for the group after the append.
    pub len: usize,
}

/// A group extracted from the buffer, items sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedGroup {
    pub items: Vec<ItemId>,
    pub age: Duration,
}

/// Outcome of [`GroupBuffer::take`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Take {
    Completed(CompletedGroup),
    /// No group is buffered under the key.
    Missing,
    /// A different instance of the group is buffered under the key.
    Superseded { current: u64 },
}

/// Table of media groups waiting for their grace period to elapse.
#[derive(Default)]
pub struct GroupBuffer {
    groups: Mutex<Groups>,
}

impl GroupBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Groups> {
        self.groups.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append `item` to the group under `key`, opening the group first if it
    /// is not buffered.
    ///
    /// `spawn_timer` is called at most once per opened group, with the new
    /// group's generation, while the buffer lock is held. It must not block.
    pub fn append_or_open<F>(&self, key: GroupKey, item: ItemId, spawn_timer: F) -> Appended
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        let mut groups = self.lock();
        let Groups {
            pending,
            next_generation,
        } = &mut *groups;

        let mut opened = false;
        let group = pending.entry(key).or_insert_with(|| {
            opened = true;
            let generation = *next_generation;
            *next_generation += 1;
            PendingGroup {
                items: Vec::new(),
                generation,
                opened_at: Instant::now(),
                timer: spawn_timer(generation),
            }
        });
        group.items.push(item);

        Appended {
            opened,
            generation: group.generation,
            len: group.items.len(),
        }
    }

    /// Extract and remove the group under `key` if it is the instance
    /// numbered `generation`.
    pub fn take(&self, key: &GroupKey, generation: u64) -> Take {
        let mut groups = self.lock();
        match groups.pending.get(key) {
            None => Take::Missing,
            Some(group) if group.generation != generation => Take::Superseded {
                current: group.generation,
            },
            Some(_) => {
                let Some(group) = groups.pending.remove(key) else {
                    return Take::Missing;
                };
                let mut items = group.items;
                items.sort_unstable();
                Take::Completed(CompletedGroup {
                    items,
                    age: group.opened_at.elapsed(),
                })
            },
        }
    }

    /// Number of groups currently buffered.
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every pending completion task and drop the buffered groups.
    /// Returns the keys of the groups that were discarded.
    pub fn abort_all(&self) -> Vec<GroupKey> {
        let mut groups = self.lock();
        groups
            .pending
            .drain()
            .map(|(key, group)| {
                group.timer.abort();
                key
            })
            .collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        postrelay_channels::{FeedId, GroupId},
    };

    fn key(group: &str) -> GroupKey {
        GroupKey::new(FeedId(-100), GroupId::new(group))
    }

    fn idle() -> JoinHandle<()> {
        tokio::spawn(async {})
    }

    #[tokio::test]
    async fn opens_once_then_appends() {
        let buffer = GroupBuffer::new();
        let mut spawned = 0;

        for id in [103, 101, 102] {
            buffer.append_or_open(key("g"), ItemId(id), |_| {
                spawned += 1;
                idle()
            });
        }

        assert_eq!(spawned, 1);
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn take_sorts_and_removes() {
        let buffer = GroupBuffer::new();
        let first = buffer.append_or_open(key("g"), ItemId(103), |_| idle());
        buffer.append_or_open(key("g"), ItemId(101), |_| idle());
        let last = buffer.append_or_open(key("g"), ItemId(102), |_| idle());

        assert!(first.opened);
        assert!(!last.opened);
        assert_eq!(last.len, 3);

        let Take::Completed(group) = buffer.take(&key("g"), first.generation) else {
            panic!("group should complete");
        };
        assert_eq!(group.items, vec![ItemId(101), ItemId(102), ItemId(103)]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.take(&key("g"), first.generation), Take::Missing);
    }

    #[tokio::test]
    async fn reopened_key_gets_new_generation() {
        let buffer = GroupBuffer::new();
        let first = buffer.append_or_open(key("g"), ItemId(1), |_| idle());
        assert!(matches!(
            buffer.take(&key("g"), first.generation),
            Take::Completed(_)
        ));

        let second = buffer.append_or_open(key("g"), ItemId(2), |_| idle());
        assert!(second.opened);
        assert_ne!(second.generation, first.generation);

        // A stale completion for the first instance must not consume the second.
        assert_eq!(
            buffer.take(&key("g"), first.generation),
            Take::Superseded {
                current: second.generation
            }
        );
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn abort_all_discards_everything() {
        let buffer = GroupBuffer::new();
        buffer.append_or_open(key("a"), ItemId(1), |_| {
            tokio::spawn(std::future::pending::<()>())
        });
        buffer.append_or_open(key("b"), ItemId(2), |_| idle());

        let mut dropped = buffer.abort_all();
        dropped.sort_by(|a, b| a.group().as_str().cmp(b.group().as_str()));
        assert_eq!(dropped, vec![key("a"), key("b")]);
        assert!(buffer.is_empty());
    }
}
