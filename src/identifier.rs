// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use std::collections::HashMap;
use std::sync::Mutex;

use mqtt_codec::PacketId;

/// A concurrency-safe mapping from `PacketId` to `V`, shared by the
/// inbound and outbound pipelines. Every operation is a single-key atomic
/// take/put rather than a global transaction, matching the source's
/// `AtomicMap`.
#[derive(Debug)]
pub struct IdentifierTable<V> {
    inner: Mutex<HashMap<u16, V>>,
}

impl<V> IdentifierTable<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Insert `value` at `id`, replacing any prior entry.
    pub fn insert(&self, id: PacketId, value: V) {
        self.inner
            .lock()
            .expect("identifier table mutex poisoned")
            .insert(id.value(), value);
    }

    /// Insert-or-replace `value` at `id`. Distinct name from `insert` to
    /// match the two call sites the spec names, though the behavior is
    /// identical.
    pub fn update(&self, id: PacketId, value: V) {
        self.insert(id, value);
    }

    /// Atomically remove and return the value at `id`, if any.
    pub fn remove(&self, id: PacketId) -> Option<V> {
        self.inner
            .lock()
            .expect("identifier table mutex poisoned")
            .remove(&id.value())
    }

    /// A point-in-time copy of every entry currently held.
    pub fn snapshot(&self) -> Vec<(PacketId, V)>
    where
        V: Clone,
    {
        self.inner
            .lock()
            .expect("identifier table mutex poisoned")
            .iter()
            .map(|(&id, v)| (PacketId::new(id), v.clone()))
            .collect()
    }

    /// Remove and return every entry at once, used by `cancel()` and by
    /// the inbound pipeline's terminal-error path to hand every pending
    /// waiter back to its caller.
    pub fn drain(&self) -> Vec<(PacketId, V)> {
        self.inner
            .lock()
            .expect("identifier table mutex poisoned")
            .drain()
            .map(|(id, v)| (PacketId::new(id), v))
            .collect()
    }
}

impl<V> Default for IdentifierTable<V> {
    fn default() -> Self {
        Self::new()
    }
}
