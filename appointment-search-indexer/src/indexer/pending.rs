//! Pending slot queue shared by the slot consumer and the indexer.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use appointment_search_shared::Slot;

#[derive(Debug, Default)]
struct QueueState {
    running: bool,
    queue: VecDeque<Slot>,
}

/// FIFO of slots waiting to be re-indexed, plus the "slot run active" flag.
///
/// The flag and the queue live under the same lock so a submitter never sees
/// a consumer that is about to stop without draining its slot.
#[derive(Debug, Default)]
pub struct PendingSlots {
    state: Mutex<QueueState>,
}

impl PendingSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a slot for re-indexing.
    ///
    /// Returns the slot back when no run is active: the run flag is now set
    /// and the caller must start a consumer with it. Otherwise the slot is
    /// queued and `None` is returned.
    pub async fn submit(&self, slot: Slot) -> Option<Slot> {
        let mut state = self.state.lock().await;
        if state.running {
            state.queue.push_back(slot);
            None
        } else {
            state.running = true;
            Some(slot)
        }
    }

    /// Next queued slot, or `None` after clearing the run flag when the queue
    /// is empty.
    pub async fn next_or_finish(&self) -> Option<Slot> {
        let mut state = self.state.lock().await;
        let next = state.queue.pop_front();
        if next.is_none() {
            state.running = false;
        }
        next
    }

    /// Remove and return every queued slot of `id_form`, in queue order.
    ///
    /// Slots of other forms stay queued.
    pub async fn drain_form(&self, id_form: i32) -> Vec<Slot> {
        let mut state = self.state.lock().await;
        let (drained, kept): (VecDeque<Slot>, VecDeque<Slot>) = state
            .queue
            .drain(..)
            .partition(|slot| slot.id_form == id_form);
        state.queue = kept;
        drained.into()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.queue.is_empty()
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }
}
