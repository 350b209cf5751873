//! Keep-only-latest frame hand-off.
//!
//! `FrameQueue` is the only cross-thread state in the pipeline: a single slot
//! between the camera's delivery thread and the analysis worker.
//!
//! - `submit` never blocks. When the worker has not consumed the previous
//!   frame, the new frame replaces it and the old one is released on the
//!   spot. The camera is never throttled by a slow classifier; frames are
//!   dropped instead, bounding latency and memory.
//! - `take_latest` never blocks either; the worker parks on the queue's
//!   condvar between frames and is woken by submissions.
//! - `close` stops intake and releases anything still pending.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::frame::RawFrame;

/// What happened to a submitted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored into the empty slot.
    Queued,
    /// Stored; the unconsumed previous frame was released and counted dropped.
    ReplacedPending,
    /// Queue is closed; the frame was released immediately.
    Rejected,
}

#[derive(Default)]
struct Slot {
    frame: Option<RawFrame>,
    closed: bool,
}

/// Capacity-1 hand-off channel with a drop-oldest overflow policy.
pub struct FrameQueue {
    slot: Mutex<Slot>,
    available: Condvar,
    dropped: AtomicU64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            available: Condvar::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Called by the producer thread. Returns without waiting on the worker.
    pub fn submit(&self, frame: RawFrame) -> SubmitOutcome {
        let replaced = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            if slot.closed {
                // Dropping the frame fires its release handle.
                return SubmitOutcome::Rejected;
            }
            slot.frame.replace(frame)
        };

        self.available.notify_one();
        match replaced {
            Some(_old) => {
                // The old frame is released here, outside the lock.
                self.dropped.fetch_add(1, Ordering::Relaxed);
                SubmitOutcome::ReplacedPending
            }
            None => SubmitOutcome::Queued,
        }
    }

    /// Called by the worker thread. Removes and returns the pending frame,
    /// if any; never waits.
    pub fn take_latest(&self) -> Option<RawFrame> {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .frame
            .take()
    }

    /// Park the worker until a frame arrives, the queue closes, or `timeout`
    /// elapses. Returns true while the queue is still open.
    pub(crate) fn wait_for_frame(&self, timeout: Duration) -> bool {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.frame.is_some() || slot.closed {
            return !slot.closed;
        }
        let (slot, _timed_out) = self
            .available
            .wait_timeout(slot, timeout)
            .unwrap_or_else(|e| e.into_inner());
        !slot.closed
    }

    /// Stop accepting frames and release any pending one.
    pub fn close(&self) {
        let pending = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            slot.closed = true;
            slot.frame.take()
        };
        drop(pending);
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).closed
    }

    /// Frames discarded by the replace-on-overflow policy.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ReleaseHandle;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Frame tagged by width, with a counted release handle.
    fn tagged_frame(tag: u32, releases: &Arc<AtomicUsize>) -> RawFrame {
        let releases = Arc::clone(releases);
        RawFrame::new(
            None,
            tag,
            1,
            0.0,
            ReleaseHandle::new(move || {
                releases.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn take_latest_on_empty_queue_is_none() {
        let queue = FrameQueue::new();
        assert!(queue.take_latest().is_none());
    }

    #[test]
    fn overflow_keeps_only_the_latest_and_releases_the_rest() {
        let queue = FrameQueue::new();
        let releases = Arc::new(AtomicUsize::new(0));

        assert_eq!(queue.submit(tagged_frame(1, &releases)), SubmitOutcome::Queued);
        assert_eq!(
            queue.submit(tagged_frame(2, &releases)),
            SubmitOutcome::ReplacedPending
        );
        assert_eq!(
            queue.submit(tagged_frame(3, &releases)),
            SubmitOutcome::ReplacedPending
        );

        // The two replaced frames were released immediately, never leaked.
        assert_eq!(releases.load(Ordering::SeqCst), 2);
        assert_eq!(queue.dropped(), 2);

        let taken = queue.take_latest().expect("latest frame pending");
        assert_eq!(taken.width, 3);
        assert!(queue.take_latest().is_none());

        drop(taken);
        assert_eq!(releases.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn submit_returns_while_slot_is_occupied() {
        // The worker never consumed the first frame; submit must still
        // return promptly rather than wait for a take.
        let queue = FrameQueue::new();
        let releases = Arc::new(AtomicUsize::new(0));

        queue.submit(tagged_frame(1, &releases));
        let outcome = queue.submit(tagged_frame(2, &releases));
        assert_eq!(outcome, SubmitOutcome::ReplacedPending);
    }

    #[test]
    fn close_releases_pending_and_rejects_later_submits() {
        let queue = FrameQueue::new();
        let releases = Arc::new(AtomicUsize::new(0));

        queue.submit(tagged_frame(1, &releases));
        queue.close();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(queue.is_closed());

        assert_eq!(
            queue.submit(tagged_frame(2, &releases)),
            SubmitOutcome::Rejected
        );
        assert_eq!(releases.load(Ordering::SeqCst), 2);
        assert!(queue.take_latest().is_none());
        // Rejected frames are not overflow drops.
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn wait_for_frame_returns_once_closed() {
        let queue = Arc::new(FrameQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                while queue.wait_for_frame(Duration::from_millis(50)) {
                    let _ = queue.take_latest();
                }
            })
        };

        let releases = Arc::new(AtomicUsize::new(0));
        queue.submit(tagged_frame(1, &releases));
        queue.close();
        waiter.join().expect("waiter thread");
    }
}
