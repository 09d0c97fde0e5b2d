//! Per-attempt upload state and the task-wide cancellation flag

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const RESPONDED: u8 = 2;

/// Cancellation flag shared between an upload task and whoever may cancel it
///
/// Cancellation and completion race for the same atomic: whichever of
/// [`cancel`](CancelHandle::cancel) and the executor's completion claim
/// moves the flag out of the running state first wins, and the other one
/// observes the outcome. All accesses are `SeqCst`.
///
/// # Examples
///
/// ```
/// use upload_service::upload::CancelHandle;
///
/// let handle = CancelHandle::new();
/// let remote = handle.clone();
/// assert!(handle.should_continue());
///
/// assert!(remote.cancel());
/// assert!(!handle.should_continue());
/// assert!(handle.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct CancelHandle {
    phase: Arc<AtomicU8>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self {
            phase: Arc::new(AtomicU8::new(RUNNING)),
        }
    }
}

impl CancelHandle {
    /// Create a handle in the running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    ///
    /// Returns `false` when a response already won the race, in which case
    /// nothing changes. Cancelling twice is harmless.
    pub fn cancel(&self) -> bool {
        match self
            .phase
            .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(current) => current == CANCELLED,
        }
    }

    /// True until the upload is cancelled or a response has been accepted
    pub fn should_continue(&self) -> bool {
        self.phase.load(Ordering::SeqCst) == RUNNING
    }

    /// Whether cancellation won
    pub fn is_cancelled(&self) -> bool {
        self.phase.load(Ordering::SeqCst) == CANCELLED
    }

    /// Accept a response; fails if cancellation came first
    pub(crate) fn claim_response(&self) -> bool {
        self.phase
            .compare_exchange(RUNNING, RESPONDED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// State of one upload attempt
///
/// Created fresh for every attempt; only the [`CancelHandle`] is shared with
/// other attempts of the same task.
#[derive(Debug, Default)]
pub struct UploadState {
    total_bytes: AtomicU64,
    bytes_transferred: AtomicU64,
    all_files_successfully_uploaded: AtomicBool,
    cancel: CancelHandle,
}

impl UploadState {
    /// Create state bound to a task's cancellation flag
    pub fn new(cancel: CancelHandle) -> Self {
        Self {
            total_bytes: AtomicU64::new(0),
            bytes_transferred: AtomicU64::new(0),
            all_files_successfully_uploaded: AtomicBool::new(false),
            cancel,
        }
    }

    /// Expected body length of this attempt
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::SeqCst)
    }

    /// Bytes written so far in this attempt
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::SeqCst)
    }

    /// Whether the attempt ended with a successful, non-cancelled response
    pub fn all_files_successfully_uploaded(&self) -> bool {
        self.all_files_successfully_uploaded.load(Ordering::SeqCst)
    }

    /// The task's cancellation flag
    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    pub(crate) fn reset(&self) {
        self.all_files_successfully_uploaded
            .store(false, Ordering::SeqCst);
        self.bytes_transferred.store(0, Ordering::SeqCst);
        self.total_bytes.store(0, Ordering::SeqCst);
    }

    pub(crate) fn set_total_bytes(&self, total_bytes: u64) {
        self.total_bytes.store(total_bytes, Ordering::SeqCst);
    }

    /// Add written bytes if the upload is still running, returning the new total
    pub(crate) fn add_transferred(&self, bytes: u64) -> Option<u64> {
        if !self.cancel.should_continue() {
            return None;
        }
        Some(self.bytes_transferred.fetch_add(bytes, Ordering::SeqCst) + bytes)
    }

    pub(crate) fn mark_successful(&self) {
        self.all_files_successfully_uploaded
            .store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_after_response_has_no_effect() {
        let handle = CancelHandle::new();
        assert!(handle.claim_response());
        assert!(!handle.cancel());
        assert!(!handle.is_cancelled());
        assert!(!handle.should_continue());
    }

    #[test]
    fn response_after_cancel_is_rejected() {
        let handle = CancelHandle::new();
        assert!(handle.cancel());
        assert!(handle.cancel(), "second cancel still reports cancelled");
        assert!(!handle.claim_response());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn transferred_bytes_stop_counting_after_cancel() {
        let state = UploadState::new(CancelHandle::new());
        state.reset();
        state.set_total_bytes(100);
        assert_eq!(state.add_transferred(40), Some(40));
        assert_eq!(state.add_transferred(10), Some(50));

        state.cancel_handle().cancel();
        assert_eq!(state.add_transferred(10), None);
        assert_eq!(state.bytes_transferred(), 50);
        assert_eq!(state.total_bytes(), 100);
    }

    #[test]
    fn reset_clears_success() {
        let state = UploadState::default();
        state.mark_successful();
        state.reset();
        assert!(!state.all_files_successfully_uploaded());
        assert_eq!(state.bytes_transferred(), 0);
    }

    #[test]
    fn concurrent_cancel_and_claim_have_one_winner() {
        for _ in 0..200 {
            let handle = CancelHandle::new();
            let remote = handle.clone();
            let canceller = std::thread::spawn(move || remote.cancel());
            let claimed = handle.claim_response();
            let cancelled = canceller.join().unwrap_or(false);
            assert_ne!(claimed, cancelled, "exactly one side must win");
        }
    }
}
