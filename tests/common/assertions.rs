//! Event collection helpers

use std::time::Duration;
use tokio::sync::broadcast;
use upload_service::{Event, ServerResponse};

/// Terminal state of an upload task as seen through its events
#[derive(Debug)]
pub enum WaitResult {
    /// The task got a response; `successful` mirrors the status code
    Completed { successful: bool },
    /// The task was cancelled
    Cancelled,
    /// The task failed with an error code
    Failed(String),
    /// Timeout waiting for a terminal event
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Collect events until a terminal one arrives
///
/// Returns every event seen, terminal event included, with the outcome.
pub async fn collect_until_terminal(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
) -> (Vec<Event>, WaitResult) {
    let mut seen = Vec::new();

    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let terminal = match &event {
                        Event::Completed { successful, .. } => Some(WaitResult::Completed {
                            successful: *successful,
                        }),
                        Event::Cancelled { .. } => Some(WaitResult::Cancelled),
                        Event::Error { code, .. } => Some(WaitResult::Failed(code.clone())),
                        _ => None,
                    };
                    seen.push(event);
                    if let Some(terminal) = terminal {
                        return terminal;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    match result {
        Ok(wait_result) => (seen, wait_result),
        Err(_) => (seen, WaitResult::Timeout),
    }
}

/// Uploaded byte counts from progress events, in order
pub fn progress_values(events: &[Event]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Progress { uploaded_bytes, .. } => Some(*uploaded_bytes),
            _ => None,
        })
        .collect()
}

/// Responses delivered through `ResponseReceived` events
pub fn received_responses(events: &[Event]) -> Vec<ServerResponse> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::ResponseReceived { response, .. } => Some(response.clone()),
            _ => None,
        })
        .collect()
}

/// Assert that progress never decreases and ends at `total`
pub fn assert_progress_reaches(events: &[Event], total: u64) {
    let values = progress_values(events);
    assert!(
        values.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress went backwards: {values:?}"
    );
    assert_eq!(values.last().copied().unwrap_or(0), total, "final progress");
}
