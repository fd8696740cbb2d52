//! Waiting helpers for controller integration tests

use serde_json::Value;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use controller::{ControllerHandle, Notice, NoticeLevel, RemoteEnd, StatusSnapshot};
use shared::ConnectionState;

/// Next frame the controller wrote, parsed as JSON
pub async fn next_frame(remote: &mut RemoteEnd) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(2), remote.next_frame())
        .await
        .expect("no frame within 2s")
        .expect("link dropped");
    serde_json::from_str(&frame).unwrap()
}

/// Skip frames until one satisfies `predicate`
pub async fn frame_matching(remote: &mut RemoteEnd, predicate: impl Fn(&Value) -> bool) -> Value {
    loop {
        let frame = next_frame(remote).await;
        if predicate(&frame) {
            return frame;
        }
    }
}

pub async fn wait_for_state(handle: &ControllerHandle, state: ConnectionState) {
    tokio::time::timeout(Duration::from_secs(60), handle.wait_for_state(state))
        .await
        .unwrap_or_else(|_| panic!("never reached {state}"))
        .unwrap();
}

/// Poll snapshots until `condition` holds
pub async fn wait_for_snapshot(
    handle: &ControllerHandle,
    condition: impl Fn(&StatusSnapshot) -> bool,
) -> StatusSnapshot {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let snapshot = handle.snapshot().await.unwrap();
        if condition(&snapshot) {
            return snapshot;
        }
        assert!(tokio::time::Instant::now() < deadline, "condition never held: {snapshot:?}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Next notice at `level`, skipping others
pub async fn notice_at(notices: &mut broadcast::Receiver<Notice>, level: NoticeLevel) -> Notice {
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let notice = notices.recv().await.unwrap();
            if notice.level == level {
                return notice;
            }
        }
    })
    .await
    .expect("no notice at the expected level")
}

pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>, timeout_ms: u64) -> Option<T> {
    tokio::time::timeout(Duration::from_millis(timeout_ms), rx.recv())
        .await
        .ok()
        .flatten()
}
