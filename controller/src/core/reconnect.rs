//! Bounded, fixed-delay reconnection policy

use tokio::time::{Duration, Instant};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// A scheduled retry; cancelling it is dropping it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRetry {
    pub attempt: u32,
    pub due: Instant,
}

/// What the policy decided after the link went down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Scheduled(PendingRetry),
    /// Auto-reconnect is switched off
    Disabled,
    /// The attempt bound was hit; only a manual open restarts the cycle
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    delay: Duration,
    auto_reconnect_enabled: bool,
    attempt_count: u32,
    pending: Option<PendingRetry>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            auto_reconnect_enabled: true,
            attempt_count: 0,
            pending: None,
        }
    }

    /// The link closed or a handshake failed
    pub fn on_closed(&mut self, now: Instant) -> ReconnectDecision {
        self.pending = None;

        if !self.auto_reconnect_enabled {
            return ReconnectDecision::Disabled;
        }
        if self.attempt_count >= self.max_attempts {
            return ReconnectDecision::Exhausted { attempts: self.attempt_count };
        }

        self.attempt_count += 1;
        let retry = PendingRetry { attempt: self.attempt_count, due: now + self.delay };
        self.pending = Some(retry);
        ReconnectDecision::Scheduled(retry)
    }

    /// Handshake succeeded. An open link always re-arms auto-reconnect, even
    /// when it was switched off while the handshake was in flight.
    pub fn on_connected(&mut self) {
        self.auto_reconnect_enabled = true;
        self.attempt_count = 0;
        self.pending = None;
    }

    /// Operator asked for a connection
    pub fn on_manual_open(&mut self) {
        self.auto_reconnect_enabled = true;
        self.attempt_count = 0;
        self.pending = None;
    }

    /// Turn auto-reconnect off. Returns true when a scheduled retry was cancelled.
    pub fn stop_auto_reconnect(&mut self) -> bool {
        self.auto_reconnect_enabled = false;
        self.attempt_count = 0;
        self.pending.take().is_some()
    }

    /// Hand out the pending retry once its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<PendingRetry> {
        match self.pending {
            Some(retry) if retry.due <= now => self.pending.take(),
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|retry| retry.due)
    }

    pub fn pending(&self) -> Option<PendingRetry> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.auto_reconnect_enabled
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_closes_then_exhausted() {
        let mut policy = ReconnectPolicy::default();
        let start = Instant::now();
        let mut now = start;

        for expected in 1..=10 {
            match policy.on_closed(now) {
                ReconnectDecision::Scheduled(retry) => {
                    assert_eq!(retry.attempt, expected);
                    assert_eq!(retry.due, now + Duration::from_millis(3000));
                    now = retry.due;
                    assert_eq!(policy.take_due(now), Some(retry));
                }
                other => panic!("attempt {expected}: unexpected {other:?}"),
            }
        }

        assert_eq!(policy.on_closed(now), ReconnectDecision::Exhausted { attempts: 10 });
        assert!(!policy.is_pending());
        assert_eq!(now - start, Duration::from_millis(30_000));
    }

    #[test]
    fn test_take_due_waits_for_deadline() {
        let mut policy = ReconnectPolicy::default();
        let now = Instant::now();
        policy.on_closed(now);

        assert!(policy.take_due(now + Duration::from_millis(2999)).is_none());
        assert!(policy.take_due(now + Duration::from_millis(3000)).is_some());
        assert!(policy.take_due(now + Duration::from_millis(9000)).is_none());
    }

    #[test]
    fn test_stop_cancels_pending_and_is_idempotent() {
        let mut policy = ReconnectPolicy::default();
        let now = Instant::now();
        for _ in 0..3 {
            policy.on_closed(now);
        }
        assert_eq!(policy.attempt_count(), 3);

        assert!(policy.stop_auto_reconnect());
        assert!(!policy.stop_auto_reconnect());
        assert!(!policy.is_enabled());
        assert_eq!(policy.attempt_count(), 0);
        assert_eq!(policy.next_deadline(), None);

        assert_eq!(policy.on_closed(now), ReconnectDecision::Disabled);
    }

    #[test]
    fn test_manual_open_restarts_cycle() {
        let mut policy = ReconnectPolicy::new(2, Duration::from_millis(10));
        let now = Instant::now();
        policy.on_closed(now);
        policy.on_closed(now);
        assert!(matches!(policy.on_closed(now), ReconnectDecision::Exhausted { attempts: 2 }));

        policy.on_manual_open();
        assert!(matches!(policy.on_closed(now), ReconnectDecision::Scheduled(PendingRetry { attempt: 1, .. })));
    }

    #[test]
    fn test_manual_open_reenables_after_stop() {
        let mut policy = ReconnectPolicy::default();
        policy.stop_auto_reconnect();
        policy.on_manual_open();
        assert!(policy.is_enabled());
    }

    #[test]
    fn test_connected_resets_attempts() {
        let mut policy = ReconnectPolicy::default();
        let now = Instant::now();
        policy.on_closed(now);
        policy.on_closed(now);

        policy.on_connected();
        assert_eq!(policy.attempt_count(), 0);
        assert!(!policy.is_pending());
    }

    #[test]
    fn test_connected_reenables_after_stop() {
        let mut policy = ReconnectPolicy::default();
        let now = Instant::now();
        policy.stop_auto_reconnect();
        assert_eq!(policy.on_closed(now), ReconnectDecision::Disabled);

        // A handshake already in flight when auto-reconnect was stopped
        policy.on_connected();
        assert!(policy.is_enabled());
        assert!(matches!(policy.on_closed(now), ReconnectDecision::Scheduled(PendingRetry { attempt: 1, .. })));
    }

    #[test]
    fn test_new_close_replaces_pending_retry() {
        let mut policy = ReconnectPolicy::default();
        let now = Instant::now();
        policy.on_closed(now);
        let later = now + Duration::from_millis(500);
        policy.on_closed(later);

        assert_eq!(policy.next_deadline(), Some(later + Duration::from_millis(3000)));
    }
}
