//! Inbound frame guard: rate window, structure and payload size.

use resolvinator_core::error::ProtocolError;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::frame::InboundFrame;

/// Fixed counting window that resets wholesale once it has expired.
#[derive(Debug, Clone)]
pub struct RateWindow {
    length: Duration,
    max: u32,
    started: Option<Instant>,
    count: u32,
}

impl RateWindow {
    /// Creates a window admitting `max` frames per `length`.
    #[must_use]
    pub fn new(max: u32, length: Duration) -> Self {
        Self {
            length,
            max,
            started: None,
            count: 0,
        }
    }

    /// Counts one frame at `now`; returns false once the window is over its limit.
    ///
    /// A rejected frame is still counted and does not restart the window.
    pub fn admit(&mut self, now: Instant) -> bool {
        let expired = self
            .started
            .is_none_or(|start| now.saturating_duration_since(start) > self.length);
        if expired {
            self.started = Some(now);
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        self.count <= self.max
    }

    /// Frames counted in the current window.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Configured maximum per window.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }
}

/// Decides whether an inbound text frame may reach the router.
///
/// Checks run in order: JSON decoding, rate window, required fields,
/// payload size. Text that is not JSON at all is rejected before it is
/// counted.
#[derive(Debug, Clone)]
pub struct FrameValidator {
    window: RateWindow,
    max_payload_bytes: usize,
}

impl FrameValidator {
    /// Creates a validator.
    #[must_use]
    pub fn new(max_frames: u32, window: Duration, max_payload_bytes: usize) -> Self {
        Self {
            window: RateWindow::new(max_frames, window),
            max_payload_bytes,
        }
    }

    /// Validates one frame received at `now`.
    pub fn validate(&mut self, text: &str, now: Instant) -> Result<InboundFrame, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(|e| ProtocolError::MalformedJson {
            reason: e.to_string(),
        })?;

        if !self.window.admit(now) {
            return Err(ProtocolError::RateLimited {
                count: self.window.count(),
                limit: self.window.max(),
            });
        }

        let frame = InboundFrame::from_value(value)?;

        let size = serde_json::to_string(&frame.payload).map_or(0, |s| s.len());
        if size > self.max_payload_bytes {
            return Err(ProtocolError::PayloadTooLarge {
                size,
                limit: self.max_payload_bytes,
            });
        }

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FRAME: &str = r#"{"topic":"system","event":"system:ping","payload":{},"ref":null}"#;

    fn validator() -> FrameValidator {
        FrameValidator::new(100, Duration::from_secs(60), 1024 * 1024)
    }

    #[test]
    fn test_hundred_and_first_frame_is_rejected() {
        let mut validator = validator();
        let start = Instant::now();

        for i in 0..100 {
            let at = start + Duration::from_millis(i * 100);
            assert!(validator.validate(FRAME, at).is_ok(), "frame {i} rejected");
        }

        let err = validator.validate(FRAME, start + Duration::from_secs(30)).unwrap_err();
        assert_eq!(err, ProtocolError::RateLimited { count: 101, limit: 100 });
    }

    #[test]
    fn test_rejection_does_not_reset_window() {
        let mut validator = validator();
        let start = Instant::now();
        for _ in 0..100 {
            validator.validate(FRAME, start).unwrap();
        }
        for offset in [1, 20, 59] {
            let at = start + Duration::from_secs(offset);
            assert!(validator.validate(FRAME, at).is_err());
        }
        // The window counts from its first frame, not from the last rejection.
        assert!(validator.validate(FRAME, start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let mut window = RateWindow::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(window.admit(start));
        assert!(window.admit(start));
        assert!(!window.admit(start + Duration::from_secs(60)));
        assert!(window.admit(start + Duration::from_millis(60_001)));
        assert_eq!(window.count(), 1);
    }

    #[test]
    fn test_missing_fields_never_pass() {
        let mut validator = validator();
        let now = Instant::now();
        let cases = [
            json!({"event": "e", "payload": {}}),
            json!({"topic": "t", "payload": {}}),
            json!({"topic": "t", "event": "e"}),
            json!({}),
            json!({"topic": null, "event": "e", "payload": {}}),
        ];
        for case in cases {
            let text = case.to_string();
            let result = validator.validate(&text, now);
            assert!(
                matches!(
                    result,
                    Err(ProtocolError::MissingField { .. } | ProtocolError::InvalidField { .. })
                ),
                "accepted {text}"
            );
        }
    }

    #[test]
    fn test_malformed_json_is_not_counted() {
        let mut validator = FrameValidator::new(1, Duration::from_secs(60), 1024);
        let now = Instant::now();
        assert!(matches!(
            validator.validate("{not json", now),
            Err(ProtocolError::MalformedJson { .. })
        ));
        assert!(validator.validate(FRAME, now).is_ok());
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let mut validator = FrameValidator::new(100, Duration::from_secs(60), 64);
        let now = Instant::now();
        let big = json!({"topic": "t", "event": "e", "payload": {"blob": "x".repeat(100)}});
        let err = validator.validate(&big.to_string(), now).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge { limit: 64, .. }));

        let small = json!({"topic": "t", "event": "e", "payload": {"blob": "x"}});
        assert!(validator.validate(&small.to_string(), now).is_ok());
    }
}
