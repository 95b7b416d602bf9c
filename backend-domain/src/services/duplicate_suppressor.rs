use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Duplicate,
}

/// Debounces a camera that keeps decoding the same still-visible code.
/// Per session only; two stations never see each other's tokens.
#[derive(Debug)]
pub struct DuplicateSuppressor {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Default for DuplicateSuppressor {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl DuplicateSuppressor {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// A suppressed token leaves the last accepted timestamp untouched, so a
    /// code held in front of the camera passes again once the window elapses.
    pub fn admit(&mut self, token: &str, now: Instant) -> Admission {
        if let Some((value, accepted_at)) = &self.last {
            if value == token && now.saturating_duration_since(*accepted_at) < self.window {
                return Admission::Duplicate;
            }
        }
        self.last = Some((token.to_string(), now));
        Admission::Accepted
    }
}
