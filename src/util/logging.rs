//! # Logging Utilities
//!
//! Rate-limited logging and hex dump helpers for the frame pipeline.
//!
//! A meter on a bad line can produce a rejected frame every second for hours;
//! [`LogThrottle`] keeps those warnings from drowning everything else.
//!
//! ```rust
//! use am550_rs::util::logging::LogThrottle;
//!
//! let mut throttle = LogThrottle::new(60_000, 5); // 5 messages per minute
//! if throttle.allow() {
//!     log::warn!("crc mismatch");
//! }
//! ```

use std::time::Instant;

use crate::util::hex::{format_hex_compact, pretty_hex};

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages refused since the last allowed one
    suppressed: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let elapsed_ms = self.t0.elapsed().as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = Instant::now();
            self.count = 0;
            if self.suppressed > 0 {
                log::debug!("{} log messages suppressed in the last window", self.suppressed);
                self.suppressed = 0;
            }
        }

        self.count = self.count.saturating_add(1);
        let allowed = self.count <= self.cap;
        if !allowed {
            self.suppressed = self.suppressed.saturating_add(1);
        }
        allowed
    }

    /// Messages refused in the current window
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
        self.suppressed = 0;
    }
}

/// Log frame data in hex format for debugging
///
/// Multi-line dump at trace level; skipped entirely when trace is off.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("{prefix} ({} bytes):\n{}", data.len(), pretty_hex(data, 16));
    }
}

/// Log the first bytes of a frame on a single line
pub fn log_frame_compact(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 32;

    if log::log_enabled!(log::Level::Debug) {
        let shown = &data[..data.len().min(MAX_LOG_BYTES)];
        let suffix = if data.len() > MAX_LOG_BYTES { " ..." } else { "" };
        log::debug!("{prefix}: {} bytes, {}{suffix}", data.len(), format_hex_compact(shown));
    }
}

/// Log a warning with throttling
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {
        if $throttle.allow() {
            log::warn!($($arg)*);
        }
    };
}
