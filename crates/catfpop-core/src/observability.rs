// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Receives run progress as a fraction in `[0, 1]`.
pub trait ProgressSink {
    fn on_progress(&self, fraction: f32);
}

/// Receives named scalar counters emitted by detectors.
pub trait TelemetrySink {
    fn record_scalar(&self, key: &'static str, value: f64);
}
