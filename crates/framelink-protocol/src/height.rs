//! Frame height resolution.
//!
//! An explicit height is used when it is a finite number strictly greater than
//! zero. Anything else falls back to auto-measurement: the larger of the two
//! document-height probes, ignoring probes that are undefined or zero.
//! Auto-measurement is approximate across hosts; callers that know their
//! height should pass it.

use framelink_transport::HeightProbe;
use serde_json::Value;

/// Resolve the height to send, or `None` when no positive height is known.
///
/// Explicit fractional heights are rounded up so content is never clipped.
pub fn resolve_height<P: HeightProbe + ?Sized>(requested: Option<f64>, probe: &P) -> Option<u32> {
    if let Some(height) = requested.filter(|h| h.is_finite() && *h > 0.0) {
        return Some(to_pixels(height));
    }
    measure(probe)
}

/// Interpret a dynamically typed height argument.
///
/// Only JSON numbers count; strings such as `"150"` or `"abc"` do not.
pub fn requested_height(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn measure<P: HeightProbe + ?Sized>(probe: &P) -> Option<u32> {
    [probe.root_scroll_height(), probe.body_scroll_height()]
        .into_iter()
        .flatten()
        .filter(|h| h.is_finite() && *h > 0.0)
        .reduce(f64::max)
        .map(to_pixels)
}

fn to_pixels(height: f64) -> u32 {
    // `as` saturates at u32::MAX.
    height.ceil() as u32
}
