// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delay resolution: layered show/hide delays from style properties.
//!
//! ## Resolution order
//!
//! 1. The longhand property for the requested delay, unless it is unset.
//! 2. The shorthand (`<show> [<hide>]`), unless it is unset. A single slot
//!    applies to both delays.
//! 3. The configured default.
//!
//! A value is unset when it is absent, blank, the keyword `unset` or
//! `initial`, or equal to the registered initial value (the configured
//! default). The last rule matches how computed styles report registered
//! properties nobody has touched.
//!
//! Malformed text degrades to the configured default. Negative and
//! non-finite values pass through unchanged: [`delay_to_ms`] rejects them so
//! the caller can skip scheduling.

use tracing::warn;

use crate::config::InterestConfig;
use crate::error::DelayParseError;
use crate::host::InterestHost;
use crate::types::DelayKind;

/// Parse a time value into seconds.
///
/// Accepts `<number>s`, `<number>ms`, and a bare number (seconds).
///
/// ```
/// use understory_interest::parse_time;
///
/// assert_eq!(parse_time("2s"), Ok(2.0));
/// assert_eq!(parse_time(" 800ms "), Ok(0.8));
/// assert_eq!(parse_time("1.5"), Ok(1.5));
/// assert!(parse_time("soon").is_err());
/// ```
pub fn parse_time(text: &str) -> Result<f64, DelayParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DelayParseError::Empty);
    }
    let (number, scale) = if let Some(ms) = text.strip_suffix("ms") {
        (ms, 1000.0)
    } else if let Some(s) = text.strip_suffix('s') {
        (s, 1.0)
    } else {
        (text, 1.0)
    };
    number
        .trim_end()
        .parse::<f64>()
        .map(|value| value / scale)
        .map_err(|_| DelayParseError::Malformed(text.into()))
}

/// Convert a delay in seconds to whole milliseconds.
///
/// Returns `None` for negative or non-finite delays, which must not be scheduled.
pub fn delay_to_ms(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    // Round half up; `f64::round` needs `std`.
    let ms = seconds * 1000.0 + 0.5;
    if ms >= u64::MAX as f64 {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Finite, non-negative and below u64::MAX; truncating completes the rounding."
    )]
    Some(ms as u64)
}

/// Resolve the effective delay in seconds for `element`.
pub fn resolve_delay<K, H>(host: &H, config: &InterestConfig, element: K, kind: DelayKind) -> f64
where
    K: Copy,
    H: InterestHost<K> + ?Sized,
{
    let default = config.default_delay(kind);
    let properties = &config.delay_properties;

    let longhand = host.computed_delay_value(element, properties.longhand(kind));
    if let Some(value) = longhand.as_deref().filter(|v| !is_unset(v, default)) {
        return parse_or(value, default);
    }

    if let Some(shorthand) = properties.shorthand
        && let Some(value) = host.computed_delay_value(element, shorthand)
    {
        let mut slots = value.split_whitespace();
        if let Some(first) = slots.next().filter(|v| !is_unset(v, f64::NAN)) {
            let slot = match kind {
                DelayKind::Show => first,
                DelayKind::Hide => slots.next().unwrap_or(first),
            };
            return parse_or(slot, default);
        }
    }

    default
}

fn is_unset(value: &str, initial: f64) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case("unset")
        || value.eq_ignore_ascii_case("initial")
        || parse_time(value) == Ok(initial)
}

fn parse_or(value: &str, default: f64) -> f64 {
    match parse_time(value) {
        Ok(seconds) => seconds,
        Err(err) => {
            warn!(%err, default, "falling back to default delay");
            default
        }
    }
}
