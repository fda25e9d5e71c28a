// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Controller configuration.

use crate::types::{DelayKind, InterestState};

/// Names of the style properties consulted for show/hide delays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DelayProperties {
    /// Longhand property for the show delay.
    pub show: &'static str,
    /// Longhand property for the hide delay.
    pub hide: &'static str,
    /// Optional two-slot shorthand: `<show> [<hide>]`.
    ///
    /// A single slot applies to both delays.
    pub shorthand: Option<&'static str>,
}

impl DelayProperties {
    /// Longhand property for `kind`.
    pub const fn longhand(&self, kind: DelayKind) -> &'static str {
        match kind {
            DelayKind::Show => self.show,
            DelayKind::Hide => self.hide,
        }
    }
}

impl Default for DelayProperties {
    fn default() -> Self {
        Self {
            show: "--interest-delay-start",
            hide: "--interest-delay-end",
            shorthand: Some("--interest-delay"),
        }
    }
}

/// Configuration for an [`InterestController`](crate::InterestController).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InterestConfig {
    /// Property names for the layered delay lookup.
    pub delay_properties: DelayProperties,
    /// Show delay in seconds when no property is set.
    pub default_show_delay: f64,
    /// Hide delay in seconds when no property is set.
    pub default_hide_delay: f64,
    /// Whether focus may grant [`InterestState::PartialInterest`].
    ///
    /// When disabled, every partial request is treated as full.
    pub partial_interest: bool,
    /// How long a touch press must be held before interest is gained, in milliseconds.
    pub long_press_delay_ms: u64,
}

impl Default for InterestConfig {
    fn default() -> Self {
        Self {
            delay_properties: DelayProperties::default(),
            default_show_delay: 0.5,
            default_hide_delay: 0.25,
            partial_interest: false,
            long_press_delay_ms: 500,
        }
    }
}

impl InterestConfig {
    /// Two-tier configuration: focus into a target with focusable content
    /// grants partial interest, and delays are a symmetric 0.5s with no shorthand.
    pub fn with_partial_interest() -> Self {
        Self {
            delay_properties: DelayProperties {
                show: "--interest-target-show-delay",
                hide: "--interest-target-hide-delay",
                shorthand: None,
            },
            default_show_delay: 0.5,
            default_hide_delay: 0.5,
            partial_interest: true,
            long_press_delay_ms: 500,
        }
    }

    /// Default delay in seconds for `kind`.
    pub const fn default_delay(&self, kind: DelayKind) -> f64 {
        match kind {
            DelayKind::Show => self.default_show_delay,
            DelayKind::Hide => self.default_hide_delay,
        }
    }

    /// Collapse `PartialInterest` to `FullInterest` when the tier is disabled.
    pub(crate) fn effective_state(&self, state: InterestState) -> InterestState {
        match state {
            InterestState::PartialInterest if !self.partial_interest => {
                InterestState::FullInterest
            }
            other => other,
        }
    }
}
