// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Only [`InterestError`] ever reaches callers. Precondition misses (stale
//! tasks, disconnected invokers, changed references) are reported as
//! `Ok(false)`, [`DelayParseError`] is recovered inside the delay resolver, and
//! [`DisclosureError`] is swallowed because show/hide are idempotent intents.

use alloc::string::String;

use crate::types::InterestState;

/// A state transition was requested from a state that routing should never reach.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InterestError {
    /// The invoker was asked to move to `to` while already at `from`.
    #[error("invalid interest transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// State the invoker was in.
        from: InterestState,
        /// State that was requested.
        to: InterestState,
    },
    /// The invoker claims interest but has no recorded target.
    #[error("invoker holds {state:?} without a recorded target")]
    DetachedHolder {
        /// State the invoker was in.
        state: InterestState,
    },
}

/// A delay value could not be parsed as a time.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DelayParseError {
    /// No value at all.
    #[error("empty delay value")]
    Empty,
    /// Text that is not a number of seconds or milliseconds.
    #[error("malformed delay value `{0}`")]
    Malformed(String),
}

/// The host could not show or hide a disclosure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DisclosureError {
    /// The element cannot be presented as a disclosure.
    #[error("element does not support disclosure")]
    Unsupported,
    /// The disclosure is already shown (or hidden).
    #[error("disclosure already in the requested state")]
    AlreadyInState,
}
