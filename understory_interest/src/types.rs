// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: interest states, lifecycle events, markers, and anchors.

use core::fmt;

/// Interest an invoker currently holds in its target.
///
/// States are ordered: `NoInterest < PartialInterest < FullInterest`. A request
/// for a state at or below the current one on the current holder is a no-op.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InterestState {
    /// The invoker holds no interest; its target is not disclosed on its behalf.
    #[default]
    NoInterest,
    /// Focus-only interest: the target is shown but its focusable content is
    /// kept out of the tab order until the interest is promoted.
    PartialInterest,
    /// Committed interest: the target is shown and fully interactive.
    FullInterest,
}

impl InterestState {
    /// Returns `true` for `PartialInterest` and `FullInterest`.
    pub const fn has_interest(self) -> bool {
        !matches!(self, Self::NoInterest)
    }
}

/// Which lifecycle notification is being dispatched to a target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InterestEventKind {
    /// The target is about to be shown for an invoker.
    Interest,
    /// The target is about to be hidden.
    LoseInterest,
}

impl InterestEventKind {
    /// Conventional event name for hosts that dispatch by string.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Interest => "interest",
            Self::LoseInterest => "loseinterest",
        }
    }
}

/// A lifecycle notification dispatched to a target.
///
/// When `cancelable` is set, the host reports a listener veto by returning
/// `false` from [`dispatch_interest_event`](crate::InterestHost::dispatch_interest_event),
/// and the transition is abandoned with no side effects applied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InterestEvent<K> {
    /// Gained or lost.
    pub kind: InterestEventKind,
    /// The invoker on whose behalf the target changes.
    pub source: K,
    /// Whether listeners may veto the transition.
    pub cancelable: bool,
}

impl<K> InterestEvent<K> {
    pub(crate) const fn gained(source: K) -> Self {
        Self {
            kind: InterestEventKind::Interest,
            source,
            cancelable: true,
        }
    }

    pub(crate) const fn lost(source: K, cancelable: bool) -> Self {
        Self {
            kind: InterestEventKind::LoseInterest,
            source,
            cancelable,
        }
    }
}

bitflags::bitflags! {
    /// Style markers reflecting interest, pushed to the host as a whole set.
    ///
    /// An element that is both an invoker and a target (nested disclosures)
    /// carries the union of both roles.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InterestMarkers: u8 {
        /// The element is an invoker holding interest.
        const HAS_INTEREST               = 0b0000_0001;
        /// The element is an invoker holding partial interest.
        const HAS_PARTIAL_INTEREST       = 0b0000_0010;
        /// The element is a target that some invoker holds interest in.
        const TARGET_OF_INTEREST         = 0b0000_0100;
        /// The element is a target held with partial interest.
        const TARGET_OF_PARTIAL_INTEREST = 0b0000_1000;
    }
}

impl InterestMarkers {
    /// Class names for each marker, for hosts that style by class.
    pub fn class_names(self) -> impl Iterator<Item = &'static str> {
        [
            (Self::HAS_INTEREST, "has-interest"),
            (Self::HAS_PARTIAL_INTEREST, "has-partial-interest"),
            (Self::TARGET_OF_INTEREST, "target-of-interest"),
            (Self::TARGET_OF_PARTIAL_INTEREST, "target-of-partial-interest"),
        ]
        .into_iter()
        .filter_map(move |(flag, name)| self.contains(flag).then_some(name))
    }
}

/// Opaque token linking an invoker to its target for anchor positioning.
///
/// A fresh token is minted each time an invoker gains interest from
/// `NoInterest`; it is withdrawn when the interest is lost.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub(crate) u64);

impl AnchorId {
    /// Raw token value, unique per controller.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnchorId {
    /// Formats as a dashed ident usable as an anchor name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--interest-anchor-{:x}", self.0)
    }
}

/// Which configured delay to resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DelayKind {
    /// Delay before interest is gained.
    Show,
    /// Delay before interest is lost.
    Hide,
}

/// An accessibility attribute change requested of the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessibilityUpdate<K> {
    /// The invoker is described by a plain hint target.
    DescribedBy(K),
    /// The invoker has a rich target carrying further details.
    Details(K),
    /// Expanded state of an invoker with a rich target.
    Expanded(bool),
    /// Give the element the tooltip role unless it already has a role.
    TooltipRole,
}
