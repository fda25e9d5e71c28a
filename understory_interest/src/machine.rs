// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interest state machine.
//!
//! ## Transitions
//!
//! - `NoInterest → PartialInterest | FullInterest`: dispatch a cancelable
//!   `interest` event, show the disclosure, link the holder, set markers and
//!   accessibility state, mint an anchor.
//! - `PartialInterest → FullInterest`: promote markers and give focus back to
//!   the target's content. The disclosure is already shown, so nothing is
//!   dispatched.
//! - `* → NoInterest`: dispatch `loseinterest`, hide, unlink, restore markers,
//!   focusability and accessibility state, withdraw the anchor.
//!
//! ## Single holder
//!
//! A target has at most one holder. A competing invoker first forces the
//! existing holder to `NoInterest` with a nested [`request_state`] call, then
//! re-checks its own preconditions, because the release runs host code that
//! may have changed the tree. Depth is bounded at one: the released holder
//! never itself cascades.
//!
//! [`request_state`]: InterestController::request_state

use core::fmt::Debug;
use core::hash::Hash;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::controller::InterestController;
use crate::error::InterestError;
use crate::host::InterestHost;
use crate::index::RelationshipIndex;
use crate::scheduler::TaskKind;
use crate::types::{AccessibilityUpdate, InterestEvent, InterestMarkers, InterestState};

const INVOKER_MARKERS: InterestMarkers =
    InterestMarkers::HAS_INTEREST.union(InterestMarkers::HAS_PARTIAL_INTEREST);
const TARGET_MARKERS: InterestMarkers =
    InterestMarkers::TARGET_OF_INTEREST.union(InterestMarkers::TARGET_OF_PARTIAL_INTEREST);

impl<K> InterestController<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Move `invoker` to `new_state` with respect to `target`.
    ///
    /// Returns `Ok(true)` when a transition was applied and `Ok(false)` when
    /// it was a no-op: `target` is `None`, the invoker is disconnected or no
    /// longer references `target`, a release was requested by an invoker that
    /// is not the holder, a listener vetoed the change, or the invoker already
    /// holds at least `new_state` (which also cancels its pending loss).
    ///
    /// `PartialInterest` is treated as `FullInterest` unless
    /// [`InterestConfig::partial_interest`](crate::InterestConfig::partial_interest)
    /// is enabled.
    pub fn request_state<H>(
        &mut self,
        host: &mut H,
        invoker: K,
        target: Option<K>,
        new_state: InterestState,
    ) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        let Some(target) = target else {
            trace!(?invoker, "no target; ignoring request");
            return Ok(false);
        };
        let new_state = self.config.effective_state(new_state);
        if !Self::still_references(host, invoker, target) {
            trace!(?invoker, ?target, "stale request; invoker no longer references target");
            return Ok(false);
        }

        if !new_state.has_interest() {
            if self.index.current_holder(target) != Some(invoker) {
                trace!(?invoker, ?target, "release requested by non-holder");
                return Ok(false);
            }
            return self.release(host, invoker, true);
        }

        match self.index.current_holder(target) {
            Some(existing) if existing == invoker => {
                if self.index.state_of(invoker) >= new_state {
                    self.cancel_task(invoker, TaskKind::Lost);
                    trace!(?invoker, ?new_state, "already holding; pending loss canceled");
                    return Ok(false);
                }
            }
            Some(existing) => {
                debug!(?existing, ?invoker, ?target, "cascade: releasing current holder");
                let released = if host.is_connected(existing) {
                    self.request_state(host, existing, Some(target), InterestState::NoInterest)?
                } else {
                    // A detached holder cannot pass its own preconditions.
                    self.release(host, existing, false)?
                };
                if !released {
                    debug!(?existing, ?target, "cascade aborted; holder kept interest");
                    return Ok(false);
                }
                if !Self::still_references(host, invoker, target) {
                    trace!(?invoker, ?target, "cascade invalidated request");
                    return Ok(false);
                }
            }
            None => {}
        }

        // An invoker whose reference moved while it held interest still holds
        // the old target; let go of it before taking the new one.
        if let Some(previous) = self.index.invoker(invoker).and_then(|r| r.target)
            && previous != target
            && self.index.state_of(invoker).has_interest()
        {
            debug!(?invoker, ?previous, ?target, "reference moved; releasing previous target");
            if !self.release(host, invoker, true)? {
                return Ok(false);
            }
        }

        self.apply(host, invoker, target, new_state)
    }

    fn still_references<H>(host: &H, invoker: K, target: K) -> bool
    where
        H: InterestHost<K>,
    {
        RelationshipIndex::resolve_target(host, invoker) == Some(target)
    }

    fn apply<H>(
        &mut self,
        host: &mut H,
        invoker: K,
        target: K,
        new_state: InterestState,
    ) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        let from = self.index.state_of(invoker);
        if from >= new_state {
            return Err(InterestError::InvalidTransition {
                from,
                to: new_state,
            });
        }

        if !from.has_interest() {
            if !host.dispatch_interest_event(target, InterestEvent::gained(invoker)) {
                warn!(?invoker, ?target, "interest vetoed by listener");
                return Ok(false);
            }
            if let Err(err) = host.show_disclosure(target, invoker) {
                debug!(%err, ?target, "show disclosure failed; ignoring");
            }
        }

        let anchor = if from.has_interest() {
            None
        } else {
            Some(self.mint_anchor())
        };
        let (record, _) = self.index.ensure_invoker(invoker);
        record.state = new_state;
        record.target = Some(target);
        if anchor.is_some() {
            record.anchor = anchor;
        }
        self.index.set_holder(target, invoker);

        let (invoker_markers, target_markers) = match new_state {
            InterestState::PartialInterest => (INVOKER_MARKERS, TARGET_MARKERS),
            _ => (
                InterestMarkers::HAS_INTEREST,
                InterestMarkers::TARGET_OF_INTEREST,
            ),
        };
        self.set_markers(host, invoker, invoker_markers, INVOKER_MARKERS);
        self.set_markers(host, target, target_markers, TARGET_MARKERS);

        if new_state == InterestState::PartialInterest {
            self.suppress_focusable(host, target);
        } else {
            self.restore_focusable(host, target);
        }

        if !from.has_interest() {
            if !host.is_plain_hint(target) {
                host.set_accessibility(invoker, AccessibilityUpdate::Expanded(true));
            }
            host.set_anchor(invoker, target, anchor);
        }

        debug!(?invoker, ?target, ?from, to = ?new_state, "interest gained");
        Ok(true)
    }

    /// Drop `invoker` to `NoInterest`, skipping precondition checks.
    ///
    /// With `cancelable` unset the `loseinterest` event cannot be vetoed.
    pub(crate) fn release<H>(
        &mut self,
        host: &mut H,
        invoker: K,
        cancelable: bool,
    ) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        self.cancel_task(invoker, TaskKind::Gained);
        self.cancel_task(invoker, TaskKind::Lost);

        let Some(record) = self.index.invoker(invoker) else {
            return Ok(false);
        };
        let from = record.state;
        if !from.has_interest() {
            return Ok(false);
        }
        let Some(target) = record.target else {
            return Err(InterestError::DetachedHolder { state: from });
        };

        if !host.dispatch_interest_event(target, InterestEvent::lost(invoker, cancelable))
            && cancelable
        {
            warn!(?invoker, ?target, "loss of interest vetoed by listener");
            return Ok(false);
        }
        if let Err(err) = host.hide_disclosure(target) {
            debug!(%err, ?target, "hide disclosure failed; ignoring");
        }

        self.index.clear_holder(target, invoker);
        self.set_markers(host, invoker, InterestMarkers::empty(), INVOKER_MARKERS);
        self.set_markers(host, target, InterestMarkers::empty(), TARGET_MARKERS);
        self.restore_focusable(host, target);
        if !host.is_plain_hint(target) {
            host.set_accessibility(invoker, AccessibilityUpdate::Expanded(false));
        }

        let Some(record) = self.index.invoker_mut(invoker) else {
            return Ok(true);
        };
        let anchor = record.anchor.take();
        record.state = InterestState::NoInterest;
        record.target = None;
        if anchor.is_some() {
            host.set_anchor(invoker, target, None);
        }

        debug!(?invoker, ?target, ?from, "interest lost");
        Ok(true)
    }

    /// Make a disconnected invoker inert: cancel its tasks and release any
    /// interest it holds without a veto.
    pub(crate) fn retire<H>(&mut self, host: &mut H, invoker: K) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        self.cancel_task(invoker, TaskKind::LongPress);
        if self.touch.invoker == Some(invoker) {
            self.touch.invoker = None;
        }
        if !self.index.state_of(invoker).has_interest() {
            self.cancel_task(invoker, TaskKind::Gained);
            self.cancel_task(invoker, TaskKind::Lost);
            return Ok(false);
        }
        debug!(?invoker, "releasing disconnected holder");
        self.release(host, invoker, false)
    }

    /// Release every holder immediately, ignoring vetoes.
    ///
    /// Returns how many invokers lost interest.
    pub(crate) fn release_all<H>(&mut self, host: &mut H) -> Result<usize, InterestError>
    where
        H: InterestHost<K>,
    {
        let holders: SmallVec<[K; 4]> = self.index.holders().collect();
        let mut released = 0;
        for invoker in holders {
            if self.release(host, invoker, false)? {
                released += 1;
            }
        }
        Ok(released)
    }

    fn set_markers<H>(
        &mut self,
        host: &mut H,
        element: K,
        insert: InterestMarkers,
        remove: InterestMarkers,
    ) where
        H: InterestHost<K>,
    {
        let before = self.index.markers(element);
        let after = self.index.update_markers(element, insert, remove);
        if before != after {
            host.set_markers(element, after);
        }
    }

    fn suppress_focusable<H>(&mut self, host: &mut H, target: K)
    where
        H: InterestHost<K>,
    {
        let descendants = host.focusable_descendants(target);
        let record = self.target_record(target);
        for el in descendants {
            if !record.suppressed.contains(&el) {
                record.suppressed.push(el);
                host.set_focusable(el, false);
            }
        }
    }

    fn restore_focusable<H>(&mut self, host: &mut H, target: K)
    where
        H: InterestHost<K>,
    {
        let record = self.target_record(target);
        for el in record.suppressed.drain(..) {
            host.set_focusable(el, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterestConfig;
    use crate::mock::{Call, MockHost, Mutation};
    use crate::router::Signal;
    use crate::types::InterestEventKind;
    use alloc::vec::Vec;

    const FULL: InterestState = InterestState::FullInterest;
    const PARTIAL: InterestState = InterestState::PartialInterest;
    const NONE: InterestState = InterestState::NoInterest;

    /// Two invokers referencing one shared target.
    fn shared_target() -> (MockHost, u32, u32, u32) {
        let mut host = MockHost::new();
        let a = host.element("a");
        let b = host.element("b");
        let tip = host.element("tip");
        host.refer(a, "tip");
        host.refer(b, "tip");
        (host, a, b, tip)
    }

    #[test]
    fn gain_applies_all_side_effects() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();

        assert!(ctl.request_state(&mut host, a, Some(tip), FULL).unwrap());
        assert_eq!(ctl.state_of(a), FULL);
        assert_eq!(ctl.holder_of(tip), Some(a));
        assert!(host.shown.contains(&tip));
        assert_eq!(host.markers(a), InterestMarkers::HAS_INTEREST);
        assert_eq!(host.markers(tip), InterestMarkers::TARGET_OF_INTEREST);
        assert_eq!(host.last_expanded(a), Some(true));
        assert!(matches!(
            host.calls.last(),
            Some(Call::Anchor(x, t, Some(_))) if *x == a && *t == tip
        ));
    }

    #[test]
    fn missing_target_is_a_no_op() {
        let (mut host, a, _, _) = shared_target();
        let mut ctl = InterestController::default();
        assert!(!ctl.request_state(&mut host, a, None, FULL).unwrap());
        assert!(host.calls.is_empty());
    }

    #[test]
    fn cascade_moves_holder() {
        let (mut host, a, b, tip) = shared_target();
        let mut ctl = InterestController::default();

        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        assert!(ctl.request_state(&mut host, b, Some(tip), FULL).unwrap());

        assert_eq!(ctl.state_of(a), NONE);
        assert_eq!(ctl.state_of(b), FULL);
        assert_eq!(ctl.holder_of(tip), Some(b));
        assert_eq!(ctl.invokers_with_interest().count(), 1);
        assert!(host.markers(a).is_empty());
        assert_eq!(host.markers(b), InterestMarkers::HAS_INTEREST);
        // The loss for `a` is dispatched before the gain for `b`.
        let kinds: Vec<_> = host
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Event(_, e) => Some((e.kind, e.source)),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            [
                (InterestEventKind::Interest, a),
                (InterestEventKind::LoseInterest, a),
                (InterestEventKind::Interest, b),
            ]
        );
    }

    #[test]
    fn vetoed_cascade_keeps_existing_holder() {
        let (mut host, a, b, tip) = shared_target();
        let mut ctl = InterestController::default();

        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        host.veto(tip, InterestEventKind::LoseInterest);
        assert!(!ctl.request_state(&mut host, b, Some(tip), FULL).unwrap());
        assert_eq!(ctl.holder_of(tip), Some(a));
        assert_eq!(ctl.state_of(b), NONE);
    }

    #[test]
    fn disconnected_holder_yields_to_competitor() {
        let (mut host, a, b, tip) = shared_target();
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        host.veto(tip, InterestEventKind::LoseInterest);

        host.disconnect(a);
        assert!(ctl.request_state(&mut host, b, Some(tip), FULL).unwrap());
        assert_eq!(ctl.state_of(a), NONE);
        assert_eq!(ctl.holder_of(tip), Some(b));
        assert!(host.markers(a).is_empty());
        let forced = InterestEvent {
            kind: InterestEventKind::LoseInterest,
            source: a,
            cancelable: false,
        };
        assert!(host.calls.contains(&Call::Event(tip, forced)));
    }

    #[test]
    fn cascade_rechecks_reference_after_release() {
        let (mut host, a, b, tip) = shared_target();
        host.element("other");
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        host.on_event(
            tip,
            InterestEventKind::LoseInterest,
            Mutation::Refer(b, "other".into()),
        );

        assert!(!ctl.request_state(&mut host, b, Some(tip), FULL).unwrap());
        assert_eq!(ctl.state_of(a), NONE);
        assert_eq!(ctl.state_of(b), NONE);
        assert_eq!(ctl.holder_of(tip), None);
        assert!(!host.shown.contains(&tip));
        assert_eq!(host.events(InterestEventKind::Interest), 1);
    }

    #[test]
    fn cascade_rechecks_connection_after_release() {
        let (mut host, a, b, tip) = shared_target();
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        host.on_event(
            tip,
            InterestEventKind::LoseInterest,
            Mutation::Disconnect(b),
        );

        assert!(!ctl.request_state(&mut host, b, Some(tip), FULL).unwrap());
        assert_eq!(ctl.state_of(b), NONE);
        assert_eq!(ctl.holder_of(tip), None);
        assert_eq!(ctl.invokers_with_interest().count(), 0);
    }

    #[test]
    fn re_entry_cancels_pending_loss_without_redispatch() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();

        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        ctl.handle(&mut host, Signal::PointerLeave(a), 0).unwrap();
        assert!(ctl.has_pending_task(a, TaskKind::Lost));

        assert!(!ctl.request_state(&mut host, a, Some(tip), FULL).unwrap());
        assert!(!ctl.request_state(&mut host, a, Some(tip), PARTIAL).unwrap());
        assert!(!ctl.has_pending_task(a, TaskKind::Lost));
        assert_eq!(host.events(InterestEventKind::Interest), 1);
    }

    #[test]
    fn vetoed_gain_leaves_no_trace() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();
        host.veto(tip, InterestEventKind::Interest);

        assert!(!ctl.request_state(&mut host, a, Some(tip), FULL).unwrap());
        assert_eq!(ctl.state_of(a), NONE);
        assert_eq!(ctl.holder_of(tip), None);
        assert_eq!(host.shows(), 0);
        assert!(host.markers(tip).is_empty());
    }

    #[test]
    fn vetoed_loss_keeps_interest() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        host.veto(tip, InterestEventKind::LoseInterest);

        assert!(!ctl.request_state(&mut host, a, Some(tip), NONE).unwrap());
        assert_eq!(ctl.state_of(a), FULL);
        assert!(host.shown.contains(&tip));
    }

    #[test]
    fn release_by_non_holder_is_ignored() {
        let (mut host, a, b, tip) = shared_target();
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        assert!(!ctl.request_state(&mut host, b, Some(tip), NONE).unwrap());
        assert_eq!(ctl.holder_of(tip), Some(a));
    }

    #[test]
    fn round_trip_restores_markers() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();

        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        ctl.request_state(&mut host, a, Some(tip), NONE).unwrap();
        assert!(host.markers(a).is_empty());
        assert!(host.markers(tip).is_empty());
        assert_eq!(host.last_expanded(a), Some(false));
        assert!(!host.shown.contains(&tip));
        assert!(matches!(host.calls.last(), Some(Call::Anchor(_, _, None))));

        assert!(ctl.request_state(&mut host, a, Some(tip), FULL).unwrap());
        assert_eq!(host.markers(a), InterestMarkers::HAS_INTEREST);
        assert_eq!(host.markers(tip), InterestMarkers::TARGET_OF_INTEREST);
    }

    #[test]
    fn disconnected_invoker_cannot_gain() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();
        host.disconnect(a);
        assert!(!ctl.request_state(&mut host, a, Some(tip), FULL).unwrap());
    }

    #[test]
    fn show_failure_is_swallowed() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();
        // Already open through some other path.
        host.shown.insert(tip);
        assert!(ctl.request_state(&mut host, a, Some(tip), FULL).unwrap());
        assert_eq!(ctl.state_of(a), FULL);
    }

    #[test]
    fn unreachable_state_is_an_invariant_violation() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();
        // Full interest without a registered holder link.
        let (record, _) = ctl.index.ensure_invoker(a);
        record.state = FULL;
        record.target = Some(tip);

        let err = ctl.request_state(&mut host, a, Some(tip), FULL).unwrap_err();
        assert_eq!(
            err,
            InterestError::InvalidTransition {
                from: FULL,
                to: FULL
            }
        );
    }

    #[test]
    fn partial_is_full_when_disabled() {
        let (mut host, a, _, tip) = shared_target();
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), PARTIAL).unwrap();
        assert_eq!(ctl.state_of(a), FULL);
    }

    #[test]
    fn partial_suppresses_focus_until_promoted() {
        let (mut host, a, _, tip) = shared_target();
        let link = host.child(tip, "link");
        host.add_focusable(tip, link);
        let mut ctl = InterestController::new(InterestConfig::with_partial_interest());

        assert!(ctl.request_state(&mut host, a, Some(tip), PARTIAL).unwrap());
        assert!(host.unfocusable.contains(&link));
        assert_eq!(
            host.markers(tip),
            InterestMarkers::TARGET_OF_INTEREST | InterestMarkers::TARGET_OF_PARTIAL_INTEREST
        );

        assert!(ctl.request_state(&mut host, a, Some(tip), FULL).unwrap());
        assert!(!host.unfocusable.contains(&link));
        assert_eq!(host.markers(a), InterestMarkers::HAS_INTEREST);
        assert_eq!(host.markers(tip), InterestMarkers::TARGET_OF_INTEREST);
        // Promotion neither re-notifies nor re-shows.
        assert_eq!(host.events(InterestEventKind::Interest), 1);
        assert_eq!(host.shows(), 1);
    }

    #[test]
    fn losing_partial_interest_restores_focus() {
        let (mut host, a, _, tip) = shared_target();
        let link = host.child(tip, "link");
        host.add_focusable(tip, link);
        let mut ctl = InterestController::new(InterestConfig::with_partial_interest());

        ctl.request_state(&mut host, a, Some(tip), PARTIAL).unwrap();
        ctl.request_state(&mut host, a, Some(tip), NONE).unwrap();
        assert!(!host.unfocusable.contains(&link));
        assert!(host.markers(tip).is_empty());
    }

    #[test]
    fn plain_hint_does_not_report_expanded() {
        let (mut host, a, _, tip) = shared_target();
        host.mark_plain_hint(tip);
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();
        ctl.request_state(&mut host, a, Some(tip), NONE).unwrap();
        assert_eq!(host.last_expanded(a), None);
    }

    #[test]
    fn moved_reference_releases_previous_target() {
        let (mut host, a, _, tip) = shared_target();
        let other = host.element("other");
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, a, Some(tip), FULL).unwrap();

        host.refer(a, "other");
        assert!(ctl.request_state(&mut host, a, Some(other), FULL).unwrap());
        assert_eq!(ctl.holder_of(tip), None);
        assert_eq!(ctl.holder_of(other), Some(a));
        assert!(!host.shown.contains(&tip));
    }
}
