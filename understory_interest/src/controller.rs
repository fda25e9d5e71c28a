// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root coordinator owning all interest state.
//!
//! One [`InterestController`] holds the relationship index, the task queue,
//! the configuration, and the touch flag. Nothing is global: independent
//! controllers (for example, one per test or per window) never interact.
//!
//! The host is passed into every call rather than stored, so the controller
//! can be driven from whatever owns the element tree.

use core::fmt::Debug;
use core::hash::Hash;

use tracing::{error, trace};

use crate::config::InterestConfig;
use crate::error::InterestError;
use crate::host::InterestHost;
use crate::index::{RelationshipIndex, TargetRecord};
use crate::scheduler::{Scheduler, TaskKind};
use crate::types::{AnchorId, InterestMarkers, InterestState};

/// Touch interaction bookkeeping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TouchState<K> {
    pub(crate) in_progress: bool,
    /// Invoker whose long-press task is pending, if any.
    pub(crate) invoker: Option<K>,
}

impl<K> Default for TouchState<K> {
    fn default() -> Self {
        Self {
            in_progress: false,
            invoker: None,
        }
    }
}

/// Coordinates interest between invokers and targets.
///
/// ## Usage
///
/// - Feed interaction signals with [`InterestController::handle`].
/// - Drive time with [`InterestController::poll`], arming a host timer for
///   [`InterestController::next_deadline`] between calls.
/// - Call [`InterestController::request_state`] directly for programmatic
///   show/hide.
#[derive(Clone, Debug)]
pub struct InterestController<K> {
    pub(crate) config: InterestConfig,
    pub(crate) index: RelationshipIndex<K>,
    pub(crate) scheduler: Scheduler<K>,
    pub(crate) touch: TouchState<K>,
    next_anchor: u64,
}

impl<K> Default for InterestController<K>
where
    K: Copy + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new(InterestConfig::default())
    }
}

impl<K> InterestController<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Create a controller with the given configuration.
    pub fn new(config: InterestConfig) -> Self {
        Self {
            config,
            index: RelationshipIndex::new(),
            scheduler: Scheduler::new(),
            touch: TouchState::default(),
            next_anchor: 0,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &InterestConfig {
        &self.config
    }

    /// Interest currently held by `invoker`.
    pub fn state_of(&self, invoker: K) -> InterestState {
        self.index.state_of(invoker)
    }

    /// The invoker currently holding interest in `target`.
    pub fn holder_of(&self, target: K) -> Option<K> {
        self.index.current_holder(target)
    }

    /// The target `invoker` currently references, resolved through `host`.
    pub fn resolve_target<H>(&self, host: &H, invoker: K) -> Option<K>
    where
        H: InterestHost<K>,
    {
        RelationshipIndex::resolve_target(host, invoker)
    }

    /// Every invoker currently holding interest, in no particular order.
    pub fn invokers_with_interest(&self) -> impl Iterator<Item = K> + '_ {
        self.index.holders()
    }

    /// The marker set the controller last pushed for `element`.
    pub fn markers_of(&self, element: K) -> InterestMarkers {
        self.index.markers(element)
    }

    /// Whether `invoker` has a task of `kind` pending.
    pub fn has_pending_task(&self, invoker: K, kind: TaskKind) -> bool {
        self.index
            .invoker(invoker)
            .is_some_and(|r| r.slot(kind).is_pending())
    }

    /// Number of pending tasks across all invokers.
    pub fn pending_task_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Earliest time at which [`InterestController::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Whether a touch press is in progress (hover and focus are ignored meanwhile).
    pub fn touch_in_progress(&self) -> bool {
        self.touch.in_progress
    }

    /// Run every task due at `now`, earliest first. Returns how many fired.
    ///
    /// Each task re-resolves its invoker's target at fire time, so a task
    /// scheduled before the reference changed is rejected as a no-op. A task
    /// whose invoker has been disconnected releases whatever that invoker
    /// still holds.
    pub fn poll<H>(&mut self, host: &mut H, now: u64) -> Result<usize, InterestError>
    where
        H: InterestHost<K>,
    {
        let mut fired = 0;
        while let Some(task) = self.scheduler.pop_due(now) {
            fired += 1;
            if let Some(record) = self.index.invoker_mut(task.invoker) {
                record.slot_mut(task.kind).clear_fired(task.id);
            }
            if task.kind == TaskKind::LongPress && self.touch.invoker == Some(task.invoker) {
                self.touch.invoker = None;
            }
            trace!(invoker = ?task.invoker, kind = ?task.kind, now, "task fired");
            if !host.is_connected(task.invoker) {
                let result = self.retire(host, task.invoker);
                self.surface(host, result)?;
                continue;
            }
            let target = RelationshipIndex::resolve_target(host, task.invoker);
            let state = match task.kind {
                TaskKind::Gained => task.state,
                TaskKind::Lost => InterestState::NoInterest,
                TaskKind::LongPress => InterestState::FullInterest,
            };
            let result = self.request_state(host, task.invoker, target, state);
            self.surface(host, result)?;
        }
        Ok(fired)
    }

    /// Drop inert records of disconnected elements. Returns how many invoker
    /// records were removed.
    pub fn prune_disconnected<H>(&mut self, host: &H) -> usize
    where
        H: InterestHost<K>,
    {
        self.index.prune(host)
    }

    /// Release every held interest without notifications that can be vetoed,
    /// cancel all tasks, and forget all records.
    pub fn teardown<H>(&mut self, host: &mut H) -> Result<(), InterestError>
    where
        H: InterestHost<K>,
    {
        self.release_all(host)?;
        self.scheduler.clear();
        self.index.clear();
        self.touch = TouchState::default();
        Ok(())
    }

    pub(crate) fn mint_anchor(&mut self) -> AnchorId {
        self.next_anchor += 1;
        AnchorId(self.next_anchor)
    }

    pub(crate) fn target_record(&mut self, target: K) -> &mut TargetRecord<K> {
        self.index.target_mut(target)
    }

    /// Cancel the `kind` task of `invoker`, if any.
    pub(crate) fn cancel_task(&mut self, invoker: K, kind: TaskKind) -> bool {
        match self.index.invoker_mut(invoker) {
            Some(record) => self.scheduler.cancel(record.slot_mut(kind)),
            None => false,
        }
    }

    /// Forward invariant violations to the host's error channel.
    pub(crate) fn surface<H, T>(
        &self,
        host: &mut H,
        result: Result<T, InterestError>,
    ) -> Result<T, InterestError>
    where
        H: InterestHost<K>,
    {
        if let Err(err) = &result {
            error!(%err, "interest invariant violated");
            host.report_error(err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHost;
    use crate::router::Signal;
    use alloc::string::ToString;

    fn hover_pair() -> (MockHost, u32, u32) {
        let mut host = MockHost::new();
        let button = host.element("button");
        let tip = host.element("tip");
        host.refer(button, "tip");
        (host, button, tip)
    }

    #[test]
    fn poll_fires_only_due_tasks() {
        let (mut host, button, tip) = hover_pair();
        let mut ctl = InterestController::default();

        ctl.handle(&mut host, Signal::PointerEnter(button), 1_000).unwrap();
        assert_eq!(ctl.next_deadline(), Some(1_500));
        assert_eq!(ctl.poll(&mut host, 1_499).unwrap(), 0);
        assert_eq!(ctl.state_of(button), InterestState::NoInterest);

        assert_eq!(ctl.poll(&mut host, 1_500).unwrap(), 1);
        assert_eq!(ctl.state_of(button), InterestState::FullInterest);
        assert_eq!(ctl.holder_of(tip), Some(button));
        assert!(!ctl.has_pending_task(button, TaskKind::Gained));
        assert_eq!(ctl.next_deadline(), None);
    }

    #[test]
    fn teardown_releases_everything() {
        let (mut host, button, tip) = hover_pair();
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, button, Some(tip), InterestState::FullInterest)
            .unwrap();
        ctl.handle(&mut host, Signal::PointerLeave(button), 0).unwrap();
        assert_eq!(ctl.pending_task_count(), 1);

        ctl.teardown(&mut host).unwrap();
        assert_eq!(ctl.pending_task_count(), 0);
        assert_eq!(ctl.state_of(button), InterestState::NoInterest);
        assert!(!host.shown.contains(&tip));
        assert!(host.markers(button).is_empty());
        assert!(host.markers(tip).is_empty());
    }

    #[test]
    fn prune_forgets_removed_invokers() {
        let (mut host, button, _) = hover_pair();
        let mut ctl = InterestController::default();
        ctl.handle(&mut host, Signal::PointerEnter(button), 0).unwrap();
        ctl.handle(&mut host, Signal::PointerLeave(button), 10).unwrap();
        assert_eq!(ctl.prune_disconnected(&host), 0);

        host.disconnect(button);
        assert_eq!(ctl.prune_disconnected(&host), 1);
    }

    #[test]
    fn disconnected_holder_is_released_when_its_task_fires() {
        let (mut host, button, tip) = hover_pair();
        let mut ctl = InterestController::default();
        ctl.request_state(&mut host, button, Some(tip), InterestState::FullInterest)
            .unwrap();
        ctl.handle(&mut host, Signal::PointerLeave(button), 0).unwrap();

        host.disconnect(button);
        assert_eq!(ctl.poll(&mut host, 250).unwrap(), 1);
        assert_eq!(ctl.state_of(button), InterestState::NoInterest);
        assert_eq!(ctl.holder_of(tip), None);
        assert!(!host.shown.contains(&tip));
        assert_eq!(ctl.pending_task_count(), 0);
    }

    #[test]
    fn anchors_are_unique() {
        let mut ctl: InterestController<u32> = InterestController::default();
        let a = ctl.mint_anchor();
        let b = ctl.mint_anchor();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("--interest-anchor-"));
    }
}
