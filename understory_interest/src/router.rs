// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trigger routing: interaction signals to scheduled transitions.
//!
//! A signal is applied to the nearest element in the origin's ancestor chain
//! (the origin included) that references a target, so hovering or focusing a
//! descendant of an invoker counts as interacting with the invoker. It is
//! also applied to the *upstream* holder: the invoker currently holding
//! interest in a target that contains the origin. Moving the pointer from an
//! invoker into its open target therefore keeps the target open.
//!
//! | Signal              | Invoker                    | Upstream holder                      |
//! |---------------------|----------------------------|--------------------------------------|
//! | pointer/focus in    | cancel loss, schedule gain | cancel loss, promote partial to full |
//! | pointer/focus out   | cancel gain, schedule loss | cancel gain, schedule loss (1)       |
//! | long press start    | schedule full interest     |                                      |
//! | long press move/end | cancel long press          |                                      |
//!
//! (1) On focus out, or when the origin is no longer hovered.
//!
//! Pointer and focus signals are ignored between [`Signal::LongPressStart`]
//! and [`Signal::LongPressEnd`], since touch input synthesizes them.

use core::fmt::Debug;
use core::hash::Hash;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::controller::InterestController;
use crate::delay::{delay_to_ms, resolve_delay};
use crate::error::InterestError;
use crate::host::InterestHost;
use crate::index::RelationshipIndex;
use crate::scheduler::TaskKind;
use crate::types::{AccessibilityUpdate, DelayKind, InterestState};

/// Keys the router reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NamedKey {
    /// Dismiss every disclosure.
    Escape,
    /// With Alt held, promote partial interest to full.
    ArrowUp,
    /// Any other key.
    Other,
}

/// An interaction signal delivered by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Signal<K> {
    /// The pointer entered the element.
    PointerEnter(K),
    /// The pointer left the element.
    PointerLeave(K),
    /// The element received focus.
    FocusIn(K),
    /// The element lost focus.
    FocusOut(K),
    /// A touch press began on the element.
    LongPressStart(K),
    /// The touch point moved.
    LongPressMove(K),
    /// The touch press ended or was canceled.
    LongPressEnd(K),
    /// A key was pressed with focus in `origin`.
    KeyDown {
        /// Focused element.
        origin: K,
        /// The key.
        key: NamedKey,
        /// Whether Alt was held.
        alt: bool,
    },
    /// The host closed a disclosure by other means (light dismiss, close button).
    DisclosureClosed(K),
    /// The element's interest reference was added, changed or removed.
    ReferenceChanged(K),
    /// The element is being removed from the tree.
    ElementRemoved(K),
}

impl<K> InterestController<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Route an interaction signal received at time `now` (milliseconds).
    ///
    /// Returns `true` when the signal changed interest immediately; hosts can
    /// use this to stop further handling of key events. Hover and focus only
    /// schedule tasks and always return `false`.
    ///
    /// Invariant violations are reported to [`InterestHost::report_error`]
    /// before being returned.
    pub fn handle<H>(
        &mut self,
        host: &mut H,
        signal: Signal<K>,
        now: u64,
    ) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        let result = self.route(host, signal, now);
        self.surface(host, result)
    }

    fn route<H>(
        &mut self,
        host: &mut H,
        signal: Signal<K>,
        now: u64,
    ) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        match signal {
            Signal::PointerEnter(el) => self.on_enter(host, el, false, now),
            Signal::FocusIn(el) => self.on_enter(host, el, true, now),
            Signal::PointerLeave(el) => self.on_leave(host, el, false, now),
            Signal::FocusOut(el) => self.on_leave(host, el, true, now),
            Signal::LongPressStart(el) => {
                self.on_long_press(host, el, now);
                Ok(false)
            }
            Signal::LongPressMove(_) => {
                self.cancel_long_press();
                Ok(false)
            }
            Signal::LongPressEnd(_) => {
                self.cancel_long_press();
                self.touch.in_progress = false;
                Ok(false)
            }
            Signal::KeyDown {
                key: NamedKey::Escape,
                ..
            } => {
                let released = self.release_all(host)?;
                debug!(released, "escape");
                Ok(released > 0)
            }
            Signal::KeyDown {
                origin,
                key: NamedKey::ArrowUp,
                alt: true,
            } => self.promote(host, origin),
            Signal::KeyDown { .. } => Ok(false),
            Signal::DisclosureClosed(target) => match self.index.current_holder(target) {
                Some(holder) => self.release(host, holder, false),
                None => Ok(false),
            },
            Signal::ReferenceChanged(el) => self.on_reference_changed(host, el),
            Signal::ElementRemoved(el) => self.on_removed(host, el),
        }
    }

    fn on_enter<H>(
        &mut self,
        host: &mut H,
        el: K,
        focus: bool,
        now: u64,
    ) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        if self.touch.in_progress {
            trace!(?el, "touch in progress; ignoring enter");
            return Ok(false);
        }
        let invoker = nearest_invoker(host, el);
        let upstream = self.upstream_holder(host, el, invoker);

        if let Some(invoker) = invoker {
            self.ensure_record(host, invoker);
            self.cancel_task(invoker, TaskKind::Lost);
            let state = if focus
                && self.config.partial_interest
                && RelationshipIndex::resolve_target(host, invoker)
                    .is_some_and(|t| host.has_focusable_descendants(t))
            {
                InterestState::PartialInterest
            } else {
                InterestState::FullInterest
            };
            self.schedule_transition(host, invoker, TaskKind::Gained, state, now);
        }

        if let Some(upstream) = upstream {
            self.cancel_task(upstream, TaskKind::Lost);
            if self.index.state_of(upstream) == InterestState::PartialInterest {
                let target = RelationshipIndex::resolve_target(host, upstream);
                self.request_state(host, upstream, target, InterestState::FullInterest)?;
            }
        }
        Ok(false)
    }

    fn on_leave<H>(
        &mut self,
        host: &mut H,
        el: K,
        focus: bool,
        now: u64,
    ) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        if self.touch.in_progress {
            trace!(?el, "touch in progress; ignoring leave");
            return Ok(false);
        }
        let invoker = nearest_invoker(host, el);
        let upstream = self.upstream_holder(host, el, invoker);

        if let Some(invoker) = invoker {
            self.cancel_task(invoker, TaskKind::Gained);
            if self.index.state_of(invoker).has_interest() {
                let none = InterestState::NoInterest;
                self.schedule_transition(host, invoker, TaskKind::Lost, none, now);
            }
        }

        if let Some(upstream) = upstream {
            self.cancel_task(upstream, TaskKind::Gained);
            if focus || !host.is_hovered(el) {
                let none = InterestState::NoInterest;
                self.schedule_transition(host, upstream, TaskKind::Lost, none, now);
            }
        }
        Ok(false)
    }

    fn on_long_press<H>(&mut self, host: &mut H, el: K, now: u64)
    where
        H: InterestHost<K>,
    {
        self.touch.in_progress = true;
        self.cancel_long_press();
        let Some(invoker) = nearest_invoker(host, el) else {
            return;
        };
        self.ensure_record(host, invoker);
        let deadline = now.saturating_add(self.config.long_press_delay_ms);
        let (record, _) = self.index.ensure_invoker(invoker);
        self.scheduler.schedule(
            record.slot_mut(TaskKind::LongPress),
            deadline,
            invoker,
            TaskKind::LongPress,
            InterestState::FullInterest,
        );
        self.touch.invoker = Some(invoker);
        debug!(?invoker, deadline, "long press scheduled");
    }

    fn cancel_long_press(&mut self) {
        if let Some(invoker) = self.touch.invoker.take() {
            self.cancel_task(invoker, TaskKind::LongPress);
        }
    }

    fn promote<H>(&mut self, host: &mut H, origin: K) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        let Some(invoker) = nearest_invoker(host, origin) else {
            return Ok(false);
        };
        if self.index.state_of(invoker) != InterestState::PartialInterest {
            return Ok(false);
        }
        let target = RelationshipIndex::resolve_target(host, invoker);
        self.request_state(host, invoker, target, InterestState::FullInterest)
    }

    fn on_reference_changed<H>(&mut self, host: &mut H, el: K) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        let resolved = RelationshipIndex::resolve_target(host, el);
        let held = self
            .index
            .invoker(el)
            .filter(|r| r.state.has_interest())
            .and_then(|r| r.target);
        let mut released = false;
        if let Some(old) = held
            && Some(old) != resolved
        {
            debug!(invoker = ?el, ?old, new = ?resolved, "reference changed while holding");
            released = self.release(host, el, false)?;
        }
        if let Some(target) = resolved {
            self.index.ensure_invoker(el);
            wire_accessibility(host, el, target);
        }
        Ok(released)
    }

    fn on_removed<H>(&mut self, host: &mut H, el: K) -> Result<bool, InterestError>
    where
        H: InterestHost<K>,
    {
        if let Some(record) = self.index.invoker_mut(el) {
            for kind in [TaskKind::Gained, TaskKind::Lost, TaskKind::LongPress] {
                self.scheduler.cancel(record.slot_mut(kind));
            }
        }
        if self.touch.invoker == Some(el) {
            self.touch.invoker = None;
        }

        // Removing a subtree disconnects everything below it as well.
        let stale: SmallVec<[K; 4]> = self
            .index
            .holders()
            .filter(|&invoker| {
                let target = self.index.invoker(invoker).and_then(|r| r.target);
                invoker == el
                    || !host.is_connected(invoker)
                    || target.is_some_and(|t| t == el || !host.is_connected(t))
            })
            .collect();
        let mut released = false;
        for invoker in stale {
            released |= self.release(host, invoker, false)?;
        }
        Ok(released)
    }

    /// Create the record for `invoker` on first contact and wire its
    /// accessibility relationship to the target.
    fn ensure_record<H>(&mut self, host: &mut H, invoker: K)
    where
        H: InterestHost<K>,
    {
        let (_, created) = self.index.ensure_invoker(invoker);
        if created && let Some(target) = RelationshipIndex::resolve_target(host, invoker) {
            wire_accessibility(host, invoker, target);
        }
    }

    /// The holder of the nearest held target containing `el`, other than `invoker`.
    fn upstream_holder<H>(&self, host: &H, el: K, invoker: Option<K>) -> Option<K>
    where
        H: InterestHost<K>,
    {
        let mut found = None;
        host.closest_ancestor_matching(el, |node| match self.index.current_holder(node) {
            Some(holder) if Some(holder) != invoker => {
                found = Some(holder);
                true
            }
            _ => false,
        });
        found
    }

    fn schedule_transition<H>(
        &mut self,
        host: &H,
        invoker: K,
        kind: TaskKind,
        state: InterestState,
        now: u64,
    ) where
        H: InterestHost<K>,
    {
        let delay_kind = match kind {
            TaskKind::Lost => DelayKind::Hide,
            TaskKind::Gained | TaskKind::LongPress => DelayKind::Show,
        };
        let seconds = resolve_delay(host, &self.config, invoker, delay_kind);
        let Some(ms) = delay_to_ms(seconds) else {
            debug!(?invoker, ?kind, seconds, "delay not schedulable; skipping");
            return;
        };
        let deadline = now.saturating_add(ms);
        let (record, _) = self.index.ensure_invoker(invoker);
        self.scheduler
            .schedule(record.slot_mut(kind), deadline, invoker, kind, state);
        debug!(?invoker, ?kind, ?state, deadline, "task scheduled");
    }
}

/// Nearest of `el` and its ancestors whose interest reference resolves.
fn nearest_invoker<K, H>(host: &H, el: K) -> Option<K>
where
    K: Copy + Eq + Hash,
    H: InterestHost<K>,
{
    host.closest_ancestor_matching(el, |node| {
        RelationshipIndex::resolve_target(host, node).is_some()
    })
}

fn wire_accessibility<K, H>(host: &mut H, invoker: K, target: K)
where
    K: Copy,
    H: InterestHost<K>,
{
    if host.is_plain_hint(target) {
        host.set_accessibility(invoker, AccessibilityUpdate::DescribedBy(target));
    } else {
        host.set_accessibility(invoker, AccessibilityUpdate::Details(target));
        host.set_accessibility(invoker, AccessibilityUpdate::Expanded(false));
        host.set_accessibility(target, AccessibilityUpdate::TooltipRole);
    }
}
