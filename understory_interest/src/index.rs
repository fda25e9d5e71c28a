// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Relationship index: invoker → target and target → holder lookups.
//!
//! Per-element records live in maps keyed by element handle rather than on the
//! elements themselves. Handles are plain `Copy` keys, so a record never keeps
//! an element alive; records of disconnected elements become inert and can be
//! dropped with [`RelationshipIndex::prune`].
//!
//! Lookups are pure. All mutation is driven by the state machine.

use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::host::InterestHost;
use crate::scheduler::{TaskKind, TaskSlot};
use crate::types::{AnchorId, InterestMarkers, InterestState};

/// Mutable per-invoker state, created on the first interaction signal.
#[derive(Clone, Debug)]
pub(crate) struct InvokerRecord<K> {
    pub(crate) state: InterestState,
    /// Target the interest is held in; `None` while `state` is `NoInterest`.
    pub(crate) target: Option<K>,
    pub(crate) anchor: Option<AnchorId>,
    pub(crate) gained: TaskSlot,
    pub(crate) lost: TaskSlot,
    pub(crate) long_press: TaskSlot,
}

impl<K> Default for InvokerRecord<K> {
    fn default() -> Self {
        Self {
            state: InterestState::NoInterest,
            target: None,
            anchor: None,
            gained: TaskSlot::default(),
            lost: TaskSlot::default(),
            long_press: TaskSlot::default(),
        }
    }
}

impl<K> InvokerRecord<K> {
    pub(crate) fn slot_mut(&mut self, kind: TaskKind) -> &mut TaskSlot {
        match kind {
            TaskKind::Gained => &mut self.gained,
            TaskKind::Lost => &mut self.lost,
            TaskKind::LongPress => &mut self.long_press,
        }
    }

    pub(crate) fn slot(&self, kind: TaskKind) -> &TaskSlot {
        match kind {
            TaskKind::Gained => &self.gained,
            TaskKind::Lost => &self.lost,
            TaskKind::LongPress => &self.long_press,
        }
    }

    fn is_inert(&self) -> bool {
        !self.state.has_interest()
            && !self.gained.is_pending()
            && !self.lost.is_pending()
            && !self.long_press.is_pending()
    }
}

/// Per-target lookup aid. The invoker owns the interest; this only points back.
#[derive(Clone, Debug)]
pub(crate) struct TargetRecord<K> {
    pub(crate) holder: Option<K>,
    /// Descendants made unfocusable while the target is held partially.
    pub(crate) suppressed: SmallVec<[K; 4]>,
}

impl<K> Default for TargetRecord<K> {
    fn default() -> Self {
        Self {
            holder: None,
            suppressed: SmallVec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RelationshipIndex<K> {
    invokers: HashMap<K, InvokerRecord<K>>,
    targets: HashMap<K, TargetRecord<K>>,
    markers: HashMap<K, InterestMarkers>,
}

impl<K: Copy + Eq + Hash> Default for RelationshipIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> RelationshipIndex<K> {
    pub(crate) fn new() -> Self {
        Self {
            invokers: HashMap::new(),
            targets: HashMap::new(),
            markers: HashMap::new(),
        }
    }

    /// The target `invoker` currently references, re-resolved on every call.
    ///
    /// `None` if the invoker is disconnected or its reference does not resolve.
    pub(crate) fn resolve_target<H>(host: &H, invoker: K) -> Option<K>
    where
        H: InterestHost<K> + ?Sized,
    {
        if !host.is_connected(invoker) {
            return None;
        }
        let id = host.interest_reference(invoker)?;
        host.resolve_by_id(&id)
    }

    /// The invoker holding interest in `target`, ignoring stale links whose
    /// invoker has since dropped to `NoInterest`.
    pub(crate) fn current_holder(&self, target: K) -> Option<K> {
        let holder = self.targets.get(&target)?.holder?;
        self.state_of(holder).has_interest().then_some(holder)
    }

    pub(crate) fn state_of(&self, invoker: K) -> InterestState {
        self.invokers
            .get(&invoker)
            .map(|r| r.state)
            .unwrap_or_default()
    }

    pub(crate) fn invoker(&self, invoker: K) -> Option<&InvokerRecord<K>> {
        self.invokers.get(&invoker)
    }

    pub(crate) fn invoker_mut(&mut self, invoker: K) -> Option<&mut InvokerRecord<K>> {
        self.invokers.get_mut(&invoker)
    }

    /// Fetch the record for `invoker`, creating it if needed.
    ///
    /// The flag is `true` when the record was just created.
    pub(crate) fn ensure_invoker(&mut self, invoker: K) -> (&mut InvokerRecord<K>, bool) {
        let mut created = false;
        let record = self.invokers.entry(invoker).or_insert_with(|| {
            created = true;
            InvokerRecord::default()
        });
        (record, created)
    }

    pub(crate) fn target_mut(&mut self, target: K) -> &mut TargetRecord<K> {
        self.targets.entry(target).or_default()
    }

    pub(crate) fn set_holder(&mut self, target: K, holder: K) {
        self.target_mut(target).holder = Some(holder);
    }

    /// Unlink `holder` from `target`, leaving any other holder untouched.
    pub(crate) fn clear_holder(&mut self, target: K, holder: K) {
        if let Some(record) = self.targets.get_mut(&target)
            && record.holder == Some(holder)
        {
            record.holder = None;
        }
    }

    /// Every invoker not in `NoInterest`.
    pub(crate) fn holders(&self) -> impl Iterator<Item = K> + '_ {
        self.invokers
            .iter()
            .filter(|(_, r)| r.state.has_interest())
            .map(|(k, _)| *k)
    }

    /// Update the marker set of `element` and return the new full set.
    pub(crate) fn update_markers(
        &mut self,
        element: K,
        insert: InterestMarkers,
        remove: InterestMarkers,
    ) -> InterestMarkers {
        let markers = self.markers.entry(element).or_default();
        markers.remove(remove);
        markers.insert(insert);
        let out = *markers;
        if out.is_empty() {
            self.markers.remove(&element);
        }
        out
    }

    pub(crate) fn markers(&self, element: K) -> InterestMarkers {
        self.markers.get(&element).copied().unwrap_or_default()
    }

    pub(crate) fn invoker_count(&self) -> usize {
        self.invokers.len()
    }

    /// Drop inert records of disconnected elements. Returns how many invoker
    /// records were removed.
    pub(crate) fn prune<H>(&mut self, host: &H) -> usize
    where
        H: InterestHost<K> + ?Sized,
    {
        let before = self.invokers.len();
        self.invokers.retain(|k, r| host.is_connected(*k) || !r.is_inert());
        self.targets.retain(|k, r| {
            host.is_connected(*k) || r.holder.is_some() || !r.suppressed.is_empty()
        });
        before - self.invokers.len()
    }

    pub(crate) fn clear(&mut self) {
        self.invokers.clear();
        self.targets.clear();
        self.markers.clear();
    }
}
