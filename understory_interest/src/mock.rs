// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host used by the unit tests.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::error::{DisclosureError, InterestError};
use crate::host::InterestHost;
use crate::types::{
    AccessibilityUpdate, AnchorId, InterestEvent, InterestEventKind, InterestMarkers,
};

/// A recorded side effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Event(u32, InterestEvent<u32>),
    Show(u32, u32),
    Hide(u32),
    Anchor(u32, u32, Option<AnchorId>),
}

/// A tree change a listener makes while handling a lifecycle event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Mutation {
    Disconnect(u32),
    Refer(u32, String),
}

#[derive(Debug, Default)]
pub(crate) struct MockHost {
    next: u32,
    names: HashMap<String, u32>,
    parents: HashMap<u32, u32>,
    references: HashMap<u32, String>,
    disconnected: HashSet<u32>,
    hovered: HashSet<u32>,
    descendants: HashMap<u32, Vec<u32>>,
    styles: HashMap<(u32, String), String>,
    plain_hints: HashSet<u32>,
    on_event: Option<(u32, InterestEventKind, Mutation)>,
    pub(crate) veto: HashSet<(u32, InterestEventKind)>,
    pub(crate) calls: Vec<Call>,
    pub(crate) shown: HashSet<u32>,
    pub(crate) markers: HashMap<u32, InterestMarkers>,
    pub(crate) accessibility: Vec<(u32, AccessibilityUpdate<u32>)>,
    pub(crate) unfocusable: HashSet<u32>,
    pub(crate) errors: Vec<InterestError>,
}

impl MockHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Create a connected element addressable by `name`.
    pub(crate) fn element(&mut self, name: &str) -> u32 {
        self.next += 1;
        self.names.insert(name.to_string(), self.next);
        self.next
    }

    pub(crate) fn child(&mut self, parent: u32, name: &str) -> u32 {
        let el = self.element(name);
        self.parents.insert(el, parent);
        el
    }

    /// Make `invoker` reference the element called `target`.
    pub(crate) fn refer(&mut self, invoker: u32, target: &str) {
        self.references.insert(invoker, target.to_string());
    }

    pub(crate) fn unrefer(&mut self, invoker: u32) {
        self.references.remove(&invoker);
    }

    pub(crate) fn disconnect(&mut self, element: u32) {
        self.disconnected.insert(element);
    }

    pub(crate) fn set_hovered(&mut self, element: u32, hovered: bool) {
        if hovered {
            self.hovered.insert(element);
        } else {
            self.hovered.remove(&element);
        }
    }

    pub(crate) fn set_style(&mut self, element: u32, property: &str, value: &str) {
        self.styles
            .insert((element, property.to_string()), value.to_string());
    }

    pub(crate) fn add_focusable(&mut self, root: u32, element: u32) {
        self.descendants.entry(root).or_default().push(element);
    }

    pub(crate) fn mark_plain_hint(&mut self, target: u32) {
        self.plain_hints.insert(target);
    }

    pub(crate) fn veto(&mut self, target: u32, kind: InterestEventKind) {
        self.veto.insert((target, kind));
    }

    /// Apply `mutation` once, the next time `kind` is dispatched to `target`.
    pub(crate) fn on_event(&mut self, target: u32, kind: InterestEventKind, mutation: Mutation) {
        self.on_event = Some((target, kind, mutation));
    }

    pub(crate) fn markers(&self, element: u32) -> InterestMarkers {
        self.markers.get(&element).copied().unwrap_or_default()
    }

    pub(crate) fn events(&self, kind: InterestEventKind) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Event(_, e) if e.kind == kind))
            .count()
    }

    pub(crate) fn shows(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Show(..)))
            .count()
    }

    pub(crate) fn last_expanded(&self, invoker: u32) -> Option<bool> {
        self.accessibility.iter().rev().find_map(|(el, u)| match u {
            AccessibilityUpdate::Expanded(v) if *el == invoker => Some(*v),
            _ => None,
        })
    }
}

impl InterestHost<u32> for MockHost {
    type Id = String;

    fn interest_reference(&self, element: u32) -> Option<String> {
        self.references.get(&element).cloned()
    }

    fn resolve_by_id(&self, id: &String) -> Option<u32> {
        self.names
            .get(id)
            .copied()
            .filter(|el| self.is_connected(*el))
    }

    fn is_connected(&self, element: u32) -> bool {
        let mut current = Some(element);
        while let Some(el) = current {
            if self.disconnected.contains(&el) {
                return false;
            }
            current = self.parents.get(&el).copied();
        }
        true
    }

    fn parent_of(&self, element: u32) -> Option<u32> {
        self.parents.get(&element).copied()
    }

    fn computed_delay_value(&self, element: u32, property: &str) -> Option<String> {
        self.styles.get(&(element, property.to_string())).cloned()
    }

    fn is_hovered(&self, element: u32) -> bool {
        self.hovered.contains(&element)
    }

    fn focusable_descendants(&self, root: u32) -> Vec<u32> {
        self.descendants.get(&root).cloned().unwrap_or_default()
    }

    fn is_plain_hint(&self, target: u32) -> bool {
        self.plain_hints.contains(&target)
    }

    fn dispatch_interest_event(&mut self, target: u32, event: InterestEvent<u32>) -> bool {
        self.calls.push(Call::Event(target, event));
        let fire =
            matches!(&self.on_event, Some((t, kind, _)) if *t == target && *kind == event.kind);
        if fire && let Some((_, _, mutation)) = self.on_event.take() {
            match mutation {
                Mutation::Disconnect(el) => self.disconnect(el),
                Mutation::Refer(el, name) => self.refer(el, &name),
            }
        }
        !(event.cancelable && self.veto.contains(&(target, event.kind)))
    }

    fn show_disclosure(&mut self, target: u32, source: u32) -> Result<(), DisclosureError> {
        self.calls.push(Call::Show(target, source));
        if self.shown.insert(target) {
            Ok(())
        } else {
            Err(DisclosureError::AlreadyInState)
        }
    }

    fn hide_disclosure(&mut self, target: u32) -> Result<(), DisclosureError> {
        self.calls.push(Call::Hide(target));
        if self.shown.remove(&target) {
            Ok(())
        } else {
            Err(DisclosureError::AlreadyInState)
        }
    }

    fn set_markers(&mut self, element: u32, markers: InterestMarkers) {
        self.markers.insert(element, markers);
    }

    fn set_accessibility(&mut self, element: u32, update: AccessibilityUpdate<u32>) {
        self.accessibility.push((element, update));
    }

    fn set_focusable(&mut self, element: u32, focusable: bool) {
        if focusable {
            self.unfocusable.remove(&element);
        } else {
            self.unfocusable.insert(element);
        }
    }

    fn set_anchor(&mut self, invoker: u32, target: u32, anchor: Option<AnchorId>) {
        self.calls.push(Call::Anchor(invoker, target, anchor));
    }

    fn report_error(&mut self, error: &InterestError) {
        self.errors.push(error.clone());
    }
}
