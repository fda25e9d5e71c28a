// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host environment as seen by the interest controller.
//!
//! The controller never owns the element tree. Everything it needs to know
//! about elements, and every side effect it performs, goes through
//! [`InterestHost`]. Queries take `&self`; effects take `&mut self`.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{DisclosureError, InterestError};
use crate::types::{AccessibilityUpdate, AnchorId, InterestEvent, InterestMarkers};

/// Services the host UI runtime provides to the controller.
///
/// `K` is a small, copyable element handle (for example a generational node id).
pub trait InterestHost<K: Copy> {
    /// Identifier type used by invokers to reference their targets.
    type Id;

    /// The identifier `element` declares as its interest target, if any.
    fn interest_reference(&self, element: K) -> Option<Self::Id>;

    /// Resolve an identifier against the tree.
    fn resolve_by_id(&self, id: &Self::Id) -> Option<K>;

    /// Whether `element` is attached to the live tree.
    fn is_connected(&self, element: K) -> bool;

    /// Parent of `element`, or `None` at the root.
    fn parent_of(&self, element: K) -> Option<K>;

    /// Nearest of `element` and its ancestors for which `predicate` holds.
    fn closest_ancestor_matching<F>(&self, element: K, mut predicate: F) -> Option<K>
    where
        F: FnMut(K) -> bool,
    {
        let mut current = Some(element);
        while let Some(el) = current {
            if predicate(el) {
                return Some(el);
            }
            current = self.parent_of(el);
        }
        None
    }

    /// Raw textual value of a delay property for `element` (for example `"0.5s"`).
    ///
    /// `None` or an empty string means the property is not set.
    fn computed_delay_value(&self, element: K, property: &str) -> Option<String>;

    /// Whether `element` is currently under the pointer.
    fn is_hovered(&self, element: K) -> bool;

    /// Focusable descendants of `root` in tree order.
    fn focusable_descendants(&self, root: K) -> Vec<K>;

    /// Whether `root` contains any focusable content.
    fn has_focusable_descendants(&self, root: K) -> bool {
        !self.focusable_descendants(root).is_empty()
    }

    /// Whether `target` is a plain hint: text-only content with nothing for
    /// assistive technology to explore.
    fn is_plain_hint(&self, target: K) -> bool {
        let _ = target;
        false
    }

    /// Dispatch a lifecycle notification to `target`.
    ///
    /// Returns `false` if the event was cancelable and a listener canceled it.
    fn dispatch_interest_event(&mut self, target: K, event: InterestEvent<K>) -> bool;

    /// Show `target` as a disclosure anchored to `source`.
    fn show_disclosure(&mut self, target: K, source: K) -> Result<(), DisclosureError>;

    /// Hide the disclosure `target`.
    fn hide_disclosure(&mut self, target: K) -> Result<(), DisclosureError>;

    /// Replace the complete marker set of `element`.
    fn set_markers(&mut self, element: K, markers: InterestMarkers);

    /// Apply an accessibility attribute change to `element`.
    fn set_accessibility(&mut self, element: K, update: AccessibilityUpdate<K>);

    /// Include or exclude `element` from sequential focus navigation.
    fn set_focusable(&mut self, element: K, focusable: bool);

    /// Link (`Some`) or unlink (`None`) `invoker` and `target` for positioning.
    fn set_anchor(&mut self, invoker: K, target: K, anchor: Option<AnchorId>);

    /// Error channel for invariant violations. Ignored by default.
    fn report_error(&mut self, error: &InterestError) {
        let _ = error;
    }
}
