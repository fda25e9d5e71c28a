// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Interest: delayed disclosure for hover, focus, and long press.
//!
//! An *invoker* references a *target* (a tooltip, a popover, a hover card).
//! Showing interest in the invoker, by hovering it, focusing it, or pressing
//! it long on a touch screen, shows the target after a configurable delay;
//! losing interest hides it again after another delay.
//!
//! This crate models that as:
//! - An [`InterestController`] owning all state: the invoker/target
//!   relationship index, the pending-task queue, and the configuration.
//! - A host trait ([`InterestHost`]) through which the controller queries the
//!   element tree and performs every side effect: lifecycle events, showing
//!   and hiding, style markers, accessibility attributes, focusability.
//! - Interaction [`Signal`]s routed to the nearest invoker, and caller-driven
//!   time: [`InterestController::poll`] fires due tasks, and
//!   [`InterestController::next_deadline`] tells the host when to call it next.
//!
//! A target has at most one holder. When a second invoker gains interest in
//! the same target, the first one loses it synchronously before the second
//! one's side effects are applied.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_interest::{
//!     AccessibilityUpdate, AnchorId, DisclosureError, InterestController, InterestEvent,
//!     InterestHost, InterestMarkers, InterestState, Signal,
//! };
//!
//! /// Two elements: 0 is a button that references 1, a tooltip.
//! #[derive(Default)]
//! struct Page {
//!     open: bool,
//! }
//!
//! impl InterestHost<u32> for Page {
//!     type Id = &'static str;
//!
//!     fn interest_reference(&self, el: u32) -> Option<&'static str> {
//!         (el == 0).then_some("tip")
//!     }
//!     fn resolve_by_id(&self, id: &&'static str) -> Option<u32> {
//!         (*id == "tip").then_some(1)
//!     }
//!     fn is_connected(&self, _: u32) -> bool { true }
//!     fn parent_of(&self, _: u32) -> Option<u32> { None }
//!     fn computed_delay_value(&self, _: u32, _: &str) -> Option<String> { None }
//!     fn is_hovered(&self, _: u32) -> bool { false }
//!     fn focusable_descendants(&self, _: u32) -> Vec<u32> { Vec::new() }
//!     fn dispatch_interest_event(&mut self, _: u32, _: InterestEvent<u32>) -> bool { true }
//!     fn show_disclosure(&mut self, _: u32, _: u32) -> Result<(), DisclosureError> {
//!         self.open = true;
//!         Ok(())
//!     }
//!     fn hide_disclosure(&mut self, _: u32) -> Result<(), DisclosureError> {
//!         self.open = false;
//!         Ok(())
//!     }
//!     fn set_markers(&mut self, _: u32, _: InterestMarkers) {}
//!     fn set_accessibility(&mut self, _: u32, _: AccessibilityUpdate<u32>) {}
//!     fn set_focusable(&mut self, _: u32, _: bool) {}
//!     fn set_anchor(&mut self, _: u32, _: u32, _: Option<AnchorId>) {}
//! }
//!
//! let mut page = Page::default();
//! let mut interest: InterestController<u32> = InterestController::default();
//!
//! // Hovering the button schedules the tooltip after the 0.5s show delay.
//! interest.handle(&mut page, Signal::PointerEnter(0), 0).unwrap();
//! assert_eq!(interest.next_deadline(), Some(500));
//! interest.poll(&mut page, 500).unwrap();
//! assert!(page.open);
//! assert_eq!(interest.state_of(0), InterestState::FullInterest);
//!
//! // Leaving hides it after the 0.25s hide delay.
//! interest.handle(&mut page, Signal::PointerLeave(0), 1_000).unwrap();
//! interest.poll(&mut page, 1_250).unwrap();
//! assert!(!page.open);
//! ```
//!
//! ## Delays
//!
//! Delays come from the host's style system through
//! [`InterestHost::computed_delay_value`]: a longhand per direction, then an
//! optional `<show> [<hide>]` shorthand, then [`InterestConfig`] defaults.
//! See [`resolve_delay`].
//!
//! ## Partial interest
//!
//! With [`InterestConfig::with_partial_interest`], keyboard focus on an
//! invoker whose target contains focusable content grants
//! [`InterestState::PartialInterest`]: the target is shown, but its content
//! stays out of the tab order until the interest is promoted (Alt+ArrowUp, or
//! the pointer entering the target).
//!
//! ## Features
//!
//! - `std`: enables `std` support in `tracing` and `thiserror`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod controller;
mod delay;
mod error;
mod host;
mod index;
mod machine;
mod router;
mod scheduler;
mod types;

#[cfg(test)]
mod mock;

pub use config::{DelayProperties, InterestConfig};
pub use controller::InterestController;
pub use delay::{delay_to_ms, parse_time, resolve_delay};
pub use error::{DelayParseError, DisclosureError, InterestError};
pub use host::InterestHost;
pub use router::{NamedKey, Signal};
pub use scheduler::TaskKind;
pub use types::{
    AccessibilityUpdate, AnchorId, DelayKind, InterestEvent, InterestEventKind, InterestMarkers,
    InterestState,
};
