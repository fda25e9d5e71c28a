// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interest invokers against a tiny in-memory page.
//!
//! This example shows:
//! - hover with the default show/hide delays,
//! - a per-element delay override through the shorthand property,
//! - two invokers competing for one tooltip,
//! - moving from a button into its open tooltip,
//! - Escape dismissing everything.
//!
//! Run:
//! - `cargo run -p understory_demos --example interest_tooltip`
//! - `RUST_LOG=understory_interest=trace cargo run -p understory_demos --example interest_tooltip`

use std::collections::{HashMap, HashSet};

use tracing_subscriber::EnvFilter;
use understory_interest::{
    AccessibilityUpdate, AnchorId, DisclosureError, InterestController, InterestEvent,
    InterestHost, InterestMarkers, NamedKey, Signal,
};

#[derive(Debug, Default)]
struct Node {
    name: &'static str,
    parent: Option<usize>,
    refers_to: Option<&'static str>,
    style: HashMap<&'static str, &'static str>,
}

#[derive(Debug, Default)]
struct Page {
    nodes: Vec<Node>,
    hovered: HashSet<usize>,
    open: HashSet<usize>,
}

impl Page {
    fn add(&mut self, name: &'static str, parent: Option<usize>) -> usize {
        self.nodes.push(Node {
            name,
            parent,
            ..Default::default()
        });
        self.nodes.len() - 1
    }

    fn name(&self, el: usize) -> &'static str {
        self.nodes[el].name
    }
}

impl InterestHost<usize> for Page {
    type Id = &'static str;

    fn interest_reference(&self, el: usize) -> Option<&'static str> {
        self.nodes.get(el)?.refers_to
    }

    fn resolve_by_id(&self, id: &&'static str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == *id)
    }

    fn is_connected(&self, el: usize) -> bool {
        el < self.nodes.len()
    }

    fn parent_of(&self, el: usize) -> Option<usize> {
        self.nodes.get(el)?.parent
    }

    fn computed_delay_value(&self, el: usize, property: &str) -> Option<String> {
        self.nodes.get(el)?.style.get(property).map(|v| v.to_string())
    }

    fn is_hovered(&self, el: usize) -> bool {
        self.hovered.contains(&el)
    }

    fn focusable_descendants(&self, _: usize) -> Vec<usize> {
        Vec::new()
    }

    fn dispatch_interest_event(&mut self, target: usize, event: InterestEvent<usize>) -> bool {
        println!(
            "  event {:<12} on {:<8} from {}",
            event.kind.name(),
            self.name(target),
            self.name(event.source)
        );
        true
    }

    fn show_disclosure(&mut self, target: usize, source: usize) -> Result<(), DisclosureError> {
        println!("  show  {} (for {})", self.name(target), self.name(source));
        if self.open.insert(target) {
            Ok(())
        } else {
            Err(DisclosureError::AlreadyInState)
        }
    }

    fn hide_disclosure(&mut self, target: usize) -> Result<(), DisclosureError> {
        println!("  hide  {}", self.name(target));
        if self.open.remove(&target) {
            Ok(())
        } else {
            Err(DisclosureError::AlreadyInState)
        }
    }

    fn set_markers(&mut self, el: usize, markers: InterestMarkers) {
        let classes: Vec<_> = markers.class_names().collect();
        println!("  class {:<8} = {:?}", self.name(el), classes);
    }

    fn set_accessibility(&mut self, el: usize, update: AccessibilityUpdate<usize>) {
        println!("  aria  {:<8} {:?}", self.name(el), update);
    }

    fn set_focusable(&mut self, _: usize, _: bool) {}

    fn set_anchor(&mut self, invoker: usize, _: usize, anchor: Option<AnchorId>) {
        match anchor {
            Some(anchor) => println!("  anchor {} = {anchor}", self.name(invoker)),
            None => println!("  anchor {} cleared", self.name(invoker)),
        }
    }
}

fn step(
    page: &mut Page,
    interest: &mut InterestController<usize>,
    label: &str,
    signal: Signal<usize>,
    now: u64,
) {
    println!("\n== {now:>5}ms {label} ==");
    if let Err(err) = interest.handle(page, signal, now) {
        println!("  error: {err}");
    }
}

fn advance(page: &mut Page, interest: &mut InterestController<usize>, until: u64) {
    while let Some(deadline) = interest.next_deadline().filter(|d| *d <= until) {
        println!("\n== {deadline:>5}ms timer ==");
        if let Err(err) = interest.poll(page, deadline) {
            println!("  error: {err}");
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut page = Page::default();
    let save = page.add("save", None);
    let load = page.add("load", None);
    let tip = page.add("tip", None);
    page.nodes[save].refers_to = Some("tip");
    page.nodes[load].refers_to = Some("tip");
    // Faster tooltip for `load`: show after 100ms, hide after 50ms.
    page.nodes[load].style.insert("--interest-delay", "100ms 50ms");

    let mut interest = InterestController::default();

    step(&mut page, &mut interest, "enter save", Signal::PointerEnter(save), 0);
    advance(&mut page, &mut interest, 600);

    step(&mut page, &mut interest, "leave save", Signal::PointerLeave(save), 600);
    step(&mut page, &mut interest, "enter tip", Signal::PointerEnter(tip), 650);
    page.hovered.insert(tip);
    advance(&mut page, &mut interest, 1_000);
    println!("  holder of tip: {:?}", interest.holder_of(tip).map(|h| page.name(h)));

    page.hovered.remove(&tip);
    step(&mut page, &mut interest, "leave tip", Signal::PointerLeave(tip), 1_000);
    step(&mut page, &mut interest, "enter load", Signal::PointerEnter(load), 1_100);
    advance(&mut page, &mut interest, 1_300);
    println!("  holder of tip: {:?}", interest.holder_of(tip).map(|h| page.name(h)));

    let escape = Signal::KeyDown {
        origin: load,
        key: NamedKey::Escape,
        alt: false,
    };
    step(&mut page, &mut interest, "escape", escape, 1_400);
    advance(&mut page, &mut interest, 5_000);
    println!(
        "\nholders left: {}, tasks left: {}",
        interest.invokers_with_interest().count(),
        interest.pending_task_count()
    );
}
