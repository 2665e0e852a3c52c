//! Spyglass Overlay - egui front end for the inspector core
//!
//! Renders the three-pane inspector window (hierarchy, members, activity
//! log) on top of whatever egui context the embedding application drives.
//! All state mutation goes through [`spyglass_core::Inspector`]; this crate
//! only owns widget-local state such as search boxes and collapse sets.

pub mod panel;

pub use panel::InspectorPanel;
