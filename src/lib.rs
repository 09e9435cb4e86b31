//! Terraforge asset-format translator.
//!
//! Converts between the editor's internal asset-graph representation and
//! the engine's native on-disk worldgen format, in both directions. The
//! two formats disagree on operation names, field names, argument shape
//! and which concepts exist at all; the `convert` module resolves every
//! one of those mismatches with static mapping tables plus compound
//! expand/collapse rules for concepts that have no one-to-one
//! counterpart.
//!
//! The translator is pure and synchronous: it takes a `serde_json::Value`
//! tree, returns a fresh tree, and performs no I/O. File dialogs, the
//! graph canvas and previewing live in the surrounding application.

pub mod convert;
pub mod schema;
