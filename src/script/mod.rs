//! Scripted conversation: the fixed prompt plan and the cursor into it.
//!
//! [`ScriptPlan`] is immutable once built.  [`ScriptNavigator`] walks it one
//! line per completed listening round and parks on the terminal line.

pub mod navigator;

pub use navigator::{ScriptNavigator, ScriptPlan};
