//! Script plan and navigator.

use std::sync::Arc;

use crate::config::ScriptConfig;

// ---------------------------------------------------------------------------
// ScriptPlan
// ---------------------------------------------------------------------------

/// Ordered prompt lines plus the terminal line.
///
/// Cheap to clone: the lines are shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ScriptPlan {
    lines: Arc<[String]>,
    terminal: Arc<str>,
}

impl ScriptPlan {
    pub fn new<I, S>(lines: I, terminal: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::<String>::into).collect(),
            terminal: Arc::from(terminal.into()),
        }
    }

    pub fn from_config(config: &ScriptConfig) -> Self {
        Self::new(config.lines.iter().cloned(), config.terminal.clone())
    }

    /// Number of prompt lines, not counting the terminal line.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// Prompt at `index`, or the terminal line past the end.
    pub fn line(&self, index: usize) -> &str {
        self.lines
            .get(index)
            .map(String::as_str)
            .unwrap_or_else(|| self.terminal())
    }
}

impl Default for ScriptPlan {
    fn default() -> Self {
        Self::from_config(&ScriptConfig::default())
    }
}

// ---------------------------------------------------------------------------
// ScriptNavigator
// ---------------------------------------------------------------------------

/// Cursor over a [`ScriptPlan`].
///
/// The index only moves forward and never goes past `plan.len()`, which is
/// the terminal position.
///
/// ```
/// use voice_coach::script::{ScriptNavigator, ScriptPlan};
///
/// let mut nav = ScriptNavigator::new(ScriptPlan::new(["Welcome!"], "Done"));
/// assert_eq!(nav.current(), "Welcome!");
/// nav.advance();
/// assert_eq!(nav.current(), "Done");
/// nav.advance();
/// assert_eq!(nav.current(), "Done");
/// ```
#[derive(Debug, Clone)]
pub struct ScriptNavigator {
    plan: ScriptPlan,
    index: usize,
}

impl ScriptNavigator {
    pub fn new(plan: ScriptPlan) -> Self {
        Self { plan, index: 0 }
    }

    /// The line that is live right now.
    pub fn current(&self) -> &str {
        self.plan.line(self.index)
    }

    /// Move to the next line.  No-op once the terminal line is reached.
    pub fn advance(&mut self) {
        if self.index < self.plan.len() {
            self.index += 1;
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `true` once the terminal line is live.
    pub fn is_complete(&self) -> bool {
        self.index >= self.plan.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
