//! Render targets: tables, dropdowns and other row containers

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

/// One child of a render target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RenderUnit {
    /// Rendered View Row
    Row(String),
    /// Stand-in shown when there are no rows
    Placeholder(String),
}

impl RenderUnit {
    /// Rendered text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            RenderUnit::Row(text) | RenderUnit::Placeholder(text) => text,
        }
    }

    /// Check if this is a rendered row
    #[inline]
    #[must_use]
    pub fn is_row(&self) -> bool {
        matches!(self, RenderUnit::Row(_))
    }
}

/// Container a view renders into
///
/// `replace_children` swaps the whole child list at once. Implementations
/// must never show a mix of two passes.
pub trait RenderTarget: Send + Sync + Debug {
    /// Stable identity (e.g. element id)
    fn id(&self) -> &str;

    /// Replace all children with `units`
    fn replace_children(&self, units: &[RenderUnit]);

    /// Show or clear the error indicator
    fn set_error_indicator(&self, message: Option<&str>);
}

/// Observed state of a [`MemoryTarget`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSnapshot {
    /// Current children
    pub units: Vec<RenderUnit>,
    /// Current error indicator
    pub error: Option<String>,
    /// Number of `replace_children` calls so far
    pub replacements: u64,
}

/// In-memory render target
#[derive(Debug)]
pub struct MemoryTarget {
    id: String,
    state: Mutex<TargetSnapshot>,
}

impl MemoryTarget {
    /// Create empty target
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(TargetSnapshot::default()),
        }
    }

    /// Create shared target
    #[must_use]
    pub fn shared(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(id))
    }

    /// Copy of current state
    #[must_use]
    pub fn snapshot(&self) -> TargetSnapshot {
        self.state.lock().clone()
    }

    /// Current children
    #[must_use]
    pub fn units(&self) -> Vec<RenderUnit> {
        self.state.lock().units.clone()
    }

    /// Current error indicator
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Number of row units (placeholders excluded)
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.state.lock().units.iter().filter(|u| u.is_row()).count()
    }

    /// Children joined by newlines
    #[must_use]
    pub fn render_text(&self) -> String {
        self.state
            .lock()
            .units
            .iter()
            .map(RenderUnit::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RenderTarget for MemoryTarget {
    fn id(&self) -> &str {
        &self.id
    }

    fn replace_children(&self, units: &[RenderUnit]) {
        let mut state = self.state.lock();
        state.units = units.to_vec();
        state.replacements += 1;
    }

    fn set_error_indicator(&self, message: Option<&str>) {
        self.state.lock().error = message.map(ToString::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_everything() {
        let target = MemoryTarget::new("doctorSelect");
        target.replace_children(&[
            RenderUnit::Row("Ada Lovelace".into()),
            RenderUnit::Row("Alan Turing".into()),
        ]);
        target.replace_children(&[RenderUnit::Placeholder("No records found.".into())]);

        let snapshot = target.snapshot();
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.replacements, 2);
        assert_eq!(target.row_count(), 0);
        assert_eq!(target.render_text(), "No records found.");
    }

    #[test]
    fn error_indicator_set_and_cleared() {
        let target = MemoryTarget::new("appointmentsTableBody");
        target.set_error_indicator(Some("store 'appointments' is unavailable"));
        assert_eq!(
            target.error().as_deref(),
            Some("store 'appointments' is unavailable")
        );
        target.set_error_indicator(None);
        assert!(target.error().is_none());
    }
}
