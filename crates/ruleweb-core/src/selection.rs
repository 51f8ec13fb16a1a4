//! Multi-select over the displayed window
//!
//! Every mutating call takes the current window, so the selection can only
//! ever hold ids of rules that are on screen.

use std::collections::BTreeSet;

use crate::types::{Rule, RuleId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    items: BTreeSet<RuleId>,
    /// Anchor for range selection
    anchor: Option<RuleId>,
}

fn position(window: &[Rule], id: &str) -> Option<usize> {
    window.iter().position(|rule| rule.id == id)
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select one rule; ids outside the window are ignored
    pub fn select(&mut self, id: &str, window: &[Rule]) -> bool {
        if position(window, id).is_none() {
            return false;
        }
        self.items.insert(id.to_string());
        self.anchor = Some(id.to_string());
        true
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        if self.anchor.as_deref() == Some(id) {
            self.anchor = None;
        }
        self.items.remove(id)
    }

    /// Flip one rule, returns whether it is selected afterwards
    pub fn toggle(&mut self, id: &str, window: &[Rule]) -> bool {
        if self.items.contains(id) {
            self.deselect(id);
            false
        } else {
            self.select(id, window)
        }
    }

    /// Select every rule between the anchor and `id` (inclusive).
    ///
    /// Without an anchor this is a plain select.
    pub fn select_range(&mut self, id: &str, window: &[Rule]) -> usize {
        let Some(end) = position(window, id) else {
            return 0;
        };
        let start = self
            .anchor
            .as_deref()
            .and_then(|anchor| position(window, anchor))
            .unwrap_or(end);
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };

        let mut added = 0;
        for rule in &window[lo..=hi] {
            if self.items.insert(rule.id.clone()) {
                added += 1;
            }
        }
        self.anchor = Some(id.to_string());
        added
    }

    pub fn select_all(&mut self, window: &[Rule]) {
        self.items = window.iter().map(|rule| rule.id.clone()).collect();
        self.anchor = None;
    }

    pub fn select_none(&mut self) {
        self.items.clear();
        self.anchor = None;
    }

    /// Drop ids that are no longer part of the window
    pub fn retain_within(&mut self, window: &[Rule]) {
        let visible: BTreeSet<&str> = window.iter().map(|rule| rule.id.as_str()).collect();
        self.items.retain(|id| visible.contains(id.as_str()));
        if let Some(anchor) = &self.anchor {
            if !visible.contains(anchor.as_str()) {
                self.anchor = None;
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<RuleId> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(n: usize) -> Vec<Rule> {
        (0..n)
            .map(|i| Rule {
                id: format!("r{}", i),
                ..Rule::draft(None)
            })
            .collect()
    }

    #[test]
    fn test_select_outside_window_ignored() {
        let rules = window(3);
        let mut selection = Selection::new();
        assert!(selection.select("r1", &rules));
        assert!(!selection.select("r9", &rules));
        assert_eq!(selection.ids(), vec!["r1".to_string()]);
    }

    #[test]
    fn test_toggle_and_deselect() {
        let rules = window(3);
        let mut selection = Selection::new();
        assert!(selection.toggle("r0", &rules));
        assert!(!selection.toggle("r0", &rules));
        assert!(selection.is_empty());
        assert!(!selection.deselect("r0"));
    }

    #[test]
    fn test_select_range_from_anchor() {
        let rules = window(6);
        let mut selection = Selection::new();
        selection.select("r4", &rules);
        assert_eq!(selection.select_range("r1", &rules), 3);
        assert_eq!(selection.len(), 4);
        assert!(selection.contains("r2"));
        assert!(!selection.contains("r5"));
    }

    #[test]
    fn test_select_range_without_anchor() {
        let rules = window(3);
        let mut selection = Selection::new();
        assert_eq!(selection.select_range("r2", &rules), 1);
        assert_eq!(selection.ids(), vec!["r2".to_string()]);
    }

    #[test]
    fn test_select_all_and_none() {
        let rules = window(4);
        let mut selection = Selection::new();
        selection.select_all(&rules);
        assert_eq!(selection.len(), 4);
        selection.select_none();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_within_shrunk_window() {
        let rules = window(5);
        let mut selection = Selection::new();
        selection.select_all(&rules);
        selection.retain_within(&rules[..2]);
        assert_eq!(selection.ids(), vec!["r0".to_string(), "r1".to_string()]);
    }
}
