//! Interfaces to everything the rule list does not own: the remote rule
//! store, the editor dialog, the undo tracker, the loading indicator and
//! user-visible warnings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::CoreResult;
use crate::types::{Rule, RuleId};

// ==================== Remote rule store ====================

/// Result of a bulk delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Some rules were refused (e.g. still linked to a schedule)
    #[serde(rename = "someDeletionsFailed")]
    pub some_deletions_failed: bool,
}

/// Remote source of rules
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn fetch_all_rules(&self) -> CoreResult<Vec<Rule>>;

    async fn fetch_rules_for_payee(&self, payee_id: &str) -> CoreResult<Vec<Rule>>;

    async fn delete_rules(&self, ids: &[RuleId]) -> CoreResult<DeleteOutcome>;
}

/// Source reference type
pub type RuleSourceRef = Arc<dyn RuleSource>;

// ==================== Editor dialog ====================

/// Modal kind used for the rule editor
pub const EDIT_RULE_MODAL: &str = "edit-rule";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit,
}

/// One-shot completion handle given to the editor.
///
/// `save` consumes the handle, so a dialog can report at most one save.
/// Dropping it without saving is a cancellation.
#[derive(Debug)]
pub struct SaveHandle {
    sender: oneshot::Sender<Rule>,
}

impl SaveHandle {
    /// Report the saved rule. Returns false when nobody is waiting any more.
    pub fn save(self, rule: Rule) -> bool {
        self.sender.send(rule).is_ok()
    }
}

/// Request to open the rule editor
#[derive(Debug)]
pub struct EditRequest {
    pub kind: &'static str,
    pub mode: EditMode,
    /// Draft for create, the existing rule for edit
    pub rule: Rule,
    pub on_save: SaveHandle,
}

/// Editor waiting on the other side of an `EditRequest`
#[derive(Debug)]
pub struct PendingEdit {
    pub mode: EditMode,
    receiver: oneshot::Receiver<Rule>,
}

impl PendingEdit {
    /// Build a request and the matching pending handle
    pub fn channel(mode: EditMode, rule: Rule) -> (EditRequest, PendingEdit) {
        let (sender, receiver) = oneshot::channel();
        let request = EditRequest {
            kind: EDIT_RULE_MODAL,
            mode,
            rule,
            on_save: SaveHandle { sender },
        };
        (request, PendingEdit { mode, receiver })
    }

    /// Wait for the dialog; `None` when it was dismissed
    pub async fn saved(self) -> Option<Rule> {
        self.receiver.await.ok()
    }
}

/// Presents the rule editor
pub trait RuleEditor: Send + Sync {
    fn open(&self, request: EditRequest);
}

/// Editor that dismisses every request
#[derive(Debug, Default)]
pub struct DismissingEditor;

impl RuleEditor for DismissingEditor {
    fn open(&self, request: EditRequest) {
        log::debug!("No editor attached, dismissing {} request", request.kind);
    }
}

// ==================== Ambient collaborators ====================

/// Loading indicator of the hosting container
pub trait ProgressIndicator: Send + Sync {
    fn set_loading(&self, loading: bool);
}

#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressIndicator for NoopProgress {
    fn set_loading(&self, _loading: bool) {}
}

/// Turns the indicator on and guarantees it is turned off again, on every
/// exit path including errors.
pub struct LoadingGuard {
    progress: Arc<dyn ProgressIndicator>,
}

impl LoadingGuard {
    pub fn start(progress: Arc<dyn ProgressIndicator>) -> Self {
        progress.set_loading(true);
        Self { progress }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.progress.set_loading(false);
    }
}

/// Non-fatal, user-visible warnings
pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
}

/// Notifier that writes warnings to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn warn(&self, message: &str) {
        log::warn!(target: "ruleweb::notify", "{}", message);
    }
}

/// Tracks which modal is open, for undo/redo bookkeeping
pub trait UndoTracker: Send + Sync {
    fn set_open_modal(&self, modal: Option<&str>);
}

#[derive(Debug, Default)]
pub struct NoopUndoTracker;

impl UndoTracker for NoopUndoTracker {
    fn set_open_modal(&self, _modal: Option<&str>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<bool>>);

    impl ProgressIndicator for Recorder {
        fn set_loading(&self, loading: bool) {
            self.0.lock().unwrap().push(loading);
        }
    }

    #[test]
    fn test_loading_guard_clears_on_early_return() {
        fn failing(progress: Arc<dyn ProgressIndicator>) -> Result<(), String> {
            let _guard = LoadingGuard::start(progress);
            Err("boom".to_string())
        }

        let recorder = Arc::new(Recorder::default());
        assert!(failing(recorder.clone()).is_err());
        assert_eq!(*recorder.0.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_pending_edit_saved() {
        let (request, pending) = PendingEdit::channel(EditMode::Create, Rule::draft(None));
        assert_eq!(request.kind, EDIT_RULE_MODAL);

        let mut rule = request.rule.clone();
        rule.id = "r1".to_string();
        assert!(request.on_save.save(rule));

        let saved = pending.saved().await.unwrap();
        assert_eq!(saved.id, "r1");
    }

    #[tokio::test]
    async fn test_pending_edit_dismissed() {
        let (request, pending) = PendingEdit::channel(EditMode::Edit, Rule::draft(None));
        DismissingEditor.open(request);
        assert!(pending.saved().await.is_none());
    }

    #[test]
    fn test_delete_outcome_json() {
        let outcome: DeleteOutcome = serde_json::from_str(r#"{"someDeletionsFailed": true}"#).unwrap();
        assert!(outcome.some_deletions_failed);
    }
}
