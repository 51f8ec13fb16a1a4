//! Rule list controller
//!
//! Owns the cached rule list, the displayed window (a prefix of the list),
//! the free-text filter and the selection. The window, the filtered view and
//! the selection are recomputed from the cache after every transition.
//!
//! Every remote round-trip is awaited in order (mutation, then re-fetch,
//! then re-slice), and the loading indicator is released on every path.

use ruleweb_config::PaginationConfig;
use std::sync::Arc;

use crate::collaborators::{
    DeleteOutcome, DismissingEditor, EditMode, LoadingGuard, LogNotifier, NoopProgress,
    NoopUndoTracker, Notifier, PendingEdit, ProgressIndicator, RuleEditor, RuleSourceRef,
    UndoTracker,
};
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::lookup::LookupProvider;
use crate::render::{DefaultScheduleDescriber, RuleRenderer, ScheduleDescriber};
use crate::selection::Selection;
use crate::types::{Rule, RuleId};

/// Modal identity reported to the undo tracker while the list is mounted
pub const MANAGE_RULES_MODAL: &str = "manage-rules";

/// Warning shown when the remote side refused some deletions
pub const PARTIAL_DELETE_WARNING: &str =
    "Some rules were not deleted because they are linked to schedules.";

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Nothing fetched yet
    Uninitialized,
    /// Window populated
    Loaded,
    /// A delete or save round-trip is in flight
    Mutating,
}

/// Window growth parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    /// Window length after the first load
    pub initial: usize,
    /// Rules added by `load_more`
    pub step: usize,
    /// Rules kept past a created or moved rule
    pub reveal_margin: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self::from(&PaginationConfig::default())
    }
}

impl From<&PaginationConfig> for WindowSettings {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            initial: config.initial_window,
            step: config.load_more_step,
            reveal_margin: config.reveal_margin,
        }
    }
}

/// Which rule the editor should open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// A fresh draft, scoped to the current payee
    Create,
    /// An existing rule from the cached list
    Existing(RuleId),
}

/// How an editor session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Dialog dismissed, nothing reloaded
    Cancelled,
    Saved {
        rule_id: RuleId,
        /// Position in the re-fetched list, `None` if it is not part of it
        index: Option<usize>,
        window_len: usize,
    },
}

/// Window length after a save.
///
/// A created rule, or an edited rule that now sits outside the window, is
/// revealed with `margin` rules after it. The window never shrinks: an
/// edited rule that stays inside keeps the window as it was, and so does a
/// rule missing from the fresh list (e.g. it no longer matches the payee
/// scope).
pub fn window_after_save(mode: EditMode, index: Option<usize>, current: usize, margin: usize) -> usize {
    match (mode, index) {
        (_, None) => current,
        (EditMode::Create, Some(idx)) => idx.saturating_add(margin).max(current),
        (EditMode::Edit, Some(idx)) if idx >= current => idx.saturating_add(margin),
        (EditMode::Edit, Some(_)) => current,
    }
}

pub struct RuleListController {
    source: RuleSourceRef,
    lookups: Arc<dyn LookupProvider>,
    editor: Arc<dyn RuleEditor>,
    progress: Arc<dyn ProgressIndicator>,
    notifier: Arc<dyn Notifier>,
    undo: Arc<dyn UndoTracker>,
    describer: Arc<dyn ScheduleDescriber>,
    errors: Arc<dyn ErrorLogger>,
    settings: WindowSettings,

    state: ListState,
    payee_id: Option<String>,
    all_rules: Vec<Rule>,
    window_len: usize,
    filter: String,
    /// Indices into `all_rules` of window rules passing the filter
    visible: Vec<usize>,
    selection: Selection,
    payees_requested: bool,
}

impl RuleListController {
    pub fn new(source: RuleSourceRef, lookups: Arc<dyn LookupProvider>, settings: WindowSettings) -> Self {
        Self {
            source,
            lookups,
            editor: Arc::new(DismissingEditor),
            progress: Arc::new(NoopProgress),
            notifier: Arc::new(LogNotifier),
            undo: Arc::new(NoopUndoTracker),
            describer: Arc::new(DefaultScheduleDescriber),
            errors: Arc::new(DefaultErrorLogger),
            settings,
            state: ListState::Uninitialized,
            payee_id: None,
            all_rules: Vec::new(),
            window_len: 0,
            filter: String::new(),
            visible: Vec::new(),
            selection: Selection::new(),
            payees_requested: false,
        }
    }

    pub fn with_editor(mut self, editor: Arc<dyn RuleEditor>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressIndicator>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_undo_tracker(mut self, undo: Arc<dyn UndoTracker>) -> Self {
        self.undo = undo;
        self
    }

    pub fn with_describer(mut self, describer: Arc<dyn ScheduleDescriber>) -> Self {
        self.describer = describer;
        self
    }

    pub fn with_error_logger(mut self, errors: Arc<dyn ErrorLogger>) -> Self {
        self.errors = errors;
        self
    }

    // ==================== Accessors ====================

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn payee_id(&self) -> Option<&str> {
        self.payee_id.as_deref()
    }

    /// Full list as last fetched
    pub fn all_rules(&self) -> &[Rule] {
        &self.all_rules
    }

    /// Displayed prefix of the full list
    pub fn window(&self) -> &[Rule] {
        let len = self.window_len.min(self.all_rules.len());
        &self.all_rules[..len]
    }

    /// Whether `load_more` would show more rules
    pub fn has_more(&self) -> bool {
        self.window_len < self.all_rules.len()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Window rules matching the filter, in window order
    pub fn filtered_rules(&self) -> Vec<&Rule> {
        self.visible
            .iter()
            .filter_map(|&idx| self.all_rules.get(idx))
            .collect()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Searchable text of a rule against the current lookups
    pub fn render(&self, rule: &Rule) -> String {
        let ctx = self.lookups.context();
        RuleRenderer::new(&ctx, self.describer.as_ref()).render(rule)
    }

    // ==================== Loading ====================

    /// Fetch the rule list (scoped to `payee_id` when given) and show the
    /// first page.
    pub async fn initialize(&mut self, payee_id: Option<&str>) -> CoreResult<()> {
        if self.state == ListState::Uninitialized {
            self.undo.set_open_modal(Some(MANAGE_RULES_MODAL));
        }

        let rules = {
            let _loading = LoadingGuard::start(Arc::clone(&self.progress));
            self.fetch_scoped(payee_id).await
        };
        let rules = rules.map_err(|e| self.report(e, "initialize"))?;
        self.payee_id = payee_id.map(str::to_string);

        log::info!(
            "Loaded {} rules{}",
            rules.len(),
            self.payee_id
                .as_deref()
                .map(|p| format!(" for payee {}", p))
                .unwrap_or_default()
        );
        self.set_rules(rules, self.settings.initial);
        self.state = ListState::Loaded;

        if !self.payees_requested {
            self.payees_requested = true;
            if let Err(e) = self.lookups.initially_load_payees().await {
                self.errors
                    .log_warning(&e.to_string(), &self.error_context("initially_load_payees"));
            }
            self.recompute();
        }

        Ok(())
    }

    /// Extend the window by one step. Returns the new window length.
    pub fn load_more(&mut self) -> CoreResult<usize> {
        self.ensure_loaded()?;
        if self.has_more() {
            self.window_len += self.settings.step;
            self.recompute();
            log::debug!("Window extended to {} of {}", self.window_len, self.all_rules.len());
        }
        Ok(self.window_len)
    }

    /// Replace the filter text; empty text shows the whole window
    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.to_string();
        self.recompute();
    }

    /// Recompute the filtered view, e.g. after the lookup tables changed
    pub fn refresh(&mut self) {
        self.recompute();
    }

    // ==================== Selection ====================

    pub fn select(&mut self, id: &str) -> bool {
        let len = self.window().len();
        self.selection.select(id, &self.all_rules[..len])
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        self.selection.deselect(id)
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        let len = self.window().len();
        self.selection.toggle(id, &self.all_rules[..len])
    }

    pub fn select_range(&mut self, id: &str) -> usize {
        let len = self.window().len();
        self.selection.select_range(id, &self.all_rules[..len])
    }

    pub fn select_all(&mut self) {
        let len = self.window().len();
        self.selection.select_all(&self.all_rules[..len]);
    }

    pub fn select_none(&mut self) {
        self.selection.select_none();
    }

    // ==================== Mutations ====================

    /// Delete every selected rule, then reload without changing the window
    /// length.
    pub async fn delete_selected(&mut self) -> CoreResult<DeleteOutcome> {
        self.ensure_loaded()?;
        if self.selection.is_empty() {
            return Err(CoreError::EmptySelection);
        }
        let ids = self.selection.ids();

        self.state = ListState::Mutating;
        let result = self.delete_and_reload(&ids).await;
        self.state = ListState::Loaded;

        result.map_err(|e| self.report(e, "delete_selected"))
    }

    async fn delete_and_reload(&mut self, ids: &[RuleId]) -> CoreResult<DeleteOutcome> {
        let _loading = LoadingGuard::start(Arc::clone(&self.progress));
        let previous_len = self.window_len;

        log::info!("Deleting {} rules", ids.len());
        let outcome = self.source.delete_rules(ids).await?;
        if outcome.some_deletions_failed {
            self.notifier.warn(PARTIAL_DELETE_WARNING);
        }

        let rules = self.fetch().await?;
        self.set_rules(rules, previous_len);
        self.selection.select_none();
        Ok(outcome)
    }

    /// Open the editor for a new draft or an existing rule.
    ///
    /// The returned handle resolves once the dialog saves or is dismissed;
    /// pass it to `complete_edit`.
    pub fn request_edit(&self, target: EditTarget) -> CoreResult<PendingEdit> {
        self.ensure_loaded()?;
        let (mode, rule) = match target {
            EditTarget::Create => (EditMode::Create, Rule::draft(self.payee_id.as_deref())),
            EditTarget::Existing(id) => {
                let rule = self
                    .all_rules
                    .iter()
                    .find(|rule| rule.id == id)
                    .cloned()
                    .ok_or(CoreError::RuleNotFound { id })?;
                (EditMode::Edit, rule)
            }
        };

        let (request, pending) = PendingEdit::channel(mode, rule);
        self.editor.open(request);
        Ok(pending)
    }

    /// Wait for an editor session and reconcile the list if it saved
    pub async fn complete_edit(&mut self, pending: PendingEdit) -> CoreResult<EditOutcome> {
        let mode = pending.mode;
        match pending.saved().await {
            Some(saved) => self.apply_saved(mode, &saved.id).await,
            None => {
                log::debug!("Rule editor dismissed");
                Ok(EditOutcome::Cancelled)
            }
        }
    }

    /// Open the editor and wait for it
    pub async fn create_or_edit(&mut self, target: EditTarget) -> CoreResult<EditOutcome> {
        let pending = self.request_edit(target)?;
        self.complete_edit(pending).await
    }

    /// Reload after the editor saved `saved_id`
    pub async fn apply_saved(&mut self, mode: EditMode, saved_id: &str) -> CoreResult<EditOutcome> {
        self.ensure_loaded()?;

        self.state = ListState::Mutating;
        let result = self.reload_after_save(mode, saved_id).await;
        self.state = ListState::Loaded;

        result.map_err(|e| self.report(e, "apply_saved"))
    }

    async fn reload_after_save(&mut self, mode: EditMode, saved_id: &str) -> CoreResult<EditOutcome> {
        let _loading = LoadingGuard::start(Arc::clone(&self.progress));

        let rules = self.fetch().await?;
        let index = rules.iter().position(|rule| rule.id == saved_id);
        let window_len = window_after_save(mode, index, self.window_len, self.settings.reveal_margin);
        self.set_rules(rules, window_len);

        log::debug!("Rule {} saved at {:?}, window {}", saved_id, index, self.window_len);
        Ok(EditOutcome::Saved {
            rule_id: saved_id.to_string(),
            index,
            window_len: self.window_len,
        })
    }

    /// Tell the undo tracker the list is gone
    pub fn unmount(self) {
        self.undo.set_open_modal(None);
    }

    // ==================== Internals ====================

    fn ensure_loaded(&self) -> CoreResult<()> {
        match self.state {
            ListState::Uninitialized => Err(CoreError::NotLoaded),
            _ => Ok(()),
        }
    }

    async fn fetch(&self) -> CoreResult<Vec<Rule>> {
        self.fetch_scoped(self.payee_id.as_deref()).await
    }

    async fn fetch_scoped(&self, payee_id: Option<&str>) -> CoreResult<Vec<Rule>> {
        match payee_id {
            Some(payee_id) => self.source.fetch_rules_for_payee(payee_id).await,
            None => self.source.fetch_all_rules().await,
        }
    }

    fn set_rules(&mut self, rules: Vec<Rule>, window_len: usize) {
        self.all_rules = rules;
        self.window_len = window_len;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.window_len = self.window_len.min(self.all_rules.len());
        let window = &self.all_rules[..self.window_len];
        self.selection.retain_within(window);

        let ctx = self.lookups.context();
        let renderer = RuleRenderer::new(&ctx, self.describer.as_ref());
        self.visible = window
            .iter()
            .enumerate()
            .filter(|(_, rule)| renderer.matches(rule, &self.filter))
            .map(|(idx, _)| idx)
            .collect();
    }

    fn error_context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new(operation).with_payee(self.payee_id.clone())
    }

    fn report(&self, error: CoreError, operation: &str) -> CoreError {
        self.errors.log_error(&error, &self.error_context(operation));
        error
    }
}

// ==================== Tests ====================
