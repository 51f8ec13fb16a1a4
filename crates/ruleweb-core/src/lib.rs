//! Rule rendering and rule list state management
//!
//! - `render`: flattens a rule into searchable text
//! - `controller`: windowed, filterable, multi-select rule list
//! - `collaborators`: traits for the remote store, editor dialog and UI hooks
//! - `store`: in-memory rule source and JSON dataset loading

pub mod collaborators;
pub mod controller;
pub mod error;
pub mod lookup;
pub mod render;
pub mod selection;
pub mod store;
pub mod types;

pub use collaborators::{
    DeleteOutcome, DismissingEditor, EditMode, EditRequest, LogNotifier, NoopProgress,
    NoopUndoTracker, Notifier, PendingEdit, ProgressIndicator, RuleEditor, RuleSource,
    RuleSourceRef, SaveHandle, UndoTracker,
};
pub use controller::{EditOutcome, EditTarget, ListState, RuleListController, WindowSettings};
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use lookup::{Account, Category, LookupContext, LookupProvider, Payee, Schedule, StaticLookups};
pub use render::{render_rule, DefaultScheduleDescriber, RuleRenderer, ScheduleDescriber, DELETED_LABEL};
pub use selection::Selection;
pub use store::{Dataset, MemoryRuleStore};
pub use types::{Action, Condition, ConditionOp, ConditionsOp, Field, Rule, RuleId, RuleValue, Stage, ValueType};
