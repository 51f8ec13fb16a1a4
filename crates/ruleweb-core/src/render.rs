//! Rule to searchable text projection
//!
//! Every rule is flattened into one line of human-readable tokens:
//! `stage conditions... actions...`. The line is only used for free-text
//! filtering, so rendering never fails: ids that no longer resolve turn
//! into `(deleted)`, and conditions or actions with an unknown field or
//! operator contribute nothing.

use ruleweb_utils::{contains_ignore_case, join_tokens};

use crate::lookup::{LookupContext, Payee, Schedule};
use crate::types::{Action, Condition, Field, Rule, RuleValue};

/// Display text for an id that no longer resolves
pub const DELETED_LABEL: &str = "(deleted)";

/// Describes a schedule for `link-schedule` actions
pub trait ScheduleDescriber: Send + Sync {
    /// `schedule` is `None` when the linked schedule no longer exists
    fn describe(&self, schedule: Option<&Schedule>, payee: Option<&Payee>) -> String;
}

/// `"<payee> (<next date>)"`, or `"Next: <next date>"` without a payee
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultScheduleDescriber;

impl ScheduleDescriber for DefaultScheduleDescriber {
    fn describe(&self, schedule: Option<&Schedule>, payee: Option<&Payee>) -> String {
        let Some(schedule) = schedule else {
            return DELETED_LABEL.to_string();
        };
        let next = schedule
            .next_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        match payee {
            Some(payee) => format!("{} ({})", payee.name, next),
            None => format!("Next: {}", next),
        }
    }
}

/// Resolve a value for display, following ids into the lookup tables
fn resolve_value(field: Field, value: &RuleValue, ctx: &LookupContext) -> String {
    if value.is_empty() {
        return String::new();
    }
    if let RuleValue::List(items) = value {
        return items
            .iter()
            .map(|item| resolve_value(field, item, ctx))
            .collect::<Vec<_>>()
            .join(", ");
    }
    if !field.is_reference() {
        return value.to_string();
    }
    value
        .as_text()
        .and_then(|id| ctx.name_of(field, id))
        .unwrap_or(DELETED_LABEL)
        .to_string()
}

fn condition_tokens(cond: &Condition, ctx: &LookupContext) -> [String; 3] {
    let value = if cond.op.is_membership() {
        cond.value
            .items()
            .iter()
            .map(|item| resolve_value(cond.field, item, ctx))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        resolve_value(cond.field, &cond.value, ctx)
    };
    [
        cond.field.label().to_string(),
        cond.op.label().to_string(),
        value,
    ]
}

fn action_tokens(
    action: &Action,
    ctx: &LookupContext,
    describer: &dyn ScheduleDescriber,
) -> Vec<String> {
    match action {
        Action::Set { field: Field::Unknown, .. } => Vec::new(),
        Action::Set { field, value, .. } => vec![
            action.label().to_string(),
            field.target_label().to_string(),
            "to".to_string(),
            resolve_value(*field, value, ctx),
        ],
        Action::LinkSchedule { value } => {
            let schedule = ctx.schedule(value);
            let payee = schedule
                .and_then(|s| s.payee.as_deref())
                .and_then(|id| ctx.payee(id));
            vec![
                action.label().to_string(),
                describer.describe(schedule, payee),
            ]
        }
        Action::Unsupported => Vec::new(),
    }
}

/// Render a rule to its searchable text
pub fn render_rule(rule: &Rule, ctx: &LookupContext, describer: &dyn ScheduleDescriber) -> String {
    let stage = rule.stage.map(|s| s.as_str()).unwrap_or("");
    let conditions: Vec<String> = rule
        .conditions
        .iter()
        .filter(|cond| cond.is_supported())
        .flat_map(|cond| condition_tokens(cond, ctx))
        .collect();
    let actions: Vec<String> = rule
        .actions
        .iter()
        .flat_map(|action| action_tokens(action, ctx, describer))
        .collect();

    format!("{} {} {}", stage, join_tokens(&conditions), join_tokens(&actions))
}

/// Renderer bound to one lookup snapshot
pub struct RuleRenderer<'a> {
    ctx: &'a LookupContext,
    describer: &'a dyn ScheduleDescriber,
}

impl<'a> RuleRenderer<'a> {
    pub fn new(ctx: &'a LookupContext, describer: &'a dyn ScheduleDescriber) -> Self {
        Self { ctx, describer }
    }

    pub fn render(&self, rule: &Rule) -> String {
        render_rule(rule, self.ctx, self.describer)
    }

    /// Case-insensitive substring match; an empty filter matches everything
    pub fn matches(&self, rule: &Rule, filter: &str) -> bool {
        filter.is_empty() || contains_ignore_case(&self.render(rule), filter)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{Account, Category};
    use crate::types::{ConditionOp, Stage};
    use chrono::NaiveDate;

    fn context() -> LookupContext {
        LookupContext::from_parts(
            vec![
                Payee { id: "p1".into(), name: "Acme".into() },
                Payee { id: "p2".into(), name: "Bakery".into() },
            ],
            vec![Category { id: "c1".into(), name: "Food".into() }],
            vec![Account { id: "a1".into(), name: "Checking".into(), closed: false }],
            vec![
                Schedule {
                    id: "s1".into(),
                    name: Some("Rent".into()),
                    payee: Some("p1".into()),
                    next_date: NaiveDate::from_ymd_opt(2026, 11, 1),
                },
                Schedule {
                    id: "s2".into(),
                    name: None,
                    payee: None,
                    next_date: None,
                },
            ],
        )
    }

    fn payee_rule(payee: &str) -> Rule {
        Rule {
            id: "r1".into(),
            stage: None,
            conditions_op: Default::default(),
            conditions: vec![Condition::new(Field::Payee, ConditionOp::Is, RuleValue::text(payee))],
            actions: vec![Action::set(Field::Category, RuleValue::text("c1"))],
        }
    }

    fn render(rule: &Rule, ctx: &LookupContext) -> String {
        render_rule(rule, ctx, &DefaultScheduleDescriber)
    }

    #[test]
    fn test_render_payee_rule() {
        assert_eq!(render(&payee_rule("p1"), &context()), " Payee is Acme set category to Food");
    }

    #[test]
    fn test_render_dangling_payee() {
        let text = render(&payee_rule("p404"), &context());
        assert_eq!(text, " Payee is (deleted) set category to Food");
    }

    #[test]
    fn test_render_dangling_category_and_account() {
        let rule = Rule {
            conditions: vec![Condition::new(Field::Account, ConditionOp::Is, RuleValue::text("gone"))],
            actions: vec![Action::set(Field::Category, RuleValue::text("gone"))],
            ..payee_rule("p1")
        };
        let text = render(&rule, &LookupContext::default());
        assert_eq!(text.matches(DELETED_LABEL).count(), 2);
    }

    #[test]
    fn test_render_membership_preserves_order() {
        let rule = Rule {
            conditions: vec![Condition::new(
                Field::Payee,
                ConditionOp::NotOneOf,
                RuleValue::list(["p2", "p404", "p1"]),
            )],
            actions: vec![],
            ..payee_rule("p1")
        };
        assert_eq!(
            render(&rule, &context()),
            " Payee not one of Bakery, (deleted), Acme "
        );
    }

    #[test]
    fn test_render_raw_values_and_stage() {
        let rule = Rule {
            stage: Some(Stage::Post),
            conditions: vec![
                Condition::new(Field::Notes, ConditionOp::Contains, RuleValue::text("coffee")),
                Condition::new(Field::Amount, ConditionOp::IsBetween, RuleValue::Range { num1: -500, num2: 0 }),
            ],
            actions: vec![Action::set(Field::Notes, RuleValue::text("morning"))],
            ..payee_rule("p1")
        };
        assert_eq!(
            render(&rule, &context()),
            "post Notes contains coffee Amount is between -500 and 0 set notes to morning"
        );
    }

    #[test]
    fn test_render_empty_value() {
        let text = render(&Rule::draft(None), &context());
        assert_eq!(text, " Payee is  set category to ");
        assert!(!text.contains(DELETED_LABEL));
    }

    #[test]
    fn test_render_link_schedule() {
        let rule = Rule {
            actions: vec![
                Action::LinkSchedule { value: "s1".into() },
                Action::LinkSchedule { value: "s2".into() },
            ],
            ..payee_rule("p1")
        };
        assert_eq!(
            render(&rule, &context()),
            " Payee is Acme link schedule Acme (2026-11-01) link schedule Next: never"
        );
    }

    #[test]
    fn test_render_missing_schedule() {
        let rule = Rule {
            actions: vec![Action::LinkSchedule { value: "s404".into() }],
            ..payee_rule("p1")
        };
        assert!(render(&rule, &context()).ends_with("link schedule (deleted)"));
    }

    #[test]
    fn test_unsupported_action_skipped() {
        let rule = Rule {
            actions: vec![Action::Unsupported, Action::set(Field::Category, RuleValue::text("c1"))],
            ..payee_rule("p1")
        };
        assert_eq!(render(&rule, &context()), " Payee is Acme set category to Food");
    }

    #[test]
    fn test_unknown_conditions_skipped() {
        let json = r#"{
            "id": "r1",
            "conditions": [
                {"field": "description", "op": "is", "value": "x"},
                {"field": "payee", "op": "is", "value": "p1"},
                {"field": "notes", "op": "matches", "value": "^a"}
            ],
            "actions": [
                {"op": "set", "field": "description", "value": "y"},
                {"op": "set", "field": "category", "value": "c1"}
            ]
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(render(&rule, &context()), " Payee is Acme set category to Food");
    }

    #[test]
    fn test_render_is_deterministic() {
        let ctx = context();
        let rule = payee_rule("p2");
        assert_eq!(render(&rule, &ctx), render(&rule, &ctx));
    }

    #[test]
    fn test_renderer_matches_case_insensitive() {
        let ctx = context();
        let renderer = RuleRenderer::new(&ctx, &DefaultScheduleDescriber);
        let rule = payee_rule("p1");
        assert!(renderer.matches(&rule, "PAYEE"));
        assert!(renderer.matches(&rule, "acme"));
        assert!(renderer.matches(&rule, ""));
        assert!(!renderer.matches(&rule, "groceries"));
    }
}
