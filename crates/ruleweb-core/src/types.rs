//! Rule data model
//!
//! Rules are owned by the remote side; the controller only ever holds a
//! read-only copy. The JSON shape follows the server's rule records
//! (`conditionsOp`, `type`, `op` tags).

use serde::{Deserialize, Serialize};

/// Rule identifier
pub type RuleId = String;

/// Ordering stage of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Runs before unstaged rules
    Pre,
    /// Runs after unstaged rules
    Post,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Pre => "pre",
            Stage::Post => "post",
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pre" => Ok(Stage::Pre),
            "post" => Ok(Stage::Post),
            _ => Err(format!("Invalid stage: {}", s)),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How conditions combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionsOp {
    /// All conditions must match
    #[default]
    And,
    /// Any condition may match
    Or,
}

/// Transaction fields a rule can test or set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Payee,
    ImportedPayee,
    Category,
    Account,
    Amount,
    Date,
    Notes,
    Cleared,
    /// Any field this client does not know about
    #[serde(other)]
    Unknown,
}

impl Field {
    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Payee => "payee",
            Field::ImportedPayee => "imported_payee",
            Field::Category => "category",
            Field::Account => "account",
            Field::Amount => "amount",
            Field::Date => "date",
            Field::Notes => "notes",
            Field::Cleared => "cleared",
            Field::Unknown => "",
        }
    }

    /// Label used when the field opens a condition clause
    pub fn label(&self) -> &'static str {
        match self {
            Field::Payee => "Payee",
            Field::ImportedPayee => "Imported payee",
            Field::Category => "Category",
            Field::Account => "Account",
            Field::Amount => "Amount",
            Field::Date => "Date",
            Field::Notes => "Notes",
            Field::Cleared => "Cleared",
            Field::Unknown => "",
        }
    }

    /// Label used as the target of a `set` action
    pub fn target_label(&self) -> &'static str {
        match self {
            Field::ImportedPayee => "imported payee",
            other => other.as_str(),
        }
    }

    /// Whether values of this field are ids into a lookup table
    pub fn is_reference(&self) -> bool {
        matches!(self, Field::Payee | Field::Category | Field::Account)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOp {
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "isNot")]
    IsNot,
    #[serde(rename = "oneOf")]
    OneOf,
    #[serde(rename = "notOneOf")]
    NotOneOf,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "doesNotContain")]
    DoesNotContain,
    #[serde(rename = "isapprox")]
    IsApprox,
    #[serde(rename = "isbetween")]
    IsBetween,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "gte")]
    Gte,
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "lte")]
    Lte,
    /// Any operator this client does not know about
    #[serde(other)]
    Unknown,
}

impl ConditionOp {
    /// Human label for the operator
    pub fn label(&self) -> &'static str {
        match self {
            ConditionOp::Is => "is",
            ConditionOp::IsNot => "is not",
            ConditionOp::OneOf => "one of",
            ConditionOp::NotOneOf => "not one of",
            ConditionOp::Contains => "contains",
            ConditionOp::DoesNotContain => "does not contain",
            ConditionOp::IsApprox => "is approx",
            ConditionOp::IsBetween => "is between",
            ConditionOp::Gt => "is greater than",
            ConditionOp::Gte => "is greater than or equals",
            ConditionOp::Lt => "is less than",
            ConditionOp::Lte => "is less than or equals",
            ConditionOp::Unknown => "",
        }
    }

    /// Membership operators carry a list of values
    pub fn is_membership(&self) -> bool {
        matches!(self, ConditionOp::OneOf | ConditionOp::NotOneOf)
    }
}

/// Value type tag, consulted by the formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Id,
    #[default]
    String,
    Number,
    Date,
    Boolean,
}

/// A condition or action value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    #[default]
    Null,
    Bool(bool),
    Number(i64),
    Text(String),
    List(Vec<RuleValue>),
    Range { num1: i64, num2: i64 },
}

impl RuleValue {
    /// Convenience constructor for text and id values
    pub fn text(value: impl Into<String>) -> Self {
        RuleValue::Text(value.into())
    }

    /// Convenience constructor for id lists
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RuleValue::List(values.into_iter().map(|v| RuleValue::Text(v.into())).collect())
    }

    /// Null, empty text and empty lists render as nothing
    pub fn is_empty(&self) -> bool {
        match self {
            RuleValue::Null => true,
            RuleValue::Text(s) => s.is_empty(),
            RuleValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RuleValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list, or the value itself
    pub fn items(&self) -> &[RuleValue] {
        match self {
            RuleValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl std::fmt::Display for RuleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleValue::Null => Ok(()),
            RuleValue::Bool(b) => write!(f, "{}", b),
            RuleValue::Number(n) => write!(f, "{}", n),
            RuleValue::Text(s) => f.write_str(s),
            RuleValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            RuleValue::Range { num1, num2 } => write!(f, "{} and {}", num1, num2),
        }
    }
}

/// A single rule predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: Field,
    pub op: ConditionOp,
    #[serde(default)]
    pub value: RuleValue,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
}

impl Condition {
    /// False when the field or operator is unknown; such conditions are left
    /// out of the rendered text
    pub fn is_supported(&self) -> bool {
        self.field != Field::Unknown && self.op != ConditionOp::Unknown
    }

    pub fn new(field: Field, op: ConditionOp, value: RuleValue) -> Self {
        let value_type = if field.is_reference() {
            ValueType::Id
        } else {
            ValueType::String
        };
        Self {
            field,
            op,
            value,
            value_type,
        }
    }
}

/// A single rule effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Action {
    /// Assign a value to a field
    #[serde(rename = "set")]
    Set {
        field: Field,
        #[serde(default)]
        value: RuleValue,
        #[serde(rename = "type", default)]
        value_type: ValueType,
    },
    /// Link the transaction to a schedule
    #[serde(rename = "link-schedule")]
    LinkSchedule { value: String },
    /// Any operator this client does not know about
    #[serde(other)]
    Unsupported,
}

impl Action {
    pub fn set(field: Field, value: RuleValue) -> Self {
        let value_type = if field.is_reference() {
            ValueType::Id
        } else {
            ValueType::String
        };
        Action::Set {
            field,
            value,
            value_type,
        }
    }

    /// Human label for the action operator
    pub fn label(&self) -> &'static str {
        match self {
            Action::Set { .. } => "set",
            Action::LinkSchedule { .. } => "link schedule",
            Action::Unsupported => "",
        }
    }
}

/// A condition -> action automation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Empty for a draft that has never been saved
    #[serde(default)]
    pub id: RuleId,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(rename = "conditionsOp", default)]
    pub conditions_op: ConditionsOp,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Rule {
    /// Default draft for the "create rule" editor.
    ///
    /// The draft matches on the given payee (or an empty payee) and sets an
    /// empty category.
    pub fn draft(payee_id: Option<&str>) -> Self {
        let payee = payee_id.map(RuleValue::text).unwrap_or_default();
        Self {
            id: String::new(),
            stage: None,
            conditions_op: ConditionsOp::And,
            conditions: vec![Condition::new(Field::Payee, ConditionOp::Is, payee)],
            actions: vec![Action::set(Field::Category, RuleValue::Null)],
        }
    }

    /// True until the rule has been saved once
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    /// Whether any payee condition references the given payee
    pub fn references_payee(&self, payee_id: &str) -> bool {
        self.conditions.iter().any(|cond| {
            cond.field == Field::Payee
                && match cond.op {
                    ConditionOp::Is => cond.value.as_text() == Some(payee_id),
                    ConditionOp::OneOf => cond
                        .value
                        .items()
                        .iter()
                        .any(|v| v.as_text() == Some(payee_id)),
                    _ => false,
                }
        })
    }

    /// Id of the first schedule this rule links to
    pub fn linked_schedule(&self) -> Option<&str> {
        self.actions.iter().find_map(|action| match action {
            Action::LinkSchedule { value } => Some(value.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_from_server_json() {
        let json = r#"{
            "id": "r1",
            "stage": "pre",
            "conditionsOp": "or",
            "conditions": [
                {"field": "payee", "op": "oneOf", "value": ["p1", "p2"], "type": "id"},
                {"field": "amount", "op": "isbetween", "value": {"num1": -500, "num2": 0}, "type": "number"}
            ],
            "actions": [
                {"op": "set", "field": "category", "value": "c1", "type": "id"},
                {"op": "link-schedule", "value": "s1"},
                {"op": "prepend-notes", "value": "x"}
            ]
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();

        assert_eq!(rule.stage, Some(Stage::Pre));
        assert_eq!(rule.conditions_op, ConditionsOp::Or);
        assert_eq!(rule.conditions[0].value, RuleValue::list(["p1", "p2"]));
        assert_eq!(rule.conditions[1].value, RuleValue::Range { num1: -500, num2: 0 });
        assert_eq!(rule.actions[1], Action::LinkSchedule { value: "s1".to_string() });
        assert_eq!(rule.actions[2], Action::Unsupported);
    }

    #[test]
    fn test_null_value_and_missing_stage() {
        let json = r#"{"id": "r2", "conditions": [{"field": "notes", "op": "contains", "value": null}], "actions": []}"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.stage, None);
        assert_eq!(rule.conditions[0].value, RuleValue::Null);
        assert_eq!(rule.conditions[0].value_type, ValueType::String);
    }

    #[test]
    fn test_draft_scoped_to_payee() {
        let draft = Rule::draft(Some("p9"));
        assert!(draft.is_new());
        assert!(draft.references_payee("p9"));
        assert_eq!(draft.actions, vec![Action::set(Field::Category, RuleValue::Null)]);

        let unscoped = Rule::draft(None);
        assert_eq!(unscoped.conditions[0].value, RuleValue::Null);
        assert!(!unscoped.references_payee("p9"));
    }

    #[test]
    fn test_references_payee_membership() {
        let mut rule = Rule::draft(None);
        rule.conditions = vec![Condition::new(
            Field::Payee,
            ConditionOp::OneOf,
            RuleValue::list(["p1", "p2"]),
        )];
        assert!(rule.references_payee("p2"));
        assert!(!rule.references_payee("p3"));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(RuleValue::Null.to_string(), "");
        assert_eq!(RuleValue::Number(-1250).to_string(), "-1250");
        assert_eq!(RuleValue::Bool(true).to_string(), "true");
        assert_eq!(RuleValue::list(["a", "b"]).to_string(), "a, b");
        assert_eq!(RuleValue::Range { num1: 1, num2: 5 }.to_string(), "1 and 5");
    }

    #[test]
    fn test_unknown_field_and_operator() {
        let json = r#"{
            "id": "r3",
            "conditions": [
                {"field": "description", "op": "is", "value": "x"},
                {"field": "notes", "op": "matches", "value": "^a"},
                {"field": "notes", "op": "contains", "value": "b"}
            ],
            "actions": [{"op": "set", "field": "description", "value": "y"}]
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();

        assert_eq!(rule.conditions[0].field, Field::Unknown);
        assert_eq!(rule.conditions[1].op, ConditionOp::Unknown);
        assert!(!rule.conditions[0].is_supported());
        assert!(!rule.conditions[1].is_supported());
        assert!(rule.conditions[2].is_supported());
        assert!(matches!(rule.actions[0], Action::Set { field: Field::Unknown, .. }));
    }

    #[test]
    fn test_stage_from_str() {
        assert_eq!("PRE".parse::<Stage>(), Ok(Stage::Pre));
        assert!("middle".parse::<Stage>().is_err());
    }
}
