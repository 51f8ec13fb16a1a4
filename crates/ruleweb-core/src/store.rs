//! In-memory rule source and the JSON dataset that seeds it

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;

use crate::collaborators::{DeleteOutcome, RuleSource};
use crate::error::CoreResult;
use crate::lookup::{Account, Category, LookupContext, Payee, Schedule, StaticLookups};
use crate::types::{Rule, RuleId, Stage};

fn stage_rank(stage: Option<Stage>) -> u8 {
    match stage {
        Some(Stage::Pre) => 0,
        None => 1,
        Some(Stage::Post) => 2,
    }
}

/// Order rules the way they run: `pre`, unstaged, then `post`.
/// Order within a stage is kept.
pub fn rank_rules(rules: &mut [Rule]) {
    rules.sort_by_key(|rule| stage_rank(rule.stage));
}

/// Rule source backed by a vector
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl MemoryRuleStore {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Insert or replace a rule; new rules get an id
    pub async fn save_rule(&self, mut rule: Rule) -> CoreResult<Rule> {
        let mut rules = self.rules.write().await;
        if rule.is_new() {
            rule.id = ruleweb_utils::generate_id("rule");
            log::debug!("Creating rule {}", rule.id);
            rules.push(rule.clone());
        } else if let Some(existing) = rules.iter_mut().find(|r| r.id == rule.id) {
            log::debug!("Updating rule {}", rule.id);
            *existing = rule.clone();
        } else {
            log::debug!("Inserting rule {} with caller-provided id", rule.id);
            rules.push(rule.clone());
        }
        Ok(rule)
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }
}

#[async_trait]
impl RuleSource for MemoryRuleStore {
    async fn fetch_all_rules(&self) -> CoreResult<Vec<Rule>> {
        let mut rules = self.rules.read().await.clone();
        rank_rules(&mut rules);
        Ok(rules)
    }

    async fn fetch_rules_for_payee(&self, payee_id: &str) -> CoreResult<Vec<Rule>> {
        let mut rules: Vec<Rule> = self
            .rules
            .read()
            .await
            .iter()
            .filter(|rule| rule.references_payee(payee_id))
            .cloned()
            .collect();
        rank_rules(&mut rules);
        Ok(rules)
    }

    async fn delete_rules(&self, ids: &[RuleId]) -> CoreResult<DeleteOutcome> {
        let mut rules = self.rules.write().await;
        let mut outcome = DeleteOutcome::default();

        rules.retain(|rule| {
            if !ids.contains(&rule.id) {
                return true;
            }
            if let Some(schedule) = rule.linked_schedule() {
                log::info!("Rule {} is linked to schedule {}, not deleting", rule.id, schedule);
                outcome.some_deletions_failed = true;
                return true;
            }
            false
        });

        Ok(outcome)
    }
}

/// Rules plus the lookup tables they refer to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub payees: Vec<Payee>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl Dataset {
    pub fn from_json(content: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a dataset file
    pub async fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let dataset = Self::from_json(&content)?;
        log::info!(
            "Loaded {} rules, {} payees, {} categories, {} accounts, {} schedules from {}",
            dataset.rules.len(),
            dataset.payees.len(),
            dataset.categories.len(),
            dataset.accounts.len(),
            dataset.schedules.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Split into a rule source and a lookup provider
    pub fn into_parts(self) -> (MemoryRuleStore, StaticLookups) {
        let lookups = StaticLookups::new(LookupContext::from_parts(
            self.payees,
            self.categories,
            self.accounts,
            self.schedules,
        ));
        (MemoryRuleStore::new(self.rules), lookups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupProvider;
    use crate::types::{Action, Condition, ConditionOp, Field, RuleValue};

    fn rule(id: &str, payee: &str, stage: Option<Stage>) -> Rule {
        Rule {
            id: id.to_string(),
            stage,
            conditions: vec![Condition::new(Field::Payee, ConditionOp::Is, RuleValue::text(payee))],
            ..Rule::draft(None)
        }
    }

    #[tokio::test]
    async fn test_fetch_all_ranks_by_stage() {
        let store = MemoryRuleStore::new(vec![
            rule("a", "p1", Some(Stage::Post)),
            rule("b", "p1", None),
            rule("c", "p2", Some(Stage::Pre)),
            rule("d", "p2", None),
        ]);
        let ids: Vec<String> = store.fetch_all_rules().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "b", "d", "a"]);
    }

    #[tokio::test]
    async fn test_fetch_for_payee() {
        let store = MemoryRuleStore::new(vec![rule("a", "p1", None), rule("b", "p2", None)]);
        let rules = store.fetch_rules_for_payee("p2").await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "b");
    }

    #[tokio::test]
    async fn test_delete_refuses_linked_rules() {
        let mut linked = rule("linked", "p1", None);
        linked.actions.push(Action::LinkSchedule { value: "s1".to_string() });
        let store = MemoryRuleStore::new(vec![rule("a", "p1", None), linked, rule("b", "p1", None)]);

        let outcome = store
            .delete_rules(&["a".to_string(), "linked".to_string()])
            .await
            .unwrap();
        assert!(outcome.some_deletions_failed);
        assert_eq!(store.len().await, 2);

        let outcome = store.delete_rules(&["b".to_string()]).await.unwrap();
        assert!(!outcome.some_deletions_failed);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_rule_assigns_id_and_replaces() {
        let store = MemoryRuleStore::new(vec![]);
        let created = store.save_rule(Rule::draft(Some("p1"))).await.unwrap();
        assert!(!created.id.is_empty());

        let mut edited = created.clone();
        edited.stage = Some(Stage::Pre);
        store.save_rule(edited).await.unwrap();

        let rules = store.fetch_all_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].stage, Some(Stage::Pre));
    }

    #[test]
    fn test_dataset_into_parts() {
        let json = r#"{
            "rules": [{"id": "r1", "conditions": [], "actions": []}],
            "payees": [{"id": "p1", "name": "Acme"}]
        }"#;
        let dataset = Dataset::from_json(json).unwrap();
        let (_store, lookups) = dataset.into_parts();
        assert_eq!(lookups.context().payees.len(), 1);
    }

    #[tokio::test]
    async fn test_sample_dataset() {
        let dataset = Dataset::from_json(include_str!("../../../data/rules.json")).unwrap();
        let (store, lookups) = dataset.into_parts();
        let ctx = lookups.context();

        let rules = store.fetch_all_rules().await.unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r-imported", "r-acme", "r-rent", "r-stale"]);

        let describer = crate::render::DefaultScheduleDescriber;
        let text = |id: &str| {
            let rule = rules.iter().find(|r| r.id == id).unwrap();
            crate::render::render_rule(rule, &ctx, &describer)
        };
        assert_eq!(text("r-acme"), " Payee is Acme Grocery set category to Food");
        assert_eq!(
            text("r-rent"),
            " Payee is Landlord Amount is approx -150000 link schedule Landlord (2026-11-01)"
        );
        assert_eq!(
            text("r-stale"),
            "post Account one of Checking, (deleted) set notes to reviewed"
        );
    }

    #[test]
    fn test_dataset_tolerates_unknown_conditions() {
        let json = r#"{
            "rules": [
                {"id": "r1", "conditions": [{"field": "notes", "op": "matches", "value": "^a"}], "actions": []},
                {"id": "r2", "conditions": [{"field": "description", "op": "is", "value": "x"}], "actions": []},
                {"id": "r3", "conditions": [{"field": "payee", "op": "is", "value": "p1"}], "actions": []}
            ]
        }"#;
        let dataset = Dataset::from_json(json).unwrap();
        assert_eq!(dataset.rules.len(), 3);
    }

    #[test]
    fn test_dataset_invalid_json() {
        assert!(Dataset::from_json("{\"rules\": 3}").is_err());
    }
}
