//! Read-only lookup tables used to turn ids into display names

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CoreResult;
use crate::types::Field;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payee {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

/// A recurring transaction template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Payee id of the scheduled transaction
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub next_date: Option<NaiveDate>,
}

/// Id-keyed payees, categories, accounts and schedules
#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    pub payees: HashMap<String, Payee>,
    pub categories: HashMap<String, Category>,
    pub accounts: HashMap<String, Account>,
    pub schedules: HashMap<String, Schedule>,
}

impl LookupContext {
    /// Build the tables from plain lists
    pub fn from_parts(
        payees: Vec<Payee>,
        categories: Vec<Category>,
        accounts: Vec<Account>,
        schedules: Vec<Schedule>,
    ) -> Self {
        Self {
            payees: payees.into_iter().map(|p| (p.id.clone(), p)).collect(),
            categories: categories.into_iter().map(|c| (c.id.clone(), c)).collect(),
            accounts: accounts.into_iter().map(|a| (a.id.clone(), a)).collect(),
            schedules: schedules.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn payee(&self, id: &str) -> Option<&Payee> {
        self.payees.get(id)
    }

    pub fn schedule(&self, id: &str) -> Option<&Schedule> {
        self.schedules.get(id)
    }

    /// Display name for an id of a reference field.
    ///
    /// Returns `None` for non-reference fields and for dangling ids.
    pub fn name_of(&self, field: Field, id: &str) -> Option<&str> {
        match field {
            Field::Payee => self.payees.get(id).map(|p| p.name.as_str()),
            Field::Category => self.categories.get(id).map(|c| c.name.as_str()),
            Field::Account => self.accounts.get(id).map(|a| a.name.as_str()),
            _ => None,
        }
    }
}

/// Source of lookup tables, typically backed by a global store
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Current snapshot of the tables
    fn context(&self) -> Arc<LookupContext>;

    /// Ask the store to load payees; dispatched once after the first rule load
    async fn initially_load_payees(&self) -> CoreResult<()>;
}

/// Provider over a fixed snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticLookups {
    context: Arc<LookupContext>,
}

impl StaticLookups {
    pub fn new(context: LookupContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }
}

#[async_trait]
impl LookupProvider for StaticLookups {
    fn context(&self) -> Arc<LookupContext> {
        Arc::clone(&self.context)
    }

    async fn initially_load_payees(&self) -> CoreResult<()> {
        log::debug!("Payees already resident ({} entries)", self.context.payees.len());
        Ok(())
    }
}
