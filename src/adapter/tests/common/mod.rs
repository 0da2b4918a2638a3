//! Shared helpers for adapter integration tests

#![allow(dead_code)]

use cretoai_policy_adapter::{
    Adapter, AdapterConfig, FieldFilter, Filter, PolicyRule, Result, SqlAdapter,
};
use sqlx::Executor;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fresh adapter over an empty in-memory SQLite table
pub async fn memory_adapter() -> SqlAdapter {
    init_tracing();
    SqlAdapter::connect(AdapterConfig::sqlite_memory())
        .await
        .expect("in-memory adapter should connect")
}

/// Seed the classic RBAC fixture with raw inserts, leaving unused columns NULL
pub async fn seed(adapter: &SqlAdapter) {
    let table = adapter.table_name();
    let statements = [
        format!("DELETE FROM {}", table),
        format!("INSERT INTO {} (ptype, v0, v1, v2) VALUES ('p', 'alice', 'data1', 'read')", table),
        format!("INSERT INTO {} (ptype, v0, v1, v2) VALUES ('p', 'bob', 'data2', 'write')", table),
        format!("INSERT INTO {} (ptype, v0, v1, v2) VALUES ('p', 'data2_admin', 'data2', 'read')", table),
        format!("INSERT INTO {} (ptype, v0, v1, v2) VALUES ('p', 'data2_admin', 'data2', 'write')", table),
        format!("INSERT INTO {} (ptype, v0, v1) VALUES ('g', 'alice', 'data2_admin')", table),
    ];
    for statement in &statements {
        adapter
            .pool()
            .execute(statement.as_str())
            .await
            .expect("seed statement should succeed");
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn rule(ptype: &str, values: &[&str]) -> PolicyRule {
    PolicyRule::new(ptype, values.iter().copied()).expect("test rule should be valid")
}

/// Sort rules so loads can be compared as multisets
pub fn sorted(mut rules: Vec<PolicyRule>) -> Vec<PolicyRule> {
    rules.sort();
    rules
}

/// Minimal RBAC enforcer standing in for the engine
///
/// Model: `r = sub, obj, act`, `p = sub, obj, act`, `g = _, _`,
/// matcher `g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act`.
pub struct Enforcer {
    adapter: Arc<dyn Adapter>,
    rules: Vec<PolicyRule>,
}

impl Enforcer {
    pub async fn new(adapter: Arc<dyn Adapter>) -> Result<Self> {
        let rules = adapter.load_policy().await?;
        Ok(Self { adapter, rules })
    }

    /// Enforcer that has not loaded anything yet
    pub fn empty(adapter: Arc<dyn Adapter>) -> Self {
        Self { adapter, rules: Vec::new() }
    }

    pub fn enforce(&self, sub: &str, obj: &str, act: &str) -> bool {
        let subjects = self.subjects_of(sub);
        self.rules.iter().filter(|r| r.ptype() == "p").any(|r| {
            subjects.contains(r.field(0)) && r.field(1) == obj && r.field(2) == act
        })
    }

    /// `sub` plus every role reachable through `g` rules
    fn subjects_of(&self, sub: &str) -> HashSet<String> {
        let mut seen = HashSet::from([sub.to_string()]);
        let mut queue = VecDeque::from([sub.to_string()]);
        while let Some(current) = queue.pop_front() {
            for r in self.rules.iter().filter(|r| r.ptype() == "g" && r.field(0) == current) {
                if seen.insert(r.field(1).to_string()) {
                    queue.push_back(r.field(1).to_string());
                }
            }
        }
        seen
    }

    pub fn get_policy(&self) -> Vec<Vec<String>> {
        self.rules
            .iter()
            .filter(|r| r.ptype() == "p")
            .map(|r| r.values().to_vec())
            .collect()
    }

    pub async fn load_filtered_policy(&mut self, filter: Filter) -> Result<()> {
        self.rules = self.adapter.load_filtered_policy(&filter).await?;
        Ok(())
    }

    pub async fn add_permission_for_user(&mut self, user: &str, obj: &str, act: &str) -> Result<()> {
        let values = strings(&[user, obj, act]);
        self.adapter.add_policy("p", "p", &values).await?;
        self.rules.push(PolicyRule::new("p", values)?);
        Ok(())
    }

    pub async fn delete_permission_for_user(&mut self, user: &str, obj: &str, act: &str) -> Result<()> {
        let values = strings(&[user, obj, act]);
        self.adapter.remove_policy("p", "p", &values).await?;
        let removed = PolicyRule::new("p", values)?;
        self.rules.retain(|r| *r != removed);
        Ok(())
    }

    pub async fn remove_filtered_policy(&mut self, field_index: usize, values: &[&str]) -> Result<()> {
        let values = strings(values);
        self.adapter
            .remove_filtered_policy("p", "p", field_index, &values)
            .await?;

        let mut positional = vec![String::new(); field_index];
        positional.extend(values);
        let selected = FieldFilter::positional("p", positional);
        self.rules.retain(|r| !selected.matches(r));
        Ok(())
    }

    /// Replace the stored policy with exactly `rules` and reload
    pub async fn save_policy(&mut self, rules: Vec<PolicyRule>) -> Result<()> {
        self.adapter.save_policy(&rules).await?;
        self.rules = self.adapter.load_policy().await?;
        Ok(())
    }
}
