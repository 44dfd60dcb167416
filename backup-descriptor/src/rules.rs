//! Access-control rule collaborator.
//!
//! Rule storage is owned elsewhere. The builder only needs to know whether a
//! package has any rules, and must hold the rule set open no longer than the
//! count query.

use crate::utils::errors::Result;

/// An open rule set. Dropping it releases the underlying resource.
pub trait RuleSet {
    fn entry_count(&self) -> usize;
}

/// Opens per-package rule sets.
pub trait RuleStore {
    fn acquire<'a>(&'a self, package_name: &str) -> Result<Box<dyn RuleSet + 'a>>;
}

/// Whether `package_name` has at least one rule. The rule set is released
/// before this returns, on every path.
pub fn has_rules(store: &dyn RuleStore, package_name: &str) -> Result<bool> {
    let rules = store.acquire(package_name)?;
    let count = rules.entry_count();
    drop(rules);

    tracing::debug!("{} access-control rules for {}", count, package_name);
    Ok(count > 0)
}
