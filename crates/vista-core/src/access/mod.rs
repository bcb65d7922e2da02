use std::collections::{HashMap, HashSet};

/// Decides whether a subject may see the controls for an action.
///
/// Display-only: nothing in this crate enforces the answer.
pub trait CapabilityCheck: Send + Sync {
    fn has_capability(&self, subject: &str, action: &str) -> bool;
}

/// Allows everything. Default for sections without permission data.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl CapabilityCheck for AllowAll {
    fn has_capability(&self, _subject: &str, _action: &str) -> bool {
        true
    }
}

/// Static permission arrays keyed by subject (user or role).
#[derive(Debug, Default, Clone)]
pub struct PermissionSet {
    grants: HashMap<String, HashSet<String>>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant<I, S>(mut self, subject: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(subject.into())
            .or_default()
            .extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn actions(&self, subject: &str) -> impl Iterator<Item = &str> {
        self.grants
            .get(subject)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}

impl CapabilityCheck for PermissionSet {
    fn has_capability(&self, subject: &str, action: &str) -> bool {
        self.grants
            .get(subject)
            .is_some_and(|set| set.contains(action) || set.contains("*"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_are_per_subject() {
        let perms = PermissionSet::new()
            .grant("hr-partner", ["alerts.act", "surveys.create"])
            .grant("admin", ["*"]);

        assert!(perms.has_capability("hr-partner", "alerts.act"));
        assert!(!perms.has_capability("hr-partner", "flags.toggle"));
        assert!(perms.has_capability("admin", "flags.toggle"));
        assert!(!perms.has_capability("guest", "alerts.act"));
    }

    #[test]
    fn grant_accumulates() {
        let perms = PermissionSet::new()
            .grant("viewer", ["a"])
            .grant("viewer", ["b"]);
        let mut actions: Vec<&str> = perms.actions("viewer").collect();
        actions.sort_unstable();
        assert_eq!(actions, vec!["a", "b"]);
    }

    #[test]
    fn allow_all_allows() {
        assert!(AllowAll.has_capability("anyone", "anything"));
    }
}
