//! Sync planning: partition desired and installed keys into buckets.

use std::collections::BTreeSet;

use engteam_catalog::ResourceKey;

/// Caller-selected sync behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Refresh every installed desired resource, ignoring fingerprints.
    pub force: bool,
    /// Delete installed resources that fell out of the desired set.
    pub prune: bool,
    /// Skip resources whose installed copy already matches the bundle.
    pub skip_unchanged: bool,
}

/// One invocation's plan. Not persisted.
///
/// Every desired key lands in exactly one of `to_add`, `to_update`,
/// `unchanged`; every installed key in exactly one of `to_update`,
/// `unchanged`, `to_remove`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_add: Vec<ResourceKey>,
    pub to_update: Vec<ResourceKey>,
    pub unchanged: Vec<ResourceKey>,
    pub to_remove: Vec<ResourceKey>,
}

impl SyncPlan {
    /// Partition `desired` against `installed`.
    ///
    /// `is_unchanged` is consulted only for keys in both sets, and only in
    /// skip-unchanged mode without `force`.
    pub fn compute(
        desired: &BTreeSet<ResourceKey>,
        installed: &BTreeSet<ResourceKey>,
        options: SyncOptions,
        mut is_unchanged: impl FnMut(&ResourceKey) -> bool,
    ) -> Self {
        let gate = options.skip_unchanged && !options.force;
        let mut plan = Self::default();

        for key in desired {
            if !installed.contains(key) {
                plan.to_add.push(key.clone());
            } else if gate && is_unchanged(key) {
                plan.unchanged.push(key.clone());
            } else {
                plan.to_update.push(key.clone());
            }
        }

        plan.to_remove = installed.difference(desired).cloned().collect();
        plan
    }

    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[ResourceKey]) -> BTreeSet<ResourceKey> {
        items.iter().cloned().collect()
    }

    #[test]
    fn partitions_desired_and_installed() {
        let desired = keys(&[ResourceKey::agent("a"), ResourceKey::skill("s1")]);
        let installed = keys(&[ResourceKey::skill("s1"), ResourceKey::skill("old")]);

        let plan = SyncPlan::compute(&desired, &installed, SyncOptions::default(), |_| {
            panic!("fingerprints must not be consulted without skip_unchanged")
        });
        assert_eq!(plan.to_add, vec![ResourceKey::agent("a")]);
        assert_eq!(plan.to_update, vec![ResourceKey::skill("s1")]);
        assert!(plan.unchanged.is_empty());
        assert_eq!(plan.to_remove, vec![ResourceKey::skill("old")]);
    }

    #[test]
    fn skip_unchanged_gates_on_fingerprint() {
        let desired = keys(&[ResourceKey::skill("same"), ResourceKey::skill("edited")]);
        let installed = desired.clone();
        let options = SyncOptions {
            skip_unchanged: true,
            ..SyncOptions::default()
        };

        let plan = SyncPlan::compute(&desired, &installed, options, |k| k.name == "same");
        assert_eq!(plan.unchanged, vec![ResourceKey::skill("same")]);
        assert_eq!(plan.to_update, vec![ResourceKey::skill("edited")]);
    }

    #[test]
    fn force_overrides_skip_unchanged() {
        let desired = keys(&[ResourceKey::skill("same"), ResourceKey::agent("new")]);
        let installed = keys(&[ResourceKey::skill("same")]);
        let options = SyncOptions {
            force: true,
            skip_unchanged: true,
            ..SyncOptions::default()
        };

        let plan = SyncPlan::compute(&desired, &installed, options, |_| true);
        assert_eq!(plan.to_add, vec![ResourceKey::agent("new")]);
        assert_eq!(plan.to_update, vec![ResourceKey::skill("same")]);
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn empty_desired_removes_everything() {
        let installed = keys(&[ResourceKey::agent("a"), ResourceKey::skill("s1")]);
        let plan = SyncPlan::compute(
            &BTreeSet::new(),
            &installed,
            SyncOptions::default(),
            |_| false,
        );
        assert_eq!(plan.to_remove.len(), 2);
        assert!(!plan.is_noop());
    }
}
