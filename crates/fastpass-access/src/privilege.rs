use std::collections::BTreeSet;

use fastpass_core::UserId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Fixed manager allow-list. Configured at startup, never edited at runtime.
pub struct PrivilegeGuard {
    managers: BTreeSet<UserId>,
}

impl PrivilegeGuard {
    /// Builds the guard, dropping blank identifiers.
    pub fn new<I, U>(managers: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        let managers = managers
            .into_iter()
            .map(|id| {
                let id: UserId = id.into();
                UserId::new(id.as_str().trim())
            })
            .filter(|id| !id.as_str().is_empty())
            .collect();
        Self { managers }
    }

    pub fn is_manager(&self, id: &UserId) -> bool {
        self.managers.contains(id)
    }

    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }
}
