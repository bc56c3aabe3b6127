use dashmap::DashMap;
use keygate_core::{Account, UserId};

/// Read access to the host's user accounts.
pub trait UserDirectory: Send + Sync {
    /// Look up an account. A missing id is a normal `None`, never an error.
    fn get(&self, id: UserId) -> Option<Account>;

    /// All accounts, in the directory's listing order.
    fn list(&self) -> Vec<Account>;

    /// Accounts holding `role`, in listing order.
    fn list_by_role(&self, role: &str) -> Vec<Account> {
        self.list().into_iter().filter(|a| a.has_role(role)).collect()
    }

    fn count(&self) -> usize {
        self.list().len()
    }
}

/// In-memory user directory, seeded from configuration.
///
/// Listings are ordered by login, then id.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    accounts: DashMap<UserId, Account>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let dir = Self::new();
        for account in accounts {
            dir.insert(account);
        }
        dir
    }

    /// Insert or replace an account.
    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    pub fn remove(&self, id: UserId) -> Option<Account> {
        self.accounts.remove(&id).map(|(_, a)| a)
    }
}

impl UserDirectory for MemoryDirectory {
    fn get(&self, id: UserId) -> Option<Account> {
        self.accounts.get(&id).map(|a| a.value().clone())
    }

    fn list(&self) -> Vec<Account> {
        let mut all: Vec<Account> = self.accounts.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.login.cmp(&b.login).then(a.id.cmp(&b.id)));
        all
    }

    fn count(&self) -> usize {
        self.accounts.len()
    }
}
