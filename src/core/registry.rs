use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::models::{Account, AccountId, Profile, TabKind};
use crate::core::store::{self, StoreError};

/// Logged-in accounts with a single active pointer.
///
/// When non-empty, exactly one account is active.
pub trait AccountRegistry {
    fn active(&self) -> Option<Account>;
    fn set_active(&mut self, id: AccountId) -> Result<(), StoreError>;
    /// Active account first, then by most recent use.
    fn all_ordered_by_active(&self) -> Vec<Account>;
    fn update_active(&mut self, profile: &Profile) -> Result<(), StoreError>;
    /// Replace the active account's main tab layout.
    fn set_active_tabs(&mut self, tabs: Vec<TabKind>) -> Result<(), StoreError>;
    /// Remove the active account and activate the most recently used
    /// remaining one, which is returned.
    fn logout_active(&mut self) -> Result<Option<Account>, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsFile {
    #[serde(default)]
    next_seq: u64,
    #[serde(default)]
    accounts: Vec<Account>,
}

/// Registry persisted as `accounts.json`. Without a path it lives in memory.
#[derive(Debug, Default)]
pub struct AccountStore {
    path: Option<PathBuf>,
    data: AccountsFile,
}

impl AccountStore {
    pub fn in_memory() -> Self {
        AccountStore::default()
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let data: AccountsFile = store::load_json(path)?.unwrap_or_default();
        let mut store = AccountStore {
            path: Some(path.to_path_buf()),
            data,
        };
        if store.repair_active() {
            log::warn!("Repaired active account pointer in {}", path.display());
            store.flush()?;
        }
        log::info!("Loaded {} account(s) from {}", store.data.accounts.len(), path.display());
        Ok(store)
    }

    /// Add (or replace) an account after login; it becomes active.
    pub fn add_account(&mut self, account: Account) -> Result<(), StoreError> {
        let id = account.id;
        self.data.accounts.retain(|a| a.id != id);
        self.data.accounts.push(account);
        self.set_active(id)
    }

    pub fn len(&self) -> usize {
        self.data.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.accounts.is_empty()
    }

    fn flush(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => store::save_json(path, &self.data),
            None => Ok(()),
        }
    }

    fn bump_seq(&mut self) -> u64 {
        self.data.next_seq += 1;
        self.data.next_seq
    }

    /// Enforce the single-active invariant on data read from disk. Returns
    /// whether anything changed.
    fn repair_active(&mut self) -> bool {
        let active: Vec<usize> = self
            .data
            .accounts
            .iter()
            .enumerate()
            .filter(|(_, a)| a.active)
            .map(|(i, _)| i)
            .collect();
        if active.len() == 1 || self.data.accounts.is_empty() {
            return false;
        }
        let keep = self
            .data
            .accounts
            .iter()
            .enumerate()
            .filter(|(i, _)| active.is_empty() || active.contains(i))
            .max_by_key(|(_, a)| a.last_active_seq)
            .map(|(i, _)| i);
        for (i, account) in self.data.accounts.iter_mut().enumerate() {
            account.active = Some(i) == keep;
        }
        true
    }
}

impl AccountRegistry for AccountStore {
    fn active(&self) -> Option<Account> {
        self.data.accounts.iter().find(|a| a.active).cloned()
    }

    fn set_active(&mut self, id: AccountId) -> Result<(), StoreError> {
        if !self.data.accounts.iter().any(|a| a.id == id) {
            return Err(StoreError::UnknownAccount(id));
        }
        let seq = self.bump_seq();
        for account in &mut self.data.accounts {
            account.active = account.id == id;
            if account.active {
                account.last_active_seq = seq;
            }
        }
        log::info!("Active account is now {}", id);
        self.flush()
    }

    fn all_ordered_by_active(&self) -> Vec<Account> {
        let mut all = self.data.accounts.clone();
        all.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then(b.last_active_seq.cmp(&a.last_active_seq))
        });
        all
    }

    fn update_active(&mut self, profile: &Profile) -> Result<(), StoreError> {
        let account = self
            .data
            .accounts
            .iter_mut()
            .find(|a| a.active)
            .ok_or(StoreError::NoActiveAccount)?;
        account.username = profile.username.clone();
        account.display_name = profile.display_name.clone();
        account.locked = profile.locked;
        account.profile_picture_url = profile.avatar.clone();
        account.header_url = profile.header.clone();
        self.flush()
    }

    fn set_active_tabs(&mut self, tabs: Vec<TabKind>) -> Result<(), StoreError> {
        let account = self
            .data
            .accounts
            .iter_mut()
            .find(|a| a.active)
            .ok_or(StoreError::NoActiveAccount)?;
        account.tabs = tabs;
        self.flush()
    }

    fn logout_active(&mut self) -> Result<Option<Account>, StoreError> {
        let Some(pos) = self.data.accounts.iter().position(|a| a.active) else {
            return Err(StoreError::NoActiveAccount);
        };
        let removed = self.data.accounts.remove(pos);
        log::info!("Logged out {}", removed.full_name());

        let next = self
            .data
            .accounts
            .iter()
            .max_by_key(|a| a.last_active_seq)
            .map(|a| a.id);
        match next {
            Some(id) => {
                self.set_active(id)?;
                Ok(self.active())
            }
            None => {
                self.flush()?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ids: &[AccountId]) -> AccountStore {
        let mut store = AccountStore::in_memory();
        for &id in ids {
            store
                .add_account(Account::new(id, "mastodon.social", &format!("user{id}")))
                .unwrap();
        }
        store
    }

    fn active_count(store: &AccountStore) -> usize {
        store.all_ordered_by_active().iter().filter(|a| a.active).count()
    }

    #[test]
    fn last_added_is_active() {
        let store = store_with(&[1, 2, 3]);
        assert_eq!(store.active().map(|a| a.id), Some(3));
        assert_eq!(active_count(&store), 1);
    }

    #[test]
    fn ordering_is_active_then_recent() {
        let mut store = store_with(&[1, 2, 3]);
        store.set_active(1).unwrap();
        let ids: Vec<_> = store.all_ordered_by_active().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn set_active_unknown_id_fails() {
        let mut store = store_with(&[1]);
        assert!(matches!(store.set_active(9), Err(StoreError::UnknownAccount(9))));
        assert_eq!(store.active().map(|a| a.id), Some(1));
    }

    #[test]
    fn logout_picks_most_recent_remaining() {
        let mut store = store_with(&[1, 2, 3]);
        store.set_active(1).unwrap();
        store.set_active(2).unwrap();
        let next = store.logout_active().unwrap();
        assert_eq!(next.map(|a| a.id), Some(1));
        assert_eq!(store.len(), 2);
        assert_eq!(active_count(&store), 1);
    }

    #[test]
    fn logout_last_account_leaves_empty() {
        let mut store = store_with(&[1]);
        assert_eq!(store.logout_active().unwrap(), None);
        assert!(store.is_empty());
        assert!(store.active().is_none());
        assert!(matches!(store.logout_active(), Err(StoreError::NoActiveAccount)));
    }

    #[test]
    fn update_active_copies_profile() {
        let mut store = store_with(&[1]);
        store
            .update_active(&Profile {
                username: "user1".into(),
                display_name: "User One".into(),
                locked: true,
                avatar: "https://example.org/a.png".into(),
                header: "https://example.org/h.png".into(),
            })
            .unwrap();
        let active = store.active().unwrap();
        assert_eq!(active.display_name, "User One");
        assert!(active.locked);
        assert_eq!(active.header_url, "https://example.org/h.png");
    }

    #[test]
    fn active_tabs_replaced_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        {
            let mut store = AccountStore::open(&path).unwrap();
            store.add_account(Account::new(1, "a.example", "a")).unwrap();
            store
                .set_active_tabs(vec![TabKind::Home, TabKind::Direct])
                .unwrap();
        }
        let store = AccountStore::open(&path).unwrap();
        assert_eq!(store.active().unwrap().tabs, vec![TabKind::Home, TabKind::Direct]);

        let mut empty = AccountStore::in_memory();
        assert!(matches!(
            empty.set_active_tabs(Vec::new()),
            Err(StoreError::NoActiveAccount)
        ));
    }

    #[test]
    fn persisted_and_repaired_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        {
            let mut store = AccountStore::open(&path).unwrap();
            store.add_account(Account::new(1, "a.example", "a")).unwrap();
            store.add_account(Account::new(2, "b.example", "b")).unwrap();
        }
        let store = AccountStore::open(&path).unwrap();
        assert_eq!(store.active().map(|a| a.id), Some(2));

        // Two accounts flagged active on disk: the most recent one wins.
        let mut file: AccountsFile = store::load_json(&path).unwrap().unwrap();
        for a in &mut file.accounts {
            a.active = true;
        }
        store::save_json(&path, &file).unwrap();
        let store = AccountStore::open(&path).unwrap();
        assert_eq!(active_count(&store), 1);
        assert_eq!(store.active().map(|a| a.id), Some(2));
    }
}
