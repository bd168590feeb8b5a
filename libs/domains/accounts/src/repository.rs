use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AccountError, AccountResult};
use crate::models::{Account, AccountFilter, Role};

/// Repository trait for Account persistence
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create a new account
    async fn create(&self, account: Account) -> AccountResult<Account>;

    /// Get an account by ID
    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<Account>>;

    /// Get an account by email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> AccountResult<Option<Account>>;

    /// Get the account linked to a profile
    async fn get_by_profile_id(&self, profile_id: Uuid) -> AccountResult<Option<Account>>;

    /// List accounts with optional filters
    async fn list(&self, filter: AccountFilter) -> AccountResult<Vec<Account>>;

    /// List all admin-role accounts (the administrator notification audience)
    async fn list_admins(&self) -> AccountResult<Vec<Account>>;

    /// Update an existing account
    async fn update(&self, account: Account) -> AccountResult<Account>;

    /// Delete an account by ID
    async fn delete(&self, id: Uuid) -> AccountResult<bool>;

    /// Check if an email already exists
    async fn email_exists(&self, email: &str) -> AccountResult<bool>;
}

/// In-memory implementation of AccountRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: Account) -> AccountResult<Account> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.email_matches(&account.email)) {
            return Err(AccountError::DuplicateEmail(account.email));
        }

        if let Some(ref username) = account.username {
            if accounts
                .values()
                .any(|a| a.username.as_deref() == Some(username.as_str()))
            {
                return Err(AccountError::DuplicateUsername(username.clone()));
            }
        }

        accounts.insert(account.id, account.clone());

        tracing::info!(account_id = %account.id, email = %account.email, "Created account");
        Ok(account)
    }

    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email_matches(email)).cloned())
    }

    async fn get_by_profile_id(&self, profile_id: Uuid) -> AccountResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.profile_id == Some(profile_id))
            .cloned())
    }

    async fn list(&self, filter: AccountFilter) -> AccountResult<Vec<Account>> {
        let accounts = self.accounts.read().await;

        let mut result: Vec<Account> = accounts
            .values()
            .filter(|a| {
                if let Some(role) = filter.role {
                    if a.role != role {
                        return false;
                    }
                }
                if let Some(is_active) = filter.is_active {
                    if a.is_active != is_active {
                        return false;
                    }
                }
                if let Some(ref email) = filter.email {
                    if !a.email_matches(email) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(result)
    }

    async fn list_admins(&self) -> AccountResult<Vec<Account>> {
        self.list(AccountFilter {
            role: Some(Role::Admin),
            ..Default::default()
        })
        .await
    }

    async fn update(&self, account: Account) -> AccountResult<Account> {
        let mut accounts = self.accounts.write().await;

        if !accounts.contains_key(&account.id) {
            return Err(AccountError::NotFound(account.id));
        }

        let email_taken = accounts
            .values()
            .any(|a| a.id != account.id && a.email_matches(&account.email));

        if email_taken {
            return Err(AccountError::DuplicateEmail(account.email));
        }

        accounts.insert(account.id, account.clone());

        tracing::info!(account_id = %account.id, "Updated account");
        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> AccountResult<bool> {
        let mut accounts = self.accounts.write().await;

        if accounts.remove(&id).is_some() {
            tracing::info!(account_id = %id, "Deleted account");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn email_exists(&self, email: &str) -> AccountResult<bool> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().any(|a| a.email_matches(email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str, role: Role) -> Account {
        Account::new(email.to_string(), None, "hash".to_string(), role)
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let repo = InMemoryAccountRepository::new();

        let created = repo
            .create(account("pat@example.com", Role::User))
            .await
            .unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.unwrap().email, "pat@example.com");
    }

    #[tokio::test]
    async fn test_get_by_email_is_case_insensitive() {
        let repo = InMemoryAccountRepository::new();
        repo.create(account("Pat@Example.com", Role::User))
            .await
            .unwrap();

        let fetched = repo.get_by_email("pat@example.com").await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryAccountRepository::new();
        repo.create(account("pat@example.com", Role::User))
            .await
            .unwrap();

        let result = repo.create(account("PAT@example.com", Role::User)).await;
        assert!(matches!(result, Err(AccountError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_list_admins_only_returns_admins() {
        let repo = InMemoryAccountRepository::new();
        repo.create(account("admin1@example.com", Role::Admin))
            .await
            .unwrap();
        repo.create(account("user@example.com", Role::User))
            .await
            .unwrap();
        repo.create(account("admin2@example.com", Role::Admin))
            .await
            .unwrap();

        let admins = repo.list_admins().await.unwrap();
        assert_eq!(admins.len(), 2);
        assert!(admins.iter().all(|a| a.is_admin()));
    }

    #[tokio::test]
    async fn test_get_by_profile_id() {
        let repo = InMemoryAccountRepository::new();
        let profile_id = Uuid::now_v7();

        let mut linked = account("linked@example.com", Role::User);
        linked.profile_id = Some(profile_id);
        repo.create(linked).await.unwrap();
        repo.create(account("other@example.com", Role::User))
            .await
            .unwrap();

        let fetched = repo.get_by_profile_id(profile_id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "linked@example.com");
    }
}
