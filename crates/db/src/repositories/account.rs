//! Chart of accounts repository.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use tracing::{error, info};

use bursar_core::accounts::{Account, AccountError, NewAccount, NormalBalance, fold_balance};
use bursar_shared::types::AccountId;

use super::violates_unique;
use crate::entities::{
    accounts, journal_entries, journal_entry_lines, sea_orm_active_enums::JournalEntryStatus,
};

const CODE_CONSTRAINT: &str = "accounts_code_key";

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account. The normal balance defaults from the account type.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Code or name is blank
    /// - The code is already taken
    /// - The parent account does not exist
    pub async fn create_account(&self, input: NewAccount) -> Result<Account, AccountError> {
        input.validate()?;

        if let Some(parent_id) = input.parent_id {
            let parent = accounts::Entity::find_by_id(parent_id.into_inner())
                .one(&self.db)
                .await
                .map_err(|e| AccountError::Database(e.to_string()))?;
            if parent.is_none() {
                return Err(AccountError::ParentNotFound(parent_id));
            }
        }

        let now = Utc::now().into();
        let code = input.code.trim().to_string();
        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            code: Set(code.clone()),
            name: Set(input.name.trim().to_string()),
            account_type: Set(input.account_type.into()),
            normal_balance: Set(input.resolved_normal_balance().into()),
            parent_id: Set(input.parent_id.map(AccountId::into_inner)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await.map_err(|e| {
            if violates_unique(&e, CODE_CONSTRAINT) {
                AccountError::DuplicateCode(code.clone())
            } else {
                AccountError::Database(e.to_string())
            }
        })?;

        info!(account_code = %inserted.code, account_id = %inserted.id, "account created");
        Ok(to_account(inserted))
    }

    /// Lists accounts ordered by code. Inactive accounts are skipped unless
    /// `include_inactive` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<Account>, AccountError> {
        let mut query = accounts::Entity::find();
        if !include_inactive {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }

        let rows = query
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to list accounts");
                AccountError::Database(e.to_string())
            })?;

        Ok(rows.into_iter().map(to_account).collect())
    }

    /// Gets an account by its business code.
    ///
    /// # Errors
    ///
    /// Returns `CodeNotFound` if no account has this code.
    pub async fn get_by_code(&self, code: &str) -> Result<Account, AccountError> {
        accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(|e| {
                error!(account_code = code, error = %e, "account lookup failed");
                AccountError::Database(e.to_string())
            })?
            .map(to_account)
            .ok_or_else(|| AccountError::CodeNotFound(code.to_string()))
    }

    /// Gets an account by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Account, AccountError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| {
                error!(account_id = %id, error = %e, "account lookup failed");
                AccountError::Database(e.to_string())
            })?
            .map(to_account)
            .ok_or(AccountError::NotFound(id))
    }

    /// Direct children of an account, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_children(&self, parent: AccountId) -> Result<Vec<Account>, AccountError> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::ParentId.eq(parent.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(to_account).collect())
    }

    /// Signed balance over posted lines, optionally up to `as_of` inclusive.
    ///
    /// Unknown accounts have a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_balance(
        &self,
        id: AccountId,
        as_of: Option<NaiveDate>,
    ) -> Result<Decimal, AccountError> {
        let Some(account) = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| {
                error!(account_id = %id, error = %e, "account lookup failed");
                AccountError::Database(e.to_string())
            })?
        else {
            return Ok(Decimal::ZERO);
        };

        let mut query = journal_entry_lines::Entity::find()
            .join(
                JoinType::InnerJoin,
                journal_entry_lines::Relation::JournalEntries.def(),
            )
            .filter(journal_entry_lines::Column::AccountId.eq(account.id))
            .filter(journal_entries::Column::Status.eq(JournalEntryStatus::Posted));
        if let Some(as_of) = as_of {
            query = query.filter(journal_entries::Column::EntryDate.lte(as_of));
        }

        let lines: Vec<(Decimal, Decimal)> = query
            .select_only()
            .column(journal_entry_lines::Column::Debit)
            .column(journal_entry_lines::Column::Credit)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| {
                error!(account_id = %id, ?as_of, error = %e, "balance computation failed");
                AccountError::Database(e.to_string())
            })?;

        Ok(fold_balance(account.normal_balance.into(), lines))
    }

    /// Soft-deactivates an account. Referenced accounts are never deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn deactivate_account(&self, id: AccountId) -> Result<Account, AccountError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .ok_or(AccountError::NotFound(id))?;

        let mut active: accounts::ActiveModel = model.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        info!(account_code = %updated.code, "account deactivated");
        Ok(to_account(updated))
    }

    /// Changes the normal balance side of an account with no journal lines.
    ///
    /// # Errors
    ///
    /// Returns `NormalBalanceLocked` once any line references the account.
    pub async fn change_normal_balance(
        &self,
        id: AccountId,
        normal_balance: NormalBalance,
    ) -> Result<Account, AccountError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .ok_or(AccountError::NotFound(id))?;

        let line_count = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::AccountId.eq(model.id))
            .count(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;
        if line_count > 0 {
            return Err(AccountError::NormalBalanceLocked {
                account_id: id,
                line_count,
            });
        }

        let mut active: accounts::ActiveModel = model.into();
        active.normal_balance = Set(normal_balance.into());
        active.updated_at = Set(Utc::now().into());
        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        Ok(to_account(updated))
    }
}

pub(crate) fn to_account(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        account_type: model.account_type.into(),
        normal_balance: model.normal_balance.into(),
        parent_id: model.parent_id.map(AccountId::from_uuid),
        is_active: model.is_active,
    }
}
