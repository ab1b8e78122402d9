//! Provider repository for database operations.
//!
//! SeaORM-backed implementation of [`ProviderStore`]. Lost updates are
//! prevented with an optimistic version column: every save is a filtered
//! update that only applies while the stored version still matches the one
//! the caller loaded.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, RuntimeErr, Set,
};

use super::{ProviderStore, StoreError, rotation_due};
use crate::models::provider::{self, Entity as Provider};

/// Repository for provider database operations.
#[derive(Debug, Clone)]
pub struct ProviderRepository {
    db: Arc<DatabaseConnection>,
}

impl ProviderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.into())
}

fn is_unique_violation(error: &DbErr) -> bool {
    let (DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))) = error
    else {
        return false;
    };
    sqlx_err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Active model with every column marked for writing.
fn write_all(record: provider::Model) -> provider::ActiveModel {
    provider::ActiveModel {
        code: Set(record.code),
        name: Set(record.name),
        provider_type: Set(record.provider_type),
        is_active: Set(record.is_active),
        api_config: Set(record.api_config),
        fees: Set(record.fees),
        limits: Set(record.limits),
        availability: Set(record.availability),
        status_log: Set(record.status_log),
        key_rotation: Set(record.key_rotation),
        account_details: Set(record.account_details),
        contact_info: Set(record.contact_info),
        metadata: Set(record.metadata),
        version: Set(record.version),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
    }
}

#[async_trait]
impl ProviderStore for ProviderRepository {
    async fn load(&self, code: &str) -> Result<provider::Model, StoreError> {
        let found = Provider::find_by_id(code.to_string())
            .one(self.db.as_ref())
            .await
            .map_err(backend)?;
        found.ok_or_else(|| StoreError::NotFound {
            code: code.to_string(),
        })
    }

    async fn insert(&self, record: provider::Model) -> Result<provider::Model, StoreError> {
        let code = record.code.clone();
        Provider::insert(write_all(record.clone()))
            .exec(self.db.as_ref())
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::Duplicate { code: code.clone() }
                } else {
                    backend(err)
                }
            })?;
        Ok(record)
    }

    async fn save(&self, record: provider::Model) -> Result<provider::Model, StoreError> {
        let expected_version = record.version;
        let code = record.code.clone();

        let mut updated = record;
        updated.version = expected_version + 1;
        updated.updated_at = Utc::now().into();

        let result = Provider::update_many()
            .set(write_all(updated.clone()))
            .filter(provider::Column::Code.eq(code.clone()))
            .filter(provider::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            // Either the row is gone or another writer got there first.
            let exists = Provider::find_by_id(code.clone())
                .one(self.db.as_ref())
                .await
                .map_err(backend)?;
            return Err(match exists {
                Some(_) => StoreError::Conflict { code },
                None => StoreError::NotFound { code },
            });
        }

        Ok(updated)
    }

    async fn list_all(&self) -> Result<Vec<provider::Model>, StoreError> {
        Provider::find()
            .order_by_asc(provider::Column::Code)
            .all(self.db.as_ref())
            .await
            .map_err(backend)
    }

    async fn list_due_for_rotation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<provider::Model>, StoreError> {
        // The rotation schedule lives inside the key_rotation document, so
        // the due filter runs over the fetched rows. The provider catalog is
        // a handful of channels, not a high-cardinality table.
        let providers = Provider::find()
            .filter(provider::Column::IsActive.eq(true))
            .order_by_asc(provider::Column::Code)
            .all(self.db.as_ref())
            .await
            .map_err(backend)?;
        Ok(providers
            .into_iter()
            .filter(|p| rotation_due(p, now))
            .collect())
    }
}
