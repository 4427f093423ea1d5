use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{Collection, Draft, PointsRow, Records};

use super::{DataSyncController, Refresh};

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Issues create, update and delete calls, then re-fetches the affected
/// collection so readers never see the pre-mutation cache entry.
///
/// Mutations are sent once and never retried.
pub struct MutationGateway {
    api: ApiClient,
    sync: Arc<DataSyncController>,
}

impl MutationGateway {
    /// Uses the controller's API client.
    pub fn new(sync: Arc<DataSyncController>) -> Self {
        Self {
            api: sync.api().clone(),
            sync,
        }
    }

    /// Uses `api` for writes, e.g. a client carrying the admin's token.
    pub fn with_client(api: ApiClient, sync: Arc<DataSyncController>) -> Self {
        Self { api, sync }
    }

    pub fn sync(&self) -> &DataSyncController {
        &self.sync
    }

    pub async fn create<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        payload: &B,
    ) -> Result<Arc<Records>, MutationError> {
        self.api
            .create(collection, payload)
            .await
            .inspect_err(|e| warn!(%collection, error = %e, "Create failed"))?;
        info!(%collection, "Created record");
        Ok(self.reload(collection).await)
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        id: &str,
        payload: &B,
    ) -> Result<Arc<Records>, MutationError> {
        self.api
            .update(collection, id, payload)
            .await
            .inspect_err(|e| warn!(%collection, id, error = %e, "Update failed"))?;
        info!(%collection, id, "Updated record");
        Ok(self.reload(collection).await)
    }

    pub async fn delete(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Arc<Records>, MutationError> {
        self.api
            .delete(collection, id)
            .await
            .inspect_err(|e| warn!(%collection, id, error = %e, "Delete failed"))?;
        info!(%collection, id, "Deleted record");
        Ok(self.reload(collection).await)
    }

    /// Create `draft` in its collection after checking required fields.
    pub async fn create_record<D: Draft>(&self, draft: &D) -> Result<Arc<Records>, MutationError> {
        if let Some(field) = draft.missing_field() {
            return Err(MutationError::MissingField(field));
        }
        self.create(D::COLLECTION, draft).await
    }

    /// Update the row when it already exists on the server, create it otherwise.
    pub async fn save_points(&self, row: &PointsRow) -> Result<Arc<Records>, MutationError> {
        if let Some(field) = row.missing_field() {
            return Err(MutationError::MissingField(field));
        }
        match row.id.as_deref().filter(|_| row.is_existing()) {
            Some(id) => self.update(Collection::Points, id, row).await,
            None => {
                let new_row = PointsRow {
                    id: None,
                    ..row.clone()
                };
                self.create(Collection::Points, &new_row).await
            }
        }
    }

    async fn reload(&self, collection: Collection) -> Arc<Records> {
        self.sync.invalidate(collection);
        self.sync.load(collection, Refresh::Force).await
    }
}
