// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline template CRUD.

use super::{decode_json, Store, StoreError};
use drover_core::{now_iso, Pipeline, StepDefinition};
use sqlx::FromRow;

#[derive(FromRow)]
struct PipelineRow {
    pipeline_id: String,
    name: String,
    repo_url: Option<String>,
    steps_json: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PipelineRow {
    fn into_pipeline(self) -> Result<Pipeline, StoreError> {
        let steps: Vec<StepDefinition> =
            decode_json(self.steps_json, "steps_json", &self.pipeline_id)?.unwrap_or_default();
        Ok(Pipeline {
            pipeline_id: self.pipeline_id,
            name: self.name,
            repo_url: self.repo_url,
            steps,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PIPELINE: &str = "SELECT * FROM pipelines WHERE pipeline_id = ?";

impl Store {
    /// Insert a new pipeline definition and return it.
    pub async fn create_pipeline(
        &self,
        pipeline_id: &str,
        name: &str,
        repo_url: Option<&str>,
        steps: &[StepDefinition],
    ) -> Result<Pipeline, StoreError> {
        let steps_json = serde_json::to_string(steps)?;
        let ts = now_iso();
        let mut tx = self.writer().begin().await?;
        sqlx::query(
            "INSERT INTO pipelines (pipeline_id, name, repo_url, steps_json, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(pipeline_id)
        .bind(name)
        .bind(repo_url)
        .bind(&steps_json)
        .bind(&ts)
        .bind(&ts)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let row = sqlx::query_as::<_, PipelineRow>(SELECT_PIPELINE)
            .bind(pipeline_id)
            .fetch_one(self.writer())
            .await?;
        row.into_pipeline()
    }

    /// Fetch a pipeline definition by id.
    pub async fn get_pipeline(&self, pipeline_id: &str) -> Result<Option<Pipeline>, StoreError> {
        let row = sqlx::query_as::<_, PipelineRow>(SELECT_PIPELINE)
            .bind(pipeline_id)
            .fetch_optional(self.reader())
            .await?;
        row.map(PipelineRow::into_pipeline).transpose()
    }

    /// All pipeline definitions, newest first.
    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>, StoreError> {
        let rows = sqlx::query_as::<_, PipelineRow>(
            "SELECT * FROM pipelines ORDER BY created_at DESC",
        )
        .fetch_all(self.reader())
        .await?;
        rows.into_iter().map(PipelineRow::into_pipeline).collect()
    }

    /// Delete a pipeline definition. Returns true when a row was removed.
    pub async fn delete_pipeline(&self, pipeline_id: &str) -> Result<bool, StoreError> {
        let mut tx = self.writer().begin().await?;
        let affected = sqlx::query("DELETE FROM pipelines WHERE pipeline_id = ?")
            .bind(pipeline_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
#[path = "pipelines_tests.rs"]
mod tests;
