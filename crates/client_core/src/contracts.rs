//! Contract service bindings: listing, CRUD, and multipart upload.
//!
//! Stateless by design; the contracts view refetches after every
//! mutation, so nothing is cached here. The executor's base URL
//! already carries the service prefix (`.../api/contracts`).

use reqwest::{
    multipart::{Form, Part},
    Method,
};
use serde_json::Value;
use tracing::warn;

use shared::{
    domain::{ContractPatch, ContractRecord},
    envelope::{self, Page},
    error::ApiError,
};

use crate::executor::{Payload, RequestExecutor};

/// A file staged for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl UploadFile {
    fn into_part(self) -> Result<Part, ApiError> {
        let mut part = Part::bytes(self.bytes).file_name(self.filename);
        if let Some(mime) = self.mime_type {
            part = part
                .mime_str(&mime)
                .map_err(|err| ApiError::Transport(format!("invalid mime type: {err}")))?;
        }
        Ok(part)
    }
}

pub struct ContractService {
    executor: RequestExecutor,
}

impl ContractService {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Single-file upload. The category travels under both `category`
    /// and `contractType`; the backend's binding name is unconfirmed.
    pub async fn upload_single(
        &self,
        token: Option<&str>,
        file: UploadFile,
        category: &str,
    ) -> Result<ContractRecord, ApiError> {
        let form = Form::new()
            .part("file", file.into_part()?)
            .text("category", category.to_string())
            .text("contractType", category.to_string());

        let body = self
            .executor
            .execute(
                Method::POST,
                "/upload/single",
                &[],
                Payload::Multipart(form),
                token,
            )
            .await?
            .into_json()?;
        envelope::expect_success(&body, "upload failed")?;
        envelope::normalize_item(body)
    }

    /// Batch upload; a distinct endpoint, not a loop over
    /// [`ContractService::upload_single`]. Categories pair with files
    /// positionally and travel under both accepted field names.
    pub async fn upload_batch(
        &self,
        token: Option<&str>,
        files: Vec<UploadFile>,
        categories: &[String],
    ) -> Result<Vec<ContractRecord>, ApiError> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", file.into_part()?);
        }
        for category in categories {
            form = form
                .text("categories", category.clone())
                .text("contractTypes", category.clone());
        }

        let body = self
            .executor
            .execute(
                Method::POST,
                "/upload/batch",
                &[],
                Payload::Multipart(form),
                token,
            )
            .await?
            .into_json()?;
        envelope::expect_success(&body, "batch upload failed")?;
        envelope::normalize_list(body)
    }

    /// Page numbering on the contract service starts at 0.
    pub async fn fetch_contracts(
        &self,
        token: Option<&str>,
        page: u32,
        size: u32,
        filters: &[(&str, String)],
    ) -> Result<Page<ContractRecord>, ApiError> {
        let mut query: Vec<(&str, String)> =
            vec![("page", page.to_string()), ("size", size.to_string())];
        query.extend(filters.iter().cloned());

        let body = self.executor.get("", &query, token).await?.into_json()?;
        envelope::expect_success(&body, "fetch contracts failed")?;
        envelope::normalize_page(body)
    }

    pub async fn get_contract_by_id(
        &self,
        token: Option<&str>,
        id: i64,
    ) -> Result<ContractRecord, ApiError> {
        let body = self
            .executor
            .get(&format!("/{id}"), &[], token)
            .await?
            .into_json()?;
        envelope::expect_success(&body, "get contract failed")?;
        envelope::normalize_item(body)
    }

    pub async fn update_contract(
        &self,
        token: Option<&str>,
        id: i64,
        patch: &ContractPatch,
    ) -> Result<ContractRecord, ApiError> {
        let body = self
            .executor
            .send_json(
                Method::PUT,
                &format!("/{id}"),
                serde_json::to_value(patch).map_err(|err| ApiError::Decode(err.to_string()))?,
                token,
            )
            .await?
            .into_json()?;
        envelope::expect_success(&body, "update contract failed")?;
        envelope::normalize_item(body)
    }

    pub async fn delete_contract(&self, token: Option<&str>, id: i64) -> Result<(), ApiError> {
        let body = self
            .executor
            .execute(
                Method::DELETE,
                &format!("/{id}"),
                &[],
                Payload::Empty,
                token,
            )
            .await?
            .into_json()?;
        envelope::expect_success(&body, "delete failed")
    }

    /// Best-effort supplementary text for display. Any failure yields
    /// an empty string; this call never raises.
    pub async fn get_contract_content(&self, token: Option<&str>, contract_id: i64) -> String {
        match self.content_inner(token, contract_id).await {
            Ok(content) => content,
            Err(err) => {
                warn!(contract_id, "contract content unavailable: {err}");
                String::new()
            }
        }
    }

    async fn content_inner(
        &self,
        token: Option<&str>,
        contract_id: i64,
    ) -> Result<String, ApiError> {
        let body = self
            .executor
            .get(&format!("/content/{contract_id}"), &[], token)
            .await?
            .into_json()?;
        envelope::expect_success(&body, "content fetch failed")?;

        Ok(match envelope::unwrap_data(body) {
            Value::String(content) => content,
            Value::Object(map) => map
                .get("plainTextContent")
                .or_else(|| map.get("content"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        })
    }
}

#[cfg(test)]
#[path = "tests/contract_tests.rs"]
mod tests;
