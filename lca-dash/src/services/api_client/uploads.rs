//! CSV upload, job status and template endpoints

use std::path::Path;

use reqwest::multipart::{Form, Part};

use super::{error_message, ApiClient, AuthPolicy};
use crate::error::ClientError;
use crate::models::upload_job::RawUploadResponse;
use crate::models::{JobStatusResponse, UploadOutcome};

const CSV_MIME: &str = "text/csv";

impl ApiClient {
    /// `POST /products/upload-csv` as multipart field `file`
    ///
    /// Validation rejections usually arrive with a 4xx status and an
    /// `errors` body; they decode to `UploadOutcome::Rejected` rather than
    /// an error.
    pub async fn upload_csv(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadOutcome, ClientError> {
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(CSV_MIME)
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request = self
            .http
            .post(self.url("/products/upload-csv"))
            .multipart(form);
        let response = self.dispatch(request, AuthPolicy::ExpireOn401).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let outcome = serde_json::from_str::<RawUploadResponse>(&body)
            .ok()
            .and_then(RawUploadResponse::into_outcome);

        match outcome {
            Some(outcome) => {
                tracing::debug!(file = %file_name, status = %status, "Upload response decoded");
                Ok(outcome)
            }
            None if status.is_success() => Err(ClientError::Parse(format!(
                "unrecognized upload response: {}",
                body
            ))),
            None => Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| "upload failed".to_string()),
            }),
        }
    }

    /// `GET /products/upload-status/{job_id}`
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError> {
        let request = self
            .http
            .get(self.url(&format!("/products/upload-status/{}", job_id)));
        self.send_json(request, AuthPolicy::ExpireOn401).await
    }

    /// `GET /products/csv-template`, written to `dest`; returns bytes written
    pub async fn download_template(&self, dest: &Path) -> Result<u64, ClientError> {
        let request = self.http.get(self.url("/products/csv-template"));
        let response = self.send(request, AuthPolicy::ExpireOn401).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        tokio::fs::write(dest, &bytes).await?;
        tracing::info!(path = %dest.display(), bytes = bytes.len(), "CSV template saved");
        Ok(bytes.len() as u64)
    }
}
