use common_auth::{ApiRequest, FilePart, Gateway};
use tracing::debug;

use crate::error::{decode, ClientError, ClientResult};
use crate::models::{Document, DocumentUpdate, IngestAccepted, IngestionJob};

#[derive(Clone)]
pub struct DocumentsApi {
    gateway: Gateway,
}

impl DocumentsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> ClientResult<Vec<Document>> {
        decode(self.gateway.send(ApiRequest::get("/documents")).await?)
    }

    /// Upload files for asynchronous ingestion. The returned job id can be
    /// passed to [`DocumentsApi::status`].
    pub async fn ingest(&self, files: Vec<FilePart>) -> ClientResult<IngestAccepted> {
        if files.is_empty() {
            return Err(ClientError::Invalid("at least one file is required".into()));
        }
        debug!(files = files.len(), "uploading documents");
        let request = ApiRequest::post("/documents/ingest").multipart(files);
        decode(self.gateway.send(request).await?)
    }

    pub async fn status(&self, job_id: &str) -> ClientResult<IngestionJob> {
        let request = ApiRequest::get(format!("/documents/status/{job_id}"));
        decode(self.gateway.send(request).await?)
    }

    pub async fn update(&self, id: &str, update: &DocumentUpdate) -> ClientResult<Document> {
        update.validate().map_err(ClientError::Invalid)?;
        let request = ApiRequest::patch(format!("/documents/{id}")).json(update)?;
        decode(self.gateway.send(request).await?)
    }
}
