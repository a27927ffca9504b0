use std::collections::BTreeMap;

use patch_api_client::multipart::normalize_upload;
use patch_api_client::{FilePart, RequestBuilder, RequestOptions, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

impl super::PlantDataClient {
    /// List plants visible to the current account.
    #[instrument(skip(self, options))]
    pub async fn get_plant_list(
        &self,
        page: Option<u32>,
        size: Option<u32>,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants")
            .query_opt("page", page)
            .query_opt("size", size);
        self.fetch(request, options).await
    }

    /// Create a plant.
    #[instrument(skip(self, body, options))]
    pub async fn create_plant<T: Serialize + ?Sized>(
        &self,
        body: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::post("/api/v3/plants").json(body)?;
        self.fetch(request, options).await
    }

    /// Get a plant by ID.
    #[instrument(skip(self, options))]
    pub async fn get_plant_details(
        &self,
        plant_id: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}").segment(plant_id);
        self.fetch(request, options).await
    }

    /// Get the plant blueprint for a day as text.
    ///
    /// The server may send the blueprint as a JSON string or as plain text;
    /// both come back as the bare text.
    #[instrument(skip(self, options))]
    pub async fn get_plant_blueprint(
        &self,
        plant_id: &str,
        date: &str,
        options: Option<&RequestOptions>,
    ) -> Result<String> {
        let request = RequestBuilder::get("/api/v3/plants/{}/blueprint")
            .segment(plant_id)
            .query("date", date)
            .options(options);
        let response = self.client.execute(request).await?;
        Ok(response.into_payload().into_text())
    }

    /// Upload files to a plant.
    ///
    /// The endpoint expects a `name` field and a `filename` file part. A
    /// single file under any other key is moved to `filename`, and a missing
    /// `name` is taken from the file's own filename.
    #[instrument(skip(self, fields, files, options))]
    pub async fn upload_plant_files(
        &self,
        plant_id: &str,
        fields: BTreeMap<String, String>,
        files: BTreeMap<String, FilePart>,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let (fields, files) = normalize_upload(fields, files)?;
        let encoded = self.client.encode_multipart(&fields, &files)?;
        debug!(bytes = encoded.body.len(), "Uploading plant files");

        let request = RequestBuilder::post("/api/v3/plants/{}/files")
            .segment(plant_id)
            .multipart(encoded);
        self.fetch(request, options).await
    }
}
