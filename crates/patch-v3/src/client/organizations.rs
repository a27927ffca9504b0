use patch_api_client::{RequestBuilder, RequestOptions, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

impl super::PlantDataClient {
    /// Create a member account in an organization.
    #[instrument(skip(self, body, options))]
    pub async fn create_organization_member<T: Serialize + ?Sized>(
        &self,
        organization_id: &str,
        body: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::post("/api/v3/organizations/{}/members")
            .segment(organization_id)
            .json(body)?;
        self.fetch(request, options).await
    }

    /// Grant an organization member access to a plant.
    #[instrument(skip(self, body, options))]
    pub async fn assign_plant_permission<T: Serialize + ?Sized>(
        &self,
        organization_id: &str,
        body: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::post("/api/v3/organizations/{}/permissions")
            .segment(organization_id)
            .json(body)?;
        self.fetch(request, options).await
    }
}
