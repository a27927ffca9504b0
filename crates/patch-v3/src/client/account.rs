use patch_api_client::{RequestBuilder, RequestOptions, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::models::{AuthSession, AuthWithPassword};

impl super::PlantDataClient {
    /// Exchange credentials for a token.
    ///
    /// The client's stored token is left untouched; see [`login`](Self::login).
    #[instrument(skip(self, body, options))]
    pub async fn authenticate_user<T: Serialize + ?Sized>(
        &self,
        body: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::post("/api/v3/account/auth-with-password").json(body)?;
        self.fetch(request, options).await
    }

    /// Authenticate and store the returned token and account type on the client.
    ///
    /// An account containing `@` signs in as a manager, anything else as a viewer.
    #[instrument(skip(self, password, options))]
    pub async fn login(
        &self,
        account: &str,
        password: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let body = AuthWithPassword::for_account(account, password);
        let value = self.authenticate_user(&body, options).await?;

        let session: AuthSession = serde_json::from_value(value.clone())?;
        self.client.set_access_token(session.token.as_str());
        self.client
            .set_account_type(session.account_type().or(Some(body.account_type)));
        debug!(account_type = ?self.client.account_type(), "Stored session token");

        Ok(value)
    }

    /// Request a fresh token for the current session.
    #[instrument(skip(self, options))]
    pub async fn refresh_user_token(&self, options: Option<&RequestOptions>) -> Result<Value> {
        self.fetch(RequestBuilder::post("/api/v3/account/refresh-token"), options)
            .await
    }

    /// Refresh the token and store the new one on the client.
    #[instrument(skip(self, options))]
    pub async fn refresh_session(&self, options: Option<&RequestOptions>) -> Result<()> {
        let value = self.refresh_user_token(options).await?;
        let session: AuthSession = serde_json::from_value(value)?;
        self.client.set_access_token(session.token.clone());
        if let Some(account_type) = session.account_type() {
            self.client.set_account_type(Some(account_type));
        }
        Ok(())
    }

    /// Get the signed-in account.
    #[instrument(skip(self, options))]
    pub async fn get_account_info(&self, options: Option<&RequestOptions>) -> Result<Value> {
        self.fetch(RequestBuilder::get("/api/v3/account/"), options).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use super::super::PlantDataClient;
    use patch_api_client::{AccountType, ClientConfig, RequestOptions};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_stores_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v3/account/auth-with-password"))
            .and(body_json(serde_json::json!({
                "type": "manager",
                "password": "pw",
                "email": "m@example.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "fresh-token",
                "type": "manager",
                "name": "Manager"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v3/account/"))
            .and(header("Authorization", "Bearer fresh-token"))
            .and(header("Account-Type", "manager"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Manager",
                "type": "manager"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::builder().with_base_url(mock_server.uri()).build();
        let client = PlantDataClient::new(config).unwrap();

        let auth = client.login("m@example.com", "pw", None).await.unwrap();
        assert_eq!(auth["name"], "Manager");
        assert!(client.inner().has_access_token());
        assert_eq!(client.inner().account_type(), Some(AccountType::Manager));

        let account = client.get_account_info(None).await.unwrap();
        assert_eq!(account["type"], "manager");
    }

    #[tokio::test]
    async fn test_failed_login_keeps_client_state() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v3/account/auth-with-password"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&mock_server)
            .await;

        let config = ClientConfig::builder().with_base_url(mock_server.uri()).build();
        let client = PlantDataClient::new(config).unwrap();

        let err = client.login("viewer01", "wrong", None).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(!client.inner().has_access_token());
    }

    #[tokio::test]
    async fn test_refresh_session_replaces_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v3/account/refresh-token"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "rotated",
                "name": "Manager"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v3/account/"))
            .and(header("Authorization", "Bearer rotated"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client.refresh_session(None).await.unwrap();
        client.get_account_info(None).await.unwrap();
        assert_eq!(client.inner().account_type(), Some(AccountType::Manager));
    }

    #[tokio::test]
    async fn test_per_call_token_override() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/account/"))
            .and(header("Authorization", "Bearer other"))
            .and(header("Account-Type", "admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let options = RequestOptions::new()
            .access_token("other")
            .account_type(AccountType::Admin);
        client.get_account_info(Some(&options)).await.unwrap();
    }
}
