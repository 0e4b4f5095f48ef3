use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::traits::ChatBackend;
use super::types::*;
use crate::models::{Identity, Message, SearchHit, SessionBuckets};

/// `ChatBackend` over the service's REST endpoints.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `sessions/{id}` with the id as one escaped path segment, so it can
    /// never reach another route or add a query.
    fn session_endpoint(&self, session_id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.endpoint("sessions"))
            .map_err(|e| ApiError::RequestFailed(format!("Invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::RequestFailed("API URL cannot have a path".to_string()))?
            .push(session_id);
        Ok(url)
    }

    fn build_auth_header(token: &str) -> Option<String> {
        if token.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", token))
        }
    }

    fn authorized(req: RequestBuilder, token: &str) -> RequestBuilder {
        match Self::build_auth_header(token) {
            Some(auth) => req.header("Authorization", auth),
            None => req,
        }
    }

    fn parse_error_message(status: StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(message) = parsed.message.or(parsed.detail) {
                return format!("HTTP {}: {}", status.as_u16(), message);
            }
        }
        format!("HTTP {}: Request failed", status.as_u16())
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let response = req
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Unauthorized(Self::parse_error_message(status, &body)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed(Self::parse_error_message(
                status, &body,
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn create_session(&self, identity: &Identity) -> Result<String, ApiError> {
        let req = self
            .client
            .post(self.endpoint("sessions"))
            .json(&CreateSessionBody {
                email: &identity.email,
            });
        let res: CreateSessionResponse =
            self.execute(Self::authorized(req, &identity.token)).await?;

        res.session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("No session_id in response".to_string()))
    }

    async fn list_sessions(&self, identity: &Identity) -> Result<SessionBuckets, ApiError> {
        let req = self
            .client
            .get(self.endpoint("sessions"))
            .query(&[("email", identity.email.as_str())]);
        self.execute(Self::authorized(req, &identity.token)).await
    }

    async fn delete_session(
        &self,
        identity: &Identity,
        session_id: &str,
    ) -> Result<bool, ApiError> {
        let req = self
            .client
            .delete(self.session_endpoint(session_id)?)
            .json(&DeleteSessionBody {
                email: &identity.email,
                session_id,
            });
        let res: DeleteSessionResponse =
            self.execute(Self::authorized(req, &identity.token)).await?;
        Ok(res.success)
    }

    async fn fetch_messages(
        &self,
        identity: &Identity,
        session_id: &str,
    ) -> Result<Vec<Message>, ApiError> {
        let req = self
            .client
            .get(self.endpoint("chat"))
            .query(&[("session_id", session_id)]);
        let env: MessagesEnvelope = self.execute(Self::authorized(req, &identity.token)).await?;
        Ok(env.data)
    }

    async fn submit_query(
        &self,
        identity: &Identity,
        request: QueryRequest,
    ) -> Result<QueryResponse, ApiError> {
        let req = self.client.post(self.endpoint("chat")).json(&request);
        let env: QueryEnvelope = self.execute(Self::authorized(req, &identity.token)).await?;

        env.data
            .ok_or_else(|| ApiError::InvalidResponse("No data in chat response".to_string()))
    }

    async fn search(&self, identity: &Identity, query: &str) -> Result<Vec<SearchHit>, ApiError> {
        let req = self
            .client
            .get(self.endpoint("chat/search"))
            .query(&[("q", query), ("email", identity.email.as_str())]);
        let res: SearchResponse = self.execute(Self::authorized(req, &identity.token)).await?;
        Ok(res.results)
    }

    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        let req = self.client.get(self.endpoint("auth/profile"));
        self.execute(Self::authorized(req, token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let backend = HttpBackend::new("http://localhost:8000/api/", None).unwrap();
        assert_eq!(backend.endpoint("/sessions"), "http://localhost:8000/api/sessions");
        assert_eq!(
            backend.endpoint("chat/search"),
            "http://localhost:8000/api/chat/search"
        );
    }

    #[test]
    fn test_session_id_is_a_single_path_segment() {
        let backend = HttpBackend::new("http://localhost:8000/api/", None).unwrap();
        assert_eq!(
            backend.session_endpoint("abc-123").unwrap().as_str(),
            "http://localhost:8000/api/sessions/abc-123"
        );

        let url = backend.session_endpoint("a/b?x=1#frag").unwrap();
        assert_eq!(url.path(), "/api/sessions/a%2Fb%3Fx=1%23frag");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_parse_error_message() {
        let msg = HttpBackend::parse_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Session limit reached"}"#,
        );
        assert_eq!(msg, "HTTP 400: Session limit reached");

        let msg = HttpBackend::parse_error_message(StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#);
        assert_eq!(msg, "HTTP 404: Not found.");

        let msg = HttpBackend::parse_error_message(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(msg, "HTTP 502: Request failed");
    }

    #[test]
    fn test_auth_header_skipped_for_empty_token() {
        assert!(HttpBackend::build_auth_header("").is_none());
        assert_eq!(
            HttpBackend::build_auth_header("abc").as_deref(),
            Some("Bearer abc")
        );
    }
}
