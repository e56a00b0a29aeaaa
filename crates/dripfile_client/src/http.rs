use std::time::Duration;

use async_trait::async_trait;
use dripfile_contract::{
    decode_collection, decode_created, decode_error, decode_record, CreateItinerary,
    CreateLocation, CreateTransfer, Entity, Itinerary, Location, Resource, Transfer,
};
use reqwest::{Method, Response, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::ResourceApi;
use crate::error::ApiError;

const API_SEGMENTS: [&str; 2] = ["api", "v1"];

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpResourceClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            ApiError::network(format!("invalid base url {}: {err}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::network(format!(
                "base url {} cannot carry a path",
                config.base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::network(format!("failed to build http client: {err}")))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list<T: Entity>(&self) -> Result<Vec<T>, ApiError> {
        let url = self.url(T::RESOURCE, None);
        let response = self.send(Method::GET, url, None::<&()>).await?;
        let body = read_success(response).await?;
        decode_collection(&body).map_err(|err| decode_failure(T::RESOURCE, err))
    }

    pub async fn read<T: Entity>(&self, id: &str) -> Result<T, ApiError> {
        let url = self.url(T::RESOURCE, Some(id));
        let response = self.send(Method::GET, url, None::<&()>).await?;
        let body = read_success(response).await?;
        decode_record(&body).map_err(|err| decode_failure(T::RESOURCE, err))
    }

    pub async fn create<T, P>(&self, payload: &P) -> Result<T, ApiError>
    where
        T: Entity,
        P: Serialize + Sync,
    {
        let url = self.url(T::RESOURCE, None);
        let response = self.send(Method::POST, url, Some(payload)).await?;
        let body = read_success_or_envelope(response).await?;
        decode_created(&body).map_err(|err| decode_failure(T::RESOURCE, err))
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        let url = self.url(resource, Some(id));
        let response = self.send(Method::DELETE, url, None::<&()>).await?;
        read_success_or_envelope(response).await.map(|_| ())
    }

    fn url(&self, resource: Resource, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(API_SEGMENTS).push(resource.name());
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    async fn send<P: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&P>,
    ) -> Result<Response, ApiError> {
        debug!(method = %method, url = %url, "issuing request");
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|err| {
            warn!(method = %method, url = %url, error = %err, "request failed");
            ApiError::network(err.to_string())
        })
    }
}

async fn read_success(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        warn!(status = %status, url = %response.url(), "unexpected response status");
        return Err(ApiError::network(format!("unexpected status {status}")));
    }
    read_body(response).await
}

async fn read_success_or_envelope(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let url = response.url().clone();
    let body = read_body(response).await?;
    if status.is_success() {
        return Ok(body);
    }

    match decode_error(&body) {
        Ok(envelope) => {
            debug!(
                status = %status,
                url = %url,
                error = %envelope.error,
                "server rejected request"
            );
            Err(ApiError::Application(envelope.error))
        }
        Err(err) => {
            warn!(status = %status, url = %url, error = %err, "unrecognised error body");
            Err(ApiError::network(format!("status {status} without error envelope")))
        }
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>, ApiError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|err| {
            warn!(error = %err, "failed to read response body");
            ApiError::network(err.to_string())
        })
}

fn decode_failure(resource: Resource, err: dripfile_contract::CodecError) -> ApiError {
    warn!(resource = %resource, error = %err, "failed to decode response");
    ApiError::network(err.to_string())
}

#[async_trait]
impl ResourceApi for HttpResourceClient {
    async fn list_locations(&self) -> Result<Vec<Location>, ApiError> {
        self.list().await
    }

    async fn read_location(&self, id: &str) -> Result<Location, ApiError> {
        self.read(id).await
    }

    async fn create_location(&self, request: CreateLocation) -> Result<Location, ApiError> {
        self.create(&request).await
    }

    async fn delete_location(&self, id: &str) -> Result<(), ApiError> {
        self.delete(Resource::Location, id).await
    }

    async fn list_itineraries(&self) -> Result<Vec<Itinerary>, ApiError> {
        self.list().await
    }

    async fn read_itinerary(&self, id: &str) -> Result<Itinerary, ApiError> {
        self.read(id).await
    }

    async fn create_itinerary(&self, request: CreateItinerary) -> Result<Itinerary, ApiError> {
        self.create(&request).await
    }

    async fn delete_itinerary(&self, id: &str) -> Result<(), ApiError> {
        self.delete(Resource::Itinerary, id).await
    }

    async fn list_transfers(&self) -> Result<Vec<Transfer>, ApiError> {
        self.list().await
    }

    async fn read_transfer(&self, id: &str) -> Result<Transfer, ApiError> {
        self.read(id).await
    }

    async fn create_transfer(&self, request: CreateTransfer) -> Result<Transfer, ApiError> {
        self.create(&request).await
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::{
        extract::Path,
        http::{header::USER_AGENT, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use dripfile_contract::{CreateItinerary, CreateLocation, LocationKind};
    use serde_json::{json, Value};

    use super::{HttpClientConfig, HttpResourceClient};
    use crate::api::ResourceApi;
    use crate::error::{ApiError, NETWORK_FAILURE_MESSAGE};

    fn location(id: &str) -> Value {
        json!({
            "id": id,
            "kind": "memory",
            "createdAt": "2024-03-01T12:00:00Z",
            "updatedAt": "2024-03-01T12:00:00Z"
        })
    }

    async fn list_locations() -> impl IntoResponse {
        Json(json!({ "locations": [location("loc_1"), location("loc_2")] }))
    }

    async fn read_location(Path(id): Path<String>) -> impl IntoResponse {
        if id == "loc_1" {
            (StatusCode::OK, Json(json!({ "location": location("loc_1") })))
        } else {
            (StatusCode::NOT_FOUND, Json(json!({ "error": "location not found" })))
        }
    }

    async fn create_location(Json(payload): Json<Value>) -> impl IntoResponse {
        match payload.get("kind").and_then(Value::as_str) {
            Some("memory") if payload.get("capacity") == Some(&json!("10")) => {
                (StatusCode::CREATED, Json(json!({ "location": location("loc_1") })))
            }
            Some("s3") => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "bucket name invalid" })),
            ),
            _ => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": { "kind": "must be one of: memory, s3" } })),
            ),
        }
    }

    async fn create_itinerary() -> impl IntoResponse {
        (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
    }

    // answers only clients that identify themselves
    async fn list_itineraries(headers: HeaderMap) -> impl IntoResponse {
        match headers.get(USER_AGENT).and_then(|value| value.to_str().ok()) {
            Some("dripfile-console/test") => {
                (StatusCode::OK, Json(json!({ "itineraries": [] })))
            }
            _ => (StatusCode::FORBIDDEN, Json(json!({ "error": "unknown client" }))),
        }
    }

    async fn read_transfer() -> impl IntoResponse {
        tokio::time::sleep(Duration::from_millis(500)).await;
        StatusCode::NOT_FOUND
    }

    async fn list_transfers() -> impl IntoResponse {
        (StatusCode::OK, "definitely not json")
    }

    async fn delete_location(Path(id): Path<String>) -> impl IntoResponse {
        if id == "loc_1" {
            StatusCode::NO_CONTENT.into_response()
        } else {
            (StatusCode::NOT_FOUND, Json(json!({ "error": "location not found" }))).into_response()
        }
    }

    async fn spawn_stub() -> SocketAddr {
        let app = Router::new()
            .route("/api/v1/location", get(list_locations).post(create_location))
            .route("/api/v1/location/{id}", get(read_location).delete(delete_location))
            .route("/api/v1/itinerary", get(list_itineraries).post(create_itinerary))
            .route("/api/v1/transfer", get(list_transfers))
            .route("/api/v1/transfer/{id}", get(read_transfer));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });
        addr
    }

    fn client(addr: SocketAddr) -> HttpResourceClient {
        HttpResourceClient::new(&HttpClientConfig {
            base_url: format!("http://{addr}/"),
            timeout: None,
            user_agent: None,
        })
        .expect("client")
    }

    #[tokio::test]
    async fn configured_user_agent_and_timeout_apply_to_requests() {
        let addr = spawn_stub().await;
        let configured = HttpResourceClient::new(&HttpClientConfig {
            base_url: format!("http://{addr}/"),
            timeout: Some(Duration::from_millis(100)),
            user_agent: Some("dripfile-console/test".to_string()),
        })
        .expect("client");

        assert!(configured.list_itineraries().await.expect("list").is_empty());
        assert!(client(addr).list_itineraries().await.unwrap_err().is_network());

        let err = configured.read_transfer("tr_1").await.unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn urls_use_singular_collection_paths() {
        let client = HttpResourceClient::new(&HttpClientConfig {
            base_url: "http://dripfile.local/app/".to_string(),
            timeout: None,
            user_agent: None,
        })
        .expect("client");

        let url = client.url(dripfile_contract::Resource::Itinerary, Some("it 1"));
        assert_eq!(url.as_str(), "http://dripfile.local/app/api/v1/itinerary/it%201");
    }

    #[tokio::test]
    async fn list_and_read_decode_envelopes() {
        let client = client(spawn_stub().await);

        let locations = client.list_locations().await.expect("list");
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[1].id, "loc_2");

        let location = client.read_location("loc_1").await.expect("read");
        assert_eq!(location.kind, LocationKind::Memory);
    }

    #[tokio::test]
    async fn failed_reads_are_network_errors_even_with_an_envelope() {
        let client = client(spawn_stub().await);

        let err = client.read_location("missing").await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.to_string(), NETWORK_FAILURE_MESSAGE);

        let err = client.list_transfers().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn create_memory_location_returns_created_record() {
        let client = client(spawn_stub().await);

        let created = client
            .create_location(CreateLocation::Memory {
                capacity: "10".to_string(),
            })
            .await
            .expect("create");
        assert_eq!(created.id, "loc_1");
    }

    #[tokio::test]
    async fn create_surfaces_error_envelope_message() {
        let client = client(spawn_stub().await);

        let err = client
            .create_location(CreateLocation::S3 {
                endpoint: "localhost:9000".to_string(),
                bucket: "Bad Bucket".to_string(),
                access_key_id: "minio".to_string(),
                secret_access_key: "minio123".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::message("bucket name invalid"));
        assert_eq!(err.to_string(), "bucket name invalid");
    }

    #[tokio::test]
    async fn create_without_envelope_falls_back_to_generic_message() {
        let client = client(spawn_stub().await);

        let err = client
            .create_itinerary(CreateItinerary {
                from_location_id: "a".to_string(),
                to_location_id: "b".to_string(),
                pattern: "*".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.to_string(), NETWORK_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn delete_maps_status_and_envelope() {
        let client = client(spawn_stub().await);

        client.delete_location("loc_1").await.expect("delete");
        let err = client.delete_location("loc_9").await.unwrap_err();
        assert_eq!(err.to_string(), "location not found");
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let err = client(addr).list_locations().await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.to_string(), NETWORK_FAILURE_MESSAGE);
    }
}
