//! Test client helpers.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde::Serialize;
use tower::ServiceExt;

/// Helper para tests de integracion HTTP.
pub struct TestClient {
    app: Router,
    user: Option<String>,
}

impl TestClient {
    /// Crea un nuevo test client con el router proporcionado.
    pub fn new(app: Router) -> Self {
        Self { app, user: None }
    }

    /// Cliente que envia `X-User-Id` en cada request.
    pub fn as_user(&self, user_id: &str) -> Self {
        Self {
            app: self.app.clone(),
            user: Some(user_id.to_string()),
        }
    }

    /// Hace un GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri, None, Vec::new()).await
    }

    /// Hace un GET request con headers personalizados.
    pub async fn get_with_headers(&self, uri: &str, headers: Vec<(&str, &str)>) -> TestResponse {
        self.send("GET", uri, None, headers).await
    }

    /// POST con body JSON.
    pub async fn post<T: Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        self.send("POST", uri, Some(to_json(body)), Vec::new()).await
    }

    /// POST sin body.
    pub async fn post_empty(&self, uri: &str) -> TestResponse {
        self.send("POST", uri, None, Vec::new()).await
    }

    /// PUT con body JSON.
    pub async fn put<T: Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        self.send("PUT", uri, Some(to_json(body)), Vec::new()).await
    }

    /// DELETE sin body.
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send("DELETE", uri, None, Vec::new()).await
    }

    /// Envia un body crudo (para probar JSON invalido).
    pub async fn post_raw(&self, uri: &str, body: &str) -> TestResponse {
        self.send("POST", uri, Some(body.to_string()), Vec::new())
            .await
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<String>,
        headers: Vec<(&str, &str)>,
    ) -> TestResponse {
        let mut builder = Request::builder().uri(uri).method(method);

        if let Some(user) = &self.user {
            builder = builder.header("x-user-id", user.as_str());
        }
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json)),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        TestResponse::from_response(response).await
    }
}

fn to_json<T: Serialize>(body: &T) -> String {
    serde_json::to_string(body).expect("Failed to serialize body")
}

/// Wrapper sobre Response con helpers para assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    async fn from_response(response: Response<Body>) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes()
            .to_vec();

        Self {
            status,
            headers,
            body,
        }
    }

    /// Retorna el body como string.
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Body is not valid UTF-8")
    }

    /// Parsea el body como JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON")
    }

    /// Retorna un header especifico.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Verifica que el status sea el esperado.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Verifica que un header exista.
    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(
            self.headers.contains_key(name),
            "Expected header '{}' to exist",
            name
        );
        self
    }

    /// Verifica que un header tenga un valor especifico.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let value = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));

        assert_eq!(
            value, expected,
            "Expected header '{}' to be '{}' but got '{}'",
            name, expected, value
        );
        self
    }
}

/// Crea un TestClient con el router por defecto.
pub fn client() -> TestClient {
    TestClient::new(review_server::create_router())
}
