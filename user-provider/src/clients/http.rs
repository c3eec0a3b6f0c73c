//! Client for the user-store REST API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::debug;
use user_store::{UserData, validate_id};
use user_store::rest::ApiError;

use super::UserService;
use crate::error::{ServiceError, StatusCode};

/// Map the code of a user-store error body onto the service status codes.
fn status_code(code: u16) -> StatusCode {
    match code {
        404 => StatusCode::NotFound,
        409 => StatusCode::AlreadyExists,
        502..=504 => StatusCode::Unavailable,
        _ => StatusCode::Unknown,
    }
}

/// Classify a failed response that carries no user-store error body.
///
/// Existence codes only come from the store itself; a bare 404 or 409 is a
/// routing problem (wrong endpoint or prefix), not an answer about the user.
fn bare_status_code(status: reqwest::StatusCode) -> StatusCode {
    match status_code(status.as_u16()) {
        StatusCode::NotFound | StatusCode::AlreadyExists => StatusCode::Unknown,
        code => code,
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    let code = if e.is_connect() || e.is_timeout() {
        StatusCode::Unavailable
    } else {
        StatusCode::Unknown
    };
    ServiceError::new(code, e.to_string())
}

async fn status_error(response: Response) -> ServiceError {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(body) => ServiceError::new(status_code(body.code), body.error),
        Err(_) => ServiceError::new(
            bare_status_code(status),
            format!("HTTP {} without a user-store error body", status),
        ),
    }
}

fn check_id(id: &str) -> Result<(), ServiceError> {
    validate_id(id).map_err(ServiceError::from)
}

/// Client for interacting with user-store over HTTP.
#[derive(Clone)]
pub struct HttpUserService {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpUserService {
    /// Build a client for `endpoint` (e.g. `http://[::1]:50051`).
    ///
    /// `token`, if present, is sent as a bearer token on every request.
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self, String> {
        let base_url =
            Url::parse(endpoint).map_err(|e| format!("invalid endpoint '{}': {}", endpoint, e))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("invalid endpoint '{}': not a base URL", endpoint));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("cannot build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// URL of the users collection, or of one user if `id` is given.
    fn users_url(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in new(): the base URL can carry path segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "v1", "users"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ServiceError> {
        let response = builder.send().await.map_err(transport_error)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    async fn send_for_user(&self, builder: RequestBuilder) -> Result<UserData, ServiceError> {
        self.send(builder)
            .await?
            .json::<UserData>()
            .await
            .map_err(transport_error)
    }
}

#[async_trait]
impl UserService for HttpUserService {
    async fn get_user(&self, id: &str) -> Result<UserData, ServiceError> {
        debug!("Getting user {} from user-store", id);
        check_id(id)?;
        let url = self.users_url(Some(id));
        self.send_for_user(self.request(Method::GET, url)).await
    }

    async fn create_user(&self, user: &UserData) -> Result<UserData, ServiceError> {
        debug!("Creating user {} in user-store", user.id);
        check_id(&user.id)?;
        let url = self.users_url(None);
        self.send_for_user(self.request(Method::POST, url).json(user))
            .await
    }

    async fn update_user(&self, user: &UserData) -> Result<UserData, ServiceError> {
        debug!("Updating user {} in user-store", user.id);
        check_id(&user.id)?;
        let url = self.users_url(Some(&user.id));
        self.send_for_user(self.request(Method::PUT, url).json(user))
            .await
    }

    async fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        debug!("Deleting user {} in user-store", id);
        check_id(id)?;
        let url = self.users_url(Some(id));
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(endpoint: &str) -> HttpUserService {
        HttpUserService::new(endpoint, None, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_users_url() {
        let svc = service("http://[::1]:50051");
        assert_eq!(
            svc.users_url(None).as_str(),
            "http://[::1]:50051/api/v1/users"
        );
        assert_eq!(
            svc.users_url(Some("u1")).as_str(),
            "http://[::1]:50051/api/v1/users/u1"
        );
    }

    #[test]
    fn test_users_url_escapes_id() {
        let svc = service("http://localhost:8080/prefix/");
        assert_eq!(
            svc.users_url(Some("a/b c")).as_str(),
            "http://localhost:8080/prefix/api/v1/users/a%2Fb%20c"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(HttpUserService::new("not a url", None, Duration::from_secs(1)).is_err());
        assert!(HttpUserService::new("mailto:ops@example.com", None, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_code(404), StatusCode::NotFound);
        assert_eq!(status_code(409), StatusCode::AlreadyExists);
        assert_eq!(status_code(503), StatusCode::Unavailable);
        assert_eq!(status_code(400), StatusCode::Unknown);
    }

    #[test]
    fn test_bare_status_never_reports_existence() {
        assert_eq!(
            bare_status_code(reqwest::StatusCode::NOT_FOUND),
            StatusCode::Unknown
        );
        assert_eq!(
            bare_status_code(reqwest::StatusCode::CONFLICT),
            StatusCode::Unknown
        );
        assert_eq!(
            bare_status_code(reqwest::StatusCode::BAD_GATEWAY),
            StatusCode::Unavailable
        );
    }

    #[tokio::test]
    async fn test_dot_ids_rejected_before_sending() {
        // Nothing listens here; a request that went out would be Unavailable
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let svc = service(&format!("http://{}", addr));

        for id in [".", ".."] {
            let user = UserData::new(id, "Dots", "");
            for err in [
                svc.get_user(id).await.unwrap_err(),
                svc.create_user(&user).await.unwrap_err(),
                svc.update_user(&user).await.unwrap_err(),
                svc.delete_user(id).await.unwrap_err(),
            ] {
                assert_eq!(err.code, StatusCode::Unknown, "{}", err);
            }
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Bind and drop a listener to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let svc = service(&format!("http://{}", addr));
        let err = svc.get_user("u1").await.unwrap_err();
        assert_eq!(err.code, StatusCode::Unavailable);
    }
}
