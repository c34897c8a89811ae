//! Typed HTTP client for the storefront API.
//!
//! One method per backend call, no caching and no retries. The bearer token
//! is attached to every request when set; the [`AuthStore`](crate::AuthStore)
//! keeps it in sync with the logged-in session.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use vocalocart_core::{
    AddToCartRequest, Address, AddressId, AddressRequest, AuthResponse, CartItemId, CartSnapshot,
    Category, ContactRequest, ContactResponse, ErrorBody, LoginRequest, Order, OrderId,
    OrderStatus, Page, Product, ProductId, ProductSearch, RegisterRequest, User, UserId,
    WishlistItem,
};

/// Longest upstream error text kept in an [`ApiError`].
const MAX_ERROR_TEXT: usize = 200;

// =============================================================================
// Errors
// =============================================================================

/// The user-facing buckets every failure collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401 or 403.
    NotAuthorized,
    /// 404.
    NotFound,
    /// Everything else, including network errors.
    Failure,
}

impl ErrorCategory {
    /// Fixed message shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotAuthorized => "You are not authorized. Please log in and try again.",
            Self::NotFound => "The requested item was not found.",
            Self::Failure => "Something went wrong. Please try again later.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors from a storefront API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server answered {status}{}", suffix(.message.as_deref()))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL is unusable.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

fn suffix(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Status { status, .. } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCategory::NotAuthorized,
                StatusCode::NOT_FOUND => ErrorCategory::NotFound,
                _ => ErrorCategory::Failure,
            },
            Self::Http(_) | Self::Decode(_) | Self::InvalidBaseUrl(_) => ErrorCategory::Failure,
        }
    }

    /// Fixed text for the error's category.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        self.category().message()
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error text sent by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API (normally reached through the proxy).
///
/// Cheaply cloneable; clones share the token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.has_token().then_some("[REDACTED]"))
            .finish()
    }
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] unless `base_url` is an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] unless `base_url` is an absolute
    /// http(s) URL.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url.trim()).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url,
                token: RwLock::new(None),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Replace the bearer token sent with every request.
    pub fn set_token(&self, token: Option<SecretString>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{path}",
            self.inner.base_url.as_str().trim_end_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.inner.http.request(method, self.url(path));
        let token = self
            .inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match token.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and turn non-success statuses into [`ApiError::Status`].
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.text().map(str::to_owned))
            .or_else(|| {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.chars().take(MAX_ERROR_TEXT).collect())
            });
        debug!(%status, message = message.as_deref().unwrap_or(""), "API request failed");
        Err(ApiError::Status { status, message })
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.send(builder).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await?;
        Ok(())
    }

    fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        self.request(Method::POST, path).json(body)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the call fails.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.json(self.post_json("/auth/login", request)).await
    }

    /// `POST /auth/register`.
    ///
    /// # Errors
    ///
    /// Returns an error if registration is rejected or the call fails.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.json(self.post_json("/auth/register", request)).await
    }

    /// `GET /auth/me` with the current token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing, rejected, or the call fails.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.json(self.request(Method::GET, "/auth/me")).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// `GET /api/products`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.json(self.request(Method::GET, "/api/products")).await
    }

    /// `GET /api/products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the call fails.
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.json(self.request(Method::GET, &format!("/api/products/{id}")))
            .await
    }

    /// `GET /api/products/search`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, search: &ProductSearch) -> Result<Page<Product>, ApiError> {
        self.json(
            self.request(Method::GET, "/api/products/search")
                .query(search),
        )
        .await
    }

    /// `GET /api/categories`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.json(self.request(Method::GET, "/api/categories")).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// `GET /api/cart/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn cart(&self, user_id: UserId) -> Result<CartSnapshot, ApiError> {
        self.json(self.request(Method::GET, &format!("/api/cart/{user_id}")))
            .await
    }

    /// `POST /api/cart`: adds to the existing line for the product, or
    /// creates one.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<(), ApiError> {
        self.unit(self.post_json("/api/cart", request)).await
    }

    /// `PATCH /api/cart/{cartItemId}/decrement`: one unit less; the backend
    /// deletes the line at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the call fails.
    #[instrument(skip(self))]
    pub async fn decrement_cart_item(&self, id: CartItemId) -> Result<(), ApiError> {
        self.unit(self.request(Method::PATCH, &format!("/api/cart/{id}/decrement")))
            .await
    }

    /// `DELETE /api/cart/{cartItemId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn delete_cart_item(&self, id: CartItemId) -> Result<(), ApiError> {
        self.unit(self.request(Method::DELETE, &format!("/api/cart/{id}")))
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// `POST /api/orders/place/{userId}[?addressId=]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty, stock is short, or the call fails.
    #[instrument(skip(self))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        address_id: Option<AddressId>,
    ) -> Result<Order, ApiError> {
        let mut builder = self.request(Method::POST, &format!("/api/orders/place/{user_id}"));
        if let Some(address_id) = address_id {
            builder = builder.query(&[("addressId", address_id.as_i64())]);
        }
        self.json(builder).await
    }

    /// `GET /api/orders/user/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        self.json(self.request(Method::GET, &format!("/api/orders/user/{user_id}")))
            .await
    }

    /// `GET /api/orders` (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the call fails.
    pub async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.json(self.request(Method::GET, "/api/orders")).await
    }

    /// `PATCH /api/orders/{id}/status?status=` (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the call fails.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        self.unit(
            self.request(Method::PATCH, &format!("/api/orders/{id}/status"))
                .query(&[("status", status.code())]),
        )
        .await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// `GET /api/addresses/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn addresses(&self, user_id: UserId) -> Result<Vec<Address>, ApiError> {
        self.json(self.request(Method::GET, &format!("/api/addresses/{user_id}")))
            .await
    }

    /// `POST /api/addresses/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is rejected or the call fails.
    #[instrument(skip(self, request))]
    pub async fn create_address(
        &self,
        user_id: UserId,
        request: &AddressRequest,
    ) -> Result<Address, ApiError> {
        self.json(self.post_json(&format!("/api/addresses/{user_id}"), request))
            .await
    }

    /// `DELETE /api/addresses/{userId}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, user_id: UserId, id: AddressId) -> Result<(), ApiError> {
        self.unit(self.request(Method::DELETE, &format!("/api/addresses/{user_id}/{id}")))
            .await
    }

    /// `PUT /api/addresses/{userId}/{id}` with `{"isDefault": true}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn set_default_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<(), ApiError> {
        self.unit(
            self.request(Method::PUT, &format!("/api/addresses/{user_id}/{id}"))
                .json(&serde_json::json!({ "isDefault": true })),
        )
        .await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// `GET /api/wishlist/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn wishlist(&self, user_id: UserId) -> Result<Vec<WishlistItem>, ApiError> {
        self.json(self.request(Method::GET, &format!("/api/wishlist/{user_id}")))
            .await
    }

    /// `POST /api/wishlist/{userId}/{productId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn add_to_wishlist(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.unit(self.request(
            Method::POST,
            &format!("/api/wishlist/{user_id}/{product_id}"),
        ))
        .await
    }

    /// `DELETE /api/wishlist/{userId}/{productId}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.unit(self.request(
            Method::DELETE,
            &format!("/api/wishlist/{user_id}/{product_id}"),
        ))
        .await
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// `POST /api/contact`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is rejected or the call fails.
    #[instrument(skip_all, fields(sender = %request.sender_email))]
    pub async fn send_contact(&self, request: &ContactRequest) -> Result<ContactResponse, ApiError> {
        self.json(self.post_json("/api/contact", request)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(code: StatusCode) -> ApiError {
        ApiError::Status {
            status: code,
            message: None,
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            status(StatusCode::UNAUTHORIZED).category(),
            ErrorCategory::NotAuthorized
        );
        assert_eq!(
            status(StatusCode::FORBIDDEN).category(),
            ErrorCategory::NotAuthorized
        );
        assert_eq!(status(StatusCode::NOT_FOUND).category(), ErrorCategory::NotFound);
        assert_eq!(
            status(StatusCode::BAD_REQUEST).category(),
            ErrorCategory::Failure
        );
        assert_eq!(
            ApiError::InvalidBaseUrl("x".into()).user_message(),
            ErrorCategory::Failure.message()
        );
    }

    #[test]
    fn test_status_display_includes_server_message() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Cart is empty".to_string()),
        };
        assert_eq!(err.to_string(), "server answered 400 Bad Request: Cart is empty");
        assert_eq!(err.server_message(), Some("Cart is empty"));
        assert_eq!(status(StatusCode::NOT_FOUND).to_string(), "server answered 404 Not Found");
    }

    #[test]
    fn test_base_url_validation() {
        assert!(ApiClient::new("http://127.0.0.1:5000").is_ok());
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("file:///tmp/x").is_err());
    }

    #[test]
    fn test_url_join_and_debug_redaction() {
        let client = ApiClient::new("http://shop.example.com/gateway/").unwrap();
        assert_eq!(
            client.url("/api/cart/3"),
            "http://shop.example.com/gateway/api/cart/3"
        );

        client.set_token(Some(SecretString::from("tok-123".to_string())));
        assert!(client.has_token());
        let debug = format!("{client:?}");
        assert!(!debug.contains("tok-123"));
        assert!(debug.contains("[REDACTED]"));

        client.set_token(None);
        assert!(!client.has_token());
    }
}
