//! Integration tests for VocaloCart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vocalocart-integration-tests
//! ```
//!
//! The tests need no external services. [`FakeBackend`] is an in-memory
//! stand-in for the backend service: it speaks the same JSON shapes and
//! bearer-token rules, seeds a small catalog, and records every request it
//! receives so tests can assert what was (or was not) sent.
//! [`start_proxy`] runs the real forwarder in front of it.
//!
//! # Test Categories
//!
//! - `stores` - Auth and cart stores against the backend
//! - `checkout` - Address selection and order placement
//! - `end_to_end` - Client through the forwarder to the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use vocalocart_core::{
    AddToCartRequest, Address, AddressId, AddressRequest, AuthResponse, CartItemId, CartLineItem,
    CartSnapshot, Category, CategoryId, ContactRequest, ContactResponse, ErrorBody, Order,
    OrderId, OrderItem, OrderStatus, Page, Price, Product, ProductId, ProductSearch,
    ShippingDetails, SortDirection, User, UserId, WishlistItem, WishlistItemId,
};
use vocalocart_proxy::{AppState, ProxyConfig, RouteTable};

/// Seeded product: in stock, 19800 yen.
pub const MIKU_V4X: ProductId = ProductId::new(1);
/// Seeded product: in stock, 12000 yen.
pub const RIN_LEN_APPEND: ProductId = ProductId::new(2);
/// Seeded product: sold out.
pub const MIKU_PLUSH: ProductId = ProductId::new(3);
/// Seeded product: two in stock.
pub const LUKA_FIGURE: ProductId = ProductId::new(4);

type Shared = Arc<Mutex<Shop>>;

fn lock(shop: &Shared) -> MutexGuard<'_, Shop> {
    shop.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct Shop {
    next_id: i64,
    accounts: Vec<Account>,
    tokens: Vec<(String, UserId)>,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart: Vec<(UserId, CartLineItem)>,
    orders: Vec<Order>,
    addresses: Vec<(UserId, Address)>,
    wishlist: Vec<(UserId, WishlistItem)>,
    contacts: Vec<ContactRequest>,
    requests: Vec<String>,
    profile_failure: bool,
}

/// Error response in the backend's shape.
#[derive(Debug)]
struct Rejection(StatusCode, String);

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: None,
            message: Some(self.1),
        };
        (self.0, Json(body)).into_response()
    }
}

fn reject(status: StatusCode, message: impl Into<String>) -> Rejection {
    Rejection(status, message.into())
}

type Reply<T> = Result<Json<T>, Rejection>;

impl Shop {
    fn seeded() -> Self {
        let category = |id: i64, name: &str| Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: None,
        };
        let product = |id: ProductId, name: &str, price: i64, stock: u32, category: i64| Product {
            id,
            name: name.to_string(),
            description: Some(format!("{name} (official)")),
            price: Price::new(price),
            stock_quantity: stock,
            image_url: Some(format!("/images/{id}.png")),
            category_id: Some(CategoryId::new(category)),
            category_name: Some(if category == 1 { "Voicebanks" } else { "Goods" }.to_string()),
        };

        Self {
            next_id: 100,
            categories: vec![category(1, "Voicebanks"), category(2, "Goods")],
            products: vec![
                product(MIKU_V4X, "Hatsune Miku V4X", 19_800, 10, 1),
                product(RIN_LEN_APPEND, "Kagamine Rin/Len Append", 12_000, 5, 1),
                product(MIKU_PLUSH, "Miku Plush", 3_500, 0, 2),
                product(LUKA_FIGURE, "Megurine Luka Figure", 8_800, 2, 2),
            ],
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn add_account(&mut self, email: &str, password: &str, name: &str, is_admin: bool) -> User {
        let user = User {
            id: UserId::new(self.next_id()),
            name: name.to_string(),
            email: email.trim().to_lowercase(),
            is_admin: Some(is_admin),
            nickname: None,
            birthday: None,
        };
        self.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    fn issue_token(&mut self, user: &User) -> AuthResponse {
        let token = format!("token-{}-{}", user.id, self.next_id());
        self.tokens.push((token.clone(), user.id));
        AuthResponse {
            token,
            email: Some(user.email.clone()),
            name: Some(user.name.clone()),
            role: Some(if user.is_admin() { "ADMIN" } else { "USER" }.to_string()),
        }
    }

    fn caller(&self, headers: &HeaderMap) -> Result<&User, Rejection> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing token"))?;
        let user_id = self
            .tokens
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, id)| *id)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid token"))?;
        self.accounts
            .iter()
            .map(|a| &a.user)
            .find(|u| u.id == user_id)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid token"))
    }

    /// The caller may act on `user_id`'s data: it is them, or an admin.
    fn owner(&self, headers: &HeaderMap, user_id: UserId) -> Result<UserId, Rejection> {
        let caller = self.caller(headers)?;
        if caller.id == user_id || caller.is_admin() {
            Ok(user_id)
        } else {
            Err(reject(StatusCode::FORBIDDEN, "Access denied"))
        }
    }

    fn admin(&self, headers: &HeaderMap) -> Result<(), Rejection> {
        if self.caller(headers)?.is_admin() {
            Ok(())
        } else {
            Err(reject(StatusCode::FORBIDDEN, "Admin only"))
        }
    }

    fn product(&self, id: ProductId) -> Result<&Product, Rejection> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("Product {id} not found")))
    }

    fn lines_of(&self, user_id: UserId) -> Vec<CartLineItem> {
        self.cart
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn address_of(&self, user_id: UserId, id: AddressId) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|(owner, a)| *owner == user_id && a.id == id)
            .map(|(_, a)| a)
    }

    fn make_default(&mut self, user_id: UserId, id: AddressId) {
        for (owner, address) in &mut self.addresses {
            if *owner == user_id {
                address.is_default = address.id == id;
            }
        }
    }
}

fn text<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

// =============================================================================
// Auth
// =============================================================================

async fn register(State(shop): State<Shared>, Json(body): Json<Value>) -> Reply<AuthResponse> {
    let mut shop = lock(&shop);
    let email = text(&body, "email").unwrap_or_default().trim().to_lowercase();
    let password = text(&body, "password").unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Email and password are required",
        ));
    }
    if shop.accounts.iter().any(|a| a.user.email == email) {
        return Err(reject(StatusCode::BAD_REQUEST, "Email already registered"));
    }

    let nickname = text(&body, "nickname").map(str::to_string);
    let mut user = shop.add_account(&email, password, nickname.as_deref().unwrap_or(""), false);
    user.nickname = nickname;
    user.birthday = text(&body, "birthday").and_then(|s| s.parse().ok());
    if let Some(account) = shop.accounts.iter_mut().find(|a| a.user.id == user.id) {
        account.user = user.clone();
    }
    Ok(Json(shop.issue_token(&user)))
}

async fn login(State(shop): State<Shared>, Json(body): Json<Value>) -> Reply<AuthResponse> {
    let mut shop = lock(&shop);
    let email = text(&body, "email").unwrap_or_default().trim().to_lowercase();
    let password = text(&body, "password").unwrap_or_default();
    let user = shop
        .accounts
        .iter()
        .find(|a| a.user.email == email && a.password == password)
        .map(|a| a.user.clone())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;
    Ok(Json(shop.issue_token(&user)))
}

async fn me(State(shop): State<Shared>, headers: HeaderMap) -> Reply<User> {
    let shop = lock(&shop);
    if shop.profile_failure {
        return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Profile lookup failed"));
    }
    Ok(Json(shop.caller(&headers)?.clone()))
}

// =============================================================================
// Catalog
// =============================================================================

async fn products(State(shop): State<Shared>) -> Json<Vec<Product>> {
    Json(lock(&shop).products.clone())
}

async fn product(State(shop): State<Shared>, Path(id): Path<ProductId>) -> Reply<Product> {
    Ok(Json(lock(&shop).product(id)?.clone()))
}

async fn search_products(
    State(shop): State<Shared>,
    Query(search): Query<ProductSearch>,
) -> Json<Page<Product>> {
    let shop = lock(&shop);
    let needle = search.q.as_deref().map(str::to_lowercase);
    let mut found: Vec<Product> = shop
        .products
        .iter()
        .filter(|p| {
            needle
                .as_deref()
                .is_none_or(|q| p.name.to_lowercase().contains(q))
        })
        .filter(|p| search.category_id.is_none_or(|c| p.category_id == Some(c)))
        .cloned()
        .collect();

    match search.sort.as_str() {
        "price" => found.sort_by_key(|p| p.price),
        "name" => found.sort_by(|a, b| a.name.cmp(&b.name)),
        _ => found.sort_by_key(|p| p.id),
    }
    if search.dir == SortDirection::Desc {
        found.reverse();
    }

    let size = search.size.max(1);
    let total = found.len() as u64;
    let content = found
        .into_iter()
        .skip(search.page as usize * size as usize)
        .take(size as usize)
        .collect();
    Json(Page {
        content,
        total_pages: u32::try_from(total.div_ceil(u64::from(size))).unwrap_or(u32::MAX),
        total_elements: total,
        number: search.page,
        size,
    })
}

async fn categories(State(shop): State<Shared>) -> Json<Vec<Category>> {
    Json(lock(&shop).categories.clone())
}

// =============================================================================
// Cart
// =============================================================================

async fn cart(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> Reply<CartSnapshot> {
    let shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    Ok(Json(CartSnapshot::new(shop.lines_of(user_id))))
}

async fn add_to_cart(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(request): Json<AddToCartRequest>,
) -> Reply<CartLineItem> {
    let mut shop = lock(&shop);
    let user_id = shop.owner(&headers, request.user_id)?;
    if request.quantity == 0 {
        return Err(reject(StatusCode::BAD_REQUEST, "Quantity must be positive"));
    }
    let product = shop.product(request.product_id)?.clone();

    let exists = shop
        .cart
        .iter()
        .any(|(owner, line)| *owner == user_id && line.product_id == product.id);
    if !exists {
        let line = CartLineItem {
            cart_item_id: CartItemId::new(shop.next_id()),
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            quantity: 0,
            total_price: Price::ZERO,
            product_image: product.image_url.clone(),
        };
        shop.cart.push((user_id, line));
    }

    shop.cart
        .iter_mut()
        .find(|(owner, line)| *owner == user_id && line.product_id == product.id)
        .map(|(_, line)| {
            line.quantity = line.quantity.saturating_add(request.quantity);
            line.total_price = line.price * line.quantity;
            Json(line.clone())
        })
        .ok_or_else(|| reject(StatusCode::INTERNAL_SERVER_ERROR, "Cart line missing"))
}

async fn decrement_cart_item(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CartItemId>,
) -> Result<StatusCode, Rejection> {
    let mut shop = lock(&shop);
    let user_id = shop.caller(&headers)?.id;
    let remaining = shop
        .cart
        .iter_mut()
        .find(|(owner, line)| *owner == user_id && line.cart_item_id == id)
        .map(|(_, line)| {
            line.quantity = line.quantity.saturating_sub(1);
            line.total_price = line.price * line.quantity;
            line.quantity
        })
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Cart item not found"))?;
    if remaining == 0 {
        shop.cart.retain(|(_, line)| line.cart_item_id != id);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_cart_item(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CartItemId>,
) -> Result<StatusCode, Rejection> {
    let mut shop = lock(&shop);
    let user_id = shop.caller(&headers)?.id;
    shop.cart
        .retain(|(owner, line)| !(*owner == user_id && line.cart_item_id == id));
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceParams {
    address_id: Option<AddressId>,
}

fn shipping(address: Address) -> ShippingDetails {
    ShippingDetails {
        ship_recipient_name: Some(address.recipient_name),
        ship_line1: Some(address.line1),
        ship_line2: address.line2,
        ship_city: Some(address.city),
        ship_state: address.state,
        ship_postal_code: Some(address.postal_code),
        ship_country: Some(address.country),
        ship_phone: Some(address.phone),
    }
}

async fn place_order(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Query(params): Query<PlaceParams>,
) -> Reply<Order> {
    let mut shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;

    let lines = shop.lines_of(user_id);
    if lines.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Cart is empty"));
    }
    for line in &lines {
        let product = shop.product(line.product_id)?;
        if product.stock_quantity < line.quantity {
            return Err(reject(
                StatusCode::BAD_REQUEST,
                format!("Insufficient stock for {}", product.name),
            ));
        }
    }

    let address = match params.address_id {
        Some(id) => Some(
            shop.address_of(user_id, id)
                .cloned()
                .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Address not found"))?,
        ),
        None => shop
            .addresses
            .iter()
            .find(|(owner, a)| *owner == user_id && a.is_default)
            .map(|(_, a)| a.clone()),
    };

    for line in &lines {
        if let Some(product) = shop.products.iter_mut().find(|p| p.id == line.product_id) {
            product.stock_quantity -= line.quantity;
        }
    }
    shop.cart.retain(|(owner, _)| *owner != user_id);

    let order = Order {
        id: OrderId::new(shop.next_id()),
        user_id: Some(user_id),
        ordered_at: None,
        total_amount: lines.iter().map(|l| l.total_price).sum(),
        items: lines
            .into_iter()
            .map(|l| OrderItem {
                id: None,
                product_id: l.product_id,
                product_name: l.product_name,
                product_image_url: l.product_image,
                quantity: l.quantity,
                price: l.price,
                subtotal: Some(l.total_price),
            })
            .collect(),
        status: Some(OrderStatus::PaymentReceived.code().to_string()),
        shipping: address.map(shipping).unwrap_or_default(),
    };
    shop.orders.push(order.clone());
    Ok(Json(order))
}

async fn orders_for_user(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> Reply<Vec<Order>> {
    let shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    Ok(Json(
        shop.orders
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect(),
    ))
}

async fn all_orders(State(shop): State<Shared>, headers: HeaderMap) -> Reply<Vec<Order>> {
    let shop = lock(&shop);
    shop.admin(&headers)?;
    Ok(Json(shop.orders.clone()))
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    status: String,
}

async fn update_order_status(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
    Query(params): Query<StatusParams>,
) -> Reply<Order> {
    let mut shop = lock(&shop);
    shop.admin(&headers)?;
    let status: OrderStatus = params
        .status
        .parse()
        .map_err(|e: String| reject(StatusCode::BAD_REQUEST, e))?;
    let order = shop
        .orders
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Order not found"))?;
    order.status = Some(status.code().to_string());
    Ok(Json(order.clone()))
}

// =============================================================================
// Addresses
// =============================================================================

async fn addresses(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> Reply<Vec<Address>> {
    let shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    Ok(Json(
        shop.addresses
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, a)| a.clone())
            .collect(),
    ))
}

async fn create_address(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Json(request): Json<AddressRequest>,
) -> Reply<Address> {
    let mut shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            format!("Missing fields: {}", missing.join(", ")),
        ));
    }
    Ok(Json(store_address(&mut shop, user_id, request)))
}

fn store_address(shop: &mut Shop, user_id: UserId, request: AddressRequest) -> Address {
    let first = !shop.addresses.iter().any(|(owner, _)| *owner == user_id);
    let id = AddressId::new(shop.next_id());
    let is_default = first || request.is_default == Some(true);
    if is_default {
        shop.make_default(user_id, id);
    }
    let address = Address {
        id,
        recipient_name: request.recipient_name,
        line1: request.line1,
        line2: request.line2,
        city: request.city,
        state: request.state,
        postal_code: request.postal_code,
        country: request.country,
        phone: request.phone,
        is_default,
    };
    shop.addresses.push((user_id, address.clone()));
    address
}

async fn update_address(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path((user_id, id)): Path<(UserId, AddressId)>,
    Json(body): Json<Value>,
) -> Reply<Address> {
    let mut shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    if shop.address_of(user_id, id).is_none() {
        return Err(reject(StatusCode::NOT_FOUND, "Address not found"));
    }
    if body.get("isDefault").and_then(Value::as_bool) == Some(true) {
        shop.make_default(user_id, id);
    }
    shop.address_of(user_id, id)
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Address not found"))
}

async fn delete_address(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path((user_id, id)): Path<(UserId, AddressId)>,
) -> Result<StatusCode, Rejection> {
    let mut shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    let before = shop.addresses.len();
    shop.addresses
        .retain(|(owner, a)| !(*owner == user_id && a.id == id));
    if shop.addresses.len() == before {
        return Err(reject(StatusCode::NOT_FOUND, "Address not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Wishlist and contact
// =============================================================================

async fn wishlist(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> Reply<Vec<WishlistItem>> {
    let shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    Ok(Json(
        shop.wishlist
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, item)| item.clone())
            .collect(),
    ))
}

async fn add_to_wishlist(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path((user_id, product_id)): Path<(UserId, ProductId)>,
) -> Reply<WishlistItem> {
    let mut shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    let product = shop.product(product_id)?.clone();
    if let Some((_, item)) = shop
        .wishlist
        .iter()
        .find(|(owner, item)| *owner == user_id && item.product_id == product_id)
    {
        return Ok(Json(item.clone()));
    }
    let item = WishlistItem {
        id: WishlistItemId::new(shop.next_id()),
        product_id,
        product_name: product.name,
        product_description: product.description,
        product_price: product.price,
        product_image_url: product.image_url,
        added_at: None,
    };
    shop.wishlist.push((user_id, item.clone()));
    Ok(Json(item))
}

async fn remove_from_wishlist(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Path((user_id, product_id)): Path<(UserId, ProductId)>,
) -> Result<StatusCode, Rejection> {
    let mut shop = lock(&shop);
    let user_id = shop.owner(&headers, user_id)?;
    shop.wishlist
        .retain(|(owner, item)| !(*owner == user_id && item.product_id == product_id));
    Ok(StatusCode::NO_CONTENT)
}

async fn contact(
    State(shop): State<Shared>,
    Json(request): Json<ContactRequest>,
) -> Reply<ContactResponse> {
    request
        .validate()
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    lock(&shop).contacts.push(request);
    Ok(Json(ContactResponse {
        message: Some("Your message has been sent".to_string()),
        error: None,
    }))
}

// =============================================================================
// Server
// =============================================================================

async fn record_request(State(shop): State<Shared>, request: Request, next: Next) -> Response {
    lock(&shop)
        .requests
        .push(format!("{} {}", request.method(), request.uri().path()));
    next.run(request).await
}

fn app(shop: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
        .route("/api/products", get(products))
        .route("/api/products/search", get(search_products))
        .route("/api/products/{id}", get(product))
        .route("/api/categories", get(categories))
        .route("/api/cart", post(add_to_cart))
        .route("/api/cart/{id}", get(cart).delete(delete_cart_item))
        .route("/api/cart/{id}/decrement", patch(decrement_cart_item))
        .route("/api/orders", get(all_orders))
        .route("/api/orders/place/{user_id}", post(place_order))
        .route("/api/orders/user/{user_id}", get(orders_for_user))
        .route("/api/orders/{id}/status", patch(update_order_status))
        .route("/api/addresses/{user_id}", get(addresses).post(create_address))
        .route(
            "/api/addresses/{user_id}/{id}",
            put(update_address).delete(delete_address),
        )
        .route("/api/wishlist/{user_id}", get(wishlist))
        .route(
            "/api/wishlist/{user_id}/{product_id}",
            post(add_to_wishlist).delete(remove_from_wishlist),
        )
        .route("/api/contact", post(contact))
        .layer(middleware::from_fn_with_state(shop.clone(), record_request))
        .with_state(shop)
}

/// In-memory backend listening on an ephemeral local port.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    addr: SocketAddr,
    shop: Shared,
}

impl FakeBackend {
    /// Bind to `127.0.0.1:0` and serve the seeded shop in the background.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let shop: Shared = Arc::new(Mutex::new(Shop::seeded()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        let app = app(shop.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, shop }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Create a customer account.
    pub fn add_user(&self, email: &str, password: &str, name: &str) -> User {
        lock(&self.shop).add_account(email, password, name, false)
    }

    /// Create an admin account.
    pub fn add_admin(&self, email: &str, password: &str, name: &str) -> User {
        lock(&self.shop).add_account(email, password, name, true)
    }

    /// Save an address directly, bypassing validation.
    pub fn add_address(&self, user_id: UserId, request: AddressRequest) -> Address {
        store_address(&mut lock(&self.shop), user_id, request)
    }

    /// `METHOD /path` of every request received, oldest first.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.shop).requests.clone()
    }

    pub fn clear_requests(&self) {
        lock(&self.shop).requests.clear();
    }

    /// Make `GET /auth/me` answer 500 until switched off.
    pub fn fail_profile(&self, fail: bool) {
        lock(&self.shop).profile_failure = fail;
    }

    /// Invalidate every issued token.
    pub fn revoke_tokens(&self) {
        lock(&self.shop).tokens.clear();
    }

    pub fn cart_lines(&self, user_id: UserId) -> Vec<CartLineItem> {
        lock(&self.shop).lines_of(user_id)
    }

    pub fn stock(&self, product_id: ProductId) -> Option<u32> {
        lock(&self.shop)
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock_quantity)
    }

    pub fn contacts(&self) -> Vec<ContactRequest> {
        lock(&self.shop).contacts.clone()
    }
}

/// Run the forwarder with its built-in table in front of `upstream` and
/// return its base URL.
///
/// # Panics
///
/// Panics if the forwarder cannot be configured or bound.
pub async fn start_proxy(upstream: &FakeBackend) -> String {
    start_proxy_to(&upstream.url()).await
}

/// Run the forwarder in front of an arbitrary upstream origin.
///
/// # Panics
///
/// Panics if the forwarder cannot be configured or bound.
pub async fn start_proxy_to(upstream_url: &str) -> String {
    let base = upstream_url.to_string();
    let config = ProxyConfig::from_lookup(|key| (key == "UPSTREAM_BASE_URL").then(|| base.clone()))
        .expect("proxy config");
    let state = AppState::new(config, RouteTable::default_table()).expect("proxy state");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind proxy");
    let addr = listener.local_addr().expect("proxy address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, vocalocart_proxy::router(state)).await;
    });
    format!("http://{addr}")
}

/// A complete address for `recipient`.
#[must_use]
pub fn address_request(recipient: &str, city: &str) -> AddressRequest {
    AddressRequest {
        recipient_name: recipient.to_string(),
        line1: "1-39 Crypton St".to_string(),
        line2: None,
        city: city.to_string(),
        state: None,
        postal_code: "060-0001".to_string(),
        country: "JP".to_string(),
        phone: "011-000-0000".to_string(),
        is_default: None,
    }
}
