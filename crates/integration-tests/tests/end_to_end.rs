//! Client through the forwarder to the backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use reqwest::StatusCode;
use vocalocart_client::{
    ApiClient, AuthStore, CartError, CartStore, Checkout, CheckoutError, ErrorCategory,
    FileTokenStore, MemoryTokenStore,
};
use vocalocart_core::{
    CartItemId, ContactRequest, Email, OrderStatus, Price, ProductId, ProductSearch,
    SortDirection,
};
use vocalocart_integration_tests::{
    FakeBackend, MIKU_PLUSH, MIKU_V4X, RIN_LEN_APPEND, address_request, start_proxy,
    start_proxy_to,
};

async fn through_proxy() -> (FakeBackend, String, ApiClient) {
    let backend = FakeBackend::start().await;
    let proxy = start_proxy(&backend).await;
    let api = ApiClient::new(&proxy).unwrap();
    (backend, proxy, api)
}

#[tokio::test]
async fn test_shopping_session_through_proxy() {
    let (backend, _proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let auth = AuthStore::new(api, Arc::new(MemoryTokenStore::new()));
    let cart = CartStore::new(auth.clone());

    auth.login("miku@example.jp", "secret39").await.unwrap();
    backend.add_address(auth.user_id().unwrap(), address_request("Miku", "Sapporo"));

    cart.add_to_cart(MIKU_V4X, 1).await.unwrap();
    cart.add_to_cart(RIN_LEN_APPEND, 2).await.unwrap();
    let rin = cart.snapshot().line_for_product(RIN_LEN_APPEND).unwrap().cart_item_id;
    cart.remove_from_cart(rin).await.unwrap();
    assert_eq!(cart.grand_total(), Price::new(31_800));

    let mut checkout = Checkout::new(auth.clone(), cart.clone());
    checkout.load_addresses().await.unwrap();
    let order = checkout.place_order(None).await.unwrap();
    assert_eq!(order.total_amount, Price::new(31_800));
    assert_eq!(order.shipping.ship_city.as_deref(), Some("Sapporo"));
    assert!(cart.is_empty());

    let history = auth
        .api()
        .orders_for_user(auth.user_id().unwrap())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(backend.requests().contains(&format!("PATCH /api/cart/{rin}/decrement")));
}

#[tokio::test]
async fn test_proxy_replaces_auth_failures_with_fixed_messages() {
    let (backend, _proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let auth = AuthStore::new(api, Arc::new(MemoryTokenStore::new()));

    let err = auth.login("miku@example.jp", "nope").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotAuthorized);
    assert!(err.to_string().ends_with(": Login failed"));
}

#[tokio::test]
async fn test_decrement_of_unknown_line_relays_not_found() {
    let (backend, _proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let auth = AuthStore::new(api, Arc::new(MemoryTokenStore::new()));
    auth.login("miku@example.jp", "secret39").await.unwrap();
    let cart = CartStore::new(auth);

    let err = cart.remove_from_cart(CartItemId::new(12_345)).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_other_cart_failures_are_generic_through_proxy() {
    let (backend, proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let auth = AuthStore::new(api, Arc::new(MemoryTokenStore::new()));
    let user = auth.login("miku@example.jp", "secret39").await.unwrap();
    let cart = CartStore::new(auth);

    // The backend rejects a zero quantity with 400.
    match cart.add_to_cart(MIKU_V4X, 0).await.unwrap_err() {
        CartError::Api(e) => {
            assert_eq!(e.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
            assert_eq!(e.server_message(), Some("Failed to add to cart"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Without a token the backend answers 401 for both.
    let anonymous = ApiClient::new(&proxy).unwrap();
    let err = anonymous.cart(user.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.server_message(), Some("Failed to load cart"));

    let err = anonymous
        .delete_cart_item(CartItemId::new(12_345))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.server_message(), Some("Failed to delete cart item"));
}

#[tokio::test]
async fn test_order_failure_is_generic_through_proxy() {
    let (backend, _proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let auth = AuthStore::new(api, Arc::new(MemoryTokenStore::new()));
    auth.login("miku@example.jp", "secret39").await.unwrap();
    let cart = CartStore::new(auth.clone());

    // Empty cart: the backend says 400 "Cart is empty"; the proxy hides it.
    match Checkout::new(auth, cart).place_order(None).await.unwrap_err() {
        CheckoutError::Api(e) => {
            assert_eq!(e.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
            assert_eq!(e.server_message(), Some("Order request failed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_admin_status_update_through_proxy() {
    let (backend, proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    backend.add_admin("admin@example.jp", "crypton", "Admin");

    let shopper = AuthStore::new(api, Arc::new(MemoryTokenStore::new()));
    shopper.login("miku@example.jp", "secret39").await.unwrap();
    let cart = CartStore::new(shopper.clone());
    cart.add_to_cart(MIKU_V4X, 1).await.unwrap();
    let order = Checkout::new(shopper.clone(), cart)
        .place_order(None)
        .await
        .unwrap();

    let denied = shopper.api().all_orders().await.unwrap_err();
    assert_eq!(denied.category(), ErrorCategory::Failure);

    let admin = AuthStore::new(
        ApiClient::new(&proxy).unwrap(),
        Arc::new(MemoryTokenStore::new()),
    );
    admin.login("admin@example.jp", "crypton").await.unwrap();
    admin
        .api()
        .update_order_status(order.id, OrderStatus::InDelivery)
        .await
        .unwrap();

    let orders = shopper
        .api()
        .orders_for_user(shopper.user_id().unwrap())
        .await
        .unwrap();
    assert_eq!(orders[0].status(), Some(OrderStatus::InDelivery));
    assert_eq!(orders[0].status_label(), "Shipping");
}

#[tokio::test]
async fn test_catalog_search_through_proxy() {
    let (backend, _proxy, api) = through_proxy().await;

    let page = api
        .search_products(&ProductSearch {
            q: Some("miku".to_string()),
            sort: "price".to_string(),
            dir: SortDirection::Desc,
            ..ProductSearch::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.content[0].id, MIKU_V4X);
    assert_eq!(page.content[1].id, MIKU_PLUSH);
    assert!(!page.content[1].in_stock());

    assert_eq!(api.categories().await.unwrap().len(), 2);
    assert_eq!(api.product(RIN_LEN_APPEND).await.unwrap().price, Price::new(12_000));
    let missing = api.product(ProductId::new(999)).await.unwrap_err();
    assert_eq!(missing.category(), ErrorCategory::Failure);
    assert_eq!(missing.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(missing.server_message(), Some("Failed to fetch from backend"));

    let direct = ApiClient::new(&backend.url()).unwrap();
    let missing = direct.product(ProductId::new(999)).await.unwrap_err();
    assert_eq!(missing.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_wishlist_and_addresses_through_proxy() {
    let (backend, _proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let auth = AuthStore::new(api, Arc::new(MemoryTokenStore::new()));
    let user = auth.login("miku@example.jp", "secret39").await.unwrap();
    let api = auth.api();

    api.add_to_wishlist(user.id, MIKU_PLUSH).await.unwrap();
    api.add_to_wishlist(user.id, MIKU_PLUSH).await.unwrap();
    let wishlist = api.wishlist(user.id).await.unwrap();
    assert_eq!(wishlist.len(), 1);
    assert_eq!(wishlist[0].product_price, Price::new(3_500));
    api.remove_from_wishlist(user.id, MIKU_PLUSH).await.unwrap();
    assert!(api.wishlist(user.id).await.unwrap().is_empty());

    let home = api
        .create_address(user.id, &address_request("Miku", "Sapporo"))
        .await
        .unwrap();
    assert!(home.is_default);
    let work = api
        .create_address(user.id, &address_request("Miku", "Tokyo"))
        .await
        .unwrap();
    assert!(!work.is_default);

    api.set_default_address(user.id, work.id).await.unwrap();
    let saved = api.addresses(user.id).await.unwrap();
    let default = saved.iter().find(|a| a.is_default).unwrap();
    assert_eq!(default.id, work.id);

    api.delete_address(user.id, home.id).await.unwrap();
    assert_eq!(api.addresses(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_contact_through_proxy() {
    let (backend, _proxy, api) = through_proxy().await;

    let request = ContactRequest {
        sender_name: "Len".to_string(),
        sender_email: Email::parse("len@example.jp").unwrap(),
        title: "Restock?".to_string(),
        details: "When will the plush be back?".to_string(),
    };
    let response = api.send_contact(&request).await.unwrap();
    assert!(response.message.is_some());
    assert_eq!(backend.contacts(), vec![request]);
}

#[tokio::test]
async fn test_unknown_paths_never_reach_backend() {
    let (backend, proxy, _api) = through_proxy().await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{proxy}/api/users/../admin"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    let response = http.get(format!("{proxy}/internal/metrics")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = http.delete(format!("{proxy}/api/products")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_yields_fixed_error() {
    let proxy = start_proxy_to("http://127.0.0.1:9").await;
    let api = ApiClient::new(&proxy).unwrap();

    let err = api.products().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.server_message(), Some("Failed to fetch from backend"));
    assert_eq!(err.user_message(), ErrorCategory::Failure.message());
}

#[tokio::test]
async fn test_session_survives_restart_via_token_file() {
    let (backend, proxy, api) = through_proxy().await;
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session").join("token.json");

    let first = AuthStore::new(api, Arc::new(FileTokenStore::new(&path)));
    first.login("miku@example.jp", "secret39").await.unwrap();
    assert!(path.exists());

    let second = AuthStore::new(
        ApiClient::new(&proxy).unwrap(),
        Arc::new(FileTokenStore::new(&path)),
    );
    let restored = second.restore().await.unwrap().unwrap();
    assert_eq!(restored.email, "miku@example.jp");

    second.logout();
    assert!(!path.exists());
}
