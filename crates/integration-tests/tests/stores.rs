//! Auth and cart stores against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use vocalocart_client::{
    ApiClient, AuthError, AuthStore, CartError, CartStore, ErrorCategory, MemoryTokenStore,
    RegisterOptions, TokenStore,
};
use vocalocart_core::{CartItemId, CartSnapshot, Price};
use vocalocart_integration_tests::{FakeBackend, LUKA_FIGURE, MIKU_V4X, RIN_LEN_APPEND};

struct Session {
    auth: AuthStore,
    cart: CartStore,
    tokens: Arc<MemoryTokenStore>,
}

fn session_with(backend: &FakeBackend, tokens: MemoryTokenStore) -> Session {
    let api = ApiClient::new(&backend.url()).unwrap();
    let tokens = Arc::new(tokens);
    let auth = AuthStore::new(api, tokens.clone());
    let cart = CartStore::new(auth.clone());
    Session { auth, cart, tokens }
}

async fn logged_in(backend: &FakeBackend) -> Session {
    backend.add_user("miku@example.jp", "secret39", "Miku");
    let session = session_with(backend, MemoryTokenStore::new());
    session.auth.login("miku@example.jp", "secret39").await.unwrap();
    session
}

fn line_total_sum(snapshot: &CartSnapshot) -> Price {
    snapshot.items().iter().map(|l| l.total_price).sum()
}

// ============================================================================
// Auth store
// ============================================================================

#[tokio::test]
async fn test_login_loads_profile_and_persists_token() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    let user = session.auth.user().unwrap();
    assert_eq!(user.email, "miku@example.jp");
    assert_eq!(user.name, "Miku");
    assert!(session.auth.is_logged_in());
    assert!(session.tokens.load().unwrap().is_some());
    assert_eq!(
        backend.requests(),
        vec!["POST /auth/login".to_string(), "GET /auth/me".to_string()]
    );
}

#[tokio::test]
async fn test_rejected_login_keeps_previous_session() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    let err = session
        .auth
        .login("miku@example.jp", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotAuthorized);
    assert_eq!(session.auth.user().unwrap().email, "miku@example.jp");
    assert!(session.tokens.load().unwrap().is_some());
}

#[tokio::test]
async fn test_register_signs_in_with_nickname() {
    let backend = FakeBackend::start().await;
    let session = session_with(&backend, MemoryTokenStore::new());

    let user = session
        .auth
        .register(
            "rin@example.jp",
            "orange",
            RegisterOptions {
                nickname: Some("  Rin  ".to_string()),
                birthday: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(user.display_name(), "Rin");

    let again = session
        .auth
        .register("rin@example.jp", "orange", RegisterOptions::default())
        .await
        .unwrap_err();
    match again {
        AuthError::Api(e) => assert_eq!(e.server_message(), Some("Email already registered")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_clears_token_and_profile() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;
    let mut changes = session.auth.subscribe();

    session.auth.logout();

    assert!(session.auth.user().is_none());
    assert!(!session.auth.has_token());
    assert!(session.tokens.load().unwrap().is_none());
    assert!(changes.has_changed().unwrap());
    assert!(changes.borrow_and_update().is_none());

    // Logging out again is harmless.
    session.auth.logout();
    assert!(!session.auth.is_logged_in());
}

#[tokio::test]
async fn test_failed_profile_fetch_logs_out() {
    let backend = FakeBackend::start().await;
    backend.add_user("luka@example.jp", "tuna", "Luka");
    let session = session_with(&backend, MemoryTokenStore::new());
    backend.fail_profile(true);

    let err = session.auth.login("luka@example.jp", "tuna").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Failure);
    assert!(!session.auth.has_token());
    assert!(session.auth.user().is_none());
    assert!(session.tokens.load().unwrap().is_none());
}

#[tokio::test]
async fn test_restore_with_stale_token_logs_out() {
    let backend = FakeBackend::start().await;
    let session = session_with(&backend, MemoryTokenStore::with_token("token-from-last-week"));

    let err = session.auth.restore().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotAuthorized);
    assert!(!session.auth.has_token());
    assert!(session.tokens.load().unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_after_revocation_ends_session() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    assert!(session.auth.refresh().await.unwrap().is_some());

    backend.revoke_tokens();
    session.auth.refresh().await.unwrap_err();
    assert!(!session.auth.is_logged_in());
}

#[tokio::test]
async fn test_refresh_keeps_session_on_server_error() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    backend.fail_profile(true);
    session.auth.refresh().await.unwrap_err();
    assert!(session.auth.is_logged_in());
}

// ============================================================================
// Cart store
// ============================================================================

#[tokio::test]
async fn test_first_add_creates_single_line_with_quantity_one() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    session.cart.add_to_cart(MIKU_V4X, 1).await.unwrap();

    let items = session.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, MIKU_V4X);
    assert_eq!(items[0].quantity, 1);
    assert_eq!(items[0].total_price, Price::new(19_800));
}

#[tokio::test]
async fn test_adding_same_product_merges_lines() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    session.cart.add_to_cart(MIKU_V4X, 1).await.unwrap();
    session.cart.add_to_cart(MIKU_V4X, 2).await.unwrap();

    let items = session.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
    assert_eq!(session.cart.item_count(), 3);
}

#[tokio::test]
async fn test_grand_total_matches_line_totals_after_every_mutation() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    session.cart.add_to_cart(MIKU_V4X, 1).await.unwrap();
    let check = |cart: &CartStore| {
        let snapshot = cart.snapshot();
        assert_eq!(snapshot.grand_total(), line_total_sum(&snapshot));
        assert_eq!(cart.grand_total(), snapshot.grand_total());
    };
    check(&session.cart);

    session.cart.add_to_cart(RIN_LEN_APPEND, 2).await.unwrap();
    check(&session.cart);
    assert_eq!(session.cart.grand_total(), Price::new(19_800 + 2 * 12_000));

    session.cart.add_to_cart(LUKA_FIGURE, 1).await.unwrap();
    check(&session.cart);

    let rin = session.cart.snapshot().line_for_product(RIN_LEN_APPEND).unwrap().cart_item_id;
    session.cart.remove_from_cart(rin).await.unwrap();
    check(&session.cart);

    let luka = session.cart.snapshot().line_for_product(LUKA_FIGURE).unwrap().cart_item_id;
    session.cart.remove_all_from_cart(luka).await.unwrap();
    check(&session.cart);
    assert_eq!(session.cart.grand_total(), Price::new(19_800 + 12_000));
}

#[tokio::test]
async fn test_remove_one_twice_from_quantity_two() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;

    session.cart.add_to_cart(RIN_LEN_APPEND, 2).await.unwrap();
    let line = session.cart.items()[0].cart_item_id;

    session.cart.remove_from_cart(line).await.unwrap();
    let items = session.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 1);
    assert_eq!(items[0].total_price, Price::new(12_000));

    session.cart.remove_from_cart(line).await.unwrap();
    assert!(session.cart.is_empty());
    assert!(session.cart.snapshot().line(line).is_none());
}

#[tokio::test]
async fn test_remove_unknown_line_is_not_found() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;
    session.cart.add_to_cart(MIKU_V4X, 1).await.unwrap();
    let before = session.cart.snapshot();

    let err = session
        .cart
        .remove_from_cart(CartItemId::new(9_999))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert_eq!(session.cart.snapshot(), before);
}

#[tokio::test]
async fn test_add_without_user_sends_nothing() {
    let backend = FakeBackend::start().await;
    let session = session_with(&backend, MemoryTokenStore::new());

    let err = session.cart.add_to_cart(MIKU_V4X, 1).await.unwrap_err();
    assert!(matches!(err, CartError::LoginRequired));
    session.cart.fetch_cart().await.unwrap();
    assert!(session.cart.is_empty());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_subscribers_see_each_fetched_snapshot() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;
    let mut updates = session.cart.subscribe();

    session.cart.add_to_cart(MIKU_V4X, 1).await.unwrap();

    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().len(), 1);
}

#[tokio::test]
async fn test_cart_is_per_user() {
    let backend = FakeBackend::start().await;
    let miku = logged_in(&backend).await;
    miku.cart.add_to_cart(MIKU_V4X, 1).await.unwrap();

    backend.add_user("kaito@example.jp", "icecream", "Kaito");
    let kaito = session_with(&backend, MemoryTokenStore::new());
    kaito.auth.login("kaito@example.jp", "icecream").await.unwrap();
    kaito.cart.fetch_cart().await.unwrap();

    assert!(kaito.cart.is_empty());
    assert_eq!(backend.cart_lines(miku.auth.user_id().unwrap()).len(), 1);
}

#[tokio::test]
async fn test_logout_drops_cart_snapshot() {
    let backend = FakeBackend::start().await;
    let session = logged_in(&backend).await;
    let user_id = session.auth.user_id().unwrap();
    session.cart.add_to_cart(MIKU_V4X, 2).await.unwrap();
    let mut updates = session.cart.subscribe();

    session.auth.logout();
    backend.clear_requests();
    session.cart.fetch_cart().await.unwrap();

    assert!(!session.auth.is_logged_in());
    assert!(session.cart.is_empty());
    assert_eq!(session.cart.grand_total(), Price::ZERO);
    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().is_empty());
    assert!(backend.requests().is_empty());
    assert_eq!(backend.cart_lines(user_id).len(), 1);
}
