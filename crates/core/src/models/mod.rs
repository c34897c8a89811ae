//! Request and response payloads exchanged with the backend.
//!
//! Field names are camelCase on the wire. Optional fields the backend may
//! omit are `Option`s and are skipped when serializing requests.

pub mod address;
pub mod cart;
pub mod contact;
pub mod error;
pub mod order;
pub mod product;
pub mod user;
pub mod wishlist;

pub use address::{Address, AddressRequest};
pub use cart::{AddToCartRequest, CartLineItem, CartSnapshot};
pub use contact::{ContactError, ContactRequest, ContactResponse};
pub use error::ErrorBody;
pub use order::{Order, OrderItem, ShippingDetails};
pub use product::{Category, Page, Product, ProductSearch, SortDirection};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User};
pub use wishlist::WishlistItem;
