//! Plain-text rendering of API results.
//!
//! Formatting is kept separate from printing so it can be tested.

use std::fmt::Write as _;

use vocalocart_core::{
    Address, CartSnapshot, Category, Order, OrderStatus, Page, Product, User, WishlistItem,
};

/// Write a rendered block to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    println!("{}", text.trim_end());
}

#[must_use]
pub fn user(user: &User) -> String {
    let mut out = format!("{} <{}> (id {})", user.display_name(), user.email, user.id);
    if user.is_admin() {
        out.push_str(" [admin]");
    }
    if let Some(birthday) = user.birthday {
        let _ = write!(out, "\nbirthday: {birthday}");
    }
    out
}

#[must_use]
pub fn cart(snapshot: &CartSnapshot) -> String {
    if snapshot.is_empty() {
        return "Your cart is empty.".to_string();
    }
    let mut out = String::new();
    for line in snapshot.items() {
        let _ = writeln!(
            out,
            "#{:<5} {:<32} {:>10} x{:<3} {:>12}",
            line.cart_item_id, line.product_name, line.price, line.quantity, line.total_price
        );
    }
    let _ = write!(
        out,
        "{} item(s), total {}",
        snapshot.item_count(),
        snapshot.grand_total()
    );
    out
}

#[must_use]
pub fn products(page: &Page<Product>) -> String {
    if page.content.is_empty() {
        return "No products found.".to_string();
    }
    let mut out = String::new();
    for product in &page.content {
        let _ = writeln!(out, "{}", product_line(product));
    }
    let _ = write!(
        out,
        "page {} of {} ({} product(s))",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    );
    out
}

#[must_use]
pub fn product_line(product: &Product) -> String {
    let stock = if product.in_stock() {
        format!("{} in stock", product.stock_quantity)
    } else {
        "sold out".to_string()
    };
    let category = product.category_name.as_deref().unwrap_or("-");
    format!(
        "#{:<5} {:<32} {:>10}  {category} ({stock})",
        product.id, product.name, product.price
    )
}

#[must_use]
pub fn product_detail(product: &Product) -> String {
    let mut out = product_line(product);
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, "\n\n{description}");
    }
    out
}

#[must_use]
pub fn categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| format!("#{:<5} {}", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Progress track like `Payment > [Processing] > Preparing ...`.
#[must_use]
pub fn status_track(order: &Order) -> String {
    match order.status() {
        Some(OrderStatus::Canceled) => "Canceled".to_string(),
        Some(current) => OrderStatus::PROGRESS
            .iter()
            .map(|s| {
                if *s == current {
                    format!("[{}]", s.label())
                } else {
                    s.label().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" > "),
        None => order.status_label(),
    }
}

#[must_use]
pub fn orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet.".to_string();
    }
    let mut out = String::new();
    for order in orders {
        let placed = order
            .ordered_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let _ = writeln!(
            out,
            "Order #{}  {placed}  {}  {}",
            order.id,
            order.total_amount,
            status_track(order)
        );
        for item in &order.items {
            let _ = writeln!(
                out,
                "    {} x{}  {}",
                item.product_name,
                item.quantity,
                item.line_total()
            );
        }
        if order.shipping.is_present() {
            let _ = writeln!(out, "    ship to: {}", order.shipping.one_line());
        }
    }
    out
}

#[must_use]
pub fn addresses(addresses: &[Address]) -> String {
    if addresses.is_empty() {
        return "No saved addresses.".to_string();
    }
    addresses
        .iter()
        .map(|a| {
            let marker = if a.is_default { " (default)" } else { "" };
            format!(
                "#{:<5} {}, {} {} {}{marker}",
                a.id, a.recipient_name, a.line1, a.city, a.postal_code
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn wishlist(items: &[WishlistItem]) -> String {
    if items.is_empty() {
        return "Your wishlist is empty.".to_string();
    }
    items
        .iter()
        .map(|i| format!("#{:<5} {:<32} {:>10}", i.product_id, i.product_name, i.product_price))
        .collect::<Vec<_>>()
        .join("\n")
}
