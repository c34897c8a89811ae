//! Cart and checkout commands.

use vocalocart_client::Checkout;
use vocalocart_core::{AddressId, CartItemId, ProductId};

use super::{CliError, Context};
use crate::output;

/// `vc-cli cart show`
pub async fn show(ctx: &Context) -> Result<(), CliError> {
    ctx.user()?;
    ctx.cart.fetch_cart().await?;
    output::emit(&output::cart(&ctx.cart.snapshot()));
    Ok(())
}

/// `vc-cli cart add`
pub async fn add(ctx: &Context, product: ProductId, quantity: u32) -> Result<(), CliError> {
    ctx.cart.add_to_cart(product, quantity).await?;
    output::emit(&output::cart(&ctx.cart.snapshot()));
    Ok(())
}

/// `vc-cli cart remove`: one unit.
pub async fn remove(ctx: &Context, line: CartItemId) -> Result<(), CliError> {
    ctx.cart.remove_from_cart(line).await?;
    output::emit(&output::cart(&ctx.cart.snapshot()));
    Ok(())
}

/// `vc-cli cart remove-all`: the whole line.
pub async fn remove_all(ctx: &Context, line: CartItemId) -> Result<(), CliError> {
    ctx.cart.remove_all_from_cart(line).await?;
    output::emit(&output::cart(&ctx.cart.snapshot()));
    Ok(())
}

/// `vc-cli checkout`
pub async fn checkout(ctx: &Context, address: Option<AddressId>) -> Result<(), CliError> {
    ctx.user()?;
    ctx.cart.fetch_cart().await?;

    let mut checkout = Checkout::new(ctx.auth.clone(), ctx.cart.clone());
    checkout.load_addresses().await?;
    if let Some(id) = address {
        checkout.select_address(id)?;
    }

    let summary = checkout.summary();
    let ship_to = summary.address.as_ref().map_or_else(
        || "default address".to_string(),
        |a| format!("{}, {}", a.recipient_name, a.city),
    );
    output::emit(&format!(
        "Placing order: {} item(s), {} -> {ship_to}",
        summary.item_count, summary.grand_total
    ));

    let order = checkout.place_order(None).await?;
    output::emit(&format!(
        "Order #{} placed, total {}. Status: {}",
        order.id,
        order.total_amount,
        order.status_label()
    ));
    Ok(())
}
