//! Orders, addresses, wishlist and the contact form.

use vocalocart_core::{
    AddressId, AddressRequest, ContactRequest, Email, OrderId, OrderStatus, ProductId,
};

use super::{CliError, Context};
use crate::output;

/// `vc-cli orders list`
pub async fn orders(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.user()?;
    let orders = ctx.api().orders_for_user(user.id).await?;
    output::emit(&output::orders(&orders));
    Ok(())
}

/// `vc-cli orders all` (admin)
pub async fn all_orders(ctx: &Context) -> Result<(), CliError> {
    ctx.user()?;
    let orders = ctx.api().all_orders().await?;
    output::emit(&output::orders(&orders));
    Ok(())
}

/// `vc-cli orders set-status` (admin): update, then show the refetched list.
pub async fn set_order_status(
    ctx: &Context,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), CliError> {
    ctx.user()?;
    ctx.api().update_order_status(id, status).await?;
    let orders = ctx.api().all_orders().await?;
    match orders.iter().find(|o| o.id == id) {
        Some(order) => output::emit(&format!("Order #{id}: {}", output::status_track(order))),
        None => output::emit(&format!("Order #{id} updated to {}", status.label())),
    }
    Ok(())
}

/// `vc-cli addresses list`
pub async fn addresses(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.user()?;
    let addresses = ctx.api().addresses(user.id).await?;
    output::emit(&output::addresses(&addresses));
    Ok(())
}

/// `vc-cli addresses add`
pub async fn add_address(ctx: &Context, request: AddressRequest) -> Result<(), CliError> {
    let user = ctx.user()?;
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(CliError::MissingFields(missing));
    }
    let address = ctx.api().create_address(user.id, &request).await?;
    output::emit(&format!("Saved address #{}", address.id));
    Ok(())
}

/// `vc-cli addresses remove`
pub async fn remove_address(ctx: &Context, id: AddressId) -> Result<(), CliError> {
    let user = ctx.user()?;
    ctx.api().delete_address(user.id, id).await?;
    output::emit(&format!("Removed address #{id}"));
    Ok(())
}

/// `vc-cli addresses set-default`
pub async fn set_default_address(ctx: &Context, id: AddressId) -> Result<(), CliError> {
    let user = ctx.user()?;
    ctx.api().set_default_address(user.id, id).await?;
    let addresses = ctx.api().addresses(user.id).await?;
    output::emit(&output::addresses(&addresses));
    Ok(())
}

/// `vc-cli wishlist list`
pub async fn wishlist(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.user()?;
    let items = ctx.api().wishlist(user.id).await?;
    output::emit(&output::wishlist(&items));
    Ok(())
}

/// `vc-cli wishlist add`
pub async fn add_to_wishlist(ctx: &Context, product: ProductId) -> Result<(), CliError> {
    let user = ctx.user()?;
    ctx.api().add_to_wishlist(user.id, product).await?;
    output::emit(&format!("Added product #{product} to your wishlist"));
    Ok(())
}

/// `vc-cli wishlist remove`
pub async fn remove_from_wishlist(ctx: &Context, product: ProductId) -> Result<(), CliError> {
    let user = ctx.user()?;
    ctx.api().remove_from_wishlist(user.id, product).await?;
    output::emit(&format!("Removed product #{product} from your wishlist"));
    Ok(())
}

/// `vc-cli contact`. Does not require a login.
pub async fn contact(
    ctx: &Context,
    name: String,
    email: &str,
    title: String,
    details: String,
) -> Result<(), CliError> {
    let request = ContactRequest {
        sender_name: name,
        sender_email: Email::parse(email)?,
        title,
        details,
    };
    request.validate()?;
    let response = ctx.api().send_contact(&request).await?;
    output::emit(
        response
            .message
            .as_deref()
            .unwrap_or("Thanks! Your message has been sent."),
    );
    Ok(())
}
