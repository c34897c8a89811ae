//! Product browsing.

use vocalocart_core::{ProductId, ProductSearch};

use super::{CliError, Context};
use crate::output;

/// `vc-cli products`
pub async fn search(ctx: &Context, search: &ProductSearch) -> Result<(), CliError> {
    let page = ctx.api().search_products(search).await?;
    output::emit(&output::products(&page));
    Ok(())
}

/// `vc-cli product <ID>`
pub async fn show(ctx: &Context, id: ProductId) -> Result<(), CliError> {
    let product = ctx.api().product(id).await?;
    output::emit(&output::product_detail(&product));
    Ok(())
}

/// `vc-cli categories`
pub async fn categories(ctx: &Context) -> Result<(), CliError> {
    let categories = ctx.api().categories().await?;
    output::emit(&output::categories(&categories));
    Ok(())
}
