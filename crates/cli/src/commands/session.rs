//! Login, registration and session inspection.

use chrono::NaiveDate;
use vocalocart_client::RegisterOptions;

use super::{CliError, Context};
use crate::output;

/// `vc-cli login`
pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<(), CliError> {
    let user = ctx.auth.login(email, password).await?;
    output::emit(&format!("Logged in as {}", user.display_name()));
    Ok(())
}

/// `vc-cli register`
pub async fn register(
    ctx: &Context,
    email: &str,
    password: &str,
    nickname: Option<String>,
    birthday: Option<NaiveDate>,
) -> Result<(), CliError> {
    let user = ctx
        .auth
        .register(email, password, RegisterOptions { nickname, birthday })
        .await?;
    output::emit(&format!("Welcome, {}!", user.display_name()));
    Ok(())
}

/// `vc-cli logout`
pub fn logout(ctx: &Context) {
    ctx.auth.logout();
    output::emit("Logged out.");
}

/// `vc-cli whoami`
pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    match ctx.auth.refresh().await? {
        Some(user) => output::emit(&output::user(&user)),
        None => return Err(CliError::LoginRequired),
    }
    Ok(())
}
