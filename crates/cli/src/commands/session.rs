//! Sign in, sign out, and who is signed in.

use emporium_admin::AppError;
use emporium_admin::api::LoginRequest;
use emporium_admin::error::{clear_sentry_user, set_sentry_user};
use secrecy::SecretString;

use super::Context;

pub async fn login(ctx: &Context, username: String, password: String) -> Result<(), AppError> {
    let request = LoginRequest {
        username,
        password: SecretString::from(password),
    };
    let user = ctx.api.login(&request).await?;
    set_sentry_user(&user);

    tracing::info!(
        "Signed in as {} ({}){}",
        user.username,
        user.email,
        if user.is_staff { " [staff]" } else { "" }
    );
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<(), AppError> {
    ctx.api.logout()?;
    clear_sentry_user();
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<(), AppError> {
    match ctx.api.current_user()? {
        Some(user) => tracing::info!("{} <{}> (id {})", user.username, user.email, user.id),
        None => tracing::info!("Not signed in"),
    }
    Ok(())
}
