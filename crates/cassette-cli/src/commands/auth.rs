//! Auth commands
//!
//! Login, registration, logout and session inspection.

use anyhow::Result;
use cassette_core::{inspect_token, AuthResponse, RegisterRequest};
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{print_info, print_single, print_success};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and store the session
    Login {
        /// Username
        username: String,

        /// Password (or set CASSETTE_PASSWORD env var)
        #[arg(long, env = "CASSETTE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in
    Register {
        /// Username
        username: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Password, at least 8 characters (or set CASSETTE_PASSWORD env var)
        #[arg(long, env = "CASSETTE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password again
        #[arg(long)]
        password_confirm: String,
    },

    /// Log out and forget the stored tokens
    Logout,

    /// Show whether you are logged in
    Status,
}

/// Session row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct SessionRow {
    #[tabled(rename = "Logged In")]
    pub logged_in: bool,
    #[tabled(rename = "User ID")]
    pub user_id: String,
    #[tabled(rename = "Access Expires")]
    pub expires: String,
    #[tabled(rename = "Can Refresh")]
    pub can_refresh: bool,
    #[tabled(rename = "Server")]
    pub server: String,
}

pub async fn execute(ctx: &Context, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { username, password } => login(ctx, &username, &password).await,
        AuthAction::Register {
            username,
            email,
            password,
            password_confirm,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
                password_confirm,
            };
            register(ctx, request).await
        }
        AuthAction::Logout => logout(ctx).await,
        AuthAction::Status => status(ctx),
    }
}

async fn login(ctx: &Context, username: &str, password: &str) -> Result<()> {
    let response = ctx.client.login(username, password).await?;
    ensure_access_issued(&response)?;
    print_success(&format!("Logged in as {}", username), ctx.quiet);
    Ok(())
}

async fn register(ctx: &Context, request: RegisterRequest) -> Result<()> {
    let response = ctx.client.register(&request).await?;
    ensure_access_issued(&response)?;
    let name = response
        .user
        .map(|u| u.username)
        .unwrap_or(request.username);
    print_success(&format!("Account created, logged in as {}", name), ctx.quiet);
    Ok(())
}

/// A stored session from an earlier login must not count as this one
fn ensure_access_issued(response: &AuthResponse) -> Result<()> {
    match response.access.as_deref() {
        Some(token) if !token.trim().is_empty() => Ok(()),
        _ => anyhow::bail!("Server response did not contain an access token"),
    }
}

async fn logout(ctx: &Context) -> Result<()> {
    if !ctx.client.is_authenticated() && ctx.client.credentials().refresh_token().is_none() {
        print_info("Not logged in.", ctx.quiet);
        return Ok(());
    }
    ctx.client.logout().await;
    print_success("Logged out", ctx.quiet);
    Ok(())
}

fn status(ctx: &Context) -> Result<()> {
    let credentials = ctx.client.credentials();
    let info = credentials.access_token().and_then(|token| inspect_token(&token));

    let expires = match &info {
        Some(info) => match info.expires_at {
            Some(at) if info.is_expired() => format!("{} (expired)", at.format("%Y-%m-%d %H:%M:%S UTC")),
            Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "-".to_string(),
        },
        None if credentials.is_authenticated() => "unknown (opaque token)".to_string(),
        None => "-".to_string(),
    };

    let row = SessionRow {
        logged_in: credentials.is_authenticated(),
        user_id: info
            .and_then(|i| i.user_id)
            .unwrap_or_else(|| "-".to_string()),
        expires,
        can_refresh: credentials.refresh_token().is_some(),
        server: ctx.config.server_url.clone(),
    };
    print_single(&row, ctx.format)
}
