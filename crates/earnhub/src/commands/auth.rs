//! Login, registration, logout, and identity.

use dialoguer::Input;

use earnhub_api::models::RegisterRequest;
use earnhub_core::UserProfile;
use secrecy::ExposeSecret;

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

pub async fn login(ctx: &Context, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let email = match args.email.or_else(|| ctx.profile.email.clone()) {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };
    let password = util::read_password(args.password_stdin)?;

    ctx.api.login(email.trim(), &password).await?;
    ctx.remember_token()?;

    let who = ctx
        .session
        .current()
        .and_then(|s| s.profile().and_then(|p| p.name.clone()))
        .unwrap_or(email);
    output::notice(&format!("Logged in as {who}"), global.quiet);
    Ok(())
}

pub async fn register(
    ctx: &Context,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = util::read_password(args.password_stdin)?;
    let request = RegisterRequest {
        name: args.name,
        email: args.email,
        password: password.expose_secret().to_owned(),
        phone: args.phone,
        referral_code: args.referral_code,
    };

    let user = ctx.api.register(&request).await?;
    if ctx.session.is_authenticated() {
        ctx.remember_token()?;
        output::notice("Account created and logged in", global.quiet);
    } else {
        output::notice("Account created. Run: earnhub login", global.quiet);
    }

    let profile = UserProfile::from(user);
    let out = output::render_single(&global.output, &profile, detail, |p| p.id.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn logout(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.api.logout();
    if crate::config::TokenStore::is_env_override() {
        output::notice("Token comes from EARNHUB_TOKEN; unset it to log out", global.quiet);
        return Ok(());
    }
    if ctx.tokens.clear()? {
        output::notice("Logged out", global.quiet);
    } else {
        output::notice("No stored session", global.quiet);
    }
    Ok(())
}

pub async fn whoami(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.require_session()?;
    let profile = UserProfile::from(ctx.api.refresh_profile().await?);

    let out = output::render_single(&global.output, &profile, detail, |p| p.id.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(p: &UserProfile) -> String {
    let mut lines = vec![
        format!("ID:        {}", p.id),
        format!("Name:      {}", p.display_name()),
        format!("Role:      {}", p.role),
    ];
    if let Some(ref email) = p.email {
        lines.push(format!("Email:     {email}"));
    }
    if let Some(ref phone) = p.phone {
        lines.push(format!("Phone:     {phone}"));
    }
    if let Some(ref code) = p.referral_code {
        lines.push(format!("Referral:  {code}"));
    }
    lines.join("\n")
}
