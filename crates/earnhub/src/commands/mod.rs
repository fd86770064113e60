//! Command handlers and the per-invocation context they share.

pub mod admin;
pub mod auth;
pub mod config_cmd;
pub mod offers;
pub mod trackings;
pub mod util;
pub mod wallet;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use earnhub_api::session::SessionState;
use earnhub_api::{ApiClient, Session, SessionContext, SessionEnd};
use earnhub_core::ClientConfig;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Profile, TokenStore};
use crate::error::CliError;

/// Everything a backend-facing command needs, resolved once per run.
pub struct Context {
    pub api: ApiClient,
    pub session: SessionContext,
    pub client_config: ClientConfig,
    pub tokens: TokenStore,
    pub profile: Profile,
    pub profile_name: String,
}

impl Context {
    pub fn build(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::load_config_or_default();
        let (profile_name, profile) = config::active_profile(global, &cfg)?;
        let client_config = config::resolve_profile(&profile, global)?;

        let tokens = TokenStore::new(profile_name.clone());
        let session = restore_session(&tokens);
        let api = ApiClient::new(
            client_config.api_url.as_str(),
            session.clone(),
            &client_config.transport(),
        )?;

        Ok(Self {
            api,
            session,
            client_config,
            tokens,
            profile,
            profile_name,
        })
    }

    pub fn require_session(&self) -> Result<Arc<Session>, CliError> {
        self.session.current().ok_or(CliError::NotLoggedIn)
    }

    /// Persist the current session token, unless it came from the
    /// environment.
    pub fn remember_token(&self) -> Result<(), CliError> {
        if TokenStore::is_env_override() {
            debug!("token supplied via environment, not storing");
            return Ok(());
        }
        if let Some(session) = self.session.current() {
            self.tokens.save(session.token())?;
        }
        Ok(())
    }

    pub fn forget_token(&self) {
        if TokenStore::is_env_override() {
            return;
        }
        match self.tokens.clear() {
            Ok(removed) => debug!(removed, profile = %self.profile_name, "stored token cleared"),
            Err(e) => warn!(error = %e, "could not clear stored token"),
        }
    }
}

fn restore_session(tokens: &TokenStore) -> SessionContext {
    let Some(token) = tokens.load() else {
        return SessionContext::new();
    };
    match Session::from_token(token) {
        Ok(session) if session.is_expired_at(Utc::now()) => {
            debug!("stored token has expired");
            SessionContext::new()
        }
        Ok(session) => SessionContext::with_session(session),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable stored token");
            SessionContext::new()
        }
    }
}

/// Route a backend-facing command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let result = match cmd {
        Command::Login(args) => auth::login(ctx, args, global).await,
        Command::Register(args) => auth::register(ctx, args, global).await,
        Command::Logout => auth::logout(ctx, global),
        Command::Whoami => auth::whoami(ctx, global).await,
        Command::Offers(args) => offers::handle(ctx, args, global).await,
        Command::Trackings(args) => trackings::handle(ctx, args, global).await,
        Command::Wallet(args) => wallet::handle(ctx, args, global).await,
        Command::Admin(args) => admin::handle(ctx, args, global).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    };

    // A 401 anywhere ends the session; the stored token is dead too.
    if matches!(ctx.session.state(), SessionState::Ended(SessionEnd::Expired)) {
        ctx.forget_token();
    }
    result
}
