//! Wallet balance.

use std::fmt::Write as _;
use std::sync::Arc;

use earnhub_core::{Wallet, WalletView};

use crate::cli::{GlobalOpts, WalletArgs, WalletCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

fn detail(w: &Wallet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Balance:    {}", output::money(w.balance, &w.currency));
    let _ = writeln!(out, "Locked:     {}", output::money(w.locked, &w.currency));
    let _ = writeln!(out, "Available:  {}", output::money(w.available(), &w.currency));
    let _ = write!(out, "Updated:    {}", util::short_time(w.updated_at));
    out
}

pub async fn handle(ctx: &Context, args: WalletArgs, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.require_session()?;
    let view = WalletView::new(Arc::new(ctx.api.clone()), ctx.session.clone());

    match args.command {
        WalletCommand::Show => {
            let wallet = view.refresh().await?;
            let out = output::render_single(&global.output, wallet.as_ref(), detail, |w| {
                w.available().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
