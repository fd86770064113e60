//! Offer listing and click-through.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;

use earnhub_api::ApiClient;
use earnhub_core::{
    Activation, CardState, IgnoreReason, Offer, OfferBoard, OfferCardController, OfferId,
    TrackingStatus,
};

use crate::cli::{GlobalOpts, OffersArgs, OffersCommand};
use crate::error::{self, CliError};
use crate::navigator::TerminalNavigator;
use crate::output;

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct OfferListing {
    #[serde(flatten)]
    offer: Offer,
    status: Option<TrackingStatus>,
}

#[derive(Tabled)]
struct OfferRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Offer")]
    name: String,
    #[tabled(rename = "Reward")]
    reward: String,
    #[tabled(rename = "Status")]
    status: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: OffersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.require_session()?;
    let color = output::should_color(&global.color);
    let board = OfferBoard::new(
        Arc::new(ctx.api.clone()),
        ctx.session.clone(),
        Arc::new(TerminalNavigator::new(color)),
        &ctx.client_config,
    );
    board.load().await?;

    match args.command {
        OffersCommand::List => {
            let listings: Vec<OfferListing> = board
                .offers()
                .iter()
                .map(|o| OfferListing {
                    offer: Offer::clone(o),
                    status: board.status_of(&o.id),
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &listings,
                |l| OfferRow {
                    id: l.offer.id.to_string(),
                    name: l.offer.name.clone(),
                    reward: output::money(l.offer.amount, "INR"),
                    status: output::status_label(l.status, color),
                },
                |l| l.offer.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OffersCommand::Open { offer_id, wait } => open(&board, &offer_id, wait, global).await,
    }
}

async fn open(
    board: &OfferBoard<ApiClient>,
    offer_id: &str,
    wait: Option<u64>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let card = board
        .card(&OfferId::from(offer_id))
        .ok_or_else(|| CliError::not_found("offer", offer_id, "offers list"))?;

    match card.activate().await {
        Activation::Opened(_) => {
            output::notice(
                &format!("Click recorded for '{}'. Open the link above to continue.", card.offer().name),
                global.quiet,
            );
        }
        Activation::Reopened(_) => {}
        Activation::Failed(err) => return Err(error::from_card_error(offer_id, err)),
        Activation::Ignored(IgnoreReason::AlreadyCompleted) => {
            output::notice("You have already completed this offer.", global.quiet);
            return Ok(());
        }
        Activation::Ignored(IgnoreReason::MissingIdentity) => return Err(CliError::NotLoggedIn),
        Activation::Ignored(IgnoreReason::Superseded) => return Err(CliError::SessionExpired),
        Activation::Ignored(IgnoreReason::InFlight) => return Ok(()),
    }

    let pending = match card.state() {
        CardState::AwaitingCompletion(pending) => pending,
        CardState::Completed => {
            output::notice("Offer completed.", global.quiet);
            return Ok(());
        }
        _ => return Ok(()),
    };

    let Some(secs) = wait else {
        if pending.fallback_scheduled {
            output::notice(
                "This offer has no provider callback. Re-run with --wait to report \
                 completion once you have finished.",
                global.quiet,
            );
        }
        return Ok(());
    };

    board.start().await;
    let completed = wait_for_completion(&card, Duration::from_secs(secs), global).await;
    board.shutdown().await;

    if completed {
        output::notice("Offer completed.", global.quiet);
    } else {
        output::notice(
            "Not completed yet. Check later with: earnhub trackings list",
            global.quiet,
        );
    }
    Ok(())
}

async fn wait_for_completion(
    card: &OfferCardController<ApiClient>,
    limit: Duration,
    global: &GlobalOpts,
) -> bool {
    let spinner = (!global.quiet && std::io::stderr().is_terminal()).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Waiting for completion");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let mut rx = card.subscribe();
    let completed = matches!(
        tokio::time::timeout(limit, rx.wait_for(|s| *s == CardState::Completed)).await,
        Ok(Ok(_))
    );

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    completed
}
