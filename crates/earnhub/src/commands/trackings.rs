//! The logged-in user's tracking history.

use std::sync::Arc;

use tabled::Tabled;

use earnhub_core::{OfferTrackingClient, TrackingRecord, UserId};

use crate::cli::{GlobalOpts, TrackingsArgs, TrackingsCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

#[derive(Tabled)]
struct TrackingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Offer")]
    offer: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Clicked")]
    clicked: String,
    #[tabled(rename = "Completed")]
    completed: String,
}

fn row(r: &TrackingRecord, color: bool) -> TrackingRow {
    TrackingRow {
        id: r.id.to_string(),
        offer: r
            .offer_name
            .clone()
            .unwrap_or_else(|| r.offer_id.to_string()),
        status: output::status_label(Some(r.status), color),
        clicked: util::short_time(r.clicked_at),
        completed: util::short_time(r.completed_at),
    }
}

pub async fn handle(
    ctx: &Context,
    args: TrackingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = ctx.require_session()?;
    let client = OfferTrackingClient::new(
        Arc::new(ctx.api.clone()),
        ctx.session.clone(),
        ctx.client_config.click_timeout,
    );

    match args.command {
        TrackingsCommand::List { status } => {
            let mut records = client
                .fetch_user_trackings(&UserId::from(session.user_id()))
                .await?;
            if let Some(filter) = status {
                records.retain(|r| r.status.as_ref() == filter.as_str());
            }
            records.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at));

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &records,
                |r| row(r, color),
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
