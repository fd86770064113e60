//! Administrator commands: users, all trackings, offer management.

use tabled::Tabled;

use earnhub_api::models::{CreateAdminRequest, CreateOfferRequest};
use earnhub_core::{Offer, TrackingRecord, UserProfile};
use secrecy::ExposeSecret;

use crate::cli::{
    AdminArgs, AdminCommand, AdminOffersCommand, AdminTrackingsCommand, AdminUsersCommand,
    GlobalOpts, StatusFilter,
};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Joined")]
    joined: String,
}

fn user_row(u: &UserProfile) -> UserRow {
    UserRow {
        id: u.id.to_string(),
        name: u.display_name().to_owned(),
        email: u.email.clone().unwrap_or_default(),
        role: u.role.to_string(),
        joined: util::short_time(u.created_at),
    }
}

#[derive(Tabled)]
struct AdminTrackingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Offer")]
    offer: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Clicked")]
    clicked: String,
}

#[derive(Tabled)]
struct AdminOfferRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Order")]
    order: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Reward")]
    reward: String,
    #[tabled(rename = "Active")]
    active: String,
}

fn offer_row(o: &Offer) -> AdminOfferRow {
    AdminOfferRow {
        id: o.id.to_string(),
        order: o.order,
        name: o.name.clone(),
        reward: output::money(o.amount, "INR"),
        active: if o.active { "yes" } else { "no" }.into(),
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: AdminArgs, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.require_session()?;
    match args.command {
        AdminCommand::Users(users) => match users.command {
            AdminUsersCommand::List { page, search } => {
                let data = ctx
                    .api
                    .list_users(page.page, page.limit, search.as_deref())
                    .await?;
                let users: Vec<UserProfile> =
                    data.users.into_iter().map(UserProfile::from).collect();
                let out = output::render_list(&global.output, &users, user_row, |u| {
                    u.id.to_string()
                });
                output::print_output(&out, global.quiet);
                if let Some(p) = data.pagination {
                    output::notice(
                        &format!("Page {} of {} ({} users)", p.page, p.total_pages, p.total),
                        global.quiet,
                    );
                }
                Ok(())
            }

            AdminUsersCommand::CreateAdmin {
                name,
                email,
                password_stdin,
            } => {
                let password = util::read_password(password_stdin)?;
                let request = CreateAdminRequest {
                    name,
                    email,
                    password: password.expose_secret().to_owned(),
                };
                let user = UserProfile::from(ctx.api.create_admin(&request).await?);
                output::notice(&format!("Created admin {}", user.id), global.quiet);
                let out = output::render_list(
                    &global.output,
                    std::slice::from_ref(&user),
                    user_row,
                    |u| u.id.to_string(),
                );
                output::print_output(&out, global.quiet);
                Ok(())
            }
        },

        AdminCommand::Trackings(trackings) => match trackings.command {
            AdminTrackingsCommand::List { page, status } => {
                let records: Vec<TrackingRecord> = ctx
                    .api
                    .list_trackings(status.map(StatusFilter::as_str), page.page, page.limit)
                    .await?
                    .into_iter()
                    .map(TrackingRecord::from)
                    .collect();
                let color = output::should_color(&global.color);
                let out = output::render_list(
                    &global.output,
                    &records,
                    |r| AdminTrackingRow {
                        id: r.id.to_string(),
                        user: r.user_name.clone().unwrap_or_else(|| r.user_id.to_string()),
                        offer: r
                            .offer_name
                            .clone()
                            .unwrap_or_else(|| r.offer_id.to_string()),
                        status: output::status_label(Some(r.status), color),
                        clicked: util::short_time(r.clicked_at),
                    },
                    |r| r.id.to_string(),
                );
                output::print_output(&out, global.quiet);
                Ok(())
            }
        },

        AdminCommand::Offers(offers) => match offers.command {
            AdminOffersCommand::List => {
                let mut offers: Vec<Offer> = ctx
                    .api
                    .list_offers(false)
                    .await?
                    .into_iter()
                    .map(Offer::from)
                    .collect();
                offers.sort_by_key(|o| o.order);
                let out = output::render_list(&global.output, &offers, offer_row, |o| {
                    o.id.to_string()
                });
                output::print_output(&out, global.quiet);
                Ok(())
            }

            AdminOffersCommand::Create {
                name,
                amount,
                description,
                provider_url,
                posthook_url,
                order,
                inactive,
            } => {
                if amount.is_sign_negative() {
                    return Err(CliError::Validation {
                        field: "amount".into(),
                        reason: "must not be negative".into(),
                    });
                }
                let request = CreateOfferRequest {
                    name,
                    amount,
                    description,
                    provider_url,
                    posthook_url,
                    is_active: !inactive,
                    order,
                    ..CreateOfferRequest::default()
                };
                let offer = Offer::from(ctx.api.create_offer(&request).await?);
                output::notice(&format!("Created offer {}", offer.id), global.quiet);
                let out = output::render_list(
                    &global.output,
                    std::slice::from_ref(&offer),
                    offer_row,
                    |o| o.id.to_string(),
                );
                output::print_output(&out, global.quiet);
                Ok(())
            }

            AdminOffersCommand::Delete { offer_id } => {
                if !util::confirm(&format!("Delete offer {offer_id}?"), global.yes)? {
                    return Ok(());
                }
                match ctx.api.delete_offer(&offer_id).await {
                    Ok(()) => {
                        output::notice(&format!("Deleted offer {offer_id}"), global.quiet);
                        Ok(())
                    }
                    Err(e) if e.is_not_found() => Err(CliError::not_found(
                        "offer",
                        &offer_id,
                        "admin offers list",
                    )),
                    Err(e) => Err(e.into()),
                }
            }
        },
    }
}
