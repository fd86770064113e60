// ── Wire-to-domain conversion ──
//
// Maps `earnhub_api::models` DTOs into the canonical domain types. Shape
// checks happen in the gateway; the conversions here enforce the domain
// invariants (non-negative money, well-formed URLs) on top.

use earnhub_api::models::{
    ClickDto, OfferDto, TrackingDto, TrackingStatusDto, UserDto, WalletDto,
};
use rust_decimal::Decimal;
use tracing::warn;
use url::Url;

use crate::error::CoreError;
use crate::model::{
    ClickId, ClickRegistration, Offer, OfferId, Role, TrackingId, TrackingRecord, TrackingStatus,
    UserId, UserProfile, Wallet,
};

impl From<TrackingStatusDto> for TrackingStatus {
    fn from(s: TrackingStatusDto) -> Self {
        match s {
            TrackingStatusDto::Clicked => Self::Clicked,
            TrackingStatusDto::Started => Self::Started,
            TrackingStatusDto::Completed => Self::Completed,
            TrackingStatusDto::Failed => Self::Failed,
        }
    }
}

impl From<TrackingDto> for TrackingRecord {
    fn from(t: TrackingDto) -> Self {
        Self {
            id: TrackingId::from(t.id),
            user_id: UserId::from(t.user_id.id()),
            offer_id: OfferId::from(t.offer_id.id()),
            offer_name: t.offer_id.populated().and_then(|o| o.name.clone()),
            user_name: t.user_id.populated().and_then(|u| u.name.clone()),
            status: t.status.into(),
            click_id: t.click_id.filter(|c| !c.is_empty()).map(ClickId::from),
            clicked_at: t.clicked_at,
            completed_at: t.completed_at,
        }
    }
}

impl TryFrom<ClickDto> for ClickRegistration {
    type Error = CoreError;

    fn try_from(c: ClickDto) -> Result<Self, Self::Error> {
        if c.tracking_id.trim().is_empty() {
            return Err(CoreError::Decode {
                message: "click registration returned an empty trackingId".into(),
            });
        }
        // A malformed per-click URL would break webhook correlation silently,
        // so it is an error rather than a dropped field.
        let redirect_url = c
            .redirect_url
            .filter(|u| !u.trim().is_empty())
            .map(|u| {
                Url::parse(&u).map_err(|e| CoreError::Decode {
                    message: format!("invalid redirectUrl {u:?}: {e}"),
                })
            })
            .transpose()?;

        Ok(Self {
            tracking_id: TrackingId::from(c.tracking_id),
            click_id: c.click_id.filter(|c| !c.is_empty()).map(ClickId::from),
            redirect_url,
        })
    }
}

impl From<OfferDto> for Offer {
    fn from(o: OfferDto) -> Self {
        let static_url = o
            .posthook_url
            .as_deref()
            .or(o.provider_url.as_deref())
            .filter(|u| !u.trim().is_empty())
            .and_then(|raw| match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(offer_id = %o.id, url = raw, error = %e, "ignoring malformed offer URL");
                    None
                }
            });

        Self {
            id: OfferId::from(o.id),
            name: o.name,
            amount: o.amount.max(Decimal::ZERO),
            description: o.description.filter(|d| !d.is_empty()),
            logo: o.logo,
            static_url,
            active: o.is_active,
            order: o.order,
            created_at: o.created_at,
        }
    }
}

impl TryFrom<WalletDto> for Wallet {
    type Error = CoreError;

    fn try_from(w: WalletDto) -> Result<Self, Self::Error> {
        if w.balance < Decimal::ZERO {
            return Err(CoreError::Decode {
                message: format!("wallet balance is negative: {}", w.balance),
            });
        }
        if w.locked_amount < Decimal::ZERO {
            return Err(CoreError::Decode {
                message: format!("wallet locked amount is negative: {}", w.locked_amount),
            });
        }
        if w.locked_amount > w.balance {
            return Err(CoreError::Decode {
                message: format!(
                    "wallet locked amount {} exceeds balance {}",
                    w.locked_amount, w.balance
                ),
            });
        }

        Ok(Self {
            user_id: w.user_id.map(UserId::from),
            balance: w.balance,
            locked: w.locked_amount,
            currency: w.currency,
            updated_at: w.updated_at,
        })
    }
}

impl From<UserDto> for UserProfile {
    fn from(u: UserDto) -> Self {
        let role = match u.role.as_deref() {
            Some(r) if r.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        };
        Self {
            id: UserId::from(u.id),
            name: u.name,
            email: u.email,
            phone: u.phone,
            role,
            referral_code: u.referral_code,
            created_at: u.created_at,
        }
    }
}
