// ── Core identity types ──
//
// The backend hands out opaque string ids (Mongo ObjectIds in practice).
// Each entity gets its own newtype so an offer id can never be passed
// where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` for empty or whitespace-only ids.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of an offer.
    OfferId
);
string_id!(
    /// Identifier of a user account.
    UserId
);
string_id!(
    /// Identifier of one tracking record (one click-through).
    TrackingId
);
string_id!(
    /// Click-correlation id embedded in the redirect URL so a provider
    /// callback can be matched back to its tracking record.
    ClickId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(OfferId::from("").is_blank());
        assert!(OfferId::from("   ").is_blank());
        assert!(!OfferId::from("6650a1").is_blank());
    }

    #[test]
    fn serde_is_transparent() {
        let id: UserId = serde_json::from_str("\"u-1\"").expect("deserialize");
        assert_eq!(id.as_str(), "u-1");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"u-1\"");
    }

    #[test]
    fn display_matches_inner() {
        assert_eq!(ClickId::new("clk-9").to_string(), "clk-9");
    }
}
