//! Type-safe identifier wrappers around [`Uuid`].
//!
//! A visitor's session and every short-lived effect shown to them (popups,
//! glitch bursts, tracked events) carry their own ID type, so a renderer
//! cannot dismiss a glitch with a popup's ID. IDs are UUID v7, so they
//! sort in the order the engine minted them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Declares an identifier for one kind of session or on-screen effect.
///
/// The identifier is minted by the engine when the thing it names comes
/// into being; renderers only ever echo it back.
macro_rules! engine_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh identifier. Later mints sort after earlier ones.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The underlying UUID, as sent to renderers.
            pub const fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

engine_id! {
    /// Unique identifier for a page session.
    SessionId
}

engine_id! {
    /// Unique identifier for an emitted revelation popup.
    RevelationId
}

engine_id! {
    /// Unique identifier for an entry in the collector's rolling event log.
    TrackedEventId
}

engine_id! {
    /// Unique identifier for a reality glitch burst.
    GlitchId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fresh_popups_get_fresh_ids() {
        let a = RevelationId::new();
        let b = RevelationId::new();
        assert_ne!(a, b);
        assert_ne!(a.as_uuid(), Uuid::nil());
    }

    #[test]
    fn later_glitches_sort_after_earlier_ones() {
        let first = GlitchId::new();
        let second = GlitchId::new();
        assert!(first < second);
    }

    #[test]
    fn renderers_see_a_bare_uuid_string() {
        let id = TrackedEventId::new();
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, serde_json::Value::String(id.as_uuid().to_string()));
        assert_eq!(id.to_string(), id.as_uuid().to_string());

        let echoed: TrackedEventId = serde_json::from_value(value).unwrap();
        assert_eq!(echoed, id);
    }

    #[test]
    fn session_id_rejects_garbage() {
        assert!(serde_json::from_str::<SessionId>(r#""not-a-uuid""#).is_err());
    }
}
