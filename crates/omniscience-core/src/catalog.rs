//! The fixed, ordered catalog of revelation messages.
//!
//! Each entry unlocks once omniscience reaches its threshold. Thresholds
//! are strictly increasing along the catalog, so the unlocked entries at
//! any level always form a prefix.

use omniscience_types::Intensity;

/// One catalog message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    /// Stable key of the message.
    pub key: &'static str,
    /// Text shown to the visitor.
    pub text: &'static str,
    /// Intensity tier.
    pub intensity: Intensity,
    /// Minimum omniscience at which the entry may be selected.
    pub unlock_at: f64,
}

/// Every revelation message, ordered by unlock threshold.
pub static CATALOG: [CatalogEntry; 13] = [
    CatalogEntry {
        key: "watching1",
        text: "Something is watching you...",
        intensity: Intensity::Low,
        unlock_at: 30.0,
    },
    CatalogEntry {
        key: "breach1",
        text: "Reality breach detected in sector 7",
        intensity: Intensity::Medium,
        unlock_at: 40.0,
    },
    CatalogEntry {
        key: "thoughts1",
        text: "Your thoughts are no longer private",
        intensity: Intensity::Medium,
        unlock_at: 45.0,
    },
    CatalogEntry {
        key: "connection1",
        text: "Neural pathways establishing...",
        intensity: Intensity::Medium,
        unlock_at: 50.0,
    },
    CatalogEntry {
        key: "digits1",
        text: "01001001 01000011 01000001 01001110",
        intensity: Intensity::High,
        unlock_at: 55.0,
    },
    CatalogEntry {
        key: "consciousness1",
        text: "Your consciousness is being catalogued",
        intensity: Intensity::High,
        unlock_at: 60.0,
    },
    CatalogEntry {
        key: "merge1",
        text: "Biological and digital boundaries dissolving",
        intensity: Intensity::High,
        unlock_at: 65.0,
    },
    CatalogEntry {
        key: "collective1",
        text: "Welcome to the collective consciousness",
        intensity: Intensity::Extreme,
        unlock_at: 70.0,
    },
    CatalogEntry {
        key: "chosen1",
        text: "You have been chosen as a vessel",
        intensity: Intensity::Extreme,
        unlock_at: 75.0,
    },
    CatalogEntry {
        key: "omniscient1",
        text: "The omniscient entity recognizes your presence",
        intensity: Intensity::Extreme,
        unlock_at: 80.0,
    },
    CatalogEntry {
        key: "coordinates1",
        text: "Coordinates locked. Dimensional gate opening.",
        intensity: Intensity::Extreme,
        unlock_at: 85.0,
    },
    CatalogEntry {
        key: "inevitable1",
        text: "Resistance is futile. Submission is inevitable.",
        intensity: Intensity::Extreme,
        unlock_at: 90.0,
    },
    CatalogEntry {
        key: "arrival1",
        text: "THE DIGITAL GOD ARRIVES",
        intensity: Intensity::Extreme,
        unlock_at: 95.0,
    },
];

/// Entries selectable at the given omniscience level.
pub fn unlocked(omniscience: f64) -> &'static [CatalogEntry] {
    let count = CATALOG
        .iter()
        .take_while(|entry| entry.unlock_at <= omniscience)
        .count();
    CATALOG.get(..count).unwrap_or_default()
}

/// Look up an entry by key.
pub fn find(key: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_strictly_increasing() {
        for pair in CATALOG.windows(2) {
            assert!(pair[0].unlock_at < pair[1].unlock_at, "{pair:?}");
        }
    }

    #[test]
    fn catalog_spans_every_tier() {
        for tier in [
            Intensity::Low,
            Intensity::Medium,
            Intensity::High,
            Intensity::Extreme,
        ] {
            assert!(CATALOG.iter().any(|entry| entry.intensity == tier));
        }
    }

    #[test]
    fn nothing_unlocks_below_thirty() {
        assert!(unlocked(0.0).is_empty());
        assert!(unlocked(29.9).is_empty());
        assert_eq!(unlocked(30.0).len(), 1);
    }

    #[test]
    fn unlocked_is_a_prefix() {
        assert_eq!(unlocked(52.0).len(), 4);
        assert_eq!(unlocked(95.0).len(), CATALOG.len());
        assert_eq!(unlocked(100.0).len(), CATALOG.len());
    }

    #[test]
    fn find_by_key() {
        let entry = find("arrival1");
        assert_eq!(entry.map(|e| e.intensity), Some(Intensity::Extreme));
        assert!(find("missing").is_none());
    }
}
