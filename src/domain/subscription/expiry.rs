//! Expiry of a subscription term.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::foundation::Timestamp;

/// When the current plan lapses.
///
/// Serializes as `null` for `Never` and as an RFC 3339 string otherwise, so
/// the persisted document keeps the familiar `expiry_date` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// The plan has no time limit.
    Never,
    /// The plan lapses at this instant.
    At(Timestamp),
}

impl Expiry {
    /// Returns the expiry instant, if bounded.
    pub fn at(&self) -> Option<Timestamp> {
        match self {
            Expiry::Never => None,
            Expiry::At(ts) => Some(*ts),
        }
    }

    /// Returns true if the plan never expires.
    pub fn is_never(&self) -> bool {
        matches!(self, Expiry::Never)
    }

    /// Returns true if the expiry instant has been reached at `now`.
    pub fn has_passed(&self, now: &Timestamp) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(ts) => now >= ts,
        }
    }
}

impl From<Option<Timestamp>> for Expiry {
    fn from(value: Option<Timestamp>) -> Self {
        value.map_or(Expiry::Never, Expiry::At)
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.at().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<Timestamp>::deserialize(deserializer).map(Expiry::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        Timestamp::from_unix_secs(1_705_276_800).unwrap()
    }

    #[test]
    fn never_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Expiry::Never).unwrap(), "null");
    }

    #[test]
    fn bounded_expiry_roundtrips() {
        let expiry = Expiry::At(ts());
        let json = serde_json::to_string(&expiry).unwrap();
        let back: Expiry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expiry);
    }

    #[test]
    fn null_deserializes_as_never() {
        let expiry: Expiry = serde_json::from_str("null").unwrap();
        assert!(expiry.is_never());
    }

    #[test]
    fn has_passed_is_inclusive_of_the_instant() {
        let expiry = Expiry::At(ts());
        assert!(!expiry.has_passed(&ts().minus_secs(1)));
        assert!(expiry.has_passed(&ts()));
        assert!(!Expiry::Never.has_passed(&ts().plus_days(10_000)));
    }
}
