//! Intent tags and classification results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminated intent produced by the classifier.
///
/// `Greeting` is matched locally against a fixed phrase list before any model
/// call; the remaining tags come from the LLM. Unrecognized tags deserialize
/// to `Unknown` rather than failing the whole classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    Greeting,
    Search,
    Details,
    More,
    Market,
    BuyingGuide,
    Compare,
    Purchase,
    DistrictSearch,
    PropertyPrice,
    AvailabilityCheck,
    Reset,
    #[serde(other)]
    Unknown,
}

impl IntentTag {
    /// Filter-bearing intents that run the extractor and are guarded by the
    /// continue-vs-reset confirmation gate.
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::Search | Self::AvailabilityCheck | Self::DistrictSearch | Self::PropertyPrice
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Search => "search",
            Self::Details => "details",
            Self::More => "more",
            Self::Market => "market",
            Self::BuyingGuide => "buying_guide",
            Self::Compare => "compare",
            Self::Purchase => "purchase",
            Self::DistrictSearch => "district_search",
            Self::PropertyPrice => "property_price",
            Self::AvailabilityCheck => "availability_check",
            Self::Reset => "reset",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of a listing a `details` request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    Price,
    Features,
    Location,
    Payment,
}

/// Structured classifier output, decoded from the model's JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub intent: IntentTag,
    #[serde(default)]
    pub detail_requested: Option<DetailKind>,
    #[serde(default)]
    pub reset_requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_round_trips_snake_case() {
        let json = serde_json::to_string(&IntentTag::BuyingGuide).unwrap();
        assert_eq!(json, "\"buying_guide\"");
        let back: IntentTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IntentTag::BuyingGuide);
    }

    #[test]
    fn unrecognized_intent_becomes_unknown() {
        let tag: IntentTag = serde_json::from_str("\"sell_my_house\"").unwrap();
        assert_eq!(tag, IntentTag::Unknown);
    }

    #[test]
    fn classification_defaults_optional_fields() {
        let c: Classification = serde_json::from_str(r#"{"intent": "search"}"#).unwrap();
        assert_eq!(c.intent, IntentTag::Search);
        assert!(c.detail_requested.is_none());
        assert!(!c.reset_requested);
    }

    #[test]
    fn sensitive_intents() {
        assert!(IntentTag::Search.is_sensitive());
        assert!(IntentTag::DistrictSearch.is_sensitive());
        assert!(IntentTag::PropertyPrice.is_sensitive());
        assert!(IntentTag::AvailabilityCheck.is_sensitive());
        assert!(!IntentTag::Details.is_sensitive());
        assert!(!IntentTag::More.is_sensitive());
    }
}
