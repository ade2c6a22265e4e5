use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParseEnumError, iso, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceCategory {
    Housekeeping,
    #[serde(rename = "Food & Drinks")]
    FoodAndDrinks,
    Wellness,
    Transport,
    Conference,
    Other,
}

impl ServiceCategory {
    pub const ALL: [Self; 6] = [
        Self::Housekeeping,
        Self::FoodAndDrinks,
        Self::Wellness,
        Self::Transport,
        Self::Conference,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Housekeeping => "Housekeeping",
            Self::FoodAndDrinks => "Food & Drinks",
            Self::Wellness => "Wellness",
            Self::Transport => "Transport",
            Self::Conference => "Conference",
            Self::Other => "Other",
        }
    }
}

/// Verb on the guest-facing call to action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionLabel {
    Book,
    #[default]
    Request,
    Add,
}

impl ActionLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::Request => "Request",
            Self::Add => "Add",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsellRules {
    pub show_pre_arrival: bool,
    pub show_when_late_checkout_not_bought: bool,
}

/// A bookable or requestable offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: ServiceCategory,
    pub price_text: String,
    pub active: bool,
    #[serde(with = "iso")]
    pub created_at: DateTime<Utc>,
    pub action_label: ActionLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsell_rules: Option<UpsellRules>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Service {
    /// Request type recorded when a guest books this service.
    #[must_use]
    pub fn request_type(&self) -> String {
        format!("Service: {}", self.name)
    }

    /// Whether the guest must pick one of the availability slots.
    #[must_use]
    pub fn has_slots(&self) -> bool {
        self.availability.as_ref().is_some_and(|slots| !slots.is_empty())
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "housekeeping" => Ok(Self::Housekeeping),
            "food & drinks" | "food" | "food-and-drinks" => Ok(Self::FoodAndDrinks),
            "wellness" => Ok(Self::Wellness),
            "transport" => Ok(Self::Transport),
            "conference" => Ok(Self::Conference),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "category",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names() {
        assert_eq!(
            serde_json::to_string(&ServiceCategory::FoodAndDrinks).unwrap(),
            "\"Food & Drinks\""
        );
        assert_eq!(
            serde_json::from_str::<ServiceCategory>("\"Wellness\"").unwrap(),
            ServiceCategory::Wellness
        );
        assert!(serde_json::from_str::<ServiceCategory>("\"wellness\"").is_err());
    }

    #[test]
    fn category_cli_parsing_is_lenient() {
        assert_eq!(
            ServiceCategory::from_str("food").unwrap(),
            ServiceCategory::FoodAndDrinks
        );
        assert_eq!(
            ServiceCategory::from_str(" Transport ").unwrap(),
            ServiceCategory::Transport
        );
        assert!(ServiceCategory::from_str("golf").is_err());
    }

    #[test]
    fn action_label_defaults_to_request() {
        assert_eq!(ActionLabel::default(), ActionLabel::Request);
        assert_eq!(ActionLabel::Book.to_string(), "Book");
    }
}
