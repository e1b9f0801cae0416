//! # Preferences
//!
//! Dietary restrictions, allergies and likes/dislikes for one session, plus
//! the keyword extractors used when no structured reply is available.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Dietary keywords recognised in free text
pub const DIET_KEYWORDS: [&str; 5] = ["vegan", "vegetarian", "gluten-free", "dairy-free", "keto"];

const ALLERGY_TRIGGERS: [&str; 2] = ["allergic", "allergy"];

const PANTRY_STOPWORDS: [&str; 6] = ["pantry", "items", "please", "could", "would", "add"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceCategory {
    DietaryRestriction,
    Allergy,
    FavoriteCuisine,
    DislikedFood,
}

impl PreferenceCategory {
    pub const ALL: [PreferenceCategory; 4] = [
        PreferenceCategory::DietaryRestriction,
        PreferenceCategory::Allergy,
        PreferenceCategory::FavoriteCuisine,
        PreferenceCategory::DislikedFood,
    ];

    /// Label used in the prompt summary
    pub fn label(&self) -> &'static str {
        match self {
            Self::DietaryRestriction => "Dietary",
            Self::Allergy => "Allergies",
            Self::FavoriteCuisine => "Likes",
            Self::DislikedFood => "Dislikes",
        }
    }
}

impl fmt::Display for PreferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DietaryRestriction => "dietary_restrictions",
            Self::Allergy => "allergies",
            Self::FavoriteCuisine => "favorite_cuisines",
            Self::DislikedFood => "disliked_foods",
        };
        write!(f, "{}", name)
    }
}

/// Extracted preference fields, as returned by the preferences step's
/// structured output or by the keyword extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub favorite_cuisines: Vec<String>,
    #[serde(default)]
    pub disliked_foods: Vec<String>,
    #[serde(default, deserialize_with = "lenient_calories")]
    pub calorie_target: Option<u32>,
}

/// Accepts `1800`, `1800.0` or `"1800"`; anything else reads as no target
/// instead of failing the whole update.
fn lenient_calories<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let calories = value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    Ok(calories
        .filter(|n| n.is_finite() && *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32))
}

impl PreferenceUpdate {
    pub fn is_empty(&self) -> bool {
        self.dietary_restrictions.is_empty()
            && self.allergies.is_empty()
            && self.favorite_cuisines.is_empty()
            && self.disliked_foods.is_empty()
            && self.calorie_target.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub favorite_cuisines: Vec<String>,
    pub disliked_foods: Vec<String>,
    pub calorie_target: Option<u32>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self, category: PreferenceCategory) -> &[String] {
        match category {
            PreferenceCategory::DietaryRestriction => &self.dietary_restrictions,
            PreferenceCategory::Allergy => &self.allergies,
            PreferenceCategory::FavoriteCuisine => &self.favorite_cuisines,
            PreferenceCategory::DislikedFood => &self.disliked_foods,
        }
    }

    fn values_mut(&mut self, category: PreferenceCategory) -> &mut Vec<String> {
        match category {
            PreferenceCategory::DietaryRestriction => &mut self.dietary_restrictions,
            PreferenceCategory::Allergy => &mut self.allergies,
            PreferenceCategory::FavoriteCuisine => &mut self.favorite_cuisines,
            PreferenceCategory::DislikedFood => &mut self.disliked_foods,
        }
    }

    /// Add a value to a category. Returns false for blanks and duplicates.
    pub fn add(&mut self, category: PreferenceCategory, value: &str) -> bool {
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            return false;
        }
        let values = self.values_mut(category);
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    pub fn set_calorie_target(&mut self, calories: u32) {
        self.calorie_target = Some(calories);
    }

    /// Merge an update and return the categories that actually changed.
    pub fn merge(&mut self, update: &PreferenceUpdate) -> Vec<String> {
        let mut updated = Vec::new();
        let pairs = [
            (PreferenceCategory::DietaryRestriction, &update.dietary_restrictions),
            (PreferenceCategory::Allergy, &update.allergies),
            (PreferenceCategory::FavoriteCuisine, &update.favorite_cuisines),
            (PreferenceCategory::DislikedFood, &update.disliked_foods),
        ];
        for (category, values) in pairs {
            let mut changed = false;
            for value in values {
                changed |= self.add(category, value);
            }
            if changed {
                updated.push(category.to_string());
            }
        }
        if let Some(calories) = update.calorie_target {
            if self.calorie_target != Some(calories) {
                self.set_calorie_target(calories);
                updated.push("calorie_target".to_string());
            }
        }
        updated
    }

    pub fn is_empty(&self) -> bool {
        PreferenceCategory::ALL
            .iter()
            .all(|c| self.values(*c).is_empty())
            && self.calorie_target.is_none()
    }

    /// Formatted summary injected into prompts
    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = PreferenceCategory::ALL
            .iter()
            .filter(|c| !self.values(**c).is_empty())
            .map(|c| format!("{}: {}", c.label(), self.values(*c).join(", ")))
            .collect();
        if let Some(calories) = self.calorie_target {
            lines.push(format!("Calories: {}/day", calories));
        }

        if lines.is_empty() {
            return "No preferences set".to_string();
        }
        format!(
            "👤 User Preferences:\n{}",
            lines
                .iter()
                .map(|l| format!("  • {}", l))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}

// ============================================================================
// Keyword extraction
// ============================================================================

/// Pull dietary keywords and allergens out of free text.
///
/// Allergens are the word two positions after "allergic"/"allergy"
/// ("allergic to peanuts" -> "peanuts").
pub fn extract_keywords(text: &str) -> PreferenceUpdate {
    let lower = text.to_lowercase();
    let mut update = PreferenceUpdate::default();

    for diet in DIET_KEYWORDS {
        if lower.contains(diet) && !update.dietary_restrictions.iter().any(|d| d == diet) {
            update.dietary_restrictions.push(diet.to_string());
        }
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if !ALLERGY_TRIGGERS.contains(word) {
            continue;
        }
        if let Some(next) = words.get(i + 2) {
            let allergen = strip_punctuation(next);
            if !allergen.is_empty() && !update.allergies.iter().any(|a| a == allergen) {
                update.allergies.push(allergen.to_string());
            }
        }
    }

    update
}

/// Items mentioned in an "add ... pantry" request, for plain chat mode.
pub fn extract_pantry_items(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    if !(lower.contains("add") && lower.contains("pantry")) {
        return Vec::new();
    }

    let mut items: Vec<String> = Vec::new();
    for word in text.replace(',', " ").split_whitespace() {
        let cleaned = strip_punctuation(word).to_lowercase();
        if cleaned.chars().count() > 3
            && !PANTRY_STOPWORDS.contains(&cleaned.as_str())
            && !items.contains(&cleaned)
        {
            items.push(cleaned);
        }
    }
    items
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?'))
}
