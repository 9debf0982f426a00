use serde::{Deserialize, Serialize};

/// Category used for any feature value the source data leaves empty.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub item_id: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "placeID")]
    pub item_id: String,
    pub rating: f32,
    #[serde(default)]
    pub food_rating: Option<u8>,
    #[serde(default)]
    pub service_rating: Option<u8>,
}

impl Rating {
    pub fn new(user_id: &str, item_id: &str, rating: f32) -> Self {
        Self {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            rating,
            food_rating: None,
            service_rating: None,
        }
    }

    pub fn is_positive(&self, threshold: f32) -> bool {
        self.rating > threshold
    }
}

/// One row of categorical item attributes, one value per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFeatures {
    pub item_id: String,
    pub price: Option<String>,
    pub alcohol: Option<String>,
    pub ambience: Option<String>,
    pub cuisine: Option<String>,
}

impl ItemFeatures {
    pub fn new(item_id: &str, price: &str, alcohol: &str, ambience: &str, cuisine: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            price: Some(price.to_string()),
            alcohol: Some(alcohol.to_string()),
            ambience: Some(ambience.to_string()),
            cuisine: Some(cuisine.to_string()),
        }
    }
}
