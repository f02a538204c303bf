use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: u32,
    pub category: String,
    pub colors: u32,
    pub description: Option<String>,
    pub image: Option<String>,
    pub hover_image: Option<String>,
    pub is_new: bool,
    pub is_trending: bool,
    pub is_best_seller: bool,
}

/// A catalog entry before the store has assigned it an id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: u32,
    pub category: String,
    pub colors: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub hover_image: Option<String>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default)]
    pub is_best_seller: bool,
}

impl NewProduct {
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            category: self.category,
            colors: self.colors,
            description: self.description,
            image: self.image,
            hover_image: self.hover_image,
            is_new: self.is_new,
            is_trending: self.is_trending,
            is_best_seller: self.is_best_seller,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String, // argon2 encoded hash
}

impl User {
    #[allow(dead_code)]
    pub fn verify_credential(&self, candidate: &str) -> bool {
        argon2::verify_encoded(&self.password, candidate.as_bytes()).unwrap_or(false)
    }
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
