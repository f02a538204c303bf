use std::collections::HashMap;
use std::sync::RwLock;

use argon2::Config as ArgonConfig;
use rand::Rng;

use crate::error::StorageError;
use crate::models::{NewProduct, NewUser, Product, User};

pub const DEFAULT_FEATURED_LIMIT: usize = 6;
pub const DEFAULT_TRENDING_LIMIT: usize = 3;

/// Read access to the catalog plus the user records the storage layer owns.
///
/// Callers always get owned copies back; nothing handed out aliases store state.
/// Handlers only see a `dyn Storage`, so another backend can be dropped in.
pub trait Storage: Send + Sync {
    fn all_products(&self) -> Result<Vec<Product>, StorageError>;
    fn product_by_id(&self, id: i64) -> Result<Option<Product>, StorageError>;
    fn products_by_category(&self, category: &str) -> Result<Vec<Product>, StorageError>;
    /// First `limit` products in catalog order. Positional, not flag driven.
    fn featured_products(&self, limit: Option<usize>) -> Result<Vec<Product>, StorageError>;
    fn trending_products(&self, limit: Option<usize>) -> Result<Vec<Product>, StorageError>;
    /// Products whose name or category contains `query`, ignoring case.
    fn search_products(&self, query: &str) -> Result<Vec<Product>, StorageError>;

    // No route exposes users yet.
    #[allow(dead_code)]
    fn user(&self, id: i64) -> Result<Option<User>, StorageError>;
    #[allow(dead_code)]
    fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
    #[allow(dead_code)]
    fn create_user(&self, new_user: NewUser) -> Result<User, StorageError>;
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<i64, User>,
    last_id: i64,
}

pub struct MemStorage {
    // seeded once, never written afterwards
    products: Vec<Product>,
    users: RwLock<UserTable>,
}

impl MemStorage {
    /// Builds a store over `seed`, assigning ids from 1 in order.
    pub fn with_products(seed: Vec<NewProduct>) -> Result<Self, StorageError> {
        let mut products = Vec::with_capacity(seed.len());
        for (product, id) in seed.into_iter().zip(1..) {
            if product.colors == 0 {
                return Err(StorageError::InvalidProduct {
                    name: product.name,
                    reason: "colors must be at least 1",
                });
            }
            products.push(product.into_product(id));
        }
        Ok(MemStorage { products, users: RwLock::new(UserTable::default()) })
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    fn filter_products<F>(&self, pred: F) -> Vec<Product>
    where
        F: Fn(&Product) -> bool,
    {
        self.products.iter().filter(|&p| pred(p)).cloned().collect()
    }
}

#[cfg(test)]
impl MemStorage {
    pub fn new() -> Self {
        Self::with_products(sample_products()).expect("sample catalog is valid")
    }
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

impl Storage for MemStorage {
    fn all_products(&self) -> Result<Vec<Product>, StorageError> {
        Ok(self.products.clone())
    }

    fn product_by_id(&self, id: i64) -> Result<Option<Product>, StorageError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    fn products_by_category(&self, category: &str) -> Result<Vec<Product>, StorageError> {
        let needle = category.to_lowercase();
        Ok(self.filter_products(|p| contains_ignore_case(&p.category, &needle)))
    }

    fn featured_products(&self, limit: Option<usize>) -> Result<Vec<Product>, StorageError> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
        Ok(self.products.iter().take(limit).cloned().collect())
    }

    fn trending_products(&self, limit: Option<usize>) -> Result<Vec<Product>, StorageError> {
        let limit = limit.unwrap_or(DEFAULT_TRENDING_LIMIT);
        Ok(self
            .products
            .iter()
            .filter(|p| p.is_trending)
            .take(limit)
            .cloned()
            .collect())
    }

    fn search_products(&self, query: &str) -> Result<Vec<Product>, StorageError> {
        let needle = query.to_lowercase();
        Ok(self.filter_products(|p| {
            contains_ignore_case(&p.name, &needle) || contains_ignore_case(&p.category, &needle)
        }))
    }

    #[allow(dead_code)]
    fn user(&self, id: i64) -> Result<Option<User>, StorageError> {
        let users = self.users.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(users.by_id.get(&id).cloned())
    }

    #[allow(dead_code)]
    fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let users = self.users.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(users.by_id.values().find(|u| u.username == username).cloned())
    }

    #[allow(dead_code)]
    fn create_user(&self, new_user: NewUser) -> Result<User, StorageError> {
        let salt: [u8; 16] = rand::thread_rng().gen();
        let config = ArgonConfig::default();
        let hashed_password = argon2::hash_encoded(new_user.password.as_bytes(), &salt, &config)?;

        let mut users = self.users.write().map_err(|_| StorageError::LockPoisoned)?;
        if users.by_id.values().any(|u| u.username == new_user.username) {
            return Err(StorageError::UsernameTaken(new_user.username));
        }

        users.last_id += 1;
        let user = User {
            id: users.last_id,
            username: new_user.username,
            password: hashed_password,
        };
        users.by_id.insert(user.id, user.clone());
        Ok(user)
    }
}

fn sample_product(
    name: &str,
    price: u32,
    category: &str,
    colors: u32,
    description: &str,
    image: &str,
    hover_image: Option<&str>,
    (is_new, is_trending, is_best_seller): (bool, bool, bool),
) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price,
        category: category.to_string(),
        colors,
        description: Some(description.to_string()),
        image: Some(image.to_string()),
        hover_image: hover_image.map(str::to_string),
        is_new,
        is_trending,
        is_best_seller,
    }
}

/// The catalog a fresh `MemStorage` starts with. Flags are (new, trending, best seller).
pub fn sample_products() -> Vec<NewProduct> {
    vec![
        sample_product(
            "Nike Air Max 90",
            140,
            "Men's Shoes",
            3,
            "The Nike Air Max 90 stays true to its OG running roots with the iconic Waffle sole, stitched overlays and classic TPU details.",
            "https://images.unsplash.com/photo-1600185365926-3a2ce3cdb9eb",
            Some("https://images.unsplash.com/photo-1600185365483-26d7a4cc7519"),
            (true, true, false),
        ),
        sample_product(
            "Nike Air Force 1 '07",
            110,
            "Men's Shoes",
            2,
            "The radiance lives on in the Nike Air Force 1 '07, the basketball original that puts a fresh spin on what you know best: durably stitched overlays, clean finishes and the perfect amount of flash to make you shine.",
            "https://images.unsplash.com/photo-1543508282-6319a3e2621f",
            Some("https://images.unsplash.com/photo-1513188732907-5f732b831ca8"),
            (false, false, true),
        ),
        sample_product(
            "Nike Air Zoom Pegasus 38",
            120,
            "Men's Running Shoes",
            5,
            "Your workhorse with wings returns. The Nike Air Zoom Pegasus 38 continues to put a spring in your step, using the same responsive foam as its predecessor.",
            "https://images.unsplash.com/photo-1606107557195-0e29a4b5b4aa",
            Some("https://images.unsplash.com/photo-1608231387042-66d1773070a5"),
            (false, true, false),
        ),
        sample_product(
            "Nike Sportswear Tech Fleece",
            130,
            "Men's Full-Zip Hoodie",
            2,
            "The Nike Sportswear Tech Fleece Hoodie combines a lightweight, space-age look and feel with performance warmth.",
            "https://images.unsplash.com/photo-1588361861040-ac9b1018dcde",
            None,
            (true, false, false),
        ),
        sample_product(
            "Nike Dri-FIT Run Division",
            90,
            "Women's Running Tights",
            3,
            "The Nike Dri-FIT Run Division Tights are made from at least 75% recycled polyester fibers. A wide, elastic waistband and stretchy fabric provide a secure, comfortable feel during your run.",
            "https://images.unsplash.com/photo-1529720317453-c8da503f2051",
            None,
            (false, true, false),
        ),
        sample_product(
            "Nike Dunk Low",
            115,
            "Men's Shoes",
            8,
            "Created for the hardwood but taken to the streets, the '80s basketball icon returns with perfectly shined overlays and classic team colors.",
            "https://images.unsplash.com/photo-1491553895911-0055eca6402d",
            None,
            (false, false, true),
        ),
        sample_product(
            "Nike React Infinity Run Flyknit 2",
            160,
            "Running Shoes",
            4,
            "The Nike React Infinity Run Flyknit 2 continues to help keep you running. A refreshed upper uses Flywire technology that combines with Flyknit for support and breathability where you need it.",
            "https://images.unsplash.com/photo-1542291026-7eec264c27ff",
            None,
            (true, true, false),
        ),
        sample_product(
            "Nike Blazer Mid '77 Vintage",
            105,
            "Shoes",
            3,
            "In the '70s, Nike was the new shoe on the block. So new in fact, we were still working on getting the perfect fit, the perfect feel and the perfect style. The Nike Blazer Mid '77 Vintage gets you close to the '70s originals with vintage treatment on the midsole, making it look like you've been wearing them for years.",
            "https://images.unsplash.com/photo-1595950653106-6c9ebd614d3a",
            Some("https://images.unsplash.com/photo-1605348532760-6753d2c43329"),
            (false, false, true),
        ),
    ]
}
