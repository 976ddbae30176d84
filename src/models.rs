//! Domain model for the BiteFinder client.
//!
//! These are the value types exchanged with the Master over the wire
//! protocol. Stores and products arrive read-only from the backend and are
//! never mutated client-side; purchases and filter queries are built locally,
//! validated on construction, and sent as immutable units.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for caller-supplied input.
///
/// These are raised before any network call is made and never reach the
/// connection layer.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A coordinate was NaN or infinite.
    #[error("Coordinate out of range: {0}")]
    BadCoordinate(&'static str),

    /// The search radius must be strictly positive.
    #[error("Search radius must be positive, got {0}")]
    NonPositiveRadius(f64),

    /// The minimum-stars threshold must lie in [0, 5].
    #[error("Minimum stars must be within 0.0-5.0, got {0}")]
    StarsOutOfRange(f64),

    /// A required text field was empty.
    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    /// The customer email is not plausibly an address.
    #[error("Malformed email address: {0}")]
    BadEmail(String),

    /// A purchase must carry at least one selected product.
    #[error("Purchase contains no products")]
    EmptyPurchase,

    /// Requested quantity exceeds the catalog-reported availability.
    #[error("Requested {requested} x {product}, only {available} available")]
    QuantityExceedsStock {
        /// Product name.
        product: String,
        /// Quantity the caller asked for.
        requested: u32,
        /// Backend-authoritative stock.
        available: u32,
    },

    /// Star ratings submitted to the Master must be 1-5.
    #[error("Rating must be within 1-5, got {0}")]
    RatingOutOfRange(i32),
}

/// Derived price band for a store, computed from its average unit price.
///
/// Always re-derived via [`Store::price_tier`], never stored, so it can not
/// drift out of sync with the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    Low,
    Medium,
    High,
}

impl PriceTier {
    /// Tier label as the Master and the UI render it.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Low => "\u{20ac}",
            PriceTier::Medium => "\u{20ac}\u{20ac}",
            PriceTier::High => "\u{20ac}\u{20ac}\u{20ac}",
        }
    }

    /// Classify an average unit price into a tier.
    pub fn from_average_price(avg: f64) -> Self {
        if avg < 5.0 {
            PriceTier::Low
        } else if avg <= 15.0 {
            PriceTier::Medium
        } else {
            PriceTier::High
        }
    }
}

/// A catalog product as reported by the Master.
///
/// `quantity` is the backend-authoritative stock for catalog entries; for a
/// selected product inside a [`Purchase`] it is the user-chosen amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub price: f64,
}

impl Product {
    /// Build a selection of this product carrying the chosen quantity.
    ///
    /// Returns a new value; the catalog entry is left untouched so the UI's
    /// local edits can never corrupt the authoritative snapshot. Selecting
    /// more than the reported availability is rejected.
    pub fn select(&self, quantity: u32) -> Result<Product, ValidationError> {
        if quantity > self.quantity {
            return Err(ValidationError::QuantityExceedsStock {
                product: self.name.clone(),
                requested: quantity,
                available: self.quantity,
            });
        }
        Ok(Product {
            name: self.name.clone(),
            category: self.category.clone(),
            quantity,
            price: self.price,
        })
    }

    /// Line total for a selected product.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// A store listing received from the Master.
///
/// Created by the backend, consumed read-only here. The product list may be
/// empty when the Master elides it from a listing reply; the full catalog is
/// fetched separately per store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Unique key within the Master's catalog.
    pub name: String,
    pub category: String,
    /// Average star rating, 0.0-5.0.
    pub stars: f64,
    pub review_count: u32,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Store {
    /// Derive the price tier from the average unit price of the products.
    ///
    /// Returns `None` when no products are known for this store.
    pub fn price_tier(&self) -> Option<PriceTier> {
        if self.products.is_empty() {
            return None;
        }
        let avg = self.products.iter().map(|p| p.price).sum::<f64>() / self.products.len() as f64;
        Some(PriceTier::from_average_price(avg))
    }
}

/// A purchase order built client-side and submitted once.
///
/// Validated on construction; the product sequence preserves the order in
/// which the user selected items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub customer_name: String,
    pub customer_email: String,
    pub products: Vec<Product>,
}

impl Purchase {
    /// Build a purchase, validating the customer fields and the selection.
    pub fn new(
        customer_name: &str,
        customer_email: &str,
        products: Vec<Product>,
    ) -> Result<Self, ValidationError> {
        if customer_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("customer name"));
        }
        if customer_email.trim().is_empty() {
            return Err(ValidationError::EmptyField("customer email"));
        }
        if !customer_email.contains('@') {
            return Err(ValidationError::BadEmail(customer_email.to_string()));
        }
        if products.is_empty() {
            return Err(ValidationError::EmptyPurchase);
        }
        Ok(Self {
            customer_name: customer_name.trim().to_string(),
            customer_email: customer_email.trim().to_string(),
            products,
        })
    }

    /// Total cost of the order.
    pub fn total(&self) -> f64 {
        self.products.iter().map(Product::line_total).sum()
    }
}

/// Default search radius for an unfiltered nearby query, in kilometers.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Geo + attribute query sent to the Master for store listings.
///
/// Immutable once built; the constructors enforce finite coordinates, a
/// strictly positive radius and a star threshold within 0.0-5.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    latitude: f64,
    longitude: f64,
    /// Category filter; empty means no filter.
    categories: Vec<String>,
    min_stars: f64,
    /// Price-tier label; empty means no filter.
    price_tier: String,
    radius_km: f64,
}

impl FilterRequest {
    /// Build a fully specified filter query.
    pub fn new(
        latitude: f64,
        longitude: f64,
        categories: Vec<String>,
        min_stars: f64,
        price_tier: &str,
        radius_km: f64,
    ) -> Result<Self, ValidationError> {
        if !latitude.is_finite() {
            return Err(ValidationError::BadCoordinate("latitude"));
        }
        if !longitude.is_finite() {
            return Err(ValidationError::BadCoordinate("longitude"));
        }
        if !(0.0..=5.0).contains(&min_stars) {
            return Err(ValidationError::StarsOutOfRange(min_stars));
        }
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ValidationError::NonPositiveRadius(radius_km));
        }
        Ok(Self {
            latitude,
            longitude,
            categories,
            min_stars,
            price_tier: price_tier.to_string(),
            radius_km,
        })
    }

    /// Unfiltered nearby query: no category, star or price filter, 5 km radius.
    pub fn nearby(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        Self::new(latitude, longitude, Vec::new(), 0.0, "", DEFAULT_RADIUS_KM)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn min_stars(&self) -> f64 {
        self.min_stars
    }

    pub fn price_tier(&self) -> &str {
        &self.price_tier
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }
}

/// Validate a star rating before it is sent to the Master.
pub fn validate_rating(rating: i32) -> Result<u8, ValidationError> {
    if (1..=5).contains(&rating) {
        Ok(rating as u8)
    } else {
        Err(ValidationError::RatingOutOfRange(rating))
    }
}
