//! Listing Records
//!
//! A rental listing as the agent service reports it, plus the small
//! presentation helpers every surface needs (price labels, spec lines,
//! thumbnails).
//!
//! The service nests the scraped fields under `listing_details` and sends the
//! geocoded position alongside:
//!
//! ```json
//! {
//!   "listing_details": { "title": "Sunny 2BR", "price": "$3,200", ... },
//!   "coordinates": [-122.41, 37.77]
//! }
//! ```
//!
//! Decoding is lenient where the service is known to be loose: `price` may be
//! a number or a dollar string, and `coordinates` may be missing, null, or
//! hold non-numeric junk. None of those fail the record; a listing without a
//! usable position simply never gets a map marker.

use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::LngLat;

/// Image shown when a listing has no photos
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/400x300?text=No+Image";

/// Scraped fields of a listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingDetails {
    /// Listing headline
    pub title: String,
    /// Monthly rent in dollars
    #[serde(deserialize_with = "lenient_price")]
    pub price: f64,
    /// Neighborhood or area
    #[serde(default)]
    pub location: String,
    /// Approximate street address
    #[serde(default)]
    pub address: Option<String>,
    /// Link to the listing page on the rental site
    pub url: String,
    /// Bedroom count
    #[serde(default)]
    pub bedrooms: u32,
    /// Bathroom count, may be fractional
    #[serde(default)]
    pub bathrooms: Option<f64>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Photo URLs, first one is the thumbnail
    #[serde(default)]
    pub images: Vec<String>,
}

/// A listing plus its geocoded position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Scraped fields
    #[serde(rename = "listing_details")]
    pub details: ListingDetails,
    /// Raw `[lng, lat]` as sent; see [`ListingRecord::position`]
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Vec<f64>,
}

impl ListingRecord {
    /// Create a record from details and a raw coordinate pair
    #[must_use]
    pub fn new(details: ListingDetails, coordinates: Vec<f64>) -> Self {
        Self {
            details,
            coordinates,
        }
    }

    /// Position usable for map placement, if any
    #[must_use]
    pub fn position(&self) -> Option<LngLat> {
        LngLat::from_slice(&self.coordinates)
    }

    /// Listing headline
    #[must_use]
    pub fn title(&self) -> &str {
        &self.details.title
    }

    /// Link to the listing page on the rental site
    #[must_use]
    pub fn url(&self) -> &str {
        &self.details.url
    }

    /// First photo, if there is one
    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.details.images.first().map(String::as_str)
    }

    /// First photo, or the placeholder image
    #[must_use]
    pub fn thumbnail(&self) -> &str {
        self.first_image().unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Whole-dollar price label, e.g. `$3,200`
    #[must_use]
    pub fn price_label(&self) -> String {
        format!("${}", group_thousands(self.details.price))
    }

    /// Price label with the rental period, e.g. `$3,200/mo`
    #[must_use]
    pub fn monthly_price(&self) -> String {
        format!("{}/mo", self.price_label())
    }

    /// Bedroom/bathroom summary, e.g. `2 BR · 1.5 BA`
    #[must_use]
    pub fn specs(&self) -> String {
        let mut specs = format!("{} BR", self.details.bedrooms);
        if let Some(baths) = self.details.bathrooms.filter(|b| *b > 0.0) {
            specs.push_str(&format!(" · {} BA", format_count(baths)));
        }
        specs
    }
}

/// Format a dollar amount with comma grouping, rounded to whole dollars
fn group_thousands(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Render a count without a trailing `.0`
fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

// ============================================================================
// Lenient Deserializers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => n,
        RawPrice::Text(text) => parse_dollar_string(&text),
    })
}

/// Extract the digits of a dollar string like `$3,000`; no digits gives 0
fn parse_dollar_string(text: &str) -> f64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        tracing::debug!(price = %text, "Price has no digits, treating as 0");
        return 0.0;
    }
    digits.parse().unwrap_or(0.0)
}

fn lenient_coordinates<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .map(|v| v.as_f64().unwrap_or(f64::NAN))
        .collect())
}
