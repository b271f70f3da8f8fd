use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::price::{normalize_to_pound, parse_price_token, resolve_unit, PriceUnit};
use super::types::ProductEntry;
use crate::core::ListingConfig;

mod selectors {
    use super::*;

    /// Product tiles carry their data as attributes on the container element.
    pub static PRODUCT_BLOCK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-name][data-price]").expect("product selector"));
}

static TEXT_LISTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*•]\s*)?(?P<name>.*?[[:alpha:]].*?)\s*(?:[-–:|,@]\s*)*(?P<price>(?:\$\s*\d[\d,]*(?:\.\d+)?|\d+\s*¢)(?:\s*(?:/|per)\s*[a-z]+\.?|\s+(?:ea|each)\b)?)(?P<rest>.*)$",
    )
    .expect("text listing regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

/// One product block as found in the page, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub name: Option<String>,
    pub price: Option<String>,
    pub variant: String,
    pub category: String,
}

/// Why a block was dropped. Skips are per block and never fail the extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingName,
    MissingPrice,
    UnparsablePrice(String),
    NotPerPound(PriceUnit),
}

/// Result of scanning one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Per-lb entries in document order.
    pub entries: Vec<ProductEntry>,
    /// Keyword-matching listings with a readable price, including the ones the unit
    /// policy excluded. Zero here means the page had no usable products at all.
    pub listings_found: usize,
}

/// Extract keyword-matching listings in document order.
///
/// Markup with `data-name`/`data-price` product blocks is preferred. Content with no
/// such blocks (plain text dumps) goes through the line-based fallback.
pub fn extract(content: &str, config: &ListingConfig) -> Extraction {
    let mut raw = scan_markup(content);
    if raw.is_empty() {
        raw = scan_text(content);
        if !raw.is_empty() {
            tracing::debug!("No product markup found, using text fallback ({} lines)", raw.len());
        }
    }

    let keyword = config.keyword.to_lowercase();
    let mut entries = Vec::new();
    let mut excluded = 0;
    let mut skipped = 0;

    for (index, listing) in raw.iter().enumerate() {
        if !matches_keyword(listing, &keyword) {
            continue;
        }
        match to_entry(listing, config) {
            Ok(entry) => entries.push(entry),
            Err(SkipReason::NotPerPound(unit)) => {
                excluded += 1;
                tracing::debug!("Excluding listing #{} {:?}: priced {:?}", index, listing.name, unit);
            }
            Err(reason) => {
                skipped += 1;
                tracing::debug!("Skipping listing #{} {:?}: {:?}", index, listing.name, reason);
            }
        }
    }

    tracing::info!(
        "🔍 Extracted {} per-lb {} listing(s) from {} block(s), {} not per lb, {} skipped",
        entries.len(),
        keyword,
        raw.len(),
        excluded,
        skipped
    );
    Extraction {
        listings_found: entries.len() + excluded,
        entries,
    }
}

pub fn scan_markup(content: &str) -> Vec<RawListing> {
    let document = Html::parse_document(content);

    document
        .select(&selectors::PRODUCT_BLOCK)
        .map(|block| {
            let attr = |name: &str| block.value().attr(name).map(clean_text);
            RawListing {
                name: attr("data-name")
                    .map(|n| clean_text(&n.replace('+', " ")))
                    .filter(|n| !n.is_empty()),
                price: attr("data-price").filter(|p| !p.is_empty()),
                variant: attr("data-variant").unwrap_or_default(),
                category: attr("data-category").unwrap_or_default(),
            }
        })
        .collect()
}

pub fn scan_text(content: &str) -> Vec<RawListing> {
    content
        .lines()
        .filter_map(|line| {
            let line = TAG.replace_all(line, " ");
            let caps = TEXT_LISTING.captures(&line)?;
            let name = clean_text(&caps["name"]);
            let variant = clean_text(caps["rest"].trim_start_matches(|c: char| {
                c.is_whitespace() || matches!(c, '-' | '–' | ':' | '|' | ',' | '(')
            }))
            .trim_end_matches(')')
            .to_string();
            Some(RawListing {
                name: Some(name).filter(|n| !n.is_empty()),
                price: Some(clean_text(&caps["price"])),
                variant,
                category: String::new(),
            })
        })
        .collect()
}

fn matches_keyword(listing: &RawListing, keyword: &str) -> bool {
    let in_name = listing
        .name
        .as_deref()
        .is_some_and(|n| n.to_lowercase().contains(keyword));
    in_name || listing.category.to_lowercase().contains(keyword)
}

fn to_entry(listing: &RawListing, config: &ListingConfig) -> Result<ProductEntry, SkipReason> {
    let name = listing.name.as_deref().ok_or(SkipReason::MissingName)?;
    let raw_price = listing.price.as_deref().ok_or(SkipReason::MissingPrice)?;
    let token = parse_price_token(raw_price)
        .ok_or_else(|| SkipReason::UnparsablePrice(raw_price.to_string()))?;

    let unit = resolve_unit(token.unit, &listing.variant);
    let per_pound = normalize_to_pound(token.amount, unit, config.unit_policy)
        .ok_or(SkipReason::NotPerPound(unit))?;

    Ok(ProductEntry::new(name, per_pound, "lb").with_variant(listing.variant.clone()))
}

fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
