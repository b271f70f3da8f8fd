use regex::Regex;
use std::sync::LazyLock;

use crate::core::UnitPolicy;

static PRICE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*
        (?:USD\s*)?\$?\s*
        (?P<amount>\d{1,5}(?:,\d{3})*(?:\.\d+)?|\.\d+)
        \s*(?P<cents>¢)?
        \s*(?:(?:/|per|a|an)\s*)?
        (?P<unit>lbs?|pounds?|ea|each|ct|count|unit|item)?
        \.?\s*$",
    )
    .expect("price token regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    Pound,
    Each,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceToken {
    pub amount: f64,
    pub unit: PriceUnit,
}

/// Parse tokens such as `"$0.99/lb"`, `"1.29 per lb"`, `"$3.99 ea"`, `"89¢/lb"` or `"2.49"`.
pub fn parse_price_token(raw: &str) -> Option<PriceToken> {
    let caps = PRICE_TOKEN.captures(raw)?;
    let mut amount: f64 = caps["amount"].replace(',', "").parse().ok()?;
    if caps.name("cents").is_some() {
        amount /= 100.0;
    }
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    let unit = match caps.name("unit").map(|m| m.as_str().to_ascii_lowercase()) {
        Some(u) if u.starts_with("lb") || u.starts_with("pound") => PriceUnit::Pound,
        Some(_) => PriceUnit::Each,
        None => PriceUnit::Unspecified,
    };

    Some(PriceToken {
        amount: round_cents(amount),
        unit,
    })
}

/// A unit on the price token wins; otherwise a variant mentioning `lb`/`pound` means per-lb.
pub fn resolve_unit(token_unit: PriceUnit, variant: &str) -> PriceUnit {
    if token_unit != PriceUnit::Unspecified {
        return token_unit;
    }
    let variant = variant.to_ascii_lowercase();
    if variant.contains("lb") || variant.contains("pound") {
        PriceUnit::Pound
    } else if variant.contains("each") || variant.split_whitespace().any(|w| w == "ea" || w == "ct") {
        PriceUnit::Each
    } else {
        PriceUnit::Unspecified
    }
}

/// Price per pound under `policy`, or `None` when the listing is excluded.
pub fn normalize_to_pound(amount: f64, unit: PriceUnit, policy: UnitPolicy) -> Option<f64> {
    match (unit, policy) {
        (PriceUnit::Pound, _) => Some(round_cents(amount)),
        (_, UnitPolicy::Exclude) => None,
        (_, UnitPolicy::AssumeWeight { pounds }) => Some(round_cents(amount / pounds)),
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
