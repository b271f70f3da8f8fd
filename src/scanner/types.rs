use std::fmt;

/// A product listing priced per pound.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEntry {
    pub name: String,
    pub price_per_unit: f64,
    pub unit: String,
    /// Package description from the listing, e.g. "3 lb bag". May be empty.
    pub variant: String,
}

impl ProductEntry {
    pub fn new(name: impl Into<String>, price_per_unit: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price_per_unit,
            unit: unit.into(),
            variant: String::new(),
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    /// Package text when the listing had one, otherwise the unit.
    pub fn detail(&self) -> &str {
        if self.variant.is_empty() {
            &self.unit
        } else {
            &self.variant
        }
    }
}

impl fmt::Display for ProductEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${:.2}/{} :: {} ({})",
            self.price_per_unit,
            self.unit,
            self.name,
            self.detail()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_variant_then_unit() {
        let entry = ProductEntry::new("Gala Apples", 0.99, "lb");
        assert_eq!(entry.to_string(), "$0.99/lb :: Gala Apples (lb)");

        let entry = entry.with_variant("3 lb bag");
        assert_eq!(entry.to_string(), "$0.99/lb :: Gala Apples (3 lb bag)");
    }
}
