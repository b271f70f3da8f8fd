use super::types::ProductEntry;

/// Entries priced at or below `threshold`, in their original order.
pub fn filter(entries: &[ProductEntry], threshold: f64) -> Vec<ProductEntry> {
    entries
        .iter()
        .filter(|entry| entry.price_per_unit <= threshold)
        .cloned()
        .collect()
}
