use chrono::{DateTime, Local};

use crate::scanner::ProductEntry;

/// Formats deal lists for the console and the alert email.
#[derive(Debug, Clone)]
pub struct DealReporter {
    threshold: f64,
}

impl DealReporter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn console_summary(&self, deals: &[ProductEntry]) -> String {
        if deals.is_empty() {
            return format!("[result] No apple deals ≤ ${:.2}/lb found", self.threshold);
        }

        let mut output = format!(
            "🔥 Apple deal(s) at or below ${:.2}/lb detected:\n",
            self.threshold
        );
        for deal in deals {
            output.push_str(&format!("- {}\n", deal));
        }
        output
    }

    pub fn email_subject(&self, deals: &[ProductEntry]) -> String {
        format!("🍎 Apple Deal Alert - {} deal(s) found!", deals.len())
    }

    pub fn email_body(&self, deals: &[ProductEntry], sent_at: DateTime<Local>) -> String {
        let mut body = format!(
            "Great news! We found some apple deals at or below ${:.2}/lb:\n\n",
            self.threshold
        );
        for deal in deals {
            body.push_str(&format!("• {}\n", deal));
        }
        body.push_str(&format!(
            "\nHappy shopping!\n\nSent at: {}",
            sent_at.format("%Y-%m-%d %H:%M:%S")
        ));
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn deals() -> Vec<ProductEntry> {
        vec![
            ProductEntry::new("Gala Apples", 0.99, "lb").with_variant("3 lb bag"),
            ProductEntry::new("Honeycrisp Apples", 1.5, "lb"),
        ]
    }

    #[test]
    fn test_console_summary_lists_each_deal() {
        let summary = DealReporter::new(1.5).console_summary(&deals());

        assert!(summary.starts_with("🔥 Apple deal(s) at or below $1.50/lb detected:"));
        assert!(summary.contains("- $0.99/lb :: Gala Apples (3 lb bag)\n"));
        assert!(summary.contains("- $1.50/lb :: Honeycrisp Apples (lb)\n"));
    }

    #[test]
    fn test_console_summary_without_deals() {
        let summary = DealReporter::new(1.5).console_summary(&[]);
        assert_eq!(summary, "[result] No apple deals ≤ $1.50/lb found");
    }

    #[test]
    fn test_email_subject_and_body() {
        let reporter = DealReporter::new(1.5);
        let sent_at = Local.with_ymd_and_hms(2025, 9, 14, 7, 30, 0).unwrap();

        assert_eq!(reporter.email_subject(&deals()), "🍎 Apple Deal Alert - 2 deal(s) found!");

        let body = reporter.email_body(&deals(), sent_at);
        let gala = body.find("Gala Apples").unwrap();
        let honeycrisp = body.find("Honeycrisp Apples").unwrap();
        assert!(gala < honeycrisp);
        assert!(body.contains("• $0.99/lb :: Gala Apples (3 lb bag)"));
        assert!(body.ends_with("Sent at: 2025-09-14 07:30:00"));
    }
}
