use crate::core::{season, Config, PipelineError};
use crate::fetch::{self, Fetcher, RetryPolicy};
use crate::notify::{DealReporter, Notifier};
use crate::scanner::{self, ProductEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Deals in the order they appeared on the page.
    pub matched_entries: Vec<ProductEntry>,
    pub fetch_succeeded: bool,
    pub attempts_used: u32,
    /// Keyword-matching listings on the page, per-lb or not.
    pub listings_found: usize,
    pub notification_sent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Seasonal gate closed; nothing was fetched or sent.
    OutOfSeason { month: u32 },
    Completed(RunResult),
}

/// Gate, fetch, parse, filter, notify. Single pass, nothing persisted.
pub struct DealPipeline<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
    notifier: Option<&'a dyn Notifier>,
}

impl<'a> DealPipeline<'a> {
    pub fn new(config: &'a Config, fetcher: &'a dyn Fetcher, notifier: Option<&'a dyn Notifier>) -> Self {
        Self {
            config,
            fetcher,
            notifier,
        }
    }

    pub async fn run(&self, current_month: u32) -> Result<RunOutcome, PipelineError> {
        let threshold = &self.config.threshold;
        if !season::is_active(current_month, threshold) {
            tracing::info!(
                "🍂 Month {} is outside the season {:?}, skipping run",
                current_month,
                threshold.active_months
            );
            return Ok(RunOutcome::OutOfSeason { month: current_month });
        }

        let policy = RetryPolicy::from(&self.config.fetch);
        let page = fetch::fetch(self.fetcher, &self.config.fetch.search_url, &policy).await?;

        let scanner::Extraction { entries, listings_found } =
            scanner::extract(&page.content, &self.config.listing);
        if listings_found == 0 && self.config.listing.require_listings {
            return Err(PipelineError::NoListings {
                keyword: self.config.listing.keyword.clone(),
            });
        }

        let deals = scanner::filter(&entries, threshold.max_price_per_unit);
        tracing::info!(
            "📊 {} of {} listing(s) at or below ${:.2}/lb",
            deals.len(),
            entries.len(),
            threshold.max_price_per_unit
        );

        let reporter = DealReporter::new(threshold.max_price_per_unit);
        println!("{}", reporter.console_summary(&deals));

        let notification_sent = match self.notifier {
            Some(notifier) if !deals.is_empty() => {
                match notifier.notify(&deals, threshold.max_price_per_unit).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!("❌ Failed to send alert: {}", e);
                        false
                    }
                }
            }
            Some(_) => false,
            None => {
                if !deals.is_empty() {
                    tracing::info!("Email disabled, console summary only");
                }
                false
            }
        };

        Ok(RunOutcome::Completed(RunResult {
            matched_entries: deals,
            fetch_succeeded: true,
            attempts_used: page.attempts,
            listings_found,
            notification_sent,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FetchAttemptError, FetchError, NotificationError};
    use crate::fetch::MockFetcher;
    use crate::notify::MockNotifier;
    use std::time::Duration;

    const PAGE: &str = r#"
        <div data-name="McIntosh Apples" data-price="1.69" data-variant="Per lb"></div>
        <div data-name="Gala Apples" data-price="0.99" data-variant="Per lb"></div>
        <div data-name="Honeycrisp Apples" data-price="1.50" data-variant="Per lb"></div>
    "#;

    fn config() -> Config {
        let mut config = Config::from_lookup(|key| match key {
            "EMAIL_ENABLED" => Some("false".to_string()),
            "FETCH_PRE_DELAY_MS" => Some("0".to_string()),
            "FETCH_JITTER_MS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        config.fetch.base_delay = Duration::from_millis(1);
        config
    }

    fn fetcher_returning(page: &'static str) -> MockFetcher {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_name().return_const("mock");
        fetcher
            .expect_fetch_once()
            .times(1)
            .returning(move |_| Ok(page.to_string()));
        fetcher
    }

    #[tokio::test]
    async fn test_deals_are_filtered_and_notified() {
        let config = config();
        let fetcher = fetcher_returning(PAGE);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|deals, threshold| {
                deals.len() == 2 && deals[0].name == "Gala Apples" && *threshold == 1.5
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = DealPipeline::new(&config, &fetcher, Some(&notifier))
            .run(9)
            .await
            .unwrap();

        let RunOutcome::Completed(result) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(result.listings_found, 3);
        assert_eq!(result.attempts_used, 1);
        assert!(result.fetch_succeeded);
        assert!(result.notification_sent);
        assert_eq!(result.matched_entries[1].name, "Honeycrisp Apples");
    }

    #[tokio::test]
    async fn test_out_of_season_makes_no_calls() {
        let config = config();
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch_once().never();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let outcome = DealPipeline::new(&config, &fetcher, Some(&notifier))
            .run(6)
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::OutOfSeason { month: 6 });
    }

    #[tokio::test]
    async fn test_exhausted_fetch_sends_nothing() {
        let config = config();
        let mut fetcher = MockFetcher::new();
        fetcher.expect_name().return_const("mock");
        fetcher
            .expect_fetch_once()
            .times(3)
            .returning(|_| Err(FetchAttemptError::Connect("connection reset".to_string())));
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let err = DealPipeline::new(&config, &fetcher, Some(&notifier))
            .run(9)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Fetch(FetchError::NetworkExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_no_deals_skips_notification() {
        let mut config = config();
        config.threshold.max_price_per_unit = 0.50;
        let fetcher = fetcher_returning(PAGE);
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let outcome = DealPipeline::new(&config, &fetcher, Some(&notifier))
            .run(9)
            .await
            .unwrap();

        let RunOutcome::Completed(result) = outcome else {
            panic!("expected a completed run");
        };
        assert!(result.matched_entries.is_empty());
        assert!(!result.notification_sent);
    }

    #[tokio::test]
    async fn test_empty_page_is_no_listings_error() {
        let config = config();
        let fetcher = fetcher_returning("<html><body>Access denied</body></html>");

        let err = DealPipeline::new(&config, &fetcher, None).run(9).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoListings { .. }));

        let mut lenient = config.clone();
        lenient.listing.require_listings = false;
        let fetcher = fetcher_returning("<html><body>Access denied</body></html>");
        let outcome = DealPipeline::new(&lenient, &fetcher, None).run(9).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(r) if r.listings_found == 0));
    }

    #[tokio::test]
    async fn test_each_priced_listings_complete_without_deals() {
        let config = config();
        let fetcher = fetcher_returning(
            r#"
            <div data-name="Granny Smith Apple" data-price="0.89" data-variant="1 each"></div>
            <div data-name="Honeycrisp Apple" data-price="1.29" data-variant="1 each"></div>
            "#,
        );
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let outcome = DealPipeline::new(&config, &fetcher, Some(&notifier))
            .run(9)
            .await
            .unwrap();

        let RunOutcome::Completed(result) = outcome else {
            panic!("expected a completed run");
        };
        assert!(result.matched_entries.is_empty());
        assert_eq!(result.listings_found, 2);
        assert!(!result.notification_sent);
    }

    #[tokio::test]
    async fn test_notification_failure_is_not_fatal() {
        let config = config();
        let fetcher = fetcher_returning(PAGE);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_, _| Err(NotificationError::Build("relay rejected".to_string())));

        let outcome = DealPipeline::new(&config, &fetcher, Some(&notifier))
            .run(9)
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Completed(r) if !r.notification_sent));
    }
}
