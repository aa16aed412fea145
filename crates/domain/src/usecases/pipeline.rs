//! Pipeline use case - one linear pass per invocation
//!
//! Stages: retry sweep, fetch (with rate-limit-aware fallback), generate,
//! publish. Failures are recorded in the ledger or logged, never raised; an
//! invocation always completes.

use std::sync::Arc;

use crate::{
    model::{
        ArticleLink, ContentItem, DraftPost, GeneratedPost, NewPostRecord, Platform, PublishOutcome,
        RunReport,
    },
    pick_top_items,
    ports::{DraftGenerator, GenerateError, ItemSource, PostLedger, Publisher, SourceError},
    truncate_for_x,
    usecases::generate::GenerateUseCase,
};

/// Ledger error strings are stored truncated
const MAX_ERROR_LEN: usize = 500;

const X_MAX_CHARS: usize = 280;

/// Configuration for one pipeline invocation
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Keywords driving both source fetchers
    pub keywords: Vec<String>,
    /// Maximum pending records retried per platform per invocation
    pub pending_retry_limit: usize,
    /// Cap on candidate items handed to the generator
    pub max_candidate_items: usize,
    /// Pre-fetched items bypassing the fetch stage (testing/sampling)
    pub override_items: Option<Vec<ContentItem>>,
    /// Log would-be drafts without touching publishers or the ledger
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keywords: vec![],
            pending_retry_limit: 10,
            max_candidate_items: 10,
            override_items: None,
            dry_run: false,
        }
    }
}

/// Pipeline orchestrator
///
/// A `None` source means no usable credentials for that provider; disabled
/// publishers are carried so the publish stage can queue pending records.
pub struct Pipeline<XS, RS, G, PL, PX, L>
where
    XS: ItemSource + ?Sized,
    RS: ItemSource + ?Sized,
    G: DraftGenerator + ?Sized,
    PL: Publisher + ?Sized,
    PX: Publisher + ?Sized,
    L: PostLedger + ?Sized,
{
    x_source: Option<Arc<XS>>,
    reddit_source: Option<Arc<RS>>,
    generator: Arc<G>,
    linkedin_publisher: Arc<PL>,
    x_publisher: Arc<PX>,
    ledger: Arc<L>,
    config: PipelineConfig,
}

impl<XS, RS, G, PL, PX, L> Pipeline<XS, RS, G, PL, PX, L>
where
    XS: ItemSource + ?Sized,
    RS: ItemSource + ?Sized,
    G: DraftGenerator + ?Sized,
    PL: Publisher + ?Sized,
    PX: Publisher + ?Sized,
    L: PostLedger + ?Sized,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x_source: Option<Arc<XS>>,
        reddit_source: Option<Arc<RS>>,
        generator: Arc<G>,
        linkedin_publisher: Arc<PL>,
        x_publisher: Arc<PX>,
        ledger: Arc<L>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            x_source,
            reddit_source,
            generator,
            linkedin_publisher,
            x_publisher,
            ledger,
            config,
        }
    }

    /// Run one invocation: retry sweep, fetch, generate, publish
    pub async fn run_once(&self) -> RunReport {
        let mut report = RunReport::default();

        if self.config.dry_run {
            tracing::debug!("Dry run: skipping retry sweep");
        } else {
            let (attempted, succeeded) = self.sweep_platform(self.linkedin_publisher.as_ref()).await;
            if attempted > 0 {
                report.retried.push((Platform::Linkedin, attempted, succeeded));
            }
            let (attempted, succeeded) = self.sweep_platform(self.x_publisher.as_ref()).await;
            if attempted > 0 {
                report.retried.push((Platform::X, attempted, succeeded));
            }
        }

        let items = self.fetch_items().await;
        report.fetched = items.len();
        if items.is_empty() {
            tracing::info!("No items fetched");
            return report;
        }

        let usecase = GenerateUseCase::new(self.generator.as_ref());
        let Some(post) = usecase.generate(&items).await else {
            return report;
        };
        report.generated = true;

        let outcome = self
            .publish_generated(self.linkedin_publisher.as_ref(), &post)
            .await;
        report.published.push((Platform::Linkedin, outcome));

        let outcome = self.publish_generated(self.x_publisher.as_ref(), &post).await;
        report.published.push((Platform::X, outcome));

        report
    }

    /// Drain pending ledger entries through an enabled publisher
    async fn sweep_platform<P: Publisher + ?Sized>(&self, publisher: &P) -> (usize, usize) {
        if !publisher.is_enabled() {
            return (0, 0);
        }

        let platform = publisher.platform();
        let pending = match self
            .ledger
            .fetch_pending(platform, self.config.pending_retry_limit)
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(platform = %platform, error = %e, "Failed to load pending records");
                return (0, 0);
            }
        };

        let mut attempted = 0;
        let mut succeeded = 0;
        for record in pending {
            let Some(text) = record.platform_text() else {
                tracing::debug!(
                    platform = %platform,
                    url = %record.source_url,
                    "Pending record has no stored text for this platform, skipping"
                );
                continue;
            };

            let link = match platform {
                Platform::Linkedin => Some(ArticleLink {
                    url: record.source_url.clone(),
                    title: record.title.clone().unwrap_or_default(),
                }),
                Platform::X => None,
            };
            let draft = DraftPost {
                text: text.to_string(),
                link,
            };

            attempted += 1;
            match publisher.publish(&draft).await {
                Ok(()) => {
                    succeeded += 1;
                    tracing::info!(platform = %platform, url = %record.source_url, "Retried pending post");
                    if let Err(e) = self.ledger.mark_success(platform, &record.source_url).await {
                        tracing::error!(error = %e, "Failed to mark record as posted");
                    }
                }
                Err(e) => {
                    let error = truncate_error(&e.to_string());
                    tracing::warn!(platform = %platform, url = %record.source_url, error = %error, "Retry failed");
                    if let Err(e) = self
                        .ledger
                        .mark_error(platform, &record.source_url, &error)
                        .await
                    {
                        tracing::error!(error = %e, "Failed to record retry error");
                    }
                }
            }
        }

        (attempted, succeeded)
    }

    /// X first; Reddit only when X was rate limited or produced nothing
    async fn fetch_items(&self) -> Vec<ContentItem> {
        if let Some(items) = &self.config.override_items {
            return pick_top_items(items, self.config.max_candidate_items);
        }

        let mut items = Vec::new();
        let mut x_rate_limited = false;

        if let Some(x_source) = &self.x_source {
            match x_source.fetch(&self.config.keywords).await {
                Ok(batch) => {
                    x_rate_limited = batch.rate_limited;
                    items.extend(batch.items);
                }
                Err(SourceError::RateLimited) => {
                    x_rate_limited = true;
                    tracing::warn!("X search rate limited, falling back to Reddit");
                }
                Err(e) => {
                    tracing::warn!(source = "x", error = %e, "Fetch failed");
                }
            }
        }

        if let Some(reddit_source) = &self.reddit_source {
            if x_rate_limited || items.is_empty() {
                match reddit_source.fetch(&self.config.keywords).await {
                    Ok(batch) => items.extend(batch.items),
                    Err(e) => {
                        tracing::warn!(source = "reddit", error = %e, "Fetch failed");
                    }
                }
            }
        }

        pick_top_items(&items, self.config.max_candidate_items)
    }

    /// Publish the generated post to one platform, recording the outcome
    async fn publish_generated<P: Publisher + ?Sized>(
        &self,
        publisher: &P,
        post: &GeneratedPost,
    ) -> PublishOutcome {
        let platform = publisher.platform();
        let draft = self.draft_for(platform, post);

        if self.config.dry_run {
            tracing::info!(platform = %platform, text = %draft.text, "[DRY RUN] Would publish");
            return PublishOutcome::DryRun;
        }

        if !publisher.is_enabled() {
            // Queue as pending so a future retry sweep can pick it up once
            // credentials become available
            match self.ledger.exists_record(platform, &post.url).await {
                Ok(false) => {
                    let record = self.build_record(
                        platform,
                        post,
                        &draft,
                        false,
                        Some(format!("pending: missing {} credentials", platform)),
                    );
                    if let Err(e) = self.ledger.record_post(record).await {
                        tracing::error!(platform = %platform, error = %e, "Failed to queue pending record");
                    }
                }
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!(platform = %platform, error = %e, "Failed to check for existing record");
                }
            }
            return PublishOutcome::QueuedPending;
        }

        match self.ledger.has_been_posted(platform, &post.url).await {
            Ok(true) => {
                tracing::info!(platform = %platform, url = %post.url, "Already posted, skipping");
                return PublishOutcome::AlreadyPosted;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(platform = %platform, error = %e, "Failed to check posted state, continuing");
            }
        }

        match publisher.publish(&draft).await {
            Ok(()) => {
                tracing::info!(platform = %platform, url = %post.url, "Published");
                let record = self.build_record(platform, post, &draft, true, None);
                if let Err(e) = self.ledger.record_post(record).await {
                    tracing::error!(platform = %platform, error = %e, "Failed to record publish");
                }
                PublishOutcome::Published
            }
            Err(e) => {
                let error = truncate_error(&e.to_string());
                tracing::error!(platform = %platform, url = %post.url, error = %error, "Publish failed");
                let record =
                    self.build_record(platform, post, &draft, false, Some(error.clone()));
                if let Err(e) = self.ledger.record_post(record).await {
                    tracing::error!(platform = %platform, error = %e, "Failed to record publish failure");
                }
                PublishOutcome::Failed { error }
            }
        }
    }

    fn draft_for(&self, platform: Platform, post: &GeneratedPost) -> DraftPost {
        match platform {
            Platform::Linkedin => {
                let text = if post.linkedin_text.trim().is_empty() {
                    format!("{}\n\n{}", post.title, post.url)
                } else {
                    post.linkedin_text.clone()
                };
                let link = (!post.url.is_empty()).then(|| ArticleLink {
                    url: post.url.clone(),
                    title: post.title.clone(),
                });
                DraftPost { text, link }
            }
            Platform::X => {
                let text = if post.x_text.trim().is_empty() {
                    truncate_for_x(&post.title, &post.url, X_MAX_CHARS)
                } else {
                    post.x_text.clone()
                };
                DraftPost { text, link: None }
            }
        }
    }

    fn build_record(
        &self,
        platform: Platform,
        post: &GeneratedPost,
        draft: &DraftPost,
        success: bool,
        error: Option<String>,
    ) -> NewPostRecord {
        let (linkedin_text, x_text) = match platform {
            Platform::Linkedin => (Some(draft.text.clone()), None),
            Platform::X => (None, Some(draft.text.clone())),
        };
        NewPostRecord {
            platform,
            source: post.source,
            source_url: post.url.clone(),
            title: Some(post.title.clone()),
            linkedin_text,
            x_text,
            success,
            error,
        }
    }
}

fn truncate_error(error: &str) -> String {
    if error.chars().count() > MAX_ERROR_LEN {
        error.chars().take(MAX_ERROR_LEN).collect()
    } else {
        error.to_string()
    }
}

// Allow use cases to call port trait objects held behind Arc
use async_trait::async_trait;

#[async_trait]
impl<G: DraftGenerator + ?Sized> DraftGenerator for &G {
    async fn draft(&self, items: &[ContentItem]) -> Result<GeneratedPost, GenerateError> {
        (*self).draft(items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentSource, FetchBatch, PostRecord};
    use crate::ports::{LedgerError, PublishError};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::OffsetDateTime;

    struct FakeSource {
        batch: Result<FetchBatch, &'static str>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn with_items(items: Vec<ContentItem>) -> Self {
            Self {
                batch: Ok(FetchBatch {
                    items,
                    rate_limited: false,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn rate_limited() -> Self {
            Self {
                batch: Ok(FetchBatch::rate_limited()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ItemSource for FakeSource {
        async fn fetch(&self, _keywords: &[String]) -> Result<FetchBatch, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.batch {
                Ok(batch) => Ok(batch.clone()),
                Err(msg) => Err(SourceError::Api(msg.to_string())),
            }
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    struct FakeGenerator {
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DraftGenerator for FakeGenerator {
        async fn draft(&self, items: &[ContentItem]) -> Result<GeneratedPost, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let first = &items[0];
            Ok(GeneratedPost {
                source: first.source,
                title: first.title.clone(),
                url: first.url.clone(),
                linkedin_text: format!("LinkedIn: {}\nSource: {}", first.title, first.url),
                x_text: format!("X: {} {}", first.title, first.url),
            })
        }
    }

    struct FakePublisher {
        enabled: bool,
        platform: Platform,
        fail_with: Option<&'static str>,
        published: Mutex<Vec<DraftPost>>,
    }

    impl FakePublisher {
        fn enabled(platform: Platform) -> Self {
            Self {
                enabled: true,
                platform,
                fail_with: None,
                published: Mutex::new(vec![]),
            }
        }

        fn disabled(platform: Platform) -> Self {
            Self {
                enabled: false,
                platform,
                fail_with: None,
                published: Mutex::new(vec![]),
            }
        }

        fn failing(platform: Platform, error: &'static str) -> Self {
            Self {
                enabled: true,
                platform,
                fail_with: Some(error),
                published: Mutex::new(vec![]),
            }
        }

        fn publish_count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn publish(&self, post: &DraftPost) -> Result<(), PublishError> {
            self.published.lock().unwrap().push(post.clone());
            match self.fail_with {
                Some(error) => Err(PublishError::Api(error.to_string())),
                None => Ok(()),
            }
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn platform(&self) -> Platform {
            self.platform
        }
    }

    struct FakeLedger {
        records: Mutex<HashMap<(Platform, String), PostRecord>>,
        insertion_order: Mutex<Vec<(Platform, String)>>,
    }

    impl FakeLedger {
        fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
                insertion_order: Mutex::new(vec![]),
            }
        }

        fn get(&self, platform: Platform, url: &str) -> Option<PostRecord> {
            self.records
                .lock()
                .unwrap()
                .get(&(platform, url.to_string()))
                .cloned()
        }

        fn insert_pending(&self, platform: Platform, url: &str, x_text: Option<&str>, linkedin_text: Option<&str>) {
            let record = PostRecord {
                platform,
                source: ContentSource::Reddit,
                source_url: url.to_string(),
                title: Some("Pending title".to_string()),
                linkedin_text: linkedin_text.map(String::from),
                x_text: x_text.map(String::from),
                posted_at: None,
                error: Some("pending: missing credentials".to_string()),
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            };
            let key = (platform, url.to_string());
            self.records.lock().unwrap().insert(key.clone(), record);
            self.insertion_order.lock().unwrap().push(key);
        }
    }

    #[async_trait]
    impl PostLedger for FakeLedger {
        async fn has_been_posted(
            &self,
            platform: Platform,
            source_url: &str,
        ) -> Result<bool, LedgerError> {
            Ok(self
                .get(platform, source_url)
                .map(|r| r.posted_at.is_some())
                .unwrap_or(false))
        }

        async fn exists_record(
            &self,
            platform: Platform,
            source_url: &str,
        ) -> Result<bool, LedgerError> {
            Ok(self.get(platform, source_url).is_some())
        }

        async fn record_post(&self, record: NewPostRecord) -> Result<(), LedgerError> {
            let key = (record.platform, record.source_url.clone());
            let now = OffsetDateTime::now_utc();
            let mut records = self.records.lock().unwrap();
            if !records.contains_key(&key) {
                self.insertion_order.lock().unwrap().push(key.clone());
            }
            let created_at = records.get(&key).map(|r| r.created_at).unwrap_or(now);
            records.insert(
                key,
                PostRecord {
                    platform: record.platform,
                    source: record.source,
                    source_url: record.source_url,
                    title: record.title,
                    linkedin_text: record.linkedin_text,
                    x_text: record.x_text,
                    posted_at: record.success.then_some(now),
                    error: record.error,
                    created_at,
                    updated_at: now,
                },
            );
            Ok(())
        }

        async fn fetch_pending(
            &self,
            platform: Platform,
            limit: usize,
        ) -> Result<Vec<PostRecord>, LedgerError> {
            let records = self.records.lock().unwrap();
            let order = self.insertion_order.lock().unwrap();
            Ok(order
                .iter()
                .filter(|(p, _)| *p == platform)
                .filter_map(|key| records.get(key))
                .filter(|r| r.posted_at.is_none())
                .take(limit)
                .cloned()
                .collect())
        }

        async fn mark_success(
            &self,
            platform: Platform,
            source_url: &str,
        ) -> Result<(), LedgerError> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&(platform, source_url.to_string()))
                .ok_or_else(|| LedgerError::NotFound {
                    platform,
                    source_url: source_url.to_string(),
                })?;
            record.posted_at = Some(OffsetDateTime::now_utc());
            record.error = None;
            record.updated_at = OffsetDateTime::now_utc();
            Ok(())
        }

        async fn mark_error(
            &self,
            platform: Platform,
            source_url: &str,
            error: &str,
        ) -> Result<(), LedgerError> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&(platform, source_url.to_string()))
                .ok_or_else(|| LedgerError::NotFound {
                    platform,
                    source_url: source_url.to_string(),
                })?;
            record.error = Some(error.to_string());
            record.updated_at = OffsetDateTime::now_utc();
            Ok(())
        }
    }

    fn item(title: &str, url: &str) -> ContentItem {
        ContentItem {
            source: ContentSource::X,
            title: title.to_string(),
            url: url.to_string(),
            created_at: OffsetDateTime::now_utc(),
            score: 1,
        }
    }

    fn pipeline_config() -> PipelineConfig {
        PipelineConfig {
            keywords: vec!["rust".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_publishes_once_per_platform() {
        let x_source = Arc::new(FakeSource::with_items(vec![
            item("First", "https://example.com/1"),
            item("Second", "https://example.com/2"),
        ]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::enabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::enabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        let pipeline = Pipeline::new(
            Some(Arc::clone(&x_source)),
            None::<Arc<FakeSource>>,
            Arc::clone(&generator),
            Arc::clone(&linkedin),
            Arc::clone(&x_pub),
            Arc::clone(&ledger),
            pipeline_config(),
        );

        let report = pipeline.run_once().await;

        assert_eq!(report.fetched, 2);
        assert!(report.generated);
        assert_eq!(generator.call_count(), 1);
        assert_eq!(linkedin.publish_count(), 1);
        assert_eq!(x_pub.publish_count(), 1);

        let li_record = ledger.get(Platform::Linkedin, "https://example.com/1").unwrap();
        assert!(li_record.posted_at.is_some());
        assert!(li_record.linkedin_text.is_some());
        assert!(li_record.x_text.is_none());

        let x_record = ledger.get(Platform::X, "https://example.com/1").unwrap();
        assert!(x_record.posted_at.is_some());
        assert!(x_record.x_text.is_some());
    }

    #[tokio::test]
    async fn test_already_posted_skips_publisher() {
        let x_source = Arc::new(FakeSource::with_items(vec![item(
            "First",
            "https://example.com/1",
        )]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::enabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::enabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        // Simulate a prior successful run for both platforms
        for platform in Platform::ALL {
            ledger
                .record_post(NewPostRecord {
                    platform,
                    source: ContentSource::X,
                    source_url: "https://example.com/1".to_string(),
                    title: Some("First".to_string()),
                    linkedin_text: None,
                    x_text: None,
                    success: true,
                    error: None,
                })
                .await
                .unwrap();
        }

        let pipeline = Pipeline::new(
            Some(x_source),
            None::<Arc<FakeSource>>,
            generator,
            Arc::clone(&linkedin),
            Arc::clone(&x_pub),
            ledger,
            pipeline_config(),
        );

        let report = pipeline.run_once().await;

        assert_eq!(linkedin.publish_count(), 0);
        assert_eq!(x_pub.publish_count(), 0);
        assert!(
            report
                .published
                .iter()
                .all(|(_, outcome)| *outcome == PublishOutcome::AlreadyPosted)
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_queue_pending_records() {
        let x_source = Arc::new(FakeSource::with_items(vec![item(
            "First",
            "https://example.com/1",
        )]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::disabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::disabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        let pipeline = Pipeline::new(
            Some(x_source),
            None::<Arc<FakeSource>>,
            generator,
            Arc::clone(&linkedin),
            Arc::clone(&x_pub),
            Arc::clone(&ledger),
            pipeline_config(),
        );

        let report = pipeline.run_once().await;

        assert_eq!(linkedin.publish_count(), 0);
        assert_eq!(x_pub.publish_count(), 0);
        assert!(
            report
                .published
                .iter()
                .all(|(_, outcome)| *outcome == PublishOutcome::QueuedPending)
        );

        let record = ledger.get(Platform::Linkedin, "https://example.com/1").unwrap();
        assert!(record.is_pending());
        assert_eq!(
            record.error.as_deref(),
            Some("pending: missing linkedin credentials")
        );

        let record = ledger.get(Platform::X, "https://example.com/1").unwrap();
        assert_eq!(record.error.as_deref(), Some("pending: missing x credentials"));
    }

    #[tokio::test]
    async fn test_failed_publish_records_error_and_stays_pending() {
        let x_source = Arc::new(FakeSource::with_items(vec![item(
            "First",
            "https://example.com/1",
        )]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::enabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::failing(Platform::X, "boom"));
        let ledger = Arc::new(FakeLedger::new());

        let pipeline = Pipeline::new(
            Some(x_source),
            None::<Arc<FakeSource>>,
            generator,
            linkedin,
            x_pub,
            Arc::clone(&ledger),
            pipeline_config(),
        );

        pipeline.run_once().await;

        let record = ledger.get(Platform::X, "https://example.com/1").unwrap();
        assert!(record.is_pending());
        assert!(record.error.as_deref().unwrap().contains("boom"));

        assert!(
            ledger
                .has_been_posted(Platform::X, "https://example.com/1")
                .await
                .unwrap()
                == false
        );
        assert!(
            ledger
                .exists_record(Platform::X, "https://example.com/1")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_retry_sweep_publishes_pending_without_refetching() {
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::disabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::enabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        ledger.insert_pending(Platform::X, "https://example.com/queued", Some("Queued text"), None);

        let pipeline = Pipeline::new(
            None::<Arc<FakeSource>>,
            None::<Arc<FakeSource>>,
            Arc::clone(&generator),
            Arc::clone(&linkedin),
            Arc::clone(&x_pub),
            Arc::clone(&ledger),
            pipeline_config(),
        );

        let report = pipeline.run_once().await;

        // Only the X publisher was invoked, once, for the queued record
        assert_eq!(x_pub.publish_count(), 1);
        assert_eq!(linkedin.publish_count(), 0);
        assert_eq!(report.retried, vec![(Platform::X, 1, 1)]);

        // No sources configured, so fetch/generate never ran
        assert_eq!(report.fetched, 0);
        assert_eq!(generator.call_count(), 0);

        let record = ledger.get(Platform::X, "https://example.com/queued").unwrap();
        assert!(record.posted_at.is_some());
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_reddit_fallback_on_x_rate_limit() {
        let x_source = Arc::new(FakeSource::rate_limited());
        let reddit = Arc::new(FakeSource::with_items(vec![item(
            "Reddit item",
            "https://reddit.example/1",
        )]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::enabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::enabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        let pipeline = Pipeline::new(
            Some(Arc::clone(&x_source)),
            Some(Arc::clone(&reddit)),
            generator,
            linkedin,
            x_pub,
            ledger,
            pipeline_config(),
        );

        let report = pipeline.run_once().await;

        assert_eq!(x_source.call_count(), 1);
        assert_eq!(reddit.call_count(), 1);
        assert_eq!(report.fetched, 1);
    }

    #[tokio::test]
    async fn test_reddit_skipped_when_x_delivers() {
        let x_source = Arc::new(FakeSource::with_items(vec![item(
            "X item",
            "https://x.example/1",
        )]));
        let reddit = Arc::new(FakeSource::with_items(vec![item(
            "Reddit item",
            "https://reddit.example/1",
        )]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::enabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::enabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        let pipeline = Pipeline::new(
            Some(x_source),
            Some(Arc::clone(&reddit)),
            generator,
            linkedin,
            x_pub,
            ledger,
            pipeline_config(),
        );

        pipeline.run_once().await;

        assert_eq!(reddit.call_count(), 0);
    }

    #[tokio::test]
    async fn test_override_items_bypass_fetching() {
        let x_source = Arc::new(FakeSource::with_items(vec![item(
            "Live item",
            "https://live.example/1",
        )]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::enabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::enabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        let config = PipelineConfig {
            override_items: Some(vec![item("Sample", "https://sample.example/1")]),
            ..pipeline_config()
        };

        let pipeline = Pipeline::new(
            Some(Arc::clone(&x_source)),
            None::<Arc<FakeSource>>,
            generator,
            linkedin,
            Arc::clone(&x_pub),
            Arc::clone(&ledger),
            config,
        );

        pipeline.run_once().await;

        assert_eq!(x_source.call_count(), 0);
        assert!(
            ledger
                .exists_record(Platform::X, "https://sample.example/1")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let x_source = Arc::new(FakeSource::with_items(vec![item(
            "First",
            "https://example.com/1",
        )]));
        let generator = Arc::new(FakeGenerator::new());
        let linkedin = Arc::new(FakePublisher::enabled(Platform::Linkedin));
        let x_pub = Arc::new(FakePublisher::enabled(Platform::X));
        let ledger = Arc::new(FakeLedger::new());

        let config = PipelineConfig {
            dry_run: true,
            ..pipeline_config()
        };

        let pipeline = Pipeline::new(
            Some(x_source),
            None::<Arc<FakeSource>>,
            generator,
            Arc::clone(&linkedin),
            Arc::clone(&x_pub),
            Arc::clone(&ledger),
            config,
        );

        let report = pipeline.run_once().await;

        assert_eq!(linkedin.publish_count(), 0);
        assert_eq!(x_pub.publish_count(), 0);
        assert!(
            !ledger
                .exists_record(Platform::X, "https://example.com/1")
                .await
                .unwrap()
        );
        assert!(
            report
                .published
                .iter()
                .all(|(_, outcome)| *outcome == PublishOutcome::DryRun)
        );
    }
}
