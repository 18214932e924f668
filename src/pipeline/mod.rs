//! Serving pipeline: parse, validate, look up, resize, respond.
//!
//! The pipeline is independent of the HTTP framework. It turns a request
//! path plus [`RequestConditions`] into a [`PipelineResponse`] that the
//! Rocket layer only has to render.

pub mod conditional;
pub mod inflight;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use conditional::{RequestConditions, ResponseHeaders};
pub use inflight::InFlight;

use crate::cache::{CacheError, CacheKey, CachedImageItem, PolicyCache};
use crate::cancel::CancelToken;
use crate::images::{CodecError, ResizeEngine};
use crate::models::ResizeRequest;
use crate::protocol::{self, MappingValidator, ParseOutcome};
use crate::source::{SourceError, SourceProvider};
use crate::timestamp;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Malformed resize request")]
    ParseInvalid,

    #[error("Request not in allowed mappings: {0}")]
    ValidationRejected(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Source access denied: {0}")]
    SourceAccessDenied(String),

    #[error("Source too large: {0}")]
    SourceTooLarge(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Cache error: {0}")]
    CacheBackend(#[from] CacheError),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ServeError {
    /// Expected failures are answered with a 404; the rest reach the host.
    pub fn is_expected(&self) -> bool {
        match self {
            ServeError::ParseInvalid
            | ServeError::ValidationRejected(_)
            | ServeError::SourceNotFound(_)
            | ServeError::SourceAccessDenied(_)
            | ServeError::SourceTooLarge(_)
            | ServeError::Codec(_)
            | ServeError::Cancelled => true,
            ServeError::CacheBackend(_) | ServeError::Unexpected(_) => false,
        }
    }

    // Answered with a 404 but worth an operator's attention
    fn is_source_defect(&self) -> bool {
        matches!(
            self,
            ServeError::SourceTooLarge(_)
                | ServeError::Codec(
                    CodecError::Decode(_)
                        | CodecError::Encode(_)
                        | CodecError::UnsupportedFormat(_)
                )
        )
    }
}

impl From<SourceError> for ServeError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(path) => ServeError::SourceNotFound(path),
            SourceError::AccessDenied(path) => ServeError::SourceAccessDenied(path),
            err @ SourceError::TooLarge { .. } => ServeError::SourceTooLarge(err.to_string()),
            other => ServeError::Unexpected(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PipelineResponse {
    /// The path does not belong to this pipeline.
    Skip,
    NotFound,
    NotModified {
        headers: ResponseHeaders,
    },
    Ok {
        headers: ResponseHeaders,
        content_type: &'static str,
        body: Arc<[u8]>,
    },
}

pub struct ServingPipeline {
    prefix: String,
    validator: MappingValidator,
    auto_format: bool,
    cache_control: String,
    source: Arc<dyn SourceProvider>,
    cache: PolicyCache,
    engine: ResizeEngine,
    inflight: InFlight,
}

impl ServingPipeline {
    pub fn new(
        prefix: impl Into<String>,
        validator: MappingValidator,
        source: Arc<dyn SourceProvider>,
        cache: PolicyCache,
        engine: ResizeEngine,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            validator,
            auto_format: false,
            cache_control: "no-cache".to_string(),
            source,
            cache,
            engine,
            inflight: InFlight::new(),
        }
    }

    pub fn with_auto_format(mut self, auto_format: bool) -> Self {
        self.auto_format = auto_format;
        self
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        protocol::matches_prefix(&self.prefix, path)
    }

    /// Serves `path`, turning expected failures into [`PipelineResponse::NotFound`].
    ///
    /// Unexpected failures are logged with the path and returned.
    pub async fn handle(
        &self,
        path: &str,
        conditions: &RequestConditions,
        cancel: &CancelToken,
    ) -> Result<PipelineResponse, ServeError> {
        match self.serve(path, conditions, cancel).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_source_defect() => {
                log::warn!("Cannot resize {}: {}", path, err);
                Ok(PipelineResponse::NotFound)
            }
            Err(err) if err.is_expected() => {
                log::debug!("Not serving {}: {}", path, err);
                Ok(PipelineResponse::NotFound)
            }
            Err(err) => {
                log::error!("Failed to serve {}: {}", path, err);
                Err(err)
            }
        }
    }

    pub async fn serve(
        &self,
        path: &str,
        conditions: &RequestConditions,
        cancel: &CancelToken,
    ) -> Result<PipelineResponse, ServeError> {
        let request = match protocol::parse(&self.prefix, path) {
            ParseOutcome::Skip => return Ok(PipelineResponse::Skip),
            ParseOutcome::Invalid => return Err(ServeError::ParseInvalid),
            ParseOutcome::Valid(request) => request,
        };

        if !self.validator.is_allowed(&request) {
            return Err(ServeError::ValidationRejected(
                protocol::generate(&self.prefix, &request),
            ));
        }

        let request = if self.auto_format {
            self.validator.negotiate_format(
                &request,
                conditions.accept.as_deref(),
                |format| self.engine.supports_format(format),
            )
        } else {
            request
        };

        let key = CacheKey::new(&request);
        let source_last_modified = match self.source.last_modified(&request.source_path).await {
            Ok(last_modified) => last_modified,
            Err(err) => return Err(self.source_failed(&key, err).await),
        };

        if let Some(response) = self
            .try_respond_from_cache(&key, source_last_modified, conditions)
            .await?
        {
            log::debug!("Cache hit for {}", request.source_path);
            return Ok(response);
        }

        let _guard = self.inflight.acquire(&key).await;
        if cancel.is_cancelled() {
            return Err(ServeError::Cancelled);
        }
        // Another request may have filled the entry while we waited
        if let Some(response) = self
            .try_respond_from_cache(&key, source_last_modified, conditions)
            .await?
        {
            return Ok(response);
        }

        let item = self.render(&key, request, cancel).await?;
        self.cache.store(&item).await?;

        if let Some(response) = self.not_modified(&item, conditions) {
            return Ok(response);
        }
        let body = item
            .content()
            .load()
            .await
            .map_err(|e| ServeError::Unexpected(e.to_string()))?;
        Ok(self.full_response(&item, body))
    }

    async fn source_failed(&self, key: &CacheKey, err: SourceError) -> ServeError {
        if let SourceError::NotFound(_) = err {
            if let Err(cache_err) = self.cache.remove(key).await {
                return cache_err.into();
            }
        }
        err.into()
    }

    async fn try_respond_from_cache(
        &self,
        key: &CacheKey,
        source_last_modified: Option<DateTime<Utc>>,
        conditions: &RequestConditions,
    ) -> Result<Option<PipelineResponse>, ServeError> {
        let item = match self.cache.try_get(key, source_last_modified).await? {
            Some(item) => item,
            None => return Ok(None),
        };

        if let Some(response) = self.not_modified(&item, conditions) {
            return Ok(Some(response));
        }
        Ok(self
            .cache
            .load(&item)
            .await?
            .map(|body| self.full_response(&item, body)))
    }

    async fn render(
        &self,
        key: &CacheKey,
        request: ResizeRequest,
        cancel: &CancelToken,
    ) -> Result<CachedImageItem, ServeError> {
        let source = match self.source.get(&request.source_path).await {
            Ok(source) => source,
            Err(err) => return Err(self.source_failed(key, err).await),
        };
        if cancel.is_cancelled() {
            return Err(ServeError::Cancelled);
        }
        log::info!(
            "Cache miss, resizing {} to {}x{} {} as {}",
            request.source_path,
            request.width,
            request.height,
            request.mode,
            request.format
        );

        let engine = self.engine.clone();
        let token = cancel.clone();
        let job = request.clone();
        let content = source.content;
        let resized = tokio::task::spawn_blocking(move || engine.resize(&content, &job, &token))
            .await
            .map_err(|e| ServeError::Unexpected(format!("Resize task failed: {}", e)))?
            .map_err(|err| match err {
                CodecError::Cancelled => ServeError::Cancelled,
                err => ServeError::Codec(err),
            })?;

        // Never older than the source, so a skewed source clock cannot
        // make the entry permanently stale
        let now = timestamp::now();
        let created = source.last_modified.map_or(now, |modified| modified.max(now));
        Ok(CachedImageItem::new(request, resized, Some(created)))
    }

    fn is_cacheable(&self) -> bool {
        !self
            .cache_control
            .split(',')
            .any(|directive| directive.trim().eq_ignore_ascii_case("no-store"))
    }

    /// A 304 for `item` when the client copy is current.
    fn not_modified(
        &self,
        item: &CachedImageItem,
        conditions: &RequestConditions,
    ) -> Option<PipelineResponse> {
        if !self.is_cacheable() {
            return None;
        }
        let etag = conditional::entity_tag(item.last_modified(), item.length());
        conditional::is_not_modified(conditions, &etag, item.last_modified()).then(|| {
            PipelineResponse::NotModified {
                headers: self.headers(item, Some(etag)),
            }
        })
    }

    fn full_response(&self, item: &CachedImageItem, body: Arc<[u8]>) -> PipelineResponse {
        let etag = self
            .is_cacheable()
            .then(|| conditional::entity_tag(item.last_modified(), item.length()));
        PipelineResponse::Ok {
            headers: self.headers(item, etag),
            content_type: item.request().format.mime_type(),
            body,
        }
    }

    fn headers(&self, item: &CachedImageItem, etag: Option<String>) -> ResponseHeaders {
        let cacheable = etag.is_some();
        ResponseHeaders {
            last_modified: item
                .last_modified()
                .filter(|_| cacheable)
                .map(|t| timestamp::to_http_date(&t)),
            etag,
            cache_control: self.cache_control.clone(),
            vary_accept: self.auto_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::BrokenCache;
    use crate::cache::{CachePolicy, MemoryImageCache};
    use crate::images::backend::tests::MockBackend;
    use crate::images::{CropBox, Quality};
    use crate::models::{AllowedMapping, OutputFormat, ResizeMode};
    use crate::source::tests::MemorySource;
    use chrono::{Duration, TimeZone};

    const PATH: &str = "/images/100/100/uniformfill/jpeg/cat.png";

    struct Fixture {
        pipeline: Arc<ServingPipeline>,
        source: Arc<MemorySource>,
        cache: Arc<MemoryImageCache>,
        backend: Arc<MockBackend>,
    }

    fn allowed(format: OutputFormat) -> AllowedMapping {
        AllowedMapping {
            width: 100,
            height: 100,
            mode: ResizeMode::UniformFill,
            format,
        }
    }

    fn source_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000, 0).unwrap()
    }

    fn fixture_with(
        mappings: Vec<AllowedMapping>,
        configure: impl FnOnce(ServingPipeline) -> ServingPipeline,
    ) -> Fixture {
        let source = Arc::new(MemorySource::new());
        source.insert("/cat.png", b"IMG cat", Some(source_time()));
        let cache = Arc::new(MemoryImageCache::default());
        let backend = Arc::new(MockBackend::new((400, 200)));

        let pipeline = ServingPipeline::new(
            "images",
            MappingValidator::new(mappings, true),
            source.clone(),
            PolicyCache::new(cache.clone(), CachePolicy::BestEffort),
            ResizeEngine::new(backend.clone(), Quality::default()),
        );
        Fixture {
            pipeline: Arc::new(configure(pipeline)),
            source,
            cache,
            backend,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(vec![allowed(OutputFormat::Jpeg)], |p| p)
    }

    async fn get(fixture: &Fixture, path: &str, conditions: &RequestConditions) -> PipelineResponse {
        fixture
            .pipeline
            .handle(path, conditions, &CancelToken::new())
            .await
            .unwrap()
    }

    fn unwrap_ok(response: PipelineResponse) -> (ResponseHeaders, &'static str, Arc<[u8]>) {
        match response {
            PipelineResponse::Ok {
                headers,
                content_type,
                body,
            } => (headers, content_type, body),
            other => panic!("expected a full response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn resizes_allowed_request() {
        let f = fixture();
        let (headers, content_type, body) =
            unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);

        assert_eq!(content_type, "image/jpeg");
        assert_eq!(&*body, b"100x100.jpg");
        assert_eq!(headers.cache_control, "no-cache");
        assert!(headers.etag.is_some());
        assert!(headers.last_modified.is_some());
        assert!(!headers.vary_accept);

        let ops = f.backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            ops[0].crop,
            Some(CropBox {
                x: 100,
                y: 0,
                width: 200,
                height: 200
            })
        );
        assert_eq!(f.cache.len(), 1);
    }

    #[tokio::test]
    async fn unlisted_size_is_not_found_without_resizing() {
        let f = fixture();
        let response = get(
            &f,
            "/images/101/100/uniformfill/jpeg/cat.png",
            &RequestConditions::default(),
        )
        .await;
        assert!(matches!(response, PipelineResponse::NotFound));
        assert!(f.backend.get_operations().is_empty());
        assert_eq!(f.source.read_count(), 0);
    }

    #[tokio::test]
    async fn disabled_validation_allows_any_size() {
        let source = Arc::new(MemorySource::new());
        source.insert("/cat.png", b"IMG cat", None);
        let pipeline = ServingPipeline::new(
            "images",
            MappingValidator::new(Vec::new(), false),
            source,
            PolicyCache::new(Arc::new(MemoryImageCache::default()), CachePolicy::BestEffort),
            ResizeEngine::new(Arc::new(MockBackend::new((400, 200))), Quality::default()),
        );
        let response = pipeline
            .handle(
                "/images/50/20/exactwidthandheight/png/cat.png",
                &RequestConditions::default(),
                &CancelToken::new(),
            )
            .await
            .unwrap();
        let (_, content_type, body) = unwrap_ok(response);
        assert_eq!(content_type, "image/png");
        assert_eq!(&*body, b"50x20.png");
    }

    #[tokio::test]
    async fn foreign_and_malformed_paths() {
        let f = fixture();
        let conditions = RequestConditions::default();
        assert!(matches!(
            get(&f, "/other/100/100/uniformfill/jpeg/cat.png", &conditions).await,
            PipelineResponse::Skip
        ));
        assert!(matches!(
            get(&f, "/images/100/100/uniformfill/jpeg", &conditions).await,
            PipelineResponse::NotFound
        ));
        assert!(matches!(
            get(&f, "/images/0/100/uniformfill/jpeg/cat.png", &conditions).await,
            PipelineResponse::NotFound
        ));
    }

    #[tokio::test]
    async fn repeat_request_is_served_from_cache() {
        let f = fixture();
        let first = unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);
        let second = unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);

        assert_eq!(first.0, second.0);
        assert_eq!(first.2, second.2);
        assert_eq!(f.backend.get_operations().len(), 1);
        assert_eq!(f.source.read_count(), 1);
    }

    #[tokio::test]
    async fn if_modified_since_yields_not_modified() {
        let f = fixture();
        let (headers, _, _) = unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);

        let conditions =
            RequestConditions::from_headers(None, headers.last_modified.as_deref(), None);
        match get(&f, PATH, &conditions).await {
            PipelineResponse::NotModified { headers: not_modified } => {
                assert_eq!(not_modified.etag, headers.etag);
            }
            other => panic!("expected 304, got {:?}", other),
        }

        let earlier = RequestConditions::from_headers(
            None,
            Some("Sun, 06 Nov 1994 08:49:37 GMT"),
            None,
        );
        assert!(matches!(
            get(&f, PATH, &earlier).await,
            PipelineResponse::Ok { .. }
        ));
    }

    #[tokio::test]
    async fn matching_etag_yields_not_modified() {
        let f = fixture();
        let (headers, _, _) = unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);

        let conditions = RequestConditions::from_headers(headers.etag.as_deref(), None, None);
        assert!(matches!(
            get(&f, PATH, &conditions).await,
            PipelineResponse::NotModified { .. }
        ));

        let other = RequestConditions::from_headers(Some("\"nope\""), None, None);
        assert!(matches!(
            get(&f, PATH, &other).await,
            PipelineResponse::Ok { .. }
        ));
    }

    #[tokio::test]
    async fn newer_source_triggers_a_fresh_resize() {
        let f = fixture();
        get(&f, PATH, &RequestConditions::default()).await;

        let later = timestamp::now() + Duration::hours(1);
        f.source.insert("/cat.png", b"IMG cat v2", Some(later));
        let (headers, _, _) = unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);

        assert_eq!(f.backend.get_operations().len(), 2);
        assert_eq!(headers.last_modified, Some(timestamp::to_http_date(&later)));
    }

    #[tokio::test]
    async fn vanished_source_evicts_entry() {
        let f = fixture();
        get(&f, PATH, &RequestConditions::default()).await;
        assert_eq!(f.cache.len(), 1);

        f.source.remove("/cat.png");
        assert!(matches!(
            get(&f, PATH, &RequestConditions::default()).await,
            PipelineResponse::NotFound
        ));
        assert_eq!(f.cache.len(), 0);
    }

    #[tokio::test]
    async fn denied_or_non_image_source_is_not_found() {
        let f = fixture();
        f.source.deny("/cat.png");
        assert!(matches!(
            get(&f, PATH, &RequestConditions::default()).await,
            PipelineResponse::NotFound
        ));

        let f = fixture();
        f.source.insert("/cat.png", b"plain text", None);
        assert!(matches!(
            get(&f, PATH, &RequestConditions::default()).await,
            PipelineResponse::NotFound
        ));
        assert!(f.backend.get_operations().is_empty());
    }

    #[tokio::test]
    async fn concurrent_misses_resize_once() {
        let f = fixture();
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let pipeline = f.pipeline.clone();
            tasks.push(tokio::spawn(async move {
                pipeline
                    .handle(PATH, &RequestConditions::default(), &CancelToken::new())
                    .await
            }));
        }
        for task in tasks {
            let response = task.await.unwrap().unwrap();
            assert!(matches!(response, PipelineResponse::Ok { .. }));
        }
        assert_eq!(f.backend.get_operations().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_request_does_no_work() {
        let f = fixture();
        let cancel = CancelToken::new();
        cancel.cancel();
        let response = f
            .pipeline
            .handle(PATH, &RequestConditions::default(), &cancel)
            .await
            .unwrap();
        assert!(matches!(response, PipelineResponse::NotFound));
        assert!(f.backend.get_operations().is_empty());
        assert_eq!(f.cache.len(), 0);
    }

    #[tokio::test]
    async fn accept_header_upgrades_format() {
        let f = fixture_with(
            vec![allowed(OutputFormat::Jpeg), allowed(OutputFormat::Webp)],
            |p| p.with_auto_format(true),
        );
        let conditions = RequestConditions::from_headers(None, None, Some("image/webp,*/*"));
        let (headers, content_type, body) = unwrap_ok(get(&f, PATH, &conditions).await);
        assert_eq!(content_type, "image/webp");
        assert_eq!(&*body, b"100x100.webp");
        assert!(headers.vary_accept);

        let (_, plain, _) = unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);
        assert_eq!(plain, "image/jpeg");
    }

    #[tokio::test]
    async fn no_store_omits_validators() {
        let f = fixture_with(vec![allowed(OutputFormat::Jpeg)], |p| {
            p.with_cache_control("private, no-store")
        });
        let (headers, _, _) = unwrap_ok(get(&f, PATH, &RequestConditions::default()).await);
        assert_eq!(headers.etag, None);
        assert_eq!(headers.last_modified, None);

        let conditions = RequestConditions::from_headers(Some("*"), None, None);
        assert!(matches!(
            get(&f, PATH, &conditions).await,
            PipelineResponse::Ok { .. }
        ));
    }

    #[tokio::test]
    async fn strict_cache_failures_reach_the_host() {
        let source = Arc::new(MemorySource::new());
        source.insert("/cat.png", b"IMG cat", None);
        let pipeline = ServingPipeline::new(
            "images",
            MappingValidator::new(vec![allowed(OutputFormat::Jpeg)], true),
            source,
            PolicyCache::new(Arc::new(BrokenCache), CachePolicy::Strict),
            ResizeEngine::new(Arc::new(MockBackend::new((400, 200))), Quality::default()),
        );
        let result = pipeline
            .handle(PATH, &RequestConditions::default(), &CancelToken::new())
            .await;
        assert!(matches!(result, Err(ServeError::CacheBackend(_))));
    }

    #[tokio::test]
    async fn best_effort_cache_failures_still_serve() {
        let source = Arc::new(MemorySource::new());
        source.insert("/cat.png", b"IMG cat", None);
        let pipeline = ServingPipeline::new(
            "images",
            MappingValidator::new(vec![allowed(OutputFormat::Jpeg)], true),
            source,
            PolicyCache::new(Arc::new(BrokenCache), CachePolicy::BestEffort),
            ResizeEngine::new(Arc::new(MockBackend::new((400, 200))), Quality::default()),
        );
        let response = pipeline
            .handle(PATH, &RequestConditions::default(), &CancelToken::new())
            .await
            .unwrap();
        assert!(matches!(response, PipelineResponse::Ok { .. }));
    }

    #[tokio::test]
    async fn case_differing_sources_are_resized_separately() {
        let f = fixture_with(vec![allowed(OutputFormat::Jpeg)], |p| p);
        f.source.insert("/Cat.png", b"IMG red", Some(source_time()));

        get(&f, "/images/100/100/uniformfill/jpeg/Cat.png", &RequestConditions::default()).await;
        get(&f, PATH, &RequestConditions::default()).await;

        assert_eq!(f.backend.get_operations().len(), 2);
        assert_eq!(f.source.read_count(), 2);
        assert_eq!(f.cache.len(), 2);
    }

    #[tokio::test]
    async fn codec_failures_are_not_found() {
        let source = Arc::new(MemorySource::new());
        source.insert("/cat.png", b"IMG cat", None);
        let pipeline = ServingPipeline::new(
            "images",
            MappingValidator::new(vec![allowed(OutputFormat::Jpeg)], true),
            source,
            PolicyCache::new(Arc::new(MemoryImageCache::default()), CachePolicy::BestEffort),
            ResizeEngine::new(
                Arc::new(MockBackend::new((400, 200)).without(OutputFormat::Jpeg)),
                Quality::default(),
            ),
        );
        let response = pipeline
            .handle(PATH, &RequestConditions::default(), &CancelToken::new())
            .await
            .unwrap();
        assert!(matches!(response, PipelineResponse::NotFound));
    }

    #[test]
    fn error_classification() {
        assert!(ServeError::ParseInvalid.is_expected());
        assert!(ServeError::SourceAccessDenied("/a".into()).is_expected());
        assert!(ServeError::Codec(CodecError::NotAnImage).is_expected());
        assert!(ServeError::Codec(CodecError::Decode("bad".into())).is_expected());
        assert!(ServeError::Codec(CodecError::Encode("bad".into())).is_expected());
        assert!(ServeError::Codec(CodecError::UnsupportedFormat(OutputFormat::Avif)).is_expected());
        assert!(!ServeError::CacheBackend(CacheError::Backend("down".into())).is_expected());
        assert!(!ServeError::Unexpected("boom".into()).is_expected());
        assert!(matches!(
            ServeError::from(SourceError::NotFound("/a".into())),
            ServeError::SourceNotFound(_)
        ));
        let too_large = ServeError::from(SourceError::TooLarge {
            path: "/a".into(),
            limit: 1,
        });
        assert!(matches!(too_large, ServeError::SourceTooLarge(_)));
        assert!(too_large.is_expected());
    }
}
