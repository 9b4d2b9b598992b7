//! Script source resolution
//!
//! A source string is resolved in order: remote URL, inline code, local
//! path, inline fallback. Remote and file content is memoized in the shared
//! [`SourceCache`] keyed by the exact origin string.

use std::sync::Arc;

use tracing::debug;

use capstan_caching::SourceCache;
use capstan_core::SourceFetcher;

use crate::{ScriptError, ScriptResult};

/// Resolves script origins to source text
#[derive(Clone)]
pub struct ScriptLoader {
    cache: Arc<SourceCache>,
    fetcher: Arc<dyn SourceFetcher>,
}

impl ScriptLoader {
    pub fn new(cache: Arc<SourceCache>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Resolve a source string to JavaScript text.
    pub async fn resolve(&self, source: &str) -> ScriptResult<Arc<str>> {
        if is_remote(source) {
            debug!(origin = %source, "resolving remote script");
            return self
                .cache
                .get_or_fetch(source, || self.fetcher.fetch(source))
                .await
                .map_err(|e| fetch_error(source, e));
        }

        if looks_inline(source) {
            return Ok(Arc::from(source));
        }

        if looks_like_path(source) {
            debug!(path = %source, "resolving script file");
            return self
                .cache
                .get_or_fetch(source, || async {
                    tokio::fs::read_to_string(source).await.map_err(|e| e.into())
                })
                .await
                .map_err(|e| fetch_error(source, e));
        }

        // Anything else is treated as inline code verbatim.
        Ok(Arc::from(source))
    }
}

fn fetch_error(origin: &str, error: anyhow::Error) -> ScriptError {
    ScriptError::SourceFetch {
        origin: origin.to_string(),
        reason: error.to_string(),
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn looks_inline(source: &str) -> bool {
    source.trim_start().starts_with("function") || source.contains("action")
}

fn looks_like_path(source: &str) -> bool {
    source.contains('/') || source.ends_with(".js")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeFetcher {
        calls: AtomicUsize,
        body: Option<String>,
    }

    impl FakeFetcher {
        fn returning(body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                body: Some(body.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                body: None,
            }
        }
    }

    #[async_trait]
    impl SourceFetcher for FakeFetcher {
        async fn fetch(&self, _url: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Some(body) => Ok(body.clone()),
                None => anyhow::bail!("503 Service Unavailable"),
            }
        }
    }

    fn loader_with(fetcher: FakeFetcher) -> (ScriptLoader, Arc<FakeFetcher>) {
        let fetcher = Arc::new(fetcher);
        let loader = ScriptLoader::new(Arc::new(SourceCache::new()), fetcher.clone());
        (loader, fetcher)
    }

    #[tokio::test]
    async fn inline_function_code_is_used_verbatim() {
        let (loader, fetcher) = loader_with(FakeFetcher::returning("unused"));
        let code = "function action(params) { return 1; }";
        let resolved = loader.resolve(code).await.unwrap();
        assert_eq!(&*resolved, code);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_origin_is_fetched_once() {
        let (loader, fetcher) = loader_with(FakeFetcher::returning("function action(p) {}"));
        for _ in 0..3 {
            let resolved = loader
                .resolve("https://example.com/scripts/report.js")
                .await
                .unwrap();
            assert_eq!(&*resolved, "function action(p) {}");
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_names_the_origin() {
        let (loader, _) = loader_with(FakeFetcher::failing());
        let err = loader
            .resolve("https://example.com/missing.js")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("https://example.com/missing.js"));
    }

    #[tokio::test]
    async fn local_path_is_read_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".js").tempfile().unwrap();
        write!(file, "function run(p) {{ return 2; }}").unwrap();
        let (loader, _) = loader_with(FakeFetcher::returning("unused"));
        let resolved = loader
            .resolve(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(&*resolved, "function run(p) { return 2; }");
    }

    #[tokio::test]
    async fn missing_file_reports_the_path() {
        let (loader, _) = loader_with(FakeFetcher::returning("unused"));
        let err = loader.resolve("scripts/missing.js").await.unwrap_err();
        assert!(matches!(err, ScriptError::SourceFetch { .. }));
        assert!(err.to_string().contains("scripts/missing.js"));
    }
}
