//! Request profiling middleware.
//!
//! Each request runs inside a fresh span-timing scope. When it finishes, the
//! most expensive spans are printed to stdout between two rules, and the raw
//! profile is optionally written as JSON to a directory.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::SystemTime;

use axum::http::Request;
use keystone_telemetry::{RequestProfile, with_request_profile};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Separator printed above and below every report.
pub const PROFILE_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Number of report entries shown when no length is requested.
pub const DEFAULT_PROFILE_LENGTH: usize = 25;

/// Profiling options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Entries shown in each printed report.
    pub length: usize,
    /// Directory receiving one JSON file per request, if any.
    pub profile_dir: Option<PathBuf>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_PROFILE_LENGTH,
            profile_dir: None,
        }
    }
}

/// Render the text block printed after a profiled request.
#[must_use]
pub fn render_report(path: &str, profile: &RequestProfile, length: usize) -> String {
    format!(
        "{PROFILE_RULE}\nPATH: {path:?}\n{}{PROFILE_RULE}\n",
        profile.render(length)
    )
}

/// Wraps services so every request is profiled.
#[derive(Clone)]
pub struct ProfilerLayer {
    config: Arc<ProfilerConfig>,
}

impl ProfilerLayer {
    /// Construct the layer.
    #[must_use]
    pub fn new(config: ProfilerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for ProfilerLayer {
    type Service = ProfilerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ProfilerService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Service produced by [`ProfilerLayer`].
#[derive(Clone)]
pub struct ProfilerService<S> {
    inner: S,
    config: Arc<ProfilerConfig>,
}

impl<S, B> Service<Request<B>> for ProfilerService<S>
where
    S: Service<Request<B>, Response = axum::response::Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let method = req.method().as_str().to_string();
        let path = req.uri().path().to_string();
        let config = Arc::clone(&self.config);
        let fut = self.inner.call(req);

        Box::pin(async move {
            let (result, profile) = with_request_profile(fut).await;
            print!("{}", render_report(&path, &profile, config.length));
            if let Some(dir) = &config.profile_dir {
                match profile.persist(dir, &method, &path, SystemTime::now()) {
                    Ok(file) => debug!(file = %file.display(), "profile written"),
                    Err(err) => warn!(error = %err, dir = %dir.display(), "profile not written"),
                }
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::Router;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use keystone_telemetry::SpanTimingLayer;
    use tower::ServiceExt;
    use tracing::instrument;
    use tracing_subscriber::layer::SubscriberExt;

    #[instrument(name = "load_widgets")]
    async fn load_widgets() -> usize {
        tokio::task::yield_now().await;
        3
    }

    async fn widgets() -> String {
        load_widgets().await.to_string()
    }

    #[test]
    fn report_is_framed_by_rules_and_path() {
        let profile = RequestProfile {
            elapsed_us: 1_500,
            entries: Vec::new(),
        };
        let report = render_report("/api/v1/users", &profile, 25);
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0], PROFILE_RULE);
        assert_eq!(lines[1], "PATH: \"/api/v1/users\"");
        assert_eq!(lines.last().copied(), Some(PROFILE_RULE));
    }

    #[tokio::test]
    async fn profiled_requests_write_one_file_each() -> Result<()> {
        let subscriber = tracing_subscriber::registry().with(SpanTimingLayer::new());
        let _default = tracing::subscriber::set_default(subscriber);
        let dir = tempfile::tempdir()?;
        let router = Router::new()
            .route("/widgets", get(widgets))
            .layer(ProfilerLayer::new(ProfilerConfig {
                length: 5,
                profile_dir: Some(dir.path().to_path_buf()),
            }));

        let response = router
            .oneshot(Request::get("/widgets").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let files: Vec<_> = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("GET.widgets."));
        assert!(files[0].ends_with(".json"));

        let body = std::fs::read_to_string(dir.path().join(&files[0]))?;
        let profile: serde_json::Value = serde_json::from_str(&body)?;
        let names: Vec<_> = profile["entries"]
            .as_array()
            .map(|entries| entries.iter().filter_map(|e| e["name"].as_str()).collect())
            .unwrap_or_default();
        assert!(names.contains(&"load_widgets"));
        Ok(())
    }
}
