//! Icon cache façade.
//!
//! Owns the LRU store, the in-flight job book and the background runtime
//! renders run on. Handles are cheap clones of one shared instance.
//!
//! Lock order is always `loads` then `cache`. Only map operations happen
//! under either lock; decoding runs on the runtime's blocking pool.

use crate::cache::IconCache;
use crate::config::IconCacheConfig;
use crate::coordinator::{JobTicket, JoinedLoad, LoadCoordinator, LoadResult};
use crate::error::IconError;
use crate::renderer::{BitmapRenderer, IconRenderer};
use crate::types::{CacheUtilization, IconSource, RenderedIcon};
use log::{debug, info, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::runtime::{Builder, Runtime};

/// Handle to the shared icon cache.
#[derive(Clone)]
pub struct IconCacheManager {
    inner: Arc<Inner>,
}

struct Inner {
    icon_size: u32,
    renderer: Arc<dyn IconRenderer>,
    loads: Mutex<LoadCoordinator>,
    cache: Mutex<IconCache>,
    runtime: Mutex<Option<Runtime>>,
    destroyed: AtomicBool,
}

/// Pending result of [`IconCacheManager::try_load_icon`].
///
/// The load is registered when `try_load_icon` returns, not when this is
/// first polled, so two calls made back to back share one render even if
/// neither has been awaited yet.
pub struct IconLoad {
    state: LoadState,
}

enum LoadState {
    Done(Option<LoadResult>),
    Waiting(JoinedLoad),
}

impl IconLoad {
    fn done(result: LoadResult) -> Self {
        Self {
            state: LoadState::Done(Some(result)),
        }
    }

    /// True if the icon was served from the cache without a render.
    pub fn is_cache_hit(&self) -> bool {
        matches!(self.state, LoadState::Done(Some(Ok(_))))
    }
}

impl Future for IconLoad {
    type Output = LoadResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            LoadState::Done(result) => {
                Poll::Ready(result.take().expect("IconLoad polled after completion"))
            }
            LoadState::Waiting(load) => Pin::new(load).poll(cx),
        }
    }
}

impl IconCacheManager {
    /// Create a manager that renders with [`BitmapRenderer`].
    pub fn new(config: IconCacheConfig) -> Result<Self, IconError> {
        Self::with_renderer(config, Arc::new(BitmapRenderer::new()))
    }

    /// Create a manager with a custom renderer.
    pub fn with_renderer(
        config: IconCacheConfig,
        renderer: Arc<dyn IconRenderer>,
    ) -> Result<Self, IconError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.worker_threads.max(1))
            .thread_name("icon-loader")
            .build()
            .map_err(|e| IconError::Runtime(e.to_string()))?;

        let icon_size = config.icon_size();
        let capacity = config.cache_capacity();
        info!(
            "Icon cache ready: {}px icons, {} bytes capacity, {} render threads",
            icon_size,
            capacity,
            config.worker_threads.max(1)
        );

        Ok(Self {
            inner: Arc::new(Inner {
                icon_size,
                renderer,
                loads: Mutex::new(LoadCoordinator::new(runtime.handle().clone())),
                cache: Mutex::new(IconCache::new(capacity)),
                runtime: Mutex::new(Some(runtime)),
                destroyed: AtomicBool::new(false),
            }),
        })
    }

    /// Rendered icon edge length in pixels.
    pub fn icon_size(&self) -> u32 {
        self.inner.icon_size
    }

    /// Cache probe for the fast path. Never starts a render.
    pub fn get_cached_icon(&self, key: &str) -> Option<RenderedIcon> {
        if self.is_destroyed() {
            return None;
        }
        lock(&self.inner.cache).get(key)
    }

    /// Load an icon, rendering it in the background on a miss.
    ///
    /// Failures are logged and come back as `None`; the caller is expected
    /// to show a placeholder.
    pub fn load_icon(
        &self,
        key: &str,
        source: IconSource,
    ) -> impl Future<Output = Option<RenderedIcon>> + Send + 'static {
        let load = self.try_load_icon(key, source);
        let key = key.to_string();
        async move {
            match load.await {
                Ok(icon) => Some(icon),
                Err(e) => {
                    debug!("Icon load for '{}' failed: {}", key, e);
                    None
                }
            }
        }
    }

    /// Like [`load_icon`](Self::load_icon) but reports why a load failed.
    pub fn try_load_icon(&self, key: &str, source: IconSource) -> IconLoad {
        if self.is_destroyed() {
            return IconLoad::done(Err(IconError::Destroyed));
        }
        if let Some(icon) = self.get_cached_icon(key) {
            return IconLoad::done(Ok(icon));
        }

        let mut loads = lock(&self.inner.loads);

        // A job may have finished between the probe above and taking the lock.
        if let Some(icon) = lock(&self.inner.cache).get(key) {
            return IconLoad::done(Ok(icon));
        }
        if self.is_destroyed() {
            return IconLoad::done(Err(IconError::Destroyed));
        }

        let renderer = self.inner.renderer.clone();
        let size = self.inner.icon_size;
        let weak = Arc::downgrade(&self.inner);

        let joined = loads.obtain_or_join(
            key,
            source,
            move |source| renderer.render(&source, size),
            move |ticket, key, result| Inner::complete(&weak, ticket, key, result),
        );

        IconLoad {
            state: LoadState::Waiting(joined),
        }
    }

    /// Start background loads for every app not already cached.
    ///
    /// Returns immediately with the number of loads started or joined.
    /// There is no completion signal.
    pub fn preload_icons<I, K>(&self, apps: I) -> usize
    where
        I: IntoIterator<Item = (K, IconSource)>,
        K: AsRef<str>,
    {
        if self.is_destroyed() {
            return 0;
        }

        let mut started = 0;
        for (key, source) in apps {
            let key = key.as_ref();
            if lock(&self.inner.cache).contains(key) {
                continue;
            }
            drop(self.try_load_icon(key, source));
            started += 1;
        }

        debug!("Preloading {} icons", started);
        started
    }

    /// Evict every icon and forget in-flight jobs.
    ///
    /// Renders already running finish for their own callers but are not
    /// written back into the cache.
    pub fn clear_cache(&self) {
        let mut loads = lock(&self.inner.loads);
        loads.clear();
        lock(&self.inner.cache).evict_all();
        info!("Icon cache cleared");
    }

    /// Cancel all background work and empty the cache.
    ///
    /// The handle stays safe to use afterwards but every lookup misses and
    /// every load fails with [`IconError::Destroyed`].
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        lock(&self.inner.loads).cancel_all();
        lock(&self.inner.cache).evict_all();

        if let Some(runtime) = lock(&self.inner.runtime).take() {
            runtime.shutdown_background();
        }
        info!("Icon cache destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    pub fn utilization(&self) -> CacheUtilization {
        lock(&self.inner.cache).utilization()
    }

    /// One-line summary for logs.
    pub fn cache_info(&self) -> String {
        let usage = self.utilization();
        format!(
            "Cache: {} icons, {}% full",
            usage.count, usage.percent_full
        )
    }

    /// Number of renders currently tracked.
    pub fn in_flight(&self) -> usize {
        lock(&self.inner.loads).in_flight()
    }

    /// True if both handles refer to the same manager instance.
    pub fn ptr_eq(&self, other: &IconCacheManager) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Inner {
    /// Runs on the loader runtime once a render returns.
    fn complete(weak: &Weak<Inner>, ticket: JobTicket, key: &str, result: &LoadResult) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if inner.destroyed.load(Ordering::Acquire) {
            debug!("Dropping icon '{}' rendered after teardown", key);
            return;
        }

        let mut loads = lock(&inner.loads);
        if !loads.finish(key, ticket) {
            debug!("Discarding stale render for '{}'", key);
            return;
        }

        match result {
            Ok(icon) => lock(&inner.cache).put(key.to_string(), icon.clone()),
            Err(e) => warn!("Failed to render icon for '{}': {}", key, e),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let runtime = self
            .runtime
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            runtime.shutdown_background();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use image::RgbaImage;
    use std::sync::Condvar;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Renderer that counts calls and can hold renders until released.
    struct TestRenderer {
        calls: AtomicUsize,
        gated: bool,
        open: Mutex<bool>,
        cv: Condvar,
        fail_next: AtomicBool,
    }

    impl TestRenderer {
        fn new() -> Arc<Self> {
            Self::build(false)
        }

        fn gated() -> Arc<Self> {
            Self::build(true)
        }

        fn build(gated: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gated,
                open: Mutex::new(false),
                cv: Condvar::new(),
                fail_next: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.cv.notify_all();
        }

        async fn wait_for_calls(&self, n: usize) {
            for _ in 0..500 {
                if self.calls() >= n {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            panic!("renderer never reached {n} calls");
        }
    }

    impl IconRenderer for TestRenderer {
        fn render(&self, _: &IconSource, size: u32) -> Result<RenderedIcon, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.gated {
                let mut open = self.open.lock().unwrap();
                while !*open {
                    open = self.cv.wait(open).unwrap();
                }
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(RenderError::Decode("bad icon".into()));
            }
            Ok(RenderedIcon::new(RgbaImage::new(size, size)))
        }
    }

    fn config() -> IconCacheConfig {
        IconCacheConfig::default()
            .with_icon_size_dp(8)
            .with_worker_threads(2)
    }

    fn manager(renderer: &Arc<TestRenderer>) -> IconCacheManager {
        IconCacheManager::with_renderer(config(), renderer.clone()).unwrap()
    }

    fn source() -> IconSource {
        IconSource::from_rgba(1, 1, vec![0u8; 4])
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..500 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_unrequested_key_is_absent() {
        let renderer = TestRenderer::new();
        let manager = manager(&renderer);

        assert!(manager.get_cached_icon("pkg.never").is_none());
        assert_eq!(renderer.calls(), 0);
        assert_eq!(manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_back_to_back_loads_render_once() {
        let renderer = TestRenderer::gated();
        let manager = manager(&renderer);

        let first = manager.try_load_icon("pkg.x", source());
        let second = manager.try_load_icon("pkg.x", source());
        renderer.release();

        let (a, b) = tokio::join!(first, second);
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(a.ptr_eq(&b));
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_many_concurrent_callers_share_one_render() {
        let renderer = TestRenderer::gated();
        let manager = manager(&renderer);

        let loads: Vec<_> = (0..8)
            .map(|_| tokio::spawn(manager.load_icon("pkg.many", source())))
            .collect();
        renderer.release();

        let mut icons = Vec::new();
        for load in loads {
            icons.push(load.await.unwrap().unwrap());
        }

        assert_eq!(renderer.calls(), 1);
        assert!(icons.iter().all(|icon| icon.ptr_eq(&icons[0])));
    }

    #[tokio::test]
    async fn test_loaded_icon_is_served_from_cache() {
        let renderer = TestRenderer::new();
        let manager = manager(&renderer);

        let loaded = manager.load_icon("pkg.a", source()).await.unwrap();
        assert_eq!(loaded.width(), 8);

        let cached = manager.get_cached_icon("pkg.a").unwrap();
        assert!(cached.ptr_eq(&loaded));

        let again = manager.try_load_icon("pkg.a", source());
        assert!(again.is_cache_hit());
        assert!(again.await.unwrap().ptr_eq(&loaded));
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_absent_and_retryable() {
        let renderer = TestRenderer::gated();
        renderer.fail_next.store(true, Ordering::SeqCst);
        let manager = manager(&renderer);

        let first = manager.try_load_icon("pkg.bad", source());
        let second = manager.load_icon("pkg.bad", source());
        renderer.release();

        let (a, b) = tokio::join!(first, second);
        assert!(matches!(a, Err(IconError::Render(RenderError::Decode(_)))));
        assert!(b.is_none());
        assert!(manager.get_cached_icon("pkg.bad").is_none());
        assert_eq!(manager.in_flight(), 0);

        assert!(manager.load_icon("pkg.bad", source()).await.is_some());
        assert_eq!(renderer.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_empties_and_discards_stragglers() {
        let renderer = TestRenderer::gated();
        let manager = manager(&renderer);

        let straggler = manager.try_load_icon("pkg.b", source());
        renderer.wait_for_calls(1).await;

        manager.clear_cache();
        assert_eq!(manager.in_flight(), 0);
        renderer.release();

        assert!(straggler.await.is_ok());
        assert!(manager.get_cached_icon("pkg.b").is_none());
        assert_eq!(manager.utilization().count, 0);

        assert!(manager.load_icon("pkg.b", source()).await.is_some());
        assert_eq!(renderer.calls(), 2);
        assert!(manager.get_cached_icon("pkg.b").is_some());
    }

    #[tokio::test]
    async fn test_clear_cache_evicts_previous_entries() {
        let renderer = TestRenderer::new();
        let manager = manager(&renderer);

        manager.load_icon("pkg.a", source()).await.unwrap();
        manager.load_icon("pkg.b", source()).await.unwrap();
        manager.clear_cache();

        assert!(manager.get_cached_icon("pkg.a").is_none());
        assert!(manager.get_cached_icon("pkg.b").is_none());
    }

    #[tokio::test]
    async fn test_destroy_during_render() {
        let renderer = TestRenderer::gated();
        let manager = manager(&renderer);

        let load = manager.try_load_icon("pkg.y", source());
        renderer.wait_for_calls(1).await;

        manager.destroy();
        renderer.release();

        assert_eq!(load.await.unwrap_err(), IconError::Cancelled);
        assert!(manager.get_cached_icon("pkg.y").is_none());
        assert_eq!(manager.utilization().count, 0);
        assert_eq!(manager.in_flight(), 0);

        let after = manager.try_load_icon("pkg.y", source()).await;
        assert_eq!(after.unwrap_err(), IconError::Destroyed);
        assert!(manager.load_icon("pkg.y", source()).await.is_none());
        assert_eq!(manager.preload_icons([("pkg.z", source())]), 0);

        manager.destroy();
    }

    #[test]
    fn test_render_completing_during_destroy_is_dropped() {
        let renderer = TestRenderer::new();
        let manager = manager(&renderer);
        let tearing_down = manager.clone();
        let weak = Arc::downgrade(&manager.inner);
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let render = {
            let renderer = renderer.clone();
            move |source: IconSource| renderer.render(&source, 8)
        };
        // destroy() lands after the render returned but before the result
        // is published.
        let joined = lock(&manager.inner.loads).obtain_or_join(
            "pkg.late",
            source(),
            render,
            move |ticket, key, result| {
                tearing_down.destroy();
                Inner::complete(&weak, ticket, key, result);
                let _ = done_tx.send(result.is_ok());
            },
        );
        drop(joined);

        assert!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap());
        assert_eq!(renderer.calls(), 1);
        assert!(manager.is_destroyed());
        assert_eq!(manager.utilization().count, 0);
        assert_eq!(manager.in_flight(), 0);
        assert!(manager.get_cached_icon("pkg.late").is_none());
    }

    #[tokio::test]
    async fn test_oversized_icon_returned_but_not_kept() {
        let renderer = TestRenderer::new();
        let manager = IconCacheManager::with_renderer(
            config().with_max_cache_bytes(100),
            renderer.clone(),
        )
        .unwrap();

        let icon = manager.load_icon("pkg.big", source()).await.unwrap();
        assert_eq!(icon.byte_size(), 8 * 8 * 4);
        assert!(manager.get_cached_icon("pkg.big").is_none());
    }

    #[tokio::test]
    async fn test_preload_warms_cache() {
        let renderer = TestRenderer::new();
        let manager = manager(&renderer);
        manager.load_icon("pkg.a", source()).await.unwrap();

        let apps = vec![
            ("pkg.a".to_string(), source()),
            ("pkg.b".to_string(), source()),
            ("pkg.c".to_string(), source()),
        ];
        assert_eq!(manager.preload_icons(apps.clone()), 2);

        wait_until(|| manager.utilization().count == 3).await;
        assert_eq!(renderer.calls(), 3);
        assert_eq!(manager.preload_icons(apps), 0);
    }

    #[tokio::test]
    async fn test_cache_info_format() {
        let renderer = TestRenderer::new();
        let manager = IconCacheManager::with_renderer(
            config().with_max_cache_bytes(1024),
            renderer.clone(),
        )
        .unwrap();

        manager.load_icon("pkg.a", source()).await.unwrap();
        assert_eq!(manager.cache_info(), "Cache: 1 icons, 25% full");
    }
}
