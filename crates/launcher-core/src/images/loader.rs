//! Background image loader.
//!
//! One dedicated thread consumes a FIFO of weakly referenced
//! [`LoadRequest`]s. For each request that is still alive it resolves the
//! source (through the [`ImageCache`] for `sha1:` references), decodes,
//! applies the resize policy and then posts the request's callback to the
//! UI dispatcher. Requests whose owners dropped them before the worker got
//! there are skipped silently.
//!
//! ```text
//!  load_image ──push Weak──▶ [queue] ──pop live──▶ fill ──dispatch──▶ UI thread
//! ```

use image::GenericImageView;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};

use super::cache::ImageCache;
use super::decode::decode_file;
use super::fetch::HttpFetcher;
use super::request::{LoadOptions, LoadRequest, OnLoad};
use super::resize::{apply_plan, plan_resize};
use super::source::ImageSource;
use crate::config::Config;
use crate::error::{LoadResult, Result};
use crate::signal::{ListenerId, SignalBus, QUIT};
use crate::ui::UiDispatcher;

/// Name of the worker thread.
const WORKER_THREAD_NAME: &str = "image-loader";

struct QueueState {
    requests: VecDeque<Weak<LoadRequest>>,
    stop: bool,
}

/// State shared between the loader handle and its worker.
struct Shared {
    queue: Mutex<QueueState>,
    available: Condvar,
    running: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self) {
        let mut state = self.lock();
        if !state.stop {
            tracing::info!("Stopping image loader");
            state.stop = true;
        }
        drop(state);
        self.available.notify_all();
    }
}

/// Handle to the background image loader.
///
/// Dropping the handle stops the worker but does not wait for it.
pub struct ImageLoader {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ImageLoader {
    /// Start a loader that fetches cache misses over HTTP.
    pub fn new(config: &Config, dispatcher: Arc<dyn UiDispatcher>) -> Result<Self> {
        let cache = ImageCache::new(
            config.image_cache_dir(),
            &config.images,
            Arc::new(HttpFetcher::new()),
        );
        Self::start(cache, config.images.upscale_threshold, dispatcher)
    }

    /// Start a loader around an existing cache.
    pub fn start(
        cache: ImageCache,
        upscale_threshold: u32,
        dispatcher: Arc<dyn UiDispatcher>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                requests: VecDeque::new(),
                stop: false,
            }),
            available: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let worker = Worker {
            shared: shared.clone(),
            cache,
            dispatcher,
            upscale_threshold,
        };
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run())?;

        tracing::debug!("Image loader started");
        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Queue an image load and return its handle immediately.
    ///
    /// The caller must keep the returned `Arc` alive for the load to happen;
    /// the loader itself only holds a weak reference. `on_load` runs on the
    /// UI dispatcher once the worker is done with the request, whether or
    /// not an image was produced.
    pub fn load_image(
        &self,
        source: Option<ImageSource>,
        size: Option<(u32, u32)>,
        options: LoadOptions,
        on_load: Option<OnLoad>,
    ) -> Arc<LoadRequest> {
        let request = Arc::new(LoadRequest::new(source, size, options, on_load));

        if !self.is_running() {
            tracing::warn!(
                "Image loader is not running, {:?} will never load",
                request.source()
            );
            return request;
        }

        self.shared
            .lock()
            .requests
            .push_back(Arc::downgrade(&request));
        self.shared.available.notify_one();
        request
    }

    /// Ask the worker to exit after its current request. Idempotent.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Wait for the worker thread to exit.
    ///
    /// Only returns once [`stop`](Self::stop) has been called (or a quit
    /// signal received).
    pub fn join(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Image loader thread panicked");
            }
        }
    }

    /// Whether the worker thread is still serving requests.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of queued entries, including ones whose owners are gone.
    pub fn pending(&self) -> usize {
        self.shared.lock().requests.len()
    }

    /// Stop the loader when `bus` publishes [`QUIT`].
    pub fn listen_for_quit(&self, bus: &SignalBus) -> ListenerId {
        let shared = Arc::downgrade(&self.shared);
        bus.add_listener(QUIT, move || {
            if let Some(shared) = shared.upgrade() {
                tracing::debug!("Image loader received quit signal");
                shared.stop();
            }
        })
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

/// The worker side, owned by the loader thread.
struct Worker {
    shared: Arc<Shared>,
    cache: ImageCache,
    dispatcher: Arc<dyn UiDispatcher>,
    upscale_threshold: u32,
}

impl Worker {
    fn run(self) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!("Image loader could not start its runtime: {}", e);
                self.shared.running.store(false, Ordering::Release);
                return;
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_loop(&runtime)));
        if let Err(payload) = outcome {
            tracing::error!(
                "Image loader worker died: {}; no further images will load",
                panic_message(payload.as_ref())
            );
        }

        self.shared.running.store(false, Ordering::Release);
        tracing::debug!("Image loader thread exiting");
    }

    fn run_loop(&self, runtime: &tokio::runtime::Runtime) {
        while let Some(request) = self.next_request() {
            self.fill_request(runtime, &request);
            self.notify(request);
        }
    }

    /// Block until a live request is available; `None` once stopped.
    fn next_request(&self) -> Option<Arc<LoadRequest>> {
        let mut state = self.shared.lock();
        loop {
            if state.stop {
                return None;
            }
            while let Some(weak) = state.requests.pop_front() {
                if let Some(request) = weak.upgrade() {
                    return Some(request);
                }
            }
            state = self
                .shared
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Fill `request`, containing errors and panics to this one request.
    fn fill_request(&self, runtime: &tokio::runtime::Runtime, request: &LoadRequest) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_fill(runtime, request)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Failed to load {:?}: {}", request.source(), e);
                request.set_error(e.to_string());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("Panic while loading {:?}: {}", request.source(), message);
                request.set_error(format!("panic: {message}"));
            }
        }
    }

    fn try_fill(&self, runtime: &tokio::runtime::Runtime, request: &LoadRequest) -> LoadResult<()> {
        let Some(source) = request.source() else {
            return Ok(());
        };

        let path: PathBuf = match source {
            ImageSource::Sha1(hash) => {
                let variant = self.cache.variant_for(request.size(), request.is_cover());
                runtime.block_on(self.cache.resolve(hash, &variant))?
            }
            ImageSource::Path(path) => path.clone(),
        };
        if path.as_os_str().is_empty() {
            return Ok(());
        }

        tracing::debug!("Loading image from {}", source);
        let image = decode_file(&path)?;
        let natural = image.dimensions();

        match plan_resize(
            natural,
            request.size(),
            request.is_cover(),
            self.upscale_threshold,
        ) {
            None => request.set_image(image),
            Some(plan) => {
                tracing::trace!(
                    "Resizing {}: {:?} -> {:?} (pre-upscale: {})",
                    source,
                    natural,
                    plan.target,
                    plan.pre_upscale
                );
                request.set_image(apply_plan(image, &plan));
            }
        }
        Ok(())
    }

    /// Post the request's callback to the UI thread.
    fn notify(&self, request: Arc<LoadRequest>) {
        let on_load = request.take_on_load();
        self.dispatcher.dispatch(Box::new(move || {
            if let Some(on_load) = on_load {
                on_load(request);
            }
        }));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImagesConfig;
    use crate::images::ImageFetcher;
    use crate::test_support::{png_bytes, GatedFetcher, MockFetcher, PanickingFetcher};
    use crate::ui::{ui_channel, UiRunLoop};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(10);

    struct Fixture {
        dir: tempfile::TempDir,
        loader: ImageLoader,
        ui: UiRunLoop,
    }

    fn fixture(fetcher: Arc<dyn ImageFetcher>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(
            dir.path().join("cache"),
            &ImagesConfig::default(),
            fetcher,
        );
        let (handle, ui) = ui_channel();
        let loader = ImageLoader::start(cache, 400, Arc::new(handle)).unwrap();
        Fixture { dir, loader, ui }
    }

    async fn run_callbacks(ui: &mut UiRunLoop, count: usize) {
        for _ in 0..count {
            let ran = tokio::time::timeout(WAIT, ui.run_next())
                .await
                .expect("timed out waiting for a load callback");
            assert!(ran);
        }
    }

    fn write_png(dir: &std::path::Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, png_bytes(width, height)).unwrap();
        path
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> OnLoad) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let make = move |label: &str| -> OnLoad {
            let seen = seen_clone.clone();
            let label = label.to_string();
            Box::new(move |_request: Arc<LoadRequest>| seen.lock().unwrap().push(label))
        };
        (seen, make)
    }

    #[tokio::test]
    async fn test_uncached_hash_is_fetched_and_kept_at_natural_size() {
        let fetcher = Arc::new(MockFetcher::serving(png_bytes(32, 24)));
        let mut fx = fixture(fetcher.clone());

        let callback_thread = Arc::new(Mutex::new(None));
        let ct = callback_thread.clone();
        let request = fx.loader.load_image(
            ImageSource::parse("sha1:abc123"),
            None,
            LoadOptions::default(),
            Some(Box::new(move |req: Arc<LoadRequest>| {
                *ct.lock().unwrap() = Some((thread::current().id(), req.image().map(|i| i.dimensions())));
            })),
        );
        run_callbacks(&mut fx.ui, 1).await;

        assert_eq!(fetcher.calls(), vec!["http://oagd.net/image/abc123".to_string()]);
        assert!(fx.dir.path().join("cache").join("ab").join("abc123").exists());
        assert_eq!(request.image().unwrap().dimensions(), (32, 24));

        let (thread_id, dims) = callback_thread.lock().unwrap().take().unwrap();
        assert_eq!(thread_id, thread::current().id());
        assert_eq!(dims, Some((32, 24)));
    }

    #[tokio::test]
    async fn test_cached_cover_skips_network_and_resizes() {
        let fetcher = Arc::new(MockFetcher::serving(png_bytes(1, 1)));
        let mut fx = fixture(fetcher.clone());

        let cached = fx
            .dir
            .path()
            .join("cache")
            .join("ab")
            .join("abc123_117x165_lbcover.png");
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, png_bytes(40, 56)).unwrap();

        let request = fx.loader.load_image(
            ImageSource::parse("sha1:abc123"),
            Some((117, 165)),
            LoadOptions::cover(),
            None,
        );
        run_callbacks(&mut fx.ui, 1).await;

        assert!(fetcher.calls().is_empty());
        assert_eq!(request.image().unwrap().dimensions(), (117, 165));
    }

    #[tokio::test]
    async fn test_near_square_cover_is_squared() {
        let mut fx = fixture(Arc::new(MockFetcher::failing()));
        let path = write_png(fx.dir.path(), "square.png", 50, 50);

        let request = fx.loader.load_image(
            Some(ImageSource::Path(path)),
            Some((117, 165)),
            LoadOptions::cover(),
            None,
        );
        run_callbacks(&mut fx.ui, 1).await;

        assert_eq!(request.image().unwrap().dimensions(), (117, 117));
    }

    #[tokio::test]
    async fn test_requests_are_processed_in_fifo_order() {
        let mut fx = fixture(Arc::new(MockFetcher::failing()));
        let (seen, on_load) = recorder();

        let mut requests = Vec::new();
        for name in ["a", "b", "c", "d"] {
            let path = write_png(fx.dir.path(), &format!("{name}.png"), 8, 8);
            requests.push(fx.loader.load_image(
                Some(ImageSource::Path(path)),
                None,
                LoadOptions::default(),
                Some(on_load(name)),
            ));
        }
        run_callbacks(&mut fx.ui, 4).await;

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c", "d"]);
        assert!(requests.iter().all(|r| r.is_filled()));
    }

    #[tokio::test]
    async fn test_dropped_request_is_skipped() {
        let (fetcher, gate) = GatedFetcher::new(png_bytes(8, 8));
        let mut fx = fixture(Arc::new(fetcher));
        let (seen, on_load) = recorder();

        let first = fx.loader.load_image(
            ImageSource::parse("sha1:aaa111"),
            None,
            LoadOptions::default(),
            Some(on_load("first")),
        );
        gate.started.recv_timeout(WAIT).unwrap();

        let dropped = fx.loader.load_image(
            ImageSource::parse("sha1:bbb222"),
            None,
            LoadOptions::default(),
            Some(on_load("dropped")),
        );
        let last = fx.loader.load_image(
            ImageSource::parse("sha1:ccc333"),
            None,
            LoadOptions::default(),
            Some(on_load("last")),
        );
        assert_eq!(fx.loader.pending(), 2);
        drop(dropped);
        gate.release.send(()).unwrap();

        run_callbacks(&mut fx.ui, 2).await;
        fx.loader.stop();
        fx.loader.join();

        assert_eq!(fx.ui.run_pending(), 0);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "last"]);
        assert!(first.is_filled());
        assert!(last.is_filled());
    }

    #[tokio::test]
    async fn test_stop_mid_fill_finishes_current_request_only() {
        let (fetcher, gate) = GatedFetcher::new(png_bytes(8, 8));
        let mut fx = fixture(Arc::new(fetcher));
        let (seen, on_load) = recorder();

        let current = fx.loader.load_image(
            ImageSource::parse("sha1:aaa111"),
            None,
            LoadOptions::default(),
            Some(on_load("current")),
        );
        gate.started.recv_timeout(WAIT).unwrap();

        let queued = fx.loader.load_image(
            ImageSource::parse("sha1:bbb222"),
            None,
            LoadOptions::default(),
            Some(on_load("queued")),
        );
        fx.loader.stop();
        gate.release.send(()).unwrap();
        fx.loader.join();

        assert_eq!(fx.ui.run_pending(), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["current"]);
        assert!(current.is_filled());
        assert!(!queued.is_filled());
        assert!(!fx.loader.is_running());
    }

    #[tokio::test]
    async fn test_failed_load_still_notifies_and_queue_continues() {
        let mut fx = fixture(Arc::new(MockFetcher::failing()));
        let good = write_png(fx.dir.path(), "good.png", 8, 8);

        let failed = fx.loader.load_image(
            ImageSource::parse("sha1:abc123"),
            None,
            LoadOptions::default(),
            Some(Box::new(|req: Arc<LoadRequest>| assert!(req.image().is_none()))),
        );
        let ok = fx.loader.load_image(
            Some(ImageSource::Path(good)),
            None,
            LoadOptions::default(),
            None,
        );
        run_callbacks(&mut fx.ui, 2).await;

        assert!(!failed.is_filled());
        assert!(failed.error().unwrap().contains("503"));
        assert!(ok.is_filled());
        assert!(fx.loader.is_running());
    }

    #[tokio::test]
    async fn test_missing_source_is_abandoned_silently() {
        let mut fx = fixture(Arc::new(MockFetcher::failing()));
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        let request = fx.loader.load_image(
            None,
            Some((64, 64)),
            LoadOptions::default(),
            Some(Box::new(move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            })),
        );
        run_callbacks(&mut fx.ui, 1).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!request.is_filled());
        assert!(request.error().is_none());
    }

    #[tokio::test]
    async fn test_panicking_fetch_does_not_kill_worker() {
        let mut fx = fixture(Arc::new(PanickingFetcher));
        let good = write_png(fx.dir.path(), "good.png", 8, 8);

        let exploded = fx.loader.load_image(
            ImageSource::parse("sha1:abc123"),
            None,
            LoadOptions::default(),
            None,
        );
        let ok = fx.loader.load_image(
            Some(ImageSource::Path(good)),
            None,
            LoadOptions::default(),
            None,
        );
        run_callbacks(&mut fx.ui, 2).await;

        assert!(exploded.error().unwrap().contains("fetcher exploded"));
        assert!(ok.is_filled());
        assert!(fx.loader.is_running());
    }

    #[tokio::test]
    async fn test_quit_signal_stops_worker() {
        let fx = fixture(Arc::new(MockFetcher::failing()));
        let bus = SignalBus::new();
        fx.loader.listen_for_quit(&bus);

        bus.notify(QUIT);
        fx.loader.join();

        assert!(!fx.loader.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let fx = fixture(Arc::new(MockFetcher::failing()));
        fx.loader.stop();
        fx.loader.stop();
        fx.loader.join();
        fx.loader.join();
        assert!(!fx.loader.is_running());
    }

    #[test]
    fn test_load_after_exit_is_not_queued() {
        let fx = fixture(Arc::new(MockFetcher::failing()));
        fx.loader.stop();
        fx.loader.join();

        let request = fx.loader.load_image(
            ImageSource::parse("sha1:abc123"),
            None,
            LoadOptions::default(),
            None,
        );

        assert_eq!(fx.loader.pending(), 0);
        assert!(!request.is_filled());
    }
}
