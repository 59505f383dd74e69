use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::alert::AlertWindow;
use crate::camera::{CameraAddress, CameraOpener, FrameSource, ReleasedSource};
use crate::monitor::DistanceMonitor;
use crate::stream::{MjpegFrames, DEFAULT_JPEG_QUALITY};

pub type SharedCamera = Arc<Mutex<Box<dyn FrameSource>>>;
pub type SharedMonitor = Arc<Mutex<DistanceMonitor>>;
pub type SharedWindow = Arc<RwLock<AlertWindow>>;

#[derive(Clone)]
pub struct AppState {
    window: SharedWindow,
    camera: SharedCamera,
    camera_address: Arc<RwLock<CameraAddress>>,
    camera_opener: Arc<dyn CameraOpener>,
    monitor: Option<SharedMonitor>,
    jpeg_quality: i32,
}

impl AppState {
    /// `monitor` is `None` in raw mode, where frames are streamed untouched.
    pub fn new(
        camera: Box<dyn FrameSource>,
        camera_address: CameraAddress,
        camera_opener: Arc<dyn CameraOpener>,
        monitor: Option<DistanceMonitor>,
        window: AlertWindow,
    ) -> Self {
        Self {
            window: Arc::new(RwLock::new(window)),
            camera: Arc::new(Mutex::new(camera)),
            camera_address: Arc::new(RwLock::new(camera_address)),
            camera_opener,
            monitor: monitor.map(|monitor| Arc::new(Mutex::new(monitor))),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, jpeg_quality: i32) -> Self {
        self.jpeg_quality = jpeg_quality;
        self
    }

    pub async fn window(&self) -> AlertWindow {
        *self.window.read().await
    }

    pub async fn set_window(&self, window: AlertWindow) {
        *self.window.write().await = window;
    }

    pub async fn camera_address(&self) -> CameraAddress {
        self.camera_address.read().await.clone()
    }

    pub fn is_raw(&self) -> bool {
        self.monitor.is_none()
    }

    /// A fresh frame sequence over the shared camera.
    pub fn frames(&self) -> MjpegFrames {
        MjpegFrames::new(
            self.camera.clone(),
            self.monitor.clone(),
            self.window.clone(),
            self.jpeg_quality,
        )
    }

    /// Releases the current camera and binds a new one at `address`.
    ///
    /// When the new camera fails to open the released one stays in place, so
    /// running streams end and new ones are empty.
    pub async fn switch_camera(&self, address: CameraAddress) -> anyhow::Result<()> {
        let camera = self.camera.clone();
        let opener = self.camera_opener.clone();
        *self.camera_address.write().await = address.clone();

        tokio::task::spawn_blocking(move || {
            let mut camera = camera.blocking_lock();
            release(&mut camera);
            *camera = opener.open(&address)?;
            Ok::<_, anyhow::Error>(())
        })
        .await?
    }

    /// Releases the camera for good. Running streams end on their next read.
    pub async fn release_camera(&self) {
        let camera = self.camera.clone();
        let released =
            tokio::task::spawn_blocking(move || release(&mut camera.blocking_lock())).await;
        if let Err(e) = released {
            tracing::warn!(error = %e, "Camera release task failed");
        }
    }
}

fn release(camera: &mut Box<dyn FrameSource>) {
    if let Err(e) = camera.release() {
        tracing::warn!(error = %e, "Failed to release camera");
    }
    *camera = Box::new(ReleasedSource);
}
