//! Platform layer: windowing, the event loop, the per-frame render tick,
//! resize handling and the background asset load.
//!
//! Three entry points drive the viewer and all run on the event-loop
//! thread: the load-completion poll (at most one message, consumed once),
//! the redraw tick, and the resize handler. The loader itself runs on one
//! background thread and communicates only through the channel, so the
//! tracked object keeps a single writer.

pub mod fps;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context, Result, anyhow};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use asset::loader::{FsFetcher, LoadError, LoadedObject, load_scene};
use asset::progress;
use corelib::Vec3;
use corelib::camera::Camera;
use corelib::orbit::OrbitController;
use corelib::scene::ViewerScene;
use renderer::GpuState;

use fps::FpsCounter;

/// Fixed position the loaded object is attached at.
pub const OBJECT_POSITION: Vec3 = Vec3::new(-5.0, 0.0, 0.0);

const CAMERA_EYE: Vec3 = Vec3::new(0.0, 10.0, 40.0);
const CAMERA_FOV_DEG: f32 = 45.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 100.0;

const ROTATE_SENSITIVITY: f32 = 0.005;
const WINDOW_TITLE: &str = "Obzor3D";

#[derive(Clone, Debug)]
pub struct ViewerOptions {
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    pub asset_root: PathBuf,
    pub mtl_name: String,
    pub obj_name: String,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            show_fps: false,
            width: 1280,
            height: 720,
            asset_root: PathBuf::from("assets"),
            mtl_name: "cube.mtl".to_string(),
            obj_name: "cube.obj".to_string(),
        }
    }
}

/// Mouse state folded into the orbit controller each move event.
#[derive(Default)]
struct MouseState {
    cursor: Option<(f64, f64)>,
    left_down: bool,
    right_down: bool,
}

struct ViewerApp {
    opts: ViewerOptions,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    scene: ViewerScene,
    camera: Camera,
    orbit: OrbitController,
    mouse: MouseState,
    fps: FpsCounter,
    load_rx: Option<Receiver<Result<LoadedObject, LoadError>>>,
}

impl ViewerApp {
    fn new(opts: ViewerOptions) -> Self {
        let camera = Camera::new(
            CAMERA_FOV_DEG.to_radians(),
            CAMERA_NEAR,
            CAMERA_FAR,
            opts.width as f32 / opts.height.max(1) as f32,
        );
        let orbit = OrbitController::from_eye_target(CAMERA_EYE, Vec3::ZERO);
        Self {
            opts,
            window: None,
            gpu: None,
            scene: ViewerScene::new(),
            camera,
            orbit,
            mouse: MouseState::default(),
            fps: FpsCounter::new(),
            load_rx: None,
        }
    }

    /// Kick off the two-stage load on a background thread. The result
    /// comes back over the channel polled in `about_to_wait`.
    fn spawn_loader(&mut self) {
        let (tx, rx) = mpsc::channel();
        let root = self.opts.asset_root.clone();
        let mtl_name = self.opts.mtl_name.clone();
        let obj_name = self.opts.obj_name.clone();
        thread::spawn(move || {
            let mut fetcher = FsFetcher::new(root);
            let result = load_scene(&mut fetcher, &mtl_name, &obj_name, &mut |event| {
                progress::report(&event)
            });
            // The receiver may already be gone if the window closed.
            let _ = tx.send(result);
        });
        self.load_rx = Some(rx);
    }

    /// Consume the load completion, at most once. On success the mesh is
    /// uploaded before the scene attach so the first tick that observes
    /// the object present can draw it; on failure the error is logged
    /// once and the object stays absent permanently.
    fn poll_load(&mut self) {
        let Some(rx) = self.load_rx.as_ref() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(object)) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.upload_object(&object);
                }
                self.scene.attach(OBJECT_POSITION);
                log::info!("Scene object attached at {:?}", OBJECT_POSITION);
                self.load_rx = None;
            }
            Ok(Err(err)) => {
                log::error!("{err}");
                self.load_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                log::error!("Loader thread exited without a result");
                self.load_rx = None;
            }
        }
    }

    /// Resize: recompute the camera aspect, reconfigure the surface and
    /// render one extra frame right away instead of waiting for the next
    /// scheduled tick.
    fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_viewport(width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
            if let Err(err) = gpu.render(&self.scene, &self.camera, self.orbit.view_matrix()) {
                log::warn!("Render after resize failed: {err:?}");
            }
        }
    }

    /// One render-loop tick: advance the rotation (if the object is
    /// present), render with the current orbit view, update the FPS
    /// readout.
    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        self.scene.tick_rotation();

        if let Some(gpu) = self.gpu.as_mut() {
            match gpu.render(&self.scene, &self.camera, self.orbit.view_matrix()) {
                Ok(()) => {}
                Err(err) if GpuState::is_surface_lost(&err) => {
                    log::warn!("Surface lost; recreating");
                    gpu.recreate_surface();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Surface out of memory; exiting");
                    event_loop.exit();
                }
                Err(err) => {
                    log::warn!("Frame skipped: {err:?}");
                }
            }
        }

        if let Some(fps) = self.fps.frame() {
            log::debug!("{fps:.1} FPS");
            if self.opts.show_fps {
                if let Some(window) = self.window.as_ref() {
                    window.set_title(&format!("{WINDOW_TITLE} — {fps:.1} FPS"));
                }
            }
        }
    }

    fn on_cursor_moved(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.mouse.cursor {
            let dx = (x - last_x) as f32;
            let dy = (y - last_y) as f32;
            if self.mouse.left_down {
                self.orbit
                    .rotate(-dx * ROTATE_SENSITIVITY, dy * ROTATE_SENSITIVITY);
            } else if self.mouse.right_down {
                self.orbit.pan(-dx, dy);
            }
        }
        self.mouse.cursor = Some((x, y));
    }

    fn on_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y,
            MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32) * 0.01,
        };
        self.orbit.zoom(amount);
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(self.opts.width, self.opts.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        match pollster::block_on(GpuState::new(window.clone(), self.opts.backends)) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                log::error!("GPU init failed: {err:#}");
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
        self.spawn_loader();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                self.on_resize(new_size.width, new_size.height);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let down = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.mouse.left_down = down,
                    MouseButton::Right => self.mouse.right_down = down,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.on_mouse_wheel(delta);
            }
            WindowEvent::RedrawRequested => {
                self.tick(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.poll_load();
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

/// Run the viewer until the window closes.
pub fn run_viewer(opts: ViewerOptions) -> Result<()> {
    let event_loop: EventLoop<()> = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(opts);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::mesh::{MeshData, MeshVertex};
    use asset::mtl::load_mtl_from_str;
    use std::collections::HashMap;

    fn test_object() -> LoadedObject {
        let mut mesh = MeshData::new(
            vec![MeshVertex::default(), MeshVertex::default(), MeshVertex::default()],
            vec![0, 1, 2],
        );
        mesh.material_name = Some("white".to_string());
        LoadedObject {
            mesh,
            materials: load_mtl_from_str("newmtl white\nKd 1 1 1\n").unwrap(),
            textures: HashMap::new(),
        }
    }

    fn app_with_channel() -> (ViewerApp, mpsc::Sender<Result<LoadedObject, LoadError>>) {
        let mut app = ViewerApp::new(ViewerOptions::default());
        let (tx, rx) = mpsc::channel();
        app.load_rx = Some(rx);
        (app, tx)
    }

    #[test]
    fn successful_load_attaches_exactly_once() {
        let (mut app, tx) = app_with_channel();
        tx.send(Ok(test_object())).unwrap();

        app.poll_load();
        let first = app.scene.tracked.expect("attached after completion");
        assert_eq!(first.transform.translation, OBJECT_POSITION);
        assert!(app.load_rx.is_none());

        // Later polls are no-ops; rotation state is untouched.
        app.scene.tick_rotation();
        let rotated = app.scene.tracked.unwrap();
        app.poll_load();
        assert_eq!(app.scene.tracked.unwrap(), rotated);
    }

    #[test]
    fn failed_load_leaves_object_absent() {
        let (mut app, tx) = app_with_channel();
        tx.send(Err(LoadError::new("cube.mtl", anyhow!("no such resource"))))
            .unwrap();

        app.poll_load();
        assert!(app.scene.tracked.is_none());
        assert!(app.load_rx.is_none());

        app.poll_load();
        assert!(app.scene.tracked.is_none());
    }

    #[test]
    fn pending_load_keeps_polling() {
        let (mut app, _tx) = app_with_channel();
        app.poll_load();
        assert!(app.scene.tracked.is_none());
        assert!(app.load_rx.is_some());
    }

    #[test]
    fn resize_before_load_updates_aspect_without_fabricating_object() {
        let mut app = ViewerApp::new(ViewerOptions::default());
        app.on_resize(800, 400);
        assert_eq!(app.camera.aspect, 2.0);
        assert!(app.scene.tracked.is_none());
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut app = ViewerApp::new(ViewerOptions::default());
        let before = app.camera.aspect;
        app.on_resize(0, 720);
        assert_eq!(app.camera.aspect, before);
    }

    #[test]
    fn drag_with_left_button_rotates_the_orbit() {
        let mut app = ViewerApp::new(ViewerOptions::default());
        let yaw = app.orbit.yaw;
        app.mouse.left_down = true;
        app.on_cursor_moved(100.0, 100.0);
        app.on_cursor_moved(140.0, 100.0);
        assert!(app.orbit.yaw != yaw);
    }
}
