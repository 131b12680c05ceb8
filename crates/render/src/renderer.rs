use crate::animation::Spin;
use crate::camera::PerspectiveCamera;
use crate::config::BackdropConfig;
use crate::error::RenderError;
use crate::frame::{FrameHandle, FrameLoop};
use crate::host::{Host, OutputSurface, SurfaceOptions};
use backdrop_scene::{CompositeMesh, MeshId, Scene, computer_model, lighting_rig};
use glam::Vec3;

/// Lifecycle of a [`SceneRenderer`]. Disposal is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Disposed,
}

/// Owns the scene, camera and output surface, and spins the computer once
/// per frame.
///
/// There is no uninitialized renderer value: [`SceneRenderer::initialize`] is
/// the only constructor.
pub struct SceneRenderer<S: OutputSurface> {
    scene: Scene,
    camera: PerspectiveCamera,
    surface: S,
    computer: MeshId,
    spin: Spin,
    frames: FrameLoop,
    attached: bool,
    frame_count: u64,
    phase: Phase,
}

impl<S: OutputSurface> SceneRenderer<S> {
    /// Build the scene, bind the surface and schedule the first frame.
    pub fn initialize<H>(host: &mut H, config: &BackdropConfig) -> Result<Self, RenderError>
    where
        H: Host<Surface = S>,
    {
        let viewport = host.viewport();

        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(
            config.camera.fov_degrees,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
        )
        .at(Vec3::new(0.0, 0.0, config.camera.distance));

        let mut surface =
            host.create_surface(&SurfaceOptions::from_config(viewport, &config.surface))?;
        let attached = host.mount(&config.mount_id, &mut surface);
        if !attached {
            tracing::warn!(
                "mount point '{}' not found; output surface left detached",
                config.mount_id
            );
        }

        let computer = scene.add_mesh(computer_model());
        for light in lighting_rig() {
            scene.add_light(light);
        }

        host.watch_viewport();

        let mut renderer = Self {
            scene,
            camera,
            surface,
            computer,
            spin: config.animation.spin(),
            frames: FrameLoop::new(),
            attached,
            frame_count: 0,
            phase: Phase::Running,
        };
        renderer.frames.schedule(host.request_frame());

        tracing::info!(
            "scene renderer initialized at {}x{} (attached={})",
            viewport.width,
            viewport.height,
            attached
        );
        Ok(renderer)
    }

    /// One tick of the frame loop: reschedule, advance the spin, draw.
    ///
    /// Does nothing once disposed.
    pub fn render_frame<H>(&mut self, host: &mut H) -> Result<(), RenderError>
    where
        H: Host<Surface = S>,
    {
        if self.phase == Phase::Disposed {
            return Ok(());
        }
        self.frames.schedule(host.request_frame());

        let elapsed = host.elapsed_ms();
        if let Some(computer) = self.scene.mesh_mut(self.computer) {
            self.spin.apply(computer.rotation_mut(), elapsed);
        }

        self.frame_count += 1;
        self.surface.render(&self.scene, &self.camera)
    }

    /// Match the camera and surface to the host viewport. Idempotent.
    pub fn on_viewport_resize<H>(&mut self, host: &H)
    where
        H: Host<Surface = S>,
    {
        if self.phase == Phase::Disposed {
            return;
        }
        let viewport = host.viewport();
        self.camera.aspect = viewport.aspect();
        self.camera.update_projection_matrix();
        self.surface.set_size(viewport);
        tracing::debug!("viewport resized to {}x{}", viewport.width, viewport.height);
    }

    /// Cancel the pending frame and release the surface. Safe to call twice.
    pub fn destroy<H>(&mut self, host: &mut H)
    where
        H: Host<Surface = S>,
    {
        if let Some(handle) = self.frames.cancel() {
            host.cancel_frame(handle);
        }
        if !self.surface.is_disposed() {
            self.surface.dispose();
        }
        if self.phase != Phase::Disposed {
            tracing::debug!("scene renderer disposed after {} frames", self.frame_count);
        }
        self.phase = Phase::Disposed;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The spinning computer.
    pub fn computer(&self) -> Option<&CompositeMesh> {
        self.scene.mesh(self.computer)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frames.pending()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{DebugTextSurface, HeadlessHost};
    use backdrop_common::SurfaceSize;
    use backdrop_scene::COMPUTER_POSITION;

    fn running(width: u32, height: u32) -> (HeadlessHost, SceneRenderer<DebugTextSurface>) {
        let mut host =
            HeadlessHost::new(SurfaceSize::new(width, height)).with_mount("3d-background");
        let renderer = SceneRenderer::initialize(&mut host, &BackdropConfig::default()).unwrap();
        (host, renderer)
    }

    #[test]
    fn initialize_builds_scene_and_schedules_first_frame() {
        let (host, renderer) = running(800, 600);
        assert_eq!(renderer.phase(), Phase::Running);
        assert!(renderer.is_attached());
        assert_eq!(renderer.surface().attached_to(), Some("3d-background"));
        assert_eq!(renderer.scene().lights().len(), 3);
        let computer = renderer.computer().unwrap();
        assert_eq!(computer.position(), COMPUTER_POSITION);
        assert_eq!(computer.part_count(), 6);
        assert_eq!(renderer.camera().position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(renderer.surface().size(), SurfaceSize::new(800, 600));
        assert!(renderer.surface().options().transparent);
        assert_eq!(renderer.surface().options().clear_alpha, 0.1);
        assert_eq!(renderer.pending_frame(), host.requested());
        assert_eq!(renderer.frame_count(), 0);
    }

    #[test]
    fn missing_mount_leaves_surface_detached_but_renderable() {
        let mut host = HeadlessHost::new(SurfaceSize::new(640, 480));
        let mut renderer =
            SceneRenderer::initialize(&mut host, &BackdropConfig::default()).unwrap();
        assert!(!renderer.is_attached());
        assert_eq!(renderer.surface().attached_to(), None);

        assert_eq!(host.run(&mut renderer, 3).unwrap(), 3);
        assert_eq!(renderer.surface().frames_rendered(), 3);
        assert!(renderer.surface().last_frame().contains("mount=none"));
    }

    #[test]
    fn each_frame_reschedules_itself() {
        let (mut host, mut renderer) = running(800, 600);
        let first = renderer.pending_frame().unwrap();
        host.run(&mut renderer, 1).unwrap();
        let second = renderer.pending_frame().unwrap();
        assert_ne!(first, second);
        assert_eq!(host.requested(), Some(second));
    }

    #[test]
    fn yaw_after_hundred_frames_is_one_radian() {
        let (mut host, mut renderer) = running(800, 600);
        assert_eq!(host.run(&mut renderer, 100).unwrap(), 100);
        let yaw = renderer.computer().unwrap().rotation().y;
        assert!((yaw - 1.0).abs() < 1e-4, "yaw = {yaw}");
        assert_eq!(renderer.frame_count(), 100);
    }

    #[test]
    fn pitch_follows_host_clock() {
        let (mut host, mut renderer) = running(800, 600);
        host.advance(1500.0);
        host.run(&mut renderer, 1).unwrap();
        let expected = Spin::default().pitch_at(host.elapsed_ms());
        assert_eq!(renderer.computer().unwrap().rotation().x, expected);
    }

    #[test]
    fn end_to_end_resize_scenario() {
        let (mut host, mut renderer) = running(800, 600);
        assert!((renderer.camera().aspect - 800.0 / 600.0).abs() < 1e-6);

        host.set_viewport(SurfaceSize::new(400, 300));
        host.run(&mut renderer, 100).unwrap();

        assert!((renderer.camera().aspect - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!(renderer.surface().size(), SurfaceSize::new(400, 300));
        let yaw = renderer.computer().unwrap().rotation().y;
        assert!((yaw - 1.0).abs() < 1e-4);
    }

    #[test]
    fn resize_is_idempotent() {
        let (mut host, mut renderer) = running(800, 600);
        host.set_viewport(SurfaceSize::new(1024, 512));
        renderer.on_viewport_resize(&host);
        let aspect = renderer.camera().aspect;
        let projection = renderer.camera().projection_matrix();
        let size = renderer.surface().size();
        for _ in 0..5 {
            renderer.on_viewport_resize(&host);
        }
        assert_eq!(renderer.camera().aspect, aspect);
        assert_eq!(renderer.camera().projection_matrix(), projection);
        assert_eq!(renderer.surface().size(), size);
        assert_eq!(aspect, 2.0);
    }

    #[test]
    fn destroy_cancels_pending_frame_and_disposes() {
        let (mut host, mut renderer) = running(800, 600);
        let pending = renderer.pending_frame().unwrap();
        renderer.destroy(&mut host);
        assert_eq!(renderer.phase(), Phase::Disposed);
        assert!(renderer.surface().is_disposed());
        assert_eq!(renderer.pending_frame(), None);
        assert_eq!(host.requested(), None);
        assert_eq!(host.cancelled(), &[pending]);
    }

    #[test]
    fn destroy_twice_is_harmless() {
        let (mut host, mut renderer) = running(800, 600);
        renderer.destroy(&mut host);
        renderer.destroy(&mut host);
        assert_eq!(host.cancelled().len(), 1);
        assert_eq!(renderer.phase(), Phase::Disposed);
    }

    #[test]
    fn disposed_renderer_stops_the_loop() {
        let (mut host, mut renderer) = running(800, 600);
        host.run(&mut renderer, 10).unwrap();
        renderer.destroy(&mut host);
        let yaw = renderer.computer().unwrap().rotation().y;

        assert_eq!(host.run(&mut renderer, 10).unwrap(), 0);
        renderer.render_frame(&mut host).unwrap();
        assert_eq!(renderer.computer().unwrap().rotation().y, yaw);
        assert_eq!(renderer.frame_count(), 10);
        assert_eq!(host.requested(), None);
    }

    #[test]
    fn custom_spin_from_config() {
        let mut config = BackdropConfig::default();
        config.animation.yaw_step = 0.05;
        config.mount_id = "hero".into();
        let mut host = HeadlessHost::new(SurfaceSize::new(100, 100)).with_mount("hero");
        let mut renderer = SceneRenderer::initialize(&mut host, &config).unwrap();
        assert!(renderer.is_attached());
        host.run(&mut renderer, 10).unwrap();
        let yaw = renderer.computer().unwrap().rotation().y;
        assert!((yaw - 0.5).abs() < 1e-4);
    }
}
