//! The view switcher: owns the ordered views, tracks the active one and
//! forwards lifecycle, input and frame events to it alone.
//!
//! One runtime is built at startup and handed by reference to whatever owns
//! the frame loop (the winit viewer or the web host). No global state.

use crate::error::CosmoError;
use crate::input::InputEvent;
use crate::motion::{
    FusionController, MotionPermission, MotionStatus, PermissionRequest,
};
use crate::options::Options;
use crate::surface::{RenderSurface, RenderTarget, Viewport};
use crate::util::frame_clock::FrameClock;
use crate::view::{RenderPath, View};

/// Owns the views, the fusion controller and the frame clock.
pub struct ViewRuntime {
    views: Vec<Box<dyn View>>,
    active: usize,
    started: bool,
    controller: FusionController,
    clock: FrameClock,
    viewport: Viewport,
}

impl ViewRuntime {
    /// Build a runtime from options. Fails if `views` is empty.
    pub fn new(
        views: Vec<Box<dyn View>>,
        options: &Options,
    ) -> Result<Self, CosmoError> {
        Self::with_parts(
            views,
            FusionController::new(options.motion.clone()),
            FrameClock::new(options.clock.max_frame_ms),
        )
    }

    /// Build a runtime from explicit parts. Fails if `views` is empty.
    pub fn with_parts(
        views: Vec<Box<dyn View>>,
        controller: FusionController,
        clock: FrameClock,
    ) -> Result<Self, CosmoError> {
        if views.is_empty() {
            return Err(CosmoError::NoViews);
        }
        Ok(Self {
            views,
            active: 0,
            started: false,
            controller,
            clock,
            viewport: Viewport::default(),
        })
    }

    /// Activate the first view at the host's initial viewport.
    pub fn start(
        &mut self,
        surface: &mut dyn RenderSurface,
        viewport: Viewport,
        index: i64,
    ) {
        self.viewport = viewport;
        self.switch_to(index, surface);
    }

    /// Wrap any index (negative counts from the end) into the view list.
    #[must_use]
    pub fn wrap_index(&self, index: i64) -> usize {
        let len = self.views.len() as i64;
        index.rem_euclid(len) as usize
    }

    /// Make `views[index mod len]` the active view.
    ///
    /// The outgoing view is deactivated, the incoming view activated, the
    /// controller told whether to drive cameras, and the incoming view
    /// resized to the current viewport (it may not have been sized while
    /// inactive).
    pub fn switch_to(&mut self, index: i64, surface: &mut dyn RenderSurface) {
        let next = self.wrap_index(index);

        if self.started {
            self.views[self.active].set_active(false);
        }
        self.active = next;
        self.started = true;

        let view = &mut self.views[next];
        view.set_active(true);
        self.controller.set_live(view.uses_motion());
        view.resize(surface, self.viewport);

        log::info!("switched to view {next} ({})", view.name());
    }

    /// Switch to the following view, wrapping at the end.
    pub fn next(&mut self, surface: &mut dyn RenderSurface) {
        self.switch_to(self.active as i64 + 1, surface);
    }

    /// Switch to the preceding view, wrapping at the start.
    pub fn previous(&mut self, surface: &mut dyn RenderSurface) {
        self.switch_to(self.active as i64 - 1, surface);
    }

    /// Record a new viewport and resize the active view.
    pub fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
        self.viewport = viewport;
        self.views[self.active].resize(surface, viewport);
    }

    /// Run one frame at host time `now_ms`.
    pub fn frame(&mut self, now_ms: f64, surface: &mut dyn RenderSurface) {
        let dt = self.clock.tick(now_ms);
        self.tick(dt, now_ms, surface);
    }

    /// Run one frame timed by the runtime's own monotonic clock. For hosts
    /// without a frame timestamp of their own.
    pub fn frame_now(&mut self, surface: &mut dyn RenderSurface) {
        let dt = self.clock.tick_instant();
        let now_ms = self.clock.now_ms();
        self.tick(dt, now_ms, surface);
    }

    /// Advance and draw the active view.
    ///
    /// Motion views get the fused orientation before their own update. The
    /// default path resets the shared surface before drawing; a custom path
    /// is followed by a reset so the next owner starts clean.
    pub fn tick(
        &mut self,
        dt: f32,
        time_ms: f64,
        surface: &mut dyn RenderSurface,
    ) {
        let view = &mut self.views[self.active];

        if view.uses_motion() {
            self.controller.update(dt);
            let _ = self.controller.apply_to(view.camera_mut());
        } else {
            self.controller.poll_permission();
        }

        view.update(dt);

        match view.render_path() {
            RenderPath::Custom => {
                view.render(surface, time_ms);
                surface.reset_state();
            }
            RenderPath::Default => {
                surface.reset_state();
                surface.render(view.scene(), view.camera(), RenderTarget::Screen);
            }
        }
    }

    /// Route an input event.
    ///
    /// Orientation readings always reach the controller. Pointer and scroll
    /// events drive the touch path when the active view uses motion and go
    /// to the view otherwise. Returns `true` if something consumed it.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        let view = &mut self.views[self.active];
        match event {
            InputEvent::Orientation(_) => {
                self.controller.handle_input(event);
                true
            }
            _ if view.uses_motion() => {
                self.controller.handle_input(event);
                event.is_pointer()
            }
            _ => view.handle_input(event),
        }
    }

    /// Forward a real user gesture to the active view.
    pub fn user_gesture(&mut self) {
        self.views[self.active].on_user_gesture();
    }

    /// Ask for motion access. Call from inside the user gesture.
    pub fn request_motion(
        &mut self,
        permission: &mut dyn MotionPermission,
    ) -> PermissionRequest {
        self.controller.request_enable(permission)
    }

    /// Zero the active input path.
    pub fn recenter(&mut self) {
        self.controller.recenter();
    }

    /// Index of the active view.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active view.
    #[must_use]
    pub fn active_view(&self) -> &dyn View {
        self.views[self.active].as_ref()
    }

    /// Name of the active view.
    #[must_use]
    pub fn active_name(&self) -> &str {
        self.views[self.active].name()
    }

    /// Number of views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Always `false`: construction rejects an empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// The last viewport seen.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Fusion controller diagnostics.
    #[must_use]
    pub fn motion_status(&self) -> MotionStatus {
        self.controller.status()
    }

    /// Read access to the fusion controller.
    #[must_use]
    pub fn controller(&self) -> &FusionController {
        &self.controller
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::camera::Camera;
    use crate::motion::PermissionResolver;
    use crate::scene::Scene;
    use crate::surface::testing::{RecordingSurface, SurfaceCall};
    use crate::view::resize_surface_and_camera;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Active(&'static str, bool),
        Update(&'static str, f32),
        Render(&'static str),
        Resize(&'static str, u32, u32),
        Gesture(&'static str),
        Input(&'static str),
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct TestView {
        name: &'static str,
        log: Log,
        camera: Camera,
        scene: Scene,
        motion: bool,
        custom: bool,
    }

    impl TestView {
        fn boxed(name: &'static str, log: &Log) -> Box<dyn View> {
            Box::new(Self::new(name, log))
        }

        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Rc::clone(log),
                camera: Camera::default(),
                scene: Scene::new(),
                motion: true,
                custom: false,
            }
        }
    }

    impl View for TestView {
        fn name(&self) -> &str {
            self.name
        }

        fn camera(&self) -> &Camera {
            &self.camera
        }

        fn camera_mut(&mut self) -> &mut Camera {
            &mut self.camera
        }

        fn scene(&self) -> &Scene {
            &self.scene
        }

        fn update(&mut self, dt: f32) {
            self.log.borrow_mut().push(Call::Update(self.name, dt));
        }

        fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
            resize_surface_and_camera(&mut self.camera, surface, viewport, (1.0, 2.0));
            self.log
                .borrow_mut()
                .push(Call::Resize(self.name, viewport.width, viewport.height));
        }

        fn render_path(&self) -> RenderPath {
            if self.custom {
                RenderPath::Custom
            } else {
                RenderPath::Default
            }
        }

        fn render(&mut self, _surface: &mut dyn RenderSurface, _time: f64) {
            self.log.borrow_mut().push(Call::Render(self.name));
        }

        fn set_active(&mut self, active: bool) {
            self.log.borrow_mut().push(Call::Active(self.name, active));
        }

        fn on_user_gesture(&mut self) {
            self.log.borrow_mut().push(Call::Gesture(self.name));
        }

        fn handle_input(&mut self, _event: &InputEvent) -> bool {
            self.log.borrow_mut().push(Call::Input(self.name));
            true
        }

        fn uses_motion(&self) -> bool {
            self.motion
        }
    }

    const NAMES: [&str; 5] = ["a", "b", "c", "d", "e"];

    fn runtime_with(views: Vec<Box<dyn View>>) -> (ViewRuntime, RecordingSurface) {
        let mut runtime = ViewRuntime::new(views, &Options::default()).unwrap();
        let mut surface = RecordingSurface::default();
        runtime.start(&mut surface, Viewport::new(400, 300, 3.0), 0);
        (runtime, surface)
    }

    fn five_views(log: &Log) -> (ViewRuntime, RecordingSurface) {
        runtime_with(NAMES.into_iter().map(|n| TestView::boxed(n, log)).collect())
    }

    #[test]
    fn empty_view_list_is_rejected() {
        let result = ViewRuntime::new(Vec::new(), &Options::default());
        assert!(matches!(result, Err(CosmoError::NoViews)));
    }

    #[test]
    fn switch_wraps_in_both_directions() {
        let log = Log::default();
        let (mut runtime, mut surface) = five_views(&log);

        runtime.switch_to(-1, &mut surface);
        assert_eq!(runtime.active_index(), 4);
        runtime.switch_to(7, &mut surface);
        assert_eq!(runtime.active_index(), 2);
        runtime.switch_to(-6, &mut surface);
        assert_eq!(runtime.active_index(), 4);
        runtime.next(&mut surface);
        assert_eq!(runtime.active_name(), "a");
        runtime.previous(&mut surface);
        assert_eq!(runtime.active_name(), "e");

        for n in -12_i64..12 {
            assert_eq!(runtime.wrap_index(n), (((n % 5) + 5) % 5) as usize);
        }
    }

    #[test]
    fn start_activates_and_sizes_the_first_view() {
        let log = Log::default();
        let (_runtime, surface) = five_views(&log);
        assert_eq!(
            *log.borrow(),
            vec![Call::Active("a", true), Call::Resize("a", 400, 300)]
        );
        // Ratio 3.0 from the host is clamped to 2.0.
        assert!(surface.calls.contains(&SurfaceCall::SetPixelRatio(2.0)));
    }

    #[test]
    fn switch_sequence_and_no_calls_to_inactive_views() {
        let log = Log::default();
        let (mut runtime, mut surface) = five_views(&log);
        log.borrow_mut().clear();

        runtime.switch_to(1, &mut surface);
        runtime.tick(0.016, 16.0, &mut surface);
        runtime.tick(0.016, 32.0, &mut surface);
        runtime.switch_to(0, &mut surface);
        runtime.tick(0.016, 48.0, &mut surface);

        assert_eq!(
            *log.borrow(),
            vec![
                Call::Active("a", false),
                Call::Active("b", true),
                Call::Resize("b", 400, 300),
                Call::Update("b", 0.016),
                Call::Update("b", 0.016),
                Call::Active("b", false),
                Call::Active("a", true),
                Call::Resize("a", 400, 300),
                Call::Update("a", 0.016),
            ]
        );
    }

    #[test]
    fn switch_resizes_with_latest_viewport() {
        let log = Log::default();
        let (mut runtime, mut surface) = five_views(&log);
        runtime.resize(&mut surface, Viewport::new(1024, 768, 1.0));
        log.borrow_mut().clear();

        runtime.switch_to(3, &mut surface);
        assert!(log.borrow().contains(&Call::Resize("d", 1024, 768)));
    }

    #[test]
    fn default_path_resets_before_rendering() {
        let log = Log::default();
        let (mut runtime, mut surface) = five_views(&log);
        surface.clear();

        runtime.tick(0.016, 16.0, &mut surface);
        assert_eq!(
            surface.calls,
            vec![
                SurfaceCall::Reset,
                SurfaceCall::Render {
                    nodes: 0,
                    target: RenderTarget::Screen
                }
            ]
        );
    }

    #[test]
    fn custom_path_renders_then_resets() {
        let log = Log::default();
        let mut custom = TestView::new("custom", &log);
        custom.custom = true;
        let (mut runtime, mut surface) = runtime_with(vec![Box::new(custom)]);
        surface.clear();
        log.borrow_mut().clear();

        runtime.tick(0.016, 16.0, &mut surface);
        assert_eq!(
            *log.borrow(),
            vec![Call::Update("custom", 0.016), Call::Render("custom")]
        );
        assert_eq!(surface.calls, vec![SurfaceCall::Reset]);
    }

    #[test]
    fn motion_views_receive_fused_orientation() {
        let log = Log::default();
        let mut still = TestView::new("still", &log);
        still.motion = false;
        let (mut runtime, mut surface) =
            runtime_with(vec![TestView::boxed("moving", &log), Box::new(still)]);

        let _ = runtime.handle_input(&InputEvent::PointerDown { id: 1, x: 0.0, y: 0.0 });
        let _ = runtime.handle_input(&InputEvent::PointerMove { id: 1, x: -50.0, y: 0.0 });
        for _ in 0..120 {
            runtime.tick(1.0 / 60.0, 0.0, &mut surface);
        }
        let yaw = runtime.active_view().camera().yaw;
        assert!(yaw > 0.0);
        assert!((yaw - runtime.controller().target().x).abs() < 1e-3);

        runtime.switch_to(1, &mut surface);
        assert!(!runtime.motion_status().live);
        let fused = runtime.controller().yaw();
        runtime.tick(1.0 / 60.0, 0.0, &mut surface);
        assert_eq!(runtime.active_view().camera().yaw, 0.0);
        assert_eq!(runtime.controller().yaw(), fused);
    }

    #[test]
    fn pointer_input_goes_to_views_that_steer_themselves() {
        let log = Log::default();
        let mut still = TestView::new("still", &log);
        still.motion = false;
        let (mut runtime, _surface) = runtime_with(vec![Box::new(still)]);
        log.borrow_mut().clear();

        assert!(runtime.handle_input(&InputEvent::PointerDown { id: 1, x: 0.0, y: 0.0 }));
        let _ = runtime.handle_input(&InputEvent::PointerMove { id: 1, x: 80.0, y: 0.0 });
        assert_eq!(runtime.controller().target(), Vec2::ZERO);
        assert_eq!(*log.borrow(), vec![Call::Input("still"), Call::Input("still")]);
    }

    #[test]
    fn frame_clamps_long_stalls() {
        let log = Log::default();
        let (mut runtime, mut surface) = five_views(&log);
        runtime.frame(1000.0, &mut surface);
        log.borrow_mut().clear();

        runtime.frame(6000.0, &mut surface);
        assert_eq!(*log.borrow(), vec![Call::Update("a", 0.05)]);
    }

    /// Platform prompt that stays open until the test answers it.
    #[derive(Default)]
    struct HeldPermission {
        prompts: usize,
        held: Option<PermissionResolver>,
    }

    impl MotionPermission for HeldPermission {
        fn is_available(&self) -> bool {
            true
        }

        fn request(&mut self, resolver: PermissionResolver) {
            self.prompts += 1;
            self.held = Some(resolver);
        }
    }

    #[test]
    fn grant_lands_while_a_non_motion_view_is_active() {
        let log = Log::default();
        let mut still = TestView::new("still", &log);
        still.motion = false;
        let (mut runtime, mut surface) = runtime_with(vec![Box::new(still)]);

        let mut permission = HeldPermission::default();
        let _ = runtime.request_motion(&mut permission);
        permission.held.take().unwrap().resolve(Ok(true));

        runtime.tick(1.0 / 60.0, 0.0, &mut surface);
        let status = runtime.motion_status();
        assert!(status.enabled && !status.pending);

        let again = runtime.request_motion(&mut permission);
        assert_eq!(again.outcome(), Some(true));
        assert_eq!(permission.prompts, 1);
    }

    #[test]
    fn frame_now_primes_then_steps_within_the_cap() {
        let log = Log::default();
        let (mut runtime, mut surface) = five_views(&log);
        log.borrow_mut().clear();

        runtime.frame_now(&mut surface);
        runtime.frame_now(&mut surface);
        let calls = log.borrow();
        assert_eq!(calls[0], Call::Update("a", 0.0));
        assert!(calls.iter().all(|call| match call {
            Call::Update(_, dt) => (0.0..=0.05).contains(dt),
            _ => true,
        }));
    }

    #[test]
    fn gesture_reaches_only_the_active_view() {
        let log = Log::default();
        let (mut runtime, mut surface) = five_views(&log);
        runtime.switch_to(2, &mut surface);
        log.borrow_mut().clear();

        runtime.user_gesture();
        assert_eq!(*log.borrow(), vec![Call::Gesture("c")]);
    }
}
