use glam::Vec2;
use serde::Serialize;

use super::permission::{MotionPermission, PermissionRequest};
use crate::camera::Orientable;
use crate::input::{InputEvent, OrientationSample, TouchDragState};
use crate::options::MotionOptions;

/// Orientation treated as "zero" for delta computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeutralBaseline {
    /// Front-to-back tilt at capture time, degrees.
    pub beta: f64,
    /// Left-to-right tilt at capture time, degrees.
    pub gamma: f64,
}

/// Read-only diagnostics snapshot of a [`FusionController`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionStatus {
    /// Whether device orientation drives the output.
    pub enabled: bool,
    /// Whether a permission prompt is still unanswered.
    pub pending: bool,
    /// Whether fused angles are written to cameras.
    pub live: bool,
    /// Latest raw orientation reading.
    pub sample: Option<OrientationSample>,
    /// Current neutral baseline.
    pub baseline: Option<NeutralBaseline>,
    /// Fused yaw in radians.
    pub yaw: f32,
    /// Fused pitch in radians.
    pub pitch: f32,
    /// Yaw the output is converging on.
    pub target_yaw: f32,
    /// Pitch the output is converging on.
    pub target_pitch: f32,
}

/// Fuses device orientation and touch drags into one smoothed yaw/pitch.
///
/// Exactly one source drives the output: touch until motion access is
/// granted, device orientation afterwards. There is no way back to touch
/// short of building a new controller.
#[derive(Debug, Clone)]
pub struct FusionController {
    options: MotionOptions,
    enabled: bool,
    live: bool,
    pending: Option<PermissionRequest>,
    sample: Option<OrientationSample>,
    baseline: Option<NeutralBaseline>,
    drag: TouchDragState,
    /// Touch-driven target (x = yaw, y = pitch).
    touch_target: Vec2,
    /// Orientation-driven target (x = yaw, y = pitch).
    device_target: Vec2,
    yaw: f32,
    pitch: f32,
}

impl FusionController {
    /// Create a controller in touch mode.
    #[must_use]
    pub fn new(options: MotionOptions) -> Self {
        Self {
            options,
            enabled: false,
            live: true,
            pending: None,
            sample: None,
            baseline: None,
            drag: TouchDragState::new(),
            touch_target: Vec2::ZERO,
            device_target: Vec2::ZERO,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Ask the platform for motion access.
    ///
    /// Call synchronously from inside the user gesture that should trigger
    /// the prompt. Already enabled: resolves `true` without prompting. A
    /// request still pending is shared rather than re-prompted. Missing
    /// capability short-circuits to `false`.
    pub fn request_enable(
        &mut self,
        permission: &mut dyn MotionPermission,
    ) -> PermissionRequest {
        self.poll_permission();
        if self.enabled {
            return PermissionRequest::resolved(true);
        }
        if let Some(pending) = self.pending.as_ref().filter(|p| p.is_pending())
        {
            return pending.clone();
        }
        if !permission.is_available() {
            log::warn!("device orientation unavailable; using touch input");
            return PermissionRequest::resolved(false);
        }

        let (request, resolver) = PermissionRequest::pending();
        self.pending = Some(request.clone());
        permission.request(resolver);
        // Hosts without a prompt answer synchronously.
        self.poll_permission();
        request
    }

    /// Take over the outcome of a request the host has answered. Runs on
    /// every [`Self::update`]; call it directly while no camera is driven.
    pub fn poll_permission(&mut self) {
        let Some(outcome) = self.pending.as_ref().and_then(PermissionRequest::outcome)
        else {
            return;
        };
        self.pending = None;
        if outcome {
            log::info!("motion access granted; following device orientation");
            self.enabled = true;
            self.baseline = None;
            self.drag.reset();
        } else {
            log::warn!("motion access not granted; staying on touch input");
        }
    }

    /// Zero whichever input path currently drives the output.
    ///
    /// With a live orientation reading the current attitude becomes the
    /// baseline; otherwise the touch target returns to zero.
    pub fn recenter(&mut self) {
        match self.live_sample() {
            Some((beta, gamma)) => {
                self.baseline = Some(NeutralBaseline { beta, gamma });
                self.device_target = Vec2::ZERO;
                log::debug!("recentered on beta={beta:.1} gamma={gamma:.1}");
            }
            None => {
                self.touch_target = Vec2::ZERO;
            }
        }
    }

    /// Feed a raw input event. Pointer events move the touch target while
    /// motion is disabled; orientation events update the device target.
    pub fn handle_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Orientation(sample) => self.handle_orientation(*sample),
            InputEvent::Scroll { .. } => {}
            _ => {
                if let Some(delta) = self.drag.handle(event) {
                    self.handle_drag(delta);
                }
            }
        }
    }

    /// Record an orientation reading. All-absent readings are ignored and
    /// the previous angles are held.
    pub fn handle_orientation(&mut self, sample: OrientationSample) {
        if sample.is_empty() {
            return;
        }
        let merged = self
            .sample
            .map_or(sample, |previous| previous.merged(sample));
        self.sample = Some(merged);

        let Some((beta, gamma)) = self.live_sample() else {
            return;
        };
        let base = *self
            .baseline
            .get_or_insert(NeutralBaseline { beta, gamma });

        let yaw = -((gamma - base.gamma) as f32) * self.options.yaw_scale;
        let pitch = ((beta - base.beta) as f32) * self.options.pitch_scale;
        self.device_target =
            Vec2::new(yaw.to_radians(), self.clamp_pitch(pitch.to_radians()));
    }

    /// Apply a drag delta in pixels to the touch target.
    pub fn handle_drag(&mut self, delta: Vec2) {
        if self.enabled {
            return;
        }
        let sensitivity = self.options.touch_sensitivity;
        self.touch_target.x -= delta.x * sensitivity;
        self.touch_target.y =
            self.clamp_pitch(self.touch_target.y - delta.y * sensitivity);
    }

    /// Advance the fused angles toward the target.
    ///
    /// The blend factor `1 - decay_base^dt` makes convergence independent
    /// of the frame rate. Call exactly once per rendered frame.
    pub fn update(&mut self, dt: f32) {
        self.poll_permission();

        let smooth = self.smoothing_factor(dt);
        let target = self.target();
        self.yaw += (target.x - self.yaw) * smooth;
        self.pitch += (target.y - self.pitch) * smooth;
    }

    /// Write the fused angles to a camera (yaw, then pitch, no roll).
    /// Returns `false` without touching the camera while not live.
    pub fn apply_to(&self, camera: &mut impl Orientable) -> bool {
        if !self.live {
            return false;
        }
        camera.set_orientation(self.yaw, self.pitch, 0.0);
        true
    }

    /// Whether [`Self::apply_to`] writes to cameras.
    pub fn set_live(&mut self, live: bool) {
        self.live = live;
    }

    /// Diagnostics snapshot.
    #[must_use]
    pub fn status(&self) -> MotionStatus {
        let target = self.target();
        let granted = self
            .pending
            .as_ref()
            .and_then(PermissionRequest::outcome)
            .unwrap_or(false);
        MotionStatus {
            enabled: self.enabled || granted,
            pending: self.pending.as_ref().is_some_and(PermissionRequest::is_pending),
            live: self.live,
            sample: self.sample,
            baseline: self.baseline,
            yaw: self.yaw,
            pitch: self.pitch,
            target_yaw: target.x,
            target_pitch: target.y,
        }
    }

    /// Whether device orientation drives the output.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fused yaw in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Fused pitch in radians.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// The target of the active source (x = yaw, y = pitch).
    #[must_use]
    pub fn target(&self) -> Vec2 {
        if self.enabled {
            self.device_target
        } else {
            self.touch_target
        }
    }

    fn live_sample(&self) -> Option<(f64, f64)> {
        if !self.enabled {
            return None;
        }
        let sample = self.sample?;
        Some((sample.beta?, sample.gamma?))
    }

    fn clamp_pitch(&self, pitch: f32) -> f32 {
        let limit = self.options.pitch_limit();
        pitch.clamp(-limit, limit)
    }

    fn smoothing_factor(&self, dt: f32) -> f32 {
        if dt <= 0.0 {
            return 0.0;
        }
        let decay = self.options.decay_base;
        if decay <= 0.0 {
            return 1.0;
        }
        (1.0 - decay.min(1.0).powf(dt)).clamp(0.0, 1.0)
    }
}

impl Default for FusionController {
    fn default() -> Self {
        Self::new(MotionOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::motion::permission::{PermissionError, PermissionResolver};

    /// Scripted platform prompt.
    enum Script {
        Grant,
        Deny,
        Fail,
        Hold,
    }

    struct ScriptedPermission {
        available: bool,
        script: Script,
        prompts: usize,
        held: Option<PermissionResolver>,
    }

    impl ScriptedPermission {
        fn new(script: Script) -> Self {
            Self {
                available: true,
                script,
                prompts: 0,
                held: None,
            }
        }
    }

    impl MotionPermission for ScriptedPermission {
        fn is_available(&self) -> bool {
            self.available
        }

        fn request(&mut self, resolver: PermissionResolver) {
            self.prompts += 1;
            match self.script {
                Script::Grant => resolver.resolve(Ok(true)),
                Script::Deny => resolver.resolve(Err(PermissionError::Denied)),
                Script::Fail => {
                    resolver.resolve(Err(PermissionError::Host("rejected".into())));
                }
                Script::Hold => self.held = Some(resolver),
            }
        }
    }

    fn enabled_controller() -> FusionController {
        let mut controller = FusionController::default();
        let request =
            controller.request_enable(&mut ScriptedPermission::new(Script::Grant));
        assert_eq!(request.outcome(), Some(true));
        assert!(controller.is_enabled());
        controller
    }

    fn sample(beta: f64, gamma: f64) -> OrientationSample {
        OrientationSample::new(0.0, beta, gamma)
    }

    fn settle(controller: &mut FusionController) {
        for _ in 0..600 {
            controller.update(1.0 / 60.0);
        }
    }

    #[test]
    fn second_enable_does_not_prompt_again() {
        let mut permission = ScriptedPermission::new(Script::Grant);
        let mut controller = FusionController::default();
        let _ = controller.request_enable(&mut permission);
        let again = controller.request_enable(&mut permission);
        assert_eq!(again.outcome(), Some(true));
        assert_eq!(permission.prompts, 1);
    }

    #[test]
    fn denial_and_failure_stay_on_touch() {
        for script in [Script::Deny, Script::Fail] {
            let mut controller = FusionController::default();
            let request =
                controller.request_enable(&mut ScriptedPermission::new(script));
            assert_eq!(request.outcome(), Some(false));
            assert!(!controller.is_enabled());
        }
    }

    #[test]
    fn missing_capability_short_circuits() {
        let mut permission = ScriptedPermission::new(Script::Grant);
        permission.available = false;
        let mut controller = FusionController::default();
        let request = controller.request_enable(&mut permission);
        assert_eq!(request.outcome(), Some(false));
        assert_eq!(permission.prompts, 0);
        assert!(!controller.is_enabled());
    }

    #[test]
    fn pending_request_is_shared_and_observed_on_update() {
        let mut permission = ScriptedPermission::new(Script::Hold);
        let mut controller = FusionController::default();
        let first = controller.request_enable(&mut permission);
        let second = controller.request_enable(&mut permission);
        assert!(first.is_pending() && second.is_pending());
        assert_eq!(permission.prompts, 1);
        assert!(controller.status().pending);

        // Touch keeps working while the prompt is up.
        controller.handle_drag(Vec2::new(10.0, 0.0));
        assert!(controller.target().x < 0.0);

        permission.held.take().unwrap().resolve(Ok(true));
        assert_eq!(second.outcome(), Some(true));
        assert!(!controller.is_enabled());
        controller.update(0.0);
        assert!(controller.is_enabled());
        assert!(!controller.status().pending);
    }

    #[test]
    fn grant_answered_between_frames_is_not_prompted_again() {
        let mut permission = ScriptedPermission::new(Script::Hold);
        let mut controller = FusionController::default();
        let _ = controller.request_enable(&mut permission);
        permission.held.take().unwrap().resolve(Ok(true));

        // Reported before any update has observed it.
        assert!(controller.status().enabled);

        let again = controller.request_enable(&mut permission);
        assert_eq!(again.outcome(), Some(true));
        assert_eq!(permission.prompts, 1);
        assert!(controller.is_enabled());
    }

    #[test]
    fn poll_permission_observes_outcome_without_update() {
        let mut permission = ScriptedPermission::new(Script::Hold);
        let mut controller = FusionController::default();
        let _ = controller.request_enable(&mut permission);
        permission.held.take().unwrap().resolve(Ok(true));
        controller.poll_permission();
        assert!(controller.is_enabled());
        assert_eq!((controller.yaw(), controller.pitch()), (0.0, 0.0));
    }

    #[test]
    fn partial_sample_updates_only_the_axes_it_carries() {
        let mut controller = enabled_controller();
        controller.handle_orientation(sample(0.0, 0.0));
        controller.handle_orientation(sample(10.0, 4.0));
        let full = controller.target();

        controller.handle_orientation(OrientationSample {
            alpha: None,
            beta: Some(20.0),
            gamma: None,
        });
        let target = controller.target();
        assert_eq!(target.x, full.x);
        assert!((target.y - 20.0f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn partial_first_sample_waits_for_both_axes() {
        let mut controller = enabled_controller();
        controller.handle_orientation(OrientationSample {
            alpha: None,
            beta: Some(30.0),
            gamma: None,
        });
        assert_eq!(controller.target(), Vec2::ZERO);
        assert_eq!(controller.status().baseline, None);

        controller.handle_orientation(OrientationSample {
            alpha: None,
            beta: None,
            gamma: Some(5.0),
        });
        assert_eq!(
            controller.status().baseline,
            Some(NeutralBaseline {
                beta: 30.0,
                gamma: 5.0
            })
        );
    }

    #[test]
    fn negative_pitch_limit_from_options_does_not_panic() {
        let options =
            crate::options::Options::from_toml_str("[motion]\npitch_limit_deg = -10.0").unwrap();
        let mut controller = FusionController::new(options.motion);
        controller.handle_drag(Vec2::new(0.0, 5.0));
        assert_eq!(controller.target().y, 0.0);

        let mut unsanitized = FusionController::new(MotionOptions {
            pitch_limit_deg: -10.0,
            ..MotionOptions::default()
        });
        unsanitized.handle_drag(Vec2::new(3.0, 5.0));
        assert_eq!(unsanitized.target().y, 0.0);
        assert!(unsanitized.target().x < 0.0);
    }

    #[test]
    fn recenter_makes_orientation_relative() {
        let mut controller = enabled_controller();
        controller.handle_orientation(sample(10.0, 20.0));
        controller.recenter();
        controller.handle_orientation(sample(12.0, 21.0));

        let target = controller.target();
        assert!((target.x - (-1.0f32).to_radians()).abs() < 1e-6);
        assert!((target.y - 2.0f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn first_sample_becomes_the_baseline() {
        let mut controller = enabled_controller();
        controller.handle_orientation(sample(40.0, -5.0));
        assert_eq!(controller.target(), Vec2::ZERO);
        assert_eq!(
            controller.status().baseline,
            Some(NeutralBaseline {
                beta: 40.0,
                gamma: -5.0
            })
        );
    }

    #[test]
    fn sensor_gap_holds_previous_angles() {
        let mut controller = enabled_controller();
        controller.handle_orientation(sample(0.0, 0.0));
        controller.handle_orientation(sample(10.0, 0.0));
        settle(&mut controller);
        let before = controller.status();

        controller.handle_orientation(OrientationSample::default());
        settle(&mut controller);
        assert_eq!(controller.target(), Vec2::new(before.target_yaw, before.target_pitch));
        assert!((controller.pitch() - before.pitch).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped_for_extreme_input() {
        let mut controller = enabled_controller();
        controller.handle_orientation(sample(0.0, 0.0));
        controller.handle_orientation(sample(200.0, 0.0));

        let limit = MotionOptions::default().pitch_limit();
        let mut last = controller.pitch();
        for _ in 0..2000 {
            controller.update(1.0 / 60.0);
            assert!(controller.pitch() <= limit + 1e-6);
            assert!(controller.pitch() >= last);
            last = controller.pitch();
        }
        assert!((controller.pitch() - limit).abs() < 1e-4);
    }

    #[test]
    fn touch_pitch_is_clamped_too() {
        let mut controller = FusionController::default();
        controller.handle_drag(Vec2::new(0.0, -1_000_000.0));
        let limit = MotionOptions::default().pitch_limit();
        assert!((controller.target().y - limit).abs() < 1e-6);
    }

    #[test]
    fn smoothing_converges_without_overshoot() {
        let mut controller = FusionController::default();
        controller.handle_drag(Vec2::new(-100.0, -40.0));
        let target = controller.target();
        assert!(target.x > 0.0 && target.y > 0.0);

        let mut previous = (controller.yaw(), controller.pitch());
        for dt in [0.016, 0.033, 0.05, 0.008, 0.016].iter().cycle().take(500) {
            controller.update(*dt);
            assert!(controller.yaw() >= previous.0);
            assert!(controller.pitch() >= previous.1);
            assert!(controller.yaw() <= target.x);
            assert!(controller.pitch() <= target.y);
            previous = (controller.yaw(), controller.pitch());
        }
        assert!((controller.yaw() - target.x).abs() < 1e-4);
    }

    #[test]
    fn smoothing_is_frame_rate_independent() {
        let mut fast = FusionController::default();
        let mut slow = FusionController::default();
        fast.handle_drag(Vec2::new(50.0, 0.0));
        slow.handle_drag(Vec2::new(50.0, 0.0));
        for _ in 0..12 {
            fast.update(1.0 / 120.0);
        }
        for _ in 0..3 {
            slow.update(1.0 / 30.0);
        }
        assert!((fast.yaw() - slow.yaw()).abs() < 1e-4);
    }

    #[test]
    fn drag_maps_to_scaled_yaw_and_pitch() {
        let mut controller = FusionController::default();
        let sensitivity = MotionOptions::default().touch_sensitivity;
        controller.handle_input(&InputEvent::PointerDown { id: 1, x: 100.0, y: 100.0 });
        controller.handle_input(&InputEvent::PointerMove { id: 1, x: 130.0, y: 90.0 });
        controller.handle_input(&InputEvent::PointerMove { id: 1, x: 140.0, y: 80.0 });

        let target = controller.target();
        assert!((target.x - (-40.0 * sensitivity)).abs() < 1e-6);
        assert!((target.y - (20.0 * sensitivity)).abs() < 1e-6);
    }

    #[test]
    fn recenter_without_live_sample_zeroes_touch() {
        let mut controller = FusionController::default();
        controller.handle_drag(Vec2::new(25.0, 25.0));
        controller.recenter();
        assert_eq!(controller.target(), Vec2::ZERO);
    }

    #[test]
    fn drags_are_ignored_once_enabled() {
        let mut controller = enabled_controller();
        controller.handle_drag(Vec2::new(300.0, 300.0));
        assert_eq!(controller.target(), Vec2::ZERO);
    }

    #[test]
    fn apply_writes_yaw_pitch_and_zero_roll() {
        let mut controller = FusionController::default();
        controller.handle_drag(Vec2::new(-20.0, -10.0));
        settle(&mut controller);

        let mut camera = Camera::default();
        camera.roll = 0.7;
        assert!(controller.apply_to(&mut camera));
        assert!((camera.yaw - controller.yaw()).abs() < 1e-6);
        assert!((camera.pitch - controller.pitch()).abs() < 1e-6);
        assert_eq!(camera.roll, 0.0);

        controller.set_live(false);
        camera.yaw = 5.0;
        assert!(!controller.apply_to(&mut camera));
        assert_eq!(camera.yaw, 5.0);
    }
}
