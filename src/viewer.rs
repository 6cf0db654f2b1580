//! Standalone window backed by winit.
//!
//! Desktop has no motion sensors: the scenes follow mouse or touch drags,
//! and the arrow keys switch between them.
//!
//! ```no_run
//! # use cosmoview::Viewer;
//! Viewer::builder()
//!     .with_title("Cosmoview")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    error::CosmoError,
    gpu::{GpuSurface, RenderContext},
    input::KeyAction,
    motion::NoMotionSensors,
    options::Options,
    runtime::ViewRuntime,
    surface::Viewport,
    views::default_views,
    InputEvent,
};

/// Pointer id reported for the mouse. Touches start at 1.
const MOUSE_POINTER: u64 = 0;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    /// Create a builder with defaults (title "Cosmoview", default options).
    fn new() -> Self {
        Self {
            options: None,
            title: "Cosmoview".into(),
        }
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title prefix.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window cycling through the built-in scenes.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    pub fn run(self) -> Result<(), CosmoError> {
        let event_loop =
            EventLoop::new().map_err(|e| CosmoError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            surface: None,
            runtime: None,
            cursor: (0.0, 0.0),
            options: self.options,
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| CosmoError::Viewer(e.to_string()))
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    surface: Option<GpuSurface>,
    runtime: Option<ViewRuntime>,
    /// Last cursor position in logical pixels.
    cursor: (f32, f32),
    options: Options,
    title: String,
}

/// Logical viewport of a window.
fn window_viewport(window: &Window) -> Viewport {
    let scale = window.scale_factor();
    let logical = window.inner_size().to_logical::<f64>(scale);
    Viewport::new(logical.width as u32, logical.height as u32, scale as f32)
}

impl ViewerApp {
    fn scale(&self) -> f32 {
        self.window
            .as_ref()
            .map_or(1.0, |w| w.scale_factor() as f32)
    }

    fn update_title(&self) {
        if let (Some(window), Some(runtime)) = (&self.window, &self.runtime) {
            window.set_title(&format!("{} - {}", self.title, runtime.active_name()));
        }
    }

    fn resize(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let viewport = window_viewport(window);
        if let (Some(runtime), Some(surface)) = (&mut self.runtime, &mut self.surface) {
            runtime.resize(surface, viewport);
        }
    }

    fn input(&mut self, event: &InputEvent) {
        if let Some(runtime) = &mut self.runtime {
            let _ = runtime.handle_input(event);
        }
    }

    fn gesture(&mut self) {
        if let Some(runtime) = &mut self.runtime {
            runtime.user_gesture();
        }
    }

    fn key_action(&mut self, action: KeyAction) {
        let (Some(runtime), Some(surface)) = (&mut self.runtime, &mut self.surface) else {
            return;
        };
        match action {
            KeyAction::NextView => runtime.next(surface),
            KeyAction::PreviousView => runtime.previous(surface),
            KeyAction::Recenter => runtime.recenter(),
            KeyAction::EnableMotion => {
                runtime.user_gesture();
                let request = runtime.request_motion(&mut NoMotionSensors);
                log::info!("motion request outcome: {:?}", request.outcome());
            }
        }
        self.update_title();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            let logical_w = (mon_size.width as f64 / scale * 0.75) as u32;
            let logical_h = (mon_size.height as f64 / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    logical_w, logical_h,
                ))
        } else {
            Window::default_attributes().with_title(&self.title)
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        let context = match pollster::block_on(RenderContext::new(
            window.clone(),
            (inner.width, inner.height),
        )) {
            Ok(context) => context,
            Err(e) => {
                log::error!("Failed to initialize GPU: {e}");
                event_loop.exit();
                return;
            }
        };
        let mut surface = GpuSurface::new(context);

        let mut runtime =
            match ViewRuntime::new(default_views(&self.options), &self.options) {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::error!("Failed to build views: {e}");
                    event_loop.exit();
                    return;
                }
            };
        runtime.start(
            &mut surface,
            window_viewport(&window),
            self.options.display.initial_view,
        );

        window.request_redraw();
        self.window = Some(window);
        self.surface = Some(surface);
        self.runtime = Some(runtime);
        self.update_title();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }

        // Guard: window, surface and runtime must be initialised.
        if self.window.is_none() || self.runtime.is_none() {
            return;
        }

        match event {
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.resize();
            }

            WindowEvent::RedrawRequested => {
                if let (Some(runtime), Some(surface)) =
                    (&mut self.runtime, &mut self.surface)
                {
                    if surface.begin_frame() {
                        runtime.frame_now(surface);
                        surface.end_frame();
                    }
                }
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                let (x, y) = self.cursor;
                if state == ElementState::Pressed {
                    self.gesture();
                    self.input(&InputEvent::PointerDown {
                        id: MOUSE_POINTER,
                        x,
                        y,
                    });
                } else {
                    self.input(&InputEvent::PointerUp { id: MOUSE_POINTER });
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(f64::from(self.scale()));
                self.cursor = (logical.x, logical.y);
                self.input(&InputEvent::PointerMove {
                    id: MOUSE_POINTER,
                    x: logical.x,
                    y: logical.y,
                });
            }

            WindowEvent::CursorLeft { .. } => {
                self.input(&InputEvent::PointerCancel { id: MOUSE_POINTER });
            }

            WindowEvent::Touch(touch) => {
                if touch.phase == TouchPhase::Started {
                    self.gesture();
                }
                let event = InputEvent::from(&touch).scaled(1.0 / self.scale());
                self.input(&event);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll_delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                };
                self.input(&InputEvent::Scroll {
                    delta: scroll_delta,
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                use winit::keyboard::PhysicalKey;
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };

                let key_str = format!("{code:?}");
                if let Some(action) = self.options.keybindings.lookup(&key_str) {
                    self.key_action(action);
                }
            }

            _ => (),
        }
    }
}
