//! Browser host: a `#[wasm_bindgen]` handle driven by page JavaScript.
//!
//! The page owns the event listeners and the animation loop and forwards
//! everything here:
//!
//! ```js
//! const app = await createApp(canvas);
//! canvas.addEventListener("pointerdown", e => app.pointerDown(e.pointerId, e.clientX, e.clientY));
//! addEventListener("deviceorientation", e => app.orientation(e.alpha, e.beta, e.gamma));
//! button.addEventListener("click", () => app.tap());
//! const loop = now => { app.frame(now); requestAnimationFrame(loop); };
//! requestAnimationFrame(loop);
//! ```

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlCanvasElement;

use crate::gpu::{GpuSurface, RenderContext};
use crate::input::{InputEvent, OrientationSample};
use crate::motion::{MotionPermission, PermissionError, PermissionResolver};
use crate::options::Options;
use crate::runtime::ViewRuntime;
use crate::surface::{RenderSurface, Viewport};
use crate::views::default_views;

/// Install the panic hook and console logger.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("logger already initialized");
    }
}

/// `DeviceOrientationEvent.requestPermission` where it exists.
///
/// Browsers without the static method deliver orientation events without a
/// prompt, so the request resolves granted straight away.
struct WebMotionPermission;

impl WebMotionPermission {
    fn event_class() -> Option<JsValue> {
        let class = Reflect::get(&js_sys::global(), &"DeviceOrientationEvent".into()).ok()?;
        (!class.is_undefined()).then_some(class)
    }
}

impl MotionPermission for WebMotionPermission {
    fn is_available(&self) -> bool {
        Self::event_class().is_some()
    }

    fn request(&mut self, resolver: PermissionResolver) {
        let Some(class) = Self::event_class() else {
            resolver.resolve(Err(PermissionError::CapabilityAbsent));
            return;
        };
        let request = Reflect::get(&class, &"requestPermission".into())
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok());
        let Some(request) = request else {
            resolver.resolve(Ok(true));
            return;
        };

        // The call itself must happen inside the gesture; only the answer is
        // awaited.
        let promise = match request.call0(&class) {
            Ok(value) => Promise::resolve(&value),
            Err(e) => {
                resolver.resolve(Err(PermissionError::Host(format!("{e:?}"))));
                return;
            }
        };
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = match JsFuture::from(promise).await {
                Ok(state) if state.as_string().as_deref() == Some("granted") => Ok(true),
                Ok(_) => Err(PermissionError::Denied),
                Err(e) => Err(PermissionError::Host(format!("{e:?}"))),
            };
            resolver.resolve(outcome);
        });
    }
}

/// Build the app on `canvas`. `options_toml` overrides the default options.
#[wasm_bindgen(js_name = "createApp")]
pub async fn create_app(
    canvas: HtmlCanvasElement,
    options_toml: Option<String>,
) -> Result<WebApp, JsValue> {
    let options = match options_toml {
        Some(text) => Options::from_toml_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => Options::default(),
    };

    let logical = (canvas.client_width().max(1) as u32, canvas.client_height().max(1) as u32);
    let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio()) as f32;
    let physical = (
        (logical.0 as f32 * dpr) as u32,
        (logical.1 as f32 * dpr) as u32,
    );

    let context = RenderContext::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), physical)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let mut surface = GpuSurface::new(context);

    let mut runtime = ViewRuntime::new(default_views(&options), &options)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    runtime.start(
        &mut surface,
        Viewport::new(logical.0, logical.1, dpr),
        options.display.initial_view,
    );

    let mut app = WebApp {
        canvas,
        surface,
        runtime,
    };
    app.sync_canvas();
    log::info!("cosmoview ready with {} views", app.runtime.len());
    Ok(app)
}

/// Page-facing handle. Methods map one-to-one onto DOM events.
#[wasm_bindgen]
pub struct WebApp {
    canvas: HtmlCanvasElement,
    surface: GpuSurface,
    runtime: ViewRuntime,
}

impl WebApp {
    fn sync_canvas(&mut self) {
        let (width, height) = self.surface.size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn input(&mut self, event: &InputEvent) {
        let _ = self.runtime.handle_input(event);
    }
}

#[wasm_bindgen]
impl WebApp {
    /// Run one frame at `requestAnimationFrame` time `now` (ms).
    pub fn frame(&mut self, now: f64) {
        if self.surface.begin_frame() {
            self.runtime.frame(now, &mut self.surface);
            self.surface.end_frame();
        }
    }

    /// Viewport changed (resize or rotation). Sizes are CSS pixels.
    pub fn resize(&mut self, width: u32, height: u32, dpr: f32) {
        self.runtime
            .resize(&mut self.surface, Viewport::new(width, height, dpr));
        self.sync_canvas();
    }

    /// A user gesture: asks for motion access and forwards the gesture to
    /// the active view. Resolves to whether motion input is now enabled.
    pub fn tap(&mut self) -> Promise {
        self.runtime.user_gesture();
        let request = self.runtime.request_motion(&mut WebMotionPermission);
        wasm_bindgen_futures::future_to_promise(async move {
            Ok(JsValue::from_bool(request.await))
        })
    }

    /// `pointerdown` in CSS pixels.
    #[wasm_bindgen(js_name = "pointerDown")]
    pub fn pointer_down(&mut self, id: u32, x: f32, y: f32) {
        self.input(&InputEvent::PointerDown {
            id: u64::from(id),
            x,
            y,
        });
    }

    /// `pointermove` in CSS pixels.
    #[wasm_bindgen(js_name = "pointerMove")]
    pub fn pointer_move(&mut self, id: u32, x: f32, y: f32) {
        self.input(&InputEvent::PointerMove {
            id: u64::from(id),
            x,
            y,
        });
    }

    /// `pointerup`.
    #[wasm_bindgen(js_name = "pointerUp")]
    pub fn pointer_up(&mut self, id: u32) {
        self.input(&InputEvent::PointerUp { id: u64::from(id) });
    }

    /// `pointercancel`.
    #[wasm_bindgen(js_name = "pointerCancel")]
    pub fn pointer_cancel(&mut self, id: u32) {
        self.input(&InputEvent::PointerCancel { id: u64::from(id) });
    }

    /// Wheel or pinch; positive zooms in.
    pub fn scroll(&mut self, delta: f32) {
        self.input(&InputEvent::Scroll { delta });
    }

    /// `deviceorientation` angles in degrees; any may be null.
    pub fn orientation(&mut self, alpha: Option<f64>, beta: Option<f64>, gamma: Option<f64>) {
        self.input(&InputEvent::Orientation(OrientationSample { alpha, beta, gamma }));
    }

    /// Show the next scene.
    #[wasm_bindgen(js_name = "nextView")]
    pub fn next_view(&mut self) {
        self.runtime.next(&mut self.surface);
        self.sync_canvas();
    }

    /// Show the previous scene.
    #[wasm_bindgen(js_name = "previousView")]
    pub fn previous_view(&mut self) {
        self.runtime.previous(&mut self.surface);
        self.sync_canvas();
    }

    /// Show scene `index`; negative counts from the end.
    #[wasm_bindgen(js_name = "switchTo")]
    pub fn switch_to(&mut self, index: i32) {
        self.runtime.switch_to(i64::from(index), &mut self.surface);
        self.sync_canvas();
    }

    /// Make the current attitude (or drag) the new neutral.
    pub fn recenter(&mut self) {
        self.runtime.recenter();
    }

    /// Name of the active scene.
    #[wasm_bindgen(js_name = "activeName")]
    pub fn active_name(&self) -> String {
        self.runtime.active_name().to_owned()
    }

    /// Motion diagnostics as JSON.
    #[wasm_bindgen(js_name = "motionStatus")]
    pub fn motion_status(&self) -> String {
        serde_json::to_string(&self.runtime.motion_status()).unwrap_or_default()
    }

    /// Smoothed frames per second.
    pub fn fps(&self) -> f32 {
        self.runtime.fps()
    }
}
