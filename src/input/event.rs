/// One raw device-orientation reading, in degrees.
///
/// Any field may be absent: browsers report `null` for axes the hardware
/// does not provide, and some platforms deliver an all-`null` event while the
/// sensor warms up.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct OrientationSample {
    /// Rotation around the z axis (compass heading), 0..360.
    pub alpha: Option<f64>,
    /// Front-to-back tilt, -180..180.
    pub beta: Option<f64>,
    /// Left-to-right tilt, -90..90.
    pub gamma: Option<f64>,
}

impl OrientationSample {
    /// A sample with every axis present.
    #[must_use]
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
        }
    }

    /// `true` when every axis is absent (a transient sensor gap).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alpha.is_none() && self.beta.is_none() && self.gamma.is_none()
    }

    /// Overlay the present axes of `newer` onto `self`.
    #[must_use]
    pub fn merged(self, newer: Self) -> Self {
        Self {
            alpha: newer.alpha.or(self.alpha),
            beta: newer.beta.or(self.beta),
            gamma: newer.gamma.or(self.gamma),
        }
    }
}

/// Platform-agnostic input events.
///
/// Hosts translate window, DOM or sensor events into these and hand them to
/// [`ViewRuntime::handle_input`](crate::runtime::ViewRuntime::handle_input).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A pointer (mouse button, finger, pen) went down.
    PointerDown {
        /// Host pointer identifier.
        id: u64,
        /// Horizontal client position in pixels.
        x: f32,
        /// Vertical client position in pixels.
        y: f32,
    },
    /// A pointer moved.
    PointerMove {
        /// Host pointer identifier.
        id: u64,
        /// Horizontal client position in pixels.
        x: f32,
        /// Vertical client position in pixels.
        y: f32,
    },
    /// A pointer was released.
    PointerUp {
        /// Host pointer identifier.
        id: u64,
    },
    /// The host cancelled a pointer (gesture stolen, window lost focus).
    PointerCancel {
        /// Host pointer identifier.
        id: u64,
    },
    /// Scroll wheel or pinch (positive = zoom in).
    Scroll {
        /// Scroll amount.
        delta: f32,
    },
    /// A device-orientation reading arrived.
    Orientation(OrientationSample),
}

impl InputEvent {
    /// Whether this is a pointer event of any phase.
    #[must_use]
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Self::PointerDown { .. }
                | Self::PointerMove { .. }
                | Self::PointerUp { .. }
                | Self::PointerCancel { .. }
        )
    }

    /// Multiply pointer positions by `factor`, e.g. to turn physical window
    /// pixels into logical ones.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        match self {
            Self::PointerDown { id, x, y } => Self::PointerDown {
                id,
                x: x * factor,
                y: y * factor,
            },
            Self::PointerMove { id, x, y } => Self::PointerMove {
                id,
                x: x * factor,
                y: y * factor,
            },
            other => other,
        }
    }
}

#[cfg(feature = "viewer")]
impl From<&winit::event::Touch> for InputEvent {
    fn from(touch: &winit::event::Touch) -> Self {
        use winit::event::TouchPhase;

        let (x, y) = (touch.location.x as f32, touch.location.y as f32);
        // Offset touch ids so they never collide with the mouse pointer (0).
        let id = touch.id + 1;
        match touch.phase {
            TouchPhase::Started => Self::PointerDown { id, x, y },
            TouchPhase::Moved => Self::PointerMove { id, x, y },
            TouchPhase::Ended => Self::PointerUp { id },
            TouchPhase::Cancelled => Self::PointerCancel { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_detection() {
        assert!(OrientationSample::default().is_empty());
        let partial = OrientationSample {
            beta: Some(3.0),
            ..Default::default()
        };
        assert!(!partial.is_empty());
    }

    #[test]
    fn scaling_touches_only_positions() {
        let down = InputEvent::PointerDown { id: 3, x: 20.0, y: 40.0 }.scaled(0.5);
        assert_eq!(down, InputEvent::PointerDown { id: 3, x: 10.0, y: 20.0 });
        let scroll = InputEvent::Scroll { delta: 2.0 };
        assert_eq!(scroll.scaled(0.5), scroll);
    }

    #[test]
    fn merge_keeps_missing_axes() {
        let old = OrientationSample::new(10.0, 20.0, 30.0);
        let newer = OrientationSample {
            beta: Some(25.0),
            ..Default::default()
        };
        let merged = old.merged(newer);
        assert_eq!(merged, OrientationSample::new(10.0, 25.0, 30.0));
    }
}
