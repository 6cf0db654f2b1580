//! Motion-sensor permission flow as an explicit two-state handle.
//!
//! Some platforms only deliver orientation events after the page asks for
//! them from inside a user gesture. The host starts that prompt and later
//! completes a [`PermissionResolver`]; the matching [`PermissionRequest`]
//! flips from pending to resolved. The request can be polled each frame or
//! awaited as a future.

use std::{
    cell::RefCell,
    fmt,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

/// Why the host could not grant motion access. Only ever logged: every
/// variant degrades to the touch path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The user or the system refused access.
    Denied,
    /// The platform has no orientation API.
    CapabilityAbsent,
    /// The host's prompt failed in some other way.
    Host(String),
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied => write!(f, "motion access denied"),
            Self::CapabilityAbsent => {
                write!(f, "device orientation is not available")
            }
            Self::Host(msg) => write!(f, "permission request failed: {msg}"),
        }
    }
}

impl std::error::Error for PermissionError {}

/// Observable state of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// The host has not answered yet.
    Pending,
    /// The host answered; `true` means motion events will flow.
    Resolved(bool),
}

#[derive(Debug)]
struct Slot {
    state: PermissionState,
    waker: Option<Waker>,
}

/// Handle to a (possibly still pending) motion permission request.
///
/// Clones share the same slot, so a second enable request made while the
/// first is still pending observes the same outcome.
#[derive(Debug, Clone)]
pub struct PermissionRequest {
    slot: Rc<RefCell<Slot>>,
}

impl PermissionRequest {
    /// A request that is already answered.
    #[must_use]
    pub fn resolved(granted: bool) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                state: PermissionState::Resolved(granted),
                waker: None,
            })),
        }
    }

    /// A pending request and the resolver the host completes it with.
    #[must_use]
    pub fn pending() -> (Self, PermissionResolver) {
        let slot = Rc::new(RefCell::new(Slot {
            state: PermissionState::Pending,
            waker: None,
        }));
        (
            Self {
                slot: Rc::clone(&slot),
            },
            PermissionResolver { slot },
        )
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PermissionState {
        self.slot.borrow().state
    }

    /// Whether the host has not answered yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == PermissionState::Pending
    }

    /// The outcome, if answered.
    #[must_use]
    pub fn outcome(&self) -> Option<bool> {
        match self.state() {
            PermissionState::Pending => None,
            PermissionState::Resolved(granted) => Some(granted),
        }
    }
}

impl Future for PermissionRequest {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        let mut slot = self.slot.borrow_mut();
        match slot.state {
            PermissionState::Resolved(granted) => Poll::Ready(granted),
            PermissionState::Pending => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Host side of a [`PermissionRequest`].
///
/// Dropping a resolver without answering resolves the request as denied, so
/// a host that loses its prompt never leaves the controller waiting.
#[derive(Debug)]
pub struct PermissionResolver {
    slot: Rc<RefCell<Slot>>,
}

impl PermissionResolver {
    /// Answer the request. Errors are logged and count as a denial.
    pub fn resolve(self, outcome: Result<bool, PermissionError>) {
        let granted = match outcome {
            Ok(granted) => granted,
            Err(e) => {
                log::warn!("{e}; staying on touch input");
                false
            }
        };
        self.finish(granted);
    }

    fn finish(&self, granted: bool) {
        let waker = {
            let mut slot = self.slot.borrow_mut();
            if slot.state != PermissionState::Pending {
                return;
            }
            slot.state = PermissionState::Resolved(granted);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl Drop for PermissionResolver {
    fn drop(&mut self) {
        if self.slot.borrow().state == PermissionState::Pending {
            log::debug!("permission resolver dropped unanswered");
            self.finish(false);
        }
    }
}

/// Platform access to the motion-sensor permission prompt.
pub trait MotionPermission {
    /// Whether the platform exposes device orientation at all. Checked
    /// before any prompt is attempted.
    fn is_available(&self) -> bool;

    /// Start the grant flow. Platforms without an explicit grant step
    /// resolve immediately with `Ok(true)`.
    ///
    /// Must be called from inside a user-initiated input event on platforms
    /// that gate the prompt on one.
    fn request(&mut self, resolver: PermissionResolver);
}

/// Host without orientation sensors (desktop windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMotionSensors;

impl MotionPermission for NoMotionSensors {
    fn is_available(&self) -> bool {
        false
    }

    fn request(&mut self, resolver: PermissionResolver) {
        resolver.resolve(Err(PermissionError::CapabilityAbsent));
    }
}
