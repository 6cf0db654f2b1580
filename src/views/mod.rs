//! The built-in scenes.
//!
//! Each view owns its camera, scene and any offscreen resources. All of
//! them use the shared surface; only [`BlackHoleView`] sequences its own
//! passes.

mod black_hole;
mod globe;
mod model;
mod pulsar;
mod starfield;
mod warp;

pub use black_hole::{BlackHoleView, LENSING_PASS};
pub use globe::GlobeView;
pub use model::ModelView;
pub use pulsar::PulsarView;
pub use starfield::StarfieldView;
pub use warp::WarpView;

use crate::options::Options;
use crate::view::View;

/// Build the scenes in presentation order.
#[must_use]
pub fn default_views(options: &Options) -> Vec<Box<dyn View>> {
    let display = &options.display;
    let mut rng = rand::rng();
    vec![
        Box::new(StarfieldView::new(display, &mut rng)),
        Box::new(WarpView::new(display, &mut rng)),
        Box::new(BlackHoleView::new(display, &mut rng)),
        Box::new(PulsarView::new(display, &mut rng)),
        Box::new(GlobeView::new(display)),
        Box::new(ModelView::new(display)),
    ]
}
