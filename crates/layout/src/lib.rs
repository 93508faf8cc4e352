//! # Persona Layout
//!
//! Projects the persona graph onto a 2D canvas.
//!
//! Two interchangeable engines share one contract,
//! `(nodes, edges, interaction) -> positions + edge styles`:
//!
//! - [`RadialLayout`] - deterministic concentric rings, details fanned around
//!   their parent story
//! - [`ForceLayout`] - seeded physics simulation run for a fixed number of
//!   ticks
//!
//! Both apply the same detail visibility rule: a detail is shown when all
//! details are shown, or when its parent is selected or hovered. Hidden
//! details keep their position.

mod engine;
mod error;
mod force;
mod radial;
mod style;
mod types;
mod visibility;

pub use engine::{LayoutEngine, LayoutEngines, LayoutKind};
pub use error::{LayoutError, Result};
pub use force::{ForceConfig, ForceLayout};
pub use radial::{RadialConfig, RadialLayout};
pub use style::{edge_kind, node_radius, stroke, DEFAULT_NODE_RADII};
pub use types::{
    EdgeKind, EdgeStyle, InteractionState, LayoutBounds, LayoutPoint, LayoutResult,
};
pub use visibility::node_visibility;
