use persona_graph::Relation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in 2D canvas space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

impl LayoutPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Polar offset from this point
    pub fn offset(&self, radius: f64, angle: f64) -> Self {
        Self {
            x: self.x + radius * angle.cos(),
            y: self.y + radius * angle.sin(),
        }
    }

    /// Angle of the ray from `self` through `other`
    pub fn angle_to(&self, other: &Self) -> Option<f64> {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            None
        } else {
            Some(dy.atan2(dx))
        }
    }
}

/// Interaction flags that drive detail visibility
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    #[serde(default)]
    pub selected_id: Option<String>,

    #[serde(default)]
    pub hovered_id: Option<String>,

    #[serde(default)]
    pub show_all_details: bool,
}

impl InteractionState {
    pub fn selected(id: impl Into<String>) -> Self {
        Self {
            selected_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn hovered(id: impl Into<String>) -> Self {
        Self {
            hovered_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn show_all() -> Self {
        Self {
            show_all_details: true,
            ..Default::default()
        }
    }

    pub(crate) fn focuses(&self, id: &str) -> bool {
        self.selected_id.as_deref() == Some(id) || self.hovered_id.as_deref() == Some(id)
    }
}

/// How an edge is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Layer 1/2 structure
    Structural,

    /// Terminates on a detail node
    Detail,

    /// Synthetic profile -> story anchor of the force layout
    Center,

    /// Tension edge
    Tension,
}

/// Renderable style of one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub id: String,
    pub source: String,
    pub target: String,

    /// `None` for synthetic edges
    pub relation: Option<Relation>,

    pub kind: EdgeKind,
    pub stroke_width: f64,
    pub opacity: f64,
    pub dashed: bool,

    /// Both endpoints are visible
    pub visible: bool,
}

/// Axis-aligned bounds of the placed nodes, including their radii
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl LayoutBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Output of a layout engine.
///
/// Hidden nodes still have a position so toggling visibility needs no
/// recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub positions: BTreeMap<String, LayoutPoint>,
    pub visibility: BTreeMap<String, bool>,
    pub radii: BTreeMap<String, f64>,
    pub edge_styles: Vec<EdgeStyle>,
    pub bounds: Option<LayoutBounds>,
}

impl LayoutResult {
    pub fn position(&self, id: &str) -> Option<LayoutPoint> {
        self.positions.get(id).copied()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visibility.get(id).copied().unwrap_or(false)
    }

    pub fn visible_ids(&self) -> Vec<&str> {
        self.visibility
            .iter()
            .filter(|(_, v)| **v)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
