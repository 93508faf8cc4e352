//! # Persona Graph
//!
//! The layered knowledge graph distilled from discovery answers.
//!
//! ## Layers
//!
//! - **0 profile summary** - exactly one, at the centre
//! - **1 essay angles** - candidate framings, optionally tied to an archetype
//! - **2 key stories** - concrete narratives with a partial STAR record
//! - **3 details** - goals, skills, values and other supporting facts
//!
//! ## Architecture
//!
//! ```text
//! RawNode[] (fixtures / extraction results)
//!     │
//!     ├──> Node Builder
//!     │      ├─ Layer from type
//!     │      └─ Deterministic slug ids
//!     │
//!     ├──> Edge Builder (derived, rebuilt on every change)
//!     │      ├─ profile ──supports──> angle
//!     │      ├─ angle ──builds_on──> story   (≥2 shared tags)
//!     │      ├─ story ──enables──> detail    (≥1 shared tag)
//!     │      └─ angle ──contradicts──> story (tension rules)
//!     │
//!     └──> Coverage Scorer
//!            └─ goals / evidence / skills / values / tensions
//! ```

mod builder;
mod coverage;
mod error;
mod graph;
mod rules;
mod types;

pub use builder::{
    build_edges, build_nodes, merge_node, normalize_tags, slugify, EdgeBuilder, MergeOutcome,
    RawNode,
};
pub use coverage::{score_coverage, CoverageCategory, CoverageCounts, CoverageMetrics};
pub use error::{GraphError, Result};
pub use graph::PersonaGraph;
pub use rules::{EdgeRules, TensionPairing, TensionRule};
pub use types::{
    Archetype, NodeKind, NodeType, PersonaEdge, PersonaNode, Relation, StarField, StarRecord,
};
