//! Agent-Readiness Scoring
//!
//! Raw analyzer metrics are mapped onto a 1-10 scale through per-metric
//! breakpoint curves, then rolled up per category and across categories.
//!
//! # Scoring Formula
//!
//! ```text
//! sub_score  = interpolate(breakpoints, raw_value)        (clamped at both ends)
//! category   = Σ sub_score × w_metric / Σ w_metric         (available metrics only)
//! composite  = Σ category × w_category / Σ w_category     (categories with score >= 0)
//! ```
//!
//! A category with no available metric scores -1 and drops out of the
//! composite; when every category drops out there is no composite at all.
//!
//! # Default Category Weights
//!
//! - C1 Code Health: 0.25
//! - C2 Semantic Explicitness: 0.10
//! - C3 Architecture: 0.20
//! - C4 Documentation Quality: 0.15
//! - C6 Testing: 0.15
//!
//! # Tiers
//!
//! - Agent-Ready: composite >= 8.0
//! - Agent-Assisted: >= 6.0
//! - Agent-Limited: >= 4.0
//! - Agent-Hostile: everything below
//!
//! # Example
//!
//! A complexity average of 4.94 against `{1→10, 5→8, 10→5, 20→1}` sits
//! 98.5% of the way from 1 to 5, so it scores `10 - 0.985 × 2 = 8.03`.

mod config;
mod extract;
mod scorer;

pub use config::{Breakpoint, CategoryConfig, MetricConfig, ScoringConfig, Tier};
pub use extract::EVIDENCE_TOP_N;
pub use scorer::{category_score, classify_tier, composite_score, interpolate, Scorer, UNAVAILABLE};
