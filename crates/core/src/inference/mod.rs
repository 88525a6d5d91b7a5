//! Column type inference for imported data files
//!
//! Every cell arrives as text. This module decides which semantic type each
//! column should be stored as, preferring the narrowest type that safely
//! represents the whole sample.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dataloom_core::inference::{ColumnTypeInferrer, SemanticType};
//!
//! let inferrer = ColumnTypeInferrer::new();
//! let ty = inferrer.infer_column(&[Some("1"), Some("2"), Some("3")]);
//! assert_eq!(ty, SemanticType::Integer);
//! ```

mod config;
mod formats;
mod inferrer;
mod types;

pub use config::{DashPolicy, InferenceConfig, InferenceConfigBuilder};
pub use formats::{
    EXPLICIT_PATTERNS, is_midnight, parse_explicit, parse_integral, parse_number,
    parse_permissive,
};
pub use inferrer::ColumnTypeInferrer;
pub use types::{ColumnInference, SemanticType, StringTier};
