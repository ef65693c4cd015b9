//! # hf-engine
//!
//! Parameter-descriptor engine for HarnessForge fuzz harness generation.
//!
//! ## Features
//!
//! - **Descriptor Model**: closed tagged union of parameter kinds in a per-API arena
//! - **Name Resolution**: collision-free identifiers against a reserved scaffold set
//! - **Layout Allocation**: categorical and numeric index spaces, assigned in pre-order
//! - **Constraint Collection**: hard and soft predicates with context-dependent floors
//! - **Harness Emission**: setup, constraint, reconstruction, guard and call blocks
//! - **Target Styles**: plain-buffer and symbolic-constraint wrappers, JSON descriptions
//! - **Tensor Flavors**: basic, sparse and quantized dtype sets; plain-buffer coverage runners
//!
//! ## Example
//!
//! ```rust,ignore
//! use hf_engine::{ApiSignature, GenerationConfig, HarnessGenerator};
//!
//! let signature: ApiSignature = serde_json::from_str(json)?;
//! let generator = HarnessGenerator::new(GenerationConfig::symbolic());
//! let harness = generator.generate_signature(&signature)?;
//! println!("{}", harness.text);
//! ```

pub mod api;
pub mod builder;
pub mod config;
pub mod constraints;
pub mod describe;
pub mod descriptor;
pub mod emit;
pub mod harness;
pub mod layout;
pub mod names;
pub mod signature;
pub mod style;

pub use api::{ApiShape, TargetApi};
pub use builder::TreeBuilder;
pub use config::{CallContext, GenerationConfig, HarnessConfig, IntFloors, TargetStyle, TensorFlavor};
pub use constraints::{BoundOrigin, ConstraintCollector, ConstraintSet, Predicate};
pub use describe::{ApiDescription, ParamDescription, describe};
pub use descriptor::{DefaultValue, Descriptor, Kind, NodeId, Tree};
pub use emit::{CallExpression, Choices, Emitter, HarnessBlocks, InputDecl};
pub use harness::{Harness, HarnessGenerator};
pub use layout::{Layout, LayoutAllocator, NodeSlots, Slot, Space};
pub use names::{NameResolver, Names};
pub use signature::{ApiSignature, ParamSpec, ShapeSpec, TypeSpec};
pub use style::{HarnessStyle, PlainBufferStyle, SymbolicStyle};

use thiserror::Error;

/// Errors that can occur while generating a harness
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Unsupported parameter '{param}' ({type_label}) in {api}")]
    UnsupportedParameter {
        api: String,
        param: String,
        type_label: String,
    },

    #[error("Malformed descriptor '{name}': {reason}")]
    MalformedDescriptor { name: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Generate one harness with the given configuration
pub fn generate(signature: &ApiSignature, config: &GenerationConfig) -> Result<Harness> {
    HarnessGenerator::new(config.clone()).generate_signature(signature)
}
