//! Generation configuration

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::descriptor::DomainType;
use crate::{HarnessError, Result};

/// Which harness wrapper the emitter targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStyle {
    /// Coverage-guided fuzzer feeding a raw byte buffer
    PlainBuffer,
    /// Constraint-solving input generator with named symbolic arguments
    #[default]
    Symbolic,
}

impl TargetStyle {
    pub const ALL: [TargetStyle; 2] = [TargetStyle::Symbolic, TargetStyle::PlainBuffer];

    /// Directory name used for this style's output tree
    pub fn dir_name(self) -> &'static str {
        match self {
            TargetStyle::PlainBuffer => "libfuzzer",
            TargetStyle::Symbolic => "pathfinder",
        }
    }
}

impl fmt::Display for TargetStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStyle::PlainBuffer => write!(f, "plain_buffer"),
            TargetStyle::Symbolic => write!(f, "symbolic"),
        }
    }
}

/// Tensor family a harness fuzzes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorFlavor {
    #[default]
    Basic,
    /// Sparse dtypes, plus a fuzzed layout per tensor
    Sparse,
    /// Quantized dtypes
    Quantized,
}

impl TensorFlavor {
    /// Value set every dtype leaf draws from
    pub fn dtype_domain(self) -> DomainType {
        match self {
            TensorFlavor::Basic => DomainType::Dtype,
            TensorFlavor::Sparse => DomainType::SparseDtype,
            TensorFlavor::Quantized => DomainType::QuantizedDtype,
        }
    }

    pub fn fuzzes_layout(self) -> bool {
        self == TensorFlavor::Sparse
    }
}

impl fmt::Display for TensorFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorFlavor::Basic => write!(f, "basic"),
            TensorFlavor::Sparse => write!(f, "sparse"),
            TensorFlavor::Quantized => write!(f, "quantized"),
        }
    }
}

/// Where the target's arguments are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallContext {
    #[default]
    FunctionCall,
    ModuleConstructor,
}

/// Baseline floors for integers without a declared default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntFloors {
    pub call_site: i64,
    pub constructor: i64,
}

impl Default for IntFloors {
    fn default() -> Self {
        Self {
            call_site: 0,
            constructor: 1,
        }
    }
}

impl IntFloors {
    pub fn baseline(&self, context: CallContext) -> i64 {
        match context {
            CallContext::FunctionCall => self.call_site,
            CallContext::ModuleConstructor => self.constructor,
        }
    }
}

/// Fixed boilerplate around the generated blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Include targets, written verbatim after `#include`
    pub includes: Vec<String>,

    /// Namespace imported with `using namespace`
    pub namespace_import: Option<String>,

    /// Statements run at the top of every callback
    pub prologue: Vec<String>,

    /// Exception type raised by internal assertion failures
    pub internal_error_type: String,

    /// Handler returning the callback status for internal assertion failures
    pub internal_error_handler: String,

    /// Handler returning the callback status for every other exception
    pub expected_error_handler: String,

    /// Append a `main` that hands control to the symbolic driver
    pub emit_driver_main: bool,

    /// Plain-buffer only: emit `run_one_unit` plus a `main` replaying corpus seeds
    /// instead of the fuzzer entry point
    pub coverage_runner: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            includes: vec!["<stdint.h>".into(), "<stddef.h>".into(), "<c10/util/irange.h>".into(),
                "<cassert>".into(), "<cstdlib>".into(), "<torch/torch.h>".into(), "\"fuzzer_util.h\"".into()],
            namespace_import: Some("fuzzer_util".into()),
            prologue: vec!["torch::set_num_threads(1);".into()],
            internal_error_type: "c10::Error".into(),
            internal_error_handler: "abort_if_pytorch_internal_assertion_failed".into(),
            expected_error_handler: "abort_if_not_expected_exception".into(),
            emit_driver_main: false,
            coverage_runner: false,
        }
    }
}

/// Configuration for one harness generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Harness wrapper to emit
    pub fuzz_target_style: TargetStyle,

    /// Call context; inferred from the API shape when unset
    pub context: Option<CallContext>,

    /// Pre-allocated element count for every variable-length composite
    pub max_variable_length: usize,

    /// Dimension leaves allocated per tensor-shape composite
    pub max_rank: usize,

    /// Integer floors per context
    pub int_floors: IntFloors,

    /// Tensor family, selecting the dtype set and whether layouts are fuzzed
    pub tensor_flavor: TensorFlavor,

    /// Wrapper boilerplate
    pub harness: HarnessConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            fuzz_target_style: TargetStyle::Symbolic,
            context: None,
            max_variable_length: 6,
            max_rank: 5,
            int_floors: IntFloors::default(),
            tensor_flavor: TensorFlavor::Basic,
            harness: HarnessConfig::default(),
        }
    }
}

impl GenerationConfig {
    /// Config for the symbolic-constraint front end
    pub fn symbolic() -> Self {
        Self::default()
    }

    /// Config for the plain-buffer front end
    pub fn plain_buffer() -> Self {
        Self {
            fuzz_target_style: TargetStyle::PlainBuffer,
            ..Default::default()
        }
    }

    /// Builder: set target style
    pub fn with_style(mut self, style: TargetStyle) -> Self {
        self.fuzz_target_style = style;
        self
    }

    /// Builder: force a call context
    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Builder: set variable-length bound
    pub fn with_max_variable_length(mut self, m: usize) -> Self {
        self.max_variable_length = m;
        self
    }

    /// Builder: set tensor rank bound
    pub fn with_max_rank(mut self, rank: usize) -> Self {
        self.max_rank = rank;
        self
    }

    /// Builder: set integer floors
    pub fn with_int_floors(mut self, floors: IntFloors) -> Self {
        self.int_floors = floors;
        self
    }

    /// Builder: set tensor flavor
    pub fn with_tensor_flavor(mut self, flavor: TensorFlavor) -> Self {
        self.tensor_flavor = flavor;
        self
    }

    /// Builder: emit a coverage runner instead of a fuzzer entry point
    pub fn with_coverage_runner(mut self, enabled: bool) -> Self {
        self.harness.coverage_runner = enabled;
        self
    }

    /// Builder: set wrapper boilerplate
    pub fn with_harness(mut self, harness: HarnessConfig) -> Self {
        self.harness = harness;
        self
    }

    /// Reject bounds no descriptor could be laid out with
    pub fn validate(&self) -> Result<()> {
        if self.max_variable_length == 0 {
            return Err(HarnessError::Config("max_variable_length must be at least 1".into()));
        }
        if self.max_rank == 0 {
            return Err(HarnessError::Config("max_rank must be at least 1".into()));
        }
        Ok(())
    }

    /// Load from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HarnessError::Config(e.to_string()))
    }
}
