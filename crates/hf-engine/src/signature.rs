//! Serialized API signatures, as produced by the extractor

use serde::{Deserialize, Serialize};

use crate::descriptor::{DefaultValue, DomainType, FloatPrecision, IntRange, SeqFlavor};
use crate::{HarnessError, Result};

/// Parameter type, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeSpec {
    Int {
        #[serde(default)]
        range: IntRange,
    },
    UnsignedInt,
    Bool,
    Float {
        #[serde(default)]
        precision: FloatPrecision,
    },
    String {
        #[serde(default)]
        view: bool,
    },
    Domain {
        domain: DomainType,
    },
    BoundedInt {
        bound: usize,
    },
    Null,
    Enum {
        type_label: String,
        literal: String,
    },
    /// The extractor could not classify this type
    Unsupported {
        type_label: String,
    },
    Tuple {
        elements: Vec<ParamSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arity: Option<usize>,
    },
    Pair {
        elements: Vec<ParamSpec>,
    },
    Array {
        size: usize,
        element: Box<TypeSpec>,
    },
    ExpandingArray {
        size: usize,
        element: Box<TypeSpec>,
    },
    ExpandingArrayOptional {
        size: usize,
        element: Box<TypeSpec>,
    },
    Sequence {
        #[serde(default)]
        flavor: SeqFlavor,
        element: Box<TypeSpec>,
    },
    Variant {
        candidates: Vec<ParamSpec>,
    },
    Optional {
        inner: Box<TypeSpec>,
    },
    Tensor,
    Shape,
    /// `c10::Scalar`, fuzzed as a dtype selector over candidate values
    Scalar,
    Options {
        class_name: String,
        #[serde(default)]
        fields: Vec<ParamSpec>,
        /// Field names taken by the constructor, in constructor order
        #[serde(default)]
        ctor_params: Vec<String>,
    },
}

/// A named parameter with its optional declared default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub ty: TypeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// How the API is invoked, tagged by `api`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "api", rename_all = "snake_case")]
pub enum ShapeSpec {
    Function {
        #[serde(default)]
        params: Vec<ParamSpec>,
    },
    Method {
        receiver: ParamSpec,
        #[serde(default)]
        params: Vec<ParamSpec>,
    },
    Module {
        /// Move the module to a fuzzed dtype before invoking it
        #[serde(default)]
        dtype: bool,
        #[serde(default)]
        ctor: Vec<ParamSpec>,
        #[serde(default)]
        forward: Vec<ParamSpec>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSignature {
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(flatten)]
    pub shape: ShapeSpec,
}

impl ApiSignature {
    pub fn function(name: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            shape: ShapeSpec::Function { params },
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

/// Parse a JSON list of signatures
pub fn catalog_from_json(json: &str) -> Result<Vec<ApiSignature>> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a YAML list of signatures
pub fn catalog_from_yaml(yaml: &str) -> Result<Vec<ApiSignature>> {
    serde_yml::from_str(yaml).map_err(|e| HarnessError::Signature(e.to_string()))
}
