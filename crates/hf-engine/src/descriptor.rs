//! Descriptor model
//!
//! A parameter is a tree of [`Descriptor`] nodes stored in a [`Tree`] arena and
//! referenced by [`NodeId`]. A child is always pushed before its parent, so ids
//! of children are smaller than the id of the node that owns them. The tree is
//! never mutated by the passes; each pass returns its own value indexed by id.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Index;

use crate::{HarnessError, Result};

/// Index of a descriptor inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Numeric range label of an integer leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntRange {
    Narrow,
    #[default]
    Wide,
    /// Symbolic size wrapping a wide integer
    Symbolic,
}

impl IntRange {
    pub fn type_label(self) -> &'static str {
        match self {
            IntRange::Narrow => "int",
            IntRange::Wide => "long",
            IntRange::Symbolic => "c10::SymInt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatPrecision {
    Half,
    BFloat,
    #[default]
    Single,
    Double,
}

impl FloatPrecision {
    pub fn type_label(self) -> &'static str {
        match self {
            FloatPrecision::Half => "at::Half",
            FloatPrecision::BFloat => "at::BFloat16",
            FloatPrecision::Single => "float",
            FloatPrecision::Double => "double",
        }
    }

    /// Name of the external value dictionary
    pub fn dictionary(self) -> &'static str {
        match self {
            FloatPrecision::Half => "half",
            FloatPrecision::BFloat => "bfloat",
            FloatPrecision::Single => "float",
            FloatPrecision::Double => "double",
        }
    }
}

/// Opaque value set drawn from an external dictionary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    Dtype,
    Layout,
    Device,
    MemoryFormat,
    /// Dtypes a `c10::Scalar` can carry
    ScalarDtype,
    /// Dtypes legal for sparse layouts
    SparseDtype,
    /// Quantized dtypes
    QuantizedDtype,
    Custom { type_label: String, dictionary: String },
}

impl DomainType {
    pub fn type_label(&self) -> &str {
        match self {
            DomainType::Dtype | DomainType::ScalarDtype | DomainType::SparseDtype | DomainType::QuantizedDtype => {
                "c10::ScalarType"
            }
            DomainType::Layout => "c10::Layout",
            DomainType::Device => "c10::Device",
            DomainType::MemoryFormat => "c10::MemoryFormat",
            DomainType::Custom { type_label, .. } => type_label,
        }
    }

    pub fn dictionary(&self) -> &str {
        match self {
            DomainType::Dtype => "dtype",
            DomainType::Layout => "layout",
            DomainType::Device => "device",
            DomainType::MemoryFormat => "memory_format",
            DomainType::ScalarDtype => "scalar_dtype",
            DomainType::SparseDtype => "sparse_dtype",
            DomainType::QuantizedDtype => "qdtype",
            DomainType::Custom { dictionary, .. } => dictionary,
        }
    }
}

/// Fixed-arity composite flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedShape {
    Tuple,
    Pair,
    Array,
    ExpandingArray,
    /// Expanding array whose elements are each optional
    ExpandingOptional,
}

/// Variable-length composite flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqFlavor {
    #[default]
    Vector,
    /// Non-owning view over a backing vector
    ArraySlice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeFlavor {
    Tensor,
    Plain,
}

/// A declared default supplied by the extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl DefaultValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DefaultValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Bool(v) => write!(f, "{v}"),
            DefaultValue::Int(v) => write!(f, "{v}"),
            DefaultValue::Float(v) => write!(f, "{v}"),
            DefaultValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// Setter-path field of an options object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setter {
    pub method: String,
    pub value: NodeId,
}

/// Which index space a slot lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    Categorical,
    Numeric,
}

/// Every descriptor kind
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Int { range: IntRange },
    UnsignedInt,
    Bool,
    Float { precision: FloatPrecision },
    Str { view: bool },
    Domain { domain: DomainType },
    BoundedInt { bound: usize },
    Null,
    EnumLiteral { type_label: String, literal: String },
    /// Type the extractor could not classify
    Opaque { type_label: String },
    Fixed { shape: FixedShape, elements: Vec<NodeId> },
    Sequence { flavor: SeqFlavor, length: NodeId, elements: Vec<NodeId> },
    Variant { candidates: Vec<NodeId> },
    Optional { has_value: NodeId, inner: NodeId },
    Shape {
        flavor: ShapeFlavor,
        dtype: Option<NodeId>,
        /// Present for sparse tensors only
        layout: Option<NodeId>,
        rank: NodeId,
        dims: Vec<NodeId>,
    },
    /// Dtype selector followed by one candidate value per representation
    Scalar { dtype: NodeId, values: Vec<NodeId> },
    Options { class_name: String, ctor: Vec<NodeId>, setters: Vec<Setter> },
}

impl Kind {
    /// Stable tag used in descriptions and diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            Kind::Int { .. } => "int",
            Kind::UnsignedInt => "unsigned_int",
            Kind::Bool => "bool",
            Kind::Float { .. } => "float",
            Kind::Str { .. } => "string",
            Kind::Domain { .. } => "domain",
            Kind::BoundedInt { .. } => "bounded_int",
            Kind::Null => "null",
            Kind::EnumLiteral { .. } => "enum",
            Kind::Opaque { .. } => "unsupported",
            Kind::Fixed { shape, .. } => match shape {
                FixedShape::Tuple => "tuple",
                FixedShape::Pair => "pair",
                FixedShape::Array => "array",
                FixedShape::ExpandingArray => "expanding_array",
                FixedShape::ExpandingOptional => "expanding_array_optional",
            },
            Kind::Sequence { flavor, .. } => match flavor {
                SeqFlavor::Vector => "vector",
                SeqFlavor::ArraySlice => "array_slice",
            },
            Kind::Variant { .. } => "variant",
            Kind::Optional { .. } => "optional",
            Kind::Shape { flavor, .. } => match flavor {
                ShapeFlavor::Tensor => "tensor",
                ShapeFlavor::Plain => "shape",
            },
            Kind::Scalar { .. } => "scalar",
            Kind::Options { .. } => "options",
        }
    }

    /// Children in declaration order, which is also layout order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Kind::Int { .. }
            | Kind::UnsignedInt
            | Kind::Bool
            | Kind::Float { .. }
            | Kind::Str { .. }
            | Kind::Domain { .. }
            | Kind::BoundedInt { .. }
            | Kind::Null
            | Kind::EnumLiteral { .. }
            | Kind::Opaque { .. } => Vec::new(),
            Kind::Fixed { elements, .. } => elements.clone(),
            Kind::Sequence { length, elements, .. } => {
                std::iter::once(*length).chain(elements.iter().copied()).collect()
            }
            Kind::Variant { candidates } => candidates.clone(),
            Kind::Optional { has_value, inner } => vec![*has_value, *inner],
            Kind::Shape { dtype, layout, rank, dims, .. } => dtype
                .iter()
                .chain(layout.iter())
                .copied()
                .chain(std::iter::once(*rank))
                .chain(dims.iter().copied())
                .collect(),
            Kind::Scalar { dtype, values } => std::iter::once(*dtype).chain(values.iter().copied()).collect(),
            Kind::Options { ctor, setters, .. } => {
                ctor.iter().copied().chain(setters.iter().map(|s| s.value)).collect()
            }
        }
    }

    /// Slot this node consumes itself, not counting its children
    pub fn own_space(&self) -> Option<Space> {
        match self {
            Kind::Int { .. } | Kind::UnsignedInt => Some(Space::Numeric),
            Kind::Bool
            | Kind::Float { .. }
            | Kind::Str { .. }
            | Kind::Domain { .. }
            | Kind::BoundedInt { .. }
            | Kind::Variant { .. } => Some(Space::Categorical),
            // Single-valued literals carry no input
            Kind::Null
            | Kind::EnumLiteral { .. }
            | Kind::Opaque { .. }
            | Kind::Fixed { .. }
            | Kind::Sequence { .. }
            | Kind::Optional { .. }
            | Kind::Shape { .. }
            | Kind::Scalar { .. }
            | Kind::Options { .. } => None,
        }
    }

    /// Whether the node is materialized into a storage variable
    pub fn needs_storage(&self) -> bool {
        matches!(
            self,
            Kind::Fixed { .. }
                | Kind::Sequence { .. }
                | Kind::Optional { .. }
                | Kind::Shape { .. }
                | Kind::Scalar { .. }
                | Kind::Options { .. }
        )
    }

    /// Fixed arrays and sequences, the candidates a union takes constraints from
    pub fn is_array_like(&self) -> bool {
        match self {
            Kind::Fixed { shape, .. } => matches!(
                shape,
                FixedShape::Array | FixedShape::ExpandingArray | FixedShape::ExpandingOptional
            ),
            Kind::Sequence { .. } => true,
            _ => false,
        }
    }

    /// Kinds whose recorded default applies to their elements
    pub fn forwards_default(&self) -> bool {
        match self {
            Kind::Fixed { shape, .. } => !matches!(shape, FixedShape::Tuple | FixedShape::Pair),
            Kind::Variant { .. } | Kind::Optional { .. } => true,
            _ => false,
        }
    }

    /// Suffixes of auxiliary identifiers the emitter declares for this node
    pub fn aux_suffixes(&self) -> &'static [&'static str] {
        match self {
            Kind::Variant { .. } => &["table"],
            Kind::Sequence { flavor: SeqFlavor::ArraySlice, .. } => &["buf"],
            _ => &[],
        }
    }
}

/// A node in the parameter tree
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub name: String,
    pub kind: Kind,
    pub default: Option<DefaultValue>,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }
}

/// Arena holding every descriptor of one target API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<Descriptor>,
    roots: Vec<NodeId>,
}

impl Index<NodeId> for Tree {
    type Output = Descriptor;

    fn index(&self, id: NodeId) -> &Descriptor {
        &self.nodes[id.index()]
    }
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; its children must already be in the tree
    pub fn push(&mut self, descriptor: Descriptor) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(descriptor);
        id
    }

    pub fn add_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Descriptor> {
        self.nodes.get(id.index())
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    pub(crate) fn rename(&mut self, id: NodeId, name: String) {
        self.nodes[id.index()].name = name;
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self[id].kind.children()
    }

    /// All nodes reachable from the roots, parents before children
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.preorder_into(root, &mut out);
        }
        out
    }

    pub fn preorder_from(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.preorder_into(id, &mut out);
        out
    }

    fn preorder_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in self.children(id) {
            self.preorder_into(child, out);
        }
    }

    /// Whether every node under `id` is known
    pub fn is_stable(&self, id: NodeId) -> bool {
        match &self[id].kind {
            Kind::Opaque { .. } => false,
            kind => kind.children().into_iter().all(|c| self.is_stable(c)),
        }
    }

    /// Type label in the target source language, valid for unstable nodes too
    pub fn type_label(&self, id: NodeId) -> String {
        match &self[id].kind {
            Kind::Int { range } => range.type_label().to_string(),
            Kind::UnsignedInt => "unsigned long".to_string(),
            Kind::Bool => "bool".to_string(),
            Kind::Float { precision } => precision.type_label().to_string(),
            Kind::Str { view: true } => "c10::string_view".to_string(),
            Kind::Str { view: false } => "std::string".to_string(),
            Kind::Domain { domain } => domain.type_label().to_string(),
            Kind::BoundedInt { .. } => "size_t".to_string(),
            Kind::Null => "c10::nullopt_t".to_string(),
            Kind::EnumLiteral { type_label, .. } | Kind::Opaque { type_label } => type_label.clone(),
            Kind::Fixed { shape, elements } => {
                let n = elements.len();
                match shape {
                    FixedShape::Tuple => format!("std::tuple<{}>", self.joined_labels(elements)),
                    FixedShape::Pair => format!("std::pair<{}>", self.joined_labels(elements)),
                    FixedShape::Array => format!("{}*", self.element_label(elements)),
                    FixedShape::ExpandingArray => {
                        format!("torch::ExpandingArray<{n}, {}>", self.element_label(elements))
                    }
                    FixedShape::ExpandingOptional => format!(
                        "torch::ExpandingArrayWithOptionalElem<{n}, {}>",
                        elements.first().map(|&e| self.optional_base(e)).unwrap_or_default()
                    ),
                }
            }
            Kind::Sequence { flavor, elements, .. } => match flavor {
                SeqFlavor::Vector => format!("std::vector<{}>", self.element_label(elements)),
                SeqFlavor::ArraySlice => format!("c10::ArrayRef<{}>", self.element_label(elements)),
            },
            Kind::Variant { candidates } => format!("c10::variant<{}>", self.joined_labels(candidates)),
            Kind::Optional { inner, .. } => format!("c10::optional<{}>", self.type_label(*inner)),
            Kind::Shape { flavor: ShapeFlavor::Tensor, .. } => "torch::Tensor".to_string(),
            Kind::Shape { flavor: ShapeFlavor::Plain, .. } => "std::vector<long>".to_string(),
            Kind::Scalar { .. } => "c10::Scalar".to_string(),
            Kind::Options { class_name, .. } => class_name.clone(),
        }
    }

    /// Label of the value an optional wraps, or of the node itself
    pub fn optional_base(&self, id: NodeId) -> String {
        match &self[id].kind {
            Kind::Optional { inner, .. } => self.type_label(*inner),
            _ => self.type_label(id),
        }
    }

    pub(crate) fn element_label(&self, elements: &[NodeId]) -> String {
        elements.first().map(|&e| self.type_label(e)).unwrap_or_default()
    }

    fn joined_labels(&self, ids: &[NodeId]) -> String {
        ids.iter().map(|&id| self.type_label(id)).collect::<Vec<_>>().join(", ")
    }

    /// Whether a default literal is meaningful for this node
    ///
    /// An opaque node keeps any default: it never reaches a constraint, but it
    /// lets the parameter be passed as a placeholder instead of abandoning the
    /// target.
    pub fn accepts_default(&self, id: NodeId, value: &DefaultValue) -> bool {
        match (&self[id].kind, value) {
            (Kind::Opaque { .. }, _) => true,
            (Kind::Int { .. }, DefaultValue::Int(_)) => true,
            (Kind::UnsignedInt, DefaultValue::Int(v)) => *v >= 0,
            (Kind::Float { .. }, DefaultValue::Float(_) | DefaultValue::Int(_)) => true,
            (Kind::Bool, DefaultValue::Bool(_)) => true,
            (Kind::Str { .. }, DefaultValue::Str(_)) => true,
            (Kind::BoundedInt { bound }, DefaultValue::Int(v)) => *v >= 0 && (*v as usize) < *bound,
            (Kind::Fixed { elements, .. }, _) if self[id].kind.forwards_default() => {
                elements.first().is_some_and(|&e| self.accepts_default(e, value))
            }
            (Kind::Optional { inner, .. }, _) => self.accepts_default(*inner, value),
            (Kind::Variant { candidates }, _) => candidates
                .iter()
                .any(|&c| self.is_stable(c) && self.accepts_default(c, value)),
            _ => false,
        }
    }

    /// Record a default if the node accepts it; returns whether it was kept
    pub fn set_default(&mut self, id: NodeId, value: DefaultValue) -> bool {
        if !self.accepts_default(id, &value) {
            return false;
        }
        self.nodes[id.index()].default = Some(value);
        true
    }

    /// Check arena integrity and kind-specific arity
    pub fn validate(&self) -> Result<()> {
        let mut parents: HashSet<NodeId> = HashSet::new();
        for id in self.ids() {
            let node = &self[id];
            for child in node.kind.children() {
                if child >= id {
                    return Err(HarnessError::malformed(
                        &node.name,
                        format!("child {child} is not created before its parent {id}"),
                    ));
                }
                if !parents.insert(child) {
                    return Err(HarnessError::malformed(&node.name, format!("child {child} has two parents")));
                }
            }
            self.validate_kind(id)?;
        }

        let mut seen_roots = HashSet::new();
        for &root in &self.roots {
            if root.index() >= self.nodes.len() {
                return Err(HarnessError::malformed("<root>", format!("root {root} does not exist")));
            }
            if parents.contains(&root) || !seen_roots.insert(root) {
                return Err(HarnessError::malformed(&self[root].name, "root is also referenced elsewhere"));
            }
        }
        Ok(())
    }

    fn validate_kind(&self, id: NodeId) -> Result<()> {
        let node = &self[id];
        let fail = |reason: String| Err(HarnessError::malformed(&node.name, reason));

        match &node.kind {
            Kind::BoundedInt { bound: 0 } => fail("bounded integer with no legal value".into()),
            Kind::Fixed { shape: FixedShape::Pair, elements } if elements.len() != 2 => {
                fail(format!("pair declares 2 elements but has {}", elements.len()))
            }
            Kind::Fixed { elements, .. } if elements.is_empty() => fail("fixed composite with no elements".into()),
            Kind::Fixed { shape: FixedShape::ExpandingOptional, elements }
                if elements.iter().any(|&e| !matches!(self[e].kind, Kind::Optional { .. })) =>
            {
                fail("expanding optional array holds a non-optional element".into())
            }
            Kind::Sequence { elements, .. } if elements.is_empty() => fail("sequence with no element slots".into()),
            Kind::Sequence { length, elements, .. } => match self[*length].kind {
                Kind::BoundedInt { bound } if bound == elements.len() + 1 => Ok(()),
                _ => fail(format!("length leaf must be bounded by {}", elements.len() + 1)),
            },
            Kind::Variant { candidates } if candidates.is_empty() => fail("union with zero candidates".into()),
            Kind::Optional { has_value, .. } if self[*has_value].kind != Kind::Bool => {
                fail("has-value flag must be a boolean".into())
            }
            Kind::Shape { dims, .. } if dims.is_empty() => fail("shape with no dimension leaves".into()),
            Kind::Shape { layout: Some(layout), .. }
                if !matches!(self[*layout].kind, Kind::Domain { domain: DomainType::Layout }) =>
            {
                fail("layout child must be a layout leaf".into())
            }
            Kind::Shape { rank, dims, .. } => match self[*rank].kind {
                Kind::BoundedInt { bound } if bound == dims.len() + 1 => Ok(()),
                _ => fail(format!("rank leaf must be bounded by {}", dims.len() + 1)),
            },
            Kind::Scalar { dtype, .. } if !matches!(self[*dtype].kind, Kind::Domain { .. }) => {
                fail("scalar selector must be a dtype leaf".into())
            }
            Kind::Scalar { values, .. } if values.is_empty() => fail("scalar with no candidate values".into()),
            _ => Ok(()),
        }
    }
}
