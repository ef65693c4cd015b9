//! Harness emission
//!
//! The emitter renders four blocks from a resolved tree: setup declarations,
//! constraint blocks, reconstruction statements with their guards, and the call.
//! Everything that differs between front ends goes through [`HarnessStyle`].

use serde::Serialize;

use crate::api::{ApiShape, TargetApi};
use crate::constraints::{ConstraintSet, Predicate};
use crate::descriptor::{FixedShape, IntRange, Kind, NodeId, SeqFlavor, ShapeFlavor, Tree};
use crate::layout::Layout;
use crate::names::Names;
use crate::style::HarnessStyle;

/// Legal values of a categorical slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Choices {
    /// Explicit literal choice list
    Literals(Vec<String>),
    /// Values `0..bound`
    Bound(usize),
    /// Size of an externally defined value list
    Accessor(String),
}

impl Choices {
    /// Expression for the number of legal values
    pub fn count_expr(&self) -> String {
        match self {
            Choices::Literals(values) => values.len().to_string(),
            Choices::Bound(bound) => bound.to_string(),
            Choices::Accessor(accessor) => accessor.clone(),
        }
    }
}

/// Input kind of one slot-owning node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDecl {
    Numeric,
    Categorical(Choices),
}

/// Statements that prepare the receiver, then the invocation itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallExpression {
    pub preamble: Vec<String>,
    pub invocation: String,
}

/// The independently usable blocks of one harness
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarnessBlocks {
    pub setup: Vec<String>,
    pub hard_constraints: Vec<String>,
    pub soft_constraints: Vec<String>,
    pub guards: Vec<String>,
    pub reconstruction: Vec<String>,
    pub call: Vec<String>,
    pub total_categorical: usize,
    pub total_numeric: usize,
}

pub struct Emitter<'a> {
    tree: &'a Tree,
    names: &'a Names,
    layout: &'a Layout,
    style: &'a dyn HarnessStyle,
}

impl<'a> Emitter<'a> {
    pub fn new(tree: &'a Tree, names: &'a Names, layout: &'a Layout, style: &'a dyn HarnessStyle) -> Self {
        Self {
            tree,
            names,
            layout,
            style,
        }
    }

    /// Render every block for one target
    pub fn blocks(&self, api: &TargetApi, constraints: &ConstraintSet) -> HarnessBlocks {
        let call = self.call(api);
        HarnessBlocks {
            setup: self.setup_lines(),
            hard_constraints: self.style.hard_constraint_block(&self.render_predicates(&constraints.hard)),
            soft_constraints: self.style.soft_constraint_block(&self.render_predicates(&constraints.soft)),
            guards: self.style.guard_lines(&self.guards()),
            reconstruction: self.reconstruction(),
            call: self.style.execute_lines(&call),
            total_categorical: self.layout.total_categorical,
            total_numeric: self.layout.total_numeric,
        }
    }

    fn render_predicates(&self, predicates: &[Predicate]) -> Vec<String> {
        predicates
            .iter()
            .map(|p| p.render_with(&self.style.constraint_subject(&p.name)))
            .collect()
    }

    fn name(&self, id: NodeId) -> &str {
        self.names.name(id)
    }

    fn aux(&self, id: NodeId, suffix: &str) -> String {
        // Names always carry the suffixes a kind declares; fall back to the
        // derived spelling for names resolved against another tree
        self.names
            .aux(id, suffix)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{suffix}", self.name(id)))
    }

    fn raw(&self, id: NodeId) -> String {
        self.style.raw_value(self.name(id))
    }

    // ═══ Setup ═══

    /// Input kind of a slot-owning node
    pub fn input_decl(&self, id: NodeId) -> Option<InputDecl> {
        let decl = match &self.tree[id].kind {
            Kind::Int { .. } | Kind::UnsignedInt => InputDecl::Numeric,
            Kind::Bool => InputDecl::Categorical(Choices::Literals(vec!["false".into(), "true".into()])),
            Kind::Float { precision } => {
                InputDecl::Categorical(Choices::Accessor(format!("{}_dict().size()", precision.dictionary())))
            }
            Kind::Str { .. } => InputDecl::Categorical(Choices::Accessor("string_dict().size()".into())),
            Kind::Domain { domain } => {
                InputDecl::Categorical(Choices::Accessor(format!("{}_dict().size()", domain.dictionary())))
            }
            Kind::BoundedInt { bound } => InputDecl::Categorical(Choices::Bound(*bound)),
            Kind::Variant { candidates } => InputDecl::Categorical(Choices::Literals(
                candidates.iter().map(|&c| self.name(c).to_string()).collect(),
            )),
            Kind::Null
            | Kind::EnumLiteral { .. }
            | Kind::Opaque { .. }
            | Kind::Fixed { .. }
            | Kind::Sequence { .. }
            | Kind::Optional { .. }
            | Kind::Shape { .. }
            | Kind::Scalar { .. }
            | Kind::Options { .. } => return None,
        };
        Some(decl)
    }

    /// One declaration per slot-owning node, in layout order
    pub fn setup_lines(&self) -> Vec<String> {
        self.layout
            .owners(self.tree)
            .into_iter()
            .filter_map(|(id, slot)| {
                self.input_decl(id)
                    .map(|decl| self.style.setup_line(self.name(id), &decl, slot, self.layout))
            })
            .collect()
    }

    // ═══ Expressions ═══

    /// Storage variable of a node materialized by a preceding statement
    pub fn storage_var(&self, id: NodeId) -> Option<String> {
        (self.tree[id].kind.needs_storage() && self.tree.is_stable(id)).then(|| self.name(id).to_string())
    }

    /// Expression to use wherever the node's value is needed
    pub fn expr(&self, id: NodeId) -> String {
        self.storage_var(id).unwrap_or_else(|| self.initializer(id))
    }

    fn exprs(&self, ids: &[NodeId]) -> String {
        ids.iter().map(|&id| self.expr(id)).collect::<Vec<_>>().join(", ")
    }

    /// Value expression of an unstable node
    pub fn placeholder(&self, id: NodeId) -> String {
        let ty = self.tree.type_label(id);
        match self.tree[id].kind {
            Kind::Optional { .. } => format!("{ty}(c10::nullopt)"),
            _ => format!("{ty}()"),
        }
    }

    /// Inline initializer, or the right-hand side of the storage statement
    pub fn initializer(&self, id: NodeId) -> String {
        if !self.tree.is_stable(id) {
            return self.placeholder(id);
        }
        let ty = self.tree.type_label(id);

        match &self.tree[id].kind {
            Kind::Int { range: IntRange::Symbolic } => format!("c10::SymInt((long)({}))", self.raw(id)),
            Kind::Int { range } => format!("({})({})", range.type_label(), self.raw(id)),
            Kind::UnsignedInt => format!("(unsigned long)({})", self.raw(id)),
            Kind::Bool => format!("(bool)({})", self.raw(id)),
            Kind::BoundedInt { .. } => format!("(size_t)({})", self.raw(id)),
            Kind::Float { precision } => format!("get_{}({})", precision.dictionary(), self.raw(id)),
            Kind::Str { .. } => format!("get_string({})", self.raw(id)),
            Kind::Domain { domain } => format!("get_{}({})", domain.dictionary(), self.raw(id)),
            Kind::Null => "c10::nullopt".to_string(),
            Kind::EnumLiteral { literal, .. } => literal.clone(),
            Kind::Opaque { .. } => self.placeholder(id),
            Kind::Variant { .. } => format!("{}[{}]", self.aux(id, "table"), self.raw(id)),
            Kind::Fixed { shape, elements } => match shape {
                FixedShape::Tuple | FixedShape::Pair => format!("{ty}({})", self.exprs(elements)),
                FixedShape::Array => format!("{{{}}}", self.exprs(elements)),
                FixedShape::ExpandingArray => format!("{ty}({{{}}})", self.exprs(elements)),
                FixedShape::ExpandingOptional => format!(
                    "expandingarray_with_optional_elem<{}, {}>({{{}}})",
                    elements.len(),
                    self.tree.optional_base(elements[0]),
                    self.exprs(elements)
                ),
            },
            Kind::Sequence { flavor, length, elements } => match flavor {
                SeqFlavor::Vector => self.vector_init(*length, elements),
                SeqFlavor::ArraySlice => format!("{ty}({})", self.aux(id, "buf")),
            },
            Kind::Optional { has_value, inner } => {
                format!("{} ? {ty}({}) : c10::nullopt", self.expr(*has_value), self.expr(*inner))
            }
            Kind::Shape { flavor, dtype, layout, rank, dims } => match (flavor, dtype) {
                (ShapeFlavor::Tensor, Some(dtype)) => {
                    let layout = layout.map(|l| format!("{}, ", self.expr(l))).unwrap_or_default();
                    format!(
                        "torch_tensor({}, {layout}{}, {{{}}})",
                        self.expr(*dtype),
                        self.expr(*rank),
                        self.exprs(dims)
                    )
                }
                _ => format!("shape_init({}, {{{}}})", self.expr(*rank), self.exprs(dims)),
            },
            Kind::Scalar { dtype, values } => {
                format!("torch_scalar({}, {})", self.expr(*dtype), self.exprs(values))
            }
            Kind::Options { class_name, ctor, .. } => format!("{class_name}({})", self.exprs(ctor)),
        }
    }

    fn vector_init(&self, length: NodeId, elements: &[NodeId]) -> String {
        format!(
            "vector_init<{}>({}, {{{}}})",
            self.tree.element_label(elements),
            self.expr(length),
            self.exprs(elements)
        )
    }

    // ═══ Reconstruction ═══

    /// Statements materializing every root, in pre-order
    pub fn reconstruction(&self) -> Vec<String> {
        let mut out = Vec::new();
        for &root in self.tree.roots() {
            self.statements(root, &mut out);
        }
        out
    }

    fn statements(&self, id: NodeId, out: &mut Vec<String>) {
        if !self.tree.is_stable(id) {
            return;
        }
        let name = self.name(id).to_string();
        let ty = self.tree.type_label(id);

        match &self.tree[id].kind {
            Kind::Int { .. }
            | Kind::UnsignedInt
            | Kind::Bool
            | Kind::Float { .. }
            | Kind::Str { .. }
            | Kind::Domain { .. }
            | Kind::BoundedInt { .. }
            | Kind::Null
            | Kind::EnumLiteral { .. }
            | Kind::Opaque { .. } => {}
            Kind::Variant { candidates } => {
                self.children_statements(candidates, out);
                out.push(format!("std::vector<{ty}> {} = {{{}}};", self.aux(id, "table"), self.exprs(candidates)));
            }
            Kind::Fixed { shape: FixedShape::Array, elements } => {
                self.children_statements(elements, out);
                out.push(format!(
                    "{} {name}[] = {};",
                    self.tree.element_label(elements),
                    self.initializer(id)
                ));
            }
            Kind::Fixed { elements, .. } => {
                self.children_statements(elements, out);
                out.push(format!("{ty} {name} = {};", self.initializer(id)));
            }
            Kind::Sequence { flavor: SeqFlavor::Vector, elements, .. } => {
                self.children_statements(elements, out);
                out.push(format!("{ty} {name} = {};", self.initializer(id)));
            }
            Kind::Sequence { flavor: SeqFlavor::ArraySlice, length, elements } => {
                self.children_statements(elements, out);
                out.push(format!(
                    "std::vector<{}> {} = {};",
                    self.tree.element_label(elements),
                    self.aux(id, "buf"),
                    self.vector_init(*length, elements)
                ));
                out.push(format!("{ty} {name}({});", self.aux(id, "buf")));
            }
            Kind::Optional { inner, .. } => {
                self.statements(*inner, out);
                out.push(format!("{ty} {name} = {};", self.initializer(id)));
            }
            Kind::Shape { .. } => out.push(format!("{ty} {name} = {};", self.initializer(id))),
            Kind::Scalar { values, .. } => {
                self.children_statements(values, out);
                out.push(format!("{ty} {name} = {};", self.initializer(id)));
            }
            Kind::Options { ctor, setters, .. } => {
                self.children_statements(ctor, out);

                let (conditional, chained): (Vec<_>, Vec<_>) = setters
                    .iter()
                    .partition(|s| matches!(self.tree[s.value].kind, Kind::Optional { .. }));

                for setter in &chained {
                    self.statements(setter.value, out);
                }
                for setter in &conditional {
                    if let Kind::Optional { inner, .. } = self.tree[setter.value].kind {
                        self.statements(inner, out);
                    }
                }

                out.push(format!("auto {name} = {}", self.initializer(id)));
                for setter in &chained {
                    out.push(format!("    .{}({})", setter.method, self.expr(setter.value)));
                }
                if let Some(last) = out.last_mut() {
                    last.push(';');
                }

                for setter in &conditional {
                    if let Kind::Optional { has_value, inner } = self.tree[setter.value].kind {
                        out.push(format!("if ({}) {{", self.expr(has_value)));
                        out.push(format!("  {name}.{}({});", setter.method, self.expr(inner)));
                        out.push("}".to_string());
                    }
                }
            }
        }
    }

    fn children_statements(&self, ids: &[NodeId], out: &mut Vec<String>) {
        for &id in ids {
            self.statements(id, out);
        }
    }

    // ═══ Guards ═══

    /// Conditions under which the input is rejected before construction
    pub fn guards(&self) -> Vec<String> {
        let mut out = Vec::new();
        for &root in self.tree.roots() {
            self.guards_of(root, &mut out);
        }
        out
    }

    fn guards_of(&self, id: NodeId, out: &mut Vec<String>) {
        if !self.tree.is_stable(id) {
            return;
        }
        match &self.tree[id].kind {
            Kind::Shape { rank, dims, .. } => {
                out.push(format!("is_too_big({}, {{{}}})", self.expr(*rank), self.exprs(dims)));
            }
            kind => {
                for child in kind.children() {
                    self.guards_of(child, out);
                }
            }
        }
    }

    // ═══ Call ═══

    /// Fully applied call to the target, receiver excluded from the arguments
    pub fn call(&self, api: &TargetApi) -> CallExpression {
        match &api.shape {
            ApiShape::Function { params } => CallExpression {
                preamble: Vec::new(),
                invocation: format!("{}({})", api.name, self.exprs(params)),
            },
            ApiShape::Method { receiver, params } => CallExpression {
                preamble: Vec::new(),
                invocation: format!("{}.{}({})", self.expr(*receiver), api.short_name(), self.exprs(params)),
            },
            ApiShape::Module { dtype, ctor, forward } => {
                let mut preamble = vec![format!("auto module = {}({});", api.name, self.exprs(ctor))];
                if let Some(dtype) = dtype {
                    preamble.push(format!("module->to({});", self.expr(*dtype)));
                }
                CallExpression {
                    preamble,
                    invocation: format!("module->forward({})", self.exprs(forward)),
                }
            }
        }
    }
}
