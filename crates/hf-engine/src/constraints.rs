//! Hard and soft constraint collection

use serde::Serialize;
use std::fmt;

use crate::config::{CallContext, IntFloors};
use crate::descriptor::{DefaultValue, Kind, NodeId, Tree};
use crate::names::Names;

/// Where a predicate's bound came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundOrigin {
    /// The declared default of the leaf or a forwarding ancestor
    Default,
    /// The context floor, used when no default exists
    Baseline,
    /// A structural requirement of the kind
    Structural,
}

/// `subject >= bound`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    #[serde(skip)]
    pub subject: NodeId,
    pub name: String,
    pub bound: i64,
    pub origin: BoundOrigin,
}

impl Predicate {
    /// Render with the subject replaced by a style-specific reference
    pub fn render_with(&self, subject: &str) -> String {
        format!("{subject} >= {}", self.bound)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} >= {}", self.name, self.bound)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstraintSet {
    pub hard: Vec<Predicate>,
    pub soft: Vec<Predicate>,
}

impl ConstraintSet {
    pub fn is_empty(&self) -> bool {
        self.hard.is_empty() && self.soft.is_empty()
    }
}

/// Walks a tree in pre-order collecting predicates per kind
pub struct ConstraintCollector<'a> {
    tree: &'a Tree,
    names: &'a Names,
    baseline: i64,
}

impl<'a> ConstraintCollector<'a> {
    pub fn new(tree: &'a Tree, names: &'a Names, context: CallContext, floors: &IntFloors) -> Self {
        Self {
            tree,
            names,
            baseline: floors.baseline(context),
        }
    }

    pub fn collect(&self) -> ConstraintSet {
        let mut set = ConstraintSet::default();
        for &root in self.tree.roots() {
            self.visit(root, None, &mut set);
        }
        set
    }

    fn predicate(&self, id: NodeId, bound: i64, origin: BoundOrigin) -> Predicate {
        Predicate {
            subject: id,
            name: self.names.name(id).to_string(),
            bound,
            origin,
        }
    }

    fn visit(&self, id: NodeId, inherited: Option<&DefaultValue>, set: &mut ConstraintSet) {
        if !self.tree.is_stable(id) {
            return;
        }
        let node = &self.tree[id];
        // An ancestor's default wins over the node's own
        let effective = inherited.or(node.default.as_ref());
        let forwarded = if node.kind.forwards_default() { effective } else { None };

        match &node.kind {
            Kind::Int { .. } => {
                let floor = match effective.and_then(DefaultValue::as_int) {
                    Some(default) => self.predicate(id, default, BoundOrigin::Default),
                    None => self.predicate(id, self.baseline, BoundOrigin::Baseline),
                };
                set.soft.push(floor);
            }
            Kind::UnsignedInt => {
                set.hard.push(self.predicate(id, 0, BoundOrigin::Structural));
                if let Some(default) = effective.and_then(DefaultValue::as_int) {
                    set.soft.push(self.predicate(id, default, BoundOrigin::Default));
                }
            }
            Kind::Bool
            | Kind::Float { .. }
            | Kind::Str { .. }
            | Kind::Domain { .. }
            | Kind::BoundedInt { .. }
            | Kind::Null
            | Kind::EnumLiteral { .. }
            | Kind::Opaque { .. } => {}
            Kind::Fixed { elements, .. } => {
                for &e in elements {
                    self.visit(e, forwarded, set);
                }
            }
            Kind::Sequence { elements, .. } => {
                for &e in elements {
                    self.visit(e, None, set);
                }
            }
            Kind::Variant { candidates } => {
                if let Some(&array) = candidates.iter().find(|&&c| self.tree[c].kind.is_array_like()) {
                    self.visit(array, forwarded, set);
                }
            }
            Kind::Optional { inner, .. } => self.visit(*inner, forwarded, set),
            Kind::Scalar { values, .. } => {
                for &v in values {
                    self.visit(v, None, set);
                }
            }
            Kind::Shape { dims, .. } => {
                for &d in dims {
                    set.hard.push(self.predicate(d, 1, BoundOrigin::Structural));
                }
            }
            Kind::Options { ctor, setters, .. } => {
                for &field in ctor.iter().chain(setters.iter().map(|s| &s.value)) {
                    self.visit(field, None, set);
                }
            }
        }
    }
}
