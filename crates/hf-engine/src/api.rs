//! Target API shapes

use crate::config::CallContext;
use crate::descriptor::{NodeId, Tree};

/// How the target is invoked, with its parameters as tree roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiShape {
    /// Free function `api(params...)`
    Function { params: Vec<NodeId> },
    /// Instance method `receiver.api(params...)`
    Method { receiver: NodeId, params: Vec<NodeId> },
    /// Stateful object constructed from `ctor`, then invoked through `forward`
    Module {
        dtype: Option<NodeId>,
        ctor: Vec<NodeId>,
        forward: Vec<NodeId>,
    },
}

impl ApiShape {
    pub fn tag(&self) -> &'static str {
        match self {
            ApiShape::Function { .. } => "function",
            ApiShape::Method { .. } => "method",
            ApiShape::Module { .. } => "module",
        }
    }

    /// Top-level descriptors with their role, in root order
    pub fn roles(&self) -> Vec<(NodeId, &'static str)> {
        match self {
            ApiShape::Function { params } => params.iter().map(|&p| (p, "param")).collect(),
            ApiShape::Method { receiver, params } => std::iter::once((*receiver, "receiver"))
                .chain(params.iter().map(|&p| (p, "param")))
                .collect(),
            ApiShape::Module { dtype, ctor, forward } => dtype
                .iter()
                .map(|&d| (d, "dtype"))
                .chain(ctor.iter().map(|&p| (p, "ctor")))
                .chain(forward.iter().map(|&p| (p, "forward")))
                .collect(),
        }
    }
}

/// One target API lowered into a descriptor arena
#[derive(Debug, Clone, PartialEq)]
pub struct TargetApi {
    pub name: String,
    pub group: String,
    pub shape: ApiShape,
    pub tree: Tree,
}

impl TargetApi {
    /// Context used when the configuration does not force one
    pub fn default_context(&self) -> CallContext {
        match self.shape {
            ApiShape::Module { .. } => CallContext::ModuleConstructor,
            ApiShape::Function { .. } | ApiShape::Method { .. } => CallContext::FunctionCall,
        }
    }

    /// Unqualified name, used for method calls
    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }
}
