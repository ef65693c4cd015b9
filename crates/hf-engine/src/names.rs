//! Name resolution
//!
//! Every named node, plus the auxiliary identifiers some kinds declare, gets a
//! harness-unique identifier. Resolution is a pre-order walk: a node's name is
//! fixed before any of its children are visited.

use std::collections::HashSet;

use crate::descriptor::{NodeId, Tree};

/// Fallback for nodes the extractor left unnamed
const UNNAMED: &str = "arg";

/// Resolved identifiers, indexed by node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    primary: Vec<String>,
    aux: Vec<Vec<(&'static str, String)>>,
}

impl Names {
    pub fn name(&self, id: NodeId) -> &str {
        &self.primary[id.index()]
    }

    /// Auxiliary identifier declared under `suffix`, if the node has one
    pub fn aux(&self, id: NodeId, suffix: &str) -> Option<&str> {
        self.aux[id.index()]
            .iter()
            .find(|(s, _)| *s == suffix)
            .map(|(_, name)| name.as_str())
    }

    /// Every resolved identifier reachable from the roots, in resolution order
    pub fn all(&self, tree: &Tree) -> Vec<&str> {
        let mut out = Vec::new();
        for id in tree.preorder() {
            out.push(self.name(id));
            out.extend(self.aux[id.index()].iter().map(|(_, name)| name.as_str()));
        }
        out
    }

    /// Copy of the tree with resolved names written into the nodes
    pub fn apply(&self, tree: &Tree) -> Tree {
        let mut renamed = tree.clone();
        for id in tree.ids() {
            renamed.rename(id, self.primary[id.index()].clone());
        }
        renamed
    }
}

/// Assigns collision-free identifiers given a reserved set
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    reserved: HashSet<String>,
}

impl NameResolver {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
        }
    }

    pub fn resolve(&self, tree: &Tree) -> Names {
        let mut seen = self.reserved.clone();
        let mut primary: Vec<String> = tree.ids().map(|id| tree[id].name.clone()).collect();
        let mut aux = vec![Vec::new(); tree.len()];

        for id in tree.preorder() {
            let node = &tree[id];
            let base = if node.name.is_empty() { UNNAMED } else { node.name.as_str() };
            let resolved = unique_name(base, &mut seen);
            if resolved != node.name {
                log::debug!("renamed '{}' to '{}'", node.name, resolved);
            }

            for suffix in node.kind.aux_suffixes() {
                let extra = unique_name(&format!("{resolved}_{suffix}"), &mut seen);
                aux[id.index()].push((*suffix, extra));
            }
            primary[id.index()] = resolved;
        }

        Names { primary, aux }
    }
}

/// Return `base`, or `base_<k>` for the smallest k not yet seen, and record it
pub fn unique_name(base: &str, seen: &mut HashSet<String>) -> String {
    if seen.insert(base.to_string()) {
        return base.to_string();
    }
    let mut k = 1usize;
    loop {
        let candidate = format!("{base}_{k}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        k += 1;
    }
}
