//! JSON type descriptions
//!
//! The description front end reuses the model and layout passes but renders
//! no harness text.

use serde::Serialize;

use crate::api::TargetApi;
use crate::config::{CallContext, GenerationConfig};
use crate::descriptor::{DefaultValue, NodeId, Tree};
use crate::layout::{Layout, LayoutAllocator, Slot};
use crate::names::{NameResolver, Names};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDescription {
    pub name: String,
    pub group: String,
    pub api: &'static str,
    pub context: CallContext,
    pub total_categorical: usize,
    pub total_numeric: usize,
    pub params: Vec<ParamDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub kind: &'static str,
    pub type_label: String,
    pub stable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    pub categorical: [usize; 2],
    pub numeric: [usize; 2],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParamDescription>,
}

/// Describe every parameter of an API with its layout
pub fn describe(api: &TargetApi, config: &GenerationConfig) -> Result<ApiDescription> {
    api.tree.validate()?;
    let names = NameResolver::default().resolve(&api.tree);
    let layout = LayoutAllocator::new(config.max_variable_length).allocate(&api.tree)?;

    let params = api
        .shape
        .roles()
        .into_iter()
        .map(|(id, role)| {
            let mut param = describe_node(&api.tree, &names, &layout, id);
            param.role = Some(role);
            param
        })
        .collect();

    Ok(ApiDescription {
        name: api.name.clone(),
        group: api.group.clone(),
        api: api.shape.tag(),
        context: config.context.unwrap_or_else(|| api.default_context()),
        total_categorical: layout.total_categorical,
        total_numeric: layout.total_numeric,
        params,
    })
}

fn describe_node(tree: &Tree, names: &Names, layout: &Layout, id: NodeId) -> ParamDescription {
    let node = &tree[id];
    let slots = layout.slots(id);
    ParamDescription {
        name: names.name(id).to_string(),
        role: None,
        kind: node.kind.tag(),
        type_label: tree.type_label(id),
        stable: tree.is_stable(id),
        default: node.default.clone(),
        slot: slots.own,
        categorical: [slots.categorical.start, slots.categorical.end],
        numeric: [slots.numeric.start, slots.numeric.end],
        children: tree
            .children(id)
            .into_iter()
            .map(|child| describe_node(tree, names, layout, child))
            .collect(),
    }
}

/// Pretty JSON for a batch of descriptions
pub fn to_json(descriptions: &[ApiDescription]) -> Result<String> {
    Ok(serde_json::to_string_pretty(descriptions)?)
}
