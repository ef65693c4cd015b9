//! Harness generation for one target API

use crate::api::TargetApi;
use crate::builder::TreeBuilder;
use crate::config::{CallContext, GenerationConfig, TargetStyle};
use crate::constraints::{ConstraintCollector, ConstraintSet};
use crate::descriptor::Kind;
use crate::emit::{Emitter, HarnessBlocks};
use crate::layout::LayoutAllocator;
use crate::names::NameResolver;
use crate::signature::ApiSignature;
use crate::style::{self, HarnessStyle};
use crate::{HarnessError, Result};

/// A generated harness
#[derive(Debug, Clone)]
pub struct Harness {
    pub api_name: String,
    pub group: String,
    pub style: TargetStyle,
    pub context: CallContext,
    pub constraints: ConstraintSet,
    pub blocks: HarnessBlocks,
    pub text: String,
}

/// Runs naming, layout, constraint collection and emission in order
pub struct HarnessGenerator {
    config: GenerationConfig,
    style: Box<dyn HarnessStyle>,
}

impl HarnessGenerator {
    /// Create a new generator
    pub fn new(config: GenerationConfig) -> Self {
        let style = style::strategy(&config);
        Self { config, style }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Lower a signature and generate its harness
    pub fn generate_signature(&self, signature: &ApiSignature) -> Result<Harness> {
        let api = TreeBuilder::new(&self.config).build(signature)?;
        self.generate(&api)
    }

    pub fn generate(&self, api: &TargetApi) -> Result<Harness> {
        api.tree.validate()?;
        self.check_required_params(api)?;

        let names = NameResolver::new(self.style.reserved_names()).resolve(&api.tree);
        let layout = LayoutAllocator::new(self.config.max_variable_length).allocate(&api.tree)?;
        let context = self.config.context.unwrap_or_else(|| api.default_context());
        let constraints = ConstraintCollector::new(&api.tree, &names, context, &self.config.int_floors).collect();

        let emitter = Emitter::new(&api.tree, &names, &layout, self.style.as_ref());
        let blocks = emitter.blocks(api, &constraints);
        let text = self.style.assemble(&blocks);

        log::debug!(
            "generated {} harness for {}: {} categorical, {} numeric slots",
            self.style.target_style(),
            api.name,
            layout.total_categorical,
            layout.total_numeric
        );

        Ok(Harness {
            api_name: api.name.clone(),
            group: api.group.clone(),
            style: self.style.target_style(),
            context,
            constraints,
            blocks,
            text,
        })
    }

    /// An unstable top-level parameter can only be passed as a placeholder when it
    /// has a default or is nullable
    fn check_required_params(&self, api: &TargetApi) -> Result<()> {
        for &root in api.tree.roots() {
            let node = &api.tree[root];
            let required = node.default.is_none() && !matches!(node.kind, Kind::Optional { .. });
            if required && !api.tree.is_stable(root) {
                return Err(HarnessError::UnsupportedParameter {
                    api: api.name.clone(),
                    param: node.name.clone(),
                    type_label: api.tree.type_label(root),
                });
            }
        }
        Ok(())
    }
}
