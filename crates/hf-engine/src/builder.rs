//! Lowering signatures into descriptor arenas

use crate::api::{ApiShape, TargetApi};
use crate::config::{GenerationConfig, TensorFlavor};
use crate::descriptor::{
    Descriptor, DomainType, FixedShape, FloatPrecision, IntRange, Kind, NodeId, Setter, ShapeFlavor, Tree,
};
use crate::signature::{ApiSignature, ParamSpec, ShapeSpec, TypeSpec};
use crate::{HarnessError, Result};

/// Builds one [`TargetApi`] per signature
pub struct TreeBuilder {
    tree: Tree,
    max_variable_length: usize,
    max_rank: usize,
    flavor: TensorFlavor,
}

/// Candidate values of a scalar, after its dtype selector
const SCALAR_VALUES: [(&str, Kind); 13] = [
    ("int", Kind::Int { range: IntRange::Narrow }),
    ("uint", Kind::UnsignedInt),
    ("bfloat", Kind::Float { precision: FloatPrecision::BFloat }),
    ("half", Kind::Float { precision: FloatPrecision::Half }),
    ("float", Kind::Float { precision: FloatPrecision::Single }),
    ("double", Kind::Float { precision: FloatPrecision::Double }),
    // Complex parts, by total width
    ("real32", Kind::Float { precision: FloatPrecision::Half }),
    ("imag32", Kind::Float { precision: FloatPrecision::Half }),
    ("real64", Kind::Float { precision: FloatPrecision::Single }),
    ("imag64", Kind::Float { precision: FloatPrecision::Single }),
    ("real128", Kind::Float { precision: FloatPrecision::Double }),
    ("imag128", Kind::Float { precision: FloatPrecision::Double }),
    ("bool", Kind::Bool),
];

impl TreeBuilder {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            tree: Tree::new(),
            max_variable_length: config.max_variable_length,
            max_rank: config.max_rank,
            flavor: config.tensor_flavor,
        }
    }

    pub fn build(mut self, signature: &ApiSignature) -> Result<TargetApi> {
        if self.max_variable_length == 0 || self.max_rank == 0 {
            return Err(HarnessError::Config("variable length and rank bounds must be positive".into()));
        }

        let shape = match &signature.shape {
            ShapeSpec::Function { params } => ApiShape::Function {
                params: self.roots(params, "arg")?,
            },
            ShapeSpec::Method { receiver, params } => {
                let receiver = self.lower_param(receiver, "self")?;
                self.tree.add_root(receiver);
                ApiShape::Method {
                    receiver,
                    params: self.roots(params, "arg")?,
                }
            }
            ShapeSpec::Module { dtype, ctor, forward } => {
                let dtype = if *dtype {
                    let id = self.leaf("dtype", self.dtype_kind());
                    self.tree.add_root(id);
                    Some(id)
                } else {
                    None
                };
                let ctor = self.roots(ctor, "ctor")?;
                let forward = self.roots(forward, "input")?;
                ApiShape::Module { dtype, ctor, forward }
            }
        };

        self.tree.validate()?;
        Ok(TargetApi {
            name: signature.name.clone(),
            group: signature.group.clone(),
            shape,
            tree: self.tree,
        })
    }

    fn roots(&mut self, params: &[ParamSpec], fallback: &str) -> Result<Vec<NodeId>> {
        let mut ids = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let id = self.lower_param(param, &format!("{fallback}_{i}"))?;
            self.tree.add_root(id);
            ids.push(id);
        }
        Ok(ids)
    }

    fn leaf(&mut self, name: &str, kind: Kind) -> NodeId {
        self.tree.push(Descriptor::new(name, kind))
    }

    /// Lower a named parameter and record its default when compatible
    pub fn lower_param(&mut self, param: &ParamSpec, fallback: &str) -> Result<NodeId> {
        let name = if param.name.is_empty() { fallback } else { param.name.as_str() };
        let id = self.lower(name, &param.ty)?;
        if let Some(default) = &param.default {
            if !self.tree.set_default(id, default.clone()) {
                log::debug!("ignoring default {} for '{}' ({})", default, name, self.tree[id].kind.tag());
            }
        }
        Ok(id)
    }

    fn lower(&mut self, name: &str, ty: &TypeSpec) -> Result<NodeId> {
        let kind = match ty {
            TypeSpec::Int { range } => Kind::Int { range: *range },
            TypeSpec::UnsignedInt => Kind::UnsignedInt,
            TypeSpec::Bool => Kind::Bool,
            TypeSpec::Float { precision } => Kind::Float { precision: *precision },
            TypeSpec::String { view } => Kind::Str { view: *view },
            TypeSpec::Domain { domain: DomainType::Dtype } => self.dtype_kind(),
            TypeSpec::Domain { domain } => Kind::Domain { domain: domain.clone() },
            TypeSpec::BoundedInt { bound } => Kind::BoundedInt { bound: *bound },
            TypeSpec::Null => Kind::Null,
            TypeSpec::Enum { type_label, literal } => Kind::EnumLiteral {
                type_label: type_label.clone(),
                literal: literal.clone(),
            },
            TypeSpec::Unsupported { type_label } => {
                log::debug!("'{name}' has unsupported type {type_label}");
                Kind::Opaque { type_label: type_label.clone() }
            }
            TypeSpec::Tuple { elements, arity } => {
                if let Some(arity) = arity {
                    if *arity != elements.len() {
                        return Err(HarnessError::malformed(
                            name,
                            format!("tuple declares {arity} elements but has {}", elements.len()),
                        ));
                    }
                }
                let elements = self.named_children(name, elements)?;
                Kind::Fixed { shape: FixedShape::Tuple, elements }
            }
            TypeSpec::Pair { elements } => {
                let elements = self.named_children(name, elements)?;
                Kind::Fixed { shape: FixedShape::Pair, elements }
            }
            TypeSpec::Array { size, element } => Kind::Fixed {
                shape: FixedShape::Array,
                elements: self.copies(name, *size, element)?,
            },
            TypeSpec::ExpandingArray { size, element } => Kind::Fixed {
                shape: FixedShape::ExpandingArray,
                elements: self.copies(name, *size, element)?,
            },
            TypeSpec::ExpandingArrayOptional { size, element } => {
                let elements = (0..*size)
                    .map(|i| self.optional(&format!("{name}_{i}"), element))
                    .collect::<Result<Vec<_>>>()?;
                Kind::Fixed { shape: FixedShape::ExpandingOptional, elements }
            }
            TypeSpec::Sequence { flavor, element } => {
                let m = self.max_variable_length;
                let length = self.leaf(&format!("{name}_size"), Kind::BoundedInt { bound: m + 1 });
                let elements = self.copies(name, m, element)?;
                Kind::Sequence { flavor: *flavor, length, elements }
            }
            TypeSpec::Variant { candidates } => Kind::Variant {
                candidates: self.named_children(name, candidates)?,
            },
            TypeSpec::Optional { inner } => return self.optional(name, inner),
            TypeSpec::Tensor => self.shape(name, ShapeFlavor::Tensor),
            TypeSpec::Shape => self.shape(name, ShapeFlavor::Plain),
            TypeSpec::Scalar => self.scalar(name),
            TypeSpec::Options { class_name, fields, ctor_params } => {
                self.options(name, class_name, fields, ctor_params)?
            }
        };
        Ok(self.leaf(name, kind))
    }

    fn named_children(&mut self, parent: &str, specs: &[ParamSpec]) -> Result<Vec<NodeId>> {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| self.lower_param(spec, &format!("{parent}_{i}")))
            .collect()
    }

    /// `count` independent nodes of one element type
    fn copies(&mut self, parent: &str, count: usize, element: &TypeSpec) -> Result<Vec<NodeId>> {
        (0..count).map(|i| self.lower(&format!("{parent}_{i}"), element)).collect()
    }

    fn optional(&mut self, name: &str, inner: &TypeSpec) -> Result<NodeId> {
        let has_value = self.leaf(&format!("{name}_has_value"), Kind::Bool);
        let inner = self.lower(&format!("{name}_value"), inner)?;
        Ok(self.leaf(name, Kind::Optional { has_value, inner }))
    }

    /// Dtype leaves draw from the value set of the configured tensor flavor
    fn dtype_kind(&self) -> Kind {
        Kind::Domain { domain: self.flavor.dtype_domain() }
    }

    fn shape(&mut self, name: &str, flavor: ShapeFlavor) -> Kind {
        let tensor = flavor == ShapeFlavor::Tensor;
        let dtype = tensor.then(|| self.leaf(&format!("{name}_dtype"), self.dtype_kind()));
        let layout = (tensor && self.flavor.fuzzes_layout())
            .then(|| self.leaf(&format!("{name}_layout"), Kind::Domain { domain: DomainType::Layout }));
        let rank = self.leaf(&format!("{name}_rank"), Kind::BoundedInt { bound: self.max_rank + 1 });
        let dims = (0..self.max_rank)
            .map(|i| self.leaf(&format!("{name}_{i}"), Kind::Int { range: IntRange::Wide }))
            .collect();
        Kind::Shape { flavor, dtype, layout, rank, dims }
    }

    fn scalar(&mut self, name: &str) -> Kind {
        let dtype = self.leaf(&format!("{name}_dtype"), Kind::Domain { domain: DomainType::ScalarDtype });
        let values = SCALAR_VALUES
            .iter()
            .map(|(suffix, kind)| self.leaf(&format!("{name}_{suffix}"), kind.clone()))
            .collect();
        Kind::Scalar { dtype, values }
    }

    /// Constructor-path fields follow the constructor's parameter order; the rest become setters
    fn options(&mut self, name: &str, class_name: &str, fields: &[ParamSpec], ctor_params: &[String]) -> Result<Kind> {
        let mut ctor = Vec::with_capacity(ctor_params.len());
        for param in ctor_params {
            let field = fields.iter().find(|f| &f.name == param).ok_or_else(|| {
                HarnessError::malformed(name, format!("constructor parameter '{param}' has no matching field"))
            })?;
            ctor.push(self.lower_param(field, param)?);
        }

        let mut setters = Vec::new();
        for (i, field) in fields.iter().enumerate() {
            if ctor_params.contains(&field.name) {
                continue;
            }
            if field.name.is_empty() {
                return Err(HarnessError::malformed(name, format!("setter field {i} has no name")));
            }
            let value = self.lower_param(field, &field.name)?;
            setters.push(Setter { method: field.name.clone(), value });
        }

        Ok(Kind::Options { class_name: class_name.to_string(), ctor, setters })
    }
}
