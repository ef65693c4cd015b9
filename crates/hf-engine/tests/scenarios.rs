//! End-to-end harness scenarios
//!
//! Each scenario lowers a serialized signature and checks the blocks and the
//! assembled text for one or both target styles.

use hf_engine::{
    ApiSignature, BoundOrigin, CallContext, Choices, DefaultValue, Descriptor, GenerationConfig, HarnessError,
    HarnessGenerator, InputDecl, Kind, LayoutAllocator, NameResolver, TensorFlavor, Tree, TreeBuilder, describe,
    descriptor::{IntRange, SeqFlavor},
    emit::Emitter,
    style::SymbolicStyle,
};
use serde_json::{Value, json};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn signature(value: Value) -> ApiSignature {
    serde_json::from_value(value).expect("valid signature")
}

fn relu() -> ApiSignature {
    signature(json!({
        "name": "torch::relu",
        "group": "activation",
        "api": "function",
        "params": [{ "name": "input", "kind": "tensor" }]
    }))
}

fn pad() -> ApiSignature {
    signature(json!({
        "name": "torch::nn::functional::pad",
        "group": "functional",
        "api": "function",
        "params": [
            { "name": "input", "kind": "tensor" },
            {
                "name": "options",
                "kind": "options",
                "class_name": "torch::nn::functional::PadFuncOptions",
                "ctor_params": ["pad"],
                "fields": [
                    { "name": "pad", "kind": "sequence", "element": { "kind": "int" } },
                    { "name": "mode", "kind": "enum", "type_label": "torch::enumtype::kReflect", "literal": "torch::kReflect" },
                    { "name": "value", "kind": "float", "precision": "double" }
                ]
            }
        ]
    }))
}

fn linear() -> ApiSignature {
    signature(json!({
        "name": "torch::nn::Linear",
        "group": "nn",
        "api": "module",
        "dtype": true,
        "ctor": [
            { "name": "in_features", "kind": "int" },
            { "name": "out_features", "kind": "int" }
        ],
        "forward": [{ "name": "input", "kind": "tensor" }]
    }))
}

fn single_param(param: Value) -> ApiSignature {
    signature(json!({ "name": "f", "api": "function", "params": [param] }))
}

fn soft(harness: &hf_engine::Harness) -> Vec<String> {
    harness.constraints.soft.iter().map(ToString::to_string).collect()
}

fn hard(harness: &hf_engine::Harness) -> Vec<String> {
    harness.constraints.hard.iter().map(ToString::to_string).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRAINT FLOORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_int_floor_call_context() {
    let harness = hf_engine::generate(&single_param(json!({ "name": "n", "kind": "int" })), &GenerationConfig::default())
        .unwrap();

    assert_eq!(harness.context, CallContext::FunctionCall);
    assert_eq!(soft(&harness), vec!["n >= 0"]);
    assert!(harness.constraints.hard.is_empty());
    assert!(harness.text.contains("  PathFinderAddSoftConstraint({\n    sym_int_arg[\"n\"] >= 0\n  });\n"));
}

#[test]
fn test_int_floor_constructor_context() {
    let signature = signature(json!({
        "name": "torch::nn::Softmax",
        "api": "module",
        "ctor": [{ "name": "n", "kind": "int" }]
    }));
    let harness = hf_engine::generate(&signature, &GenerationConfig::default()).unwrap();

    assert_eq!(harness.context, CallContext::ModuleConstructor);
    assert_eq!(soft(&harness), vec!["n >= 1"]);
}

#[test]
fn test_shape_dimensions_are_hard() {
    let config = GenerationConfig::default().with_max_rank(2);
    let harness = hf_engine::generate(&single_param(json!({ "name": "size", "kind": "shape" })), &config).unwrap();

    assert_eq!(hard(&harness), vec!["size_0 >= 1", "size_1 >= 1"]);
    assert!(harness.constraints.hard.iter().all(|p| p.origin == BoundOrigin::Structural));
    assert!(harness.constraints.soft.is_empty());
    assert!(harness.blocks.soft_constraints.is_empty());
}

#[test]
fn test_default_only_biases_soft() {
    let with_default = single_param(json!({ "name": "k", "kind": "expanding_array", "size": 2, "element": { "kind": "int" }, "default": 3 }));
    let without_default = single_param(json!({ "name": "k", "kind": "expanding_array", "size": 2, "element": { "kind": "int" } }));
    let config = GenerationConfig::default();

    let biased = hf_engine::generate(&with_default, &config).unwrap();
    let plain = hf_engine::generate(&without_default, &config).unwrap();

    assert_eq!(soft(&biased), vec!["k_0 >= 3", "k_1 >= 3"]);
    assert_eq!(soft(&plain), vec!["k_0 >= 0", "k_1 >= 0"]);
    assert_eq!(biased.constraints.hard, plain.constraints.hard);
}

#[test]
fn test_custom_floors() {
    let config = GenerationConfig::default().with_int_floors(hf_engine::IntFloors {
        call_site: 2,
        constructor: 4,
    });
    let harness = hf_engine::generate(&single_param(json!({ "name": "n", "kind": "int" })), &config).unwrap();

    assert_eq!(soft(&harness), vec!["n >= 2"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_vector_layout_and_setup() {
    let config = GenerationConfig::default();
    let api = TreeBuilder::new(&config)
        .build(&single_param(json!({ "name": "dims", "kind": "sequence", "element": { "kind": "int" } })))
        .unwrap();
    let layout = LayoutAllocator::new(config.max_variable_length).allocate(&api.tree).unwrap();

    assert_eq!(layout.total_categorical, 1);
    assert_eq!(layout.total_numeric, 6);

    let harness = HarnessGenerator::new(config).generate(&api).unwrap();
    assert_eq!(harness.blocks.setup[0], "PathFinderEnumArg(\"dims_size\", 7);");
    assert_eq!(harness.blocks.setup[6], "PathFinderIntArg(\"dims_5\");");
    assert!(harness.blocks.reconstruction.contains(
        &"std::vector<long> dims = vector_init<long>((size_t)(x[\"dims_size\"]), {(long)(x[\"dims_0\"]), \
          (long)(x[\"dims_1\"]), (long)(x[\"dims_2\"]), (long)(x[\"dims_3\"]), (long)(x[\"dims_4\"]), \
          (long)(x[\"dims_5\"])});"
            .to_string()
    ));
}

#[test]
fn test_sequence_slot_count_mismatch() {
    let mut tree = Tree::new();
    let length = tree.push(Descriptor::new("v_size", Kind::BoundedInt { bound: 4 }));
    let elements = (0..3)
        .map(|i| tree.push(Descriptor::new(format!("v_{i}"), Kind::Int { range: IntRange::Wide })))
        .collect();
    let v = tree.push(Descriptor::new(
        "v",
        Kind::Sequence {
            flavor: SeqFlavor::Vector,
            length,
            elements,
        },
    ));
    tree.add_root(v);
    tree.validate().unwrap();

    let err = LayoutAllocator::new(6).allocate(&tree).unwrap_err();
    assert!(matches!(err, HarnessError::MalformedDescriptor { ref name, .. } if name == "v"));
}

#[test]
fn test_plain_buffer_indices() {
    let harness = hf_engine::generate(&relu(), &GenerationConfig::plain_buffer()).unwrap();

    assert_eq!(
        harness.blocks.setup,
        vec![
            "size_t input_dtype = static_cast<size_t>(args[0]) % dtype_dict().size();",
            "size_t input_rank = static_cast<size_t>(args[1]) % 6;",
            "long input_0 = args[2];",
            "long input_1 = args[3];",
            "long input_2 = args[4];",
            "long input_3 = args[5];",
            "long input_4 = args[6];",
        ]
    );
    assert_eq!(&harness.blocks.hard_constraints[..3], &["if (!(input_0 >= 1)) {", "  return -1;", "}"]);
    assert!(harness.blocks.soft_constraints.is_empty());
    assert_eq!(harness.blocks.call, vec!["torch::relu(input);"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// UNSUPPORTED TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_optional_over_unsupported_is_unstable() {
    let config = GenerationConfig::default();
    let api = TreeBuilder::new(&config)
        .build(&single_param(json!({
            "name": "generator",
            "kind": "optional",
            "inner": { "kind": "unsupported", "type_label": "at::Generator" }
        })))
        .unwrap();
    let root = api.tree.roots()[0];

    assert!(!api.tree.is_stable(root));
    assert_eq!(api.tree.type_label(root), "c10::optional<at::Generator>");

    let names = NameResolver::default().resolve(&api.tree);
    let layout = LayoutAllocator::new(config.max_variable_length).allocate(&api.tree).unwrap();
    let style = SymbolicStyle::default();
    let emitter = Emitter::new(&api.tree, &names, &layout, &style);

    assert!(emitter.setup_lines().is_empty());
    assert!(emitter.reconstruction().is_empty());
    assert_eq!(layout.total_slots(), 0);
    assert_eq!(emitter.call(&api).invocation, "f(c10::optional<at::Generator>(c10::nullopt))");
}

#[test]
fn test_required_unsupported_abandons() {
    let signature = signature(json!({
        "name": "torch::dropout",
        "api": "function",
        "params": [
            { "name": "input", "kind": "tensor" },
            { "name": "p", "kind": "float", "precision": "double", "default": 0.5 },
            { "name": "train", "kind": "unsupported", "type_label": "c10::SymBool" }
        ]
    }));

    let err = hf_engine::generate(&signature, &GenerationConfig::default()).unwrap_err();
    assert!(matches!(err, HarnessError::UnsupportedParameter { ref param, .. } if param == "train"));
}

#[test]
fn test_defaulted_unsupported_is_placeholder() {
    let signature = signature(json!({
        "name": "torch::bernoulli",
        "api": "function",
        "params": [
            { "name": "input", "kind": "tensor" },
            { "name": "generator", "kind": "unsupported", "type_label": "at::Generator", "default": "nullptr" }
        ]
    }));
    let harness = hf_engine::generate(&signature, &GenerationConfig::plain_buffer()).unwrap();

    assert_eq!(harness.blocks.setup.len(), 7);
    assert_eq!(harness.blocks.call, vec!["torch::bernoulli(input, at::Generator());"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPOSITES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_options_object_reconstruction() {
    let harness = hf_engine::generate(&pad(), &GenerationConfig::default()).unwrap();
    let lines = &harness.blocks.reconstruction;

    let start = lines
        .iter()
        .position(|l| l == "auto options = torch::nn::functional::PadFuncOptions(pad)")
        .expect("options statement");
    assert_eq!(lines[start + 1], "    .mode(torch::kReflect)");
    assert_eq!(lines[start + 2], "    .value(get_double(x[\"value\"]));");
    assert!(lines[..start].iter().any(|l| l.starts_with("std::vector<long> pad = vector_init<long>(")));
    assert_eq!(harness.blocks.call.last().unwrap(), "  auto result = torch::nn::functional::pad(input, options));");
}

#[test]
fn test_optional_setter_is_conditional() {
    let signature = single_param(json!({
        "name": "opts",
        "kind": "options",
        "class_name": "torch::nn::functional::InterpolateFuncOptions",
        "fields": [
            { "name": "scale_factor", "kind": "optional", "inner": { "kind": "float", "precision": "double" } },
            { "name": "align_corners", "kind": "optional", "inner": { "kind": "bool" } }
        ]
    }));
    let harness = hf_engine::generate(&signature, &GenerationConfig::default()).unwrap();
    let lines = &harness.blocks.reconstruction;

    assert_eq!(lines[0], "auto opts = torch::nn::functional::InterpolateFuncOptions();");
    assert_eq!(lines[1], "if ((bool)(x[\"scale_factor_has_value\"])) {");
    assert_eq!(lines[2], "  opts.scale_factor(get_double(x[\"scale_factor_value\"]));");
    assert_eq!(lines[3], "}");
    assert_eq!(lines[5], "  opts.align_corners((bool)(x[\"align_corners_value\"]));");
}

#[test]
fn test_variant_table_and_selector() {
    let signature = single_param(json!({
        "name": "padding",
        "kind": "variant",
        "default": 3,
        "candidates": [
            { "kind": "enum", "type_label": "torch::enumtype::kValid", "literal": "torch::kValid" },
            { "kind": "expanding_array", "size": 2, "element": { "kind": "int" } }
        ]
    }));
    let harness = hf_engine::generate(&signature, &GenerationConfig::default()).unwrap();

    assert_eq!(harness.blocks.setup[0], "PathFinderEnumArg(\"padding\", {\"padding_0\", \"padding_1\"});");
    assert_eq!(
        harness.blocks.reconstruction,
        vec![
            "torch::ExpandingArray<2, long> padding_1 = torch::ExpandingArray<2, long>({(long)(x[\"padding_1_0\"]), \
             (long)(x[\"padding_1_1\"])});",
            "std::vector<c10::variant<torch::enumtype::kValid, torch::ExpandingArray<2, long>>> padding_table = \
             {torch::kValid, padding_1};",
        ]
    );
    assert_eq!(harness.blocks.call[1], "  auto result = f(padding_table[x[\"padding\"]]));");
    assert_eq!(soft(&harness), vec!["padding_1_0 >= 3", "padding_1_1 >= 3"]);
    assert!(harness.constraints.soft.iter().all(|p| p.origin == BoundOrigin::Default));
}

#[test]
fn test_null_candidate_takes_no_slot() {
    let signature = single_param(json!({
        "name": "dim",
        "kind": "variant",
        "candidates": [{ "kind": "null" }, { "kind": "int" }]
    }));
    let harness = hf_engine::generate(&signature, &GenerationConfig::default()).unwrap();

    assert_eq!(harness.blocks.total_categorical, 1);
    assert_eq!(harness.blocks.total_numeric, 1);
    assert_eq!(
        harness.blocks.reconstruction,
        vec!["std::vector<c10::variant<c10::nullopt_t, long>> dim_table = {c10::nullopt, (long)(x[\"dim_1\"])};"]
    );
}

#[test]
fn test_expanding_array_with_optional_elements() {
    let harness = hf_engine::generate(
        &single_param(json!({
            "name": "output_size",
            "kind": "expanding_array_optional",
            "size": 2,
            "element": { "kind": "int" }
        })),
        &GenerationConfig::default(),
    )
    .unwrap();

    assert_eq!(
        harness.blocks.reconstruction.last().unwrap(),
        "torch::ExpandingArrayWithOptionalElem<2, long> output_size = \
         expandingarray_with_optional_elem<2, long>({output_size_0, output_size_1});"
    );
    assert!(harness.blocks.reconstruction[0].starts_with(
        "c10::optional<long> output_size_0 = (bool)(x[\"output_size_0_has_value\"]) ? c10::optional<long>("
    ));
}

#[test]
fn test_array_slice_backing_buffer() {
    let harness = hf_engine::generate(
        &single_param(json!({
            "name": "weights",
            "kind": "sequence",
            "flavor": "array_slice",
            "element": { "kind": "float", "precision": "double" }
        })),
        &GenerationConfig::default().with_max_variable_length(2),
    )
    .unwrap();

    assert_eq!(
        harness.blocks.reconstruction,
        vec![
            "std::vector<double> weights_buf = vector_init<double>((size_t)(x[\"weights_size\"]), \
             {get_double(x[\"weights_0\"]), get_double(x[\"weights_1\"])});",
            "c10::ArrayRef<double> weights(weights_buf);",
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// API SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_module_preamble() {
    let harness = hf_engine::generate(&linear(), &GenerationConfig::default()).unwrap();

    assert_eq!(
        harness.blocks.call,
        vec![
            "auto module = torch::nn::Linear((long)(x[\"in_features\"]), (long)(x[\"out_features\"]));",
            "module->to(get_dtype(x[\"dtype\"]));",
            "PathFinderExecuteTarget(",
            "  auto result = module->forward(input));",
        ]
    );
    assert_eq!(soft(&harness), vec!["in_features >= 1", "out_features >= 1"]);
}

#[test]
fn test_method_receiver() {
    let signature = signature(json!({
        "name": "torch::Tensor::add",
        "api": "method",
        "receiver": { "name": "self", "kind": "tensor" },
        "params": [{ "name": "other", "kind": "tensor" }]
    }));
    let harness = hf_engine::generate(&signature, &GenerationConfig::plain_buffer()).unwrap();

    assert_eq!(harness.blocks.call, vec!["self.add(other);"]);
}

#[test]
fn test_reserved_names_are_avoided() {
    let signature = single_param(json!({ "name": "x", "kind": "int" }));
    let symbolic = hf_engine::generate(&signature, &GenerationConfig::symbolic()).unwrap();
    assert_eq!(symbolic.blocks.setup, vec!["PathFinderIntArg(\"x_1\");"]);

    let signature = single_param(json!({ "name": "args", "kind": "bool" }));
    let plain = hf_engine::generate(&signature, &GenerationConfig::plain_buffer()).unwrap();
    assert_eq!(plain.blocks.setup, vec!["size_t args_1 = static_cast<size_t>(args[0]) % 2;"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSEMBLED TEXT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_symbolic_text_sections_in_order() {
    let harness = hf_engine::generate(&relu(), &GenerationConfig::symbolic()).unwrap();
    let text = &harness.text;

    let order = [
        "#include \"pathfinder.h\"",
        "void PathFinderSetup() {",
        "  PathFinderEnumArg(\"input_dtype\", dtype_dict().size());",
        "  PathFinderEnumArg(\"input_rank\", 6);",
        "  PathFinderAddHardConstraint({",
        "int PathFinderTestOneInput(const pathfinder::Input& x) {",
        "  torch::set_num_threads(1);",
        "  PathFinderPassIf(!(is_too_big((size_t)(x[\"input_rank\"]), {(long)(x[\"input_0\"]),",
        "    torch::Tensor input = torch_tensor(get_dtype(x[\"input_dtype\"]), (size_t)(x[\"input_rank\"]),",
        "    PathFinderExecuteTarget(",
        "      auto result = torch::relu(input));",
        "  } catch (c10::Error& e) {",
        "    return abort_if_pytorch_internal_assertion_failed(e.what());",
        "  } catch (std::exception& e) {",
        "}  // extern \"C\"",
    ];
    let mut cursor = 0;
    for needle in order {
        let found = text[cursor..].find(needle).unwrap_or_else(|| panic!("missing or out of order: {needle}"));
        cursor += found + needle.len();
    }
    assert!(!text.contains("int main("));
}

#[test]
fn test_driver_main_is_optional() {
    let mut config = GenerationConfig::symbolic();
    config.harness.emit_driver_main = true;
    let harness = hf_engine::generate(&relu(), &config).unwrap();

    assert!(harness.text.ends_with("int main(int argc, char **argv) {\n  return pathfinder::driver(argc, argv);\n}\n"));
}

#[test]
fn test_plain_buffer_text() {
    let harness = hf_engine::generate(&relu(), &GenerationConfig::plain_buffer()).unwrap();
    let text = &harness.text;

    assert!(text.contains("extern \"C\" int LLVMFuzzerTestOneInput(const uint8_t *Data, size_t Size) {\n"));
    assert!(text.contains("  if (Size < 7 * sizeof(long)) {\n    return -1;\n  }\n"));
    assert!(text.contains("  const long *args = reinterpret_cast<const long *>(Data);\n"));
    assert!(text.contains("  if (is_too_big((size_t)(input_rank), {(long)(input_0), "));
    assert!(text.contains("    torch::relu(input);\n"));
    assert!(!text.contains("PathFinder"));
}

#[test]
fn test_coverage_runner_text() {
    let config = GenerationConfig::plain_buffer().with_coverage_runner(true);
    let harness = hf_engine::generate(&relu(), &config).unwrap();
    let text = &harness.text;

    assert!(text.contains("#include <string>\n"));
    assert!(text.contains("int run_one_unit(const uint8_t *Data, size_t Size) {\n"));
    assert!(!text.contains("LLVMFuzzerTestOneInput"));
    assert!(text.contains("    torch::relu(input);\n"));
    assert!(text.contains("  std::vector<std::string> seeds = get_seed_paths(corpus, mode, start, end);\n"));
    assert!(text.ends_with("  return 0;\n}\n"));

    let symbolic = hf_engine::generate(&relu(), &GenerationConfig::symbolic().with_coverage_runner(true)).unwrap();
    assert!(!symbolic.text.contains("run_one_unit"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// DESCRIPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_description_matches_layout() {
    let config = GenerationConfig::default();
    let api = TreeBuilder::new(&config).build(&pad()).unwrap();
    let description = describe(&api, &config).unwrap();

    assert_eq!(description.params.len(), 2);
    assert_eq!(description.params[1].kind, "options");
    assert_eq!(description.params[1].type_label, "torch::nn::functional::PadFuncOptions");
    // tensor: dtype, rank; options: pad length, value
    assert_eq!(description.total_categorical, 4);
    assert_eq!(description.total_numeric, 5 + 6);
    assert_eq!(description.params[1].categorical, [2, 4]);
    assert_eq!(description.params[1].numeric, [5, 11]);
}

#[test]
fn test_input_decl_of_bounded_leaf() {
    let mut tree = Tree::new();
    let rank = tree.push(Descriptor::new("r", Kind::BoundedInt { bound: 4 }));
    tree.set_default(rank, DefaultValue::Int(2));
    tree.add_root(rank);

    let names = NameResolver::default().resolve(&tree);
    let layout = LayoutAllocator::new(6).allocate(&tree).unwrap();
    let style = SymbolicStyle::default();
    let emitter = Emitter::new(&tree, &names, &layout, &style);

    assert_eq!(emitter.input_decl(rank), Some(InputDecl::Categorical(Choices::Bound(4))));
    assert_eq!(tree[rank].default, Some(DefaultValue::Int(2)));
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCALARS AND TENSOR FLAVORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_scalar_selector_and_values() {
    let harness = hf_engine::generate(&single_param(json!({ "name": "s", "kind": "scalar" })), &GenerationConfig::default())
        .unwrap();

    assert_eq!(harness.blocks.total_categorical, 12);
    assert_eq!(harness.blocks.total_numeric, 2);
    assert!(harness.blocks.setup.contains(&"PathFinderEnumArg(\"s_dtype\", scalar_dtype_dict().size());".to_string()));
    assert!(harness.blocks.setup.contains(&"PathFinderEnumArg(\"s_imag128\", double_dict().size());".to_string()));
    assert_eq!(soft(&harness), vec!["s_int >= 0"]);
    assert_eq!(hard(&harness), vec!["s_uint >= 0"]);

    let statement = &harness.blocks.reconstruction[0];
    assert!(statement.starts_with(
        "c10::Scalar s = torch_scalar(get_scalar_dtype(x[\"s_dtype\"]), (int)(x[\"s_int\"]), \
         (unsigned long)(x[\"s_uint\"]), get_bfloat(x[\"s_bfloat\"]),"
    ));
    assert!(statement.ends_with("(bool)(x[\"s_bool\"]));"));
    assert_eq!(harness.blocks.call[1], "  auto result = f(s));");
}

#[test]
fn test_sparse_tensor_fuzzes_layout() {
    let config = GenerationConfig::plain_buffer()
        .with_tensor_flavor(TensorFlavor::Sparse)
        .with_max_rank(1);
    let harness = hf_engine::generate(&relu(), &config).unwrap();

    assert_eq!(
        harness.blocks.setup,
        vec![
            "size_t input_dtype = static_cast<size_t>(args[0]) % sparse_dtype_dict().size();",
            "size_t input_layout = static_cast<size_t>(args[1]) % layout_dict().size();",
            "size_t input_rank = static_cast<size_t>(args[2]) % 2;",
            "long input_0 = args[3];",
        ]
    );
    assert_eq!(
        harness.blocks.reconstruction,
        vec![
            "torch::Tensor input = torch_tensor(get_sparse_dtype(input_dtype), get_layout(input_layout), \
             (size_t)(input_rank), {(long)(input_0)});"
        ]
    );
}

#[test]
fn test_quantized_flavor_switches_every_dtype() {
    let config = GenerationConfig::symbolic().with_tensor_flavor(TensorFlavor::Quantized);
    let harness = hf_engine::generate(&linear(), &config).unwrap();

    assert!(harness.blocks.setup.contains(&"PathFinderEnumArg(\"input_dtype\", qdtype_dict().size());".to_string()));
    assert!(harness.blocks.setup.contains(&"PathFinderEnumArg(\"dtype\", qdtype_dict().size());".to_string()));
    assert!(harness.blocks.setup.iter().all(|line| !line.contains("layout")));
    assert_eq!(harness.blocks.call[1], "module->to(get_qdtype(x[\"dtype\"]));");
}

