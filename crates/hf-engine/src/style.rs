//! Per-style harness wrappers

use crate::config::{GenerationConfig, HarnessConfig, TargetStyle};
use crate::emit::{CallExpression, Choices, HarnessBlocks, InputDecl};
use crate::layout::{Layout, Slot, Space};

/// What differs between the harness front ends
pub trait HarnessStyle: Send + Sync {
    fn target_style(&self) -> TargetStyle;

    /// Identifiers the scaffold declares, which descriptors must not shadow
    fn reserved_names(&self) -> Vec<String>;

    /// Expression reading the raw input value of a slot-owning node
    fn raw_value(&self, name: &str) -> String;

    fn setup_line(&self, name: &str, decl: &InputDecl, slot: Slot, layout: &Layout) -> String;

    /// Reference to a constrained value inside a constraint block
    fn constraint_subject(&self, name: &str) -> String;

    fn hard_constraint_block(&self, predicates: &[String]) -> Vec<String>;

    fn soft_constraint_block(&self, predicates: &[String]) -> Vec<String>;

    fn guard_lines(&self, guards: &[String]) -> Vec<String>;

    fn execute_lines(&self, call: &CallExpression) -> Vec<String>;

    /// Complete harness text
    fn assemble(&self, blocks: &HarnessBlocks) -> String;
}

/// Pick the wrapper for a configuration
pub fn strategy(config: &GenerationConfig) -> Box<dyn HarnessStyle> {
    match config.fuzz_target_style {
        TargetStyle::Symbolic => Box::new(SymbolicStyle::new(config.harness.clone())),
        TargetStyle::PlainBuffer => Box::new(PlainBufferStyle::new(config.harness.clone())),
    }
}

fn push_indented(out: &mut String, lines: &[String], depth: usize) {
    let pad = "  ".repeat(depth);
    for line in lines {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&pad);
            out.push_str(line);
            out.push('\n');
        }
    }
}

fn push_header(out: &mut String, boilerplate: &HarnessConfig, extra_includes: &[&str]) {
    for include in boilerplate.includes.iter().map(String::as_str).chain(extra_includes.iter().copied()) {
        out.push_str(&format!("#include {include}\n"));
    }
    out.push('\n');
    if let Some(ns) = &boilerplate.namespace_import {
        out.push_str(&format!("using namespace {ns};\n\n"));
    }
}

/// Guarded call distinguishing internal assertion failures from expected exceptions
fn push_guarded_call(out: &mut String, boilerplate: &HarnessConfig, blocks: &HarnessBlocks) {
    out.push_str("  try {\n");
    push_indented(out, &blocks.reconstruction, 2);
    push_indented(out, &blocks.call, 2);
    out.push_str(&format!("  }} catch ({}& e) {{\n", boilerplate.internal_error_type));
    out.push_str(&format!("    return {}(e.what());\n", boilerplate.internal_error_handler));
    out.push_str("  } catch (std::exception& e) {\n");
    out.push_str(&format!("    return {}(e.what());\n", boilerplate.expected_error_handler));
    out.push_str("  }\n\n");
    out.push_str("  return 0;\n");
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOLIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Named symbolic arguments with solver-side constraint blocks
#[derive(Debug, Clone, Default)]
pub struct SymbolicStyle {
    boilerplate: HarnessConfig,
}

impl SymbolicStyle {
    pub const INPUT: &'static str = "x";

    pub fn new(boilerplate: HarnessConfig) -> Self {
        Self { boilerplate }
    }

    fn constraint_block(call: &str, predicates: &[String]) -> Vec<String> {
        if predicates.is_empty() {
            return Vec::new();
        }
        let mut lines = vec![format!("{call}({{")];
        let last = predicates.len() - 1;
        for (i, p) in predicates.iter().enumerate() {
            lines.push(if i == last { format!("  {p}") } else { format!("  {p},") });
        }
        lines.push("});".to_string());
        lines
    }
}

impl HarnessStyle for SymbolicStyle {
    fn target_style(&self) -> TargetStyle {
        TargetStyle::Symbolic
    }

    fn reserved_names(&self) -> Vec<String> {
        vec![Self::INPUT.into(), "result".into(), "module".into(), "e".into()]
    }

    fn raw_value(&self, name: &str) -> String {
        format!("{}[\"{name}\"]", Self::INPUT)
    }

    fn setup_line(&self, name: &str, decl: &InputDecl, _slot: Slot, _layout: &Layout) -> String {
        match decl {
            InputDecl::Numeric => format!("PathFinderIntArg(\"{name}\");"),
            InputDecl::Categorical(Choices::Literals(values)) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                format!("PathFinderEnumArg(\"{name}\", {{{}}});", quoted.join(", "))
            }
            InputDecl::Categorical(choices) => {
                format!("PathFinderEnumArg(\"{name}\", {});", choices.count_expr())
            }
        }
    }

    fn constraint_subject(&self, name: &str) -> String {
        format!("sym_int_arg[\"{name}\"]")
    }

    fn hard_constraint_block(&self, predicates: &[String]) -> Vec<String> {
        Self::constraint_block("PathFinderAddHardConstraint", predicates)
    }

    fn soft_constraint_block(&self, predicates: &[String]) -> Vec<String> {
        Self::constraint_block("PathFinderAddSoftConstraint", predicates)
    }

    fn guard_lines(&self, guards: &[String]) -> Vec<String> {
        guards.iter().map(|g| format!("PathFinderPassIf(!({g}));")).collect()
    }

    fn execute_lines(&self, call: &CallExpression) -> Vec<String> {
        let mut lines = call.preamble.clone();
        lines.push("PathFinderExecuteTarget(".to_string());
        lines.push(format!("  auto result = {});", call.invocation));
        lines
    }

    fn assemble(&self, blocks: &HarnessBlocks) -> String {
        let mut out = String::new();
        push_header(&mut out, &self.boilerplate, &["\"pathfinder.h\""]);
        out.push_str("extern \"C\" {\n\n");

        out.push_str("void PathFinderSetup() {\n");
        push_indented(&mut out, &blocks.setup, 1);
        push_indented(&mut out, &blocks.hard_constraints, 1);
        push_indented(&mut out, &blocks.soft_constraints, 1);
        out.push_str("}\n\n");

        out.push_str(&format!("int PathFinderTestOneInput(const pathfinder::Input& {}) {{\n", Self::INPUT));
        push_indented(&mut out, &self.boilerplate.prologue, 1);
        push_indented(&mut out, &blocks.guards, 1);
        out.push('\n');
        push_guarded_call(&mut out, &self.boilerplate, blocks);
        out.push_str("}\n\n");

        out.push_str("}  // extern \"C\"\n");
        if self.boilerplate.emit_driver_main {
            out.push_str("\nint main(int argc, char **argv) {\n");
            out.push_str("  return pathfinder::driver(argc, argv);\n");
            out.push_str("}\n");
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAIN BUFFER
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw buffer of `long` slots: categorical slots first, then numeric slots
#[derive(Debug, Clone, Default)]
pub struct PlainBufferStyle {
    boilerplate: HarnessConfig,
}

impl PlainBufferStyle {
    pub const BUFFER: &'static str = "args";

    pub fn new(boilerplate: HarnessConfig) -> Self {
        Self { boilerplate }
    }

    /// Buffer index of a slot
    pub fn buffer_index(slot: Slot, layout: &Layout) -> usize {
        match slot.space {
            Space::Categorical => slot.index,
            Space::Numeric => layout.total_categorical + slot.index,
        }
    }

    fn reject_if(condition: String) -> [String; 3] {
        [format!("if ({condition}) {{"), "  return -1;".to_string(), "}".to_string()]
    }

    fn callback_header(&self) -> &'static str {
        if self.boilerplate.coverage_runner {
            "int run_one_unit(const uint8_t *Data, size_t Size) {\n"
        } else {
            "extern \"C\" int LLVMFuzzerTestOneInput(const uint8_t *Data, size_t Size) {\n"
        }
    }

    /// `main` replaying the corpus seeds selected by `<corpus> <mode> <start> <end>`
    fn push_seed_replay_main(out: &mut String) {
        out.push_str("\nint main(int argc, char* argv[]) {\n");
        out.push_str("  std::string corpus = std::string(argv[1]);\n");
        out.push_str("  std::string mode = std::string(argv[2]);\n");
        out.push_str("  size_t start = atoi(argv[3]);\n");
        out.push_str("  size_t end = atoi(argv[4]);\n\n");
        out.push_str("  std::vector<std::string> seeds = get_seed_paths(corpus, mode, start, end);\n");
        out.push_str("  for (auto& seed : seeds) {\n");
        out.push_str("    std::cout << seed << std::endl;\n");
        out.push_str("    Unit unit = FileToVector(seed);\n");
        out.push_str("    run_one_unit(unit.data(), unit.size());\n");
        out.push_str("  }\n\n");
        out.push_str("  return 0;\n");
        out.push_str("}\n");
    }
}

impl HarnessStyle for PlainBufferStyle {
    fn target_style(&self) -> TargetStyle {
        TargetStyle::PlainBuffer
    }

    fn reserved_names(&self) -> Vec<String> {
        vec!["Data".into(), "Size".into(), Self::BUFFER.into(), "module".into(), "e".into()]
    }

    fn raw_value(&self, name: &str) -> String {
        name.to_string()
    }

    fn setup_line(&self, name: &str, decl: &InputDecl, slot: Slot, layout: &Layout) -> String {
        let index = Self::buffer_index(slot, layout);
        match decl {
            InputDecl::Numeric => format!("long {name} = {}[{index}];", Self::BUFFER),
            InputDecl::Categorical(choices) => format!(
                "size_t {name} = static_cast<size_t>({}[{index}]) % {};",
                Self::BUFFER,
                choices.count_expr()
            ),
        }
    }

    fn constraint_subject(&self, name: &str) -> String {
        name.to_string()
    }

    fn hard_constraint_block(&self, predicates: &[String]) -> Vec<String> {
        predicates.iter().flat_map(|p| Self::reject_if(format!("!({p})"))).collect()
    }

    /// A plain buffer has no generator to bias
    fn soft_constraint_block(&self, _predicates: &[String]) -> Vec<String> {
        Vec::new()
    }

    fn guard_lines(&self, guards: &[String]) -> Vec<String> {
        guards.iter().flat_map(|g| Self::reject_if(g.clone())).collect()
    }

    fn execute_lines(&self, call: &CallExpression) -> Vec<String> {
        let mut lines = call.preamble.clone();
        lines.push(format!("{};", call.invocation));
        lines
    }

    fn assemble(&self, blocks: &HarnessBlocks) -> String {
        let mut out = String::new();
        let extra: &[&str] = if self.boilerplate.coverage_runner { &["<string>"] } else { &[] };
        push_header(&mut out, &self.boilerplate, extra);

        out.push_str(self.callback_header());
        let slots = blocks.total_categorical + blocks.total_numeric;
        if slots > 0 {
            out.push_str(&format!("  if (Size < {slots} * sizeof(long)) {{\n"));
            out.push_str("    return -1;\n");
            out.push_str("  }\n");
            out.push_str(&format!(
                "  const long *{} = reinterpret_cast<const long *>(Data);\n",
                Self::BUFFER
            ));
        }
        push_indented(&mut out, &blocks.setup, 1);
        out.push('\n');
        push_indented(&mut out, &blocks.hard_constraints, 1);
        push_indented(&mut out, &blocks.guards, 1);
        push_indented(&mut out, &self.boilerplate.prologue, 1);
        out.push('\n');
        push_guarded_call(&mut out, &self.boilerplate, blocks);
        out.push_str("}\n");
        if self.boilerplate.coverage_runner {
            Self::push_seed_replay_main(&mut out);
        }
        out
    }
}
