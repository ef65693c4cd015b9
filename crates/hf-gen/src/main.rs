//! HarnessForge batch driver
//!
//! Usage:
//!   hf-gen generate --input apis.json --out fuzz/     - Write harness trees and build listings
//!   hf-gen generate --input apis.yml --style all ...  - Emit every harness style
//!   hf-gen generate ... --tensor-flavor sparse        - Fuzz sparse tensors
//!   hf-gen describe --input apis.json                 - Print JSON type descriptions

mod batch;
mod output;
mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hf_engine::{GenerationConfig, TargetStyle, TensorFlavor};

use crate::batch::Outcome;
use crate::output::OutputTree;
use crate::report::{AbandonedTarget, BatchReport, ReportFormat};

#[derive(Parser)]
#[command(name = "hf-gen", about = "Fuzz harness generator for native API signatures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate harnesses for every API in the input catalogs
    Generate {
        /// Signature catalogs (JSON, or YAML by extension)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Harness style to emit
        #[arg(short, long, value_enum, default_value_t = StyleArg::Symbolic)]
        style: StyleArg,

        /// Generation config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Element slots per variable-length parameter
        #[arg(long)]
        max_variable_length: Option<usize>,

        /// Tensor family to fuzz; overrides the config
        #[arg(long, value_enum)]
        tensor_flavor: Option<FlavorArg>,

        /// Emit seed-replay coverage runners for plain-buffer harnesses
        #[arg(long)]
        coverage_runner: bool,
    },
    /// Print JSON type descriptions
    Describe {
        /// Signature catalogs (JSON, or YAML by extension)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Generation config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StyleArg {
    Symbolic,
    PlainBuffer,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FlavorArg {
    Basic,
    Sparse,
    Quantized,
}

impl From<FlavorArg> for TensorFlavor {
    fn from(arg: FlavorArg) -> Self {
        match arg {
            FlavorArg::Basic => TensorFlavor::Basic,
            FlavorArg::Sparse => TensorFlavor::Sparse,
            FlavorArg::Quantized => TensorFlavor::Quantized,
        }
    }
}

impl StyleArg {
    fn styles(self) -> Vec<TargetStyle> {
        match self {
            StyleArg::Symbolic => vec![TargetStyle::Symbolic],
            StyleArg::PlainBuffer => vec![TargetStyle::PlainBuffer],
            StyleArg::All => TargetStyle::ALL.to_vec(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            out,
            style,
            config,
            max_variable_length,
            tensor_flavor,
            coverage_runner,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(m) = max_variable_length {
                config = config.with_max_variable_length(m);
            }
            if let Some(flavor) = tensor_flavor {
                config = config.with_tensor_flavor(flavor.into());
            }
            if coverage_runner {
                config = config.with_coverage_runner(true);
            }
            generate(&input, &out, &style.styles(), config)
        }
        Commands::Describe { input, config } => describe(&input, load_config(config.as_deref())?),
    }
}

fn load_config(path: Option<&Path>) -> Result<GenerationConfig> {
    let Some(path) = path else {
        return Ok(GenerationConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    GenerationConfig::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn generate(input: &[PathBuf], out: &Path, styles: &[TargetStyle], config: GenerationConfig) -> Result<()> {
    config.validate()?;
    let signatures = batch::load_signatures(input)?;
    fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;

    let mut report = BatchReport::new("Harness Generation");
    for &style in styles {
        let outcomes = batch::generate_all(&signatures, &config.clone().with_style(style));

        let mut generated = Vec::new();
        let mut abandoned = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Generated(harness) => generated.push(harness),
                Outcome::Abandoned { api, reason } => abandoned.push(AbandonedTarget { api, reason }),
            }
        }

        let tree = OutputTree::new(out, style);
        let written = tree.write(&generated)?;
        log::info!("Wrote {} {} harnesses to {}", written.len(), style, tree.root().display());
        report.add_style(style, written, abandoned);
    }
    output::write_root_listing(out, styles)?;

    let report_path = out.join("report.json");
    report
        .save(&report_path, ReportFormat::Json)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    let summary_path = out.join("report.md");
    report
        .save(&summary_path, ReportFormat::Markdown)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    if !report.all_generated() {
        log::warn!("{} targets abandoned, see {}", report.summary.abandoned, report_path.display());
    }
    print!("{}", report.to_text());
    Ok(())
}

fn describe(input: &[PathBuf], config: GenerationConfig) -> Result<()> {
    config.validate()?;
    let signatures = batch::load_signatures(input)?;
    let descriptions = batch::describe_all(&signatures, &config);
    println!("{}", hf_engine::describe::to_json(&descriptions)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "hf-gen", "generate", "--input", "a.json", "b.yml", "--out", "fuzz", "--style", "plain-buffer",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate { input, out, style, .. } => {
                assert_eq!(input, vec![PathBuf::from("a.json"), PathBuf::from("b.yml")]);
                assert_eq!(out, PathBuf::from("fuzz"));
                assert_eq!(style.styles(), vec![TargetStyle::PlainBuffer]);
            }
            Commands::Describe { .. } => panic!("expected generate"),
        }
    }

    #[test]
    fn test_cli_parses_flavor_overrides() {
        let cli = Cli::try_parse_from([
            "hf-gen", "generate", "--input", "a.json", "--out", "fuzz", "--tensor-flavor", "quantized",
            "--coverage-runner",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate { tensor_flavor, coverage_runner, .. } => {
                assert_eq!(tensor_flavor.map(TensorFlavor::from), Some(TensorFlavor::Quantized));
                assert!(coverage_runner);
            }
            Commands::Describe { .. } => panic!("expected generate"),
        }
    }

    #[test]
    fn test_generate_coverage_runners() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("apis.json");
        fs::write(
            &catalog,
            r#"[{ "name": "torch::relu", "group": "activation", "api": "function",
                  "params": [{ "name": "input", "kind": "tensor" }] }]"#,
        )
        .unwrap();
        let out = dir.path().join("out");
        let config = GenerationConfig::default().with_coverage_runner(true);

        generate(&[catalog], &out, &[TargetStyle::PlainBuffer], config).unwrap();

        let text = fs::read_to_string(out.join("libfuzzer/activation/libfuzzer_activation_torch_relu.cpp")).unwrap();
        assert!(text.contains("int run_one_unit("));
        assert!(text.contains("get_seed_paths("));
    }

    #[test]
    fn test_generate_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("apis.json");
        fs::write(
            &catalog,
            r#"[
                { "name": "torch::relu", "group": "activation", "api": "function",
                  "params": [{ "name": "input", "kind": "tensor" }] },
                { "name": "torch::bernoulli", "group": "random", "api": "function",
                  "params": [{ "name": "generator", "kind": "unsupported", "type_label": "at::Generator" }] }
            ]"#,
        )
        .unwrap();
        let out = dir.path().join("out");

        generate(&[catalog], &out, &TargetStyle::ALL, GenerationConfig::default()).unwrap();

        assert!(out.join("pathfinder/activation/pathfinder_activation_torch_relu.cpp").is_file());
        assert!(out.join("libfuzzer/activation/libfuzzer_activation_torch_relu.cpp").is_file());
        assert!(!out.join("pathfinder/random").exists());

        let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
        assert_eq!(report["summary"]["generated"], 2);
        assert_eq!(report["summary"]["abandoned"], 2);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "max_variable_length = \"six\"\n").unwrap();

        assert!(load_config(Some(&config)).is_err());
        let zero = GenerationConfig::default().with_max_variable_length(0);
        assert!(generate(&[], dir.path(), &[TargetStyle::Symbolic], zero).is_err());
    }
}
