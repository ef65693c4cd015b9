//! Loading signature catalogs and generating harnesses in parallel

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use hf_engine::signature::{catalog_from_json, catalog_from_yaml};
use hf_engine::{ApiDescription, ApiSignature, GenerationConfig, HarnessGenerator, TreeBuilder};
use rayon::prelude::*;

/// A harness ready to be written
#[derive(Debug, Clone)]
pub struct GeneratedHarness {
    pub api: String,
    pub group: String,
    pub slots: usize,
    pub text: String,
}

/// Result of one target API
#[derive(Debug, Clone)]
pub enum Outcome {
    Generated(GeneratedHarness),
    Abandoned { api: String, reason: String },
}

/// Read every catalog; `.yaml`/`.yml` files are YAML, everything else JSON
pub fn load_signatures(paths: &[PathBuf]) -> Result<Vec<ApiSignature>> {
    let mut signatures = Vec::new();
    for path in paths {
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => catalog_from_yaml(&text),
            _ => catalog_from_json(&text),
        }
        .with_context(|| format!("Failed to parse {}", path.display()))?;

        log::info!("Loaded {} signatures from {}", catalog.len(), path.display());
        signatures.extend(catalog);
    }
    Ok(signatures)
}

/// Generate one harness per signature; a failing target never stops the batch
pub fn generate_all(signatures: &[ApiSignature], config: &GenerationConfig) -> Vec<Outcome> {
    let generator = HarnessGenerator::new(config.clone());
    signatures
        .par_iter()
        .map(|signature| match generator.generate_signature(signature) {
            Ok(harness) => {
                log::info!("Generated {} harness for {}", harness.style, harness.api_name);
                Outcome::Generated(GeneratedHarness {
                    api: harness.api_name,
                    group: harness.group,
                    slots: harness.blocks.total_categorical + harness.blocks.total_numeric,
                    text: harness.text,
                })
            }
            Err(e) => {
                log::warn!("Abandoned {}: {}", signature.name, e);
                Outcome::Abandoned {
                    api: signature.name.clone(),
                    reason: e.to_string(),
                }
            }
        })
        .collect()
}

/// Type descriptions for every signature that lowers cleanly
pub fn describe_all(signatures: &[ApiSignature], config: &GenerationConfig) -> Vec<ApiDescription> {
    signatures
        .par_iter()
        .filter_map(|signature| {
            let described = TreeBuilder::new(config)
                .build(signature)
                .and_then(|api| hf_engine::describe(&api, config));
            match described {
                Ok(description) => Some(description),
                Err(e) => {
                    log::warn!("Skipping description of {}: {}", signature.name, e);
                    None
                }
            }
        })
        .collect()
}
