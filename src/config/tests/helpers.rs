//! Shared test helpers for configuration tests.

use ortho_config::MergeComposer;
use serde_json::Value;

use crate::PrLedgerConfig;

/// Applies a configuration layer to the composer based on the layer type.
pub fn apply_layer(composer: &mut MergeComposer, layer_type: &str, value: Value) {
    match layer_type {
        "defaults" => composer.push_defaults(value),
        "file" => composer.push_file(value, None),
        "environment" => composer.push_environment(value),
        "cli" => composer.push_cli(value),
        _ => panic!("unknown layer type: {layer_type}"),
    }
}

/// Composes a [`PrLedgerConfig`] from a sequence of `(layer_type, value)` pairs.
pub fn build_config_from_layers(layers: &[(&str, Value)]) -> PrLedgerConfig {
    let mut composer = MergeComposer::new();

    for (layer_type, value) in layers {
        apply_layer(&mut composer, layer_type, value.clone());
    }

    PrLedgerConfig::merge_from_layers(composer.layers()).expect("merge should succeed")
}

/// Legacy variables cleared by tests that depend on their absence.
pub const LEGACY_VARIABLES: [&str; 4] = ["GITHUB_REPOS", "GITHUB_OWNER", "GITHUB_REPO", "GITHUB_TOKEN"];
