//! Babel plugin-tree merging
//!
//! The build pipeline carries a default set of Babel transform descriptors.
//! Users can extend it through the `babel` block in package.json; colliding
//! descriptors have their options merged instead of being duplicated, keyed
//! by an explicit transform identity rather than a runtime-resolved module
//! reference.

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::options::{ModuleFormat, Target};

/// Known transform identities plus an escape hatch for anything else
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformKind {
    PresetEnv,
    TransformRuntime,
    Macros,
    AnnotatePureCalls,
    DevExpression,
    PolyfillRegenerator,
    ClassProperties,
    RenameImport,
    ExtractErrors,
    Other(String),
}

impl TransformKind {
    pub fn module_name(&self) -> &str {
        match self {
            TransformKind::PresetEnv => "@babel/preset-env",
            TransformKind::TransformRuntime => "@babel/plugin-transform-runtime",
            TransformKind::Macros => "babel-plugin-macros",
            TransformKind::AnnotatePureCalls => "babel-plugin-annotate-pure-calls",
            TransformKind::DevExpression => "babel-plugin-dev-expression",
            TransformKind::PolyfillRegenerator => "babel-plugin-polyfill-regenerator",
            TransformKind::ClassProperties => "@babel/plugin-transform-class-properties",
            TransformKind::RenameImport => "babel-plugin-transform-rename-import",
            TransformKind::ExtractErrors => "./errors/transformErrorMessages",
            TransformKind::Other(name) => name,
        }
    }

    pub fn from_module_name(name: &str) -> Self {
        match name {
            "@babel/preset-env" => TransformKind::PresetEnv,
            "@babel/plugin-transform-runtime" => TransformKind::TransformRuntime,
            "babel-plugin-macros" => TransformKind::Macros,
            "babel-plugin-annotate-pure-calls" => TransformKind::AnnotatePureCalls,
            "babel-plugin-dev-expression" => TransformKind::DevExpression,
            "babel-plugin-polyfill-regenerator" => TransformKind::PolyfillRegenerator,
            "@babel/plugin-transform-class-properties" => TransformKind::ClassProperties,
            "babel-plugin-transform-rename-import" => TransformKind::RenameImport,
            "./errors/transformErrorMessages" => TransformKind::ExtractErrors,
            other => TransformKind::Other(other.to_string()),
        }
    }
}

/// One preset/plugin entry: identity plus an options mapping
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub kind: TransformKind,
    pub options: Map<String, Value>,
}

impl PluginDescriptor {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            kind,
            options: Map::new(),
        }
    }

    pub fn with_options(kind: TransformKind, options: Map<String, Value>) -> Self {
        Self { kind, options }
    }

    /// Parse a user-supplied entry: `"name"` or `["name", { ...options }]`
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(Self::new(TransformKind::from_module_name(name))),
            Value::Array(parts) => {
                let name = parts.first()?.as_str()?;
                let options = parts
                    .get(1)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Some(Self::with_options(
                    TransformKind::from_module_name(name),
                    options,
                ))
            }
            _ => None,
        }
    }
}

impl Serialize for PluginDescriptor {
    /// `"name"` when options are empty, `["name", { ... }]` otherwise
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.options.is_empty() {
            serializer.serialize_str(self.kind.module_name())
        } else {
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(self.kind.module_name())?;
            seq.serialize_element(&self.options)?;
            seq.end()
        }
    }
}

/// Shallow union of two option mappings; `extra` keys win on collision
pub fn merge_options(base: &Map<String, Value>, extra: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in extra {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Order-preserving identity merge of descriptor sequences
///
/// Descriptors are appended in iteration order; on an identity collision the
/// existing entry is replaced in place by one carrying the union of both
/// option mappings (later values win). Merging a sequence with itself yields
/// the same sequence.
pub fn merge_descriptors(sequences: &[&[PluginDescriptor]]) -> Vec<PluginDescriptor> {
    let mut merged: Vec<PluginDescriptor> = Vec::new();
    for sequence in sequences {
        for descriptor in sequence.iter() {
            match merged.iter().position(|d| d.kind == descriptor.kind) {
                None => merged.push(descriptor.clone()),
                Some(index) => {
                    let options = merge_options(&merged[index].options, &descriptor.options);
                    merged[index] = PluginDescriptor::with_options(descriptor.kind.clone(), options);
                }
            }
        }
    }
    merged
}

/// Fully merged Babel configuration for one bundler pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BabelConfig {
    pub presets: Vec<PluginDescriptor>,
    pub plugins: Vec<PluginDescriptor>,
}

/// Default plugin pipeline for one pass
fn default_plugins(format: ModuleFormat, extract_errors: bool) -> Vec<PluginDescriptor> {
    let mut plugins = vec![
        PluginDescriptor::with_options(TransformKind::TransformRuntime, {
            let mut opts = Map::new();
            opts.insert("absoluteRuntime".to_string(), Value::Bool(false));
            opts
        }),
        PluginDescriptor::new(TransformKind::Macros),
        PluginDescriptor::new(TransformKind::AnnotatePureCalls),
        PluginDescriptor::new(TransformKind::DevExpression),
        PluginDescriptor::with_options(TransformKind::PolyfillRegenerator, {
            // usage-pure keeps the polyfill out of the consumer's global env
            let mut opts = Map::new();
            opts.insert("method".to_string(), Value::String("usage-pure".to_string()));
            opts
        }),
        PluginDescriptor::with_options(TransformKind::ClassProperties, {
            let mut opts = Map::new();
            opts.insert("loose".to_string(), Value::Bool(true));
            opts
        }),
    ];

    if format != ModuleFormat::Cjs {
        // replace lodash with lodash-es, but not lodash/fp
        let mut opts = Map::new();
        opts.insert(
            "replacements".to_string(),
            serde_json::json!([{ "original": "lodash(?!/fp)", "replacement": "lodash-es" }]),
        );
        plugins.push(PluginDescriptor::with_options(
            TransformKind::RenameImport,
            opts,
        ));
    }

    if extract_errors {
        plugins.push(PluginDescriptor::new(TransformKind::ExtractErrors));
    }

    plugins
}

/// preset-env targets derived from the build target
fn preset_env_targets(target: Target) -> Option<Value> {
    match target {
        Target::Node => Some(serde_json::json!({ "node": "16" })),
        Target::Browser => None,
    }
}

/// Apply the preset-env policy over user-supplied presets
///
/// If the user already carries preset-env, merge our computed defaults under
/// their options and then force `modules: false` (non-overridable: module
/// output belongs to the bundler, not Babel). Otherwise synthesize a default
/// preset-env at the head of the preset list.
fn apply_preset_env(user_presets: &[PluginDescriptor], target: Target) -> Vec<PluginDescriptor> {
    let mut defaults = Map::new();
    defaults.insert("loose".to_string(), Value::Bool(true));
    if let Some(targets) = preset_env_targets(target) {
        defaults.insert("targets".to_string(), targets);
    }

    if let Some(index) = user_presets
        .iter()
        .position(|p| p.kind == TransformKind::PresetEnv)
    {
        let mut presets = user_presets.to_vec();
        let mut options = merge_options(&defaults, &presets[index].options);
        options.insert("modules".to_string(), Value::Bool(false));
        presets[index] = PluginDescriptor::with_options(TransformKind::PresetEnv, options);
        return presets;
    }

    let mut options = defaults;
    options.insert("modules".to_string(), Value::Bool(false));
    let synthesized = vec![PluginDescriptor::with_options(
        TransformKind::PresetEnv,
        options,
    )];
    merge_descriptors(&[&synthesized, user_presets])
}

/// Build the merged Babel configuration for one pass
pub fn build_babel_config(
    format: ModuleFormat,
    target: Target,
    extract_errors: bool,
    overrides: Option<&crate::manifest::BabelOverrides>,
) -> BabelConfig {
    let user_presets: Vec<PluginDescriptor> = overrides
        .map(|o| o.presets.iter().filter_map(PluginDescriptor::from_value).collect())
        .unwrap_or_default();
    let user_plugins: Vec<PluginDescriptor> = overrides
        .map(|o| o.plugins.iter().filter_map(PluginDescriptor::from_value).collect())
        .unwrap_or_default();

    let defaults = default_plugins(format, extract_errors);

    BabelConfig {
        presets: apply_preset_env(&user_presets, target),
        plugins: merge_descriptors(&[&defaults, &user_plugins]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptor(kind: TransformKind, options: Value) -> PluginDescriptor {
        PluginDescriptor::with_options(kind, options.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_merge_is_idempotent() {
        let sequence = vec![
            descriptor(TransformKind::Macros, serde_json::json!({})),
            descriptor(TransformKind::ClassProperties, serde_json::json!({ "loose": true })),
        ];
        let merged = merge_descriptors(&[&sequence, &sequence]);
        assert_eq!(merged, sequence);
    }

    #[test]
    fn test_merge_collision_keeps_position_later_options_win() {
        let base = vec![
            descriptor(TransformKind::Macros, serde_json::json!({})),
            descriptor(
                TransformKind::ClassProperties,
                serde_json::json!({ "loose": true, "kept": 1 }),
            ),
            descriptor(TransformKind::DevExpression, serde_json::json!({})),
        ];
        let extra = vec![descriptor(
            TransformKind::ClassProperties,
            serde_json::json!({ "loose": false }),
        )];
        let merged = merge_descriptors(&[&base, &extra]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].kind, TransformKind::ClassProperties);
        assert_eq!(merged[1].options["loose"], Value::Bool(false));
        assert_eq!(merged[1].options["kept"], serde_json::json!(1));
    }

    #[test]
    fn test_preset_env_synthesized_at_head() {
        let config = build_babel_config(ModuleFormat::Esm, Target::Browser, false, None);
        assert_eq!(config.presets[0].kind, TransformKind::PresetEnv);
        assert_eq!(config.presets[0].options["modules"], Value::Bool(false));
        assert_eq!(config.presets[0].options["loose"], Value::Bool(true));
    }

    #[test]
    fn test_preset_env_modules_not_overridable() {
        let overrides = crate::manifest::BabelOverrides {
            presets: vec![serde_json::json!([
                "@babel/preset-env",
                { "modules": "commonjs", "targets": { "ie": "11" } }
            ])],
            plugins: Vec::new(),
        };
        let config =
            build_babel_config(ModuleFormat::Cjs, Target::Node, false, Some(&overrides));
        let preset_env = &config.presets[0];
        assert_eq!(preset_env.options["modules"], Value::Bool(false));
        // user targets win over the computed node default
        assert_eq!(preset_env.options["targets"], serde_json::json!({ "ie": "11" }));
    }

    #[test]
    fn test_node_target_sets_preset_env_targets() {
        let config = build_babel_config(ModuleFormat::Cjs, Target::Node, false, None);
        assert_eq!(
            config.presets[0].options["targets"],
            serde_json::json!({ "node": "16" })
        );
    }

    #[test]
    fn test_rename_import_skipped_for_cjs() {
        let cjs = build_babel_config(ModuleFormat::Cjs, Target::Browser, false, None);
        assert!(!cjs
            .plugins
            .iter()
            .any(|p| p.kind == TransformKind::RenameImport));

        let esm = build_babel_config(ModuleFormat::Esm, Target::Browser, false, None);
        assert!(esm
            .plugins
            .iter()
            .any(|p| p.kind == TransformKind::RenameImport));
    }

    #[test]
    fn test_extract_errors_appends_transform() {
        let config = build_babel_config(ModuleFormat::Esm, Target::Browser, true, None);
        assert_eq!(
            config.plugins.last().unwrap().kind,
            TransformKind::ExtractErrors
        );
    }

    #[test]
    fn test_user_plugin_merges_into_defaults() {
        let overrides = crate::manifest::BabelOverrides {
            presets: Vec::new(),
            plugins: vec![serde_json::json!([
                "@babel/plugin-transform-class-properties",
                { "loose": false }
            ])],
        };
        let config =
            build_babel_config(ModuleFormat::Esm, Target::Browser, false, Some(&overrides));
        let class_props: Vec<_> = config
            .plugins
            .iter()
            .filter(|p| p.kind == TransformKind::ClassProperties)
            .collect();
        assert_eq!(class_props.len(), 1);
        assert_eq!(class_props[0].options["loose"], Value::Bool(false));
    }

    #[test]
    fn test_descriptor_serializes_as_name_or_tuple() {
        let bare = PluginDescriptor::new(TransformKind::Macros);
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            serde_json::json!("babel-plugin-macros")
        );

        let with_opts = descriptor(
            TransformKind::TransformRuntime,
            serde_json::json!({ "absoluteRuntime": false }),
        );
        assert_eq!(
            serde_json::to_value(&with_opts).unwrap(),
            serde_json::json!(["@babel/plugin-transform-runtime", { "absoluteRuntime": false }])
        );
    }
}
