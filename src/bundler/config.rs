//! Bundler configuration assembly
//!
//! Combines one format variant with the normalized options and a pass index
//! into a complete, serializable bundler configuration. Configurations are
//! created fresh per invocation, consumed once by the external bundler, and
//! discarded.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::bundler::babel::{build_babel_config, BabelConfig};
use crate::bundler::formats::{BuildEnv, FormatVariant};
use crate::manifest::PackageManifest;
use crate::options::{ModuleFormat, NormalizedOptions, Target};

/// Helper library that Babel's runtime transform imports; always external
pub const ALWAYS_EXTERNAL: &str = "@babel/runtime";

/// Distribution directory, relative to the project root
pub const DIST_DIR: &str = "dist";

/// Output file options for one pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    pub file: String,
    pub format: String,
    pub name: String,
    pub sourcemap: bool,
    /// Do not let the bundler freeze namespace import objects
    pub freeze: bool,
    pub es_module: bool,
    pub exports: String,
    pub globals: Value,
    pub inline_dynamic_imports: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeshakeOptions {
    pub property_read_side_effects: bool,
}

/// Minifier settings for one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerserOptions {
    pub ecma: u16,
    pub toplevel: bool,
}

/// Everything the plugin pipeline of one pass needs, pre-merged
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginPipeline {
    /// node-resolve mainFields, browser-aware
    pub main_fields: Vec<String>,
    pub tsconfig: PathBuf,
    /// Type checking runs on the designated pass only
    pub check_types: bool,
    /// Declarations are emitted on the first pass only
    pub emit_declarations: bool,
    /// Declarations honor the tsconfig declarationDir when one is set
    pub use_declaration_dir: bool,
    /// Copy dist/types/index.d.ts to index.d.mts on this pass
    pub copy_declarations: bool,
    /// NODE_ENV replacement value, when an environment applies
    pub replace_env: Option<String>,
    pub minify: Option<TerserOptions>,
    pub babel: BabelConfig,
}

/// One complete bundler configuration
#[derive(Debug, Clone, Serialize)]
pub struct AssembledConfig {
    pub input: PathBuf,
    pub output: OutputOptions,
    pub external: Vec<String>,
    pub treeshake: TreeshakeOptions,
    pub pipeline: PluginPipeline,
}

/// Derive the output file name from the distribution directory, format, and
/// minification flag. Pure: identical inputs always yield identical names.
pub fn output_name(dist: &str, format: ModuleFormat, minify: bool) -> String {
    let stem = format!("{}/{}/index", dist, format);
    let mut parts = vec![stem.as_str()];
    if minify {
        parts.push("min");
    }
    parts.push(format.extension());
    parts.join(".")
}

/// ECMAScript level the minifier must keep the output valid under
fn ecma_level(format: ModuleFormat) -> u16 {
    match format {
        // UMD/System builds target legacy script consumers
        ModuleFormat::Umd | ModuleFormat::System => 5,
        ModuleFormat::Cjs | ModuleFormat::Esm => 2015,
    }
}

/// Relevant compiler options probed from the project tsconfig
#[derive(Debug, Clone, Copy, Default)]
pub struct TsconfigProbe {
    pub es_module_interop: bool,
    pub has_declaration_dir: bool,
}

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*//.*$").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Tolerant tsconfig read: tsconfig.json is JSONC, so comments and trailing
/// commas are stripped before parsing. Any failure degrades to defaults.
pub fn probe_tsconfig(path: &Path) -> TsconfigProbe {
    let Ok(content) = fs::read_to_string(path) else {
        return TsconfigProbe::default();
    };
    let stripped = LINE_COMMENT.replace_all(&content, "");
    let stripped = BLOCK_COMMENT.replace_all(&stripped, "");
    let stripped = TRAILING_COMMA.replace_all(&stripped, "$1");
    let Ok(parsed) = serde_json::from_str::<Value>(&stripped) else {
        return TsconfigProbe::default();
    };
    let compiler_options = parsed.get("compilerOptions");
    TsconfigProbe {
        es_module_interop: compiler_options
            .and_then(|o| o.get("esModuleInterop"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        has_declaration_dir: compiler_options
            .and_then(|o| o.get("declarationDir"))
            .is_some(),
    }
}

/// Assemble one configuration from a variant, the normalized options, and
/// the global pass index
pub fn assemble(
    variant: &FormatVariant,
    opts: &NormalizedOptions,
    manifest: &PackageManifest,
    root: &Path,
    pass_index: usize,
    copy_declarations: bool,
) -> AssembledConfig {
    let should_minify = opts
        .minify
        .unwrap_or(variant.env == Some(BuildEnv::Production));

    let tsconfig = opts
        .tsconfig
        .clone()
        .unwrap_or_else(|| root.join("tsconfig.json"));
    let probe = probe_tsconfig(&tsconfig);

    let mut main_fields = vec!["module".to_string(), "main".to_string()];
    if opts.target != Target::Node {
        main_fields.push("browser".to_string());
    }

    let mut external = vec![ALWAYS_EXTERNAL.to_string()];
    external.extend(opts.external.iter().cloned());

    AssembledConfig {
        input: variant.input.clone(),
        output: OutputOptions {
            file: output_name(DIST_DIR, variant.format, should_minify),
            format: variant.format.as_str().to_string(),
            name: opts.name.clone(),
            sourcemap: true,
            freeze: false,
            es_module: probe.es_module_interop,
            exports: "named".to_string(),
            globals: serde_json::json!({ "react": "React", "react-native": "ReactNative" }),
            inline_dynamic_imports: opts.inline_dynamic_imports,
        },
        external,
        treeshake: TreeshakeOptions {
            property_read_side_effects: false,
        },
        pipeline: PluginPipeline {
            main_fields,
            tsconfig,
            check_types: pass_index == 0 && !opts.transpile_only,
            emit_declarations: pass_index == 0,
            use_declaration_dir: probe.has_declaration_dir,
            copy_declarations,
            replace_env: variant.env.map(|env| env.as_str().to_string()),
            minify: should_minify.then(|| TerserOptions {
                ecma: ecma_level(variant.format),
                toplevel: variant.format == ModuleFormat::Cjs,
            }),
            babel: build_babel_config(
                variant.format,
                opts.target,
                opts.extract_errors.is_some(),
                manifest.babel.as_ref(),
            ),
        },
    }
}
