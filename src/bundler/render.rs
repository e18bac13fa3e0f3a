//! Rollup config rendering
//!
//! Materializes an [`AssembledConfig`] into an ES-module Rollup config file.
//! The Babel preset/plugin trees arrive fully merged, so the generated
//! config disables babelrc/configFile lookup and passes the final pipeline
//! straight to @rollup/plugin-babel.

use crate::bundler::config::AssembledConfig;

/// Source-file extensions handed to node-resolve and Babel
const RESOLVE_EXTENSIONS: &[&str] = &[".mjs", ".js", ".json", ".node", ".ts", ".tsx", ".jsx"];
const BABEL_EXTENSIONS: &[&str] = &[".js", ".jsx", ".es6", ".es", ".mjs", ".ts", ".tsx"];

/// TS sources excluded from compilation unless the project tsconfig says
/// otherwise
const TS_DEFAULT_EXCLUDE: &[&str] = &[
    "**/*.spec.ts",
    "**/*.test.ts",
    "**/*.spec.tsx",
    "**/*.test.tsx",
    "node_modules",
    "bower_components",
    "jspm_packages",
    "dist",
];

fn js_string(value: &str) -> String {
    serde_json::to_string(value).expect("strings always serialize")
}

fn js_value<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("config values always serialize")
}

/// Render one configuration to Rollup config module source
pub fn render_config(config: &AssembledConfig) -> String {
    let pipeline = &config.pipeline;
    let mut out = String::with_capacity(4096);

    out.push_str("// Generated by tsbuild. Do not edit.\n");
    out.push_str("import commonjs from \"@rollup/plugin-commonjs\";\n");
    out.push_str("import json from \"@rollup/plugin-json\";\n");
    out.push_str("import resolve from \"@rollup/plugin-node-resolve\";\n");
    out.push_str("import peerDepsExternal from \"rollup-plugin-peer-deps-external\";\n");
    out.push_str("import typescript from \"rollup-plugin-typescript2\";\n");
    out.push_str("import { babel } from \"@rollup/plugin-babel\";\n");
    if pipeline.replace_env.is_some() {
        out.push_str("import replace from \"@rollup/plugin-replace\";\n");
    }
    if pipeline.minify.is_some() {
        out.push_str("import terser from \"@rollup/plugin-terser\";\n");
    }
    if pipeline.copy_declarations {
        out.push_str("import copy from \"rollup-plugin-copy\";\n");
    }
    out.push('\n');

    out.push_str("export default {\n");
    out.push_str(&format!(
        "  input: {},\n",
        js_string(&config.input.to_string_lossy())
    ));
    out.push_str("  treeshake: { propertyReadSideEffects: false },\n");
    out.push_str("  output: {\n");
    out.push_str(&format!("    file: {},\n", js_string(&config.output.file)));
    out.push_str(&format!(
        "    format: {},\n",
        js_string(&config.output.format)
    ));
    if !config.output.name.is_empty() {
        out.push_str(&format!("    name: {},\n", js_string(&config.output.name)));
    }
    out.push_str(&format!("    sourcemap: {},\n", config.output.sourcemap));
    out.push_str("    freeze: false,\n");
    out.push_str(&format!("    esModule: {},\n", config.output.es_module));
    out.push_str(&format!(
        "    exports: {},\n",
        js_string(&config.output.exports)
    ));
    out.push_str(&format!(
        "    globals: {},\n",
        js_value(&config.output.globals)
    ));
    out.push_str(&format!(
        "    inlineDynamicImports: {},\n",
        config.output.inline_dynamic_imports
    ));
    out.push_str("  },\n");
    out.push_str(&format!("  external: {},\n", js_value(&config.external)));

    out.push_str("  plugins: [\n");
    out.push_str("    peerDepsExternal(),\n");
    out.push_str(&format!(
        "    resolve({{ mainFields: {}, extensions: {} }}),\n",
        js_value(&pipeline.main_fields),
        js_value(&RESOLVE_EXTENSIONS)
    ));
    // include hoisted packages too, hence the regex rather than a path
    out.push_str("    commonjs({ include: /\\/node_modules\\// }),\n");
    out.push_str("    json(),\n");
    out.push_str(
        "    {\n      name: \"strip-shebang\",\n      transform(code) {\n        return { code: code.replace(/^#!(.*)/, \"\"), map: null };\n      },\n    },\n",
    );

    out.push_str("    typescript({\n");
    out.push_str(&format!(
        "      tsconfig: {},\n",
        js_string(&pipeline.tsconfig.to_string_lossy())
    ));
    out.push_str(&format!(
        "      tsconfigDefaults: {{\n        exclude: {},\n        compilerOptions: {{ sourceMap: true, declaration: true, jsx: \"react\" }},\n      }},\n",
        js_value(&TS_DEFAULT_EXCLUDE)
    ));
    if pipeline.emit_declarations {
        out.push_str(
            "      tsconfigOverride: { compilerOptions: { target: \"esnext\" } },\n",
        );
    } else {
        out.push_str(
            "      tsconfigOverride: { compilerOptions: { target: \"esnext\", declaration: false, declarationMap: false } },\n",
        );
    }
    out.push_str(&format!("      check: {},\n", pipeline.check_types));
    out.push_str(&format!(
        "      useTsconfigDeclarationDir: {},\n",
        pipeline.use_declaration_dir
    ));
    out.push_str("    }),\n");

    out.push_str("    babel({\n");
    out.push_str("      babelrc: false,\n");
    out.push_str("      configFile: false,\n");
    out.push_str("      exclude: \"node_modules/**\",\n");
    out.push_str(&format!(
        "      extensions: {},\n",
        js_value(&BABEL_EXTENSIONS)
    ));
    out.push_str("      babelHelpers: \"runtime\",\n");
    out.push_str(&format!(
        "      presets: {},\n",
        js_value(&pipeline.babel.presets)
    ));
    out.push_str(&format!(
        "      plugins: {},\n",
        js_value(&pipeline.babel.plugins)
    ));
    out.push_str("    }),\n");

    if let Some(env) = &pipeline.replace_env {
        out.push_str(&format!(
            "    replace({{ \"process.env.NODE_ENV\": JSON.stringify({}), preventAssignment: true }}),\n",
            js_string(env)
        ));
    }

    if let Some(terser) = &pipeline.minify {
        out.push_str("    terser({\n");
        out.push_str("      sourceMap: true,\n");
        out.push_str("      output: {\n");
        // keep license banners, drop everything else
        out.push_str(
            "        comments: (_, comment) =>\n          comment.type == \"comment2\" ? /@preserve|@license|@cc_on/i.test(comment.value) : false,\n",
        );
        out.push_str("      },\n");
        out.push_str("      compress: { keep_infinity: true, pure_getters: true, passes: 10 },\n");
        out.push_str(&format!("      ecma: {},\n", terser.ecma));
        out.push_str(&format!("      toplevel: {},\n", terser.toplevel));
        out.push_str("    }),\n");
    }

    if pipeline.copy_declarations {
        // Dual-package type resolution needs distinct .d.ts/.d.mts files;
        // writeBundle ordering guarantees the source declaration exists.
        out.push_str("    copy({\n");
        out.push_str(
            "      targets: [{ src: \"dist/types/index.d.ts\", dest: \"dist/types/\", rename: \"index.d.mts\" }],\n",
        );
        out.push_str("      verbose: true,\n");
        out.push_str("      copyOnce: true,\n");
        out.push_str("      copySync: true,\n");
        out.push_str("      hook: \"writeBundle\",\n");
        out.push_str("    }),\n");
    }

    out.push_str("  ],\n");
    out.push_str("};\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::config::assemble;
    use crate::bundler::formats::{BuildEnv, FormatVariant};
    use crate::manifest::PackageManifest;
    use crate::options::{parse_formats, ModuleFormat, NormalizedOptions, Target};
    use std::path::{Path, PathBuf};

    fn sample_config(env: Option<BuildEnv>, copy: bool) -> AssembledConfig {
        let opts = NormalizedOptions {
            name: "MyLib".to_string(),
            target: Target::Browser,
            formats: parse_formats("cjs,esm").unwrap(),
            input: vec![PathBuf::from("src/index.ts")],
            external: vec!["lodash".to_string()],
            tsconfig: None,
            transpile_only: false,
            inline_dynamic_imports: true,
            extract_errors: None,
            minify: None,
        };
        let variant = FormatVariant {
            input: PathBuf::from("src/index.ts"),
            format: ModuleFormat::Cjs,
            env,
            write_meta: true,
        };
        assemble(
            &variant,
            &opts,
            &PackageManifest::default(),
            Path::new("."),
            1,
            copy,
        )
    }

    #[test]
    fn test_render_includes_core_plugins() {
        let source = render_config(&sample_config(Some(BuildEnv::Development), false));
        assert!(source.contains("import commonjs from \"@rollup/plugin-commonjs\""));
        assert!(source.contains("peerDepsExternal()"));
        assert!(source.contains("babelHelpers: \"runtime\""));
        assert!(source.contains("babelrc: false"));
        assert!(source.contains("\"@babel/runtime\""));
        assert!(source.contains("strip-shebang"));
        assert!(source.contains("propertyReadSideEffects: false"));
    }

    #[test]
    fn test_render_conditional_terser_and_replace() {
        let dev = render_config(&sample_config(Some(BuildEnv::Development), false));
        assert!(!dev.contains("terser("));
        assert!(dev.contains("JSON.stringify(\"development\")"));

        let prod = render_config(&sample_config(Some(BuildEnv::Production), false));
        assert!(prod.contains("import terser from \"@rollup/plugin-terser\""));
        assert!(prod.contains("@preserve|@license|@cc_on"));
        assert!(prod.contains("JSON.stringify(\"production\")"));
    }

    #[test]
    fn test_render_copy_only_on_designated_pass() {
        let plain = render_config(&sample_config(Some(BuildEnv::Development), false));
        assert!(!plain.contains("rollup-plugin-copy"));

        let copying = render_config(&sample_config(Some(BuildEnv::Development), true));
        assert!(copying.contains("import copy from \"rollup-plugin-copy\""));
        assert!(copying.contains("index.d.mts"));
        assert!(copying.contains("hook: \"writeBundle\""));
    }

    #[test]
    fn test_render_disables_declarations_after_first_pass() {
        let source = render_config(&sample_config(Some(BuildEnv::Development), false));
        assert!(source.contains("declaration: false"));
        assert!(source.contains("check: false"));
    }
}
