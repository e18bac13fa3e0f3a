//! Format expansion
//!
//! Expands normalized options into one (format, environment) variant per
//! bundler pass. cjs/umd/system ship both an unminified development build
//! and a minified production build; esm ships a single build because ESM
//! consumers run their own dead-code elimination.

use std::path::{Path, PathBuf};

use crate::options::{ModuleFormat, NormalizedOptions};

/// Build environment for formats that ship dev/prod pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildEnv {
    Development,
    Production,
}

impl BuildEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildEnv::Development => "development",
            BuildEnv::Production => "production",
        }
    }
}

/// One (format, environment) pair scheduled for a single bundler pass
#[derive(Debug, Clone)]
pub struct FormatVariant {
    pub input: PathBuf,
    pub format: ModuleFormat,
    /// None for esm; dev/prod otherwise
    pub env: Option<BuildEnv>,
    /// Marks the single variant per entry responsible for one-time side
    /// effects (entry-file emission, declaration scheduling)
    pub write_meta: bool,
}

/// Fixed expansion order: cjs first, so the declaration-producing pass runs
/// before the esm pass that depends on its output
const EXPANSION_ORDER: &[(ModuleFormat, Option<BuildEnv>)] = &[
    (ModuleFormat::Cjs, Some(BuildEnv::Development)),
    (ModuleFormat::Cjs, Some(BuildEnv::Production)),
    (ModuleFormat::Esm, None),
    (ModuleFormat::Umd, Some(BuildEnv::Development)),
    (ModuleFormat::Umd, Some(BuildEnv::Production)),
    (ModuleFormat::System, Some(BuildEnv::Development)),
    (ModuleFormat::System, Some(BuildEnv::Production)),
];

/// Expand one entry into its ordered variant list
pub fn expand_entry(opts: &NormalizedOptions, input: &Path) -> Vec<FormatVariant> {
    EXPANSION_ORDER
        .iter()
        .filter(|(format, _)| opts.has_format(*format))
        .enumerate()
        .map(|(index, (format, env))| FormatVariant {
            input: input.to_path_buf(),
            format: *format,
            env: *env,
            write_meta: index == 0,
        })
        .collect()
}

/// Expand every entry independently and concatenate
///
/// The `write_meta` flag is scoped per entry; the pass index used for
/// declaration gating is the position in the concatenated list.
pub fn expand_all(opts: &NormalizedOptions) -> Vec<FormatVariant> {
    opts.input
        .iter()
        .flat_map(|input| expand_entry(opts, input))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Target;

    fn opts(formats: &str, inputs: &[&str]) -> NormalizedOptions {
        NormalizedOptions {
            name: "test".to_string(),
            target: Target::Browser,
            formats: crate::options::parse_formats(formats).unwrap(),
            input: inputs.iter().map(PathBuf::from).collect(),
            external: Vec::new(),
            tsconfig: None,
            transpile_only: false,
            inline_dynamic_imports: true,
            extract_errors: None,
            minify: None,
        }
    }

    #[test]
    fn test_cjs_esm_yields_three_variants() {
        let variants = expand_all(&opts("cjs,esm", &["src/index.ts"]));
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].format, ModuleFormat::Cjs);
        assert_eq!(variants[0].env, Some(BuildEnv::Development));
        assert_eq!(variants[1].format, ModuleFormat::Cjs);
        assert_eq!(variants[1].env, Some(BuildEnv::Production));
        assert_eq!(variants[2].format, ModuleFormat::Esm);
        assert_eq!(variants[2].env, None);
    }

    #[test]
    fn test_env_split_formats_emit_pairs() {
        for format in ["cjs", "umd", "system"] {
            let variants = expand_all(&opts(format, &["src/index.ts"]));
            assert_eq!(variants.len(), 2, "{} should ship dev/prod", format);
            assert_eq!(variants[0].env, Some(BuildEnv::Development));
            assert_eq!(variants[1].env, Some(BuildEnv::Production));
        }
        let variants = expand_all(&opts("esm", &["src/index.ts"]));
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].env, None);
    }

    #[test]
    fn test_write_meta_once_per_entry() {
        let variants = expand_all(&opts("cjs,esm,umd", &["src/a.ts", "src/b.ts"]));
        assert_eq!(variants.len(), 10);
        let meta_count = variants.iter().filter(|v| v.write_meta).count();
        assert_eq!(meta_count, 2);
        // index 0 within each entry's own expansion
        assert!(variants[0].write_meta);
        assert!(variants[5].write_meta);
        assert_eq!(variants[5].input, PathBuf::from("src/b.ts"));
    }

    #[test]
    fn test_es_alias_expands_like_esm() {
        let via_alias = expand_all(&opts("es", &["src/index.ts"]));
        let via_esm = expand_all(&opts("esm", &["src/index.ts"]));
        assert_eq!(via_alias.len(), via_esm.len());
        assert_eq!(via_alias[0].format, via_esm[0].format);
    }
}
