//! Build orchestration
//!
//! Drives one `build` invocation end to end: expand formats, assemble one
//! bundler configuration per pass, clear the distribution directory, write
//! the dual-mode CommonJS entry shim, then hand every configuration to the
//! external bundler concurrently and await them all.

mod babel;
mod config;
mod formats;
mod invoke;
mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

pub use babel::{build_babel_config, BabelConfig, PluginDescriptor, TransformKind};
pub use config::{
    assemble, output_name, AssembledConfig, OutputOptions, PluginPipeline, TerserOptions,
    TreeshakeOptions, DIST_DIR,
};
pub use formats::{expand_all, expand_entry, BuildEnv, FormatVariant};
pub use invoke::{BundlerInvoker, RollupCli};
pub use render::render_config;

use crate::error::Error;
use crate::manifest::PackageManifest;
use crate::options::{ModuleFormat, NormalizedOptions};

/// Project-level transform applied to every assembled configuration before
/// invocation; the default is the identity
pub type ConfigHook = Arc<dyn Fn(AssembledConfig) -> AssembledConfig + Send + Sync>;

/// Dual-mode entry point written when cjs output is requested, so `require`
/// picks the right artifact from NODE_ENV
const ENTRY_SHIM: &str = "'use strict'
if (process.env.NODE_ENV === 'production') {
  module.exports = require('./cjs/index.min.cjs')
} else {
  module.exports = require('./cjs/index.cjs')
}
";

/// The build orchestrator
pub struct Bundler {
    opts: NormalizedOptions,
    manifest: PackageManifest,
    root: PathBuf,
    invoker: Arc<dyn BundlerInvoker>,
    hook: Option<ConfigHook>,
}

impl Bundler {
    pub fn new(
        opts: NormalizedOptions,
        manifest: PackageManifest,
        root: PathBuf,
        invoker: Arc<dyn BundlerInvoker>,
    ) -> Self {
        Self {
            opts,
            manifest,
            root,
            invoker,
            hook: None,
        }
    }

    /// Install a config-transform hook (identity when absent)
    pub fn with_config_hook(mut self, hook: ConfigHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Assemble the full, ordered configuration list for this invocation
    ///
    /// The declaration copy is scheduled on the second pass: the first pass
    /// has emitted and flushed declarations by the time any later pass hits
    /// its write hook, and a single-pass build has nothing to copy from.
    pub fn assemble_configs(&self) -> Vec<AssembledConfig> {
        let variants = expand_all(&self.opts);
        let total = variants.len();
        variants
            .iter()
            .enumerate()
            .map(|(index, variant)| {
                let copy_declarations =
                    total > 1 && index == 1 && self.opts.has_format(ModuleFormat::Esm);
                let assembled = assemble(
                    variant,
                    &self.opts,
                    &self.manifest,
                    &self.root,
                    index,
                    copy_declarations,
                );
                match &self.hook {
                    Some(hook) => hook(assembled),
                    None => assembled,
                }
            })
            .collect()
    }

    /// Run the whole build; returns the output file names on success
    pub async fn build(&self) -> Result<Vec<String>, Error> {
        let configs = self.assemble_configs();
        info!(passes = configs.len(), "assembled bundler configurations");

        self.clear_dist()?;

        if self.opts.has_format(ModuleFormat::Cjs) {
            self.write_entry_shim()?;
        }

        let outputs: Vec<String> = configs.iter().map(|c| c.output.file.clone()).collect();

        // Fire all passes and await them together. A failing pass resolves
        // the whole build as failed; other in-flight passes are not
        // cancelled and may still land outputs.
        let tasks: Vec<_> = configs
            .into_iter()
            .enumerate()
            .map(|(index, config)| {
                let invoker = Arc::clone(&self.invoker);
                let handle = tokio::spawn(async move { invoker.invoke(&config, index).await });
                async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(join) => Err(Error::Task(join)),
                    }
                }
            })
            .collect();

        futures_util::future::try_join_all(tasks).await?;

        Ok(outputs)
    }

    fn dist_dir(&self) -> PathBuf {
        self.root.join(DIST_DIR)
    }

    /// Delete any pre-existing output directory
    fn clear_dist(&self) -> Result<(), Error> {
        let dist = self.dist_dir();
        if dist.exists() {
            debug!(dir = %dist.display(), "clearing output directory");
            fs::remove_dir_all(&dist)
                .map_err(|e| Error::fs("failed to clear output directory", &dist, e))?;
        }
        Ok(())
    }

    /// Write the dual-mode entry file at dist/index.js
    fn write_entry_shim(&self) -> Result<(), Error> {
        let dist = self.dist_dir();
        fs::create_dir_all(&dist)
            .map_err(|e| Error::fs("failed to create output directory", &dist, e))?;
        let path = dist.join("index.js");
        fs::write(&path, ENTRY_SHIM).map_err(|e| Error::fs("failed to write entry file", &path, e))
    }
}

pub fn entry_shim_path(root: &Path) -> PathBuf {
    root.join(DIST_DIR).join("index.js")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{parse_formats, Target};
    use std::sync::Mutex;

    struct RecordingInvoker {
        calls: Mutex<Vec<(usize, String)>>,
        fail_pass: Option<usize>,
    }

    impl RecordingInvoker {
        fn new(fail_pass: Option<usize>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_pass,
            }
        }
    }

    #[async_trait::async_trait]
    impl BundlerInvoker for RecordingInvoker {
        async fn invoke(&self, config: &AssembledConfig, pass_index: usize) -> Result<(), Error> {
            self.calls
                .lock()
                .unwrap()
                .push((pass_index, config.output.file.clone()));
            if self.fail_pass == Some(pass_index) {
                return Err(Error::Bundler(
                    crate::error::BundlerDiagnostic::from_message("boom"),
                ));
            }
            Ok(())
        }
    }

    fn opts(formats: &str) -> NormalizedOptions {
        NormalizedOptions {
            name: "MyLib".to_string(),
            target: Target::Browser,
            formats: parse_formats(formats).unwrap(),
            input: vec![PathBuf::from("src/index.ts")],
            external: Vec::new(),
            tsconfig: None,
            transpile_only: false,
            inline_dynamic_imports: true,
            extract_errors: None,
            minify: None,
        }
    }

    fn bundler(formats: &str, root: &Path, invoker: Arc<RecordingInvoker>) -> Bundler {
        Bundler::new(
            opts(formats),
            PackageManifest::default(),
            root.to_path_buf(),
            invoker,
        )
    }

    #[tokio::test]
    async fn test_build_invokes_every_pass_and_writes_shim() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = Arc::new(RecordingInvoker::new(None));
        let outputs = bundler("cjs,esm", dir.path(), invoker.clone())
            .build()
            .await
            .unwrap();

        assert_eq!(
            outputs,
            vec![
                "dist/cjs/index.cjs",
                "dist/cjs/index.min.cjs",
                "dist/esm/index.mjs"
            ]
        );
        assert_eq!(invoker.calls.lock().unwrap().len(), 3);
        assert!(entry_shim_path(dir.path()).is_file());
        let shim = fs::read_to_string(entry_shim_path(dir.path())).unwrap();
        assert!(shim.contains("./cjs/index.min.cjs"));
    }

    #[tokio::test]
    async fn test_no_entry_shim_without_cjs() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = Arc::new(RecordingInvoker::new(None));
        bundler("esm", dir.path(), invoker).build().await.unwrap();
        assert!(!entry_shim_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_build_clears_stale_dist() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(DIST_DIR).join("stale.js");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let invoker = Arc::new(RecordingInvoker::new(None));
        bundler("cjs", dir.path(), invoker).build().await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = Arc::new(RecordingInvoker::new(Some(1)));
        let err = bundler("cjs,esm", dir.path(), invoker)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Bundler(_)));
    }

    #[test]
    fn test_declaration_copy_gating() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = Arc::new(RecordingInvoker::new(None));

        // multi-pass with esm: second pass copies
        let configs = bundler("cjs,esm", dir.path(), invoker.clone()).assemble_configs();
        let copying: Vec<usize> = configs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.pipeline.copy_declarations)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(copying, vec![1]);

        // multi-pass without esm: no copy
        let configs = bundler("cjs", dir.path(), invoker.clone()).assemble_configs();
        assert!(configs.iter().all(|c| !c.pipeline.copy_declarations));

        // single pass: no copy even with esm
        let configs = bundler("esm", dir.path(), invoker).assemble_configs();
        assert_eq!(configs.len(), 1);
        assert!(configs.iter().all(|c| !c.pipeline.copy_declarations));
    }

    #[test]
    fn test_config_hook_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = Arc::new(RecordingInvoker::new(None));
        let hook: ConfigHook = Arc::new(|mut config| {
            config.external.push("custom-external".to_string());
            config
        });
        let configs = bundler("esm", dir.path(), invoker)
            .with_config_hook(hook)
            .assemble_configs();
        assert!(configs[0]
            .external
            .contains(&"custom-external".to_string()));
    }
}
