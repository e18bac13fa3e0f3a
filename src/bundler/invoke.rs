//! External bundler invocation
//!
//! The bundler is an opaque collaborator: each assembled configuration is
//! rendered to a Rollup config module and handed to a small Node driver
//! that runs `rollup()` / `bundle.write()` and reports failures as one
//! structured JSON line on stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::bundler::config::AssembledConfig;
use crate::bundler::render::render_config;
use crate::error::{BundlerDiagnostic, Error};

/// Seam between config assembly and the external bundler; tests swap in a
/// recording implementation
#[async_trait]
pub trait BundlerInvoker: Send + Sync {
    async fn invoke(&self, config: &AssembledConfig, pass_index: usize) -> Result<(), Error>;
}

/// Node driver that loads a generated config, applies the project's
/// `tsbuild.config.mjs` transform when one exists, bundles, and writes
/// output. Failures are surfaced as a single JSON diagnostic line on stderr
/// so the parent process can reattach plugin/location context.
const DRIVER_SOURCE: &str = r#"// Generated by tsbuild. Do not edit.
import { existsSync } from "node:fs";
import { resolve } from "node:path";
import { pathToFileURL } from "node:url";

const [configPath] = process.argv.slice(2);
try {
  const { rollup } = await import("rollup");
  let { default: config } = await import(pathToFileURL(configPath).href);
  const overridePath = resolve("tsbuild.config.mjs");
  if (existsSync(overridePath)) {
    const { default: transform } = await import(pathToFileURL(overridePath).href);
    if (typeof transform === "function") {
      config = (await transform(config)) ?? config;
    }
  }
  const bundle = await rollup(config);
  await bundle.write(config.output);
  await bundle.close();
} catch (err) {
  const e = err && err.error ? err.error : err;
  const diagnostic = {
    message: (e && e.message) || String(e),
    plugin: (e && e.plugin) || null,
    loc: (e && e.loc) || null,
    frame: (e && e.frame) || null,
  };
  process.stderr.write(JSON.stringify(diagnostic) + "\n");
  process.exit(1);
}
"#;

/// Invoker that spawns the project-local Rollup through Node
pub struct RollupCli {
    node: PathBuf,
    cache_dir: PathBuf,
    root: PathBuf,
}

impl RollupCli {
    /// Locate Node, prepare the generated-config cache directory, and
    /// materialize the driver
    ///
    /// The driver is shared by every pass, so it is written exactly once
    /// here; concurrent invocations only write their own per-pass config.
    pub fn discover(root: &Path) -> Result<Self, Error> {
        let node = which::which("node").map_err(|_| Error::ToolNotFound("node".to_string()))?;
        let cache_dir = root.join("node_modules").join(".cache").join("tsbuild");
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| Error::fs("failed to create cache directory", &cache_dir, e))?;
        let cli = Self {
            node,
            cache_dir,
            root: root.to_path_buf(),
        };
        cli.write_driver()?;
        Ok(cli)
    }

    fn driver_path(&self) -> PathBuf {
        self.cache_dir.join("driver.mjs")
    }

    fn config_path(&self, pass_index: usize) -> PathBuf {
        self.cache_dir.join(format!("rollup.config.{}.mjs", pass_index))
    }

    fn write_driver(&self) -> Result<(), Error> {
        let path = self.driver_path();
        std::fs::write(&path, DRIVER_SOURCE)
            .map_err(|e| Error::fs("failed to write bundler driver", &path, e))
    }
}

#[async_trait]
impl BundlerInvoker for RollupCli {
    async fn invoke(&self, config: &AssembledConfig, pass_index: usize) -> Result<(), Error> {
        let config_path = self.config_path(pass_index);
        std::fs::write(&config_path, render_config(config))
            .map_err(|e| Error::fs("failed to write bundler config", &config_path, e))?;

        debug!(
            pass = pass_index,
            config = %config_path.display(),
            output = %config.output.file,
            "invoking rollup"
        );

        let output = Command::new(&self.node)
            .arg(self.driver_path())
            .arg(&config_path)
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::fs("failed to spawn node", &self.node, e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Bundler(BundlerDiagnostic::from_stderr(&stderr)))
    }
}
