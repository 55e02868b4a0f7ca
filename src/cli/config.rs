//! Configuration resolution for CLI arguments

use crate::cli::main_impl::{Cli, Command};
use crate::config::{ServiceConfig, ServiceConfigBuilder};
use anyhow::{Context, Result};

/// Layers CLI flags over the configuration file and defaults
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Resolve the service configuration for `cli`
    ///
    /// Precedence: flags and environment, then `--config` file, then defaults.
    pub(crate) fn from_cli(cli: &Cli) -> Result<ServiceConfig> {
        let base = match &cli.config {
            Some(path) => ServiceConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ServiceConfig::default(),
        };
        let mut builder = ServiceConfigBuilder::from_config(base);

        if let Some(root) = &cli.storage_root {
            builder = builder.storage_root(root);
        }
        if let Some(command) = cli.tools.potrace.as_deref() {
            builder = builder.potrace_command(Self::split_command(command)?);
        }
        if let Some(command) = cli.tools.vtracer.as_deref() {
            builder = builder.vtracer_command(Self::split_command(command)?);
        }
        if let Some(command) = cli.tools.rembg.as_deref() {
            builder = builder.rembg_command(Self::split_command(command)?);
        }

        if let Command::Serve(serve) = &cli.command {
            if let Some(bind) = &serve.bind {
                builder = builder.bind(bind.clone());
            }
            if let Some(secs) = serve.max_age_secs {
                builder = builder.max_age_secs(secs);
            }
            if let Some(secs) = serve.sweep_interval_secs {
                builder = builder.sweep_interval_secs(secs);
            }
            if let Some(bytes) = serve.max_upload_bytes {
                builder = builder.max_upload_bytes(bytes);
            }
        }

        builder.build().context("Invalid service configuration")
    }

    /// Split a command line on whitespace into program and arguments
    pub(crate) fn split_command(command: &str) -> Result<Vec<String>> {
        let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            anyhow::bail!("Tool command must not be empty");
        }
        Ok(parts)
    }
}
