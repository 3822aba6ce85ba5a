//! `mermark render` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use mermark_config::{CliSettings, Config};
use mermark_render::{MermaidCli, RendererSettings};
use mermark_transform::{TransformOptions, Transformer};
use mermark_tree::{Diagnostic, DocumentContext, OutputMode, Severity, parse_markdown, to_html};

use crate::error::CliError;
use crate::output::Output;

/// How diagnostics are reported on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DiagnosticsFormat {
    /// One line per diagnostic.
    Text,
    /// JSON array.
    Json,
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render.
    input: PathBuf,

    /// Write HTML to this file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mermark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for generated diagram files (overrides config).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Embed diagram source for client-side rendering instead of rendering.
    #[arg(long)]
    simple: bool,

    /// Inline rendered SVG markup instead of referencing image files.
    #[arg(long)]
    inline: bool,

    /// Mermaid CLI executable (overrides config).
    #[arg(long, env = "MERMARK_EXECUTABLE")]
    executable: Option<String>,

    /// Diagnostics format.
    #[arg(long, value_enum, default_value_t = DiagnosticsFormat::Text)]
    diagnostics: DiagnosticsFormat,

    /// Enable verbose output (show per-phase logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the renderer cannot be found,
    /// the input cannot be read, the output cannot be written, or any diagram
    /// failed.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let source = tokio::fs::read_to_string(&self.input)
            .await
            .map_err(|source| CliError::Read {
                path: self.input.clone(),
                source,
            })?;

        let renderer = MermaidCli::discover(&RendererSettings {
            executable: config.mermaid.executable.clone(),
            theme: config.mermaid.theme.clone(),
            args: config.mermaid.args.clone(),
        })?;
        let options = TransformOptions {
            simple: config.mermaid.simple,
        };
        let mut transformer = Transformer::new(options, renderer);
        if let Some(limit) = config.mermaid.concurrency_limit() {
            transformer = transformer.with_concurrency_limit(limit);
        }

        let mut ctx = document_context(&self.input, &config);
        let tree = transformer
            .transform(parse_markdown(&source), &mut ctx)
            .await;
        let html = to_html(&tree);

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, html)
                    .await
                    .map_err(|source| CliError::Write {
                        path: path.clone(),
                        source,
                    })?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.flush()?;
            }
        }

        let diagnostics = ctx.take_diagnostics();
        self.report(&output, &diagnostics)?;

        let failed = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        if failed > 0 {
            return Err(CliError::Diagnostics(failed));
        }

        if let Some(path) = &self.output {
            output.wrote(path);
        }
        Ok(())
    }

    /// Build CLI settings from flags. Unset flags leave config values alone.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            simple: self.simple.then_some(true),
            executable: self.executable.clone(),
            output_dir: self.output_dir.clone(),
            inline: self.inline.then_some(true),
        }
    }

    /// Print diagnostics to stderr.
    fn report(&self, output: &Output, diagnostics: &[Diagnostic]) -> Result<(), CliError> {
        match self.diagnostics {
            DiagnosticsFormat::Json => {
                output.raw(&serde_json::to_string_pretty(diagnostics)?);
            }
            DiagnosticsFormat::Text => {
                for diagnostic in diagnostics {
                    output.diagnostic(
                        diagnostic.severity,
                        &format_diagnostic(&self.input, diagnostic),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Create the document context for `input` from the loaded configuration.
fn document_context(input: &Path, config: &Config) -> DocumentContext {
    let mode = if config.output().inline {
        OutputMode::Inline
    } else {
        OutputMode::File
    };
    let ctx = DocumentContext::for_path(input).with_output_mode(mode);
    match &config.output().dir {
        Some(dir) => ctx.with_output_dir(dir),
        None => ctx,
    }
}

/// Format a diagnostic as `file:line:col: severity: message [origin]`.
fn format_diagnostic(input: &Path, diagnostic: &Diagnostic) -> String {
    if diagnostic.position.is_some() {
        format!("{}:{diagnostic}", input.display())
    } else {
        format!("{}: {diagnostic}", input.display())
    }
}
