//! Renderer port and the Mermaid CLI implementation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::consts::{BACKGROUND, DEFAULT_EXECUTABLE};
use crate::error::RenderError;

/// Capability to turn a diagram source file into a rendered image file.
///
/// Implementations must either write a valid image at `output` or fail.
pub trait Renderer {
    /// Render the diagram source at `input` into `output`.
    fn render(
        &self,
        input: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<(), RenderError>>;
}

/// Settings for locating and invoking the Mermaid CLI.
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Executable name (looked up in `PATH`) or path.
    pub executable: String,
    /// Mermaid theme passed as `-t`.
    pub theme: Option<String>,
    /// Extra arguments appended to every invocation.
    pub args: Vec<String>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_owned(),
            theme: None,
            args: Vec::new(),
        }
    }
}

/// Renderer backed by the `mmdc` executable from `@mermaid-js/mermaid-cli`.
///
/// The executable is resolved once by [`discover`](Self::discover); every
/// render spawns one process with a transparent background.
#[derive(Debug, Clone)]
pub struct MermaidCli {
    program: PathBuf,
    theme: Option<String>,
    args: Vec<String>,
}

impl MermaidCli {
    /// Resolve the renderer executable.
    ///
    /// Names containing a path separator are checked as-is. Bare names are
    /// searched in `PATH`, then in `./node_modules/.bin`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotFound`] if no executable file matches.
    pub fn discover(settings: &RendererSettings) -> Result<Self, RenderError> {
        let program = find_executable(&settings.executable)
            .ok_or_else(|| RenderError::NotFound(settings.executable.clone()))?;
        tracing::debug!(program = %program.display(), "Resolved Mermaid renderer");
        Ok(Self::with_program(program, settings))
    }

    /// Use an already-resolved executable path.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>, settings: &RendererSettings) -> Self {
        Self {
            program: program.into(),
            theme: settings.theme.clone(),
            args: settings.args.clone(),
        }
    }

    /// Resolved executable path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg("-b")
            .arg(BACKGROUND);
        if let Some(theme) = &self.theme {
            command.arg("-t").arg(theme);
        }
        command.args(&self.args).stdin(Stdio::null());
        command
    }
}

impl Renderer for MermaidCli {
    async fn render(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            "Invoking Mermaid renderer"
        );

        let result = self
            .command(input, output)
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_owned();
            tracing::warn!(
                input = %input.display(),
                status = %result.status,
                "Mermaid renderer failed"
            );
            return Err(RenderError::Failed {
                status: result.status.to_string(),
                stderr,
            });
        }

        Ok(())
    }
}

#[cfg(windows)]
const EXECUTABLE_SUFFIXES: &[&str] = &["", ".cmd", ".exe", ".bat"];
#[cfg(not(windows))]
const EXECUTABLE_SUFFIXES: &[&str] = &[""];

/// Search for an executable by name or path.
fn find_executable(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return with_suffixes(candidate).find(|p| is_executable(p));
    }

    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    dirs.push(PathBuf::from("node_modules").join(".bin"));

    dirs.iter()
        .flat_map(|dir| with_suffixes(&dir.join(name)).collect::<Vec<_>>())
        .find(|p| is_executable(p))
}

fn with_suffixes(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    EXECUTABLE_SUFFIXES.iter().map(move |suffix| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
