//! Workspace scaffolding for `ticbuild init`.
//!
//! Creates the workspace layout and copies the starter templates. Existing files are
//! never overwritten, so running `init` again is harmless.

use crate::config::{COMPILER_CONFIG_FILE, ConfigManager, TOOL_CONFIG_FILE};
use crate::models::config::default_out_file;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::{BufRead, Write};

/// A file copied into new workspaces
#[derive(Debug, Clone, Copy)]
pub struct TemplateFile {
    pub path: &'static str,
    pub contents: &'static str,
}

/// Starter files, relative to the workspace
pub const TEMPLATES: &[TemplateFile] = &[
    TemplateFile {
        path: COMPILER_CONFIG_FILE,
        contents: include_str!("../templates/tsconfig.json"),
    },
    TemplateFile {
        path: TOOL_CONFIG_FILE,
        contents: include_str!("../templates/ticbuild.json"),
    },
    TemplateFile {
        path: ".gitignore",
        contents: include_str!("../templates/gitignore"),
    },
    TemplateFile {
        path: "src/main.ts",
        contents: include_str!("../templates/src/main.ts"),
    },
    TemplateFile {
        path: "src/tic80.d.ts",
        contents: include_str!("../templates/src/tic80.d.ts"),
    },
];

/// Result of a scaffold run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    /// The user answered no; no template was copied
    Declined,
    Completed {
        copied: Vec<Utf8PathBuf>,
        skipped: Vec<Utf8PathBuf>,
    },
}

pub struct Scaffolder {
    workspace: Utf8PathBuf,
}

impl Scaffolder {
    pub fn new<P: AsRef<Utf8Path>>(workspace: P) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }

    /// Scaffold the workspace.
    ///
    /// # Arguments
    /// * `assume_yes` - Copy templates without asking
    /// * `input` - Where the yes/no answer is read from
    /// * `out` - Where the file list, prompt and notices are written
    ///
    /// The workspace, its `build/` directory and an empty compiled-output placeholder
    /// are created before the prompt, whatever the answer.
    pub fn run<R: BufRead, W: Write>(
        &self,
        assume_yes: bool,
        input: &mut R,
        out: &mut W,
    ) -> Result<ScaffoldOutcome> {
        self.create_layout()?;

        writeln!(out, "Files to create in {}:", self.workspace)?;
        for template in TEMPLATES {
            writeln!(out, "  {}", template.path)?;
        }

        if !assume_yes && !confirm(input, out, "Copy template files?")? {
            writeln!(out, "Nothing copied.")?;
            return Ok(ScaffoldOutcome::Declined);
        }

        let mut copied = Vec::new();
        let mut skipped = Vec::new();

        for template in TEMPLATES {
            let destination = self.workspace.join(template.path);
            if destination.exists() {
                writeln!(out, "Skipping {}: file already exists", template.path)?;
                tracing::debug!("Skipped existing {}", destination);
                skipped.push(destination);
                continue;
            }

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent))?;
            }
            fs::write(&destination, template.contents)
                .with_context(|| format!("Failed to write {}", destination))?;
            writeln!(out, "Created {}", template.path)?;
            copied.push(destination);
        }

        tracing::info!(
            "Scaffolded {}: {} created, {} skipped",
            self.workspace,
            copied.len(),
            skipped.len()
        );
        Ok(ScaffoldOutcome::Completed { copied, skipped })
    }

    fn create_layout(&self) -> Result<()> {
        let build_dir = self.workspace.join("build");
        fs::create_dir_all(&build_dir)
            .with_context(|| format!("Failed to create directory: {}", build_dir))?;

        // The compiler config may already exist and point somewhere else
        let out_file = ConfigManager::new(&self.workspace)
            .load_compiler_config()
            .map(|c| c.compiler_options.out_file)
            .unwrap_or_else(|_| default_out_file());
        let placeholder = self.workspace.join(out_file);

        if !placeholder.exists() {
            if let Some(parent) = placeholder.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent))?;
            }
            fs::write(&placeholder, "")
                .with_context(|| format!("Failed to create {}", placeholder))?;
            tracing::debug!("Created placeholder {}", placeholder);
        }

        Ok(())
    }
}

/// Ask a yes/no question; anything but `y`/`yes` is a no, including end of input
fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    write!(out, "{} [y/N] ", question)?;
    out.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read answer")?;

    let answer = line.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
