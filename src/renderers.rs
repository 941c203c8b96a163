use std::{
    collections::BTreeMap,
    io::Write,
    process::{Command, Stdio},
    thread,
};

use minijinja::HtmlEscape;

use crate::{
    config::ConfigSnippets,
    snippet::{RenderError, Renderer, SnippetKind},
};

/// renders snippets by piping them through external programs
///
/// the snippet goes to stdin and whatever the program prints replaces it. Math
/// without a configured program is left for client-side rendering.
#[derive(Debug, Clone, Default)]
pub struct CommandRenderer {
    inline_math: Vec<String>,
    display_math: Vec<String>,
    scripts: BTreeMap<String, Vec<String>>,
}

impl CommandRenderer {
    pub fn new(config: &ConfigSnippets) -> Self {
        Self {
            inline_math: config.inline_math.clone(),
            display_math: config.display_math.clone(),
            scripts: config.scripts.clone(),
        }
    }

    fn command(&self, kind: &SnippetKind) -> Option<&[String]> {
        let argv = match kind {
            SnippetKind::InlineMath => &self.inline_math,
            SnippetKind::DisplayMath => &self.display_math,
            SnippetKind::Script { lang } => self.scripts.get(lang)?,
        };
        (!argv.is_empty()).then_some(argv.as_slice())
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, kind: &SnippetKind, content: &str) -> Result<String, RenderError> {
        match (self.command(kind), kind) {
            (Some(argv), _) => run(argv, content),
            (None, SnippetKind::InlineMath | SnippetKind::DisplayMath) => {
                Ok(math_passthrough(kind, content))
            }
            (None, SnippetKind::Script { .. }) => Err(RenderError::Unsupported(kind.clone())),
        }
    }

    /// scripts in a language without a program are ordinary html
    fn handles(&self, kind: &SnippetKind) -> bool {
        match kind {
            SnippetKind::Script { .. } => self.command(kind).is_some(),
            SnippetKind::InlineMath | SnippetKind::DisplayMath => true,
        }
    }
}

/// run `argv` with `input` on stdin and return its trimmed stdout
pub fn run(argv: &[String], input: &str) -> Result<String, RenderError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(RenderError::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };
    log::debug!("Running `{}`", argv.join(" "));
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RenderError::Spawn {
            program: program.clone(),
            source,
        })?;

    // fed from another thread so a chatty program can't fill its stdout pipe while we block on stdin
    let feeder = child.stdin.take().map(|mut stdin| {
        let input = input.to_owned();
        thread::spawn(move || stdin.write_all(input.as_bytes()))
    });

    let output = child.wait_with_output().map_err(|source| RenderError::Spawn {
        program: program.clone(),
        source,
    })?;
    if let Some(feeder) = feeder {
        // a program that exits without reading everything is judged by its exit status
        let _ = feeder.join();
    }

    if !output.status.success() {
        return Err(RenderError::Failed {
            program: program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    let stdout = String::from_utf8(output.stdout).map_err(|source| RenderError::Output {
        program: program.clone(),
        source,
    })?;
    Ok(stdout.trim_end().to_string())
}

/// keep the tex for a client-side renderer
pub fn math_passthrough(kind: &SnippetKind, tex: &str) -> String {
    let tex = HtmlEscape(tex);
    match kind {
        SnippetKind::DisplayMath => format!("<div class=\"math display\">\\[{tex}\\]</div>"),
        _ => format!("<span class=\"math inline\">\\({tex}\\)</span>"),
    }
}
