//! Replacement of embedded script and math regions.
//!
//! The body is scanned once, left to right. Each `<script type="text/LANG">`
//! block, `$$..$$` display region, and `$..$` inline region is handed to a
//! [`Renderer`] and swapped for whatever it returns. Code blocks, code spans,
//! and escaped dollars are copied through untouched.
//!
//! Rendered snippets are already html, so they must not go through markdown a
//! second time. The transformed body carries a marker in place of each one, and
//! [`Transformed::restore`] swaps the markers for the rendered text once the
//! markdown has been converted.

use std::{fmt, process::ExitStatus, string::FromUtf8Error, sync::OnceLock};

use regex::{Captures, Regex};
use thiserror::Error;

/// what a matched region holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetKind {
    Script { lang: String },
    InlineMath,
    DisplayMath,
}

impl SnippetKind {
    /// block-level substitutes are kept apart from the surrounding markdown
    pub fn is_block(&self) -> bool {
        !matches!(self, SnippetKind::InlineMath)
    }
}

impl fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnippetKind::Script { lang } => write!(f, "{lang} script"),
            SnippetKind::InlineMath => write!(f, "inline math"),
            SnippetKind::DisplayMath => write!(f, "display math"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no renderer configured for {0}")]
    Unsupported(SnippetKind),
    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("`{program}` produced invalid utf-8: {source}")]
    Output {
        program: String,
        source: FromUtf8Error,
    },
}

/// something that can turn a snippet into the text that replaces it
pub trait Renderer {
    fn render(&self, kind: &SnippetKind, content: &str) -> Result<String, RenderError>;

    /// regions this returns false for are left in the body as they are
    fn handles(&self, _kind: &SnippetKind) -> bool {
        true
    }
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, kind: &SnippetKind, content: &str) -> Result<String, RenderError> {
        (**self).render(kind, content)
    }

    fn handles(&self, kind: &SnippetKind) -> bool {
        (**self).handles(kind)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&self, kind: &SnippetKind, content: &str) -> Result<String, RenderError> {
        (**self).render(kind, content)
    }

    fn handles(&self, kind: &SnippetKind) -> bool {
        (**self).handles(kind)
    }
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // alternatives are tried in order, so the pass-through regions win over math.
        // an unclosed fence runs to the end of the body, as in markdown
        Regex::new(concat!(
            r"(?m)(?P<escaped>\\\$)",
            r"|(?P<fence>^[ \t]*```[^\n]*\n(?s:.*?)(?:^[ \t]*```+[ \t\r]*$|\z))",
            r"|(?P<tilde>^[ \t]*~~~[^\n]*\n(?s:.*?)(?:^[ \t]*~~~+[ \t\r]*$|\z))",
            r"|(?P<indented>(?:\A|^[ \t\r]*\n)(?:(?: {4}|\t)[^\n]*(?:\n|\z))+)",
            r"|(?P<code>`[^`\n]+`)",
            r"|(?i:<script\b)(?P<attrs>[^>]*)>(?P<script>(?s:.*?))(?i:</script\s*>)",
            r"|\$\$(?P<display>(?s:.+?))\$\$",
            r"|\$(?P<inline>[^$\n]+?)\$",
        ))
        .expect("snippet pattern is valid")
    })
}

/// the `LANG` of a `type="text/LANG"` attribute, in any position or quoting
fn script_lang(attrs: &str) -> Option<&str> {
    static TYPE: OnceLock<Regex> = OnceLock::new();
    let caps = TYPE
        .get_or_init(|| {
            Regex::new(concat!(
                r#"(?i)(?:^|\s)type\s*=\s*"#,
                r#"(?:"text/(?P<double>[^"]+)"|'text/(?P<single>[^']+)'|text/(?P<bare>[^\s"'=<>`]+))"#,
            ))
            .expect("script type pattern is valid")
        })
        .captures(attrs)?;
    let lang = ["double", "single", "bare"]
        .iter()
        .find_map(|name| caps.name(name))?;
    Some(lang.as_str().trim()).filter(|lang| !lang.is_empty())
}

fn marker_pattern() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"<!--folio:snippet:(?P<block>\d+)-->|\x{E000}(?P<inline>\d+)\x{E001}")
            .expect("marker pattern is valid")
    })
}

/// a body with its snippets rendered
///
/// block snippets sit in the markdown as html comments on their own lines, and
/// inline ones as a pair of private-use characters around an index. Markdown
/// passes both through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    markdown: String,
    substitutes: Vec<String>,
}

impl Transformed {
    /// the markdown to convert, with markers in place of the snippets
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn substitutes(&self) -> &[String] {
        &self.substitutes
    }

    /// put the rendered snippets back in place of their markers
    pub fn restore(&self, text: &str) -> String {
        if self.substitutes.is_empty() {
            return text.to_string();
        }
        marker_pattern()
            .replace_all(text, |caps: &Captures| {
                let index = caps
                    .name("block")
                    .or_else(|| caps.name("inline"))
                    .and_then(|m| m.as_str().parse::<usize>().ok());
                match index.and_then(|i| self.substitutes.get(i)) {
                    Some(substitute) => substitute.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// the body with every matched region replaced by its substitute
    pub fn expand(&self) -> String {
        self.restore(&self.markdown)
    }
}

impl From<&str> for Transformed {
    fn from(body: &str) -> Self {
        Self {
            markdown: body.to_string(),
            substitutes: Vec::new(),
        }
    }
}

/// scans bodies and swaps snippets for their rendered form
pub struct Transformer<R> {
    renderer: R,
    math: bool,
}

impl<R: Renderer> Transformer<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            math: true,
        }
    }

    /// whether `$` regions are rendered or left alone
    pub fn math(mut self, enabled: bool) -> Self {
        self.math = enabled;
        self
    }

    pub fn transform(&self, body: &str) -> Result<Transformed, RenderError> {
        let mut out = Transformed {
            markdown: String::with_capacity(body.len()),
            substitutes: Vec::new(),
        };
        let mut last = 0;
        for caps in pattern().captures_iter(body) {
            let whole = caps.get(0).expect("group 0 always matches");
            let Some((kind, content)) = self.snippet(&caps) else {
                continue;
            };
            if !self.renderer.handles(&kind) {
                log::debug!("Leaving {kind} as it is");
                continue;
            }
            out.markdown.push_str(&body[last..whole.start()]);
            let rendered = self.renderer.render(&kind, content)?;
            push_marker(&mut out.markdown, out.substitutes.len(), kind.is_block());
            out.substitutes.push(rendered);
            last = whole.end();
        }
        out.markdown.push_str(&body[last..]);
        Ok(out)
    }

    fn snippet<'t>(&self, caps: &Captures<'t>) -> Option<(SnippetKind, &'t str)> {
        if let (Some(attrs), Some(script)) = (caps.name("attrs"), caps.name("script")) {
            let kind = SnippetKind::Script {
                lang: script_lang(attrs.as_str())?.into(),
            };
            return Some((kind, script.as_str()));
        }
        if !self.math {
            return None;
        }
        if let Some(display) = caps.name("display") {
            return Some((SnippetKind::DisplayMath, display.as_str().trim()));
        }
        if let Some(inline) = caps.name("inline") {
            return Some((SnippetKind::InlineMath, inline.as_str().trim()));
        }
        None
    }
}

/// block markers get a paragraph of their own so markdown leaves them as raw html
fn push_marker(out: &mut String, index: usize, block: bool) {
    if block {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push_str(if out.ends_with('\n') { "\n" } else { "\n\n" });
        }
        out.push_str(&format!("<!--folio:snippet:{index}-->\n\n"));
    } else {
        out.push_str(&format!("\u{E000}{index}\u{E001}"));
    }
}
