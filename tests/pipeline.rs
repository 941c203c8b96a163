use std::{
    fs,
    path::{Path, PathBuf},
};

use folio::{
    error::Error,
    snippet::{RenderError, Renderer, SnippetKind},
    Config, Site,
};
use tempfile::TempDir;

const TEMPLATE: &str = "<title>{{ title }}</title>\n<main>{{ content }}</main>\n{{ author }}";

/// answers every snippet predictably, and fails for `text/broken` scripts
struct Fake;

impl Renderer for Fake {
    fn render(&self, kind: &SnippetKind, content: &str) -> Result<String, RenderError> {
        match kind {
            SnippetKind::InlineMath => Ok(format!("<span class=\"katex\">{content}</span>")),
            SnippetKind::DisplayMath => Ok(format!("<div class=\"katex\">{content}</div>")),
            SnippetKind::Script { lang } if lang == "broken" => {
                Err(RenderError::Unsupported(kind.clone()))
            }
            SnippetKind::Script { lang } => Ok(format!("<div class=\"{lang}\">compiled</div>")),
        }
    }
}

struct Fixture {
    root: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.structure.source = root.path().join("source");
        config.structure.output = root.path().join("public");
        config.structure.templates = root.path().join("config");
        fs::create_dir_all(&config.structure.source).unwrap();
        fs::create_dir_all(&config.structure.templates).unwrap();
        fs::write(config.structure.templates.join("page.html"), TEMPLATE).unwrap();
        Self { root, config }
    }

    fn source(&self, rel: &str, text: &str) -> &Self {
        let path = self.config.structure.source.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
        self
    }

    fn site(&self) -> Site {
        Site::with_renderer(self.config.clone(), Box::new(Fake)).unwrap()
    }

    fn output(&self, rel: &str) -> PathBuf {
        self.config.structure.output.join(rel)
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.output(rel)).unwrap()
    }
}

/// every file under `dir`, relative to it, sorted
fn listing(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let contents = fs::read(&path).unwrap();
                out.push((path.strip_prefix(dir).unwrap().to_path_buf(), contents));
            }
        }
    }
    out.sort();
    out
}

#[test]
fn hello_page() {
    let fixture = Fixture::new();
    fixture.source("hello.md", "---\ntitle: Hello\n---\n# Hi there\n");
    let report = fixture.site().run().unwrap();

    assert!(report.is_success());
    assert_eq!(report.written, vec![fixture.output("hello.html")]);
    let html = fixture.read("hello.html");
    assert!(html.starts_with("<title>Hello</title>"));
    assert!(html.contains("Hi there"));
    assert!(!html.contains("title: Hello"));
}

#[test]
fn drafts_produce_nothing() {
    let fixture = Fixture::new();
    fixture
        .source("secret.md", "---\ndraft: true\n---\nnot yet")
        .source("open.md", "---\ndraft: false\n---\npublished")
        .source("plain.md", "no front-matter");
    let report = fixture.site().run().unwrap();

    assert!(report.is_success());
    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.written.len(), 2);
    assert!(!fixture.output("secret.html").exists());
    assert!(fixture.output("open.html").exists());
    assert!(fixture.output("plain.html").exists());
}

#[test]
fn draft_only_directory_is_not_created() {
    let fixture = Fixture::new();
    fixture.source("wip/idea.md", "---\ndraft: yes\n---\n");
    fixture.site().run().unwrap();
    assert!(!fixture.output("wip").exists());
}

#[test]
fn inline_math_is_rendered() {
    let fixture = Fixture::new();
    fixture.source("math.md", "Area is $ x^2 $ exactly.\n");
    fixture.site().run().unwrap();
    let html = fixture.read("math.html");
    assert!(html.contains("<p>Area is <span class=\"katex\">x^2</span> exactly.</p>"));
}

#[test]
fn display_math_and_scripts_become_blocks() {
    let fixture = Fixture::new();
    fixture.source(
        "blocks.md",
        "Intro\n$$\n\\sum_i i\n$$\n<script type=\"text/kotlin\">\nfun main() {}\n</script>\nOutro\n",
    );
    fixture.site().run().unwrap();
    let html = fixture.read("blocks.html");
    assert!(html.contains("<p>Intro</p>"));
    assert!(html.contains("<div class=\"katex\">\\sum_i i</div>"));
    assert!(html.contains("<div class=\"kotlin\">compiled</div>"));
    assert!(html.contains("<p>Outro</p>"));
}

#[test]
fn broken_snippet_fails_only_its_document() {
    let fixture = Fixture::new();
    fixture
        .source("a.md", "# A")
        .source("b.md", "<script type=\"text/broken\">oops</script>")
        .source("c/d.md", "# D $y$");
    let report = fixture.site().run().unwrap();

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.path, fixture.config.structure.source.join("b.md"));
    assert!(matches!(failure.error, Error::Snippet(RenderError::Unsupported(_))));
    assert!(!fixture.output("b.html").exists());
    assert!(fixture.read("a.html").contains("<h1 id=\"A\">A"));
    assert!(fixture.read("c/d.html").contains("<span class=\"katex\">y</span>"));
}

#[test]
fn code_never_reaches_collaborators() {
    let fixture = Fixture::new();
    fixture.source("code.md", "Use `$PATH` and\n\n```\necho $HOME $USER\n```\n");
    fixture.site().run().unwrap();
    let html = fixture.read("code.html");
    assert!(html.contains("<code>$PATH</code>"));
    assert!(html.contains("echo $HOME $USER"));
    assert!(!html.contains("katex"));
}

#[test]
fn structure_is_mirrored_without_prefixes() {
    let fixture = Fixture::new();
    fixture
        .source("01_posts/02_rust/01_first_post.md", "---\nauthor: me\n---\nbody")
        .source("01_posts/02_rust/diagram.svg", "<svg/>")
        .source("about.md", "about");
    let report = fixture.site().run().unwrap();

    assert!(report.is_success());
    let html = fixture.read("posts/rust/first_post.html");
    assert!(html.starts_with("<title>first post</title>"));
    assert!(html.ends_with("me"));
    assert_eq!(fixture.read("posts/rust/diagram.svg"), "<svg/>");
    assert!(fixture.output("about.html").exists());
}

#[test]
fn duplicate_routes_are_reported() {
    let fixture = Fixture::new();
    fixture.source("01_intro.md", "first").source("intro.md", "second");
    let report = fixture.site().run().unwrap();

    assert_eq!(report.written, vec![fixture.output("intro.html")]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, Error::DuplicateRoute(_)));
    assert!(fixture.read("intro.html").contains("first"));
}

#[test]
fn directories_sharing_an_output_name_are_reported() {
    let fixture = Fixture::new();
    fixture
        .source("01_posts/hello.md", "first")
        .source("02_posts/hello.md", "second");
    let report = fixture.site().run().unwrap();

    assert_eq!(report.written, vec![fixture.output("posts/hello.html")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].path,
        fixture.config.structure.source.join("02_posts")
    );
    assert!(matches!(report.failures[0].error, Error::DuplicateRoute(_)));
    assert!(fixture.read("posts/hello.html").contains("first"));
}

#[test]
fn scripts_without_a_program_are_plain_html() {
    let fixture = Fixture::new();
    fixture.source(
        "post.md",
        "Hi\n\n<script type=\"text/javascript\">console.log(1)</script>\n",
    );
    let site = Site::new(fixture.config.clone()).unwrap();
    let report = site.run().unwrap();

    assert!(report.is_success());
    assert!(fixture
        .read("post.html")
        .contains("<script type=\"text/javascript\">console.log(1)</script>"));
}

#[cfg(unix)]
#[test]
fn program_output_is_not_read_as_markdown() {
    let mut fixture = Fixture::new();
    fixture.config.snippets.inline_math = ["sh", "-c", "cat >/dev/null; echo '<annotation>a*b*c_1_</annotation>'"]
        .map(String::from)
        .to_vec();
    fixture.source("math.md", "Area $ r $ here.\n");
    let report = Site::new(fixture.config.clone()).unwrap().run().unwrap();

    assert!(report.is_success());
    assert!(fixture
        .read("math.html")
        .contains("<p>Area <annotation>a*b*c_1_</annotation> here.</p>"));
}

#[test]
fn extra_files_are_copied_over_existing_ones() {
    let mut fixture = Fixture::new();
    fs::write(fixture.config.structure.templates.join("style.css"), "body {}").unwrap();
    fixture
        .config
        .extra_files
        .insert("style.css".into(), PathBuf::from("css/style.css"));
    fixture.config.structure.clean = false;
    fs::create_dir_all(fixture.output("css")).unwrap();
    fs::write(fixture.output("css/style.css"), "stale").unwrap();

    let report = fixture.site().run().unwrap();
    assert!(report.is_success());
    assert_eq!(fixture.read("css/style.css"), "body {}");
    assert!(report.copied.contains(&fixture.output("css/style.css")));
}

#[test]
fn stale_output_is_cleared() {
    let fixture = Fixture::new();
    fixture.source("page.md", "text");
    fs::create_dir_all(fixture.output("old")).unwrap();
    fs::write(fixture.output("old/gone.html"), "stale").unwrap();
    fixture.site().run().unwrap();
    assert!(!fixture.output("old").exists());
    assert!(fixture.output("page.html").exists());
}

#[test]
fn runs_are_idempotent() {
    let fixture = Fixture::new();
    fixture
        .source("hello.md", "---\ntitle: Hello\ntags: a, b\n---\n# Hi $x$\n\n## More\n")
        .source("sub/page.md", "$$y$$\n<script type=\"text/kotlin\">1</script>");
    let site = fixture.site();
    site.run().unwrap();
    let first = listing(&fixture.config.structure.output);
    site.run().unwrap();
    let second = listing(&fixture.config.structure.output);
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn missing_template_stops_before_output() {
    let fixture = Fixture::new();
    fixture.source("hello.md", "hi");
    fs::remove_file(fixture.config.structure.templates.join("page.html")).unwrap();
    let err = Site::with_renderer(fixture.config.clone(), Box::new(Fake))
        .err()
        .unwrap();
    assert!(err.is_configuration());
    assert!(!fixture.config.structure.output.exists());
}

#[test]
fn missing_extra_file_is_a_configuration_error() {
    let mut fixture = Fixture::new();
    fixture
        .config
        .extra_files
        .insert("nope.css".into(), PathBuf::from("css/nope.css"));
    let err = Site::with_renderer(fixture.config.clone(), Box::new(Fake))
        .err()
        .unwrap();
    assert!(matches!(err, Error::MissingExtraFile(_)));
}

#[test]
fn missing_source_is_a_configuration_error() {
    let mut fixture = Fixture::new();
    fixture.config.structure.source = fixture.root.path().join("elsewhere");
    let err = Site::with_renderer(fixture.config.clone(), Box::new(Fake))
        .err()
        .unwrap();
    assert!(matches!(err, Error::MissingSource(_)));
}
