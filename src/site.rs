//
// Generating the site is a single walk over the source tree.
//
// markdown files are read, split into front-matter and body, dropped if they are drafts, have
// their snippets rendered, get converted to html and go through the page template. They land at
// the equivalent location in the output, eg source/01_posts/hello.md -> public/posts/hello.html
//
// every other file in the source tree is copied verbatim next to the pages, and the configured
// extra files from the template directory are copied last.
//
// anything that goes wrong with a single file is recorded and the walk moves on, only a broken
// configuration stops the run, and that is caught before anything is written.
//
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::Config,
    document::{self, Document, Location},
    error::{Error, Result},
    page::PageRenderer,
    renderers::CommandRenderer,
    snippet::{Renderer, Transformer},
    tree::{copy_file, Dir},
};

/// a file that couldn't be generated
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: Error,
}

/// what a run did
#[derive(Debug, Default)]
pub struct Report {
    /// pages written, in the output directory
    pub written: Vec<PathBuf>,
    /// sources skipped for being drafts
    pub drafts: Vec<PathBuf>,
    /// assets and extra files copied, in the output directory
    pub copied: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: impl Into<PathBuf>, error: Error) {
        let path = path.into();
        log::error!("Failed to generate `{}`: {error}", path.display());
        self.failures.push(Failure { path, error });
    }
}

/// the state needed to generate the site
pub struct Site {
    config: Config,
    pages: PageRenderer,
    snippets: Transformer<Box<dyn Renderer>>,
}

/// what happened to a single source page
enum Outcome {
    Written(PathBuf),
    Draft,
}

impl Site {
    /// a site rendering snippets with the configured external programs
    pub fn new(config: Config) -> Result<Self> {
        let renderer = CommandRenderer::new(&config.snippets);
        Self::with_renderer(config, Box::new(renderer))
    }

    /// check the configuration and prepare the templates
    pub fn with_renderer(config: Config, renderer: Box<dyn Renderer>) -> Result<Self> {
        let structure = &config.structure;
        if !structure.source.is_dir() {
            return Err(Error::MissingSource(structure.source.clone()));
        }
        for name in config.extra_files.keys() {
            let path = structure.templates.join(name);
            if !path.is_file() {
                return Err(Error::MissingExtraFile(path));
            }
        }
        let pages = PageRenderer::new(&config)?;
        let snippets = Transformer::new(renderer).math(config.render.math);
        Ok(Self {
            config,
            pages,
            snippets,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// generate everything, only failing outright if the output can't be prepared
    pub fn run(&self) -> Result<Report> {
        let structure = &self.config.structure;
        if structure.clean && structure.output.exists() {
            log::info!("Clearing `{}`", structure.output.display());
            fs::remove_dir_all(&structure.output)?;
        }

        log::info!("Parsing file tree");
        let tree = Dir::load(&structure.source, &structure.exclude)?;
        log::info!("Generating {} pages", tree.page_count());

        let mut report = Report::default();
        self.generate_dir(&tree, &mut Vec::new(), &structure.output, &mut report);

        if !self.config.extra_files.is_empty() {
            log::info!("Copying extra files");
        }
        for (name, dest) in &self.config.extra_files {
            let from = structure.templates.join(name);
            let to = structure.output.join(dest);
            match copy_file(&from, &to) {
                Ok(()) => report.copied.push(to),
                Err(err) => report.fail(from, err.into()),
            }
        }

        log::info!(
            "Wrote {} pages, skipped {} drafts, {} failures",
            report.written.len(),
            report.drafts.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// `parents` holds the (output name, title) of every directory above `dir`
    ///
    /// assets, pages and subdirectories share one set of output names, the
    /// first to claim a name keeps it and later ones are reported.
    fn generate_dir(
        &self,
        dir: &Dir,
        parents: &mut Vec<(String, String)>,
        out_dir: &Path,
        report: &mut Report,
    ) {
        let mut taken = HashSet::new();
        for asset in dir.assets() {
            let Some(name) = asset.file_name() else {
                continue;
            };
            taken.insert(name.to_string_lossy().into_owned());
            let to = out_dir.join(name);
            match copy_file(asset, &to) {
                Ok(()) => report.copied.push(to),
                Err(err) => report.fail(asset, err.into()),
            }
        }

        for page in dir.pages() {
            match self.generate_page(page, parents, out_dir, &mut taken) {
                Ok(Outcome::Written(path)) => report.written.push(path),
                Ok(Outcome::Draft) => report.drafts.push(page.into()),
                Err(err) => report.fail(page, err),
            }
        }

        for sub in dir.dirs() {
            let name = match document::dir_name(&sub.path) {
                Ok(name) => name,
                Err(err) => {
                    report.fail(&sub.path, err);
                    continue;
                }
            };
            let sub_out = out_dir.join(&name);
            if !taken.insert(name.clone()) {
                log::warn!("`{}` maps onto an existing output", sub.path.display());
                report.fail(&sub.path, Error::DuplicateRoute(sub_out));
                continue;
            }
            let title = document::title_from_name(&name);
            parents.push((name, title));
            self.generate_dir(sub, parents, &sub_out, report);
            parents.pop();
        }
    }

    fn generate_page(
        &self,
        path: &Path,
        parents: &[(String, String)],
        out_dir: &Path,
        taken: &mut HashSet<String>,
    ) -> Result<Outcome> {
        let doc = Document::read(path)?;
        if doc.is_draft() {
            log::debug!("Skipping draft `{}`", path.display());
            return Ok(Outcome::Draft);
        }

        let name = document::page_name(path)?;
        let save = out_dir.join(&name);
        if !taken.insert(name.clone()) {
            log::warn!("`{}` maps onto an existing page", path.display());
            return Err(Error::DuplicateRoute(save));
        }
        let location = Location::new(parents, &name, &doc.title()?);

        log::debug!("[{}] Rendering snippets", location.route);
        let body = self.snippets.transform(doc.body())?;
        log::debug!("[{}] Rendering page", location.route);
        let html = self.pages.render(&doc, &body, &location)?;

        fs::create_dir_all(out_dir)?;
        fs::write(&save, html)?;
        Ok(Outcome::Written(save))
    }
}
