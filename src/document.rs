use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use serde::Serialize;

use crate::{
    error::{Error, Result},
    frontmatter,
    metadata::Metadata,
};

pub const SOURCE_EXTENSION: &str = "md";
pub const OUTPUT_EXTENSION: &str = "html";

/// a source file, split into its metadata and body
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    pub raw: String,
    pub metadata: Metadata,
    /// offset of the body in `raw`
    body_start: usize,
}

impl Document {
    pub fn parse(path: impl Into<PathBuf>, raw: String) -> Self {
        let (metadata, body) = frontmatter::parse(&raw);
        let body_start = raw.len() - body.len();
        Self {
            path: path.into(),
            raw,
            metadata,
            body_start,
        }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        Ok(Self::parse(path, raw))
    }

    /// everything after the front-matter
    pub fn body(&self) -> &str {
        &self.raw[self.body_start..]
    }

    pub fn is_draft(&self) -> bool {
        self.metadata.is_draft()
    }

    /// the explicit title if there is one, otherwise one made from the file name
    pub fn title(&self) -> Result<String> {
        match self.metadata.title() {
            Some(title) => Ok(title.to_string()),
            None => derived_title(&self.path),
        }
    }
}

fn ordering_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^\d+_").expect("prefix pattern is valid"))
}

/// drop a leading `01_` style ordering prefix
pub fn strip_prefix(name: &str) -> &str {
    match ordering_prefix().find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// the title a name gets when nothing else is given
pub fn title_from_name(name: &str) -> String {
    strip_prefix(name).replace('_', " ")
}

fn derived_title(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(title_from_name)
        .ok_or_else(|| Error::PageError(path.into()))
}

/// output name of a page, `01_hello.md` -> `hello.html`
pub fn page_name(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::PageError(path.into()))?;
    Ok(format!("{}.{OUTPUT_EXTENSION}", strip_prefix(stem)))
}

/// output name of a directory, `02_posts` -> `posts`
pub fn dir_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| strip_prefix(s).to_string())
        .ok_or_else(|| Error::DirError(path.into()))
}

/// where a page ends up in the site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    /// relative to the output directory
    pub save: PathBuf,
    /// absolute link within the site
    pub route: String,
    /// titles of the enclosing directories, then the page
    pub crumbs: Vec<String>,
}

impl Location {
    /// the location for a page `name` inside the directories given as (output name, title) pairs
    pub fn new(parents: &[(String, String)], name: &str, title: &str) -> Self {
        let mut save = PathBuf::new();
        let mut route = String::new();
        let mut crumbs = Vec::with_capacity(parents.len() + 1);
        for (dir, dir_title) in parents {
            save.push(dir);
            route.push('/');
            route.push_str(dir);
            crumbs.push(dir_title.clone());
        }
        save.push(name);
        route.push('/');
        route.push_str(name);
        crumbs.push(title.to_string());
        Self {
            save,
            route,
            crumbs,
        }
    }
}
