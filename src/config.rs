use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Metadata, Provider,
};
use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// default locations
pub const CONFIG_FILE: &str = "folio.toml";
pub const IN_DIR: &str = "source";
pub const OUT_DIR: &str = "public";
pub const TEMPLATE_DIR: &str = "config";
pub const PAGE_TEMPLATE: &str = "page.html";
pub const ENV_PREFIX: &str = "FOLIO_";

/// config for managing the site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub structure: ConfigStructure,
    pub render: ConfigRender,
    pub snippets: ConfigSnippets,
    /// files in the template directory to copy into the output, name -> destination
    pub extra_files: BTreeMap<String, PathBuf>,
    pub serve: ConfigServe,
}

/// config for defining the layout of the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigStructure {
    /// the directory that holds all the markdown files
    pub source: PathBuf,
    /// the output directory that is used for serving the pages
    pub output: PathBuf,
    /// the jinja templates and the extra files
    pub templates: PathBuf,
    /// the template used for every page, relative to `templates`
    pub page_template: String,
    /// file names in the source tree that are neither documents nor assets
    pub exclude: Vec<String>,
    /// remove the output directory before generating
    pub clean: bool,
}

/// config options for the markdown conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRender {
    /// look for `$..$` and `$$..$$` regions
    pub math: bool,
    /// give headings ids and collect a table of contents
    pub heading_anchors: bool,
    pub smart_punctuation: bool,
}

/// external programs used to render snippets, as argv lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSnippets {
    pub inline_math: Vec<String>,
    pub display_math: Vec<String>,
    /// language of a `<script type="text/LANG">` block -> program
    pub scripts: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigServe {
    pub port: u16,
}

impl Default for ConfigStructure {
    fn default() -> Self {
        Self {
            source: IN_DIR.into(),
            output: OUT_DIR.into(),
            templates: TEMPLATE_DIR.into(),
            page_template: PAGE_TEMPLATE.into(),
            exclude: Vec::new(),
            clean: true,
        }
    }
}

impl Default for ConfigRender {
    fn default() -> Self {
        Self {
            math: true,
            heading_anchors: true,
            smart_punctuation: false,
        }
    }
}

impl Default for ConfigServe {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

impl Config {
    /// defaults, then the toml file, then `FOLIO_` environment variables
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Self::default())
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn from<T: Provider>(provider: T) -> Result<Self> {
        Ok(Figment::from(provider).extract()?)
    }

    pub fn page_template_path(&self) -> PathBuf {
        self.structure.templates.join(&self.structure.page_template)
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("Folio config")
    }
    fn data(
        &self,
    ) -> std::result::Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error>
    {
        Serialized::defaults(self).data()
    }
}

impl ConfigRender {
    pub fn options(&self) -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        if self.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }
}
