pub mod config;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod markdown;
pub mod metadata;
pub mod page;
pub mod renderers;
pub mod site;
pub mod snippet;
pub mod templates;
pub mod tree;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use site::{Report, Site};
