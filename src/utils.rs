use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::{Config, CONFIG_FILE},
    error::Result,
};

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
  <link rel="stylesheet" href="/css/style.css">
</head>
<body>
  <nav>{{ crumbs | join(" / ") }}</nav>
  {% if toc %}
  <aside>
    {% for heading in toc %}<a href="#{{ heading.id }}">{{ heading.text }}</a>
    {% endfor %}
  </aside>
  {% endif %}
  <main>
{{ content }}
  </main>
</body>
</html>
"##;

const STYLE: &str = "body { max-width: 48rem; margin: 0 auto; font-family: sans-serif; }\n";

const FIRST_POST: &str = "---\ntitle: Hello\n---\n# Hi there\n\nInline math like $ x^2 $ works too.\n";

/// lay out a minimal site in `root`, leaving existing files alone
///
/// returns the files that were created
pub fn create_new(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut config = Config::default();
    config
        .extra_files
        .insert("style.css".into(), PathBuf::from("css/style.css"));
    let config_text = toml::to_string_pretty(&config).map_err(std::io::Error::other)?;

    let templates = root.join(&config.structure.templates);
    let files = [
        (root.join(CONFIG_FILE), config_text),
        (
            templates.join(&config.structure.page_template),
            PAGE_TEMPLATE.to_string(),
        ),
        (templates.join("style.css"), STYLE.to_string()),
        (
            root.join(&config.structure.source).join("hello.md"),
            FIRST_POST.to_string(),
        ),
    ];

    let mut created = Vec::new();
    for (path, contents) in files {
        if path.exists() {
            log::info!("Keeping existing `{}`", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        log::info!("Created `{}`", path.display());
        created.push(path);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use figment::{
        providers::{Format, Toml},
        Figment,
    };

    use super::*;

    #[test]
    fn new_site_has_a_loadable_config() {
        let root = tempfile::tempdir().unwrap();
        let created = create_new(root.path()).unwrap();
        assert_eq!(created.len(), 4);
        let figment = Figment::from(Config::default()).merge(Toml::file(root.path().join(CONFIG_FILE)));
        let config = Config::from(figment).unwrap();
        assert_eq!(config.extra_files["style.css"], PathBuf::from("css/style.css"));
    }

    #[test]
    fn page_template_links_headings() {
        let root = tempfile::tempdir().unwrap();
        create_new(root.path()).unwrap();
        let config = Config::default();
        let env = crate::templates::get_env(root.path().join(&config.structure.templates));
        let html = env
            .get_template(&config.structure.page_template)
            .unwrap()
            .render(minijinja::context! {
                title => "Hello",
                crumbs => vec!["Hello"],
                toc => vec![minijinja::context! { id => "Hi-there", text => "Hi there" }],
                content => "<h1>Hi there</h1>",
            })
            .unwrap();
        assert!(html.contains("<a href=\"#Hi-there\">Hi there</a>"));
        assert!(html.contains("<h1>Hi there</h1>"));
    }

    #[test]
    fn existing_files_are_kept() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE), "# mine\n").unwrap();
        let created = create_new(root.path()).unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(
            fs::read_to_string(root.path().join(CONFIG_FILE)).unwrap(),
            "# mine\n"
        );
    }
}
