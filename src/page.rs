use std::collections::BTreeMap;

use minijinja::{Environment, ErrorKind, Value};
use pulldown_cmark::Options;

use crate::{
    config::Config,
    document::{Document, Location},
    error::{Error, Result},
    markdown,
    snippet::Transformed,
    templates,
};

/// renders a document's body into the page template
pub struct PageRenderer {
    env: Environment<'static>,
    template: String,
    options: Options,
    anchors: bool,
}

impl PageRenderer {
    /// load the page template, failing early if it is missing or doesn't parse
    pub fn new(config: &Config) -> Result<Self> {
        let env = templates::get_env(&config.structure.templates);
        let template = config.structure.page_template.clone();
        match env.get_template(&template) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::TemplateNotFound => {
                return Err(Error::MissingTemplate(config.page_template_path()))
            }
            Err(err) => return Err(Error::InvalidTemplate(err)),
        }
        Ok(Self {
            env,
            template,
            options: config.render.options(),
            anchors: config.render.heading_anchors,
        })
    }

    /// convert the transformed body and substitute it into the template
    ///
    /// rendered snippets go back in after the markdown conversion. Every metadata key is available to the template; `title`, `content`,
    /// `toc`, `route`, `crumbs` and `page` are always set and take precedence.
    pub fn render(&self, doc: &Document, body: &Transformed, location: &Location) -> Result<String> {
        let mut html = markdown::to_html(body.markdown(), self.options, self.anchors);
        html.content = body.restore(&html.content);
        for heading in &mut html.toc {
            heading.text = body.restore(&heading.text);
        }
        let mut ctx: BTreeMap<String, Value> = doc
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_serialize(v)))
            .collect();
        ctx.insert("page".into(), Value::from_serialize(&doc.metadata));
        ctx.insert("title".into(), Value::from(doc.title()?));
        ctx.insert("content".into(), Value::from(html.content));
        ctx.insert("toc".into(), Value::from_serialize(&html.toc));
        ctx.insert("route".into(), Value::from(location.route.as_str()));
        ctx.insert("crumbs".into(), Value::from_serialize(&location.crumbs));

        let template = self.env.get_template(&self.template)?;
        Ok(template.render(Value::from_serialize(&ctx))?)
    }
}
