use minijinja::HtmlEscape;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

/// an entry in a page's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: usize,
    pub id: String,
    pub text: String,
}

/// the html for a body along with its headings
#[derive(Debug, Default)]
pub struct Html {
    pub content: String,
    pub toc: Vec<Heading>,
}

/// convert markdown to html, optionally anchoring every heading
pub fn to_html(text: &str, options: Options, anchors: bool) -> Html {
    let parser = Parser::new_ext(text, options);
    let mut content = String::with_capacity(text.len() * 3 / 2);
    if !anchors {
        pulldown_cmark::html::push_html(&mut content, parser);
        return Html {
            content,
            toc: Vec::new(),
        };
    }

    let events: Vec<Event> = parser.collect();
    let mut out = Vec::with_capacity(events.len());
    let mut toc = Vec::new();
    let mut i = 0;
    while i < events.len() {
        let Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs: _,
        }) = &events[i]
        else {
            out.push(events[i].clone());
            i += 1;
            continue;
        };
        let end = events[i..]
            .iter()
            .position(|e| matches!(e, Event::End(TagEnd::Heading(_))))
            .map_or(events.len(), |p| i + p);
        let inner = &events[i + 1..end];
        let text = heading_text(inner);
        let id = id
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| slug(&text));
        let level = *level as usize;
        let id_attr = HtmlEscape(&id).to_string();
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
            format!(" class=\"{}\"", HtmlEscape(&names.join(" ")))
        };

        out.push(Event::Html(CowStr::from(format!(
            "<h{level} id=\"{id_attr}\"{class_attr}>"
        ))));
        out.extend(inner.iter().cloned());
        out.push(Event::Html(CowStr::from(format!(
            " <a class=\"heading-anchor\" href=\"#{id_attr}\">#</a></h{level}>\n"
        ))));
        toc.push(Heading { level, id, text });
        i = end + 1;
    }
    pulldown_cmark::html::push_html(&mut content, out.into_iter());
    Html { content, toc }
}

/// spaces become `-`, and snippet markers (`\u{E000}..\u{E001}`) are dropped
fn slug(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut in_marker = false;
    for c in text.chars() {
        match c {
            '\u{E000}' => in_marker = true,
            '\u{E001}' => in_marker = false,
            _ if in_marker => {}
            ' ' => id.push('-'),
            c => id.push(c),
        }
    }
    id.trim_matches('-').to_string()
}

fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}
