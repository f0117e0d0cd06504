//! Markdown rendering of `description` fields.
//!
//! Rendering belongs to the host; the pipeline only needs something that
//! turns Markdown text into HTML. [`CommonMark`] is the default.

use pulldown_cmark::{html, Options, Parser};
use serde_json::{Map, Value};

/// Renders Markdown source to HTML.
pub trait MarkdownRenderer {
    fn render(&self, source: &str) -> String;
}

impl<F> MarkdownRenderer for F
where
    F: Fn(&str) -> String,
{
    fn render(&self, source: &str) -> String {
        self(source)
    }
}

/// CommonMark rendering with tables and strikethrough.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

impl MarkdownRenderer for CommonMark {
    fn render(&self, source: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(source, options);
        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Render every string-valued `description` field anywhere in `tree`.
pub fn render_descriptions(tree: Value, renderer: &dyn MarkdownRenderer) -> Value {
    match tree {
        Value::Object(map) => {
            let mut result = Map::with_capacity(map.len());
            for (key, value) in map {
                let rendered = match value {
                    Value::String(text) if key == "description" => {
                        Value::String(renderer.render(&text))
                    }
                    other => render_descriptions(other, renderer),
                };
                result.insert(key, rendered);
            }
            Value::Object(result)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| render_descriptions(item, renderer))
                .collect(),
        ),
        other => other,
    }
}
