//! Resource tree expansion into page data.
//!
//! Resources are visited depth-first, each parent before its children. Every
//! resource is expanded in a sandbox: a clone without its child `resources`,
//! so schema and trait processing can never reach into a subtree. Per method
//! the order is fixed:
//!
//! 1. security schemes from `securedBy`, then traits from `is`;
//! 2. schema synthesis from `formParameters`;
//! 3. JSON Schema compilation of every `application/json` schema.
//!
//! The expanded resource then gets its `schema_hash` projections and finally
//! has every `description` rendered as Markdown.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::compiler::SchemaCompiler;
use crate::config::PageDirs;
use crate::document::ApiDocument;
use crate::error::{ExpandError, ResolveError};
use crate::form_schema::{insert_schemas, SchemaSettings};
use crate::markdown::{render_descriptions, MarkdownRenderer};
use crate::merger::merge_references;
use crate::types::{
    json_type_name, relative_uri, resources, verb, APPLICATION_JSON, DEFAULT_SCHEMA_URI,
    SCHEMA_HASH,
};

/// Options for expanding a document.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// `$schema` URI of synthesized schemas.
    pub schema_uri: String,
    /// Web root pages are placed under. Must end with `/`.
    pub web_root: String,
    pub page_dirs: PageDirs,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_URI)
    }
}

impl ExpandOptions {
    pub fn new(schema_uri: impl Into<String>) -> Self {
        Self {
            schema_uri: schema_uri.into(),
            web_root: "/".into(),
            page_dirs: PageDirs::default(),
        }
    }

    pub fn web_root(mut self, web_root: impl Into<String>) -> Self {
        self.web_root = web_root.into();
        self
    }

    pub fn page_dirs(mut self, page_dirs: PageDirs) -> Self {
        self.page_dirs = page_dirs;
        self
    }
}

/// Page data for one resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourcePage {
    /// Concatenated `relativeUri`s from the root, e.g. `/users/{id}`.
    pub path: String,
    pub dir: String,
    pub title: String,
    /// Rendered HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fully expanded methods.
    pub methods: Vec<Value>,
}

/// Page data for one security scheme.
#[derive(Debug, Clone, Serialize)]
pub struct SecuritySchemePage {
    pub dir: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Page data for one documentation item.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentationPage {
    pub dir: String,
    pub title: String,
    /// Rendered HTML of the item's `content`.
    pub body: String,
}

/// Everything the rendering layer needs for one API document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpandedApi {
    pub resources: Vec<ResourcePage>,
    pub security_schemes: Vec<SecuritySchemePage>,
    pub documentation: Vec<DocumentationPage>,
}

/// Expands the resources of one document.
pub struct Expander<'a> {
    document: &'a ApiDocument,
    options: &'a ExpandOptions,
    renderer: &'a dyn MarkdownRenderer,
    compiler: SchemaCompiler,
}

impl<'a> Expander<'a> {
    pub fn new(
        document: &'a ApiDocument,
        options: &'a ExpandOptions,
        renderer: &'a dyn MarkdownRenderer,
    ) -> Self {
        Self {
            document,
            options,
            renderer,
            compiler: SchemaCompiler::new(document.base_dir()),
        }
    }

    /// Expand the whole document.
    ///
    /// # Errors
    ///
    /// The first error aborts expansion; no partial result is returned.
    pub fn expand(&self) -> Result<ExpandedApi, ExpandError> {
        let mut api = ExpandedApi::default();
        self.expand_resources(self.document.resources(), "", &mut api.resources)?;

        for (name, scheme) in self.document.security_schemes() {
            api.security_schemes.push(SecuritySchemePage {
                dir: self.page_dir(&self.options.page_dirs.security, &format!("/{}", name)),
                title: name.clone(),
                description: scheme
                    .get("description")
                    .and_then(Value::as_str)
                    .map(|text| self.renderer.render(text)),
            });
        }

        for item in self.document.documentation() {
            let title = item.get("title").and_then(Value::as_str).unwrap_or("");
            let content = item.get("content").and_then(Value::as_str).unwrap_or("");
            api.documentation.push(DocumentationPage {
                dir: self.page_dir(&self.options.page_dirs.overview, &format!("/{}", title)),
                title: title.to_string(),
                body: self.renderer.render(content),
            });
        }

        tracing::info!(
            resources = api.resources.len(),
            security_schemes = api.security_schemes.len(),
            documentation = api.documentation.len(),
            "expanded document"
        );
        Ok(api)
    }

    fn expand_resources(
        &self,
        children: &[Value],
        parent_path: &str,
        pages: &mut Vec<ResourcePage>,
    ) -> Result<(), ExpandError> {
        for resource in children {
            let path = format!("{}{}", parent_path, relative_uri(resource));
            pages.push(self.expand_resource(resource, &path)?);
            self.expand_resources(resources(resource), &path, pages)?;
        }
        Ok(())
    }

    /// Expand a single resource found at `path`. Child resources are ignored.
    pub fn expand_resource(
        &self,
        resource: &Value,
        path: &str,
    ) -> Result<ResourcePage, ExpandError> {
        tracing::debug!(path, "expanding resource");
        let Value::Object(resource) = resource else {
            return Err(ResolveError::InvalidDocument {
                message: format!(
                    "resource {}: expected object, got {}",
                    path,
                    json_type_name(resource)
                ),
            }
            .into());
        };

        let mut sandbox: Map<String, Value> = resource
            .iter()
            .filter(|(key, _)| key.as_str() != "resources")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let title = match sandbox.get("title") {
            Some(Value::String(title)) => title.clone(),
            Some(other) => other.to_string(),
            None => {
                sandbox.insert("title".into(), Value::String(path.to_string()));
                path.to_string()
            }
        };

        let settings = SchemaSettings::new(self.options.schema_uri.as_str()).title(title.as_str());
        if let Some(Value::Array(methods)) = sandbox.shift_remove("methods") {
            let expanded = methods
                .into_iter()
                .map(|method| self.expand_method(method, path, &settings))
                .collect::<Result<Vec<_>, _>>()?;
            sandbox.insert("methods".into(), Value::Array(expanded));
        }

        let projected = add_schema_hashes(Value::Object(sandbox));
        let rendered = render_descriptions(projected, self.renderer);

        Ok(ResourcePage {
            path: path.to_string(),
            dir: self.page_dir(&self.options.page_dirs.resource, path),
            title,
            description: rendered
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_owned),
            methods: rendered
                .get("methods")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        })
    }

    fn expand_method(
        &self,
        method: Value,
        path: &str,
        settings: &SchemaSettings,
    ) -> Result<Value, ExpandError> {
        let location = format!("{} {}", path, verb(&method));
        let merged = merge_references(
            method,
            self.document.traits(),
            self.document.security_schemes(),
            &location,
        )?;
        let synthesized = insert_schemas(merged, settings)?;
        self.compiler.compile_tree(synthesized)
    }

    fn page_dir(&self, base: &str, path: &str) -> String {
        page_dir(&self.options.web_root, base, path)
    }
}

/// Directory of a generated page: `web_root` + `base` + `path`, with
/// `{param}` rewritten to `--param--` and whitespace to `_`.
pub fn page_dir(web_root: &str, base: &str, path: &str) -> String {
    static URI_PARAM: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let uri_param = URI_PARAM.get_or_init(|| Regex::new(r"\{(\w*)\}").expect("valid regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s").expect("valid regex"));

    let dir = format!(
        "{}/{}",
        base.trim_matches('/'),
        path.trim_start_matches('/')
    );
    let dir = uri_param.replace_all(&dir, "--${1}--");
    let dir = whitespace.replace_all(&dir, "_");

    format!("{}{}", web_root, dir.trim_start_matches('/'))
}

/// Attach a `schema_hash` projection next to every `application/json` schema.
///
/// The projection is the parsed schema with, for each property, a
/// `displayName`, a boolean `required`, and `object`/`array` examples and
/// nested `properties`/`items` re-rendered as pretty JSON text for display.
/// The `schema` field itself is left untouched.
pub fn add_schema_hashes(tree: Value) -> Value {
    add_schema_hashes_inner(tree, None)
}

fn add_schema_hashes_inner(node: Value, key: Option<&str>) -> Value {
    match node {
        Value::Object(map) => {
            let mut result = Map::with_capacity(map.len());
            for (child_key, child) in map {
                let projected = add_schema_hashes_inner(child, Some(&child_key));
                result.insert(child_key, projected);
            }

            if key == Some(APPLICATION_JSON) {
                if let Some(projection) = result.get("schema").and_then(schema_projection) {
                    result.insert(SCHEMA_HASH.into(), projection);
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| add_schema_hashes_inner(item, None))
                .collect(),
        ),
        other => other,
    }
}

fn schema_projection(schema: &Value) -> Option<Value> {
    let mut parsed = match schema {
        Value::String(text) => serde_json::from_str::<Value>(text).ok()?,
        Value::Object(_) => schema.clone(),
        _ => return None,
    };

    if let Value::Object(root) = &mut parsed {
        if root.contains_key("properties") {
            project_properties(root);
        }
        if let Some(Value::Object(items)) = root.get_mut("items") {
            if items.contains_key("properties") {
                project_properties(items);
            }
        }
    }
    Some(parsed)
}

fn project_properties(object: &mut Map<String, Value>) {
    let required: Vec<String> = object
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let Some(Value::Object(properties)) = object.get_mut("properties") else {
        return;
    };

    for (name, property) in properties.iter_mut() {
        let Value::Object(property) = property else {
            continue;
        };

        let is_required =
            required.contains(name) || property.get("required") == Some(&Value::Bool(true));
        property.insert("displayName".into(), Value::String(name.clone()));
        property.insert("required".into(), Value::Bool(is_required));

        let container_type = matches!(
            property.get("type").and_then(Value::as_str),
            Some("object") | Some("array")
        );
        if container_type && property.contains_key("example") {
            if let Some(example) = property.get_mut("example") {
                *example = Value::String(pretty_example(example));
            }
        } else if let Some(nested) = property.get_mut("properties") {
            *nested = Value::String(pretty(nested));
        } else if let Some(items) = property.get_mut("items") {
            *items = Value::String(pretty(items));
        }
    }
}

/// Examples are usually JSON text; re-indent them, keeping text that is not
/// JSON as written.
fn pretty_example(example: &Value) -> String {
    match example {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map(|parsed| pretty(&parsed))
            .unwrap_or_else(|_| text.clone()),
        other => pretty(other),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
