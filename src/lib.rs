//! Ramler
//!
//! Expansion of RAML API descriptors into documentation page data, and export
//! of downloadable descriptors.
//!
//! The input is a RAML document already converted to its JSON form. Each
//! resource is expanded into one page: security schemes and traits are merged
//! into its methods, JSON Schemas are synthesized for form-encoded bodies, and
//! every `application/json` schema has its external `$ref`s and `allOf`
//! compositions inlined. Independently, the raw document is re-keyed into the
//! shape of a RAML file and published as JSON and RAML.
//!
//! # Example
//!
//! ```
//! use ramler::{ApiDocument, CommonMark, ExpandOptions, Expander};
//! use serde_json::json;
//!
//! let document = ApiDocument::from_value(
//!     json!({
//!         "title": "Test!",
//!         "traits": [{ "teapot": { "responses": { "418": { "description": "I'm a teapot" } } } }],
//!         "resources": [{
//!             "relativeUri": "/users",
//!             "methods": [{
//!                 "method": "post",
//!                 "is": ["teapot"],
//!                 "body": {
//!                     "application/x-www-form-urlencoded": {
//!                         "formParameters": {
//!                             "name": { "type": "string", "required": true }
//!                         }
//!                     }
//!                 }
//!             }]
//!         }]
//!     }),
//!     ".",
//! )
//! .unwrap();
//!
//! let options = ExpandOptions::default();
//! let api = Expander::new(&document, &options, &CommonMark).expand().unwrap();
//!
//! let page = &api.resources[0];
//! assert_eq!(page.dir, "/resource/users");
//! let post = &page.methods[0];
//! assert!(post["responses"].get("418").is_some());
//!
//! // A JSON Schema was synthesized from the form parameters
//! let schema: serde_json::Value =
//!     serde_json::from_str(post["body"]["application/json"]["schema"].as_str().unwrap()).unwrap();
//! assert_eq!(schema["required"], json!(["name"]));
//! ```
//!
//! # Merge Rules
//!
//! | Source | Merge | Precedence |
//! |--------|-------|------------|
//! | `securedBy` scheme | `headers`, `queryParameters`, `responses` of `describedBy`, one level deep | scheme |
//! | `is` trait | recursive | method; `description` concatenated |
//! | `$ref` | recursive | referenced file |
//! | `allOf` | recursive, in order | later fragment |

mod compiler;
mod config;
mod document;
mod error;
mod expander;
mod exporter;
mod form_schema;
mod loader;
mod markdown;
mod merge;
mod merger;
mod site;
mod types;

pub use compiler::SchemaCompiler;
pub use config::{Config, PageDirs};
pub use document::ApiDocument;
pub use error::{BuildError, ConfigError, ExpandError, ExportError, ResolveError};
pub use expander::{
    add_schema_hashes, page_dir, DocumentationPage, ExpandOptions, ExpandedApi, Expander,
    ResourcePage, SecuritySchemePage,
};
pub use exporter::{export, fix_body, fix_resources, Descriptor, RAML_HEADER};
pub use form_schema::{
    generate as generate_form_schema, insert_into, insert_schemas, normalize_newlines,
    should_synthesize, SchemaSettings,
};
pub use loader::{load_json, load_referenced_schema, navigate_fragment};
pub use markdown::{render_descriptions, CommonMark, MarkdownRenderer};
pub use merge::{deep_merge, merge_maps, Precedence};
pub use merger::{merge_references, merge_security, merge_trait};
pub use site::{generate_api, generate_site, write_site, GeneratedApi};
pub use types::{
    APPLICATION_JSON, DEFAULT_SCHEMA_URI, FORM_URLENCODED, RAML_ONLY_KEYWORDS, SCHEMA_HASH,
    SECURITY_FIELDS,
};
