//! Per-document driver: load, expand, export, and write the results.
//!
//! Each configured API document is processed end to end on its own. Page data
//! and the downloadable descriptor are derived from the same immutable
//! [`ApiDocument`], each through its own clones.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::document::ApiDocument;
use crate::error::{BuildError, ExpandError, ExportError};
use crate::expander::{ExpandOptions, ExpandedApi, Expander};
use crate::exporter::{export, Descriptor};
use crate::markdown::MarkdownRenderer;

/// Page data and descriptors generated for one API document.
#[derive(Debug, Clone)]
pub struct GeneratedApi {
    pub api_path: PathBuf,
    pub web_root: String,
    pub basename: String,
    pub pages: ExpandedApi,
    pub descriptor: Descriptor,
}

impl GeneratedApi {
    /// Serialize page data as `<page dir>/index.json` and the descriptors as
    /// `<web root>/<basename>.json` and `.raml`, relative to the output
    /// directory.
    pub fn outputs(&self) -> Result<Vec<(PathBuf, String)>, BuildError> {
        let mut outputs = Vec::new();

        for page in &self.pages.resources {
            outputs.push(page_output(&page.dir, page)?);
        }
        for page in &self.pages.security_schemes {
            outputs.push(page_output(&page.dir, page)?);
        }
        for page in &self.pages.documentation {
            outputs.push(page_output(&page.dir, page)?);
        }

        let root = PathBuf::from(self.web_root.trim_start_matches('/'));
        outputs.push((
            root.join(format!("{}.json", self.basename)),
            self.descriptor.to_json()?,
        ));
        outputs.push((
            root.join(format!("{}.raml", self.basename)),
            self.descriptor.to_raml()?,
        ));

        Ok(outputs)
    }

    /// Write this document's outputs under `dest`. Returns the written paths.
    pub fn write(&self, dest: &Path) -> Result<Vec<PathBuf>, BuildError> {
        write_outputs(dest, self.outputs()?)
    }
}

/// Write the outputs of every generated document under `dest`.
///
/// All documents are serialized and all directories created before the
/// first file is written, so a serialization error or an unusable directory
/// leaves no files behind. A failure while writing a file can still leave the
/// files written before it.
pub fn write_site(
    generated: &[GeneratedApi],
    dest: &Path,
) -> Result<Vec<PathBuf>, BuildError> {
    let mut outputs = Vec::new();
    for api in generated {
        outputs.extend(api.outputs()?);
    }
    write_outputs(dest, outputs)
}

/// Expand and export the document at `api_path`.
pub fn generate_api(
    api_path: &Path,
    web_root: &str,
    basename: &str,
    config: &Config,
    renderer: &dyn MarkdownRenderer,
) -> Result<GeneratedApi, ExpandError> {
    tracing::info!(api_path = %api_path.display(), web_root, "generating API pages");
    let document = ApiDocument::load(api_path)?;

    let options = ExpandOptions::new(config.json_schema_schema_uri.as_str())
        .web_root(web_root)
        .page_dirs(config.page_dirs.clone());
    let pages = Expander::new(&document, &options, renderer).expand()?;

    Ok(GeneratedApi {
        api_path: api_path.to_path_buf(),
        web_root: web_root.to_string(),
        basename: basename.to_string(),
        pages,
        descriptor: export(&document),
    })
}

/// Generate every API document named in `config`, with paths relative to
/// `source_dir`.
///
/// The configuration is validated before any document is read. The first
/// failing document aborts the run.
pub fn generate_site(
    config: &Config,
    source_dir: &Path,
    renderer: &dyn MarkdownRenderer,
) -> Result<Vec<GeneratedApi>, BuildError> {
    config.validate()?;

    config
        .api_paths()
        .map(|(api_path, web_root)| {
            let basename = config.descriptor_basename(api_path);
            let path = source_dir.join(api_path.trim_start_matches('/'));
            generate_api(&path, web_root, basename, config, renderer).map_err(|source| {
                BuildError::Expand {
                    api_path: path.clone(),
                    source,
                }
            })
        })
        .collect()
}

fn page_output<T: Serialize>(dir: &str, page: &T) -> Result<(PathBuf, String), BuildError> {
    let path = Path::new(dir.trim_start_matches('/')).join("index.json");
    let content = serde_json::to_string_pretty(page).map_err(ExportError::from)?;
    Ok((path, content))
}

fn write_outputs(
    dest: &Path,
    outputs: Vec<(PathBuf, String)>,
) -> Result<Vec<PathBuf>, BuildError> {
    let outputs: Vec<(PathBuf, String)> = outputs
        .into_iter()
        .map(|(relative, content)| (dest.join(relative), content))
        .collect();

    for (path, _) in &outputs {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BuildError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let mut written = Vec::with_capacity(outputs.len());
    for (path, content) in outputs {
        std::fs::write(&path, content).map_err(|source| BuildError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    tracing::info!(dest = %dest.display(), files = written.len(), "wrote site");
    Ok(written)
}
