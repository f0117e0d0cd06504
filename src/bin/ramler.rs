//! Ramler CLI
//!
//! Command-line interface for expanding and exporting RAML API descriptors.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ramler::{
    export, generate_site, write_site, ApiDocument, CommonMark, Config, ExpandOptions, Expander,
    DEFAULT_SCHEMA_URI,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ramler")]
#[command(about = "Expand RAML API descriptors into documentation page data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand an API document and print its page data as JSON
    Expand {
        /// API document (RAML converted to JSON)
        api: PathBuf,

        /// $schema URI for schemas synthesized from form parameters
        #[arg(long, default_value = DEFAULT_SCHEMA_URI)]
        schema_uri: String,

        /// Web root pages are placed under (must end with "/")
        #[arg(long, default_value = "/")]
        web_root: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Write the downloadable JSON and RAML descriptors of an API document
    Export {
        /// API document (RAML converted to JSON)
        api: PathBuf,

        /// Directory to write the descriptors to
        #[arg(long)]
        dest: PathBuf,

        /// Basename of the descriptor files
        #[arg(long, default_value = "api")]
        basename: String,
    },

    /// Expand and export every API document named in the configuration
    Build {
        /// Configuration file (defaults: api.json published at "/")
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory API paths are relative to (default: the config file's directory)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        dest: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Expand {
            api,
            schema_uri,
            web_root,
            output,
            pretty,
        } => run_expand(&api, schema_uri, web_root, output, pretty),

        Commands::Export {
            api,
            dest,
            basename,
        } => run_export(&api, &dest, &basename),

        Commands::Build {
            config,
            source,
            dest,
        } => run_build(config.as_deref(), source, &dest),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_expand(
    api: &Path,
    schema_uri: String,
    web_root: String,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    if !web_root.ends_with('/') {
        eprintln!("Error: web root \"{}\" must end with \"/\"", web_root);
        return Err(2);
    }

    let document = ApiDocument::load(api).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let options = ExpandOptions::new(schema_uri).web_root(web_root);
    let pages = Expander::new(&document, &options, &CommonMark)
        .expand()
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&pages)
    } else {
        serde_json::to_string(&pages)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_export(api: &Path, dest: &Path, basename: &str) -> Result<(), u8> {
    let document = ApiDocument::load(api).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let descriptor = export(&document);

    let json = descriptor.to_json().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let raml = descriptor.to_raml().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    std::fs::create_dir_all(dest).map_err(|e| {
        eprintln!("Error creating {}: {}", dest.display(), e);
        3u8
    })?;
    for (extension, content) in [("json", json), ("raml", raml)] {
        let path = dest.join(format!("{}.{}", basename, extension));
        std::fs::write(&path, content).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        })?;
        println!("{}", path.display());
    }

    Ok(())
}

fn run_build(config_path: Option<&Path>, source: Option<PathBuf>, dest: &Path) -> Result<(), u8> {
    let config = match config_path {
        Some(path) => Config::load(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        None => Config::default(),
    };

    let source = source.unwrap_or_else(|| {
        config_path
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let generated = generate_site(&config, &source, &CommonMark).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let written = write_site(&generated, dest).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    for path in written {
        println!("{}", path.display());
    }

    Ok(())
}
