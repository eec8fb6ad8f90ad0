//! Command-line arguments

use clap::Parser;
use std::path::{Path, PathBuf};
use textchunk_config::{
    ApplicationConfig, ChunkMethod, ConfigResult, ConfigurationLoader, ConfigurationSource,
    EnvironmentSource, TomlFileSource,
};

/// Split text into token-bounded chunks with exact character offsets
///
/// Reads UTF-8 text from FILE (or stdin) and prints the chunks as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input file; stdin when omitted or "-"
    pub file: Option<PathBuf>,

    /// Chunking method (token, recursive or markdown)
    #[arg(short, long)]
    pub method: Option<ChunkMethod>,

    /// Maximum chunk size
    #[arg(short = 's', long)]
    pub chunk_size: Option<usize>,

    /// Content repeated between neighbouring chunks
    #[arg(short = 'o', long)]
    pub chunk_overlap: Option<usize>,

    /// Model whose tokenizer measures the chunks
    #[arg(long)]
    pub model: Option<String>,

    /// Separator for the recursive method, in priority order (repeatable)
    #[arg(long = "separator")]
    pub separators: Vec<String>,

    /// Keep separators at the front of the following piece
    #[arg(long)]
    pub keep_separator: bool,

    /// Special token allowed in the input, or "all" (repeatable)
    #[arg(long = "allowed-special")]
    pub allowed_special: Vec<String>,

    /// Special token rejected in the input, or "all" (repeatable)
    #[arg(long = "disallowed-special")]
    pub disallowed_special: Vec<String>,

    /// Optional configuration file path (TOML format)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Treat the input as a JSON table and chunk its markdown rendering
    #[arg(long)]
    pub table_json: bool,

    /// Also log to a daily file in this directory (OS default when no value
    /// is given)
    #[arg(long, num_args = 0..=1)]
    pub log_dir: Option<Option<PathBuf>>,

    /// Log JSON lines instead of text
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Input path, or `None` for stdin
    pub fn input_path(&self) -> Option<&Path> {
        self.file.as_deref().filter(|path| *path != Path::new("-"))
    }

    /// Defaults, then the config file, then `TEXTCHUNK_*` variables, then
    /// these flags
    ///
    /// # Errors
    /// Returns configuration loading or validation errors
    pub fn load_config(&self) -> ConfigResult<ApplicationConfig> {
        let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
        if let Some(path) = &self.config {
            loader = loader.add_source(Box::new(TomlFileSource::new(path)));
        }
        loader.add_source(Box::new(CliOverrides(self))).load()
    }
}

/// Flags given on the command line, applied over every other source
struct CliOverrides<'a>(&'a Args);

impl ConfigurationSource for CliOverrides<'_> {
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()> {
        let args = self.0;
        let chunking = &mut config.chunking;

        if let Some(method) = args.method {
            chunking.chunk_method = method;
        }
        if let Some(size) = args.chunk_size {
            chunking.chunk_size = size;
        }
        if let Some(overlap) = args.chunk_overlap {
            chunking.chunk_overlap = overlap;
        }
        if let Some(model) = &args.model {
            chunking.model_name.clone_from(model);
        }
        if !args.separators.is_empty() {
            chunking.separators.clone_from(&args.separators);
        }
        if args.keep_separator {
            chunking.keep_separator = true;
        }
        if !args.allowed_special.is_empty() {
            chunking.allowed_special.clone_from(&args.allowed_special);
        }
        if !args.disallowed_special.is_empty() {
            chunking.disallowed_special.clone_from(&args.disallowed_special);
        }

        if let Some(dir) = &args.log_dir {
            let dir = dir.clone().unwrap_or_else(crate::logging::get_default_log_dir);
            config.logging.directory = Some(dir);
        }
        if args.log_json {
            config.logging.json = true;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command_line"
    }

    fn priority(&self) -> u8 {
        200
    }
}
