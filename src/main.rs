use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser as _;
use dismark::{Error, Options, to_html};
use tracing_subscriber::EnvFilter;

/// Convert Discord-flavoured Markdown to HTML.
#[derive(clap::Parser)]
#[command(name = "dismark", version, about)]
struct Cli {
    /// Markdown file to read. Reads stdin when absent.
    input: Option<PathBuf>,

    /// Parse as embed content, enabling `[label](url)` links.
    #[arg(long)]
    embed: bool,

    /// Only recognise mentions, channels, roles and emoji.
    #[arg(long)]
    discord_only: bool,

    /// Pass text content through without escaping.
    #[arg(long)]
    no_escape: bool,

    /// JSON file mapping css class names to css module names.
    #[arg(long, value_name = "FILE")]
    css_modules: Option<PathBuf>,

    /// Print the parsed tree as JSON instead of HTML.
    #[arg(long)]
    ast: bool,
}

impl Cli {
    fn options(&self) -> Result<Options, Error> {
        let css_module_names = match &self.css_modules {
            Some(path) => {
                let names: HashMap<String, String> =
                    serde_json::from_str(&fs::read_to_string(path)?)?;
                Some(names)
            }
            None => None,
        };
        Ok(Options {
            embed: self.embed,
            discord_only: self.discord_only,
            escape_html: !self.no_escape,
            css_module_names,
            ..Options::default()
        })
    }

    fn input(&self) -> Result<String, Error> {
        match &self.input {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => {
                let mut input = String::new();
                io::stdin().read_to_string(&mut input)?;
                Ok(input)
            }
        }
    }

    fn run(&self) -> Result<String, Error> {
        let input = self.input()?;
        let options = self.options()?;
        if self.ast {
            let rules = options.profile().rules();
            let nodes = dismark::Parser::new(rules).parse(&input, &options.context());
            return Ok(serde_json::to_string_pretty(&nodes)?);
        }
        Ok(to_html(&input, &options))
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match cli.run() {
        Ok(output) => print!("{output}"),
        Err(err) => {
            tracing::error!(error = %err, "Conversion failed");
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
