use clap::{Parser, Subcommand};
use plinth::config;
use plinth::output;
use plinth::pipeline::{self, BuildOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plinth", version)]
#[command(about = "Static site compiler for Markdown content and Jinja layouts")]
#[command(long_about = "\
Static site compiler for Markdown content and Jinja layouts

Content files become pages; sections, taxonomy listings, a homepage,
pagination chunks and alias redirects are synthesized from them. Every page
is matched to a layout through a fixed fallback cascade and rendered into
the output directory.

Site structure:

  plinth.toml                      # Site config (optional)
  content/
  ├── about.md                     # → /about/
  ├── index.md                     # Optional; replaces the synthesized homepage
  └── post/
      └── first-post.md            # → /post/first-post/, listed under /post/
  layouts/
  ├── index.html                   # Homepage
  ├── _default/
  │   ├── page.html                # Any content page
  │   ├── list.html                # Any listing
  │   └── terms.html               # Vocabulary index (/tags/)
  └── post/page.html               # Pages of the `post` section
  static/                          # Copied verbatim into the output root
  themes/<name>/                   # layouts/ and static/ searched after the site's

Run 'plinth gen-config' to generate a documented plinth.toml.")]
struct Cli {
    /// Site source directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Destination directory; output.dir is created inside it
    #[arg(long, default_value = ".", global = true)]
    dest: PathBuf,

    /// Log pipeline progress (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and write the site
    Build,
    /// Compile the site and resolve every layout without writing anything
    Check,
    /// Print a stock plinth.toml with all options documented
    GenConfig,
    /// Print the effective value of a config key (e.g. site.paginate.max)
    Get {
        /// Dotted key path
        key: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --verbose forces INFO, otherwise RUST_LOG or WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = BuildOptions {
        source: cli.source.clone(),
        dest: cli.dest.clone(),
    };

    match cli.command {
        Command::Build => {
            println!("==> Building {}", cli.source.display());
            let report = pipeline::build_site(options)?;
            output::print_build_output(&report);
            println!("==> Build complete: {}", report.output_dir.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let report = pipeline::check_site(options)?;
            output::print_check_output(&report);
            println!("==> Site is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Get { key } => {
            let site_config = config::load_config(&cli.source)?;
            match site_config.get(&key)? {
                Some(toml::Value::String(s)) => println!("{s}"),
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
    }

    Ok(())
}
