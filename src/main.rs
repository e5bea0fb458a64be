use babe::build::{self, BuildContext};
use babe::{output, watch};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "babe")]
#[command(about = "Static site generator: Markdown content, Handlebars templates")]
#[command(long_about = "\
Static site generator: Markdown content, Handlebars templates

Markdown files become pages, front matter becomes template data, and a
single babe.json drives everything else.

Site structure:

  site/
  ├── babe.json                # Config: static data + dynamic collections
  ├── local.babe.json          # Optional local override (wins over babe.json)
  ├── _layouts/
  │   ├── default.hbs          # Used when a page declares no layout
  │   └── post.hbs             # Selected via `layout: post` front matter
  ├── _partials/
  │   └── head.hbs             # Referenced as {{> head}} from any template
  ├── index.md                 # → public/index/index.html
  ├── blog/
  │   └── first-post.md        # → public/blog/first-post/index.html
  ├── feed.xml.hbs             # Freestanding template → public/feed.xml
  └── style.css                # Copied verbatim → public/style.css

Front matter is `key: value` lines between `---` delimiters; values typed
as booleans (true/false), dates (YYYY-MM-DD), or strings.")]
#[command(version)]
struct Cli {
    /// Site source directory
    #[arg(long, default_value = ".", env = "BABE_DIR", global = true)]
    source: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full build into <source>/public
    Build,
    /// Build, then rebuild whenever the source tree changes
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 250)]
        interval: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let ctx = BuildContext::new(&cli.source)?;
            let stats = build::run(&ctx)?;
            output::print_build(&stats);
        }
        Command::Watch { interval } => {
            // The initial build may fail (e.g. a half-edited layout); keep
            // watching so the next change can fix it.
            match BuildContext::new(&cli.source).and_then(|ctx| build::run(&ctx)) {
                Ok(stats) => output::print_build(&stats),
                Err(e) => eprintln!("Build failed: {e}"),
            }
            watch::watch(&cli.source, Duration::from_millis(interval));
        }
    }

    Ok(())
}
