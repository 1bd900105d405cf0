mod config;

use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cosmos_common::{Mineral, SpectralType};
use cosmos_kernel::Universe;
use cosmos_nav::{Command, Navigator, Reply};
use cosmos_persist::{Origin, UniverseFile, export_json, open_or_generate};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "cosmos", about = "Persistent procedural universe")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Universe file (overrides the config file)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Generation seed (overrides the config file)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the universe file, generating it if missing
    Generate {
        /// Replace an existing universe with a freshly generated one
        #[arg(long)]
        regenerate: bool,
        /// Pad the file to this many bytes
        #[arg(long)]
        target_size: Option<u64>,
    },
    /// Print summary, state hash and file header
    Info,
    /// Describe an object (the universe when omitted)
    Show { code: Option<String> },
    /// List galaxies, or the children of an object
    Ls { code: Option<String> },
    /// Search the universe
    Find {
        #[command(subcommand)]
        what: Find,
    },
    /// Bodies with the highest fraction of a mineral
    Richest {
        mineral: Mineral,
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Check file integrity without generating anything
    Verify,
    /// Write the universe as JSON (`-` for stdout)
    Export { out: PathBuf },
    /// Interactive navigation session
    Repl,
    /// Serve navigation over gRPC and line JSON until Ctrl-C
    Serve {
        #[arg(long)]
        host: Option<String>,
        /// gRPC port
        #[arg(long)]
        port: Option<u16>,
        /// Line-JSON port
        #[arg(long, conflicts_with = "no_line")]
        line_port: Option<u16>,
        /// Serve gRPC only
        #[arg(long)]
        no_line: bool,
    },
}

#[derive(Subcommand)]
enum Find {
    /// Inhabited planets
    Life { scope: Option<String> },
    /// Stars of one spectral type
    Spectral {
        spectral: SpectralType,
        scope: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_file = data;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    match cli.command {
        Commands::Generate {
            regenerate,
            target_size,
        } => {
            if let Some(size) = target_size {
                config.target_size = size;
            }
            generate(&config, regenerate)?;
        }
        Commands::Info => {
            let universe = load(&config)?;
            let header = UniverseFile::read_header(&config.data_file)?;
            println!("cosmos v{}", env!("CARGO_PKG_VERSION"));
            println!("file: {}", config.data_file.display());
            println!("seed: {}", universe.seed());
            println!("{}", universe.stats());
            println!("state hash: {:#018x}", universe.state_hash());
            println!(
                "schema: v{} payload: {} bytes sha256: {} file: {} bytes",
                header.schema_version, header.payload_len, header.payload_sha256, header.file_len
            );
        }
        Commands::Show { code } => one_shot(&config, Command::Show(code))?,
        Commands::Ls { code } => one_shot(&config, Command::List(code))?,
        Commands::Find { what } => {
            let cmd = match what {
                Find::Life { scope } => Command::FindLife(scope),
                Find::Spectral { spectral, scope } => Command::FindSpectral(spectral, scope),
            };
            one_shot(&config, cmd)?;
        }
        Commands::Richest { mineral, limit } => {
            anyhow::ensure!(limit > 0, "limit must be positive");
            one_shot(&config, Command::Richest(mineral, limit))?;
        }
        Commands::Verify => {
            let header = UniverseFile::verify(&config.data_file)
                .with_context(|| format!("verifying {}", config.data_file.display()))?;
            println!(
                "OK: schema v{}, payload {} bytes, sha256 {}",
                header.schema_version, header.payload_len, header.payload_sha256
            );
        }
        Commands::Export { out } => {
            let universe = load(&config)?;
            if out.as_os_str() == "-" {
                export_json(&universe, std::io::stdout().lock())?;
            } else {
                let file = std::fs::File::create(&out)
                    .with_context(|| format!("creating {}", out.display()))?;
                export_json(&universe, BufWriter::new(file))?;
                info!(path = %out.display(), "exported");
            }
        }
        Commands::Repl => {
            let universe = Arc::new(load(&config)?);
            repl(universe)?;
        }
        Commands::Serve {
            host,
            port,
            line_port,
            no_line,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if line_port.is_some() {
                config.server.line_port = line_port;
            }
            if no_line {
                config.server.line_port = None;
            }
            let universe = Arc::new(load(&config)?);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cosmos_server::start_server(&config.server, universe))?;
        }
    }

    Ok(())
}

fn load(config: &AppConfig) -> anyhow::Result<Universe> {
    let (universe, origin) = open_or_generate(
        &config.data_file,
        config.seed,
        &config.generation,
        config.target_size,
    )
    .with_context(|| format!("opening {}", config.data_file.display()))?;
    if origin == Origin::Generated {
        info!(path = %config.data_file.display(), "generated new universe");
    }
    Ok(universe)
}

fn generate(config: &AppConfig, regenerate: bool) -> anyhow::Result<()> {
    if !regenerate {
        let (universe, origin) = open_or_generate(
            &config.data_file,
            config.seed,
            &config.generation,
            config.target_size,
        )?;
        let verb = match origin {
            Origin::Loaded => "loaded existing",
            Origin::Generated => "generated",
        };
        println!("{verb} universe at {}", config.data_file.display());
        println!("{}", universe.stats());
        return Ok(());
    }

    let universe = Universe::generate(config.seed, config.generation.clone())?;
    if let Some(parent) = config.data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let header = UniverseFile::write(&config.data_file, &universe, config.target_size)?;
    println!("regenerated universe at {}", config.data_file.display());
    println!("{}", universe.stats());
    println!("file: {} bytes, sha256 {}", header.file_len, header.payload_sha256);
    Ok(())
}

fn one_shot(config: &AppConfig, cmd: Command) -> anyhow::Result<()> {
    let mut navigator = Navigator::new(Arc::new(load(config)?));
    let reply = navigator.execute(cmd)?;
    println!("{reply}");
    Ok(())
}

fn repl(universe: Arc<Universe>) -> anyhow::Result<()> {
    let mut navigator = Navigator::new(universe);
    let mut input = std::io::stdin().lock();
    let mut stdout = std::io::stdout();
    let mut buf = Vec::new();
    println!("cosmos navigator; type `help` for commands");

    loop {
        let here = navigator
            .location()
            .map_or_else(|| "/".to_string(), |c| c.to_string());
        write!(stdout, "cosmos:{here}> ")?;
        stdout.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            println!();
            return Ok(());
        }
        match repl_step(&mut navigator, &buf) {
            Step::Quit => return Ok(()),
            Step::Skip => {}
            Step::Print(text) => println!("{text}"),
        }
    }
}

enum Step {
    Quit,
    Skip,
    Print(String),
}

/// Handle one raw input line. Errors are printed; only `quit` ends the session.
fn repl_step(navigator: &mut Navigator, raw: &[u8]) -> Step {
    let Ok(line) = std::str::from_utf8(raw) else {
        return Step::Print("error: line is not valid UTF-8".into());
    };
    if line.trim().is_empty() {
        return Step::Skip;
    }
    match navigator.run_line(line) {
        Ok(Reply::Bye) => Step::Quit,
        Ok(reply) => Step::Print(reply.to_string()),
        Err(e) => Step::Print(format!("error: {e}")),
    }
}
