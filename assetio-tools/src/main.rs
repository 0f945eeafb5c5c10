use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use structopt::StructOpt;

use assetio::archive::ZipAssets;
use assetio::vfs::Fs;
use assetio::{AccessHint, Advice, AssetProvider, ProviderConfig};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "assetio-tools",
    about = "Inspect and extract assets from application packages."
)]
struct Opts {
    #[structopt(long, parse(from_os_str), help = "JSON provider configuration")]
    config: Option<PathBuf>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "List assets in a package or directory")]
    List {
        #[structopt(parse(from_os_str))]
        package: PathBuf,
    },

    #[structopt(about = "Print the size and backing of an asset")]
    Info {
        #[structopt(parse(from_os_str))]
        package: PathBuf,

        name: String,

        #[structopt(long, default_value = "unspecified", parse(try_from_str = parse_hint))]
        hint: AccessHint,
    },

    #[structopt(about = "Write an asset to stdout")]
    Cat {
        #[structopt(parse(from_os_str))]
        package: PathBuf,

        name: String,

        #[structopt(long, default_value = "sequential", parse(try_from_str = parse_hint))]
        hint: AccessHint,

        #[structopt(long, parse(try_from_str = parse_advice))]
        advise: Option<Advice>,
    },
}

impl Command {
    fn package(&self) -> &Path {
        match self {
            Command::List { package } => package,
            Command::Info { package, .. } => package,
            Command::Cat { package, .. } => package,
        }
    }
}

fn parse_hint(s: &str) -> Result<AccessHint, String> {
    s.parse()
        .map_err(|_| format!("unknown access hint '{}' (sequential, random, all, unspecified)", s))
}

fn parse_advice(s: &str) -> Result<Advice, String> {
    s.parse().map_err(|_| {
        format!(
            "unknown advice '{}' (normal, sequential, random, willneed, dontneed)",
            s
        )
    })
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ProviderConfig> {
    let path = match path {
        Some(v) => v,
        None => return Ok(ProviderConfig::default()),
    };

    let file = std::fs::File::open(path)
        .with_context(|| format!("opening config {}", path.display()))?;
    ProviderConfig::from_reader(file).with_context(|| format!("parsing config {}", path.display()))
}

fn run<P: AssetProvider, W: Write>(
    provider: &P,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::List { .. } => {
            for name in provider.list()? {
                writeln!(out, "{}", name)?;
            }
        }
        Command::Info { name, hint, .. } => {
            let asset = provider.open_asset(&name, hint)?;
            writeln!(out, "name:   {}", name)?;
            writeln!(out, "size:   {}", asset.size())?;
            writeln!(out, "mapped: {}", asset.is_mapped())?;
        }
        Command::Cat {
            name, hint, advise, ..
        } => {
            let mut asset = provider.open_asset(&name, hint)?;
            if let Some(advice) = advise {
                asset.advise(0, 0, advice);
            }
            log::debug!("{} is mapped: {}", name, asset.is_mapped());

            io::copy(&mut asset, out).with_context(|| format!("copying {}", name))?;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts = Opts::from_args();
    let config = load_config(opts.config.as_deref())?;
    let package = opts.command.package().to_path_buf();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if package.is_dir() {
        run(&Fs::new(&package, config), opts.command, &mut out)
    } else {
        let assets = ZipAssets::open(&package, config)
            .with_context(|| format!("opening package {}", package.display()))?;
        run(&assets, opts.command, &mut out)
    }
}
