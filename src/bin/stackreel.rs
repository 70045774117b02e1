use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use stackreel::scene::file::CONFIG_SUFFIX;
use stackreel::session::movie::render_movie;
use stackreel::session::panel::render_panel;
use stackreel::{
    ConfigFile, FfmpegEncoder, FolderSource, ImageSource, MovieJob, ReelError, RenderOpts, RunOpts,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stackreel")]
#[command(about = "Render multi-channel microscopy stacks into annotated videos", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every movie and panel of one configuration file.
    File {
        config: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Render every `*.reel.json` found below a directory.
    Folder {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Render only the movies of a configuration file; existing outputs are an error.
    Movie {
        config: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Render only the static panels of a configuration file.
    Panel {
        config: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Replace existing outputs.
    #[arg(long)]
    overwrite: bool,

    /// Paint only the first frame of each movie to `<output>.test.png`.
    #[arg(long)]
    test: bool,

    /// Render frames on one context instead of a worker pool.
    #[arg(long)]
    sequential: bool,

    /// Worker thread count (defaults to the CPU count).
    #[arg(long)]
    threads: Option<usize>,
}

impl RunArgs {
    fn opts(&self) -> RunOpts {
        RunOpts {
            overwrite: self.overwrite,
            test: self.test,
            render: RenderOpts {
                sequential: self.sequential,
                threads: self.threads,
            },
            cache_root: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Existing {
    Skip,
    Fail,
}

#[derive(Clone, Copy, Debug)]
struct Select {
    movies: bool,
    panels: bool,
}

const ALL: Select = Select {
    movies: true,
    panels: true,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::File { config, run } => {
            let cfg = load(&config)?;
            run_config(&cfg, &run.opts(), ALL, Existing::Skip)?;
        }
        Command::Folder { path, run } => {
            let opts = run.opts();
            let configs = find_configs(&path)
                .with_context(|| format!("search '{}' for configuration files", path.display()))?;
            if configs.is_empty() {
                tracing::warn!(dir = %path.display(), "no {CONFIG_SUFFIX} files found");
            }
            let mut failed = 0usize;
            for config in configs {
                let outcome =
                    load(&config).and_then(|cfg| run_config(&cfg, &opts, ALL, Existing::Skip));
                if let Err(e) = outcome {
                    let msg = format!("{e:#}");
                    tracing::error!(config = %config.display(), error = %msg, "config failed");
                    failed += 1;
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} configuration file(s) failed");
            }
        }
        Command::Movie { config, run } => {
            let cfg = load(&config)?;
            let select = Select {
                movies: true,
                panels: false,
            };
            run_config(&cfg, &run.opts(), select, Existing::Fail)?;
        }
        Command::Panel { config, run } => {
            let cfg = load(&config)?;
            let select = Select {
                movies: false,
                panels: true,
            };
            run_config(&cfg, &run.opts(), select, Existing::Skip)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load(path: &Path) -> anyhow::Result<ConfigFile> {
    ConfigFile::from_path(path).with_context(|| format!("load config '{}'", path.display()))
}

fn run_config(
    cfg: &ConfigFile,
    opts: &RunOpts,
    select: Select,
    existing: Existing,
) -> anyhow::Result<()> {
    if select.movies {
        for (i, def) in cfg.movies.iter().enumerate() {
            let out = cfg.movie_output(i);
            let source: Arc<dyn ImageSource> = Arc::new(
                FolderSource::open(&def.source)
                    .with_context(|| format!("open source '{}'", def.source.folder.display()))?,
            );
            let job = MovieJob {
                config: def.render.clone(),
                source,
                out_path: out.clone(),
                cache_dir: def.cache_dir.clone(),
                keep_cache: def.keep_cache,
                copyright: cfg.copyright.clone(),
            };
            let mut encoder = FfmpegEncoder::new();
            match render_movie(job, opts, &mut encoder) {
                Ok(report) => {
                    if report.stats.frames_failed > 0 {
                        eprintln!(
                            "{} frame(s) failed in {}: {:?}",
                            report.stats.frames_failed,
                            out.display(),
                            report.stats.failed
                        );
                    }
                    eprintln!("wrote {}", report.output.display());
                }
                Err(ReelError::AlreadyExists(path)) if existing == Existing::Skip => {
                    tracing::warn!(out = %path.display(), "output exists; skipping (use --overwrite)");
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("render movie '{}'", out.display()));
                }
            }
        }
    }

    if select.panels {
        for (i, def) in cfg.panels.iter().enumerate() {
            let out = cfg.panel_output(i);
            let source: Arc<dyn ImageSource> = Arc::new(
                FolderSource::open(&def.source)
                    .with_context(|| format!("open source '{}'", def.source.folder.display()))?,
            );
            match render_panel(def, source, &out, opts.overwrite) {
                Ok(written) => eprintln!("wrote {}", written.display()),
                Err(ReelError::AlreadyExists(path)) if existing == Existing::Skip => {
                    tracing::warn!(out = %path.display(), "output exists; skipping (use --overwrite)");
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("render panel '{}'", out.display()));
                }
            }
        }
    }

    Ok(())
}

/// Every configuration file below `dir`, sorted; directories named `bad*` are skipped.
fn find_configs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(d) = stack.pop() {
        for entry in std::fs::read_dir(&d)? {
            let path = entry?.path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if path.is_dir() {
                if !name.starts_with("bad") {
                    stack.push(path);
                }
            } else if name.ends_with(CONFIG_SUFFIX) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}
