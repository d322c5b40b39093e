use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use netviz_core::animation::{AnimationController, SimulatedScheduler};
use netviz_core::chart;
use netviz_core::client::{Backend, HttpBackend, PollOutcome, Poller};
use netviz_core::config::VizConfig;
use netviz_core::history::TrainingHistory;
use netviz_core::renderer::{self, NetworkDiagramRenderer, RenderOutcome, RenderRequest};
use netviz_core::replay;
use netviz_core::snapshot::Snapshot;
use netviz_core::status::{SessionData, TrainRequest};
use netviz_core::surface::SvgSurface;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netviz", about = "Render and watch a small feedforward network")]
struct Cli {
    /// JSON config file; missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `poll.base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Canvas {
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    show_weights: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render a snapshot JSON file to SVG.
    Render {
        snapshot: PathBuf,
        #[arg(short, long, default_value = "network.svg")]
        out: PathBuf,
        #[arg(long)]
        epoch: Option<u32>,
        /// Comma-separated input activations, e.g. `0.8,-0.2`.
        #[arg(long, value_delimiter = ',')]
        inputs: Option<Vec<f64>>,
        #[command(flatten)]
        canvas: Canvas,
    },
    /// Poll the backend and keep `network.svg` and `history.svg` current.
    Watch {
        #[arg(short, long, default_value = "watch")]
        out_dir: PathBuf,
        /// Stop after this many polls.
        #[arg(long)]
        max_polls: Option<usize>,
        /// Stop once the backend reports training has finished.
        #[arg(long)]
        until_done: bool,
        #[command(flatten)]
        canvas: Canvas,
    },
    /// Render particle-animation frames for a snapshot.
    Animate {
        snapshot: PathBuf,
        #[arg(short, long, default_value = "frames")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
        /// Defaults to a random seed.
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        canvas: Canvas,
    },
    /// Render one frame per epoch of a recorded session.
    Replay {
        /// Session id to fetch from the backend.
        #[arg(long, conflicts_with = "file")]
        session: Option<String>,
        /// Session JSON file.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(short, long, default_value = "replay")]
        out_dir: PathBuf,
        #[command(flatten)]
        canvas: Canvas,
    },
    /// List recorded sessions.
    Sessions,
    /// Start a training run on the backend.
    Train {
        #[arg(long, default_value_t = 0.1)]
        learning_rate: f64,
        #[arg(long, default_value_t = 100)]
        epochs: u32,
    },
    /// Ask the backend to save the current model.
    Export,
}

fn load_config(cli: &Cli) -> Result<VizConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            VizConfig::from_json_str(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => VizConfig::default(),
    };
    if let Some(url) = &cli.base_url {
        config.poll.base_url = url.clone();
    }
    Ok(config)
}

fn apply_canvas(config: &mut VizConfig, canvas: &Canvas) -> Result<()> {
    if let Some(w) = canvas.width {
        config.width = w;
    }
    if let Some(h) = canvas.height {
        config.height = h;
    }
    config.show_weights_on_arrows |= canvas.show_weights;
    config.validate().context("invalid configuration")?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn report(outcome: &RenderOutcome, path: &Path) {
    match outcome {
        RenderOutcome::Drawn {
            neurons,
            connections,
        } => info!(neurons, connections, path = %path.display(), "rendered network"),
        RenderOutcome::Diagnostic(d) => {
            warn!(reason = %d.message, path = %path.display(), "rendered diagnostic")
        }
    }
}

fn render(
    config: &VizConfig,
    snapshot_path: &Path,
    out: &Path,
    epoch: Option<u32>,
    inputs: Option<Vec<f64>>,
) -> Result<()> {
    let snapshot: Snapshot = read_json(snapshot_path)?;
    let request = RenderRequest {
        epoch,
        input_values: inputs,
        ..RenderRequest::new(snapshot, config.width, config.height)
    };
    let (outcome, svg) = renderer::render_svg(&request, config);
    write_file(out, &svg)?;
    report(&outcome, out);
    if let RenderOutcome::Diagnostic(d) = outcome {
        bail!("snapshot could not be drawn: {}", d.message);
    }
    Ok(())
}

fn watch(
    config: &VizConfig,
    out_dir: &Path,
    max_polls: Option<usize>,
    until_done: bool,
) -> Result<()> {
    let backend = HttpBackend::new(&config.poll);
    let mut poller = Poller::new(&config.poll);
    let mut history = TrainingHistory::new();
    let surface = SvgSurface::new(config.width, config.height)
        .with_font_family(config.style.font_family.clone());
    let mut diagram = NetworkDiagramRenderer::try_new(surface, config.clone())?;
    let mut chart_surface = SvgSurface::new(config.width, config.height / 2.0);
    let network_path = out_dir.join("network.svg");
    let chart_path = out_dir.join("history.svg");

    info!(base_url = backend.base_url(), "watching training status");
    let mut polls = 0;
    loop {
        polls += 1;
        if let PollOutcome::Updated(status) = poller.poll(&backend) {
            if history.record_status(&status) {
                chart::draw_training_chart(&mut chart_surface, &history, &config.style);
                write_file(&chart_path, &chart_surface.to_svg())?;
            }
            if status.has_parameters() {
                let request = RenderRequest {
                    epoch: Some(status.epoch),
                    ..RenderRequest::new(status.snapshot(), config.width, config.height)
                };
                let outcome = diagram.render(&request);
                write_file(&network_path, &diagram.surface().to_svg())?;
                report(&outcome, &network_path);
            }
            info!(
                epoch = status.epoch,
                total = status.total_epochs,
                loss = status.loss,
                accuracy = status.accuracy,
                "training status"
            );
            if until_done && !status.is_training && status.epoch > 0 {
                break;
            }
        }
        if max_polls.is_some_and(|max| polls >= max) {
            break;
        }
        thread::sleep(poller.next_delay());
    }
    Ok(())
}

fn animate(
    config: &VizConfig,
    snapshot_path: &Path,
    out_dir: &Path,
    duration: Duration,
    seed: u64,
) -> Result<()> {
    let snapshot: Snapshot = read_json(snapshot_path)?;
    let surface = SvgSurface::new(config.width, config.height)
        .with_font_family(config.style.font_family.clone());
    let mut diagram = NetworkDiagramRenderer::try_new(surface, config.clone())?;
    let outcome = diagram.render(&RenderRequest::new(snapshot, config.width, config.height));
    if let RenderOutcome::Diagnostic(d) = outcome {
        bail!("snapshot could not be drawn: {}", d.message);
    }

    let animation = netviz_core::animation::AnimationConfig {
        seed,
        ..config.animation.clone()
    };
    let scheduler = SimulatedScheduler::new(Duration::from_millis(animation.frame_interval_ms));
    let mut controller = AnimationController::try_new(scheduler, animation)?;
    controller.start();

    let mut frames = Vec::new();
    if let Some(ctx) = diagram.frame_context() {
        controller.advance(
            duration,
            ctx.graph,
            ctx.style,
            ctx.options,
            ctx.surface,
            |surface: &SvgSurface| frames.push(surface.to_svg()),
        );
        controller.stop(ctx.graph, ctx.style, ctx.options, ctx.surface);
    }

    for (i, svg) in frames.iter().enumerate() {
        write_file(&out_dir.join(format!("frame_{i:05}.svg")), svg)?;
    }
    info!(frames = frames.len(), seed, dir = %out_dir.display(), "wrote animation frames");
    Ok(())
}

fn replay_session(config: &VizConfig, session: SessionData, out_dir: &Path) -> Result<()> {
    let frames = replay::render_session(&session, config);
    if frames.is_empty() {
        bail!("session {} has no recorded epochs", session.session_id);
    }
    for frame in &frames {
        write_file(&out_dir.join(frame.file_name()), &frame.svg)?;
        if let RenderOutcome::Diagnostic(d) = &frame.outcome {
            warn!(epoch = frame.epoch, reason = %d.message, "epoch could not be drawn");
        }
    }

    let history = TrainingHistory::from_session(&session);
    let mut chart_surface = SvgSurface::new(config.width, config.height / 2.0);
    chart::draw_training_chart(&mut chart_surface, &history, &config.style);
    write_file(&out_dir.join("history.svg"), &chart_surface.to_svg())?;
    info!(
        session = %session.session_id,
        frames = frames.len(),
        dir = %out_dir.display(),
        "replay written"
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("netviz_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Render {
            snapshot,
            out,
            epoch,
            inputs,
            canvas,
        } => {
            apply_canvas(&mut config, &canvas)?;
            render(&config, &snapshot, &out, epoch, inputs)
        }
        Command::Watch {
            out_dir,
            max_polls,
            until_done,
            canvas,
        } => {
            apply_canvas(&mut config, &canvas)?;
            watch(&config, &out_dir, max_polls, until_done)
        }
        Command::Animate {
            snapshot,
            out_dir,
            duration_ms,
            seed,
            canvas,
        } => {
            apply_canvas(&mut config, &canvas)?;
            let seed = seed.unwrap_or_else(rand::random);
            animate(
                &config,
                &snapshot,
                &out_dir,
                Duration::from_millis(duration_ms),
                seed,
            )
        }
        Command::Replay {
            session,
            file,
            out_dir,
            canvas,
        } => {
            apply_canvas(&mut config, &canvas)?;
            let data = match (session, file) {
                (_, Some(path)) => read_json(&path)?,
                (Some(id), None) => HttpBackend::new(&config.poll)
                    .replay_session(&id)
                    .with_context(|| format!("fetching session {id}"))?,
                (None, None) => bail!("pass --session <id> or --file <path>"),
            };
            replay_session(&config, data, &out_dir)
        }
        Command::Sessions => {
            config.validate().context("invalid configuration")?;
            let sessions = HttpBackend::new(&config.poll)
                .sessions()
                .context("listing sessions")?;
            for s in sessions {
                println!(
                    "{}\tlr={}\tepochs={}\t{}",
                    s.session_id, s.hyperparameters.learning_rate, s.hyperparameters.epochs, s.timestamp
                );
            }
            Ok(())
        }
        Command::Train {
            learning_rate,
            epochs,
        } => {
            if !(learning_rate.is_finite() && learning_rate > 0.0) || epochs == 0 {
                bail!("learning rate and epochs must be positive");
            }
            let response = HttpBackend::new(&config.poll)
                .start_training(&TrainRequest {
                    learning_rate,
                    epochs,
                })
                .context("starting training")?;
            println!("{}", response.message);
            if let Some(id) = response.session_id {
                println!("session: {id}");
            }
            Ok(())
        }
        Command::Export => {
            let export = HttpBackend::new(&config.poll)
                .save_model()
                .context("saving model")?;
            println!("{} -> {}{}", export.filename, config.poll.base_url, export.download_url);
            Ok(())
        }
    }
}
