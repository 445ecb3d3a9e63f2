// src/main.rs - Plan pen paths from a JSON file and print the resulting blocks
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use plotter_rs::motion::{StepMove, StepSlicer, StepTransport};
use plotter_rs::{load_config, Config, Drawing, MotionError, Plan, PlannerConfig, Vec2d};

/// Plotter trajectory planner CLI
#[derive(Parser, Debug)]
#[command(name = "plotter-plan", about = "Plan time-parameterized plotter trajectories for pen paths.")]
struct Cli {
    /// JSON file holding an array of strokes, each an array of [x, y] points
    paths: PathBuf,

    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the planner acceleration (units/s²)
    #[arg(long)]
    acceleration: Option<f64>,

    /// Override the cornering deviation factor
    #[arg(long)]
    corner_factor: Option<f64>,

    /// Log every planner decision
    #[arg(long)]
    debug: bool,

    /// Print plans as JSON instead of one line per block
    #[arg(long)]
    json: bool,

    /// Slice plans into stepper moves and stream them to a dry-run transport
    #[arg(long)]
    steps: bool,
}

/// Transport that only logs the moves it receives
#[derive(Debug, Default)]
struct DryRunTransport {
    sent: usize,
}

impl StepTransport for DryRunTransport {
    fn stepper_move(&mut self, mv: &StepMove) -> Result<String, MotionError> {
        self.sent += 1;
        tracing::debug!(
            "SM,{},{},{}",
            mv.duration_ms,
            mv.steps_x,
            mv.steps_y
        );
        Ok("OK".to_string())
    }
}

#[derive(Serialize)]
struct PathReport<'a> {
    index: usize,
    pen_up: bool,
    plan: Option<&'a Plan>,
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(&path.to_string_lossy())?
        }
        None => Config::default(),
    };
    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        return Err(Box::new(e));
    }

    let mut planner_config = PlannerConfig::new_from_config(&config);
    planner_config.debug = cli.debug;
    if let Some(acceleration) = cli.acceleration {
        planner_config.acceleration = acceleration;
    }
    if let Some(corner_factor) = cli.corner_factor {
        planner_config.corner_factor = corner_factor;
    }
    tracing::info!(
        "Max velocity: {} units/s, acceleration: {} units/s², corner factor: {}",
        planner_config.max_velocity,
        planner_config.acceleration,
        planner_config.corner_factor
    );

    let contents = std::fs::read_to_string(&cli.paths).map_err(|e| {
        tracing::error!("Failed to read paths file '{}': {}", cli.paths.display(), e);
        e
    })?;
    let strokes: Vec<Vec<Vec2d>> = serde_json::from_str(&contents)?;
    let drawing = Drawing::new(strokes);
    let plans = drawing.plan_all(&planner_config);

    if cli.json {
        let reports: Vec<PathReport> = plans
            .iter()
            .map(|p| PathReport {
                index: p.index,
                pen_up: p.pen_up,
                plan: p.result.as_ref().ok(),
                error: p.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for path_plan in &plans {
            let plan = match &path_plan.result {
                Ok(plan) => plan,
                Err(e) => {
                    println!("{}: error: {}", path_plan.index, e);
                    continue;
                }
            };
            for (j, block) in plan.blocks.iter().enumerate() {
                println!(
                    "{}, {}: a={:.2}, t={:.2}, vi={:.2}, p1={}, p2={}",
                    path_plan.index,
                    j,
                    block.acceleration,
                    block.duration,
                    block.start_velocity,
                    block.start_point,
                    block.end_point
                );
            }
        }
    }

    if cli.steps {
        let slicer = StepSlicer::new_from_config(&config);
        let mut transport = DryRunTransport::default();
        for plan in plans.iter().filter_map(|p| p.result.as_ref().ok()) {
            slicer.stream(plan, &mut transport)?;
        }
        tracing::info!("Streamed {} stepper moves", transport.sent);
    }

    let stats = drawing.stats();
    let failed = plans.iter().filter(|p| p.result.is_err()).count();
    tracing::info!(
        "Planned {} paths ({} failed): pen down {:.3}, pen up {:.3}",
        plans.len(),
        failed,
        stats.down_length,
        stats.up_length
    );
    Ok(())
}
