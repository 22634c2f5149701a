//! Face orientation capture: replays a pose trace through the capture flow and
//! optionally submits the result to the registration service.

use anyhow::{bail, Context, Result};
use clap::Parser;
use face_orientation_capture::{
    app::CaptureApp,
    config::{Config, EXAMPLE_CONFIG},
    estimator::shared_model,
    pose::PoseTarget,
    registration::{HttpRegistrationClient, RegistrationClient},
    trace::{PoseTrace, TraceCamera, TraceEstimator},
};
use log::{info, warn};
use std::{sync::Arc, time::Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Pose trace to replay (YAML); defaults to a built-in tour of all five poses
    #[arg(short, long)]
    trace: Option<String>,

    /// Hold per pose for the built-in tour, in milliseconds
    #[arg(long, default_value = "4000")]
    hold_ms: u64,

    /// User identifier sent with the registration
    #[arg(short, long)]
    user_id: Option<String>,

    /// Registration service base URL (overrides the config file)
    #[arg(short, long)]
    server: Option<String>,

    /// Submit the captured images once all poses are done
    #[arg(long)]
    submit: bool,

    /// Query the registration service health and exit
    #[arg(long)]
    health: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Face Orientation Capture");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(server) = args.server {
        config.registration.base_url = server;
    }

    let client = HttpRegistrationClient::new(&config.registration);

    if args.health {
        let health = client.health().context("Health check failed")?;
        println!(
            "{}: {}{}",
            client.base_url(),
            health.status,
            health.timestamp.as_deref().map(|t| format!(" ({t})")).unwrap_or_default()
        );
        if !health.is_healthy() {
            bail!("Registration service reports '{}'", health.status);
        }
        return Ok(());
    }

    if args.submit && args.user_id.is_none() {
        bail!("--submit requires --user-id");
    }

    let trace = match &args.trace {
        Some(path) => {
            info!("Replaying pose trace from: {}", path);
            PoseTrace::from_file(path).with_context(|| format!("Failed to load trace '{path}'"))?
        }
        None => PoseTrace::orientation_tour(Duration::from_millis(args.hold_ms)),
    };
    let trace = Arc::new(trace);

    let model = {
        let trace = Arc::clone(&trace);
        shared_model(move || Arc::new(TraceEstimator::new(trace)))
    };
    let mut app = CaptureApp::new(config, model)?;
    let summary = app.run(Box::new(TraceCamera::new(Arc::clone(&trace))))?;

    let captured: Vec<_> = summary.captured.iter().map(|d| d.as_str()).collect();
    println!(
        "Captured [{}] from {} frames in {:.1}s",
        captured.join(", "),
        summary.frames,
        summary.stream_time.as_secs_f64()
    );

    let state = app.orchestrator().state();
    if state != PoseTarget::Completed {
        bail!("Capture stopped in state {state}; hold each pose longer or check the trace");
    }

    if let (true, Some(user_id)) = (args.submit, args.user_id.as_deref()) {
        let response = app.confirm(&client, user_id).context("Registration failed")?;
        println!(
            "Registered '{}': {}",
            user_id,
            response.message.unwrap_or(response.status)
        );
    }

    Ok(())
}
