//! Membrane Simulator X - Entry point
//!
//! Relaxes a vesicle from an ellipsoid (or sphere) under the Helfrich energy.
//!
//! CLI Usage:
//!   cargo run                                  # Default ellipsoid relaxation
//!   cargo run -- -p params.json -s 3 -t 50     # Custom parameters and schedule
//!   cargo run -- --sphere --verbosity 2        # Start from a sphere, print status

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use glam::DVec3;
use membrane_simulator_x::{
    config::{IntegratorConfig, Options, Parameters},
    export::{CsvStatusLog, JsonTrajectory, MultiSink},
    geometry::{ellipsoid, icosphere},
    physics::{System, TangentialRelaxation, VelocityVerlet},
};

/// Command line settings
struct Args {
    params_path: PathBuf,
    options_path: Option<PathBuf>,
    subdivisions: usize,
    sphere: bool,
    dt: f64,
    total_time: f64,
    save_period: f64,
    verbosity: usize,
    output_dir: PathBuf,
    relaxation: f64,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            params_path: PathBuf::from("membrane_parameters.json"),
            options_path: None,
            subdivisions: 3,
            sphere: false,
            dt: 1e-3,
            total_time: 10.0,
            save_period: 0.5,
            verbosity: 1,
            output_dir: PathBuf::from("output"),
            relaxation: 0.0,
        }
    }
}

/// Parse CLI arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "-p" | "--params" => {
                if let Some(v) = value {
                    parsed.params_path = PathBuf::from(v);
                }
                i += 1;
            }
            "--options" => {
                if let Some(v) = value {
                    parsed.options_path = Some(PathBuf::from(v));
                }
                i += 1;
            }
            "-s" | "--subdivisions" => {
                if let Some(v) = value {
                    parsed.subdivisions = v.parse().unwrap_or(3);
                }
                i += 1;
            }
            "--sphere" => parsed.sphere = true,
            "--dt" => {
                if let Some(v) = value {
                    parsed.dt = v.parse().unwrap_or(1e-3);
                }
                i += 1;
            }
            "-t" | "--total-time" => {
                if let Some(v) = value {
                    parsed.total_time = v.parse().unwrap_or(10.0);
                }
                i += 1;
            }
            "--save-period" => {
                if let Some(v) = value {
                    parsed.save_period = v.parse().unwrap_or(0.5);
                }
                i += 1;
            }
            "-v" | "--verbosity" => {
                if let Some(v) = value {
                    parsed.verbosity = v.parse().unwrap_or(1);
                }
                i += 1;
            }
            "-o" | "--output" => {
                if let Some(v) = value {
                    parsed.output_dir = PathBuf::from(v);
                }
                i += 1;
            }
            "--relax" => {
                if let Some(v) = value {
                    parsed.relaxation = v.parse().unwrap_or(0.0);
                }
                i += 1;
            }
            "--help" | "-h" => {
                println!("Membrane Simulator X");
                println!();
                println!("Usage: membrane-simulator-x [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --params FILE        Membrane parameters JSON (default: membrane_parameters.json)");
                println!("  --options FILE           Mode switches JSON");
                println!("  -s, --subdivisions N     Icosphere subdivisions (default: 3)");
                println!("  --sphere                 Start from a sphere instead of an ellipsoid");
                println!("  --dt DT                  Time step (default: 1e-3)");
                println!("  -t, --total-time T       Simulated time (default: 10)");
                println!("  --save-period T          Time between checkpoints (default: 0.5)");
                println!("  -v, --verbosity N        0 silent .. 3 full parameter dump (default: 1)");
                println!("  -o, --output DIR         Output directory (default: output)");
                println!("  --relax K                Tangential relaxation rate (default: 0)");
                println!("  --help, -h               Show this help");
                std::process::exit(0);
            }
            other => log::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    parsed
}

fn load_options(path: Option<&PathBuf>) -> Result<Options> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        }
        None => Ok(Options::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args();
    log::info!("Membrane Simulator X starting...");

    let params = Parameters::load_or_default(&args.params_path);
    let options = load_options(args.options_path.as_ref())?;

    let (mesh, positions) = if args.sphere {
        icosphere(1.0, args.subdivisions)?
    } else {
        ellipsoid(DVec3::new(1.2, 1.0, 0.8), args.subdivisions)?
    };
    println!(
        "Mesh: {} vertices, {} edges, {} faces",
        mesh.n_vertices(),
        mesh.n_edges(),
        mesh.n_faces()
    );

    let mut system = System::new(mesh, positions, params, options)?;
    println!(
        "Initial area: {:.4}, volume: {:.4}, reduced volume: {:.4}",
        system.scalars.surface_area,
        system.scalars.volume,
        system.scalars.reduced_volume()
    );

    let config = IntegratorConfig {
        dt: args.dt,
        total_time: args.total_time,
        save_period: args.save_period,
        verbosity: args.verbosity,
        output_dir: args.output_dir.clone(),
        ..Default::default()
    };

    let mut sink = MultiSink::new();
    sink.push(Box::new(JsonTrajectory::new(
        &config.output_dir,
        config.frames_per_file(),
    )?));
    sink.push(Box::new(CsvStatusLog::new(&config.output_dir)?));

    let mut integrator = VelocityVerlet::new(config)
        .with_regularizer(Box::new(TangentialRelaxation::new(args.relaxation)));

    let start_time = Instant::now();
    let report = integrator.integrate(&mut system, &mut sink)?;
    let elapsed = start_time.elapsed();

    println!("\n=== Results ===");
    println!("Outcome: {:?}", report.outcome);
    println!("Steps: {}, simulated time: {:.4}", report.steps, report.time);
    println!("Elapsed time: {:.2?}", elapsed);
    println!("Frames written: {}", report.frames);
    println!("Final |F|: {:.4e}", report.final_l2_norm);
    println!(
        "Energy: total {:.6}, bending {:.6}, surface {:.6}, pressure {:.6}",
        report.energy.total, report.energy.bending, report.energy.surface, report.energy.pressure
    );
    println!(
        "Final area: {:.4}, volume: {:.4}, reduced volume: {:.4}",
        system.scalars.surface_area,
        system.scalars.volume,
        system.scalars.reduced_volume()
    );

    Ok(())
}
