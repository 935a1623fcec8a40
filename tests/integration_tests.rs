//! End-to-end runs through the integrator and the export sinks.

use glam::DVec3;
use membrane_simulator_x::{
    config::{IntegratorConfig, Options, Parameters, PressureMode},
    export::{CsvStatusLog, JsonTrajectory, MemorySink, MultiSink},
    geometry::{icosphere, spherical_cap},
    physics::{System, TangentialRelaxation, Termination, VelocityVerlet},
};

fn files_with_prefix(dir: &std::path::Path, prefix: &str) -> Vec<std::path::PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix))
        })
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_run_writes_trajectory_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let (mesh, positions) = icosphere(1.0, 1).unwrap();
    let mut system =
        System::new(mesh, positions, Parameters::default(), Options::default()).unwrap();

    let config = IntegratorConfig {
        dt: 0.01,
        total_time: 0.1,
        tolerance: 0.0,
        save_period: 0.01,
        rollover_period: 0.03,
        verbosity: 0,
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let mut sink = MultiSink::new();
    sink.push(Box::new(
        JsonTrajectory::new(&config.output_dir, config.frames_per_file()).unwrap(),
    ));
    sink.push(Box::new(CsvStatusLog::new(&config.output_dir).unwrap()));

    let report = VelocityVerlet::new(config)
        .integrate(&mut system, &mut sink)
        .unwrap();
    assert_eq!(report.outcome, Termination::ScheduleExhausted);
    // One frame per step, the final step included
    assert_eq!(report.frames, 11);

    let trajectories = files_with_prefix(dir.path(), "trajectory_");
    assert_eq!(trajectories.len(), 4);
    let lines: usize = trajectories
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap().lines().count())
        .sum();
    assert_eq!(lines, 11);

    let last_file = std::fs::read_to_string(trajectories.last().unwrap()).unwrap();
    let last: serde_json::Value =
        serde_json::from_str(last_file.lines().last().unwrap()).unwrap();
    assert_eq!(last["index"], 10);
    assert_eq!(last["positions"].as_array().unwrap().len(), 42);

    let status = files_with_prefix(dir.path(), "status_");
    assert_eq!(status.len(), 1);
    let mut reader = csv::Reader::from_path(&status[0]).unwrap();
    assert_eq!(reader.records().count(), 11);
}

#[test]
fn test_open_patch_with_all_terms_stays_finite() {
    let (mesh, positions) = spherical_cap(1.0, 1.0, 5, 16).unwrap();
    let params = Parameters {
        bending_modulus: 0.1,
        spontaneous_curvature: 1.0,
        line_tension: 0.01,
        external_force: 0.05,
        domain_radius: 0.4,
        temperature: 0.01,
        ..Default::default()
    };
    let options = Options {
        is_local_curvature: true,
        is_vertex_shift: true,
        ..Default::default()
    };
    let mut system = System::new(mesh, positions, params, options).unwrap();
    assert_eq!(system.options.pressure_mode, PressureMode::Open);
    assert!(system.line_tension.iter().any(|&eta| eta > 0.0));

    let config = IntegratorConfig {
        dt: 1e-3,
        total_time: 0.02,
        tolerance: 0.0,
        save_period: 0.005,
        verbosity: 2,
        ..Default::default()
    };
    let mut sink = MemorySink::default();
    let report = VelocityVerlet::new(config)
        .with_regularizer(Box::new(TangentialRelaxation::new(0.1)))
        .integrate(&mut system, &mut sink)
        .unwrap();

    assert_eq!(report.outcome, Termination::ScheduleExhausted);
    assert!(system.fields.positions.iter().all(|p| p.is_finite()));
    assert!(sink.energies.iter().all(|e| e.total.is_finite()));
    assert!(sink.energies.iter().any(|e| e.line > 0.0));
    assert!(sink.energies.iter().any(|e| e.external != 0.0));
}

#[test]
fn test_protein_binding_raises_density() {
    let (mesh, positions) = icosphere(1.0, 2).unwrap();
    let params = Parameters {
        spontaneous_curvature: 1.0,
        protein_binding: -0.1,
        protein_mobility: 1.0,
        ..Default::default()
    };
    let options = Options {
        is_protein: true,
        ..Default::default()
    };
    let mut system = System::new(mesh, positions, params, options).unwrap();

    let config = IntegratorConfig {
        dt: 0.01,
        total_time: 0.1,
        tolerance: 0.0,
        save_period: 0.05,
        verbosity: 0,
        ..Default::default()
    };
    VelocityVerlet::new(config)
        .integrate(&mut system, &mut MemorySink::default())
        .unwrap();

    assert!(system.fields.protein_density.iter().all(|&phi| phi > 1.0));
    // H0(φ) stays below its maximum on either side of φ = 1
    assert!(system
        .fields
        .spontaneous_curvature
        .iter()
        .all(|&h0| h0 <= 1.0 + 1e-12));
}

#[test]
fn test_rigid_translation_is_force_free() {
    let (mesh, positions) = icosphere(1.0, 2).unwrap();
    let offset = DVec3::new(3.0, -1.0, 2.0);
    let shifted: Vec<DVec3> = positions.iter().map(|p| *p + offset).collect();

    let mut reference =
        System::new(mesh.clone(), positions, Parameters::default(), Options::default()).unwrap();
    let mut moved = System::new(mesh, shifted, Parameters::default(), Options::default()).unwrap();
    reference.compute_fundamental_three_forces();
    moved.compute_fundamental_three_forces();

    for (a, b) in reference.forces.bending.iter().zip(&moved.forces.bending) {
        assert!((*a - *b).length() < 1e-10);
    }
    for (a, b) in reference.forces.capillary.iter().zip(&moved.forces.capillary) {
        assert!((*a - *b).length() < 1e-10);
    }
}
