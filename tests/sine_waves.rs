// tests/sine_waves.rs
use approx::assert_relative_eq;
use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::io::Write;
use std::rc::Rc;
use tensegrity_robot::presets::{self, MUSCLE_TAG};
use tensegrity_robot::{
    BuildSpec, Builder, CableConfig, ControlMode, PointMassWorld, SineWaveConfig, SineWaveController,
    Structure, TensegrityError, TensegrityModel,
};

fn config(json: &str) -> SineWaveConfig {
    SineWaveConfig::from_json_str(json).unwrap()
}

fn single_cable_model() -> TensegrityModel {
    let mut s = Structure::new();
    s.add_point(0.0, 0.0, 0.0);
    s.add_point(10.0, 0.0, 0.0);
    s.add_pair(0, 1, MUSCLE_TAG).unwrap();
    let cable = CableConfig::new(100.0, 0.0, 0.0).with_limits(500.0, 2.0);
    let spec = BuildSpec::new().with_builder(MUSCLE_TAG, Builder::cable(cable)).unwrap();
    TensegrityModel::new(s, spec)
}

#[test]
fn test_target_follows_sine() {
    let c = config(
        r#"{
            "sin_amplitude": [5.0],
            "sin_frequency": [1.0],
            "sin_phase_offset": [0.0],
            "sin_position_offset": [10.0],
            "updateFrequency": 10.0
        }"#,
    );

    assert_eq!(c.channels(), 1);
    assert_relative_eq!(c.target_at(0, 0.0).unwrap(), 10.0);
    assert_relative_eq!(c.target_at(0, FRAC_PI_2).unwrap(), 15.0, epsilon = 1e-5);
    assert!(c.target_at(1, 0.0).is_none());
}

#[test]
fn test_missing_key_is_a_json_error() {
    let err = SineWaveConfig::from_json_str(
        r#"{ "sin_amplitude": [1.0], "sin_frequency": [1.0], "sin_phase_offset": [0.0], "updateFrequency": 5.0 }"#,
    )
    .unwrap_err();

    assert!(matches!(err, TensegrityError::Json(_)));
    assert!(err.is_configuration());
}

#[test]
fn test_unequal_lengths_are_rejected() {
    let err = SineWaveConfig::from_json_str(
        r#"{
            "sin_amplitude": [1.0, 2.0],
            "sin_frequency": [1.0],
            "sin_phase_offset": [0.0, 0.0],
            "sin_position_offset": [0.0, 0.0],
            "updateFrequency": 5.0
        }"#,
    )
    .unwrap_err();

    assert!(matches!(err, TensegrityError::ControlConfig(ref msg) if msg.contains("sin_frequency")));
}

#[test]
fn test_non_positive_update_frequency_is_rejected() {
    let err = SineWaveConfig::from_json_str(
        r#"{
            "sin_amplitude": [1.0],
            "sin_frequency": [1.0],
            "sin_phase_offset": [0.0],
            "sin_position_offset": [0.0],
            "updateFrequency": 0.0
        }"#,
    )
    .unwrap_err();

    assert!(matches!(err, TensegrityError::ControlConfig(_)));
}

#[test]
fn test_controller_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"sin_amplitude":[1,2],"sin_frequency":[3,4],"sin_phase_offset":[0,0],"sin_position_offset":[5,6],"updateFrequency":100}}"#
    )
    .unwrap();
    file.flush().unwrap();

    let controller = SineWaveController::from_path(file.path()).unwrap();

    assert_eq!(controller.config().channels(), 2);
    assert_eq!(controller.config().frequency, vec![3.0f32, 4.0]);
    assert_eq!(controller.config().update_frequency, 100.0);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SineWaveController::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, TensegrityError::Io(_)));
}

#[test]
fn test_targets_apply_only_at_update_cadence() {
    // Constant target of 8 at 10 Hz, stepped every 0.03 s.
    let c = config(
        r#"{
            "sin_amplitude": [0.0],
            "sin_frequency": [1.0],
            "sin_phase_offset": [0.0],
            "sin_position_offset": [8.0],
            "updateFrequency": 10.0
        }"#,
    );
    let sine = Rc::new(RefCell::new(SineWaveController::with_mode(c, ControlMode::RestLength)));
    let mut model = single_cable_model();
    model.attach(&sine).unwrap();
    let mut world = PointMassWorld::default();
    model.setup(&mut world).unwrap();

    for _ in 0..3 {
        model.step(&mut world, 0.03).unwrap();
    }
    assert_eq!(model.tree().unwrap().actuators()[0].rest_length(), 10.0);

    // The fourth step crosses 0.1 s; the motor gets all 0.12 s of travel.
    model.step(&mut world, 0.03).unwrap();
    assert_relative_eq!(model.tree().unwrap().actuators()[0].rest_length(), 9.76, epsilon = 1e-4);
    assert_relative_eq!(sine.borrow().sim_time(), 0.12, epsilon = 1e-5);
    assert_eq!(sine.borrow().targets().to_vec(), vec![8.0f32]);
}

#[test]
fn test_fewer_channels_than_actuators_fails_setup() {
    let c = config(
        r#"{
            "sin_amplitude": [1.0],
            "sin_frequency": [1.0],
            "sin_phase_offset": [0.0],
            "sin_position_offset": [0.0],
            "updateFrequency": 10.0
        }"#,
    );
    let sine = Rc::new(RefCell::new(SineWaveController::new(c)));
    let (structure, spec) = presets::planar_two_bar().unwrap();
    let mut model = TensegrityModel::new(structure, spec);
    model.attach(&sine).unwrap();
    let mut world = PointMassWorld::default();

    let err = model.setup(&mut world).unwrap_err();

    assert!(matches!(
        err,
        TensegrityError::ActuatorCountMismatch {
            configured: 1,
            actuators: 4
        }
    ));
    model.teardown(&mut world).unwrap();
    assert_eq!(world.body_count(), 0);
}

#[test]
fn test_extra_channels_are_ignored_and_teardown_clears_state() {
    let c = config(
        r#"{
            "sin_amplitude": [1.0, 1.0],
            "sin_frequency": [1.0, 1.0],
            "sin_phase_offset": [0.0, 0.0],
            "sin_position_offset": [50.0, 50.0],
            "updateFrequency": 100.0
        }"#,
    );
    let sine = Rc::new(RefCell::new(SineWaveController::new(c)));
    let mut model = single_cable_model();
    model.attach(&sine).unwrap();
    let mut world = PointMassWorld::default();
    model.setup(&mut world).unwrap();

    assert_eq!(sine.borrow().controlled(), 1);
    assert_eq!(sine.borrow().targets().len(), 1);
    for _ in 0..5 {
        model.step(&mut world, 0.01).unwrap();
    }
    assert!(model.tree().unwrap().actuators()[0].rest_length() < 10.0);

    model.teardown(&mut world).unwrap();
    assert_eq!(sine.borrow().controlled(), 0);
    assert!(sine.borrow().targets().is_empty());
}
