// tests/control_law.rs
use approx::assert_relative_eq;
use rstest::rstest;
use std::cell::RefCell;
use std::rc::Rc;
use tensegrity_robot::presets::MUSCLE_TAG;
use tensegrity_robot::{
    ActuatorController, BuildSpec, Builder, CableConfig, ConstantTensionController, ControlMode,
    ModelTree, PointMassWorld, Structure, StructureCompiler, TensegrityError, TensegrityModel,
};

/// A 10 unit cable between two fixed points: k = 100, no damping,
/// 2 units/s motor speed, 500 N limit.
fn cable_config() -> CableConfig {
    CableConfig::new(100.0, 0.0, 0.0).with_limits(500.0, 2.0)
}

fn single_cable(config: CableConfig) -> (Structure, BuildSpec) {
    let mut s = Structure::new();
    s.add_point(0.0, 0.0, 0.0);
    s.add_point(10.0, 0.0, 0.0);
    s.add_pair(0, 1, MUSCLE_TAG).unwrap();
    let spec = BuildSpec::new().with_builder(MUSCLE_TAG, Builder::cable(config)).unwrap();
    (s, spec)
}

fn compile(config: CableConfig) -> (ModelTree, PointMassWorld) {
    let (s, spec) = single_cable(config);
    let mut world = PointMassWorld::default();
    let tree = StructureCompiler::new(&s, &spec).compile(&mut world).unwrap();
    (tree, world)
}

#[test]
fn test_rest_length_command_is_rate_limited() {
    let (mut tree, _world) = compile(cable_config());
    let cable = tree.actuators_mut().remove(0);
    let mut controller = ActuatorController::rest_length(10.0);

    let first = controller.control(cable, 0.5, 5.0).unwrap();
    let second = controller.control(cable, 0.5, 5.0).unwrap();

    assert_relative_eq!(first, 9.0, epsilon = 1e-5);
    assert_relative_eq!(second, 8.0, epsilon = 1e-5);
    assert_eq!(controller.target(), 5.0);
    assert_eq!(controller.mode(), ControlMode::RestLength);
}

#[test]
fn test_tension_command_moves_toward_matching_rest_length() {
    let (mut tree, _world) = compile(cable_config());
    let cable = tree.actuators_mut().remove(0);
    let mut controller = ActuatorController::tension(0.0);

    // 100 N on a k = 100 cable of length 10 wants rest 9; 0.2 allowed this step.
    let rest = controller.control(cable, 0.1, 100.0).unwrap();

    assert_relative_eq!(rest, 9.8, epsilon = 1e-5);
}

#[rstest]
#[case::rest_length(ActuatorController::rest_length(10.0), 0.0)]
#[case::tension(ActuatorController::tension(0.0), 2000.0)]
fn test_command_never_exceeds_max_tension(#[case] controller: ActuatorController, #[case] target: f32) {
    let mut controller = controller;
    let (mut tree, _world) = compile(cable_config());
    let cable = tree.actuators_mut().remove(0);

    // Plenty of time to reach any target; 500 N caps the stretch at 5.
    let rest = controller.control(cable, 10.0, target).unwrap();

    assert_relative_eq!(rest, 5.0, epsilon = 1e-5);
}

#[rstest]
#[case::rest_length(ActuatorController::rest_length(1.0), 1.0)]
#[case::tension(ActuatorController::tension(900.0), 900.0)]
fn test_overtensioned_cable_is_let_out_at_bounded_rate(
    #[case] controller: ActuatorController,
    #[case] target: f32,
) {
    let mut controller = controller;
    let (mut tree, _world) = compile(cable_config());
    let cable = tree.actuators_mut().remove(0);
    // Rest 1 on a 10 unit cable asks for 900 N, well past the 500 N cap.
    cable.set_rest_length(1.0);

    let rest = controller.control(cable, 0.01, target).unwrap();

    // 2 units/s for 0.01 s: only 0.02 of the 4 units needed to reach rest 5.
    assert_relative_eq!(rest, 1.02, epsilon = 1e-5);

    for _ in 0..1000 {
        controller.control(cable, 0.01, target).unwrap();
    }
    assert_relative_eq!(cable.rest_length(), 5.0, epsilon = 1e-4);
}

#[test]
fn test_rest_length_is_floored_at_minimum() {
    let (mut tree, _world) = compile(CableConfig::new(100.0, 0.0, 0.0).with_limits(1.0e9, 2.0));
    let cable = tree.actuators_mut().remove(0);
    let mut controller = ActuatorController::rest_length(10.0);

    let rest = controller.control(cable, 100.0, -3.0).unwrap();

    assert_relative_eq!(rest, 0.1, epsilon = 1e-6);
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(f32::INFINITY)]
fn test_control_rejects_bad_dt(#[case] dt: f32) {
    let (mut tree, _world) = compile(cable_config());
    let cable = tree.actuators_mut().remove(0);
    let mut controller = ActuatorController::rest_length(10.0);

    let err = controller.control(cable, dt, 5.0).unwrap_err();

    assert!(matches!(err, TensegrityError::NonPositiveTimestep { .. }));
    assert_eq!(cable.rest_length(), 10.0);
}

#[test]
fn test_cable_step_applies_spring_law() {
    let (mut tree, mut world) = compile(cable_config());
    tree.actuators_mut().remove(0).set_rest_length(9.0);

    tree.sense(&world);
    tree.step(&mut world, 0.01);

    assert_relative_eq!(tree.actuators()[0].tension(), 100.0, epsilon = 1e-3);
}

#[test]
fn test_cable_tension_is_clamped_and_never_pushes() {
    let (mut tree, mut world) = compile(cable_config());

    tree.actuators_mut().remove(0).set_rest_length(0.0);
    tree.step(&mut world, 0.01);
    assert_eq!(tree.actuators()[0].tension(), 500.0);
    assert_eq!(tree.actuators()[0].rest_length(), 0.1, "floored at min_rest_length");

    tree.actuators_mut().remove(0).set_rest_length(12.0);
    tree.step(&mut world, 0.01);
    assert_eq!(tree.actuators()[0].tension(), 0.0, "slack cables carry nothing");
}

#[test]
fn test_history_records_one_sample_per_step() {
    let (mut tree, mut world) = compile(cable_config().with_history(true));

    for _ in 0..3 {
        tree.sense(&world);
        tree.step(&mut world, 0.01);
    }

    let history = tree.actuators()[0].history();
    assert_eq!(history.len(), 3);
    assert_relative_eq!(history[2].length, 10.0, epsilon = 1e-5);
}

#[test]
fn test_constant_tension_controller_converges() {
    let (s, spec) = single_cable(cable_config());
    let mut model = TensegrityModel::new(s, spec);
    let controller = Rc::new(RefCell::new(ConstantTensionController::new(100.0).unwrap()));
    model.attach(&controller).unwrap();
    let mut world = PointMassWorld::default();
    model.setup(&mut world).unwrap();
    assert_eq!(controller.borrow().controlled(), 1);

    for _ in 0..10 {
        model.step(&mut world, 0.1).unwrap();
    }

    let cable = model.tree().unwrap().actuators()[0];
    assert_relative_eq!(cable.rest_length(), 9.0, epsilon = 1e-4);
    assert_relative_eq!(cable.tension(), 100.0, epsilon = 1e-2);

    model.teardown(&mut world).unwrap();
    assert_eq!(controller.borrow().controlled(), 0);
}

#[test]
fn test_constant_tension_rejects_negative_setpoint() {
    let err = ConstantTensionController::new(-1.0).unwrap_err();
    assert!(matches!(err, TensegrityError::InvalidParameter { name: "tension", .. }));
}
