use crate::demo::{CounterModule, SlowLaunchModule};
use crate::error::{Error, ManagerState};
use crate::mgr::{Manager, ManagerOpts};
use crate::module::{LaunchInfo, ModuleError, ModuleId, ModuleSpec, ModuleState, StepModule};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn short_timeout_opts() -> ManagerOpts {
    ManagerOpts {
        launch_timeout: Duration::from_millis(50),
        ..ManagerOpts::default()
    }
}

#[test]
fn launch_timeout_rolls_back_all_workers() {
    let mut man = Manager::with_opts(short_timeout_opts());
    let a = man
        .add(ModuleSpec::new("a", CounterModule::default(), 0, 1))
        .expect("add a");
    let slow = man
        .add(ModuleSpec::new(
            "slow",
            SlowLaunchModule {
                delay: Duration::from_millis(400),
            },
            0,
            1,
        ))
        .expect("add slow");
    let c = man
        .add(ModuleSpec::new("c", CounterModule::default(), 0, 1))
        .expect("add c");

    let err = man.spawn().unwrap_err();
    match err {
        Error::LaunchTimeout { module } => assert_eq!(module, "slow"),
        other => panic!("expected LaunchTimeout, got {other:?}"),
    }
    // All-or-nothing: every worker was terminated and marked failed,
    // no endpoint survives the rollback.
    for id in [a, slow, c] {
        assert_eq!(man.module_state(id), Some(ModuleState::Failed));
        assert!(man.module_endpoint(id).is_none());
    }
    assert_eq!(man.state(), ManagerState::Finished);
}

struct RefusingModule;

impl StepModule for RefusingModule {
    fn on_launch(&mut self, _info: &LaunchInfo) -> Result<(), ModuleError> {
        Err(ModuleError::new("refusing to launch"))
    }

    fn step(&mut self, _step: u64, _inputs: &[f64], _outputs: &mut [f64]) -> Result<(), ModuleError> {
        Ok(())
    }
}

#[test]
fn launch_failure_reported_by_the_module_also_rolls_back() {
    let mut man = Manager::with_opts(short_timeout_opts());
    man.add(ModuleSpec::new("ok", CounterModule::default(), 0, 1))
        .expect("add ok");
    man.add(ModuleSpec::new("bad", RefusingModule, 0, 1))
        .expect("add bad");

    let err = man.spawn().unwrap_err();
    assert!(matches!(err, Error::LaunchTimeout { ref module } if module == "bad"), "got {err:?}");
    assert_eq!(man.module_state(ModuleId(0)), Some(ModuleState::Failed));
}

struct LaunchProbe {
    seen: Arc<Mutex<Option<LaunchInfo>>>,
}

impl StepModule for LaunchProbe {
    fn on_launch(&mut self, info: &LaunchInfo) -> Result<(), ModuleError> {
        *self.seen.lock().expect("probe lock") = Some(info.clone());
        Ok(())
    }

    fn step(&mut self, _step: u64, _inputs: &[f64], _outputs: &mut [f64]) -> Result<(), ModuleError> {
        Ok(())
    }
}

#[test]
fn io_bindings_and_device_are_forwarded_opaquely_to_the_module() {
    let seen = Arc::new(Mutex::new(None));
    let mut man = Manager::new();
    man.add(
        ModuleSpec::new(
            "al",
            LaunchProbe {
                seen: Arc::clone(&seen),
            },
            0,
            1,
        )
        .with_device(crate::module::Device::Gpu(2))
        .with_io_files(
            Some("./data/olfactory_input.h5".to_string()),
            Some("olfactory_output.h5".to_string()),
        ),
    )
    .expect("add al");

    man.spawn().expect("spawn");
    man.start(1).expect("start");
    man.wait().expect("wait");

    let info = seen.lock().expect("probe lock").clone().expect("launch info recorded");
    assert_eq!(info.module, "al");
    assert_eq!(info.device, crate::module::Device::Gpu(2));
    assert_eq!(info.input_file.as_deref(), Some("./data/olfactory_input.h5"));
    assert_eq!(info.output_file.as_deref(), Some("olfactory_output.h5"));
}

#[test]
fn handle_states_follow_the_documented_transitions() {
    let mut man = Manager::new();
    let id = man
        .add(ModuleSpec::new("a", CounterModule::default(), 0, 1))
        .expect("add");
    assert_eq!(man.module_state(id), Some(ModuleState::Registered));

    man.spawn().expect("spawn");
    assert_eq!(man.module_state(id), Some(ModuleState::Running));

    man.start(2).expect("start");
    man.wait().expect("wait");
    assert_eq!(man.module_state(id), Some(ModuleState::Completed));
}
