use crate::demo::{CounterModule, RelayModule};
use crate::error::{Error, ManagerState};
use crate::mgr::Manager;
use crate::module::{ModuleSpec, ModuleState};

fn counter_spec(name: &str) -> ModuleSpec {
    ModuleSpec::new(name, CounterModule::default(), 0, 4)
}

#[test]
fn start_before_spawn_fails_and_leaves_state_unchanged() {
    let mut man = Manager::new();
    man.add(counter_spec("a")).expect("add");

    let err = man.start(10).unwrap_err();
    assert!(matches!(err, Error::Lifecycle { method: "start", .. }), "got {err:?}");
    assert_eq!(man.state(), ManagerState::Configured);
    assert_eq!(man.module_state(crate::module::ModuleId(0)), Some(ModuleState::Registered));
}

#[test]
fn wait_before_start_fails() {
    let mut man = Manager::new();
    man.add(counter_spec("a")).expect("add");
    man.spawn().expect("spawn");

    let err = man.wait().unwrap_err();
    assert!(matches!(err, Error::Lifecycle { method: "wait", .. }), "got {err:?}");
    assert_eq!(man.state(), ManagerState::Spawned);
}

#[test]
fn add_and_connect_after_spawn_fail() {
    let mut man = Manager::new();
    let a = man.add(counter_spec("a")).expect("add a");
    let b = man
        .add(ModuleSpec::new("b", RelayModule::default(), 4, 4))
        .expect("add b");
    man.connect(a, b, vec![(0, 0)]).expect("connect");
    man.spawn().expect("spawn");

    let err = man.add(counter_spec("c")).unwrap_err();
    assert!(matches!(err, Error::Lifecycle { method: "add", .. }), "got {err:?}");
    assert_eq!(man.num_modules(), 2);

    let err = man.connect(a, b, vec![(1, 1)]).unwrap_err();
    assert!(matches!(err, Error::Lifecycle { method: "connect", .. }), "got {err:?}");

    man.start(1).expect("start");
    man.wait().expect("wait");
}

#[test]
fn spawn_twice_fails() {
    let mut man = Manager::new();
    man.add(counter_spec("a")).expect("add");
    man.spawn().expect("spawn");

    let err = man.spawn().unwrap_err();
    assert!(matches!(err, Error::Lifecycle { method: "spawn", .. }), "got {err:?}");

    man.start(1).expect("start");
    man.wait().expect("wait");
}

#[test]
fn spawn_on_empty_manager_fails() {
    let mut man = Manager::new();
    let err = man.spawn().unwrap_err();
    assert!(matches!(err, Error::Lifecycle { method: "spawn", .. }), "got {err:?}");
    assert_eq!(man.state(), ManagerState::Empty);
}

#[test]
fn duplicate_module_name_is_rejected_without_state_change() {
    let mut man = Manager::new();
    man.add(counter_spec("a")).expect("add");
    let err = man.add(counter_spec("a")).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
    assert_eq!(man.num_modules(), 1);
    assert_eq!(man.state(), ManagerState::Configured);
}

#[test]
fn unconnected_modules_run_to_completion_with_full_step_count() {
    // N modules, no connectivity: spawn + start(T) + wait completes and
    // the step counter lands exactly on T.
    let mut man = Manager::new();
    let ids: Vec<_> = (0..4)
        .map(|i| man.add(counter_spec(&format!("m{i}"))).expect("add"))
        .collect();
    man.spawn().expect("spawn");
    man.start(25).expect("start");
    man.wait().expect("wait");

    assert_eq!(man.state(), ManagerState::Finished);
    assert_eq!(man.current_step(), 25);
    assert_eq!(man.step_counter().total(), 25);
    for id in ids {
        assert_eq!(man.module_state(id), Some(ModuleState::Completed));
    }
}

#[test]
fn zero_step_run_finishes_immediately() {
    let mut man = Manager::new();
    let id = man.add(counter_spec("a")).expect("add");
    man.spawn().expect("spawn");
    man.start(0).expect("start");
    man.wait().expect("wait");

    assert_eq!(man.current_step(), 0);
    assert_eq!(man.module_state(id), Some(ModuleState::Completed));
}

#[test]
fn wait_after_finish_fails() {
    let mut man = Manager::new();
    man.add(counter_spec("a")).expect("add");
    man.spawn().expect("spawn");
    man.start(1).expect("start");
    man.wait().expect("wait");

    let err = man.wait().unwrap_err();
    assert!(matches!(err, Error::Lifecycle { method: "wait", .. }), "got {err:?}");
}

#[test]
fn spawn_assigns_distinct_endpoints_and_honors_explicit_ports() {
    let mut man = Manager::new();
    let a = man.add(counter_spec("a")).expect("add a");
    let b = man
        .add(counter_spec("b").with_ports(Some(7100), Some(7200)))
        .expect("add b");
    man.spawn().expect("spawn");

    let ep_a = man.module_endpoint(a).expect("endpoint a");
    let ep_b = man.module_endpoint(b).expect("endpoint b");
    assert_eq!((ep_b.ctrl, ep_b.data), (7100, 7200));
    let all = [ep_a.ctrl, ep_a.data, ep_b.ctrl, ep_b.data];
    let uniq: std::collections::HashSet<_> = all.iter().collect();
    assert_eq!(uniq.len(), all.len(), "endpoints must not be shared");

    man.start(1).expect("start");
    man.wait().expect("wait");
    // released at teardown
    assert!(man.module_endpoint(a).is_none());
}

#[test]
fn conflicting_explicit_ports_fail_spawn_with_port_in_use() {
    let mut man = Manager::new();
    man.add(counter_spec("a").with_ports(Some(7100), None)).expect("add a");
    man.add(counter_spec("b").with_ports(Some(7100), None)).expect("add b");

    let err = man.spawn().unwrap_err();
    assert!(matches!(err, Error::PortInUse { port: 7100 }), "got {err:?}");
    assert_eq!(man.state(), ManagerState::Finished);
}

#[test]
fn bad_routing_fails_spawn_with_configuration_error() {
    let mut man = Manager::new();
    let a = man.add(counter_spec("a")).expect("add a");
    let b = man
        .add(ModuleSpec::new("b", RelayModule::default(), 2, 2))
        .expect("add b");
    man.connect(a, b, vec![(0, 9)]).expect("connect");

    let err = man.spawn().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
}
