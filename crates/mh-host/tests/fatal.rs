//! Fatal errors: full cleanup before the host is told to abort.

mod common;

use common::{Spec, adapter, manifest, model_a};
use mh_abi::{CallReply, LifecycleCall, ModelMetadata};
use mh_core::{InstanceId, Role};
use mh_host::{HostError, Phase};

fn id(index: u32) -> InstanceId {
    InstanceId::from_index(index).unwrap()
}

const XDATA_A: [f64; 7] = [0.0, 0.005, 10.0, 0.0, 1.0, 2.0, 3.0];

#[test]
fn check_parameters_error_cleans_every_instance() {
    let list = manifest("$verbose=2\n0;good.so\n1;bad.so\n2;unused.so\n");
    let bad = Spec::new(model_a()).reply(
        LifecycleCall::CheckParameters,
        CallReply::error("p2 out of range"),
    );
    let (mut host, _) = adapter(
        &list,
        common::FakeLoader::new()
            .with("good.so", Spec::new(model_a()))
            .with("bad.so", bad),
    );

    host.init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap();
    let mut xdata = XDATA_A;
    xdata[0] = 1.0;
    let err = host
        .init(&xdata, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();

    assert!(matches!(
        err,
        HostError::Model {
            call: LifecycleCall::CheckParameters,
            ..
        }
    ));
    let arena = host.arena().unwrap();
    assert_eq!(arena.get(id(0)).unwrap().phase(), Phase::Cleaned);
    assert_eq!(arena.get(id(1)).unwrap().phase(), Phase::Cleaned);
    assert_eq!(arena.get(id(2)).unwrap().phase(), Phase::Registered);
    assert!(arena.iter().all(|i| !i.is_bound()));

    let bridge = host.bridge();
    assert_eq!(
        bridge.aborts,
        vec!["Instance #1: In call to 'Model_CheckParameters': p2 out of range"]
    );
    assert!(bridge.contains("Cleaning instance #0 - file: good.so"));
    assert!(bridge.contains("Cleaning instance #1 - file: bad.so"));
    let cleanup = bridge.lines.iter().position(|l| l.contains("Cleanup ended OK"));
    let banner = bridge.lines.iter().position(|l| l.starts_with("ERROR:"));
    assert!(cleanup.unwrap() < banner.unwrap());
}

#[test]
fn calls_after_abort_are_refused() {
    let list = manifest("0;modelA.so\n");
    let (mut host, _) = adapter(
        &list,
        common::FakeLoader::new().with("modelA.so", Spec::new(model_a())),
    );
    let err = host
        .exec(&XDATA_A, &[0.0, 1.0, 2.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(matches!(err, HostError::Unregistered { .. }));

    let err = host
        .init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(matches!(err, HostError::Aborted));
    assert_eq!(host.bridge().aborts.len(), 1);
}

#[test]
fn exec_before_init_is_fatal() {
    let list = manifest("0;modelA.so\n1;modelA.so\n");
    let (mut host, _) = adapter(
        &list,
        common::FakeLoader::new().with("modelA.so", Spec::new(model_a())),
    );
    host.init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap();
    let mut xdata = XDATA_A;
    xdata[0] = 1.0;
    let err = host
        .exec(&xdata, &[0.0, 1.0, 2.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(matches!(
        err,
        HostError::OutOfOrder {
            phase: Phase::Registered,
            ..
        }
    ));
    assert_eq!(
        host.arena().unwrap().get(id(0)).unwrap().phase(),
        Phase::Cleaned
    );
}

#[test]
fn undeclared_id_is_fatal() {
    let list = manifest("0;modelA.so\n");
    let (mut host, _) = adapter(
        &list,
        common::FakeLoader::new().with("modelA.so", Spec::new(model_a())),
    );
    let mut xdata = XDATA_A;
    xdata[0] = 5.0;
    let err = host
        .init(&xdata, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error using an instance #5 not declared in the manifest"
    );
    assert!(host.is_aborted());
}

#[test]
fn second_init_of_same_id_is_fatal() {
    let list = manifest("0;modelA.so\n");
    let (mut host, _) = adapter(
        &list,
        common::FakeLoader::new().with("modelA.so", Spec::new(model_a())),
    );
    host.init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap();
    let err = host
        .init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(matches!(err, HostError::AlreadyBound { .. }));
    assert_eq!(
        host.arena().unwrap().get(id(0)).unwrap().phase(),
        Phase::Cleaned
    );
}

#[test]
fn manifest_problems_abort_before_any_binding() {
    let list = manifest("0;a.so\n0;b.so\n");
    let (mut host, journal) = adapter(&list, common::FakeLoader::new());
    let err = host
        .init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    match err {
        HostError::ManifestLine { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(journal.borrow().is_empty());
    assert_eq!(host.bridge().aborts.len(), 1);

    let mut host = mh_host::Adapter::new(
        mh_host::HostConfig::with_manifest("/nonexistent/icdll_list.txt"),
        common::FakeLoader::new(),
        mh_host::RecordingBridge::default(),
    );
    let err = host
        .init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(matches!(err, HostError::ManifestRead { .. }));
}

#[test]
fn unloadable_library_is_fatal() {
    let list = manifest("0;missing.so\n");
    let (mut host, _) = adapter(&list, common::FakeLoader::new());
    let err = host
        .init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(err.to_string().starts_with("Cannot load library \"missing.so\""));
}

#[test]
fn unknown_field_type_is_fatal() {
    let list = manifest("0;modelA.so\n");
    let mut meta = ModelMetadata::new("labels", 0.01);
    meta.inputs.push(mh_abi::SignalInfo {
        field: mh_core::FieldDescriptor::with_tag("label", 10),
        description: String::new(),
        unit: String::new(),
    });
    let (mut host, journal) = adapter(
        &list,
        common::FakeLoader::new().with("modelA.so", Spec::new(meta)),
    );
    let err = host
        .init(&[0.0, 0.005, 1.0, 0.0], &[0.0, 0.0], &mut [], &mut [])
        .unwrap_err();
    assert!(err.to_string().contains("'label'"));
    assert!(err.to_string().contains("tag 10"));
    assert!(journal.borrow().is_empty());
    assert_eq!(
        host.arena().unwrap().get(id(0)).unwrap().phase(),
        Phase::Cleaned
    );
}

#[test]
fn short_host_arrays_are_fatal() {
    let list = manifest("0;modelA.so\n");
    let (mut host, _) = adapter(
        &list,
        common::FakeLoader::new().with("modelA.so", Spec::new(model_a())),
    );
    // Initial output missing from the input array.
    let err = host
        .init(&XDATA_A, &[0.0, 1.0, 2.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(matches!(err, HostError::Layout { .. }));
    assert!(host.arena().unwrap().get(id(0)).unwrap().buffer(Role::Inputs).is_none());
}

#[test]
fn error_during_step_aborts_with_model_text() {
    let list = manifest("0;modelA.so\n");
    let spec = Spec::new(model_a()).reply(
        LifecycleCall::Outputs,
        CallReply::error("division by zero in limiter"),
    );
    let (mut host, _) = adapter(&list, common::FakeLoader::new().with("modelA.so", spec));
    host.init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap();
    let err = host
        .exec(&XDATA_A, &[0.0, 1.0, 2.0], &mut [0.0], &mut [0.0; 5])
        .unwrap_err();
    assert!(err.to_string().ends_with("division by zero in limiter"));
    assert!(host.bridge().contains("ERROR:\nInstance #0: In call to 'Model_Outputs'"));
}

#[test]
fn print_info_problems_do_not_abort() {
    let list = manifest("0;modelA.so\n1;modelA.so\n");
    let (mut host, _) = adapter(
        &list,
        common::FakeLoader::new().with("modelA.so", Spec::new(model_a())),
    );
    let err = host.print_info(id(0)).unwrap_err();
    assert!(matches!(err, HostError::Unregistered { .. }));

    host.init(&XDATA_A, &[0.0, 1.0, 2.0, 0.0], &mut [0.0], &mut [0.0; 5])
        .unwrap();
    assert_eq!(host.print_info(id(1)).unwrap(), None);
    assert!(host.print_info(id(7)).is_err());
    assert_eq!(host.print_info(id(0)).unwrap(), Some(0));

    assert!(!host.is_aborted());
    assert!(host.bridge().aborts.is_empty());
    assert_eq!(
        host.arena().unwrap().get(id(0)).unwrap().phase(),
        Phase::Initialized
    );
}
