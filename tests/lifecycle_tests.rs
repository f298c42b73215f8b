use std::sync::Arc;
use std::time::Duration;

use appswitch::application::Host;
use appswitch::domain::{AppStatus, Operation};
use appswitch::error::LifecycleError;
use appswitch::port::{AppProps, ContainerController, HookError, LifeCycles, MountResult};
use appswitch::testkit::apps::{counted_app, failing_mount_app, gated_mount_app, noop_app, Gate};
use appswitch::testkit::hooks::RecordingContainerWait;
use appswitch::testkit::wait::wait_until;
use appswitch::application::AppConfig;
use async_trait::async_trait;

fn host() -> Host {
    Host::builder().build()
}

#[tokio::test]
async fn concurrent_mounts_run_mount_function_once() {
    let host = host();
    let (config, calls) = counted_app("orders", Duration::from_millis(20));
    let app = host.register_app(config).unwrap();
    app.load(None).await.unwrap();

    let (first, second) = tokio::join!(app.mount(None, None), app.mount(None, None));

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(calls.mounts(), 1);
    assert_eq!(app.status(), AppStatus::Mounted);
    assert!(!app.is_pending(Operation::Mount));
}

#[tokio::test]
async fn concurrent_instant_mounts_both_succeed() {
    let host = host();
    let app = host.register_app(noop_app("instant")).unwrap();
    app.load(None).await.unwrap();

    let (first, second) = tokio::join!(app.mount(None, None), app.mount(None, None));

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(app.status(), AppStatus::Mounted);
}

#[tokio::test]
async fn concurrent_callers_share_failure() {
    let host = host();
    let app = host.register_app(failing_mount_app("broken")).unwrap();
    app.load(None).await.unwrap();

    let (first, second) = tokio::join!(app.mount(None, None), app.mount(None, None));

    let (first, second) = (first.unwrap_err(), second.unwrap_err());
    assert_eq!(first.to_string(), second.to_string());
    assert!(matches!(first, LifecycleError::Execution { .. }));
    assert_eq!(app.status(), AppStatus::Broken);
}

#[tokio::test]
async fn unmount_of_not_mounted_app_is_rejected() {
    let host = host();
    let app = host.register_app(noop_app("orders")).unwrap();
    app.load(None).await.unwrap();

    let err = app.unmount(None, None).await.unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::InvalidStateTransition {
            operation: Operation::Unmount,
            status: AppStatus::NotMounted,
            ..
        }
    ));
    assert_eq!(app.status(), AppStatus::NotMounted);
}

#[tokio::test]
async fn mount_before_load_is_rejected() {
    let host = host();
    let app = host.register_app(noop_app("orders")).unwrap();

    let err = app.mount(None, None).await.unwrap_err();

    assert!(err.is_invalid_transition());
    assert_eq!(app.status(), AppStatus::NotLoaded);
}

#[tokio::test]
async fn load_and_mount_swallows_mount_failure() {
    let host = host();
    let app = host.register_app(failing_mount_app("broken")).unwrap();

    app.load_and_mount().await.unwrap();

    assert_eq!(app.status(), AppStatus::NotMounted);
    assert!(app.is_loaded());
}

#[tokio::test]
async fn load_and_mount_skips_loaded_app() {
    let host = host();
    let (config, calls) = counted_app("orders", Duration::ZERO);
    let app = host.register_app(config).unwrap();
    app.load(None).await.unwrap();

    app.load_and_mount().await.unwrap();

    assert_eq!(calls.loads(), 1);
    assert_eq!(calls.mounts(), 1);
    assert_eq!(app.status(), AppStatus::Mounted);
}

#[tokio::test]
async fn registering_parcel_twice_returns_same_instance() {
    let host = host();
    let shell = host.register_app(noop_app("shell")).unwrap();

    let first = shell.register_parcel(noop_app("widget")).unwrap();
    let second = shell.register_parcel(noop_app("widget")).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(shell.parcels().len(), 1);
    assert_eq!(host.registry().len(), 2);
    assert!(Arc::ptr_eq(&first, &host.get_app("widget").unwrap()));
}

#[tokio::test]
async fn parent_unmount_settles_mounting_parcel_first() {
    let host = host();
    let parent = host.register_app(noop_app("parent")).unwrap();
    parent.load_and_mount().await.unwrap();

    let (mounted_config, mounted_calls) = counted_app("mounted", Duration::from_millis(5));
    let mounted = parent.register_parcel(mounted_config).unwrap();
    mounted.load_and_mount().await.unwrap();

    let gate = Gate::new();
    let (gated_config, gated_calls) = gated_mount_app("mounting", gate.clone());
    let mounting = parent.register_parcel(gated_config).unwrap();
    mounting.load(None).await.unwrap();

    let pending_mount = tokio::spawn({
        let mounting = Arc::clone(&mounting);
        async move { mounting.mount(None, None).await }
    });
    wait_until(|| mounting.status() == AppStatus::Mounting).await;

    let pending_unmount = tokio::spawn({
        let parent = Arc::clone(&parent);
        async move { parent.unmount(None, None).await }
    });

    // The mounted parcel is unmounted while the other one is still mounting.
    wait_until(|| mounted.status() == AppStatus::NotMounted).await;
    assert_eq!(parent.status(), AppStatus::Unmounting);
    assert_eq!(mounting.status(), AppStatus::Mounting);
    assert_eq!(gated_calls.unmounts(), 0);

    gate.open();
    pending_unmount.await.unwrap().unwrap();
    pending_mount.await.unwrap().unwrap();

    assert_eq!(parent.status(), AppStatus::NotMounted);
    assert_eq!(mounting.status(), AppStatus::NotMounted);
    assert_eq!(gated_calls.mounts(), 1);
    assert_eq!(gated_calls.unmounts(), 1);
    assert_eq!(mounted_calls.unmounts(), 1);
}

#[tokio::test]
async fn failing_parcel_breaks_parent_unmount() {
    let host = host();
    let parent = host.register_app(noop_app("parent")).unwrap();
    parent.load_and_mount().await.unwrap();

    let parcel = parent
        .register_parcel(AppConfig::new("sticky").with_loader(|_| async {
            Ok(LifeCycles::new().with_unmount(|_| async { Err(HookError::msg("busy")) }))
        }))
        .unwrap();
    parcel.load_and_mount().await.unwrap();

    let err = parent.unmount(None, None).await.unwrap_err();

    assert_eq!(err.app(), "sticky");
    assert_eq!(parcel.status(), AppStatus::Broken);
    assert_eq!(parent.status(), AppStatus::Broken);
}

#[tokio::test]
async fn wait_for_child_container_falls_back_to_host_hook() {
    let hook = Arc::new(RecordingContainerWait::new());
    let host = Host::builder().container_wait(hook.clone()).build();
    let shell = host.register_app(noop_app("shell")).unwrap();
    shell.load_and_mount().await.unwrap();

    shell.wait_for_child_container("main", None).await.unwrap();

    assert_eq!(hook.requests(), vec![("shell".to_string(), "main".to_string())]);
}

struct SlowContainers {
    waits: Arc<std::sync::atomic::AtomicUsize>,
}

#[async_trait]
impl ContainerController for SlowContainers {
    async fn wait(&self, container: &str, _props: &AppProps) -> Result<(), HookError> {
        self.waits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        if container == "main" {
            Ok(())
        } else {
            Err(HookError::container_not_found(container))
        }
    }
}

#[tokio::test]
async fn container_controller_waits_are_deduplicated_per_container() {
    let waits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let controller_waits = Arc::clone(&waits);
    let host = host();
    let shell = host
        .register_app(AppConfig::new("shell").with_loader(move |_| {
            let waits = Arc::clone(&controller_waits);
            async move {
                Ok(LifeCycles::new().with_mount(move |_| {
                    let waits = Arc::clone(&waits);
                    async move {
                        Ok(MountResult::with_controller(Arc::new(SlowContainers { waits })))
                    }
                }))
            }
        }))
        .unwrap();
    shell.load_and_mount().await.unwrap();

    let (a, b, other) = tokio::join!(
        shell.wait_for_child_container("main", None),
        shell.wait_for_child_container("main", None),
        shell.wait_for_child_container("aside", None),
    );

    assert!(a.is_ok() && b.is_ok());
    assert!(other.unwrap_err().is_container_not_found());
    assert_eq!(waits.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn snapshot_reports_lifecycle_shape() {
    let host = host();
    let shell = host.register_app(noop_app("shell")).unwrap();
    shell.load_and_mount().await.unwrap();
    shell.register_parcel(noop_app("widget")).unwrap();

    let snapshot = shell.snapshot();

    assert_eq!(snapshot.status, AppStatus::Mounted);
    assert!(snapshot.is_loaded && snapshot.has_mount && snapshot.has_unmount);
    assert!(!snapshot.has_container_controller);
    assert_eq!(snapshot.parcels, vec!["widget"]);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["status"], "MOUNTED");
}
