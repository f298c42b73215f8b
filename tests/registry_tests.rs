use std::sync::Arc;

use appswitch::adapter::RecordingRouter;
use appswitch::application::Host;
use appswitch::domain::{AppName, AppStatus, RouteConfig};
use appswitch::error::{Error, RegistryError};
use appswitch::port::RerouteTrigger;
use appswitch::testkit::apps::noop_app;

fn host_with_router() -> (Host, Arc<RecordingRouter>) {
    let router = Arc::new(RecordingRouter::new());
    (Host::builder().router(router.clone()).build(), router)
}

#[test]
fn duplicate_registration_keeps_first_app() {
    let (host, router) = host_with_router();
    let first = host
        .register_app(noop_app("orders").with_route(RouteConfig::new("/orders")))
        .unwrap();

    let err = host
        .register_app(noop_app("orders").with_route(RouteConfig::new("/other")))
        .unwrap_err();

    assert!(Error::from(err.clone()).is_configuration());
    assert_eq!(
        err,
        RegistryError::DuplicateName {
            name: AppName::new("orders")
        }
    );
    assert!(Arc::ptr_eq(&first, &host.get_app("orders").unwrap()));
    assert_eq!(router.routes_of("orders"), vec![RouteConfig::new("/orders")]);
    assert_eq!(router.reroute_count(), 1);
}

#[test]
fn register_apps_reroutes_once() {
    let (host, router) = host_with_router();

    host.register_apps(vec![noop_app("shell"), noop_app("orders")])
        .unwrap();

    assert_eq!(
        router.reroutes(),
        vec![RerouteTrigger::Registration(vec![
            AppName::new("shell"),
            AppName::new("orders"),
        ])]
    );
}

#[test]
fn start_requests_reroute() {
    let (host, router) = host_with_router();
    host.start();
    assert_eq!(router.reroutes(), vec![RerouteTrigger::Start]);
}

#[test]
fn unknown_name_is_not_found() {
    let (host, _) = host_with_router();
    let err = host.get_app("ghost").unwrap_err();
    assert_eq!(err.to_string(), "can not find app by name \"ghost\"");
}

#[tokio::test]
async fn root_parcel_is_mounted_by_hand() {
    let (host, router) = host_with_router();
    let toast = host.register_root_parcel(noop_app("toast")).unwrap();

    toast.load_and_mount().await.unwrap();

    assert_eq!(toast.status(), AppStatus::Mounted);
    assert_eq!(router.reroute_count(), 0);
    assert_eq!(host.snapshot().len(), 1);
}

#[tokio::test]
async fn prefetch_failure_is_logged_not_returned() {
    let (host, _) = host_with_router();
    host.register_app(appswitch::application::AppConfig::new("no-loader"))
        .unwrap();
    host.register_app(noop_app("orders")).unwrap();

    host.prefetch(["no-loader", "orders"]).await.unwrap();

    assert_eq!(host.get_app("no-loader").unwrap().status(), AppStatus::Broken);
    assert_eq!(host.get_app("orders").unwrap().status(), AppStatus::NotMounted);
}
