//! Infrastructure bootstrap helpers for host wiring.

use std::sync::Arc;

use tracing::info;

use crate::application::{Host, HostBuilder};
use crate::infrastructure::config::settings::Config;
use crate::port::Router;

/// Host builder preconfigured from `config`.
#[must_use]
pub fn host_builder(config: &Config, router: Arc<dyn Router>) -> HostBuilder {
    Host::builder()
        .router(router)
        .abandon_superseded(config.switcher.abandon_superseded)
        .wait_for_child_containers(config.switcher.wait_for_child_containers)
}

/// Build a host from `config`.
#[must_use]
pub fn build_host(config: &Config, router: Arc<dyn Router>) -> Host {
    let host = host_builder(config, router).build();
    info!(
        abandon_superseded = config.switcher.abandon_superseded,
        wait_for_child_containers = config.switcher.wait_for_child_containers,
        stages = ?host.switcher().pipeline().names(),
        "Host built"
    );
    host
}
