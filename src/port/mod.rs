//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams where the host plugs in what this core does not own:
//! the router, the application bundles' lifecycle functions and the
//! container-wait fallback.
//!
//! # Available Ports
//!
//! - [`LoadFn`], [`LifeCycles`], [`ContainerController`] - Application bundles
//! - [`Router`] - Route declarations and re-evaluation requests
//! - [`ContainerWaitHook`] - Host fallback for child containers

mod hooks;
mod lifecycle;
mod router;

pub use hooks::{ContainerWaitHook, ContainerWaitRequest, NoopContainerWait};
pub use lifecycle::{
    loader, AppProps, BootstrapFn, ContainerController, HookError, HookFuture, LifeCycles,
    LoadFn, MountFn, MountResult, UnmountFn,
};
pub use router::{NoopRouter, RerouteTrigger, Router};
