//! Host-level hooks invoked by applications.

use async_trait::async_trait;

use super::lifecycle::{AppProps, HookError};

/// Arguments of the container-wait fallback.
#[derive(Debug, Clone)]
pub struct ContainerWaitRequest {
    pub container_name: String,
    pub app_props: AppProps,
}

/// Fallback used when a mounted app has no container controller.
///
/// Lets the host decide how to wait for a child container that the app
/// itself cannot report on.
#[async_trait]
pub trait ContainerWaitHook: Send + Sync {
    async fn wait_for_child_container(&self, request: ContainerWaitRequest)
        -> Result<(), HookError>;
}

/// Fallback that resolves immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopContainerWait;

#[async_trait]
impl ContainerWaitHook for NoopContainerWait {
    async fn wait_for_child_container(
        &self,
        _request: ContainerWaitRequest,
    ) -> Result<(), HookError> {
        Ok(())
    }
}
