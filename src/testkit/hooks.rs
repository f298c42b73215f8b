//! Recording load stages and container-wait hooks.

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::switch::{BatchOutcome, LoadHookContext, LoadStage};
use crate::port::{ContainerWaitHook, ContainerWaitRequest, HookError};

/// Stage that records `before:<stage>:<batch>:<apps>` and
/// `after:<stage>:<batch>` lines into a shared journal.
pub struct RecordingStage {
    name: String,
    journal: Arc<Mutex<Vec<String>>>,
    fail_before: bool,
}

impl RecordingStage {
    pub fn new(name: &str, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            journal,
            fail_before: false,
        }
    }

    /// Make `before_batch` return an error after recording.
    pub fn failing(mut self) -> Self {
        self.fail_before = true;
        self
    }
}

#[async_trait]
impl LoadStage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn before_batch(&self, ctx: &mut LoadHookContext) -> anyhow::Result<()> {
        let apps: Vec<_> = ctx
            .current_apps
            .iter()
            .map(|planned| planned.name().to_string())
            .collect();
        self.journal.lock().push(format!(
            "before:{}:{}:{}",
            self.name,
            ctx.batch_index,
            apps.join(",")
        ));
        if self.fail_before {
            bail!("stage {} refused batch {}", self.name, ctx.batch_index);
        }
        Ok(())
    }

    async fn after_batch(
        &self,
        ctx: &mut LoadHookContext,
        _outcome: &BatchOutcome,
    ) -> anyhow::Result<()> {
        self.journal
            .lock()
            .push(format!("after:{}:{}", self.name, ctx.batch_index));
        Ok(())
    }
}

/// Container-wait hook recording `(app, container)` requests.
#[derive(Debug, Default)]
pub struct RecordingContainerWait {
    requests: Mutex<Vec<(String, String)>>,
}

impl RecordingContainerWait {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ContainerWaitHook for RecordingContainerWait {
    async fn wait_for_child_container(
        &self,
        request: ContainerWaitRequest,
    ) -> Result<(), HookError> {
        self.requests.lock().push((
            request.app_props.name.to_string(),
            request.container_name,
        ));
        Ok(())
    }
}
