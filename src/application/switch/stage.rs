//! Built-in load stages.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::debug;

use super::pipeline::{LoadHookContext, LoadStage};

/// Waits for every parent container of the next batch before it mounts.
///
/// Apps without a parent or container slot are skipped. Each
/// `(parent, container)` pair is waited for once per batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChildContainerStage;

#[async_trait]
impl LoadStage for ChildContainerStage {
    fn name(&self) -> &str {
        "child-container"
    }

    async fn before_batch(&self, ctx: &mut LoadHookContext) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        let waits: Vec<_> = ctx
            .current_apps
            .iter()
            .filter_map(|planned| Some((planned.parent.clone()?, planned.container.clone()?)))
            .filter(|(parent, container)| seen.insert((parent.name().clone(), container.clone())))
            .collect();
        if waits.is_empty() {
            return Ok(());
        }

        let switch = Arc::clone(&ctx.switch);
        let results = join_all(waits.iter().map(|(parent, container)| {
            let switch = Arc::clone(&switch);
            async move {
                debug!(app = %parent.name(), container = %container, "Waiting for child container");
                parent.wait_for_child_container(container, Some(switch.as_ref())).await
            }
        }))
        .await;

        let errors: Vec<String> = results
            .into_iter()
            .filter_map(Result::err)
            .map(|err| err.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(errors.join("; ")))
        }
    }
}
