//! Live tracking of one workflow instance.
//!
//! [`InstanceTracker`] keeps a polling subscription on the instance's admin
//! progress, exposes the interpreted [`TrackingStage`], and performs the two
//! actions available from the tracking screen: start and submit-data.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use civica_client::services::InstancesService;
use civica_client::ApiError;
use civica_core::input::{InputCollector, InputComponent, InputRequest};
use civica_core::progress::AdminWorkflowProgress;
use civica_core::tracking::TrackingStage;
use civica_core::CoreError;
use civica_query::{QueryCache, QueryError, QueryKey, QueryState, QuerySubscription};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::keys;

/// Timing of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    pub submit_refresh_delay: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            submit_refresh_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Progress has not been loaded yet")]
    NotLoaded,

    #[error("Instance is not waiting for input (status '{0}')")]
    NotAwaitingInput(String),
}

impl From<CoreError> for TrackerError {
    fn from(err: CoreError) -> Self {
        Self::Api(ApiError::Validation(err))
    }
}

impl TrackerError {
    /// Text for the tracker's inline error banner.
    pub fn banner(&self) -> String {
        match self {
            Self::Api(e) => e.message(),
            other => other.to_string(),
        }
    }
}

pub struct InstanceTracker {
    instance_id: String,
    key: QueryKey,
    instances: InstancesService,
    cache: QueryCache,
    subscription: QuerySubscription<AdminWorkflowProgress>,
    /// Scope of the tracker's own background work (delayed refreshes).
    scope: CancellationToken,
    settings: TrackerSettings,
    banner: Mutex<Option<String>>,
}

impl std::fmt::Debug for InstanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceTracker")
            .field("instance_id", &self.instance_id)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl InstanceTracker {
    /// Start tracking `instance_id`; the first load begins immediately.
    pub fn mount(
        instances: InstancesService,
        cache: &QueryCache,
        instance_id: impl Into<String>,
        settings: TrackerSettings,
    ) -> Self {
        let instance_id = instance_id.into();
        let key = keys::track(&instance_id);
        let fetcher = {
            let instances = instances.clone();
            let instance_id = instance_id.clone();
            move || {
                let instances = instances.clone();
                let instance_id = instance_id.clone();
                async move { instances.track(&instance_id).await }
            }
        };
        let subscription = cache.watch(key.clone(), fetcher, Some(settings.poll_interval));

        tracing::info!(instance_id = %instance_id, "Tracking instance");

        Self {
            instance_id,
            key,
            instances,
            cache: cache.clone(),
            subscription,
            scope: cache.cancellation_token().child_token(),
            settings,
            banner: Mutex::new(None),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn state(&self) -> QueryState<AdminWorkflowProgress> {
        self.subscription.state()
    }

    pub fn progress(&self) -> Option<Arc<AdminWorkflowProgress>> {
        self.subscription.state().data
    }

    /// Interpreted stage of the latest progress, if loaded.
    pub fn stage(&self) -> Result<TrackingStage, TrackerError> {
        let progress = self.progress().ok_or(TrackerError::NotLoaded)?;
        Ok(TrackingStage::from_progress(&progress)?)
    }

    /// Wait for the next published state.
    pub async fn changed(&mut self) -> Option<QueryState<AdminWorkflowProgress>> {
        self.subscription.changed().await
    }

    /// Wait until the loaded progress satisfies `predicate`.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&AdminWorkflowProgress) -> bool,
    ) -> Option<Arc<AdminWorkflowProgress>> {
        self.subscription
            .wait_for(|s| s.data.as_deref().is_some_and(&mut predicate))
            .await
            .and_then(|s| s.data)
    }

    /// Wait for the first load to finish, successfully or not.
    pub async fn loaded(&mut self) -> Result<Arc<AdminWorkflowProgress>, TrackerError> {
        let state = self
            .subscription
            .wait_for(|s| s.data.is_some() || s.error.is_some())
            .await
            .ok_or(TrackerError::NotLoaded)?;
        match (state.data, state.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error.into()),
            (None, None) => Err(TrackerError::NotLoaded),
        }
    }

    /// Wait for progress fetched after `since`.
    pub async fn refreshed_since(&mut self, since: Instant) -> Option<Arc<AdminWorkflowProgress>> {
        self.subscription
            .wait_for(|s| !s.is_fetching && s.updated_at.is_some_and(|at| at > since))
            .await
            .and_then(|s| s.data)
    }

    pub fn refresh(&self) {
        self.subscription.refresh();
    }

    /// Last error shown on the tracker, cleared by the next successful action.
    pub fn banner(&self) -> Option<String> {
        self.banner_slot().clone()
    }

    /// Mount the input component for the current pause, if any.
    pub fn input_collector(&self) -> Result<InputCollector, TrackerError> {
        let progress = self.progress().ok_or(TrackerError::NotLoaded)?;
        match InputRequest::from_progress(&progress)? {
            Some(request) => Ok(InputCollector::mount(request)),
            None => Err(TrackerError::NotAwaitingInput(progress.status.clone())),
        }
    }

    /// Start the instance, then refetch its progress.
    pub async fn start(&self) -> Result<(), TrackerError> {
        let result = self.instances.start(&self.instance_id).await;
        let result = self.record(result.map_err(TrackerError::from))?;
        tracing::info!(instance_id = %self.instance_id, response = %result, "Instance started");
        self.cache.invalidate(&self.key);
        self.cache.invalidate_operation(keys::INSTANCES_LIST);
        self.cache.invalidate_operation(keys::ASSIGNMENTS);
        Ok(())
    }

    /// Validate and submit collected input.
    ///
    /// Local validation failures never reach the server. After a successful
    /// submit the progress is refetched once the refresh delay has passed.
    pub async fn submit(&self, collector: &InputCollector) -> Result<serde_json::Value, TrackerError> {
        let payload = match collector.to_payload() {
            Ok(payload) => payload,
            Err(e) => return self.record(Err(e.into())),
        };
        let result = self
            .instances
            .submit_data(&self.instance_id, &payload)
            .await
            .map_err(TrackerError::from);
        let response = self.record(result)?;

        tracing::info!(
            instance_id = %self.instance_id,
            step_id = collector.step_id(),
            kind = ?collector.kind(),
            "Input submitted",
        );
        self.schedule_refresh(self.settings.submit_refresh_delay);
        Ok(response)
    }

    /// Stop polling and cancel pending refreshes.
    pub fn stop(&self) {
        self.scope.cancel();
        self.subscription.stop();
    }

    // ---- private helpers ----

    fn schedule_refresh(&self, delay: Duration) {
        let cache = self.cache.clone();
        let key = self.key.clone();
        let scope = self.scope.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = scope.cancelled() => {}
                _ = tokio::time::sleep(delay) => cache.invalidate(&key),
            }
        });
    }

    fn record<T>(&self, result: Result<T, TrackerError>) -> Result<T, TrackerError> {
        let mut banner = self.banner_slot();
        match &result {
            Ok(_) => *banner = None,
            Err(e) => {
                tracing::warn!(instance_id = %self.instance_id, error = %e, "Tracker action failed");
                *banner = Some(e.banner());
            }
        }
        result
    }

    fn banner_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.banner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for InstanceTracker {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
