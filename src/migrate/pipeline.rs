use crate::engine::EngineConfig;
use crate::error::MigrateResult;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};

/// A single transformation step of a [`ConfigPipeline`].
pub type ConfigStep = Arc<dyn Send + Sync + Fn(EngineConfig) -> EngineConfig>;

/// Ordered list of user-supplied [`EngineConfig`] transformations, applied left to right to
/// every config built for a command.
///
/// Cloning is cheap and clones share the same steps, so a step registered through the
/// [`Migrate`][crate::migrate::Migrate] object after it was attached to an app still applies to
/// the commands run against that app.
#[derive(Clone, Default)]
pub struct ConfigPipeline {
    steps: Arc<RwLock<Vec<ConfigStep>>>,
}

impl ConfigPipeline {
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a step. Steps run in registration order.
    pub fn push<F>(&self, step: F) -> MigrateResult<()>
    where
        F: 'static + Send + Sync + Fn(EngineConfig) -> EngineConfig,
    {
        self.steps.write()?.push(Arc::new(step));
        Ok(())
    }

    pub fn len(&self) -> MigrateResult<usize> {
        Ok(self.steps.read()?.len())
    }

    pub fn is_empty(&self) -> MigrateResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Thread the config through every step.
    pub fn apply(&self, config: EngineConfig) -> MigrateResult<EngineConfig> {
        // Run the steps outside of the lock; a step may register further steps.
        let steps = self.steps.read()?.clone();
        Ok(steps.iter().fold(config, |config, step| step(config)))
    }
}

impl Debug for ConfigPipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let steps = self.steps.read().map(|steps| steps.len()).ok();
        f.debug_struct("ConfigPipeline")
            .field("steps", &steps)
            .finish()
    }
}
