use crate::error::MigrateResult;
use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtensionRegistryError {
    /// The provided extension was already registered. Contains the [`type_name`]
    /// of the provided extension.
    #[error("The provided extension was already registered: `{0}`")]
    AlreadyRegistered(String),

    /// Unable to find an extension instance of the requested type. Contains the [`type_name`]
    /// of the requested type.
    #[error("Unable to find an extension instance of type `{0}`")]
    NotRegistered(String),

    /// Unable to downcast the registered instance to the requested type. Contains the
    /// [`type_name`] of the requested type.
    #[error("Unable to downcast the registered extension instance to type `{0}`")]
    Downcast(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The app's extensible-state bag. Holds at most one instance per type; the type acts as the
/// fixed key an extension is stored under.
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: BTreeMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ExtensionRegistry {
    /// Register an extension, failing if an extension of the same type is already registered.
    pub fn register<T>(&mut self, extension: T) -> MigrateResult<&mut Self>
    where
        T: 'static + Send + Sync,
    {
        info!(name=%type_name::<T>(), "Registering extension");

        if self.contains::<T>() {
            return Err(
                ExtensionRegistryError::AlreadyRegistered(type_name::<T>().to_owned()).into(),
            );
        }
        self.extensions.insert(TypeId::of::<T>(), Box::new(extension));
        Ok(self)
    }

    /// Store an extension, replacing any previous instance of the same type. Returns `true` if
    /// an instance was replaced.
    pub fn insert<T>(&mut self, extension: T) -> bool
    where
        T: 'static + Send + Sync,
    {
        let replaced = self
            .extensions
            .insert(TypeId::of::<T>(), Box::new(extension))
            .is_some();
        if replaced {
            debug!(name=%type_name::<T>(), "Replaced extension");
        } else {
            info!(name=%type_name::<T>(), "Registering extension");
        }
        replaced
    }

    pub fn get<T>(&self) -> MigrateResult<&T>
    where
        T: 'static + Send + Sync,
    {
        let extension = self
            .extensions
            .get(&TypeId::of::<T>())
            .ok_or_else(|| ExtensionRegistryError::NotRegistered(type_name::<T>().to_string()))?
            .downcast_ref::<T>()
            .ok_or_else(|| ExtensionRegistryError::Downcast(type_name::<T>().to_string()))?;
        Ok(extension)
    }

    /// Like [`ExtensionRegistry::get`], but returns `None` instead of an error when no
    /// extension of the type is registered.
    pub fn find<T>(&self) -> Option<&T>
    where
        T: 'static + Send + Sync,
    {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|extension| extension.downcast_ref::<T>())
    }

    pub fn contains<T>(&self) -> bool
    where
        T: 'static + Send + Sync,
    {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}
