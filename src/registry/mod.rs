use crate::error::LookupError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub mod npm;
pub use npm::NpmRegistry;

/// Published versions and distribution tags of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packument {
    pub versions: BTreeSet<String>,
    pub dist_tags: BTreeMap<String, String>,
}

impl Packument {
    /// Version pointed to by the `latest` tag.
    pub fn latest(&self) -> Option<&str> {
        self.dist_tags.get("latest").map(String::as_str)
    }
}

pub trait RegistryLookup: Send + Sync {
    fn packument(&self, name: &str) -> Result<Packument, LookupError>;
}

impl<T: RegistryLookup + ?Sized> RegistryLookup for Arc<T> {
    fn packument(&self, name: &str) -> Result<Packument, LookupError> {
        (**self).packument(name)
    }
}
