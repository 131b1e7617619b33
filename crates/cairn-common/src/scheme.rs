//! Registry of the object kinds Cairn understands
//!
//! Manifests are decoded by looking up their `apiVersion` and `kind` in a
//! [`Scheme`]. The scheme is an ordinary value: build it once at startup
//! with [`Scheme::with_defaults`] and pass it by reference to whatever needs
//! to decode or encode objects.

use std::collections::BTreeMap;

use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::crd::{Cluster, InstanceGroup};
use crate::{Error, Result};

/// A decoded object of any registered kind
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// A Cluster specification
    Cluster(Cluster),
    /// An InstanceGroup specification
    InstanceGroup(InstanceGroup),
}

impl Object {
    /// Kind string of the wrapped object
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cluster(_) => "Cluster",
            Self::InstanceGroup(_) => "InstanceGroup",
        }
    }

    /// Name of the wrapped object
    pub fn name(&self) -> &str {
        match self {
            Self::Cluster(c) => c.name(),
            Self::InstanceGroup(ig) => ig.name(),
        }
    }
}

impl From<Cluster> for Object {
    fn from(value: Cluster) -> Self {
        Self::Cluster(value)
    }
}

impl From<InstanceGroup> for Object {
    fn from(value: InstanceGroup) -> Self {
        Self::InstanceGroup(value)
    }
}

/// A resource type that can be registered in a [`Scheme`]
pub trait SchemeObject: Resource<DynamicType = ()> + DeserializeOwned + Into<Object> {}

impl<T> SchemeObject for T where T: Resource<DynamicType = ()> + DeserializeOwned + Into<Object> {}

type DecodeFn = fn(serde_yaml::Value) -> Result<Object>;

fn decode_as<T: SchemeObject>(value: serde_yaml::Value) -> Result<Object> {
    serde_yaml::from_value::<T>(value)
        .map(Into::into)
        .map_err(|e| Error::serialization_for_kind(T::kind(&()), e.to_string()))
}

/// `apiVersion` and `kind` of a manifest
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeMeta {
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Known kinds keyed by `(apiVersion, kind)`
#[derive(Default)]
pub struct Scheme {
    kinds: BTreeMap<(String, String), DecodeFn>,
}

impl std::fmt::Debug for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheme")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Scheme {
    /// An empty scheme
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheme with Cluster and InstanceGroup registered
    pub fn with_defaults() -> Result<Self> {
        let mut scheme = Self::new();
        scheme.register::<Cluster>()?;
        scheme.register::<InstanceGroup>()?;
        Ok(scheme)
    }

    /// Register a kind; registering the same kind twice is an error
    pub fn register<T: SchemeObject>(&mut self) -> Result<()> {
        let key = (
            T::api_version(&()).into_owned(),
            T::kind(&()).into_owned(),
        );
        if self.kinds.contains_key(&key) {
            return Err(Error::scheme(format!(
                "kind {}/{} is already registered",
                key.0, key.1
            )));
        }
        self.kinds.insert(key, decode_as::<T>);
        Ok(())
    }

    /// Returns true if `(api_version, kind)` is registered
    pub fn recognizes(&self, api_version: &str, kind: &str) -> bool {
        self.kinds
            .contains_key(&(api_version.to_string(), kind.to_string()))
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Decode a single YAML document
    pub fn decode(&self, input: &str) -> Result<Object> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(input).map_err(|e| Error::serialization(e.to_string()))?;
        self.decode_value(value)
    }

    /// Decode every document in a multi-document YAML stream
    ///
    /// Empty documents (e.g. a leading `---`) are skipped.
    pub fn decode_all(&self, input: &str) -> Result<Vec<Object>> {
        let mut objects = Vec::new();
        for document in serde_yaml::Deserializer::from_str(input) {
            let value = serde_yaml::Value::deserialize(document)
                .map_err(|e| Error::serialization(e.to_string()))?;
            if value.is_null() {
                continue;
            }
            objects.push(self.decode_value(value)?);
        }
        Ok(objects)
    }

    fn decode_value(&self, value: serde_yaml::Value) -> Result<Object> {
        let meta: TypeMeta = serde_yaml::from_value(value.clone())
            .map_err(|e| Error::serialization(e.to_string()))?;
        let api_version = meta
            .api_version
            .ok_or_else(|| Error::scheme("object has no apiVersion"))?;
        let kind = meta
            .kind
            .ok_or_else(|| Error::scheme("object has no kind"))?;

        let decode = self
            .kinds
            .get(&(api_version.clone(), kind.clone()))
            .ok_or_else(|| {
                Error::scheme(format!("no kind {kind:?} is registered for {api_version}"))
            })?;
        decode(value)
    }

    /// Encode an object as a YAML document
    pub fn encode(&self, object: &Object) -> Result<String> {
        let encoded = match object {
            Object::Cluster(c) => serde_yaml::to_string(c),
            Object::InstanceGroup(ig) => serde_yaml::to_string(ig),
        };
        encoded.map_err(|e| Error::serialization_for_kind(object.kind(), e.to_string()))
    }
}
