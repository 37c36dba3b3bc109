//! Node identifiers.
//!
//! Ids are interned so nodes, selections and raster jobs can pass them around
//! by value. Generated ids read like `text_3` or `placeholder_12`, which keeps
//! saved documents legible.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);
static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    pub fn intern(name: &str) -> Self {
        Self(NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &str {
        NAMES.resolve(&self.0)
    }

    /// `<prefix>_<n>` with a process-wide counter.
    ///
    /// Only unique among generated ids. Ids loaded from a document can still
    /// collide, so `SceneGraph::fresh_id` re-checks against the scene.
    pub fn with_prefix(prefix: &str) -> Self {
        let n = NEXT_SUFFIX.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Ok(Self::intern(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn same_name_same_id() {
        let a = NodeId::intern("serial_text");
        assert_eq!(a, NodeId::intern("serial_text"));
        assert_eq!(a.as_str(), "serial_text");
    }

    #[test]
    fn generated_ids_differ_and_keep_prefix() {
        let a = NodeId::with_prefix("text");
        let b = NodeId::with_prefix("text");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("text_"));
        assert_eq!(NodeId::intern("logo").to_string(), "logo");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = NodeId::intern("ph_barcode");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ph_barcode\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
