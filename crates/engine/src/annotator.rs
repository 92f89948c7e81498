//! Pre-write hooks: the last-applied snapshot annotation and controller
//! owner-reference stamping.
//!
//! Both are pure mutations of the object about to be written; neither
//! performs I/O. The snapshot is the diff baseline the patch checker reads
//! on every update decision.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use converge_store::{Object, OwnerReference};

/// Annotation key under which the last-applied snapshot is stored.
pub const LAST_APPLIED_ANNOTATION: &str = "converge.io/last-applied";

/// Stamps objects with a serialized snapshot of the fields this engine
/// writes, read back later as the previous-desired operand of the three-way
/// diff.
#[derive(Debug, Clone)]
pub struct Annotator {
    key: String,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(LAST_APPLIED_ANNOTATION)
    }
}

impl Annotator {
    /// Create an annotator using the given annotation key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The annotation key in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The projection of an object onto the fields this engine declares as
    /// desired state: labels, annotations (minus the snapshot itself),
    /// owner references, and spec. Status and server-populated metadata
    /// (uid, resource version) are never part of the projection.
    pub fn applied_fields(&self, obj: &Object) -> Result<Value> {
        let mut annotations = obj.metadata.annotations.clone();
        annotations.remove(&self.key);

        let mut fields = Map::new();
        fields.insert("labels".into(), to_value(&obj.metadata.labels)?);
        fields.insert("annotations".into(), to_value(&annotations)?);
        fields.insert(
            "ownerReferences".into(),
            to_value(&obj.metadata.owner_references)?,
        );
        fields.insert("spec".into(), obj.spec.clone());
        Ok(Value::Object(fields))
    }

    /// Stamp the object with a snapshot of its own applied fields.
    pub fn set_last_applied(&self, obj: &mut Object) -> Result<()> {
        let fields = self.applied_fields(obj)?;
        let raw = serde_json::to_string(&fields).map_err(|e| Error::snapshot(e.to_string()))?;
        obj.metadata.annotations.insert(self.key.clone(), raw);
        Ok(())
    }

    /// Read back the snapshot stamped by a previous write, if any.
    pub fn last_applied(&self, obj: &Object) -> Result<Option<Value>> {
        match obj.metadata.annotations.get(&self.key) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| Error::snapshot(e.to_string())),
        }
    }
}

/// Stamp `obj` with a controller owner reference to `owner`.
///
/// Idempotent for the same owner; a different existing controller reference
/// is an error, since an object has at most one managing controller.
pub fn set_controller_reference(owner: &Object, obj: &mut Object) -> Result<()> {
    let uid = owner
        .metadata
        .uid
        .ok_or_else(|| Error::decision(format!("owner {} has no uid", owner.key())))?;

    if let Some(existing) = obj.controller_ref() {
        if existing.uid == uid {
            return Ok(());
        }
        return Err(Error::decision(format!(
            "object {} is already controlled by {} '{}'",
            obj.key(),
            existing.kind,
            existing.name
        )));
    }

    obj.metadata.owner_references.push(OwnerReference {
        kind: owner.kind.clone(),
        name: owner.metadata.name.clone(),
        uid,
        controller: true,
    });
    Ok(())
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::snapshot(e.to_string()))
}
