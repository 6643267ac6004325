use alloc::sync::Arc;
use core::fmt;

use crate::value::ObjectCell;

/// A lifecycle callback, given the object being processed.
pub type Hook = Arc<dyn Fn(&mut ObjectCell) + Send + Sync>;

// -----------------------------------------------------------------------------
// HookPoint

/// The points of a session where hooks run.
///
/// For one object the order is always serializing, serialized on the way out
/// and deserializing, deserialized on the way in. Along an inheritance chain
/// the hooks of the base type run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before the object's node is written.
    Serializing,
    /// After the object's node and all its layers are written.
    Serialized,
    /// Right after the object is allocated, before any field is read.
    Deserializing,
    /// After every layer has been read.
    Deserialized,
}

// -----------------------------------------------------------------------------
// LifecycleHooks

/// The optional hooks of one type.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    serializing: Option<Hook>,
    serialized: Option<Hook>,
    deserializing: Option<Hook>,
    deserialized: Option<Hook>,
}

impl LifecycleHooks {
    #[inline]
    pub const fn new() -> Self {
        Self {
            serializing: None,
            serialized: None,
            deserializing: None,
            deserialized: None,
        }
    }

    /// Sets the hook of `point`, replacing any previous one.
    pub fn on(mut self, point: HookPoint, hook: impl Fn(&mut ObjectCell) + Send + Sync + 'static) -> Self {
        *self.slot(point) = Some(Arc::new(hook));
        self
    }

    #[inline]
    pub fn get(&self, point: HookPoint) -> Option<&Hook> {
        match point {
            HookPoint::Serializing => self.serializing.as_ref(),
            HookPoint::Serialized => self.serialized.as_ref(),
            HookPoint::Deserializing => self.deserializing.as_ref(),
            HookPoint::Deserialized => self.deserialized.as_ref(),
        }
    }

    /// Runs the hook of `point`, if set.
    #[inline]
    pub fn invoke(&self, point: HookPoint, object: &mut ObjectCell) {
        if let Some(hook) = self.get(point) {
            hook(object);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.serializing.is_none()
            && self.serialized.is_none()
            && self.deserializing.is_none()
            && self.deserialized.is_none()
    }

    fn slot(&mut self, point: HookPoint) -> &mut Option<Hook> {
        match point {
            HookPoint::Serializing => &mut self.serializing,
            HookPoint::Serialized => &mut self.serialized,
            HookPoint::Deserializing => &mut self.deserializing,
            HookPoint::Deserialized => &mut self.deserialized,
        }
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("serializing", &self.serializing.is_some())
            .field("serialized", &self.serialized.is_some())
            .field("deserializing", &self.deserializing.is_some())
            .field("deserialized", &self.deserialized.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
