use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use cask_archive::NodeKind;
use slotmap::SlotMap;

use super::Value;

slotmap::new_key_type! {
    /// Handle to a cell owned by a [`Heap`].
    ///
    /// Handles are the identity the engine tracks: two handles are the same
    /// object exactly when they compare equal.
    pub struct HeapKey;
}

// -----------------------------------------------------------------------------
// ArrayCell

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayCell {
    /// Declared type of every element.
    pub element_type: String,
    pub elements: Vec<Value>,
}

impl ArrayCell {
    #[inline]
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            elements: Vec::new(),
        }
    }

    #[inline]
    pub fn with_elements(mut self, elements: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.elements.extend(elements.into_iter().map(Into::into));
        self
    }

    /// `<element>[]`
    #[inline]
    pub fn static_type(&self) -> String {
        format!("{}[]", self.element_type)
    }
}

// -----------------------------------------------------------------------------
// MapCell

/// An associative container keeping insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapCell {
    pub key_type: String,
    pub value_type: String,
    pub entries: Vec<(Value, Value)>,
}

impl MapCell {
    #[inline]
    pub fn new(key_type: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            key_type: key_type.into(),
            value_type: value_type.into(),
            entries: Vec::new(),
        }
    }

    /// Inserts an entry, replacing the value of an equal key.
    ///
    /// Keys are compared by value, so two handles are different keys even if
    /// the cells behind them hold equal data.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `map<K,V>`
    #[inline]
    pub fn static_type(&self) -> String {
        format!("map<{},{}>", self.key_type, self.value_type)
    }
}

// -----------------------------------------------------------------------------
// ObjectCell

/// The fields one type of an inheritance chain contributes to an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectLayer {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl ObjectLayer {
    #[inline]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    #[inline]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.field_mut(&name) {
            Some(slot) => Some(core::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }
}

/// An instance of a class-like type, split into one layer per type of its
/// inheritance chain, base first.
///
/// Field lookups by bare name search the most derived layer first, so a field
/// shadowed by a subtype resolves to the subtype's copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectCell {
    runtime_type: String,
    layers: Vec<ObjectLayer>,
}

impl ObjectCell {
    #[inline]
    pub fn new(runtime_type: impl Into<String>) -> Self {
        Self {
            runtime_type: runtime_type.into(),
            layers: Vec::new(),
        }
    }

    /// Appends a layer, which becomes the most derived one.
    #[inline]
    pub fn with_layer(mut self, layer: ObjectLayer) -> Self {
        self.layers.push(layer);
        self
    }

    #[inline]
    pub fn runtime_type(&self) -> &str {
        &self.runtime_type
    }

    #[inline]
    pub fn layers(&self) -> &[ObjectLayer] {
        &self.layers
    }

    pub fn layer(&self, type_name: &str) -> Option<&ObjectLayer> {
        self.layers.iter().find(|l| l.type_name == type_name)
    }

    pub fn layer_mut(&mut self, type_name: &str) -> Option<&mut ObjectLayer> {
        self.layers.iter_mut().find(|l| l.type_name == type_name)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.layers.iter().rev().find_map(|l| l.field(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.layers.iter_mut().rev().find_map(|l| l.field_mut(name))
    }

    /// Sets a field by bare name.
    ///
    /// An existing field is overwritten in the layer that owns it; a new field
    /// goes to the most derived layer. Returns the previous value.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        if let Some(slot) = self.field_mut(name) {
            return Some(core::mem::replace(slot, value));
        }
        if self.layers.is_empty() {
            self.layers.push(ObjectLayer::new(self.runtime_type.clone()));
        }
        if let Some(layer) = self.layers.last_mut() {
            layer.fields.push((name.into(), value));
        }
        None
    }
}

// -----------------------------------------------------------------------------
// HeapCell

/// Anything with identity.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapCell {
    Array(ArrayCell),
    Map(MapCell),
    Object(ObjectCell),
    /// A shared pointer to one value.
    Boxed(Value),
}

impl HeapCell {
    /// The archive node kind this cell is written as.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Array(_) => NodeKind::Array,
            Self::Map(_) => NodeKind::Map,
            Self::Object(_) => NodeKind::Object,
            Self::Boxed(_) => NodeKind::Pointer,
        }
    }

    /// The static type written for this cell when no type is declared.
    pub fn static_type(&self) -> String {
        match self {
            Self::Array(array) => array.static_type(),
            Self::Map(map) => map.static_type(),
            Self::Object(object) => object.runtime_type.clone(),
            Self::Boxed(_) => NodeKind::Pointer.as_str().into(),
        }
    }
}

impl From<ArrayCell> for HeapCell {
    #[inline]
    fn from(value: ArrayCell) -> Self {
        Self::Array(value)
    }
}

impl From<MapCell> for HeapCell {
    #[inline]
    fn from(value: MapCell) -> Self {
        Self::Map(value)
    }
}

impl From<ObjectCell> for HeapCell {
    #[inline]
    fn from(value: ObjectCell) -> Self {
        Self::Object(value)
    }
}

// -----------------------------------------------------------------------------
// Heap

/// Arena owning every identity bearing cell of a value graph.
///
/// # Examples
///
/// ```
/// use cask_serial::value::{ArrayCell, Heap, HeapCell, Value};
///
/// let mut heap = Heap::new();
/// let shared = heap.alloc(HeapCell::Boxed(Value::from(7_i32)));
/// let list = heap.alloc(ArrayCell::new("pointer").with_elements([shared, shared]));
///
/// let elements = &heap.array(list).unwrap().elements;
/// assert_eq!(elements[0], elements[1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Heap {
    cells: SlotMap<HeapKey, HeapCell>,
}

impl Heap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self, cell: impl Into<HeapCell>) -> HeapKey {
        self.cells.insert(cell.into())
    }

    #[inline]
    pub fn get(&self, key: HeapKey) -> Option<&HeapCell> {
        self.cells.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: HeapKey) -> Option<&mut HeapCell> {
        self.cells.get_mut(key)
    }

    #[inline]
    pub fn remove(&mut self, key: HeapKey) -> Option<HeapCell> {
        self.cells.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: HeapKey) -> bool {
        self.cells.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (HeapKey, &HeapCell)> {
        self.cells.iter()
    }

    pub fn array(&self, key: HeapKey) -> Option<&ArrayCell> {
        match self.cells.get(key)? {
            HeapCell::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn array_mut(&mut self, key: HeapKey) -> Option<&mut ArrayCell> {
        match self.cells.get_mut(key)? {
            HeapCell::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn map(&self, key: HeapKey) -> Option<&MapCell> {
        match self.cells.get(key)? {
            HeapCell::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn map_mut(&mut self, key: HeapKey) -> Option<&mut MapCell> {
        match self.cells.get_mut(key)? {
            HeapCell::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn object(&self, key: HeapKey) -> Option<&ObjectCell> {
        match self.cells.get(key)? {
            HeapCell::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn object_mut(&mut self, key: HeapKey) -> Option<&mut ObjectCell> {
        match self.cells.get_mut(key)? {
            HeapCell::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn boxed(&self, key: HeapKey) -> Option<&Value> {
        match self.cells.get(key)? {
            HeapCell::Boxed(value) => Some(value),
            _ => None,
        }
    }

    pub fn boxed_mut(&mut self, key: HeapKey) -> Option<&mut Value> {
        match self.cells.get_mut(key)? {
            HeapCell::Boxed(value) => Some(value),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Heap, HeapCell, MapCell, ObjectCell, ObjectLayer};
    use crate::value::Value;
    use cask_archive::NodeKind;

    #[test]
    fn typed_access() {
        let mut heap = Heap::new();
        let map = heap.alloc(MapCell::new("i32", "string"));
        assert!(heap.array(map).is_none());
        assert_eq!(heap.get(map).map(HeapCell::kind), Some(NodeKind::Map));
        assert_eq!(heap.get(map).unwrap().static_type(), "map<i32,string>");

        let cell = heap.map_mut(map).unwrap();
        assert_eq!(cell.insert(1_i32, "a"), None);
        assert_eq!(cell.insert(1_i32, "b"), Some(Value::from("a")));
        assert_eq!(cell.len(), 1);
        assert_eq!(cell.get(&Value::from(1_i32)), Some(&Value::from("b")));

        assert!(heap.remove(map).is_some());
        assert!(!heap.contains(map));
        assert!(heap.is_empty());
    }

    #[test]
    fn object_layers() {
        let mut object = ObjectCell::new("Dog")
            .with_layer(ObjectLayer::new("Animal").with_field("name", "rex").with_field("legs", 4_i32))
            .with_layer(ObjectLayer::new("Dog").with_field("legs", 3_i32));

        // The derived layer shadows the base one.
        assert_eq!(object.field("legs"), Some(&Value::from(3_i32)));
        assert_eq!(object.layer("Animal").unwrap().field("legs"), Some(&Value::from(4_i32)));

        assert_eq!(object.set_field("name", "max"), Some(Value::from("rex")));
        assert_eq!(object.layer("Animal").unwrap().field("name"), Some(&Value::from("max")));

        assert_eq!(object.set_field("good", true), None);
        assert_eq!(object.layer("Dog").unwrap().field("good"), Some(&Value::from(true)));
    }

    #[test]
    fn object_without_layers() {
        let mut object = ObjectCell::new("Unit");
        object.set_field("x", 1_i32);
        assert_eq!(object.layers().len(), 1);
        assert_eq!(object.layers()[0].type_name, "Unit");
    }
}
