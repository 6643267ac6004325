//! Whole sessions: values written by a [`Serializer`], rendered through a
//! real data format, and read back by a [`Deserializer`].

extern crate std;

use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::Mutex;

use cask_archive::{Archive, ArchiveNode, NodeHeader, NodeId, NodeKind, TreeArchive};

use crate::info::{CustomSerde, FieldInfo, HookPoint, TypeDescriptor};
use crate::registry::TypeRegistry;
use crate::value::{
    ArrayCell, EnumValue, Heap, HeapCell, MapCell, ObjectCell, PrimitiveType, StrValue, StructValue, Value,
};
use crate::{Config, Deserializer, Error, Serializer};

// -----------------------------------------------------------------------------
// Helpers

fn shapes() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::object("Shape").with_field(FieldInfo::new("name", "string")));
    registry.register(
        TypeDescriptor::object("Circle")
            .with_base("Shape")
            .with_field(FieldInfo::new("radius", "f64")),
    );
    registry.register(TypeDescriptor::object("Drawing").with_field(FieldInfo::new("main", "Shape")));
    registry
}

fn circle(registry: &TypeRegistry, heap: &mut Heap, name: &str, radius: f64) -> Value {
    let key = registry.instantiate("Circle", heap).unwrap();
    let object = heap.object_mut(key).unwrap();
    object.set_field("name", name);
    object.set_field("radius", radius);
    Value::Ref(key)
}

fn write(registry: &TypeRegistry, heap: &mut Heap, value: &Value) -> TreeArchive {
    let mut archive = TreeArchive::new();
    Serializer::new(registry, heap, &mut archive).serialize(value).unwrap();
    archive
}

fn read(registry: &TypeRegistry, archive: &mut TreeArchive) -> Result<(Heap, Value), Error> {
    let mut heap = Heap::new();
    let value = Deserializer::new(registry, &mut heap, archive).deserialize(None)?;
    Ok((heap, value))
}

/// Writes `value`, renders the archive as JSON, parses it back and reads it.
fn round_trip(registry: &TypeRegistry, heap: &mut Heap, value: &Value) -> (TreeArchive, Heap, Value) {
    let archive = write(registry, heap, value);
    let json = serde_json::to_string(archive.data()).unwrap();
    let mut loaded: TreeArchive = serde_json::from_str(&json).unwrap();
    let (out, back) = read(registry, &mut loaded).unwrap();
    assert!(heap.deep_eq(value, &out, &back), "{json}");
    (archive, out, back)
}

fn header(kind: NodeKind, static_type: &str, key: &str, id: u32) -> NodeHeader {
    NodeHeader::new(kind, static_type, key, NodeId::new(id))
}

fn leaf(archive: &mut TreeArchive, header: NodeHeader, raw: &str) {
    archive.begin_node(header).unwrap();
    archive.write_leaf_value(raw).unwrap();
    archive.end_node().unwrap();
}

/// Writes `Node { next: null }` under `key`, using ids `id..id + 3`.
fn null_node(archive: &mut TreeArchive, key: &str, id: u32) {
    archive
        .begin_node(header(NodeKind::Object, "Node", key, id).with_runtime_type("Node"))
        .unwrap();
    archive.begin_node(header(NodeKind::Base, "Node", "Node", id + 1)).unwrap();
    archive.begin_node(header(NodeKind::Null, "Node", "next", id + 2)).unwrap();
    archive.end_node().unwrap();
    archive.end_node().unwrap();
    archive.end_node().unwrap();
}

fn nodes() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::object("Node").with_field(FieldInfo::new("next", "Node")));
    registry
}

// -----------------------------------------------------------------------------
// Value shapes

#[test]
fn plain_values() {
    let registry = TypeRegistry::new();
    let mut heap = Heap::new();
    let value = Value::from(
        StructValue::new("Mixed")
            .with_field("flag", true)
            .with_field("letter", 'λ')
            .with_field("small", -8_i8)
            .with_field("big", u64::MAX)
            .with_field("single", 0.1_f32)
            .with_field("double", core::f64::consts::PI)
            .with_field("narrow", "plain")
            .with_field("wide", StrValue::wide("wide"))
            .with_field("full", StrValue::full("full"))
            .with_field("nothing", Value::Null)
            .with_field("nested", StructValue::new("Inner").with_field("n", 1_u16)),
    );

    let (archive, _, back) = round_trip(&registry, &mut heap, &value);
    assert_eq!(back, value);

    let root = archive.root().unwrap();
    assert_eq!(root.child("wide").unwrap().header.static_type, "wstring");
    assert_eq!(root.child("big").unwrap().value(), Some("18446744073709551615"));
    assert_eq!(root.child("nothing").unwrap().kind(), NodeKind::Null);
}

#[test]
fn ids_follow_traversal_order() {
    let registry = TypeRegistry::new();
    let mut heap = Heap::new();
    let list = heap.alloc(ArrayCell::new("i32").with_elements([1_i32, 2, 3]));
    let archive = write(&registry, &mut heap, &Value::Ref(list));

    let ids: Vec<u32> = archive.root().unwrap().descendants().iter().map(|n| n.id().get()).collect();
    assert_eq!(ids, [0, 1, 2, 3]);
}

#[test]
fn registered_struct_skips_fields() {
    let mut registry = TypeRegistry::new();
    registry.register(
        TypeDescriptor::structure("Settings")
            .with_field(FieldInfo::new("name", "string"))
            .with_field(FieldInfo::new("retries", "u8").with_default(3_u8))
            .with_field(FieldInfo::new("cache", "u32").with_default(0_u32).skipped()),
    );
    let mut heap = Heap::new();
    let value = Value::from(
        StructValue::new("Settings")
            .with_field("cache", 99_u32)
            .with_field("retries", 5_u8)
            .with_field("name", "main"),
    );

    let mut archive = write(&registry, &mut heap, &value);
    let keys: Vec<&str> = archive.root().unwrap().children.iter().map(ArchiveNode::key).collect();
    assert_eq!(keys, ["name", "retries"]);

    let (_, back) = read(&registry, &mut archive).unwrap();
    let expected = StructValue::new("Settings")
        .with_field("name", "main")
        .with_field("retries", 5_u8)
        .with_field("cache", 0_u32);
    assert_eq!(back, Value::from(expected));
}

#[test]
fn custom_struct_override() {
    fn save(point: &StructValue, ser: &mut Serializer<'_>) -> Result<(), Error> {
        let coord = |name| point.field(name).and_then(Value::as_primitive).map(ToString::to_string);
        let packed = alloc::format!(
            "{},{}",
            coord("x").unwrap_or_default(),
            coord("y").unwrap_or_default()
        );
        ser.serialize_field("xy", &Value::from(packed))?;
        Ok(())
    }

    fn load(point: &mut StructValue, de: &mut Deserializer<'_>) -> Result<(), Error> {
        let packed = de.deserialize_field("xy", Some("string"))?;
        let text = packed.as_str().ok_or_else(|| Error::custom("`xy` is not a string"))?;
        let (x, y) = text.split_once(',').ok_or_else(|| Error::custom("`xy` lacks a comma"))?;
        point.set_field("x", x.parse::<i32>().map_err(Error::custom)?);
        point.set_field("y", y.parse::<i32>().map_err(Error::custom)?);
        Ok(())
    }

    let mut registry = TypeRegistry::new();
    registry.register(
        TypeDescriptor::structure("Point")
            .with_field(FieldInfo::new("x", "i32"))
            .with_field(FieldInfo::new("y", "i32"))
            .with_custom(CustomSerde::new(save, load)),
    );
    let mut heap = Heap::new();
    let value = Value::from(StructValue::new("Point").with_field("x", 3_i32).with_field("y", -4_i32));

    let (archive, _, back) = round_trip(&registry, &mut heap, &value);
    assert_eq!(back, value);

    let root = archive.root().unwrap();
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.child("xy").unwrap().value(), Some("3,-4"));
}

#[test]
fn enums() {
    let mut registry = TypeRegistry::new();
    registry.register(
        TypeDescriptor::enumeration("Color", PrimitiveType::U8)
            .with_member("Red", 0)
            .with_member("Green", 1),
    );
    let mut heap = Heap::new();
    let value = Value::from(StructValue::new("Pixel").with_field("c", EnumValue::new("Color", "Green")));

    let (archive, _, back) = round_trip(&registry, &mut heap, &value);
    assert_eq!(back, value);

    let node = archive.root().unwrap().child("c").unwrap();
    assert_eq!(node.header.base_type.as_deref(), Some("u8"));
    assert_eq!(node.value(), Some("Green"));

    // A member unknown to the reader.
    let mut root = archive.into_root().unwrap();
    root.children[0].value = Some("Blue".into());
    let err = read(&registry, &mut TreeArchive::from_root(root)).unwrap_err();
    assert!(matches!(err, Error::UnknownMember { ref member, .. } if member == "Blue"));
}

#[test]
fn enum_errors() {
    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::enumeration("Color", PrimitiveType::U8).with_member("Red", 0));
    let mut heap = Heap::new();

    let mut archive = TreeArchive::new();
    let err = Serializer::new(&registry, &mut heap, &mut archive)
        .serialize(&Value::from(EnumValue::new("Color", "Blue")))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownMember { .. }));

    let mut archive = TreeArchive::new();
    let err = Serializer::new(&registry, &mut heap, &mut archive)
        .serialize(&Value::from(EnumValue::new("Shade", "Dark")))
        .unwrap_err();
    assert!(matches!(err, Error::UnregisteredType { ref type_name, .. } if type_name == "Shade"));
}

// -----------------------------------------------------------------------------
// Identity

#[test]
fn aliased_maps() {
    let mut registry = TypeRegistry::new();
    registry.register(
        TypeDescriptor::object("K")
            .with_field(FieldInfo::new("a", "map<i32,i32>"))
            .with_field(FieldInfo::new("b", "map<i32,i32>")),
    );
    let mut heap = Heap::new();
    let mut map = MapCell::new("i32", "i32");
    map.insert(1_i32, 10_i32);
    map.insert(2_i32, 20_i32);
    let map = heap.alloc(map);
    let k = registry.instantiate("K", &mut heap).unwrap();
    heap.object_mut(k).unwrap().set_field("a", map);
    heap.object_mut(k).unwrap().set_field("b", map);

    let (archive, out, back) = round_trip(&registry, &mut heap, &Value::Ref(k));

    let layer = &archive.root().unwrap().children[0];
    let (a, b) = (layer.child("a").unwrap(), layer.child("b").unwrap());
    assert_eq!(a.kind(), NodeKind::Map);
    assert_eq!(a.header.length, Some(2));
    assert_eq!(b.kind(), NodeKind::Reference);
    assert_eq!(b.value(), Some(a.id().to_string().as_str()));

    let object = out.object(back.handle().unwrap()).unwrap();
    assert_eq!(object.field("a"), object.field("b"));
    assert_eq!(out.len(), 2);
}

#[test]
fn map_entry_aliases_its_key() {
    let registry = nodes();
    let mut heap = Heap::new();
    let node = registry.instantiate("Node", &mut heap).unwrap();
    let mut map = MapCell::new("Node", "Node");
    map.insert(node, node);
    let map = heap.alloc(map);

    let (archive, out, back) = round_trip(&registry, &mut heap, &Value::Ref(map));

    let entry = &archive.root().unwrap().children[0];
    let (key, value) = (entry.child("key").unwrap(), entry.child("value").unwrap());
    assert_eq!(key.kind(), NodeKind::Object);
    assert_eq!(value.kind(), NodeKind::Reference);
    assert_eq!(value.value(), Some(key.id().to_string().as_str()));

    let entries = &out.map(back.handle().unwrap()).unwrap().entries;
    assert_eq!(entries[0].0, entries[0].1);
    assert_eq!(out.len(), 2);
}

#[test]
fn shared_pointer() {
    let registry = TypeRegistry::new();
    let mut heap = Heap::new();
    let shared = heap.alloc(HeapCell::Boxed(Value::from(StructValue::new("P").with_field("x", 1_i32))));
    let value = Value::from(StructValue::new("Pair").with_field("left", shared).with_field("right", shared));

    let (archive, out, back) = round_trip(&registry, &mut heap, &value);
    let root = archive.root().unwrap();
    assert_eq!(root.child("left").unwrap().kind(), NodeKind::Pointer);
    assert_eq!(root.child("right").unwrap().kind(), NodeKind::Reference);

    let pair = back.as_struct().unwrap();
    assert_eq!(pair.field("left"), pair.field("right"));
    let boxed = out.boxed(pair.field("left").unwrap().handle().unwrap()).unwrap();
    assert_eq!(boxed.as_struct().unwrap().field("x"), Some(&Value::from(1_i32)));
}

#[test]
fn cycles() {
    let registry = nodes();
    let mut heap = Heap::new();
    let a = registry.instantiate("Node", &mut heap).unwrap();
    let b = registry.instantiate("Node", &mut heap).unwrap();
    heap.object_mut(a).unwrap().set_field("next", b);
    heap.object_mut(b).unwrap().set_field("next", a);
    let list = heap.alloc(ArrayCell::new("Node").with_elements([a, b, a]));

    let (_, out, back) = round_trip(&registry, &mut heap, &Value::Ref(list));
    let elements = &out.array(back.handle().unwrap()).unwrap().elements;
    let (a, b) = (elements[0].handle().unwrap(), elements[1].handle().unwrap());
    assert_ne!(a, b);
    assert_eq!(elements[2], Value::Ref(a));
    assert_eq!(out.object(a).unwrap().field("next"), Some(&Value::Ref(b)));
    assert_eq!(out.object(b).unwrap().field("next"), Some(&Value::Ref(a)));
}

#[test]
fn self_referencing_array() {
    let registry = TypeRegistry::new();
    let mut heap = Heap::new();
    let list = heap.alloc(ArrayCell::new("any"));
    heap.array_mut(list).unwrap().elements.push(Value::Ref(list));

    let (_, out, back) = round_trip(&registry, &mut heap, &Value::Ref(list));
    let handle = back.handle().unwrap();
    assert_eq!(out.array(handle).unwrap().elements, [Value::Ref(handle)]);
}

#[test]
fn forward_reference() {
    let registry = nodes();
    let mut archive = TreeArchive::new();
    archive
        .begin_node(header(NodeKind::Array, "Node[]", "root", 0).with_length(2))
        .unwrap();
    leaf(&mut archive, header(NodeKind::Reference, "Node", "0", 1), "2");
    null_node(&mut archive, "1", 2);
    archive.end_node().unwrap();

    let mut heap = Heap::new();
    let value = Deserializer::new(&registry, &mut heap, &mut archive)
        .deserialize(Some("Node[]"))
        .unwrap();

    let elements = &heap.array(value.handle().unwrap()).unwrap().elements;
    assert_eq!(elements[0], elements[1]);
    let node = heap.object(elements[0].handle().unwrap()).unwrap();
    assert_eq!(node.field("next"), Some(&Value::Null));
    assert_eq!(heap.len(), 2);
}

#[test]
fn duplicate_definition() {
    let registry = nodes();
    let mut archive = TreeArchive::new();
    archive
        .begin_node(header(NodeKind::Array, "Node[]", "root", 0).with_length(2))
        .unwrap();
    null_node(&mut archive, "0", 1);
    null_node(&mut archive, "1", 1);
    archive.end_node().unwrap();

    let err = read(&registry, &mut archive).unwrap_err();
    assert!(matches!(err, Error::IdentityConflict { id, .. } if id == NodeId::new(1)));
}

#[test]
fn reference_to_nothing() {
    let registry = nodes();

    let mut archive = TreeArchive::new();
    archive
        .begin_node(header(NodeKind::Array, "Node[]", "root", 0).with_length(1))
        .unwrap();
    leaf(&mut archive, header(NodeKind::Reference, "Node", "0", 1), "7");
    archive.end_node().unwrap();
    assert!(matches!(read(&registry, &mut archive), Err(Error::ArchiveParse { .. })));

    // Primitives have no identity to refer to.
    let mut archive = TreeArchive::new();
    archive
        .begin_node(header(NodeKind::Array, "any[]", "root", 0).with_length(2))
        .unwrap();
    leaf(&mut archive, header(NodeKind::Primitive, "i32", "0", 1), "5");
    leaf(&mut archive, header(NodeKind::Reference, "i32", "1", 2), "1");
    archive.end_node().unwrap();
    assert!(matches!(read(&registry, &mut archive), Err(Error::ArchiveParse { .. })));
}

// -----------------------------------------------------------------------------
// Polymorphism

#[test]
fn derived_in_base_field() {
    let registry = shapes();
    let mut heap = Heap::new();
    let main = circle(&registry, &mut heap, "sun", 2.5);
    let drawing = registry.instantiate("Drawing", &mut heap).unwrap();
    heap.object_mut(drawing).unwrap().set_field("main", main);

    let (archive, out, back) = round_trip(&registry, &mut heap, &Value::Ref(drawing));

    let node = archive.root().unwrap().children[0].child("main").unwrap();
    assert_eq!(node.header.static_type, "Shape");
    assert_eq!(node.header.runtime_type.as_deref(), Some("Circle"));
    let layers: Vec<&str> = node.children.iter().map(ArchiveNode::key).collect();
    assert_eq!(layers, ["Shape", "Circle"]);

    let main = out.object(back.handle().unwrap()).unwrap().field("main").unwrap();
    let main = out.object(main.handle().unwrap()).unwrap();
    assert_eq!(main.runtime_type(), "Circle");
    assert_eq!(main.field("name"), Some(&Value::from("sun")));
    assert_eq!(main.field("radius"), Some(&Value::from(2.5)));
}

#[test]
fn array_of_derived() {
    let registry = shapes();
    let mut heap = Heap::new();
    let first = circle(&registry, &mut heap, "a", 1.0);
    let second = circle(&registry, &mut heap, "b", 2.0);
    let list = heap.alloc(ArrayCell::new("Shape").with_elements([first, second]));

    let (archive, out, back) = round_trip(&registry, &mut heap, &Value::Ref(list));

    let root = archive.root().unwrap();
    assert_eq!(root.header.static_type, "Shape[]");
    let (a, b) = (&root.children[0], &root.children[1]);
    assert_ne!(a.id(), b.id());
    for node in [a, b] {
        assert_eq!(node.kind(), NodeKind::Object);
        assert_eq!(node.header.runtime_type.as_deref(), Some("Circle"));
    }

    let elements = &out.array(back.handle().unwrap()).unwrap().elements;
    assert_ne!(elements[0], elements[1]);
    let second = out.object(elements[1].handle().unwrap()).unwrap();
    assert_eq!(second.field("name"), Some(&Value::from("b")));
    assert_eq!(second.field("radius"), Some(&Value::from(2.0)));
}

#[test]
fn declared_types_are_checked() {
    let registry = shapes();
    let mut heap = Heap::new();
    let shape = circle(&registry, &mut heap, "c", 1.0);

    let mut archive = TreeArchive::new();
    let err = Serializer::new(&registry, &mut heap, &mut archive)
        .serialize_as(&shape, "Drawing")
        .unwrap_err();
    assert!(matches!(err, Error::KindMismatch { ref expected, .. } if expected == "Drawing"));

    let mut archive = TreeArchive::new();
    Serializer::new(&registry, &mut heap, &mut archive)
        .serialize_as(&shape, "Shape")
        .unwrap();
    assert_eq!(archive.root().unwrap().header.static_type, "Shape");

    let mut out = Heap::new();
    let err = Deserializer::new(&registry, &mut out, &mut archive)
        .deserialize(Some("Drawing"))
        .unwrap_err();
    assert!(matches!(err, Error::ArchiveParse { .. }));

    archive.rewind();
    Deserializer::new(&registry, &mut out, &mut archive)
        .deserialize(Some("Shape"))
        .unwrap();
}

#[test]
fn unregistered_runtime_type() {
    let registry = shapes();
    let mut heap = Heap::new();
    let shape = circle(&registry, &mut heap, "c", 1.0);
    let mut archive = write(&registry, &mut heap, &shape);

    let mut partial = TypeRegistry::new();
    partial.register(TypeDescriptor::object("Shape").with_field(FieldInfo::new("name", "string")));

    let mut out = Heap::new();
    let err = Deserializer::new(&partial, &mut out, &mut archive)
        .deserialize(None)
        .unwrap_err();
    assert!(matches!(err, Error::UnregisteredType { ref type_name, .. } if type_name == "Circle"));
    assert_eq!(err.location().unwrap().key, "root");
    assert!(out.is_empty());

    let mut archive = TreeArchive::new();
    let err = Serializer::new(&partial, &mut heap, &mut archive)
        .serialize(&shape)
        .unwrap_err();
    assert!(matches!(err, Error::UnregisteredType { .. }));
}

#[cfg(all(debug_assertions, feature = "debug"))]
#[test]
fn errors_carry_the_key_trail() {
    let registry = shapes();
    let mut heap = Heap::new();
    let main = circle(&registry, &mut heap, "sun", 1.0);
    let drawing = registry.instantiate("Drawing", &mut heap).unwrap();
    heap.object_mut(drawing).unwrap().set_field("main", main);
    let mut archive = write(&registry, &mut heap, &Value::Ref(drawing));

    let mut partial = shapes();
    partial.insert(TypeDescriptor::structure("Circle"));
    let err = read(&partial, &mut archive).unwrap_err();

    let at = err.location().unwrap();
    assert_eq!(at.key, "main");
    assert_eq!(at.trail.as_deref(), Some("root -> Drawing -> main"));
}

// -----------------------------------------------------------------------------
// Declared types

fn holders() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::enumeration("Color", PrimitiveType::U8).with_member("Red", 0));
    registry.register(TypeDescriptor::enumeration("Shade", PrimitiveType::U8).with_member("Dark", 0));
    registry.register(
        TypeDescriptor::structure("Holder")
            .with_field(FieldInfo::new("n", "i32").with_default(0_i32))
            .with_field(FieldInfo::new("color", "Color").with_default(EnumValue::new("Color", "Red")))
            .with_field(FieldInfo::new("list", "i32[]").with_default(Value::Null))
            .with_field(FieldInfo::new("table", "map<i32,i32>").with_default(Value::Null)),
    );
    registry
}

fn holder() -> StructValue {
    StructValue::new("Holder")
        .with_field("n", 0_i32)
        .with_field("color", EnumValue::new("Color", "Red"))
        .with_field("list", Value::Null)
        .with_field("table", Value::Null)
}

/// A `Holder` struct root with id 0 whose fields `fill` writes.
fn holder_archive(fill: fn(&mut TreeArchive)) -> TreeArchive {
    let mut archive = TreeArchive::new();
    archive.begin_node(header(NodeKind::Struct, "Holder", "root", 0)).unwrap();
    fill(&mut archive);
    archive.end_node().unwrap();
    archive
}

#[test]
fn reader_rejects_undeclared_types() {
    let registry = holders();
    let cases: [(&str, fn(&mut TreeArchive)); 7] = [
        ("n", |archive| {
            leaf(archive, header(NodeKind::String, "string", "n", 1), "hello");
        }),
        ("n", |archive| {
            archive.begin_node(header(NodeKind::Pointer, "pointer", "n", 1)).unwrap();
            leaf(archive, header(NodeKind::Primitive, "i32", "value", 2), "5");
            archive.end_node().unwrap();
        }),
        ("color", |archive| {
            leaf(archive, header(NodeKind::Enum, "Shade", "color", 1).with_base_type("u8"), "Dark");
        }),
        ("list", |archive| {
            archive
                .begin_node(header(NodeKind::Array, "string[]", "list", 1).with_length(0))
                .unwrap();
            archive.end_node().unwrap();
        }),
        ("table", |archive| {
            archive
                .begin_node(header(NodeKind::Map, "map<string,i32>", "table", 1).with_length(0))
                .unwrap();
            archive.end_node().unwrap();
        }),
        // A reference to an array seen earlier.
        ("table", |archive| {
            archive
                .begin_node(header(NodeKind::Array, "i32[]", "list", 1).with_length(0))
                .unwrap();
            archive.end_node().unwrap();
            leaf(archive, header(NodeKind::Reference, "map<i32,i32>", "table", 2), "1");
        }),
        // A reference to an array defined later.
        ("table", |archive| {
            leaf(archive, header(NodeKind::Reference, "map<i32,i32>", "table", 1), "2");
            archive
                .begin_node(header(NodeKind::Array, "i32[]", "list", 2).with_length(0))
                .unwrap();
            archive.end_node().unwrap();
        }),
    ];

    for (key, fill) in cases {
        let err = read(&registry, &mut holder_archive(fill)).unwrap_err();
        assert!(matches!(err, Error::ArchiveParse { .. }), "{err}");
        assert_eq!(err.location().unwrap().key, key);
    }

    let mut archive = holder_archive(|archive| {
        leaf(archive, header(NodeKind::Primitive, "i32", "n", 1), "5");
        archive
            .begin_node(header(NodeKind::Array, "i32[]", "list", 2).with_length(0))
            .unwrap();
        archive.end_node().unwrap();
        archive
            .begin_node(header(NodeKind::Map, "map<i32,i32>", "table", 3).with_length(0))
            .unwrap();
        archive.end_node().unwrap();
    });
    let (out, value) = read(&registry, &mut archive).unwrap();
    let value = value.as_struct().unwrap();
    assert_eq!(value.field("n"), Some(&Value::from(5_i32)));
    assert_eq!(value.field("color"), Some(&Value::from(EnumValue::new("Color", "Red"))));
    assert!(out.map(value.field("table").unwrap().handle().unwrap()).is_some());
}

#[test]
fn reader_rejects_a_primitive_in_an_object_field() {
    let registry = nodes();
    let mut archive = TreeArchive::new();
    archive
        .begin_node(header(NodeKind::Object, "Node", "root", 0).with_runtime_type("Node"))
        .unwrap();
    archive.begin_node(header(NodeKind::Base, "Node", "Node", 1)).unwrap();
    leaf(&mut archive, header(NodeKind::Primitive, "i32", "next", 2), "5");
    archive.end_node().unwrap();
    archive.end_node().unwrap();

    let err = read(&registry, &mut archive).unwrap_err();
    assert!(matches!(err, Error::ArchiveParse { .. }), "{err}");
    assert_eq!(err.location().unwrap().key, "next");
}

#[test]
fn writer_rejects_undeclared_types() {
    let registry = holders();
    let mut heap = Heap::new();
    let strings = heap.alloc(ArrayCell::new("string"));
    let numbers = heap.alloc(ArrayCell::new("i32"));
    let cases: [(&str, Value); 5] = [
        ("n", Value::from("hello")),
        ("color", Value::from(EnumValue::new("Shade", "Dark"))),
        ("list", Value::Ref(strings)),
        ("table", Value::Ref(numbers)),
        ("table", Value::Ref(heap.alloc(HeapCell::Boxed(Value::from(1_i32))))),
    ];

    for (field, bad) in cases {
        let mut value = holder();
        value.set_field(field, bad);
        let mut archive = TreeArchive::new();
        let err = Serializer::new(&registry, &mut heap, &mut archive)
            .serialize(&Value::from(value))
            .unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }), "{err}");
        assert_eq!(err.location().unwrap().key, field);
    }

    // An array already written may not be reused where a map is declared.
    let value = holder().with_field("list", numbers).with_field("table", numbers);
    let mut archive = TreeArchive::new();
    let err = Serializer::new(&registry, &mut heap, &mut archive)
        .serialize(&Value::from(value))
        .unwrap_err();
    assert!(matches!(err, Error::KindMismatch { ref found, .. } if found == "i32[]"));
}

#[test]
fn declared_types_round_trip() {
    let registry = holders();
    let mut heap = Heap::new();
    let list = heap.alloc(ArrayCell::new("i32").with_elements([1_i32, 2]));
    let mut table = MapCell::new("i32", "i32");
    table.insert(1_i32, 10_i32);
    let table = heap.alloc(table);
    let value = Value::from(
        holder()
            .with_field("n", 5_i32)
            .with_field("list", list)
            .with_field("table", table),
    );

    let (archive, _, _) = round_trip(&registry, &mut heap, &value);
    let root = archive.root().unwrap();
    assert_eq!(root.child("list").unwrap().header.static_type, "i32[]");
    assert_eq!(root.child("table").unwrap().header.static_type, "map<i32,i32>");
}

// -----------------------------------------------------------------------------
// Lifecycle hooks

type Log = Arc<Mutex<Vec<&'static str>>>;

fn record(log: &Log, entry: &'static str) -> impl Fn(&mut ObjectCell) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_: &mut ObjectCell| log.lock().unwrap().push(entry)
}

#[test]
fn hook_order() {
    let log = Log::default();
    let mut registry = TypeRegistry::new();
    registry.register(
        TypeDescriptor::object("Tracked")
            .with_field(FieldInfo::new("saved", "bool").with_default(false))
            .with_hook(HookPoint::Serializing, record(&log, "serializing"))
            .with_hook(HookPoint::Serialized, record(&log, "serialized"))
            .with_hook(HookPoint::Deserializing, record(&log, "deserializing"))
            .with_hook(HookPoint::Deserialized, record(&log, "deserialized")),
    );

    let mut heap = Heap::new();
    let tracked = registry.instantiate("Tracked", &mut heap).unwrap();
    round_trip(&registry, &mut heap, &Value::Ref(tracked));

    assert_eq!(
        *log.lock().unwrap(),
        ["serializing", "serialized", "deserializing", "deserialized"]
    );
}

#[test]
fn hooks_run_base_first_and_see_fields() {
    let log = Log::default();
    let mut registry = TypeRegistry::new();
    registry.register(
        TypeDescriptor::object("Entity")
            .with_field(FieldInfo::new("saved", "bool").with_default(false))
            .with_hook(HookPoint::Serializing, |object| {
                object.set_field("saved", true);
            })
            .with_hook(HookPoint::Deserialized, record(&log, "entity")),
    );
    registry.register(
        TypeDescriptor::object("Player")
            .with_base("Entity")
            .with_hook(HookPoint::Deserialized, record(&log, "player")),
    );

    let mut heap = Heap::new();
    let player = registry.instantiate("Player", &mut heap).unwrap();
    let mut archive = write(&registry, &mut heap, &Value::Ref(player));

    // The hook ran before the fields were written.
    let base = &archive.root().unwrap().children[0];
    assert_eq!(base.child("saved").unwrap().value(), Some("true"));
    assert_eq!(heap.object(player).unwrap().field("saved"), Some(&Value::from(true)));

    read(&registry, &mut archive).unwrap();
    assert_eq!(*log.lock().unwrap(), ["entity", "player"]);
}

// -----------------------------------------------------------------------------
// Schema changes and malformed archives

fn accounts(tier: Option<FieldInfo>) -> TypeRegistry {
    let mut account = TypeDescriptor::object("Account").with_field(FieldInfo::new("id", "u32"));
    if let Some(tier) = tier {
        account = account.with_field(tier);
    }
    let mut registry = TypeRegistry::new();
    registry.register(account);
    registry
}

#[test]
fn missing_fields_take_defaults() {
    let old = accounts(None);
    let mut heap = Heap::new();
    let account = old.instantiate("Account", &mut heap).unwrap();
    heap.object_mut(account).unwrap().set_field("id", 7_u32);
    let archive = write(&old, &mut heap, &Value::Ref(account));

    let new = accounts(Some(FieldInfo::new("tier", "string").with_default("free")));
    let (out, value) = read(&new, &mut archive.clone()).unwrap();
    let object = out.object(value.handle().unwrap()).unwrap();
    assert_eq!(object.field("id"), Some(&Value::from(7_u32)));
    assert_eq!(object.field("tier"), Some(&Value::from("free")));

    let strict = accounts(Some(FieldInfo::new("tier", "string")));
    let err = read(&strict, &mut archive.clone()).unwrap_err();
    assert!(matches!(err, Error::MissingField { ref field, .. } if field == "tier"));

    let mut shrunk = TypeRegistry::new();
    shrunk.register(TypeDescriptor::object("Account"));
    let err = read(&shrunk, &mut archive.clone()).unwrap_err();
    assert!(matches!(err, Error::ArchiveParse { .. }));
}

#[test]
fn malformed_leaves() {
    let registry = TypeRegistry::new();

    let mut archive = TreeArchive::new();
    leaf(&mut archive, header(NodeKind::Primitive, "i32", "root", 0), "abc");
    assert!(matches!(read(&registry, &mut archive), Err(Error::ArchiveParse { .. })));

    let mut archive = TreeArchive::new();
    leaf(&mut archive, header(NodeKind::Primitive, "i32", "root", 0), "12");
    let mut heap = Heap::new();
    let err = Deserializer::new(&registry, &mut heap, &mut archive)
        .deserialize(Some("u8"))
        .unwrap_err();
    assert!(matches!(err, Error::ArchiveParse { .. }));

    // Declared length disagrees with the elements.
    let mut archive = TreeArchive::new();
    archive
        .begin_node(header(NodeKind::Array, "i32[]", "root", 0).with_length(3))
        .unwrap();
    leaf(&mut archive, header(NodeKind::Primitive, "i32", "0", 1), "1");
    archive.end_node().unwrap();
    assert!(matches!(read(&registry, &mut archive), Err(Error::ArchiveParse { .. })));
}

#[test]
fn dangling_handle() {
    let registry = TypeRegistry::new();
    let mut heap = Heap::new();
    let gone = heap.alloc(ArrayCell::new("i32"));
    heap.remove(gone);

    let mut archive = TreeArchive::new();
    let err = Serializer::new(&registry, &mut heap, &mut archive)
        .serialize(&Value::Ref(gone))
        .unwrap_err();
    assert!(matches!(err, Error::DanglingHandle { .. }));
}

#[test]
fn depth_limit() {
    let registry = TypeRegistry::new();
    let mut heap = Heap::new();
    let value = (0..10).fold(Value::from(0_i32), |inner, _| {
        Value::from(StructValue::new("Wrap").with_field("inner", inner))
    });

    let mut archive = TreeArchive::new();
    let err = Serializer::new(&registry, &mut heap, &mut archive)
        .with_config(Config::new().with_max_depth(4))
        .serialize(&value)
        .unwrap_err();
    assert!(matches!(err, Error::DepthLimit { limit: 4, .. }));

    let mut archive = write(&registry, &mut heap, &value);
    let mut out = Heap::new();
    let err = Deserializer::new(&registry, &mut out, &mut archive)
        .with_config(Config::new().with_max_depth(4))
        .deserialize(None)
        .unwrap_err();
    assert!(matches!(err, Error::DepthLimit { limit: 4, .. }));
}

/// A `Recovering` struct whose custom writer lets `table` and `holder` fail
/// below it, then writes `deep`.
fn recovering(heap: &mut Heap, deep: impl Into<Value>) -> (TypeRegistry, Value) {
    fn save(value: &StructValue, ser: &mut Serializer<'_>) -> Result<(), Error> {
        for name in ["table", "holder"] {
            let failed = value.field(name).map(|field| ser.serialize_field(name, field));
            assert!(matches!(failed, Some(Err(Error::DanglingHandle { .. }))));
        }
        ser.serialize_field("deep", value.field("deep").unwrap_or(&Value::Null))?;
        Ok(())
    }

    fn load(_: &mut StructValue, _: &mut Deserializer<'_>) -> Result<(), Error> {
        Ok(())
    }

    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::object("Holder").with_field(FieldInfo::new("e", "any")));
    registry.register(TypeDescriptor::structure("Recovering").with_custom(CustomSerde::new(save, load)));

    let gone = heap.alloc(ArrayCell::new("i32"));
    heap.remove(gone);
    // Fails inside a map entry.
    let mut table = MapCell::new("i32", "any");
    table.insert(1_i32, gone);
    let table = heap.alloc(table);
    // Fails inside an object layer.
    let holder = registry.instantiate("Holder", heap).unwrap();
    heap.object_mut(holder).unwrap().set_field("e", gone);

    let value = StructValue::new("Recovering")
        .with_field("table", table)
        .with_field("holder", holder)
        .with_field("deep", deep);
    (registry, Value::from(value))
}

#[test]
fn failed_entries_and_layers_release_their_depth() {
    let mut heap = Heap::new();
    // root -> deep -> inner -> n fills a depth of four exactly.
    let deep = StructValue::new("Outer").with_field("inner", StructValue::new("Inner").with_field("n", 1_i32));
    let (registry, value) = recovering(&mut heap, deep);

    let mut archive = TreeArchive::new();
    Serializer::new(&registry, &mut heap, &mut archive)
        .with_config(Config::new().with_max_depth(4))
        .serialize(&value)
        .unwrap();
}

#[cfg(all(debug_assertions, feature = "debug"))]
#[test]
fn failed_entries_and_layers_release_their_keys() {
    let mut heap = Heap::new();
    let gone = heap.alloc(ArrayCell::new("i32"));
    heap.remove(gone);
    let (registry, value) = recovering(&mut heap, gone);

    let mut archive = TreeArchive::new();
    let err = Serializer::new(&registry, &mut heap, &mut archive)
        .serialize(&value)
        .unwrap_err();
    let at = err.location().unwrap();
    assert_eq!(at.key, "deep");
    assert_eq!(at.trail.as_deref(), Some("root -> deep"));
}

// -----------------------------------------------------------------------------
// Formats

#[test]
fn ron_rendering() {
    let registry = nodes();
    let mut heap = Heap::new();
    let node = registry.instantiate("Node", &mut heap).unwrap();
    heap.object_mut(node).unwrap().set_field("next", node);

    let archive = write(&registry, &mut heap, &Value::Ref(node));
    let text = ron::to_string(archive.data()).unwrap();
    let mut loaded: TreeArchive = ron::from_str(&text).unwrap();

    let (out, back) = read(&registry, &mut loaded).unwrap();
    assert!(heap.deep_eq(&Value::Ref(node), &out, &back));
}
