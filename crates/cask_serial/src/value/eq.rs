use alloc::string::String;

use cask_utils::hash::HashMap;

use super::{Heap, HeapCell, HeapKey, Value};

// -----------------------------------------------------------------------------
// deep_eq

impl Heap {
    /// Compares a value of this heap with a value of `other` structurally.
    ///
    /// Handles are followed into their cells, and the aliasing structure must
    /// match as well: two handles are equal only if they are paired one to one
    /// throughout the comparison. Cycles are supported.
    ///
    /// # Examples
    ///
    /// ```
    /// use cask_serial::value::{ArrayCell, Heap, Value};
    ///
    /// let mut left = Heap::new();
    /// let a = left.alloc(ArrayCell::new("i32").with_elements([1_i32]));
    /// let shared = left.alloc(ArrayCell::new("i32[]").with_elements([a, a]));
    ///
    /// let mut right = Heap::new();
    /// let b = right.alloc(ArrayCell::new("i32").with_elements([1_i32]));
    /// let c = right.alloc(ArrayCell::new("i32").with_elements([1_i32]));
    /// let split = right.alloc(ArrayCell::new("i32[]").with_elements([b, c]));
    ///
    /// assert!(left.deep_eq(&Value::Ref(shared), &left, &Value::Ref(shared)));
    /// assert!(!left.deep_eq(&Value::Ref(shared), &right, &Value::Ref(split)));
    /// ```
    pub fn deep_eq(&self, value: &Value, other: &Heap, other_value: &Value) -> bool {
        DeepEq {
            left: self,
            right: other,
            pairs: HashMap::default(),
            reverse: HashMap::default(),
        }
        .values(value, other_value)
    }
}

struct DeepEq<'a> {
    left: &'a Heap,
    right: &'a Heap,
    pairs: HashMap<HeapKey, HeapKey>,
    reverse: HashMap<HeapKey, HeapKey>,
}

impl DeepEq<'_> {
    fn values(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Ref(x), Value::Ref(y)) => self.handles(*x, *y),
            (Value::Struct(x), Value::Struct(y)) => {
                x.type_name == y.type_name && self.fields(&x.fields, &y.fields)
            }
            (Value::Ref(_) | Value::Struct(_), _) | (_, Value::Ref(_) | Value::Struct(_)) => false,
            _ => a == b,
        }
    }

    fn fields(&mut self, a: &[(String, Value)], b: &[(String, Value)]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|((na, va), (nb, vb))| na == nb && self.values(va, vb))
    }

    fn handles(&mut self, x: HeapKey, y: HeapKey) -> bool {
        if let Some(&paired) = self.pairs.get(&x) {
            return paired == y;
        }
        if self.reverse.contains_key(&y) {
            return false;
        }
        // Pair before descending so cycles terminate.
        self.pairs.insert(x, y);
        self.reverse.insert(y, x);

        let (left, right) = (self.left, self.right);
        let (Some(l), Some(r)) = (left.get(x), right.get(y)) else {
            return false;
        };
        match (l, r) {
            (HeapCell::Array(l), HeapCell::Array(r)) => {
                l.element_type == r.element_type
                    && l.elements.len() == r.elements.len()
                    && l.elements.iter().zip(&r.elements).all(|(a, b)| self.values(a, b))
            }
            (HeapCell::Map(l), HeapCell::Map(r)) => {
                l.key_type == r.key_type
                    && l.value_type == r.value_type
                    && l.entries.len() == r.entries.len()
                    && l.entries
                        .iter()
                        .zip(&r.entries)
                        .all(|((ka, va), (kb, vb))| self.values(ka, kb) && self.values(va, vb))
            }
            (HeapCell::Object(l), HeapCell::Object(r)) => {
                l.runtime_type() == r.runtime_type()
                    && l.layers().len() == r.layers().len()
                    && l.layers().iter().zip(r.layers()).all(|(la, lb)| {
                        la.type_name == lb.type_name && self.fields(&la.fields, &lb.fields)
                    })
            }
            (HeapCell::Boxed(l), HeapCell::Boxed(r)) => self.values(l, r),
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
