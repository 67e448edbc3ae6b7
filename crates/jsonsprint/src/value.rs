//! The host-value stand-in the serializer walks.
//!
//! [`Value`] plays the role of an engine value reference: container handles
//! are shared (`Rc`), so cyclic graphs are constructible, strings may be
//! lazily-concatenated ropes, and objects can carry a custom serialization
//! hook and indexed properties. All of these exercise the fast path's
//! disqualification routes.

use std::{borrow::Cow, cell::RefCell, fmt, rc::Rc, sync::Arc};

use crate::shape::{PropertyKey, Shape};

/// A custom serialization hook, standing in for a `toJSON` method.
///
/// The hook receives the object it is attached to and returns the value to
/// serialize in its place. The fast path never invokes hooks; their presence
/// routes the object to the general-purpose serializer.
pub type ToJson = Rc<dyn Fn(&Value) -> Value>;

/// A value reference.
#[derive(Clone, Debug)]
pub enum Value {
    /// The `undefined` value; also stands in for non-serializable values
    /// such as functions.
    Undefined,
    /// The `null` value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number.
    Number(f64),
    /// A string, possibly a rope.
    String(JsStr),
    /// A shared array handle.
    Array(Array),
    /// A shared object handle.
    Object(Object),
}

impl Value {
    /// Shorthand for a flat string value.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(JsStr::flat(s))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Self::Array(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(v)
    }
}

/// A string value: either flat, or a lazily-concatenated rope whose
/// inspection would require allocation.
///
/// Ropes disqualify the fast path (scanning them is not allocation-free);
/// the general-purpose serializer flattens them.
#[derive(Clone, Debug)]
pub enum JsStr {
    /// A contiguous string.
    Flat(Arc<str>),
    /// A deferred concatenation of two halves.
    Rope(Rc<(JsStr, JsStr)>),
}

impl JsStr {
    /// A flat string.
    pub fn flat(s: impl Into<Arc<str>>) -> Self {
        Self::Flat(s.into())
    }

    /// A rope concatenating `left` and `right`.
    #[must_use]
    pub fn rope(left: JsStr, right: JsStr) -> Self {
        Self::Rope(Rc::new((left, right)))
    }

    /// The contents, if this string is already flat.
    #[must_use]
    pub fn as_flat(&self) -> Option<&str> {
        match self {
            Self::Flat(s) => Some(s),
            Self::Rope(_) => None,
        }
    }

    /// The full contents, allocating only when the string is a rope.
    #[must_use]
    pub fn flatten(&self) -> Cow<'_, str> {
        if let Self::Flat(s) = self {
            return Cow::Borrowed(s);
        }
        let mut out = String::new();
        let mut work = vec![self];
        while let Some(part) = work.pop() {
            match part {
                Self::Flat(s) => out.push_str(s),
                Self::Rope(pair) => {
                    work.push(&pair.1);
                    work.push(&pair.0);
                }
            }
        }
        Cow::Owned(out)
    }
}

struct ObjectData {
    shape: Arc<Shape>,
    values: RefCell<Vec<Value>>,
    elements: RefCell<Vec<Value>>,
    to_json: RefCell<Option<ToJson>>,
}

/// A shared object handle: a shape plus per-instance property values,
/// optional indexed elements, and an optional serialization hook.
#[derive(Clone)]
pub struct Object {
    data: Rc<ObjectData>,
}

impl Object {
    /// Creates an object instance of `shape` with one value per property
    /// slot, in shape order.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the shape's property count.
    #[must_use]
    pub fn new(shape: Arc<Shape>, values: Vec<Value>) -> Self {
        assert_eq!(shape.len(), values.len());
        Self {
            data: Rc::new(ObjectData {
                shape,
                values: RefCell::new(values),
                elements: RefCell::new(Vec::new()),
                to_json: RefCell::new(None),
            }),
        }
    }

    /// The object's shape.
    #[must_use]
    pub fn shape(&self) -> &Arc<Shape> {
        &self.data.shape
    }

    /// Installs a custom serialization hook.
    pub fn set_to_json(&self, hook: ToJson) {
        *self.data.to_json.borrow_mut() = Some(hook);
    }

    /// Replaces the value in property slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for the shape.
    pub fn set_named(&self, index: usize, value: Value) {
        self.data.values.borrow_mut()[index] = value;
    }

    /// Appends an indexed element, giving the object an indexed-property
    /// pattern (a fast-path disqualifier).
    pub fn push_element(&self, value: Value) {
        self.data.elements.borrow_mut().push(value);
    }

    pub(crate) fn to_json(&self) -> Option<ToJson> {
        self.data.to_json.borrow().clone()
    }

    pub(crate) fn has_elements(&self) -> bool {
        !self.data.elements.borrow().is_empty()
    }

    pub(crate) fn elements_len(&self) -> usize {
        self.data.elements.borrow().len()
    }

    pub(crate) fn element(&self, index: usize) -> Value {
        self.data.elements.borrow()[index].clone()
    }

    pub(crate) fn get_named(&self, index: usize) -> Value {
        self.data.values.borrow()[index].clone()
    }

    /// Looks a property up by key string: indexed elements for canonical
    /// numeric keys, then enumerable named properties.
    pub(crate) fn get_property(&self, key: &str) -> Option<Value> {
        if let Ok(index) = key.parse::<usize>() {
            if index.to_string() == key {
                if let Some(v) = self.data.elements.borrow().get(index) {
                    return Some(v.clone());
                }
            }
        }
        let slot = self.data.shape.position(key)?;
        Some(self.get_named(slot))
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.data).cast::<u8>() as usize
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("shape", &self.data.shape.id())
            .finish_non_exhaustive()
    }
}

/// A shared array handle.
#[derive(Clone, Debug)]
pub struct Array {
    data: Rc<RefCell<Vec<Value>>>,
}

impl Array {
    /// Creates an array from its elements.
    #[must_use]
    pub fn new(elements: Vec<Value>) -> Self {
        Self {
            data: Rc::new(RefCell::new(elements)),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Clones the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        self.data.borrow()[index].clone()
    }

    /// Appends an element.
    pub fn push(&self, value: Value) {
        self.data.borrow_mut().push(value);
    }

    /// Replaces the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&self, index: usize, value: Value) {
        self.data.borrow_mut()[index] = value;
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.data).cast::<u8>() as usize
    }
}
