//! Structural shapes: the ordered set of property keys and their attributes,
//! independent of property values.
//!
//! Two objects constructed from the same [`Shape`] handle share shape
//! identity, which is what the process-wide eligibility cache is keyed on.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Shape`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeId(u64);

/// A property key: a plain string key, or a symbol-keyed property.
///
/// Symbol keys never appear in JSON output; their presence on a shape
/// disqualifies the owning object from the fast path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyKey {
    /// An ordinary string key.
    Str(Arc<str>),
    /// A symbol key, identified by its description.
    Sym(Arc<str>),
}

/// One property slot of a shape.
#[derive(Clone, Debug)]
pub struct Property {
    /// The property key.
    pub key: PropertyKey,
    /// Whether the property shows up during plain enumeration.
    pub enumerable: bool,
}

/// The structural signature of an object: its ordered property list.
#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    properties: Vec<Property>,
    plain: bool,
}

impl Shape {
    /// Builds a shape where every key is a plain, enumerable string key.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonsprint::Shape;
    ///
    /// let shape = Shape::of_keys(["a", "b"]);
    /// assert_eq!(shape.len(), 2);
    /// ```
    pub fn of_keys<I, S>(keys: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let mut builder = Self::builder();
        for key in keys {
            builder = builder.key(key);
        }
        builder.build()
    }

    /// Starts building a shape with mixed property attributes.
    #[must_use]
    pub fn builder() -> ShapeBuilder {
        ShapeBuilder {
            properties: Vec::new(),
        }
    }

    /// The process-unique identity of this shape.
    #[must_use]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Number of property slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the shape has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The ordered property list.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// `true` when every property is an enumerable string key.
    pub(crate) fn is_plain(&self) -> bool {
        self.plain
    }

    /// Position of an enumerable string key, if present.
    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.properties.iter().position(|p| {
            p.enumerable && matches!(&p.key, PropertyKey::Str(k) if k.as_ref() == key)
        })
    }
}

/// Incremental [`Shape`] construction.
pub struct ShapeBuilder {
    properties: Vec<Property>,
}

impl ShapeBuilder {
    /// Adds a plain, enumerable string key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.properties.push(Property {
            key: PropertyKey::Str(key.into()),
            enumerable: true,
        });
        self
    }

    /// Adds a non-enumerable string key.
    #[must_use]
    pub fn non_enumerable(mut self, key: impl Into<Arc<str>>) -> Self {
        self.properties.push(Property {
            key: PropertyKey::Str(key.into()),
            enumerable: false,
        });
        self
    }

    /// Adds a symbol-keyed property.
    #[must_use]
    pub fn symbol(mut self, description: impl Into<Arc<str>>) -> Self {
        self.properties.push(Property {
            key: PropertyKey::Sym(description.into()),
            enumerable: true,
        });
        self
    }

    /// Finishes the shape and assigns its identity.
    #[must_use]
    pub fn build(self) -> Arc<Shape> {
        let plain = self
            .properties
            .iter()
            .all(|p| p.enumerable && matches!(p.key, PropertyKey::Str(_)));
        Arc::new(Shape {
            id: ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed)),
            properties: self.properties,
            plain,
        })
    }
}
