//! A two-tier JSON serializer modeled on an engine's `JSON.stringify`: an
//! allocation-free iterative fast path for plain data, and a fully-compliant
//! general-purpose path for everything else (serialization hooks, replacers,
//! indentation, rope strings, indexed properties). The two paths produce
//! byte-identical output, and a traversal that starts fast can hand off
//! mid-way without redoing any work.
//!
//! ```rust
//! use jsonsprint::{stringify, Object, Shape, StringifyOptions, Value};
//!
//! let shape = Shape::of_keys(["name", "size"]);
//! let obj = Object::new(shape, vec![Value::from("crate"), Value::from(3.0)]);
//! let out = stringify(&Value::Object(obj), &StringifyOptions::default())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(out.text, r#"{"name":"crate","size":3}"#);
//! assert!(!out.used_fallback);
//! ```

mod error;
mod fallback;
mod number;
mod options;
mod scanner;
mod segment;
mod serializer;
mod shape;
pub mod shape_cache;
mod value;


pub use error::StringifyError;
pub use number::NumberBuffer;
pub use options::{Replacer, ReplacerFn, Space, StringifyOptions};
pub use serializer::{Stringified, stringify};
pub use shape::{Property, PropertyKey, Shape, ShapeBuilder, ShapeId};
pub use shape_cache::ShapeStatus;
pub use value::{Array, JsStr, Object, ToJson, Value};
