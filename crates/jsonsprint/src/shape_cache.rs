//! Process-wide shape-eligibility cache.
//!
//! A memoization table keyed by [`ShapeId`]: once an object of some shape has
//! been fully serialized on the fast path, the shape is marked
//! fast-json-iterable and later encounters of the same shape skip key
//! scanning entirely. Values are still scanned every time; only keys are a
//! property of the shape.
//!
//! The invalidation contract is the host's: whoever mutates a shape must call
//! [`invalidate`]. Marking a shape never changes observable output, only the
//! work performed.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::shape::ShapeId;

/// Cached eligibility verdict for a shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShapeStatus {
    /// Every key is an escape-free ASCII string: keys can be emitted raw,
    /// without scanning, under either encoding width.
    FastIterable,
    /// At least one key needs escaping or is non-ASCII. The shape is still
    /// serialized on the fast path, but never qualifies for raw key
    /// emission; recorded so we stop re-deriving that.
    EscapedKeys,
}

static CACHE: Lazy<Mutex<FxHashMap<ShapeId, ShapeStatus>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// The cached status of a shape, if any.
#[must_use]
pub fn status(id: ShapeId) -> Option<ShapeStatus> {
    CACHE.lock().get(&id).copied()
}

/// Records a verdict for a shape. The first verdict wins; a shape's keys do
/// not change while its identity is valid.
pub(crate) fn mark(id: ShapeId, status: ShapeStatus) {
    CACHE.lock().entry(id).or_insert(status);
}

/// Drops any cached verdict for a shape. Must be called by the host when the
/// shape's property list is mutated.
pub fn invalidate(id: ShapeId) {
    CACHE.lock().remove(&id);
}
