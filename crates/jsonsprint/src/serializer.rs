//! The fast-path traversal engine.
//!
//! Walks the value graph iteratively with an explicit work stack, emitting
//! JSON tokens into a segmented buffer. The engine never invokes
//! user-visible code: every condition that could (a serialization hook, a
//! rope string, a symbol or non-enumerable key, an indexed-property
//! pattern) is checked *before* any such call or allocation would occur and
//! routes the remainder of the traversal to the general-purpose serializer.
//! Because the traversal state is an explicit stack rather than a call
//! stack, suspension is cheap: the emitted prefix is finalized as-is and
//! the fallback completes the open frames.
//!
//! The engine is monomorphized over the output unit width. A task starts on
//! the one-byte instantiation; the first string that scans as two-byte
//! transfers the work stack, unchanged, to the two-byte instantiation, and
//! the two buffers are concatenated at the very end. Promotion happens
//! before any output for the affected member, so it is one-directional and
//! occurs at most once per task.

use crate::{
    error::StringifyError,
    fallback,
    number::NumberBuffer,
    options::StringifyOptions,
    scanner::{self, ScanReport, Width},
    segment::{SegmentedBuffer, TextUnit},
    shape_cache::{self, ShapeStatus},
    shape::PropertyKey,
    value::{Object, Value},
};

/// Result of one `stringify` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stringified {
    /// The JSON text.
    pub text: String,
    /// Whether any part of the output came from the general-purpose
    /// serializer.
    pub used_fallback: bool,
}

/// Serializes `root` to JSON text.
///
/// Returns `Ok(None)` when the result is `undefined` (an undefined root, or
/// a hook/replacer erasing the root). Structural problems (cycles, excessive
/// nesting on the general path) are errors.
///
/// # Errors
///
/// [`StringifyError::CircularStructure`] if the value graph is cyclic;
/// [`StringifyError::NestingTooDeep`] if the general path exceeds its
/// recursion budget.
///
/// # Examples
///
/// ```
/// use jsonsprint::{stringify, Object, Shape, StringifyOptions, Value};
///
/// let shape = Shape::of_keys(["a", "b"]);
/// let obj = Object::new(shape, vec![Value::from(1.0), Value::from("x")]);
/// let out = stringify(&Value::Object(obj), &StringifyOptions::default())
///     .unwrap()
///     .unwrap();
/// assert_eq!(out.text, r#"{"a":1,"b":"x"}"#);
/// assert!(!out.used_fallback);
/// ```
pub fn stringify(
    root: &Value,
    options: &StringifyOptions,
) -> Result<Option<Stringified>, StringifyError> {
    // A present replacer or space disqualifies the whole call up front.
    if options.replacer.is_some() || options.space.is_some() {
        return Ok(fallback::stringify(root, options)?.map(|text| Stringified {
            text,
            used_fallback: true,
        }));
    }

    let mut narrow = FastTask::<u8>::begin(root.clone());
    match narrow.run()? {
        Outcome::Done => Ok(Some(Stringified {
            text: narrow.out.finalize(),
            used_fallback: false,
        })),
        Outcome::Handoff => {
            if root_pending(&narrow.stack) {
                // Nothing emitted: the whole value goes to the general path.
                return Ok(fallback::stringify(root, options)?.map(|text| Stringified {
                    text,
                    used_fallback: true,
                }));
            }
            let text = narrow.out.finalize();
            finish_with_fallback(text, narrow.stack)
        }
        Outcome::Promote => {
            let mut wide = FastTask::<u16>::resume(std::mem::take(&mut narrow.stack));
            let outcome = wide.run()?;
            let mut text = narrow.out.finalize();
            match outcome {
                Outcome::Done => {
                    wide.out.finalize_into(&mut text);
                    Ok(Some(Stringified {
                        text,
                        used_fallback: false,
                    }))
                }
                Outcome::Handoff => {
                    wide.out.finalize_into(&mut text);
                    finish_with_fallback(text, wide.stack)
                }
                Outcome::Promote => unreachable!("promotion is one-directional"),
            }
        }
    }
}

fn root_pending(stack: &[Frame]) -> bool {
    matches!(stack, [Frame::Root { emitted: false, .. }])
}

fn finish_with_fallback(
    mut text: String,
    stack: Vec<Frame>,
) -> Result<Option<Stringified>, StringifyError> {
    fallback::resume(stack, &mut text)?;
    Ok(Some(Stringified {
        text,
        used_fallback: true,
    }))
}

/// One resumable unit of traversal state. Frames carry no unit-width state,
/// so a stack transfers between instantiations and into the fallback
/// unchanged.
#[derive(Debug)]
pub(crate) enum Frame {
    /// The top-level value; `emitted` flips once its first token is out.
    Root { value: Value, emitted: bool },
    /// An open array: next element index and comma bookkeeping.
    Array {
        arr: crate::value::Array,
        index: usize,
        wrote: bool,
    },
    /// An open object: next slot index, comma bookkeeping, and key-scan
    /// state for shape marking.
    Object {
        obj: Object,
        index: usize,
        wrote: bool,
        cached: bool,
        keys_clean: bool,
    },
}

/// How a fast-path run ended.
enum Outcome {
    /// The stack drained; the buffer holds the complete text.
    Done,
    /// A two-byte string was found on the one-byte instantiation.
    Promote,
    /// A disqualifying condition; the general path takes over at the
    /// current cursor of the top frame.
    Handoff,
}

/// Per-member verdict, computed before any output for the member.
enum Precheck {
    /// Safe to emit; carries the string scan when the member is a string.
    Clear(Option<ScanReport>),
    Promote,
    Handoff,
}

struct FastTask<U: TextUnit> {
    out: SegmentedBuffer<U>,
    stack: Vec<Frame>,
}

impl<U: TextUnit> FastTask<U> {
    fn begin(root: Value) -> Self {
        Self {
            out: SegmentedBuffer::new(),
            stack: vec![Frame::Root {
                value: root,
                emitted: false,
            }],
        }
    }

    fn resume(stack: Vec<Frame>) -> Self {
        Self {
            out: SegmentedBuffer::new(),
            stack,
        }
    }

    fn run(&mut self) -> Result<Outcome, StringifyError> {
        loop {
            let idx = self.stack.len();
            let Some(top) = self.stack.last() else {
                return Ok(Outcome::Done);
            };
            match top {
                Frame::Root { emitted: true, .. } => {
                    self.stack.pop();
                }
                Frame::Root { value, .. } => {
                    let value = value.clone();
                    match self.precheck(&value)? {
                        Precheck::Promote => return Ok(Outcome::Promote),
                        Precheck::Handoff => return Ok(Outcome::Handoff),
                        Precheck::Clear(scan) => {
                            if let Frame::Root { emitted, .. } = &mut self.stack[idx - 1] {
                                *emitted = true;
                            }
                            self.emit(value, scan);
                        }
                    }
                }
                Frame::Array { arr, index, wrote } => {
                    let (arr, index, wrote) = (arr.clone(), *index, *wrote);
                    if index == arr.len() {
                        self.out.push_byte(b']');
                        self.stack.pop();
                        continue;
                    }
                    let element = arr.get(index);
                    match self.precheck(&element)? {
                        Precheck::Promote => return Ok(Outcome::Promote),
                        Precheck::Handoff => return Ok(Outcome::Handoff),
                        Precheck::Clear(scan) => {
                            if wrote {
                                self.out.push_byte(b',');
                            }
                            if let Frame::Array { index, wrote, .. } = &mut self.stack[idx - 1] {
                                *index += 1;
                                *wrote = true;
                            }
                            self.emit(element, scan);
                        }
                    }
                }
                Frame::Object {
                    obj,
                    index,
                    wrote,
                    cached,
                    keys_clean,
                } => {
                    let (obj, index, wrote, cached, keys_clean) =
                        (obj.clone(), *index, *wrote, *cached, *keys_clean);
                    let shape = obj.shape().clone();
                    if index == shape.len() {
                        self.out.push_byte(b'}');
                        if !cached {
                            shape_cache::mark(
                                shape.id(),
                                if keys_clean {
                                    ShapeStatus::FastIterable
                                } else {
                                    ShapeStatus::EscapedKeys
                                },
                            );
                        }
                        self.stack.pop();
                        continue;
                    }
                    let key = match &shape.properties()[index].key {
                        PropertyKey::Str(key) => key.clone(),
                        // Open frames only exist for plain shapes.
                        PropertyKey::Sym(_) => return Ok(Outcome::Handoff),
                    };
                    let key_scan = if cached {
                        None
                    } else {
                        let report = scanner::scan(&key);
                        if report.width == Width::TwoByte && !U::WIDE {
                            return Ok(Outcome::Promote);
                        }
                        Some(report)
                    };
                    let value = obj.get_named(index);
                    match self.precheck(&value)? {
                        Precheck::Promote => return Ok(Outcome::Promote),
                        Precheck::Handoff => return Ok(Outcome::Handoff),
                        Precheck::Clear(scan) => {
                            if wrote {
                                self.out.push_byte(b',');
                            }
                            let key_is_clean = key_scan
                                .is_none_or(|r| r.ascii && !r.needs_escaping);
                            if let Frame::Object {
                                index, wrote, keys_clean, ..
                            } = &mut self.stack[idx - 1]
                            {
                                *index += 1;
                                *wrote = true;
                                *keys_clean &= key_is_clean;
                            }
                            match key_scan {
                                // Cached fast-iterable shapes have raw-safe
                                // ASCII keys.
                                None => {
                                    self.out.push_byte(b'"');
                                    self.out.push_ascii(key.as_bytes());
                                    self.out.push_byte(b'"');
                                }
                                Some(report) => self.write_string(&key, report),
                            }
                            self.out.push_byte(b':');
                            self.emit(value, scan);
                        }
                    }
                }
            }
        }
    }

    /// Classifies the next member before anything is written for it, so a
    /// handoff or promotion leaves the member wholly unemitted.
    fn precheck(&self, value: &Value) -> Result<Precheck, StringifyError> {
        match value {
            Value::Undefined => Ok(Precheck::Handoff),
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(Precheck::Clear(None)),
            Value::String(s) => {
                let Some(flat) = s.as_flat() else {
                    // A rope: inspecting it would allocate.
                    return Ok(Precheck::Handoff);
                };
                let report = scanner::scan(flat);
                if report.width == Width::TwoByte && !U::WIDE {
                    return Ok(Precheck::Promote);
                }
                Ok(Precheck::Clear(Some(report)))
            }
            Value::Array(arr) => {
                if self.on_stack(arr.ptr_id()) {
                    return Err(StringifyError::CircularStructure);
                }
                Ok(Precheck::Clear(None))
            }
            Value::Object(obj) => {
                if !fast_eligible(obj) {
                    return Ok(Precheck::Handoff);
                }
                if self.on_stack(obj.ptr_id()) {
                    return Err(StringifyError::CircularStructure);
                }
                Ok(Precheck::Clear(None))
            }
        }
    }

    /// Emits one prechecked value: scalars directly, containers as an
    /// opening token plus a new frame.
    fn emit(&mut self, value: Value, scan: Option<ScanReport>) {
        match value {
            Value::Undefined => {
                debug_assert!(false, "undefined is prechecked as a handoff");
            }
            Value::Null => self.out.push_ascii(b"null"),
            Value::Bool(true) => self.out.push_ascii(b"true"),
            Value::Bool(false) => self.out.push_ascii(b"false"),
            Value::Number(n) => {
                if n.is_finite() {
                    let mut buf = NumberBuffer::new();
                    let text = buf.format(n);
                    self.out.push_ascii(text.as_bytes());
                } else {
                    self.out.push_ascii(b"null");
                }
            }
            Value::String(s) => {
                if let Some(flat) = s.as_flat() {
                    let report = scan.unwrap_or_else(|| scanner::scan(flat));
                    self.write_string(flat, report);
                }
            }
            Value::Array(arr) => {
                self.out.push_byte(b'[');
                self.stack.push(Frame::Array {
                    arr,
                    index: 0,
                    wrote: false,
                });
            }
            Value::Object(obj) => {
                self.out.push_byte(b'{');
                let cached =
                    shape_cache::status(obj.shape().id()) == Some(ShapeStatus::FastIterable);
                self.stack.push(Frame::Object {
                    obj,
                    index: 0,
                    wrote: false,
                    cached,
                    keys_clean: true,
                });
            }
        }
    }

    /// Writes a quoted string literal, bulk-copying when the scan showed a
    /// clean ASCII body and falling back to the precise escaping pass only
    /// when needed.
    fn write_string(&mut self, s: &str, report: ScanReport) {
        self.out.push_byte(b'"');
        if !report.needs_escaping {
            if report.ascii {
                self.out.push_ascii(s.as_bytes());
            } else {
                for c in s.chars() {
                    U::push_scalar(&mut self.out, c);
                }
            }
        } else {
            self.write_escaped(s);
        }
        self.out.push_byte(b'"');
    }

    /// Per-unit escaping pass: verbatim for clean runs, escape sequences
    /// for the offenders.
    fn write_escaped(&mut self, s: &str) {
        let mut rest = s;
        loop {
            let run = scanner::clean_ascii_run(rest.as_bytes());
            self.out.push_ascii(&rest.as_bytes()[..run]);
            rest = &rest[run..];
            let Some(c) = rest.chars().next() else {
                break;
            };
            if u32::from(c) < 0x80 {
                let b = u32::from(c) as u8;
                if let Some(esc) = scanner::short_escape(b) {
                    self.out.push_ascii(esc.as_bytes());
                } else if b < 0x20 {
                    self.out.push_ascii(&scanner::unicode_escape(b));
                } else {
                    self.out.push_byte(b);
                }
            } else {
                U::push_scalar(&mut self.out, c);
            }
            rest = &rest[c.len_utf8()..];
        }
    }

    /// Cycle test: is this container currently open? Root frames are the
    /// value itself, not an ancestor, and are excluded.
    fn on_stack(&self, ptr: usize) -> bool {
        self.stack.iter().any(|frame| match frame {
            Frame::Array { arr, .. } => arr.ptr_id() == ptr,
            Frame::Object { obj, .. } => obj.ptr_id() == ptr,
            Frame::Root { .. } => false,
        })
    }
}

/// Entry eligibility for an object: no custom hook, no indexed properties,
/// every key a plain enumerable string. Checked before the opening token.
fn fast_eligible(obj: &Object) -> bool {
    obj.to_json().is_none() && !obj.has_elements() && obj.shape().is_plain()
}
