//! The general-purpose serializer: the unrestricted, fully-compliant route.
//!
//! Handles everything the fast path refuses: custom serialization hooks,
//! replacer and space transforms, symbol and non-enumerable keys, indexed
//! properties, rope strings, and `undefined` policy. Also provides the
//! resume entry point that completes a fast-path traversal after a
//! mid-traversal disqualification, so that output is byte-identical no
//! matter which path (or combination) produced it.

use crate::{
    error::StringifyError,
    number::NumberBuffer,
    options::{Replacer, StringifyOptions},
    scanner,
    serializer::Frame,
    shape::PropertyKey,
    value::{Array, Object, Value},
};

/// Recursion budget for this path; the fast path is iterative and needs
/// none.
const MAX_DEPTH: usize = 1000;

/// Serializes a value with full semantics. Returns `None` when the result
/// is `undefined` (e.g. an undefined or hook-erased root).
pub(crate) fn stringify(
    root: &Value,
    options: &StringifyOptions,
) -> Result<Option<String>, StringifyError> {
    let mut ser = Serializer::new(options);
    let transformed = ser.transform("", root);
    ser.serialize(&transformed)
}

/// Completes a suspended fast-path traversal: serializes the pending member
/// of each open frame's remainder with full semantics and closes every open
/// container, appending onto the already-emitted prefix.
pub(crate) fn resume(stack: Vec<Frame>, out: &mut String) -> Result<(), StringifyError> {
    let compact = StringifyOptions::default();
    let mut ser = Serializer::new(&compact);
    // Every open container is an ancestor of the resume point.
    for frame in &stack {
        match frame {
            Frame::Array { arr, .. } => ser.active.push(arr.ptr_id()),
            Frame::Object { obj, .. } => ser.active.push(obj.ptr_id()),
            Frame::Root { .. } => {}
        }
    }

    let mut frames = stack;
    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Root { value, emitted } => {
                if !emitted {
                    let transformed = ser.transform("", &value);
                    if let Some(text) = ser.serialize(&transformed)? {
                        out.push_str(&text);
                    }
                }
            }
            Frame::Array {
                arr,
                mut index,
                mut wrote,
            } => {
                while index < arr.len() {
                    let element = arr.get(index);
                    let mut index_text = itoa::Buffer::new();
                    let transformed = ser.transform(index_text.format(index), &element);
                    let text = ser
                        .serialize(&transformed)?
                        .unwrap_or_else(|| String::from("null"));
                    if wrote {
                        out.push(',');
                    }
                    out.push_str(&text);
                    wrote = true;
                    index += 1;
                }
                out.push(']');
                ser.leave();
            }
            Frame::Object {
                obj,
                mut index,
                mut wrote,
                ..
            } => {
                let shape = obj.shape().clone();
                while index < shape.len() {
                    let property = &shape.properties()[index];
                    let PropertyKey::Str(key) = &property.key else {
                        index += 1;
                        continue;
                    };
                    let value = obj.get_named(index);
                    let transformed = ser.transform(key, &value);
                    if let Some(text) = ser.serialize(&transformed)? {
                        if wrote {
                            out.push(',');
                        }
                        quote_into(key, out);
                        out.push(':');
                        out.push_str(&text);
                        wrote = true;
                    }
                    index += 1;
                }
                out.push('}');
                ser.leave();
            }
        }
    }
    Ok(())
}

struct Serializer<'a> {
    active: Vec<usize>,
    replacer: Option<&'a Replacer>,
    gap: String,
    indent: String,
}

impl<'a> Serializer<'a> {
    fn new(options: &'a StringifyOptions) -> Self {
        Self {
            active: Vec::new(),
            replacer: options.replacer.as_ref(),
            gap: options
                .space
                .as_ref()
                .map(crate::options::Space::gap)
                .unwrap_or_default(),
            indent: String::new(),
        }
    }

    /// Applies the custom hook and the replacer function, in that order.
    fn transform(&mut self, key: &str, value: &Value) -> Value {
        let mut value = value.clone();
        if let Value::Object(obj) = &value {
            if let Some(hook) = obj.to_json() {
                value = hook(&value);
            }
        }
        if let Some(Replacer::Function(f)) = self.replacer {
            value = f(key, &value);
        }
        value
    }

    /// Serializes an already-transformed value. `None` means the value is
    /// not serializable (`undefined`); the caller applies the positional
    /// policy (omit in objects, `null` in arrays, absent at the top level).
    fn serialize(&mut self, value: &Value) -> Result<Option<String>, StringifyError> {
        match value {
            Value::Undefined => Ok(None),
            Value::Null => Ok(Some(String::from("null"))),
            Value::Bool(b) => Ok(Some(String::from(if *b { "true" } else { "false" }))),
            Value::Number(n) => {
                if n.is_finite() {
                    Ok(Some(NumberBuffer::new().format(*n).to_string()))
                } else {
                    Ok(Some(String::from("null")))
                }
            }
            Value::String(s) => {
                let flat = s.flatten();
                let mut out = String::with_capacity(flat.len() + 2);
                quote_into(&flat, &mut out);
                Ok(Some(out))
            }
            Value::Array(arr) => self.serialize_array(arr).map(Some),
            Value::Object(obj) => self.serialize_object(obj).map(Some),
        }
    }

    fn serialize_array(&mut self, arr: &Array) -> Result<String, StringifyError> {
        self.enter(arr.ptr_id())?;
        let stepback = self.indent.clone();
        self.indent.push_str(&self.gap.clone());

        let mut parts = Vec::with_capacity(arr.len());
        for index in 0..arr.len() {
            let element = arr.get(index);
            let mut index_text = itoa::Buffer::new();
            let transformed = self.transform(index_text.format(index), &element);
            parts.push(
                self.serialize(&transformed)?
                    .unwrap_or_else(|| String::from("null")),
            );
        }

        let text = self.compose('[', &parts, &stepback, ']');
        self.indent = stepback;
        self.leave();
        Ok(text)
    }

    fn serialize_object(&mut self, obj: &Object) -> Result<String, StringifyError> {
        self.enter(obj.ptr_id())?;
        let stepback = self.indent.clone();
        self.indent.push_str(&self.gap.clone());

        let mut parts = Vec::new();
        let separator = if self.gap.is_empty() { ":" } else { ": " };

        if let Some(Replacer::PropertyList(list)) = self.replacer {
            let list = list.clone();
            let mut seen: Vec<&str> = Vec::new();
            for key in &list {
                if seen.contains(&key.as_str()) {
                    continue;
                }
                seen.push(key);
                let Some(value) = obj.get_property(key) else {
                    continue;
                };
                let transformed = self.transform(key, &value);
                if let Some(text) = self.serialize(&transformed)? {
                    parts.push(member(key, separator, &text));
                }
            }
        } else {
            // Indexed elements enumerate first, then named keys in shape
            // order; symbols and non-enumerables are skipped.
            for index in 0..obj.elements_len() {
                let key = index.to_string();
                let element = obj.element(index);
                let transformed = self.transform(&key, &element);
                if let Some(text) = self.serialize(&transformed)? {
                    parts.push(member(&key, separator, &text));
                }
            }
            let shape = obj.shape().clone();
            for (slot, property) in shape.properties().iter().enumerate() {
                if !property.enumerable {
                    continue;
                }
                let PropertyKey::Str(key) = &property.key else {
                    continue;
                };
                let value = obj.get_named(slot);
                let transformed = self.transform(key, &value);
                if let Some(text) = self.serialize(&transformed)? {
                    parts.push(member(key, separator, &text));
                }
            }
        }

        let text = self.compose('{', &parts, &stepback, '}');
        self.indent = stepback;
        self.leave();
        Ok(text)
    }

    /// Joins members with the current gap/indent, compactly when no space
    /// was configured.
    fn compose(&self, open: char, parts: &[String], stepback: &str, close: char) -> String {
        if parts.is_empty() {
            return format!("{open}{close}");
        }
        if self.gap.is_empty() {
            return format!("{open}{}{close}", parts.join(","));
        }
        let joiner = format!(",\n{}", self.indent);
        format!(
            "{open}\n{}{}\n{}{close}",
            self.indent,
            parts.join(&joiner),
            stepback
        )
    }

    fn enter(&mut self, ptr: usize) -> Result<(), StringifyError> {
        if self.active.contains(&ptr) {
            return Err(StringifyError::CircularStructure);
        }
        if self.active.len() >= MAX_DEPTH {
            return Err(StringifyError::NestingTooDeep);
        }
        self.active.push(ptr);
        Ok(())
    }

    fn leave(&mut self) {
        self.active.pop();
    }
}

fn member(key: &str, separator: &str, value: &str) -> String {
    let mut out = String::with_capacity(key.len() + separator.len() + value.len() + 2);
    quote_into(key, &mut out);
    out.push_str(separator);
    out.push_str(value);
    out
}

/// Writes a quoted, escaped JSON string literal. Uses the same escape
/// decisions as the fast path's writer so the two routes agree byte for
/// byte.
pub(crate) fn quote_into(s: &str, out: &mut String) {
    out.push('"');
    let mut rest = s;
    loop {
        let run = scanner::clean_ascii_run(rest.as_bytes());
        out.push_str(&rest[..run]);
        rest = &rest[run..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        if u32::from(c) < 0x80 {
            let b = u32::from(c) as u8;
            if let Some(esc) = scanner::short_escape(b) {
                out.push_str(esc);
            } else if b < 0x20 {
                out.extend(scanner::unicode_escape(b).iter().map(|&e| char::from(e)));
            } else {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out.push('"');
}
