//! Writing values as PDF bytes.

use float_cmp::approx_eq;
use log::warn;

use crate::object::{Dict, Name, Object, Real, Ref, Str, StrKind};

/// A value that can be written into a byte buffer.
pub trait Primitive {
    /// Append the serialized form of `self` to `buf`.
    fn write(&self, buf: &mut Vec<u8>);

    /// Serialize `self` into a new buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.write(&mut buf);
        buf
    }
}

impl Primitive for bool {
    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(if *self { b"true" } else { b"false" });
    }
}

impl Primitive for i64 {
    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.to_string().as_bytes());
    }
}

impl Primitive for i32 {
    fn write(&self, buf: &mut Vec<u8>) {
        i64::from(*self).write(buf)
    }
}

impl Primitive for f32 {
    fn write(&self, buf: &mut Vec<u8>) {
        let value = *self;

        if !value.is_finite() {
            warn!("non-finite number {value} was written as 0");
            buf.push(b'0');
            return;
        }

        let rounded = value.round();
        if approx_eq!(f32, value, rounded, ulps = 2) && rounded.abs() < 1e9 {
            (rounded as i64).write(buf);
            return;
        }

        let mut formatted = format!("{:.5}", value);
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.pop();
        }
        if formatted == "-0" {
            formatted = "0".to_string();
        }

        buf.extend_from_slice(formatted.as_bytes());
    }
}

impl Primitive for Real {
    fn write(&self, buf: &mut Vec<u8>) {
        self.0.write(buf)
    }
}

impl Primitive for Name {
    fn write(&self, buf: &mut Vec<u8>) {
        buf.push(b'/');
        for &byte in self.as_bytes() {
            if is_regular_name_byte(byte) {
                buf.push(byte);
            } else {
                buf.push(b'#');
                push_hex(buf, byte);
            }
        }
    }
}

fn is_regular_name_byte(byte: u8) -> bool {
    matches!(byte, b'!'..=b'~')
        && !matches!(
            byte,
            b'#' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
}

impl Primitive for Str {
    fn write(&self, buf: &mut Vec<u8>) {
        match self.kind() {
            StrKind::Literal => {
                buf.push(b'(');
                for &byte in self.as_bytes() {
                    match byte {
                        b'\\' => buf.extend_from_slice(b"\\\\"),
                        b'(' => buf.extend_from_slice(b"\\("),
                        b')' => buf.extend_from_slice(b"\\)"),
                        b'\n' => buf.extend_from_slice(b"\\n"),
                        b'\r' => buf.extend_from_slice(b"\\r"),
                        b'\t' => buf.extend_from_slice(b"\\t"),
                        0x08 => buf.extend_from_slice(b"\\b"),
                        0x0C => buf.extend_from_slice(b"\\f"),
                        _ => buf.push(byte),
                    }
                }
                buf.push(b')');
            }
            StrKind::Hex => {
                buf.push(b'<');
                for &byte in self.as_bytes() {
                    push_hex(buf, byte);
                }
                buf.push(b'>');
            }
        }
    }
}

fn push_hex(buf: &mut Vec<u8>, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    buf.push(HEX[usize::from(byte >> 4)]);
    buf.push(HEX[usize::from(byte & 0x0F)]);
}

impl Primitive for Ref {
    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.to_string().as_bytes());
    }
}

impl Primitive for Dict {
    fn write(&self, buf: &mut Vec<u8>) {
        write_dict(self, buf, 0)
    }
}

impl Primitive for Object {
    fn write(&self, buf: &mut Vec<u8>) {
        write_object(self, buf, 0)
    }
}

fn write_object(object: &Object, buf: &mut Vec<u8>, indent: usize) {
    match object {
        Object::Null => buf.extend_from_slice(b"null"),
        Object::Bool(b) => b.write(buf),
        Object::Integer(i) => i.write(buf),
        Object::Real(r) => r.write(buf),
        Object::Name(n) => n.write(buf),
        Object::String(s) => s.write(buf),
        Object::Literal(bytes) => buf.extend_from_slice(bytes),
        Object::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_object(item, buf, indent);
            }
            buf.push(b']');
        }
        Object::Dict(dict) => write_dict(dict, buf, indent),
        Object::Ref(r) => r.write(buf),
    }
}

fn write_dict(dict: &Dict, buf: &mut Vec<u8>, indent: usize) {
    if dict.is_empty() {
        buf.extend_from_slice(b"<<>>");
        return;
    }

    buf.extend_from_slice(b"<<\n");
    for (key, value) in dict.iter() {
        buf.resize(buf.len() + indent + 2, b' ');
        key.write(buf);
        buf.push(b' ');
        write_object(value, buf, indent + 2);
        buf.push(b'\n');
    }
    buf.resize(buf.len() + indent, b' ');
    buf.extend_from_slice(b">>");
}

/// Write `object` as the indirect object `r`.
pub(crate) fn write_indirect_object(r: Ref, object: &Object, buf: &mut Vec<u8>) {
    write_object_start(r, buf);
    object.write(buf);
    buf.extend_from_slice(b"\nendobj\n\n");
}

/// Write an already encoded stream as the indirect object `r`.
pub(crate) fn write_indirect_stream(r: Ref, dict: &Dict, data: &[u8], buf: &mut Vec<u8>) {
    write_object_start(r, buf);
    dict.write(buf);
    buf.extend_from_slice(b"\nstream\n");
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\nendstream\nendobj\n\n");
}

fn write_object_start(r: Ref, buf: &mut Vec<u8>) {
    buf.extend_from_slice(format!("{} {} obj\n", r.get(), r.generation()).as_bytes());
}
