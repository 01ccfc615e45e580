//! The object model.
//!
//! Everything that ends up in a PDF file is one of a small, fixed set of value
//! types: null, booleans, numbers, names, strings, arrays, dictionaries and
//! references to indirect objects. [`Object`] is the closed sum of all of them.
//! Values that are written as their own numbered object are wrapped in a
//! [`Payload`], which can additionally be a [`Stream`].

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::stream::Stream;

/// A reference to an indirect object.
///
/// Object numbers start at 1; number 0 is reserved for the head of the
/// free list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ref {
    num: u32,
    generation: u16,
}

impl Ref {
    /// Create a new reference with generation 0.
    pub const fn new(num: u32) -> Self {
        Self { num, generation: 0 }
    }

    /// Create a new reference with a specific generation.
    pub const fn with_generation(num: u32, generation: u16) -> Self {
        Self { num, generation }
    }

    /// The object number.
    pub const fn get(self) -> u32 {
        self.num
    }

    /// The generation number.
    pub const fn generation(self) -> u16 {
        self.generation
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.num, self.generation)
    }
}

/// A name, like `/Type`. Stored without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Vec<u8>);

impl Name {
    /// Create a new name from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

/// How a string is written.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StrKind {
    /// `(Hello)`
    Literal,
    /// `<48656C6C6F>`
    Hex,
}

/// A byte string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Str {
    bytes: Vec<u8>,
    kind: StrKind,
}

impl Str {
    /// A string written in literal form.
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            kind: StrKind::Literal,
        }
    }

    /// A string written in hexadecimal form.
    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            kind: StrKind::Hex,
        }
    }

    /// A text string. ASCII text is kept as is, everything else is
    /// stored as UTF-16BE with a byte order mark.
    pub fn text(text: &str) -> Self {
        if text.is_ascii() {
            Self::literal(text.as_bytes())
        } else {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in text.encode_utf16() {
                bytes.extend(unit.to_be_bytes());
            }

            Self::hex(bytes)
        }
    }

    /// The raw bytes of the string.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// How the string will be written.
    pub fn kind(&self) -> StrKind {
        self.kind
    }
}

impl From<&str> for Str {
    fn from(value: &str) -> Self {
        Self::literal(value.as_bytes())
    }
}

/// A real number.
///
/// Equality and hashing are based on the bit pattern, so that objects
/// containing numbers can be deduplicated.
#[derive(Debug, Copy, Clone)]
pub struct Real(pub f32);

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// A direct object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    /// `null`
    Null,
    /// `true` or `false`
    Bool(bool),
    /// An integer number.
    Integer(i64),
    /// A real number.
    Real(Real),
    /// A name.
    Name(Name),
    /// A string.
    String(Str),
    /// Bytes that are written exactly as they are, for content that has
    /// already been serialized elsewhere.
    Literal(Vec<u8>),
    /// An array of objects.
    Array(Vec<Object>),
    /// A dictionary.
    Dict(Dict),
    /// A reference to an indirect object.
    Ref(Ref),
}

impl Object {
    /// Create a literal from already serialized content.
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Literal(bytes.into())
    }

    /// Collect all references contained in this object, in the
    /// order they appear.
    pub fn collect_refs(&self, refs: &mut Vec<Ref>) {
        match self {
            Object::Ref(r) => refs.push(*r),
            Object::Array(items) => {
                for item in items {
                    item.collect_refs(refs);
                }
            }
            Object::Dict(dict) => dict.collect_refs(refs),
            _ => {}
        }
    }

    /// Return the dictionary, if this object is one.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Return the name, if this object is one.
    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Return the integer, if this object is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Return the reference, if this object is one.
    pub fn as_reference(&self) -> Option<Ref> {
        match self {
            Object::Ref(r) => Some(*r),
            _ => None,
        }
    }
}

macro_rules! integer_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Object {
                fn from(value: $ty) -> Self {
                    Object::Integer(value as i64)
                }
            }
        )+
    };
}

integer_from!(i32, i64, u8, u16, u32, usize);

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Bool(value)
    }
}

impl From<f32> for Object {
    fn from(value: f32) -> Self {
        Object::Real(Real(value))
    }
}

impl From<Name> for Object {
    fn from(value: Name) -> Self {
        Object::Name(value)
    }
}

impl From<Str> for Object {
    fn from(value: Str) -> Self {
        Object::String(value)
    }
}

impl From<Ref> for Object {
    fn from(value: Ref) -> Self {
        Object::Ref(value)
    }
}

impl From<Dict> for Object {
    fn from(value: Dict) -> Self {
        Object::Dict(value)
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::Array(value)
    }
}

/// A dictionary.
///
/// Entries keep their insertion order, which makes the output
/// reproducible. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dict {
    entries: Vec<(Name, Object)>,
}

impl Dict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dictionary whose `/Type` entry is set to `ty`.
    pub fn with_type(ty: &str) -> Self {
        let mut dict = Self::new();
        dict.insert("Type", Name::from(ty));
        dict
    }

    /// Insert an entry, returning the previous value of the key.
    pub fn insert(&mut self, key: impl Into<Name>, value: impl Into<Object>) -> Option<Object> {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert an entry and return the dictionary, for chaining.
    pub fn pair(&mut self, key: impl Into<Name>, value: impl Into<Object>) -> &mut Self {
        self.insert(key, value);
        self
    }

    /// Get the value of a key.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_bytes() == key.as_bytes())
            .map(|(_, v)| v)
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &str) -> Option<Object> {
        let index = self
            .entries
            .iter()
            .position(|(k, _)| k.as_bytes() == key.as_bytes())?;
        Some(self.entries.remove(index).1)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&Name, &mut Object)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    /// Collect all references contained in the dictionary.
    pub fn collect_refs(&self, refs: &mut Vec<Ref>) {
        for (_, value) in &self.entries {
            value.collect_refs(refs);
        }
    }
}

/// The content of an indirect object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload {
    /// A direct object written as an indirect one.
    Object(Object),
    /// A stream.
    Stream(Stream),
}

impl Payload {
    /// Collect all references contained in the payload.
    pub fn collect_refs(&self, refs: &mut Vec<Ref>) {
        match self {
            Payload::Object(object) => object.collect_refs(refs),
            Payload::Stream(stream) => stream.dict().collect_refs(refs),
        }
    }
}

impl From<Object> for Payload {
    fn from(value: Object) -> Self {
        Payload::Object(value)
    }
}

impl From<Dict> for Payload {
    fn from(value: Dict) -> Self {
        Payload::Object(Object::Dict(value))
    }
}

impl From<Stream> for Payload {
    fn from(value: Stream) -> Self {
        Payload::Stream(value)
    }
}
