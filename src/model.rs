//! Data model for the extracted API surface — format-agnostic.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;

/// Ordered, string-keyed table where the first registration of a key wins.
#[derive(Debug, Clone)]
pub struct Table<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Table<T> {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key` unless the key is already present.
    /// Returns `false` (and drops `value`) for a duplicate key.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: T) -> bool {
        let key = key.into();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        true
    }

    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> T) -> &mut T {
        let pos = match self.index.get(key) {
            Some(&pos) => pos,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), make()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Serialize> Serialize for Table<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A declaration recovered from a header: `<return> <name>(<params>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawSignature {
    pub return_type: String,
    pub name: String,
    /// Parameter text between the parentheses, untouched.
    pub params: String,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberVariable {
    pub ty: String,
    pub name: String,
    pub docs: Vec<String>,
}

/// One brace-balanced `struct`/`class` body from a header.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassRecord {
    pub name: String,
    /// Overload sets keyed by member name, overloads in source order.
    pub functions: Table<Vec<RawSignature>>,
    pub variables: Vec<MemberVariable>,
}

impl ClassRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_function(&mut self, sig: RawSignature) {
        let key = sig.name.clone();
        self.functions.get_or_insert_with(&key, Vec::new).push(sig);
    }

    pub fn variable(&self, name: &str) -> Option<&MemberVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// `lua["name"] = <native>` registration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionBinding {
    pub script_name: String,
    pub native: String,
    pub docs: Vec<String>,
}

impl FunctionBinding {
    /// First doc line acts as a marker (`Deprecated`, `NoDoc`).
    pub fn has_marker(&self, marker: &str) -> bool {
        self.docs.first().is_some_and(|d| d.trim() == marker)
    }
}

/// Bare `lua["name"];` callback-table slot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventName {
    pub name: String,
    pub docs: Vec<String>,
}

/// One entry of a usertype registration's attribute list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Attribute {
    Member { name: String, expr: String },
    Constructors,
}

/// `new_usertype<Native>("Name", ...)` as scanned, before resolution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Usertype {
    pub native_class: String,
    pub script_name: String,
    pub bases: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldType {
    Declared(String),
    /// No native member matched.
    Unknown,
    /// Lambda accessor rendered as `((params) => {}) | boolean`.
    Accessor { params: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MemberKind {
    Constructor {
        params: String,
    },
    Method {
        return_type: String,
        params: String,
        is_static: bool,
    },
    Field {
        ty: FieldType,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMember {
    pub name: String,
    pub kind: MemberKind,
    pub docs: Vec<String>,
}

/// A usertype joined against its class record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExposedType {
    pub script_name: String,
    pub native_class: String,
    /// Only the last base is rendered.
    pub bases: Vec<String>,
    pub members: Vec<ResolvedMember>,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Alias {
    pub name: String,
    pub ty: String,
}

/// `NAME = { ... }` block copied verbatim from the enum data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnumBlock {
    pub name: String,
    pub body: String,
}

/// Everything the scanners collected, merged across files.
#[derive(Debug, Default, Serialize)]
pub struct Corpus {
    pub rpc: Vec<RawSignature>,
    pub classes: Table<ClassRecord>,
    pub functions: Table<FunctionBinding>,
    pub events: Vec<EventName>,
    pub usertypes: Table<Usertype>,
    pub libraries: Vec<String>,
    pub casts: Vec<String>,
    pub aliases: Table<Alias>,
    pub enums: Vec<EnumBlock>,
}

impl Corpus {
    /// All RPC overloads declared under `name`.
    pub fn rpc_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawSignature> {
        self.rpc.iter().filter(move |sig| sig.name == name)
    }

    pub fn is_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name == name)
    }
}

/// Corpus plus resolved types, as consumed by the renderers.
#[derive(Debug, Default, Serialize)]
pub struct Surface {
    #[serde(flatten)]
    pub corpus: Corpus,
    pub types: Vec<ExposedType>,
}
