use std::collections::{BTreeSet, HashMap};

use weft_classfile::Descriptor;

/// Which naming scheme a lookup translates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Human-readable names to the names found in compiled classes.
    ToCompiled,
    /// Compiled names to human-readable names.
    ToMapped,
}

/// Lookups keyed by names in the source naming scheme of one direction.
#[derive(Debug, Default, Clone)]
struct Lookups {
    classes: HashMap<String, String>,
    /// `(owner, name)` -> target name.
    fields: HashMap<(String, String), String>,
    /// `(owner, name, descriptor)` -> target name.
    methods: HashMap<(String, String, String), String>,
    /// `(owner, name)` -> every target name any overload maps to.
    method_overloads: HashMap<(String, String), BTreeSet<String>>,
    /// `name` -> every target field name across owners.
    field_names: HashMap<String, BTreeSet<String>>,
    /// `name` -> `(descriptor, target name)` across owners.
    method_names: HashMap<String, Vec<(String, String)>>,
}

impl Lookups {
    fn add_field(&mut self, owner: &str, name: &str, target: &str) {
        self.fields
            .insert((owner.to_string(), name.to_string()), target.to_string());
        self.field_names
            .entry(name.to_string())
            .or_default()
            .insert(target.to_string());
    }

    fn add_method(&mut self, owner: &str, name: &str, descriptor: &str, target: &str) {
        self.methods.insert(
            (owner.to_string(), name.to_string(), descriptor.to_string()),
            target.to_string(),
        );
        self.method_overloads
            .entry((owner.to_string(), name.to_string()))
            .or_default()
            .insert(target.to_string());
        self.method_names
            .entry(name.to_string())
            .or_default()
            .push((descriptor.to_string(), target.to_string()));
    }
}

/// One version's mapping table.
///
/// Every lookup returns `None` when the table has no entry; callers treat that
/// as "already in the target naming scheme".
#[derive(Debug, Clone)]
pub struct MappingTable {
    version: String,
    to_compiled: Lookups,
    to_mapped: Lookups,
}

impl MappingTable {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            to_compiled: Lookups::default(),
            to_mapped: Lookups::default(),
        }
    }

    /// A table without entries: every lookup is the identity.
    pub fn identity(version: impl Into<String>) -> Self {
        Self::new(version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_empty(&self) -> bool {
        self.to_compiled.classes.is_empty()
            && self.to_compiled.fields.is_empty()
            && self.to_compiled.methods.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.to_compiled.classes.len()
    }

    pub fn add_class(&mut self, compiled: &str, mapped: &str) {
        self.to_compiled
            .classes
            .insert(mapped.to_string(), compiled.to_string());
        self.to_mapped
            .classes
            .insert(compiled.to_string(), mapped.to_string());
    }

    pub fn add_field(&mut self, compiled: (&str, &str), mapped: (&str, &str)) {
        self.to_compiled.add_field(mapped.0, mapped.1, compiled.1);
        self.to_mapped.add_field(compiled.0, compiled.1, mapped.1);
    }

    pub fn add_method(&mut self, compiled: (&str, &str, &str), mapped: (&str, &str, &str)) {
        self.to_compiled
            .add_method(mapped.0, mapped.1, mapped.2, compiled.1);
        self.to_mapped
            .add_method(compiled.0, compiled.1, compiled.2, mapped.1);
    }

    fn lookups(&self, direction: Direction) -> &Lookups {
        match direction {
            Direction::ToCompiled => &self.to_compiled,
            Direction::ToMapped => &self.to_mapped,
        }
    }

    pub fn class(&self, name: &str, direction: Direction) -> Option<&str> {
        self.lookups(direction).classes.get(name).map(String::as_str)
    }

    /// Maps a class name, falling back to the input.
    pub fn map_class(&self, name: &str, direction: Direction) -> String {
        self.class(name, direction).unwrap_or(name).to_string()
    }

    /// Rewrites every class named in `descriptor`. Unparseable descriptors are
    /// returned unchanged.
    pub fn map_descriptor(&self, descriptor: &str, direction: Direction) -> String {
        match Descriptor::parse(descriptor) {
            Ok(parsed) => parsed
                .map_classes(&mut |name| self.class(name, direction).map(str::to_string))
                .to_string(),
            Err(_) => descriptor.to_string(),
        }
    }

    /// Field name lookup. Without an owner the name must map to a single
    /// target across all owners.
    pub fn field(&self, owner: Option<&str>, name: &str, direction: Direction) -> Option<&str> {
        let lookups = self.lookups(direction);
        match owner {
            Some(owner) => lookups
                .fields
                .get(&(owner.to_string(), name.to_string()))
                .map(String::as_str),
            None => unique(lookups.field_names.get(name)?.iter()),
        }
    }

    /// Method name lookup. `owner` and `descriptor` narrow the search; the
    /// answer is only returned when every remaining candidate agrees.
    pub fn method(
        &self,
        owner: Option<&str>,
        name: &str,
        descriptor: Option<&str>,
        direction: Direction,
    ) -> Option<&str> {
        let lookups = self.lookups(direction);
        match (owner, descriptor) {
            (Some(owner), Some(descriptor)) => lookups
                .methods
                .get(&(owner.to_string(), name.to_string(), descriptor.to_string()))
                .map(String::as_str),
            (Some(owner), None) => unique(
                lookups
                    .method_overloads
                    .get(&(owner.to_string(), name.to_string()))?
                    .iter(),
            ),
            (None, descriptor) => unique(
                lookups
                    .method_names
                    .get(name)?
                    .iter()
                    .filter(|(desc, _)| descriptor.map_or(true, |d| d == desc))
                    .map(|(_, target)| target),
            ),
        }
    }
}

fn unique<'a>(mut targets: impl Iterator<Item = &'a String>) -> Option<&'a str> {
    let first = targets.next()?;
    if targets.all(|t| t == first) {
        Some(first.as_str())
    } else {
        None
    }
}
