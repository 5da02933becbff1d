use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use weft_classfile::{ClassFile, Instruction};
use weft_core::ClassName;

use crate::selector::MemberKey;
use crate::source::SourceClass;

#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodModel {
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
    /// `None` for abstract and native methods, and for bodies that failed to
    /// decode.
    pub body: Option<MethodBody>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldModel {
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
}

/// A target class: its compiled members and, when available, its source.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel {
    pub name: ClassName,
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub fields: Vec<FieldModel>,
    pub methods: Vec<MethodModel>,
    pub source: Option<Arc<SourceClass>>,
}

impl ClassModel {
    pub fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            super_class: Some(ClassName::object()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            source: None,
        }
    }

    pub fn from_classfile(class: ClassFile) -> Self {
        let name = ClassName::new(&class.this_class);
        let methods = class
            .methods
            .into_iter()
            .map(|method| {
                if let Some(err) = &method.code_error {
                    tracing::debug!(
                        target = "weft.mixin",
                        class = %name,
                        method = %method.name,
                        descriptor = %method.descriptor,
                        error = %err,
                        "skipping undecodable method body"
                    );
                }
                MethodModel {
                    name: method.name,
                    descriptor: method.descriptor,
                    access_flags: method.access_flags,
                    body: method.code.map(|code| MethodBody {
                        instructions: code.instructions,
                    }),
                }
            })
            .collect();
        let fields = class
            .fields
            .into_iter()
            .map(|field| FieldModel {
                name: field.name,
                descriptor: field.descriptor,
                access_flags: field.access_flags,
            })
            .collect();

        Self {
            super_class: class.super_class.map(ClassName::new),
            interfaces: class.interfaces.into_iter().map(ClassName::new).collect(),
            name,
            fields,
            methods,
            source: None,
        }
    }

    pub fn with_source(mut self, source: SourceClass) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodModel> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declares(&self, name: &str, descriptor: &str) -> bool {
        if descriptor.starts_with('(') {
            self.method(name, descriptor).is_some()
        } else {
            self.fields
                .iter()
                .any(|f| f.name == name && f.descriptor == descriptor)
        }
    }

    pub fn method_key(&self, method: &MethodModel) -> MemberKey {
        MemberKey::new(self.name.clone(), method.name.clone(), method.descriptor.clone())
    }

    pub fn field_key(&self, field: &FieldModel) -> MemberKey {
        MemberKey::new(self.name.clone(), field.name.clone(), field.descriptor.clone())
    }
}

/// Supplies class models and the type hierarchy.
///
/// Everything a provider returns is expected to be resident in memory.
pub trait ClassModelProvider {
    fn class_model(&self, name: &ClassName) -> Option<Arc<ClassModel>>;

    /// Direct supertypes: superclass first, then interfaces.
    fn supertypes(&self, name: &ClassName) -> Vec<ClassName> {
        let Some(model) = self.class_model(name) else {
            return Vec::new();
        };
        model
            .super_class
            .iter()
            .chain(model.interfaces.iter())
            .cloned()
            .collect()
    }
}

/// Every proper supertype of `start`, breadth first, each listed once.
pub fn ancestors(provider: &dyn ClassModelProvider, start: &ClassName) -> Vec<ClassName> {
    let mut seen = HashSet::from([start.clone()]);
    let mut queue = VecDeque::from([start.clone()]);
    let mut out = Vec::new();
    while let Some(next) = queue.pop_front() {
        for parent in provider.supertypes(&next) {
            if seen.insert(parent.clone()) {
                out.push(parent.clone());
                queue.push_back(parent);
            }
        }
    }
    out
}

/// The class that declares `name descriptor` as seen through `qualifier`:
/// the qualifier itself or its nearest supertype with the member. Falls back
/// to the qualifier when no model in the hierarchy declares it.
pub fn declaring_class(
    provider: &dyn ClassModelProvider,
    qualifier: &ClassName,
    name: &str,
    descriptor: &str,
) -> ClassName {
    std::iter::once(qualifier.clone())
        .chain(ancestors(provider, qualifier))
        .find(|class| {
            provider
                .class_model(class)
                .is_some_and(|model| model.declares(name, descriptor))
        })
        .unwrap_or_else(|| qualifier.clone())
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryClassModels {
    classes: HashMap<ClassName, Arc<ClassModel>>,
}

impl InMemoryClassModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: ClassModel) {
        self.classes.insert(model.name.clone(), Arc::new(model));
    }

    pub fn with(mut self, model: ClassModel) -> Self {
        self.insert(model);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, name: &ClassName) -> bool {
        self.classes.contains_key(name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &ClassName> {
        self.classes.keys()
    }
}

impl FromIterator<ClassModel> for InMemoryClassModels {
    fn from_iter<I: IntoIterator<Item = ClassModel>>(iter: I) -> Self {
        let mut models = Self::new();
        for model in iter {
            models.insert(model);
        }
        models
    }
}

impl ClassModelProvider for InMemoryClassModels {
    fn class_model(&self, name: &ClassName) -> Option<Arc<ClassModel>> {
        self.classes.get(name).cloned()
    }
}
