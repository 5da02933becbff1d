use std::collections::BTreeMap;
use std::fmt;

use weft_core::ClassName;

/// Injection point type named by `@At(value = ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtCode {
    Invoke,
    InvokeAssign,
    Field,
    New,
    InvokeString,
}

impl AtCode {
    pub fn parse(text: &str) -> Option<Self> {
        Some(match text.trim().to_ascii_uppercase().as_str() {
            "INVOKE" => AtCode::Invoke,
            "INVOKE_ASSIGN" => AtCode::InvokeAssign,
            "FIELD" => AtCode::Field,
            "NEW" => AtCode::New,
            "INVOKE_STRING" => AtCode::InvokeString,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AtCode::Invoke => "INVOKE",
            AtCode::InvokeAssign => "INVOKE_ASSIGN",
            AtCode::Field => "FIELD",
            AtCode::New => "NEW",
            AtCode::InvokeString => "INVOKE_STRING",
        }
    }
}

impl fmt::Display for AtCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `@At` half of an injector: where inside the target methods to look.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionPoint {
    pub code: Option<AtCode>,
    /// Selectors for the target methods to scan. Empty means every method of
    /// the target class that has a body.
    pub methods: Vec<String>,
    /// `key=value` arguments; `ldc` names the string for `INVOKE_STRING`.
    pub args: BTreeMap<String, String>,
    /// Keep only the n-th match (0-based) in each scanned method.
    pub ordinal: Option<usize>,
    /// Keep only matches with this opcode.
    pub opcode: Option<u8>,
}

impl InjectionPoint {
    pub fn new(code: Option<AtCode>) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn in_method(mut self, selector: impl Into<String>) -> Self {
        self.methods.push(selector.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    pub fn opcode(mut self, opcode: u8) -> Self {
        self.opcode = Some(opcode);
        self
    }

    pub fn ldc(&self) -> Option<&str> {
        self.args.get("ldc").map(String::as_str)
    }
}

/// What the selector of a declaration points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    /// A method declared by the target class, e.g. `@Inject(method = ...)`.
    Method,
    /// A field declared by the target class, e.g. `@Shadow` or `@Accessor`.
    Field,
    /// A usage inside the target methods, e.g. `@At(target = ...)`.
    InjectionPoint(InjectionPoint),
}

/// The annotated element a selector was written on, together with the mixin's
/// target classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinDeclaration {
    pub name: String,
    /// Target classes in the human-readable naming scheme.
    pub targets: Vec<ClassName>,
    pub kind: DeclarationKind,
}

impl MixinDeclaration {
    pub fn method(name: impl Into<String>, targets: impl IntoIterator<Item = ClassName>) -> Self {
        Self::new(name, targets, DeclarationKind::Method)
    }

    pub fn field(name: impl Into<String>, targets: impl IntoIterator<Item = ClassName>) -> Self {
        Self::new(name, targets, DeclarationKind::Field)
    }

    pub fn injection(
        name: impl Into<String>,
        targets: impl IntoIterator<Item = ClassName>,
        point: InjectionPoint,
    ) -> Self {
        Self::new(name, targets, DeclarationKind::InjectionPoint(point))
    }

    fn new(name: impl Into<String>, targets: impl IntoIterator<Item = ClassName>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            targets: targets.into_iter().collect(),
            kind,
        }
    }

    pub fn injection_point(&self) -> Option<&InjectionPoint> {
        match &self.kind {
            DeclarationKind::InjectionPoint(point) => Some(point),
            _ => None,
        }
    }
}
