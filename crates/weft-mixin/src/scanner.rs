use serde::Serialize;
use weft_classfile::{Constant, Insn};
use weft_core::ClassName;

use crate::kind::{ReferenceKind, CONSTRUCTOR, STRING_CONSUMER};
use crate::model::{declaring_class, ClassModelProvider, MethodBody};
use crate::selector::MemberKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Only usages matching the selector.
    Exact,
    /// Every usage of the right kind, for candidate listing.
    Enumerate,
}

/// Where in a compiled method a usage was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UsageSite {
    /// The scanned method.
    pub method: MemberKey,
    /// Instruction index; for allocations this is the `NEW`.
    pub index: usize,
    /// Bytecode offset of that instruction.
    pub offset: u32,
    pub opcode: u8,
    /// Index of the paired `INVOKESPECIAL <init>` for allocations.
    pub initializer: Option<usize>,
    /// The string constant pushed right before a string-consuming call.
    pub ldc: Option<String>,
}

/// A matched member: where it is declared and what qualified it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedTarget {
    pub declaring_class: ClassName,
    pub name: String,
    pub descriptor: String,
    /// The statically applicable owner at the usage; may be a subtype of the
    /// declaring class.
    pub qualifier: ClassName,
    /// `None` for declared members.
    pub site: Option<UsageSite>,
}

impl ResolvedTarget {
    pub fn member(&self) -> MemberKey {
        MemberKey::new(self.declaring_class.clone(), self.name.clone(), self.descriptor.clone())
    }
}

/// Walks one compiled method body looking for usages of a reference.
///
/// Single forward pass; constructor pairing scans ahead from each allocation.
pub struct BytecodeScanner<'a> {
    kind: &'a ReferenceKind,
    mode: Mode,
    optimistic_strings: bool,
    hierarchy: Option<&'a dyn ClassModelProvider>,
}

impl<'a> BytecodeScanner<'a> {
    pub fn new(kind: &'a ReferenceKind, mode: Mode) -> Self {
        Self {
            kind,
            mode,
            optimistic_strings: true,
            hierarchy: None,
        }
    }

    /// Whether enumeration yields string-consuming calls whose preceding
    /// constant could not be verified.
    pub fn optimistic_strings(mut self, enabled: bool) -> Self {
        self.optimistic_strings = enabled;
        self
    }

    /// Used to report the declaring class instead of the recorded owner.
    pub fn with_hierarchy(mut self, provider: &'a dyn ClassModelProvider) -> Self {
        self.hierarchy = Some(provider);
        self
    }

    pub fn scan(&self, method: &MemberKey, body: &MethodBody) -> Vec<ResolvedTarget> {
        let instructions = &body.instructions;
        let mut out = Vec::new();
        let mut pushed_string: Option<&str> = None;

        for (index, instruction) in instructions.iter().enumerate() {
            let site = |opcode: u8| UsageSite {
                method: method.clone(),
                index,
                offset: instruction.offset,
                opcode,
                initializer: None,
                ldc: None,
            };

            match (&instruction.insn, self.kind) {
                (
                    Insn::Method {
                        opcode,
                        owner,
                        name,
                        descriptor,
                        ..
                    },
                    ReferenceKind::Invoke(reference) | ReferenceKind::InvokeAssign(reference),
                ) if self.kind.accepts_call(descriptor) => {
                    let owner = ClassName::new(owner);
                    if self.mode == Mode::Enumerate
                        || reference.matches(&owner, name, descriptor, None)
                    {
                        out.push(self.target(owner, name, descriptor, site(*opcode)));
                    }
                }
                (
                    Insn::Field {
                        opcode,
                        owner,
                        name,
                        descriptor,
                    },
                    ReferenceKind::Field(reference),
                ) => {
                    let owner = ClassName::new(owner);
                    if self.mode == Mode::Enumerate
                        || reference.matches(&owner, name, descriptor, None)
                    {
                        out.push(self.target(owner, name, descriptor, site(*opcode)));
                    }
                }
                (Insn::Type { opcode, class }, ReferenceKind::New(reference))
                    if instruction.insn.is_allocation_of(class) =>
                {
                    let paired = pair_initializer(body, index, class)
                        .map(|init| (init, &instructions[init].insn));
                    match paired {
                        Some((init, Insn::Method { descriptor, .. })) => {
                            let owner = ClassName::new(class);
                            if self.mode == Mode::Enumerate
                                || reference.matches(&owner, CONSTRUCTOR, descriptor, None)
                            {
                                let mut site = site(*opcode);
                                site.initializer = Some(init);
                                out.push(self.target(owner, CONSTRUCTOR, descriptor, site));
                            }
                        }
                        _ => tracing::debug!(
                            target = "weft.mixin",
                            method = %method,
                            index,
                            class = %class,
                            "allocation without a matching initializer; skipping"
                        ),
                    }
                }
                (
                    Insn::Method {
                        opcode,
                        owner,
                        name,
                        descriptor,
                        ..
                    },
                    ReferenceKind::InvokeString { call, ldc },
                ) if descriptor == STRING_CONSUMER => {
                    let owner = ClassName::new(owner);
                    let accepted = match self.mode {
                        Mode::Enumerate => pushed_string.is_some() || self.optimistic_strings,
                        Mode::Exact => {
                            call.matches(&owner, name, descriptor, None)
                                && pushed_string.is_some_and(|value| {
                                    ldc.as_deref().map_or(true, |expected| expected == value)
                                })
                        }
                    };
                    if accepted {
                        let mut site = site(*opcode);
                        site.ldc = pushed_string.map(str::to_string);
                        out.push(self.target(owner, name, descriptor, site));
                    }
                }
                _ => {}
            }

            pushed_string = match &instruction.insn {
                Insn::Ldc(Constant::String(value)) => Some(value.as_str()),
                _ => None,
            };
        }

        out
    }

    fn target(&self, qualifier: ClassName, name: &str, descriptor: &str, site: UsageSite) -> ResolvedTarget {
        let declaring_class = match self.hierarchy {
            Some(provider) => declaring_class(provider, &qualifier, name, descriptor),
            None => qualifier.clone(),
        };
        ResolvedTarget {
            declaring_class,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            qualifier,
            site: Some(site),
        }
    }
}

/// Finds the `INVOKESPECIAL class.<init>` balancing the `NEW class` at
/// `allocation`, skipping initializers of nested allocations of the same type.
pub fn pair_initializer(body: &MethodBody, allocation: usize, class: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, instruction) in body.instructions.iter().enumerate().skip(allocation + 1) {
        if instruction.insn.is_allocation_of(class) {
            depth += 1;
        } else if instruction.insn.is_initializer_of(class) {
            if depth == 0 {
                return Some(index);
            }
            depth -= 1;
        }
    }
    None
}
