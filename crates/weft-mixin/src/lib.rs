//! Target-member resolution for mixin selectors.
//!
//! A selector written on a mixin declaration is parsed into a
//! [`MemberReference`], classified into a [`ReferenceKind`], translated into
//! the compiled naming scheme, and matched against the target classes: in
//! compiled method bodies by the [`BytecodeScanner`] and, when source is
//! available, in syntax trees by the [`SourceNavigator`]. The [`Resolver`]
//! ties these together and also backs completion and diagnostics.

mod completion;
mod declaration;
pub mod diagnostics;
mod kind;
mod mapping;
mod model;
mod navigator;
mod resolve;
mod scanner;
mod selector;
pub mod source;

pub use declaration::{AtCode, DeclarationKind, InjectionPoint, MixinDeclaration};
pub use kind::{parse_new, ReferenceKind};
pub use mapping::{map_class, map_member, map_reference, ReferenceMapping};
pub use model::{
    ancestors, declaring_class, ClassModel, ClassModelProvider, FieldModel, InMemoryClassModels, MethodBody,
    MethodModel,
};
pub use navigator::{SourceNavigator, SyntaxKind, SyntaxMatch};
pub use resolve::{
    most_specific, Candidate, ClassFailure, FailureKind, FailureReason, Filter, ResolutionOutcome, ResolveOptions,
    Resolver,
};
pub use scanner::{pair_initializer, BytecodeScanner, Mode, ResolvedTarget, UsageSite};
pub use selector::{MemberKey, MemberReference, ParseError, WILDCARD};
