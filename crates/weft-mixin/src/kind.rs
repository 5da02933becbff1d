use weft_classfile::{Descriptor, MethodDescriptor, ReturnType};
use weft_core::ClassName;

use crate::declaration::{AtCode, DeclarationKind, MixinDeclaration};
use crate::selector::{MemberReference, ParseError, WILDCARD};

pub(crate) const CONSTRUCTOR: &str = "<init>";
pub(crate) const STATIC_INITIALIZER: &str = "<clinit>";
pub(crate) const STRING_CONSUMER: &str = "(Ljava/lang/String;)V";

/// How a selector is matched, decided once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A member declared by the target class or one of its supertypes.
    Member(MemberReference),
    /// A method call inside a target method.
    Invoke(MemberReference),
    /// A call whose result is stored; calls returning `void` never match.
    InvokeAssign(MemberReference),
    /// A field read or write inside a target method.
    Field(MemberReference),
    /// An object allocation; `owner` is the allocated class and `name` is
    /// always `<init>`.
    New(MemberReference),
    /// A call taking a single string, keyed by the constant pushed right
    /// before it.
    InvokeString {
        call: MemberReference,
        ldc: Option<String>,
    },
}

impl ReferenceKind {
    /// Picks the kind for `selector` written on `declaration`.
    ///
    /// An explicit `@At` code wins; without one the selector's syntax decides.
    pub fn classify(selector: &str, declaration: &MixinDeclaration) -> Result<Self, ParseError> {
        let point = match &declaration.kind {
            DeclarationKind::Method | DeclarationKind::Field => {
                return MemberReference::parse(selector).map(ReferenceKind::Member);
            }
            DeclarationKind::InjectionPoint(point) => point,
        };

        match point.code {
            Some(AtCode::Invoke) => MemberReference::parse(selector).map(ReferenceKind::Invoke),
            Some(AtCode::InvokeAssign) => MemberReference::parse(selector).map(ReferenceKind::InvokeAssign),
            Some(AtCode::Field) => MemberReference::parse(selector).map(ReferenceKind::Field),
            Some(AtCode::New) => parse_new(selector).map(ReferenceKind::New),
            Some(AtCode::InvokeString) => Ok(ReferenceKind::InvokeString {
                call: MemberReference::parse(selector)?,
                ldc: point.ldc().map(str::to_string),
            }),
            None => classify_by_syntax(selector),
        }
    }

    /// The kind matching everything a declaration could point at, used for
    /// completion.
    pub fn wildcard_for(declaration: &MixinDeclaration) -> Self {
        let any = MemberReference::wildcard();
        let Some(point) = declaration.injection_point() else {
            return ReferenceKind::Member(any);
        };
        match point.code {
            Some(AtCode::Field) => ReferenceKind::Field(any),
            Some(AtCode::New) => ReferenceKind::New(MemberReference::new(None, CONSTRUCTOR, None)),
            Some(AtCode::InvokeString) => ReferenceKind::InvokeString {
                call: any,
                ldc: None,
            },
            Some(AtCode::InvokeAssign) => ReferenceKind::InvokeAssign(any),
            Some(AtCode::Invoke) | None => ReferenceKind::Invoke(any),
        }
    }

    pub fn reference(&self) -> &MemberReference {
        match self {
            ReferenceKind::Member(r)
            | ReferenceKind::Invoke(r)
            | ReferenceKind::InvokeAssign(r)
            | ReferenceKind::Field(r)
            | ReferenceKind::New(r) => r,
            ReferenceKind::InvokeString { call, .. } => call,
        }
    }

    /// Same kind, different reference.
    pub fn with_reference(&self, reference: MemberReference) -> Self {
        match self {
            ReferenceKind::Member(_) => ReferenceKind::Member(reference),
            ReferenceKind::Invoke(_) => ReferenceKind::Invoke(reference),
            ReferenceKind::InvokeAssign(_) => ReferenceKind::InvokeAssign(reference),
            ReferenceKind::Field(_) => ReferenceKind::Field(reference),
            ReferenceKind::New(_) => ReferenceKind::New(reference),
            ReferenceKind::InvokeString { ldc, .. } => ReferenceKind::InvokeString {
                call: reference,
                ldc: ldc.clone(),
            },
        }
    }

    /// Whether a call with `descriptor` can be a usage of this kind.
    pub(crate) fn accepts_call(&self, descriptor: &str) -> bool {
        match self {
            ReferenceKind::InvokeAssign(_) => !descriptor.ends_with(")V"),
            _ => true,
        }
    }

    /// Whether several distinct matches are an answer rather than an
    /// ambiguity.
    pub fn allows_multiple(&self) -> bool {
        let reference = self.reference();
        !matches!(self, ReferenceKind::Member(_)) || reference.match_all || reference.is_wildcard()
    }
}

fn classify_by_syntax(selector: &str) -> Result<ReferenceKind, ParseError> {
    if looks_like_constructor(selector) {
        return parse_new(selector).map(ReferenceKind::New);
    }
    let reference = MemberReference::parse(selector)?;
    if reference.is_field() {
        Ok(ReferenceKind::Field(reference))
    } else {
        Ok(ReferenceKind::Invoke(reference))
    }
}

fn looks_like_constructor(selector: &str) -> bool {
    let text = selector.trim();
    if text.contains(CONSTRUCTOR) {
        return true;
    }
    // `Lpkg/Owner;` alone, or a constructor descriptor `(I)Lpkg/Owner;`.
    (text.starts_with('L') && text.ends_with(';') && text.find(';') == Some(text.len() - 1))
        || (text.starts_with('(') && text.ends_with(';'))
}

/// Parses a constructor selector.
///
/// Accepts `Lpkg/Owner;`, `pkg/Owner`, `Lpkg/Owner;<init>(I)V` and the
/// constructor descriptor form `(I)Lpkg/Owner;`, which becomes
/// `Lpkg/Owner;<init>(I)V`.
pub fn parse_new(raw: &str) -> Result<MemberReference, ParseError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ParseError::malformed(raw, "empty selector"));
    }
    if text == WILDCARD {
        return Ok(MemberReference::new(None, CONSTRUCTOR, None));
    }

    if text.starts_with('(') {
        let descriptor = Descriptor::parse(text)
            .map_err(|err| ParseError::malformed(raw, format!("invalid descriptor: {err}")))?;
        let Descriptor::Method(method) = descriptor else {
            return Err(ParseError::malformed(raw, "expected a constructor descriptor"));
        };
        let owner = match &method.return_type {
            ReturnType::Type(ty) => ty.class_name().map(ClassName::new),
            ReturnType::Void => None,
        }
        .ok_or_else(|| ParseError::malformed(raw, "constructor descriptor must return the allocated type"))?;
        let init = MethodDescriptor {
            params: method.params,
            return_type: ReturnType::Void,
        };
        return Ok(MemberReference::new(
            Some(owner),
            CONSTRUCTOR,
            Some(Descriptor::Method(init)),
        ));
    }

    if let Some(owner) = ClassName::from_descriptor(text) {
        return Ok(MemberReference::new(Some(owner), CONSTRUCTOR, None));
    }

    if !text.contains(['(', ':', ';', '.']) {
        return Ok(MemberReference::new(Some(ClassName::new(text)), CONSTRUCTOR, None));
    }

    let reference = MemberReference::parse(raw)?;
    if reference.name != CONSTRUCTOR {
        return Err(ParseError::malformed(raw, "constructor selector must name `<init>`"));
    }
    if reference.owner.is_none() {
        return Err(ParseError::malformed(raw, "constructor selector needs an owner"));
    }
    if reference.is_field() {
        return Err(ParseError::malformed(raw, "expected a method descriptor"));
    }
    Ok(reference)
}
