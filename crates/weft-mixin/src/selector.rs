//! Member selectors: parsing and the shared matching predicate.
//!
//! Accepted forms:
//!
//! ```text
//! name
//! name(Ljava/lang/String;)V
//! name:I
//! Lpkg/Owner;name(I)V
//! pkg/Owner.name(I)V
//! pkg.Owner.name:Lpkg/Type;
//! *            (any name)
//! tick*        (every `tick` member; several matches are not ambiguous)
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use weft_classfile::Descriptor;
use weft_core::ClassName;

/// Name sentinel matching any member name.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed selector `{selector}`: {reason}")]
    Malformed { selector: String, reason: String },
}

impl ParseError {
    pub(crate) fn malformed(selector: &str, reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// A concrete member: owner, name and descriptor, all in one naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberKey {
    pub owner: ClassName,
    pub name: String,
    pub descriptor: String,
}

impl MemberKey {
    pub fn new(owner: impl Into<ClassName>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn is_method(&self) -> bool {
        self.descriptor.starts_with('(')
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{};{}", self.owner, self.name)?;
        if self.is_method() {
            f.write_str(&self.descriptor)
        } else {
            write!(f, ":{}", self.descriptor)
        }
    }
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberReference {
    pub owner: Option<ClassName>,
    /// Member name, or [`WILDCARD`].
    pub name: String,
    pub descriptor: Option<Descriptor>,
    /// Several distinct matches are expected and accepted.
    pub match_all: bool,
}

impl MemberReference {
    pub fn new(owner: Option<ClassName>, name: impl Into<String>, descriptor: Option<Descriptor>) -> Self {
        Self {
            owner,
            name: name.into(),
            descriptor,
            match_all: false,
        }
    }

    pub fn wildcard() -> Self {
        Self::new(None, WILDCARD, None)
    }

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ParseError::malformed(raw, "empty selector"));
        }

        let (owner, rest) = split_owner(raw, text)?;

        let desc_start = rest.find(['(', ':']).unwrap_or(rest.len());
        let (mut name, desc_text) = rest.split_at(desc_start);

        let mut match_all = false;
        if name != WILDCARD {
            if let Some(stripped) = name.strip_suffix('*') {
                name = stripped;
                match_all = true;
            }
        }
        validate_name(raw, name)?;

        let descriptor = match desc_text.as_bytes().first() {
            None => None,
            Some(b':') => Some(parse_descriptor(raw, &desc_text[1..], false)?),
            Some(_) => Some(parse_descriptor(raw, desc_text, true)?),
        };

        Ok(Self {
            owner,
            name: name.to_string(),
            descriptor,
            match_all,
        })
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    pub fn descriptor_text(&self) -> Option<String> {
        self.descriptor.as_ref().map(ToString::to_string)
    }

    /// Whether a field descriptor was given (`name:desc`).
    pub fn is_field(&self) -> bool {
        matches!(self.descriptor, Some(Descriptor::Field(_)))
    }

    /// Whether a method descriptor was given (`name(args)ret`).
    pub fn is_method(&self) -> bool {
        matches!(self.descriptor, Some(Descriptor::Method(_)))
    }

    /// The matching predicate shared by the bytecode scanner and the source
    /// navigator.
    ///
    /// `owner` is the candidate's owner as recorded at the usage (or its
    /// declaring class); `context_owner` is the statically known qualifier,
    /// which also satisfies an explicit owner in the selector.
    pub fn matches(
        &self,
        owner: &ClassName,
        name: &str,
        descriptor: &str,
        context_owner: Option<&ClassName>,
    ) -> bool {
        if !self.is_wildcard() && self.name != name {
            return false;
        }
        if let Some(expected) = &self.owner {
            if expected != owner && context_owner != Some(expected) {
                return false;
            }
        }
        match &self.descriptor {
            Some(expected) => descriptor_eq(expected, descriptor),
            None => true,
        }
    }

    pub fn matches_key(&self, key: &MemberKey, context_owner: Option<&ClassName>) -> bool {
        self.matches(&key.owner, &key.name, &key.descriptor, context_owner)
    }
}

impl fmt::Display for MemberReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(owner) = &self.owner {
            write!(f, "L{owner};")?;
        }
        f.write_str(&self.name)?;
        if self.match_all {
            f.write_str("*")?;
        }
        match &self.descriptor {
            Some(desc @ Descriptor::Method(_)) => write!(f, "{desc}"),
            Some(desc @ Descriptor::Field(_)) => write!(f, ":{desc}"),
            None => Ok(()),
        }
    }
}

/// Exact descriptor equality; unparseable candidates never match.
fn descriptor_eq(expected: &Descriptor, candidate: &str) -> bool {
    match Descriptor::parse(candidate) {
        Ok(parsed) => &parsed == expected,
        Err(_) => false,
    }
}

fn split_owner<'a>(raw: &str, text: &'a str) -> Result<(Option<ClassName>, &'a str), ParseError> {
    if let Some(after_l) = text.strip_prefix('L') {
        if let Some(semi) = after_l.find(';') {
            let owner = &after_l[..semi];
            if !owner.contains(['(', ')', ':']) {
                if owner.is_empty() {
                    return Err(ParseError::malformed(raw, "empty owner"));
                }
                return Ok((Some(ClassName::new(owner)), &after_l[semi + 1..]));
            }
        }
    }

    let head_end = text.find(['(', ':']).unwrap_or(text.len());
    match text[..head_end].rfind('.') {
        Some(dot) => {
            let owner = &text[..dot];
            if owner.is_empty() || owner.ends_with(['.', '/']) {
                return Err(ParseError::malformed(raw, "empty owner"));
            }
            Ok((Some(ClassName::new(owner)), &text[dot + 1..]))
        }
        None => Ok((None, text)),
    }
}

fn validate_name(raw: &str, name: &str) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError::malformed(raw, "missing member name"));
    }
    if name == WILDCARD || name == "<init>" || name == "<clinit>" {
        return Ok(());
    }
    if let Some(bad) = name.chars().find(|c| matches!(c, '/' | ';' | '[' | '<' | '>' | '.' | '*' | ')' | ' ')) {
        return Err(ParseError::malformed(raw, format!("invalid character `{bad}` in member name")));
    }
    Ok(())
}

fn parse_descriptor(raw: &str, text: &str, method: bool) -> Result<Descriptor, ParseError> {
    let parsed = Descriptor::parse(text)
        .map_err(|err| ParseError::malformed(raw, format!("invalid descriptor: {err}")))?;
    if parsed.is_method() != method {
        return Err(ParseError::malformed(
            raw,
            if method {
                "expected a method descriptor"
            } else {
                "expected a field descriptor"
            },
        ));
    }
    Ok(parsed)
}
