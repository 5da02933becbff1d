use weft_classfile::Descriptor;
use weft_core::ClassName;
use weft_mappings::{Direction, MappingService, MappingTable, MappingVersion};

use crate::navigator::SyntaxMatch;
use crate::scanner::{ResolvedTarget, UsageSite};
use crate::selector::{MemberKey, MemberReference};

/// Translates selectors between the human-readable and compiled naming
/// schemes. Unmapped names pass through unchanged.
pub trait ReferenceMapping {
    fn to_compiled(&self, reference: &MemberReference, version: &MappingVersion) -> MemberReference;
    fn to_mapped(&self, reference: &MemberReference, version: &MappingVersion) -> MemberReference;
}

impl ReferenceMapping for MappingService {
    fn to_compiled(&self, reference: &MemberReference, version: &MappingVersion) -> MemberReference {
        map_reference(&self.table(version), reference, None, Direction::ToCompiled)
    }

    fn to_mapped(&self, reference: &MemberReference, version: &MappingVersion) -> MemberReference {
        map_reference(&self.table(version), reference, None, Direction::ToMapped)
    }
}

/// Maps every part of `reference`. `context_owner` stands in for a missing
/// owner when looking up the member name; it is given in the source scheme
/// of `direction` and never added to the result.
pub fn map_reference(
    table: &MappingTable,
    reference: &MemberReference,
    context_owner: Option<&ClassName>,
    direction: Direction,
) -> MemberReference {
    let lookup_owner = reference.owner.as_ref().or(context_owner).map(ClassName::as_str);
    let descriptor_text = reference.descriptor_text();

    let name = if reference.is_wildcard() || is_special(&reference.name) {
        None
    } else {
        match &reference.descriptor {
            Some(Descriptor::Method(_)) => method_name(
                table,
                lookup_owner,
                &reference.name,
                descriptor_text.as_deref(),
                direction,
            ),
            Some(Descriptor::Field(_)) => field_name(table, lookup_owner, &reference.name, direction),
            None => method_name(table, lookup_owner, &reference.name, None, direction)
                .or_else(|| field_name(table, lookup_owner, &reference.name, direction)),
        }
    };

    MemberReference {
        owner: reference
            .owner
            .as_ref()
            .map(|owner| ClassName::new(table.map_class(owner.as_str(), direction))),
        name: name.map_or_else(|| reference.name.clone(), str::to_string),
        descriptor: reference
            .descriptor
            .as_ref()
            .map(|desc| desc.map_classes(&mut |class| table.class(class, direction).map(str::to_string))),
        match_all: reference.match_all,
    }
}

/// Maps a concrete member. Methods and fields are told apart by descriptor.
pub fn map_member(table: &MappingTable, key: &MemberKey, direction: Direction) -> MemberKey {
    let name = if is_special(&key.name) {
        None
    } else if key.is_method() {
        method_name(table, Some(key.owner.as_str()), &key.name, Some(&key.descriptor), direction)
    } else {
        field_name(table, Some(key.owner.as_str()), &key.name, direction)
    };
    MemberKey {
        owner: map_class(table, &key.owner, direction),
        name: name.map_or_else(|| key.name.clone(), str::to_string),
        descriptor: table.map_descriptor(&key.descriptor, direction),
    }
}

pub fn map_class(table: &MappingTable, class: &ClassName, direction: Direction) -> ClassName {
    match table.class(class.as_str(), direction) {
        Some(mapped) => ClassName::new(mapped),
        None => class.clone(),
    }
}

pub(crate) fn map_target(table: &MappingTable, target: &ResolvedTarget, direction: Direction) -> ResolvedTarget {
    let member = map_member(table, &target.member(), direction);
    ResolvedTarget {
        declaring_class: member.owner,
        name: member.name,
        descriptor: member.descriptor,
        qualifier: map_class(table, &target.qualifier, direction),
        site: target.site.as_ref().map(|site| UsageSite {
            method: map_member(table, &site.method, direction),
            ..site.clone()
        }),
    }
}

pub(crate) fn map_syntax_match(table: &MappingTable, found: &SyntaxMatch, direction: Direction) -> SyntaxMatch {
    SyntaxMatch {
        span: found.span,
        kind: found.kind,
        member: map_member(table, &found.member, direction),
        qualifier: map_class(table, &found.qualifier, direction),
        method: found
            .method
            .as_ref()
            .map(|method| map_member(table, method, direction)),
    }
}

// Members inherited by `owner` are keyed by their declaring class, so a miss
// on the owner falls back to the unique owner-less answer.
fn method_name<'t>(
    table: &'t MappingTable,
    owner: Option<&str>,
    name: &str,
    descriptor: Option<&str>,
    direction: Direction,
) -> Option<&'t str> {
    table
        .method(owner, name, descriptor, direction)
        .or_else(|| owner.and_then(|_| table.method(None, name, descriptor, direction)))
}

fn field_name<'t>(table: &'t MappingTable, owner: Option<&str>, name: &str, direction: Direction) -> Option<&'t str> {
    table
        .field(owner, name, direction)
        .or_else(|| owner.and_then(|_| table.field(None, name, direction)))
}

fn is_special(name: &str) -> bool {
    name == "<init>" || name == "<clinit>"
}
