use std::sync::Arc;

use pretty_assertions::assert_eq;
use weft_classfile::opcodes::{ALOAD_0, GETFIELD, INVOKEVIRTUAL, POP, RETURN};
use weft_classfile::{ClassWriter, Insn, MethodSpec};
use weft_mappings::{MappingService, MappingTable, MappingVersion, StaticSource};
use weft_mixin::{
    AtCode, FailureKind, FailureReason, InMemoryClassModels, InjectionPoint, MixinDeclaration, Mode,
    ResolutionOutcome, Resolver,
};

use super::fixtures::{class, load, BASE, TARGET};

/// Obfuscated build of `Target extends Base`: `a` is `Target`, `b` is
/// `Base`, `a.c()V` is `tick`, `b.d()V` is `helper`, `a.e` is `count`.
fn obfuscated() -> InMemoryClassModels {
    let target = ClassWriter::new("a")
        .super_class(Some("b"))
        .field("e", "I")
        .method(MethodSpec::new(
            "c",
            "()V",
            vec![
                Insn::Other(ALOAD_0),
                Insn::invoke(INVOKEVIRTUAL, "a", "d", "()V"),
                Insn::Other(ALOAD_0),
                Insn::field(GETFIELD, "a", "e", "I"),
                Insn::Other(POP),
                Insn::Other(RETURN),
            ],
        ));
    let base = ClassWriter::new("b").method(MethodSpec::new("d", "()V", vec![Insn::Other(RETURN)]));
    [target, base].into_iter().map(load).collect()
}

fn mappings() -> Arc<MappingService> {
    let mut table = MappingTable::new("1.0");
    table.add_class("a", TARGET);
    table.add_class("b", BASE);
    table.add_method(("a", "c", "()V"), (TARGET, "tick", "()V"));
    table.add_method(("b", "d", "()V"), (BASE, "helper", "()V"));
    table.add_field(("a", "e"), (TARGET, "count"));
    Arc::new(MappingService::new(StaticSource::new().with_table(table)))
}

fn resolver(models: &InMemoryClassModels) -> Resolver<'_> {
    Resolver::new(models, mappings()).with_version(Some(MappingVersion::new("1.0")))
}

#[test]
fn readable_selectors_resolve_against_compiled_names() {
    let models = obfuscated();
    let outcome = resolver(&models)
        .resolve("tick", &MixinDeclaration::method("onTick", [class(TARGET)]), Mode::Exact)
        .unwrap();

    let targets = outcome.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].declaring_class, class(TARGET));
    assert_eq!(targets[0].qualifier, class(TARGET));
    assert_eq!(targets[0].name, "tick");
}

#[test]
fn usages_are_reported_in_readable_names() {
    let models = obfuscated();
    let resolver = resolver(&models);
    let declaration = MixinDeclaration::injection(
        "onTick",
        [class(TARGET)],
        InjectionPoint::new(Some(AtCode::Invoke)).in_method("tick()V"),
    );

    let outcome = resolver
        .resolve("Lcom/example/Target;helper()V", &declaration, Mode::Exact)
        .unwrap();
    let targets = outcome.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].declaring_class, class(BASE));
    assert_eq!(targets[0].qualifier, class(TARGET));
    assert_eq!(targets[0].name, "helper");
    assert_eq!(
        targets[0].site.as_ref().unwrap().method.to_string(),
        "Lcom/example/Target;tick()V"
    );

    let fields = MixinDeclaration::injection(
        "onTick",
        [class(TARGET)],
        InjectionPoint::new(Some(AtCode::Field)).in_method("tick"),
    );
    let outcome = resolver.resolve("count:I", &fields, Mode::Exact).unwrap();
    assert_eq!(outcome.targets().len(), 1);
    assert_eq!(outcome.targets()[0].name, "count");
}

#[test]
fn completion_lists_readable_names() {
    let models = obfuscated();
    let declaration = MixinDeclaration::method("onTick", [class(TARGET)]);

    let labels: Vec<_> = resolver(&models)
        .complete(&declaration, "")
        .unwrap()
        .into_iter()
        .map(|c| c.label)
        .collect();
    assert_eq!(labels, vec!["tick()V", "helper()V"]);
}

#[test]
fn unknown_versions_fall_back_to_identity() {
    let models = obfuscated();
    let resolver = Resolver::new(&models, mappings()).with_version(Some(MappingVersion::new("2.0")));

    let outcome = resolver
        .resolve("tick", &MixinDeclaration::method("onTick", [class(TARGET)]), Mode::Exact)
        .unwrap();
    let ResolutionOutcome::Unresolved(FailureReason::NotFound { failures, .. }) = outcome else {
        panic!("expected not found, got {outcome:?}");
    };
    assert_eq!(failures[0].kind, FailureKind::MissingClass);

    let outcome = resolver
        .resolve("c", &MixinDeclaration::method("onTick", [class("a")]), Mode::Exact)
        .unwrap();
    assert_eq!(outcome.targets()[0].name, "c");
}
