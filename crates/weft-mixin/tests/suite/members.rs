use pretty_assertions::assert_eq;
use weft_classfile::opcodes::RETURN;
use weft_classfile::{ClassWriter, Insn, MethodSpec};
use weft_core::{ClassName, Severity};
use weft_mixin::diagnostics::{
    AMBIGUOUS_TARGET, INVALID_SELECTOR, NO_TARGET_CLASSES, PARTIALLY_RESOLVED_TARGET, UNRESOLVED_TARGET,
};
use weft_mixin::{FailureKind, FailureReason, InMemoryClassModels, MixinDeclaration, Mode, ResolutionOutcome};

use super::fixtures::{class, load, models, owner_class, resolver, BASE, OWNER, TARGET};

fn on_target() -> MixinDeclaration {
    MixinDeclaration::method("onTick", [class(TARGET)])
}

#[test]
fn overloads_without_descriptor_are_ambiguous() {
    let models = models();
    let outcome = resolver(&models)
        .resolve("method", &on_target(), Mode::Exact)
        .unwrap();

    let ResolutionOutcome::Unresolved(FailureReason::Ambiguous { candidates, failures }) = outcome else {
        panic!("expected an ambiguity, got {outcome:?}");
    };
    let labels: Vec<_> = candidates.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["method()V", "method(Ljava/lang/String;)V"]);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::Ambiguous);
}

#[test]
fn descriptor_disambiguates_overloads() {
    let models = models();
    let outcome = resolver(&models)
        .resolve("method(Ljava/lang/String;)V", &on_target(), Mode::Exact)
        .unwrap();

    let targets = outcome.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].declaring_class, class(TARGET));
    assert_eq!(targets[0].qualifier, class(TARGET));
    assert_eq!(targets[0].descriptor, "(Ljava/lang/String;)V");
    assert_eq!(targets[0].site, None);
}

#[test]
fn match_all_accepts_every_overload() {
    let models = models();
    let outcome = resolver(&models)
        .resolve("method*", &on_target(), Mode::Exact)
        .unwrap();
    assert_eq!(outcome.targets().len(), 2);
}

#[test]
fn inherited_members_keep_the_target_as_qualifier() {
    let models = models();
    let resolver = resolver(&models);

    let outcome = resolver.resolve("helper", &on_target(), Mode::Exact).unwrap();
    assert_eq!(outcome.targets().len(), 1);
    assert_eq!(outcome.targets()[0].declaring_class, class(BASE));
    assert_eq!(outcome.targets()[0].qualifier, class(TARGET));

    let field = MixinDeclaration::field("id", [class(TARGET)]);
    let outcome = resolver.resolve("id:I", &field, Mode::Exact).unwrap();
    assert_eq!(outcome.targets()[0].declaring_class, class(BASE));
}

#[test]
fn field_declarations_only_see_fields() {
    let models = models();
    let resolver = resolver(&models);
    let field = MixinDeclaration::field("count", [class(TARGET)]);

    let outcome = resolver.resolve("count", &field, Mode::Exact).unwrap();
    assert_eq!(outcome.targets().len(), 1);
    assert_eq!(outcome.targets()[0].descriptor, "I");

    let outcome = resolver.resolve("tick", &field, Mode::Exact).unwrap();
    assert!(!outcome.is_resolved());
}

#[test]
fn one_resolving_class_is_enough() {
    let models = models();
    let declaration = MixinDeclaration::method("onTick", [class("com/example/Missing"), class(TARGET)]);
    let outcome = resolver(&models)
        .resolve("tick()V", &declaration, Mode::Exact)
        .unwrap();

    let ResolutionOutcome::Resolved { targets, failures, .. } = outcome else {
        panic!("expected a resolution, got {outcome:?}");
    };
    assert_eq!(targets.len(), 1);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].class, class("com/example/Missing"));
    assert_eq!(failures[0].kind, FailureKind::MissingClass);

    let diagnostic = resolver(&models).check("tick()V", &declaration).unwrap();
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert_eq!(diagnostic.code, PARTIALLY_RESOLVED_TARGET);
    assert!(diagnostic.message.contains("com/example/Missing"), "{}", diagnostic.message);
}

#[test]
fn supertype_constructors_and_private_members_are_not_inherited() {
    const SUB: &str = "com/example/Sub";
    let sub = ClassWriter::new(SUB)
        .super_class(Some(OWNER))
        .method(MethodSpec::new("<init>", "(I)V", vec![Insn::Other(RETURN)]));
    let owner = owner_class()
        .method(MethodSpec::new("<clinit>", "()V", vec![Insn::Other(RETURN)]))
        .method(MethodSpec::new("secret", "()V", vec![Insn::Other(RETURN)]).private());
    let models: InMemoryClassModels = [sub, owner].into_iter().map(load).collect();
    let resolver = resolver(&models);
    let on_sub = MixinDeclaration::method("onInit", [class(SUB)]);

    let outcome = resolver.resolve("<init>()V", &on_sub, Mode::Exact).unwrap();
    assert!(!outcome.is_resolved(), "{outcome:?}");
    assert_eq!(resolver.check("<init>()V", &on_sub).unwrap().code, UNRESOLVED_TARGET);

    // Only the subclass's own constructor is a candidate.
    let outcome = resolver.resolve("<init>", &on_sub, Mode::Exact).unwrap();
    let found: Vec<_> = outcome
        .targets()
        .iter()
        .map(|t| (t.declaring_class.to_string(), t.descriptor.clone()))
        .collect();
    assert_eq!(found, vec![(SUB.to_string(), "(I)V".to_string())]);

    for selector in ["<clinit>", "secret"] {
        let outcome = resolver.resolve(selector, &on_sub, Mode::Exact).unwrap();
        assert!(!outcome.is_resolved(), "{selector}: {outcome:?}");
    }

    let on_owner = MixinDeclaration::method("onSecret", [class(OWNER)]);
    let outcome = resolver.resolve("secret", &on_owner, Mode::Exact).unwrap();
    assert_eq!(outcome.targets().len(), 1);
}

#[test]
fn missing_members_are_a_result_not_an_error() {
    let models = models();
    let resolver = resolver(&models);

    let outcome = resolver.resolve("missing", &on_target(), Mode::Exact).unwrap();
    let ResolutionOutcome::Unresolved(FailureReason::NotFound { failures, blame }) = outcome else {
        panic!("expected not found, got {outcome:?}");
    };
    assert_eq!(blame, None);
    assert_eq!(failures[0].kind, FailureKind::NoMatch);

    let diagnostic = resolver.check("missing", &on_target()).unwrap();
    assert_eq!(diagnostic.code, UNRESOLVED_TARGET);
    assert!(diagnostic.message.contains(TARGET), "{}", diagnostic.message);
}

#[test]
fn malformed_selectors_are_parse_errors() {
    let models = models();
    let resolver = resolver(&models);

    assert!(resolver.resolve("   ", &on_target(), Mode::Exact).is_err());
    assert_eq!(resolver.check("   ", &on_target()).unwrap().code, INVALID_SELECTOR);
}

#[test]
fn checks_report_each_failure_shape() {
    let models = models();
    let resolver = resolver(&models);

    assert_eq!(resolver.check("tick()V", &on_target()), None);
    assert_eq!(resolver.check("method", &on_target()).unwrap().code, AMBIGUOUS_TARGET);

    let orphan = MixinDeclaration::method("onTick", Vec::<ClassName>::new());
    assert_eq!(
        resolver.resolve("tick", &orphan, Mode::Exact).unwrap(),
        ResolutionOutcome::Unresolved(FailureReason::NoTargetClasses)
    );
    assert_eq!(resolver.check("tick", &orphan).unwrap().code, NO_TARGET_CLASSES);
}
