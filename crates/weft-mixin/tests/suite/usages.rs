use pretty_assertions::assert_eq;
use weft_classfile::opcodes::{GETFIELD, INVOKESTATIC, INVOKEVIRTUAL, NEW, PUTFIELD};
use weft_mixin::diagnostics::FILTERED_TARGET;
use weft_mixin::{
    AtCode, BytecodeScanner, ClassModelProvider, FailureKind, FailureReason, Filter, InjectionPoint, MemberReference,
    MixinDeclaration, Mode, ReferenceKind, ResolutionOutcome,
};

use super::fixtures::{class, models, resolver, BASE, OWNER, PROFILER, TARGET};

fn at(code: AtCode) -> InjectionPoint {
    InjectionPoint::new(Some(code)).in_method("tick()V")
}

fn inject(point: InjectionPoint) -> MixinDeclaration {
    MixinDeclaration::injection("onTick", [class(TARGET)], point)
}

fn not_found(outcome: ResolutionOutcome) -> (Vec<weft_mixin::ClassFailure>, Option<Filter>) {
    match outcome {
        ResolutionOutcome::Unresolved(FailureReason::NotFound { failures, blame }) => (failures, blame),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn nested_allocations_pair_with_their_own_initializers() {
    let models = models();
    let resolver = resolver(&models);
    let declaration = inject(at(AtCode::New));

    let outcome = resolver
        .resolve("Lcom/example/Owner;", &declaration, Mode::Exact)
        .unwrap();
    let sites: Vec<_> = outcome
        .targets()
        .iter()
        .map(|t| {
            let site = t.site.as_ref().unwrap();
            (site.index, site.initializer, t.descriptor.as_str())
        })
        .collect();
    assert_eq!(
        sites,
        vec![
            (0, Some(5), "(Lcom/example/Owner;)V"),
            (2, Some(4), "()V"),
        ]
    );

    let outcome = resolver
        .resolve("(Lcom/example/Owner;)Lcom/example/Owner;", &declaration, Mode::Exact)
        .unwrap();
    assert_eq!(outcome.targets().len(), 1);
    let target = &outcome.targets()[0];
    assert_eq!(target.qualifier, class(OWNER));
    assert_eq!(target.name, "<init>");
    let site = target.site.as_ref().unwrap();
    assert_eq!((site.index, site.opcode, site.initializer), (0, NEW, Some(5)));
}

#[test]
fn calls_report_the_declaring_class() {
    let models = models();
    let outcome = resolver(&models)
        .resolve("Lcom/example/Target;helper()V", &inject(at(AtCode::Invoke)), Mode::Exact)
        .unwrap();

    let targets = outcome.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].qualifier, class(TARGET));
    assert_eq!(targets[0].declaring_class, class(BASE));
    let site = targets[0].site.as_ref().unwrap();
    assert_eq!(site.opcode, INVOKEVIRTUAL);
    assert_eq!(site.method.to_string(), "Lcom/example/Target;tick()V");
}

#[test]
fn without_target_methods_every_body_is_scanned() {
    let models = models();
    let point = InjectionPoint::new(Some(AtCode::Invoke));
    let outcome = resolver(&models)
        .resolve("helper", &inject(point), Mode::Exact)
        .unwrap();
    assert_eq!(outcome.targets().len(), 1);
}

#[test]
fn opcode_filter_is_blamed_when_it_removes_everything() {
    let models = models();
    let resolver = resolver(&models);

    let reads = inject(at(AtCode::Field).opcode(GETFIELD));
    let outcome = resolver.resolve("count:I", &reads, Mode::Exact).unwrap();
    assert_eq!(outcome.targets().len(), 1);
    assert_eq!(outcome.targets()[0].site.as_ref().unwrap().opcode, GETFIELD);

    let writes = inject(at(AtCode::Field).opcode(PUTFIELD));
    let (failures, blame) = not_found(resolver.resolve("count:I", &writes, Mode::Exact).unwrap());
    assert_eq!(blame, Some(Filter::Opcode(PUTFIELD)));
    assert_eq!(failures[0].kind, FailureKind::NoMatch);
}

#[test]
fn ordinal_filter_is_blamed_and_diagnosed() {
    let models = models();
    let resolver = resolver(&models);

    let second = inject(at(AtCode::New).ordinal(1));
    let outcome = resolver.resolve("Lcom/example/Owner;", &second, Mode::Exact).unwrap();
    assert_eq!(outcome.targets().len(), 1);
    assert_eq!(outcome.targets()[0].site.as_ref().unwrap().index, 2);

    let fourth = inject(at(AtCode::New).ordinal(3));
    let (_, blame) = not_found(resolver.resolve("Lcom/example/Owner;", &fourth, Mode::Exact).unwrap());
    assert_eq!(blame, Some(Filter::Ordinal(3)));

    let diagnostic = resolver.check("Lcom/example/Owner;", &fourth).unwrap();
    assert_eq!(diagnostic.code, FILTERED_TARGET);
    assert!(diagnostic.message.contains("ordinal=3"), "{}", diagnostic.message);
}

#[test]
fn string_calls_are_keyed_by_the_pushed_constant() {
    let models = models();
    let resolver = resolver(&models);

    let render = inject(at(AtCode::InvokeString).arg("ldc", "render"));
    let outcome = resolver.resolve("push", &render, Mode::Exact).unwrap();
    assert_eq!(outcome.targets().len(), 1);
    let target = &outcome.targets()[0];
    assert_eq!(target.qualifier, class(PROFILER));
    assert_eq!(target.site.as_ref().unwrap().ldc.as_deref(), Some("render"));
    assert_eq!(target.site.as_ref().unwrap().opcode, INVOKESTATIC);

    let update = inject(at(AtCode::InvokeString).arg("ldc", "update"));
    assert!(!resolver.resolve("push", &update, Mode::Exact).unwrap().is_resolved());
}

#[test]
fn missing_target_methods_are_reported_per_class() {
    let models = models();
    let declaration = inject(InjectionPoint::new(Some(AtCode::Invoke)).in_method("missing()V"));
    let (failures, blame) = not_found(
        resolver(&models)
            .resolve("helper", &declaration, Mode::Exact)
            .unwrap(),
    );
    assert_eq!(blame, None);
    assert_eq!(failures[0].kind, FailureKind::NoTargetMethod);
}

#[test]
fn most_specific_failure_wins_across_classes() {
    let models = models();
    let point = at(AtCode::Invoke).opcode(INVOKESTATIC);
    let declaration = MixinDeclaration::injection("onTick", [class(BASE), class(TARGET)], point);

    let (failures, blame) = not_found(
        resolver(&models)
            .resolve("helper", &declaration, Mode::Exact)
            .unwrap(),
    );
    let kinds: Vec<_> = failures.iter().map(|f| (f.class.to_string(), f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (BASE.to_string(), FailureKind::NoTargetMethod),
            (TARGET.to_string(), FailureKind::NoMatch),
        ]
    );
    assert_eq!(blame, Some(Filter::Opcode(INVOKESTATIC)));
}

#[test]
fn wildcard_enumeration_yields_every_call_once() {
    let models = models();
    let target = models.class_model(&class(TARGET)).unwrap();
    let tick = target.method("tick", "()V").unwrap();
    let body = tick.body.as_ref().unwrap();

    let any_call = ReferenceKind::Invoke(MemberReference::wildcard());
    let found = BytecodeScanner::new(&any_call, Mode::Enumerate)
        .with_hierarchy(&models)
        .scan(&target.method_key(tick), body);
    let indices: Vec<_> = found.iter().map(|t| t.site.as_ref().unwrap().index).collect();
    assert_eq!(indices, vec![4, 5, 11, 13, 16, 17, 19]);

    let any_field = ReferenceKind::Field(MemberReference::wildcard());
    let found = BytecodeScanner::new(&any_field, Mode::Enumerate).scan(&target.method_key(tick), body);
    assert_eq!(found.len(), 2);
}

#[test]
fn assigned_calls_never_match_void_methods() {
    let models = models();
    let resolver = resolver(&models);
    let assign = inject(at(AtCode::InvokeAssign));

    let (failures, blame) = not_found(resolver.resolve("helper", &assign, Mode::Exact).unwrap());
    assert_eq!(blame, None);
    assert_eq!(failures[0].kind, FailureKind::NoMatch);

    let outcome = resolver.resolve("iterator", &assign, Mode::Exact).unwrap();
    let targets = outcome.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].qualifier, class("java/util/List"));
    assert_eq!(targets[0].site.as_ref().unwrap().index, 16);
}
