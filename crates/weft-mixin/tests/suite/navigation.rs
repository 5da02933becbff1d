use std::sync::Arc;

use pretty_assertions::assert_eq;
use weft_core::{ClassName, Span};
use weft_mappings::MappingService;
use weft_classfile::opcodes::{ALOAD_0, GETFIELD, IADD, ICONST_1, PUTFIELD, RETURN};
use weft_classfile::{ClassWriter, Insn, MethodSpec};
use weft_mixin::source::{
    Expr, ExprKind, ForEach, IterableType, Literal, Receiver, SourceClass, SourceField, SourceMethod, Stmt,
};
use weft_mixin::{
    AtCode, InMemoryClassModels, InjectionPoint, MemberKey, MixinDeclaration, Mode, ResolutionOutcome,
    ResolveOptions, Resolver, SyntaxKind,
};

use super::fixtures::{
    base_class, class, load, owner_class, target_class, BASE, OWNER, PROFILER, STRING_CONSUMER, TARGET,
};

fn span(start: usize, end: usize) -> Span {
    Span::new(start, end)
}

/// Source for `Target.tick()`, matching the compiled fixture body:
///
/// ```java
/// void tick() {
///     new Owner(new Owner());
///     this.count;
///     Profiler.push("render");
///     helper();
///     for (Object item : this.items) {}
/// }
/// ```
fn target_source() -> SourceClass {
    let mut source = SourceClass::new(TARGET, span(0, 200));
    source.super_class = Some(class(BASE));
    source.fields.push(SourceField {
        name: "count".into(),
        descriptor: "I".into(),
        span: span(2, 4),
    });
    source.methods.push(SourceMethod {
        name: "tick".into(),
        descriptor: "()V".into(),
        span: span(5, 150),
        body: vec![
            Stmt::Expr(Expr::new_object(
                span(10, 40),
                MemberKey::new(OWNER, "<init>", "(Lcom/example/Owner;)V"),
                vec![Expr::new_object(span(25, 38), MemberKey::new(OWNER, "<init>", "()V"), vec![])],
            )),
            Stmt::Expr(Expr::field(span(45, 55), Receiver::This, MemberKey::new(TARGET, "count", "I"))),
            Stmt::Expr(Expr::call(
                span(60, 80),
                Receiver::Type(class(PROFILER)),
                MemberKey::new(PROFILER, "push", STRING_CONSUMER),
                vec![Expr::string(span(65, 73), "render")],
            )),
            Stmt::Expr(Expr::call(span(85, 93), Receiver::Implicit, MemberKey::new(BASE, "helper", "()V"), vec![])),
            Stmt::ForEach(ForEach {
                span: span(100, 140),
                iterable: Expr::field(
                    span(120, 130),
                    Receiver::This,
                    MemberKey::new(TARGET, "items", "Ljava/util/List;"),
                ),
                iterable_type: IterableType::Class(ClassName::new("java/util/List")),
                body: Box::new(Stmt::Block(vec![])),
            }),
        ],
    });
    source
}

fn models_with_source() -> InMemoryClassModels {
    InMemoryClassModels::new()
        .with(load(target_class()).with_source(target_source()))
        .with(load(base_class()))
        .with(load(owner_class()))
}

fn inject(code: AtCode) -> MixinDeclaration {
    MixinDeclaration::injection("onTick", [class(TARGET)], InjectionPoint::new(Some(code)).in_method("tick"))
}

#[test]
fn for_each_iterator_calls_are_found_in_source() {
    let models = models_with_source();
    let resolver = Resolver::new(&models, Arc::new(MappingService::identity()));

    let outcome = resolver
        .resolve("Ljava/util/Iterator;next()Ljava/lang/Object;", &inject(AtCode::Invoke), Mode::Exact)
        .unwrap();
    let ResolutionOutcome::Resolved { targets, navigation, .. } = outcome else {
        panic!("expected a resolution, got {outcome:?}");
    };
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].qualifier, class("java/util/Iterator"));
    assert_eq!(navigation.len(), 1);
    assert_eq!(navigation[0].kind, SyntaxKind::ForEach);
    assert_eq!(navigation[0].span, span(100, 140));
}

#[test]
fn scanner_and_navigator_agree_on_usages() {
    let models = models_with_source();
    let resolver = Resolver::new(&models, Arc::new(MappingService::identity()));

    let cases = [
        (AtCode::New, "Lcom/example/Owner;", 2),
        (AtCode::Field, "count:I", 1),
        (AtCode::Invoke, "helper", 1),
        (AtCode::Invoke, "Lcom/example/Target;helper()V", 1),
    ];
    for (code, selector, expected) in cases {
        let outcome = resolver.resolve(selector, &inject(code), Mode::Exact).unwrap();
        let ResolutionOutcome::Resolved { targets, navigation, .. } = outcome else {
            panic!("{selector}: expected a resolution, got {outcome:?}");
        };
        assert_eq!(targets.len(), expected, "{selector}");
        assert_eq!(navigation.len(), expected, "{selector}");
        for found in &navigation {
            assert!(
                targets.iter().any(|t| t.qualifier == found.qualifier
                    && t.name == found.member.name
                    && t.descriptor == found.member.descriptor),
                "{selector}: {found:?} has no compiled counterpart"
            );
        }
    }

    let strings = MixinDeclaration::injection(
        "onTick",
        [class(TARGET)],
        InjectionPoint::new(Some(AtCode::InvokeString))
            .in_method("tick")
            .arg("ldc", "render"),
    );
    let outcome = resolver.resolve("push", &strings, Mode::Exact).unwrap();
    let ResolutionOutcome::Resolved { navigation, .. } = outcome else {
        panic!("expected a resolution, got {outcome:?}");
    };
    assert_eq!(navigation.len(), 1);
    assert_eq!(navigation[0].span, span(60, 80));
}

#[test]
fn declared_members_navigate_to_their_declaration() {
    let models = models_with_source();
    let resolver = Resolver::new(&models, Arc::new(MappingService::identity()));

    let outcome = resolver
        .resolve("tick()V", &MixinDeclaration::method("onTick", [class(TARGET)]), Mode::Exact)
        .unwrap();
    let ResolutionOutcome::Resolved { navigation, .. } = outcome else {
        panic!("expected a resolution, got {outcome:?}");
    };
    assert_eq!(navigation.len(), 1);
    assert_eq!(navigation[0].kind, SyntaxKind::Declaration);
    assert_eq!(navigation[0].span, span(5, 150));

    let outcome = resolver
        .resolve("count", &MixinDeclaration::field("count", [class(TARGET)]), Mode::Exact)
        .unwrap();
    let ResolutionOutcome::Resolved { navigation, .. } = outcome else {
        panic!("expected a resolution, got {outcome:?}");
    };
    assert_eq!(navigation.iter().map(|m| m.span).collect::<Vec<_>>(), vec![span(2, 4)]);
}

#[test]
fn navigation_can_be_switched_off() {
    let models = models_with_source();
    let resolver = Resolver::new(&models, Arc::new(MappingService::identity())).with_options(ResolveOptions {
        navigate_source: false,
        ..ResolveOptions::default()
    });

    let outcome = resolver
        .resolve("helper", &inject(AtCode::Invoke), Mode::Exact)
        .unwrap();
    let ResolutionOutcome::Resolved { targets, navigation, .. } = outcome else {
        panic!("expected a resolution, got {outcome:?}");
    };
    assert_eq!(targets.len(), 1);
    assert!(navigation.is_empty());
}

#[test]
fn ordinal_narrows_navigation_to_the_chosen_allocation() {
    let models = models_with_source();
    let resolver = Resolver::new(&models, Arc::new(MappingService::identity()));
    let second = MixinDeclaration::injection(
        "onTick",
        [class(TARGET)],
        InjectionPoint::new(Some(AtCode::New)).in_method("tick").ordinal(1),
    );

    let outcome = resolver.resolve("Lcom/example/Owner;", &second, Mode::Exact).unwrap();
    let ResolutionOutcome::Resolved { targets, navigation, .. } = outcome else {
        panic!("expected a resolution, got {outcome:?}");
    };
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].descriptor, "()V");
    let spans: Vec<_> = navigation.iter().map(|m| (m.span, m.member.descriptor.as_str())).collect();
    assert_eq!(spans, vec![(span(25, 38), "()V")]);
}

const COUNTER: &str = "com/example/Counter";

/// `void bump() { this.count = this.count + 1; }`
fn counter() -> InMemoryClassModels {
    let compiled = ClassWriter::new(COUNTER).field("count", "I").method(MethodSpec::new(
        "bump",
        "()V",
        vec![
            Insn::Other(ALOAD_0),
            Insn::Other(ALOAD_0),
            Insn::field(GETFIELD, COUNTER, "count", "I"),
            Insn::Other(ICONST_1),
            Insn::Other(IADD),
            Insn::field(PUTFIELD, COUNTER, "count", "I"),
            Insn::Other(RETURN),
        ],
    ));

    let count = || MemberKey::new(COUNTER, "count", "I");
    let mut source = SourceClass::new(COUNTER, span(0, 80));
    source.methods.push(SourceMethod {
        name: "bump".into(),
        descriptor: "()V".into(),
        span: span(5, 60),
        body: vec![Stmt::Expr(Expr::new(
            span(10, 40),
            ExprKind::Assign {
                target: Box::new(Expr::field(span(10, 20), Receiver::This, count())),
                value: Box::new(Expr::new(
                    span(23, 40),
                    ExprKind::Other(vec![
                        Expr::field(span(23, 33), Receiver::This, count()),
                        Expr::new(span(36, 37), ExprKind::Literal(Literal::Other)),
                    ]),
                )),
            },
        ))],
    });

    InMemoryClassModels::new().with(load(compiled).with_source(source))
}

#[test]
fn opcode_filter_separates_reads_from_writes_in_source() {
    let models = counter();
    let resolver = Resolver::new(&models, Arc::new(MappingService::identity()));
    let access = |point: InjectionPoint| MixinDeclaration::injection("onBump", [class(COUNTER)], point);
    let spans = |point: InjectionPoint| {
        let outcome = resolver.resolve("count:I", &access(point), Mode::Exact).unwrap();
        let ResolutionOutcome::Resolved { targets, navigation, .. } = outcome else {
            panic!("expected a resolution, got {outcome:?}");
        };
        assert_eq!(targets.len(), navigation.len());
        navigation.iter().map(|m| m.span).collect::<Vec<_>>()
    };
    let field = || InjectionPoint::new(Some(AtCode::Field)).in_method("bump");

    assert_eq!(spans(field()), vec![span(23, 33), span(10, 20)]);
    assert_eq!(spans(field().opcode(PUTFIELD)), vec![span(10, 20)]);
    assert_eq!(spans(field().opcode(GETFIELD)), vec![span(23, 33)]);
    assert_eq!(spans(field().ordinal(1)), vec![span(10, 20)]);
}
