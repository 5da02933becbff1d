use pretty_assertions::assert_eq;
use weft_mixin::{AtCode, InjectionPoint, MixinDeclaration, ResolveOptions};

use super::fixtures::{class, models, resolver, TARGET};

fn labels(declaration: &MixinDeclaration, prefix: &str) -> Vec<String> {
    let models = models();
    resolver(&models)
        .complete(declaration, prefix)
        .unwrap()
        .into_iter()
        .map(|c| c.label)
        .collect()
}

fn at(code: AtCode) -> MixinDeclaration {
    MixinDeclaration::injection("onTick", [class(TARGET)], InjectionPoint::new(Some(code)).in_method("tick"))
}

#[test]
fn declared_members_include_inherited_ones() {
    let declaration = MixinDeclaration::method("onTick", [class(TARGET)]);
    assert_eq!(
        labels(&declaration, ""),
        vec![
            "method()V",
            "method(Ljava/lang/String;)V",
            "tick()V",
            "helper()V",
            "render()V",
        ]
    );
    assert_eq!(
        labels(&declaration, "METH"),
        vec!["method()V", "method(Ljava/lang/String;)V"]
    );

    let field = MixinDeclaration::field("count", [class(TARGET)]);
    assert_eq!(labels(&field, ""), vec!["count:I", "items:Ljava/util/List;", "id:I"]);
}

#[test]
fn usages_are_labelled_the_way_they_are_selected() {
    assert_eq!(
        labels(&at(AtCode::New), ""),
        vec!["(Lcom/example/Owner;)Lcom/example/Owner;", "()Lcom/example/Owner;"]
    );
    assert_eq!(
        labels(&at(AtCode::Field), ""),
        vec!["Lcom/example/Target;count:I", "Lcom/example/Target;items:Ljava/util/List;"]
    );
    assert_eq!(labels(&at(AtCode::InvokeString), ""), vec!["render"]);
    assert_eq!(labels(&at(AtCode::Invoke), "he"), vec!["Lcom/example/Target;helper()V"]);
    assert_eq!(labels(&at(AtCode::Invoke), "").len(), 7);
}

#[test]
fn candidates_are_capped() {
    let models = models();
    let resolver = resolver(&models).with_options(ResolveOptions {
        max_candidates: 2,
        ..ResolveOptions::default()
    });
    assert_eq!(resolver.complete(&at(AtCode::Invoke), "").unwrap().len(), 2);
}

#[test]
fn missing_target_classes_complete_to_nothing() {
    let declaration = MixinDeclaration::method("onTick", [class("com/example/Missing")]);
    assert!(labels(&declaration, "").is_empty());
}
