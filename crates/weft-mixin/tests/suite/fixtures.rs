use std::sync::Arc;

use weft_classfile::opcodes::{
    ALOAD_0, DUP, GETFIELD, INVOKEINTERFACE, INVOKESPECIAL, INVOKESTATIC, INVOKEVIRTUAL, POP, RETURN,
};
use weft_classfile::{ClassFile, ClassWriter, Insn, MethodSpec};
use weft_core::ClassName;
use weft_mappings::MappingService;
use weft_mixin::{ClassModel, InMemoryClassModels, Resolver};

pub const TARGET: &str = "com/example/Target";
pub const BASE: &str = "com/example/Base";
pub const OWNER: &str = "com/example/Owner";
pub const PROFILER: &str = "com/example/Profiler";
pub const STRING_CONSUMER: &str = "(Ljava/lang/String;)V";

/// Writes `class`, reads it back and builds its model.
pub fn load(class: ClassWriter) -> ClassModel {
    let bytes = class.to_bytes().unwrap();
    ClassModel::from_classfile(ClassFile::parse(&bytes).unwrap())
}

/// Body of `Target.tick()V`:
///
/// ```text
/// 0  NEW Owner
/// 1  DUP
/// 2  NEW Owner
/// 3  DUP
/// 4  INVOKESPECIAL Owner.<init>()V
/// 5  INVOKESPECIAL Owner.<init>(LOwner;)V
/// 6  POP
/// 7  ALOAD_0
/// 8  GETFIELD Target.count:I
/// 9  POP
/// 10 LDC "render"
/// 11 INVOKESTATIC Profiler.push(Ljava/lang/String;)V
/// 12 ALOAD_0
/// 13 INVOKEVIRTUAL Target.helper()V
/// 14 ALOAD_0
/// 15 GETFIELD Target.items:Ljava/util/List;
/// 16 INVOKEINTERFACE List.iterator()
/// 17 INVOKEINTERFACE Iterator.hasNext()
/// 18 POP
/// 19 INVOKEINTERFACE Iterator.next()
/// 20 RETURN
/// ```
pub fn tick_body() -> Vec<Insn> {
    vec![
        Insn::new_object(OWNER),
        Insn::Other(DUP),
        Insn::new_object(OWNER),
        Insn::Other(DUP),
        Insn::invoke(INVOKESPECIAL, OWNER, "<init>", "()V"),
        Insn::invoke(INVOKESPECIAL, OWNER, "<init>", "(Lcom/example/Owner;)V"),
        Insn::Other(POP),
        Insn::Other(ALOAD_0),
        Insn::field(GETFIELD, TARGET, "count", "I"),
        Insn::Other(POP),
        Insn::ldc_string("render"),
        Insn::invoke(INVOKESTATIC, PROFILER, "push", STRING_CONSUMER),
        Insn::Other(ALOAD_0),
        Insn::invoke(INVOKEVIRTUAL, TARGET, "helper", "()V"),
        Insn::Other(ALOAD_0),
        Insn::field(GETFIELD, TARGET, "items", "Ljava/util/List;"),
        Insn::invoke(INVOKEINTERFACE, "java/util/List", "iterator", "()Ljava/util/Iterator;"),
        Insn::invoke(INVOKEINTERFACE, "java/util/Iterator", "hasNext", "()Z"),
        Insn::Other(POP),
        Insn::invoke(INVOKEINTERFACE, "java/util/Iterator", "next", "()Ljava/lang/Object;"),
        Insn::Other(RETURN),
    ]
}

pub fn target_class() -> ClassWriter {
    ClassWriter::new(TARGET)
        .super_class(Some(BASE))
        .field("count", "I")
        .field("items", "Ljava/util/List;")
        .method(MethodSpec::new("method", "()V", vec![Insn::Other(RETURN)]))
        .method(MethodSpec::new("method", STRING_CONSUMER, vec![Insn::Other(RETURN)]))
        .method(MethodSpec::new("tick", "()V", tick_body()))
}

pub fn base_class() -> ClassWriter {
    ClassWriter::new(BASE)
        .field("id", "I")
        .method(MethodSpec::new("helper", "()V", vec![Insn::Other(RETURN)]))
        .method(MethodSpec::abstract_method("render", "()V"))
}

pub fn owner_class() -> ClassWriter {
    ClassWriter::new(OWNER)
        .method(MethodSpec::new("<init>", "()V", vec![Insn::Other(RETURN)]))
        .method(MethodSpec::new("<init>", "(Lcom/example/Owner;)V", vec![Insn::Other(RETURN)]))
}

pub fn models() -> InMemoryClassModels {
    [target_class(), base_class(), owner_class()]
        .into_iter()
        .map(load)
        .collect()
}

pub fn resolver(models: &InMemoryClassModels) -> Resolver<'_> {
    Resolver::new(models, Arc::new(MappingService::identity()))
}

pub fn class(name: &str) -> ClassName {
    ClassName::new(name)
}
