use serde::Serialize;
use weft_core::{ClassName, Span};

use crate::kind::{ReferenceKind, CONSTRUCTOR, STRING_CONSUMER};
use crate::selector::{MemberKey, MemberReference};
use crate::source::{Expr, ExprKind, ForEach, IterableType, Receiver, SourceClass, SourceMethod, Stmt};

const ITERATOR: &str = "java/util/Iterator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    Declaration,
    Call,
    New,
    FieldAccess,
    /// One of the calls an enhanced for loop compiles to.
    ForEach,
}

/// A source construct matching a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SyntaxMatch {
    pub span: Span,
    pub kind: SyntaxKind,
    /// The declaration the construct binds to.
    pub member: MemberKey,
    /// Static owner at the usage, as the compiler would record it.
    pub qualifier: ClassName,
    /// Enclosing method; `None` for declarations.
    pub method: Option<MemberKey>,
}

/// Finds the source constructs a reference designates.
///
/// Uses the same [`MemberReference::matches`] predicate as the bytecode
/// scanner, with the static qualifier of each usage as context owner.
pub struct SourceNavigator<'a> {
    kind: &'a ReferenceKind,
}

impl<'a> SourceNavigator<'a> {
    pub fn new(kind: &'a ReferenceKind) -> Self {
        Self { kind }
    }

    /// Every match in `class`: declarations for member references, usages in
    /// all method bodies otherwise.
    pub fn visit(&self, class: &SourceClass) -> Vec<SyntaxMatch> {
        if let ReferenceKind::Member(reference) = self.kind {
            return declarations(class, reference);
        }
        class
            .methods
            .iter()
            .flat_map(|method| self.visit_method(class, method))
            .collect()
    }

    /// Usages in one method, in evaluation order: receivers and arguments
    /// before the call or access consuming them, as a compiler emits them.
    pub fn visit_method(&self, class: &SourceClass, method: &SourceMethod) -> Vec<SyntaxMatch> {
        let mut walker = Walker {
            kind: self.kind,
            class,
            method: MemberKey::new(class.name.clone(), method.name.clone(), method.descriptor.clone()),
            out: Vec::new(),
        };
        for stmt in &method.body {
            walker.stmt(stmt);
        }
        walker.out
    }
}

fn declarations(class: &SourceClass, reference: &MemberReference) -> Vec<SyntaxMatch> {
    let methods = class
        .methods
        .iter()
        .map(|m| (m.span, MemberKey::new(class.name.clone(), m.name.clone(), m.descriptor.clone())));
    let fields = class
        .fields
        .iter()
        .map(|f| (f.span, MemberKey::new(class.name.clone(), f.name.clone(), f.descriptor.clone())));

    methods
        .chain(fields)
        .filter(|(_, key)| reference.matches_key(key, Some(&class.name)))
        .map(|(span, member)| SyntaxMatch {
            span,
            kind: SyntaxKind::Declaration,
            member,
            qualifier: class.name.clone(),
            method: None,
        })
        .collect()
}

struct Walker<'a> {
    kind: &'a ReferenceKind,
    class: &'a SourceClass,
    method: MemberKey,
    out: Vec<SyntaxMatch>,
}

impl Walker<'_> {
    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Local { init, .. } => {
                if let Some(init) = init {
                    self.expr(init);
                }
            }
            Stmt::ForEach(for_each) => self.for_each(for_each),
            Stmt::Block(stmts) => stmts.iter().for_each(|s| self.stmt(s)),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond);
                self.stmt(then);
                if let Some(otherwise) = otherwise {
                    self.stmt(otherwise);
                }
            }
            Stmt::While { cond, body } => {
                self.expr(cond);
                self.stmt(body);
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
        }
    }

    // `for (T x : it) body` compiles to `it.iterator()`, then `hasNext()` and
    // `next()` on the iterator.
    fn for_each(&mut self, for_each: &ForEach) {
        self.expr(&for_each.iterable);

        if let (
            ReferenceKind::Invoke(reference) | ReferenceKind::InvokeAssign(reference),
            IterableType::Class(iterable),
        ) = (self.kind, &for_each.iterable_type)
        {
            let iterator = ClassName::new(ITERATOR);
            let calls = [
                (MemberKey::new(iterable.clone(), "iterator", "()Ljava/util/Iterator;"), iterable.clone()),
                (MemberKey::new(iterator.clone(), "hasNext", "()Z"), iterator.clone()),
                (MemberKey::new(iterator.clone(), "next", "()Ljava/lang/Object;"), iterator),
            ];
            for (member, qualifier) in calls {
                if self.kind.accepts_call(&member.descriptor) && reference.matches_key(&member, Some(&qualifier)) {
                    self.push(for_each.span, SyntaxKind::ForEach, member, qualifier);
                }
            }
        }

        self.stmt(&for_each.body);
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call {
                receiver,
                method,
                args,
            } => {
                self.receiver(receiver);
                args.iter().for_each(|arg| self.expr(arg));
                if let Some(method) = method {
                    self.call(expr.span, receiver, method, args);
                }
            }
            ExprKind::New {
                class,
                constructor,
                args,
            } => {
                if let (ReferenceKind::New(reference), Some(constructor)) = (self.kind, constructor) {
                    if reference.matches(class, CONSTRUCTOR, &constructor.descriptor, Some(class)) {
                        self.push(expr.span, SyntaxKind::New, constructor.clone(), class.clone());
                    }
                }
                args.iter().for_each(|arg| self.expr(arg));
            }
            ExprKind::FieldAccess { receiver, field } => {
                self.receiver(receiver);
                self.field_access(expr.span, receiver, field.as_ref());
            }
            // Method references are values, never call sites.
            ExprKind::MethodRef { receiver, .. } => self.receiver(receiver),
            // A field store happens after its value is computed.
            ExprKind::Assign { target, value } => match &target.kind {
                ExprKind::FieldAccess { receiver, field } => {
                    self.receiver(receiver);
                    self.expr(value);
                    self.field_access(target.span, receiver, field.as_ref());
                }
                _ => {
                    self.expr(target);
                    self.expr(value);
                }
            },
            ExprKind::Other(children) => children.iter().for_each(|child| self.expr(child)),
            ExprKind::Literal(_) | ExprKind::Local(_) => {}
        }
    }

    fn field_access(&mut self, span: Span, receiver: &Receiver, field: Option<&MemberKey>) {
        if let (ReferenceKind::Field(reference), Some(field)) = (self.kind, field) {
            let qualifier = self.qualifier(receiver, &field.owner);
            if reference.matches_key(field, Some(&qualifier)) {
                self.push(span, SyntaxKind::FieldAccess, field.clone(), qualifier);
            }
        }
    }

    fn call(&mut self, span: Span, receiver: &Receiver, method: &MemberKey, args: &[Expr]) {
        let qualifier = self.qualifier(receiver, &method.owner);
        let matched = match self.kind {
            ReferenceKind::Invoke(reference) | ReferenceKind::InvokeAssign(reference) => {
                self.kind.accepts_call(&method.descriptor) && reference.matches_key(method, Some(&qualifier))
            }
            ReferenceKind::InvokeString { call, ldc } => {
                method.descriptor == STRING_CONSUMER
                    && call.matches_key(method, Some(&qualifier))
                    && args.first().and_then(Expr::as_string).is_some_and(|value| {
                        ldc.as_deref().map_or(true, |expected| expected == value)
                    })
            }
            _ => false,
        };
        if matched {
            self.push(span, SyntaxKind::Call, method.clone(), qualifier);
        }
    }

    fn receiver(&mut self, receiver: &Receiver) {
        if let Receiver::Expr { expr, .. } = receiver {
            self.expr(expr);
        }
    }

    /// The class a compiler records as owner of the access: `Object` for
    /// members declared there, otherwise the static type of the receiver.
    fn qualifier(&self, receiver: &Receiver, declared: &ClassName) -> ClassName {
        if declared.is_object() {
            return ClassName::object();
        }
        match receiver {
            Receiver::Implicit | Receiver::This => self.class.name.clone(),
            Receiver::Super => self
                .class
                .super_class
                .clone()
                .unwrap_or_else(|| declared.clone()),
            Receiver::Expr {
                static_type: Some(ty),
                ..
            } => ty.clone(),
            Receiver::Expr {
                static_type: None, ..
            } => declared.clone(),
            Receiver::Type(ty) => ty.clone(),
        }
    }

    fn push(&mut self, span: Span, kind: SyntaxKind, member: MemberKey, qualifier: ClassName) {
        self.out.push(SyntaxMatch {
            span,
            kind,
            member,
            qualifier,
            method: Some(self.method.clone()),
        });
    }
}
