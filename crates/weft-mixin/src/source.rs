//! Declaration-level syntax trees for target classes with source.
//!
//! Trees are produced by a front end outside this crate with every reference
//! already resolved: calls carry the method they bind to, receivers carry
//! their static type. The navigator only walks them.

use weft_core::{ClassName, Span};

use crate::selector::MemberKey;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceClass {
    pub name: ClassName,
    pub super_class: Option<ClassName>,
    pub span: Span,
    pub fields: Vec<SourceField>,
    pub methods: Vec<SourceMethod>,
}

impl SourceClass {
    pub fn new(name: impl Into<ClassName>, span: Span) -> Self {
        Self {
            name: name.into(),
            super_class: Some(ClassName::object()),
            span,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&SourceMethod> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceField {
    pub name: String,
    pub descriptor: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMethod {
    pub name: String,
    pub descriptor: String,
    pub span: Span,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Local { span: Span, init: Option<Expr> },
    ForEach(ForEach),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While { cond: Expr, body: Box<Stmt> },
    Return(Option<Expr>),
}

/// `for (T x : iterable) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForEach {
    pub span: Span,
    pub iterable: Expr,
    pub iterable_type: IterableType,
    pub body: Box<Stmt>,
}

/// Static type of a for-each iterable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterableType {
    /// An `Iterable` implementation; the loop desugars to iterator calls.
    Class(ClassName),
    /// Arrays are indexed directly and produce no calls.
    Array,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `method` is the declaration the call binds to; `None` when unresolved.
    Call {
        receiver: Receiver,
        method: Option<MemberKey>,
        args: Vec<Expr>,
    },
    New {
        class: ClassName,
        constructor: Option<MemberKey>,
        args: Vec<Expr>,
    },
    FieldAccess {
        receiver: Receiver,
        field: Option<MemberKey>,
    },
    /// `Owner::method`; a value, not a call.
    MethodRef {
        receiver: Receiver,
        method: Option<MemberKey>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Literal(Literal),
    Local(String),
    /// Anything else, with its subexpressions.
    Other(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Other,
}

/// What a member access is qualified with.
#[derive(Debug, Clone, PartialEq)]
pub enum Receiver {
    /// `foo()`
    Implicit,
    /// `this.foo()`
    This,
    /// `super.foo()`
    Super,
    /// `expr.foo()`, with the expression's static type when known.
    Expr {
        expr: Box<Expr>,
        static_type: Option<ClassName>,
    },
    /// `Type.foo()`
    Type(ClassName),
}

impl Expr {
    pub fn new(span: Span, kind: ExprKind) -> Self {
        Self { span, kind }
    }

    pub fn call(span: Span, receiver: Receiver, method: MemberKey, args: Vec<Expr>) -> Self {
        Self::new(
            span,
            ExprKind::Call {
                receiver,
                method: Some(method),
                args,
            },
        )
    }

    pub fn new_object(span: Span, constructor: MemberKey, args: Vec<Expr>) -> Self {
        Self::new(
            span,
            ExprKind::New {
                class: constructor.owner.clone(),
                constructor: Some(constructor),
                args,
            },
        )
    }

    pub fn field(span: Span, receiver: Receiver, field: MemberKey) -> Self {
        Self::new(
            span,
            ExprKind::FieldAccess {
                receiver,
                field: Some(field),
            },
        )
    }

    pub fn string(span: Span, value: impl Into<String>) -> Self {
        Self::new(span, ExprKind::Literal(Literal::String(value.into())))
    }

    pub fn local(span: Span, name: impl Into<String>) -> Self {
        Self::new(span, ExprKind::Local(name.into()))
    }

    /// The value of a string literal expression.
    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Literal(Literal::String(value)) => Some(value),
            _ => None,
        }
    }
}

impl Receiver {
    pub fn expr(expr: Expr, static_type: impl Into<ClassName>) -> Self {
        Receiver::Expr {
            expr: Box::new(expr),
            static_type: Some(static_type.into()),
        }
    }
}
