//! Bound expression trees.
//!
//! A [`BoundExpr`] is a syntax node after binding: it knows its type, the
//! symbols it resolved to and whether anything inside it went wrong. The
//! `has_errors` flag propagates upward, so a parent built from an erroneous
//! child is erroneous too and later stages can suppress cascading reports.
//!
//! ## Untyped forms
//!
//! A few bound forms have no type until a conversion target (or the
//! natural-typing pass) gives them one:
//!
//! | Form | Becomes |
//! |------|---------|
//! | `UnboundLambda` | `Lambda` bound against a delegate |
//! | `DefaultLiteral` | `DefaultValue` of the target type |
//! | `UnconvertedConditional` / `UnconvertedSwitch` | `Conditional` / `Switch` |
//! | `TupleLiteral` with an untyped element | typed `TupleLiteral` |
//! | `UnconvertedStackAlloc` | `StackAllocArrayCreation` |
//! | `MethodGroup`, `NamespaceExpr` | intermediate, never values |
//!
//! Every other node without errors has a type.

use std::rc::Rc;

use osprey_core::{
    ConstantValue, DiagnosticBag, EventSymbol, FieldSymbol, LocalSymbol, MethodSymbol,
    NamespaceSymbol, ParameterSymbol, PropertySymbol, RangeVariableSymbol, RefKind, Span, Symbol,
    Ty,
};
use osprey_symbols::LookupResultKind;
use osprey_syntax::{BinaryOp, LambdaExpr, UnaryOp};

use crate::conversion::Conversion;

// ============================================================================
// BoundExpr
// ============================================================================

/// A bound expression.
#[derive(Debug, Clone)]
pub struct BoundExpr<'ast> {
    pub kind: BoundKind<'ast>,
    /// `None` only for the untyped forms listed in the module docs.
    pub ty: Option<Ty>,
    pub has_errors: bool,
    pub span: Span,
}

/// Which indexing member a pattern-based `Index`/`Range` access resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSymbol {
    /// `this[int]`, for an `Index` argument.
    Indexer(PropertySymbol),
    /// `Slice(int, int)`, for a `Range` argument.
    Slice(MethodSymbol),
    /// `string.Substring(int, int)`, for a `Range` over a string.
    Substring(MethodSymbol),
}

/// One arm of a switch expression.
#[derive(Debug, Clone)]
pub struct BoundArm<'ast> {
    /// `None` for the discard pattern.
    pub pattern: Option<BoundExpr<'ast>>,
    pub value: BoundExpr<'ast>,
}

#[derive(Debug, Clone)]
pub enum BoundKind<'ast> {
    // === Values ===
    Literal(ConstantValue),
    Local(Rc<LocalSymbol>),
    Parameter(Rc<ParameterSymbol>),
    RangeVariable(Rc<RangeVariableSymbol>),
    This {
        implicit: bool,
    },
    BaseReference,
    /// The object under construction inside an initializer.
    ImplicitReceiver,
    DefaultValue,
    TypeOf {
        target: Ty,
    },
    SizeOf {
        target: Ty,
    },
    InterpolatedString {
        parts: Vec<BoundExpr<'ast>>,
    },

    // === Members ===
    FieldAccess {
        receiver: Option<Box<BoundExpr<'ast>>>,
        field: FieldSymbol,
    },
    PropertyAccess {
        receiver: Option<Box<BoundExpr<'ast>>>,
        property: PropertySymbol,
    },
    EventAccess {
        receiver: Option<Box<BoundExpr<'ast>>>,
        event: EventSymbol,
    },
    MethodGroup {
        receiver: Option<Box<BoundExpr<'ast>>>,
        name: Rc<str>,
        methods: Vec<MethodSymbol>,
        type_args: Vec<Ty>,
        /// Viability of the lookup that produced the group.
        result_kind: LookupResultKind,
        /// The methods are extension methods found for `receiver`.
        extension: bool,
    },
    /// `Color Color`: a simple name that is both a value and a type of the
    /// same name. Both interpretations are kept with their diagnostics until
    /// member lookup decides.
    TypeOrValue {
        value: Box<BoundExpr<'ast>>,
        value_diagnostics: DiagnosticBag,
        type_expr: Box<BoundExpr<'ast>>,
        type_diagnostics: DiagnosticBag,
    },
    TypeExpr,
    NamespaceExpr(NamespaceSymbol),

    // === Element access ===
    ArrayAccess {
        array: Box<BoundExpr<'ast>>,
        indices: Vec<BoundExpr<'ast>>,
    },
    PointerElementAccess {
        pointer: Box<BoundExpr<'ast>>,
        index: Box<BoundExpr<'ast>>,
    },
    IndexerAccess {
        receiver: Box<BoundExpr<'ast>>,
        indexer: PropertySymbol,
        args: Vec<BoundExpr<'ast>>,
        arg_to_param: Vec<usize>,
        expanded: bool,
    },
    /// `Index`/`Range` access through a `Length`/`Count` property plus an
    /// `int` indexer or a `Slice` method.
    PatternIndexerAccess {
        receiver: Box<BoundExpr<'ast>>,
        length_or_count: PropertySymbol,
        pattern: PatternSymbol,
        argument: Box<BoundExpr<'ast>>,
    },

    // === Dynamic ===
    DynamicMemberAccess {
        receiver: Box<BoundExpr<'ast>>,
        name: Rc<str>,
        type_args: Vec<Ty>,
    },
    DynamicIndexerAccess {
        receiver: Box<BoundExpr<'ast>>,
        args: Vec<BoundExpr<'ast>>,
        names: Vec<Option<Rc<str>>>,
        ref_kinds: Vec<RefKind>,
        /// Statically applicable candidates, empty for a dynamic receiver.
        applicable: Vec<PropertySymbol>,
    },
    DynamicInvocation {
        callee: Box<BoundExpr<'ast>>,
        args: Vec<BoundExpr<'ast>>,
        names: Vec<Option<Rc<str>>>,
        ref_kinds: Vec<RefKind>,
        applicable: Vec<MethodSymbol>,
    },
    DynamicObjectCreation {
        args: Vec<BoundExpr<'ast>>,
        names: Vec<Option<Rc<str>>>,
        applicable: Vec<MethodSymbol>,
        initializer: Option<Box<BoundExpr<'ast>>>,
    },

    // === Invocation and creation ===
    Call {
        receiver: Option<Box<BoundExpr<'ast>>>,
        method: MethodSymbol,
        args: Vec<BoundExpr<'ast>>,
        arg_to_param: Vec<usize>,
        expanded: bool,
        /// The receiver was passed as the first argument of an extension
        /// method.
        invoked_as_extension: bool,
    },
    ObjectCreation {
        /// `None` for the implicit parameterless constructor of a struct.
        constructor: Option<MethodSymbol>,
        args: Vec<BoundExpr<'ast>>,
        arg_to_param: Vec<usize>,
        expanded: bool,
        initializer: Option<Box<BoundExpr<'ast>>>,
    },
    /// `new T()` for a type parameter with a `new()` or `struct` constraint.
    NewTypeParameter {
        initializer: Option<Box<BoundExpr<'ast>>>,
    },
    DelegateCreation {
        argument: Box<BoundExpr<'ast>>,
        /// The method the delegate binds to, when known statically.
        method: Option<MethodSymbol>,
        is_extension: bool,
    },
    ObjectInitializer {
        members: Vec<BoundExpr<'ast>>,
    },
    CollectionInitializer {
        adds: Vec<BoundExpr<'ast>>,
    },
    ArrayCreation {
        sizes: Vec<BoundExpr<'ast>>,
        initializer: Option<Vec<BoundExpr<'ast>>>,
    },
    StackAllocArrayCreation {
        element: Ty,
        count: Option<Box<BoundExpr<'ast>>>,
        initializer: Option<Vec<BoundExpr<'ast>>>,
    },
    UnconvertedStackAlloc {
        element: Ty,
        count: Option<Box<BoundExpr<'ast>>>,
        initializer: Option<Vec<BoundExpr<'ast>>>,
    },

    // === Operators ===
    Unary {
        op: UnaryOp,
        operand: Box<BoundExpr<'ast>>,
        method: Option<MethodSymbol>,
    },
    Binary {
        op: BinaryOp,
        left: Box<BoundExpr<'ast>>,
        right: Box<BoundExpr<'ast>>,
        method: Option<MethodSymbol>,
    },
    /// `target = value`. For `target op= value` the value is the bound
    /// `target op value` operation.
    Assignment {
        target: Box<BoundExpr<'ast>>,
        value: Box<BoundExpr<'ast>>,
        op: Option<BinaryOp>,
    },
    AddressOf {
        operand: Box<BoundExpr<'ast>>,
    },
    PointerIndirection {
        operand: Box<BoundExpr<'ast>>,
    },
    FromEndIndex {
        operand: Box<BoundExpr<'ast>>,
    },
    Range {
        start: Option<Box<BoundExpr<'ast>>>,
        end: Option<Box<BoundExpr<'ast>>>,
    },
    Conversion {
        operand: Box<BoundExpr<'ast>>,
        conversion: Conversion,
        explicit: bool,
    },
    IsType {
        operand: Box<BoundExpr<'ast>>,
        target: Ty,
    },
    AsType {
        operand: Box<BoundExpr<'ast>>,
        conversion: Conversion,
    },

    // === Conditional forms ===
    Conditional {
        condition: Box<BoundExpr<'ast>>,
        when_true: Box<BoundExpr<'ast>>,
        when_false: Box<BoundExpr<'ast>>,
    },
    UnconvertedConditional {
        condition: Box<BoundExpr<'ast>>,
        when_true: Box<BoundExpr<'ast>>,
        when_false: Box<BoundExpr<'ast>>,
        common_type: Option<Ty>,
    },
    Switch {
        governing: Box<BoundExpr<'ast>>,
        arms: Vec<BoundArm<'ast>>,
    },
    UnconvertedSwitch {
        governing: Box<BoundExpr<'ast>>,
        arms: Vec<BoundArm<'ast>>,
        common_type: Option<Ty>,
    },

    // === Tuples and lambdas ===
    TupleLiteral {
        elements: Vec<BoundExpr<'ast>>,
        names: Vec<Option<Rc<str>>>,
    },
    UnboundLambda(&'ast LambdaExpr<'ast>),
    Lambda {
        params: Vec<Rc<ParameterSymbol>>,
        body: Box<BoundExpr<'ast>>,
    },
    DefaultLiteral,

    // === Recovery ===
    BadExpression {
        result_kind: LookupResultKind,
        symbols: Vec<Symbol>,
        children: Vec<BoundExpr<'ast>>,
    },
}

// ============================================================================
// Construction
// ============================================================================

impl<'ast> BoundExpr<'ast> {
    /// A node whose error flag is the union of its children's.
    pub fn new(kind: BoundKind<'ast>, ty: Option<Ty>, span: Span) -> Self {
        let has_errors = kind.children().any(|child| child.has_errors);
        Self {
            kind,
            ty,
            has_errors,
            span,
        }
    }

    pub fn typed(kind: BoundKind<'ast>, ty: Ty, span: Span) -> Self {
        Self::new(kind, Some(ty), span)
    }

    pub fn literal(value: ConstantValue, ty: Ty, span: Span) -> Self {
        Self::typed(BoundKind::Literal(value), ty, span)
    }

    pub fn type_expr(ty: Ty, span: Span) -> Self {
        Self::typed(BoundKind::TypeExpr, ty, span)
    }

    /// Mark this node (not its children) erroneous.
    pub fn with_errors(mut self) -> Self {
        self.has_errors = true;
        self
    }

    /// Mark erroneous when `condition` holds.
    pub fn with_errors_if(mut self, condition: bool) -> Self {
        self.has_errors |= condition;
        self
    }

    pub fn ty(&self) -> Option<&Ty> {
        self.ty.as_ref()
    }

    /// The type, or `Ty::unknown()` for untyped forms.
    pub fn ty_or_error(&self) -> Ty {
        self.ty.clone().unwrap_or_else(Ty::unknown)
    }

    /// A display string for diagnostics: the type, or a description of the
    /// untyped form.
    pub fn display_type(&self) -> String {
        match &self.ty {
            Some(Ty::Null) => "<null>".to_string(),
            Some(ty) => ty.to_string(),
            None => self.kind.describe().to_string(),
        }
    }

    pub fn is_untyped(&self) -> bool {
        self.ty.is_none()
    }

    pub fn has_error_type(&self) -> bool {
        self.ty.as_ref().is_some_and(Ty::contains_error)
    }

    /// The constant this expression folds to, if any.
    pub fn constant_value(&self) -> Option<&ConstantValue> {
        match &self.kind {
            BoundKind::Literal(value) => Some(value),
            BoundKind::Local(local) => local.constant.as_ref(),
            BoundKind::FieldAccess { field, .. } => field.def.constant.as_ref(),
            BoundKind::Conversion {
                operand,
                conversion,
                ..
            } if conversion.kind.preserves_constant() => operand.constant_value(),
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, BoundKind::Literal(ConstantValue::Null))
    }

    /// Whether this is a `TypeExpr`.
    pub fn is_type(&self) -> bool {
        matches!(self.kind, BoundKind::TypeExpr)
    }

    /// The symbol a name-like node denotes, for `Color Color` detection and
    /// diagnostics.
    pub fn symbol(&self) -> Option<Symbol> {
        Some(match &self.kind {
            BoundKind::Local(local) => Symbol::Local(local.clone()),
            BoundKind::Parameter(param) => Symbol::Parameter(param.clone()),
            BoundKind::RangeVariable(range) => Symbol::RangeVariable(range.clone()),
            BoundKind::FieldAccess { field, .. } => Symbol::Field(field.clone()),
            BoundKind::PropertyAccess { property, .. } => Symbol::Property(property.clone()),
            BoundKind::EventAccess { event, .. } => Symbol::Event(event.clone()),
            BoundKind::NamespaceExpr(ns) => Symbol::Namespace(ns.clone()),
            BoundKind::TypeExpr => Symbol::NamedType(self.ty.clone()?),
            _ => return None,
        })
    }
}

impl<'ast> BoundKind<'ast> {
    /// Direct children, in source order where there is one.
    pub fn children(&self) -> Box<dyn Iterator<Item = &BoundExpr<'ast>> + '_> {
        use BoundKind::*;
        match self {
            Literal(_) | Local(_) | Parameter(_) | RangeVariable(_) | This { .. } | BaseReference
            | ImplicitReceiver | DefaultValue | TypeOf { .. } | SizeOf { .. } | TypeExpr
            | NamespaceExpr(_) | UnboundLambda(_) | DefaultLiteral => Box::new(std::iter::empty()),

            InterpolatedString { parts } => Box::new(parts.iter()),
            FieldAccess { receiver, .. }
            | PropertyAccess { receiver, .. }
            | EventAccess { receiver, .. }
            | MethodGroup { receiver, .. } => Box::new(receiver.iter().map(AsRef::as_ref)),
            TypeOrValue { value, .. } => Box::new(std::iter::once(value.as_ref())),

            ArrayAccess { array, indices } => {
                Box::new(std::iter::once(array.as_ref()).chain(indices.iter()))
            }
            PointerElementAccess { pointer, index } => {
                Box::new([pointer.as_ref(), index.as_ref()].into_iter())
            }
            IndexerAccess { receiver, args, .. }
            | DynamicIndexerAccess { receiver, args, .. } => {
                Box::new(std::iter::once(receiver.as_ref()).chain(args.iter()))
            }
            PatternIndexerAccess {
                receiver, argument, ..
            } => Box::new([receiver.as_ref(), argument.as_ref()].into_iter()),
            DynamicMemberAccess { receiver, .. } => Box::new(std::iter::once(receiver.as_ref())),
            DynamicInvocation { callee, args, .. } => {
                Box::new(std::iter::once(callee.as_ref()).chain(args.iter()))
            }
            DynamicObjectCreation {
                args, initializer, ..
            }
            | ObjectCreation {
                args, initializer, ..
            } => Box::new(args.iter().chain(initializer.iter().map(AsRef::as_ref))),
            Call { receiver, args, .. } => {
                Box::new(receiver.iter().map(AsRef::as_ref).chain(args.iter()))
            }
            NewTypeParameter { initializer } => Box::new(initializer.iter().map(AsRef::as_ref)),
            DelegateCreation { argument, .. } => Box::new(std::iter::once(argument.as_ref())),
            ObjectInitializer { members } => Box::new(members.iter()),
            CollectionInitializer { adds } => Box::new(adds.iter()),
            ArrayCreation { sizes, initializer } => {
                Box::new(sizes.iter().chain(initializer.iter().flatten()))
            }
            StackAllocArrayCreation {
                count, initializer, ..
            }
            | UnconvertedStackAlloc {
                count, initializer, ..
            } => Box::new(
                count
                    .iter()
                    .map(AsRef::as_ref)
                    .chain(initializer.iter().flatten()),
            ),

            Unary { operand, .. }
            | AddressOf { operand }
            | PointerIndirection { operand }
            | FromEndIndex { operand }
            | Conversion { operand, .. }
            | IsType { operand, .. }
            | AsType { operand, .. } => Box::new(std::iter::once(operand.as_ref())),
            Binary { left, right, .. } => Box::new([left.as_ref(), right.as_ref()].into_iter()),
            Assignment { target, value, .. } => {
                Box::new([target.as_ref(), value.as_ref()].into_iter())
            }
            Range { start, end } => Box::new(
                start
                    .iter()
                    .map(AsRef::as_ref)
                    .chain(end.iter().map(AsRef::as_ref)),
            ),

            Conditional {
                condition,
                when_true,
                when_false,
            }
            | UnconvertedConditional {
                condition,
                when_true,
                when_false,
                ..
            } => Box::new([condition.as_ref(), when_true.as_ref(), when_false.as_ref()].into_iter()),
            Switch { governing, arms } | UnconvertedSwitch { governing, arms, .. } => Box::new(
                std::iter::once(governing.as_ref()).chain(
                    arms.iter()
                        .flat_map(|arm| arm.pattern.iter().chain(std::iter::once(&arm.value))),
                ),
            ),

            TupleLiteral { elements, .. } => Box::new(elements.iter()),
            Lambda { body, .. } => Box::new(std::iter::once(body.as_ref())),
            BadExpression { children, .. } => Box::new(children.iter()),
        }
    }

    /// Short description used when an untyped form appears in a message.
    pub fn describe(&self) -> &'static str {
        match self {
            BoundKind::UnboundLambda(_) | BoundKind::Lambda { .. } => "lambda expression",
            BoundKind::DefaultLiteral => "default",
            BoundKind::MethodGroup { .. } => "method group",
            BoundKind::NamespaceExpr(_) => "namespace",
            BoundKind::TypeExpr => "type",
            BoundKind::UnconvertedConditional { .. } => "conditional expression",
            BoundKind::UnconvertedSwitch { .. } => "switch expression",
            BoundKind::TupleLiteral { .. } => "tuple literal",
            BoundKind::UnconvertedStackAlloc { .. } => "stackalloc expression",
            BoundKind::Literal(ConstantValue::Null) => "<null>",
            _ => "expression",
        }
    }

    /// Whether this kind may legitimately appear without a type.
    pub fn is_untyped_form(&self) -> bool {
        matches!(
            self,
            BoundKind::UnboundLambda(_)
                | BoundKind::DefaultLiteral
                | BoundKind::UnconvertedConditional { .. }
                | BoundKind::UnconvertedSwitch { .. }
                | BoundKind::TupleLiteral { .. }
                | BoundKind::UnconvertedStackAlloc { .. }
                | BoundKind::MethodGroup { .. }
                | BoundKind::NamespaceExpr(_)
        )
    }
}
