//! Error types for binding and symbol registration.
//!
//! ## Error Hierarchy
//!
//! ```text
//! RegistrationError - symbol table population (returned as Result)
//! BindError         - semantic problems found while binding expressions
//!                     (reported as diagnostics, never returned as Err)
//! ```
//!
//! Every [`BindError`] maps onto one [`ErrorKind`], the coarse taxonomy
//! callers filter on.

use std::fmt;

use thiserror::Error;

use crate::{MessageId, LanguageVersion, Span};

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while populating a symbol table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A type with the same identity is already registered.
    #[error("duplicate type '{name}'")]
    DuplicateType { name: String },

    /// A namespace path was malformed (empty segment).
    #[error("invalid namespace path '{path}'")]
    InvalidNamespace { path: String },

    /// A definition referenced a type that is not registered.
    #[error("'{owner}' references unknown type '{name}'")]
    UnknownType { owner: String, name: String },
}

// ============================================================================
// Error Taxonomy
// ============================================================================

/// Coarse classification of binding problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnresolvedName,
    Ambiguous,
    Inaccessible,
    StaticInstanceMismatch,
    WrongArity,
    NoApplicableOverload,
    InvalidConversion,
    InvalidContext,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::UnresolvedName => "unresolved name",
            ErrorKind::Ambiguous => "ambiguous resolution",
            ErrorKind::Inaccessible => "inaccessible member",
            ErrorKind::StaticInstanceMismatch => "static/instance mismatch",
            ErrorKind::WrongArity => "wrong arity",
            ErrorKind::NoApplicableOverload => "no applicable overload",
            ErrorKind::InvalidConversion => "invalid conversion",
            ErrorKind::InvalidContext => "invalid context",
            ErrorKind::Internal => "internal error",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

// ============================================================================
// Bind Errors
// ============================================================================

/// A semantic problem found while binding an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    // === Unresolved names ===
    #[error("at {span}: the name '{name}' does not exist in the current context")]
    UndefinedName { name: String, span: Span },

    #[error("at {span}: cannot use local variable '{name}' before it is declared")]
    UsedBeforeDeclaration { name: String, span: Span },

    #[error("at {span}: '{type_name}' does not contain a definition for '{member}'")]
    NoSuchMember {
        type_name: String,
        member: String,
        span: Span,
    },

    #[error(
        "at {span}: '{type_name}' does not contain a definition for '{member}'; are you missing a using directive for '{namespace}'?"
    )]
    NoSuchMemberNeedsUsing {
        type_name: String,
        member: String,
        namespace: String,
        span: Span,
    },

    #[error(
        "at {span}: '{type_name}' does not contain a definition for '{member}' and the best extension method requires a receiver of type '{receiver}'"
    )]
    ExtensionReceiverMismatch {
        type_name: String,
        member: String,
        receiver: String,
        span: Span,
    },

    #[error("at {span}: the type or namespace name '{member}' does not exist in the namespace '{namespace}'")]
    NoSuchNamespaceMember {
        namespace: String,
        member: String,
        span: Span,
    },

    #[error("at {span}: the alias '{alias}' was not found")]
    UndefinedAlias { alias: String, span: Span },

    // === Ambiguity ===
    #[error("at {span}: '{name}' is an ambiguous reference between '{first}' and '{second}'")]
    AmbiguousName {
        name: String,
        first: String,
        second: String,
        span: Span,
    },

    #[error("at {span}: the call is ambiguous between '{first}' and '{second}'")]
    AmbiguousCall {
        first: String,
        second: String,
        span: Span,
    },

    // === Accessibility ===
    #[error("at {span}: '{name}' is inaccessible due to its protection level")]
    Inaccessible { name: String, span: Span },

    // === Static / instance ===
    #[error("at {span}: an object reference is required for the non-static member '{member}'")]
    ObjectRequired { member: String, span: Span },

    #[error(
        "at {span}: member '{member}' cannot be accessed with an instance reference; qualify it with the type name '{type_name}' instead"
    )]
    InstanceAccessToStatic {
        member: String,
        type_name: String,
        span: Span,
    },

    // === Arity ===
    #[error("at {span}: using the generic {kind} '{name}' requires {expected} type argument(s), found {found}")]
    WrongArity {
        kind: String,
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("at {span}: the {kind} '{name}' cannot be used with type arguments")]
    TypeArgumentsNotAllowed {
        kind: String,
        name: String,
        span: Span,
    },

    #[error("at {span}: wrong number of indices inside []; expected {expected}, found {found}")]
    BadIndexCount {
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("at {span}: delegate '{name}' requires exactly one argument, found {found}")]
    DelegateArgumentCount {
        name: String,
        found: usize,
        span: Span,
    },

    // === Overload resolution ===
    #[error("at {span}: no overload for '{name}' takes {count} argument(s)")]
    BadArgumentCount {
        name: String,
        count: usize,
        span: Span,
    },

    #[error("at {span}: argument {index}: cannot convert from '{from}' to '{to}'")]
    BadArgument {
        index: usize,
        from: String,
        to: String,
        span: Span,
    },

    #[error("at {span}: argument {index} must be passed with the '{expected}' keyword")]
    BadArgumentRefKind {
        index: usize,
        expected: String,
        span: Span,
    },

    #[error("at {span}: '{callee}' does not have a parameter named '{name}'")]
    BadNamedArgument {
        callee: String,
        name: String,
        span: Span,
    },

    #[error("at {span}: named argument '{name}' specifies a parameter for which a positional argument has already been given")]
    NamedArgumentUsedTwice { name: String, span: Span },

    #[error("at {span}: no overload of '{name}' matches the supplied arguments")]
    NoApplicableOverload { name: String, span: Span },

    #[error("at {span}: operator '{op}' cannot be applied to operand of type '{operand}'")]
    BadUnaryOperator {
        op: String,
        operand: String,
        span: Span,
    },

    #[error("at {span}: operator '{op}' cannot be applied to operands of type '{left}' and '{right}'")]
    BadBinaryOperator {
        op: String,
        left: String,
        right: String,
        span: Span,
    },

    #[error("at {span}: cannot apply indexing with [] to an expression of type '{ty}'")]
    CannotIndex { ty: String, span: Span },

    // === Conversions ===
    #[error("at {span}: cannot implicitly convert type '{from}' to '{to}'")]
    NoImplicitConversion { from: String, to: String, span: Span },

    #[error("at {span}: cannot convert type '{from}' to '{to}'")]
    NoExplicitConversion { from: String, to: String, span: Span },

    #[error("at {span}: no best type found; no implicit conversion between '{first}' and '{second}'")]
    NoCommonType {
        first: String,
        second: String,
        span: Span,
    },

    #[error("at {span}: {construct} has no natural type")]
    NoNaturalType { construct: String, span: Span },

    #[error("at {span}: the default literal is not valid here because there is no target type")]
    DefaultLiteralNoTarget { span: Span },

    #[error("at {span}: no overload for '{method}' matches delegate '{delegate}'")]
    MethodGroupMismatch {
        method: String,
        delegate: String,
        span: Span,
    },

    #[error("at {span}: the 'as' operator must be used with a reference type, not '{ty}'")]
    AsRequiresReferenceType { ty: String, span: Span },

    // === Context ===
    #[error("at {span}: '{name}' is a {kind} but is used like a variable")]
    NotAValue {
        name: String,
        kind: String,
        span: Span,
    },

    #[error("at {span}: '{name}' is a {kind} but is used like a type")]
    NotAType {
        name: String,
        kind: String,
        span: Span,
    },

    #[error("at {span}: the left-hand side of an assignment must be a variable, property or indexer")]
    NotAssignable { span: Span },

    #[error("at {span}: a ref or out value must be an assignable variable")]
    RefValueExpected { span: Span },

    #[error("at {span}: property or indexer '{name}' cannot be assigned to because it is read only")]
    ReadonlyProperty { name: String, span: Span },

    #[error("at {span}: the readonly field '{name}' cannot be assigned to except in a constructor")]
    ReadonlyField { name: String, span: Span },

    #[error("at {span}: the property or indexer '{name}' cannot be used in this context because it lacks the get accessor")]
    WriteOnlyProperty { name: String, span: Span },

    #[error("at {span}: method name expected")]
    MethodNameExpected { span: Span },

    #[error("at {span}: non-invocable member '{name}' cannot be used like a method")]
    NotInvocable { name: String, span: Span },

    #[error("at {span}: cannot create an instance of '{name}': interface cannot be instantiated")]
    InterfaceCreation { name: String, span: Span },

    #[error("at {span}: cannot create an instance of the abstract type '{name}'")]
    AbstractCreation { name: String, span: Span },

    #[error("at {span}: cannot create an instance of the static class '{name}'")]
    StaticClassCreation { name: String, span: Span },

    #[error("at {span}: cannot create an instance of the type parameter '{name}' because it does not have the new() constraint")]
    NoNewConstraint { name: String, span: Span },

    #[error("at {span}: '{name}': cannot provide arguments when creating an instance of a type parameter")]
    TypeParameterCreationArguments { name: String, span: Span },

    #[error("at {span}: cannot create an instance of '{ty}'")]
    InvalidCreationTarget { ty: String, span: Span },

    #[error("at {span}: member '{name}' is initialized more than once")]
    DuplicateInitializer { name: String, span: Span },

    #[error("at {span}: object and collection initializers cannot be applied to a delegate creation expression")]
    DelegateCreationInitializer { span: Span },

    #[error("at {span}: '{name}' is not a settable field or property")]
    NotInitializable { name: String, span: Span },

    #[error("at {span}: cannot initialize members of '{name}' with a nested initializer because it is a read-only '{ty}' value")]
    ReadonlyValueTypeInitializer {
        name: String,
        ty: String,
        span: Span,
    },

    #[error("at {span}: cannot initialize type '{ty}' with a collection initializer because it does not implement 'System.Collections.IEnumerable'")]
    CollectionInitializerNotEnumerable { ty: String, span: Span },

    #[error("at {span}: keyword 'this' is not valid in a static member or field initializer")]
    ThisInStaticContext { span: Span },

    #[error("at {span}: keyword 'base' is not available in the current context")]
    BaseUnavailable { span: Span },

    #[error("at {span}: pointers and function pointers may only be used in an unsafe context")]
    UnsafeNeeded { span: Span },

    #[error("at {span}: stackalloc may not be used in this context")]
    StackAllocInvalidContext { span: Span },

    #[error("at {span}: feature '{feature}' is not available in language version {version}; use version {required} or greater")]
    FeatureUnavailable {
        feature: MessageId,
        version: LanguageVersion,
        required: LanguageVersion,
        span: Span,
    },

    #[error("at {span}: named argument specifications must appear after all fixed arguments have been specified")]
    NamedArgumentSpecificationRequired { span: Span },

    #[error("at {span}: a named argument cannot be used in {context}")]
    NamedArgumentNotAllowed { context: String, span: Span },

    #[error("at {span}: ref, out and in cannot be used in {context}")]
    RefNotAllowed { context: String, span: Span },

    #[error("at {span}: indexing an array with a negative index")]
    NegativeIndex { span: Span },

    #[error("at {span}: indexing an array with a possibly negative index")]
    PossiblyNegativeIndex { span: Span },

    #[error("at {span}: cannot index a pointer to void")]
    VoidPointerIndex { span: Span },

    #[error("at {span}: cannot select member '{member}' of type parameter '{name}'")]
    TypeParameterMemberAccess {
        name: String,
        member: String,
        span: Span,
    },

    #[error("at {span}: operator '.' cannot be applied to {what}")]
    BadMemberAccessReceiver { what: String, span: Span },

    #[error("at {span}: the nameof operand does not have a name")]
    NameOfExpected { span: Span },

    #[error("at {span}: expression expected")]
    MissingExpression { span: Span },

    // === Arrays, operators and keyword forms ===
    #[error("at {span}: cannot create an array with a negative size")]
    NegativeArraySize { span: Span },

    #[error("at {span}: an array initializer of length {expected} is expected")]
    ArrayInitializerLength { expected: u64, span: Span },

    #[error("at {span}: no best type found for implicitly-typed array")]
    NoBestArrayType { span: Span },

    #[error("at {span}: array creation must have array size or array initializer")]
    ArraySizeMissing { span: Span },

    #[error("at {span}: a nested array initializer is expected")]
    ArrayInitializerExpected { span: Span },

    #[error("at {span}: a constant value is expected")]
    ConstantExpected { span: Span },

    #[error("at {span}: cannot take the address of, get the size of, or declare a pointer to a managed type ('{ty}')")]
    ManagedType { ty: String, span: Span },

    #[error("at {span}: '{ty}' does not have a predefined size, therefore sizeof can only be used in an unsafe context")]
    SizeOfUnmanaged { ty: String, span: Span },

    #[error("at {span}: the operation overflows at compile time in checked mode")]
    ConstantOverflow { span: Span },

    #[error("at {span}: division by constant zero")]
    DivideByConstantZero { span: Span },

    #[error("at {span}: cannot take the address of the given expression")]
    AddressOfInvalid { span: Span },

    #[error("at {span}: the tuple element name '{name}' is a duplicate")]
    DuplicateTupleElementName { name: String, span: Span },

    // === Internal ===
    #[error("at {span}: internal binder error: {message}")]
    Internal { message: String, span: Span },
}

impl BindError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use BindError::*;
        match self {
            UndefinedName { .. }
            | UsedBeforeDeclaration { .. }
            | NoSuchMember { .. }
            | NoSuchMemberNeedsUsing { .. }
            | NoSuchNamespaceMember { .. }
            | UndefinedAlias { .. } => ErrorKind::UnresolvedName,

            AmbiguousName { .. } | AmbiguousCall { .. } => ErrorKind::Ambiguous,

            Inaccessible { .. } => ErrorKind::Inaccessible,

            ObjectRequired { .. } | InstanceAccessToStatic { .. } => {
                ErrorKind::StaticInstanceMismatch
            }

            WrongArity { .. }
            | TypeArgumentsNotAllowed { .. }
            | BadIndexCount { .. }
            | DelegateArgumentCount { .. } => ErrorKind::WrongArity,

            BadArgumentCount { .. }
            | BadArgument { .. }
            | BadArgumentRefKind { .. }
            | BadNamedArgument { .. }
            | NamedArgumentUsedTwice { .. }
            | NoApplicableOverload { .. }
            | ExtensionReceiverMismatch { .. }
            | BadUnaryOperator { .. }
            | BadBinaryOperator { .. }
            | CannotIndex { .. } => ErrorKind::NoApplicableOverload,

            NoImplicitConversion { .. }
            | NoExplicitConversion { .. }
            | NoCommonType { .. }
            | NoNaturalType { .. }
            | DefaultLiteralNoTarget { .. }
            | MethodGroupMismatch { .. }
            | AsRequiresReferenceType { .. }
            | NoBestArrayType { .. } => ErrorKind::InvalidConversion,

            NotAValue { .. }
            | NotAType { .. }
            | NotAssignable { .. }
            | RefValueExpected { .. }
            | ReadonlyProperty { .. }
            | ReadonlyField { .. }
            | WriteOnlyProperty { .. }
            | MethodNameExpected { .. }
            | NotInvocable { .. }
            | InterfaceCreation { .. }
            | AbstractCreation { .. }
            | StaticClassCreation { .. }
            | NoNewConstraint { .. }
            | TypeParameterCreationArguments { .. }
            | InvalidCreationTarget { .. }
            | DuplicateInitializer { .. }
            | DelegateCreationInitializer { .. }
            | NotInitializable { .. }
            | ReadonlyValueTypeInitializer { .. }
            | CollectionInitializerNotEnumerable { .. }
            | ThisInStaticContext { .. }
            | BaseUnavailable { .. }
            | UnsafeNeeded { .. }
            | StackAllocInvalidContext { .. }
            | FeatureUnavailable { .. }
            | NamedArgumentSpecificationRequired { .. }
            | NamedArgumentNotAllowed { .. }
            | RefNotAllowed { .. }
            | NegativeIndex { .. }
            | PossiblyNegativeIndex { .. }
            | VoidPointerIndex { .. }
            | TypeParameterMemberAccess { .. }
            | BadMemberAccessReceiver { .. }
            | NameOfExpected { .. }
            | MissingExpression { .. }
            | NegativeArraySize { .. }
            | ArrayInitializerLength { .. }
            | SizeOfUnmanaged { .. }
            | ConstantOverflow { .. }
            | DivideByConstantZero { .. }
            | AddressOfInvalid { .. }
            | DuplicateTupleElementName { .. }
            | ArraySizeMissing { .. }
            | ArrayInitializerExpected { .. }
            | ConstantExpected { .. }
            | ManagedType { .. } => ErrorKind::InvalidContext,

            Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            BindError::PossiblyNegativeIndex { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn span(&self) -> Span {
        use BindError::*;
        match self {
            UndefinedName { span, .. }
            | UsedBeforeDeclaration { span, .. }
            | NoSuchMember { span, .. }
            | NoSuchMemberNeedsUsing { span, .. }
            | ExtensionReceiverMismatch { span, .. }
            | NoSuchNamespaceMember { span, .. }
            | UndefinedAlias { span, .. }
            | AmbiguousName { span, .. }
            | AmbiguousCall { span, .. }
            | Inaccessible { span, .. }
            | ObjectRequired { span, .. }
            | InstanceAccessToStatic { span, .. }
            | WrongArity { span, .. }
            | TypeArgumentsNotAllowed { span, .. }
            | BadIndexCount { span, .. }
            | DelegateArgumentCount { span, .. }
            | BadArgumentCount { span, .. }
            | BadArgument { span, .. }
            | BadArgumentRefKind { span, .. }
            | BadNamedArgument { span, .. }
            | NamedArgumentUsedTwice { span, .. }
            | NoApplicableOverload { span, .. }
            | BadUnaryOperator { span, .. }
            | BadBinaryOperator { span, .. }
            | CannotIndex { span, .. }
            | NoImplicitConversion { span, .. }
            | NoExplicitConversion { span, .. }
            | NoCommonType { span, .. }
            | NoNaturalType { span, .. }
            | DefaultLiteralNoTarget { span }
            | MethodGroupMismatch { span, .. }
            | AsRequiresReferenceType { span, .. }
            | NotAValue { span, .. }
            | NotAType { span, .. }
            | NotAssignable { span }
            | RefValueExpected { span }
            | ReadonlyProperty { span, .. }
            | ReadonlyField { span, .. }
            | WriteOnlyProperty { span, .. }
            | MethodNameExpected { span }
            | NotInvocable { span, .. }
            | InterfaceCreation { span, .. }
            | AbstractCreation { span, .. }
            | StaticClassCreation { span, .. }
            | NoNewConstraint { span, .. }
            | TypeParameterCreationArguments { span, .. }
            | InvalidCreationTarget { span, .. }
            | DuplicateInitializer { span, .. }
            | DelegateCreationInitializer { span }
            | NotInitializable { span, .. }
            | ReadonlyValueTypeInitializer { span, .. }
            | CollectionInitializerNotEnumerable { span, .. }
            | ThisInStaticContext { span }
            | BaseUnavailable { span }
            | UnsafeNeeded { span }
            | StackAllocInvalidContext { span }
            | FeatureUnavailable { span, .. }
            | NamedArgumentSpecificationRequired { span }
            | NamedArgumentNotAllowed { span, .. }
            | RefNotAllowed { span, .. }
            | NegativeIndex { span }
            | PossiblyNegativeIndex { span }
            | VoidPointerIndex { span }
            | TypeParameterMemberAccess { span, .. }
            | BadMemberAccessReceiver { span, .. }
            | NameOfExpected { span }
            | MissingExpression { span }
            | NegativeArraySize { span }
            | ArrayInitializerLength { span, .. }
            | NoBestArrayType { span }
            | SizeOfUnmanaged { span, .. }
            | ConstantOverflow { span }
            | DivideByConstantZero { span }
            | AddressOfInvalid { span }
            | DuplicateTupleElementName { span, .. }
            | ArraySizeMissing { span }
            | ArrayInitializerExpected { span }
            | ConstantExpected { span }
            | ManagedType { span, .. }
            | Internal { span, .. } => *span,
        }
    }
}
