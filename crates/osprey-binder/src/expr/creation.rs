//! Object creation: `new T(args) { initializer }`.
//!
//! The target type decides how the creation binds:
//!
//! | Target | Binding |
//! |--------|---------|
//! | class, struct, enum | constructor overload resolution |
//! | delegate | a lambda, method group, `dynamic` value or delegate value |
//! | interface | the linked coclass, converted back to the interface |
//! | type parameter | `NewTypeParameter`, given a `new()` or `struct` constraint |
//! | abstract, static, array, pointer, function pointer, `dynamic` | error |
//!
//! ## Constructor accessibility
//!
//! When some constructors are not accessible, resolution first runs over
//! the accessible ones. Only if that fails does it run over all of them; a
//! winner from the second pass is reported as inaccessible rather than as
//! an overload failure.
//!
//! An initializer is bound against the object under construction whatever
//! happens to the constructor, and stays attached to the resulting node.

use osprey_core::{
    BindError, DiagnosticBag, MethodSymbol, RefKind, Span, Symbol, Ty, TypeDef, TypeKind, TypeParamTy,
};
use osprey_symbols::LookupResultKind;
use osprey_syntax::{Initializer, NewExpr};
use tracing::{debug, instrument, trace};

use super::arguments::{AnalyzedArguments, bind_arguments};
use super::convert::{ExpressionConverter, convert_implicit, method_group_conversion, same_invoke_signature};
use super::initializers::bind_initializer;
use super::invocation::{coerce_arguments, describe_signature, report_overload_failure};
use super::recovery::{make_bad, natural_type};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};
use crate::conversion::{Conversion, ConversionKind};
use crate::overload::{CandidateSignature, MemberResolutionResult, OverloadResolutionResult};
use crate::type_binding::bind_type;

/// Bind `new T(args) { ... }`.
#[instrument(level = "trace", skip_all, fields(args = new.args.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_object_creation<'ast>(
    binder: &Binder<'_>,
    new: &'ast NewExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let ty = bind_type(binder, &new.ty, diagnostics);
    let delegate = binder.symbols().is_delegate_type(&ty);
    let args = bind_arguments(binder, new.args, delegate, diagnostics);
    bind_creation(binder, &ty, args, new.initializer, new.span, diagnostics)
}

/// Bind the creation of `ty` from already analyzed arguments.
pub(crate) fn bind_creation<'ast>(
    binder: &Binder<'_>,
    ty: &Ty,
    args: AnalyzedArguments<'ast>,
    initializer: Option<Initializer<'ast>>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    trace!(%ty, "binding creation");
    let target = Target {
        ty: ty.clone(),
        span,
    };

    match ty {
        Ty::Error(_) => {
            let initializer = initializer.map(|init| bind_initializer(binder, init, ty, diagnostics));
            target.bad(binder, LookupResultKind::NotCreatable, Vec::new(), args, initializer)
        }
        Ty::TypeParam(param) => bind_type_parameter_creation(binder, &target, param, args, initializer, diagnostics),
        Ty::Dynamic | Ty::Array(_) | Ty::Pointer(_) | Ty::FunctionPointer(_) | Ty::Tuple(_) | Ty::Null => {
            target.invalid(binder, args, initializer, diagnostics)
        }
        Ty::Special(_) | Ty::Named(_) => {
            let Some(def) = binder.symbols().def_of(ty).cloned() else {
                return target.invalid(binder, args, initializer, diagnostics);
            };
            match def.kind {
                TypeKind::Delegate => bind_delegate_creation(binder, &target, args, initializer, diagnostics),
                TypeKind::Interface => bind_interface_creation(binder, &target, &def, args, initializer, diagnostics),
                TypeKind::Class | TypeKind::Struct | TypeKind::Enum => {
                    bind_class_creation(binder, &target, &def, args, initializer, diagnostics)
                }
            }
        }
    }
}

/// The type being created, for building results and reporting.
struct Target {
    ty: Ty,
    span: Span,
}

impl Target {
    fn name(&self) -> String {
        self.ty.to_string()
    }

    fn symbol(&self) -> Vec<Symbol> {
        match &self.ty {
            Ty::Error(_) => Vec::new(),
            Ty::TypeParam(_) => vec![Symbol::TypeParameter(self.ty.clone())],
            ty => vec![Symbol::NamedType(ty.clone())],
        }
    }

    /// A bad creation keeping the arguments and the initializer as children.
    fn bad<'ast>(
        &self,
        binder: &Binder<'_>,
        result_kind: LookupResultKind,
        symbols: Vec<Symbol>,
        args: AnalyzedArguments<'ast>,
        initializer: Option<BoundExpr<'ast>>,
    ) -> BoundExpr<'ast> {
        let children = args.args.into_iter().chain(initializer).collect();
        make_bad(binder, self.span, result_kind, symbols, children)
    }

    /// Arrays, pointers, function pointers and `dynamic` are never created
    /// with `new T()`.
    fn invalid<'ast>(
        &self,
        binder: &Binder<'_>,
        args: AnalyzedArguments<'ast>,
        initializer: Option<Initializer<'ast>>,
        diagnostics: &mut DiagnosticBag,
    ) -> BoundExpr<'ast> {
        diagnostics.add(BindError::InvalidCreationTarget {
            ty: self.name(),
            span: self.span,
        });
        self.rejected(binder, args, initializer, diagnostics)
    }

    /// The bad node for a target that cannot be created; the initializer is
    /// still bound against it.
    fn rejected<'ast>(
        &self,
        binder: &Binder<'_>,
        args: AnalyzedArguments<'ast>,
        initializer: Option<Initializer<'ast>>,
        diagnostics: &mut DiagnosticBag,
    ) -> BoundExpr<'ast> {
        let initializer = initializer.map(|init| bind_initializer(binder, init, &self.ty, diagnostics));
        self.bad(binder, LookupResultKind::NotCreatable, self.symbol(), args, initializer)
    }
}

// ============================================================================
// Classes and structs
// ============================================================================

fn bind_class_creation<'ast>(
    binder: &Binder<'_>,
    target: &Target,
    def: &TypeDef,
    args: AnalyzedArguments<'ast>,
    initializer: Option<Initializer<'ast>>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = target.span;
    if def.is_static {
        diagnostics.add(BindError::StaticClassCreation {
            name: target.name(),
            span,
        });
        return target.rejected(binder, args, initializer, diagnostics);
    }
    if def.is_abstract {
        diagnostics.add(BindError::AbstractCreation {
            name: target.name(),
            span,
        });
        return target.rejected(binder, args, initializer, diagnostics);
    }

    let ty = &target.ty;
    let symbols = binder.symbols();
    let constructors = binder.lookup().constructors(ty);

    // Structs always have a parameterless constructor; classes get one when
    // they declare none.
    let implicit_default = args.is_empty()
        && !constructors.iter().any(|ctor| ctor.params.is_empty())
        && (symbols.is_value_type(ty) || constructors.is_empty());
    if implicit_default {
        let initializer = initializer.map(|init| bind_initializer(binder, init, ty, diagnostics));
        return creation(None, Vec::new(), Vec::new(), false, initializer, ty, span);
    }
    if constructors.is_empty() {
        diagnostics.add(BindError::BadArgumentCount {
            name: target.name(),
            count: args.len(),
            span,
        });
        let initializer = initializer.map(|init| bind_initializer(binder, init, ty, diagnostics));
        return target.bad(binder, LookupResultKind::OverloadResolutionFailure, target.symbol(), args, initializer);
    }

    let within = binder.within();
    let accessible: Vec<MethodSymbol> = constructors
        .iter()
        .filter(|ctor| symbols.is_accessible(ctor.def.accessibility, ctor.def.owner, within))
        .cloned()
        .collect();

    if args.has_dynamic() {
        let (_, resolution) = resolve_constructors(binder, &accessible, &args);
        let applicable: Vec<MethodSymbol> = resolution
            .applicable()
            .map(|result| accessible[result.candidate].clone())
            .collect();
        if !applicable.is_empty() {
            trace!(applicable = applicable.len(), "creation deferred to runtime");
            let initializer = initializer.map(|init| bind_initializer(binder, init, ty, diagnostics));
            return dynamic_creation(binder, args, applicable, initializer, ty, span, diagnostics);
        }
    }

    let (signatures, resolution) = resolve_constructors(binder, &accessible, &args);
    if let Some(best) = resolution.best_result() {
        let ctor = accessible[best.candidate].clone();
        return finish_creation(binder, ctor, best, args, initializer, ty, span, diagnostics);
    }

    let failure = if accessible.len() < constructors.len() {
        let (all_signatures, all_resolution) = resolve_constructors(binder, &constructors, &args);
        if let Some(best) = all_resolution.best_result() {
            let ctor = constructors[best.candidate].clone();
            debug!(ctor = %ctor.container, "best constructor is inaccessible");
            diagnostics.add(BindError::Inaccessible {
                name: describe_signature(&all_signatures[best.candidate]),
                span,
            });
            let initializer = initializer.map(|init| bind_initializer(binder, init, ty, diagnostics));
            return target.bad(
                binder,
                LookupResultKind::Inaccessible,
                vec![Symbol::Method(ctor)],
                args,
                initializer,
            );
        }
        (all_signatures, all_resolution, &constructors)
    } else {
        (signatures, resolution, &accessible)
    };

    let (signatures, resolution, candidates) = failure;
    report_overload_failure(&target.name(), &signatures, &resolution, &args, 0, span, diagnostics);
    let symbols = candidates.iter().cloned().map(Symbol::Method).collect();
    let initializer = initializer.map(|init| bind_initializer(binder, init, ty, diagnostics));
    target.bad(binder, LookupResultKind::OverloadResolutionFailure, symbols, args, initializer)
}

fn resolve_constructors(
    binder: &Binder<'_>,
    constructors: &[MethodSymbol],
    args: &AnalyzedArguments<'_>,
) -> (Vec<CandidateSignature>, OverloadResolutionResult) {
    let signatures: Vec<CandidateSignature> = constructors.iter().map(CandidateSignature::from_constructor).collect();
    let converter = ExpressionConverter {
        binder,
        args: args.args.iter().collect(),
    };
    let resolution = binder.overloads().resolve(&signatures, &args.infos(), &converter);
    (signatures, resolution)
}

#[allow(clippy::too_many_arguments)]
fn finish_creation<'ast>(
    binder: &Binder<'_>,
    ctor: MethodSymbol,
    best: &MemberResolutionResult,
    args: AnalyzedArguments<'ast>,
    initializer: Option<Initializer<'ast>>,
    ty: &Ty,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    trace!(params = ctor.params.len(), expanded = best.is_expanded, "constructor resolved");
    let (args, arg_to_param) = coerce_arguments(binder, &ctor.params, best, args, span, diagnostics);
    let initializer = initializer.map(|init| bind_initializer(binder, init, ty, diagnostics));
    creation(Some(ctor), args, arg_to_param, best.is_expanded, initializer, ty, span)
}

fn creation<'ast>(
    constructor: Option<MethodSymbol>,
    args: Vec<BoundExpr<'ast>>,
    arg_to_param: Vec<usize>,
    expanded: bool,
    initializer: Option<BoundExpr<'ast>>,
    ty: &Ty,
    span: Span,
) -> BoundExpr<'ast> {
    BoundExpr::typed(
        BoundKind::ObjectCreation {
            constructor,
            args,
            arg_to_param,
            expanded,
            initializer: initializer.map(Box::new),
        },
        ty.clone(),
        span,
    )
}

fn dynamic_creation<'ast>(
    binder: &Binder<'_>,
    args: AnalyzedArguments<'ast>,
    applicable: Vec<MethodSymbol>,
    initializer: Option<BoundExpr<'ast>>,
    ty: &Ty,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let names = args.names();
    let args = args
        .args
        .into_iter()
        .map(|arg| natural_type(binder, arg, diagnostics))
        .collect();
    BoundExpr::typed(
        BoundKind::DynamicObjectCreation {
            args,
            names,
            applicable,
            initializer: initializer.map(Box::new),
        },
        ty.clone(),
        span,
    )
}

// ============================================================================
// Interfaces
// ============================================================================

/// `new I()` creates the interface's coclass, seen as `I`.
fn bind_interface_creation<'ast>(
    binder: &Binder<'_>,
    target: &Target,
    def: &TypeDef,
    args: AnalyzedArguments<'ast>,
    initializer: Option<Initializer<'ast>>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let coclass = def.coclass.and_then(|hash| binder.symbols().get(hash)).cloned();
    let Some(coclass) = coclass else {
        debug!(interface = %target.ty, "interface has no coclass");
        diagnostics.add(BindError::InterfaceCreation {
            name: target.name(),
            span: target.span,
        });
        return target.rejected(binder, args, initializer, diagnostics);
    };

    let class_target = Target {
        ty: coclass.self_type(),
        span: target.span,
    };
    trace!(coclass = %class_target.ty, "creating through coclass");
    let created = bind_class_creation(binder, &class_target, &coclass, args, initializer, diagnostics);
    if created.has_error_type() {
        return created;
    }
    // The coclass need not implement the interface; the coercion is unchecked.
    let (had_errors, span) = (created.has_errors, created.span);
    BoundExpr::typed(
        BoundKind::Conversion {
            operand: Box::new(created),
            conversion: Conversion::explicit(ConversionKind::ExplicitReference),
            explicit: true,
        },
        target.ty.clone(),
        span,
    )
    .with_errors_if(had_errors)
}

// ============================================================================
// Type parameters
// ============================================================================

fn bind_type_parameter_creation<'ast>(
    binder: &Binder<'_>,
    target: &Target,
    param: &TypeParamTy,
    args: AnalyzedArguments<'ast>,
    initializer: Option<Initializer<'ast>>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let creatable = binder
        .type_param_def(param.hash)
        .is_some_and(|def| def.has_constructor_constraint || def.has_value_type_constraint);
    let name = param.name.to_string();
    if !creatable {
        diagnostics.add(BindError::NoNewConstraint { name, span: target.span });
        return target.rejected(binder, args, initializer, diagnostics);
    }
    if !args.is_empty() {
        diagnostics.add(BindError::TypeParameterCreationArguments { name, span: target.span });
        return target.rejected(binder, args, initializer, diagnostics);
    }

    let initializer = initializer.map(|init| bind_initializer(binder, init, &target.ty, diagnostics));
    BoundExpr::typed(
        BoundKind::NewTypeParameter {
            initializer: initializer.map(Box::new),
        },
        target.ty.clone(),
        target.span,
    )
}

// ============================================================================
// Delegates
// ============================================================================

/// `new D(x)`, where `x` is tried in order as a lambda, a method group, a
/// `dynamic` value and a value of a delegate type.
fn bind_delegate_creation<'ast>(
    binder: &Binder<'_>,
    target: &Target,
    mut args: AnalyzedArguments<'ast>,
    initializer: Option<Initializer<'ast>>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = target.span;
    let has_initializer = initializer.is_some();
    if has_initializer {
        diagnostics.add(BindError::DelegateCreationInitializer { span });
    }
    if args.len() != 1 {
        diagnostics.add(BindError::DelegateArgumentCount {
            name: target.name(),
            found: args.len(),
            span,
        });
        return target.bad(binder, LookupResultKind::OverloadResolutionFailure, target.symbol(), args, None);
    }
    let Some(argument) = args.args.pop() else {
        return target.bad(binder, LookupResultKind::OverloadResolutionFailure, target.symbol(), args, None);
    };

    let ty = &target.ty;
    let delegate = |argument: BoundExpr<'ast>, method: Option<MethodSymbol>, is_extension: bool| {
        BoundExpr::typed(
            BoundKind::DelegateCreation {
                argument: Box::new(argument),
                method,
                is_extension,
            },
            ty.clone(),
            span,
        )
        .with_errors_if(has_initializer)
    };

    match &argument.kind {
        BoundKind::UnboundLambda(_) => {
            let lambda = convert_implicit(binder, argument, ty, diagnostics);
            delegate(lambda, None, false)
        }
        BoundKind::MethodGroup { name, extension, .. } => {
            let is_extension = *extension;
            match method_group_conversion(binder, &argument, ty) {
                Some(method) => {
                    trace!(method = method.name(), "delegate bound to method");
                    delegate(argument, Some(method), is_extension)
                }
                None => {
                    if !argument.has_errors {
                        diagnostics.add(BindError::MethodGroupMismatch {
                            method: name.to_string(),
                            delegate: target.name(),
                            span: argument.span,
                        });
                    }
                    delegate(argument, None, is_extension).with_errors()
                }
            }
        }
        _ => {
            let argument_ty = argument.ty_or_error();
            if argument_ty.is_dynamic() {
                return delegate(argument, None, false);
            }
            let symbols = binder.symbols();
            if let Some(source) = symbols.delegate_invoke(&argument_ty) {
                let matches = symbols
                    .delegate_invoke(ty)
                    .is_some_and(|invoke| same_invoke_signature(&source, &invoke));
                if !matches {
                    diagnostics.add(BindError::MethodGroupMismatch {
                        method: format!("{argument_ty}.Invoke"),
                        delegate: target.name(),
                        span: argument.span,
                    });
                }
                return delegate(argument, Some(source), false).with_errors_if(!matches);
            }
            if !argument.has_errors && !argument_ty.contains_error() {
                diagnostics.add(BindError::MethodNameExpected { span: argument.span });
            }
            let args = single(argument);
            target.bad(binder, LookupResultKind::NotInvocable, target.symbol(), args, None)
        }
    }
}

fn single(argument: BoundExpr<'_>) -> AnalyzedArguments<'_> {
    let mut args = AnalyzedArguments::new();
    args.push(argument, None, RefKind::None);
    args
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use osprey_core::{ErrorKind, SpecialType};
    use osprey_syntax::{AstBuilder, BinaryOp, Expr};

    use super::*;
    use crate::binder::BinderFlags;
    use crate::expr::test_support::{Context, Fixture};

    fn bind<'ast>(fx: &Fixture, ctx: &Context, expr: Expr<'ast>) -> (BoundExpr<'ast>, DiagnosticBag) {
        let Expr::New(new) = expr else {
            panic!("expected an object creation, got {expr:?}");
        };
        fx.bind(ctx, |binder| {
            let mut diagnostics = DiagnosticBag::new();
            let bound = bind_object_creation(binder, new, &mut diagnostics);
            (bound, diagnostics)
        })
    }

    fn constructor_params(bound: &BoundExpr<'_>) -> Vec<Ty> {
        let BoundKind::ObjectCreation {
            constructor: Some(ctor),
            ..
        } = &bound.kind
        else {
            panic!("expected a constructor call, got {:?}", bound.kind);
        };
        ctor.params.iter().map(|p| p.ty.clone()).collect()
    }

    #[test]
    fn constructor_overloads() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Item"), &[], None));
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(fx.ty("Shop.Item")));
        assert!(constructor_params(&bound).is_empty());

        let args = [b.arg(b.string("pen"))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Item"), &args, None));
        assert!(diagnostics.is_empty());
        assert_eq!(constructor_params(&bound), vec![Ty::STRING]);
    }

    #[test]
    fn implicit_parameterless_constructors() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        // A struct, even with other constructors declared.
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Money"), &[], None));
        assert!(diagnostics.is_empty());
        assert!(matches!(bound.kind, BoundKind::ObjectCreation { constructor: None, .. }));

        // A class declaring no constructors.
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Program"), &[], None));
        assert!(diagnostics.is_empty());
        assert!(matches!(bound.kind, BoundKind::ObjectCreation { constructor: None, .. }));

        let args = [b.arg(b.int(1))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Program"), &args, None));
        assert!(bound.has_errors);
        assert!(matches!(diagnostics.into_vec()[0].error, BindError::BadArgumentCount { count: 1, .. }));
    }

    #[test]
    fn generic_class_constructor_is_substituted() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ty = b.ty_generic("Box", &[b.ty(SpecialType::Int32)]);
        let args = [b.arg(b.int(4))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(ty, &args, None));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(constructor_params(&bound), vec![Ty::INT]);
    }

    #[test]
    fn inaccessible_best_constructor_is_reported_as_inaccessible() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let args = [b.arg(b.int(7))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Secretive"), &args, None));
        assert!(bound.has_errors);
        let diagnostics = diagnostics.into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].error.kind(), ErrorKind::Inaccessible);
        assert!(matches!(
            bound.kind,
            BoundKind::BadExpression {
                result_kind: LookupResultKind::Inaccessible,
                ..
            }
        ));
    }

    #[test]
    fn private_constructor_is_usable_inside_its_type() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let args = [b.arg(b.int(7))];
        let ctx = fx.context().in_type("Shop.Secretive");
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("Secretive"), &args, None));
        assert!(diagnostics.is_empty());
        assert_eq!(constructor_params(&bound), vec![Ty::INT]);
    }

    #[test]
    fn no_constructor_matches_at_all() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let args = [b.arg(b.bool(true))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Secretive"), &args, None));
        assert!(bound.has_errors);
        let diagnostics = diagnostics.into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].error.kind(), ErrorKind::NoApplicableOverload);
    }

    #[test]
    fn dynamic_argument_defers_creation() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("d", Ty::Dynamic);
        let args = [b.arg(b.ident("d"))];
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("Widget"), &args, None));
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(fx.ty("Shop.Widget")));
        let BoundKind::DynamicObjectCreation { applicable, .. } = &bound.kind else {
            panic!("expected a dynamic creation, got {:?}", bound.kind);
        };
        assert_eq!(applicable.len(), 1);
    }

    #[test]
    fn interface_without_coclass_cannot_be_created() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("IShape"), &[], None));
        assert!(bound.has_errors);
        assert!(bound.ty.as_ref().is_some_and(Ty::is_error));
        assert!(matches!(
            bound.kind,
            BoundKind::BadExpression {
                result_kind: LookupResultKind::NotCreatable,
                ..
            }
        ));
        let diagnostics = diagnostics.into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0].error, BindError::InterfaceCreation { .. }));
        assert_eq!(diagnostics[0].error.kind(), ErrorKind::InvalidContext);
    }

    #[test]
    fn interface_with_coclass_creates_the_class() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let args = [b.arg(b.int(3))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("IWidget"), &args, None));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(bound.ty, Some(fx.ty("Shop.IWidget")));
        let BoundKind::Conversion { operand, .. } = &bound.kind else {
            panic!("expected a conversion, got {:?}", bound.kind);
        };
        assert_eq!(operand.ty, Some(fx.ty("Shop.Widget")));
        assert_eq!(constructor_params(operand), vec![Ty::INT]);
    }

    #[test]
    fn coclass_need_not_implement_its_interface() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("IThing"), &[], None));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(!bound.has_errors);
        assert_eq!(bound.ty, Some(fx.ty("Shop.IThing")));
        let BoundKind::Conversion { operand, conversion, .. } = &bound.kind else {
            panic!("expected a conversion, got {:?}", bound.kind);
        };
        assert_eq!(conversion.kind, ConversionKind::ExplicitReference);
        assert_eq!(operand.ty, Some(fx.ty("Shop.ThingClass")));
    }

    #[test]
    fn abstract_and_static_types_cannot_be_created() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Shape"), &[], None));
        assert!(bound.has_errors);
        assert!(matches!(diagnostics.into_vec()[0].error, BindError::AbstractCreation { .. }));

        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Extensions"), &[], None));
        assert!(bound.has_errors);
        assert!(matches!(diagnostics.into_vec()[0].error, BindError::StaticClassCreation { .. }));
    }

    #[test]
    fn non_class_targets_are_invalid() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let int = b.ty(SpecialType::Int32);
        for ty in [b.ty_array(int, 1), b.ty_pointer(int), b.ty_dynamic()] {
            let ctx = fx.context().with_flags(BinderFlags::UNSAFE);
            let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(ty, &[], None));
            assert!(bound.has_errors);
            let diagnostics = diagnostics.into_vec();
            assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
            assert!(matches!(diagnostics[0].error, BindError::InvalidCreationTarget { .. }));
        }
    }

    #[test]
    fn type_parameter_creation_needs_a_constraint() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        let ctx = fx.context().with_type_param("T", true);
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("T"), &[], None));
        assert!(diagnostics.is_empty());
        assert!(matches!(bound.kind, BoundKind::NewTypeParameter { initializer: None }));
        assert!(matches!(bound.ty, Some(Ty::TypeParam(_))));

        let ctx = fx.context().with_type_param("T", false);
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("T"), &[], None));
        assert!(bound.has_errors);
        assert!(matches!(diagnostics.into_vec()[0].error, BindError::NoNewConstraint { .. }));

        let ctx = fx.context().with_type_param("T", true);
        let args = [b.arg(b.int(1))];
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("T"), &args, None));
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.into_vec()[0].error,
            BindError::TypeParameterCreationArguments { .. }
        ));
    }

    #[test]
    fn initializer_is_attached_even_when_creation_fails() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let init = b.object_initializer(&[b.member_init("Name", b.string("pen"))]);
        let args = [b.arg(b.bool(true))];
        let (bound, _) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Item"), &args, Some(init)));
        let BoundKind::BadExpression { children, .. } = &bound.kind else {
            panic!("expected a bad expression, got {:?}", bound.kind);
        };
        assert!(
            children
                .iter()
                .any(|child| matches!(child.kind, BoundKind::ObjectInitializer { .. }))
        );

        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Item"), &[], Some(init)));
        assert!(diagnostics.is_empty());
        assert!(matches!(
            bound.kind,
            BoundKind::ObjectCreation {
                initializer: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn delegate_from_lambda() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let lambda = b.lambda(&[b.lambda_param("v", None)], b.binary(BinaryOp::Mul, b.ident("v"), b.int(2)));
        let args = [b.arg(lambda)];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Converter"), &args, None));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(bound.ty, Some(fx.ty("Shop.Converter")));
        let BoundKind::DelegateCreation { argument, .. } = &bound.kind else {
            panic!("expected a delegate creation, got {:?}", bound.kind);
        };
        assert!(matches!(argument.kind, BoundKind::Lambda { .. }));
    }

    #[test]
    fn delegate_from_lambda_with_a_bad_body_keeps_the_creation() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let lambda = b.lambda(&[], b.call_with(b.ident("Missing"), &[]));
        let args = [b.arg(lambda)];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Action"), &args, None));
        assert!(bound.has_errors);
        assert!(matches!(bound.kind, BoundKind::DelegateCreation { .. }));
        assert_eq!(bound.ty, Some(fx.ty("Shop.Action")));
        assert_eq!(diagnostics.count_of(ErrorKind::UnresolvedName), 1);
    }

    #[test]
    fn delegate_from_method_group() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let args = [b.arg(b.ident("Helper"))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Converter"), &args, None));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let BoundKind::DelegateCreation { method: Some(method), .. } = &bound.kind else {
            panic!("expected a bound delegate, got {:?}", bound.kind);
        };
        assert_eq!(method.name(), "Helper");

        let args = [b.arg(b.ident("Run"))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Converter"), &args, None));
        assert!(bound.has_errors);
        assert!(matches!(bound.kind, BoundKind::DelegateCreation { method: None, .. }));
        assert!(matches!(diagnostics.into_vec()[0].error, BindError::MethodGroupMismatch { .. }));
    }

    #[test]
    fn delegate_from_delegate_and_dynamic_values() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx
            .context()
            .with_local("convert", fx.ty("Shop.Converter"))
            .with_local("notify", fx.ty("Shop.Notify"))
            .with_local("d", Ty::Dynamic);

        let args = [b.arg(b.ident("convert"))];
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("Converter"), &args, None));
        assert!(diagnostics.is_empty());
        assert!(matches!(bound.kind, BoundKind::DelegateCreation { method: Some(_), .. }));

        let args = [b.arg(b.ident("notify"))];
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("Converter"), &args, None));
        assert!(bound.has_errors);
        assert!(matches!(diagnostics.into_vec()[0].error, BindError::MethodGroupMismatch { .. }));

        let args = [b.arg(b.ident("d"))];
        let (bound, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("Converter"), &args, None));
        assert!(diagnostics.is_empty());
        assert!(!bound.has_errors);
        assert!(matches!(bound.kind, BoundKind::DelegateCreation { method: None, .. }));
    }

    #[test]
    fn delegate_creation_argument_errors() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        let (_, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Action"), &[], None));
        assert!(matches!(
            diagnostics.into_vec()[0].error,
            BindError::DelegateArgumentCount { found: 0, .. }
        ));

        let args = [b.arg(b.int(1))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Action"), &args, None));
        assert!(bound.has_errors);
        assert!(matches!(diagnostics.into_vec()[0].error, BindError::MethodNameExpected { .. }));

        // `ref` on the argument is ignored outside strict mode.
        let ctx = fx.context().with_local("convert", fx.ty("Shop.Converter"));
        let args = [b.ref_arg(RefKind::Ref, b.ident("convert"))];
        let (_, diagnostics) = bind(&fx, &ctx, b.new_object(b.ty_named("Converter"), &args, None));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn delegate_creation_rejects_initializers() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let init = b.object_initializer(&[]);
        let args = [b.arg(b.ident("Helper"))];
        let (bound, diagnostics) = bind(&fx, &fx.context(), b.new_object(b.ty_named("Converter"), &args, Some(init)));
        assert!(bound.has_errors);
        assert!(matches!(bound.kind, BoundKind::DelegateCreation { .. }));
        assert!(matches!(
            diagnostics.into_vec()[0].error,
            BindError::DelegateCreationInitializer { .. }
        ));
    }
}
