//! Shared fixture for the integration tests.
//!
//! Builds a small `Shop` model through the public registration API and
//! wraps the binder chain so each test only states where the expression is
//! bound.

#![allow(dead_code)]

use osprey::core::{
    Accessibility, FieldDef, LocalSymbol, MethodDef, ParamDef, PropertyDef, TypeDef, TypeHash,
};
use osprey::prelude::*;

/// Route binder traces to the test writer. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn named(qualified: &str) -> Ty {
    Ty::named(TypeHash::from_name(qualified), qualified)
}

/// The `Shop` symbol table.
pub fn shop() -> SymbolTable {
    let mut table = SymbolTable::with_special_types();
    table.add_namespace("Shop").expect("namespace Shop");

    table
        .register_type(TypeDef::delegate("Shop.Action", vec![], Ty::VOID))
        .expect("Shop.Action");
    table
        .register_type(TypeDef::delegate(
            "Shop.Converter",
            vec![ParamDef::new("value", Ty::INT)],
            Ty::INT,
        ))
        .expect("Shop.Converter");

    table
        .register_type(
            TypeDef::class("Shop.Item")
                .with_constructor(MethodDef::constructor(vec![]))
                .with_field(FieldDef::new("Name", Ty::STRING))
                .with_field(FieldDef::new("Price", Ty::DOUBLE).as_readonly())
                .with_method(MethodDef::new("Describe", vec![], Ty::STRING)),
        )
        .expect("Shop.Item");

    table.register_type(TypeDef::interface("Shop.IShape")).expect("Shop.IShape");
    table
        .register_type(
            TypeDef::class("Shop.Secretive")
                .with_constructor(MethodDef::constructor(vec![]))
                .with_constructor(
                    MethodDef::constructor(vec![ParamDef::new("code", Ty::INT)])
                        .with_accessibility(Accessibility::Private),
                ),
        )
        .expect("Shop.Secretive");

    table
        .register_type(
            TypeDef::class("Shop.Buffer")
                .with_property(PropertyDef::new("Length", Ty::INT))
                .with_property(PropertyDef::indexer(Ty::INT, vec![ParamDef::new("i", Ty::INT)]))
                .with_method(MethodDef::new(
                    "Slice",
                    vec![ParamDef::new("start", Ty::INT), ParamDef::new("length", Ty::INT)],
                    named("Shop.Buffer"),
                )),
        )
        .expect("Shop.Buffer");

    table
        .register_type(
            TypeDef::structure("Shop.Money")
                .with_field(FieldDef::new("Amount", Ty::DECIMAL))
                .with_constructor(MethodDef::constructor(vec![ParamDef::new("amount", Ty::DECIMAL)])),
        )
        .expect("Shop.Money");

    table
        .register_type(TypeDef::interface("Shop.IWidget").with_coclass(TypeHash::from_name("Shop.Widget")))
        .expect("Shop.IWidget");
    table
        .register_type(
            TypeDef::class("Shop.Widget")
                .with_interface(named("Shop.IWidget"))
                .with_constructor(MethodDef::constructor(vec![ParamDef::new("size", Ty::INT)])),
        )
        .expect("Shop.Widget");

    let boxed = TypeDef::class("Shop.Box").generic(&["T"]);
    let t = boxed.type_param(0);
    let boxed = boxed
        .with_field(FieldDef::new("Value", t.clone()))
        .with_constructor(MethodDef::constructor(vec![ParamDef::new("value", t)]));
    table.register_type(boxed).expect("Shop.Box");

    table
        .register_type(
            TypeDef::class("Shop.Extensions")
                .as_static()
                .with_method(MethodDef::extension("Shout", vec![ParamDef::new("text", Ty::STRING)], Ty::STRING)),
        )
        .expect("Shop.Extensions");

    table
        .register_type(
            TypeDef::class("Shop.Program")
                .with_field(FieldDef::new("total", Ty::INT))
                .with_method(MethodDef::new("Run", vec![], Ty::VOID))
                .with_method(MethodDef::new(
                    "Pick",
                    vec![ParamDef::new("first", Ty::INT), ParamDef::new("second", Ty::INT)],
                    Ty::INT,
                )),
        )
        .expect("Shop.Program");

    table
}

pub fn ty(table: &SymbolTable, qualified: &str) -> Ty {
    table
        .type_named(qualified)
        .unwrap_or_else(|| panic!("no type {qualified} in the fixture"))
}

/// Where an expression is bound: inside `Shop.Program.Run` unless changed.
pub struct Scope {
    pub options: CompilationOptions,
    pub container: String,
    pub locals: LocalScope,
    pub flags: BinderFlags,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            options: CompilationOptions::default(),
            container: "Shop.Program".to_string(),
            locals: LocalScope::new(),
            flags: BinderFlags::empty(),
        }
    }
}

impl Scope {
    pub fn with_local(mut self, name: &str, ty: Ty) -> Self {
        self.locals.declare(LocalSymbol::new(name, ty, Span::default()));
        self
    }

    pub fn with_symbol(mut self, local: LocalSymbol) -> Self {
        self.locals.declare(local);
        self
    }

    pub fn with_options(mut self, options: CompilationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_flags(mut self, flags: BinderFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Run `f` against a binder chain for `scope`.
pub fn with_binder<R>(table: &SymbolTable, scope: &Scope, f: impl FnOnce(&Binder<'_>) -> R) -> R {
    let compilation = Compilation::new(table).with_options(scope.options.clone());
    let root = compilation.root_binder();
    let ns = table.namespaces().get_path("Shop").expect("namespace Shop");
    let ns = root.with_namespace(ns);
    let container = ns.with_type(ty(table, &scope.container));
    let method = container.with_method(MethodContext::instance("Run"));
    let locals = method.with_locals(scope.locals.clone());
    let flagged = locals.with_additional_flags(scope.flags);
    f(&flagged)
}

/// Bind `expr` as a value and give it its natural type.
pub fn bind_natural<'ast>(
    table: &SymbolTable,
    scope: &Scope,
    expr: &Expr<'ast>,
) -> (BoundExpr<'ast>, DiagnosticBag) {
    with_binder(table, scope, |binder| {
        let mut diagnostics = DiagnosticBag::new();
        let bound = bind_value(binder, expr, ValueKind::ReadableValue, &mut diagnostics);
        let bound = natural_type(binder, bound, &mut diagnostics);
        (bound, diagnostics)
    })
}

/// Every node in a bound tree, parents first.
pub fn walk<'a, 'ast>(root: &'a BoundExpr<'ast>) -> Vec<&'a BoundExpr<'ast>> {
    let mut nodes = vec![root];
    let mut i = 0;
    while i < nodes.len() {
        let node = nodes[i];
        nodes.extend(node.kind.children());
        i += 1;
    }
    nodes
}
