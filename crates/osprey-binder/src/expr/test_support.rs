//! Shared fixture for the binder's unit tests.
//!
//! The table models a small `Shop` namespace: classes with every member
//! kind, a struct with user-defined operators, interfaces with and without a
//! coclass, delegates, a type exposing the `Length` + `this[int]` + `Slice`
//! pattern, a `Color Color` pair and extension methods both imported and
//! not.

use osprey_core::{
    Accessibility, ConstantValue, EventDef, FieldDef, LocalSymbol, MethodDef, ParamDef,
    PropertyDef, RefKind, Span, SpecialType, Ty, TypeDef, TypeHash, TypeParamDef,
};
use osprey_symbols::SymbolTable;
use osprey_syntax::Expr;

use super::value::{ValueKind, bind_value};
use crate::binder::{Binder, BinderFlags, MethodContext};
use crate::bound::BoundExpr;
use crate::compilation::{Compilation, CompilationOptions};
use crate::scope::LocalScope;
use osprey_core::DiagnosticBag;

pub(crate) struct Fixture {
    pub table: SymbolTable,
}

fn named(qualified: &str) -> Ty {
    Ty::named(TypeHash::from_name(qualified), qualified)
}

impl Fixture {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let mut table = SymbolTable::with_special_types();
        let string = || Ty::STRING;
        let enumerable = Ty::Special(SpecialType::IEnumerable);

        let shop = table.add_namespace("Shop").unwrap();
        table.add_namespace("System.Linq").unwrap();
        table.add_namespace_alias(shop, "Sys", "System").unwrap();

        // === Delegates ===
        table.register_type(TypeDef::delegate("Shop.Action", vec![], Ty::VOID)).unwrap();
        table
            .register_type(TypeDef::delegate("Shop.Handler", vec![ParamDef::new("value", Ty::INT)], Ty::VOID))
            .unwrap();
        table
            .register_type(TypeDef::delegate("Shop.Converter", vec![ParamDef::new("value", Ty::INT)], Ty::INT))
            .unwrap();
        table
            .register_type(TypeDef::delegate("Shop.Notify", vec![ParamDef::new("message", string())], Ty::VOID))
            .unwrap();

        // === Value types and collections ===
        table
            .register_type(
                TypeDef::structure("Shop.Money")
                    .with_field(FieldDef::new("Amount", Ty::DECIMAL))
                    .with_constructor(MethodDef::constructor(vec![ParamDef::new("amount", Ty::DECIMAL)]))
                    .with_method(MethodDef::operator(
                        "op_Addition",
                        vec![ParamDef::new("left", named("Shop.Money")), ParamDef::new("right", named("Shop.Money"))],
                        named("Shop.Money"),
                    ))
                    .with_method(MethodDef::operator(
                        "op_Multiply",
                        vec![ParamDef::new("left", named("Shop.Money")), ParamDef::new("factor", Ty::DECIMAL)],
                        named("Shop.Money"),
                    )),
            )
            .unwrap();
        table
            .register_type(
                TypeDef::class("Shop.TagList")
                    .with_interface(enumerable.clone())
                    .with_constructor(MethodDef::constructor(vec![]))
                    .with_property(PropertyDef::new("Count", Ty::INT))
                    .with_method(MethodDef::new("Add", vec![ParamDef::new("tag", string())], Ty::VOID))
                    .with_method(MethodDef::new("GetEnumerator", vec![], Ty::OBJECT)),
            )
            .unwrap();

        // === Item: one of every member kind ===
        let item = TypeDef::class("Shop.Item")
            .with_constructor(MethodDef::constructor(vec![]))
            .with_constructor(MethodDef::constructor(vec![ParamDef::new("name", string())]))
            .with_field(FieldDef::new("Name", string()))
            .with_field(FieldDef::new("Price", Ty::DOUBLE).as_readonly())
            .with_field(FieldDef::new("Count", Ty::INT).as_static())
            .with_field(FieldDef::new("Max", Ty::INT).as_const(ConstantValue::Int(10)))
            .with_field(FieldDef::new("serial", Ty::INT).with_accessibility(Accessibility::Private))
            .with_property(PropertyDef::new("Title", string()).with_setter())
            .with_property(PropertyDef::new("Code", string()))
            .with_property(PropertyDef::new("Secret", string()).write_only())
            .with_property(PropertyDef::new("Cost", named("Shop.Money")))
            .with_property(PropertyDef::new("Tags", named("Shop.TagList")))
            .with_event(EventDef::new("Changed", named("Shop.Action")))
            .with_method(MethodDef::new("Describe", vec![], string()))
            .with_method(MethodDef::new("Create", vec![ParamDef::new("name", string())], named("Shop.Item")).as_static())
            .with_method(MethodDef::new("Scale", vec![ParamDef::new("factor", Ty::DOUBLE)], Ty::DOUBLE))
            .with_method(MethodDef::new("Scale", vec![ParamDef::new("factor", Ty::INT)], Ty::INT))
            .with_method(MethodDef::new(
                "Log",
                vec![ParamDef::new("values", Ty::array(Ty::OBJECT, 1)).as_params()],
                Ty::VOID,
            ))
            .with_method(MethodDef::new(
                "Pick",
                vec![
                    ParamDef::new("first", Ty::INT),
                    ParamDef::new("second", Ty::INT).with_default(ConstantValue::Int(5)),
                ],
                Ty::INT,
            ))
            .with_method(MethodDef::new(
                "Swap",
                vec![ParamDef::new("value", Ty::INT).with_ref_kind(RefKind::Ref)],
                Ty::VOID,
            ));
        let mut echo = MethodDef::new("Echo", vec![], Ty::VOID).generic(&["T"]);
        let t = echo.type_param(0);
        echo.params = vec![ParamDef::new("value", t.clone())];
        echo.return_type = t;
        let item = item.with_method(echo);
        table.register_type(item).unwrap();

        table
            .register_type(
                TypeDef::class("Shop.Calc")
                    .with_method(MethodDef::new("Twice", vec![ParamDef::new("n", Ty::INT)], Ty::INT).as_static())
                    .with_method(
                        MethodDef::new(
                            "Sum",
                            vec![ParamDef::new("values", Ty::array(Ty::INT, 1)).as_params()],
                            Ty::INT,
                        )
                        .as_static(),
                    ),
            )
            .unwrap();

        // === Creation targets ===
        table.register_type(TypeDef::interface("Shop.IShape")).unwrap();
        let widget_hash = TypeHash::from_name("Shop.Widget");
        table
            .register_type(TypeDef::interface("Shop.IWidget").with_coclass(widget_hash))
            .unwrap();
        table
            .register_type(
                TypeDef::class("Shop.Widget")
                    .with_interface(named("Shop.IWidget"))
                    .with_constructor(MethodDef::constructor(vec![]))
                    .with_constructor(MethodDef::constructor(vec![ParamDef::new("size", Ty::INT)])),
            )
            .unwrap();
        // A coclass that does not itself list the interface.
        table
            .register_type(TypeDef::interface("Shop.IThing").with_coclass(TypeHash::from_name("Shop.ThingClass")))
            .unwrap();
        table
            .register_type(TypeDef::class("Shop.ThingClass").with_constructor(MethodDef::constructor(vec![])))
            .unwrap();
        table.register_type(TypeDef::class("Shop.Shape").as_abstract()).unwrap();
        table
            .register_type(
                TypeDef::class("Shop.Secretive")
                    .with_constructor(MethodDef::constructor(vec![]))
                    .with_constructor(
                        MethodDef::constructor(vec![ParamDef::new("code", Ty::INT)])
                            .with_accessibility(Accessibility::Private),
                    ),
            )
            .unwrap();
        let boxed = TypeDef::class("Shop.Box").generic(&["T"]);
        let t = boxed.type_param(0);
        let boxed = boxed
            .with_field(FieldDef::new("Value", t.clone()))
            .with_constructor(MethodDef::constructor(vec![ParamDef::new("value", t)]));
        table.register_type(boxed).unwrap();

        // === Pattern-based element access ===
        table
            .register_type(
                TypeDef::class("Shop.Buffer")
                    .with_property(PropertyDef::new("Length", Ty::INT))
                    .with_property(PropertyDef::indexer(Ty::INT, vec![ParamDef::new("i", Ty::INT)]).with_setter())
                    .with_method(MethodDef::new(
                        "Slice",
                        vec![ParamDef::new("start", Ty::INT), ParamDef::new("length", Ty::INT)],
                        named("Shop.Buffer"),
                    )),
            )
            .unwrap();
        table
            .register_type(
                TypeDef::class("Shop.Deck")
                    .with_property(PropertyDef::new("Count", Ty::INT))
                    .with_property(PropertyDef::indexer(string(), vec![ParamDef::new("i", Ty::INT)])),
            )
            .unwrap();
        table
            .register_type(
                TypeDef::class("Shop.Sheet")
                    .with_property(PropertyDef::indexer(
                        Ty::DOUBLE,
                        vec![ParamDef::new("row", Ty::INT), ParamDef::new("column", Ty::INT)],
                    ))
                    .with_property(PropertyDef::indexer(Ty::DOUBLE, vec![ParamDef::new("name", string())])),
            )
            .unwrap();

        table
            .register_type(
                TypeDef::class("Shop.Rope")
                    .with_property(PropertyDef::new("Length", Ty::INT))
                    .with_property(
                        PropertyDef::indexer(Ty::INT, vec![ParamDef::new("key", string())])
                            .with_accessibility(Accessibility::Private),
                    )
                    .with_method(MethodDef::new(
                        "Slice",
                        vec![ParamDef::new("start", Ty::INT), ParamDef::new("length", Ty::INT)],
                        named("Shop.Rope"),
                    )),
            )
            .unwrap();

        // === Color Color ===
        table
            .register_type(
                TypeDef::class("Shop.Color")
                    .with_field(FieldDef::new("Red", named("Shop.Color")).as_static())
                    .with_property(PropertyDef::new("Brightness", Ty::INT))
                    .with_method(MethodDef::new("Darken", vec![], named("Shop.Color"))),
            )
            .unwrap();

        table
            .register_type(
                TypeDef::class("Shop.Program")
                    .with_field(FieldDef::new("Color", named("Shop.Color")))
                    .with_field(FieldDef::new("total", Ty::INT))
                    .with_property(PropertyDef::new("Callback", named("Shop.Converter")).with_setter())
                    .with_method(MethodDef::new("Run", vec![], Ty::VOID))
                    .with_method(MethodDef::new("Helper", vec![ParamDef::new("n", Ty::INT)], Ty::INT))
                    .with_method(MethodDef::new("Build", vec![], Ty::INT).as_static()),
            )
            .unwrap();

        // === Extensions ===
        table
            .register_type(
                TypeDef::class("Shop.Extensions")
                    .as_static()
                    .with_method(MethodDef::extension("Shout", vec![ParamDef::new("text", string())], string())),
            )
            .unwrap();
        table
            .register_type(
                TypeDef::class("System.Linq.Enumerable")
                    .as_static()
                    .with_method(MethodDef::extension("Count", vec![ParamDef::new("source", enumerable)], Ty::INT)),
            )
            .unwrap();

        Self { table }
    }

    pub fn ty(&self, qualified_name: &str) -> Ty {
        self.table
            .type_named(qualified_name)
            .unwrap_or_else(|| panic!("no type {qualified_name} in the fixture"))
    }

    pub fn context(&self) -> Context {
        Context::default()
    }

    /// Run `f` with a binder chain built from `ctx`.
    pub fn bind<R>(&self, ctx: &Context, f: impl FnOnce(&Binder<'_>) -> R) -> R {
        let compilation = Compilation::new(&self.table).with_options(ctx.options.clone());
        let root = compilation.root_binder();
        let ns = self
            .table
            .namespaces()
            .get_path(&ctx.namespace)
            .unwrap_or_else(|| panic!("no namespace {}", ctx.namespace));
        let ns = root.with_namespace(ns);
        let ty = ns.with_type(self.ty(&ctx.container));
        let method = ty.with_method(ctx.method.clone());
        let locals = method.with_locals(ctx.scope.clone());
        let flagged = locals.with_additional_flags(ctx.flags);
        f(&flagged)
    }

    pub fn bind_value<'ast>(
        &self,
        ctx: &Context,
        expr: &Expr<'ast>,
        kind: ValueKind,
    ) -> (BoundExpr<'ast>, DiagnosticBag) {
        self.bind(ctx, |binder| {
            let mut diagnostics = DiagnosticBag::new();
            let bound = bind_value(binder, expr, kind, &mut diagnostics);
            (bound, diagnostics)
        })
    }
}

/// Where in the `Shop` model an expression is bound.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    namespace: String,
    container: String,
    method: MethodContext,
    scope: LocalScope,
    options: CompilationOptions,
    flags: BinderFlags,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            namespace: "Shop".to_string(),
            container: "Shop.Program".to_string(),
            method: MethodContext::instance("Run"),
            scope: LocalScope::new(),
            options: CompilationOptions::default(),
            flags: BinderFlags::empty(),
        }
    }
}

impl Context {
    pub fn with_local(mut self, name: &str, ty: Ty) -> Self {
        self.scope.declare(LocalSymbol::new(name, ty, Span::default()));
        self
    }

    pub fn with_scope(mut self, scope: LocalScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_param(mut self, name: &str, ty: Ty) -> Self {
        self.method = self.method.with_param(name, ty);
        self
    }

    /// Add a method type parameter, optionally with a `new()` constraint.
    pub fn with_type_param(mut self, name: &str, creatable: bool) -> Self {
        let owner = TypeHash::from_name(&format!("{}``", self.method.name));
        let mut param = TypeParamDef::new(name, owner, self.method.type_params.len());
        param.has_constructor_constraint = creatable;
        self.method = self.method.with_type_param(param);
        self
    }

    pub fn in_type(mut self, qualified_name: &str) -> Self {
        self.container = qualified_name.to_string();
        self
    }

    pub fn in_constructor(mut self) -> Self {
        let params = std::mem::take(&mut self.method.params);
        self.method = MethodContext {
            params,
            ..MethodContext::constructor()
        };
        self
    }

    pub fn static_method(mut self) -> Self {
        self.method.is_static = true;
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

    pub fn with_namespace(mut self, path: &str) -> Self {
        self.namespace = path.to_string();
        self
    }
}
