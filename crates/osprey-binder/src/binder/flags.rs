use bitflags::bitflags;

bitflags! {
    /// Contextual facts about the code being bound.
    ///
    /// Flags are inherited down the binder chain; a child binder may add
    /// flags but only `with_checked` clears one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BinderFlags: u32 {
        /// Inside `checked(...)` or a checked compilation.
        const CHECKED = 1 << 0;
        /// Inside `unchecked(...)`.
        const UNCHECKED = 1 << 1;
        /// Inside an `unsafe` block or member.
        const UNSAFE = 1 << 2;
        /// Binding a field initializer.
        const FIELD_INITIALIZER = 1 << 3;
        /// Binding an attribute argument.
        const ATTRIBUTE_ARGUMENT = 1 << 4;
        /// Inside a `catch` or `finally` block.
        const IN_CATCH_OR_FINALLY = 1 << 5;
        /// Inside a lambda body.
        const IN_LAMBDA = 1 << 6;
        /// Binding a `: this(...)` / `: base(...)` constructor initializer.
        const CONSTRUCTOR_INITIALIZER = 1 << 7;
        /// Binding the operand of `nameof`.
        const NAMEOF_ARGUMENT = 1 << 8;
    }
}

impl BinderFlags {
    /// Flags for which `this` is unavailable.
    pub const NO_INSTANCE: BinderFlags = BinderFlags::FIELD_INITIALIZER
        .union(BinderFlags::ATTRIBUTE_ARGUMENT)
        .union(BinderFlags::CONSTRUCTOR_INITIALIZER);
}
