//! Deterministic hash-based identity for types and members.
//!
//! [`TypeHash`] is a 64-bit hash computed from qualified names and signatures.
//! Identity is known before registration, so definitions can reference each
//! other in any order and a single map lookup resolves them.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that a type, a
//! method and a type parameter sharing a name never share a hash.
//!
//! ```
//! use osprey_core::TypeHash;
//!
//! let a = TypeHash::from_name("System.Int32");
//! assert_eq!(a, TypeHash::from_name("System.Int32"));
//!
//! let m1 = TypeHash::from_method(a, "Parse", &[TypeHash::from_name("System.String")]);
//! let m2 = TypeHash::from_method(a, "Parse", &[]);
//! assert_ne!(m1, m2);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for path components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for constructor hashes.
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for field, property and event hashes.
    pub const MEMBER: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for type parameter hashes.
    pub const TYPE_PARAM: u64 = 0x3e9f5d2a8c7b1403;

    /// Parameter position mixing constants.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

use hash_constants::*;

/// A deterministic 64-bit identity for a type, type parameter or member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// The empty hash, used as a "no identity" sentinel.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash a fully qualified type name (e.g. `System.Collections.IEnumerable`).
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), TYPE))
    }

    /// Hash a type parameter by its owner and ordinal.
    ///
    /// The ordinal, not the name, identifies the parameter, so `List<T>` and
    /// a redeclaration `List<U>` agree.
    pub fn from_type_param(owner: TypeHash, ordinal: usize) -> Self {
        let marker = PARAM_MARKERS[ordinal % PARAM_MARKERS.len()];
        TypeHash(xxh64(&(owner.0 ^ marker).to_le_bytes(), TYPE_PARAM) ^ ordinal as u64)
    }

    /// Hash a method from its owner, name and parameter types.
    pub fn from_method(owner: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        Self::signature(owner, name, param_hashes, METHOD)
    }

    /// Hash a constructor from its owner and parameter types.
    pub fn from_constructor(owner: TypeHash, param_hashes: &[TypeHash]) -> Self {
        Self::signature(owner, ".ctor", param_hashes, CONSTRUCTOR)
    }

    /// Hash a field, property, indexer or event.
    pub fn from_member(owner: TypeHash, name: &str) -> Self {
        Self::signature(owner, name, &[], MEMBER)
    }

    fn signature(owner: TypeHash, name: &str, params: &[TypeHash], domain: u64) -> Self {
        let mut hash = owner.0 ^ domain;
        hash = hash.rotate_left(17) ^ xxh64(name.as_bytes(), SEP);
        for (i, param) in params.iter().enumerate() {
            let marker = PARAM_MARKERS[i % PARAM_MARKERS.len()];
            hash = hash.wrapping_mul(31) ^ param.0.wrapping_add(marker);
        }
        TypeHash(xxh64(&hash.to_le_bytes(), domain))
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        assert_eq!(
            TypeHash::from_name("System.String"),
            TypeHash::from_name("System.String")
        );
        assert_ne!(
            TypeHash::from_name("System.String"),
            TypeHash::from_name("System.Object")
        );
    }

    #[test]
    fn domains_do_not_collide() {
        let owner = TypeHash::from_name("Widget");
        let method = TypeHash::from_method(owner, "Size", &[]);
        let member = TypeHash::from_member(owner, "Size");
        assert_ne!(method, member);
    }

    #[test]
    fn parameter_order_matters() {
        let owner = TypeHash::from_name("Widget");
        let int = TypeHash::from_name("System.Int32");
        let string = TypeHash::from_name("System.String");
        assert_ne!(
            TypeHash::from_method(owner, "M", &[int, string]),
            TypeHash::from_method(owner, "M", &[string, int])
        );
    }

    #[test]
    fn type_params_by_ordinal() {
        let owner = TypeHash::from_name("List`1");
        assert_eq!(
            TypeHash::from_type_param(owner, 0),
            TypeHash::from_type_param(owner, 0)
        );
        assert_ne!(
            TypeHash::from_type_param(owner, 0),
            TypeHash::from_type_param(owner, 1)
        );
    }
}
