//! Interned identifiers for cheap cloning and O(1) equality comparison.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// A unique identifier for any named entity in a design.
///
/// Identifiers are interned strings represented as a `u32` index into the
/// design's string table. This provides O(1) equality comparison and O(1)
/// cloning. Index 0 is reserved for the empty string, so [`Ident::NULL`]
/// never collides with a real name.
///
/// Two `Ident`s are only comparable when they come from the same
/// [`Interner`]; a design has exactly one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// The null identifier, resolving to the empty string.
    pub const NULL: Ident = Ident(0);

    /// Creates an `Ident` from a raw `u32` index.
    ///
    /// Intended for deserialization and testing. In normal use identifiers
    /// come from [`Interner::get_or_intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the reserved null identifier.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

// SAFETY: `Ident` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Errors raised by [`Interner::initialize_add`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternError {
    /// The string was already present in the table.
    #[error("'{0}' is already interned")]
    AlreadyInterned(String),
    /// The string landed on a different index than the table expected.
    #[error("'{string}' interned at index {actual}, expected {expected}")]
    IndexMismatch {
        /// The string being pre-registered.
        string: String,
        /// The index the caller's table assigned at build time.
        expected: u32,
        /// The next free slot actually used.
        actual: u32,
    },
}

/// Per-design string interner backed by [`lasso::ThreadedRodeo`].
///
/// Every name in a design — cells, nets, ports, bel/wire names — is interned
/// here, giving O(1) equality, O(1) cloning, and deduplicated storage for the
/// lifetime of the design context. The interner is single-writer by
/// convention: only the owning context appends during a flow phase.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new interner with index 0 pre-bound to the empty string.
    pub fn new() -> Self {
        let rodeo = ThreadedRodeo::new();
        let null = rodeo.get_or_intern_static("");
        debug_assert_eq!(null, Ident::NULL);
        Self { rodeo }
    }

    /// Interns a string, returning its [`Ident`]. If the string was already
    /// interned, returns the existing identifier without allocating.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Returns the identifier for `s` if it has been interned.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Returns the number of interned strings, including the null entry.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `false`: the null entry is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Pre-registers a string at a known index.
    ///
    /// Used to load build-time identifier tables (architecture built-ins)
    /// and verify them against runtime numbering. Fails if the string is
    /// already interned or if `expected` is not the next free slot.
    pub fn initialize_add(&self, s: &str, expected: u32) -> Result<Ident, InternError> {
        if self.rodeo.get(s).is_some() {
            return Err(InternError::AlreadyInterned(s.to_string()));
        }
        let id = self.rodeo.get_or_intern(s);
        if id.as_raw() != expected {
            return Err(InternError::IndexMismatch {
                string: s.to_string(),
                expected,
                actual: id.as_raw(),
            });
        }
        Ok(id)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_reserved() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(Ident::NULL), "");
        assert!(Ident::NULL.is_null());
        let first = interner.get_or_intern("clk");
        assert_eq!(first.as_raw(), 1);
        assert!(!first.is_null());
    }

    #[test]
    fn intern_resolve_roundtrip() {
        let interner = Interner::new();
        let id = interner.get_or_intern("X0Y0/LUT_A");
        assert_eq!(interner.resolve(id), "X0Y0/LUT_A");
    }

    #[test]
    fn same_string_same_ident() {
        let interner = Interner::new();
        let a = interner.get_or_intern("net_42");
        let b = interner.get_or_intern("net_42");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn different_strings_different_idents() {
        let interner = Interner::new();
        let a = interner.get_or_intern("foo");
        let b = interner.get_or_intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn get_without_interning() {
        let interner = Interner::new();
        assert!(interner.get("missing").is_none());
        interner.get_or_intern("present");
        assert!(interner.get("present").is_some());
    }

    #[test]
    fn initialize_add_sequential() {
        let interner = Interner::new();
        let lut = interner.initialize_add("LUT", 1).unwrap();
        let ff = interner.initialize_add("FF", 2).unwrap();
        assert_eq!(interner.resolve(lut), "LUT");
        assert_eq!(ff.as_raw(), 2);
    }

    #[test]
    fn initialize_add_rejects_duplicate() {
        let interner = Interner::new();
        interner.get_or_intern("LUT");
        let err = interner.initialize_add("LUT", 2).unwrap_err();
        assert_eq!(err, InternError::AlreadyInterned("LUT".to_string()));
    }

    #[test]
    fn initialize_add_rejects_index_gap() {
        let interner = Interner::new();
        let err = interner.initialize_add("LUT", 7).unwrap_err();
        assert!(matches!(
            err,
            InternError::IndexMismatch {
                expected: 7,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let id = Ident::from_raw(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
