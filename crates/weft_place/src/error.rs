//! Error types for the placement engine.

use thiserror::Error;

/// The result type for fallible engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the placement engine.
///
/// The first five are placement problems an operator can choose to push past
/// with the context's `force` flag, turning them into a logged warning and a
/// `false` return from the phase. Binding-store and invariant errors indicate
/// an engine bug and always abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A `BEL` constraint names a bel the catalog does not know.
    #[error("no bel named '{bel}' on this device (processing BEL attribute on cell '{cell}')")]
    UnknownBel {
        /// The unresolvable bel name.
        bel: String,
        /// The constrained cell.
        cell: String,
    },

    /// A `BEL` constraint pins a cell onto a bel of a different type.
    #[error("bel '{bel}' of type '{bel_type}' does not match cell '{cell}' of type '{cell_type}'")]
    TypeMismatch {
        /// The constrained bel.
        bel: String,
        /// The bel's type.
        bel_type: String,
        /// The constrained cell.
        cell: String,
        /// The cell's type.
        cell_type: String,
    },

    /// A cell type has no bels at all on this device.
    #[error("no bels of type '{cell_type}' on this device")]
    UnknownBelType {
        /// The cell type with no matching bels.
        cell_type: String,
    },

    /// The device ran out of bels for a cell type.
    #[error("too many '{cell_type}' used in design")]
    ResourceExhausted {
        /// The exhausted cell type.
        cell_type: String,
    },

    /// The improvement pass found no legal bel for a cell.
    #[error("failed to place cell '{cell}' of type '{cell_type}'")]
    PlacementFailure {
        /// The unplaceable cell.
        cell: String,
        /// Its type.
        cell_type: String,
    },

    /// A bind was attempted on a resource already bound at equal or greater
    /// strength.
    #[error("{resource} is already bound")]
    AlreadyBound {
        /// Description of the contested resource.
        resource: String,
    },

    /// An unbind was attempted on a resource that is not bound.
    #[error("{resource} is not bound")]
    NotBound {
        /// Description of the resource.
        resource: String,
    },

    /// The integrity checker found a broken cross-link invariant.
    #[error("design invariant violated: {0}")]
    InvariantFailure(String),
}

impl Error {
    /// Returns `true` for placement problems the `force` flag may downgrade
    /// to a warning. Binding-store and invariant errors are never
    /// recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnknownBel { .. }
                | Error::TypeMismatch { .. }
                | Error::UnknownBelType { .. }
                | Error::ResourceExhausted { .. }
                | Error::PlacementFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_errors_are_recoverable() {
        let e = Error::ResourceExhausted {
            cell_type: "LUT".into(),
        };
        assert!(e.is_recoverable());
        let e = Error::UnknownBel {
            bel: "X9Y9/LUT_A".into(),
            cell: "lut0".into(),
        };
        assert!(e.is_recoverable());
    }

    #[test]
    fn binding_errors_are_not_recoverable() {
        let e = Error::AlreadyBound {
            resource: "bel 'X0Y0/LUT_A'".into(),
        };
        assert!(!e.is_recoverable());
        let e = Error::InvariantFailure("wire w bound to nothing".into());
        assert!(!e.is_recoverable());
    }

    #[test]
    fn display_formats() {
        let e = Error::ResourceExhausted {
            cell_type: "FF".into(),
        };
        assert_eq!(format!("{e}"), "too many 'FF' used in design");

        let e = Error::TypeMismatch {
            bel: "X0Y0/LUT_A".into(),
            bel_type: "LUT".into(),
            cell: "ff0".into(),
            cell_type: "FF".into(),
        };
        assert!(format!("{e}").contains("does not match cell 'ff0'"));
    }
}
