//! Opaque handles for device resources.
//!
//! A [`Catalog`](crate::catalog::Catalog) issues one handle per bel, wire,
//! pip, group, and decal it knows about. A handle wraps the resource's dense
//! index on that device, so it is cheap to copy, keys hash maps directly,
//! and stays valid exactly as long as the issuing catalog. Handles from two
//! different catalogs must never be mixed; "no resource" is spelled
//! `Option<…Id>` rather than a sentinel value.

use serde::{Deserialize, Serialize};

macro_rules! device_handle {
    ($name:ident, $what:literal) => {
        #[doc = concat!("Handle to ", $what, " on the target device.")]
        ///
        /// Compares and hashes by the dense index the catalog assigned at
        /// load time.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw index. The caller vouches that the index was
            /// assigned by the catalog this handle will be used against.
            pub fn from_raw(index: u32) -> Self {
                $name(index)
            }

            /// The dense index behind this handle.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// The index widened for slice access.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

device_handle!(BelId, "a bel, a programmable logic site");
device_handle!(WireId, "a routing wire");
device_handle!(PipId, "a programmable interconnect point");
device_handle!(GroupId, "a named group of related resources");
device_handle!(DecalId, "a graphical decal");
