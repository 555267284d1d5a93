//! Code for handling IDs
use anyhow::{Context, Result};
use indexmap::IndexSet;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// An ID type (e.g. `SupplierID`, `ProductID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}

define_id_type! {SupplierID}
define_id_type! {ProductID}

/// Find the position of an ID in an ordered set of IDs.
///
/// # Returns
///
/// The index of `id` in `ids`, or an error if not found.
pub fn get_index_by_str<ID>(ids: &IndexSet<ID>, id: &str) -> Result<usize>
where
    ID: Eq + std::hash::Hash + std::borrow::Borrow<str>,
{
    ids.get_index_of(id)
        .with_context(|| format!("Unknown ID {id} found"))
}
