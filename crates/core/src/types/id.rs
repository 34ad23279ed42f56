//! Newtype IDs for type-safe entity references.
//!
//! The backend identifies documents with opaque string keys (24-character
//! hex object ids in practice). Use the `define_id!` macro to create wrappers
//! that prevent mixing ids of different entity types.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()`, `short()` (last six characters, used in order
///   and product references shown to customers)
/// - `From<String>`, `From<&str>` and `Display`
///
/// # Example
///
/// ```rust
/// # use hearth_core::define_id;
/// define_id!(WishlistId);
///
/// let id = WishlistId::new("65f1c0ffee0000000000abcd");
/// assert_eq!(id.short(), "00abcd");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the backend sent an empty id.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// The last six characters of the id.
            #[must_use]
            pub fn short(&self) -> &str {
                let start = self
                    .0
                    .char_indices()
                    .rev()
                    .nth(5)
                    .map_or(0, |(idx, _)| idx);
                self.0.get(start..).unwrap_or(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(OrderLineId);
define_id!(UserId);
define_id!(AddressId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_takes_last_six() {
        let id = OrderId::new("661f2a9b8c3d4e5f6a7b8c9d");
        assert_eq!(id.short(), "7b8c9d");
    }

    #[test]
    fn test_short_of_short_id_is_whole_id() {
        assert_eq!(ProductId::new("abc").short(), "abc");
        assert_eq!(ProductId::new("").short(), "");
    }

    #[test]
    fn test_transparent_serde() {
        let id: CategoryId = serde_json::from_str("\"cat-1\"").unwrap_or_default();
        assert_eq!(id.as_str(), "cat-1");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"cat-1\""));
    }
}
