//! Newtype identifiers for orders and order lines.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing a purchase order id with a customer order id.
//!
//! Marketplace identifiers are opaque strings, but some backend endpoints
//! serialize them as JSON numbers. Deserialization accepts both and always
//! stores the textual form.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain JSON string
/// - `Deserialize` from a JSON string or integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use seller_console_core::define_id;
/// define_id!(ShipmentId);
/// define_id!(ParcelId);
///
/// let shipment = ShipmentId::new("108");
/// let parcel = ParcelId::new("108");
///
/// // These are different types, so this won't compile:
/// // let _: ShipmentId = parcel;
/// # assert_eq!(shipment.as_str(), parcel.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
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

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                #[derive(::serde::Deserialize)]
                #[serde(untagged)]
                enum Repr {
                    Text(String),
                    Signed(i64),
                    Unsigned(u64),
                }

                Ok(match Repr::deserialize(deserializer)? {
                    Repr::Text(s) => Self(s),
                    Repr::Signed(n) => Self(n.to_string()),
                    Repr::Unsigned(n) => Self(n.to_string()),
                })
            }
        }
    };
}

define_id!(PurchaseOrderId);
define_id!(CustomerOrderId);
define_id!(LineNumber);
