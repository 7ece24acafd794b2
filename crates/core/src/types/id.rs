//! Newtype IDs for type-safe entity references.
//!
//! All identifiers are opaque text (the catalog and customer IDs come from
//! other systems). Use the `define_id!` macro to create wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Maximum accepted length of an identifier.
pub const MAX_ID_LENGTH: usize = 255;

/// Errors that can occur when parsing an identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is empty or only whitespace.
    #[error("id cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Validate raw identifier text, returning the trimmed value.
///
/// # Errors
///
/// Returns [`IdError::Empty`] for blank input and [`IdError::TooLong`] when
/// the trimmed value exceeds [`MAX_ID_LENGTH`].
pub fn validate_id(value: &str) -> Result<&str, IdError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    if trimmed.len() > MAX_ID_LENGTH {
        return Err(IdError::TooLong { max: MAX_ID_LENGTH });
    }
    Ok(trimmed)
}

/// Build a new prefixed identifier, e.g. `wl_0190b6a4c1e27c3d9f1b2a3c4d5e6f70`.
///
/// Uses UUIDv7 so freshly generated IDs sort by creation time.
#[must_use]
pub fn generate_prefixed(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::now_v7().simple())
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` (trims and validates), `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>`, `FromStr` and `From<Id> for String`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// Passing a prefix additionally generates a `generate()` constructor for
/// IDs minted by this system.
///
/// # Example
///
/// ```rust
/// # use wishlist_core::define_id;
/// define_id!(CartId, "cart");
/// define_id!(OrderId);
///
/// let cart_id = CartId::generate();
/// assert!(cart_id.as_str().starts_with("cart_"));
///
/// let order_id = OrderId::parse("order_123").unwrap();
/// assert_eq!(order_id.as_str(), "order_123");
///
/// // These are different types, so this won't compile:
/// // let _: CartId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        $crate::define_id!($name);

        impl $name {
            /// Prefix used for generated IDs of this type.
            pub const PREFIX: &'static str = $prefix;

            /// Mint a new, time-ordered ID.
            #[must_use]
            pub fn generate() -> Self {
                Self($crate::types::id::generate_prefixed($prefix))
            }
        }
    };
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID from raw text.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is blank or too long.
            pub fn parse(value: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                $crate::types::id::validate_id(value).map(|id| Self(id.to_owned()))
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
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

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                // Database values are assumed valid
                let id = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// IDs minted by the wishlist module
define_id!(WishlistId, "wl");
define_id!(WishlistItemId, "wli");

// IDs owned by other systems
define_id!(CustomerId);
define_id!(SalesChannelId);
define_id!(ProductId);
define_id!(VariantId);
