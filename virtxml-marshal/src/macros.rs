//! Declarative helpers for leaf value types.
//!
//! - [`xml_enum!`](crate::xml_enum) declares an enumeration with a literal
//!   for each variant.
//! - [`validated_string!`](crate::validated_string) declares a string
//!   newtype that must fully match a regular expression.
//! - [`bounded_int!`](crate::bounded_int) declares an integer newtype with
//!   an inclusive range.
//!
//! All generated types implement [`Scalar`](crate::Scalar), `Display`,
//! `FromStr` and serde using the same textual form as the XML.

/// Declare an enumeration mapped to fixed literals.
///
/// ```
/// virtxml_marshal::xml_enum! {
///     pub enum Placement {
///         Static = "static",
///         Auto = "auto",
///     }
/// }
///
/// assert_eq!(Placement::Auto.as_str(), "auto");
/// assert_eq!("static".parse::<Placement>().unwrap(), Placement::Static);
/// ```
#[macro_export]
macro_rules! xml_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $literal:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $literal ),+
                }
            }
        }

        impl $crate::Scalar for $name {
            fn parse_text(text: &str) -> Option<Self> {
                match text {
                    $( $literal => Some($name::$variant), )+
                    _ => None,
                }
            }

            fn to_text(&self) -> String {
                self.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                <Self as $crate::Scalar>::parse_text(s)
                    .ok_or_else(|| $crate::Error::invalid(stringify!($name), s))
            }
        }

        $crate::__scalar_serde!($name);
    };
}

/// Declare string newtypes validated by anchored regular expressions.
///
/// ```
/// virtxml_marshal::validated_string! {
///     pub struct PciFunc = r"(0x)?[0-7]";
/// }
///
/// assert!(PciFunc::new("0x3").is_ok());
/// assert!(PciFunc::new("0x8").is_err());
/// ```
#[macro_export]
macro_rules! validated_string {
    ($( $(#[$meta:meta])* $vis:vis struct $name:ident = $pattern:literal; )+) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(String);

        impl $name {
            /// Unanchored source pattern.
            pub const PATTERN: &'static str = $pattern;

            /// Validate and wrap `value`.
            pub fn new(value: impl Into<String>) -> std::result::Result<Self, $crate::Error> {
                let value = value.into();
                if Self::is_valid(&value) {
                    Ok(Self(value))
                } else {
                    Err($crate::Error::invalid(stringify!($name), value))
                }
            }

            /// True when `text` matches the whole pattern.
            pub fn is_valid(text: &str) -> bool {
                static REGEX: $crate::__private::Lazy<$crate::__private::Regex> =
                    $crate::__private::Lazy::new(|| {
                        $crate::__private::Regex::new(concat!("^(?:", $pattern, ")$"))
                            .unwrap_or_else(|_| {
                                panic!("Static regex for {} failed to compile", stringify!($name))
                            })
                    });
                REGEX.is_match(text)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl $crate::Scalar for $name {
            fn parse_text(text: &str) -> Option<Self> {
                Self::is_valid(text).then(|| Self(text.to_string()))
            }

            fn to_text(&self) -> String {
                self.0.clone()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::Error;

            fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        $crate::__scalar_serde!($name);
    )+};
}

/// Declare integer newtypes restricted to an inclusive range.
///
/// ```
/// virtxml_marshal::bounded_int! {
///     pub struct Prefix(u8) in 0..=32;
/// }
///
/// assert!(Prefix::new(24).is_ok());
/// assert!(Prefix::new(33).is_err());
/// ```
#[macro_export]
macro_rules! bounded_int {
    ($( $(#[$meta:meta])* $vis:vis struct $name:ident($int:ty) in $min:literal ..= $max:literal; )+) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name($int);

        impl $name {
            pub const MIN: $int = $min;
            pub const MAX: $int = $max;

            pub fn new(value: $int) -> std::result::Result<Self, $crate::Error> {
                if (Self::MIN..=Self::MAX).contains(&value) {
                    Ok(Self(value))
                } else {
                    Err($crate::Error::invalid(stringify!($name), value.to_string()))
                }
            }

            pub fn get(&self) -> $int {
                self.0
            }
        }

        impl $crate::Scalar for $name {
            fn parse_text(text: &str) -> Option<Self> {
                let value = <$int as $crate::Scalar>::parse_text(text)?;
                Self::new(value).ok()
            }

            fn to_text(&self) -> String {
                self.0.to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                <Self as $crate::Scalar>::parse_text(s)
                    .ok_or_else(|| $crate::Error::invalid(stringify!($name), s))
            }
        }

        $crate::__scalar_serde!($name);
    )+};
}

/// Serde through the textual form, validating on the way in.
#[doc(hidden)]
#[macro_export]
macro_rules! __scalar_serde {
    ($name:ident) => {
        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.serialize_str(&<Self as $crate::Scalar>::to_text(self))
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let text = <String as $crate::__private::serde::Deserialize>::deserialize(deserializer)?;
                <Self as $crate::Scalar>::parse_text(&text).ok_or_else(|| {
                    <D::Error as $crate::__private::serde::de::Error>::custom(format!(
                        "invalid {} value: {:?}",
                        stringify!($name),
                        text
                    ))
                })
            }
        }
    };
}
