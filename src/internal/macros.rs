//! A set of macros for easily working with internals.

macro_rules! api {
    ($e:expr) => {
        concat!("https://discord.com/api/v10", $e)
    };
    ($e:expr, $($rest:tt)*) => {
        format!(api!($e), $($rest)*)
    };
}

/// Defines an integer-backed enum which keeps unrecognised values around instead of failing to
/// deserialize them.
macro_rules! enum_number {
    (
        $(#[$outer:meta])*
        $vis:vis enum $Enum:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[cfg $($cfg:tt)*])?
                $Variant:ident = $value:literal,
            )*
            _ => Unknown($T:ty),
        }
    ) => {
        $(#[$outer])*
        $vis enum $Enum {
            $(
                $(#[doc = $doc])*
                $(#[cfg $($cfg)*])?
                $Variant,
            )*
            /// Variant value is unknown.
            Unknown($T),
        }

        impl From<$T> for $Enum {
            fn from(value: $T) -> Self {
                #[allow(unused_doc_comments)]
                match value {
                    $($(#[cfg $($cfg)*])? $value => Self::$Variant,)*
                    unknown => Self::Unknown(unknown),
                }
            }
        }

        impl From<$Enum> for $T {
            fn from(value: $Enum) -> Self {
                #[allow(unused_doc_comments)]
                match value {
                    $($(#[cfg $($cfg)*])? $Enum::$Variant => $value,)*
                    $Enum::Unknown(unknown) => unknown,
                }
            }
        }

        impl serde::Serialize for $Enum {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                <$T as serde::Serialize>::serialize(&<$T>::from(*self), serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $Enum {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                <$T as serde::Deserialize>::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    enum_number! {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        enum T {
            /// AAA
            A = 1,
            /// BBB
            B = 2,
            /// CCC
            C = 3,
            _ => Unknown(u8),
        }
    }

    #[test]
    fn enum_number() {
        assert_eq!(T::from(1), T::A);
        assert_eq!(T::from(3), T::C);
        assert_eq!(T::from(9), T::Unknown(9));
        assert_eq!(u8::from(T::B), 2);
        assert_eq!(serde_json::to_string(&T::B).unwrap(), "2");
        assert_eq!(serde_json::from_str::<T>("42").unwrap(), T::Unknown(42));
    }
}
