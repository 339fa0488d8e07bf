use std::{fmt, num::ParseIntError, str::FromStr};

use mongodb::bson::{doc, Bson, Document};
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Formatter, Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};

/// Define a positive integer record identifier, allocated by the store's
/// auto-increment counters.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u32 {
                self.0
            }

            /// A filter document matching exactly this record.
            pub fn as_doc(self) -> Document {
                doc! { "_id": self }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u32>().map(Self)
            }
        }

        impl From<$name> for Bson {
            fn from(id: $name) -> Self {
                Bson::Int64(i64::from(id.0))
            }
        }

        impl<'a> FromParam<'a> for $name {
            type Error = ParseIntError;

            fn from_param(param: &'a str) -> Result<Self, Self::Error> {
                param.parse::<$name>()
            }
        }

        impl UriDisplay<Path> for $name {
            fn fmt(&self, formatter: &mut Formatter<'_, Path>) -> fmt::Result {
                formatter.write_value(self.0)
            }
        }

        impl_from_uri_param_identity!([Path] $name);
    };
}

record_id!(
    /// Identifies a [`super::Question`].
    QuestionId
);

record_id!(
    /// Identifies a [`super::Choice`].
    ChoiceId
);
