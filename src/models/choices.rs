use std::fmt;
use std::str::FromStr;

use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored or submitted value that is not one of the allowed choices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownChoice(pub String);

/// Declares an enum stored as lowercase TEXT, with serde, `Display` and
/// `FromStr` all agreeing on the same spelling.
macro_rules! text_choice {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Text)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every allowed value, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored and wire spelling of this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownChoice(other.to_string())),
                }
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
                Ok(text.parse()?)
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }
    };
}

text_choice! {
    /// What the submitter wants to do with the item
    pub enum ListingType {
        Sell => "sell",
        Rent => "rent",
        Donate => "donate",
        Lend => "lend",
        Share => "share",
    }
}

text_choice! {
    /// Where a listing is in the moderation workflow
    pub enum ListingStatus {
        /// Submitted and waiting for an administrator
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl ListingType {
    /// Whether listings of this kind are conventionally priced
    ///
    /// Nothing enforces this at creation time; clients use it to decide
    /// whether to ask for a price.
    pub fn expects_price(&self) -> bool {
        matches!(self, ListingType::Sell | ListingType::Rent)
    }
}

impl Default for ListingStatus {
    fn default() -> Self {
        ListingStatus::Pending
    }
}
