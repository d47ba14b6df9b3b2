//! Comparison operators of formula leaves.

use std::fmt;
use std::str::FromStr;

use ontask_core::ValueType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::EvalError;

// ---------------------------------------------------------------------------
// Macro: closed operator set with its wire name and operand count.
// ---------------------------------------------------------------------------
macro_rules! define_operators {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( ($variant:ident, $str:expr, $arity:expr) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// Every operator, in declaration order.
            pub const ALL: &'static [$name] = &[ $( Self::$variant, )+ ];

            /// Returns the rule-builder name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $str, )+
                }
            }

            /// Number of constant operands the operator takes.
            pub fn arity(self) -> usize {
                match self {
                    $( Self::$variant => $arity, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = EvalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $str => Ok(Self::$variant), )+
                    other => Err(EvalError::Parse(format!("unknown operator: {other}"))),
                }
            }
        }
    };
}

define_operators! {
    /// Operator of a formula leaf.
    Operator {
        (Equal, "equal", 1),
        (NotEqual, "not_equal", 1),
        (BeginsWith, "begins_with", 1),
        (NotBeginsWith, "not_begins_with", 1),
        (Contains, "contains", 1),
        (NotContains, "not_contains", 1),
        (EndsWith, "ends_with", 1),
        (NotEndsWith, "not_ends_with", 1),
        (IsEmpty, "is_empty", 0),
        (IsNotEmpty, "is_not_empty", 0),
        (IsNull, "is_null", 0),
        (IsNotNull, "is_not_null", 0),
        (Less, "less", 1),
        (LessOrEqual, "less_or_equal", 1),
        (Greater, "greater", 1),
        (GreaterOrEqual, "greater_or_equal", 1),
        (Between, "between", 2),
        (NotBetween, "not_between", 2),
    }
}

impl Operator {
    /// Substring family: only valid on string-typed leaves.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Self::BeginsWith
                | Self::NotBeginsWith
                | Self::Contains
                | Self::NotContains
                | Self::EndsWith
                | Self::NotEndsWith
        )
    }

    /// Ordering family: only valid on integer, double and datetime leaves.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::Less
                | Self::LessOrEqual
                | Self::Greater
                | Self::GreaterOrEqual
                | Self::Between
                | Self::NotBetween
        )
    }

    /// Returns `true` if a leaf declaring `value_type` may use this operator.
    pub fn accepts(self, value_type: ValueType) -> bool {
        if self.is_ordering() {
            value_type.is_ordered()
        } else if self.is_pattern() {
            value_type == ValueType::String
        } else {
            true
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
