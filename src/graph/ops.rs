//! The closed operator/function vocabulary of the equation language, and its
//! mapping onto the external runtime's operation identifiers.

use serde::{Deserialize, Serialize};

/// Every operation a node can perform.
///
/// Variant names are exactly the operation identifiers the external sink
/// expects (`SinDeg`, `Fmod`, ...), so serialization and name generation
/// share one table. Radian-suffixed source tokens (`rSIN`) collapse onto the
/// plain variants; degree-suffixed tokens (`dSIN`) get their own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Fmod,
    Power,
    Greater,
    Less,
    Min,
    Max,
    Abs,
    Sign,
    Round,
    Ceil,
    Floor,
    Sqrt,
    Sin,
    SinDeg,
    Asin,
    AsinDeg,
    Cos,
    CosDeg,
    Acos,
    AcosDeg,
    Tan,
    TanDeg,
    Atan,
    AtanDeg,
}

impl FunctionKind {
    /// Maps an operator token (`+`, `^`, ...) to its kind.
    pub fn from_operator(token: &str) -> Option<Self> {
        Some(match token {
            "^" => Self::Power,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "%" => Self::Fmod,
            "+" => Self::Add,
            "-" => Self::Subtract,
            ">" => Self::Greater,
            "<" => Self::Less,
            _ => return None,
        })
    }

    /// Maps a function-name token (`SQRT`, `dSIN`, ...) to its kind.
    pub fn from_function(token: &str) -> Option<Self> {
        Some(match token {
            "MIN" => Self::Min,
            "MAX" => Self::Max,
            "ABS" => Self::Abs,
            "SIGN" => Self::Sign,
            "ROUND" => Self::Round,
            "CEIL" => Self::Ceil,
            "FLOOR" => Self::Floor,
            "SQRT" => Self::Sqrt,
            "SIN" | "rSIN" => Self::Sin,
            "dSIN" => Self::SinDeg,
            "ASIN" | "rASIN" => Self::Asin,
            "dASIN" => Self::AsinDeg,
            "COS" | "rCOS" => Self::Cos,
            "dCOS" => Self::CosDeg,
            "ACOS" | "rACOS" => Self::Acos,
            "dACOS" => Self::AcosDeg,
            "TAN" | "rTAN" => Self::Tan,
            "dTAN" => Self::TanDeg,
            "ATAN" | "rATAN" => Self::Atan,
            "dATAN" => Self::AtanDeg,
            _ => return None,
        })
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::from_operator(token).or_else(|| Self::from_function(token))
    }

    /// The external operation identifier, also used as the stem of generated
    /// node names (`Add1`, `SinDeg3`, ...).
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
            Self::Fmod => "Fmod",
            Self::Power => "Power",
            Self::Greater => "Greater",
            Self::Less => "Less",
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Abs => "Abs",
            Self::Sign => "Sign",
            Self::Round => "Round",
            Self::Ceil => "Ceil",
            Self::Floor => "Floor",
            Self::Sqrt => "Sqrt",
            Self::Sin => "Sin",
            Self::SinDeg => "SinDeg",
            Self::Asin => "Asin",
            Self::AsinDeg => "AsinDeg",
            Self::Cos => "Cos",
            Self::CosDeg => "CosDeg",
            Self::Acos => "Acos",
            Self::AcosDeg => "AcosDeg",
            Self::Tan => "Tan",
            Self::TanDeg => "TanDeg",
            Self::Atan => "Atan",
            Self::AtanDeg => "AtanDeg",
        }
    }
}

/// True for the eight infix operator tokens.
pub fn is_operator(token: &str) -> bool {
    precedence(token).is_some()
}

/// True for the fixed function vocabulary (`MIN` .. `dATAN`).
pub fn is_function(token: &str) -> bool {
    FunctionKind::from_function(token).is_some()
}

/// Binding strength of an operator token. `None` for non-operators.
pub fn precedence(token: &str) -> Option<u8> {
    Some(match token {
        "^" => 4,
        "*" | "/" | "%" => 3,
        "+" | "-" => 2,
        ">" | "<" => 1,
        _ => return None,
    })
}

/// `^` is the only right-associative operator: an equal-precedence `^` on
/// the stack must not be popped by an incoming `^`.
pub fn is_right_associative(token: &str) -> bool {
    token == "^"
}

/// Binary tokens pop two operands; everything else in the vocabulary pops
/// one. Only `MIN` and `MAX` are binary among the named functions.
pub fn is_binary(token: &str) -> bool {
    is_operator(token) || token == "MIN" || token == "MAX"
}
