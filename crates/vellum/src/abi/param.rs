//! Parameter categories and the coercion of user input into ABI values.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{B256, I256, Sign, U256, hex};
use std::{fmt, str::FromStr};
use vellum_common::address::parse_address;

use super::AbiError;

/// The category of a single ABI parameter.
///
/// Only categories that can be entered as plain text are supported. Tuples, function pointers
/// and fixed-point numbers are rejected when the type is parsed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// `uintN`, with the bit size.
    Uint(usize),
    /// `intN`, with the bit size.
    Int(usize),
    Address,
    Bool,
    /// `bytesN`, with the byte length.
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]`.
    Array(Box<ParamKind>),
    /// `T[N]`.
    FixedArray(Box<ParamKind>, usize),
}

impl ParamKind {
    /// Parses a Solidity type string such as `uint256` or `address[]`.
    pub fn parse(ty: &str) -> Result<Self, AbiError> {
        let unsupported = || AbiError::UnsupportedType(ty.to_string());
        let parsed = DynSolType::parse(ty).map_err(|_| unsupported())?;
        Self::from_sol_type(&parsed).ok_or_else(unsupported)
    }

    fn from_sol_type(ty: &DynSolType) -> Option<Self> {
        Some(match ty {
            DynSolType::Uint(bits) => Self::Uint(*bits),
            DynSolType::Int(bits) => Self::Int(*bits),
            DynSolType::Address => Self::Address,
            DynSolType::Bool => Self::Bool,
            DynSolType::FixedBytes(size) => Self::FixedBytes(*size),
            DynSolType::Bytes => Self::Bytes,
            DynSolType::String => Self::String,
            DynSolType::Array(inner) => Self::Array(Box::new(Self::from_sol_type(inner)?)),
            DynSolType::FixedArray(inner, len) => {
                Self::FixedArray(Box::new(Self::from_sol_type(inner)?), *len)
            }
            _ => return None,
        })
    }

    /// The equivalent dynamic Solidity type.
    pub fn sol_type(&self) -> DynSolType {
        match self {
            Self::Uint(bits) => DynSolType::Uint(*bits),
            Self::Int(bits) => DynSolType::Int(*bits),
            Self::Address => DynSolType::Address,
            Self::Bool => DynSolType::Bool,
            Self::FixedBytes(size) => DynSolType::FixedBytes(*size),
            Self::Bytes => DynSolType::Bytes,
            Self::String => DynSolType::String,
            Self::Array(inner) => DynSolType::Array(Box::new(inner.sol_type())),
            Self::FixedArray(inner, len) => DynSolType::FixedArray(Box::new(inner.sol_type()), *len),
        }
    }

    /// Converts raw user input into a value of this kind.
    ///
    /// Integers accept decimal or `0x` hex of any precision that fits the bit size. Addresses
    /// must be `0x` followed by 40 hex digits, in any casing. `bytes` values are hex and `string`
    /// values are taken verbatim. Arrays are written as `[a, b, c]`.
    pub fn coerce(&self, raw: &str) -> Result<DynSolValue, AbiError> {
        let invalid = |reason: &str| AbiError::InvalidValue {
            ty: self.to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        match self {
            Self::Uint(bits) => {
                let value = parse_uint(raw.trim()).ok_or_else(|| invalid("not an unsigned integer"))?;
                if value.bit_len() > *bits {
                    return Err(invalid("out of range"));
                }
                Ok(DynSolValue::Uint(value, *bits))
            }
            Self::Int(bits) => {
                let value = parse_int(raw.trim()).ok_or_else(|| invalid("not an integer"))?;
                if value.bits() as usize > *bits {
                    return Err(invalid("out of range"));
                }
                Ok(DynSolValue::Int(value, *bits))
            }
            Self::Address => parse_address(raw)
                .map(DynSolValue::Address)
                .map_err(|_| invalid("expected 0x followed by 40 hex digits")),
            Self::Bool => match raw.trim() {
                "true" => Ok(DynSolValue::Bool(true)),
                "false" => Ok(DynSolValue::Bool(false)),
                _ => Err(invalid("expected `true` or `false`")),
            },
            Self::FixedBytes(size) => {
                let bytes = hex::decode(raw.trim()).map_err(|_| invalid("not hex"))?;
                if bytes.len() != *size {
                    return Err(invalid(&format!("expected {size} bytes, got {}", bytes.len())));
                }
                Ok(DynSolValue::FixedBytes(B256::right_padding_from(&bytes), *size))
            }
            Self::Bytes => hex::decode(raw.trim())
                .map(DynSolValue::Bytes)
                .map_err(|_| invalid("not hex")),
            Self::String => Ok(DynSolValue::String(raw.to_string())),
            Self::Array(inner) => {
                let items = split_list(raw).ok_or_else(|| invalid("expected `[a, b, ...]`"))?;
                items.iter().map(|item| inner.coerce(item)).collect::<Result<_, _>>().map(DynSolValue::Array)
            }
            Self::FixedArray(inner, len) => {
                let items = split_list(raw).ok_or_else(|| invalid("expected `[a, b, ...]`"))?;
                if items.len() != *len {
                    return Err(invalid(&format!("expected {len} elements, got {}", items.len())));
                }
                items
                    .iter()
                    .map(|item| inner.coerce(item))
                    .collect::<Result<_, _>>()
                    .map(DynSolValue::FixedArray)
            }
        }
    }
}

impl FromStr for ParamKind {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::FixedBytes(size) => write!(f, "bytes{size}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
        }
    }
}

fn parse_uint(s: &str) -> Option<U256> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            U256::from_str_radix(s, 10).ok()
        }
        None => None,
    }
}

fn parse_int(s: &str) -> Option<I256> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let sign = if negative { Sign::Negative } else { Sign::Positive };
    I256::checked_from_sign_and_abs(sign, parse_uint(digits)?)
}

/// Splits `[a, b, c]` into its top-level elements. Nested brackets and quoted strings are kept
/// intact; surrounding quotes are removed from each element.
fn split_list(raw: &str) -> Option<Vec<String>> {
    let inner = raw.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            ('[', None) => depth += 1,
            (']', None) => depth = depth.checked_sub(1)?,
            (',', None) if depth == 0 => {
                items.push(unquote(&current));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if quote.is_some() || depth != 0 {
        return None;
    }
    items.push(unquote(&current));
    Some(items)
}

fn unquote(item: &str) -> String {
    let item = item.trim();
    for q in ['"', '\''] {
        if let Some(inner) = item.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner.to_string();
        }
    }
    item.to_string()
}

/// Renders a decoded value for display. Numbers are decimal, addresses canonical lowercase.
pub fn render(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Uint(value, _) => value.to_string(),
        DynSolValue::Int(value, _) => value.to_string(),
        DynSolValue::Address(address) => format!("{address:#x}"),
        DynSolValue::Bool(value) => value.to_string(),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..*size]),
        DynSolValue::Bytes(bytes) => hex::encode_prefixed(bytes),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            format!("[{}]", values.iter().map(render).collect::<Vec<_>>().join(", "))
        }
        _ => match value.as_tuple() {
            Some(values) => {
                format!("({})", values.iter().map(render).collect::<Vec<_>>().join(", "))
            }
            None => format!("{value:?}"),
        },
    }
}
