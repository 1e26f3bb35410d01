// src/codes.rs

//! Fixed-width numeric codes (ZIP, state FIPS, county FIPS).
//!
//! Every code that can carry leading zeros is held as a zero-padded string
//! from the moment it is read. Nothing in the crate stores these as integers.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("{kind} is empty")]
    Empty { kind: &'static str },

    #[error("{kind} `{value}` contains non-digit characters")]
    NotDigits { kind: &'static str, value: String },

    #[error("{kind} `{value}` is wider than {width} digits")]
    TooWide {
        kind: &'static str,
        value: String,
        width: usize,
    },
}

/// Shared constructors, so readers can coerce any code type generically.
pub trait FixedCode: Sized {
    const KIND: &'static str;

    fn parse_code(raw: &str) -> Result<Self, CodeError>;
    fn from_code_number(n: u64) -> Result<Self, CodeError>;
}

macro_rules! fixed_code {
    ($(#[$meta:meta])* $name:ident, $width:expr, $kind:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Parse from text, left-padding with zeros up to the fixed width.
            pub fn parse(raw: &str) -> Result<Self, CodeError> {
                pad_digits(raw, $width, $kind).map(Self)
            }

            /// Build from a numeric cell value, restoring stripped zeros.
            pub fn from_number(n: u64) -> Result<Self, CodeError> {
                let s = format!("{:0width$}", n, width = $width);
                if s.len() > $width {
                    return Err(CodeError::TooWide {
                        kind: $kind,
                        value: s,
                        width: $width,
                    });
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FixedCode for $name {
            const KIND: &'static str = $kind;

            fn parse_code(raw: &str) -> Result<Self, CodeError> {
                Self::parse(raw)
            }

            fn from_code_number(n: u64) -> Result<Self, CodeError> {
                Self::from_number(n)
            }
        }

        impl FromStr for $name {
            type Err = CodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

fixed_code!(
    /// Five-digit USPS ZIP code.
    Zip,
    5,
    "ZIP code"
);
fixed_code!(
    /// Two-digit state FIPS code.
    StateFips,
    2,
    "state FIPS code"
);
fixed_code!(
    /// Three-digit county FIPS code, unique within a state.
    CountyFips,
    3,
    "county FIPS code"
);
fixed_code!(
    /// Combined five-digit state + county FIPS code (`STCOUNTYFP`).
    StCountyFips,
    5,
    "state+county FIPS code"
);

impl StCountyFips {
    pub fn from_parts(state: &StateFips, county: &CountyFips) -> Self {
        let mut s = String::with_capacity(5);
        s.push_str(state.as_str());
        s.push_str(county.as_str());
        Self(s)
    }
}

fn pad_digits(raw: &str, width: usize, kind: &'static str) -> Result<String, CodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CodeError::Empty { kind });
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodeError::NotDigits {
            kind,
            value: trimmed.to_string(),
        });
    }
    if trimmed.len() > width {
        return Err(CodeError::TooWide {
            kind,
            value: trimmed.to_string(),
            width,
        });
    }
    Ok(format!("{:0>width$}", trimmed, width = width))
}
