use std::fmt::Display;
use std::str::FromStr;

use rand::distributions::{Distribution, Uniform};
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LENGTH: usize = 6;

/// The alphabet codes are drawn from. Human-enterable: uppercase only, read
/// back over the phone or copied from an email without ambiguity of case.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A short access code granting time-boxed permission to start a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    #[serde(with = "serialize_code")]
    code: [u8; LENGTH],
}

impl Code {
    /// Generate a random code, uniform over the charset.
    pub fn random() -> Self {
        let mut code = [0; LENGTH];
        let char_dist = Uniform::from(0..CHARSET.len());
        let mut rng = rand::thread_rng();
        for ch in &mut code {
            *ch = CHARSET[char_dist.sample(&mut rng)];
        }
        Self { code }
    }
}

impl Display for Code {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in self.code {
            write!(formatter, "{}", ch as char)?;
        }
        Ok(())
    }
}

impl FromStr for Code {
    type Err = ParseError;

    /// Parse a code, forgiving lowercase entry.
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let len = string.len();
        if len != LENGTH {
            return Err(Self::Err::InvalidLength(len));
        }
        let mut code = [0; LENGTH];
        for (slot, c) in code.iter_mut().zip(string.chars()) {
            let upper = c.to_ascii_uppercase();
            if !CHARSET.contains(&(upper as u8)) {
                return Err(Self::Err::InvalidChar(c));
            }
            *slot = upper as u8;
        }
        Ok(Self { code })
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("code must contain exactly {LENGTH} characters, got {0}")]
    InvalidLength(usize),
    #[error("code must contain only letters and digits, got '{0}'")]
    InvalidChar(char),
}

impl<'a> FromParam<'a> for Code {
    type Error = ParseError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse::<Code>()
    }
}

/// (De)serialisation for access codes: stored and transmitted as the plain
/// string a participant types in.
mod serialize_code {
    use serde::{
        de::{Error, Visitor},
        Deserializer, Serializer,
    };

    use super::LENGTH;

    pub fn serialize<S>(code: &[u8; LENGTH], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&code.iter().map(|ch| *ch as char).collect::<String>())
    }

    struct StrVisitor;

    impl<'de> Visitor<'de> for StrVisitor {
        type Value = [u8; LENGTH];

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(formatter, "a string of {LENGTH} letters or digits")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            v.parse::<super::Code>()
                .map(|code| code.code)
                .map_err(|err| E::custom(err))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; LENGTH], D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(StrVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_use_the_charset() {
        for _ in 0..100 {
            let code = Code::random().to_string();
            assert_eq!(code.len(), LENGTH);
            assert!(code.bytes().all(|ch| CHARSET.contains(&ch)));
        }
    }

    #[test]
    fn parse_round_trips() {
        let code: Code = "A1B2C3".parse().unwrap();
        assert_eq!(code.to_string(), "A1B2C3");
    }

    #[test]
    fn parse_uppercases() {
        let code: Code = "a1b2c3".parse().unwrap();
        assert_eq!(code.to_string(), "A1B2C3");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            "A1B2".parse::<Code>(),
            Err(ParseError::InvalidLength(4))
        ));
        assert!(matches!(
            "A1B2C3D4".parse::<Code>(),
            Err(ParseError::InvalidLength(8))
        ));
        assert!(matches!(
            "A1B2C!".parse::<Code>(),
            Err(ParseError::InvalidChar('!'))
        ));
    }
}
