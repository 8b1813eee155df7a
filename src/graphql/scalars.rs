use crate::charges::format_amount;
use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};

/// A URL, carried as a plain string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url(pub String);

#[Scalar(name = "URL")]
impl ScalarType for Url {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::String(s) => Ok(Self(s)),
            other => Err(InputValueError::expected_type(other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

/// A decimal money amount
///
/// Accepts a number or a numeric string; always printed with two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal(pub f64);

#[Scalar(name = "Decimal")]
impl ScalarType for Decimal {
    fn parse(value: Value) -> InputValueResult<Self> {
        let amount = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        amount
            .filter(|a| a.is_finite())
            .map(Self)
            .ok_or_else(|| InputValueError::custom("amount must be numeric"))
    }

    fn to_value(&self) -> Value {
        Value::String(format_amount(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_parsing() {
        assert_eq!(Decimal::parse(Value::from(9.99)).unwrap(), Decimal(9.99));
        assert_eq!(Decimal::parse(Value::from("4.50")).unwrap(), Decimal(4.5));
        assert!(Decimal::parse(Value::from("cheap")).is_err());
        assert!(Decimal::parse(Value::Boolean(true)).is_err());
        assert_eq!(Decimal(10.0).to_value(), Value::from("10.00"));
    }

    #[test]
    fn test_url_parsing() {
        assert_eq!(
            Url::parse(Value::from("https://x.test")).unwrap(),
            Url("https://x.test".to_string())
        );
        assert!(Url::parse(Value::from(1)).is_err());
    }
}
