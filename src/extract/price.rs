//! Price normalization
//!
//! Listing and detail pages render a price as three sibling fragments
//! (symbol, whole part, fractional part), and a struck-through "was" price as
//! a single text node with the symbol glued to the number.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while turning price text into a decimal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("empty price text")]
    Empty,

    #[error("unparsable price text '{0}'")]
    Malformed(String),
}

/// Joins whole and fractional price fragments into a decimal
///
/// Grouping separators and the trailing decimal point rendered inside the
/// whole part are stripped before joining across a single `.`.
///
/// # Examples
///
/// ```
/// use shopcrawl::extract::compose_price;
///
/// assert_eq!(compose_price("1,234.", "99").unwrap().to_string(), "1234.99");
/// assert_eq!(compose_price("5", "00").unwrap().to_string(), "5.00");
/// ```
pub fn compose_price(whole: &str, fraction: &str) -> Result<Decimal, PriceError> {
    let whole_digits: String = whole
        .chars()
        .filter(|c| !matches!(c, ',' | '.') && !c.is_whitespace())
        .collect();
    let fraction = fraction.trim();

    if whole_digits.is_empty() || fraction.is_empty() {
        return Err(PriceError::Empty);
    }

    if !whole_digits.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(PriceError::Malformed(format!("{}{}", whole.trim(), fraction)));
    }

    let joined = format!("{}.{}", whole_digits, fraction);
    Decimal::from_str(&joined).map_err(|_| PriceError::Malformed(joined))
}

/// Parses a reference ("was") price such as `$1,299.00`
///
/// The currency symbol shown next to the current price is stripped first,
/// then grouping separators.
pub fn parse_reference_price(text: &str, symbol: &str) -> Result<Decimal, PriceError> {
    let stripped = if symbol.is_empty() {
        text.to_string()
    } else {
        text.replace(symbol, "")
    };
    let cleaned: String = stripped
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(PriceError::Empty);
    }

    let well_formed = cleaned.chars().all(|c| c.is_ascii_digit() || c == '.')
        && cleaned.chars().filter(|c| *c == '.').count() <= 1
        && cleaned.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(PriceError::Malformed(text.trim().to_string()));
    }

    Decimal::from_str(&cleaned).map_err(|_| PriceError::Malformed(text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_with_grouping_and_stray_point() {
        let price = compose_price("1,234.", "99").unwrap();
        assert_eq!(price, Decimal::from_str("1234.99").unwrap());
    }

    #[test]
    fn test_compose_keeps_fraction_scale() {
        let price = compose_price("5", "00").unwrap();
        assert_eq!(price.to_string(), "5.00");
    }

    #[test]
    fn test_compose_strips_every_separator() {
        let price = compose_price("1,234,567.", "01").unwrap();
        assert_eq!(price.to_string(), "1234567.01");
    }

    #[test]
    fn test_compose_rejects_empty_parts() {
        assert_eq!(compose_price("", "99"), Err(PriceError::Empty));
        assert_eq!(compose_price(".", "99"), Err(PriceError::Empty));
        assert_eq!(compose_price("12", " "), Err(PriceError::Empty));
    }

    #[test]
    fn test_compose_rejects_non_numeric() {
        assert!(matches!(
            compose_price("Free", "00"),
            Err(PriceError::Malformed(_))
        ));
        assert!(matches!(
            compose_price("12", "9x"),
            Err(PriceError::Malformed(_))
        ));
    }

    #[test]
    fn test_reference_price_strips_symbol() {
        let price = parse_reference_price("$1,299.00", "$").unwrap();
        assert_eq!(price.to_string(), "1299.00");
    }

    #[test]
    fn test_reference_price_multichar_symbol() {
        let price = parse_reference_price("CA$24.50", "CA$").unwrap();
        assert_eq!(price.to_string(), "24.50");
    }

    #[test]
    fn test_reference_price_rejects_garbage() {
        assert!(parse_reference_price("List: $12.00", "$").is_err());
        assert!(parse_reference_price("$", "$").is_err());
        assert!(parse_reference_price("$1.2.3", "$").is_err());
        assert!(parse_reference_price("$.", "$").is_err());
    }
}
