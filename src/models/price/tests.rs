use super::*;

#[test]
fn test_parses_whole_and_fractional_amounts() {
    assert_eq!("12".parse::<Price>().unwrap().cents(), 1200);
    assert_eq!("12.5".parse::<Price>().unwrap().cents(), 1250);
    assert_eq!("12.50".parse::<Price>().unwrap().cents(), 1250);
    assert_eq!("0.05".parse::<Price>().unwrap().cents(), 5);
    assert_eq!(".75".parse::<Price>().unwrap().cents(), 75);
    assert_eq!("3.".parse::<Price>().unwrap().cents(), 300);
}

#[test]
fn test_parses_signs_and_surrounding_whitespace() {
    assert_eq!(" 9.99 ".parse::<Price>().unwrap().cents(), 999);
    assert_eq!("+1".parse::<Price>().unwrap().cents(), 100);
    assert_eq!("-2.25".parse::<Price>().unwrap().cents(), -225);
}

#[test]
fn test_rejects_non_numbers() {
    for input in ["", "   ", "abc", "1.2.3", "1e", "e5", "1e+", "1e5.0", "NaN", "-", ".", "12,50", "$5"] {
        assert_eq!(input.parse::<Price>(), Err(PriceError::Invalid), "input {:?}", input);
    }
}

#[test]
fn test_rejects_more_than_two_decimal_places() {
    assert_eq!("1.999".parse::<Price>(), Err(PriceError::TooManyDecimalPlaces(2)));
    // Trailing zeros still count as decimal places
    assert_eq!("1.500".parse::<Price>(), Err(PriceError::TooManyDecimalPlaces(2)));
}

#[test]
fn test_rejects_more_than_ten_digits() {
    assert_eq!("123456789.123".parse::<Price>(), Err(PriceError::TooManyDigits(10)));
}

#[test]
fn test_rejects_more_than_eight_whole_digits() {
    assert_eq!("123456789".parse::<Price>(), Err(PriceError::TooManyWholeDigits(8)));
    assert_eq!("99999999.99".parse::<Price>().unwrap().cents(), 9_999_999_999);
}

#[test]
fn test_leading_zeros_are_not_significant() {
    assert_eq!("000000000012.34".parse::<Price>().unwrap().cents(), 1234);
}

#[test]
fn test_display_always_has_two_places() {
    assert_eq!(Price::from_cents(1250).to_string(), "12.50");
    assert_eq!(Price::from_cents(7).to_string(), "0.07");
    assert_eq!(Price::from_cents(-105).to_string(), "-1.05");
    assert_eq!(Price::from_cents(0).to_string(), "0.00");
}

#[test]
fn test_serializes_as_decimal_string() {
    let json = serde_json::to_value(Price::from_cents(4200)).unwrap();
    assert_eq!(json, serde_json::json!("42.00"));

    let price: Price = serde_json::from_value(serde_json::json!("3.10")).unwrap();
    assert_eq!(price.cents(), 310);
}

#[test]
fn test_error_messages() {
    assert_eq!(PriceError::Invalid.to_string(), "A valid number is required.");
    assert_eq!(
        PriceError::TooManyWholeDigits(8).to_string(),
        "Ensure that there are no more than 8 digits before the decimal point."
    );
}

#[test]
fn test_parses_exponent_notation() {
    assert_eq!("1e5".parse::<Price>().unwrap().cents(), 10_000_000);
    assert_eq!("1.5E+3".parse::<Price>().unwrap().cents(), 150_000);
    assert_eq!("125e-2".parse::<Price>().unwrap().cents(), 125);
    assert_eq!("1000.0".parse::<Price>().unwrap().cents(), 100_000);
}

#[test]
fn test_exponent_counts_towards_precision() {
    assert_eq!("1e20".parse::<Price>(), Err(PriceError::TooManyDigits(10)));
    assert_eq!("1e8".parse::<Price>(), Err(PriceError::TooManyWholeDigits(8)));
    assert_eq!("1e-3".parse::<Price>(), Err(PriceError::TooManyDecimalPlaces(2)));
    assert_eq!("1e99999999999999999999".parse::<Price>(), Err(PriceError::TooManyDigits(10)));
}
