//! Check digits and the due-date factor, the arithmetic every bank layout
//! leans on. All functions here are pure; callers feed them field values
//! already checked for presence.
use crate::error::{BoletoError, Result};
use crate::validation::{FieldId, fields};
use chrono::NaiveDate;

/// Weights applied left to right over agency + covenant + nosso numero.
pub const SICOOB_DIGIT_MULTIPLIERS: &[u32] = &[3, 1, 9, 7];

pub const FACTOR_FLOOR: i64 = 1000;
const FACTOR_CYCLE: i64 = 9000;

/// Day zero of the due-date factor; factor 1000 fell on 2000-07-03.
pub fn factor_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1997, 10, 7).unwrap()
}

/// Last day expressible from the original epoch, factor 9999.
pub fn factor_rollover() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 21).unwrap()
}

/// The day after the rollover, where the count restarts at 1000.
fn factor_restart() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 22).unwrap()
}

fn digit_values(value: &str, field: FieldId) -> Result<Vec<u32>> {
    value
        .chars()
        .map(|c| c.to_digit(10).ok_or(BoletoError::Validation(field)))
        .collect()
}

pub(crate) fn zero_pad(value: &str, width: usize, field: FieldId) -> Result<String> {
    if value.len() > width {
        return Err(BoletoError::FieldOverflow { field, width });
    }
    Ok(format!("{value:0>width$}"))
}

fn padded_digits(value: &str, width: usize, field: FieldId) -> Result<Vec<u32>> {
    digit_values(&zero_pad(value, width, field)?, field)
}

/// Nosso numero check digit for the Sicoob CNAB 240 layout. The weighted
/// sum runs over agency(4) + covenant(10) + nosso numero(7), weights
/// cycling from the leftmost position; remainders 0 and 1 collapse to 0.
pub fn sicoob_nosso_numero_digit(agency: &str, covenant: &str, nosso_numero: &str) -> Result<u32> {
    let mut digits = padded_digits(agency, 4, fields::BENEFICIARY_AGENCY)?;
    digits.extend(padded_digits(covenant, 10, fields::BENEFICIARY_COVENANT)?);
    digits.extend(padded_digits(
        nosso_numero,
        7,
        fields::BENEFICIARY_NOSSO_NUMERO,
    )?);

    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * SICOOB_DIGIT_MULTIPLIERS[i % SICOOB_DIGIT_MULTIPLIERS.len()])
        .sum();

    let remainder = sum % 11;
    Ok(if remainder < 2 { 0 } else { 11 - remainder })
}

/// Nosso numero check digit for the Bradesco layout, carteira(2) + nosso
/// numero(11), weights 2 through 7 cycling from the rightmost position.
/// Remainder 1 maps to the literal 'P'.
pub fn bradesco_nosso_numero_digit(carteira: &str, nosso_numero: &str) -> Result<char> {
    let mut digits = padded_digits(carteira, 2, fields::BENEFICIARY_CARTEIRA)?;
    digits.extend(padded_digits(
        nosso_numero,
        11,
        fields::BENEFICIARY_NOSSO_NUMERO,
    )?);

    let mut weight = 2;
    let mut sum = 0;
    for d in digits.iter().rev() {
        sum += d * weight;
        weight = if weight == 7 { 2 } else { weight + 1 };
    }

    Ok(match sum % 11 {
        0 => '0',
        1 => 'P',
        r => char::from_digit(11 - r, 10).unwrap(),
    })
}

/// General check digit of a 44-position barcode, computed over the other
/// 43 positions. Results 0, 10 and 11 all collapse to 1.
pub fn general_barcode_digit(body: &str) -> Result<u32> {
    let digits = digit_values(body, fields::BARCODE)?;
    if digits.len() != 43 {
        return Err(BoletoError::Validation(fields::BARCODE));
    }

    let mut weight = 2;
    let mut sum = 0;
    for d in digits.iter().rev() {
        sum += d * weight;
        weight = if weight == 9 { 2 } else { weight + 1 };
    }

    let digit = 11 - sum % 11;
    Ok(if digit > 9 { 1 } else { digit })
}

/// Check digit of one digitable-line field, modulo 10 with weights 2 and 1
/// from the rightmost position; two-digit products have their digits summed.
pub fn digitable_field_digit(value: &str) -> Result<u32> {
    let digits = digit_values(value, fields::DIGITABLE_LINE)?;

    let mut weight = 2;
    let mut sum = 0;
    for d in digits.iter().rev() {
        let mut product = d * weight;
        if product > 9 {
            product -= 9;
        }
        sum += product;
        weight = if weight == 2 { 1 } else { 2 };
    }

    Ok((10 - sum % 10) % 10)
}

/// Four-digit due-date factor. Dates up to the rollover count days from the
/// 1997 epoch; later dates restart at 1000 and wrap every 9000 days. Dates
/// before the epoch yield the "0000" sentinel.
pub fn due_date_factor(due_date: NaiveDate) -> String {
    if due_date > factor_rollover() {
        let days = (due_date - factor_restart()).num_days();
        format!("{:04}", FACTOR_FLOOR + days % FACTOR_CYCLE)
    } else {
        let days = (due_date - factor_epoch()).num_days();
        if days < 0 {
            "0000".to_string()
        } else {
            format!("{days:04}")
        }
    }
}
