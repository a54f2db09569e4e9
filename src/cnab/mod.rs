//! Fixed-width plumbing for the CNAB 240 interchange format. Record layouts
//! live in the remessa and retorno modules; this module owns the line
//! builder and reader both of them share, so a slot written during encoding
//! is read back from the same columns during decoding.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{BoletoError, Result};
use crate::validation::FieldId;

pub mod remessa;
pub mod retorno;

pub(crate) const LINE_WIDTH: usize = 240;
pub(crate) const SICOOB_BANK_CODE: &str = "756";

// decode accepts \n and \r\n either way
#[cfg(windows)]
pub(crate) const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub(crate) const LINE_SEPARATOR: &str = "\n";

// record type column and its values
pub(crate) const REC_TYPE: Slot = slot(8, 8);
pub(crate) const REC_FILE_HEADER: char = '0';
pub(crate) const REC_BATCH_HEADER: char = '1';
pub(crate) const REC_DETAIL: char = '3';
pub(crate) const REC_BATCH_TRAILER: char = '5';
pub(crate) const REC_FILE_TRAILER: char = '9';

// segment letter and movement code columns of a detail record
pub(crate) const SEGMENT_COL: Slot = slot(14, 14);
pub(crate) const DETAIL_MOVE: Slot = slot(16, 17);

/// One field of a record layout, addressed by the 1-based inclusive column
/// numbers the printed standard uses.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Slot {
    pub start: usize,
    pub end: usize,
}

pub(crate) const fn slot(start: usize, end: usize) -> Slot {
    Slot { start, end }
}

impl Slot {
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.start - 1..self.end
    }
}

/// Strip accents, fold to uppercase ASCII and drop anything the format
/// cannot carry. Interchange files are plain ASCII end to end.
pub(crate) fn ascii_upper(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_uppercase()
            } else {
                ' '
            }
        })
        .collect()
}

/// Monetary value as zero-padded centavos. Negative or oversized values
/// never reach the line; there is no silent truncation anywhere in this
/// module.
pub(crate) fn amount_to_cents(value: Decimal, field: FieldId, width: usize) -> Result<String> {
    if value.is_sign_negative() {
        return Err(BoletoError::Validation(field));
    }
    let cents = (value * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or(BoletoError::FieldOverflow { field, width })?;
    let text = cents.to_string();
    if text.len() > width {
        return Err(BoletoError::FieldOverflow { field, width });
    }
    Ok(format!("{text:0>width$}"))
}

pub(crate) fn cents_to_amount(text: &str) -> Option<Decimal> {
    text.parse::<i64>().ok().map(|cents| Decimal::new(cents, 2))
}

pub(crate) fn date_to_ddmmyyyy(date: NaiveDate) -> String {
    date.format("%d%m%Y").to_string()
}

/// All-zero dates are the layout's way of spelling "absent".
pub(crate) fn parse_ddmmyyyy(text: &str) -> Option<NaiveDate> {
    if text.chars().all(|c| c == '0') {
        return None;
    }
    NaiveDate::parse_from_str(text, "%d%m%Y").ok()
}

pub(crate) struct LineBuilder {
    chars: Vec<char>,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self {
            chars: vec![' '; LINE_WIDTH],
        }
    }

    fn write(&mut self, slot: Slot, text: &str) {
        for (offset, c) in text.chars().enumerate() {
            self.chars[slot.start - 1 + offset] = c;
        }
    }

    /// Alphanumeric field, left-aligned and space-padded.
    pub fn put_alpha(&mut self, slot: Slot, field: FieldId, value: &str) -> Result<()> {
        let clean = ascii_upper(value);
        let width = slot.width();
        if clean.chars().count() > width {
            return Err(BoletoError::FieldOverflow { field, width });
        }
        self.write(slot, &format!("{clean:<width$}"));
        Ok(())
    }

    /// Numeric field, right-aligned and zero-padded. Only digits may land
    /// in a numeric slot.
    pub fn put_num(&mut self, slot: Slot, field: FieldId, value: &str) -> Result<()> {
        let clean = value.trim();
        if !clean.chars().all(|c| c.is_ascii_digit()) {
            return Err(BoletoError::Validation(field));
        }
        let width = slot.width();
        if clean.len() > width {
            return Err(BoletoError::FieldOverflow { field, width });
        }
        self.write(slot, &format!("{clean:0>width$}"));
        Ok(())
    }

    /// Numeric slot carried verbatim, for literals the layout fixes.
    pub fn put_literal(&mut self, slot: Slot, value: &str) {
        debug_assert_eq!(value.chars().count(), slot.width());
        self.write(slot, value);
    }

    pub fn finish(self) -> String {
        self.chars.into_iter().collect()
    }
}

#[derive(Debug)]
pub(crate) struct LineReader {
    chars: Vec<char>,
}

impl LineReader {
    pub fn new(line: &str, line_no: usize) -> Result<Self> {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() != LINE_WIDTH {
            return Err(BoletoError::StructuralDecode {
                line: line_no,
                reason: format!("expected {} positions, found {}", LINE_WIDTH, chars.len()),
            });
        }
        Ok(Self { chars })
    }

    pub fn take(&self, slot: Slot) -> String {
        self.chars[slot.range()].iter().collect()
    }

    pub fn take_char(&self, slot: Slot) -> char {
        self.chars[slot.start - 1]
    }

    /// Trimmed text, with the empty string collapsing to `None`.
    pub fn take_text(&self, slot: Slot) -> Option<String> {
        let text = self.take(slot);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Digits with leading zeroes stripped; all zeroes read as "0".
    pub fn take_digits(&self, slot: Slot) -> Option<String> {
        let text = self.take(slot);
        let text = text.trim();
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let stripped = text.trim_start_matches('0');
        if stripped.is_empty() {
            Some("0".to_string())
        } else {
            Some(stripped.to_string())
        }
    }
}
