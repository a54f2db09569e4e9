//! Return files sent back by the bank. Only detail records carry payment
//! information; headers and trailers are checked for shape and skipped.
//! Each T and U line becomes one entry, so callers see settlements as a
//! T and U pair sharing a movement code.
use rust_decimal::Decimal;

use super::{
    DETAIL_MOVE, LineReader, REC_BATCH_HEADER, REC_BATCH_TRAILER, REC_DETAIL, REC_FILE_HEADER,
    REC_FILE_TRAILER, REC_TYPE, SEGMENT_COL, Slot, cents_to_amount, parse_ddmmyyyy, slot,
};
use crate::error::{BoletoError, Result};
use crate::model::{ReturnEntry, RetornoSegment};

// segment T, the title being reported
const T_AGENCY: Slot = slot(18, 22);
const T_ACCOUNT: Slot = slot(24, 35);
const T_NOSSO: Slot = slot(38, 44);
const T_CARTEIRA: Slot = slot(58, 58);
const T_DOC_NUMBER: Slot = slot(59, 73);
const T_DUE_DATE: Slot = slot(74, 81);
const T_AMOUNT: Slot = slot(82, 96);
const T_FEE: Slot = slot(131, 145);

// segment U, the money that moved
const U_INTEREST: Slot = slot(18, 32);
const U_DISCOUNT: Slot = slot(33, 47);
const U_PAID: Slot = slot(78, 92);
const U_NET: Slot = slot(93, 107);
const U_OCCURRENCE_DATE: Slot = slot(138, 145);
const U_CREDIT_DATE: Slot = slot(146, 153);

/// Movement codes the bank reports, with the descriptions printed in the
/// cooperative's manual.
const MOVEMENT_DESCRIPTIONS: &[(&str, &str)] = &[
    ("02", "Entrada confirmada"),
    ("03", "Entrada rejeitada"),
    ("04", "Transferência de carteira/entrada"),
    ("06", "Liquidação"),
    ("09", "Baixa"),
    ("12", "Abatimento concedido"),
    ("13", "Abatimento cancelado"),
    ("14", "Vencimento alterado"),
    ("17", "Liquidação após baixa"),
    ("19", "Confirmação de instrução de protesto"),
    ("20", "Confirmação de sustação de protesto"),
    ("23", "Remessa a cartório"),
    ("27", "Confirmação de alteração de dados"),
    ("28", "Débito de tarifas/custas"),
    ("30", "Alteração de dados rejeitada"),
];

pub fn occurrence_description(code: &str) -> Option<&'static str> {
    MOVEMENT_DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, description)| *description)
}

/// Monetary slot where all zeroes means "nothing happened here".
fn value_or_none(reader: &LineReader, slot: Slot) -> Option<Decimal> {
    cents_to_amount(&reader.take(slot)).filter(|v| !v.is_zero())
}

fn decode_t(reader: &LineReader) -> ReturnEntry {
    let movement = reader.take(DETAIL_MOVE);
    let mut entry = ReturnEntry::new(RetornoSegment::T, movement.clone());
    entry.occurrence = occurrence_description(&movement).map(str::to_string);
    entry.agency = reader.take_digits(T_AGENCY);
    entry.account = reader.take_digits(T_ACCOUNT);
    entry.carteira = reader.take_text(T_CARTEIRA);
    entry.nosso_numero = reader.take_digits(T_NOSSO);
    entry.document_number = reader.take_text(T_DOC_NUMBER);
    entry.due_date = parse_ddmmyyyy(&reader.take(T_DUE_DATE));
    entry.nominal_value = value_or_none(reader, T_AMOUNT);
    entry.fee_value = value_or_none(reader, T_FEE);
    entry
}

fn decode_u(reader: &LineReader) -> ReturnEntry {
    let movement = reader.take(DETAIL_MOVE);
    let mut entry = ReturnEntry::new(RetornoSegment::U, movement.clone());
    entry.occurrence = occurrence_description(&movement).map(str::to_string);
    entry.interest_value = value_or_none(reader, U_INTEREST);
    entry.discount_value = value_or_none(reader, U_DISCOUNT);
    entry.paid_value = value_or_none(reader, U_PAID);
    entry.net_value = value_or_none(reader, U_NET);
    entry.occurrence_date = parse_ddmmyyyy(&reader.take(U_OCCURRENCE_DATE));
    entry.credit_date = parse_ddmmyyyy(&reader.take(U_CREDIT_DATE));
    entry
}

/// Decode a return file into one entry per detail line. Any structural
/// defect aborts the whole import; no partial list ever escapes.
pub fn decode_retorno(text: &str) -> Result<Vec<ReturnEntry>> {
    let mut entries = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        if raw.is_empty() {
            continue;
        }
        let reader = LineReader::new(raw, line_no)?;
        match reader.take_char(REC_TYPE) {
            REC_FILE_HEADER | REC_BATCH_HEADER | REC_BATCH_TRAILER | REC_FILE_TRAILER => {}
            REC_DETAIL => match reader.take_char(SEGMENT_COL) {
                'T' => entries.push(decode_t(&reader)),
                'U' => entries.push(decode_u(&reader)),
                other => {
                    return Err(BoletoError::StructuralDecode {
                        line: line_no,
                        reason: format!("unknown segment '{other}'"),
                    });
                }
            },
            other => {
                return Err(BoletoError::StructuralDecode {
                    line: line_no,
                    reason: format!("unknown record type '{other}'"),
                });
            }
        }
    }
    Ok(entries)
}
