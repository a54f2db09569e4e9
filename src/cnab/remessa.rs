//! Remittance batches: one file header, one batch, segments P, Q and R per
//! title, then the two trailers carrying record counts and amount totals.
//! Decoding walks the same column constants, so a generated file reads back
//! into the documents it came from.
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::{
    DETAIL_MOVE, LINE_SEPARATOR, LineBuilder, LineReader, REC_BATCH_HEADER, REC_BATCH_TRAILER,
    REC_DETAIL, REC_FILE_HEADER, REC_FILE_TRAILER, REC_TYPE, SEGMENT_COL, SICOOB_BANK_CODE, Slot,
    amount_to_cents, cents_to_amount, date_to_ddmmyyyy, parse_ddmmyyyy, slot,
};
use crate::digits::sicoob_nosso_numero_digit;
use crate::error::{BoletoError, Result};
use crate::model::{Beneficiary, Boleto, ChargePolicy, Payer};
use crate::validation::{FieldId, fields};

const BANK: Slot = slot(1, 3);
const LOT: Slot = slot(4, 7);

// file header
const FH_COMPANY_KIND: Slot = slot(18, 18);
const FH_COMPANY_DOC: Slot = slot(19, 32);
const FH_COVENANT: Slot = slot(33, 52);
const FH_AGENCY: Slot = slot(53, 57);
const FH_AGENCY_DV: Slot = slot(58, 58);
const FH_ACCOUNT: Slot = slot(59, 70);
const FH_ACCOUNT_DV: Slot = slot(71, 71);
const FH_COMPANY_NAME: Slot = slot(73, 102);
const FH_BANK_NAME: Slot = slot(103, 132);
const FH_DIRECTION: Slot = slot(143, 143);
const FH_GEN_DATE: Slot = slot(144, 151);
const FH_GEN_TIME: Slot = slot(152, 157);
const FH_SEQUENCE: Slot = slot(158, 163);
const FH_LAYOUT: Slot = slot(164, 166);
const FH_DENSITY: Slot = slot(167, 171);

// batch header
const BH_OPERATION: Slot = slot(9, 9);
const BH_SERVICE: Slot = slot(10, 11);
const BH_LAYOUT: Slot = slot(14, 16);
const BH_COMPANY_KIND: Slot = slot(18, 18);
const BH_COMPANY_DOC: Slot = slot(19, 33);
const BH_COVENANT: Slot = slot(34, 53);
const BH_AGENCY: Slot = slot(54, 58);
const BH_AGENCY_DV: Slot = slot(59, 59);
const BH_ACCOUNT: Slot = slot(60, 71);
const BH_ACCOUNT_DV: Slot = slot(72, 72);
const BH_COMPANY_NAME: Slot = slot(74, 103);
const BH_REMESSA_NUMBER: Slot = slot(184, 191);
const BH_GEN_DATE: Slot = slot(192, 199);
const BH_CREDIT_DATE: Slot = slot(200, 207);

// detail segments share the first columns
const DETAIL_SEQ: Slot = slot(9, 13);
const ENTRY_MOVEMENT: &str = "01";

// segment P
const P_AGENCY: Slot = slot(18, 22);
const P_AGENCY_DV: Slot = slot(23, 23);
const P_ACCOUNT: Slot = slot(24, 35);
const P_ACCOUNT_DV: Slot = slot(36, 36);
const P_NOSSO: Slot = slot(38, 44);
const P_NOSSO_DV: Slot = slot(45, 45);
const P_INSTALLMENT: Slot = slot(46, 47);
const P_CARTEIRA: Slot = slot(58, 58);
const P_REGISTRATION: Slot = slot(59, 59);
const P_DOC_KIND: Slot = slot(60, 60);
const P_ISSUER: Slot = slot(61, 61);
const P_DISTRIBUTION: Slot = slot(62, 62);
const P_DOC_NUMBER: Slot = slot(63, 77);
const P_DUE_DATE: Slot = slot(78, 85);
const P_AMOUNT: Slot = slot(86, 100);
const P_COLLECT_AGENCY: Slot = slot(101, 105);
const P_SPECIES: Slot = slot(107, 108);
const P_ACCEPT: Slot = slot(109, 109);
const P_ISSUE_DATE: Slot = slot(110, 117);
const P_INTEREST_CODE: Slot = slot(118, 118);
const P_INTEREST_DATE: Slot = slot(119, 126);
const P_INTEREST_VALUE: Slot = slot(127, 141);
const P_DISCOUNT_CODE: Slot = slot(142, 142);
const P_DISCOUNT_DATE: Slot = slot(143, 150);
const P_DISCOUNT_VALUE: Slot = slot(151, 165);
const P_IOF: Slot = slot(166, 180);
const P_REBATE: Slot = slot(181, 195);
const P_PAYER_CODE: Slot = slot(196, 220);
const P_PROTEST_CODE: Slot = slot(221, 221);
const P_PROTEST_DAYS: Slot = slot(222, 223);
const P_WRITE_OFF: Slot = slot(224, 224);
const P_WRITE_OFF_DAYS: Slot = slot(225, 227);
const P_CURRENCY: Slot = slot(228, 229);
const P_CONTRACT: Slot = slot(230, 239);

// segment Q
const Q_PAYER_KIND: Slot = slot(18, 18);
const Q_PAYER_DOC: Slot = slot(19, 33);
const Q_PAYER_NAME: Slot = slot(34, 73);
const Q_STREET: Slot = slot(74, 103);
const Q_NUMBER: Slot = slot(104, 113);
const Q_NEIGHBORHOOD: Slot = slot(114, 128);
const Q_POSTAL: Slot = slot(129, 136);
const Q_CITY: Slot = slot(137, 151);
const Q_STATE: Slot = slot(152, 153);
const Q_GUARANTOR_KIND: Slot = slot(154, 154);
const Q_GUARANTOR_DOC: Slot = slot(155, 169);
const Q_CORR_BANK: Slot = slot(210, 212);

// segment R
const R_DISCOUNT2_CODE: Slot = slot(18, 18);
const R_DISCOUNT2_DATE: Slot = slot(19, 26);
const R_DISCOUNT2_VALUE: Slot = slot(27, 41);
const R_DISCOUNT3_CODE: Slot = slot(42, 42);
const R_DISCOUNT3_DATE: Slot = slot(43, 50);
const R_DISCOUNT3_VALUE: Slot = slot(51, 65);
const R_FINE_CODE: Slot = slot(66, 66);
const R_FINE_DATE: Slot = slot(67, 74);
const R_FINE_VALUE: Slot = slot(75, 89);
const R_MESSAGE3: Slot = slot(100, 139);
const R_MESSAGE4: Slot = slot(140, 179);

// batch trailer
const BT_RECORD_COUNT: Slot = slot(18, 23);
const BT_TITLE_COUNT: Slot = slot(24, 29);
const BT_TOTAL: Slot = slot(30, 46);

// file trailer
const FT_BATCH_COUNT: Slot = slot(18, 23);
const FT_RECORD_COUNT: Slot = slot(24, 29);

const FILE_LOT: &str = "0000";
const BATCH_LOT: &str = "0001";
const TRAILER_LOT: &str = "9999";
const LAYOUT_FILE: &str = "081";
const LAYOUT_BATCH: &str = "040";

const SPECIES_CODES: &[(&str, &str)] = &[
    ("DM", "02"),
    ("DMI", "03"),
    ("DS", "04"),
    ("DSI", "05"),
    ("DR", "06"),
    ("NP", "12"),
    ("RC", "17"),
    ("OU", "99"),
];

const CURRENCY_REAL: &str = "09";

fn species_to_code(species: &str) -> Result<&'static str> {
    SPECIES_CODES
        .iter()
        .find(|(name, _)| *name == species)
        .map(|(_, code)| *code)
        .ok_or(BoletoError::Validation(fields::DOCUMENT_SPECIES))
}

fn code_to_species(code: &str) -> Option<&'static str> {
    SPECIES_CODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

fn required_text<'a>(value: &'a Option<String>, field: FieldId) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(BoletoError::Validation(field))
}

fn required_date(value: Option<NaiveDate>, field: FieldId) -> Result<NaiveDate> {
    value.ok_or(BoletoError::Validation(field))
}

fn required_amount(value: Option<Decimal>, field: FieldId) -> Result<Decimal> {
    value.ok_or(BoletoError::Validation(field))
}

fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// '1' marks a natural person, '2' a company, decided by document length.
fn inscription_kind(document_digits: &str) -> &'static str {
    if document_digits.len() > 11 { "2" } else { "1" }
}

fn encode_policy(
    policy: &ChargePolicy,
    due_date: NaiveDate,
    absent_code: &'static str,
    backwards: bool,
    field: FieldId,
) -> Result<(&'static str, String, String)> {
    let (code, magnitude, days) = match policy {
        ChargePolicy::None => {
            return Ok((absent_code, "00000000".to_string(), "0".repeat(15)));
        }
        ChargePolicy::Fixed { value, after_days } => ("1", *value, *after_days),
        ChargePolicy::Percentage { rate, after_days } => ("2", *rate, *after_days),
    };
    // day counts that no calendar date can absorb are field errors, not panics
    let delta = Duration::try_days(days).ok_or(BoletoError::Validation(field))?;
    let date = if backwards {
        due_date.checked_sub_signed(delta)
    } else {
        due_date.checked_add_signed(delta)
    }
    .ok_or(BoletoError::Validation(field))?;
    Ok((code, date_to_ddmmyyyy(date), amount_to_cents(magnitude, field, 15)?))
}

fn decode_policy(
    code: char,
    date_text: &str,
    value_text: &str,
    due_date: Option<NaiveDate>,
    backwards: bool,
) -> ChargePolicy {
    let value = cents_to_amount(value_text).unwrap_or_default();
    let after_days = match (parse_ddmmyyyy(date_text), due_date) {
        (Some(date), Some(due)) => {
            if backwards {
                (due - date).num_days()
            } else {
                (date - due).num_days()
            }
        }
        _ => 0,
    };
    match code {
        '1' => ChargePolicy::Fixed { value, after_days },
        '2' => ChargePolicy::Percentage {
            rate: value,
            after_days,
        },
        _ => ChargePolicy::None,
    }
}

fn file_header(
    beneficiary: &Beneficiary,
    generated_at: NaiveDateTime,
    file_sequence: u32,
) -> Result<String> {
    let mut line = LineBuilder::new();
    line.put_literal(BANK, SICOOB_BANK_CODE);
    line.put_literal(LOT, FILE_LOT);
    line.put_literal(REC_TYPE, &REC_FILE_HEADER.to_string());

    let document = only_digits(required_text(
        &beneficiary.document,
        fields::BENEFICIARY_DOCUMENT,
    )?);
    line.put_literal(FH_COMPANY_KIND, inscription_kind(&document));
    line.put_num(FH_COMPANY_DOC, fields::BENEFICIARY_DOCUMENT, &document)?;
    line.put_num(
        FH_COVENANT,
        fields::BENEFICIARY_COVENANT,
        required_text(&beneficiary.covenant, fields::BENEFICIARY_COVENANT)?,
    )?;
    line.put_num(
        FH_AGENCY,
        fields::BENEFICIARY_AGENCY,
        required_text(&beneficiary.agency, fields::BENEFICIARY_AGENCY)?,
    )?;
    line.put_alpha(
        FH_AGENCY_DV,
        fields::BENEFICIARY_AGENCY_DIGIT,
        beneficiary.agency_digit.as_deref().unwrap_or(""),
    )?;
    line.put_num(
        FH_ACCOUNT,
        fields::BENEFICIARY_ACCOUNT,
        required_text(&beneficiary.account, fields::BENEFICIARY_ACCOUNT)?,
    )?;
    line.put_alpha(
        FH_ACCOUNT_DV,
        fields::BENEFICIARY_ACCOUNT_DIGIT,
        beneficiary.account_digit.as_deref().unwrap_or(""),
    )?;
    line.put_alpha(
        FH_COMPANY_NAME,
        fields::BENEFICIARY_NAME,
        required_text(&beneficiary.name, fields::BENEFICIARY_NAME)?,
    )?;
    line.put_alpha(FH_BANK_NAME, fields::BENEFICIARY_NAME, "SICOOB")?;
    line.put_literal(FH_DIRECTION, "1");
    line.put_literal(FH_GEN_DATE, &date_to_ddmmyyyy(generated_at.date()));
    line.put_literal(FH_GEN_TIME, &generated_at.format("%H%M%S").to_string());
    line.put_num(FH_SEQUENCE, fields::DOCUMENTS, &file_sequence.to_string())?;
    line.put_literal(FH_LAYOUT, LAYOUT_FILE);
    line.put_literal(FH_DENSITY, "00000");
    Ok(line.finish())
}

fn batch_header(
    beneficiary: &Beneficiary,
    generated_at: NaiveDateTime,
    file_sequence: u32,
) -> Result<String> {
    let mut line = LineBuilder::new();
    line.put_literal(BANK, SICOOB_BANK_CODE);
    line.put_literal(LOT, BATCH_LOT);
    line.put_literal(REC_TYPE, &REC_BATCH_HEADER.to_string());
    line.put_literal(BH_OPERATION, "R");
    line.put_literal(BH_SERVICE, "01");
    line.put_literal(BH_LAYOUT, LAYOUT_BATCH);

    let document = only_digits(required_text(
        &beneficiary.document,
        fields::BENEFICIARY_DOCUMENT,
    )?);
    line.put_literal(BH_COMPANY_KIND, inscription_kind(&document));
    line.put_num(BH_COMPANY_DOC, fields::BENEFICIARY_DOCUMENT, &document)?;
    line.put_num(
        BH_COVENANT,
        fields::BENEFICIARY_COVENANT,
        required_text(&beneficiary.covenant, fields::BENEFICIARY_COVENANT)?,
    )?;
    line.put_num(
        BH_AGENCY,
        fields::BENEFICIARY_AGENCY,
        required_text(&beneficiary.agency, fields::BENEFICIARY_AGENCY)?,
    )?;
    line.put_alpha(
        BH_AGENCY_DV,
        fields::BENEFICIARY_AGENCY_DIGIT,
        beneficiary.agency_digit.as_deref().unwrap_or(""),
    )?;
    line.put_num(
        BH_ACCOUNT,
        fields::BENEFICIARY_ACCOUNT,
        required_text(&beneficiary.account, fields::BENEFICIARY_ACCOUNT)?,
    )?;
    line.put_alpha(
        BH_ACCOUNT_DV,
        fields::BENEFICIARY_ACCOUNT_DIGIT,
        beneficiary.account_digit.as_deref().unwrap_or(""),
    )?;
    line.put_alpha(
        BH_COMPANY_NAME,
        fields::BENEFICIARY_NAME,
        required_text(&beneficiary.name, fields::BENEFICIARY_NAME)?,
    )?;
    line.put_num(
        BH_REMESSA_NUMBER,
        fields::DOCUMENTS,
        &file_sequence.to_string(),
    )?;
    line.put_literal(BH_GEN_DATE, &date_to_ddmmyyyy(generated_at.date()));
    line.put_literal(BH_CREDIT_DATE, "00000000");
    Ok(line.finish())
}

fn detail_prefix(line: &mut LineBuilder, sequence: u32, segment: char) -> Result<()> {
    line.put_literal(BANK, SICOOB_BANK_CODE);
    line.put_literal(LOT, BATCH_LOT);
    line.put_literal(REC_TYPE, &REC_DETAIL.to_string());
    line.put_num(DETAIL_SEQ, fields::DOCUMENTS, &sequence.to_string())?;
    line.put_literal(SEGMENT_COL, &segment.to_string());
    line.put_literal(DETAIL_MOVE, ENTRY_MOVEMENT);
    Ok(())
}

fn segment_p(boleto: &Boleto, sequence: u32) -> Result<String> {
    let beneficiary = &boleto.beneficiary;
    let mut line = LineBuilder::new();
    detail_prefix(&mut line, sequence, 'P')?;

    let agency = required_text(&beneficiary.agency, fields::BENEFICIARY_AGENCY)?;
    let covenant = required_text(&beneficiary.covenant, fields::BENEFICIARY_COVENANT)?;
    let nosso_numero = required_text(&beneficiary.nosso_numero, fields::BENEFICIARY_NOSSO_NUMERO)?;
    let digit = sicoob_nosso_numero_digit(agency, covenant, nosso_numero)?;
    if let Some(supplied) = &beneficiary.nosso_numero_digit {
        if supplied.trim() != digit.to_string() {
            return Err(BoletoError::Validation(
                fields::BENEFICIARY_NOSSO_NUMERO_DIGIT,
            ));
        }
    }

    line.put_num(P_AGENCY, fields::BENEFICIARY_AGENCY, agency)?;
    line.put_alpha(
        P_AGENCY_DV,
        fields::BENEFICIARY_AGENCY_DIGIT,
        beneficiary.agency_digit.as_deref().unwrap_or(""),
    )?;
    line.put_num(
        P_ACCOUNT,
        fields::BENEFICIARY_ACCOUNT,
        required_text(&beneficiary.account, fields::BENEFICIARY_ACCOUNT)?,
    )?;
    line.put_alpha(
        P_ACCOUNT_DV,
        fields::BENEFICIARY_ACCOUNT_DIGIT,
        beneficiary.account_digit.as_deref().unwrap_or(""),
    )?;
    line.put_num(P_NOSSO, fields::BENEFICIARY_NOSSO_NUMERO, nosso_numero)?;
    line.put_literal(P_NOSSO_DV, &digit.to_string());
    line.put_literal(P_INSTALLMENT, "01");
    line.put_num(
        P_CARTEIRA,
        fields::BENEFICIARY_CARTEIRA,
        beneficiary.carteira.as_deref().unwrap_or("1"),
    )?;
    line.put_literal(P_REGISTRATION, "1");
    line.put_literal(P_DOC_KIND, "1");
    line.put_literal(P_ISSUER, "2");
    line.put_literal(P_DISTRIBUTION, "2");
    line.put_alpha(
        P_DOC_NUMBER,
        fields::DOCUMENT_NUMBER,
        required_text(&boleto.document_number, fields::DOCUMENT_NUMBER)?,
    )?;

    let due_date = required_date(boleto.due_date, fields::DUE_DATE)?;
    line.put_literal(P_DUE_DATE, &date_to_ddmmyyyy(due_date));
    let amount = required_amount(boleto.amount, fields::AMOUNT)?;
    line.put_literal(
        P_AMOUNT,
        &amount_to_cents(amount, fields::AMOUNT, P_AMOUNT.width())?,
    );
    line.put_literal(P_COLLECT_AGENCY, "00000");
    line.put_literal(
        P_SPECIES,
        species_to_code(required_text(
            &boleto.document_species,
            fields::DOCUMENT_SPECIES,
        )?)?,
    );
    line.put_literal(P_ACCEPT, if boleto.accept { "A" } else { "N" });
    line.put_literal(
        P_ISSUE_DATE,
        &date_to_ddmmyyyy(required_date(boleto.issue_date, fields::ISSUE_DATE)?),
    );

    let (code, date, value) =
        encode_policy(&boleto.interest, due_date, "3", false, fields::INTEREST)?;
    line.put_literal(P_INTEREST_CODE, code);
    line.put_literal(P_INTEREST_DATE, &date);
    line.put_literal(P_INTEREST_VALUE, &value);

    let (code, date, value) =
        encode_policy(&boleto.discount, due_date, "0", true, fields::DISCOUNT)?;
    line.put_literal(P_DISCOUNT_CODE, code);
    line.put_literal(P_DISCOUNT_DATE, &date);
    line.put_literal(P_DISCOUNT_VALUE, &value);

    line.put_literal(P_IOF, &"0".repeat(15));
    line.put_literal(P_REBATE, &"0".repeat(15));
    line.put_alpha(
        P_PAYER_CODE,
        fields::PAYER_CODE,
        boleto.payer.code.as_deref().unwrap_or(""),
    )?;
    line.put_literal(P_PROTEST_CODE, if boleto.protest { "1" } else { "3" });
    if boleto.protest {
        line.put_num(
            P_PROTEST_DAYS,
            fields::DOCUMENTS,
            &boleto.protest_days.to_string(),
        )?;
    } else {
        line.put_literal(P_PROTEST_DAYS, "00");
    }
    line.put_literal(P_WRITE_OFF, "2");
    line.put_literal(P_WRITE_OFF_DAYS, "000");
    match boleto.currency_species.as_deref() {
        None | Some("REAL") => line.put_literal(P_CURRENCY, CURRENCY_REAL),
        Some(_) => return Err(BoletoError::Validation(fields::CURRENCY_SPECIES)),
    }
    line.put_literal(P_CONTRACT, &"0".repeat(10));
    Ok(line.finish())
}

fn segment_q(boleto: &Boleto, sequence: u32) -> Result<String> {
    let payer = &boleto.payer;
    let mut line = LineBuilder::new();
    detail_prefix(&mut line, sequence, 'Q')?;

    let document = only_digits(required_text(&payer.document, fields::PAYER_DOCUMENT)?);
    line.put_literal(Q_PAYER_KIND, inscription_kind(&document));
    line.put_num(Q_PAYER_DOC, fields::PAYER_DOCUMENT, &document)?;
    line.put_alpha(
        Q_PAYER_NAME,
        fields::PAYER_NAME,
        required_text(&payer.name, fields::PAYER_NAME)?,
    )?;
    line.put_alpha(
        Q_STREET,
        fields::PAYER_STREET,
        required_text(&payer.address.street, fields::PAYER_STREET)?,
    )?;
    line.put_alpha(
        Q_NUMBER,
        fields::PAYER_NUMBER,
        payer.address.number.as_deref().unwrap_or(""),
    )?;
    line.put_alpha(
        Q_NEIGHBORHOOD,
        fields::PAYER_NEIGHBORHOOD,
        required_text(&payer.address.neighborhood, fields::PAYER_NEIGHBORHOOD)?,
    )?;
    line.put_num(
        Q_POSTAL,
        fields::PAYER_POSTAL_CODE,
        &only_digits(required_text(
            &payer.address.postal_code,
            fields::PAYER_POSTAL_CODE,
        )?),
    )?;
    line.put_alpha(
        Q_CITY,
        fields::PAYER_CITY,
        required_text(&payer.address.city, fields::PAYER_CITY)?,
    )?;
    line.put_alpha(
        Q_STATE,
        fields::PAYER_STATE,
        required_text(&payer.address.state, fields::PAYER_STATE)?,
    )?;
    line.put_literal(Q_GUARANTOR_KIND, "0");
    line.put_literal(Q_GUARANTOR_DOC, &"0".repeat(15));
    line.put_literal(Q_CORR_BANK, "000");
    Ok(line.finish())
}

fn segment_r(boleto: &Boleto, sequence: u32) -> Result<String> {
    let mut line = LineBuilder::new();
    detail_prefix(&mut line, sequence, 'R')?;

    let due_date = required_date(boleto.due_date, fields::DUE_DATE)?;
    line.put_literal(R_DISCOUNT2_CODE, "0");
    line.put_literal(R_DISCOUNT2_DATE, "00000000");
    line.put_literal(R_DISCOUNT2_VALUE, &"0".repeat(15));
    line.put_literal(R_DISCOUNT3_CODE, "0");
    line.put_literal(R_DISCOUNT3_DATE, "00000000");
    line.put_literal(R_DISCOUNT3_VALUE, &"0".repeat(15));

    let (code, date, value) = encode_policy(&boleto.fine, due_date, "0", false, fields::FINE)?;
    line.put_literal(R_FINE_CODE, code);
    line.put_literal(R_FINE_DATE, &date);
    line.put_literal(R_FINE_VALUE, &value);

    let mut messages = boleto.instructions.iter();
    line.put_alpha(
        R_MESSAGE3,
        fields::INSTRUCTIONS,
        messages.next().map(String::as_str).unwrap_or(""),
    )?;
    line.put_alpha(
        R_MESSAGE4,
        fields::INSTRUCTIONS,
        messages.next().map(String::as_str).unwrap_or(""),
    )?;
    Ok(line.finish())
}

fn batch_trailer(record_count: u32, title_count: u32, total: Decimal) -> Result<String> {
    let mut line = LineBuilder::new();
    line.put_literal(BANK, SICOOB_BANK_CODE);
    line.put_literal(LOT, BATCH_LOT);
    line.put_literal(REC_TYPE, &REC_BATCH_TRAILER.to_string());
    line.put_num(BT_RECORD_COUNT, fields::DOCUMENTS, &record_count.to_string())?;
    line.put_num(BT_TITLE_COUNT, fields::DOCUMENTS, &title_count.to_string())?;
    line.put_literal(
        BT_TOTAL,
        &amount_to_cents(total, fields::AMOUNT, BT_TOTAL.width())?,
    );
    Ok(line.finish())
}

fn file_trailer(record_count: u32) -> Result<String> {
    let mut line = LineBuilder::new();
    line.put_literal(BANK, SICOOB_BANK_CODE);
    line.put_literal(LOT, TRAILER_LOT);
    line.put_literal(REC_TYPE, &REC_FILE_TRAILER.to_string());
    line.put_num(FT_BATCH_COUNT, fields::DOCUMENTS, "1")?;
    line.put_num(FT_RECORD_COUNT, fields::DOCUMENTS, &record_count.to_string())?;
    Ok(line.finish())
}

/// Encode one batch of titles into a complete remittance file. The first
/// document's beneficiary identifies the company in the headers, so a batch
/// always belongs to a single account holder.
pub fn encode_remessa(
    boletos: &[Boleto],
    generated_at: NaiveDateTime,
    file_sequence: u32,
) -> Result<String> {
    let first = boletos
        .first()
        .ok_or(BoletoError::Validation(fields::DOCUMENTS))?;

    let mut lines = Vec::with_capacity(boletos.len() * 3 + 4);
    lines.push(file_header(&first.beneficiary, generated_at, file_sequence)?);
    lines.push(batch_header(&first.beneficiary, generated_at, file_sequence)?);

    let mut sequence = 0;
    let mut total = Decimal::ZERO;
    for boleto in boletos {
        sequence += 1;
        lines.push(segment_p(boleto, sequence)?);
        sequence += 1;
        lines.push(segment_q(boleto, sequence)?);
        sequence += 1;
        lines.push(segment_r(boleto, sequence)?);
        total += required_amount(boleto.amount, fields::AMOUNT)?;
    }

    let title_count = boletos.len() as u32;
    lines.push(batch_trailer(title_count * 3 + 2, title_count, total)?);
    lines.push(file_trailer(title_count * 3 + 4)?);

    let mut text = lines.join(LINE_SEPARATOR);
    text.push_str(LINE_SEPARATOR);
    Ok(text)
}

#[derive(Default)]
struct CompanyInfo {
    name: Option<String>,
    document: Option<String>,
    covenant: Option<String>,
}

fn mismatch(line: usize, reason: String) -> BoletoError {
    BoletoError::StructuralDecode { line, reason }
}

fn decode_segment_p(reader: &LineReader, company: &CompanyInfo) -> Boleto {
    let due_date = parse_ddmmyyyy(&reader.take(P_DUE_DATE));
    let interest = decode_policy(
        reader.take_char(P_INTEREST_CODE),
        &reader.take(P_INTEREST_DATE),
        &reader.take(P_INTEREST_VALUE),
        due_date,
        false,
    );
    let discount = decode_policy(
        reader.take_char(P_DISCOUNT_CODE),
        &reader.take(P_DISCOUNT_DATE),
        &reader.take(P_DISCOUNT_VALUE),
        due_date,
        true,
    );
    let protest = reader.take_char(P_PROTEST_CODE) == '1';

    Boleto {
        amount: cents_to_amount(&reader.take(P_AMOUNT)),
        due_date,
        issue_date: parse_ddmmyyyy(&reader.take(P_ISSUE_DATE)),
        document_number: reader.take_text(P_DOC_NUMBER),
        document_species: code_to_species(&reader.take(P_SPECIES)).map(str::to_string),
        currency_species: (reader.take(P_CURRENCY) == CURRENCY_REAL).then(|| "REAL".to_string()),
        accept: reader.take_char(P_ACCEPT) == 'A',
        interest,
        discount,
        protest,
        protest_days: if protest {
            reader
                .take_digits(P_PROTEST_DAYS)
                .and_then(|d| d.parse().ok())
                .unwrap_or(0)
        } else {
            0
        },
        beneficiary: Beneficiary {
            name: company.name.clone(),
            document: company.document.clone(),
            covenant: company.covenant.clone(),
            agency: reader.take_digits(P_AGENCY),
            agency_digit: reader.take_text(P_AGENCY_DV),
            account: reader.take_digits(P_ACCOUNT),
            account_digit: reader.take_text(P_ACCOUNT_DV),
            carteira: reader.take_text(P_CARTEIRA),
            nosso_numero: reader.take_digits(P_NOSSO),
            nosso_numero_digit: reader.take_text(P_NOSSO_DV),
            ..Default::default()
        },
        payer: Payer {
            code: reader.take_text(P_PAYER_CODE),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn decode_segment_q(reader: &LineReader, boleto: &mut Boleto) {
    let code = boleto.payer.code.take();
    boleto.payer = Payer {
        name: reader.take_text(Q_PAYER_NAME),
        document: reader.take_digits(Q_PAYER_DOC),
        code,
        address: crate::model::Address {
            street: reader.take_text(Q_STREET),
            number: reader.take_text(Q_NUMBER),
            neighborhood: reader.take_text(Q_NEIGHBORHOOD),
            postal_code: reader
                .take_text(Q_POSTAL)
                .filter(|p| !p.chars().all(|c| c == '0')),
            city: reader.take_text(Q_CITY),
            state: reader.take_text(Q_STATE),
            ..Default::default()
        },
    };
}

fn decode_segment_r(reader: &LineReader, boleto: &mut Boleto) {
    boleto.fine = decode_policy(
        reader.take_char(R_FINE_CODE),
        &reader.take(R_FINE_DATE),
        &reader.take(R_FINE_VALUE),
        boleto.due_date,
        false,
    );
    boleto.instructions = [R_MESSAGE3, R_MESSAGE4]
        .iter()
        .filter_map(|slot| reader.take_text(*slot))
        .collect();
}

/// Decode a remittance file produced by [`encode_remessa`]. Structure is
/// checked strictly: every line must be 240 positions, segments must arrive
/// in order and both trailers must agree with what was actually read.
pub fn decode_remessa(text: &str) -> Result<Vec<Boleto>> {
    let mut company = CompanyInfo::default();
    let mut open: Option<Boleto> = None;
    let mut finished: Vec<Boleto> = Vec::new();
    let mut detail_count = 0u32;
    let mut record_count = 0u32;
    let mut total = Decimal::ZERO;
    let mut batch_closed = false;
    let mut file_closed = false;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        if raw.is_empty() {
            continue;
        }
        if file_closed {
            return Err(mismatch(line_no, "record after the file trailer".to_string()));
        }
        record_count += 1;
        let reader = LineReader::new(raw, line_no)?;

        match reader.take_char(REC_TYPE) {
            REC_FILE_HEADER => {
                company = CompanyInfo {
                    name: reader.take_text(FH_COMPANY_NAME),
                    document: reader.take_digits(FH_COMPANY_DOC),
                    covenant: reader.take_digits(FH_COVENANT),
                };
            }
            REC_BATCH_HEADER => {}
            REC_DETAIL => {
                if batch_closed {
                    return Err(mismatch(line_no, "detail after the batch trailer".to_string()));
                }
                detail_count += 1;
                match reader.take_char(SEGMENT_COL) {
                    'P' => {
                        if let Some(done) = open.take() {
                            finished.push(done);
                        }
                        let boleto = decode_segment_p(&reader, &company);
                        if let Some(amount) = boleto.amount {
                            total += amount;
                        }
                        open = Some(boleto);
                    }
                    'Q' => match open.as_mut() {
                        Some(boleto) => decode_segment_q(&reader, boleto),
                        None => {
                            return Err(mismatch(
                                line_no,
                                "segment Q without an open title".to_string(),
                            ));
                        }
                    },
                    'R' => match open.as_mut() {
                        Some(boleto) => decode_segment_r(&reader, boleto),
                        None => {
                            return Err(mismatch(
                                line_no,
                                "segment R without an open title".to_string(),
                            ));
                        }
                    },
                    other => {
                        return Err(mismatch(line_no, format!("unknown segment '{other}'")));
                    }
                }
            }
            REC_BATCH_TRAILER => {
                if let Some(done) = open.take() {
                    finished.push(done);
                }
                batch_closed = true;

                let declared_records: u32 = reader
                    .take_digits(BT_RECORD_COUNT)
                    .and_then(|d| d.parse().ok())
                    .ok_or_else(|| mismatch(line_no, "unreadable record count".to_string()))?;
                if declared_records != detail_count + 2 {
                    return Err(mismatch(
                        line_no,
                        format!(
                            "batch trailer declares {} records, found {}",
                            declared_records,
                            detail_count + 2
                        ),
                    ));
                }
                let declared_total = cents_to_amount(&reader.take(BT_TOTAL))
                    .ok_or_else(|| mismatch(line_no, "unreadable amount total".to_string()))?;
                if declared_total != total {
                    return Err(mismatch(
                        line_no,
                        format!("batch trailer declares total {declared_total}, found {total}"),
                    ));
                }
            }
            REC_FILE_TRAILER => {
                let declared_records: u32 = reader
                    .take_digits(FT_RECORD_COUNT)
                    .and_then(|d| d.parse().ok())
                    .ok_or_else(|| mismatch(line_no, "unreadable record count".to_string()))?;
                if declared_records != record_count {
                    return Err(mismatch(
                        line_no,
                        format!(
                            "file trailer declares {declared_records} records, found {record_count}"
                        ),
                    ));
                }
                file_closed = true;
            }
            other => {
                return Err(mismatch(line_no, format!("unknown record type '{other}'")));
            }
        }
    }

    if !file_closed {
        return Err(mismatch(
            record_count as usize,
            "file ended before the file trailer".to_string(),
        ));
    }
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnab::LINE_WIDTH;
    use crate::model::Address;
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    fn sample_boleto() -> Boleto {
        Boleto::new()
            .set_amount(dec!(150.75))
            .set_due_date(NaiveDate::from_ymd_opt(2024, 10, 15).unwrap())
            .set_issue_date(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
            .set_document_number("4242")
            .set_document_species("DMI")
            .set_currency_species("REAL")
            .set_accept(false)
            .set_beneficiary(Beneficiary {
                name: Some("EMPRESA TESTE LTDA".to_string()),
                document: Some("05913544000100".to_string()),
                agency: Some("4342".to_string()),
                account: Some("71919".to_string()),
                covenant: Some("1457020".to_string()),
                carteira: Some("1".to_string()),
                nosso_numero: Some("670".to_string()),
                ..Default::default()
            })
            .set_payer(Payer {
                name: Some("SAMUEL BORGES DE OLIVEIRA".to_string()),
                document: Some("13245678901".to_string()),
                code: None,
                address: Address {
                    street: Some("RUA GERALDO SOUZA".to_string()),
                    number: Some("3021".to_string()),
                    neighborhood: Some("CENTRO".to_string()),
                    postal_code: Some("76962050".to_string()),
                    city: Some("CACOAL".to_string()),
                    state: Some("RO".to_string()),
                    ..Default::default()
                },
            })
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn every_line_is_exactly_240_positions() {
        let text = encode_remessa(&[sample_boleto()], generated_at(), 1).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        for line in &lines {
            assert_eq!(line.chars().count(), LINE_WIDTH);
        }
        let record_types: String = lines.iter().map(|l| l.chars().nth(7).unwrap()).collect();
        assert_eq!(record_types, "0133359");
    }

    #[test]
    fn generated_file_reads_back_into_the_same_title() {
        let original = sample_boleto();
        let text = encode_remessa(&[original.clone()], generated_at(), 1).unwrap();
        let decoded = decode_remessa(&text).unwrap();
        assert_eq!(decoded.len(), 1);

        let back = &decoded[0];
        assert_eq!(back.amount, original.amount);
        assert_eq!(back.due_date, original.due_date);
        assert_eq!(back.issue_date, original.issue_date);
        assert_eq!(back.document_number, original.document_number);
        assert_eq!(back.document_species, original.document_species);
        assert_eq!(back.beneficiary.agency, original.beneficiary.agency);
        assert_eq!(back.beneficiary.covenant, original.beneficiary.covenant);
        assert_eq!(back.beneficiary.nosso_numero, original.beneficiary.nosso_numero);
        assert_eq!(back.beneficiary.nosso_numero_digit, Some("3".to_string()));
        assert_eq!(back.payer.name, original.payer.name);
        assert_eq!(back.payer.address.postal_code, original.payer.address.postal_code);
    }

    #[test]
    fn a_blank_postal_slot_reads_back_as_absent() {
        let text = encode_remessa(&[sample_boleto()], generated_at(), 1).unwrap();
        let blanked: String = text
            .lines()
            .map(|line| {
                if line.chars().nth(13) == Some('Q') {
                    let mut t: Vec<char> = line.chars().collect();
                    for c in &mut t[128..136] {
                        *c = ' ';
                    }
                    t.into_iter().collect::<String>() + "\n"
                } else {
                    line.to_string() + "\n"
                }
            })
            .collect();
        let decoded = decode_remessa(&blanked).unwrap();
        assert_eq!(decoded[0].payer.address.postal_code, None);
    }

    #[test]
    fn an_empty_batch_cannot_be_encoded() {
        let err = encode_remessa(&[], generated_at(), 1).unwrap_err();
        assert!(matches!(err, BoletoError::Validation(fields::DOCUMENTS)));
    }

    #[test]
    fn an_unencodable_policy_day_count_is_refused() {
        let mut boleto = sample_boleto();
        boleto.interest = ChargePolicy::Fixed {
            value: dec!(1.00),
            after_days: i64::MAX,
        };
        let err = encode_remessa(&[boleto], generated_at(), 1).unwrap_err();
        assert!(matches!(err, BoletoError::Validation(fields::INTEREST)));

        // in range for a duration, out of range for any calendar date
        let mut boleto = sample_boleto();
        boleto.fine = ChargePolicy::Percentage {
            rate: dec!(2.0),
            after_days: 1_000_000_000,
        };
        let err = encode_remessa(&[boleto], generated_at(), 1).unwrap_err();
        assert!(matches!(err, BoletoError::Validation(fields::FINE)));
    }

    #[test]
    fn a_wrong_nosso_numero_digit_is_rejected() {
        let mut boleto = sample_boleto();
        boleto.beneficiary.nosso_numero_digit = Some("7".to_string());
        let err = encode_remessa(&[boleto], generated_at(), 1).unwrap_err();
        assert!(matches!(
            err,
            BoletoError::Validation(fields::BENEFICIARY_NOSSO_NUMERO_DIGIT)
        ));
    }

    #[test]
    fn tampered_trailer_totals_abort_the_decode() {
        let text = encode_remessa(&[sample_boleto()], generated_at(), 1).unwrap();
        let tampered: String = text
            .lines()
            .map(|line| {
                if line.chars().nth(7) == Some('5') {
                    let mut t: Vec<char> = line.chars().collect();
                    t[45] = '9';
                    t.into_iter().collect::<String>() + "\n"
                } else {
                    line.to_string() + "\n"
                }
            })
            .collect();
        let err = decode_remessa(&tampered).unwrap_err();
        assert!(matches!(err, BoletoError::StructuralDecode { line: 6, .. }));
    }

    #[test]
    fn a_detail_without_an_open_title_aborts() {
        let text = encode_remessa(&[sample_boleto()], generated_at(), 1).unwrap();
        // drop the P line so the Q arrives first
        let without_p: String = text
            .lines()
            .filter(|line| line.chars().nth(13) != Some('P'))
            .map(|line| line.to_string() + "\n")
            .collect();
        let err = decode_remessa(&without_p).unwrap_err();
        match err {
            BoletoError::StructuralDecode { reason, .. } => {
                assert!(reason.contains("segment Q"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
