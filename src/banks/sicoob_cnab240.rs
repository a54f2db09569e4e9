//! Sicoob over the CNAB 240 file channel. There is no online registration
//! here: charges go out in remittance batches and come back in return
//! files, so submit and printing are simply not on offer.
use chrono::Local;
use tracing::info;

use super::{BankAdapter, BoletoBank, Operation};
use crate::cnab::remessa::encode_remessa;
use crate::cnab::retorno::decode_retorno;
use crate::cnab::{SICOOB_BANK_CODE, amount_to_cents};
use crate::digits::{
    digitable_field_digit, due_date_factor, general_barcode_digit, sicoob_nosso_numero_digit,
    zero_pad,
};
use crate::error::{BoletoError, Result};
use crate::model::{Boleto, ReturnEntry};
use crate::validation::{FieldId, fields};

const CURRENCY_DIGIT: char = '9';
const MODALITY: &str = "01";
const INSTALLMENT: &str = "001";

pub(crate) const REQUIRED_FIELDS: &[FieldId] = &[
    fields::AMOUNT,
    fields::DUE_DATE,
    fields::ISSUE_DATE,
    fields::DOCUMENT_NUMBER,
    fields::DOCUMENT_SPECIES,
    fields::BENEFICIARY_NAME,
    fields::BENEFICIARY_DOCUMENT,
    fields::BENEFICIARY_AGENCY,
    fields::BENEFICIARY_ACCOUNT,
    fields::BENEFICIARY_COVENANT,
    fields::BENEFICIARY_NOSSO_NUMERO,
    fields::PAYER_NAME,
    fields::PAYER_DOCUMENT,
    fields::PAYER_STREET,
    fields::PAYER_NEIGHBORHOOD,
    fields::PAYER_POSTAL_CODE,
    fields::PAYER_CITY,
    fields::PAYER_STATE,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SicoobCnab240Config;

pub struct SicoobCnab240Adapter;

impl SicoobCnab240Adapter {
    pub fn new(_config: SicoobCnab240Config) -> Self {
        Self
    }
}

impl BankAdapter for SicoobCnab240Adapter {
    fn bank(&self) -> BoletoBank {
        BoletoBank::SicoobCnab240
    }

    fn supports(&self, operation: Operation) -> bool {
        matches!(
            operation,
            Operation::GenerateRemessa | Operation::ImportRetorno
        )
    }

    fn required_fields(&self) -> &'static [FieldId] {
        REQUIRED_FIELDS
    }

    fn validate_configuration(&self) -> Result<()> {
        Ok(())
    }

    fn generate_remessa(&self, boletos: &[Boleto]) -> Result<String> {
        info!("encoding remittance batch with {} titles", boletos.len());
        encode_remessa(boletos, Local::now().naive_local(), 1)
    }

    fn import_retorno(&self, text: &str) -> Result<Vec<ReturnEntry>> {
        let entries = decode_retorno(text)?;
        info!("decoded return file with {} detail entries", entries.len());
        Ok(entries)
    }
}

/// 25-position free field of the Sicoob barcode: carteira, agency, the
/// "01" modality, covenant, nosso numero with its check digit and the
/// installment number.
fn free_field(boleto: &Boleto) -> Result<String> {
    let beneficiary = &boleto.beneficiary;
    let carteira = beneficiary.carteira.as_deref().unwrap_or("1");
    if carteira.len() != 1 || !carteira.chars().all(|c| c.is_ascii_digit()) {
        return Err(BoletoError::Validation(fields::BENEFICIARY_CARTEIRA));
    }
    let agency = beneficiary
        .agency
        .as_deref()
        .ok_or(BoletoError::Validation(fields::BENEFICIARY_AGENCY))?;
    let covenant = beneficiary
        .covenant
        .as_deref()
        .ok_or(BoletoError::Validation(fields::BENEFICIARY_COVENANT))?;
    let nosso_numero = beneficiary
        .nosso_numero
        .as_deref()
        .ok_or(BoletoError::Validation(fields::BENEFICIARY_NOSSO_NUMERO))?;
    let digit = sicoob_nosso_numero_digit(agency, covenant, nosso_numero)?;

    Ok(format!(
        "{carteira}{}{MODALITY}{}{}{digit}{INSTALLMENT}",
        zero_pad(agency, 4, fields::BENEFICIARY_AGENCY)?,
        zero_pad(covenant, 7, fields::BENEFICIARY_COVENANT)?,
        zero_pad(nosso_numero, 7, fields::BENEFICIARY_NOSSO_NUMERO)?,
    ))
}

/// 44-position barcode: bank, currency, general check digit, due-date
/// factor, amount in centavos and the free field.
pub fn barcode(boleto: &Boleto) -> Result<String> {
    let due_date = boleto
        .due_date
        .ok_or(BoletoError::Validation(fields::DUE_DATE))?;
    let amount = boleto
        .amount
        .ok_or(BoletoError::Validation(fields::AMOUNT))?;

    let body = format!(
        "{SICOOB_BANK_CODE}{CURRENCY_DIGIT}{}{}{}",
        due_date_factor(due_date),
        amount_to_cents(amount, fields::AMOUNT, 10)?,
        free_field(boleto)?,
    );
    let digit = general_barcode_digit(&body)?;
    Ok(format!("{}{}{}", &body[..4], digit, &body[4..]))
}

/// 47-digit digitable line, grouped and punctuated the way it is printed
/// on the slip. Fields one to three carry their own modulo-10 digits; the
/// general digit and the factor-plus-amount block close the line.
pub fn digitable_line(boleto: &Boleto) -> Result<String> {
    let code = barcode(boleto)?;
    let bank_currency = &code[0..4];
    let general = &code[4..5];
    let factor_amount = &code[5..19];
    let free = &code[19..44];

    let field1 = format!("{bank_currency}{}", &free[0..5]);
    let field2 = &free[5..15];
    let field3 = &free[15..25];
    let d1 = digitable_field_digit(&field1)?;
    let d2 = digitable_field_digit(field2)?;
    let d3 = digitable_field_digit(field3)?;

    Ok(format!(
        "{}.{}{} {}.{}{} {}.{}{} {} {}",
        &field1[0..5],
        &field1[5..9],
        d1,
        &field2[0..5],
        &field2[5..10],
        d2,
        &field3[0..5],
        &field3[5..10],
        d3,
        general,
        factor_amount,
    ))
}
