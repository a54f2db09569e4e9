//! Presence checks over the closed set of field identifiers. Banks declare
//! which identifiers they insist on; the first violation wins and later
//! fields are never inspected.
use crate::error::{BoletoError, Result};
use crate::model::Boleto;

/// Stable dotted path of a document or configuration field. These strings
/// are part of the public error surface and never change wording.
pub type FieldId = &'static str;

pub mod fields {
    use super::FieldId;

    // document
    pub const AMOUNT: FieldId = "amount";
    pub const DUE_DATE: FieldId = "dueDate";
    pub const ISSUE_DATE: FieldId = "issueDate";
    pub const DOCUMENT_NUMBER: FieldId = "documentNumber";
    pub const DOCUMENT_SPECIES: FieldId = "documentSpecies";
    pub const CURRENCY_SPECIES: FieldId = "currencySpecies";
    pub const PAYMENT_LOCATIONS: FieldId = "paymentLocations";
    pub const INSTRUCTIONS: FieldId = "instructions";
    pub const INTEREST: FieldId = "interest";
    pub const FINE: FieldId = "fine";
    pub const DISCOUNT: FieldId = "discount";
    pub const BARCODE: FieldId = "barcode";
    pub const DIGITABLE_LINE: FieldId = "digitableLine";
    pub const DOCUMENTS: FieldId = "documents";

    // beneficiary
    pub const BENEFICIARY_NAME: FieldId = "beneficiary.name";
    pub const BENEFICIARY_DOCUMENT: FieldId = "beneficiary.document";
    pub const BENEFICIARY_AGENCY: FieldId = "beneficiary.agency";
    pub const BENEFICIARY_AGENCY_DIGIT: FieldId = "beneficiary.agencyDigit";
    pub const BENEFICIARY_ACCOUNT: FieldId = "beneficiary.account";
    pub const BENEFICIARY_ACCOUNT_DIGIT: FieldId = "beneficiary.accountDigit";
    pub const BENEFICIARY_COVENANT: FieldId = "beneficiary.covenant";
    pub const BENEFICIARY_CARTEIRA: FieldId = "beneficiary.carteira";
    pub const BENEFICIARY_NOSSO_NUMERO: FieldId = "beneficiary.nossoNumero";
    pub const BENEFICIARY_NOSSO_NUMERO_DIGIT: FieldId = "beneficiary.nossoNumeroDigit";

    // payer
    pub const PAYER_NAME: FieldId = "payer.name";
    pub const PAYER_DOCUMENT: FieldId = "payer.document";
    pub const PAYER_CODE: FieldId = "payer.code";
    pub const PAYER_STREET: FieldId = "payer.address.street";
    pub const PAYER_NUMBER: FieldId = "payer.address.number";
    pub const PAYER_NEIGHBORHOOD: FieldId = "payer.address.neighborhood";
    pub const PAYER_POSTAL_CODE: FieldId = "payer.address.postalCode";
    pub const PAYER_CITY: FieldId = "payer.address.city";
    pub const PAYER_STATE: FieldId = "payer.address.state";

    // connection
    pub const CLIENT_ID: FieldId = "clientId";
    pub const CPF_CNPJ: FieldId = "cpfCnpj";
    pub const CERTIFICATE_PATH: FieldId = "certificatePath";
}

fn text_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn boleto_field_blank(boleto: &Boleto, field: FieldId) -> bool {
    let beneficiary = &boleto.beneficiary;
    let payer = &boleto.payer;
    match field {
        fields::AMOUNT => boleto.amount.is_none(),
        fields::DUE_DATE => boleto.due_date.is_none(),
        fields::ISSUE_DATE => boleto.issue_date.is_none(),
        fields::DOCUMENT_NUMBER => text_blank(&boleto.document_number),
        fields::DOCUMENT_SPECIES => text_blank(&boleto.document_species),
        fields::CURRENCY_SPECIES => text_blank(&boleto.currency_species),
        fields::PAYMENT_LOCATIONS => {
            boleto.payment_locations.iter().all(|l| l.trim().is_empty())
        }
        fields::INSTRUCTIONS => boleto.instructions.iter().all(|l| l.trim().is_empty()),
        // charge policies always carry a value, None included
        fields::INTEREST | fields::FINE | fields::DISCOUNT => false,
        fields::BARCODE => text_blank(&boleto.barcode),
        fields::DIGITABLE_LINE => text_blank(&boleto.digitable_line),
        fields::BENEFICIARY_NAME => text_blank(&beneficiary.name),
        fields::BENEFICIARY_DOCUMENT => text_blank(&beneficiary.document),
        fields::BENEFICIARY_AGENCY => text_blank(&beneficiary.agency),
        fields::BENEFICIARY_AGENCY_DIGIT => text_blank(&beneficiary.agency_digit),
        fields::BENEFICIARY_ACCOUNT => text_blank(&beneficiary.account),
        fields::BENEFICIARY_ACCOUNT_DIGIT => text_blank(&beneficiary.account_digit),
        fields::BENEFICIARY_COVENANT => text_blank(&beneficiary.covenant),
        fields::BENEFICIARY_CARTEIRA => text_blank(&beneficiary.carteira),
        fields::BENEFICIARY_NOSSO_NUMERO => text_blank(&beneficiary.nosso_numero),
        fields::BENEFICIARY_NOSSO_NUMERO_DIGIT => text_blank(&beneficiary.nosso_numero_digit),
        fields::PAYER_NAME => text_blank(&payer.name),
        fields::PAYER_DOCUMENT => text_blank(&payer.document),
        fields::PAYER_CODE => text_blank(&payer.code),
        fields::PAYER_STREET => text_blank(&payer.address.street),
        fields::PAYER_NUMBER => text_blank(&payer.address.number),
        fields::PAYER_NEIGHBORHOOD => text_blank(&payer.address.neighborhood),
        fields::PAYER_POSTAL_CODE => text_blank(&payer.address.postal_code),
        fields::PAYER_CITY => text_blank(&payer.address.city),
        fields::PAYER_STATE => text_blank(&payer.address.state),
        // identifiers outside the checkable set count as missing
        _ => true,
    }
}

/// Walk the required list in declaration order and report the first field
/// that is missing or blank.
pub fn validate_boleto(boleto: &Boleto, required: &[FieldId]) -> Result<()> {
    for &field in required {
        if boleto_field_blank(boleto, field) {
            return Err(BoletoError::Validation(field));
        }
    }
    Ok(())
}

/// Same contract for connection settings, reported as configuration errors.
pub fn validate_connection_fields(pairs: &[(FieldId, Option<&str>)]) -> Result<()> {
    for &(field, value) in pairs {
        if value.is_none_or(|v| v.trim().is_empty()) {
            return Err(BoletoError::Configuration(field));
        }
    }
    Ok(())
}
