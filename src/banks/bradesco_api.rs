//! Bradesco over its registration API. Submitting goes through the
//! injected registrar; the printable form is declared but still a stub,
//! and the file channel is not offered at all.
use tracing::info;

use super::{BankAdapter, BoletoBank, Operation};
use crate::error::{BoletoError, Result};
use crate::model::Boleto;
use crate::transport::{BoletoRegistrar, HttpBoletoRegistrar};
use crate::validation::{FieldId, fields, validate_connection_fields};

pub(crate) const REQUIRED_FIELDS: &[FieldId] = &[
    fields::AMOUNT,
    fields::DUE_DATE,
    fields::DOCUMENT_NUMBER,
    fields::BENEFICIARY_AGENCY,
    fields::BENEFICIARY_AGENCY_DIGIT,
    fields::BENEFICIARY_ACCOUNT,
    fields::BENEFICIARY_ACCOUNT_DIGIT,
    fields::BENEFICIARY_CARTEIRA,
    fields::BENEFICIARY_NOSSO_NUMERO,
    fields::PAYER_NAME,
    fields::PAYER_DOCUMENT,
    fields::PAYER_STREET,
    fields::PAYER_NUMBER,
    fields::PAYER_NEIGHBORHOOD,
    fields::PAYER_POSTAL_CODE,
    fields::PAYER_CITY,
    fields::PAYER_STATE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Homologation,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://openapi.bradesco.com.br",
            Environment::Homologation => "https://proxy.api.prebanco.com.br",
        }
    }
}

/// Connection settings for the registration API. The environment cannot be
/// left unset; everything else is checked by `validate_configuration`, in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct BradescoApiConfig {
    pub client_id: Option<String>,
    pub cpf_cnpj: Option<String>,
    pub environment: Environment,
    pub certificate_path: Option<String>,
}

impl BradescoApiConfig {
    pub(crate) fn connection_fields(&self) -> [(FieldId, Option<&str>); 3] {
        [
            (fields::CLIENT_ID, self.client_id.as_deref()),
            (fields::CPF_CNPJ, self.cpf_cnpj.as_deref()),
            (fields::CERTIFICATE_PATH, self.certificate_path.as_deref()),
        ]
    }
}

pub struct BradescoApiAdapter {
    config: BradescoApiConfig,
    registrar: Option<Box<dyn BoletoRegistrar>>,
}

impl BradescoApiAdapter {
    pub fn new(config: BradescoApiConfig) -> Self {
        Self {
            config,
            registrar: None,
        }
    }

    /// Swap the shipped HTTP registrar for another implementation.
    pub fn with_registrar(config: BradescoApiConfig, registrar: Box<dyn BoletoRegistrar>) -> Self {
        Self {
            config,
            registrar: Some(registrar),
        }
    }
}

impl BankAdapter for BradescoApiAdapter {
    fn bank(&self) -> BoletoBank {
        BoletoBank::BradescoApi
    }

    fn supports(&self, operation: Operation) -> bool {
        matches!(operation, Operation::Submit | Operation::PrintableForm)
    }

    fn required_fields(&self) -> &'static [FieldId] {
        REQUIRED_FIELDS
    }

    fn validate_configuration(&self) -> Result<()> {
        validate_connection_fields(&self.config.connection_fields())
    }

    fn submit(&self, boleto: &Boleto) -> Result<Boleto> {
        info!(
            "registering boleto {} with Bradesco",
            boleto.document_number.as_deref().unwrap_or("<unnumbered>")
        );
        let reply = match &self.registrar {
            Some(registrar) => registrar.register(boleto)?,
            None => HttpBoletoRegistrar::new(&self.config)?.register(boleto)?,
        };

        let mut registered = boleto.clone();
        registered.result_code = Some(reply.code);
        registered.result_message = Some(reply.message);
        registered.tracking_code = reply.tracking_code.or(registered.tracking_code);
        registered.barcode = reply.barcode.or(registered.barcode);
        registered.digitable_line = reply.digitable_line.or(registered.digitable_line);
        Ok(registered)
    }

    fn printable_form(&self, _boleto: &Boleto) -> Result<Vec<u8>> {
        Err(BoletoError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_channel_declines_file_operations() {
        let adapter = BradescoApiAdapter::new(BradescoApiConfig::default());
        assert!(adapter.supports(Operation::Submit));
        assert!(adapter.supports(Operation::PrintableForm));
        assert!(!adapter.supports(Operation::GenerateRemessa));
        assert!(!adapter.supports(Operation::ImportRetorno));
    }

    #[test]
    fn environments_point_at_different_hosts() {
        assert_ne!(
            Environment::Production.base_url(),
            Environment::Homologation.base_url()
        );
        assert_eq!(Environment::default(), Environment::Homologation);
    }

    #[test]
    fn blank_client_id_is_the_first_configuration_error() {
        let config = BradescoApiConfig {
            client_id: Some("  ".to_string()),
            cpf_cnpj: Some("05913544000100".to_string()),
            certificate_path: Some("/tmp/cert.pem".to_string()),
            ..Default::default()
        };
        let adapter = BradescoApiAdapter::new(config);
        let err = adapter.validate_configuration().unwrap_err();
        assert!(matches!(err, BoletoError::Configuration(fields::CLIENT_ID)));
    }
}
