//! Service layer API for boleto operations across banks.
use tracing::debug;

use crate::banks::{BankAdapter, BankConfig, BoletoBank, Operation};
use crate::error::{BoletoError, Result};
use crate::model::{Boleto, ReturnEntry};
use crate::validation::{FieldId, validate_boleto};

pub struct BoletoService {
    adapter: Box<dyn BankAdapter>,
}

impl BoletoService {
    /// Select the adapter for the configured bank, once, up front.
    pub fn new(config: BankConfig) -> Self {
        Self {
            adapter: config.into_adapter(),
        }
    }

    /// Plug in a custom adapter, mainly for tests.
    pub fn with_adapter(adapter: Box<dyn BankAdapter>) -> Self {
        Self { adapter }
    }

    pub fn bank(&self) -> BoletoBank {
        self.adapter.bank()
    }

    /// The document fields the active bank insists on, in checking order.
    pub fn required_fields(&self) -> &'static [FieldId] {
        self.adapter.required_fields()
    }

    /// Check the connection settings without touching any document.
    pub fn validate_configuration(&self) -> Result<()> {
        self.adapter.validate_configuration()
    }

    // A bank that never offers the operation answers the same way whatever
    // the document looks like, so this runs before any field is inspected.
    fn ensure_supported(&self, operation: Operation) -> Result<()> {
        if !self.adapter.supports(operation) {
            return Err(BoletoError::UnsupportedOperation);
        }
        Ok(())
    }

    fn validate(&self, boleto: &Boleto) -> Result<()> {
        validate_boleto(boleto, self.adapter.required_fields())
    }

    /// Register one charge with the bank and return the enriched copy.
    pub fn submit(&self, boleto: &Boleto) -> Result<Boleto> {
        // Capability, document, then connection, in that order
        self.ensure_supported(Operation::Submit)?;
        self.validate(boleto)?;
        self.adapter.validate_configuration()?;

        debug!("submitting boleto through {:?}", self.bank());
        self.adapter.submit(boleto)
    }

    /// Render the printable slip, for banks that declare it.
    pub fn printable_form(&self, boleto: &Boleto) -> Result<Vec<u8>> {
        self.ensure_supported(Operation::PrintableForm)?;
        self.adapter.printable_form(boleto)
    }

    /// Encode a batch of charges into a remittance file.
    pub fn generate_remessa(&self, boletos: &[Boleto]) -> Result<String> {
        self.ensure_supported(Operation::GenerateRemessa)?;
        for boleto in boletos {
            self.validate(boleto)?;
        }
        self.adapter.generate_remessa(boletos)
    }

    /// Decode a return file into one entry per detail line.
    pub fn import_retorno(&self, text: &str) -> Result<Vec<ReturnEntry>> {
        self.ensure_supported(Operation::ImportRetorno)?;
        self.adapter.import_retorno(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::SicoobCnab240Config;

    #[test]
    fn capability_is_checked_before_any_field() {
        let service = BoletoService::new(BankConfig::SicoobCnab240(SicoobCnab240Config));
        // an empty document would fail validation, but the bank does not
        // offer submission at all, so that answer wins
        let err = service.submit(&Boleto::new()).unwrap_err();
        assert!(matches!(err, BoletoError::UnsupportedOperation));
    }
}
