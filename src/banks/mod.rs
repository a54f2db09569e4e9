//! One adapter per supported bank behind a common interface. The config
//! enum is the closed list of integrations; constructing a service from a
//! variant selects its adapter once, up front, and every later call goes
//! through the same trait object.
use crate::error::{BoletoError, Result};
use crate::model::{Boleto, ReturnEntry};
use crate::validation::FieldId;

pub mod bradesco_api;
pub mod sicoob_cnab240;

pub use bradesco_api::{BradescoApiConfig, Environment};
pub use sicoob_cnab240::SicoobCnab240Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoletoBank {
    SicoobCnab240,
    BradescoApi,
}

/// Everything a caller can ask a bank to do. Which subset a bank actually
/// offers is the adapter's answer, checked before any field validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Submit,
    PrintableForm,
    GenerateRemessa,
    ImportRetorno,
}

pub trait BankAdapter: Send + Sync {
    fn bank(&self) -> BoletoBank;
    fn supports(&self, operation: Operation) -> bool;
    fn required_fields(&self) -> &'static [FieldId];
    fn validate_configuration(&self) -> Result<()>;

    fn submit(&self, _boleto: &Boleto) -> Result<Boleto> {
        Err(BoletoError::UnsupportedOperation)
    }
    fn printable_form(&self, _boleto: &Boleto) -> Result<Vec<u8>> {
        Err(BoletoError::UnsupportedOperation)
    }
    fn generate_remessa(&self, _boletos: &[Boleto]) -> Result<String> {
        Err(BoletoError::UnsupportedOperation)
    }
    fn import_retorno(&self, _text: &str) -> Result<Vec<ReturnEntry>> {
        Err(BoletoError::UnsupportedOperation)
    }
}

#[derive(Debug, Clone)]
pub enum BankConfig {
    SicoobCnab240(SicoobCnab240Config),
    BradescoApi(BradescoApiConfig),
}

impl BankConfig {
    pub fn bank(&self) -> BoletoBank {
        match self {
            BankConfig::SicoobCnab240(_) => BoletoBank::SicoobCnab240,
            BankConfig::BradescoApi(_) => BoletoBank::BradescoApi,
        }
    }

    pub(crate) fn into_adapter(self) -> Box<dyn BankAdapter> {
        match self {
            BankConfig::SicoobCnab240(config) => {
                Box::new(sicoob_cnab240::SicoobCnab240Adapter::new(config))
            }
            BankConfig::BradescoApi(config) => {
                Box::new(bradesco_api::BradescoApiAdapter::new(config))
            }
        }
    }
}
