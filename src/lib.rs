//! Multi-bank boleto issuing, remittance batches and return-file
//! processing behind one service interface.

pub mod banks;
pub mod cnab;
pub mod digits;
pub mod error;
pub mod model;
pub mod service;
pub mod transport;
pub mod validation;

pub use banks::{BankConfig, BoletoBank, Operation};
pub use error::{BoletoError, Result};
pub use model::{Boleto, ChargePolicy, ReturnEntry};
pub use service::BoletoService;
