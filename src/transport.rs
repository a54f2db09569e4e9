//! Registration transport for API banks. The service talks to the
//! [`BoletoRegistrar`] trait only; the HTTP implementation below is the
//! thin wrapper shipped for production use, and tests swap in stubs.
use std::time::Duration;

use reqwest::blocking::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::banks::bradesco_api::BradescoApiConfig;
use crate::error::{BoletoError, Result};
use crate::model::Boleto;
use crate::validation::fields;

const REGISTER_PATH: &str = "/v1.1/boleto/registro";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// What the provider answers when a charge is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReply {
    pub code: String,
    pub message: String,
    pub tracking_code: Option<String>,
    pub barcode: Option<String>,
    pub digitable_line: Option<String>,
}

pub trait BoletoRegistrar: Send + Sync {
    fn register(&self, boleto: &Boleto) -> Result<RegistrationReply>;
}

/// Registers charges against the provider's REST endpoint. The client
/// certificate, when configured, is attached as the TLS identity.
pub struct HttpBoletoRegistrar {
    client: Client,
    base_url: String,
    client_id: String,
}

#[derive(Deserialize)]
struct RegisterResponse {
    #[serde(rename = "codigoRetorno")]
    code: Option<String>,
    #[serde(rename = "mensagemRetorno")]
    message: Option<String>,
    #[serde(rename = "idTitulo")]
    tracking_code: Option<String>,
    #[serde(rename = "codigoBarras")]
    barcode: Option<String>,
    #[serde(rename = "linhaDigitavel")]
    digitable_line: Option<String>,
}

impl HttpBoletoRegistrar {
    pub fn new(config: &BradescoApiConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if let Some(path) = &config.certificate_path {
            let pem =
                std::fs::read(path).map_err(|e| BoletoError::Transport(e.to_string()))?;
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| BoletoError::Transport(e.to_string()))?;
            builder = builder.identity(identity);
        }
        let client = builder
            .build()
            .map_err(|e| BoletoError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.environment.base_url().to_string(),
            client_id: config.client_id.clone().unwrap_or_default(),
        })
    }

    fn payload(boleto: &Boleto) -> Result<serde_json::Value> {
        let amount = boleto
            .amount
            .ok_or(BoletoError::Validation(fields::AMOUNT))?;
        let cents = (amount * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or(BoletoError::Validation(fields::AMOUNT))?;
        let due_date = boleto
            .due_date
            .ok_or(BoletoError::Validation(fields::DUE_DATE))?;

        let beneficiary = &boleto.beneficiary;
        let payer = &boleto.payer;
        Ok(json!({
            "agenciaDestino": beneficiary.agency,
            "digitoAgencia": beneficiary.agency_digit,
            "contaDestino": beneficiary.account,
            "digitoConta": beneficiary.account_digit,
            "carteira": beneficiary.carteira,
            "nossoNumero": beneficiary.nosso_numero,
            "numeroDocumento": boleto.document_number,
            "dataVencimento": due_date.format("%d.%m.%Y").to_string(),
            "valorNominal": cents,
            "pagador": {
                "nome": payer.name,
                "nuCpfcnpj": payer.document,
                "logradouro": payer.address.street,
                "nuLogradouro": payer.address.number,
                "bairro": payer.address.neighborhood,
                "cep": payer.address.postal_code,
                "cidade": payer.address.city,
                "uf": payer.address.state,
            },
        }))
    }
}

impl BoletoRegistrar for HttpBoletoRegistrar {
    fn register(&self, boleto: &Boleto) -> Result<RegistrationReply> {
        let url = format!("{}{}", self.base_url, REGISTER_PATH);
        info!("registering charge at {}", url);

        let response = self
            .client
            .post(&url)
            .header("client_id", &self.client_id)
            .json(&Self::payload(boleto)?)
            .send()
            .map_err(|e| BoletoError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BoletoError::Transport(format!("{status}: {body}")));
        }

        let parsed: RegisterResponse = response
            .json()
            .map_err(|e| BoletoError::Transport(e.to_string()))?;
        Ok(RegistrationReply {
            code: parsed.code.unwrap_or_default(),
            message: parsed.message.unwrap_or_default(),
            tracking_code: parsed.tracking_code,
            barcode: parsed.barcode,
            digitable_line: parsed.digitable_line,
        })
    }
}
