#![allow(warnings)]

use boleto::banks::sicoob_cnab240::{barcode, digitable_line};
use boleto::banks::{BankConfig, SicoobCnab240Config};
use boleto::model::{Address, Beneficiary, Payer};
use boleto::{Boleto, BoletoService};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

// issue one charge through the file channel and print what would land on
// the printed slip
fn main() -> anyhow::Result<()> {
    let title = Boleto::new()
        .set_amount(dec!(150.75))
        .set_due_date(NaiveDate::from_ymd_opt(2024, 10, 15).unwrap())
        .set_issue_date(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
        .set_document_number("670")
        .set_document_species("DMI")
        .add_instruction("NAO RECEBER APOS O VENCIMENTO")
        .set_beneficiary(Beneficiary {
            name: Some("MOVEIS HORIZONTE LTDA".to_string()),
            document: Some("45997418000153".to_string()),
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
                street: Some("RUA GERALDO CARDOSO".to_string()),
                number: Some("3021".to_string()),
                neighborhood: Some("CENTRO".to_string()),
                postal_code: Some("76962050".to_string()),
                city: Some("CACOAL".to_string()),
                state: Some("RO".to_string()),
                ..Default::default()
            },
        });

    println!("barcode        {}", barcode(&title)?);
    println!("digitable line {}", digitable_line(&title)?);

    let service = BoletoService::new(BankConfig::SicoobCnab240(SicoobCnab240Config));
    let remessa = service.generate_remessa(&[title])?;

    std::fs::write("CB020924.REM", &remessa)?;
    println!("wrote {} records to CB020924.REM", remessa.lines().count());

    Ok(())
}
