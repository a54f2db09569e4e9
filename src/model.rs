//! Boleto document model shared by every bank adapter.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Interest, fine and discount terms all follow the same shape: nothing,
/// a percentage or a fixed value, activated `after_days` past the due date
/// (before it, for discounts).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ChargePolicy {
    #[default]
    None,
    Percentage {
        rate: Decimal,
        after_days: i64,
    },
    Fixed {
        value: Decimal,
        after_days: i64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// The account holder issuing the charge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub name: Option<String>,
    pub document: Option<String>,
    pub agency: Option<String>,
    pub agency_digit: Option<String>,
    pub agency_post_code: Option<String>,
    pub account: Option<String>,
    pub account_digit: Option<String>,
    pub covenant: Option<String>,
    pub carteira: Option<String>,
    pub nosso_numero: Option<String>,
    pub nosso_numero_digit: Option<String>,
    pub address: Address,
}

/// The party the charge is drawn against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payer {
    pub name: Option<String>,
    pub document: Option<String>,
    pub code: Option<String>,
    pub address: Address,
}

// Also the unit of remittance batches; `None` fields are simply absent,
// each bank decides which ones it insists on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boleto {
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub document_species: Option<String>,
    pub currency_species: Option<String>,
    pub accept: bool,
    pub payment_locations: Vec<String>,
    pub instructions: Vec<String>,
    pub interest: ChargePolicy,
    pub fine: ChargePolicy,
    pub discount: ChargePolicy,
    pub protest: bool,
    pub protest_days: i64,
    pub automatic_negative_listing: bool,
    pub print_layout: Option<String>,
    pub beneficiary: Beneficiary,
    pub payer: Payer,
    pub barcode: Option<String>,
    pub digitable_line: Option<String>,
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub tracking_code: Option<String>,
}

impl Boleto {
    /// Construct a new builder object, the starting point for a charge.
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }
    pub fn set_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
    pub fn set_issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = Some(date);
        self
    }
    pub fn set_document_number(mut self, number: &str) -> Self {
        self.document_number = Some(number.to_string());
        self
    }
    pub fn set_document_species(mut self, species: &str) -> Self {
        self.document_species = Some(species.to_string());
        self
    }
    pub fn set_currency_species(mut self, species: &str) -> Self {
        self.currency_species = Some(species.to_string());
        self
    }
    pub fn set_accept(mut self, accept: bool) -> Self {
        self.accept = accept;
        self
    }
    pub fn add_payment_location(mut self, location: &str) -> Self {
        self.payment_locations.push(location.to_string());
        self
    }
    pub fn add_instruction(mut self, instruction: &str) -> Self {
        self.instructions.push(instruction.to_string());
        self
    }
    pub fn set_interest(mut self, policy: ChargePolicy) -> Self {
        self.interest = policy;
        self
    }
    pub fn set_fine(mut self, policy: ChargePolicy) -> Self {
        self.fine = policy;
        self
    }
    pub fn set_discount(mut self, policy: ChargePolicy) -> Self {
        self.discount = policy;
        self
    }
    pub fn set_protest(mut self, days: i64) -> Self {
        self.protest = true;
        self.protest_days = days;
        self
    }
    pub fn set_automatic_negative_listing(mut self, enabled: bool) -> Self {
        self.automatic_negative_listing = enabled;
        self
    }
    pub fn set_print_layout(mut self, layout: &str) -> Self {
        self.print_layout = Some(layout.to_string());
        self
    }
    pub fn set_beneficiary(mut self, beneficiary: Beneficiary) -> Self {
        self.beneficiary = beneficiary;
        self
    }
    pub fn set_payer(mut self, payer: Payer) -> Self {
        self.payer = payer;
        self
    }
}

/// Detail segment letter of a return-file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetornoSegment {
    T,
    U,
}

impl RetornoSegment {
    pub fn letter(&self) -> char {
        match self {
            RetornoSegment::T => 'T',
            RetornoSegment::U => 'U',
        }
    }
}

/// One decoded detail record of a return file. A title produces one entry
/// per segment line, so a confirmed settlement shows up as a T and a U pair
/// sharing the same movement code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnEntry {
    pub segment: RetornoSegment,
    pub movement_code: String,
    pub occurrence: Option<String>,
    pub agency: Option<String>,
    pub account: Option<String>,
    pub carteira: Option<String>,
    pub nosso_numero: Option<String>,
    pub document_number: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub nominal_value: Option<Decimal>,
    pub fee_value: Option<Decimal>,
    pub interest_value: Option<Decimal>,
    pub discount_value: Option<Decimal>,
    pub paid_value: Option<Decimal>,
    pub net_value: Option<Decimal>,
    pub occurrence_date: Option<NaiveDate>,
    pub credit_date: Option<NaiveDate>,
}

impl ReturnEntry {
    pub fn new(segment: RetornoSegment, movement_code: String) -> Self {
        Self {
            segment,
            movement_code,
            occurrence: None,
            agency: None,
            account: None,
            carteira: None,
            nosso_numero: None,
            document_number: None,
            due_date: None,
            nominal_value: None,
            fee_value: None,
            interest_value: None,
            discount_value: None,
            paid_value: None,
            net_value: None,
            occurrence_date: None,
            credit_date: None,
        }
    }
}
