//! Counterparty extraction applied to matched transactions.
//!
//! Each category carries an [`EntityStrategy`] that decides how the raw
//! `entity` text is turned into a display name and an optional account
//! number.

use pesalens_core::{Result, starts_with_digit, title_case};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Categories that, by long-standing name, hold person-to-person or
/// business transfers.
const TRANSFER_CATEGORIES: [&str; 6] = [
    "Send Money",
    "Received (Individuals)",
    "Received (Business)",
    "Customer Payment",
    "Business Transfer (SME)",
    "Business Transfer (Customer)",
];

const PAYBILL_CATEGORIES: [&str; 1] = ["PayBillPayments"];

const WALLET_CATEGORIES: [&str; 2] = ["airtime_bundle", "Pochi"];

/// How a category cleans up the counterparty of its transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStrategy {
    /// Keep the entity as-is
    #[default]
    None,
    /// Masked phone when the entity looks like one, business split otherwise
    Transfer,
    /// Split a masked phone into name and phone; other entities kept as-is
    MaskedPhone,
    /// `"<name> via ... is <info>"`
    BusinessAccount,
    /// `"<business> Acc. <account>"`
    Paybill,
    /// Keep only the name of a masked phone entity
    WalletName,
}

impl EntityStrategy {
    /// Strategy implied by a well-known category name, for definitions that
    /// do not declare one.
    pub fn for_category_name(name: &str) -> Self {
        if TRANSFER_CATEGORIES.contains(&name) {
            EntityStrategy::Transfer
        } else if PAYBILL_CATEGORIES.contains(&name) {
            EntityStrategy::Paybill
        } else if WALLET_CATEGORIES.contains(&name) {
            EntityStrategy::WalletName
        } else {
            EntityStrategy::None
        }
    }
}

/// Cleaned counterparty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntity {
    pub name: String,
    pub account_no: Option<String>,
}

impl ExtractedEntity {
    fn verbatim(entity: &str) -> Self {
        Self {
            name: entity.to_string(),
            account_no: None,
        }
    }

    fn new(name: &str, account_no: &str) -> Self {
        let account_no = account_no.trim();
        Self {
            name: name.trim().to_string(),
            account_no: (!account_no.is_empty()).then(|| account_no.to_string()),
        }
    }
}

/// True if the entity starts with a digit or carries a masking `*`.
pub fn looks_like_masked_phone(entity: &str) -> bool {
    starts_with_digit(entity) || entity.contains('*')
}

/// Split `"0712***678 John Doe"` into `("John Doe", "0712***678")`. Without
/// a space the whole token is taken as the name.
pub fn split_masked_phone(entity: &str) -> ExtractedEntity {
    match entity.trim().split_once(' ') {
        Some((phone, name)) => ExtractedEntity::new(&title_case(name), &title_case(phone)),
        None => ExtractedEntity::new(&title_case(entity), ""),
    }
}

/// Compiled patterns for the business and paybill splits
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    business: Regex,
    paybill: Regex,
}

impl EntityExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            business: Regex::new(r"(?i)^(.*?)\s+via\s.*?\bis\s+(.*)$")?,
            paybill: Regex::new(r"^(.*?)\s+Acc\.\s+(.*)$")?,
        })
    }

    pub fn extract(&self, strategy: EntityStrategy, entity: &str) -> ExtractedEntity {
        match strategy {
            EntityStrategy::None => ExtractedEntity::verbatim(entity),
            EntityStrategy::Transfer => {
                if looks_like_masked_phone(entity) {
                    split_masked_phone(entity)
                } else {
                    self.business_account(entity)
                }
            }
            EntityStrategy::MaskedPhone => {
                if looks_like_masked_phone(entity) {
                    split_masked_phone(entity)
                } else {
                    ExtractedEntity::verbatim(entity)
                }
            }
            EntityStrategy::BusinessAccount => self.business_account(entity),
            EntityStrategy::Paybill => self.paybill(entity),
            EntityStrategy::WalletName => {
                if looks_like_masked_phone(entity) {
                    ExtractedEntity {
                        account_no: None,
                        ..split_masked_phone(entity)
                    }
                } else {
                    ExtractedEntity::verbatim(entity)
                }
            }
        }
    }

    /// `"Equity Bulk Account Via Api. Original Conversation Id Is 4567"` ->
    /// `("Equity Bulk Account", "4567")`
    pub fn business_account(&self, entity: &str) -> ExtractedEntity {
        match self.business.captures(entity) {
            Some(caps) => ExtractedEntity::new(&caps[1], &caps[2]),
            None => ExtractedEntity::verbatim(entity),
        }
    }

    /// `"Kplc Prepaid Acc. 54321098"` -> `("Kplc Prepaid", "54321098")`
    pub fn paybill(&self, entity: &str) -> ExtractedEntity {
        match self.paybill.captures(entity) {
            Some(caps) => ExtractedEntity::new(&caps[1], &caps[2]),
            None => ExtractedEntity::verbatim(entity),
        }
    }
}
