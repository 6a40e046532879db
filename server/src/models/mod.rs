//! Database row types and wire-level request DTOs

pub mod company;
pub mod contract;
pub mod loan;
pub mod paragraph;
pub mod participant;
pub mod property;
pub mod referral;
pub mod request;

pub use company::{Company, NewCompany, NewCompanyAddress, NewCompanyManager};
pub use contract::{Contract, NewContract};
pub use loan::{BankAccountType, ContractLoan, NewBankAccount, NewContractLoan};
pub use paragraph::{ContractParagraph, NewContractParagraph};
pub use participant::{
    NewContractParticipant, ParticipantRole, Resolution, ResolvedParticipant,
};
pub use property::{ContractProperty, NewContractProperty, NewProperty, Property};
pub use referral::{ClientReferrer, NewClientReferrer};
pub use request::ContractRequest;
