//! Contract assembly pipeline services

pub mod contract_writer;
pub mod document;
pub mod loan_property;
pub mod notifications;
pub mod numbering;
pub mod paragraphs;
pub mod participants;
pub mod pipeline;
