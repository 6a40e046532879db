//! Contract number allocation
//!
//! Numbers come from a per-type monotonic sequence. When the sequence
//! storage is unreachable the allocator degrades to a timestamp composite
//! with a uuid suffix; the suffix keeps concurrent fallback allocations
//! within the same second from colliding.

use chrono::{Datelike, Local};
use tracing::warn;
use uuid::Uuid;

use crate::db::{self, DbPool};

#[derive(Debug, Clone)]
pub struct AllocatedNumber {
    pub number: String,
    /// True when the sequence was unreachable and the degraded composite
    /// was used. Surfaced as a warning on the response.
    pub fallback: bool,
}

pub struct ContractNumberAllocator {
    pool: DbPool,
}

impl ContractNumberAllocator {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn allocate(&self, contract_type: &str) -> AllocatedNumber {
        let type_label = contract_type.to_uppercase();
        match db::db_next_contract_sequence(&self.pool, contract_type).await {
            Ok(sequence) => AllocatedNumber {
                number: format!("{}-{}-{:06}", type_label, Local::now().year(), sequence),
                fallback: false,
            },
            Err(err) => {
                warn!(error = %err, contract_type, "Sequence allocation failed, using fallback number");
                AllocatedNumber {
                    number: fallback_number(&type_label),
                    fallback: true,
                }
            }
        }
    }
}

fn fallback_number(type_label: &str) -> String {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", type_label, stamp, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_numbers_are_unique_within_a_second() {
        let a = fallback_number("MORTGAGE");
        let b = fallback_number("MORTGAGE");
        assert_ne!(a, b);
        assert!(a.starts_with("MORTGAGE-"));
        // TYPE-YYYYMMDD-HHMMSS-xxxxxxxx
        assert_eq!(a.split('-').count(), 4);
    }
}
