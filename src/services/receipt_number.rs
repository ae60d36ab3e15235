//! Generación de números de recibo
//!
//! Formato `RCP-YYYYMMDD-NNNNNN`. El sufijo sale de un contador monótono del
//! proceso sembrado con los milisegundos del reloj; la unicidad definitiva la
//! garantiza la restricción UNIQUE del almacén.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

const SUFFIX_MODULUS: u64 = 1_000_000;

#[derive(Debug)]
pub struct ReceiptNumberGenerator {
    counter: AtomicU64,
}

impl ReceiptNumberGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            counter: AtomicU64::new(seed),
        }
    }

    /// Siembra el contador con los milisegundos del instante dado
    pub fn seeded_from(now: DateTime<Utc>) -> Self {
        Self::new(now.timestamp_millis().max(0) as u64)
    }

    pub fn next(&self, now: DateTime<Utc>) -> String {
        let value = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("RCP-{}-{:06}", now.format("%Y%m%d"), value % SUFFIX_MODULUS)
    }
}
