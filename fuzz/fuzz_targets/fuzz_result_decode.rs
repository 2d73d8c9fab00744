#![no_main]

use custody_transactions::{decode, DecodedResult, OperationKind};
use libfuzzer_sys::fuzz_target;

const SHAPES: [&[OperationKind]; 4] = [
    &[OperationKind::Payment],
    &[OperationKind::ClaimClaimableBalance, OperationKind::Payment],
    &[OperationKind::CreateClaimableBalance],
    &[],
];

// Decoding arbitrary result payloads must never panic, and a success must
// carry exactly one result per submitted operation.
fuzz_target!(|data: &[u8]| {
    for submitted in SHAPES {
        if let Ok(DecodedResult::Success { operations, .. }) = decode(data, submitted) {
            assert_eq!(operations.len(), submitted.len());
        }
    }
});
