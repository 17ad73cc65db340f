//! Table-driven checks for the validators, generators and payment methods

use bookprobe_common::generate::{
    consistent_record, generate_plate, generate_vin, simple_hash, PLATE_LEN, VIN_LEN,
};
use bookprobe_common::{is_valid_phone, is_valid_plate, is_valid_vin, CaseTable, PaymentMethod};
use test_case::test_case;

#[test_case("3015363880" ; "fixture phone")]
#[test_case("3000000000" ; "all zeros after prefix")]
#[test_case("3999999999" ; "all nines after prefix")]
fn phone_accepts_ten_digits_starting_with_three(phone: &str) {
    assert!(is_valid_phone(phone));
}

#[test_case("" ; "empty")]
#[test_case("301536388" ; "nine digits")]
#[test_case("30153638801" ; "eleven digits")]
#[test_case("4015363880" ; "wrong leading digit")]
#[test_case("301-536-3880" ; "hyphens")]
#[test_case("301536388a" ; "trailing letter")]
#[test_case("abcdefghij" ; "letters only")]
#[test_case("+573015363880" ; "country prefix")]
fn phone_rejects(phone: &str) {
    assert!(!is_valid_phone(phone));
}

#[test_case("ABC123" ; "upper")]
#[test_case("abc123" ; "lower")]
#[test_case("aBc987" ; "mixed")]
fn plate_accepts(plate: &str) {
    assert!(is_valid_plate(plate));
}

#[test_case("TEST" ; "too short")]
#[test_case("TEST123" ; "four letters")]
#[test_case("TEST12345" ; "too long")]
#[test_case("ABC-123" ; "hyphen")]
#[test_case("TES@123" ; "at sign")]
#[test_case("123456" ; "digits only")]
#[test_case("123ABC" ; "digits first")]
fn plate_rejects(plate: &str) {
    assert!(!is_valid_plate(plate));
}

#[test_case("1HGBH41JXMN109186" ; "real vin")]
#[test_case("12345678901234567" ; "digits")]
#[test_case("ABCDEFGHJKLMNPRST" ; "letters without excluded")]
fn vin_accepts(vin: &str) {
    assert!(is_valid_vin(vin));
}

#[test_case("12345" ; "too short")]
#[test_case("12345678901234567890" ; "too long")]
#[test_case("123-456-789" ; "special characters")]
#[test_case("1HGBH41JXMN10918I" ; "contains I")]
#[test_case("1HGBH41JXMN10918O" ; "contains O")]
#[test_case("1HGBH41JXMN10918Q" ; "contains Q")]
fn vin_rejects(vin: &str) {
    assert!(!is_valid_vin(vin));
}

#[test]
fn builtin_invalid_format_cases_fail_local_validation() {
    let table = CaseTable::builtin();
    assert!(table.invalid_plates.iter().all(|c| !is_valid_plate(&c.record.plate)));
    assert!(table.invalid_phones.iter().all(|c| !is_valid_phone(&c.record.phone)));
    assert!(table.invalid_vins.iter().all(|c| !is_valid_vin(&c.record.vin)));
}

#[test]
fn seeded_record_is_deterministic() {
    let first = consistent_record("regression");
    let second = consistent_record("regression");
    assert_eq!(first, second);
    assert_ne!(first.plate, consistent_record("other seed").plate);
}

#[test]
fn seeded_record_values_are_well_formed() {
    for seed in ["test", "a", "Zürich", "0", "a long seed with spaces"] {
        let record = consistent_record(seed);
        assert!(is_valid_phone(&record.phone), "phone {}", record.phone);
        assert!(is_valid_plate(&record.plate), "plate {}", record.plate);
        assert!(is_valid_vin(&record.vin), "vin {}", record.vin);
        let mileage: u64 = record.mileage.parse().unwrap();
        assert!((1_000..201_000).contains(&mileage));
    }
}

#[test_case(0 ; "zero")]
#[test_case(1 ; "one")]
#[test_case(3_556_498 ; "hash of test")]
#[test_case(u32::MAX ; "max")]
fn generated_lengths_are_fixed(hash: u32) {
    assert_eq!(generate_plate(hash).len(), PLATE_LEN);
    assert_eq!(generate_vin(hash).len(), VIN_LEN);
}

#[test]
fn seed_test_always_yields_same_plate() {
    let plates: Vec<String> = (0..5).map(|_| generate_plate(simple_hash("test"))).collect();
    assert!(plates.iter().all(|p| p == "KRY814"));
}

#[test_case("credit_card", PaymentMethod::CreditCard ; "credit snake")]
#[test_case("credit card", PaymentMethod::CreditCard ; "credit spaced")]
#[test_case("ideal", PaymentMethod::Ideal ; "ideal lower")]
#[test_case("iDEAL", PaymentMethod::Ideal ; "ideal brand")]
#[test_case("debit_card", PaymentMethod::DebitCard ; "debit snake")]
#[test_case("debit card", PaymentMethod::DebitCard ; "debit spaced")]
#[test_case("bank_transfer", PaymentMethod::BankTransfer ; "bank snake")]
#[test_case("bank transfer", PaymentMethod::BankTransfer ; "bank spaced")]
fn payment_method_parses(input: &str, expected: PaymentMethod) {
    assert_eq!(input.parse::<PaymentMethod>().unwrap(), expected);
}

#[test_case("paypal" ; "unsupported")]
#[test_case("IDEAL" ; "wrong case")]
#[test_case("" ; "empty")]
fn payment_method_rejects(input: &str) {
    let err = input.parse::<PaymentMethod>().unwrap_err();
    assert!(err.to_string().starts_with("Unknown payment method"));
}
