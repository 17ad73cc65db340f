//! Test-data generators
//!
//! Random generators give varied input across runs. The seeded variants
//! derive the same values from the same seed string so a failing run can
//! be replayed.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::FormRecord;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const VIN_CHARS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ0123456789";

const FIRST_NAMES: &[&str] = &["Carlos", "Juan", "María", "Pedro", "Ana", "Luis", "Sofía", "Diego"];
const LAST_NAMES: &[&str] = &["Gallego", "Pérez", "García", "Rodríguez", "Martínez", "López", "González"];

pub const PLATE_LEN: usize = 6;
pub const VIN_LEN: usize = 17;

/// Three letters and three digits, e.g. `ABC123`
pub fn random_plate() -> String {
    let mut rng = rand::thread_rng();
    let mut plate = String::with_capacity(PLATE_LEN);
    for _ in 0..3 {
        plate.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
    }
    for _ in 0..3 {
        plate.push(DIGITS[rng.gen_range(0..DIGITS.len())] as char);
    }
    plate
}

/// Ten-digit mobile number starting with 3
pub fn random_phone() -> String {
    let mut rng = rand::thread_rng();
    let mut phone = String::from("3");
    for _ in 0..9 {
        phone.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    phone
}

pub fn random_vin() -> String {
    let mut rng = rand::thread_rng();
    (0..VIN_LEN)
        .map(|_| VIN_CHARS[rng.gen_range(0..VIN_CHARS.len())] as char)
        .collect()
}

/// Realistic odometer reading between 1,000 and 200,999 km
pub fn random_mileage() -> u32 {
    rand::thread_rng().gen_range(1_000..201_000)
}

pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Carlos");
    let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Gallego");
    format!("{} {}", first, last)
}

/// `base` with every generated field replaced
pub fn random_record(base: &FormRecord) -> FormRecord {
    FormRecord {
        phone: random_phone(),
        name: random_name(),
        plate: random_plate(),
        mileage: random_mileage().to_string(),
        vin: random_vin(),
        ..base.clone()
    }
}

/// `h = h * 31 + unit` over UTF-16 code units, wrapped to 32 bits
pub fn simple_hash(seed: &str) -> u32 {
    let hash = seed
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

/// Fractional part of `sin(seed) * 10000`, in `[0, 1)`
pub fn seeded_random(seed: u32) -> f64 {
    let x = (seed as f64).sin() * 10_000.0;
    x - x.floor()
}

pub fn generate_plate(hash: u32) -> String {
    let hash = hash as u64;
    let mut plate = String::with_capacity(PLATE_LEN);
    for i in 0..3u64 {
        plate.push(LETTERS[((hash + i * 7) % 26) as usize] as char);
    }
    for i in 0..3u64 {
        plate.push(DIGITS[((hash + i * 13) % 10) as usize] as char);
    }
    plate
}

pub fn generate_vin(hash: u32) -> String {
    let hash = hash as u64;
    (0..VIN_LEN as u64)
        .map(|i| VIN_CHARS[((hash + i * 17) % VIN_CHARS.len() as u64) as usize] as char)
        .collect()
}

/// Reproducible record derived from a seed string
pub fn consistent_record(seed: &str) -> FormRecord {
    let hash = simple_hash(seed);
    let phone_draw = seeded_random(hash);
    let mileage_draw = seeded_random(hash.wrapping_add(1));

    FormRecord {
        phone: format!("3{:09}", (phone_draw * 1_000_000_000.0).floor() as u64),
        name: format!("Test User {}", seed),
        plate: generate_plate(hash),
        vin: generate_vin(hash),
        mileage: ((mileage_draw * 200_000.0 + 1_000.0).floor() as u64).to_string(),
        ..FormRecord::default()
    }
}

/// `1h 2m 3s`, `2m 3s` or `3s`
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{is_valid_phone, is_valid_plate, is_valid_vin};

    #[test]
    fn test_random_values_pass_validators() {
        for _ in 0..50 {
            assert!(is_valid_phone(&random_phone()));
            assert!(is_valid_plate(&random_plate()));
            assert!(is_valid_vin(&random_vin()));
            let mileage = random_mileage();
            assert!((1_000..201_000).contains(&mileage));
        }
    }

    #[test]
    fn test_random_name_has_two_parts() {
        assert_eq!(random_name().split(' ').count(), 2);
    }

    #[test]
    fn test_simple_hash_known_value() {
        assert_eq!(simple_hash(""), 0);
        assert_eq!(simple_hash("test"), 3_556_498);
    }

    #[test]
    fn test_simple_hash_wraps_long_input() {
        // overflows 32 bits several times
        assert_eq!(simple_hash(&"a".repeat(40)), 1_042_809_472);
    }

    #[test]
    fn test_seeded_random_range() {
        for seed in [0u32, 1, 42, 3_556_498, u32::MAX] {
            let r = seeded_random(seed);
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn test_generate_vin_known_value() {
        assert_eq!(generate_vin(3_556_498), "ZG0H1J2K3L4M5N6P7");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3_000), "3s");
        assert_eq!(format_duration(123_000), "2m 3s");
        assert_eq!(format_duration(3_723_000), "1h 2m 3s");
    }
}
