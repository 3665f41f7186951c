/// Checks an order number against the Luhn check-digit algorithm.
///
/// Order numbers are digit strings whose last digit is a checksum over the rest. Anything containing a non-digit,
/// or shorter than two characters, fails outright.
pub fn luhn_valid(number: &str) -> bool {
    if number.len() < 2 || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = number
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_valid_numbers() {
        for number in ["12345678903", "79927398713", "4561261212345467", "49927398716"] {
            assert!(luhn_valid(number), "{number} should pass the check");
        }
    }

    #[test]
    fn rejects_invalid_checksums() {
        for number in ["12345678904", "79927398710", "4561261212345464"] {
            assert!(!luhn_valid(number), "{number} should fail the check");
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for number in ["", "0", "12345a78903", "1234-5678", " 12345678903"] {
            assert!(!luhn_valid(number), "{number:?} should fail the check");
        }
    }
}
