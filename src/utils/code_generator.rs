use rand::Rng;

/// Six-digit numeric code in 000000..=999999, zero padded.
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..=999_999u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_six_digit_code() {
        let code = generate_six_digit_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let code_num: u32 = code.parse().unwrap();
        assert!(code_num <= 999_999);
    }

    #[test]
    fn test_codes_are_always_zero_padded() {
        for _ in 0..1000 {
            assert_eq!(generate_six_digit_code().len(), 6);
        }
    }
}
