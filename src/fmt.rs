/// Format whole pounds with thousands separators: £1,234,567
pub fn pounds(val: u64) -> String {
    let digits = val.to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();
    format!("£{with_commas}")
}

/// Signed percentage to one decimal place: +20.0%
pub fn signed_pct(val: f64) -> String {
    format!("{val:+.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pounds_formatting() {
        assert_eq!(pounds(0), "£0");
        assert_eq!(pounds(950), "£950");
        assert_eq!(pounds(250000), "£250,000");
        assert_eq!(pounds(1234567), "£1,234,567");
    }

    #[test]
    fn test_signed_pct() {
        assert_eq!(signed_pct(20.0), "+20.0%");
        assert_eq!(signed_pct(-4.26), "-4.3%");
        assert_eq!(signed_pct(0.0), "+0.0%");
    }
}
