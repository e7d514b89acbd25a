/// Round to two decimals, the precision attendance hours and leave
/// day counts are displayed with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(8.333333), 8.33);
        assert_eq!(round2(7.995), 8.0);
        assert_eq!(round2(0.0), 0.0);
    }
}
