use chrono::NaiveDate;
use rust_decimal::Decimal;

pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Month number (1-12) to its Portuguese name.
pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(idx).copied()
}

/// Format a decimal as Brazilian reais with thousands separators: R$ 1.234,56
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let cents = format!("{:.2}", val.abs().round_dp(2));
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-R$ {with_dots},{dec_part}")
    } else {
        format!("R$ {with_dots},{dec_part}")
    }
}

/// dd/mm/yyyy
pub fn date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(Decimal::new(123456, 2)), "R$ 1.234,56");
        assert_eq!(money(Decimal::new(-500, 0)), "-R$ 500,00");
        assert_eq!(money(Decimal::ZERO), "R$ 0,00");
        assert_eq!(money(Decimal::new(100000099, 2)), "R$ 1.000.000,99");
        assert_eq!(money(Decimal::new(421, 1)), "R$ 42,10");
    }

    #[test]
    fn test_money_rounds_to_cents() {
        assert_eq!(money(Decimal::new(10005, 3)), "R$ 10,00");
        assert_eq!(money(Decimal::new(10006, 3)), "R$ 10,01");
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1), Some("Janeiro"));
        assert_eq!(month_name(3), Some("Março"));
        assert_eq!(month_name(12), Some("Dezembro"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_date_br() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(date_br(d), "05/01/2024");
    }
}
