use super::YearMonth;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| anyhow!("invalid test date"))
}

#[test]
fn test_year_month_formats_label_and_compact_form() -> Result<()> {
    let year_month = YearMonth::from(date(2023, 9, 1)?);

    assert_eq!(year_month.to_string(), "2023/09");
    assert_eq!(year_month.compact(), "202309");

    Ok(())
}

#[test]
fn test_year_month_orders_chronologically() -> Result<()> {
    let december = YearMonth::from(date(2022, 12, 25)?);
    let january = YearMonth::from(date(2023, 1, 2)?);
    let later_january = YearMonth::from(date(2023, 1, 30)?);

    assert!(december < january);
    assert_eq!(january, later_january);

    Ok(())
}

