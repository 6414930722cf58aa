use chrono::{SecondsFormat, TimeZone, Utc};

// Everything is stored as Unix timestamps (seconds) and
// the API speaks RFC 3339 in UTC, e.g. 2021-03-07T20:59:00Z
pub fn timestamp_to_iso_string(timestamp: i64) -> String {
  match Utc.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
    // Out of range timestamps can't be produced by the app
    // itself, the raw value is better than nothing:
    None => timestamp.to_string()
  }
}

pub fn current_timestamp() -> i64 {
  Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamp_formats_as_expected() {
    let timestamp: i64 = 1615150740;
    assert_eq!("2021-03-07T20:59:00Z", timestamp_to_iso_string(timestamp));
  }

  #[test]
  fn epoch_formats_as_expected() {
    assert_eq!("1970-01-01T00:00:00Z", timestamp_to_iso_string(0));
  }

}
