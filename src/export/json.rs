use anyhow::Result;
use std::io::Write;

use crate::state::Statistics;

/// Export the final statistics snapshot as pretty-printed JSON
pub fn export_json<W: Write>(stats: &Statistics, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, stats)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IpFamily;
    use crate::state::Target;
    use chrono::Utc;

    #[test]
    fn test_export_json_roundtrips_through_serde_value() {
        let target = Target::new(
            "example.com".into(),
            "192.0.2.1".parse().unwrap(),
            80,
            IpFamily::Any,
        );
        let stats = Statistics::new(target, Utc::now());

        let mut buf = Vec::new();
        export_json(&stats, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["target"]["original"], "example.com");
        assert_eq!(value["total_successful"], 0);
    }
}
