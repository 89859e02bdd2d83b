//! Printable implementation for the bridge listing.

use std::io::Write;

use crate::bridge::BridgeInfo;
use crate::output::{OutputOptions, Printable};

/// Column widths: interface name (IFNAMSIZ + 2), bridge id, STP, ports.
const WIDTHS: [usize; 4] = [18, 19, 16, 10];

/// The `brctl show` table.
///
/// The header line is printed when there are rows, unless overridden with
/// [`header`](Self::header).
#[derive(Debug, Clone, Copy)]
pub struct BridgeTable<'a> {
    rows: &'a [BridgeInfo],
    header: bool,
}

impl<'a> BridgeTable<'a> {
    /// Table over `rows`.
    pub fn new(rows: &'a [BridgeInfo]) -> Self {
        Self {
            rows,
            header: !rows.is_empty(),
        }
    }

    /// Force the header line on or off.
    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }
}

fn write_row<W: Write>(w: &mut W, cols: [&str; 4]) -> std::io::Result<()> {
    let [name, id, stp, ports] = cols;
    writeln!(
        w,
        "{:<w0$}{:<w1$}{:<w2$}{:<w3$}",
        name,
        id,
        stp,
        ports,
        w0 = WIDTHS[0],
        w1 = WIDTHS[1],
        w2 = WIDTHS[2],
        w3 = WIDTHS[3],
    )
}

impl Printable for BridgeInfo {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        let stp = if self.stp_enabled { "yes" } else { "no" };
        write_row(w, [&self.name, &self.id, stp, &self.interfaces.join(" ")])
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "id": self.id,
            "stp_enabled": self.stp_enabled,
            "interfaces": self.interfaces,
        })
    }
}

impl Printable for BridgeTable<'_> {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        if self.header {
            write_row(w, ["bridge name", "bridge id", "STP enabled", "interfaces"])?;
        }
        for bridge in self.rows {
            bridge.print_text(w, opts)?;
        }
        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.rows.iter().map(Printable::to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn sample() -> Vec<BridgeInfo> {
        vec![
            BridgeInfo {
                name: "br0".into(),
                id: "8000.000000000000".into(),
                stp_enabled: false,
                interfaces: vec!["eth0".into(), "eth1".into()],
            },
            BridgeInfo {
                name: "br1".into(),
                id: "8000.aabbccddeeff".into(),
                stp_enabled: true,
                interfaces: vec![],
            },
        ]
    }

    fn render(table: BridgeTable<'_>, format: OutputFormat, pretty: bool) -> String {
        let mut out = Vec::new();
        table
            .print(&mut out, format, &OutputOptions { pretty })
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_table() {
        let bridges = sample();
        let text = render(BridgeTable::new(&bridges), OutputFormat::Text, false);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "bridge name       bridge id          STP enabled     interfaces"
        );
        assert_eq!(
            lines[1],
            "br0               8000.000000000000  no              eth0 eth1 "
        );
        assert_eq!(
            lines[2],
            format!("br1               8000.aabbccddeeff  yes             {:10}", "")
        );
    }

    #[test]
    fn test_empty_table_prints_nothing() {
        assert_eq!(render(BridgeTable::new(&[]), OutputFormat::Text, false), "");
        assert_eq!(render(BridgeTable::new(&[]), OutputFormat::Json, false), "[]\n");
    }

    #[test]
    fn test_header_without_selected_rows() {
        let text = render(BridgeTable::new(&[]).header(true), OutputFormat::Text, false);
        assert_eq!(
            text,
            "bridge name       bridge id          STP enabled     interfaces\n"
        );

        let bridges = sample();
        let text = render(
            BridgeTable::new(&bridges).header(false),
            OutputFormat::Text,
            false,
        );
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("br0 "));
    }

    #[test]
    fn test_json_table() {
        let bridges = sample();
        let text = render(BridgeTable::new(&bridges), OutputFormat::Json, false);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value[0]["name"], "br0");
        assert_eq!(value[0]["interfaces"], serde_json::json!(["eth0", "eth1"]));
        assert_eq!(value[1]["stp_enabled"], true);
    }

    #[test]
    fn test_json_matches_serialize() {
        let bridges = sample();
        assert_eq!(
            bridges[0].to_json(),
            serde_json::to_value(&bridges[0]).unwrap()
        );
    }

    #[test]
    fn test_pretty_json_is_multiline() {
        let bridges = sample();
        let text = render(BridgeTable::new(&bridges), OutputFormat::Json, true);
        assert!(text.lines().count() > 2);
    }
}
