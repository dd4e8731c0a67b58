//! ## lookout-core::summary
//! **Per-table aggregates**
//!
//! Label counts always carry all three verdict buckets, even when zero.
//! Attack-type counts only consider `ATTACK` rows with a non-missing type.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::table::{Label, ResultTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    #[serde(rename = "BENIGN")]
    pub benign: u64,
    #[serde(rename = "ANOMALY")]
    pub anomaly: u64,
    #[serde(rename = "ATTACK")]
    pub attack: u64,
}

impl LabelCounts {
    pub fn record(&mut self, label: Label) {
        match label {
            Label::Benign => self.benign += 1,
            Label::Anomaly => self.anomaly += 1,
            Label::Attack => self.attack += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.benign + self.anomaly + self.attack
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSummary {
    pub flows: usize,
    pub summary: LabelCounts,
    pub attack_types: BTreeMap<String, u64>,
    /// Rows whose label was missing or outside the known set.
    #[serde(skip)]
    pub unrecognized: usize,
}

impl TableSummary {
    pub fn from_table(table: &ResultTable) -> Self {
        let mut summary = Self {
            flows: table.len(),
            ..Self::default()
        };

        for row in table.rows() {
            match table.label(row) {
                Some(label) => {
                    summary.summary.record(label);
                    if label == Label::Attack {
                        if let Some(kind) = table.attack_type(row) {
                            *summary.attack_types.entry(kind).or_insert(0) += 1;
                        }
                    }
                }
                None => summary.unrecognized += 1,
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_three_buckets_and_attack_types() {
        let csv = "\
flow_id,Label,Attack_Type
1,BENIGN,
2,BENIGN,
3,ATTACK,SYN-flood
";
        let table = ResultTable::from_reader(csv.as_bytes()).unwrap();
        let summary = TableSummary::from_table(&table);

        assert_eq!(summary.flows, 3);
        assert_eq!(
            summary.summary,
            LabelCounts {
                benign: 2,
                anomaly: 0,
                attack: 1
            }
        );
        assert_eq!(summary.attack_types.len(), 1);
        assert_eq!(summary.attack_types["SYN-flood"], 1);
    }

    #[test]
    fn attack_types_ignore_non_attack_rows_and_missing_values() {
        let csv = "\
Label,Attack_Type
ANOMALY,PortScan
ATTACK,
ATTACK,nan
ATTACK,DDoS
ATTACK,DDoS
";
        let table = ResultTable::from_reader(csv.as_bytes()).unwrap();
        let summary = TableSummary::from_table(&table);

        assert_eq!(summary.summary.attack, 4);
        assert_eq!(summary.attack_types.len(), 1);
        assert_eq!(summary.attack_types["DDoS"], 2);
    }

    #[test]
    fn unknown_labels_are_tolerated() {
        let csv = "Label\nBENIGN\nweird\n\n";
        let table = ResultTable::from_reader(csv.as_bytes()).unwrap();
        let summary = TableSummary::from_table(&table);

        assert_eq!(summary.flows, 2);
        assert_eq!(summary.summary.total(), 1);
        assert_eq!(summary.unrecognized, 1);
    }

    #[test]
    fn table_without_attack_type_column() {
        let table = ResultTable::from_reader("Label\nATTACK\n".as_bytes()).unwrap();
        let summary = TableSummary::from_table(&table);
        assert_eq!(summary.summary.attack, 1);
        assert!(summary.attack_types.is_empty());
    }

    #[test]
    fn serializes_with_uppercase_buckets() {
        let json = serde_json::to_value(TableSummary::default()).unwrap();
        assert_eq!(json["summary"]["BENIGN"], 0);
        assert_eq!(json["summary"]["ANOMALY"], 0);
        assert_eq!(json["summary"]["ATTACK"], 0);
        assert!(json.get("unrecognized").is_none());
    }
}
