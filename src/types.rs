//! Core data model shared by every pipeline stage.
//!
//! An [`AdjacencyRecord`] is the unit of state flowing between stages: one
//! record per node, carrying the node's current rank and its outgoing
//! targets. The graph structure is re-emitted by every propagator iteration,
//! so it survives all iterations without being re-parsed.
//!
//! Both record types have a stable single-line text form for substrates that
//! shuffle byte records:
//!
//! ```text
//! id<TAB>rank<TAB>t1,t2,...     (AdjacencyRecord; third field empty when dangling)
//! id<TAB>rank                   (RankedEntry)
//! ```
//!
//! Rust's float formatting is shortest-round-trip, so `Display` → `FromStr`
//! reproduces the rank bit-for-bit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pipeline::errors::RecordError;

/// One node's adjacency state: identifier, current rank, outgoing targets.
///
/// A record with an empty target list is a *dangling node* — its rank is
/// redistributed uniformly instead of being routed along edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyRecord {
    /// Unique node identifier.
    pub id: String,
    /// Current rank. Uniform `1/N` after parsing.
    pub rank: f64,
    /// Outgoing target identifiers. Order is preserved but not significant.
    pub targets: Vec<String>,
}

impl AdjacencyRecord {
    pub fn new(id: impl Into<String>, rank: f64, targets: Vec<String>) -> Self {
        Self {
            id: id.into(),
            rank,
            targets,
        }
    }

    /// A node with no outgoing edges.
    pub fn is_dangling(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of outgoing edges, counting duplicates.
    pub fn out_degree(&self) -> usize {
        self.targets.len()
    }

    /// Copy of this record with a new rank and the same structure.
    pub fn with_rank(&self, rank: f64) -> Self {
        Self {
            id: self.id.clone(),
            rank,
            targets: self.targets.clone(),
        }
    }
}

impl fmt::Display for AdjacencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.id, self.rank, self.targets.join(","))
    }
}

impl FromStr for AdjacencyRecord {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.splitn(3, '\t');
        let id = fields.next().filter(|s| !s.is_empty()).ok_or(RecordError::MissingField("id"))?;
        let rank_field = fields.next().ok_or(RecordError::MissingField("rank"))?;
        let rank: f64 = rank_field
            .parse()
            .map_err(|_| RecordError::InvalidRank(rank_field.to_string()))?;
        if !rank.is_finite() || rank < 0.0 {
            return Err(RecordError::InvalidRank(rank_field.to_string()));
        }
        let targets = match fields.next() {
            None | Some("") => Vec::new(),
            Some(list) => list.split(',').map(str::to_string).collect(),
        };
        Ok(Self {
            id: id.to_string(),
            rank,
            targets,
        })
    }
}

/// Final output unit: `(id, rank)`, ordered rank-descending by the sorter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub id: String,
    pub rank: f64,
}

impl RankedEntry {
    pub fn new(id: impl Into<String>, rank: f64) -> Self {
        Self {
            id: id.into(),
            rank,
        }
    }
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.id, self.rank)
    }
}

impl FromStr for RankedEntry {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.splitn(2, '\t');
        let id = fields.next().filter(|s| !s.is_empty()).ok_or(RecordError::MissingField("id"))?;
        let rank_field = fields.next().ok_or(RecordError::MissingField("rank"))?;
        let rank: f64 = rank_field
            .parse()
            .map_err(|_| RecordError::InvalidRank(rank_field.to_string()))?;
        Ok(Self {
            id: id.to_string(),
            rank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dangling_detection() {
        let rec = AdjacencyRecord::new("a", 0.5, vec![]);
        assert!(rec.is_dangling());
        assert_eq!(rec.out_degree(), 0);

        let rec = AdjacencyRecord::new("a", 0.5, vec!["b".into()]);
        assert!(!rec.is_dangling());
        assert_eq!(rec.out_degree(), 1);
    }

    #[test]
    fn test_with_rank_keeps_structure() {
        let rec = AdjacencyRecord::new("a", 0.25, vec!["b".into(), "c".into()]);
        let updated = rec.with_rank(0.75);
        assert_eq!(updated.id, "a");
        assert_eq!(updated.targets, rec.targets);
        assert_eq!(updated.rank, 0.75);
    }

    #[test]
    fn test_adjacency_line_round_trip() {
        let rec = AdjacencyRecord::new("page1", 1.0 / 3.0, vec!["page2".into(), "page3".into()]);
        let line = rec.to_string();
        let back: AdjacencyRecord = line.parse().unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_dangling_line_round_trip() {
        let rec = AdjacencyRecord::new("sink", 0.05, vec![]);
        let line = rec.to_string();
        assert_eq!(line, "sink\t0.05\t");
        let back: AdjacencyRecord = line.parse().unwrap();
        assert_eq!(back, rec);
        assert!(back.is_dangling());
    }

    #[test]
    fn test_malformed_lines_rejected() {
        assert!("".parse::<AdjacencyRecord>().is_err());
        assert!("only-id".parse::<AdjacencyRecord>().is_err());
        assert!("id\tnot-a-number\tb".parse::<AdjacencyRecord>().is_err());
        assert!("id\tNaN\tb".parse::<AdjacencyRecord>().is_err());
        assert!("id\t-0.5\tb".parse::<AdjacencyRecord>().is_err());
    }

    #[test]
    fn test_ranked_entry_round_trip() {
        let entry = RankedEntry::new("page1", 0.6166666666666667);
        let back: RankedEntry = entry.to_string().parse().unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_serde_round_trip() {
        let rec = AdjacencyRecord::new("a", 0.5, vec!["b".into()]);
        let json = serde_json::to_string(&rec).unwrap();
        let back: AdjacencyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    proptest! {
        #[test]
        fn prop_line_round_trip_is_identity(
            id in "[a-z][a-z0-9_.-]{0,12}",
            rank in 0.0f64..1.0,
            targets in proptest::collection::vec("[a-z][a-z0-9]{0,8}", 0..6),
        ) {
            let rec = AdjacencyRecord::new(id, rank, targets);
            let back: AdjacencyRecord = rec.to_string().parse().unwrap();
            prop_assert_eq!(back, rec);
        }
    }
}
