//! Code-unit input contract.
//!
//! The engine consumes a pre-analyzed summary of one code unit — which
//! variables each statement reads and writes, and which control region it
//! belongs to — produced by an external static-analysis component. Nothing
//! here parses source text.

use serde::{Deserialize, Serialize};

/// Location of a statement or declaration in the original source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: u32,
}

impl SourceLocation {
    pub fn line(line: u32) -> Self {
        Self { file: None, line }
    }
}

/// What a statement does with the values it computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// Ordinary assignment to one or more local variables.
    Assign,
    /// Produces the unit's return value.
    Return,
    /// Writes to an externally-observable diagnostic sink (log, print).
    Emit,
    /// Writes to persisted state (file, database, global).
    Persist,
}

/// One statement of the analyzed unit, reduced to its variable footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// Variables whose values this statement reads.
    pub reads: Vec<String>,
    /// Variables this statement assigns.
    pub writes: Vec<String>,
    pub kind: StatementKind,
    /// Control region this statement executes under, if any.
    pub region: Option<u32>,
    pub location: SourceLocation,
}

impl Statement {
    pub fn assign(
        reads: &[&str],
        writes: &[&str],
        region: Option<u32>,
        line: u32,
    ) -> Self {
        Self {
            reads: reads.iter().map(|s| s.to_string()).collect(),
            writes: writes.iter().map(|s| s.to_string()).collect(),
            kind: StatementKind::Assign,
            region,
            location: SourceLocation::line(line),
        }
    }

    pub fn ret(reads: &[&str], line: u32) -> Self {
        Self {
            reads: reads.iter().map(|s| s.to_string()).collect(),
            writes: Vec::new(),
            kind: StatementKind::Return,
            region: None,
            location: SourceLocation::line(line),
        }
    }

    pub fn emit(reads: &[&str], sink: &str, region: Option<u32>, line: u32) -> Self {
        Self {
            reads: reads.iter().map(|s| s.to_string()).collect(),
            writes: vec![sink.to_string()],
            kind: StatementKind::Emit,
            region,
            location: SourceLocation::line(line),
        }
    }

    pub fn persist(reads: &[&str], sink: &str, region: Option<u32>, line: u32) -> Self {
        Self {
            reads: reads.iter().map(|s| s.to_string()).collect(),
            writes: vec![sink.to_string()],
            kind: StatementKind::Persist,
            region,
            location: SourceLocation::line(line),
        }
    }
}

/// Kind of a control region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Branch,
    Loop,
}

/// A branch or loop body, identified by the variables its condition reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRegion {
    pub id: u32,
    pub kind: RegionKind,
    /// Variables read by the branch/loop condition.
    pub condition_reads: Vec<String>,
}

impl ControlRegion {
    pub fn branch(id: u32, condition_reads: &[&str]) -> Self {
        Self {
            id,
            kind: RegionKind::Branch,
            condition_reads: condition_reads.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn looped(id: u32, condition_reads: &[&str]) -> Self {
        Self {
            id,
            kind: RegionKind::Loop,
            condition_reads: condition_reads.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One code unit (function, method) reduced to its variable-flow structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeUnit {
    pub name: String,
    /// Formal parameters, the root nodes of the causal graph.
    pub parameters: Vec<String>,
    pub statements: Vec<Statement>,
    pub regions: Vec<ControlRegion>,
}

impl CodeUnit {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            statements: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, params: &[&str]) -> Self {
        self.parameters = params.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_region(mut self, region: ControlRegion) -> Self {
        self.regions.push(region);
        self
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn region(&self, id: u32) -> Option<&ControlRegion> {
        self.regions.iter().find(|r| r.id == id)
    }
}

/// Optional function-level call edges supplied alongside the unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraphInput {
    /// Function identifiers appearing in `calls`.
    pub functions: Vec<String>,
    /// Directed caller → callee pairs.
    pub calls: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_builder() {
        let unit = CodeUnit::new("scale")
            .with_parameters(&["x"])
            .with_statement(Statement::assign(&["x"], &["y"], None, 2))
            .with_statement(Statement::ret(&["y"], 3));

        assert_eq!(unit.parameters, vec!["x"]);
        assert_eq!(unit.statements.len(), 2);
        assert_eq!(unit.statements[1].kind, StatementKind::Return);
    }

    #[test]
    fn test_region_lookup() {
        let unit = CodeUnit::new("f")
            .with_region(ControlRegion::branch(0, &["cond"]))
            .with_region(ControlRegion::looped(1, &["i"]));

        assert_eq!(unit.region(1).unwrap().kind, RegionKind::Loop);
        assert!(unit.region(7).is_none());
    }
}
