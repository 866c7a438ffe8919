//! Solver-agnostic sparse linear model.
//!
//! A [`LinearModel`] holds named variables with bounds and integrality,
//! coefficient rows with a sense and right-hand side, and a linear
//! objective to minimise. Rows are stored as `(VarId, coefficient)` lists;
//! nothing dense is ever built.

use crate::builder::ConstraintFamily;
use indexmap::IndexMap;
use mep_core::ElementKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(usize);

impl VarId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a variable measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    /// Generator input energy per hour
    Generation,
    /// Surplus output thrown away at one output bus
    DumpEnergy,
    /// Capacity held back for a power reserve
    Reserve,
    Capacity,
    /// Capacity built in a decision year
    CapacityIncrease,
    StorageGeneration,
    StorageLoad,
    StateOfCharge,
    Flow,
    EnergyNotServed,
    ShiftMinus,
    ShiftPlus,
    /// Share of an aggregate's consumers in one stack
    Fraction,
    /// Output of a tagged unit reserved for one demand chunk
    ChunkGeneration,
}

impl VarKind {
    pub fn short_name(self) -> &'static str {
        match self {
            VarKind::Generation => "gen",
            VarKind::DumpEnergy => "dump",
            VarKind::Reserve => "reserve",
            VarKind::Capacity => "cap",
            VarKind::CapacityIncrease => "cap_plus",
            VarKind::StorageGeneration => "stor_gen",
            VarKind::StorageLoad => "stor_load",
            VarKind::StateOfCharge => "soc",
            VarKind::Flow => "flow",
            VarKind::EnergyNotServed => "ens",
            VarKind::ShiftMinus => "shift_minus",
            VarKind::ShiftPlus => "shift_plus",
            VarKind::Fraction => "frac",
            VarKind::ChunkGeneration => "gen_dch",
        }
    }
}

impl std::fmt::Display for VarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Identity of a variable in terms of the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarKey {
    pub element: ElementKind,
    pub entity: String,
    pub kind: VarKind,
    /// Energy type, reserve key or stack, where the kind needs one
    pub qualifier: Option<String>,
    /// Decision year (bucket index)
    pub year: usize,
    /// Physical hour for hourly variables
    pub hour: Option<usize>,
}

impl VarKey {
    pub fn yearly(element: ElementKind, entity: &str, kind: VarKind, year: usize) -> Self {
        Self {
            element,
            entity: entity.to_string(),
            kind,
            qualifier: None,
            year,
            hour: None,
        }
    }

    pub fn hourly(
        element: ElementKind,
        entity: &str,
        kind: VarKind,
        year: usize,
        hour: usize,
    ) -> Self {
        Self {
            hour: Some(hour),
            ..Self::yearly(element, entity, kind, year)
        }
    }

    pub fn with_qualifier(mut self, qualifier: &str) -> Self {
        self.qualifier = Some(qualifier.to_string());
        self
    }

    /// `kind(entity[,qualifier],year[,hour])`
    pub fn name(&self) -> String {
        let mut name = format!("{}({}", self.kind, self.entity);
        if let Some(qualifier) = &self.qualifier {
            name.push(',');
            name.push_str(qualifier);
        }
        name.push_str(&format!(",{}", self.year));
        if let Some(hour) = self.hour {
            name.push_str(&format!(",{hour}"));
        }
        name.push(')');
        name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub key: VarKey,
    pub lower: f64,
    /// `f64::INFINITY` when unbounded above
    pub upper: f64,
    pub integer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    Eq,
    Le,
    Ge,
}

impl Sense {
    fn lp_symbol(self) -> &'static str {
        match self {
            Sense::Eq => "=",
            Sense::Le => "<=",
            Sense::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub name: String,
    pub family: ConstraintFamily,
    pub terms: Vec<(VarId, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Row {
    /// Left-hand side evaluated at `values`.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.index()])
            .sum()
    }

    /// Distance from satisfying the row at `values`; zero when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.sense {
            Sense::Eq => (lhs - self.rhs).abs(),
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
        }
    }
}

/// Linear expression under construction. Repeated variables are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: IndexMap<VarId, f64>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, var: VarId, coef: f64) -> &mut Self {
        *self.terms.entry(var).or_insert(0.0) += coef;
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Add `scale * other`.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) -> &mut Self {
        for (&var, &coef) in &other.terms {
            self.add(var, coef * scale);
        }
        self.constant += other.constant * scale;
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(&var, &coef)| (var, coef))
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProblemClass {
    LinearProgram,
    MixedInteger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub variables: usize,
    pub integer_variables: usize,
    pub rows: usize,
    pub nonzeros: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    variables: Vec<Variable>,
    lookup: HashMap<VarKey, VarId>,
    rows: Vec<Row>,
    objective: Vec<(VarId, f64)>,
    objective_constant: f64,
    tolerance: f64,
}

impl LinearModel {
    /// Coefficients with magnitude below `tolerance` are dropped.
    pub fn new(tolerance: f64) -> Self {
        Self {
            variables: Vec::new(),
            lookup: HashMap::new(),
            rows: Vec::new(),
            objective: Vec::new(),
            objective_constant: 0.0,
            tolerance,
        }
    }

    pub fn add_variable(&mut self, key: VarKey, lower: f64, upper: f64, integer: bool) -> VarId {
        let id = VarId(self.variables.len());
        self.lookup.insert(key.clone(), id);
        self.variables.push(Variable {
            key,
            lower,
            upper,
            integer,
        });
        id
    }

    fn significant(&self, expr: &LinearExpr) -> Vec<(VarId, f64)> {
        expr.terms()
            .filter(|(_, coef)| coef.abs() >= self.tolerance && *coef != 0.0)
            .collect()
    }

    /// Append `expr <sense> rhs`; the expression's constant moves to the right.
    pub fn add_row(
        &mut self,
        name: String,
        family: ConstraintFamily,
        expr: &LinearExpr,
        sense: Sense,
        rhs: f64,
    ) {
        let terms = self.significant(expr);
        self.rows.push(Row {
            name,
            family,
            terms,
            sense,
            rhs: rhs - expr.constant(),
        });
    }

    pub fn set_objective(&mut self, expr: &LinearExpr) {
        self.objective = self.significant(expr);
        self.objective_constant = expr.constant();
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn find(&self, key: &VarKey) -> Option<VarId> {
        self.lookup.get(key).copied()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_of(&self, family: ConstraintFamily) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(move |row| row.family == family)
    }

    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn objective_constant(&self) -> f64 {
        self.objective_constant
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective_constant
            + self
                .objective
                .iter()
                .map(|(var, coef)| coef * values[var.index()])
                .sum::<f64>()
    }

    pub fn problem_class(&self) -> ProblemClass {
        if self.variables.iter().any(|v| v.integer) {
            ProblemClass::MixedInteger
        } else {
            ProblemClass::LinearProgram
        }
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            variables: self.variables.len(),
            integer_variables: self.variables.iter().filter(|v| v.integer).count(),
            rows: self.rows.len(),
            nonzeros: self.rows.iter().map(|r| r.terms.len()).sum(),
        }
    }

    /// Write the model in CPLEX LP format.
    pub fn write_lp<W: Write>(&self, mut out: W) -> io::Result<()> {
        let names: Vec<String> = self
            .variables
            .iter()
            .map(|v| lp_name(&v.key.name()))
            .collect();

        writeln!(
            out,
            "\\ {} variables, {} rows",
            self.variables.len(),
            self.rows.len()
        )?;
        writeln!(out, "Minimize")?;
        write!(out, " obj:")?;
        write_terms(&mut out, &self.objective, &names)?;
        if self.objective_constant != 0.0 {
            write!(out, " + {} __constant", self.objective_constant)?;
        }
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for row in &self.rows {
            if row.terms.is_empty() {
                let (name, sense) = (lp_name(&row.name), row.sense.lp_symbol());
                writeln!(out, "\\ {}: 0 {} {}", name, sense, row.rhs)?;
                continue;
            }
            write!(out, " {}:", lp_name(&row.name))?;
            write_terms(&mut out, &row.terms, &names)?;
            writeln!(out, " {} {}", row.sense.lp_symbol(), row.rhs)?;
        }
        if self.objective_constant != 0.0 {
            writeln!(out, " __constant_fix: __constant = 1")?;
        }

        writeln!(out, "Bounds")?;
        for (variable, name) in self.variables.iter().zip(&names) {
            match (variable.lower.is_finite(), variable.upper.is_finite()) {
                (true, true) => {
                    writeln!(out, " {} <= {} <= {}", variable.lower, name, variable.upper)?
                }
                (true, false) => writeln!(out, " {} >= {}", name, variable.lower)?,
                (false, true) => writeln!(out, " -inf <= {} <= {}", name, variable.upper)?,
                (false, false) => writeln!(out, " {} free", name)?,
            }
        }

        let integers: Vec<&String> = self
            .variables
            .iter()
            .zip(&names)
            .filter(|(v, _)| v.integer)
            .map(|(_, name)| name)
            .collect();
        if !integers.is_empty() {
            writeln!(out, "General")?;
            for name in integers {
                writeln!(out, " {}", name)?;
            }
        }
        writeln!(out, "End")
    }

    pub fn to_lp_string(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_lp(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

fn write_terms<W: Write>(out: &mut W, terms: &[(VarId, f64)], names: &[String]) -> io::Result<()> {
    if terms.is_empty() {
        return write!(out, " 0 __constant");
    }
    for (i, (var, coef)) in terms.iter().enumerate() {
        if i > 0 && i % 8 == 0 {
            write!(out, "\n   ")?;
        }
        let sign = if *coef < 0.0 { "-" } else { "+" };
        write!(out, " {} {} {}", sign, coef.abs(), names[var.index()])?;
    }
    Ok(())
}

/// Replace characters the LP format does not accept in names.
fn lp_name(name: &str) -> String {
    const ALLOWED: &str = "!\"#$%&()/,.;?@_`'{}|~";
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ALLOWED.contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}
