//! Export of models in CPLEX LP format, for inspection or for solving with other tools.
use super::{ModelInstance, Row, Variable, VariableType};
use float_cmp::approx_eq;
use std::collections::HashSet;
use std::io::{self, Write};

/// Maximum number of terms written on a single line
const TERMS_PER_LINE: usize = 8;

/// Replace characters which aren't allowed in LP names
fn sanitise_name(name: &str) -> String {
    let mut name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_.()".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Names may not start with a digit or a period
    if name.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        name.insert(0, '_');
    }

    name
}

/// Sanitise a list of names, making sure that no two of them end up the same.
///
/// A name which clashes with an earlier one gets its position appended, e.g. `make_18_10_2`.
fn unique_names<'a, I>(names: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    names
        .enumerate()
        .map(|(i, name)| {
            let base = sanitise_name(name);
            let mut name = base.clone();
            let mut suffix = i;
            while !seen.insert(name.clone()) {
                name = format!("{base}_{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Write a linear expression, e.g. `+ 2 x - 3 y`
fn write_terms<W: Write>(
    out: &mut W,
    names: &[String],
    terms: &[(Variable, f64)],
) -> io::Result<()> {
    for (i, (var, coeff)) in terms.iter().enumerate() {
        if i > 0 && i % TERMS_PER_LINE == 0 {
            write!(out, "\n   ")?;
        }
        let sign = if *coeff < 0.0 { '-' } else { '+' };
        write!(out, " {sign} {} {}", coeff.abs(), names[var.index()])?;
    }

    Ok(())
}

/// Write a single constraint, splitting ranged rows in two
fn write_row<W: Write>(
    out: &mut W,
    names: &[String],
    name: &str,
    row: &Row,
) -> io::Result<()> {
    let mut write_one = |suffix: &str, op: &str, rhs: f64| -> io::Result<()> {
        write!(out, " {name}{suffix}:")?;
        if row.terms.is_empty() {
            write!(out, " 0 {}", names.first().map_or("x", String::as_str))?;
        }
        write_terms(out, names, &row.terms)?;
        writeln!(out, " {op} {rhs}")
    };

    match (row.lower.is_finite(), row.upper.is_finite()) {
        (true, true) if approx_eq!(f64, row.lower, row.upper) => write_one("", "=", row.upper),
        (true, true) => {
            write_one("_lo", ">=", row.lower)?;
            write_one("_up", "<=", row.upper)
        }
        (true, false) => write_one("", ">=", row.lower),
        (false, true) => write_one("", "<=", row.upper),
        (false, false) => Ok(()),
    }
}

impl ModelInstance {
    /// Write the model in CPLEX LP format.
    ///
    /// Row and column names are made safe for the format by replacing disallowed characters with
    /// underscores. Names which would then clash are made distinct with a numeric suffix.
    pub fn write_lp<W: Write>(&self, mut out: W) -> io::Result<()> {
        let names = unique_names(self.columns.iter().map(|col| col.name.as_str()));
        let row_names = unique_names(self.rows.iter().map(|row| row.name.as_str()));

        writeln!(out, "\\ Scrap blending and lot-sizing model ({})", self.formulation)?;
        writeln!(out, "Minimize")?;
        write!(out, " obj:")?;
        let objective: Vec<_> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, col)| col.cost != 0.0)
            .map(|(i, col)| (Variable(i), col.cost))
            .collect();
        if objective.is_empty() {
            write!(out, " 0 {}", names.first().map_or("x", String::as_str))?;
        }
        write_terms(&mut out, &names, &objective)?;
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for (row, name) in self.rows.iter().zip(&row_names) {
            write_row(&mut out, &names, name, row)?;
        }

        writeln!(out, "Bounds")?;
        for (col, name) in self.columns.iter().zip(&names) {
            if col.kind == VariableType::Binary {
                continue;
            }
            match (col.lower.is_finite(), col.upper.is_finite()) {
                (true, true) => writeln!(out, " {} <= {name} <= {}", col.lower, col.upper)?,
                (true, false) => writeln!(out, " {name} >= {}", col.lower)?,
                (false, true) => writeln!(out, " -inf <= {name} <= {}", col.upper)?,
                (false, false) => writeln!(out, " {name} free")?,
            }
        }

        let binaries: Vec<_> = self
            .columns
            .iter()
            .zip(&names)
            .filter(|(col, _)| col.kind == VariableType::Binary)
            .map(|(_, name)| name)
            .collect();
        if !binaries.is_empty() {
            writeln!(out, "Binary")?;
            for name in binaries {
                writeln!(out, " {name}")?;
            }
        }

        writeln!(out, "End")
    }
}
