//! The module responsible for writing output data to disk.
use crate::id::{ProductID, SupplierID};
use crate::model::ModelInstance;
use crate::planner::PlanOutcome;
use crate::problem::{Period, Problem};
use crate::solution::ProductionPlan;
use crate::solver::SolverStatus;
use crate::sweep::SweepPoint;
use crate::units::Mass;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "steelplan_results";

/// The output file name for scrap purchases
const PURCHASES_FILE_NAME: &str = "purchases.csv";

/// The output file name for scrap allocated to each product
const ALLOCATIONS_FILE_NAME: &str = "allocations.csv";

/// The output file name for production
const PRODUCTION_FILE_NAME: &str = "production.csv";

/// The output file name for end-of-period stock
const INVENTORY_FILE_NAME: &str = "inventory.csv";

/// The output file name for copper content and electrolysis decisions
const ELECTROLYSIS_FILE_NAME: &str = "electrolysis.csv";

/// The output file name for the run summary
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for a copper limit sweep
const SWEEP_FILE_NAME: &str = "sweep.csv";

/// The output file name for the optimisation model
const LP_FILE_NAME: &str = "model.lp";

/// Get the output folder for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// # Arguments
///
/// * `output_dir` - The folder to create
/// * `allow_overwrite` - Whether an existing, non-empty folder may be deleted and recreated
///
/// # Returns
///
/// Whether an existing folder was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Already exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace it."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Write the optimisation model to `model.lp` in the output folder
pub fn write_lp_file(output_path: &Path, model: &ModelInstance) -> Result<()> {
    let file_path = output_path.join(LP_FILE_NAME);
    let file = File::create(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    model.write_lp(BufWriter::new(file))?;

    Ok(())
}

/// Represents a row in the purchases CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PurchaseRow {
    period: String,
    supplier_id: SupplierID,
    quantity: f64,
}

/// Represents a row in the allocations CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AllocationRow {
    period: String,
    supplier_id: SupplierID,
    product_id: ProductID,
    quantity: f64,
}

/// Represents a row in the production or inventory CSV files
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ProductRow {
    period: String,
    product_id: ProductID,
    quantity: f64,
}

/// Represents a row in the electrolysis CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ElectrolysisRow {
    period: String,
    copper: f64,
    active: bool,
    charged_copper: f64,
    cost: f64,
}

/// Represents the single row of the summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    status: SolverStatus,
    objective: Option<f64>,
    purchase_cost: Option<f64>,
    holding_cost: Option<f64>,
    electrolysis_cost: Option<f64>,
    warnings: usize,
}

impl SummaryRow {
    fn new(outcome: &PlanOutcome) -> Self {
        let costs = outcome.plan.as_ref().map(|plan| plan.costs);
        Self {
            status: outcome.status,
            objective: outcome.objective().map(|objective| objective.value()),
            purchase_cost: costs.map(|costs| costs.purchase.value()),
            holding_cost: costs.map(|costs| costs.holding.value()),
            electrolysis_cost: costs.map(|costs| costs.electrolysis.value()),
            warnings: outcome.warnings.len(),
        }
    }
}

/// Represents a row in the sweep CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SweepRow {
    copper_limit: f64,
    status: SolverStatus,
    objective: Option<f64>,
}

/// An object for writing a planning outcome to CSV files
pub struct DataWriter {
    purchases_writer: csv::Writer<File>,
    allocations_writer: Option<csv::Writer<File>>,
    production_writer: csv::Writer<File>,
    inventory_writer: csv::Writer<File>,
    electrolysis_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `with_allocations` - Whether to include per-product allocations of scrap
    pub fn create(output_path: &Path, with_allocations: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let allocations_writer = if with_allocations {
            Some(new_writer(ALLOCATIONS_FILE_NAME)?)
        } else {
            None
        };

        Ok(Self {
            purchases_writer: new_writer(PURCHASES_FILE_NAME)?,
            allocations_writer,
            production_writer: new_writer(PRODUCTION_FILE_NAME)?,
            inventory_writer: new_writer(INVENTORY_FILE_NAME)?,
            electrolysis_writer: new_writer(ELECTROLYSIS_FILE_NAME)?,
            summary_writer: new_writer(SUMMARY_FILE_NAME)?,
        })
    }

    /// Write a planning outcome.
    ///
    /// The summary is always written. The other tables are only written if there is a plan.
    pub fn write_outcome(&mut self, problem: &Problem, outcome: &PlanOutcome) -> Result<()> {
        self.summary_writer.serialize(SummaryRow::new(outcome))?;
        if let Some(plan) = &outcome.plan {
            self.write_plan(problem, plan)?;
        }

        Ok(())
    }

    /// Write the tables of an optimal plan
    fn write_plan(&mut self, problem: &Problem, plan: &ProductionPlan) -> Result<()> {
        let label = |t: Period| problem.period_label(t).to_string();

        for ((supplier_id, t), quantity) in &plan.purchases {
            self.purchases_writer.serialize(PurchaseRow {
                period: label(*t),
                supplier_id: supplier_id.clone(),
                quantity: quantity.value(),
            })?;
        }

        if let (Some(writer), Some(allocations)) = (&mut self.allocations_writer, &plan.allocations)
        {
            for ((supplier_id, product_id, t), quantity) in allocations {
                writer.serialize(AllocationRow {
                    period: label(*t),
                    supplier_id: supplier_id.clone(),
                    product_id: product_id.clone(),
                    quantity: quantity.value(),
                })?;
            }
        }

        for (writer, values) in [
            (&mut self.production_writer, &plan.production),
            (&mut self.inventory_writer, &plan.inventory),
        ] {
            for ((product_id, t), quantity) in values {
                writer.serialize(ProductRow {
                    period: label(*t),
                    product_id: product_id.clone(),
                    quantity: quantity.value(),
                })?;
            }
        }

        for (t, copper) in &plan.copper {
            let usage = plan.electrolysis.get(t);
            self.electrolysis_writer.serialize(ElectrolysisRow {
                period: label(*t),
                copper: copper.value(),
                active: usage.is_some_and(|usage| usage.active),
                charged_copper: usage.map_or(0.0, |usage| usage.charged_copper.value()),
                cost: usage.map_or(0.0, |usage| usage.cost.value()),
            })?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.purchases_writer.flush()?;
        if let Some(wtr) = &mut self.allocations_writer {
            wtr.flush()?;
        }
        self.production_writer.flush()?;
        self.inventory_writer.flush()?;
        self.electrolysis_writer.flush()?;
        self.summary_writer.flush()?;

        Ok(())
    }
}

/// Write the results of a copper limit sweep to `sweep.csv` in the output folder
pub fn write_sweep(output_path: &Path, points: &[SweepPoint]) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(SWEEP_FILE_NAME))?;
    for point in points {
        writer.serialize(SweepRow {
            copper_limit: point.limit.value(),
            status: point.status,
            objective: point.objective.map(|objective| objective.value()),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// A printable summary of a production plan, with one table each for purchases, production and
/// inventory. Each table has a row per supplier or product and a column per period, plus totals.
pub struct Report<'a> {
    problem: &'a Problem,
    plan: &'a ProductionPlan,
}

impl<'a> Report<'a> {
    /// Create a report for a plan
    pub fn new(problem: &'a Problem, plan: &'a ProductionPlan) -> Self {
        Self { problem, plan }
    }

    fn write_table(
        &self,
        f: &mut fmt::Formatter,
        title: &str,
        rows: &[(String, Vec<Mass>)],
    ) -> fmt::Result {
        let labels = self.problem.period_labels();
        let name_width = rows
            .iter()
            .map(|(name, _)| name.len())
            .chain(std::iter::once("Total".len()))
            .max()
            .unwrap_or_default();
        let value_width = labels
            .iter()
            .map(String::len)
            .max()
            .unwrap_or_default()
            .max(10);

        writeln!(f, "{title}")?;
        write!(f, "{:name_width$}", "")?;
        for label in labels.iter().map(String::as_str).chain(["Total"]) {
            write!(f, " {label:>value_width$}")?;
        }
        writeln!(f)?;

        for (name, values) in rows {
            write_report_row(f, name, values, name_width, value_width)?;
        }
        let totals: Vec<Mass> = self
            .problem
            .periods()
            .map(|t| rows.iter().map(|(_, values)| values[t]).sum())
            .collect();
        write_report_row(f, "Total", &totals, name_width, value_width)
    }
}

/// Write one row of a report table, followed by the row total
fn write_report_row(
    f: &mut fmt::Formatter,
    name: &str,
    values: &[Mass],
    name_width: usize,
    value_width: usize,
) -> fmt::Result {
    write!(f, "{name:name_width$}")?;
    let total: Mass = values.iter().sum();
    for value in values.iter().chain(std::iter::once(&total)) {
        write!(f, " {:>value_width$.2}", value.value())?;
    }
    writeln!(f)
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problem = self.problem;
        let plan = self.plan;

        let purchases: Vec<_> = problem
            .suppliers()
            .iter()
            .map(|supplier| {
                let values = problem
                    .periods()
                    .map(|t| plan.purchases[&(supplier.id.clone(), t)])
                    .collect();
                (supplier.id.to_string(), values)
            })
            .collect();
        let by_product = |values: &IndexMap<(ProductID, Period), Mass>| -> Vec<(String, Vec<Mass>)> {
            problem
                .products()
                .iter()
                .map(|product| {
                    let row = problem
                        .periods()
                        .map(|t| values[&(product.id.clone(), t)])
                        .collect();
                    (product.id.to_string(), row)
                })
                .collect()
        };

        writeln!(f, "Total cost: {:.2}", plan.objective.value())?;
        writeln!(
            f,
            "  purchases {:.2}, holding {:.2}, electrolysis {:.2}",
            plan.costs.purchase.value(),
            plan.costs.holding.value(),
            plan.costs.electrolysis.value()
        )?;
        writeln!(f)?;
        self.write_table(f, "Purchases", &purchases)?;
        writeln!(f)?;
        self.write_table(f, "Production", &by_product(&plan.production))?;
        writeln!(f)?;
        self.write_table(f, "Inventory", &by_product(&plan.inventory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::copper_problem;
    use crate::model::{BuildOptions, build_model};
    use crate::units::Fraction;
    use itertools::Itertools;
    use rstest::rstest;
    use tempfile::tempdir;

    /// Buy 4 clean and 6 dirty, make 10, hold nothing
    fn outcome(problem: &Problem) -> PlanOutcome {
        let model = build_model(problem, &BuildOptions::default()).unwrap();
        let plan = ProductionPlan::from_columns(problem, &model, &[4.0, 6.0, 10.0, 0.0]);
        PlanOutcome {
            status: SolverStatus::Optimal,
            plan: Some(plan),
            warnings: Vec::new(),
        }
    }

    fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
        csv::Reader::from_path(path)
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap()
    }

    #[test]
    fn test_create_output_directory_new() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // An existing empty folder is fine
        assert!(!create_output_directory(&output_dir, false).unwrap());
    }

    #[test]
    fn test_create_output_directory_overwrite() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        fs::create_dir(&output_dir).unwrap();
        fs::write(output_dir.join("old.csv"), "x").unwrap();

        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("old.csv").exists());
    }

    #[test]
    fn test_get_output_dir() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("stainless");
        fs::create_dir(&model_dir).unwrap();
        assert_eq!(
            get_output_dir(&model_dir).unwrap(),
            PathBuf::from(OUTPUT_DIRECTORY_ROOT).join("stainless")
        );
    }

    #[rstest]
    fn test_write_outcome(copper_problem: Problem) {
        let outcome = outcome(&copper_problem);
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), true).unwrap();
            writer.write_outcome(&copper_problem, &outcome).unwrap();
            writer.flush().unwrap();
        }

        let purchases: Vec<PurchaseRow> = read_rows(&dir.path().join(PURCHASES_FILE_NAME));
        assert_eq!(
            purchases,
            vec![
                PurchaseRow {
                    period: "Jan".into(),
                    supplier_id: SupplierID::new("clean"),
                    quantity: 4.0,
                },
                PurchaseRow {
                    period: "Jan".into(),
                    supplier_id: SupplierID::new("dirty"),
                    quantity: 6.0,
                },
            ]
        );

        let allocations: Vec<AllocationRow> = read_rows(&dir.path().join(ALLOCATIONS_FILE_NAME));
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[1].product_id, ProductID::new("plain"));

        let production: Vec<ProductRow> = read_rows(&dir.path().join(PRODUCTION_FILE_NAME));
        assert_eq!(
            production,
            vec![ProductRow {
                period: "Jan".into(),
                product_id: ProductID::new("plain"),
                quantity: 10.0,
            }]
        );

        let electrolysis: Vec<ElectrolysisRow> =
            read_rows(&dir.path().join(ELECTROLYSIS_FILE_NAME));
        assert_eq!(electrolysis.len(), 1);
        assert!(!electrolysis[0].active);
        assert!((electrolysis[0].copper - 0.3).abs() < 1e-9);

        let summary: Vec<SummaryRow> = read_rows(&dir.path().join(SUMMARY_FILE_NAME));
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].status, SolverStatus::Optimal);
        assert_eq!(summary[0].objective, Some(70.0));
        assert_eq!(summary[0].holding_cost, Some(0.0));
    }

    #[rstest]
    fn test_write_outcome_no_plan(copper_problem: Problem) {
        let outcome = PlanOutcome {
            status: SolverStatus::Infeasible,
            plan: None,
            warnings: Vec::new(),
        };
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_outcome(&copper_problem, &outcome).unwrap();
            writer.flush().unwrap();
        }

        assert!(!dir.path().join(ALLOCATIONS_FILE_NAME).exists());
        let summary: Vec<SummaryRow> = read_rows(&dir.path().join(SUMMARY_FILE_NAME));
        assert_eq!(summary[0].status, SolverStatus::Infeasible);
        assert_eq!(summary[0].objective, None);
    }

    #[test]
    fn test_write_sweep() {
        let points = [
            SweepPoint {
                limit: Fraction(0.05),
                status: SolverStatus::Optimal,
                objective: Some(crate::units::Money(50.0)),
            },
            SweepPoint {
                limit: Fraction(0.0),
                status: SolverStatus::Infeasible,
                objective: None,
            },
        ];
        let dir = tempdir().unwrap();
        write_sweep(dir.path(), &points).unwrap();

        let rows: Vec<SweepRow> = read_rows(&dir.path().join(SWEEP_FILE_NAME));
        assert_eq!(
            rows,
            vec![
                SweepRow {
                    copper_limit: 0.05,
                    status: SolverStatus::Optimal,
                    objective: Some(50.0),
                },
                SweepRow {
                    copper_limit: 0.0,
                    status: SolverStatus::Infeasible,
                    objective: None,
                },
            ]
        );
    }

    #[rstest]
    fn test_write_lp_file(copper_problem: Problem) {
        let model = build_model(&copper_problem, &BuildOptions::default()).unwrap();
        let dir = tempdir().unwrap();
        write_lp_file(dir.path(), &model).unwrap();
        let contents = fs::read_to_string(dir.path().join(LP_FILE_NAME)).unwrap();
        assert!(contents.contains("Subject To"));
    }

    #[rstest]
    fn test_report(copper_problem: Problem) {
        let outcome = outcome(&copper_problem);
        let report = Report::new(&copper_problem, outcome.plan.as_ref().unwrap()).to_string();

        assert!(report.starts_with("Total cost: 70.00\n"));
        assert!(report.contains("Purchases\n"));
        let purchase_total = report
            .lines()
            .skip_while(|line| *line != "Purchases")
            .find(|line| line.starts_with("Total"))
            .unwrap();
        assert!(purchase_total.ends_with("10.00      10.00"));
        assert!(report.contains("Inventory\n"));
    }
}
