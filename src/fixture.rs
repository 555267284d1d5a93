//! Fixtures for tests
use crate::problem::{Problem, ProblemTables};
use rstest::fixture;

/// Five suppliers and three grades of 18% chromium steel, with one month of demand
#[fixture]
pub fn stainless_tables() -> ProblemTables {
    ProblemTables {
        supplier_ids: ["A", "B", "C", "D", "E"].map(String::from).to_vec(),
        supplier_costs: vec![5.0, 10.0, 9.0, 7.0, 8.5],
        supplier_capacities: vec![90.0, 30.0, 50.0, 70.0, 20.0],
        supplier_chromium: vec![0.18, 0.25, 0.15, 0.14, 0.0],
        supplier_nickel: vec![0.0, 0.15, 0.10, 0.16, 0.10],
        supplier_copper: vec![0.0, 0.04, 0.02, 0.05, 0.03],
        product_ids: ["18/10", "18/8", "18/0"].map(String::from).to_vec(),
        product_chromium: vec![0.18, 0.18, 0.18],
        product_nickel: vec![0.10, 0.08, 0.0],
        product_holding_costs: vec![20.0, 10.0, 5.0],
        period_labels: None,
        demand: vec![vec![25.0, 10.0, 5.0]],
        max_production: 100.0,
    }
}

#[fixture]
pub fn stainless_problem(stainless_tables: ProblemTables) -> Problem {
    Problem::from_tables(stainless_tables).unwrap()
}

/// Two suppliers of alloy-free scrap: a clean expensive one and a cheap copper-rich one.
///
/// Only copper limits make the choice between them interesting. With a limit of `L` the cheapest
/// compliant plan buys `min(L / 0.05, 1) * 10` kg from "dirty" for the 10 kg of demand.
#[fixture]
pub fn copper_tables() -> ProblemTables {
    ProblemTables {
        supplier_ids: ["clean", "dirty"].map(String::from).to_vec(),
        supplier_costs: vec![10.0, 5.0],
        supplier_capacities: vec![100.0, 100.0],
        supplier_chromium: vec![0.0, 0.0],
        supplier_nickel: vec![0.0, 0.0],
        supplier_copper: vec![0.0, 0.05],
        product_ids: vec!["plain".into()],
        product_chromium: vec![0.0],
        product_nickel: vec![0.0],
        product_holding_costs: vec![1.0],
        period_labels: Some(vec!["Jan".into()]),
        demand: vec![vec![10.0]],
        max_production: 100.0,
    }
}

#[fixture]
pub fn copper_problem(copper_tables: ProblemTables) -> Problem {
    Problem::from_tables(copper_tables).unwrap()
}
