//! Problem data shared by the integration tests.
use steelplan::problem::{Problem, ProblemTables};

/// Monthly demand for the 18/10, 18/8 and 18/0 grades
const STAINLESS_DEMAND: [[f64; 3]; 3] = [[25.0, 10.0, 5.0], [25.0, 10.0, 20.0], [0.0, 10.0, 80.0]];

/// Five suppliers and three grades of stainless steel, with `months` months of demand (at most 3)
#[allow(dead_code)]
pub fn stainless_tables(months: usize) -> ProblemTables {
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
        demand: STAINLESS_DEMAND[..months].iter().map(|row| row.to_vec()).collect(),
        max_production: 100.0,
    }
}

#[allow(dead_code)]
pub fn stainless_problem(months: usize) -> Problem {
    Problem::from_tables(stainless_tables(months)).unwrap()
}

/// A clean, expensive supplier and a cheap one whose scrap is 5% copper, for one product
#[allow(dead_code)]
pub fn copper_problem() -> Problem {
    Problem::from_tables(ProblemTables {
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
    })
    .unwrap()
}
