//! Code for adding decision variables to the model.
use super::{BuildOptions, Formulation, ModelInstance, VariableMap, VariableType};
use crate::problem::Problem;
use itertools::iproduct;

/// Add all decision variables for the problem, in a fixed order.
///
/// Purchase (or allocation) variables come first, then production, inventory and finally the
/// electrolysis variables if a copper limit with electrolysis is configured. If electrolysis
/// removes copper in the disaggregated formulation, the copper removed from each product comes
/// last.
///
/// # Arguments
///
/// * `model` - The model to add the columns to
/// * `problem` - The problem data
/// * `options` - Build options
///
/// # Returns
///
/// A [`VariableMap`] with the new variables.
pub fn add_variables(
    model: &mut ModelInstance,
    problem: &Problem,
    options: &BuildOptions,
) -> VariableMap {
    let mut variables = VariableMap::default();

    match options.formulation {
        Formulation::Aggregated => {
            for (supplier, t) in iproduct!(problem.suppliers(), problem.periods()) {
                let name = format!("buy[{},{}]", supplier.id, problem.period_label(t));
                let var = model.add_column(
                    name,
                    supplier.cost.value(),
                    0.0..,
                    VariableType::Continuous,
                );
                variables.purchase_vars.insert((supplier.id.clone(), t), var);
            }
        }
        Formulation::Disaggregated => {
            for (supplier, product, t) in
                iproduct!(problem.suppliers(), problem.products(), problem.periods())
            {
                let name = format!(
                    "buy[{},{},{}]",
                    supplier.id,
                    product.id,
                    problem.period_label(t)
                );
                let var = model.add_column(
                    name,
                    supplier.cost.value(),
                    0.0..,
                    VariableType::Continuous,
                );
                let key = (supplier.id.clone(), product.id.clone(), t);
                variables.allocation_vars.insert(key, var);
            }
        }
    }

    for (product, t) in iproduct!(problem.products(), problem.periods()) {
        let name = format!("make[{},{}]", product.id, problem.period_label(t));
        let var = model.add_column(name, 0.0, 0.0.., VariableType::Continuous);
        variables.production_vars.insert((product.id.clone(), t), var);
    }

    for (product, t) in iproduct!(problem.products(), problem.periods()) {
        let name = format!("stock[{},{}]", product.id, problem.period_label(t));
        let var = model.add_column(
            name,
            product.holding_cost.value(),
            0.0..,
            VariableType::Continuous,
        );
        variables.inventory_vars.insert((product.id.clone(), t), var);
    }

    let electrolysis = options.copper.as_ref().and_then(|c| c.electrolysis);
    if let Some(electrolysis) = electrolysis {
        for t in problem.periods() {
            let label = problem.period_label(t);
            let flag = model.add_column(
                format!("electrolysis[{label}]"),
                electrolysis.fixed_cost.value(),
                0.0..=1.0,
                VariableType::Binary,
            );
            variables.electrolysis_vars.insert(t, flag);

            let charged = model.add_column(
                format!("charged_copper[{label}]"),
                electrolysis.variable_cost.value(),
                0.0..,
                VariableType::Continuous,
            );
            variables.charged_copper_vars.insert(t, charged);
        }

        if electrolysis.removes_copper && options.formulation == Formulation::Disaggregated {
            for (product, t) in iproduct!(problem.products(), problem.periods()) {
                let name = format!("removed_copper[{},{}]", product.id, problem.period_label(t));
                let var = model.add_column(name, 0.0, 0.0.., VariableType::Continuous);
                variables
                    .removed_copper_vars
                    .insert((product.id.clone(), t), var);
            }
        }
    }

    variables
}
