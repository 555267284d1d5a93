//! Code for adding constraints to the blending and lot-sizing problem.
use super::{
    ActivationConstraint, BuildOptions, CompositionPolicy, CopperLimit, Formulation,
    GatedQuantity, ModelInstance, Variable, VariableMap,
};
use crate::id::ProductID;
use crate::problem::{Alloy, Period, Problem};
use itertools::iproduct;
use strum::IntoEnumIterator;

/// Add all constraints to the model.
///
/// # Arguments
///
/// * `model` - The model, which must already contain its variables
/// * `problem` - The problem data
/// * `options` - Build options
/// * `big_m` - Big-M constant for electrolysis activation, if electrolysis is enabled
pub fn add_constraints(
    model: &mut ModelInstance,
    problem: &Problem,
    options: &BuildOptions,
    big_m: Option<f64>,
) {
    // The variable map is moved out while rows are added, so that it can be read alongside a
    // mutable borrow of the model
    let variables = std::mem::take(&mut model.variables);
    let product_ids: Vec<ProductID> = problem.products().iter().map(|p| p.id.clone()).collect();

    add_inventory_balance_constraints(model, &variables, problem);
    add_material_balance_constraints(model, &variables, problem, options);
    add_copper_removal_constraints(model, &variables, problem);
    for alloy in Alloy::iter() {
        add_composition_constraints(model, &variables, problem, options, alloy);
    }
    add_supplier_capacity_constraints(model, &variables, problem, &product_ids);
    add_production_capacity_constraints(model, &variables, problem);
    if let Some(copper) = &options.copper {
        add_copper_constraints(model, &variables, problem, &product_ids, copper, big_m);
    }

    model.variables = variables;
}

/// Add inventory balance constraints.
///
/// For each product and period: `production + previous stock - stock = demand`. There is no
/// opening stock, so the first period has no previous stock term.
fn add_inventory_balance_constraints(
    model: &mut ModelInstance,
    variables: &VariableMap,
    problem: &Problem,
) {
    for ((j, product), t) in iproduct!(problem.products().iter().enumerate(), problem.periods()) {
        let mut terms = vec![
            (variables.production(&product.id, t), 1.0),
            (variables.inventory(&product.id, t), -1.0),
        ];
        if t > 0 {
            terms.push((variables.inventory(&product.id, t - 1), 1.0));
        }

        let demand = problem.demand(j, t).value();
        let name = format!("balance[{},{}]", product.id, problem.period_label(t));
        model.add_row(name, demand..=demand, terms);
    }
}

/// Add material balance constraints linking purchases to production.
///
/// In the aggregated formulation, all scrap bought in a period must equal the period's total
/// production. In the disaggregated formulation this holds separately for each product.
///
/// If electrolysis removes copper, the removed mass is subtracted from the scrap: the period's
/// charged copper in the aggregated formulation, or each product's removed copper in the
/// disaggregated one.
fn add_material_balance_constraints(
    model: &mut ModelInstance,
    variables: &VariableMap,
    problem: &Problem,
    options: &BuildOptions,
) {
    let removes_copper = options
        .copper
        .and_then(|copper| copper.electrolysis)
        .is_some_and(|electrolysis| electrolysis.removes_copper);

    match options.formulation {
        Formulation::Aggregated => {
            for t in problem.periods() {
                let bought = problem
                    .suppliers()
                    .iter()
                    .map(|s| (variables.purchase_vars[&(s.id.clone(), t)], 1.0));
                let made = problem
                    .products()
                    .iter()
                    .map(|p| (variables.production(&p.id, t), -1.0));
                let removed =
                    removes_copper.then(|| (variables.charged_copper_vars[&t], -1.0));
                let name = format!("material[{}]", problem.period_label(t));
                model.add_row(name, 0.0..=0.0, bought.chain(made).chain(removed));
            }
        }
        Formulation::Disaggregated => {
            for (product, t) in iproduct!(problem.products(), problem.periods()) {
                let bought = problem
                    .suppliers()
                    .iter()
                    .map(|s| (variables.allocation(&s.id, &product.id, t), 1.0));
                let made = std::iter::once((variables.production(&product.id, t), -1.0));
                let removed = variables
                    .removed_copper_vars
                    .get(&(product.id.clone(), t))
                    .map(|var| (*var, -1.0));
                let name = format!("material[{},{}]", product.id, problem.period_label(t));
                model.add_row(name, 0.0..=0.0, bought.chain(made).chain(removed));
            }
        }
    }
}

/// Tie the copper removed from each product to the period's charged copper.
///
/// Each product can lose no more than the copper in its own scrap, and the losses add up to the
/// charged copper. When electrolysis is used the charged copper is all the copper bought, so each
/// product loses exactly its own copper; otherwise nothing is removed.
fn add_copper_removal_constraints(
    model: &mut ModelInstance,
    variables: &VariableMap,
    problem: &Problem,
) {
    if variables.removed_copper_vars.is_empty() {
        return;
    }

    for (product, t) in iproduct!(problem.products(), problem.periods()) {
        let removed = variables.removed_copper_vars[&(product.id.clone(), t)];
        let contained = problem.suppliers().iter().map(|s| {
            let var = variables.allocation(&s.id, &product.id, t);
            (var, -s.copper.value())
        });
        let terms = nonzero_terms(std::iter::once((removed, 1.0)).chain(contained));
        let name = format!("removed_copper[{},{}]", product.id, problem.period_label(t));
        model.add_row(name, ..=0.0, terms);
    }

    for t in problem.periods() {
        let removed = problem
            .products()
            .iter()
            .map(|p| (variables.removed_copper_vars[&(p.id.clone(), t)], 1.0));
        let charged = std::iter::once((variables.charged_copper_vars[&t], -1.0));
        let name = format!("removed_copper[{}]", problem.period_label(t));
        model.add_row(name, 0.0..=0.0, removed.chain(charged));
    }
}

/// Add composition constraints for one alloy.
///
/// The alloy mass in the scrap must equal (or, with [`CompositionPolicy::AtMost`], not exceed) the
/// required fraction of the steel produced from it. Zero coefficients are left out and rows with
/// no terms at all are skipped, as they hold trivially.
fn add_composition_constraints(
    model: &mut ModelInstance,
    variables: &VariableMap,
    problem: &Problem,
    options: &BuildOptions,
    alloy: Alloy,
) {
    let add_row = |model: &mut ModelInstance, name: String, terms: Vec<(Variable, f64)>| {
        if terms.is_empty() {
            return;
        }
        match options.composition {
            CompositionPolicy::Exact => model.add_row(name, 0.0..=0.0, terms),
            CompositionPolicy::AtMost => model.add_row(name, ..=0.0, terms),
        }
    };

    match options.formulation {
        Formulation::Aggregated => {
            for t in problem.periods() {
                let contained = problem.suppliers().iter().map(|s| {
                    let var = variables.purchase_vars[&(s.id.clone(), t)];
                    (var, s.alloy_content(alloy).value())
                });
                let required = problem.products().iter().map(|p| {
                    let var = variables.production(&p.id, t);
                    (var, -p.alloy_requirement(alloy).value())
                });
                let terms = nonzero_terms(contained.chain(required));
                let name = format!("{alloy}[{}]", problem.period_label(t));
                add_row(model, name, terms);
            }
        }
        Formulation::Disaggregated => {
            for (product, t) in iproduct!(problem.products(), problem.periods()) {
                let contained = problem.suppliers().iter().map(|s| {
                    let var = variables.allocation(&s.id, &product.id, t);
                    (var, s.alloy_content(alloy).value())
                });
                let required = std::iter::once((
                    variables.production(&product.id, t),
                    -product.alloy_requirement(alloy).value(),
                ));
                let terms = nonzero_terms(contained.chain(required));
                let name = format!("{alloy}[{},{}]", product.id, problem.period_label(t));
                add_row(model, name, terms);
            }
        }
    }
}

fn nonzero_terms<I>(terms: I) -> Vec<(Variable, f64)>
where
    I: Iterator<Item = (Variable, f64)>,
{
    terms.filter(|(_, coeff)| *coeff != 0.0).collect()
}

/// Add supplier capacity constraints: no more than a supplier's capacity can be bought per period
fn add_supplier_capacity_constraints(
    model: &mut ModelInstance,
    variables: &VariableMap,
    problem: &Problem,
    product_ids: &[ProductID],
) {
    for (supplier, t) in iproduct!(problem.suppliers(), problem.periods()) {
        let terms = variables
            .purchase_terms(&supplier.id, product_ids, t)
            .into_iter()
            .map(|var| (var, 1.0));
        let name = format!("supply[{},{}]", supplier.id, problem.period_label(t));
        model.add_row(name, ..=supplier.capacity.value(), terms);
    }
}

/// Add plant capacity constraints: total production per period is limited
fn add_production_capacity_constraints(
    model: &mut ModelInstance,
    variables: &VariableMap,
    problem: &Problem,
) {
    for t in problem.periods() {
        let terms = problem
            .products()
            .iter()
            .map(|p| (variables.production(&p.id, t), 1.0));
        let name = format!("plant[{}]", problem.period_label(t));
        model.add_row(name, ..=problem.max_production().value(), terms);
    }
}

/// The copper mass in a period's purchases, as a linear expression
fn copper_terms(
    variables: &VariableMap,
    problem: &Problem,
    product_ids: &[ProductID],
    period: Period,
) -> Vec<(Variable, f64)> {
    let terms = problem.suppliers().iter().flat_map(|s| {
        variables
            .purchase_terms(&s.id, product_ids, period)
            .into_iter()
            .map(|var| (var, s.copper.value()))
    });

    nonzero_terms(terms)
}

/// Add copper limit constraints.
///
/// The copper in a period's purchases may not exceed `limit` times the period's production.
/// Without electrolysis this is a hard constraint. With electrolysis the limit may be exceeded in a
/// period whose electrolysis flag is set, in which case the period's copper mass is charged the
/// variable cost.
fn add_copper_constraints(
    model: &mut ModelInstance,
    variables: &VariableMap,
    problem: &Problem,
    product_ids: &[ProductID],
    copper: &CopperLimit,
    big_m: Option<f64>,
) {
    for t in problem.periods() {
        let label = problem.period_label(t);
        let copper_mass = copper_terms(variables, problem, product_ids, t);
        let excess: Vec<_> = copper_mass
            .iter()
            .copied()
            .chain(
                problem
                    .products()
                    .iter()
                    .map(|p| (variables.production(&p.id, t), -copper.limit.value())),
            )
            .collect();

        match (copper.electrolysis, big_m) {
            (Some(_), Some(big_m)) => {
                let flag = variables.electrolysis_vars[&t];
                ActivationConstraint {
                    name: format!("copper_activation[{label}]"),
                    quantity: excess,
                    flag,
                    bound: big_m,
                }
                .add_to(model);

                GatedQuantity {
                    name: format!("charged_copper[{label}]"),
                    quantity: copper_mass,
                    flag,
                    charged: variables.charged_copper_vars[&t],
                    bound: big_m,
                }
                .add_to(model);
            }
            _ => model.add_row(format!("copper_limit[{label}]"), ..=0.0, excess),
        }
    }
}
