//! Generic model formulation.

use crate::engine::{CpModel, VarId};
use crate::error::ModelError;
use crate::expr::{resolve_constraint, resolve_objective, SymbolTable};
use crate::models::GenericModel;
use crate::validation::{first_violation, validate_generic};

/// Handles created by [`GenericCpBuilder::build`].
#[derive(Debug, Clone)]
pub struct GenericVariables {
    /// Name → handle for every declared variable.
    pub symbols: SymbolTable,
    /// Declared variables in declaration order.
    pub declared: Vec<(String, VarId)>,
}

impl GenericVariables {
    /// Variables reported in solution snapshots.
    pub fn outputs(&self) -> Vec<(String, VarId)> {
        self.declared.clone()
    }
}

/// Builds a CP model from a generic model definition.
pub struct GenericCpBuilder<'a> {
    definition: &'a GenericModel,
}

impl<'a> GenericCpBuilder<'a> {
    /// Creates a new builder.
    pub fn new(definition: &'a GenericModel) -> Self {
        Self { definition }
    }

    /// Adds the definition to `model`.
    ///
    /// Declarations are validated before anything is added. Constraints and
    /// the objective are resolved against the declared variables; if one
    /// fails, `model` holds a partial build and must be discarded.
    pub fn build(&self, model: &mut CpModel) -> Result<GenericVariables, ModelError> {
        first_violation(validate_generic(self.definition))?;

        let mut symbols = SymbolTable::new();
        let mut declared = Vec::with_capacity(self.definition.variable_count());
        for decl in &self.definition.variables {
            let var = model.new_int_var(decl.lower(), decl.upper(), decl.name.clone());
            symbols.insert(decl.name.clone(), var);
            declared.push((decl.name.clone(), var));
        }

        for (index, text) in self.definition.constraints.iter().enumerate() {
            let constraint =
                resolve_constraint(text, &symbols).map_err(|source| ModelError::Constraint {
                    constraint: text.clone(),
                    source,
                })?;
            tracing::debug!(index, constraint = %text, typed = %constraint, "constraint resolved");
            model.add(constraint);
        }

        if let Some(objective) = &self.definition.objective {
            let expr =
                resolve_objective(&objective.expression, &symbols).map_err(ModelError::Objective)?;
            if objective.maximize {
                model.maximize(expr);
            } else {
                model.minimize(expr);
            }
        }

        tracing::debug!(
            variables = declared.len(),
            constraints = model.constraint_count(),
            objective = self.definition.objective.is_some(),
            "generic model built"
        );

        Ok(GenericVariables { symbols, declared })
    }
}
