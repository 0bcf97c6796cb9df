use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use strum::IntoEnumIterator;
use tracing::debug;

use super::descriptor::OperatorDescriptor;
use super::OperatorKind;
use crate::error::{EvalError, EvalResult};

lazy_static! {
    static ref BUILTIN: Arc<OperatorRegistry> = Arc::new(
        OperatorRegistry::try_from_descriptors(OperatorKind::iter().map(OperatorKind::descriptor).collect())
            // The built-in catalog is static data; a collision is a defect in it.
            .expect("built-in operator aliases are unique"),
    );
}

/// Name and alias index over a fixed set of operator descriptors.
///
/// Lookup tries the exact name first, then a case-insensitive match.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    descriptors: Vec<OperatorDescriptor>,
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
}

impl OperatorRegistry {
    /// The shared registry of built-in operators.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Index `descriptors`, failing if two of them claim the same name.
    pub fn try_from_descriptors(descriptors: Vec<OperatorDescriptor>) -> EvalResult<Self> {
        let mut exact = HashMap::new();
        let mut folded = HashMap::new();

        for (position, descriptor) in descriptors.iter().enumerate() {
            let names = std::iter::once(descriptor.name.as_str()).chain(descriptor.aliases.iter().copied());
            for name in names {
                Self::claim(&mut exact, name.to_string(), position, &descriptors)?;
                Self::claim(&mut folded, name.to_lowercase(), position, &descriptors)?;
            }
        }

        debug!("Registered {} operators", descriptors.len());
        Ok(Self {
            descriptors,
            exact,
            folded,
        })
    }

    fn claim(
        index: &mut HashMap<String, usize>,
        name: String,
        position: usize,
        descriptors: &[OperatorDescriptor],
    ) -> EvalResult<()> {
        match index.get(&name) {
            Some(&owner) if owner != position => Err(EvalError::DuplicateAlias {
                alias: name,
                first: descriptors[owner].name.clone(),
                second: descriptors[position].name.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                index.insert(name, position);
                Ok(())
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&OperatorDescriptor> {
        self.exact
            .get(name)
            .or_else(|| self.folded.get(&name.to_lowercase()))
            .map(|&position| &self.descriptors[position])
    }

    /// Exact-name lookup only, as used for shorthand keys.
    pub fn resolve_exact(&self, name: &str) -> Option<&OperatorDescriptor> {
        self.exact.get(name).map(|&position| &self.descriptors[position])
    }

    pub fn list_operators(&self) -> &[OperatorDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
