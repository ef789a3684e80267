//! Primary key selection and ordering

use super::{Column, Table};
use crate::error::{Result, SchemaError};

/// Sort rank of an identity marker: `Y` first, then numeric key positions.
///
/// Returns `None` for a marker that is neither `Y` nor a number.
pub fn identity_rank(identity: &str) -> Option<u32> {
    let identity = identity.trim();
    if identity == "Y" {
        return Some(0);
    }
    identity.parse::<u32>().ok()
}

impl Table {
    /// Columns that form the primary key, in key order.
    ///
    /// Columns are selected by [`Column::is_primary_key`] and sorted by
    /// [`identity_rank`]; ties keep declaration order. A selected column whose
    /// marker cannot be ranked (such as `1a`) is an error.
    pub fn primary_key_columns(&self) -> Result<Vec<&Column>> {
        let mut keyed = Vec::new();
        for column in self.columns.iter().filter(|c| c.is_primary_key()) {
            let rank =
                identity_rank(&column.identity).ok_or_else(|| SchemaError::InvalidIdentity {
                    table: self.name.clone(),
                    column: column.name.clone(),
                    identity: column.identity.clone(),
                })?;
            keyed.push((rank, column));
        }
        keyed.sort_by_key(|(rank, _)| *rank);
        Ok(keyed.into_iter().map(|(_, column)| column).collect())
    }

    pub fn primary_key_names(&self) -> Result<Vec<String>> {
        Ok(self
            .primary_key_columns()?
            .into_iter()
            .map(|c| c.name.clone())
            .collect())
    }
}
