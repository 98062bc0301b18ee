use crate::constraints::FeatureFilter;
use crate::error::Result;
use crate::records::RecordTable;

/// Indices of the records satisfying every filter, in ascending order.
///
/// No filters means every record. Filter columns are looked up before any
/// row is scanned, so an unknown feature fails even on an empty table.
pub fn resolve(records: &RecordTable, filters: &[FeatureFilter]) -> Result<Vec<usize>> {
    if filters.is_empty() {
        return Ok((0..records.len()).collect());
    }

    let columns = filters
        .iter()
        .map(|filter| records.column(&filter.name).map(|column| (filter, column)))
        .collect::<Result<Vec<_>>>()?;

    Ok((0..records.len())
        .filter(|&i| {
            columns
                .iter()
                .all(|(filter, column)| filter.accepts(column[i].as_ref()))
        })
        .collect())
}
