//! Validation of requested page numbers against the manual's page count.

use std::num::NonZeroUsize;

use serde::Serialize;
use serde_json::Value;

use super::error::PageError;
use super::index::PageIndex;

/// Why a requested value was not turned into a [`PageIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The value could not be read as an integer.
    NotAnInteger,
    /// The value is an integer outside `1..=total_pages`.
    OutOfRange { index: i64, total_pages: usize },
}

/// A requested value that was rejected, kept verbatim for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedInput {
    value: Value,
    reason: SkipReason,
}

impl SkippedInput {
    /// Returns the value exactly as it was requested.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns why the value was skipped.
    pub fn reason(&self) -> &SkipReason {
        &self.reason
    }
}

impl std::fmt::Display for SkippedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            SkipReason::NotAnInteger => write!(f, "{} (not an integer)", self.value),
            SkipReason::OutOfRange { total_pages, .. } => {
                write!(f, "{} (outside 1..={total_pages})", self.value)
            }
        }
    }
}

/// Outcome of checking one requested value.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexCheck {
    Valid(PageIndex),
    Skipped(SkippedInput),
}

/// Pages to show and how to lay them out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRequest {
    valid_indexes: Vec<PageIndex>,
    skipped_inputs: Vec<SkippedInput>,
    columns: NonZeroUsize,
}

impl DisplayRequest {
    /// Returns the valid page indices in request order, duplicates kept.
    pub fn valid_indexes(&self) -> &[PageIndex] {
        &self.valid_indexes
    }

    /// Returns the rejected inputs in request order.
    pub fn skipped_inputs(&self) -> &[SkippedInput] {
        &self.skipped_inputs
    }

    /// Returns the grid column count.
    pub fn columns(&self) -> NonZeroUsize {
        self.columns
    }
}

/// Result of [`select`].
///
/// `NothingToDisplay` is a successful outcome: callers should show an
/// informational message instead of an empty grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Display(DisplayRequest),
    NothingToDisplay { skipped_inputs: Vec<SkippedInput> },
}

impl Selection {
    /// Returns the display request, if any page survived validation.
    pub fn display_request(&self) -> Option<&DisplayRequest> {
        match self {
            Self::Display(request) => Some(request),
            Self::NothingToDisplay { .. } => None,
        }
    }

    /// Returns every rejected input, whichever variant this is.
    pub fn skipped_inputs(&self) -> &[SkippedInput] {
        match self {
            Self::Display(request) => request.skipped_inputs(),
            Self::NothingToDisplay { skipped_inputs } => skipped_inputs,
        }
    }

    /// Returns true if there is nothing to display.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NothingToDisplay { .. })
    }
}

/// Checks a single requested value against the page range.
///
/// Integers, integral floats and strings holding an integer are coerced;
/// everything else is [`SkipReason::NotAnInteger`].
pub fn check_index(value: &Value, total_pages: usize) -> IndexCheck {
    let Some(index) = coerce_integer(value) else {
        return IndexCheck::Skipped(SkippedInput {
            value: value.clone(),
            reason: SkipReason::NotAnInteger,
        });
    };

    match PageIndex::new(index, total_pages) {
        Some(page) => IndexCheck::Valid(page),
        None => IndexCheck::Skipped(SkippedInput {
            value: value.clone(),
            reason: SkipReason::OutOfRange { index, total_pages },
        }),
    }
}

/// Partitions requested values into valid page indices and skipped inputs.
///
/// Order is preserved in both partitions and duplicates are kept. This never
/// looks at page content; only `total_pages` matters.
///
/// # Errors
///
/// Returns [`PageError::InvalidColumns`] if `columns` is zero.
pub fn select(
    total_pages: usize,
    requested: &[Value],
    columns: usize,
) -> Result<Selection, PageError> {
    let columns = NonZeroUsize::new(columns).ok_or(PageError::InvalidColumns { columns })?;

    let mut valid_indexes = Vec::with_capacity(requested.len());
    let mut skipped_inputs = Vec::new();

    for value in requested {
        match check_index(value, total_pages) {
            IndexCheck::Valid(page) => valid_indexes.push(page),
            IndexCheck::Skipped(skipped) => {
                log::warn!("Skipping page request {skipped}");
                skipped_inputs.push(skipped);
            }
        }
    }

    if valid_indexes.is_empty() {
        return Ok(Selection::NothingToDisplay { skipped_inputs });
    }

    Ok(Selection::Display(DisplayRequest {
        valid_indexes,
        skipped_inputs,
        columns,
    }))
}

/// Runs [`select`] over page numbers parsed from a model response.
///
/// # Errors
///
/// Returns [`PageError::InvalidColumns`] if `columns` is zero.
pub fn select_references(
    total_pages: usize,
    page_references: &[i64],
    columns: usize,
) -> Result<Selection, PageError> {
    let requested: Vec<Value> = page_references.iter().copied().map(Value::from).collect();
    select(total_pages, &requested, columns)
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn indexes(request: &DisplayRequest) -> Vec<usize> {
        request.valid_indexes().iter().map(|p| p.get()).collect()
    }

    fn skipped_values(selection: &Selection) -> Vec<Value> {
        selection
            .skipped_inputs()
            .iter()
            .map(|s| s.value().clone())
            .collect()
    }

    #[test]
    fn mixed_request_scenario() {
        let requested = [json!(1), json!(2), json!("A"), json!(-1), json!(5), json!(8)];

        let selection = select(10, &requested, 3).unwrap();

        let request = selection.display_request().expect("pages to display");
        assert_eq!(indexes(request), vec![1, 2, 5, 8]);
        assert_eq!(skipped_values(&selection), vec![json!("A"), json!(-1)]);
        assert_eq!(request.columns().get(), 3);
    }

    #[test]
    fn zero_columns_is_rejected() {
        let result = select(10, &[json!(1)], 0);
        assert!(matches!(result, Err(PageError::InvalidColumns { columns: 0 })));
    }

    #[test]
    fn zero_columns_is_rejected_even_without_requests() {
        let result = select(10, &[], 0);
        assert!(matches!(result, Err(PageError::InvalidColumns { .. })));
    }

    #[test]
    fn boundaries() {
        let requested = [json!(0), json!(1), json!(10), json!(11)];

        let selection = select(10, &requested, 2).unwrap();

        assert_eq!(indexes(selection.display_request().unwrap()), vec![1, 10]);
        assert_eq!(skipped_values(&selection), vec![json!(0), json!(11)]);
    }

    #[test]
    fn every_input_lands_in_exactly_one_partition() {
        let requested = [
            json!(3),
            json!("4"),
            json!(" 5 "),
            json!(2.0),
            json!(2.5),
            json!(true),
            json!(null),
            json!([1]),
            json!({"page": 1}),
            json!(99),
            json!("seven"),
        ];

        let selection = select(6, &requested, 4).unwrap();
        let valid = selection.display_request().map_or(0, |r| r.valid_indexes().len());

        assert_eq!(valid + selection.skipped_inputs().len(), requested.len());
        assert_eq!(
            indexes(selection.display_request().unwrap()),
            vec![3, 4, 5, 2]
        );
    }

    #[test]
    fn duplicates_are_preserved() {
        let requested = [json!(2), json!(2), json!("2")];

        let selection = select(3, &requested, 1).unwrap();

        assert_eq!(indexes(selection.display_request().unwrap()), vec![2, 2, 2]);
    }

    #[test]
    fn empty_result_is_marked_not_failed() {
        let selection = select(5, &[json!("x"), json!(6)], 2).unwrap();

        assert!(selection.is_empty());
        assert!(selection.display_request().is_none());
        assert_eq!(selection.skipped_inputs().len(), 2);
    }

    #[test]
    fn empty_request_is_nothing_to_display() {
        let selection = select(5, &[], 2).unwrap();
        assert_eq!(
            selection,
            Selection::NothingToDisplay {
                skipped_inputs: Vec::new()
            }
        );
    }

    #[test]
    fn out_of_range_keeps_original_value() {
        let check = check_index(&json!("12"), 10);

        let IndexCheck::Skipped(skipped) = check else {
            panic!("expected skipped input");
        };
        assert_eq!(skipped.value(), &json!("12"));
        assert_eq!(
            skipped.reason(),
            &SkipReason::OutOfRange {
                index: 12,
                total_pages: 10
            }
        );
    }

    #[test]
    fn non_integers_are_reported_as_such() {
        for value in [json!("A"), json!(1.5), json!(false), json!(null)] {
            let check = check_index(&value, 10);
            assert!(
                matches!(&check, IndexCheck::Skipped(s) if s.reason() == &SkipReason::NotAnInteger),
                "{value} should not coerce"
            );
        }
    }

    #[test]
    fn select_references_uses_same_rules() {
        let selection = select_references(60, &[44, 53, 0, 61], 2).unwrap();

        assert_eq!(indexes(selection.display_request().unwrap()), vec![44, 53]);
        assert_eq!(skipped_values(&selection), vec![json!(0), json!(61)]);
    }

    #[test]
    fn skipped_input_display() {
        let IndexCheck::Skipped(skipped) = check_index(&json!(-1), 10) else {
            panic!("expected skipped input");
        };
        assert_eq!(skipped.to_string(), "-1 (outside 1..=10)");

        let IndexCheck::Skipped(skipped) = check_index(&json!("A"), 10) else {
            panic!("expected skipped input");
        };
        assert_eq!(skipped.to_string(), "\"A\" (not an integer)");
    }
}
