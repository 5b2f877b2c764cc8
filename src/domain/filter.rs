use crate::domain::Need;

/// Narrows a list of needs by category and free text.
///
/// A filter never mutates the collection it is applied to, and always
/// starts from whatever full sequence it is given: applying it twice to the
/// same collection gives the same result, in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    term: Option<String>,
    aid_type: Option<String>,
}

impl Filter {
    /// Build a filter from the raw search box and category selector values.
    ///
    /// Empty strings place no constraint.
    #[must_use]
    pub fn new(term: impl Into<String>, aid_type: impl Into<String>) -> Self {
        let term = term.into();
        let aid_type = aid_type.into();
        Self {
            term: (!term.is_empty()).then(|| term.to_lowercase()),
            aid_type: (!aid_type.is_empty()).then_some(aid_type),
        }
    }

    /// Whether a single need passes the filter.
    #[must_use]
    pub fn matches(&self, need: &Need) -> bool {
        if let Some(aid_type) = &self.aid_type {
            if need.aid_type() != aid_type {
                return false;
            }
        }

        if let Some(term) = &self.term {
            return [need.title(), need.description(), need.institution()]
                .into_iter()
                .any(|text| text.to_lowercase().contains(term.as_str()));
        }

        true
    }

    /// Apply the filter to a full collection, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, needs: &'a [Need]) -> Vec<&'a Need> {
        needs.iter().filter(|need| self.matches(need)).collect()
    }
}
