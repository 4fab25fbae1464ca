pub mod case;
pub mod comments;
pub mod strings;
pub mod whitespace;

pub use case::{IdentifierCaseFilter, KeywordCaseFilter};
pub use comments::StripCommentsFilter;
pub use strings::TruncateStringFilter;
pub use whitespace::{SpacesAroundOperatorsFilter, StripWhitespaceFilter};

use crate::node::NodeIndex;
use crate::options::FormatOptions;
use crate::query::Query;

/// A rewrite applied to a parsed query before it is rendered.
pub trait Filter {
    fn name(&self) -> &'static str;
    fn process(&self, query: &mut Query);
}

/// Build the filter pipeline for `options`, in application order.
pub fn build_pipeline(options: &FormatOptions) -> Vec<Box<dyn Filter>> {
    let mut filters: Vec<Box<dyn Filter>> = Vec::new();
    if options.strip_comments {
        filters.push(Box::new(StripCommentsFilter));
    }
    if let Some(width) = options.truncate_strings {
        filters.push(Box::new(TruncateStringFilter::new(
            width,
            &options.truncate_char,
        )));
    }
    if let Some(case) = options.keyword_case {
        filters.push(Box::new(KeywordCaseFilter::new(case)));
    }
    if let Some(case) = options.identifier_case {
        filters.push(Box::new(IdentifierCaseFilter::new(case)));
    }
    if options.should_strip_whitespace() {
        filters.push(Box::new(StripWhitespaceFilter));
    }
    if options.use_space_around_operators {
        filters.push(Box::new(SpacesAroundOperatorsFilter));
    }
    filters
}

/// Last leaf under `idx`, following last children down the tree.
pub(crate) fn last_leaf(query: &Query, mut idx: NodeIndex) -> NodeIndex {
    while let Some(&child) = query.node(idx).children.last() {
        idx = child;
    }
    idx
}
