use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::{Document, DocumentId, Value};

/// A single filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value.
    Equal { field: String, value: Value },
    /// Field is an array holding the value.
    ArrayContains { field: String, value: Value },
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Equal { field, value } => doc.get(field) == Some(value),
            Filter::ArrayContains { field, value } => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    /// Documents without the field go last; ties fall back to the id.
    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match (a.get(&self.field), b.get(&self.field)) {
            (Some(x), Some(y)) => {
                let ord = x.compare(y);
                let ord = match self.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                };
                ord.then_with(|| a.id.cmp(&b.id))
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        }
    }
}

/// A query over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Equal {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn where_array_contains(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter::ArrayContains {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Whether the document passes every filter. Ordering is ignored.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }

    /// Filter and order a set of documents from this collection.
    pub fn apply<I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut matched: Vec<Document> = docs.into_iter().filter(|doc| self.matches(doc)).collect();

        match &self.order_by {
            Some(order) => matched.sort_by(|a, b| order.compare(a, b)),
            None => matched.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        matched
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        for filter in &self.filters {
            match filter {
                Filter::Equal { field, value } => write!(f, " where {field} == {value:?}")?,
                Filter::ArrayContains { field, value } => {
                    write!(f, " where {field} contains {value:?}")?
                }
            }
        }
        if let Some(order) = &self.order_by {
            let dir = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            write!(f, " order by {} {dir}", order.field)?;
        }
        Ok(())
    }
}

/// One write to a collection, with the document before and after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: DocumentId,
    pub before: Option<Document>,
    pub after: Option<Document>,
}

impl ChangeEvent {
    /// True when the write entered, left or modified the query's match set.
    pub fn affects(&self, query: &Query) -> bool {
        self.collection == query.collection
            && (self.before.as_ref().is_some_and(|doc| query.matches(doc))
                || self.after.as_ref().is_some_and(|doc| query.matches(doc)))
    }
}
