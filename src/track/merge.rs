//! Lazy merge of time-sorted point sources.

use std::iter::Peekable;

/// Two-way merge of sequences that are each already sorted ascending by
/// `less_than`. Ties favor the first sequence's element without consuming
/// the second's. Never materializes more than one lookahead element per
/// input.
pub struct Merge<I, J, F>
where
    I: Iterator,
    J: Iterator<Item = I::Item>,
{
    first: Peekable<I>,
    second: Peekable<J>,
    less_than: F,
}

pub fn merge<A, B, F>(first: A, second: B, less_than: F) -> Merge<A::IntoIter, B::IntoIter, F>
where
    A: IntoIterator,
    B: IntoIterator<Item = A::Item>,
    F: FnMut(&A::Item, &A::Item) -> bool,
{
    Merge {
        first: first.into_iter().peekable(),
        second: second.into_iter().peekable(),
        less_than,
    }
}

impl<I, J, F> Iterator for Merge<I, J, F>
where
    I: Iterator,
    J: Iterator<Item = I::Item>,
    F: FnMut(&I::Item, &I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match (self.first.peek(), self.second.peek()) {
            (Some(a), Some(b)) => {
                if (self.less_than)(b, a) {
                    self.second.next()
                } else {
                    self.first.next()
                }
            }
            (Some(_), None) => self.first.next(),
            (None, _) => self.second.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo1, hi1) = self.first.size_hint();
        let (lo2, hi2) = self.second.size_hint();
        let hi = match (hi1, hi2) {
            (Some(a), Some(b)) => a.checked_add(b),
            _ => None,
        };
        (lo1.saturating_add(lo2), hi)
    }
}

/// Folds any number of pre-sorted sources into one chronological stream.
pub fn merge_all<'a, T, F>(sources: Vec<Vec<T>>, less_than: F) -> Box<dyn Iterator<Item = T> + 'a>
where
    T: 'a,
    F: FnMut(&T, &T) -> bool + Copy + 'a,
{
    let mut merged: Box<dyn Iterator<Item = T> + 'a> = Box::new(std::iter::empty());
    for source in sources {
        merged = Box::new(merge(merged, source, less_than));
    }
    merged
}
