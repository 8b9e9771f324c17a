use rayon::iter::ParallelIterator;

/// Forwards `Err` items to a channel and keeps yielding the `Ok` values, so
/// a stage can keep streaming while its failures get tallied elsewhere.
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Clone)]
pub struct RouteErrors<'s, I, M> {
    iter: I,
    channel: &'s crossbeam_channel::Sender<M>,
}

impl<'s, I, E, T, M> Iterator for RouteErrors<'s, I, M>
where
    I: Iterator<Item = Result<T, E>>,
    M: From<E>,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        loop {
            match self.iter.next() {
                Some(Ok(v)) => return Some(v),
                Some(Err(e)) => {
                    self.channel.send(M::from(e)).unwrap();
                    continue;
                }
                None => return None,
            }
        }
    }
}

pub trait RouteErrorsExt<I, T, E, M>
where
    I: Iterator<Item = Result<T, E>>,
    M: From<E>,
{
    /// Transmit errors to a channel, leaving Ok values in the iterator.
    fn route_errors(self, channel: &crossbeam_channel::Sender<M>) -> RouteErrors<'_, I, M>;
}

impl<I, T, E, M> RouteErrorsExt<I, T, E, M> for I
where
    I: Iterator<Item = Result<T, E>>,
    M: From<E>,
{
    fn route_errors(self, channel: &crossbeam_channel::Sender<M>) -> RouteErrors<'_, I, M> {
        RouteErrors {
            iter: self,
            channel,
        }
    }
}

/* -------------------------------------------------------------------- */

// Parallel version. The sender is cloned in because worker threads outlive
// any one borrow.

#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Clone)]
pub struct ParallelRouteErrors<I, M> {
    iter: I,
    channel: crossbeam_channel::Sender<M>,
}

impl<I, E, T, M> ParallelIterator for ParallelRouteErrors<I, M>
where
    I: ParallelIterator<Item = Result<T, E>>,
    M: From<E> + Send,
    T: Send,
{
    type Item = T;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::UnindexedConsumer<Self::Item>,
    {
        self.iter
            .filter_map(|v| match v {
                Ok(v) => Some(v),
                Err(e) => {
                    self.channel.send(M::from(e)).unwrap();
                    None
                }
            })
            .drive_unindexed(consumer)
    }
}

pub trait ParallelRouteErrorsExt<I, T, E, M>
where
    I: ParallelIterator<Item = Result<T, E>>,
    M: From<E>,
{
    /// Transmit errors to a channel, leaving Ok values in the iterator.
    fn route_errors(self, channel: &crossbeam_channel::Sender<M>) -> ParallelRouteErrors<I, M>;
}

impl<I, T, E, M> ParallelRouteErrorsExt<I, T, E, M> for I
where
    I: ParallelIterator<Item = Result<T, E>>,
    M: From<E>,
{
    fn route_errors(self, channel: &crossbeam_channel::Sender<M>) -> ParallelRouteErrors<I, M> {
        ParallelRouteErrors {
            iter: self,
            channel: channel.clone(),
        }
    }
}

/* -------------------------------------------------------------------- */

pub trait ExtendTo<T, I, R>
where
    R: Extend<T>,
    I: IntoIterator<Item = T>,
{
    /// Moves the values into a mutable reference which implements `extend()`.
    fn extend_to(self, mutref: &mut R);
}

impl<T, I, R> ExtendTo<T, I, R> for I
where
    R: Extend<T>,
    I: IntoIterator<Item = T>,
{
    fn extend_to(self, mutref: &mut R) {
        mutref.extend(self);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rayon::prelude::*;

    use super::{ExtendTo, ParallelRouteErrorsExt, RouteErrorsExt};

    #[test]
    fn route_errors_splits_oks_from_errs() {
        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let input: Vec<Result<i32, String>> =
            vec![Ok(1), Err("bad".to_owned()), Ok(2), Err("worse".to_owned())];

        let oks: Vec<i32> = input.into_iter().route_errors(&tx).collect();
        drop(tx);

        assert_eq!(oks, vec![1, 2]);
        let errs: Vec<String> = rx.iter().collect();
        assert_eq!(errs, vec!["bad".to_owned(), "worse".to_owned()]);
    }

    #[test]
    fn parallel_route_errors_keeps_ok_order() {
        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let input: Vec<Result<i32, String>> = (0..1000)
            .map(|i| {
                if i % 7 == 0 {
                    Err(format!("e{}", i))
                } else {
                    Ok(i)
                }
            })
            .collect();

        let oks: Vec<i32> = input.into_par_iter().route_errors(&tx).collect();
        drop(tx);

        let expected: Vec<i32> = (0..1000).filter(|i| i % 7 != 0).collect();
        assert_eq!(oks, expected);
        assert_eq!(rx.iter().count(), (0..1000).filter(|i| i % 7 == 0).count());
    }

    #[test]
    fn extend_to_hashset() {
        let mut receiver: HashSet<i32> = [1, 2].into_iter().collect();
        vec![2, 3, 4].into_iter().extend_to(&mut receiver);
        let mut gotem: Vec<i32> = receiver.into_iter().collect();
        gotem.sort();
        assert_eq!(vec![1, 2, 3, 4], gotem);
    }
}
