pub(crate) trait LetChain {
    fn let_<F, R>(self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(Self) -> R;
}
impl<T> LetChain for T {
    #[inline]
    fn let_<F, R>(self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

pub(crate) trait AlsoChain {
    fn also_<F, R>(self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R;
}
impl<T> AlsoChain for T {
    #[inline]
    fn also_<F, R>(mut self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R,
    {
        f(&mut self);
        self
    }
}

/// number of pages needed to show `total` items, `per_page` at a time.
pub(crate) fn count_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }

    let per_page = u64::from(per_page);
    ((total + per_page - 1) / per_page)
        .let_(u32::try_from)
        .unwrap_or(u32::MAX)
}

#[test]
fn count_pages_rounds_up() {
    assert_eq!(count_pages(0, 10), 0);
    assert_eq!(count_pages(10, 10), 1);
    assert_eq!(count_pages(11, 10), 2);
    assert_eq!(count_pages(3, 0), 0);
}
