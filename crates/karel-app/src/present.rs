//! Read-only paging over a snapshot history.

use karel_core::{Frame, History};

/// Splits a history into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
}

/// One page of frames. `index` is the page actually shown after clamping.
#[derive(Debug)]
pub struct Page<'a, A> {
    pub index: usize,
    pub total_pages: usize,
    pub frames: Vec<&'a Frame<A>>,
}

impl<A> Page<'_, A> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Pager {
    /// A page size of zero is treated as one.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn total_pages<A>(&self, history: &History<A>) -> usize {
        history.len().div_ceil(self.page_size)
    }

    /// Returns page `index`, clamped to the last page. An empty history yields
    /// an empty page 0 of 0.
    #[must_use]
    pub fn page<'a, A>(&self, history: &'a History<A>, index: usize) -> Page<'a, A> {
        let total_pages = self.total_pages(history);
        let index = index.min(total_pages.saturating_sub(1));
        let frames = history
            .iter()
            .skip(index * self.page_size)
            .take(self.page_size)
            .collect();
        Page {
            index,
            total_pages,
            frames,
        }
    }

    /// The page holding the most recent frame.
    #[must_use]
    pub fn last_page<'a, A>(&self, history: &'a History<A>) -> Page<'a, A> {
        self.page(history, usize::MAX)
    }
}

/// Only the last action, as shown by "show last step" in the classroom UI.
#[must_use]
pub fn latest<A>(history: &History<A>) -> Option<&Frame<A>> {
    history.latest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use karel_core::{Karel, KarelConfig, NullRenderer, Step};

    fn karel_with_steps(steps: usize) -> Karel<NullRenderer> {
        let mut karel = Karel::headless(KarelConfig::default()).expect("karel");
        for _ in 0..steps {
            karel.turn_left();
        }
        karel
    }

    fn steps(page: &Page<'_, ()>) -> Vec<u64> {
        page.frames.iter().map(|frame| frame.step.0).collect()
    }

    #[test]
    fn pages_split_history_in_order() {
        let karel = karel_with_steps(7);
        let pager = Pager::new(3);
        assert_eq!(pager.total_pages(karel.history()), 3);
        assert_eq!(steps(&pager.page(karel.history(), 0)), vec![1, 2, 3]);
        assert_eq!(steps(&pager.page(karel.history(), 2)), vec![7]);
    }

    #[test]
    fn out_of_range_index_clamps_to_last_page() {
        let karel = karel_with_steps(7);
        let page = Pager::new(3).page(karel.history(), 42);
        assert_eq!(page.index, 2);
        assert_eq!(steps(&page), vec![7]);
        assert_eq!(Pager::new(3).last_page(karel.history()).index, 2);
    }

    #[test]
    fn zero_page_size_and_empty_history() {
        let pager = Pager::new(0);
        assert_eq!(pager.page_size(), 1);
        let karel = karel_with_steps(0);
        let page = pager.page(karel.history(), 5);
        assert_eq!((page.index, page.total_pages), (0, 0));
        assert!(page.is_empty());
        assert!(latest(karel.history()).is_none());
    }

    #[test]
    fn paging_does_not_touch_the_agent() {
        let karel = karel_with_steps(4);
        let _ = Pager::default().page(karel.history(), 0);
        assert_eq!(karel.step(), Step(4));
        assert_eq!(latest(karel.history()).map(|frame| frame.step), Some(Step(4)));
    }
}
