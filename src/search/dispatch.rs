//! Debounced search across several categories.
//!
//! A [`Dispatcher`] coalesces rapid queries: each call to
//! [`Dispatcher::search`] cancels the pending one and schedules itself after
//! the quiet window. Only the last query of a burst is ranked. Ranking runs
//! when the event loop calls [`Dispatcher::poll`] after the window elapses;
//! the combined per-category results are then published to subscribers.
//!
//! Time is owned by the [`Scheduler`], so tests (and the CLI's watch mode)
//! decide when the clock moves.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::corpus::Collection;
use crate::search::Searcher;
use crate::search::cache::{Clock, ManualClock, SystemClock};
use crate::search::rank::{RankOptions, RankedResult};

/// Default quiet window before a query is ranked.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(150);

/// Candidate collections for one query, keyed by category name.
pub type CategoryItems = HashMap<String, Collection>;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Deferred execution of tasks of type `T`.
pub trait Scheduler<T> {
    /// Run `task` once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration, task: T) -> TaskHandle;

    /// Drop a task that has not run yet, handing it back.
    fn cancel(&mut self, handle: TaskHandle) -> Option<T>;

    /// Remove and return every task that is due, earliest first.
    fn take_due(&mut self) -> Vec<T>;
}

/// A scheduler on a virtual clock that only moves when advanced.
#[derive(Debug)]
pub struct ManualScheduler<T> {
    clock: ManualClock,
    /// Tasks with their deadline. `None` is a deadline past the end of
    /// representable time: never due, but still cancellable.
    pending: Vec<(TaskHandle, Option<Instant>, T)>,
    next_id: u64,
}

impl<T> ManualScheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(ManualClock::new())
    }

    #[must_use]
    pub fn with_clock(clock: ManualClock) -> Self {
        Self {
            clock,
            pending: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn advance_by(&mut self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn advance_to(&mut self, instant: Instant) {
        self.clock.advance_to(instant);
    }

    /// Number of scheduled tasks that have not run or been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl<T> Default for ManualScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> for ManualScheduler<T> {
    fn schedule(&mut self, delay: Duration, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        let deadline = self.clock.now().checked_add(delay);
        if deadline.is_none() {
            debug!(?delay, "Delay overflows the clock, task waits for a flush");
        }
        self.pending.push((handle, deadline, task));
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let index = self.pending.iter().position(|(h, _, _)| *h == handle)?;
        Some(self.pending.remove(index).2)
    }

    fn take_due(&mut self) -> Vec<T> {
        let now = self.clock.now();
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(_, at, _)| at.is_some_and(|at| at <= now));
        self.pending = waiting;

        due.sort_by_key(|(handle, at, _)| (*at, handle.0));
        due.into_iter().map(|(_, _, task)| task).collect()
    }
}

/// A named group of candidates searched with its own fields and page size.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub options: RankOptions,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>, search_fields: &[&str], limit: usize) -> Self {
        Self {
            name: name.into(),
            options: RankOptions {
                search_fields: search_fields.iter().map(|f| (*f).to_string()).collect(),
                limit,
                ..RankOptions::default()
            },
        }
    }
}

/// The built-in categories: surahs, juzs, pages, hadith books and podcast
/// episodes.
#[must_use]
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("surahs", &["name", "arabicName", "number"], 4),
        Category::new("juzs", &["name", "surahs", "number"], 3),
        Category::new("pages", &["number"], 3),
        Category::new("hadiths", &["label"], 5),
        Category::new("podcasts", &["title", "date"], 5),
    ]
}

/// Ranked results per category, in configured category order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryResults {
    entries: Vec<(String, RankedResult)>,
}

impl CategoryResults {
    pub fn push(&mut self, category: impl Into<String>, result: RankedResult) {
        self.entries.push((category.into(), result));
    }

    #[must_use]
    pub fn get(&self, category: &str) -> Option<&RankedResult> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RankedResult)> {
        self.entries
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches across all categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, result)| result.total).sum()
    }
}

impl Serialize for CategoryResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, result) in &self.entries {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

/// Rank every category of `items` against `query`.
///
/// Categories missing from `items` are searched as empty collections.
pub fn search_categories<C: Clock>(
    searcher: &mut Searcher<C>,
    categories: &[Category],
    query: &str,
    items: &CategoryItems,
) -> CategoryResults {
    let mut results = CategoryResults::default();
    for category in categories {
        let result = match items.get(&category.name) {
            Some(collection) => searcher.rank(collection, query, &category.options),
            None => searcher.rank(&Collection::empty(&category.name), query, &category.options),
        };
        results.push(category.name.clone(), result);
    }
    results
}

/// A query waiting for the quiet window to pass.
#[derive(Debug, Clone)]
pub struct PendingSearch {
    pub query: String,
    pub items: CategoryItems,
}

type Subscriber = Box<dyn FnMut(&CategoryResults)>;

/// Trailing-edge debounced search over configured categories.
pub struct Dispatcher<S, C = SystemClock> {
    searcher: Searcher<C>,
    scheduler: S,
    categories: Vec<Category>,
    quiet_window: Duration,
    pending: Option<TaskHandle>,
    latest: Option<CategoryResults>,
    latest_query: Option<String>,
    subscribers: Vec<Subscriber>,
}

impl<S, C> Dispatcher<S, C>
where
    S: Scheduler<PendingSearch>,
    C: Clock,
{
    #[must_use]
    pub fn new(searcher: Searcher<C>, scheduler: S, categories: Vec<Category>) -> Self {
        Self {
            searcher,
            scheduler,
            categories,
            quiet_window: DEFAULT_QUIET_WINDOW,
            pending: None,
            latest: None,
            latest_query: None,
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_quiet_window(mut self, quiet_window: Duration) -> Self {
        self.quiet_window = quiet_window;
        self
    }

    /// Call `subscriber` with every published result set.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&CategoryResults) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Queue `query` for ranking, superseding any query still waiting.
    pub fn search(&mut self, query: impl Into<String>, items: CategoryItems) {
        if let Some(handle) = self.pending.take()
            && let Some(superseded) = self.scheduler.cancel(handle)
        {
            debug!(query = %superseded.query, "Superseded pending search");
        }

        let task = PendingSearch {
            query: query.into(),
            items,
        };
        self.pending = Some(self.scheduler.schedule(self.quiet_window, task));
    }

    /// Run any search whose quiet window has elapsed.
    ///
    /// Returns the newly published results, if anything ran.
    pub fn poll(&mut self) -> Option<&CategoryResults> {
        let due = self.scheduler.take_due();
        if due.is_empty() {
            return None;
        }
        self.pending = None;

        for task in due {
            self.run(&task);
        }
        self.latest.as_ref()
    }

    /// Run the pending search now, without waiting for the quiet window.
    pub fn flush(&mut self) -> Option<&CategoryResults> {
        let task = self
            .pending
            .take()
            .and_then(|handle| self.scheduler.cancel(handle))?;
        self.run(&task);
        self.latest.as_ref()
    }

    fn run(&mut self, task: &PendingSearch) {
        debug!(query = %task.query, "Dispatching search");
        let results = search_categories(
            &mut self.searcher,
            &self.categories,
            &task.query,
            &task.items,
        );

        for subscriber in &mut self.subscribers {
            subscriber(&results);
        }
        self.latest = Some(results);
        self.latest_query = Some(task.query.clone());
    }

    /// The most recently published results.
    #[must_use]
    pub fn latest(&self) -> Option<&CategoryResults> {
        self.latest.as_ref()
    }

    /// The query that produced [`Dispatcher::latest`].
    #[must_use]
    pub fn latest_query(&self) -> Option<&str> {
        self.latest_query.as_deref()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn searcher_mut(&mut self) -> &mut Searcher<C> {
        &mut self.searcher
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::corpus::Candidate;
    use serde_json::json;

    fn items() -> CategoryItems {
        let surahs = ["Al-Fatihah", "Al-Baqarah", "Yusuf"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| Candidate::from_json(json!({"name": name, "number": i + 1})).unwrap())
            .collect();
        let hadiths = ["Sahih al-Bukhari", "Sahih Muslim"]
            .into_iter()
            .map(|label| Candidate::from_json(json!({ "label": label })).unwrap())
            .collect();

        HashMap::from([
            ("surahs".to_string(), Collection::new("surahs", surahs)),
            ("hadiths".to_string(), Collection::new("hadiths", hadiths)),
        ])
    }

    fn dispatcher() -> Dispatcher<ManualScheduler<PendingSearch>> {
        Dispatcher::new(Searcher::new(), ManualScheduler::new(), default_categories())
    }

    #[test]
    fn nothing_runs_before_the_quiet_window() {
        let mut dispatcher = dispatcher();
        dispatcher.search("yusuf", items());

        dispatcher.scheduler_mut().advance_by(Duration::from_millis(149));
        assert!(dispatcher.poll().is_none());
        assert!(dispatcher.latest().is_none());

        dispatcher.scheduler_mut().advance_by(Duration::from_millis(1));
        assert!(dispatcher.poll().is_some());
    }

    #[test]
    fn only_the_last_query_of_a_burst_runs() {
        let mut dispatcher = dispatcher();
        let published = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&published);
        dispatcher.subscribe(move |results| sink.borrow_mut().push(results.clone()));

        for query in ["y", "yu", "yus", "yusuf"] {
            dispatcher.search(query, items());
            dispatcher.scheduler_mut().advance_by(Duration::from_millis(100));
            dispatcher.poll();
        }
        assert!(published.borrow().is_empty());
        assert_eq!(dispatcher.scheduler().pending(), 1);

        dispatcher.scheduler_mut().advance_by(Duration::from_millis(50));
        dispatcher.poll();

        let published = published.borrow();
        assert_eq!(published.len(), 1);
        let surahs = published[0].get("surahs").unwrap();
        assert_eq!(surahs.results[0].field_text("name").as_deref(), Some("Yusuf"));
    }

    #[test]
    fn publishes_every_category_in_order() {
        let mut dispatcher = dispatcher();
        dispatcher.search("", items());
        let results = dispatcher.flush().unwrap();

        let names: Vec<&str> = results.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["surahs", "juzs", "pages", "hadiths", "podcasts"]);
        assert_eq!(results.get("surahs").unwrap().total, 3);
        assert_eq!(results.get("hadiths").unwrap().total, 2);
        // absent from the bundle
        assert_eq!(results.get("juzs").unwrap(), &RankedResult::empty());
    }

    #[test]
    fn category_limits_apply() {
        let mut dispatcher = dispatcher();
        dispatcher.search("", items());
        let results = dispatcher.flush().unwrap();

        let hadiths = results.get("hadiths").unwrap();
        let surahs = results.get("surahs").unwrap();
        assert_eq!(hadiths.len(), 2);
        assert_eq!(surahs.len(), 3);
        assert!(!surahs.has_more);
    }

    #[test]
    fn flush_without_pending_does_nothing() {
        let mut dispatcher = dispatcher();
        assert!(dispatcher.flush().is_none());
        assert!(!dispatcher.has_pending());
    }

    #[test]
    fn serializes_in_category_order() {
        let mut results = CategoryResults::default();
        results.push("surahs", RankedResult::empty());
        results.push("hadiths", RankedResult::empty());

        let json = serde_json::to_string(&results).unwrap();
        assert!(json.find("surahs").unwrap() < json.find("hadiths").unwrap());
        assert!(json.contains("\"hasMore\":false"));
    }

    #[test]
    fn cancel_returns_the_task() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.schedule(Duration::from_millis(10), "first");
        scheduler.schedule(Duration::from_millis(5), "second");

        assert_eq!(scheduler.cancel(first), Some("first"));
        assert_eq!(scheduler.cancel(first), None);

        scheduler.advance_by(Duration::from_millis(5));
        assert_eq!(scheduler.take_due(), vec!["second"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn oversized_delay_never_comes_due() {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.schedule(Duration::from_millis(u64::MAX), "late");

        scheduler.advance_by(Duration::from_secs(365 * 24 * 60 * 60));
        assert!(scheduler.take_due().is_empty());
        assert_eq!(scheduler.cancel(handle), Some("late"));
    }

    #[test]
    fn oversized_quiet_window_still_flushes() {
        let mut dispatcher = dispatcher().with_quiet_window(Duration::from_millis(u64::MAX));
        dispatcher.search("yusuf", items());

        dispatcher.scheduler_mut().advance_by(Duration::from_secs(3600));
        assert!(dispatcher.poll().is_none());

        let surahs = dispatcher.flush().unwrap().get("surahs").unwrap();
        assert_eq!(surahs.results[0].field_text("name").as_deref(), Some("Yusuf"));
    }

    #[test]
    fn due_tasks_come_out_earliest_first() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Duration::from_millis(30), 3);
        scheduler.schedule(Duration::from_millis(10), 1);
        scheduler.schedule(Duration::from_millis(20), 2);
        scheduler.schedule(Duration::from_millis(99), 4);

        scheduler.advance_by(Duration::from_millis(30));
        assert_eq!(scheduler.take_due(), vec![1, 2, 3]);
        assert_eq!(scheduler.pending(), 1);
    }
}
